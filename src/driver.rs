//! Command-line driver: argument parsing, pipeline orchestration and output.

mod cli;
mod compiler;
mod output;


pub use cli::{Cli, CompileConfig, PreprocessorOptions};
pub use compiler::{CompilerDriver, DriverError, PipelineOutput};
