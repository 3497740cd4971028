//! CLI parsing and configuration module
//!
//! Command-line arguments are parsed with clap and turned into a
//! `CompileConfig` for the driver.

use clap::{Args, Parser as CliParser};
use std::path::PathBuf;

use crate::lang_options::LangOptions;
use crate::pp::PPConfig;

/// CLI interface using clap
#[derive(CliParser, Debug)]
#[clap(name = "shadefront", about = "Shading-language preprocessor and tokenizer")]
pub struct Cli {
    /// Shader source files, concatenated in order into one unit
    #[clap(value_parser, required = true)]
    pub input_files: Vec<PathBuf>,

    /// Write output to FILE instead of stdout
    #[clap(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Enable debug logging
    #[clap(short, long)]
    pub verbose: bool,

    /// Preprocess only, output preprocessed source
    #[clap(short = 'E')]
    pub preprocess_only: bool,

    /// Print the token stream, one token per line
    #[clap(long)]
    pub dump_tokens: bool,

    /// Print the version, pragmas and extensions declared by directives
    #[clap(long)]
    pub dump_directives: bool,

    /// Preprocessor options
    #[clap(flatten)]
    pub preprocessor: PreprocessorOptions,

    /// Include search paths
    #[clap(short = 'I', long = "include-path", value_name = "DIR", action = clap::ArgAction::Append)]
    pub include_paths: Vec<PathBuf>,

    /// Preprocessor macro definitions
    #[clap(short = 'D', long = "define", value_name = "NAME[=VALUE]", action = clap::ArgAction::Append)]
    pub defines: Vec<String>,

    /// Warning switches: `error` promotes warnings, `no-warnings` drops them
    #[clap(short = 'W', action = clap::ArgAction::Append)]
    pub warnings: Vec<String>,

    /// Shading language version assumed before any #version directive
    #[clap(long = "shader-version", value_name = "VERSION", default_value = "100")]
    pub shader_version: u32,

    /// Supported extension, predefined as a macro
    #[clap(long = "extension", value_name = "NAME", action = clap::ArgAction::Append)]
    pub extensions: Vec<String>,

    /// Predefine GL_FRAGMENT_PRECISION_HIGH
    #[clap(long = "fragment-precision-high")]
    pub fragment_precision_high: bool,
}

#[derive(Args, Debug)]
pub struct PreprocessorOptions {
    /// Maximum include depth
    #[clap(long, default_value = "100")]
    pub max_include_depth: usize,

    /// Maximum number of nested macro expansions
    #[clap(long, default_value = "1000")]
    pub max_expansion_depth: usize,
}

/// Configuration for one run of the driver
#[derive(Debug)]
pub struct CompileConfig {
    pub input_files: Vec<PathBuf>,
    pub output_path: Option<PathBuf>,
    pub preprocess_only: bool,
    pub dump_tokens: bool,
    pub dump_directives: bool,
    pub verbose: bool,
    pub preprocessor: PPConfig,
    pub warnings: Vec<String>,
    pub lang_options: LangOptions,
}

impl Cli {
    /// Convert CLI arguments into compilation configuration
    pub fn into_config(self) -> CompileConfig {
        let lang_options = LangOptions {
            shader_version: self.shader_version,
            fragment_precision_high: self.fragment_precision_high,
            extensions: self.extensions,
        };

        CompileConfig {
            input_files: self.input_files,
            output_path: self.output,
            preprocess_only: self.preprocess_only,
            dump_tokens: self.dump_tokens,
            dump_directives: self.dump_directives,
            verbose: self.verbose,
            preprocessor: PPConfig {
                max_include_depth: self.preprocessor.max_include_depth,
                max_expansion_depth: self.preprocessor.max_expansion_depth,
                include_paths: self.include_paths,
                defines: self.defines,
            },
            warnings: self.warnings,
            lang_options,
        }
    }
}
