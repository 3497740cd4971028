//! Pipeline orchestration
//!
//! Loads the input files as one unit, runs the preprocessor over it and hands
//! the result to the output handler.

use std::fs::File;
use std::io::{self, BufWriter, Write};

use crate::diagnostic::{Diagnostic, DiagnosticEngine, ErrorFormatter};
use crate::pp::{DirectiveSummary, PPError, Preprocessor, Token};
use crate::source_manager::SourceManager;

use super::cli::CompileConfig;
use super::output::OutputHandler;

/// Result of preprocessing one unit
#[derive(Debug, Default)]
pub struct PipelineOutput {
    pub tokens: Vec<Token>,
    pub summary: DirectiveSummary,
}

/// Main compiler driver
pub struct CompilerDriver {
    config: CompileConfig,
    diagnostics: DiagnosticEngine,
    pub(crate) source_manager: SourceManager,
    output_handler: OutputHandler,
}

impl CompilerDriver {
    /// Create a new compiler driver from CLI arguments
    pub fn new(cli: super::cli::Cli) -> Self {
        Self::from_config(cli.into_config())
    }

    pub fn from_config(config: CompileConfig) -> Self {
        let diagnostics = DiagnosticEngine::from_warnings(&config.warnings);
        CompilerDriver {
            diagnostics,
            source_manager: SourceManager::new(),
            output_handler: OutputHandler::new(),
            config,
        }
    }

    /// Load every input file and preprocess them as one unit
    pub fn run_pipeline(&mut self) -> Result<PipelineOutput, DriverError> {
        for path in &self.config.input_files {
            self.source_manager
                .add_input_file(path)
                .map_err(|e| DriverError::IoError(format!("cannot read '{}': {}", path.display(), e)))?;
        }

        let mut preprocessor = Preprocessor::new(
            &mut self.source_manager,
            &mut self.diagnostics,
            self.config.preprocessor.clone(),
            self.config.lang_options.clone(),
        );
        let tokens = preprocessor.process()?;
        let summary = preprocessor.summary().clone();
        log::debug!("preprocessed {} tokens", tokens.len());

        if self.diagnostics.has_errors() {
            return Err(DriverError::CompilationFailed);
        }
        Ok(PipelineOutput { tokens, summary })
    }

    /// Run the pipeline, print diagnostics and write the requested output
    pub fn run(&mut self) -> Result<(), DriverError> {
        let result = self.run_pipeline();
        self.print_diagnostics();
        let output = result?;

        let mut out: Box<dyn Write> = match &self.config.output_path {
            Some(path) => Box::new(BufWriter::new(File::create(path)?)),
            None => Box::new(io::stdout().lock()),
        };

        if self.config.dump_tokens {
            self.output_handler
                .dump_tokens(&output.tokens, &self.source_manager, &mut out)?;
        }
        if self.config.dump_directives {
            self.output_handler.dump_directives(&output.summary, &mut out)?;
        }
        if self.config.preprocess_only {
            self.output_handler.dump_preprocessed_output(&output.tokens, &mut out)?;
        }
        out.flush()?;
        Ok(())
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.has_errors()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.diagnostics.diagnostics()
    }

    /// Print accumulated diagnostics to stderr
    pub fn print_diagnostics(&self) {
        let formatter = ErrorFormatter::default();
        formatter.print_diagnostics(self.diagnostics.diagnostics(), &self.source_manager);
    }
}

/// Error types for the compiler driver
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error(transparent)]
    Preprocess(#[from] PPError),

    #[error("Compilation failed due to errors")]
    CompilationFailed,
}

impl From<io::Error> for DriverError {
    fn from(e: io::Error) -> Self {
        DriverError::IoError(e.to_string())
    }
}
