use std::path::PathBuf;
use std::sync::Arc;

use symbol_table::GlobalSymbol as Symbol;

use crate::diagnostic::{DiagnosticEngine, DiagnosticId};
use crate::lang_options::LangOptions;
use crate::pp::directive::{DirectiveParser, DirectiveSummary};
use crate::pp::expander::{MacroExpander, PPContext};
use crate::pp::macros::{Macro, MacroTable};
use crate::pp::token::{Token, TokenKind};
use crate::pp::tokenizer::Tokenizer;
use crate::source_manager::{Input, SourceId, SourceLocation, SourceManager};

/// Configuration for preprocessor
#[derive(Debug, Clone)]
pub struct PPConfig {
    pub max_include_depth: usize,
    /// Maximum number of macro expansions active at once
    pub max_expansion_depth: usize,
    pub include_paths: Vec<PathBuf>,
    /// `NAME` or `NAME=VALUE`, as given with `-D`
    pub defines: Vec<String>,
}

impl Default for PPConfig {
    fn default() -> Self {
        PPConfig {
            max_include_depth: 100,
            max_expansion_depth: 1000,
            include_paths: Vec::new(),
            defines: Vec::new(),
        }
    }
}

/// Fatal preprocessor errors; the unit is abandoned after one of these
#[derive(Debug, thiserror::Error)]
pub enum PPError {
    #[error("macro expansion of '{name}' at {location} exceeds the maximum expansion depth")]
    ExpansionDepthExceeded { name: String, location: SourceLocation },
    #[error("#include \"{name}\" at {location} exceeds the maximum include depth")]
    IncludeDepthExceeded { name: String, location: SourceLocation },
    #[error("cannot read include file '{name}': {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

/// Main preprocessor structure
///
/// Pulls tokens through the directive parser and the macro expander and turns
/// the preprocessing-only token kinds into diagnostics.
pub struct Preprocessor<'src> {
    source_manager: &'src mut SourceManager,
    diag: &'src mut DiagnosticEngine,
    config: PPConfig,
    lang_opts: LangOptions,
    macros: MacroTable,
    summary: DirectiveSummary,
    expander: MacroExpander<DirectiveParser>,
    /// Set once a fatal error was returned
    aborted: bool,
}

impl<'src> Preprocessor<'src> {
    /// Create a preprocessor over the main input registered in `source_manager`
    pub fn new(
        source_manager: &'src mut SourceManager,
        diag: &'src mut DiagnosticEngine,
        config: PPConfig,
        lang_opts: LangOptions,
    ) -> Self {
        let input = source_manager.reader(source_manager.input_ids());
        let parser = DirectiveParser::new(Tokenizer::new(input), &config.include_paths);

        let mut macros = MacroTable::new();
        initialize_builtin_macros(&mut macros, &lang_opts);
        for define in &config.defines {
            define_command_line_macro(&mut macros, define, diag);
        }

        Preprocessor {
            source_manager,
            diag,
            config,
            lang_opts,
            macros,
            summary: DirectiveSummary::default(),
            expander: MacroExpander::new(parser),
            aborted: false,
        }
    }

    /// Next token of the logical stream; `Eof` repeats once the input is exhausted
    pub fn next_token(&mut self) -> Result<Token, PPError> {
        if self.aborted {
            return Ok(Token::eof(SourceLocation::builtin()));
        }
        loop {
            let mut ctx = PPContext {
                macros: &mut self.macros,
                diag: &mut *self.diag,
                sources: &mut *self.source_manager,
                summary: &mut self.summary,
                config: &self.config,
                lang_opts: &self.lang_opts,
            };
            let token = match self.expander.lex(&mut ctx) {
                Ok(token) => token,
                Err(err) => {
                    log::debug!("preprocessing aborted: {}", err);
                    self.aborted = true;
                    return Err(err);
                }
            };

            match token.kind {
                TokenKind::PPNumber(text) => {
                    self.diag.report(DiagnosticId::InvalidNumber, token.location, text.as_str());
                }
                TokenKind::IntConstant(text) if token.int_value().is_none() => {
                    self.diag.report(DiagnosticId::IntegerOverflow, token.location, text.as_str());
                }
                TokenKind::FloatConstant(text) if token.float_value().is_none() => {
                    self.diag.report(DiagnosticId::FloatOverflow, token.location, text.as_str());
                }
                TokenKind::Invalid(_) | TokenKind::Hash => {
                    self.diag
                        .report(DiagnosticId::InvalidCharacter, token.location, &token.kind.to_string());
                    continue;
                }
                TokenKind::UnterminatedString(text) => {
                    self.diag
                        .report(DiagnosticId::UnterminatedString, token.location, text.as_str());
                    continue;
                }
                _ => {}
            }
            return Ok(token);
        }
    }

    /// Preprocess the whole input; the result ends with the `Eof` token
    pub fn process(&mut self) -> Result<Vec<Token>, PPError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.is_eof();
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    pub fn summary(&self) -> &DirectiveSummary {
        &self.summary
    }

    pub fn macros(&self) -> &MacroTable {
        &self.macros
    }

    pub fn is_macro_defined(&self, name: &str) -> bool {
        self.macros.is_defined(Symbol::new(name))
    }
}

/// Initialize built-in macros
fn initialize_builtin_macros(macros: &mut MacroTable, lang_opts: &LangOptions) {
    macros.predefine("__LINE__", 0);
    macros.predefine("__FILE__", 0);
    macros.predefine("__VERSION__", lang_opts.shader_version as i64);
    macros.predefine("GL_ES", 1);
    if lang_opts.fragment_precision_high {
        macros.predefine("GL_FRAGMENT_PRECISION_HIGH", 1);
    }
    for extension in &lang_opts.extensions {
        macros.predefine(extension, 1);
    }
}

/// `NAME` defines `NAME` as `1`; `NAME=VALUE` tokenizes `VALUE` as the body
fn define_command_line_macro(macros: &mut MacroTable, define: &str, diag: &mut DiagnosticEngine) {
    let (name, value) = define.split_once('=').unwrap_or((define, "1"));
    let name = name.trim();
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        log::warn!("ignoring malformed command-line define '{}'", define);
        return;
    }

    let input = Input::new(vec![(SourceId::new(u32::MAX), Arc::from(value))]);
    let mut tokenizer = Tokenizer::new(input);
    let mut body = Vec::new();
    loop {
        let mut token = tokenizer.lex(diag);
        if token.is_eof() {
            break;
        }
        if token.kind == TokenKind::Newline {
            continue;
        }
        token.location = SourceLocation::builtin();
        body.push(token);
    }
    if let Some(first) = body.first_mut() {
        first.set_has_leading_space(false);
    }
    macros.define(Macro::object(Symbol::new(name), body, SourceLocation::builtin()), diag);
}
