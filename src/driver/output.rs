//! Output formatting module
//!
//! Writes preprocessed source, token listings and directive summaries.

use std::io::Write;

use crate::pp::{DirectiveSummary, PPDumper, Token, TokenKind};
use crate::source_manager::{SourceId, SourceManager};

use super::compiler::DriverError;

/// Handler for the driver's output formats
pub(crate) struct OutputHandler;

impl OutputHandler {
    pub(crate) fn new() -> Self {
        OutputHandler
    }

    /// Rebuilt source text
    pub(crate) fn dump_preprocessed_output(&self, tokens: &[Token], out: &mut dyn Write) -> Result<(), DriverError> {
        let mut buffer = Vec::new();
        PPDumper::new(tokens).dump(&mut buffer)?;
        out.write_all(&buffer)?;
        Ok(())
    }

    /// One token per line: `name:line:column kind 'text'`
    pub(crate) fn dump_tokens(
        &self,
        tokens: &[Token],
        source_manager: &SourceManager,
        out: &mut dyn Write,
    ) -> Result<(), DriverError> {
        for token in tokens {
            let name = if token.location.is_builtin() {
                "<built-in>"
            } else {
                source_manager
                    .get_file_info(SourceId::new(token.location.source_index))
                    .map(|info| info.name.as_str())
                    .unwrap_or("<unknown>")
            };
            writeln!(
                out,
                "{}:{}:{} {} '{}'",
                name,
                token.location.line,
                token.location.column,
                kind_name(&token.kind),
                token
            )?;
        }
        Ok(())
    }

    pub(crate) fn dump_directives(&self, summary: &DirectiveSummary, out: &mut dyn Write) -> Result<(), DriverError> {
        match summary.version {
            Some(version) => writeln!(out, "version: {}", version)?,
            None => writeln!(out, "version: <none>")?,
        }
        for (name, behavior) in &summary.extensions {
            writeln!(out, "extension: {} : {}", name, behavior.as_str())?;
        }
        for pragma in &summary.pragmas {
            let prefix = if pragma.stdgl { "STDGL " } else { "" };
            match &pragma.value {
                Some(value) => writeln!(out, "pragma: {}{}({})", prefix, pragma.name, value)?,
                None => writeln!(out, "pragma: {}{}", prefix, pragma.name)?,
            }
        }
        Ok(())
    }
}

fn kind_name(kind: &TokenKind) -> &'static str {
    match kind {
        TokenKind::Identifier(_) => "identifier",
        TokenKind::IntConstant(_) => "int",
        TokenKind::FloatConstant(_) => "float",
        TokenKind::PPNumber(_) => "ppnumber",
        TokenKind::StringLiteral(_) => "string",
        TokenKind::UnterminatedString(_) => "unterminated-string",
        TokenKind::Newline => "newline",
        TokenKind::Invalid(_) => "invalid",
        TokenKind::Eof => "eof",
        _ => "punct",
    }
}
