//! Preprocessor Dumper module
//!
//! Rebuilds source text from a preprocessed token stream. Line breaks and
//! spaces come from the token flags; blank lines are kept where the tokens
//! still carry their own line numbers.

use std::io::Write;

use crate::pp::token::{Token, TokenKind};

/// Dumper for preprocessed output
pub struct PPDumper<'a> {
    tokens: &'a [Token],
}

impl<'a> PPDumper<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Self { tokens }
    }

    /// Dump preprocessed output to the given writer
    pub fn dump(&self, writer: &mut impl Write) -> std::io::Result<()> {
        let mut previous: Option<&Token> = None;

        for token in self.tokens {
            if token.kind == TokenKind::Eof {
                break;
            }

            if let Some(prev) = previous {
                if token.at_start_of_line() {
                    let same_source = prev.location.source_index == token.location.source_index;
                    let gap = if same_source {
                        token.location.line.saturating_sub(prev.location.line).max(1)
                    } else {
                        1
                    };
                    for _ in 0..gap {
                        writeln!(writer)?;
                    }
                } else if token.has_leading_space() {
                    write!(writer, " ")?;
                }
            }

            write!(writer, "{}", token.text())?;
            previous = Some(token);
        }

        if previous.is_some() {
            writeln!(writer)?;
        }
        Ok(())
    }

    /// Dump into a string
    pub fn dump_to_string(&self) -> String {
        let mut out = Vec::new();
        // writing into a Vec cannot fail
        let _ = self.dump(&mut out);
        String::from_utf8_lossy(&out).into_owned()
    }
}
