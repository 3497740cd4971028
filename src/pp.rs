//! Preprocessor: tokenizer, macro table, directive handling and macro expansion.

mod directive;
pub mod dumper;
mod expander;
pub mod expression;
mod header_search;
pub mod macros;
pub mod preprocessor;
pub mod token;
pub mod tokenizer;
#[cfg(test)]
mod tests_directives;

pub use directive::{DirectiveKind, DirectiveSummary, ExtensionBehavior, Pragma};
pub use dumper::PPDumper;
pub use macros::{Macro, MacroFlags, MacroKind, MacroTable};
pub use preprocessor::{PPConfig, PPError, Preprocessor};
pub use token::{Token, TokenFlags, TokenKind, TokenValue};
