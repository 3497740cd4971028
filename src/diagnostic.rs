use crate::source_manager::{SourceId, SourceLocation, SourceManager};
use serde::Serialize;

/// Diagnostic severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DiagnosticLevel {
    Error,
    Warning,
    Note,
}

/// Every recoverable condition the tokenizer and preprocessor can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticId {
    // lexical
    InvalidCharacter,
    InvalidNumber,
    IntegerOverflow,
    FloatOverflow,
    EofInComment,
    UnterminatedString,
    // #if expressions
    InvalidExpression,
    DivisionByZero,
    // directives
    UnexpectedToken,
    DirectiveInvalidName,
    MacroNameReserved,
    MacroRedefined,
    MacroPredefinedRedefined,
    MacroPredefinedUndefined,
    MacroUnterminatedInvocation,
    MacroTooFewArgs,
    MacroTooManyArgs,
    MacroDuplicateParameter,
    ConditionalEndifWithoutIf,
    ConditionalElseWithoutIf,
    ConditionalElseAfterElse,
    ConditionalElifWithoutIf,
    ConditionalElifAfterElse,
    ConditionalUnterminated,
    InvalidExtensionName,
    InvalidExtensionBehavior,
    InvalidExtensionDirective,
    InvalidVersionNumber,
    InvalidVersionDirective,
    VersionNotFirstStatement,
    InvalidLineNumber,
    InvalidFileNumber,
    InvalidLineDirective,
    InvalidIncludeDirective,
    IncludeNotFound,
    ErrorDirective,
    // warnings
    ConditionalUnexpectedToken,
    UnrecognizedPragma,
}

impl DiagnosticId {
    pub fn level(self) -> DiagnosticLevel {
        match self {
            DiagnosticId::ConditionalUnexpectedToken | DiagnosticId::UnrecognizedPragma => DiagnosticLevel::Warning,
            _ => DiagnosticLevel::Error,
        }
    }

    /// Stable snake-case code
    pub fn code(self) -> &'static str {
        match self {
            DiagnosticId::InvalidCharacter => "invalid_character",
            DiagnosticId::InvalidNumber => "invalid_number",
            DiagnosticId::IntegerOverflow => "integer_overflow",
            DiagnosticId::FloatOverflow => "float_overflow",
            DiagnosticId::EofInComment => "eof_in_comment",
            DiagnosticId::UnterminatedString => "unterminated_string",
            DiagnosticId::InvalidExpression => "invalid_expression",
            DiagnosticId::DivisionByZero => "division_by_zero",
            DiagnosticId::UnexpectedToken => "unexpected_token",
            DiagnosticId::DirectiveInvalidName => "directive_invalid_name",
            DiagnosticId::MacroNameReserved => "macro_name_reserved",
            DiagnosticId::MacroRedefined => "macro_redefined",
            DiagnosticId::MacroPredefinedRedefined => "macro_predefined_redefined",
            DiagnosticId::MacroPredefinedUndefined => "macro_predefined_undefined",
            DiagnosticId::MacroUnterminatedInvocation => "macro_unterminated_invocation",
            DiagnosticId::MacroTooFewArgs => "macro_too_few_args",
            DiagnosticId::MacroTooManyArgs => "macro_too_many_args",
            DiagnosticId::MacroDuplicateParameter => "macro_duplicate_parameter",
            DiagnosticId::ConditionalEndifWithoutIf => "conditional_endif_without_if",
            DiagnosticId::ConditionalElseWithoutIf => "conditional_else_without_if",
            DiagnosticId::ConditionalElseAfterElse => "conditional_else_after_else",
            DiagnosticId::ConditionalElifWithoutIf => "conditional_elif_without_if",
            DiagnosticId::ConditionalElifAfterElse => "conditional_elif_after_else",
            DiagnosticId::ConditionalUnterminated => "conditional_unterminated",
            DiagnosticId::InvalidExtensionName => "invalid_extension_name",
            DiagnosticId::InvalidExtensionBehavior => "invalid_extension_behavior",
            DiagnosticId::InvalidExtensionDirective => "invalid_extension_directive",
            DiagnosticId::InvalidVersionNumber => "invalid_version_number",
            DiagnosticId::InvalidVersionDirective => "invalid_version_directive",
            DiagnosticId::VersionNotFirstStatement => "version_not_first_statement",
            DiagnosticId::InvalidLineNumber => "invalid_line_number",
            DiagnosticId::InvalidFileNumber => "invalid_file_number",
            DiagnosticId::InvalidLineDirective => "invalid_line_directive",
            DiagnosticId::InvalidIncludeDirective => "invalid_include_directive",
            DiagnosticId::IncludeNotFound => "include_not_found",
            DiagnosticId::ErrorDirective => "error_directive",
            DiagnosticId::ConditionalUnexpectedToken => "conditional_unexpected_token",
            DiagnosticId::UnrecognizedPragma => "unrecognized_pragma",
        }
    }

    fn description(self) -> &'static str {
        match self {
            DiagnosticId::InvalidCharacter => "invalid character",
            DiagnosticId::InvalidNumber => "invalid number",
            DiagnosticId::IntegerOverflow => "integer overflow",
            DiagnosticId::FloatOverflow => "float overflow",
            DiagnosticId::EofInComment => "unexpected end of file found in comment",
            DiagnosticId::UnterminatedString => "missing terminating '\"' character",
            DiagnosticId::InvalidExpression => "invalid expression",
            DiagnosticId::DivisionByZero => "division by zero",
            DiagnosticId::UnexpectedToken => "unexpected token",
            DiagnosticId::DirectiveInvalidName => "invalid directive name",
            DiagnosticId::MacroNameReserved => "macro name is reserved",
            DiagnosticId::MacroRedefined => "macro redefined",
            DiagnosticId::MacroPredefinedRedefined => "predefined macro redefined",
            DiagnosticId::MacroPredefinedUndefined => "predefined macro undefined",
            DiagnosticId::MacroUnterminatedInvocation => "unterminated macro invocation",
            DiagnosticId::MacroTooFewArgs => "too few arguments for macro",
            DiagnosticId::MacroTooManyArgs => "too many arguments for macro",
            DiagnosticId::MacroDuplicateParameter => "duplicate macro parameter name",
            DiagnosticId::ConditionalEndifWithoutIf => "unexpected #endif found without a matching #if",
            DiagnosticId::ConditionalElseWithoutIf => "unexpected #else found without a matching #if",
            DiagnosticId::ConditionalElseAfterElse => "unexpected #else found after another #else",
            DiagnosticId::ConditionalElifWithoutIf => "unexpected #elif found without a matching #if",
            DiagnosticId::ConditionalElifAfterElse => "unexpected #elif found after #else",
            DiagnosticId::ConditionalUnterminated => "unexpected end of file found in conditional block",
            DiagnosticId::InvalidExtensionName => "invalid extension name",
            DiagnosticId::InvalidExtensionBehavior => "invalid extension behavior",
            DiagnosticId::InvalidExtensionDirective => "invalid extension directive",
            DiagnosticId::InvalidVersionNumber => "invalid version number",
            DiagnosticId::InvalidVersionDirective => "invalid version directive",
            DiagnosticId::VersionNotFirstStatement => "#version directive must occur before anything else, except for comments and white space",
            DiagnosticId::InvalidLineNumber => "invalid line number",
            DiagnosticId::InvalidFileNumber => "invalid file number",
            DiagnosticId::InvalidLineDirective => "invalid line directive",
            DiagnosticId::InvalidIncludeDirective => "invalid include directive",
            DiagnosticId::IncludeNotFound => "include file not found",
            DiagnosticId::ErrorDirective => "#error",
            DiagnosticId::ConditionalUnexpectedToken => "unexpected token after conditional expression",
            DiagnosticId::UnrecognizedPragma => "unrecognized pragma",
        }
    }
}

/// Individual diagnostic with rich context
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub id: DiagnosticId,
    pub message: String,
    pub location: SourceLocation,
    pub hints: Vec<String>,           // Suggestions for fixing
    pub related: Vec<SourceLocation>, // Related locations
}

impl Diagnostic {
    pub fn new(id: DiagnosticId, location: SourceLocation, text: &str) -> Self {
        let message = if text.is_empty() {
            id.description().to_string()
        } else {
            format!("{}: '{}'", id.description(), text)
        };
        Diagnostic {
            level: id.level(),
            id,
            message,
            location,
            hints: Vec::new(),
            related: Vec::new(),
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hints.push(hint.into());
        self
    }

    pub fn with_related(mut self, location: SourceLocation) -> Self {
        self.related.push(location);
        self
    }

    pub fn code(&self) -> &'static str {
        self.id.code()
    }
}

/// Diagnostic engine collecting tokenizer and preprocessor diagnostics in report order
pub struct DiagnosticEngine {
    pub diagnostics: Vec<Diagnostic>,
    pub warnings_as_errors: bool,
    pub disable_all_warnings: bool,
}

impl Default for DiagnosticEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticEngine {
    pub fn new() -> Self {
        DiagnosticEngine {
            diagnostics: Vec::new(),
            warnings_as_errors: false,
            disable_all_warnings: false,
        }
    }

    pub fn from_warnings(warnings: &[String]) -> Self {
        let warnings_as_errors = warnings.iter().any(|w| w == "error");
        let disable_all_warnings = warnings.iter().any(|w| w == "no-warnings");
        Self {
            diagnostics: Vec::new(),
            warnings_as_errors,
            disable_all_warnings,
        }
    }

    /// Report a diagnostic by id, with the offending text
    pub fn report(&mut self, id: DiagnosticId, location: SourceLocation, text: &str) {
        self.report_diagnostic(Diagnostic::new(id, location, text));
    }

    pub fn report_diagnostic(&mut self, mut diagnostic: Diagnostic) {
        if diagnostic.level == DiagnosticLevel::Warning {
            if self.disable_all_warnings {
                return;
            }
            if self.warnings_as_errors {
                diagnostic.level = DiagnosticLevel::Error;
            }
        }
        log::debug!("diagnostic {} at {}: {}", diagnostic.code(), diagnostic.location, diagnostic.message);
        self.diagnostics.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.level == DiagnosticLevel::Error)
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.level == DiagnosticLevel::Error).count()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Ids of all reported diagnostics, in order
    pub fn ids(&self) -> Vec<DiagnosticId> {
        self.diagnostics.iter().map(|d| d.id).collect()
    }
}

/// Configurable plain-text formatter for diagnostics
pub struct ErrorFormatter {
    pub show_source: bool,
    pub show_hints: bool,
}

impl Default for ErrorFormatter {
    fn default() -> Self {
        ErrorFormatter {
            show_source: true,
            show_hints: true,
        }
    }
}

impl ErrorFormatter {
    /// Format a single diagnostic with its source line
    pub fn format_diagnostic(&self, diag: &Diagnostic, source_manager: &SourceManager) -> String {
        let level_str = match diag.level {
            DiagnosticLevel::Error => "error",
            DiagnosticLevel::Warning => "warning",
            DiagnosticLevel::Note => "note",
        };

        let mut result = format!("{}[{}]: {}", level_str, diag.code(), diag.message);

        if !diag.location.is_builtin() {
            let name = source_manager
                .get_file_info(SourceId::new(diag.location.source_index))
                .map(|info| info.name.as_str())
                .unwrap_or("<unknown>");
            result.push_str(&format!(" at {}:{}:{}", name, diag.location.line, diag.location.column));
        }

        if self.show_hints {
            for hint in &diag.hints {
                result.push_str(&format!("\n  hint: {}", hint));
            }
        }

        if self.show_source
            && let Some(line) = source_manager.line_text(diag.location)
        {
            let caret = " ".repeat(diag.location.column.saturating_sub(1) as usize);
            result.push_str(&format!("\n  |\n  | {}\n  | {}^", line, caret));
        }

        result
    }

    /// Format multiple diagnostics
    pub fn format_diagnostics(&self, diagnostics: &[Diagnostic], source_manager: &SourceManager) -> String {
        diagnostics
            .iter()
            .map(|diag| self.format_diagnostic(diag, source_manager))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Print all diagnostics to stderr
    pub fn print_diagnostics(&self, diagnostics: &[Diagnostic], source_manager: &SourceManager) {
        for diag in diagnostics {
            eprintln!("{}", self.format_diagnostic(diag, source_manager));
        }
    }
}
