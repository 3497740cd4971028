//! Directive handling and conditional compilation.
//!
//! `DirectiveParser` sits directly on top of the tokenizers (one per open
//! include), consumes every directive line, drops newlines and the contents of
//! skipped groups, and hands the remaining tokens to the macro expander.

use std::path::PathBuf;

use indexmap::IndexMap;
use serde::Serialize;
use symbol_table::GlobalSymbol as Symbol;

use crate::diagnostic::{DiagnosticEngine, DiagnosticId};
use crate::pp::expander::{PPContext, TokenSource, expand_tokens};
use crate::pp::expression::{ExprError, ExprParser};
use crate::pp::header_search::HeaderSearch;
use crate::pp::macros::{Macro, is_reserved_name};
use crate::pp::preprocessor::PPError;
use crate::pp::token::{Token, TokenFlags, TokenKind, TokenValue};
use crate::pp::tokenizer::Tokenizer;
use crate::source_manager::{SourceId, SourceLocation};

/// Preprocessor directive kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    Define,
    Undef,
    If,
    Ifdef,
    Ifndef,
    Elif,
    Else,
    Endif,
    Error,
    Pragma,
    Extension,
    Version,
    Line,
    Include,
}

impl DirectiveKind {
    pub fn from_name(name: &str) -> Option<DirectiveKind> {
        let kind = match name {
            "define" => DirectiveKind::Define,
            "undef" => DirectiveKind::Undef,
            "if" => DirectiveKind::If,
            "ifdef" => DirectiveKind::Ifdef,
            "ifndef" => DirectiveKind::Ifndef,
            "elif" => DirectiveKind::Elif,
            "else" => DirectiveKind::Else,
            "endif" => DirectiveKind::Endif,
            "error" => DirectiveKind::Error,
            "pragma" => DirectiveKind::Pragma,
            "extension" => DirectiveKind::Extension,
            "version" => DirectiveKind::Version,
            "line" => DirectiveKind::Line,
            "include" => DirectiveKind::Include,
            _ => return None,
        };
        Some(kind)
    }

    fn is_conditional(self) -> bool {
        matches!(
            self,
            DirectiveKind::If
                | DirectiveKind::Ifdef
                | DirectiveKind::Ifndef
                | DirectiveKind::Elif
                | DirectiveKind::Else
                | DirectiveKind::Endif
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExtensionBehavior {
    Require,
    Enable,
    Warn,
    Disable,
}

impl ExtensionBehavior {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "require" => Some(ExtensionBehavior::Require),
            "enable" => Some(ExtensionBehavior::Enable),
            "warn" => Some(ExtensionBehavior::Warn),
            "disable" => Some(ExtensionBehavior::Disable),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExtensionBehavior::Require => "require",
            ExtensionBehavior::Enable => "enable",
            ExtensionBehavior::Warn => "warn",
            ExtensionBehavior::Disable => "disable",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pragma {
    pub name: String,
    pub value: Option<String>,
    /// `#pragma STDGL ...`
    pub stdgl: bool,
    pub location: SourceLocation,
}

/// What the directives of one unit declared
#[derive(Debug, Clone, Default, Serialize)]
pub struct DirectiveSummary {
    pub version: Option<u32>,
    pub pragmas: Vec<Pragma>,
    pub extensions: IndexMap<String, ExtensionBehavior>,
}

/// Represents conditional compilation state
#[derive(Debug, Clone)]
struct PPConditionalInfo {
    if_loc: SourceLocation,
    /// The whole block sits inside a skipped group
    was_skipping: bool,
    /// The current group of this block is skipped
    skip_group: bool,
    found_else: bool,
    found_non_skipping: bool,
}

struct IncludeFrame {
    tokenizer: Tokenizer,
    name: String,
    dir: Option<PathBuf>,
    /// Conditional stack height when the file was entered
    conditional_depth: usize,
}

pub(crate) struct DirectiveParser {
    lexer_stack: Vec<IncludeFrame>,
    conditional_stack: Vec<PPConditionalInfo>,
    header_search: HeaderSearch,
    past_first_statement: bool,
}

impl TokenSource for DirectiveParser {
    fn lex(&mut self, ctx: &mut PPContext<'_>) -> Result<Token, PPError> {
        loop {
            let token = self.raw_lex(ctx.diag);
            match token.kind {
                TokenKind::Hash if token.at_start_of_line() => {
                    self.parse_directive(ctx)?;
                    self.past_first_statement = true;
                }
                TokenKind::Eof => {
                    if self.end_of_file(ctx.diag) {
                        return Ok(token);
                    }
                }
                _ if self.skipping() => {}
                TokenKind::Newline => {}
                _ => {
                    self.past_first_statement = true;
                    return Ok(token);
                }
            }
        }
    }
}

impl DirectiveParser {
    pub fn new(tokenizer: Tokenizer, include_paths: &[PathBuf]) -> Self {
        DirectiveParser {
            lexer_stack: vec![IncludeFrame {
                tokenizer,
                name: String::new(),
                dir: None,
                conditional_depth: 0,
            }],
            conditional_stack: Vec::new(),
            header_search: HeaderSearch::new(include_paths),
            past_first_statement: false,
        }
    }

    fn raw_lex(&mut self, diag: &mut DiagnosticEngine) -> Token {
        match self.lexer_stack.last_mut() {
            Some(frame) => frame.tokenizer.lex(diag),
            None => Token::eof(SourceLocation::builtin()),
        }
    }

    /// Remaining tokens of the current line; the terminating newline is consumed
    fn read_line(&mut self, diag: &mut DiagnosticEngine) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.raw_lex(diag);
            if matches!(token.kind, TokenKind::Newline | TokenKind::Eof) {
                return tokens;
            }
            tokens.push(token);
        }
    }

    fn skipping(&self) -> bool {
        self.conditional_stack
            .last()
            .is_some_and(|block| block.was_skipping || block.skip_group)
    }

    /// Number of conditional blocks opened before the current file was entered
    fn file_conditional_depth(&self) -> usize {
        self.lexer_stack.last().map_or(0, |frame| frame.conditional_depth)
    }

    /// Innermost conditional block opened by the current file
    fn file_block_mut(&mut self) -> Option<&mut PPConditionalInfo> {
        let depth = self.file_conditional_depth();
        if self.conditional_stack.len() <= depth {
            return None;
        }
        self.conditional_stack.last_mut()
    }

    /// Close the current file; true when the main input itself has ended
    fn end_of_file(&mut self, diag: &mut DiagnosticEngine) -> bool {
        let depth = self.file_conditional_depth();
        if let Some(block) = self.file_block_mut() {
            diag.report(DiagnosticId::ConditionalUnterminated, block.if_loc, "");
            self.conditional_stack.truncate(depth);
        }
        if self.lexer_stack.len() > 1 {
            if let Some(frame) = self.lexer_stack.pop() {
                log::debug!("leave include {}", frame.name);
            }
            return false;
        }
        true
    }

    fn parse_directive(&mut self, ctx: &mut PPContext<'_>) -> Result<(), PPError> {
        let token = self.raw_lex(ctx.diag);
        if matches!(token.kind, TokenKind::Newline | TokenKind::Eof) {
            // null directive
            return Ok(());
        }

        let kind = token.kind.identifier().and_then(|name| DirectiveKind::from_name(name.as_str()));
        let Some(kind) = kind else {
            if !self.skipping() {
                ctx.diag.report(DiagnosticId::DirectiveInvalidName, token.location, token.text());
            }
            self.read_line(ctx.diag);
            return Ok(());
        };

        if self.skipping() && !kind.is_conditional() {
            self.read_line(ctx.diag);
            return Ok(());
        }

        let loc = token.location;
        let line = self.read_line(ctx.diag);
        match kind {
            DirectiveKind::Define => self.handle_define(&line, loc, ctx),
            DirectiveKind::Undef => self.handle_undef(&line, loc, ctx),
            DirectiveKind::If => {
                let condition = if self.skipping() {
                    false
                } else {
                    self.evaluate_condition(line, loc, ctx)?
                };
                self.handle_if_directive(condition, loc);
            }
            DirectiveKind::Ifdef => self.handle_ifdef(&line, loc, ctx, true),
            DirectiveKind::Ifndef => self.handle_ifdef(&line, loc, ctx, false),
            DirectiveKind::Elif => self.handle_elif(line, loc, ctx)?,
            DirectiveKind::Else => self.handle_else(&line, loc, ctx),
            DirectiveKind::Endif => self.handle_endif(&line, loc, ctx),
            DirectiveKind::Error => self.handle_error(&line, loc, ctx),
            DirectiveKind::Pragma => self.handle_pragma(&line, loc, ctx),
            DirectiveKind::Extension => self.handle_extension(&line, loc, ctx),
            DirectiveKind::Version => self.handle_version(&line, loc, ctx),
            DirectiveKind::Line => self.handle_line(line, loc, ctx)?,
            DirectiveKind::Include => self.handle_include(&line, loc, ctx)?,
        }
        Ok(())
    }

    fn handle_define(&mut self, line: &[Token], loc: SourceLocation, ctx: &mut PPContext<'_>) {
        let Some(first) = line.first() else {
            ctx.diag.report(DiagnosticId::UnexpectedToken, loc, "");
            return;
        };
        let Some(name) = first.kind.identifier() else {
            ctx.diag.report(DiagnosticId::UnexpectedToken, first.location, first.text());
            return;
        };
        if ctx.macros.get(name).is_some_and(|m| m.is_predefined()) {
            ctx.diag.report(DiagnosticId::MacroPredefinedRedefined, first.location, name.as_str());
            return;
        }
        if is_reserved_name(name.as_str()) {
            ctx.diag.report(DiagnosticId::MacroNameReserved, first.location, name.as_str());
            return;
        }

        let rest = &line[1..];
        let function_like = rest
            .first()
            .is_some_and(|t| t.kind == TokenKind::LeftParen && !t.has_leading_space());

        let mut mac = if function_like {
            let Some((params, body_start)) = parse_macro_params(rest, ctx.diag) else {
                return;
            };
            Macro::function(name, params, rest[body_start..].to_vec(), first.location)
        } else {
            Macro::object(name, rest.to_vec(), first.location)
        };
        if let Some(body_first) = mac.replacements.first_mut() {
            body_first.set_has_leading_space(false);
        }
        ctx.macros.define(mac, ctx.diag);
    }

    fn handle_undef(&mut self, line: &[Token], loc: SourceLocation, ctx: &mut PPContext<'_>) {
        let Some(first) = line.first() else {
            ctx.diag.report(DiagnosticId::UnexpectedToken, loc, "");
            return;
        };
        let Some(name) = first.kind.identifier() else {
            ctx.diag.report(DiagnosticId::UnexpectedToken, first.location, first.text());
            return;
        };
        ctx.macros.undef(name, first.location, ctx.diag);
        if let Some(extra) = line.get(1) {
            ctx.diag.report(DiagnosticId::UnexpectedToken, extra.location, extra.text());
        }
    }

    fn handle_if_directive(&mut self, condition: bool, loc: SourceLocation) {
        let was_skipping = self.skipping();
        log::trace!("#if at {} -> {}", loc, condition);
        self.conditional_stack.push(PPConditionalInfo {
            if_loc: loc,
            was_skipping,
            skip_group: !condition,
            found_else: false,
            found_non_skipping: condition,
        });
    }

    fn handle_ifdef(&mut self, line: &[Token], loc: SourceLocation, ctx: &mut PPContext<'_>, want_defined: bool) {
        if self.skipping() {
            self.handle_if_directive(false, loc);
            return;
        }
        let condition = match line.first() {
            Some(token) => match token.kind.identifier() {
                Some(name) => {
                    if let Some(extra) = line.get(1) {
                        ctx.diag
                            .report(DiagnosticId::ConditionalUnexpectedToken, extra.location, extra.text());
                    }
                    ctx.macros.is_defined(name) == want_defined
                }
                None => {
                    ctx.diag.report(DiagnosticId::UnexpectedToken, token.location, token.text());
                    false
                }
            },
            None => {
                ctx.diag.report(DiagnosticId::UnexpectedToken, loc, "");
                false
            }
        };
        self.handle_if_directive(condition, loc);
    }

    fn handle_elif(&mut self, line: Vec<Token>, loc: SourceLocation, ctx: &mut PPContext<'_>) -> Result<(), PPError> {
        let Some(block) = self.file_block_mut() else {
            ctx.diag.report(DiagnosticId::ConditionalElifWithoutIf, loc, "");
            return Ok(());
        };
        if block.was_skipping {
            return Ok(());
        }
        if block.found_else {
            ctx.diag.report(DiagnosticId::ConditionalElifAfterElse, loc, "");
            return Ok(());
        }
        if block.found_non_skipping {
            // an earlier group was taken; the expression is not evaluated
            if let Some(block) = self.conditional_stack.last_mut() {
                block.skip_group = true;
            }
            return Ok(());
        }

        let condition = self.evaluate_condition(line, loc, ctx)?;
        if let Some(block) = self.conditional_stack.last_mut() {
            block.skip_group = !condition;
            block.found_non_skipping = condition;
        }
        Ok(())
    }

    fn handle_else(&mut self, line: &[Token], loc: SourceLocation, ctx: &mut PPContext<'_>) {
        let Some(block) = self.file_block_mut() else {
            ctx.diag.report(DiagnosticId::ConditionalElseWithoutIf, loc, "");
            return;
        };
        if block.was_skipping {
            return;
        }
        if block.found_else {
            ctx.diag.report(DiagnosticId::ConditionalElseAfterElse, loc, "");
            return;
        }
        block.found_else = true;
        block.skip_group = block.found_non_skipping;
        block.found_non_skipping = true;
        if let Some(extra) = line.first() {
            ctx.diag
                .report(DiagnosticId::ConditionalUnexpectedToken, extra.location, extra.text());
        }
    }

    fn handle_endif(&mut self, line: &[Token], loc: SourceLocation, ctx: &mut PPContext<'_>) {
        if self.file_block_mut().is_none() {
            ctx.diag.report(DiagnosticId::ConditionalEndifWithoutIf, loc, "");
            return;
        }
        let was_skipping = self.skipping();
        self.conditional_stack.pop();
        if !was_skipping && let Some(extra) = line.first() {
            ctx.diag
                .report(DiagnosticId::ConditionalUnexpectedToken, extra.location, extra.text());
        }
    }

    /// Fold `defined`, expand macros and evaluate; malformed expressions are false
    fn evaluate_condition(
        &mut self,
        line: Vec<Token>,
        loc: SourceLocation,
        ctx: &mut PPContext<'_>,
    ) -> Result<bool, PPError> {
        let Some(folded) = fold_defined(line, ctx) else {
            return Ok(false);
        };
        let expanded = expand_tokens(folded, 0, ctx)?;
        if expanded.is_empty() {
            ctx.diag.report(DiagnosticId::InvalidExpression, loc, "");
            return Ok(false);
        }

        let mut parser = ExprParser::new(&expanded);
        let result = parser.parse_expression().and_then(|expr| {
            if let Some(extra) = parser.remaining().first() {
                return Err(ExprError::Invalid(extra.text().to_string()));
            }
            expr.evaluate()
        });
        match result {
            Ok(value) => Ok(value != 0),
            Err(err) => {
                let (id, text) = match err {
                    ExprError::Invalid(text) => (DiagnosticId::InvalidExpression, text),
                    ExprError::DivisionByZero => (DiagnosticId::DivisionByZero, String::new()),
                    ExprError::IntegerOverflow(text) => (DiagnosticId::IntegerOverflow, text),
                };
                ctx.diag.report(id, loc, &text);
                Ok(false)
            }
        }
    }

    fn handle_error(&mut self, line: &[Token], loc: SourceLocation, ctx: &mut PPContext<'_>) {
        ctx.diag.report(DiagnosticId::ErrorDirective, loc, &line_text(line));
    }

    fn handle_pragma(&mut self, line: &[Token], loc: SourceLocation, ctx: &mut PPContext<'_>) {
        if line.is_empty() {
            return;
        }
        let stdgl = line[0].kind.identifier().is_some_and(|s| s.as_str() == "STDGL");
        let rest = if stdgl { &line[1..] } else { line };

        let parsed = match rest {
            [name] => name.kind.identifier().map(|n| (n, None)),
            [name, open, value, close]
                if open.kind == TokenKind::LeftParen && close.kind == TokenKind::RightParen =>
            {
                name.kind.identifier().map(|n| (n, Some(value.text().to_string())))
            }
            _ => None,
        };
        let Some((name, value)) = parsed else {
            ctx.diag.report(DiagnosticId::UnrecognizedPragma, loc, &line_text(line));
            return;
        };

        if !stdgl && !matches!(name.as_str(), "optimize" | "debug") {
            ctx.diag.report(DiagnosticId::UnrecognizedPragma, loc, name.as_str());
        }
        ctx.summary.pragmas.push(Pragma {
            name: name.as_str().to_string(),
            value,
            stdgl,
            location: loc,
        });
    }

    fn handle_extension(&mut self, line: &[Token], loc: SourceLocation, ctx: &mut PPContext<'_>) {
        let Some(name) = line.first().and_then(|t| t.kind.identifier()) else {
            let text = line.first().map_or("", |t| t.text());
            ctx.diag.report(DiagnosticId::InvalidExtensionName, loc, text);
            return;
        };
        match line.get(1) {
            Some(colon) if colon.kind == TokenKind::Colon => {}
            Some(other) => {
                ctx.diag.report(DiagnosticId::UnexpectedToken, other.location, other.text());
                return;
            }
            None => {
                ctx.diag.report(DiagnosticId::InvalidExtensionDirective, loc, "");
                return;
            }
        }
        let behavior_token = line.get(2);
        let behavior = behavior_token
            .and_then(|t| t.kind.identifier())
            .and_then(|b| ExtensionBehavior::from_name(b.as_str()));
        let Some(behavior) = behavior else {
            let text = behavior_token.map_or("", |t| t.text());
            ctx.diag.report(DiagnosticId::InvalidExtensionBehavior, loc, text);
            return;
        };
        if let Some(extra) = line.get(3) {
            ctx.diag
                .report(DiagnosticId::InvalidExtensionDirective, extra.location, extra.text());
            return;
        }

        let name = name.as_str();
        if name == "all" {
            if matches!(behavior, ExtensionBehavior::Require | ExtensionBehavior::Enable) {
                ctx.diag.report(DiagnosticId::InvalidExtensionBehavior, loc, behavior.as_str());
                return;
            }
        } else if behavior == ExtensionBehavior::Require && !ctx.lang_opts.supports_extension(name) {
            ctx.diag.report(DiagnosticId::InvalidExtensionName, loc, name);
            return;
        }
        log::debug!("#extension {} : {}", name, behavior.as_str());
        ctx.summary.extensions.insert(name.to_string(), behavior);
    }

    fn handle_version(&mut self, line: &[Token], loc: SourceLocation, ctx: &mut PPContext<'_>) {
        if self.past_first_statement {
            ctx.diag.report(DiagnosticId::VersionNotFirstStatement, loc, "");
            return;
        }
        let Some(number) = line.first() else {
            ctx.diag.report(DiagnosticId::InvalidVersionNumber, loc, "");
            return;
        };
        let version = match number.int_value() {
            Some(v @ (100 | 300)) => v as u32,
            _ => {
                ctx.diag.report(DiagnosticId::InvalidVersionNumber, number.location, number.text());
                return;
            }
        };

        let profile_ok = match (version, &line[1..]) {
            (100, []) => true,
            (300, [profile]) => profile.kind.identifier().is_some_and(|p| p.as_str() == "es"),
            _ => false,
        };
        if !profile_ok {
            let text = line.get(1).map_or("", |t| t.text());
            ctx.diag.report(DiagnosticId::InvalidVersionDirective, loc, text);
            return;
        }

        log::debug!("#version {}", version);
        ctx.summary.version = Some(version);
        ctx.macros.redefine_predefined("__VERSION__", version as i64);
    }

    fn handle_line(&mut self, line: Vec<Token>, loc: SourceLocation, ctx: &mut PPContext<'_>) -> Result<(), PPError> {
        let expanded = expand_tokens(line, 0, ctx)?;

        let line_number = match expanded.first() {
            Some(token) => match token.int_value().and_then(|v| u32::try_from(v).ok()) {
                Some(n) => n,
                None => {
                    ctx.diag.report(DiagnosticId::InvalidLineNumber, token.location, token.text());
                    return Ok(());
                }
            },
            None => {
                ctx.diag.report(DiagnosticId::InvalidLineDirective, loc, "");
                return Ok(());
            }
        };
        let source_number = match expanded.get(1) {
            Some(token) => match token.int_value().and_then(|v| u32::try_from(v).ok()) {
                Some(n) => Some(n),
                None => {
                    ctx.diag.report(DiagnosticId::InvalidFileNumber, token.location, token.text());
                    return Ok(());
                }
            },
            None => None,
        };
        if let Some(extra) = expanded.get(2) {
            ctx.diag.report(DiagnosticId::InvalidLineDirective, extra.location, extra.text());
            return Ok(());
        }

        if let Some(frame) = self.lexer_stack.last_mut() {
            frame.tokenizer.set_line_number(line_number);
            if let Some(source) = source_number {
                frame.tokenizer.set_source_index(source);
            }
        }
        Ok(())
    }

    fn handle_include(&mut self, line: &[Token], loc: SourceLocation, ctx: &mut PPContext<'_>) -> Result<(), PPError> {
        let name = match line {
            [token] => match token.kind {
                TokenKind::StringLiteral(text) => text.as_str().trim_matches('"').to_string(),
                _ => {
                    ctx.diag.report(DiagnosticId::InvalidIncludeDirective, token.location, token.text());
                    return Ok(());
                }
            },
            _ => {
                ctx.diag.report(DiagnosticId::InvalidIncludeDirective, loc, &line_text(line));
                return Ok(());
            }
        };

        if self.lexer_stack.len() > ctx.config.max_include_depth {
            return Err(PPError::IncludeDepthExceeded { name, location: loc });
        }

        let current_dir = self.lexer_stack.last().and_then(|frame| frame.dir.clone());
        let resolved = if ctx.sources.has_include_source(&name) {
            None
        } else {
            match self.header_search.resolve_path(&name, current_dir.as_deref()) {
                Some(path) => Some(path),
                None => {
                    ctx.diag.report(DiagnosticId::IncludeNotFound, loc, &name);
                    return Ok(());
                }
            }
        };

        let id: SourceId = ctx
            .sources
            .load_include(&name, resolved.as_deref())
            .map_err(|source| PPError::Io {
                name: name.clone(),
                source,
            })?;

        log::debug!("enter include {} as {}", name, id);
        let tokenizer = Tokenizer::new(ctx.sources.reader(&[id]));
        self.lexer_stack.push(IncludeFrame {
            tokenizer,
            name,
            dir: resolved.and_then(|path| path.parent().map(|p| p.to_path_buf())),
            conditional_depth: self.conditional_stack.len(),
        });
        Ok(())
    }
}

/// Parameter list of a function-like macro starting at `(`; returns the names and the body offset
fn parse_macro_params(tokens: &[Token], diag: &mut DiagnosticEngine) -> Option<(Vec<Symbol>, usize)> {
    let mut params: Vec<Symbol> = Vec::new();
    let mut i = 1;
    loop {
        let Some(token) = tokens.get(i) else {
            let loc = tokens.last().map(|t| t.location).unwrap_or_default();
            diag.report(DiagnosticId::UnexpectedToken, loc, "");
            return None;
        };
        match token.kind {
            TokenKind::RightParen if params.is_empty() => return Some((params, i + 1)),
            TokenKind::Identifier(param) => {
                if params.contains(&param) {
                    diag.report(DiagnosticId::MacroDuplicateParameter, token.location, param.as_str());
                    return None;
                }
                params.push(param);
            }
            _ => {
                diag.report(DiagnosticId::UnexpectedToken, token.location, token.text());
                return None;
            }
        }
        match tokens.get(i + 1).map(|t| t.kind) {
            Some(TokenKind::Comma) => i += 2,
            Some(TokenKind::RightParen) => return Some((params, i + 2)),
            _ => {
                let next = tokens.get(i + 1).unwrap_or(token);
                diag.report(DiagnosticId::UnexpectedToken, next.location, next.text());
                return None;
            }
        }
    }
}

/// Replace `defined X` and `defined(X)` with 1 or 0 before expansion
fn fold_defined(line: Vec<Token>, ctx: &mut PPContext<'_>) -> Option<Vec<Token>> {
    let mut out = Vec::with_capacity(line.len());
    let mut iter = line.into_iter().peekable();
    while let Some(token) = iter.next() {
        if !token.kind.identifier().is_some_and(|s| s.as_str() == "defined") {
            out.push(token);
            continue;
        }
        let paren = iter.next_if(|t| t.kind == TokenKind::LeftParen).is_some();
        let name = iter.next().and_then(|t| t.kind.identifier());
        let closed = !paren || iter.next_if(|t| t.kind == TokenKind::RightParen).is_some();
        let (Some(name), true) = (name, closed) else {
            ctx.diag.report(DiagnosticId::InvalidExpression, token.location, "defined");
            return None;
        };
        let value = ctx.macros.is_defined(name) as i64;
        let mut folded = Token::new(
            TokenKind::IntConstant(Symbol::new(&value.to_string())),
            token.flags & TokenFlags::HAS_LEADING_SPACE,
            token.location,
        );
        folded.value = TokenValue::Int(value);
        out.push(folded);
    }
    Some(out)
}

/// Rebuild the text of a directive line from its tokens
fn line_text(tokens: &[Token]) -> String {
    let mut text = String::new();
    for (i, token) in tokens.iter().enumerate() {
        if i > 0 && token.has_leading_space() {
            text.push(' ');
        }
        text.push_str(token.text());
    }
    text
}
