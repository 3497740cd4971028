//! Macro expansion layered over any token source.

use std::collections::VecDeque;

use symbol_table::GlobalSymbol as Symbol;

use crate::diagnostic::{DiagnosticEngine, DiagnosticId};
use crate::lang_options::LangOptions;
use crate::pp::directive::DirectiveSummary;
use crate::pp::macros::{Macro, MacroKind, MacroTable};
use crate::pp::preprocessor::{PPConfig, PPError};
use crate::pp::token::{Token, TokenFlags, TokenKind, TokenValue};
use crate::source_manager::{SourceLocation, SourceManager};

/// Mutable state shared by every layer of the pipeline
pub(crate) struct PPContext<'a> {
    pub macros: &'a mut MacroTable,
    pub diag: &'a mut DiagnosticEngine,
    pub sources: &'a mut SourceManager,
    pub summary: &'a mut DirectiveSummary,
    pub config: &'a PPConfig,
    pub lang_opts: &'a LangOptions,
}

/// Something that yields tokens, ending with an endless run of `Eof`
pub(crate) trait TokenSource {
    fn lex(&mut self, ctx: &mut PPContext<'_>) -> Result<Token, PPError>;
}

/// Replays a fixed token list
pub(crate) struct VecSource {
    tokens: std::vec::IntoIter<Token>,
    end: SourceLocation,
}

impl VecSource {
    pub fn new(tokens: Vec<Token>) -> Self {
        let end = tokens.last().map(|t| t.location).unwrap_or_default();
        VecSource {
            tokens: tokens.into_iter(),
            end,
        }
    }
}

impl TokenSource for VecSource {
    fn lex(&mut self, _ctx: &mut PPContext<'_>) -> Result<Token, PPError> {
        Ok(self.tokens.next().unwrap_or_else(|| Token::eof(self.end)))
    }
}

/// Replacement list of one active expansion
struct MacroContext {
    name: Symbol,
    tokens: std::vec::IntoIter<Token>,
}

/// Function-like macro invocation whose arguments still have to be expanded
struct Invocation {
    name: Symbol,
    identifier: Token,
    mac: Macro,
    args: Vec<Vec<Token>>,
}

enum Step {
    Token(Token),
    Invoke(Invocation),
}

pub(crate) struct MacroExpander<S: TokenSource> {
    source: S,
    contexts: Vec<MacroContext>,
    pending: VecDeque<Token>,
    /// Expansion depth of the expander this one works for, when expanding arguments
    base_depth: usize,
}

impl<S: TokenSource> MacroExpander<S> {
    pub fn new(source: S) -> Self {
        Self::with_depth(source, 0)
    }

    fn with_depth(source: S, base_depth: usize) -> Self {
        MacroExpander {
            source,
            contexts: Vec::new(),
            pending: VecDeque::new(),
            base_depth,
        }
    }

    /// Next fully expanded token
    pub fn lex(&mut self, ctx: &mut PPContext<'_>) -> Result<Token, PPError> {
        loop {
            match self.step(ctx)? {
                Step::Token(token) => return Ok(token),
                Step::Invoke(mut invocation) => {
                    let args = std::mem::take(&mut invocation.args);
                    let expanded = expand_arguments(args, self.depth() + 1, ctx)?;
                    self.finish_invocation(invocation, expanded, ctx);
                }
            }
        }
    }

    /// Next token, or a function-like invocation that is waiting for its arguments
    fn step(&mut self, ctx: &mut PPContext<'_>) -> Result<Step, PPError> {
        loop {
            let mut token = self.get_token(ctx)?;
            let Some(name) = token.kind.identifier() else {
                return Ok(Step::Token(token));
            };
            if token.expansion_disabled() {
                return Ok(Step::Token(token));
            }
            let Some(mac) = ctx.macros.get(name) else {
                return Ok(Step::Token(token));
            };
            if mac.is_disabled() {
                // never expand this token again, even after the macro is re-enabled
                token.flags |= TokenFlags::EXPANSION_DISABLED;
                return Ok(Step::Token(token));
            }
            if mac.kind == MacroKind::Function && !self.is_next_token_left_paren(ctx)? {
                return Ok(Step::Token(token));
            }
            if let Some(invocation) = self.begin_macro(name, token, ctx)? {
                return Ok(Step::Invoke(invocation));
            }
        }
    }

    fn get_token(&mut self, ctx: &mut PPContext<'_>) -> Result<Token, PPError> {
        if let Some(token) = self.pending.pop_front() {
            return Ok(token);
        }
        while let Some(top) = self.contexts.last_mut() {
            if let Some(token) = top.tokens.next() {
                return Ok(token);
            }
            self.pop_macro(ctx);
        }
        self.source.lex(ctx)
    }

    fn pop_macro(&mut self, ctx: &mut PPContext<'_>) {
        if let Some(context) = self.contexts.pop() {
            log::trace!("leave expansion of {}", context.name);
            ctx.macros.set_disabled(context.name, false);
        }
    }

    fn is_next_token_left_paren(&mut self, ctx: &mut PPContext<'_>) -> Result<bool, PPError> {
        let token = self.get_token(ctx)?;
        let is_paren = token.kind == TokenKind::LeftParen;
        self.pending.push_front(token);
        Ok(is_paren)
    }

    fn depth(&self) -> usize {
        self.base_depth + self.contexts.len()
    }

    /// Start expanding `name`. Object-like and predefined macros are entered right
    /// away; a function-like macro hands back its raw arguments.
    fn begin_macro(
        &mut self,
        name: Symbol,
        identifier: Token,
        ctx: &mut PPContext<'_>,
    ) -> Result<Option<Invocation>, PPError> {
        if self.depth() >= ctx.config.max_expansion_depth {
            log::debug!("expansion depth limit hit while expanding {}", name);
            return Err(PPError::ExpansionDepthExceeded {
                name: name.as_str().to_string(),
                location: identifier.location,
            });
        }
        let Some(mac) = ctx.macros.get(name).cloned() else {
            return Ok(None);
        };

        if mac.is_predefined() {
            let value = match name.as_str() {
                "__LINE__" => Some(identifier.location.line as i64),
                "__FILE__" => Some(identifier.location.source_index as i64),
                _ => None,
            };
            if let Some(value) = value {
                let text = value.to_string();
                let mut token = Token::new(
                    TokenKind::IntConstant(Symbol::new(&text)),
                    TokenFlags::empty(),
                    identifier.location,
                );
                token.value = TokenValue::Int(value);
                self.enter_expansion(name, &identifier, vec![token], ctx);
                return Ok(None);
            }
        }

        if mac.kind == MacroKind::Object {
            let replacements = mac.replacements.clone();
            self.enter_expansion(name, &identifier, replacements, ctx);
            return Ok(None);
        }

        let Some(args) = self.collect_macro_args(&mac.params, &identifier, ctx)? else {
            return Ok(None);
        };
        Ok(Some(Invocation {
            name,
            identifier,
            mac,
            args,
        }))
    }

    /// Substitute expanded arguments into the replacement list and enter it
    fn finish_invocation(&mut self, invocation: Invocation, args: Vec<Vec<Token>>, ctx: &mut PPContext<'_>) {
        let mac = &invocation.mac;
        let mut replacements = Vec::with_capacity(mac.replacements.len());
        for token in &mac.replacements {
            let param = token.kind.identifier().and_then(|id| mac.param_index(id));
            match param.and_then(|index| args.get(index)) {
                Some(arg) => {
                    let start = replacements.len();
                    replacements.extend_from_slice(arg);
                    if let Some(first) = replacements.get_mut(start) {
                        first.set_has_leading_space(token.has_leading_space());
                    }
                }
                None => replacements.push(*token),
            }
        }
        self.enter_expansion(invocation.name, &invocation.identifier, replacements, ctx);
    }

    fn enter_expansion(&mut self, name: Symbol, identifier: &Token, mut replacements: Vec<Token>, ctx: &mut PPContext<'_>) {
        for (i, token) in replacements.iter_mut().enumerate() {
            token.spelling = Some(token.spelling.unwrap_or(token.location));
            token.location = identifier.location;
            token.flags |= TokenFlags::MACRO_EXPANDED;
            if i == 0 {
                token.set_at_start_of_line(identifier.at_start_of_line());
                token.set_has_leading_space(identifier.has_leading_space());
            }
        }

        log::trace!("expand {} at {} ({} tokens)", name, identifier.location, replacements.len());
        ctx.macros.set_disabled(name, true);
        self.contexts.push(MacroContext {
            name,
            tokens: replacements.into_iter(),
        });
    }

    /// Read a parenthesised, comma separated argument list
    fn collect_macro_args(
        &mut self,
        params: &[Symbol],
        identifier: &Token,
        ctx: &mut PPContext<'_>,
    ) -> Result<Option<Vec<Vec<Token>>>, PPError> {
        let lparen = self.get_token(ctx)?;
        debug_assert_eq!(lparen.kind, TokenKind::LeftParen);

        let mut args: Vec<Vec<Token>> = vec![Vec::new()];
        let mut open_parens = 0usize;
        loop {
            let token = self.get_token(ctx)?;
            match token.kind {
                TokenKind::Eof => {
                    ctx.diag.report(
                        DiagnosticId::MacroUnterminatedInvocation,
                        identifier.location,
                        identifier.text(),
                    );
                    self.pending.push_front(token);
                    return Ok(None);
                }
                TokenKind::LeftParen => open_parens += 1,
                TokenKind::RightParen if open_parens == 0 => break,
                TokenKind::RightParen => open_parens -= 1,
                TokenKind::Comma if open_parens == 0 => {
                    args.push(Vec::new());
                    continue;
                }
                _ => {}
            }
            if let Some(arg) = args.last_mut() {
                arg.push(token);
            }
        }

        // `f()` passes no arguments to a macro without parameters
        if params.is_empty() && args.len() == 1 && args[0].is_empty() {
            args.clear();
        }
        if args.len() != params.len() {
            let id = if args.len() < params.len() {
                DiagnosticId::MacroTooFewArgs
            } else {
                DiagnosticId::MacroTooManyArgs
            };
            ctx.diag.report(id, identifier.location, identifier.text());
            return Ok(None);
        }
        Ok(Some(args))
    }
}

/// Arguments of one invocation being expanded, one argument at a time
struct ArgFrame {
    /// Invocation waiting for these arguments, `None` for the outermost list
    invocation: Option<Invocation>,
    remaining: std::vec::IntoIter<Vec<Token>>,
    expanded: Vec<Vec<Token>>,
    current: MacroExpander<VecSource>,
    out: Vec<Token>,
    depth: usize,
}

impl ArgFrame {
    fn new(invocation: Option<Invocation>, args: Vec<Vec<Token>>, depth: usize) -> Self {
        let mut remaining = args.into_iter();
        let first = remaining.next().unwrap_or_default();
        ArgFrame {
            invocation,
            expanded: Vec::with_capacity(remaining.len() + 1),
            remaining,
            current: MacroExpander::with_depth(VecSource::new(first), depth),
            out: Vec::new(),
            depth,
        }
    }

    /// Run until every argument is expanded or a nested invocation needs its own arguments
    fn advance(&mut self, ctx: &mut PPContext<'_>) -> Result<Option<Invocation>, PPError> {
        loop {
            match self.current.step(ctx)? {
                Step::Token(token) if token.is_eof() => {
                    self.expanded.push(std::mem::take(&mut self.out));
                    match self.remaining.next() {
                        Some(arg) => self.current = MacroExpander::with_depth(VecSource::new(arg), self.depth),
                        None => return Ok(None),
                    }
                }
                Step::Token(token) => self.out.push(token),
                Step::Invoke(invocation) => return Ok(Some(invocation)),
            }
        }
    }
}

/// Macro-expand every argument of an invocation in isolation.
///
/// Nested invocations inside the arguments are handled with an explicit
/// stack of frames, so nesting is bounded by `max_expansion_depth` alone.
fn expand_arguments(args: Vec<Vec<Token>>, depth: usize, ctx: &mut PPContext<'_>) -> Result<Vec<Vec<Token>>, PPError> {
    if args.is_empty() {
        return Ok(args);
    }
    let mut stack = vec![ArgFrame::new(None, args, depth)];
    while let Some(frame) = stack.last_mut() {
        if let Some(mut invocation) = frame.advance(ctx)? {
            let args = std::mem::take(&mut invocation.args);
            if args.is_empty() {
                frame.current.finish_invocation(invocation, args, ctx);
            } else {
                let depth = frame.current.depth() + 1;
                stack.push(ArgFrame::new(Some(invocation), args, depth));
            }
            continue;
        }

        let Some(done) = stack.pop() else { break };
        match (done.invocation, stack.last_mut()) {
            (Some(invocation), Some(parent)) => parent.current.finish_invocation(invocation, done.expanded, ctx),
            _ => return Ok(done.expanded),
        }
    }
    Ok(Vec::new())
}

/// Fully macro-expand a token list on its own
pub(crate) fn expand_tokens(tokens: Vec<Token>, depth: usize, ctx: &mut PPContext<'_>) -> Result<Vec<Token>, PPError> {
    let mut expander = MacroExpander::with_depth(VecSource::new(tokens), depth);
    let mut out = Vec::new();
    loop {
        let token = expander.lex(ctx)?;
        if token.is_eof() {
            return Ok(out);
        }
        out.push(token);
    }
}
