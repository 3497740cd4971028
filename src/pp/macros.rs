//! Macro definitions and the per-unit macro table.

use hashbrown::HashMap;
use symbol_table::GlobalSymbol as Symbol;

use crate::diagnostic::{DiagnosticEngine, DiagnosticId};
use crate::pp::token::{Token, TokenFlags, TokenKind, TokenValue};
use crate::source_manager::SourceLocation;

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct MacroFlags: u8 {
        /// Defined by the implementation; cannot be redefined or undefined
        const PREDEFINED = 1 << 0;
        /// Currently being expanded
        const DISABLED = 1 << 1;
        const USED = 1 << 2;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacroKind {
    Object,
    Function,
}

/// One macro definition
#[derive(Debug, Clone)]
pub struct Macro {
    pub name: Symbol,
    pub kind: MacroKind,
    pub params: Vec<Symbol>,
    pub replacements: Vec<Token>,
    pub location: SourceLocation,
    pub flags: MacroFlags,
}

impl Macro {
    pub fn object(name: Symbol, replacements: Vec<Token>, location: SourceLocation) -> Self {
        Macro {
            name,
            kind: MacroKind::Object,
            params: Vec::new(),
            replacements,
            location,
            flags: MacroFlags::empty(),
        }
    }

    pub fn function(name: Symbol, params: Vec<Symbol>, replacements: Vec<Token>, location: SourceLocation) -> Self {
        Macro {
            kind: MacroKind::Function,
            params,
            ..Macro::object(name, replacements, location)
        }
    }

    pub fn is_predefined(&self) -> bool {
        self.flags.contains(MacroFlags::PREDEFINED)
    }

    pub fn is_disabled(&self) -> bool {
        self.flags.contains(MacroFlags::DISABLED)
    }

    /// Two definitions are identical when kind, parameters and body spelling match
    pub fn equals(&self, other: &Macro) -> bool {
        self.kind == other.kind
            && self.params == other.params
            && self.replacements.len() == other.replacements.len()
            && self
                .replacements
                .iter()
                .zip(&other.replacements)
                .all(|(a, b)| a.same_spelling(b))
    }

    /// Index of `name` in the parameter list
    pub fn param_index(&self, name: Symbol) -> Option<usize> {
        self.params.iter().position(|p| *p == name)
    }
}

/// Names beginning with `GL_` or containing `__` belong to the implementation
pub fn is_reserved_name(name: &str) -> bool {
    name.starts_with("GL_") || name.contains("__")
}

/// Mapping from name to definition for one compilation unit
#[derive(Debug, Default)]
pub struct MacroTable {
    macros: HashMap<Symbol, Macro>,
}

impl MacroTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a builtin object-like macro whose body is a single integer
    pub fn predefine(&mut self, name: &str, value: i64) {
        let text = value.to_string();
        let mut token = Token::new(
            TokenKind::IntConstant(Symbol::new(&text)),
            TokenFlags::empty(),
            SourceLocation::builtin(),
        );
        token.value = TokenValue::Int(value);
        let mut mac = Macro::object(Symbol::new(name), vec![token], SourceLocation::builtin());
        mac.flags |= MacroFlags::PREDEFINED;
        log::debug!("predefined macro {} = {}", name, value);
        self.macros.insert(mac.name, mac);
    }

    /// Add a user definition, reporting conflicts. Returns whether the table changed.
    pub fn define(&mut self, mac: Macro, diag: &mut DiagnosticEngine) -> bool {
        if let Some(existing) = self.macros.get(&mac.name) {
            if existing.is_predefined() {
                diag.report(DiagnosticId::MacroPredefinedRedefined, mac.location, mac.name.as_str());
                return false;
            }
            if !existing.equals(&mac) {
                diag.report(DiagnosticId::MacroRedefined, mac.location, mac.name.as_str());
                return false;
            }
            return false;
        }
        log::debug!("define {} ({:?}, {} tokens)", mac.name, mac.kind, mac.replacements.len());
        self.macros.insert(mac.name, mac);
        true
    }

    /// Remove a user definition; predefined macros stay
    pub fn undef(&mut self, name: Symbol, location: SourceLocation, diag: &mut DiagnosticEngine) {
        match self.macros.get(&name) {
            Some(mac) if mac.is_predefined() => {
                diag.report(DiagnosticId::MacroPredefinedUndefined, location, name.as_str());
            }
            Some(_) => {
                log::debug!("undef {}", name);
                self.macros.remove(&name);
            }
            None => {}
        }
    }

    pub fn get(&self, name: Symbol) -> Option<&Macro> {
        self.macros.get(&name)
    }

    pub fn is_defined(&self, name: Symbol) -> bool {
        self.macros.contains_key(&name)
    }

    /// Whether `name` is defined and currently being expanded
    pub fn is_disabled(&self, name: Symbol) -> bool {
        self.macros.get(&name).is_some_and(|m| m.is_disabled())
    }

    pub(crate) fn set_disabled(&mut self, name: Symbol, disabled: bool) {
        if let Some(mac) = self.macros.get_mut(&name) {
            mac.flags.set(MacroFlags::DISABLED, disabled);
            if disabled {
                mac.flags |= MacroFlags::USED;
            }
        }
    }

    /// Replace the value of a predefined macro, e.g. `__VERSION__` after `#version`
    pub(crate) fn redefine_predefined(&mut self, name: &str, value: i64) {
        self.macros.remove(&Symbol::new(name));
        self.predefine(name, value);
    }

    pub fn len(&self) -> usize {
        self.macros.len()
    }

    pub fn is_empty(&self) -> bool {
        self.macros.is_empty()
    }
}
