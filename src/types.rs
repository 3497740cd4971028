//! Shading-language type model.
//!
//! `TType` values live in a per-unit `TypeArena`; structure declarations are
//! registered there and referenced by `StructId`.

mod base;
mod public;
mod registry;
mod ty;

#[cfg(test)]
mod tests_types;

pub use base::{BasicType, Precision, Qualifier};
pub use public::PublicType;
pub use registry::{StructId, TypeArena, TypeId, TypeLine, TypeList};
pub use ty::TType;
