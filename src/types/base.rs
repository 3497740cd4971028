//! Basic kinds, precisions and storage qualifiers, with their fixed spellings.

use std::fmt;

use serde::Serialize;

/// Fundamental category of a type. Declaration order is the ordering used by `TType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum BasicType {
    Void,
    Float,
    Int,
    UInt,
    Bool,
    Sampler2D,
    SamplerCube,
    SamplerExternalOES,
    Sampler2DRect,
    Struct,
}

impl BasicType {
    pub fn as_str(self) -> &'static str {
        match self {
            BasicType::Void => "void",
            BasicType::Float => "float",
            BasicType::Int => "int",
            BasicType::UInt => "uint",
            BasicType::Bool => "bool",
            BasicType::Sampler2D => "sampler2D",
            BasicType::SamplerCube => "samplerCube",
            BasicType::SamplerExternalOES => "samplerExternalOES",
            BasicType::Sampler2DRect => "sampler2DRect",
            BasicType::Struct => "structure",
        }
    }

    /// Kind code used in mangled names; structures are spelled out separately
    pub(crate) fn mangled_code(self) -> &'static str {
        match self {
            BasicType::Float => "f",
            BasicType::Int => "i",
            BasicType::UInt => "u",
            BasicType::Bool => "b",
            BasicType::Sampler2D => "s2",
            BasicType::SamplerCube => "sC",
            BasicType::SamplerExternalOES => "sE",
            BasicType::Sampler2DRect => "s2R",
            BasicType::Void | BasicType::Struct => "",
        }
    }

    pub fn is_sampler(self) -> bool {
        matches!(
            self,
            BasicType::Sampler2D | BasicType::SamplerCube | BasicType::SamplerExternalOES | BasicType::Sampler2DRect
        )
    }

    /// Kinds that accept a precision qualifier
    pub fn supports_precision(self) -> bool {
        matches!(self, BasicType::Float | BasicType::Int | BasicType::UInt) || self.is_sampler()
    }
}

impl fmt::Display for BasicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
pub enum Precision {
    #[default]
    Undefined,
    Low,
    Medium,
    High,
}

impl Precision {
    /// Empty for `Undefined`
    pub fn as_str(self) -> &'static str {
        match self {
            Precision::Undefined => "",
            Precision::Low => "lowp",
            Precision::Medium => "mediump",
            Precision::High => "highp",
        }
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storage or binding role of a declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Qualifier {
    /// Locals and intermediate values
    #[default]
    Temporary,
    /// Globals without a storage qualifier
    Global,
    Const,
    Attribute,
    VaryingIn,
    VaryingOut,
    InvariantVaryingIn,
    InvariantVaryingOut,
    Uniform,

    // function parameters
    In,
    Out,
    InOut,
    ConstReadOnly,

    // built-in variables
    Position,
    PointSize,
    FragCoord,
    FrontFacing,
    PointCoord,
    FragColor,
    FragData,
}

impl Qualifier {
    pub fn as_str(self) -> &'static str {
        match self {
            Qualifier::Temporary => "Temporary",
            Qualifier::Global => "Global",
            Qualifier::Const | Qualifier::ConstReadOnly => "const",
            Qualifier::Attribute => "attribute",
            Qualifier::VaryingIn | Qualifier::VaryingOut => "varying",
            Qualifier::InvariantVaryingIn | Qualifier::InvariantVaryingOut => "invariant varying",
            Qualifier::Uniform => "uniform",
            Qualifier::In => "in",
            Qualifier::Out => "out",
            Qualifier::InOut => "inout",
            Qualifier::Position => "Position",
            Qualifier::PointSize => "PointSize",
            Qualifier::FragCoord => "FragCoord",
            Qualifier::FrontFacing => "FrontFacing",
            Qualifier::PointCoord => "PointCoord",
            Qualifier::FragColor => "FragColor",
            Qualifier::FragData => "FragData",
        }
    }

    /// Qualifiers that do not show up in a type description
    pub(crate) fn is_implicit(self) -> bool {
        matches!(self, Qualifier::Temporary | Qualifier::Global)
    }
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
