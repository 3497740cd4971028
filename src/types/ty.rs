use std::cell::OnceCell;
use std::cmp::Ordering;
use std::fmt::Write as _;
use std::hash::{Hash, Hasher};

use symbol_table::GlobalSymbol as Symbol;

use crate::types::base::{BasicType, Precision, Qualifier};
use crate::types::public::PublicType;
use crate::types::registry::{StructId, TypeArena, TypeId, TypeLine};

/// A concrete shading-language type.
///
/// Equality and ordering look at the basic kind, nominal size, matrix and
/// array flags, the array size (arrays only) and the structure identity.
/// Qualifier and precision never take part.
#[derive(Debug, Clone)]
pub struct TType {
    basic: BasicType,
    precision: Precision,
    qualifier: Qualifier,
    size: u8,
    matrix: bool,
    array: bool,
    array_size: u32,
    max_array_size: u32,
    array_information_type: Option<TypeId>,
    structure: Option<StructId>,
    deepest_struct_nesting: u32,
    field_name: Option<Symbol>,
    type_name: Option<Symbol>,
    mangled: OnceCell<String>,
}

impl TType {
    pub fn new(
        basic: BasicType,
        precision: Precision,
        qualifier: Qualifier,
        size: u8,
        matrix: bool,
        array: bool,
    ) -> Self {
        if basic == BasicType::Struct {
            panic!("ICE: structure type built without a structure declaration");
        }
        debug_assert!((1..=4).contains(&size), "nominal size out of range: {size}");
        TType {
            basic,
            precision,
            qualifier,
            size,
            matrix,
            array,
            array_size: 0,
            max_array_size: 0,
            array_information_type: None,
            structure: None,
            deepest_struct_nesting: 0,
            field_name: None,
            type_name: None,
            mangled: OnceCell::new(),
        }
    }

    /// Temporary scalar without precision
    pub fn scalar(basic: BasicType) -> Self {
        TType::new(basic, Precision::Undefined, Qualifier::Temporary, 1, false, false)
    }

    pub fn vector(basic: BasicType, size: u8) -> Self {
        TType::new(basic, Precision::Undefined, Qualifier::Temporary, size, false, false)
    }

    /// Square float matrix with `size` columns
    pub fn float_matrix(size: u8) -> Self {
        TType::new(BasicType::Float, Precision::Undefined, Qualifier::Temporary, size, true, false)
    }

    /// Named structure type for an already declared structure
    pub fn new_struct(arena: &TypeArena, structure: StructId, name: &str, precision: Precision) -> Self {
        TType {
            basic: BasicType::Struct,
            precision,
            qualifier: Qualifier::Temporary,
            size: 1,
            matrix: false,
            array: false,
            array_size: 0,
            max_array_size: 0,
            array_information_type: None,
            structure: Some(structure),
            deepest_struct_nesting: arena.struct_nesting(structure),
            field_name: None,
            type_name: Some(Symbol::new(name)),
            mangled: OnceCell::new(),
        }
    }

    /// Commit a parser-side descriptor. A user-defined type contributes its
    /// structure and its name.
    pub fn from_public(p: &PublicType, arena: &TypeArena) -> Self {
        let mut ty = TType {
            basic: p.basic,
            precision: p.precision,
            qualifier: p.qualifier,
            size: p.size,
            matrix: p.matrix,
            array: p.array,
            array_size: if p.array { p.array_size } else { 0 },
            max_array_size: 0,
            array_information_type: None,
            structure: None,
            deepest_struct_nesting: 0,
            field_name: None,
            type_name: None,
            mangled: OnceCell::new(),
        };

        if let Some(user_def) = p.user_def {
            let def = arena.get(user_def);
            ty.structure = def.structure;
            ty.type_name = def.type_name;
            ty.deepest_struct_nesting = def.structure.map_or(0, |s| arena.struct_nesting(s));
        }

        if ty.basic == BasicType::Struct && ty.structure.is_none() {
            panic!("ICE: structure type at line {} has no user-defined type", p.line);
        }
        ty
    }

    pub fn basic_type(&self) -> BasicType {
        self.basic
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    pub fn qualifier(&self) -> Qualifier {
        self.qualifier
    }

    pub fn nominal_size(&self) -> u8 {
        self.size
    }

    pub fn is_matrix(&self) -> bool {
        self.matrix
    }

    pub fn is_array(&self) -> bool {
        self.array
    }

    pub fn array_size(&self) -> u32 {
        self.array_size
    }

    pub fn max_array_size(&self) -> u32 {
        self.max_array_size
    }

    /// Type an implicitly sized array took its size from
    pub fn array_information_type(&self) -> Option<TypeId> {
        self.array_information_type
    }

    pub fn structure(&self) -> Option<StructId> {
        self.structure
    }

    pub fn deepest_struct_nesting(&self) -> u32 {
        self.deepest_struct_nesting
    }

    pub fn is_vector(&self) -> bool {
        self.size > 1 && !self.matrix
    }

    pub fn is_scalar(&self) -> bool {
        self.size == 1 && !self.matrix && self.structure.is_none()
    }

    pub fn is_field(&self) -> bool {
        self.field_name.is_some()
    }

    pub fn field_name(&self) -> &'static str {
        match self.field_name {
            Some(name) => name.as_str(),
            None => panic!("ICE: field name requested on a type that is not a structure field"),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self.type_name {
            Some(name) => name.as_str(),
            None => panic!("ICE: type name requested before it was set"),
        }
    }

    /// Fields of the structure this type names
    pub fn fields<'a>(&self, arena: &'a TypeArena) -> &'a [TypeLine] {
        arena.fields(self.expect_struct())
    }

    fn expect_struct(&self) -> StructId {
        match self.structure {
            Some(s) => s,
            None => panic!("ICE: structure operation on non-structure type '{}'", self.basic),
        }
    }

    pub fn set_basic_type(&mut self, basic: BasicType) {
        self.basic = basic;
        self.mangled.take();
    }

    pub fn set_precision(&mut self, precision: Precision) {
        self.precision = precision;
        self.mangled.take();
    }

    pub fn set_qualifier(&mut self, qualifier: Qualifier) {
        self.qualifier = qualifier;
        self.mangled.take();
    }

    pub fn set_nominal_size(&mut self, size: u8) {
        debug_assert!((1..=4).contains(&size), "nominal size out of range: {size}");
        self.size = size;
        self.mangled.take();
    }

    pub fn set_matrix(&mut self, matrix: bool) {
        self.matrix = matrix;
        self.mangled.take();
    }

    /// Make this an array of `size` elements; 0 means not sized yet
    pub fn set_array_size(&mut self, size: u32) {
        self.array = true;
        self.array_size = size;
        self.mangled.take();
    }

    pub fn set_max_array_size(&mut self, size: u32) {
        self.array = true;
        self.max_array_size = size;
        self.mangled.take();
    }

    pub fn set_array_information_type(&mut self, ty: Option<TypeId>) {
        self.array_information_type = ty;
    }

    pub fn clear_arrayness(&mut self) {
        self.array = false;
        self.array_size = 0;
        self.max_array_size = 0;
        self.array_information_type = None;
        self.mangled.take();
    }

    pub fn set_field_name(&mut self, name: Symbol) {
        self.field_name = Some(name);
    }

    pub fn set_type_name(&mut self, name: &str) {
        self.type_name = Some(Symbol::new(name));
        self.mangled.take();
    }

    /// Used by `TypeArena::set_struct`, which owns the nesting computation
    pub(crate) fn attach_struct(&mut self, structure: StructId, nesting: u32) {
        self.structure = Some(structure);
        self.deepest_struct_nesting = nesting;
        self.mangled.take();
    }

    /// Number of scalar components, arrays counted at their largest known size
    pub fn object_size(&self, arena: &TypeArena) -> usize {
        let size = self.size as usize;
        let element = if self.basic == BasicType::Struct {
            arena.struct_object_size(self.expect_struct())
        } else if self.matrix {
            size * size
        } else {
            size
        };

        if self.array {
            element * self.array_size.max(self.max_array_size) as usize
        } else {
            element
        }
    }

    /// Registers taken by one element
    pub fn element_register_count(&self, arena: &TypeArena) -> usize {
        if let Some(structure) = self.structure {
            arena
                .fields(structure)
                .iter()
                .map(|field| arena.get(field.ty).total_register_count(arena))
                .sum()
        } else if self.matrix {
            self.size as usize
        } else {
            1
        }
    }

    pub fn total_register_count(&self, arena: &TypeArena) -> usize {
        let element = self.element_register_count(arena);
        if self.array {
            self.array_size as usize * element
        } else {
            element
        }
    }

    /// Canonical encoding used as an overload key, computed on first use
    pub fn mangled_name(&self, arena: &TypeArena) -> &str {
        self.mangled.get_or_init(|| {
            let mut name = String::new();
            self.build_mangled_name(arena, &mut name);
            name.push(';');
            name
        })
    }

    fn build_mangled_name(&self, arena: &TypeArena, out: &mut String) {
        if self.matrix {
            out.push('m');
        } else if self.size > 1 {
            out.push('v');
        }

        if self.basic == BasicType::Struct {
            out.push_str("struct-");
            if let Some(name) = self.type_name {
                out.push_str(name.as_str());
            }
            for field in arena.fields(self.expect_struct()) {
                out.push('-');
                arena.get(field.ty).build_mangled_name(arena, out);
            }
        } else {
            out.push_str(self.basic.mangled_code());
        }

        out.push(char::from(b'0' + self.size));
        if self.array {
            let _ = write!(out, "[{}]", self.array_size);
        }
    }

    /// Equality that ignores arrayness
    pub fn same_element_type(&self, other: &TType) -> bool {
        self.basic == other.basic
            && self.size == other.size
            && self.matrix == other.matrix
            && self.structure == other.structure
    }

    pub fn is_structure_containing_arrays(&self, arena: &TypeArena) -> bool {
        let Some(structure) = self.structure else {
            return false;
        };
        arena.fields(structure).iter().any(|field| {
            let ty = arena.get(field.ty);
            ty.is_array() || ty.is_structure_containing_arrays(arena)
        })
    }

    /// Human-readable form, e.g. `uniform highp 4-component vector of float`
    pub fn complete_string(&self) -> String {
        let mut s = String::new();
        if !self.qualifier.is_implicit() {
            s.push_str(self.qualifier.as_str());
            s.push(' ');
            if self.precision != Precision::Undefined {
                s.push_str(self.precision.as_str());
                s.push(' ');
            }
        }
        if self.array {
            let _ = write!(s, "array[{}] of ", self.array_size);
        }
        if self.matrix {
            let _ = write!(s, "{0}X{0} matrix of ", self.size);
        } else if self.size > 1 {
            let _ = write!(s, "{}-component vector of ", self.size);
        }
        s.push_str(self.basic.as_str());
        s
    }
}

impl PartialEq for TType {
    fn eq(&self, other: &Self) -> bool {
        self.basic == other.basic
            && self.size == other.size
            && self.matrix == other.matrix
            && self.array == other.array
            && (!self.array || self.array_size == other.array_size)
            && self.structure == other.structure
    }
}

impl Eq for TType {}

impl Hash for TType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.basic.hash(state);
        self.size.hash(state);
        self.matrix.hash(state);
        self.array.hash(state);
        if self.array {
            self.array_size.hash(state);
        }
        self.structure.hash(state);
    }
}

impl Ord for TType {
    fn cmp(&self, other: &Self) -> Ordering {
        // array_size is 0 whenever array is false, so this agrees with `eq`
        self.basic
            .cmp(&other.basic)
            .then(self.size.cmp(&other.size))
            .then(self.matrix.cmp(&other.matrix))
            .then(self.array.cmp(&other.array))
            .then(self.array_size.cmp(&other.array_size))
            .then(self.structure.cmp(&other.structure))
    }
}

impl PartialOrd for TType {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
