use crate::types::base::{BasicType, Precision, Qualifier};
use crate::types::registry::{TypeArena, TypeId};

/// Provisional type descriptor built while the parser reduces a declaration,
/// before it is committed as a `TType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicType {
    pub basic: BasicType,
    pub qualifier: Qualifier,
    pub precision: Precision,
    pub size: u8,
    pub matrix: bool,
    pub array: bool,
    pub array_size: u32,
    /// Structure type this descriptor refers to, for user-defined types
    pub user_def: Option<TypeId>,
    pub line: u32,
}

impl PublicType {
    pub fn new(basic: BasicType, qualifier: Qualifier, line: u32) -> Self {
        PublicType {
            basic,
            qualifier,
            precision: Precision::Undefined,
            size: 1,
            matrix: false,
            array: false,
            array_size: 0,
            user_def: None,
            line,
        }
    }

    /// Reset to a plain scalar of `basic`
    pub fn set_basic(&mut self, basic: BasicType, qualifier: Qualifier, line: u32) {
        *self = PublicType::new(basic, qualifier, line);
    }

    pub fn set_aggregate(&mut self, size: u8, matrix: bool) {
        self.size = size;
        self.matrix = matrix;
    }

    pub fn set_array(&mut self, array: bool, size: u32) {
        self.array = array;
        self.array_size = if array { size } else { 0 };
    }

    pub fn set_user_def(&mut self, user_def: TypeId) {
        self.basic = BasicType::Struct;
        self.user_def = Some(user_def);
    }

    pub fn is_structure_containing_arrays(&self, arena: &TypeArena) -> bool {
        self.user_def
            .is_some_and(|id| arena.get(id).is_structure_containing_arrays(arena))
    }
}
