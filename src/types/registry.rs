//! Per-unit arena for types and structure field lists.
//!
//! Every `TType` of one compilation unit lives in a `TypeArena` and is
//! referenced by `TypeId`. Structure declarations get a `StructId`; all types
//! naming the same declaration share it, and "same structure" means "same id".
//!
//! Field types are frozen once their structure is declared: structure sizes
//! and mangled names are cached from them.

use std::cell::OnceCell;
use std::num::NonZeroU32;

use hashbrown::HashSet;
use symbol_table::GlobalSymbol as Symbol;
use thin_vec::ThinVec;

use crate::types::base::{BasicType, Precision};
use crate::types::ty::TType;

/// Handle of a type allocated in a `TypeArena`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(NonZeroU32);

impl TypeId {
    pub fn new(value: u32) -> Option<Self> {
        NonZeroU32::new(value).map(Self)
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }

    pub fn index(self) -> usize {
        (self.get() - 1) as usize
    }
}

/// Identity of one structure declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StructId(NonZeroU32);

impl StructId {
    pub fn new(value: u32) -> Option<Self> {
        NonZeroU32::new(value).map(Self)
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }

    pub fn index(self) -> usize {
        (self.get() - 1) as usize
    }
}

/// One structure field: its type and declaration line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeLine {
    pub ty: TypeId,
    pub line: u32,
}

/// Fields of a structure in declaration order
pub type TypeList = ThinVec<TypeLine>;

#[derive(Debug)]
struct StructDef {
    fields: TypeList,
    object_size: OnceCell<usize>,
}

#[derive(Debug, Default)]
pub struct TypeArena {
    types: Vec<TType>,
    structs: Vec<StructDef>,
    frozen: HashSet<TypeId>,
}

impl TypeArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, ty: TType) -> TypeId {
        let index = self.types.len() as u32 + 1; // Start from 1 for NonZeroU32
        self.types.push(ty);
        TypeId::new(index).expect("TypeId overflow")
    }

    pub fn get(&self, id: TypeId) -> &TType {
        &self.types[id.index()]
    }

    pub fn get_mut(&mut self, id: TypeId) -> &mut TType {
        if self.frozen.contains(&id) {
            panic!("ICE: type #{} is a field of a declared structure", id.get());
        }
        &mut self.types[id.index()]
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Register a structure declaration. Field types must already be allocated.
    pub fn declare_struct(&mut self, fields: TypeList) -> StructId {
        let index = self.structs.len() as u32 + 1;
        log::trace!("declare structure #{} with {} fields", index, fields.len());
        self.frozen.extend(fields.iter().map(|field| field.ty));
        self.structs.push(StructDef {
            fields,
            object_size: OnceCell::new(),
        });
        StructId::new(index).expect("StructId overflow")
    }

    /// Declare a structure and allocate the named type that owns it
    pub fn new_struct_type(&mut self, name: &str, fields: TypeList, precision: Precision) -> TypeId {
        let structure = self.declare_struct(fields);
        let ty = TType::new_struct(self, structure, name, precision);
        self.alloc(ty)
    }

    pub fn fields(&self, structure: StructId) -> &[TypeLine] {
        &self.structs[structure.index()].fields
    }

    /// Sum of the object sizes of the fields, computed once per structure
    pub fn struct_object_size(&self, structure: StructId) -> usize {
        let def = &self.structs[structure.index()];
        *def.object_size.get_or_init(|| {
            def.fields
                .iter()
                .map(|field| self.get(field.ty).object_size(self))
                .sum()
        })
    }

    /// Levels of structures to go through to reach the deepest field; 0 without fields
    pub fn struct_nesting(&self, structure: StructId) -> u32 {
        let fields = self.fields(structure);
        if fields.is_empty() {
            return 0;
        }
        let deepest = fields
            .iter()
            .map(|field| self.get(field.ty))
            .filter(|ty| ty.structure().is_some())
            .map(|ty| ty.deepest_struct_nesting())
            .max()
            .unwrap_or(0);
        1 + deepest
    }

    /// Attach a structure to an allocated type and refresh what depends on it
    pub fn set_struct(&mut self, id: TypeId, structure: StructId) {
        let nesting = self.struct_nesting(structure);
        let ty = self.get_mut(id);
        ty.set_basic_type(BasicType::Struct);
        ty.attach_struct(structure, nesting);
    }

    /// Allocate a field type: `ty` with its field name set
    pub fn alloc_field(&mut self, mut ty: TType, name: &str) -> TypeId {
        ty.set_field_name(Symbol::new(name));
        self.alloc(ty)
    }
}
