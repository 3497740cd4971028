use std::collections::HashSet;

use thin_vec::thin_vec;

use super::*;

fn field(arena: &mut TypeArena, ty: TType, name: &str, line: u32) -> TypeLine {
    TypeLine {
        ty: arena.alloc_field(ty, name),
        line,
    }
}

fn array_of(mut ty: TType, size: u32) -> TType {
    ty.set_array_size(size);
    ty
}

/// struct S { float a; vec2 b; }
fn simple_struct(arena: &mut TypeArena, name: &str) -> TypeId {
    let a = field(arena, TType::scalar(BasicType::Float), "a", 1);
    let b = field(arena, TType::vector(BasicType::Float, 2), "b", 2);
    arena.new_struct_type(name, thin_vec![a, b], Precision::Undefined)
}

#[test]
fn test_matrix_register_counts() {
    let arena = TypeArena::new();
    let mat4 = TType::float_matrix(4);
    assert_eq!(mat4.element_register_count(&arena), 4);
    assert_eq!(mat4.total_register_count(&arena), 4);

    let mat4_array = array_of(TType::float_matrix(4), 3);
    assert_eq!(mat4_array.element_register_count(&arena), 4);
    assert_eq!(mat4_array.total_register_count(&arena), 12);
}

#[test]
fn test_vectors_and_scalars_take_one_register() {
    let arena = TypeArena::new();
    assert_eq!(TType::scalar(BasicType::Bool).total_register_count(&arena), 1);
    assert_eq!(TType::vector(BasicType::Float, 3).total_register_count(&arena), 1);
    assert_eq!(array_of(TType::vector(BasicType::Int, 4), 5).total_register_count(&arena), 5);
}

#[test]
fn test_struct_register_count() {
    let mut arena = TypeArena::new();
    let v = field(&mut arena, TType::vector(BasicType::Float, 4), "v", 1);
    let m = field(&mut arena, TType::float_matrix(4), "m", 2);
    let s = arena.new_struct_type("S", thin_vec![v, m], Precision::Undefined);

    let ty = arena.get(s);
    assert_eq!(ty.total_register_count(&arena), 5);
    assert_eq!(ty.object_size(&arena), 4 + 16);
}

#[test]
fn test_object_size_uses_max_array_size() {
    let arena = TypeArena::new();
    let mut ty = TType::vector(BasicType::Float, 3);
    ty.set_array_size(0);
    ty.set_max_array_size(5);
    assert!(ty.is_array());
    assert_eq!(ty.object_size(&arena), 15);

    ty.set_array_size(7);
    assert_eq!(ty.object_size(&arena), 21);
}

#[test]
fn test_object_size_of_nested_struct() {
    let mut arena = TypeArena::new();
    let m = field(&mut arena, TType::float_matrix(3), "m", 1);
    let f = field(&mut arena, array_of(TType::scalar(BasicType::Float), 4), "f", 2);
    let inner = arena.new_struct_type("Inner", thin_vec![m, f], Precision::Undefined);
    assert_eq!(arena.get(inner).object_size(&arena), 13);

    let inner_ty = array_of(arena.get(inner).clone(), 2);
    let i = field(&mut arena, inner_ty, "i", 4);
    let outer = arena.new_struct_type("Outer", thin_vec![i], Precision::Undefined);
    assert_eq!(arena.get(outer).object_size(&arena), 26);
    // cached value is stable
    assert_eq!(arena.get(outer).object_size(&arena), 26);
}

#[test]
fn test_empty_struct() {
    let mut arena = TypeArena::new();
    let s = arena.new_struct_type("Empty", TypeList::new(), Precision::Undefined);
    let ty = arena.get(s);
    assert_eq!(ty.basic_type(), BasicType::Struct);
    assert_eq!(ty.object_size(&arena), 0);
    assert_eq!(ty.deepest_struct_nesting(), 0);
    assert_eq!(ty.total_register_count(&arena), 0);
    assert_eq!(ty.mangled_name(&arena), "struct-Empty1;");
}

#[test]
fn test_equality_ignores_qualifier_and_precision() {
    let a = TType::new(BasicType::Float, Precision::High, Qualifier::Uniform, 4, false, false);
    let b = TType::new(BasicType::Float, Precision::Low, Qualifier::VaryingIn, 4, false, false);
    assert_eq!(a, b);
    assert_eq!(a.cmp(&b), std::cmp::Ordering::Equal);

    let set: HashSet<TType> = [a, b].into_iter().collect();
    assert_eq!(set.len(), 1);
}

#[test]
fn test_equality_compares_shape() {
    let vec4 = TType::vector(BasicType::Float, 4);
    assert_ne!(vec4, TType::vector(BasicType::Int, 4));
    assert_ne!(vec4, TType::vector(BasicType::Float, 3));
    assert_ne!(TType::float_matrix(4), vec4);
    assert_ne!(array_of(vec4.clone(), 2), vec4);
    assert_ne!(array_of(vec4.clone(), 2), array_of(vec4.clone(), 3));
    assert_eq!(array_of(vec4.clone(), 2), array_of(vec4.clone(), 2));
}

#[test]
fn test_ordering_is_strict_total_order() {
    let mut arena = TypeArena::new();
    let s1 = simple_struct(&mut arena, "A");
    let s2 = simple_struct(&mut arena, "B");

    let types = vec![
        TType::scalar(BasicType::Void),
        TType::scalar(BasicType::Float),
        TType::vector(BasicType::Float, 2),
        TType::vector(BasicType::Float, 4),
        TType::float_matrix(2),
        TType::float_matrix(4),
        array_of(TType::scalar(BasicType::Float), 1),
        array_of(TType::scalar(BasicType::Float), 3),
        TType::scalar(BasicType::Int),
        TType::scalar(BasicType::Bool),
        TType::scalar(BasicType::Sampler2D),
        arena.get(s1).clone(),
        arena.get(s2).clone(),
        array_of(arena.get(s2).clone(), 2),
    ];

    for a in &types {
        assert!(!(a < a), "irreflexive: {}", a.complete_string());
        for b in &types {
            let lt = a < b;
            let gt = b < a;
            let eq = a == b;
            assert_eq!([lt, gt, eq].iter().filter(|x| **x).count(), 1);
            for c in &types {
                if a < b && b < c {
                    assert!(a < c);
                }
            }
        }
    }
}

#[test]
fn test_ordering_field_precedence() {
    // kind is compared before size
    let float4 = TType::vector(BasicType::Float, 4);
    let int2 = TType::vector(BasicType::Int, 2);
    assert!(float4 < int2);

    // size before matrix
    let mat2 = TType::float_matrix(2);
    let vec3 = TType::vector(BasicType::Float, 3);
    assert!(mat2 < vec3);

    // matrix before array
    let vec2_array = array_of(TType::vector(BasicType::Float, 2), 8);
    assert!(vec2_array < mat2);
}

#[test]
fn test_identical_structs_share_mangled_name_but_differ() {
    let mut arena = TypeArena::new();
    let s1 = simple_struct(&mut arena, "S");
    let s2 = simple_struct(&mut arena, "S");

    let a = arena.get(s1);
    let b = arena.get(s2);
    assert_eq!(a.mangled_name(&arena), "struct-S-f1-vf21;");
    assert_eq!(a.mangled_name(&arena), b.mangled_name(&arena));
    assert_ne!(a, b);
    assert_ne!(a.structure(), b.structure());

    let copy = a.clone();
    assert_eq!(&copy, a);
}

#[test]
fn test_mangled_names() {
    let arena = TypeArena::new();
    let cases = [
        (TType::scalar(BasicType::Float), "f1;"),
        (TType::vector(BasicType::Float, 4), "vf4;"),
        (TType::vector(BasicType::Bool, 2), "vb2;"),
        (TType::vector(BasicType::UInt, 3), "vu3;"),
        (TType::float_matrix(3), "mf3;"),
        (array_of(TType::scalar(BasicType::Int), 2), "i1[2];"),
        (TType::scalar(BasicType::Sampler2D), "s21;"),
        (TType::scalar(BasicType::SamplerCube), "sC1;"),
        (TType::scalar(BasicType::SamplerExternalOES), "sE1;"),
        (TType::scalar(BasicType::Sampler2DRect), "s2R1;"),
        (TType::scalar(BasicType::Void), "1;"),
    ];
    for (ty, expected) in &cases {
        assert_eq!(ty.mangled_name(&arena), *expected);
    }
}

#[test]
fn test_mangled_name_ignores_precision_and_qualifier() {
    let arena = TypeArena::new();
    let a = TType::new(BasicType::Float, Precision::High, Qualifier::Uniform, 2, true, false);
    let b = TType::new(BasicType::Float, Precision::Low, Qualifier::Const, 2, true, false);
    assert_eq!(a.mangled_name(&arena), b.mangled_name(&arena));
}

#[test]
fn test_mangled_name_cache_cleared_by_mutators() {
    let arena = TypeArena::new();
    let mut ty = TType::vector(BasicType::Float, 4);
    assert_eq!(ty.mangled_name(&arena), "vf4;");

    ty.set_array_size(2);
    assert_eq!(ty.mangled_name(&arena), "vf4[2];");

    ty.clear_arrayness();
    assert!(!ty.is_array());
    assert_eq!(ty.array_size(), 0);
    assert_eq!(ty.max_array_size(), 0);
    assert_eq!(ty.mangled_name(&arena), "vf4;");

    ty.set_matrix(true);
    assert_eq!(ty.mangled_name(&arena), "mf4;");

    ty.set_basic_type(BasicType::Int);
    ty.set_matrix(false);
    ty.set_nominal_size(3);
    assert_eq!(ty.mangled_name(&arena), "vi3;");
}

#[test]
fn test_nested_struct_mangled_name() {
    let mut arena = TypeArena::new();
    let inner = simple_struct(&mut arena, "In");
    let inner_ty = arena.get(inner).clone();
    let x = field(&mut arena, inner_ty, "x", 3);
    let y = field(&mut arena, array_of(TType::float_matrix(2), 4), "y", 4);
    let outer = arena.new_struct_type("Out", thin_vec![x, y], Precision::Undefined);
    assert_eq!(
        arena.get(outer).mangled_name(&arena),
        "struct-Out-struct-In-f1-vf21-mf2[4]1;"
    );
}

#[test]
fn test_deepest_struct_nesting() {
    let mut arena = TypeArena::new();
    assert_eq!(TType::vector(BasicType::Float, 4).deepest_struct_nesting(), 0);

    let inner = simple_struct(&mut arena, "Inner");
    assert_eq!(arena.get(inner).deepest_struct_nesting(), 1);

    let inner_ty = arena.get(inner).clone();
    let a = field(&mut arena, inner_ty, "a", 1);
    let b = field(&mut arena, TType::vector(BasicType::Float, 2), "b", 2);
    let middle = arena.new_struct_type("Middle", thin_vec![a, b], Precision::Undefined);
    assert_eq!(arena.get(middle).deepest_struct_nesting(), 2);

    let middle_ty = arena.get(middle).clone();
    let inner_ty = arena.get(inner).clone();
    let m = field(&mut arena, middle_ty, "m", 1);
    let i = field(&mut arena, inner_ty, "i", 2);
    let outer = arena.new_struct_type("Outer", thin_vec![i, m], Precision::Undefined);
    assert_eq!(arena.get(outer).deepest_struct_nesting(), 3);
}

#[test]
fn test_set_struct_recomputes_nesting() {
    let mut arena = TypeArena::new();
    let inner = simple_struct(&mut arena, "Inner");
    let inner_ty = arena.get(inner).clone();
    let f = field(&mut arena, inner_ty, "f", 1);
    let structure = arena.declare_struct(thin_vec![f]);

    let id = arena.alloc(TType::scalar(BasicType::Float));
    arena.get_mut(id).set_type_name("Wrapper");
    arena.set_struct(id, structure);

    let ty = arena.get(id);
    assert_eq!(ty.basic_type(), BasicType::Struct);
    assert_eq!(ty.structure(), Some(structure));
    assert_eq!(ty.deepest_struct_nesting(), 2);
    assert!(!ty.is_scalar());
    assert_eq!(ty.mangled_name(&arena), "struct-Wrapper-struct-Inner-f1-vf211;");
}

#[test]
fn test_structure_containing_arrays() {
    let mut arena = TypeArena::new();
    let plain = simple_struct(&mut arena, "Plain");
    assert!(!arena.get(plain).is_structure_containing_arrays(&arena));
    assert!(!TType::vector(BasicType::Float, 4).is_structure_containing_arrays(&arena));

    let arr = field(&mut arena, array_of(TType::scalar(BasicType::Float), 4), "arr", 1);
    let with_array = arena.new_struct_type("WithArray", thin_vec![arr], Precision::Undefined);
    assert!(arena.get(with_array).is_structure_containing_arrays(&arena));

    let nested_ty = arena.get(with_array).clone();
    let n = field(&mut arena, nested_ty, "n", 1);
    let outer = arena.new_struct_type("Outer", thin_vec![n], Precision::Undefined);
    assert!(arena.get(outer).is_structure_containing_arrays(&arena));

    let mut public = PublicType::new(BasicType::Float, Qualifier::Uniform, 3);
    assert!(!public.is_structure_containing_arrays(&arena));
    public.set_user_def(outer);
    assert!(public.is_structure_containing_arrays(&arena));
}

#[test]
fn test_predicates() {
    let vec3 = TType::vector(BasicType::Float, 3);
    assert!(vec3.is_vector());
    assert!(!vec3.is_scalar());

    let float = TType::scalar(BasicType::Float);
    assert!(float.is_scalar());
    assert!(!float.is_vector());

    let mat2 = TType::float_matrix(2);
    assert!(!mat2.is_vector());
    assert!(!mat2.is_scalar());
}

#[test]
fn test_same_element_type() {
    let float = TType::scalar(BasicType::Float);
    let floats = array_of(TType::scalar(BasicType::Float), 3);
    assert_ne!(float, floats);
    assert!(float.same_element_type(&floats));
    assert!(!float.same_element_type(&TType::vector(BasicType::Float, 2)));
}

#[test]
fn test_complete_string() {
    let uniform = TType::new(BasicType::Float, Precision::High, Qualifier::Uniform, 4, false, false);
    assert_eq!(uniform.complete_string(), "uniform highp 4-component vector of float");

    let matrices = array_of(TType::float_matrix(4), 3);
    assert_eq!(matrices.complete_string(), "array[3] of 4X4 matrix of float");

    let constant = TType::new(BasicType::Int, Precision::Undefined, Qualifier::Const, 1, false, false);
    assert_eq!(constant.complete_string(), "const int");

    let varying = TType::new(BasicType::Float, Precision::Medium, Qualifier::VaryingOut, 2, false, false);
    assert_eq!(varying.complete_string(), "varying mediump 2-component vector of float");

    let global = TType::new(BasicType::Bool, Precision::Undefined, Qualifier::Global, 1, false, false);
    assert_eq!(global.complete_string(), "bool");
}

#[test]
fn test_string_tables() {
    assert_eq!(BasicType::SamplerExternalOES.to_string(), "samplerExternalOES");
    assert_eq!(BasicType::Struct.as_str(), "structure");
    assert_eq!(Precision::Medium.as_str(), "mediump");
    assert_eq!(Precision::Undefined.as_str(), "");
    assert_eq!(Qualifier::ConstReadOnly.as_str(), "const");
    assert_eq!(Qualifier::InvariantVaryingIn.as_str(), "invariant varying");
    assert_eq!(Qualifier::FragData.to_string(), "FragData");
    assert!(BasicType::SamplerCube.is_sampler());
    assert!(!BasicType::Bool.supports_precision());
}

#[test]
fn test_from_public_scalar() {
    let arena = TypeArena::new();
    let mut public = PublicType::new(BasicType::Float, Qualifier::Attribute, 7);
    public.precision = Precision::Medium;
    public.set_aggregate(4, true);
    public.set_array(true, 2);

    let ty = TType::from_public(&public, &arena);
    assert_eq!(ty.basic_type(), BasicType::Float);
    assert_eq!(ty.qualifier(), Qualifier::Attribute);
    assert_eq!(ty.precision(), Precision::Medium);
    assert!(ty.is_matrix());
    assert_eq!(ty.array_size(), 2);
    assert_eq!(ty.total_register_count(&arena), 8);
    assert!(ty.structure().is_none());
}

#[test]
fn test_from_public_user_defined() {
    let mut arena = TypeArena::new();
    let s = simple_struct(&mut arena, "Light");

    let mut public = PublicType::new(BasicType::Float, Qualifier::Uniform, 10);
    public.set_user_def(s);
    public.set_array(true, 4);

    let ty = TType::from_public(&public, &arena);
    assert_eq!(ty.basic_type(), BasicType::Struct);
    assert_eq!(ty.type_name(), "Light");
    assert_eq!(ty.structure(), arena.get(s).structure());
    assert_eq!(ty.deepest_struct_nesting(), 1);
    assert_eq!(ty.fields(&arena).len(), 2);
    assert_eq!(ty.object_size(&arena), 12);
    assert!(ty.same_element_type(arena.get(s)));
}

#[test]
fn test_public_set_basic_resets() {
    let mut public = PublicType::new(BasicType::Float, Qualifier::Uniform, 1);
    public.precision = Precision::High;
    public.set_aggregate(3, false);
    public.set_array(true, 9);

    public.set_basic(BasicType::Int, Qualifier::Const, 5);
    assert_eq!(public, PublicType::new(BasicType::Int, Qualifier::Const, 5));
    assert_eq!(public.precision, Precision::Undefined);
    assert_eq!(public.size, 1);
    assert!(!public.array);
}

#[test]
fn test_field_names() {
    let mut arena = TypeArena::new();
    let s = simple_struct(&mut arena, "S");
    let names: Vec<_> = arena
        .get(s)
        .fields(&arena)
        .iter()
        .map(|f| (arena.get(f.ty).field_name(), f.line))
        .collect();
    assert_eq!(names, vec![("a", 1), ("b", 2)]);
    assert!(arena.get(arena.get(s).fields(&arena)[0].ty).is_field());
    assert!(!arena.get(s).is_field());
}

#[test]
fn test_array_information_type() {
    let mut arena = TypeArena::new();
    let source = arena.alloc(array_of(TType::scalar(BasicType::Float), 4));
    let mut ty = TType::scalar(BasicType::Float);
    ty.set_array_size(0);
    ty.set_array_information_type(Some(source));
    assert_eq!(ty.array_information_type(), Some(source));
    ty.clear_arrayness();
    assert_eq!(ty.array_information_type(), None);
}

#[test]
#[should_panic(expected = "ICE")]
fn test_field_mutation_after_declaration_panics() {
    let mut arena = TypeArena::new();
    let a = field(&mut arena, TType::scalar(BasicType::Float), "a", 1);
    let s = arena.new_struct_type("S", thin_vec![a], Precision::Undefined);
    assert_eq!(arena.get(s).object_size(&arena), 1);
    arena.get_mut(a.ty).set_array_size(4);
}

#[test]
#[should_panic(expected = "ICE")]
fn test_field_name_on_non_field_panics() {
    TType::scalar(BasicType::Float).field_name();
}

#[test]
#[should_panic(expected = "ICE")]
fn test_type_name_unset_panics() {
    TType::vector(BasicType::Float, 2).type_name();
}

#[test]
#[should_panic(expected = "ICE")]
fn test_fields_on_non_structure_panics() {
    let arena = TypeArena::new();
    TType::float_matrix(2).fields(&arena);
}

#[test]
#[should_panic(expected = "ICE")]
fn test_struct_without_declaration_panics() {
    let arena = TypeArena::new();
    let public = PublicType::new(BasicType::Struct, Qualifier::Temporary, 1);
    TType::from_public(&public, &arena);
}
