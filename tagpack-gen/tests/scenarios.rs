//! End-to-end generation scenarios over whole record schemas.
use {
    proc_macro2::Span,
    syn::Ident,
    tagpack_gen::elem::{BaseType, Elem, Field, Record},
};

fn name() -> Ident {
    Ident::new("T", Span::call_site())
}

fn marshal(elem: &Elem) -> String {
    tagpack_gen::marshal::generate(&name(), elem)
        .unwrap()
        .to_string()
}

fn unmarshal(elem: &Elem) -> String {
    tagpack_gen::unmarshal::generate(&name(), elem)
        .unwrap()
        .to_string()
}

fn str_field(n: &str, dirs: &[&str]) -> Field {
    Field::new(n, n, Elem::base(BaseType::Str)).with_directives(dirs)
}

#[test]
fn single_omission_field() {
    let rec = Elem::Record(Record::keyed(vec![str_field("astring", &["omitempty"])]));
    let src = marshal(&rec);

    // Count starts at the static total and drops per empty field.
    assert!(src.contains("let mut n0001 : u32 = 1u32 ;"));
    assert!(src.contains("let mut mask0002 : u8 = 0 ;"));
    assert!(src.contains(
        "if (* self) . astring . is_empty () { n0001 -= 1 ; mask0002 |= 0x1 ; }"
    ));
    // One field bounds the header to the fix class; no other class appears.
    assert!(src.contains("o . push (0x80 | (n0001 as u8 & 0x0f)) ;"));
    assert!(!src.contains("0xde"));
    assert!(!src.contains("0xdf"));
    // A fully empty map is done after its header.
    assert!(src.contains("if n0001 == 0 { return :: core :: result :: Result :: Ok (()) ; }"));
    // The key and value only go out when the mask bit stayed clear.
    assert!(src.contains("if (mask0002 & 0x1) == 0 {"));
    assert!(src.contains("0xa7 , 0x61 , 0x73 , 0x74 , 0x72 , 0x69 , 0x6e , 0x67"));
}

#[test]
fn undirected_field_between_omission_fields() {
    let rec = Elem::Record(Record::keyed(vec![
        str_field("a", &["omitempty"]),
        str_field("b", &[]),
        str_field("c", &["omitempty"]),
    ]));
    let src = marshal(&rec);

    // Bits follow live-field order, so the undirected middle field leaves a
    // hole: bit 0 for `a`, bit 2 for `c`.
    assert!(src.contains("mask0002 |= 0x1 ;"));
    assert!(src.contains("mask0002 |= 0x4 ;"));
    assert!(!src.contains("mask0002 |= 0x2 ;"));
    assert!(src.contains("if (mask0002 & 0x1) == 0 {"));
    assert!(src.contains("if (mask0002 & 0x4) == 0 {"));
    // The middle field is written unconditionally.
    assert!(!src.contains("if (mask0002 & 0x2) == 0 {"));
    assert!(src.contains("& [0xa1 , 0x62]"));
}

#[test]
fn sixty_four_fields_stay_in_one_word() {
    let fields: Vec<Field> = (0..64)
        .map(|i| str_field(&format!("f{i}"), &["omitempty"]))
        .collect();
    let src = marshal(&Elem::Record(Record::keyed(fields)));

    assert!(src.contains("let mut mask0002 : u64 = 0 ;"));
    assert!(src.contains("mask0002 |= 0x8000000000000000 ;"));
    assert!(!src.contains("[0u64"));
    // 64 fields exceed the fix class but stay within map16.
    assert!(src.contains("0xde"));
    assert!(!src.contains("0xdf"));
}

#[test]
fn sixty_five_fields_spill_into_an_array() {
    let fields: Vec<Field> = (0..65)
        .map(|i| str_field(&format!("f{i}"), &["omitempty"]))
        .collect();
    let src = marshal(&Elem::Record(Record::keyed(fields)));

    assert!(src.contains("let mut mask0002 = [0u64 ; 2usize] ;"));
    assert!(src.contains("mask0002 [1usize] |= 0x1 ;"));
    assert!(src.contains("if (mask0002 [0usize] & 0x8000000000000000) == 0 {"));
}

#[test]
fn reader_side_mirrors_the_writer_mask() {
    let rec = Elem::Record(Record::keyed(vec![
        str_field("a", &["omitempty"]),
        str_field("b", &[]),
    ]));
    let src = unmarshal(&rec);

    assert!(src.contains("let mut seen0002 : u8 = 0 ;"));
    // Seen bit set inside the key arm, checked after the loop.
    assert!(src.contains("seen0002 |= 0x1 ;"));
    assert!(src.contains(
        "if (seen0002 & 0x1) == 0 { (* self) . a = :: core :: default :: Default :: default () ; }"
    ));
    // The undirected field keeps whatever it held.
    assert!(!src.contains("(* self) . b = :: core :: default :: Default :: default ()"));
}

#[test]
fn directive_degrade_leaves_a_plain_record() {
    // A composite cannot be tested for emptiness; the directive drops and
    // the record generates exactly as if it were absent.
    let with = Elem::Record(Record::keyed(vec![Field::new(
        "xs",
        "xs",
        Elem::seq(Elem::base(BaseType::U8)),
    )
    .with_directives(&["omitempty"])]));
    let without = Elem::Record(Record::keyed(vec![Field::new(
        "xs",
        "xs",
        Elem::seq(Elem::base(BaseType::U8)),
    )]));
    assert_eq!(marshal(&with), marshal(&without));
    assert_eq!(unmarshal(&with), unmarshal(&without));
}

#[test]
fn all_four_generators_cover_a_mixed_schema() {
    let rec = Elem::Record(Record::keyed(vec![
        Field::new("id", "id", Elem::base(BaseType::U64)),
        Field::new("name", "name", Elem::base(BaseType::Str)).with_directives(&["omitempty"]),
        Field::new("tags", "tags", Elem::seq(Elem::base(BaseType::Str))),
        Field::new("alias", "alias", Elem::nullable(Elem::base(BaseType::Str))),
    ]));
    let code = tagpack_gen::generate_all(&name(), &rec).to_string();
    assert!(code.contains("impl :: tagpack :: Marshal for T"));
    assert!(code.contains("impl :: tagpack :: Unmarshal for T"));
    assert!(code.contains("impl :: tagpack :: Encode for T"));
    assert!(code.contains("impl :: tagpack :: Decode for T"));
}
