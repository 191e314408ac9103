use pretty_assertions::assert_eq;

use super::*;

fn instructions(build: impl FnOnce(&mut Fragment)) -> Vec<Instruction> {
    let mut fragment = Fragment::value();
    build(&mut fragment);
    fragment.into_instructions()
}

#[test]
fn test_append_concatenates_in_order() {
    let mut first = Fragment::value();
    first.emit(PushI(1));
    let mut second = Fragment::value();
    second.extend([PushI(2), Add]);

    first.append(second);
    assert_eq!(first.instructions(), &[PushI(1), PushI(2), Add]);
    assert_eq!(first.kind(), FragmentKind::Value);
}

#[test]
fn test_address_to_value_is_type_directed() {
    let mut address = Fragment::address();
    address.emit(PushD("$x".into()));

    let value = address.clone().into_value(&Type::Floating);
    assert_eq!(value.kind(), FragmentKind::Value);
    assert_eq!(value.instructions(), &[PushD("$x".into()), LoadF]);

    let value = address.into_value(&Type::Character);
    assert_eq!(value.instructions(), &[PushD("$x".into()), LoadC]);
}

#[test]
fn test_value_fragment_passes_through_unchanged() {
    let mut value = Fragment::value();
    value.emit(PushI(7));
    assert_eq!(value.clone().into_value(&Type::Integer), value);
}

#[test]
#[should_panic(expected = "type checker bug")]
fn test_void_fragment_has_no_value() {
    Fragment::void().into_value(&Type::Integer);
}

#[test]
fn test_word_sized_loads() {
    for ty in [
        Type::Integer,
        Type::String,
        Type::array(Type::Boolean),
        Type::lambda(vec![], Type::Integer),
    ] {
        assert_eq!(instructions(|f| f.load(&ty)), vec![LoadI], "{}", ty);
        assert_eq!(instructions(|f| f.store(&ty)), vec![StoreI], "{}", ty);
    }
}

#[test]
fn test_rational_load_reads_two_words() {
    assert_eq!(
        instructions(|f| f.load(&Type::Rational)),
        vec![Duplicate, LoadI, Exchange, PushI(4), Add, LoadI]
    );
}

#[test]
fn test_rational_store_goes_through_scratch() {
    let code = instructions(|f| f.store(&Type::Rational));
    assert_eq!(
        code,
        vec![
            PushD(RATIONAL_STORE_DENOMINATOR.into()),
            Exchange,
            StoreI,
            Exchange,
            Duplicate,
            PushD(RATIONAL_STORE_ADDRESS.into()),
            Exchange,
            StoreI,
            Exchange,
            StoreI,
            PushD(RATIONAL_STORE_ADDRESS.into()),
            LoadI,
            PushI(4),
            Add,
            PushD(RATIONAL_STORE_DENOMINATOR.into()),
            LoadI,
            StoreI,
        ]
    );
}

#[test]
fn test_offset_macros() {
    assert_eq!(instructions(|f| f.read_i(0)), vec![LoadI]);
    assert_eq!(instructions(|f| f.read_i(12)), vec![PushI(12), Add, LoadI]);
    assert_eq!(
        instructions(|f| f.write_i(8)),
        vec![Exchange, PushI(8), Add, Exchange, StoreI]
    );
}

#[test]
fn test_discard_value_pops_every_word() {
    assert_eq!(instructions(|f| f.discard_value(&Type::Void)), Vec::<Instruction>::new());
    assert_eq!(instructions(|f| f.discard_value(&Type::Floating)), vec![Pop]);
    assert_eq!(
        instructions(|f| f.discard_value(&Type::Rational)),
        vec![Pop, Pop]
    );
}

#[test]
fn test_display_one_instruction_per_line() {
    let mut fragment = Fragment::void();
    fragment.extend([Label("start".into()), PushI(3), Halt]);
    assert_eq!(
        fragment.to_string(),
        "        Label        start\n        PushI        3\n        Halt\n"
    );
}
