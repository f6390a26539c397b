//! Every optimized replacer must match the reference replacer exactly

use std::io::Cursor;

use proptest::prelude::*;

use subst_stream::{
    CompiledRuleSet, EngineConfig, ReferenceReplacer, RuleSet, StrSource, Strategy as Variant,
    Utf8ReadSource,
};

fn single_unit_rules() -> impl Strategy<Value = RuleSet> {
    prop::collection::btree_map("[abcé]", "[xyz]", 0..4)
        .prop_map(|map| map.into_iter().collect())
}

fn expansion_rules() -> impl Strategy<Value = RuleSet> {
    prop::collection::btree_map("[abcé]", "[xyz]{0,4}", 0..4)
        .prop_map(|map| map.into_iter().collect())
}

fn general_rules() -> impl Strategy<Value = RuleSet> {
    prop::collection::btree_map("[abc]{1,4}", "[xyz🦀]{0,3}", 0..6)
        .prop_map(|map| map.into_iter().collect())
}

fn input() -> impl Strategy<Value = String> {
    "[abcdé🦀]{0,40}"
}

fn reference(rules: &RuleSet, input: &str) -> String {
    ReferenceReplacer::new(rules).unwrap().transform(input).unwrap()
}

fn check_strategy(rules: &RuleSet, input: &str, strategy: Variant) {
    let compiled = CompiledRuleSet::compile_with(rules, strategy).unwrap();
    assert_eq!(compiled.transform(input).unwrap(), reference(rules, input));
}

proptest! {
    #[test]
    fn test_direct_matches_reference(rules in single_unit_rules(), input in input()) {
        check_strategy(&rules, &input, Variant::Direct);
        check_strategy(&rules, &input, Variant::Expansion);
        check_strategy(&rules, &input, Variant::General);
    }

    #[test]
    fn test_expansion_matches_reference(rules in expansion_rules(), input in input()) {
        check_strategy(&rules, &input, Variant::Expansion);
        check_strategy(&rules, &input, Variant::General);
    }

    #[test]
    fn test_general_matches_reference(rules in general_rules(), input in input()) {
        check_strategy(&rules, &input, Variant::General);
    }

    #[test]
    fn test_empty_rules_are_identity(input in input()) {
        let compiled = CompiledRuleSet::compile(&RuleSet::new()).unwrap();
        prop_assert_eq!(compiled.transform(&input).unwrap(), input);
    }

    #[test]
    fn test_unit_reads_match_bulk(rules in general_rules(), input in input()) {
        let compiled = CompiledRuleSet::compile(&rules).unwrap();
        let mut stream = compiled.stream(StrSource::new(&input));
        let mut units = Vec::new();
        while let Some(unit) = stream.read().unwrap() {
            units.push(unit);
        }
        prop_assert_eq!(String::from_utf16(&units).unwrap(), compiled.transform(&input).unwrap());
    }

    #[test]
    fn test_chunked_reads_match_bulk(
        rules in prop_oneof![expansion_rules(), general_rules()],
        input in input(),
        dest_len in 1usize..7,
        read_chunk in 1usize..5,
    ) {
        let compiled = CompiledRuleSet::compile(&rules).unwrap();
        let config = EngineConfig {
            inbound_initial_capacity: 1,
            outbound_initial_capacity: 1,
            read_chunk_size: read_chunk,
            ..Default::default()
        };
        let mut stream = compiled.stream_with_config(StrSource::new(&input), &config);
        let mut units = Vec::new();
        let mut buf = vec![0u16; dest_len];
        while let Some(n) = stream.read_into(&mut buf).unwrap() {
            units.extend_from_slice(&buf[..n]);
        }
        prop_assert_eq!(String::from_utf16(&units).unwrap(), compiled.transform(&input).unwrap());
    }

    #[test]
    fn test_utf8_reader_matches_bulk(
        rules in general_rules(),
        input in input(),
        byte_chunk in 1usize..6,
    ) {
        let compiled = CompiledRuleSet::compile(&rules).unwrap();
        let source = Utf8ReadSource::with_chunk_size(Cursor::new(input.clone().into_bytes()), byte_chunk);
        let mut out = Vec::new();
        compiled.stream(source).copy_to(&mut out).unwrap();
        prop_assert_eq!(String::from_utf8(out).unwrap(), compiled.transform(&input).unwrap());
    }
}
