use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use entipath::PathMetadata;
use proptest::prelude::*;

#[derive(Debug, Clone, PartialEq)]
enum Step {
    Property(String),
    Any,
    Index(usize),
    Key(String),
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        "[a-z][a-z_]{0,6}".prop_map(Step::Property),
        Just(Step::Any),
        (0usize..4).prop_map(Step::Index),
        "[a-z]{1,4}".prop_map(Step::Key),
    ]
}

fn chain() -> impl Strategy<Value = (String, Vec<Step>)> {
    ("[a-z]{1,3}", prop::collection::vec(step(), 0..6))
}

fn build(variable: &str, steps: &[Step]) -> PathMetadata {
    steps.iter().fold(PathMetadata::root(variable), |parent, step| match step {
        Step::Property(name) => parent.property(name.as_str()),
        Step::Any => parent.collection_any(),
        Step::Index(index) => parent.list_value(*index),
        Step::Key(key) => parent.map_value(&PathMetadata::root(key.as_str())),
    })
}

fn hash_of(metadata: &PathMetadata) -> u64 {
    let mut hasher = DefaultHasher::new();
    metadata.hash(&mut hasher);
    hasher.finish()
}

proptest! {
    #[test]
    fn same_chain_gives_equal_metadata((variable, steps) in chain()) {
        let a = build(&variable, &steps);
        let b = build(&variable, &steps);
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(a.key(), b.key());
        prop_assert_eq!(hash_of(&a), hash_of(&b));
        prop_assert_eq!(a.depth(), steps.len());
        prop_assert_eq!(a.to_string(), b.to_string());
    }

    #[test]
    fn equality_agrees_with_chains(left in chain(), right in chain()) {
        let a = build(&left.0, &left.1);
        let b = build(&right.0, &right.1);
        let same_chain = left == right;
        prop_assert_eq!(a == b, same_chain);
        prop_assert_eq!(a.key() == b.key(), same_chain);
    }

    #[test]
    fn every_prefix_is_an_ancestor((variable, steps) in chain()) {
        let full = build(&variable, &steps);
        for len in 0..=steps.len() {
            let prefix = build(&variable, &steps[..len]);
            prop_assert!(full.starts_with(&prefix));
        }
        prop_assert_eq!(full.root_metadata(), &PathMetadata::root(variable.as_str()));
    }
}
