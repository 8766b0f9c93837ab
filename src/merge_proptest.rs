//! Property-based tests for the structural merge.

#[cfg(test)]
mod proptest_tests {
    use crate::merge::{merge, ListMergePolicy};
    use proptest::prelude::*;
    use serde_json::{json, Map, Value};
    use std::collections::BTreeSet;

    fn scalar() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i32>().prop_map(|n| json!(n)),
            "[a-z]{0,8}".prop_map(Value::String),
        ]
    }

    fn tree() -> impl Strategy<Value = Value> {
        scalar().prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                prop::collection::vec(("[a-d]", inner), 0..4).prop_map(|pairs| {
                    let mut map = Map::new();
                    for (key, value) in pairs {
                        map.insert(key, value);
                    }
                    Value::Object(map)
                }),
            ]
        })
    }

    fn policy() -> impl Strategy<Value = ListMergePolicy> {
        prop_oneof![
            Just(ListMergePolicy::GreaterLength),
            Just(ListMergePolicy::SmallerLength),
            Just(ListMergePolicy::BLength),
            Just(ListMergePolicy::Append),
        ]
    }

    proptest! {
        /// Property: for scalars, b always wins
        #[test]
        fn scalars_b_wins(a in scalar(), b in scalar(), policy in policy()) {
            prop_assert_eq!(merge(&a, &b, policy), b);
        }

        /// Property: merged object keys are the union of both key sets
        #[test]
        fn object_keys_are_union(
            a in prop::collection::btree_map("[a-f]", scalar(), 0..5),
            b in prop::collection::btree_map("[a-f]", scalar(), 0..5),
            policy in policy(),
        ) {
            let a_value = Value::Object(a.clone().into_iter().collect());
            let b_value = Value::Object(b.clone().into_iter().collect());
            let merged = merge(&a_value, &b_value, policy);

            let merged_keys: BTreeSet<String> = merged.as_object().unwrap().keys().cloned().collect();
            let expected: BTreeSet<String> = a.keys().chain(b.keys()).cloned().collect();
            prop_assert_eq!(merged_keys, expected);
        }

        /// Property: shared keys hold the recursive merge of both sides
        #[test]
        fn shared_keys_merge_recursively(a in tree(), b in tree(), policy in policy()) {
            let wrapped_a = json!({"k": a.clone()});
            let wrapped_b = json!({"k": b.clone()});
            let merged = merge(&wrapped_a, &wrapped_b, policy);
            prop_assert_eq!(&merged["k"], &merge(&a, &b, policy));
        }

        /// Property: append concatenates lists
        #[test]
        fn append_concatenates(
            a in prop::collection::vec(tree(), 0..5),
            b in prop::collection::vec(tree(), 0..5),
        ) {
            let merged = merge(&Value::Array(a.clone()), &Value::Array(b.clone()), ListMergePolicy::Append);
            let mut expected = a.clone();
            expected.extend(b.clone());
            prop_assert_eq!(merged.as_array().unwrap().len(), a.len() + b.len());
            prop_assert_eq!(merged, Value::Array(expected));
        }

        /// Property: index-wise policies produce the documented lengths
        #[test]
        fn list_lengths_follow_policy(
            a in prop::collection::vec(scalar(), 0..6),
            b in prop::collection::vec(scalar(), 0..6),
        ) {
            let a_value = Value::Array(a.clone());
            let b_value = Value::Array(b.clone());
            let len = |policy| merge(&a_value, &b_value, policy).as_array().unwrap().len();
            prop_assert_eq!(len(ListMergePolicy::GreaterLength), a.len().max(b.len()));
            prop_assert_eq!(len(ListMergePolicy::SmallerLength), a.len().min(b.len()));
            prop_assert_eq!(len(ListMergePolicy::BLength), b.len());
        }

        /// Property: merging a tree with itself changes nothing for index-wise policies
        #[test]
        fn self_merge_is_identity(a in tree()) {
            prop_assert_eq!(merge(&a, &a, ListMergePolicy::GreaterLength), a);
        }
    }
}
