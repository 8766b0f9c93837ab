//! Property-based tests for path manipulation functions.
//!
//! These tests use proptest to generate random inputs and verify that
//! invariants hold for all possible inputs.

#[cfg(test)]
mod proptest_tests {
    use crate::path::{basename, dirname, is_within, join, normalize};
    use proptest::prelude::*;

    /// Strategy producing relative paths built from plain, `.` and `..` segments
    fn path_with_dots() -> impl Strategy<Value = String> {
        prop::collection::vec(
            prop_oneof![
                "[a-z]{1,6}".prop_map(|s| s),
                Just(".".to_string()),
                Just("..".to_string()),
                Just("".to_string()),
            ],
            0..8,
        )
        .prop_map(|segments| segments.join("/"))
    }

    // ============================================================================
    // normalize property tests
    // ============================================================================

    proptest! {
        /// Property: normalize is idempotent
        #[test]
        fn normalize_is_idempotent(input in path_with_dots()) {
            let once = normalize(&input);
            prop_assert_eq!(normalize(&once), once);
        }

        /// Property: normalized paths never contain `.` segments or empty segments
        #[test]
        fn normalize_removes_dot_and_empty_segments(input in path_with_dots()) {
            let result = normalize(&input);
            if result != "." {
                for segment in result.split('/') {
                    prop_assert_ne!(segment, ".");
                    prop_assert!(!segment.is_empty(), "empty segment in '{}'", result);
                }
            }
        }

        /// Property: `..` only survives as a leading run in relative paths
        #[test]
        fn normalize_keeps_parent_refs_leading(input in path_with_dots()) {
            let result = normalize(&input);
            let segments: Vec<&str> = result.split('/').collect();
            let first_plain = segments.iter().position(|s| *s != "..").unwrap_or(segments.len());
            prop_assert!(
                segments[first_plain..].iter().all(|s| *s != ".."),
                "'..' after a plain segment in '{}'",
                result
            );
        }

        /// Property: normalize never produces backslashes
        #[test]
        fn normalize_is_posix(input in "[a-z\\\\/.]{0,20}") {
            prop_assert!(!normalize(&input).contains('\\'));
        }

        /// Property: absolute paths stay absolute and within the root
        #[test]
        fn normalize_absolute_stays_under_root(input in path_with_dots()) {
            let result = normalize(&format!("/{}", input));
            prop_assert!(result.starts_with('/'));
            prop_assert!(is_within("/", &result));
        }
    }

    // ============================================================================
    // join / dirname / basename property tests
    // ============================================================================

    proptest! {
        /// Property: joining dirname and basename restores a normalized path
        #[test]
        fn dirname_basename_roundtrip(segments in prop::collection::vec("[a-z]{1,6}", 1..6)) {
            let path = segments.join("/");
            let rebuilt = join(&[dirname(&path), basename(&path)]);
            prop_assert_eq!(rebuilt, normalize(&path));
        }

        /// Property: a joined child is always within its parent
        #[test]
        fn joined_child_is_within_parent(
            parent in prop::collection::vec("[a-z]{1,6}", 1..4),
            child in prop::collection::vec("[a-z]{1,6}", 1..4),
        ) {
            let parent = format!("/{}", parent.join("/"));
            let joined = join(&[parent.clone(), child.join("/")]);
            prop_assert!(is_within(&parent, &joined));
        }
    }
}
