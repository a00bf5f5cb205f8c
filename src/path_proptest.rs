//! Property-based tests for path normalization and changeset ordering.
//!
//! These tests use proptest to generate random inputs and verify that
//! invariants hold for all possible inputs.

#[cfg(test)]
mod proptest_tests {
    use crate::ordering::{insert, RunOrdered};
    use crate::path::{concat, normalize_path};
    use proptest::prelude::*;

    // ============================================================================
    // normalize_path property tests
    // ============================================================================

    /// Strategy for path-like strings built from the characters the
    /// normalizer treats specially.
    fn path_like() -> impl Strategy<Value = String> {
        prop::collection::vec(
            prop_oneof![
                Just("/".to_string()),
                Just("\\".to_string()),
                Just(".".to_string()),
                Just("./".to_string()),
                Just("classpath:".to_string()),
                Just("C:".to_string()),
                "[a-zA-Z0-9_-]{1,6}",
                "[a-z]{1,4}\\.(yaml|sql|json)",
            ],
            0..12,
        )
        .prop_map(|parts| parts.concat())
    }

    proptest! {
        /// Property: normalizing twice is the same as normalizing once
        #[test]
        fn normalize_path_is_idempotent(input in ".*") {
            let once = normalize_path(&input);
            prop_assert_eq!(normalize_path(&once), once);
        }

        /// Property: idempotence holds for inputs dense in special segments
        #[test]
        fn normalize_path_is_idempotent_on_path_like(input in path_like()) {
            let once = normalize_path(&input);
            prop_assert_eq!(normalize_path(&once), once);
        }

        /// Property: the result never contains backslashes or repeated slashes
        #[test]
        fn normalize_path_has_canonical_separators(input in path_like()) {
            let result = normalize_path(&input);
            prop_assert!(!result.contains('\\'));
            prop_assert!(!result.contains("//"));
            prop_assert!(!result.contains("/./"));
            prop_assert!(!result.starts_with('/'));
        }

        /// Property: normalization never changes the case of letters it keeps
        #[test]
        fn normalize_path_preserves_case(segments in prop::collection::vec("[a-zA-Z]{1,8}", 1..5)) {
            let input = segments.join("/");
            prop_assert_eq!(normalize_path(&input), input);
        }

        /// Property: concat of a relative name never leaves `.` segments behind
        #[test]
        fn concat_drops_current_dir_segments(
            base in prop::collection::vec("[a-z]{1,5}", 0..4),
            name in prop::collection::vec(prop_oneof![Just(".".to_string()), "[a-z]{1,5}"], 1..4),
        ) {
            let base = base.iter().map(|s| format!("{}/", s)).collect::<String>();
            let result = concat(&base, &name.join("/"));
            prop_assert!(!result.split('/').any(|segment| segment == "."));
        }
    }

    // ============================================================================
    // ordering property tests
    // ============================================================================

    #[derive(Debug, Clone)]
    struct Entry {
        seq: usize,
        hint: Option<&'static str>,
    }

    impl RunOrdered for Entry {
        fn run_order(&self) -> Option<&str> {
            self.hint
        }
    }

    fn hint() -> impl Strategy<Value = Option<&'static str>> {
        prop_oneof![Just(None), Just(Some("first")), Just(Some("last")), Just(Some("none"))]
    }

    fn group(entry: &Entry) -> u8 {
        match entry.hint {
            Some("first") => 0,
            Some("last") => 2,
            _ => 1,
        }
    }

    proptest! {
        /// Property: any insertion sequence yields [first]* [none]* [last]*,
        /// each group in call order
        #[test]
        fn insert_keeps_group_shape_and_arrival_order(hints in prop::collection::vec(hint(), 0..40)) {
            let mut list = Vec::new();
            for (seq, hint) in hints.iter().enumerate() {
                insert(&mut list, Entry { seq, hint: *hint }).unwrap();
            }

            prop_assert_eq!(list.len(), hints.len());
            for pair in list.windows(2) {
                let (a, b) = (&pair[0], &pair[1]);
                prop_assert!(group(a) <= group(b), "group order violated: {:?}", list);
                if group(a) == group(b) {
                    prop_assert!(a.seq < b.seq, "arrival order violated: {:?}", list);
                }
            }
        }
    }
}
