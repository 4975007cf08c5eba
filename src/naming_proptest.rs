//! Property-based tests for the naming helpers.

#[cfg(test)]
mod proptest_tests {
    use crate::naming::{canonical_name, source_id};
    use proptest::prelude::*;

    proptest! {
        /// Property: source ids only contain folder-safe characters
        #[test]
        fn source_id_only_produces_safe_chars(input in ".*") {
            let result = source_id(&input);
            prop_assert!(
                result.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-'),
                "source_id produced an unsafe id '{}' from '{}'",
                result,
                input
            );
        }

        /// Property: source ids are deterministic
        #[test]
        fn source_id_is_deterministic(input in ".*") {
            prop_assert_eq!(source_id(&input), source_id(&input));
        }

        /// Property: already-safe input is kept as is
        #[test]
        fn source_id_preserves_safe_input(input in "[A-Za-z0-9_-]+") {
            prop_assert_eq!(source_id(&input), input);
        }

        /// Property: canonicalizing twice changes nothing
        #[test]
        fn canonical_name_is_idempotent(input in "[A-Za-z0-9_-]{0,40}") {
            let once = canonical_name(&input);
            prop_assert_eq!(canonical_name(&once), once.clone());
        }

        /// Property: canonical names carry no uppercase letters or hyphens
        #[test]
        fn canonical_name_is_lower_snake(input in "[A-Za-z0-9_-]{0,40}") {
            let result = canonical_name(&input);
            prop_assert!(!result.chars().any(|c| c.is_ascii_uppercase() || c == '-'));
        }
    }
}
