//! Property-based tests for pattern resolution.
//!
//! Generated pattern specs are resolved and compared against a manual
//! enumeration of the same spec.

#[cfg(test)]
mod proptest_tests {
    use crate::patterns::{resolve, PatternEntry, PatternSpec};
    use proptest::prelude::*;
    use serde_yaml::Value;

    fn glob() -> impl Strategy<Value = String> {
        "[a-z*/.]{1,12}".prop_filter("non-blank", |s| !s.trim().is_empty())
    }

    fn group_name() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9_-]{0,8}"
    }

    fn named() -> impl Strategy<Value = PatternSpec> {
        prop::collection::vec((group_name(), glob()), 0..5).prop_map(|pairs| {
            let mut seen = Vec::new();
            let unique = pairs
                .into_iter()
                .filter(|(name, _)| {
                    if seen.contains(name) {
                        false
                    } else {
                        seen.push(name.clone());
                        true
                    }
                })
                .collect();
            PatternSpec::Named(unique)
        })
    }

    fn spec() -> impl Strategy<Value = PatternSpec> {
        let leaf = prop_oneof![glob().prop_map(PatternSpec::Single), named()];
        leaf.prop_recursive(3, 24, 4, |inner| {
            prop::collection::vec(inner, 0..4).prop_map(PatternSpec::List)
        })
    }

    /// Straightforward enumeration to compare against.
    fn enumerate(spec: &PatternSpec, default: &str, out: &mut Vec<(String, String)>) {
        match spec {
            PatternSpec::Single(p) => out.push((default.to_string(), p.clone())),
            PatternSpec::List(items) => {
                for item in items {
                    enumerate(item, default, out);
                }
            }
            PatternSpec::Named(groups) => out.extend(groups.iter().cloned()),
        }
    }

    proptest! {
        /// Property: resolve yields exactly the manually enumerated pairs, in order
        #[test]
        fn resolve_matches_manual_enumeration(spec in spec(), default in group_name()) {
            let mut expected = Vec::new();
            enumerate(&spec, &default, &mut expected);

            let actual: Vec<(String, String)> = resolve(&spec, &default)
                .into_iter()
                .map(|PatternEntry { name, pattern }| (name, pattern))
                .collect();
            prop_assert_eq!(actual, expected);
        }

        /// Property: a spec survives conversion to YAML and back unchanged
        #[test]
        fn spec_survives_yaml_value(spec in spec()) {
            let value = Value::from(spec.clone());
            let parsed = PatternSpec::from_value(&value);
            prop_assert!(parsed.is_ok());
            prop_assert_eq!(parsed.unwrap(), spec);
        }

        /// Property: a single pattern always resolves to one entry under the default name
        #[test]
        fn single_pattern_uses_default(pattern in glob(), default in group_name()) {
            let entries = resolve(&PatternSpec::Single(pattern.clone()), &default);
            prop_assert_eq!(entries, vec![PatternEntry::new(default, pattern)]);
        }

        /// Property: scalars other than strings are always rejected
        #[test]
        fn non_string_scalars_rejected(n in any::<i64>(), b in any::<bool>()) {
            prop_assert!(PatternSpec::from_value(&Value::Number(n.into())).is_err());
            prop_assert!(PatternSpec::from_value(&Value::Bool(b)).is_err());
        }
    }
}
