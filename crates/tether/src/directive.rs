#![forbid(unsafe_code)]

//! Directive parsing.
//!
//! A directive is the string assigned to a target's property path:
//!
//! ```text
//! rightKey              e.g. "model.title"
//! mapperSpec@rightKey   e.g. "scale.round@model.volume"
//! ```
//!
//! Exactly one `@` splits a mapper spec from the right-hand property path;
//! no `@` means the identity mapper. Anything else is a configuration
//! error surfaced at parse time, never deferred to propagation time.

use tether_core::PropPath;

use crate::mapper::{Mapper, MapperRegistry};

const SPEC_SEPARATOR: char = '@';

/// Setup-time directive errors. Per-value failures (unresolved source,
/// transform decline) are absorbed by the engine and never reach here.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectiveError {
    /// The directive does not match `rightKey` or `mapperSpec@rightKey`.
    #[error("malformed binding directive {raw:?}: expected \"rightKey\" or \"mapperSpec@rightKey\"")]
    Malformed { raw: String },
    /// A mapper spec segment names no registered step.
    #[error("unknown mapper step {name:?}")]
    UnknownMapStep { name: String },
}

/// Split a directive into its mapper and right-hand property path.
pub fn parse(
    raw: &str,
    mappers: &MapperRegistry,
) -> Result<(Mapper, PropPath), DirectiveError> {
    let segments: Vec<&str> = raw.split(SPEC_SEPARATOR).collect();
    let (mapper, right_key) = match segments.as_slice() {
        [right_key] => (Mapper::identity(), *right_key),
        [spec, right_key] => (mappers.compose(spec)?, *right_key),
        _ => {
            return Err(DirectiveError::Malformed {
                raw: raw.to_owned(),
            });
        }
    };
    if right_key.is_empty() {
        return Err(DirectiveError::Malformed {
            raw: raw.to_owned(),
        });
    }
    Ok((mapper, PropPath::from(right_key)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tether_core::Value;

    #[test]
    fn bare_key_gets_identity_mapper() {
        let registry = MapperRegistry::new();
        let (mapper, key) = parse("model.title", &registry).unwrap();
        assert_eq!(key.as_str(), "model.title");
        assert_eq!(mapper.to(Value::Int(3)), Some(Value::Int(3)));
        assert_eq!(mapper.back(Value::Int(3)), Some(Value::Int(3)));
    }

    #[test]
    fn spec_and_key_compose_through_registry() {
        let registry = MapperRegistry::new();
        registry.register(
            "negate",
            Mapper::new(
                |v| v.as_int().map(|x| Value::from(-x)),
                |v| v.as_int().map(|x| Value::from(-x)),
            ),
        );

        let (mapper, key) = parse("negate@level", &registry).unwrap();
        assert_eq!(key.as_str(), "level");
        assert_eq!(mapper.to(Value::Int(4)), Some(Value::Int(-4)));
    }

    #[test]
    fn three_segments_fail_at_parse_time() {
        let registry = MapperRegistry::new();
        let err = parse("x@y@z", &registry).unwrap_err();
        assert_eq!(err, DirectiveError::Malformed { raw: "x@y@z".into() });
    }

    #[test]
    fn empty_right_key_is_malformed() {
        let registry = MapperRegistry::new();
        assert!(parse("", &registry).is_err());
        assert!(parse("spec@", &registry).is_err());
    }

    #[test]
    fn unknown_step_fails_at_parse_time() {
        let registry = MapperRegistry::new();
        let err = parse("missing@key", &registry).unwrap_err();
        assert_eq!(
            err,
            DirectiveError::UnknownMapStep {
                name: "missing".into()
            }
        );
    }

    proptest! {
        #[test]
        fn separator_free_directives_parse_as_bare_keys(raw in "[a-z][a-z.]{0,20}") {
            let registry = MapperRegistry::new();
            let (_, key) = parse(&raw, &registry).unwrap();
            prop_assert_eq!(key.as_str(), raw.as_str());
        }

        #[test]
        fn two_or_more_separators_always_fail(a in "[a-z]{1,5}", b in "[a-z]{1,5}", c in "[a-z]{1,5}") {
            let registry = MapperRegistry::new();
            let raw = format!("{a}@{b}@{c}");
            prop_assert!(
                matches!(
                    parse(&raw, &registry),
                    Err(DirectiveError::Malformed { .. })
                ),
                "expected Malformed error for {:?}",
                raw
            );
        }
    }
}
