//! Value constraints for order parameters.
//!
//! A [`Constraint`] decides whether the literal text of one parameter value is
//! acceptable. Checks are pure functions of the input: they never panic and
//! never carry state between calls. Expression values (`${...}`) are opaque to
//! this layer and are never passed to [`Constraint::check`].
//!
//! # Examples
//!
//! ```
//! use orderscript_core::Constraint;
//!
//! assert!(Constraint::NonnegativeInt.check("10").is_ok());
//! assert!(Constraint::NonnegativeInt.check("abc").is_err());
//!
//! let speed = Constraint::RangeInt { min: 0, max: 5000 };
//! let rejection = speed.check("9000").unwrap_err();
//! assert_eq!(rejection.reason.as_deref(), Some("must be at most 5000"));
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// Validator for a single parameter's literal value.
///
/// Serialized with an internal `type` tag so catalog files read naturally:
///
/// ```yaml
/// constraint: { type: range_int, min: 0, max: 5000 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Constraint {
    /// Any non-empty text.
    #[default]
    Free,
    /// A base-10 integer with an optional leading `-`.
    Int,
    /// A base-10 integer `>= 0`, digits only.
    NonnegativeInt,
    /// A base-10 integer in `[min, max]` (inclusive).
    RangeInt { min: i64, max: i64 },
    /// Exactly one of a fixed set of words.
    Choice { options: Vec<String> },
}

/// Why a value was refused by a [`Constraint`].
///
/// `reason` is only set when the constraint can say something more specific
/// than its [label](Constraint::label), e.g. which bound was violated.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Rejection {
    pub reason: Option<String>,
}

impl Rejection {
    fn plain() -> Self {
        Self { reason: None }
    }

    fn because(reason: impl Into<String>) -> Self {
        Self {
            reason: Some(reason.into()),
        }
    }
}

impl Constraint {
    /// Checks a raw value.
    pub fn check(&self, raw: &str) -> Result<(), Rejection> {
        match self {
            Constraint::Free => {
                if raw.is_empty() {
                    Err(Rejection::because("value is empty"))
                } else {
                    Ok(())
                }
            }
            Constraint::Int => parse_int(raw).map(|_| ()).ok_or_else(Rejection::plain),
            Constraint::NonnegativeInt => {
                if !is_digits(raw) {
                    return Err(Rejection::plain());
                }
                raw.parse::<u64>()
                    .map(|_| ())
                    .map_err(|_| Rejection::because("number is too large"))
            }
            Constraint::RangeInt { min, max } => {
                let value = match parse_int(raw) {
                    Some(value) => value,
                    // Well-formed but beyond i64, so past one of the bounds.
                    None if is_digits(raw) => {
                        return Err(Rejection::because(format!("must be at most {max}")));
                    }
                    None if raw.strip_prefix('-').is_some_and(is_digits) => {
                        return Err(Rejection::because(format!("must be at least {min}")));
                    }
                    None => return Err(Rejection::plain()),
                };
                if value < *min {
                    Err(Rejection::because(format!("must be at least {min}")))
                } else if value > *max {
                    Err(Rejection::because(format!("must be at most {max}")))
                } else {
                    Ok(())
                }
            }
            Constraint::Choice { options } => {
                if options.iter().any(|option| option == raw) {
                    Ok(())
                } else {
                    Err(Rejection::plain())
                }
            }
        }
    }

    /// Human-readable name of what the constraint accepts.
    pub fn label(&self) -> String {
        match self {
            Constraint::Free => "free text".to_string(),
            Constraint::Int => "integer".to_string(),
            Constraint::NonnegativeInt => "non-negative integer".to_string(),
            Constraint::RangeInt { min, max } => format!("integer in [{min}, {max}]"),
            Constraint::Choice { options } => format!("one of {}", options.join("|")),
        }
    }

    /// Returns `true` for [`Constraint::Free`].
    pub fn is_free(&self) -> bool {
        matches!(self, Constraint::Free)
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

fn is_digits(raw: &str) -> bool {
    !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit())
}

// `str::parse::<i64>` also takes a leading `+`, which the script language does not.
fn parse_int(raw: &str) -> Option<i64> {
    let digits = raw.strip_prefix('-').unwrap_or(raw);
    if !is_digits(digits) {
        return None;
    }
    raw.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_rejects_only_empty() {
        assert!(Constraint::Free.check("anything at all").is_ok());
        assert!(Constraint::Free.check("${x}").is_ok());
        assert_eq!(
            Constraint::Free.check(""),
            Err(Rejection::because("value is empty"))
        );
    }

    #[test]
    fn test_nonnegative_int() {
        let c = Constraint::NonnegativeInt;
        assert!(c.check("0").is_ok());
        assert!(c.check("500").is_ok());
        assert!(c.check("-1").is_err());
        assert!(c.check("+1").is_err());
        assert!(c.check("1.5").is_err());
        assert!(c.check(" 1").is_err());
        assert!(c.check("1a").is_err());
        assert!(c.check("").is_err());
        assert_eq!(
            c.check("99999999999999999999999"),
            Err(Rejection::because("number is too large"))
        );
    }

    #[test]
    fn test_int_accepts_negative() {
        assert!(Constraint::Int.check("-42").is_ok());
        assert!(Constraint::Int.check("42").is_ok());
        assert!(Constraint::Int.check("-").is_err());
        assert!(Constraint::Int.check("--1").is_err());
    }

    #[test]
    fn test_range_names_violated_bound() {
        let c = Constraint::RangeInt { min: 0, max: 5000 };
        assert!(c.check("0").is_ok());
        assert!(c.check("5000").is_ok());
        assert_eq!(
            c.check("9000"),
            Err(Rejection::because("must be at most 5000"))
        );
        assert_eq!(c.check("-1"), Err(Rejection::because("must be at least 0")));
        assert_eq!(c.check("fast"), Err(Rejection::plain()));
    }

    #[test]
    fn test_range_overflow_still_names_bound() {
        let c = Constraint::RangeInt { min: 0, max: 5000 };
        assert_eq!(
            c.check("99999999999999999999"),
            Err(Rejection::because("must be at most 5000"))
        );
        assert_eq!(
            c.check("-99999999999999999999"),
            Err(Rejection::because("must be at least 0"))
        );
        assert_eq!(c.check("-"), Err(Rejection::plain()));
    }

    #[test]
    fn test_choice() {
        let c = Constraint::Choice {
            options: vec!["bgm".into(), "se".into()],
        };
        assert!(c.check("se").is_ok());
        assert!(c.check("SE").is_err());
        assert_eq!(c.label(), "one of bgm|se");
    }

    #[test]
    fn test_check_is_repeatable() {
        let c = Constraint::RangeInt { min: 1, max: 3 };
        for raw in ["0", "2", "x", ""] {
            assert_eq!(c.check(raw), c.check(raw));
        }
    }

    #[test]
    fn test_serde_tagging() {
        let c = Constraint::RangeInt { min: 0, max: 10 };
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(json, r#"{"type":"range_int","min":0,"max":10}"#);
        let back: Constraint = serde_json::from_str(r#"{"type":"nonnegative_int"}"#).unwrap();
        assert_eq!(back, Constraint::NonnegativeInt);
    }
}
