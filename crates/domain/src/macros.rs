//! Macro for implementing Display and FromStr for string-backed enums
//!
//! Actions, sync types, transparency and webhook resource states all travel
//! as lowercase strings on the wire and in logs. The macro gives each of them
//! one case-insensitive `FromStr` and a stable `Display`.
//!
//! # Example
//!
//! ```rust
//! use busysync_domain::impl_domain_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Visibility {
//!     Public,
//!     Private,
//! }
//!
//! impl_domain_status_conversions!(Visibility {
//!     Public => "public",
//!     Private => "private",
//! });
//!
//! assert_eq!("PUBLIC".parse::<Visibility>().unwrap(), Visibility::Public);
//! ```

/// Implements Display and FromStr traits for string-backed enums
///
/// - Display writes the mapped lowercase string
/// - FromStr parses case-insensitively and reports the enum name on failure
#[macro_export]
macro_rules! impl_domain_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl ::std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($str),)+
                }
            }
        }

        impl ::std::str::FromStr for $enum_name {
            type Err = ::std::string::String;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($str => ::std::result::Result::Ok(Self::$variant),)+
                    _ => ::std::result::Result::Err(::std::format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    // the crate's one-parameter alias is in scope where the macro expands
    use crate::errors::{BusySyncError, Result};

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Outcome {
        Kept,
        DeleteAttempted,
    }

    impl_domain_status_conversions!(Outcome {
        Kept => "kept",
        DeleteAttempted => "delete_attempted",
    });

    #[test]
    fn test_display_uses_mapped_string() {
        assert_eq!(Outcome::Kept.to_string(), "kept");
        assert_eq!(Outcome::DeleteAttempted.to_string(), "delete_attempted");
    }

    #[test]
    fn test_fromstr_is_case_insensitive_and_trims() {
        assert_eq!(Outcome::from_str("KEPT").unwrap(), Outcome::Kept);
        assert_eq!(Outcome::from_str(" Delete_Attempted ").unwrap(), Outcome::DeleteAttempted);
    }

    #[test]
    fn test_fromstr_invalid_names_enum() {
        let err = Outcome::from_str("gone").unwrap_err();
        assert_eq!(err, "Invalid Outcome: gone");
        assert!(Outcome::from_str("").is_err());
    }

    fn parse_outcome(raw: &str) -> Result<Outcome> {
        raw.parse().map_err(BusySyncError::InvalidInput)
    }

    #[test]
    fn test_expands_next_to_result_alias() {
        assert_eq!(parse_outcome("kept").unwrap(), Outcome::Kept);
        assert!(matches!(
            parse_outcome("lost"),
            Err(BusySyncError::InvalidInput(msg)) if msg == "Invalid Outcome: lost"
        ));
    }
}
