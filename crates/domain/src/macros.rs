//! Macro for implementing Display and FromStr for status enums
//!
//! Status columns are stored as lowercase text. The macro keeps the SQL
//! representation, the JSON wire form and parsing in one place.
//!
//! # Example
//!
//! ```rust
//! use backoffice_domain::impl_domain_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum DeliveryState {
//!     Scheduled,
//!     Delivered,
//! }
//!
//! impl_domain_status_conversions!(DeliveryState {
//!     Scheduled => "scheduled",
//!     Delivered => "delivered",
//! });
//!
//! assert_eq!(DeliveryState::Delivered.to_string(), "delivered");
//! assert_eq!("SCHEDULED".parse::<DeliveryState>(), Ok(DeliveryState::Scheduled));
//! ```

/// Implements Display and FromStr traits for status enums
///
/// This macro generates:
/// - Display trait: converts enum variants to lowercase strings
/// - FromStr trait: parses case-insensitive strings to enum variants
///
/// The string literals must be lowercase.
#[macro_export]
macro_rules! impl_domain_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl ::std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                match self {
                    $(Self::$variant => write!(f, $str),)+
                }
            }
        }

        impl ::std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum TestStatus {
        Pending,
        Synced,
        Error,
    }

    impl_domain_status_conversions!(TestStatus {
        Pending => "pending",
        Synced => "synced",
        Error => "error",
    });

    #[test]
    fn test_display_conversion() {
        assert_eq!(TestStatus::Pending.to_string(), "pending");
        assert_eq!(TestStatus::Synced.to_string(), "synced");
        assert_eq!(TestStatus::Error.to_string(), "error");
    }

    #[test]
    fn test_fromstr_ignores_case_and_padding() {
        assert_eq!(TestStatus::from_str("SYNCED").unwrap(), TestStatus::Synced);
        assert_eq!(TestStatus::from_str(" Pending ").unwrap(), TestStatus::Pending);
    }

    #[test]
    fn test_fromstr_invalid() {
        let result = TestStatus::from_str("archived");
        assert!(result.unwrap_err().contains("Invalid TestStatus: archived"));
        assert!(TestStatus::from_str("").is_err());
    }

    mod with_result_alias {
        #[allow(dead_code)]
        type Result<T> = std::result::Result<T, crate::BackofficeError>;

        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum Leg {
            Outbound,
            Return,
        }

        impl_domain_status_conversions!(Leg {
            Outbound => "outbound",
            Return => "return",
        });
    }

    #[test]
    fn test_expands_next_to_a_local_result_alias() {
        use with_result_alias::Leg;

        assert_eq!("Return".parse::<Leg>(), Ok(Leg::Return));
        assert_eq!(Leg::Outbound.to_string(), "outbound");
    }
}
