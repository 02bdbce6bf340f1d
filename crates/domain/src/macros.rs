//! Display/FromStr derivation for the small string-backed enums of the domain
//! (drain states, ingest error categories).
//!
//! # Example
//!
//! ```rust
//! use tnt_domain::impl_label_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Connectivity {
//!     Online,
//!     Offline,
//! }
//!
//! impl_label_conversions!(Connectivity {
//!     Online => "online",
//!     Offline => "offline",
//! });
//!
//! assert_eq!(Connectivity::Offline.to_string(), "offline");
//! assert_eq!("ONLINE".parse::<Connectivity>(), Ok(Connectivity::Online));
//! ```

/// Implements `Display` and case-insensitive `FromStr` for a fieldless enum
/// from a variant → label table.
///
/// Labels must be lowercase; parsing lowercases its input before matching.
#[macro_export]
macro_rules! impl_label_conversions {
    ($enum_name:ident { $($variant:ident => $label:expr),+ $(,)? }) => {
        impl $enum_name {
            /// Stable lowercase label for logs and persisted values.
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }
        }

        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($label => Ok(Self::$variant),)+
                    _ => Err(format!("unknown {} label: {s:?}", stringify!($enum_name))),
                }
            }
        }
    };
}
