//! Bundler-assigned identifiers.
//!
//! Bundlers hand out either numeric ids (the default production strategy) or
//! string ids (named/deterministic strategies). Both shapes round-trip through
//! JSON unchanged: numbers stay numbers, strings stay strings.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(untagged)]
        pub enum $name {
            Number(u64),
            String(String),
        }

        impl $name {
            /// Returns the numeric form, if this id is numeric.
            pub fn as_number(&self) -> Option<u64> {
                match self {
                    Self::Number(n) => Some(*n),
                    Self::String(_) => None,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    Self::Number(n) => write!(f, "{n}"),
                    Self::String(s) => f.write_str(s),
                }
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self::Number(value)
            }
        }

        impl From<u32> for $name {
            fn from(value: u32) -> Self {
                Self::Number(u64::from(value))
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::String(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self::String(value)
            }
        }
    };
}

define_id!(
    /// Module identifier as assigned by one bundling pass.
    ///
    /// The same source file can carry a different `ModuleId` in the browser
    /// bundle, the default server bundle and the edge server bundle.
    ModuleId
);

define_id!(
    /// Chunk identifier as assigned by the browser bundling pass.
    ChunkId
);
