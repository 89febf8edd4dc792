//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Pigeons and food items each get a strongly-typed ID so the two can never
//! be mixed up at compile time. Food IDs are the stable handle an agent
//! keeps between choosing a target and trying to eat it: the pool checks
//! the ID at removal time instead of trusting a reference into its storage.
//!
//! IDs are UUID v7 and serialize as the bare UUID string.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Declares a UUID-backed identifier newtype.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Mint a fresh identifier.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// The underlying [`Uuid`].
            pub const fn into_inner(self) -> Uuid {
                self.0
            }

            /// The last eight hex digits, for thread names and terse logs.
            ///
            /// The tail is the random part of a v7 UUID; the head is a
            /// timestamp and repeats between IDs minted close together.
            pub fn short(self) -> String {
                let simple = self.0.simple().to_string();
                simple.get(24..).unwrap_or(&simple).to_owned()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

define_id! {
    /// Unique identifier for a pigeon.
    PigeonId
}

define_id! {
    /// Unique identifier for a food item in the shared pool.
    FoodId
}
