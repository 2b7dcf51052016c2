//! Strongly-typed identifiers used across the domain.

use core::str::FromStr;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Public, immutable identifier of an order (`<prefix>-<time base36>-<random base36>`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNumber(String);

/// Identifier of a catalog (menu) entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MenuItemId(String);

macro_rules! impl_string_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $t {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Err(DomainError::validation(concat!($name, " must not be empty")));
                }
                Ok(Self(trimmed.to_string()))
            }
        }
    };
}

impl_string_newtype!(OrderNumber, "order number");
impl_string_newtype!(MenuItemId, "menu item id");

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const RANDOM_SUFFIX_LEN: usize = 6;
pub const DEFAULT_ORDER_PREFIX: &str = "ORD";

impl OrderNumber {
    /// Generate a fresh order number using the thread-local RNG.
    pub fn generate(prefix: &str, at: DateTime<Utc>) -> Self {
        Self::generate_with(prefix, at, &mut rand::thread_rng())
    }

    /// Generate an order number from an explicit RNG (deterministic in tests).
    pub fn generate_with<R: Rng + ?Sized>(prefix: &str, at: DateTime<Utc>, rng: &mut R) -> Self {
        let prefix = match prefix.trim() {
            "" => DEFAULT_ORDER_PREFIX,
            p => p,
        };
        let millis = u64::try_from(at.timestamp_millis()).unwrap_or(0);
        let suffix: String = (0..RANDOM_SUFFIX_LEN)
            .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
            .collect();
        Self(format!("{prefix}-{}-{suffix}", to_base36(millis)))
    }
}

fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}
