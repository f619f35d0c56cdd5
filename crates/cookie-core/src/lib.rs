#![deny(warnings)]

//! Core domain model for the cookie economy.
//!
//! This crate defines the upgrade catalog, the exact-arithmetic value curves
//! behind prices and yields, economy configuration, and the formatting helpers
//! used to present big numbers. It performs no I/O.

pub mod config;
pub mod curve;
pub mod format;
pub mod numtext;
pub mod quotes;
pub mod upgrade;

pub use config::{ConfigError, EconomyConfig};
pub use numtext::NumberText;
pub use curve::{Amount, Curve, CurveError, CurveSpec, CurveValue, Exact};
pub use upgrade::{Catalog, CatalogError, Effect, Upgrade, UpgradeId, UpgradeKind, UpgradeSpec};

pub use num_bigint::BigInt;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Chat-platform user id of a participant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl UserId {
    /// Mention markup understood by the chat platform.
    pub fn mention(&self) -> String {
        format!("<@{}>", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pointer to the single rendered leaderboard message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickerMessage {
    pub channel_id: u64,
    pub message_id: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn user_ids_serialize_as_map_keys() {
        let mut m = BTreeMap::new();
        m.insert(UserId(42), 7u32);
        let s = serde_json::to_string(&m).unwrap();
        assert_eq!(s, r#"{"42":7}"#);
        let back: BTreeMap<UserId, u32> = serde_json::from_str(&s).unwrap();
        assert_eq!(back[&UserId(42)], 7);
    }

    #[test]
    fn mention_markup() {
        assert_eq!(UserId(9).mention(), "<@9>");
    }
}
