//! Serde helpers writing big integers as decimal strings.
//!
//! JSON numbers past 2^53 lose precision in most readers, so balances are
//! stored as strings. Plain integers of any size are still accepted when
//! reading older documents.

use cookie_core::{BigInt, NumberText};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serializer};
use std::str::FromStr;

fn parse(text: NumberText) -> Result<BigInt, String> {
    let s = text.0;
    BigInt::from_str(s.trim()).map_err(|e| format!("{s:?}: {e}"))
}

pub mod value {
    use super::*;

    pub fn serialize<S: Serializer>(n: &BigInt, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&n.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<BigInt, D::Error> {
        parse(NumberText::deserialize(d)?).map_err(D::Error::custom)
    }
}

pub mod map {
    use super::*;
    use serde::Serialize;
    use std::collections::BTreeMap;

    pub fn serialize<K, S>(m: &BTreeMap<K, BigInt>, s: S) -> Result<S::Ok, S::Error>
    where
        K: Serialize,
        S: Serializer,
    {
        s.collect_map(m.iter().map(|(k, v)| (k, v.to_string())))
    }

    pub fn deserialize<'de, K, D>(d: D) -> Result<BTreeMap<K, BigInt>, D::Error>
    where
        K: Deserialize<'de> + Ord,
        D: Deserializer<'de>,
    {
        let raw: BTreeMap<K, NumberText> = BTreeMap::deserialize(d)?;
        raw.into_iter()
            .map(|(k, v)| parse(v).map(|n| (k, n)).map_err(D::Error::custom))
            .collect()
    }
}
