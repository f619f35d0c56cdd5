//! Upgrade definitions and the ordered catalog.

use crate::curve::{Amount, Curve, CurveValue};
use crate::format::{amount, percent};
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Position of an upgrade in the catalog. Stable for the lifetime of a save.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UpgradeId(pub usize);

impl fmt::Display for UpgradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What an upgrade's yield curve means.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpgradeKind {
    /// Extra cookies per click.
    Click,
    /// Cookies per second, credited by idle accrual.
    Passive,
    /// Probability in [0, 1] of swindling first place on a click.
    Swindle,
}

/// Effect of an upgrade at a given level.
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    CookiesPerClick(BigInt),
    CookiesPerSecond(BigInt),
    SwindleChance(Decimal),
}

/// Errors found while building the catalog or reading effects from it.
#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    #[error("upgrade {0} has an empty name")]
    EmptyName(usize),
    #[error("catalog has no upgrades")]
    Empty,
    #[error("upgrade {id} yields an unbounded amount at level {level}")]
    UnboundedYield { id: UpgradeId, level: i64 },
    #[error("upgrade {id} swindle probability at level {level} is outside [0, 1]")]
    ProbabilityOutOfRange { id: UpgradeId, level: i64 },
    #[error("upgrade {id} swindle probability at level {level} is not representable")]
    ProbabilityPrecision { id: UpgradeId, level: i64 },
    #[error("upgrade {0} has a price curve that can go negative")]
    NegativePrice(UpgradeId),
}

/// Config form of an upgrade; ids are assigned from list order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UpgradeSpec {
    pub emoji: String,
    pub name: String,
    pub kind: UpgradeKind,
    #[serde(rename = "yield")]
    pub yields: Curve,
    pub price: Curve,
    #[serde(default)]
    pub hidden: bool,
}

/// A catalog entry. Immutable once the catalog is built.
#[derive(Clone, Debug)]
pub struct Upgrade {
    pub id: UpgradeId,
    pub emoji: String,
    pub name: String,
    pub kind: UpgradeKind,
    pub hidden: bool,
    yields: Curve,
    price: Curve,
}

impl Upgrade {
    /// Price to reach `level`. Zero for `level <= 0`; `Unbounded` once maxed.
    pub fn price(&self, level: i64) -> Amount {
        if level <= 0 {
            return Amount::zero();
        }
        self.price.amount_at(level)
    }

    /// Raw yield curve value at `level`; zero for `level <= 0`.
    pub fn raw_yield(&self, level: i64) -> CurveValue {
        self.yields.at(level)
    }

    /// Typed effect at `level`.
    pub fn effect(&self, level: i64) -> Result<Effect, CatalogError> {
        let value = self.raw_yield(level);
        match self.kind {
            UpgradeKind::Click => self.integer_yield(value, level).map(Effect::CookiesPerClick),
            UpgradeKind::Passive => self.integer_yield(value, level).map(Effect::CookiesPerSecond),
            UpgradeKind::Swindle => self
                .probability(value.as_rational(), level)
                .map(Effect::SwindleChance),
        }
    }

    fn integer_yield(&self, value: CurveValue, level: i64) -> Result<BigInt, CatalogError> {
        match value.to_amount() {
            Amount::Finite(n) => Ok(n),
            Amount::Unbounded => Err(CatalogError::UnboundedYield { id: self.id, level }),
        }
    }

    fn probability(&self, value: Option<&BigRational>, level: i64) -> Result<Decimal, CatalogError> {
        let r = value.ok_or(CatalogError::ProbabilityOutOfRange { id: self.id, level })?;
        if r.is_negative() || *r > BigRational::one() {
            return Err(CatalogError::ProbabilityOutOfRange { id: self.id, level });
        }
        crate::curve::rational_to_decimal(r)
            .ok_or(CatalogError::ProbabilityPrecision { id: self.id, level })
    }

    /// Cookies per click at `level`; zero for other kinds.
    pub fn cookies_per_click(&self, level: i64) -> Result<BigInt, CatalogError> {
        match self.effect(level)? {
            Effect::CookiesPerClick(n) => Ok(n),
            _ => Ok(BigInt::zero()),
        }
    }

    /// Cookies per second at `level`; zero for other kinds.
    pub fn cookies_per_second(&self, level: i64) -> Result<BigInt, CatalogError> {
        match self.effect(level)? {
            Effect::CookiesPerSecond(n) => Ok(n),
            _ => Ok(BigInt::zero()),
        }
    }

    /// Swindle probability at `level`; zero for other kinds.
    pub fn swindle_probability(&self, level: i64) -> Result<Decimal, CatalogError> {
        match self.effect(level)? {
            Effect::SwindleChance(p) => Ok(p),
            _ => Ok(Decimal::ZERO),
        }
    }

    /// Short value label such as `+25 / sec`.
    ///
    /// With `hide` set, hidden upgrades mask their numbers. Swindle upgrades
    /// only mask their first level.
    pub fn value_str(&self, level: i64, hide: bool, places: u32) -> Result<String, CatalogError> {
        let masked = hide && self.hidden;
        let s = match self.kind {
            UpgradeKind::Click if masked => "+??? / click".to_string(),
            UpgradeKind::Passive if masked => "+??? / sec".to_string(),
            UpgradeKind::Swindle if masked && level <= 1 => "???".to_string(),
            UpgradeKind::Click => {
                let n = self.cookies_per_click(level)?;
                format!("+{} / click", amount(&Amount::Finite(n), places))
            }
            UpgradeKind::Passive => {
                let n = self.cookies_per_second(level)?;
                format!("+{} / sec", amount(&Amount::Finite(n), places))
            }
            UpgradeKind::Swindle => percent(self.swindle_probability(level)?),
        };
        Ok(s)
    }

    /// Upgrade-screen description for a player at `level`.
    pub fn description(
        &self,
        level: i64,
        hide: bool,
        places: u32,
        swindle_amount: Decimal,
    ) -> Result<String, CatalogError> {
        if self.kind == UpgradeKind::Swindle {
            if level <= 0 && hide && self.hidden {
                return Ok("???".to_string());
            }
            let p = self.swindle_probability(level)?;
            return Ok(format!(
                "**{}** chance to **swindle** {} of 1st place's cookies when clicking the button",
                percent(p),
                percent(swindle_amount)
            ));
        }
        if level <= 0 {
            return Ok("Not purchased yet!".to_string());
        }
        Ok(format!("**{}**", self.value_str(level, hide, places)?))
    }
}

/// Ordered, read-only list of upgrades. Index in the list is the id.
#[derive(Clone, Debug)]
pub struct Catalog {
    upgrades: Vec<Upgrade>,
}

impl Catalog {
    /// Build a catalog, assigning ids sequentially in list order.
    pub fn from_specs(specs: Vec<UpgradeSpec>) -> Result<Self, CatalogError> {
        if specs.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut upgrades = Vec::with_capacity(specs.len());
        for (i, spec) in specs.into_iter().enumerate() {
            if spec.name.trim().is_empty() {
                return Err(CatalogError::EmptyName(i));
            }
            let id = UpgradeId(i);
            if spec.price.spec().can_go_negative() {
                return Err(CatalogError::NegativePrice(id));
            }
            upgrades.push(Upgrade {
                id,
                emoji: spec.emoji,
                name: spec.name,
                kind: spec.kind,
                hidden: spec.hidden,
                yields: spec.yields,
                price: spec.price,
            });
        }
        let catalog = Self { upgrades };
        // Swindle curves are checked at level 1; out-of-range levels surface later as errors.
        for u in catalog.of_kind(UpgradeKind::Swindle) {
            u.swindle_probability(1)?;
        }
        Ok(catalog)
    }

    pub fn get(&self, id: UpgradeId) -> Option<&Upgrade> {
        self.upgrades.get(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Upgrade> {
        self.upgrades.iter()
    }

    pub fn of_kind(&self, kind: UpgradeKind) -> impl Iterator<Item = &Upgrade> {
        self.upgrades.iter().filter(move |u| u.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.upgrades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.upgrades.is_empty()
    }
}
