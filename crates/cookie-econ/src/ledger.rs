//! Persisted per-player state and cached aggregates.
//!
//! The [`Ledger`] is the single document saved by the persistence layer. It
//! owns cookie balances, upgrade levels, the last-click pointer and the
//! clicker-message pointer. Cookies per click and per second are cached per
//! player and updated by the yield delta whenever a level changes.

use crate::error::EconError;
use chrono::{DateTime, Utc};
use cookie_core::{BigInt, Catalog, ClickerMessage, UpgradeId, UpgradeKind, UserId};
use num_traits::{Signed, Zero};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

/// Most recent successful click, shown as "X got +N cookies".
#[derive(Clone, Debug, PartialEq)]
pub struct LastClick {
    pub at: DateTime<Utc>,
    pub user: Option<UserId>,
    pub value: BigInt,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ledger {
    #[serde(with = "crate::serde_big::map")]
    cookies: BTreeMap<UserId, BigInt>,
    upgrades: BTreeMap<UserId, BTreeMap<UpgradeId, u32>>,
    #[serde(with = "crate::serde_big::map")]
    cpc_cache: BTreeMap<UserId, BigInt>,
    #[serde(with = "crate::serde_big::map")]
    cps_cache: BTreeMap<UserId, BigInt>,
    last_clicked: DateTime<Utc>,
    last_clicked_user_id: Option<UserId>,
    #[serde(with = "crate::serde_big::value")]
    last_clicked_value: BigInt,
    last_accrual: Option<DateTime<Utc>>,
    clicker_message: Option<ClickerMessage>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- balances -------------------------------------------------------

    /// Participants in ascending id order.
    pub fn participants(&self) -> impl Iterator<Item = UserId> + '_ {
        self.cookies.keys().copied()
    }

    pub fn participant_count(&self) -> usize {
        self.cookies.len()
    }

    pub fn is_participant(&self, user: UserId) -> bool {
        self.cookies.contains_key(&user)
    }

    /// Current balance; zero for non-participants. May be negative.
    pub fn cookies(&self, user: UserId) -> BigInt {
        self.cookies.get(&user).cloned().unwrap_or_default()
    }

    /// Add `delta` (possibly negative), registering the participant if new.
    pub fn add_cookies(&mut self, user: UserId, delta: &BigInt) {
        *self.cookies.entry(user).or_default() += delta;
    }

    pub fn set_cookies(&mut self, user: UserId, value: BigInt) {
        self.cookies.insert(user, value);
    }

    /// Move `amount` from one balance to another as one debit/credit pair.
    pub fn transfer(&mut self, from: UserId, to: UserId, amount: &BigInt) {
        self.add_cookies(from, &-amount);
        self.add_cookies(to, amount);
    }

    /// Sum of all balances.
    pub fn total_cookies(&self) -> BigInt {
        self.cookies.values().sum()
    }

    // ---- upgrades -------------------------------------------------------

    pub fn level(&self, user: UserId, id: UpgradeId) -> u32 {
        self.upgrades
            .get(&user)
            .and_then(|m| m.get(&id))
            .copied()
            .unwrap_or(0)
    }

    /// Owned upgrades of a player with their levels (level > 0 only).
    pub fn levels(&self, user: UserId) -> impl Iterator<Item = (UpgradeId, u32)> + '_ {
        self.upgrades
            .get(&user)
            .into_iter()
            .flat_map(|m| m.iter().map(|(id, lvl)| (*id, *lvl)))
    }

    /// Set a level and shift the cached aggregates by the yield delta.
    ///
    /// Registers the player as a participant so passive income accrues.
    pub fn set_upgrade_level(
        &mut self,
        catalog: &Catalog,
        user: UserId,
        id: UpgradeId,
        new_level: u32,
    ) -> Result<(), EconError> {
        let upgrade = catalog.get(id).ok_or(EconError::UnknownUpgrade(id))?;
        let old_level = self.level(user, id);
        let (old, new) = (i64::from(old_level), i64::from(new_level));
        match upgrade.kind {
            UpgradeKind::Click => {
                let delta = upgrade.cookies_per_click(new)? - upgrade.cookies_per_click(old)?;
                *self.cpc_cache.entry(user).or_default() += delta;
            }
            UpgradeKind::Passive => {
                let delta = upgrade.cookies_per_second(new)? - upgrade.cookies_per_second(old)?;
                *self.cps_cache.entry(user).or_default() += delta;
            }
            UpgradeKind::Swindle => {
                // validated here so a bad curve fails before the level is stored
                upgrade.swindle_probability(new)?;
            }
        }
        let levels = self.upgrades.entry(user).or_default();
        if new_level == 0 {
            levels.remove(&id);
        } else {
            levels.insert(id, new_level);
        }
        if levels.is_empty() {
            self.upgrades.remove(&user);
        }
        self.cookies.entry(user).or_default();
        self.cpc_cache.entry(user).or_default();
        self.cps_cache.entry(user).or_default();
        debug!(user = %user, upgrade = %id, old_level, new_level, "upgrade level set");
        Ok(())
    }

    /// Whether any player has reached `level` of upgrade `id`.
    pub fn any_reached(&self, id: UpgradeId, level: u32) -> bool {
        self.upgrades
            .values()
            .any(|m| m.get(&id).is_some_and(|l| *l >= level))
    }

    // ---- aggregates -----------------------------------------------------

    pub fn cookies_per_click(&self, user: UserId) -> BigInt {
        self.cpc_cache.get(&user).cloned().unwrap_or_default()
    }

    pub fn cookies_per_second(&self, user: UserId) -> BigInt {
        self.cps_cache.get(&user).cloned().unwrap_or_default()
    }

    /// Union of independent swindle chances: `1 - prod(1 - p_i)`.
    pub fn swindle_probability(&self, catalog: &Catalog, user: UserId) -> Result<Decimal, EconError> {
        let mut miss = Decimal::ONE;
        for (id, level) in self.levels(user) {
            let upgrade = catalog.get(id).ok_or(EconError::UnknownUpgrade(id))?;
            if upgrade.kind != UpgradeKind::Swindle {
                continue;
            }
            let p = upgrade.swindle_probability(i64::from(level))?;
            miss *= Decimal::ONE - p;
        }
        Ok(Decimal::ONE - miss)
    }

    /// Full recomputation of `(cpc, cps)` from levels.
    pub fn full_aggregates(&self, catalog: &Catalog, user: UserId) -> Result<(BigInt, BigInt), EconError> {
        let mut cpc = BigInt::zero();
        let mut cps = BigInt::zero();
        for (id, level) in self.levels(user) {
            let upgrade = catalog.get(id).ok_or(EconError::UnknownUpgrade(id))?;
            let level = i64::from(level);
            cpc += upgrade.cookies_per_click(level)?;
            cps += upgrade.cookies_per_second(level)?;
        }
        Ok((cpc, cps))
    }

    /// Drop every cached aggregate.
    pub fn clear_caches(&mut self) {
        self.cpc_cache.clear();
        self.cps_cache.clear();
    }

    /// Fill cache entries missing for players that own upgrades.
    /// Returns the number of players whose cache was rebuilt.
    pub fn reconcile_caches(&mut self, catalog: &Catalog) -> Result<usize, EconError> {
        let stale: Vec<UserId> = self
            .upgrades
            .keys()
            .filter(|u| !self.cpc_cache.contains_key(u) || !self.cps_cache.contains_key(u))
            .copied()
            .collect();
        for user in &stale {
            let (cpc, cps) = self.full_aggregates(catalog, *user)?;
            self.cpc_cache.insert(*user, cpc);
            self.cps_cache.insert(*user, cps);
        }
        Ok(stale.len())
    }

    /// Clear and recompute all caches from levels.
    pub fn rebuild_caches(&mut self, catalog: &Catalog) -> Result<usize, EconError> {
        self.clear_caches();
        self.reconcile_caches(catalog)
    }

    /// Rewrite upgrade ids in every level map, dropping caches.
    ///
    /// Ids missing from `remap` are kept. Two ids mapped onto one keep the
    /// higher level.
    pub fn remap_upgrade_ids(&mut self, remap: &BTreeMap<UpgradeId, UpgradeId>) {
        for levels in self.upgrades.values_mut() {
            let mut moved = BTreeMap::new();
            for (id, level) in std::mem::take(levels) {
                let target = remap.get(&id).copied().unwrap_or(id);
                let slot = moved.entry(target).or_insert(0);
                *slot = (*slot).max(level);
            }
            *levels = moved;
        }
        self.clear_caches();
    }

    // ---- lifecycle ------------------------------------------------------

    /// Remove a participant's balance, levels and cache entries.
    pub fn delete_participant(&mut self, user: UserId) -> bool {
        let existed = self.cookies.remove(&user).is_some();
        let had_levels = self.upgrades.remove(&user).is_some();
        self.cpc_cache.remove(&user);
        self.cps_cache.remove(&user);
        if self.last_clicked_user_id == Some(user) {
            self.last_clicked_user_id = None;
            self.last_clicked_value = BigInt::zero();
        }
        existed || had_levels
    }

    /// Remove every participant. Timestamps and the clicker pointer survive.
    pub fn reset_all(&mut self) -> usize {
        let n = self.cookies.len();
        self.cookies.clear();
        self.upgrades.clear();
        self.clear_caches();
        self.last_clicked_user_id = None;
        self.last_clicked_value = BigInt::zero();
        n
    }

    // ---- clicks and timers ----------------------------------------------

    pub fn last_click(&self) -> LastClick {
        LastClick {
            at: self.last_clicked,
            user: self.last_clicked_user_id,
            value: self.last_clicked_value.clone(),
        }
    }

    /// Overwrite the last-click pointer.
    pub fn record_click(&mut self, at: DateTime<Utc>, user: UserId, value: BigInt) {
        self.last_clicked = at;
        self.last_clicked_user_id = Some(user);
        self.last_clicked_value = value;
    }

    /// Time left on the global click cooldown at `now`.
    pub fn cooldown_remaining(&self, now: DateTime<Utc>, cooldown: Duration) -> Duration {
        let elapsed = now
            .signed_duration_since(self.last_clicked)
            .to_std()
            .unwrap_or(Duration::ZERO);
        cooldown.saturating_sub(elapsed)
    }

    pub fn last_accrual(&self) -> Option<DateTime<Utc>> {
        self.last_accrual
    }

    pub fn set_last_accrual(&mut self, at: DateTime<Utc>) {
        self.last_accrual = Some(at);
    }

    // ---- clicker message ------------------------------------------------

    pub fn clicker_message(&self) -> Option<ClickerMessage> {
        self.clicker_message
    }

    pub fn set_clicker_message(&mut self, msg: ClickerMessage) {
        self.clicker_message = Some(msg);
    }

    pub fn clear_clicker_message(&mut self) -> Option<ClickerMessage> {
        self.clicker_message.take()
    }

    /// Players with a negative balance.
    pub fn debtors(&self) -> impl Iterator<Item = (UserId, &BigInt)> + '_ {
        self.cookies
            .iter()
            .filter(|(_, c)| c.is_negative())
            .map(|(u, c)| (*u, c))
    }
}
