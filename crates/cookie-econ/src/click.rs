//! Click resolution and the swindle mechanic.
//!
//! A click runs, in order: surface check, cooldown check, yield roll, credit,
//! last-click update, swindle roll, swindle transfer. Any rejection happens
//! before the first mutation.

use crate::error::{ActionError, Rejection};
use crate::ledger::Ledger;
use crate::ranking;
use chrono::{DateTime, Utc};
use cookie_core::{BigInt, Catalog, EconomyConfig, UserId};
use num_integer::Integer;
use num_traits::{Signed, ToPrimitive, Zero};
use rand::seq::SliceRandom;
use rand::Rng;
use rust_decimal::Decimal;
use tracing::{debug, info};

/// What happened when a swindle fired.
#[derive(Clone, Debug, PartialEq)]
pub enum SwindleEvent {
    /// The clicker took `amount` from the leader.
    Stole { victim: UserId, amount: BigInt },
    /// The clicker was the leader and lost `amount` to a random other player.
    /// `recipient` is `None` when nobody else is playing.
    Backfire {
        recipient: Option<UserId>,
        amount: BigInt,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClickOutcome {
    pub user: UserId,
    /// Random part of the yield.
    pub base: BigInt,
    /// Cookies-per-click bonus from upgrades.
    pub bonus: BigInt,
    /// `base + bonus`, credited to the clicker.
    pub total: BigInt,
    /// Swindle chance used for the roll.
    pub swindle_chance: Decimal,
    pub swindle: Option<SwindleEvent>,
}

/// `floor(n * fraction)` computed exactly.
pub fn fraction_of(n: &BigInt, fraction: Decimal) -> BigInt {
    let mantissa = BigInt::from(fraction.mantissa());
    let scale = BigInt::from(10u32).pow(fraction.scale());
    (n * mantissa).div_floor(&scale)
}

/// Resolve one click by `user` at `now`.
///
/// `attached_to` is the message id the click came from, if any; a click on a
/// message that is no longer the registered clicker is rejected as stale.
pub fn resolve_click<R: Rng + ?Sized>(
    ledger: &mut Ledger,
    catalog: &Catalog,
    config: &EconomyConfig,
    user: UserId,
    attached_to: Option<u64>,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Result<ClickOutcome, ActionError> {
    if let Some(message_id) = attached_to {
        if ledger.clicker_message().map(|m| m.message_id) != Some(message_id) {
            return Err(Rejection::StaleSurface.into());
        }
    }
    let remaining = ledger.cooldown_remaining(now, config.cooldown());
    if !remaining.is_zero() {
        return Err(Rejection::OnCooldown { remaining }.into());
    }
    // Validate before mutating so an internal error cannot leave a half-applied click.
    let swindle_chance = ledger.swindle_probability(catalog, user)?;

    let (lo, hi) = config.cookie_range;
    let base = BigInt::from(rng.gen_range(lo..=hi));
    let mut bonus = ledger.cookies_per_click(user);
    if bonus.is_negative() {
        debug!(user = %user, bonus = %bonus, "negative click bonus clamped to zero");
        bonus = BigInt::zero();
    }
    let total = &base + &bonus;

    ledger.add_cookies(user, &total);
    ledger.record_click(now, user, total.clone());

    let swindle = if roll(swindle_chance, rng) {
        Some(swindle(ledger, config, user, rng))
    } else {
        None
    };

    debug!(user = %user, total = %total, chance = %swindle_chance, "click resolved");
    Ok(ClickOutcome {
        user,
        base,
        bonus,
        total,
        swindle_chance,
        swindle,
    })
}

fn roll<R: Rng + ?Sized>(chance: Decimal, rng: &mut R) -> bool {
    if chance <= Decimal::ZERO {
        return false;
    }
    let p = chance.to_f64().unwrap_or(0.0);
    rng.gen::<f64>() < p
}

/// Apply a swindle triggered by `user`. Balances are read after the click
/// credit, and each transfer is one debit/credit pair.
fn swindle<R: Rng + ?Sized>(
    ledger: &mut Ledger,
    config: &EconomyConfig,
    user: UserId,
    rng: &mut R,
) -> SwindleEvent {
    // The clicker was just credited, so a leader always exists.
    let leader = ranking::leader(ledger).unwrap_or(user);
    let leader_cookies = ledger.cookies(leader);

    if leader == user {
        let others: Vec<UserId> = ledger.participants().filter(|u| *u != leader).collect();
        let Some(recipient) = others.choose(rng).copied() else {
            info!(user = %user, "backfire with no other players");
            return SwindleEvent::Backfire {
                recipient: None,
                amount: BigInt::zero(),
            };
        };
        let amount = positive_fraction(&leader_cookies, config.backfire_amount);
        ledger.transfer(leader, recipient, &amount);
        info!(user = %user, recipient = %recipient, amount = %amount, "swindle backfired");
        return SwindleEvent::Backfire {
            recipient: Some(recipient),
            amount,
        };
    }

    let amount = positive_fraction(&leader_cookies, config.swindle_amount);
    ledger.transfer(leader, user, &amount);
    info!(user = %user, victim = %leader, amount = %amount, "swindle");
    SwindleEvent::Stole {
        victim: leader,
        amount,
    }
}

/// A leader in debt has nothing to take.
fn positive_fraction(n: &BigInt, fraction: Decimal) -> BigInt {
    if n.is_positive() {
        fraction_of(n, fraction)
    } else {
        BigInt::zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{catalog, seeded, CLICK, SURE_SWINDLE};
    use chrono::TimeZone;
    use cookie_core::ClickerMessage;
    use std::time::Duration;

    const A: UserId = UserId(1);
    const B: UserId = UserId(2);
    const C: UserId = UserId(3);

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 1, 12, 0, 0).unwrap()
    }

    fn config() -> EconomyConfig {
        EconomyConfig {
            cookie_range: (1, 1),
            ..Default::default()
        }
    }

    #[test]
    fn first_click_on_fresh_ledger() {
        let c = catalog();
        let mut l = Ledger::new();
        let out = resolve_click(&mut l, &c, &config(), A, None, now(), &mut seeded(1)).unwrap();
        assert_eq!(out.total, BigInt::from(1));
        assert_eq!(l.cookies(A), BigInt::from(1));
        let last = l.last_click();
        assert_eq!(last.user, Some(A));
        assert_eq!(last.value, BigInt::from(1));
        assert_eq!(last.at, now());
        assert!(out.swindle.is_none());
    }

    #[test]
    fn click_bonus_adds_to_random_base() {
        let c = catalog();
        let mut l = Ledger::new();
        l.set_upgrade_level(&c, A, CLICK, 4).unwrap();
        let cfg = EconomyConfig {
            cookie_range: (1, 100),
            ..Default::default()
        };
        let out = resolve_click(&mut l, &c, &cfg, A, None, now(), &mut seeded(7)).unwrap();
        assert_eq!(out.bonus, BigInt::from(4));
        assert!(out.base >= BigInt::from(1) && out.base <= BigInt::from(100));
        assert_eq!(out.total, &out.base + BigInt::from(4));
    }

    #[test]
    fn cooldown_rejects_without_mutation() {
        let c = catalog();
        let mut l = Ledger::new();
        resolve_click(&mut l, &c, &config(), A, None, now(), &mut seeded(1)).unwrap();
        let before = l.clone();
        let later = now() + chrono::Duration::seconds(20);
        let err = resolve_click(&mut l, &c, &config(), B, None, later, &mut seeded(1)).unwrap_err();
        assert_eq!(
            err,
            ActionError::Rejected(Rejection::OnCooldown {
                remaining: Duration::from_secs(40)
            })
        );
        assert_eq!(l, before);
        let after = now() + chrono::Duration::seconds(60);
        assert!(resolve_click(&mut l, &c, &config(), B, None, after, &mut seeded(1)).is_ok());
    }

    #[test]
    fn stale_message_is_rejected() {
        let c = catalog();
        let mut l = Ledger::new();
        l.set_clicker_message(ClickerMessage { channel_id: 1, message_id: 10 });
        let err = resolve_click(&mut l, &c, &config(), A, Some(9), now(), &mut seeded(1)).unwrap_err();
        assert_eq!(err, ActionError::Rejected(Rejection::StaleSurface));
        assert!(!l.is_participant(A));
        assert!(resolve_click(&mut l, &c, &config(), A, Some(10), now(), &mut seeded(1)).is_ok());
    }

    #[test]
    fn guaranteed_swindle_takes_half_of_leader() {
        let c = catalog();
        let mut l = Ledger::new();
        l.set_cookies(A, BigInt::from(1000));
        l.set_upgrade_level(&c, B, SURE_SWINDLE, 1).unwrap();
        let out = resolve_click(&mut l, &c, &config(), B, None, now(), &mut seeded(3)).unwrap();
        assert_eq!(out.swindle_chance, Decimal::ONE);
        assert_eq!(
            out.swindle,
            Some(SwindleEvent::Stole { victim: A, amount: BigInt::from(500) })
        );
        assert_eq!(l.cookies(A), BigInt::from(500));
        assert_eq!(l.cookies(B), BigInt::from(501));
    }

    #[test]
    fn swindle_amount_uses_balance_after_credit() {
        let c = catalog();
        let mut l = Ledger::new();
        l.set_cookies(B, BigInt::from(999));
        l.set_cookies(A, BigInt::from(1000));
        l.set_upgrade_level(&c, B, SURE_SWINDLE, 1).unwrap();
        // B clicks to 1000 and ties A; A keeps first place on the lower id.
        let out = resolve_click(&mut l, &c, &config(), B, None, now(), &mut seeded(3)).unwrap();
        assert_eq!(
            out.swindle,
            Some(SwindleEvent::Stole { victim: A, amount: BigInt::from(500) })
        );
    }

    #[test]
    fn leader_backfires_to_someone_else() {
        let c = catalog();
        for seed in 0..20 {
            let mut l = Ledger::new();
            l.set_cookies(A, BigInt::from(1001));
            l.set_cookies(B, BigInt::from(10));
            l.set_upgrade_level(&c, A, SURE_SWINDLE, 1).unwrap();
            let total = l.total_cookies();
            let out = resolve_click(&mut l, &c, &config(), A, None, now(), &mut seeded(seed)).unwrap();
            assert_eq!(
                out.swindle,
                Some(SwindleEvent::Backfire { recipient: Some(B), amount: BigInt::from(501) })
            );
            assert_eq!(l.cookies(A), BigInt::from(501));
            assert_eq!(l.cookies(B), BigInt::from(511));
            assert_eq!(l.total_cookies(), total + 1);
        }
    }

    #[test]
    fn backfire_recipient_is_never_the_leader() {
        let c = catalog();
        for seed in 0..50 {
            let mut l = Ledger::new();
            l.set_cookies(A, BigInt::from(5000));
            l.set_cookies(B, BigInt::from(10));
            l.set_cookies(C, BigInt::from(20));
            l.set_upgrade_level(&c, A, SURE_SWINDLE, 1).unwrap();
            let out = resolve_click(&mut l, &c, &config(), A, None, now(), &mut seeded(seed)).unwrap();
            match out.swindle {
                Some(SwindleEvent::Backfire { recipient: Some(r), .. }) => assert_ne!(r, A),
                other => panic!("unexpected swindle outcome {other:?}"),
            }
        }
    }

    #[test]
    fn lone_leader_backfire_moves_nothing() {
        let c = catalog();
        let mut l = Ledger::new();
        l.set_upgrade_level(&c, A, SURE_SWINDLE, 1).unwrap();
        let out = resolve_click(&mut l, &c, &config(), A, None, now(), &mut seeded(1)).unwrap();
        assert_eq!(
            out.swindle,
            Some(SwindleEvent::Backfire { recipient: None, amount: BigInt::zero() })
        );
        assert_eq!(l.cookies(A), BigInt::from(1));
    }

    #[test]
    fn fraction_floors() {
        assert_eq!(fraction_of(&BigInt::from(1001), Decimal::new(5, 1)), BigInt::from(500));
        assert_eq!(fraction_of(&BigInt::from(-3), Decimal::new(5, 1)), BigInt::from(-2));
        assert_eq!(fraction_of(&BigInt::from(7), Decimal::ONE), BigInt::from(7));
        assert_eq!(fraction_of(&BigInt::from(7), Decimal::ZERO), BigInt::zero());
    }
}
