//! Idle accrual: credit every participant with cookies per second times the
//! whole seconds elapsed since the previous tick.

use crate::ledger::Ledger;
use chrono::{DateTime, Utc};
use cookie_core::{BigInt, UserId};
use num_traits::Zero;
use tracing::debug;

/// Result of one accrual tick.
#[derive(Clone, Debug, PartialEq)]
pub struct AccrualReport {
    /// Whole seconds credited. Fractional seconds are dropped.
    pub elapsed_secs: u64,
    /// Net cookies added across all participants.
    pub credited: BigInt,
    pub participants: usize,
}

/// Credit `cps * secs` to every participant.
pub fn credit_seconds(ledger: &mut Ledger, secs: u64) -> BigInt {
    let mut total = BigInt::zero();
    if secs == 0 {
        return total;
    }
    let secs = BigInt::from(secs);
    let users: Vec<UserId> = ledger.participants().collect();
    for user in users {
        let cps = ledger.cookies_per_second(user);
        if cps.is_zero() {
            continue;
        }
        let gain = cps * &secs;
        ledger.add_cookies(user, &gain);
        total += gain;
    }
    total
}

/// Advance balances to `now`.
///
/// The elapsed time since the last tick is truncated to whole seconds and the
/// remainder is discarded, so repeated short ticks never over-credit. The
/// first tick on a fresh ledger only stamps the clock. A clock that moved
/// backwards credits nothing and leaves the stamp where it was, so the
/// stamp never rewinds.
pub fn accrue(ledger: &mut Ledger, now: DateTime<Utc>) -> AccrualReport {
    let prev = ledger.last_accrual();
    let elapsed_secs = match prev {
        Some(prev) => u64::try_from(now.signed_duration_since(prev).num_seconds()).unwrap_or(0),
        None => 0,
    };
    let credited = credit_seconds(ledger, elapsed_secs);
    if prev.map_or(true, |prev| now > prev) {
        ledger.set_last_accrual(now);
    }
    let report = AccrualReport {
        elapsed_secs,
        credited,
        participants: ledger.participant_count(),
    };
    debug!(
        elapsed_secs = report.elapsed_secs,
        credited = %report.credited,
        participants = report.participants,
        "idle accrual tick"
    );
    report
}
