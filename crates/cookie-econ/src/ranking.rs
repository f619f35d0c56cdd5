//! Leaderboard ordering and rank-distance queries.
//!
//! Ranks are sorted by balance descending. Equal balances are ordered by
//! ascending user id so the order is total and reproducible.

use crate::ledger::Ledger;
use cookie_core::{BigInt, UserId};
use num_traits::Signed;

#[derive(Clone, Debug, PartialEq)]
pub struct RankEntry {
    /// 1-based position.
    pub rank: usize,
    pub user: UserId,
    pub cookies: BigInt,
    pub cps: BigInt,
}

/// Gap to the player one rank above.
#[derive(Clone, Debug, PartialEq)]
pub struct Chase {
    pub target: UserId,
    /// Cookies needed to pass the target: `above - mine + 1`.
    pub distance: BigInt,
    /// Whole seconds at the current rate, if the rate is positive.
    pub eta_secs: Option<BigInt>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Progress {
    pub entry: RankEntry,
    pub total_participants: usize,
    /// `None` for first place.
    pub chase: Option<Chase>,
}

/// Every participant in leaderboard order.
pub fn ranks(ledger: &Ledger) -> Vec<RankEntry> {
    let mut rows: Vec<(BigInt, UserId)> = ledger
        .participants()
        .map(|u| (ledger.cookies(u), u))
        .collect();
    rows.sort_by(|(ca, ua), (cb, ub)| cb.cmp(ca).then(ua.cmp(ub)));
    rows.into_iter()
        .enumerate()
        .map(|(i, (cookies, user))| RankEntry {
            rank: i + 1,
            user,
            cookies,
            cps: ledger.cookies_per_second(user),
        })
        .collect()
}

/// First `n` rows of the leaderboard.
pub fn top(ledger: &Ledger, n: usize) -> Vec<RankEntry> {
    let mut all = ranks(ledger);
    all.truncate(n);
    all
}

/// Current first place, if any participant exists.
pub fn leader(ledger: &Ledger) -> Option<UserId> {
    ledger
        .participants()
        .map(|u| (ledger.cookies(u), u))
        .min_by(|(ca, ua), (cb, ub)| cb.cmp(ca).then(ua.cmp(ub)))
        .map(|(_, u)| u)
}

/// Rank of `user` and the distance to the rank above.
pub fn progress(ledger: &Ledger, user: UserId) -> Option<Progress> {
    let all = ranks(ledger);
    let pos = all.iter().position(|e| e.user == user)?;
    let chase = pos.checked_sub(1).map(|above| {
        let target = &all[above];
        let mine = &all[pos];
        let distance = &target.cookies - &mine.cookies + 1;
        let eta_secs = mine.cps.is_positive().then(|| &distance / &mine.cps);
        Chase {
            target: target.user,
            distance,
            eta_secs,
        }
    });
    Some(Progress {
        total_participants: all.len(),
        entry: all[pos].clone(),
        chase,
    })
}
