//! Text rendering for the leaderboard, menus and action replies.
//!
//! Numbers go through [`cookie_core::format`]; users are shown as mentions.

use cookie_core::format::{amount, bignum, ceil_secs, num_suffix, percent, roman, time_str};
use cookie_core::quotes::jar_line;
use cookie_core::{BigInt, Catalog, CatalogError, EconomyConfig, UserId};
use cookie_econ::{
    ClickOutcome, LastClick, Progress, PurchaseReceipt, RankEntry, Rejection, SwindleEvent,
    UpgradeRow,
};
use num_bigint::Sign;
use std::fmt::Write;
use std::time::Duration;

const MEDALS: [&str; 3] = ["🥇", "🥈", "🥉"];

/// Balances below this read as "not many cookie" in the jar.
const SMALL_JAR: u32 = 500;

/// The public leaderboard message.
pub fn leaderboard(entries: &[RankEntry], last: &LastClick, places: u32) -> String {
    let mut out = String::from("🍪 **COOKIE LEADERBOARD** 🍪\n\n");
    if entries.is_empty() {
        out.push_str("Nobody has any cookies yet. Be the first!\n");
    }
    for e in entries {
        let badge = e
            .rank
            .checked_sub(1)
            .and_then(|i| MEDALS.get(i))
            .copied()
            .unwrap_or("▫️");
        let _ = writeln!(
            out,
            "{badge} {}. {} 🍪 {} (+{} / sec)",
            e.rank,
            e.user.mention(),
            bignum(&e.cookies, places),
            bignum(&e.cps, places),
        );
    }
    if let Some(user) = last.user {
        let _ = write!(
            out,
            "\n{} got **+{}** cookies!",
            user.mention(),
            bignum(&last.value, places)
        );
    }
    out.push_str("\n\n⬇️ CLICK FOR COOKIE!! ⬇️");
    out
}

/// Reply to a successful click.
pub fn click(outcome: &ClickOutcome, quote: &str, places: u32) -> String {
    let mut out = format!(
        "*{quote}*\n\n{} got **+{}** cookies!",
        outcome.user.mention(),
        bignum(&outcome.total, places)
    );
    match &outcome.swindle {
        Some(SwindleEvent::Stole { victim, amount }) => {
            let _ = write!(
                out,
                "\n🦹 Swindled **{}** cookies from {}!",
                bignum(amount, places),
                victim.mention()
            );
        }
        Some(SwindleEvent::Backfire {
            recipient: Some(to),
            amount,
        }) => {
            let _ = write!(
                out,
                "\n💥 The swindle backfired! **{}** cookies went to {}.",
                bignum(amount, places),
                to.mention()
            );
        }
        Some(SwindleEvent::Backfire { recipient: None, .. }) => {
            out.push_str("\n💥 The swindle backfired, but nobody was around to take the cookies.");
        }
        None => {}
    }
    out
}

/// Message shown while the clicker is cooling down.
pub fn cooldown(remaining: Duration, places: u32) -> String {
    format!(
        "Me sorry! All out of cookies! Me bake more cookie in {}!",
        time_str(&ceil_secs(remaining), places)
    )
}

/// User-facing text for a rejected action. Stale clicks are dropped silently.
pub fn rejection(r: &Rejection, places: u32) -> Option<String> {
    let text = match r {
        Rejection::OnCooldown { remaining } => cooldown(*remaining, places),
        Rejection::InsufficientBalance { price, balance } => format!(
            "You need 🍪 {} but only have 🍪 {}.",
            bignum(price, places),
            bignum(balance, places)
        ),
        Rejection::MaxedOut => "This upgrade is maxed out!".to_string(),
        Rejection::WrongOwner => "This is not your upgrade menu!".to_string(),
        Rejection::StaleSurface => return None,
    };
    Some(text)
}

/// Upgrade menu for one player.
pub fn upgrade_menu(
    user: UserId,
    balance: &BigInt,
    rows: &[UpgradeRow],
    catalog: &Catalog,
    config: &EconomyConfig,
) -> Result<String, CatalogError> {
    let places = config.bignum_places;
    let mut out = format!(
        "{}'s upgrades | 🍪 {}\n",
        user.mention(),
        bignum(balance, places)
    );
    for row in rows {
        let Some(u) = catalog.get(row.id) else {
            continue;
        };
        let level = i64::from(row.level);
        let _ = write!(out, "\n{} **{}** {}\n", u.emoji, u.name, roman(u64::from(row.level)));
        let _ = writeln!(
            out,
            "  {}",
            u.description(level, row.masked, places, config.swindle_amount)?
        );
        if row.next_price.is_unbounded() {
            out.push_str("  MAXED OUT\n");
            continue;
        }
        let marker = if row.affordable { "✅" } else { "❌" };
        let _ = writeln!(
            out,
            "  {marker} Next: {} for 🍪 {}",
            u.value_str(level + 1, row.masked, places)?,
            amount(&row.next_price, places)
        );
    }
    Ok(out)
}

pub fn purchase(receipt: &PurchaseReceipt, catalog: &Catalog, places: u32) -> String {
    let name = catalog
        .get(receipt.upgrade)
        .map(|u| format!("{} {}", u.emoji, u.name))
        .unwrap_or_else(|| receipt.upgrade.to_string());
    format!(
        "Bought {name} {} for 🍪 {}. Balance: 🍪 {}",
        roman(u64::from(receipt.new_level)),
        bignum(&receipt.price, places),
        bignum(&receipt.balance, places)
    )
}

/// Rank summary for one player.
pub fn progress(user: UserId, progress: Option<&Progress>, places: u32) -> String {
    let Some(p) = progress else {
        return format!("{} hasn't clicked the cookie yet!", user.mention());
    };
    let rank = p.entry.rank as u64;
    let mut out = format!(
        "{} is in **{rank}{}** place of {} with 🍪 {} (+{} / sec).",
        user.mention(),
        num_suffix(rank),
        p.total_participants,
        bignum(&p.entry.cookies, places),
        bignum(&p.entry.cps, places)
    );
    match &p.chase {
        None => out.push_str(" Top of the jar! 👑"),
        Some(chase) => {
            let _ = write!(
                out,
                "\n🍪 {} more to pass {}",
                bignum(&chase.distance, places),
                chase.target.mention()
            );
            if let Some(eta) = &chase.eta_secs {
                let _ = write!(out, " (~{} at current rate)", time_str(eta, places));
            }
            out.push('.');
        }
    }
    out
}

/// Cookie jar line for a balance.
pub fn jar(user: UserId, cookies: &BigInt, places: u32) -> String {
    let is_zero = cookies.sign() == Sign::NoSign;
    let is_small = *cookies < BigInt::from(SMALL_JAR);
    jar_line(&user.mention(), &bignum(cookies, places), is_zero, is_small)
}

/// Swindle chance line shown with the upgrade menu.
pub fn swindle_chance(chance: rust_decimal::Decimal) -> String {
    format!("🦹 Swindle chance: {}", percent(chance))
}
