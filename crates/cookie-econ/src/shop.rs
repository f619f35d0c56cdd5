//! Upgrade purchases and the per-player upgrade listing.

use crate::error::{ActionError, EconError, Rejection};
use crate::ledger::Ledger;
use cookie_core::{Amount, BigInt, Catalog, UpgradeId, UpgradeKind, UserId};
use tracing::info;

#[derive(Clone, Debug, PartialEq)]
pub struct PurchaseReceipt {
    pub upgrade: UpgradeId,
    pub new_level: u32,
    pub price: BigInt,
    /// Balance after paying.
    pub balance: BigInt,
}

/// Buy the next level of `id` for `user`.
///
/// `owner` is the player the upgrade menu was opened for; anybody else
/// pressing its buttons is rejected.
pub fn purchase(
    ledger: &mut Ledger,
    catalog: &Catalog,
    user: UserId,
    owner: UserId,
    id: UpgradeId,
) -> Result<PurchaseReceipt, ActionError> {
    if user != owner {
        return Err(Rejection::WrongOwner.into());
    }
    let upgrade = catalog.get(id).ok_or(EconError::UnknownUpgrade(id))?;
    let level = ledger.level(user, id);
    let next = level.checked_add(1).ok_or(Rejection::MaxedOut)?;
    let price = match upgrade.price(i64::from(next)) {
        Amount::Finite(p) => p,
        Amount::Unbounded => return Err(Rejection::MaxedOut.into()),
    };
    let balance = ledger.cookies(user);
    if balance < price {
        return Err(Rejection::InsufficientBalance { price, balance }.into());
    }
    ledger.set_upgrade_level(catalog, user, id, next)?;
    ledger.add_cookies(user, &-&price);
    info!(user = %user, upgrade = %upgrade.name, level = next, price = %price, "upgrade purchased");
    Ok(PurchaseReceipt {
        upgrade: id,
        new_level: next,
        price,
        balance: ledger.cookies(user),
    })
}

/// One line of a player's upgrade menu.
#[derive(Clone, Debug, PartialEq)]
pub struct UpgradeRow {
    pub id: UpgradeId,
    pub kind: UpgradeKind,
    pub level: u32,
    /// Price of the next level.
    pub next_price: Amount,
    pub affordable: bool,
    /// Numbers should be masked: the upgrade is hidden and nobody owns it yet.
    pub masked: bool,
}

/// Upgrade menu for `user`, in catalog order.
pub fn upgrade_rows(ledger: &Ledger, catalog: &Catalog, user: UserId) -> Vec<UpgradeRow> {
    let balance = ledger.cookies(user);
    catalog
        .iter()
        .map(|u| {
            let level = ledger.level(user, u.id);
            let next_price = u.price(i64::from(level) + 1);
            let affordable = next_price.finite().is_some_and(|p| *p <= balance);
            UpgradeRow {
                id: u.id,
                kind: u.kind,
                level,
                next_price,
                affordable,
                masked: u.hidden && !ledger.any_reached(u.id, 1),
            }
        })
        .collect()
}
