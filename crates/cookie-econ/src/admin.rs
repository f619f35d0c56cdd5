//! Administrative edits: direct balance and level changes, resets, cache
//! maintenance.

use crate::error::EconError;
use crate::ledger::Ledger;
use cookie_core::{BigInt, Catalog, UpgradeId, UserId};
use tracing::{info, warn};

#[derive(Clone, Debug, PartialEq)]
pub enum AdminAction {
    SetCookies { user: UserId, cookies: BigInt },
    SetUpgradeLevel { user: UserId, upgrade: UpgradeId, level: u32 },
    /// Reset one participant, or everyone when `user` is `None`.
    Reset { user: Option<UserId> },
    /// Drop and recompute all cookies-per-click/second caches. Needed after
    /// catalog curves change.
    ClearCaches,
}

#[derive(Clone, Debug, PartialEq)]
pub enum AdminReport {
    CookiesSet { user: UserId, cookies: BigInt },
    LevelSet { user: UserId, upgrade: UpgradeId, level: u32 },
    Reset { removed: usize },
    CachesRebuilt { players: usize },
}

pub fn apply(ledger: &mut Ledger, catalog: &Catalog, action: AdminAction) -> Result<AdminReport, EconError> {
    let report = match action {
        AdminAction::SetCookies { user, cookies } => {
            ledger.set_cookies(user, cookies.clone());
            AdminReport::CookiesSet { user, cookies }
        }
        AdminAction::SetUpgradeLevel { user, upgrade, level } => {
            ledger.set_upgrade_level(catalog, user, upgrade, level)?;
            AdminReport::LevelSet { user, upgrade, level }
        }
        AdminAction::Reset { user: Some(user) } => {
            let removed = usize::from(ledger.delete_participant(user));
            if removed == 0 {
                warn!(user = %user, "reset of unknown participant");
            }
            AdminReport::Reset { removed }
        }
        AdminAction::Reset { user: None } => AdminReport::Reset {
            removed: ledger.reset_all(),
        },
        AdminAction::ClearCaches => AdminReport::CachesRebuilt {
            players: ledger.rebuild_caches(catalog)?,
        },
    };
    info!(?report, "admin action applied");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{catalog, PASSIVE};

    #[test]
    fn set_cookies_creates_participant() {
        let c = catalog();
        let mut l = Ledger::new();
        let r = apply(
            &mut l,
            &c,
            AdminAction::SetCookies { user: UserId(4), cookies: BigInt::from(-20) },
        )
        .unwrap();
        assert_eq!(r, AdminReport::CookiesSet { user: UserId(4), cookies: BigInt::from(-20) });
        assert!(l.is_participant(UserId(4)));
        assert_eq!(l.debtors().count(), 1);
    }

    #[test]
    fn reset_everyone() {
        let c = catalog();
        let mut l = Ledger::new();
        l.set_cookies(UserId(1), BigInt::from(1));
        l.set_cookies(UserId(2), BigInt::from(2));
        let r = apply(&mut l, &c, AdminAction::Reset { user: None }).unwrap();
        assert_eq!(r, AdminReport::Reset { removed: 2 });
        assert_eq!(l.participant_count(), 0);
    }

    #[test]
    fn reset_single_user() {
        let c = catalog();
        let mut l = Ledger::new();
        l.set_cookies(UserId(1), BigInt::from(1));
        assert_eq!(
            apply(&mut l, &c, AdminAction::Reset { user: Some(UserId(1)) }).unwrap(),
            AdminReport::Reset { removed: 1 }
        );
        assert_eq!(
            apply(&mut l, &c, AdminAction::Reset { user: Some(UserId(1)) }).unwrap(),
            AdminReport::Reset { removed: 0 }
        );
    }

    #[test]
    fn clear_caches_recomputes() {
        let c = catalog();
        let mut l = Ledger::new();
        apply(
            &mut l,
            &c,
            AdminAction::SetUpgradeLevel { user: UserId(1), upgrade: PASSIVE, level: 3 },
        )
        .unwrap();
        let r = apply(&mut l, &c, AdminAction::ClearCaches).unwrap();
        assert_eq!(r, AdminReport::CachesRebuilt { players: 1 });
        assert_eq!(l.cookies_per_second(UserId(1)), BigInt::from(6));
    }
}
