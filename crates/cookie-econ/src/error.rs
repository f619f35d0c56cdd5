use cookie_core::{BigInt, CatalogError, UpgradeId};
use std::time::Duration;
use thiserror::Error;

/// Unexpected failures inside the economy. These persist partial work.
#[derive(Debug, Error, PartialEq)]
pub enum EconError {
    #[error("unknown upgrade id {0}")]
    UnknownUpgrade(UpgradeId),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// User-input rejections. A rejected action never mutates state.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum Rejection {
    #[error("clicker is on cooldown for another {remaining:?}")]
    OnCooldown { remaining: Duration },
    #[error("upgrade costs {price} cookies but only {balance} are available")]
    InsufficientBalance { price: BigInt, balance: BigInt },
    #[error("upgrade is already at its maximum level")]
    MaxedOut,
    #[error("this menu belongs to another user")]
    WrongOwner,
    #[error("action is attached to a superseded clicker message")]
    StaleSurface,
}

/// Failure of a player action: either a rejection or an internal error.
#[derive(Debug, Error, PartialEq)]
pub enum ActionError {
    #[error("rejected: {0}")]
    Rejected(Rejection),
    #[error(transparent)]
    Internal(#[from] EconError),
}

impl From<Rejection> for ActionError {
    fn from(r: Rejection) -> Self {
        ActionError::Rejected(r)
    }
}

impl From<CatalogError> for ActionError {
    fn from(e: CatalogError) -> Self {
        ActionError::Internal(EconError::Catalog(e))
    }
}
