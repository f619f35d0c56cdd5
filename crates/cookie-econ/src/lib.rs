#![deny(warnings)]

//! Economy simulation for the cookie clicker.
//!
//! This crate provides the state transitions of the game:
//! - the player [`Ledger`] with delta-maintained rate caches
//! - idle accrual in whole seconds
//! - click resolution with the swindle roll
//! - upgrade purchases and admin edits
//! - leaderboard ranking and rank-distance queries
//!
//! Everything is deterministic given the RNG and the clock value passed in.

pub mod accrual;
pub mod admin;
pub mod click;
pub mod error;
pub mod ledger;
pub mod ranking;
mod serde_big;
pub mod shop;

#[cfg(test)]
pub(crate) mod testing;

pub use accrual::{accrue, AccrualReport};
pub use admin::{AdminAction, AdminReport};
pub use click::{resolve_click, ClickOutcome, SwindleEvent};
pub use error::{ActionError, EconError, Rejection};
pub use ledger::{LastClick, Ledger};
pub use ranking::{Chase, Progress, RankEntry};
pub use shop::{purchase, upgrade_rows, PurchaseReceipt, UpgradeRow};
