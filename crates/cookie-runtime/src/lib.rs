#![deny(warnings)]

//! Runtime for the cookie economy: configuration loading, the transactional
//! service that fronts the ledger, periodic accrual/render loops and text
//! rendering.

pub mod config;
pub mod render;
pub mod service;
pub mod surface;

pub use config::{ConfigLoadError, Game, GameConfig};
pub use service::{ClickReply, CookieService, RenderStatus, Reply, ServiceError, UpgradeMenu};
pub use surface::{RecordingSurface, Surface, SurfaceError};
