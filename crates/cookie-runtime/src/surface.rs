//! Output surface for the rendered leaderboard.

use cookie_core::ClickerMessage;
use std::future::Future;
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SurfaceError {
    /// The target message no longer exists; the stored pointer is stale.
    #[error("clicker message {0:?} not found")]
    NotFound(ClickerMessage),
    #[error("surface error: {0}")]
    Other(String),
}

/// Where the leaderboard text is published, e.g. a chat message edit.
pub trait Surface: Send + Sync {
    fn edit(
        &self,
        target: ClickerMessage,
        content: String,
    ) -> impl Future<Output = Result<(), SurfaceError>> + Send;
}

/// Surface that keeps every edit in memory. Messages listed as deleted
/// answer with [`SurfaceError::NotFound`].
#[derive(Debug, Default)]
pub struct RecordingSurface {
    edits: Mutex<Vec<(ClickerMessage, String)>>,
    deleted: Mutex<Vec<ClickerMessage>>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make later edits of `target` fail with `NotFound`.
    pub fn delete(&self, target: ClickerMessage) {
        if let Ok(mut d) = self.deleted.lock() {
            d.push(target);
        }
    }

    pub fn edits(&self) -> Vec<(ClickerMessage, String)> {
        self.edits.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl Surface for RecordingSurface {
    async fn edit(&self, target: ClickerMessage, content: String) -> Result<(), SurfaceError> {
        let gone = self
            .deleted
            .lock()
            .map_err(|_| SurfaceError::Other("poisoned".into()))?
            .contains(&target);
        if gone {
            return Err(SurfaceError::NotFound(target));
        }
        self.edits
            .lock()
            .map_err(|_| SurfaceError::Other("poisoned".into()))?
            .push((target, content));
        Ok(())
    }
}
