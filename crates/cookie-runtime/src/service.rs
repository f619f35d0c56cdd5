//! The cookie service: every player action and periodic job runs as one
//! transaction against the persisted ledger.

use crate::config::Game;
use crate::render;
use crate::surface::{Surface, SurfaceError};
use chrono::{DateTime, Utc};
use cookie_core::quotes::COOKIE_QUOTES;
use cookie_core::{BigInt, Catalog, CatalogError, ClickerMessage, EconomyConfig, UpgradeId, UserId};
use cookie_econ::{
    accrual, admin, click, ranking, shop, AccrualReport, ActionError, AdminAction, AdminReport,
    ClickOutcome, EconError, Ledger, Progress, PurchaseReceipt, Rejection, UpgradeRow,
};
use persistence::{Database, Outcome, Store, StoreError, TxError};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rust_decimal::Decimal;
use std::convert::Infallible;
use std::future::Future;
use std::sync::{Arc, Mutex as StdMutex};
use thiserror::Error;
use tokio::sync::{watch, Mutex};
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info, warn};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Econ(#[from] EconError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Surface(#[from] SurfaceError),
    #[error("transaction failed: {0:#}")]
    Failed(#[from] anyhow::Error),
}

/// Result of a player action that may be rejected.
pub type Reply<T> = Result<T, Rejection>;

#[derive(Clone, Debug, PartialEq)]
pub struct ClickReply {
    pub outcome: ClickOutcome,
    pub quote: &'static str,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct UpgradeMenu {
    pub user: UserId,
    pub balance: BigInt,
    pub swindle_chance: Decimal,
    pub rows: Vec<UpgradeRow>,
    pub text: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderStatus {
    /// No clicker message is registered.
    NoTarget,
    /// Another render is still in flight.
    Busy,
    /// Text identical to the last successful render.
    Unchanged,
    Rendered,
    /// The message was gone; the stored pointer has been cleared.
    TargetLost(ClickerMessage),
}

fn tx_err(e: ActionError) -> TxError<Rejection> {
    match e {
        ActionError::Rejected(r) => TxError::Rejected(r),
        ActionError::Internal(e) => TxError::Internal(e.into()),
    }
}

fn never<T>(outcome: Outcome<T, Infallible>) -> Result<T, ServiceError> {
    match outcome.into_result()? {
        Ok(v) => Ok(v),
        Err(never) => match never {},
    }
}

pub struct CookieService<S, D> {
    catalog: Arc<Catalog>,
    config: EconomyConfig,
    db: Database<Ledger, S>,
    surface: D,
    rng: StdMutex<ChaCha8Rng>,
    last_render: Mutex<Option<(ClickerMessage, String)>>,
}

impl<S, D> CookieService<S, D>
where
    S: Store<Ledger>,
    D: Surface,
{
    pub fn new(game: Game, store: S, surface: D) -> Self {
        let rng = match game.economy.rng_seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self {
            catalog: Arc::new(game.catalog),
            config: game.economy,
            db: Database::new(store),
            surface,
            rng: StdMutex::new(rng),
            last_render: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &EconomyConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn database(&self) -> &Database<Ledger, S> {
        &self.db
    }

    pub fn surface(&self) -> &D {
        &self.surface
    }

    /// Run a player action under the ledger lock with the shared RNG.
    async fn act<V, F>(&self, f: F) -> Result<Reply<V>, ServiceError>
    where
        F: FnOnce(&mut Ledger, &mut ChaCha8Rng) -> Result<V, ActionError>,
    {
        let outcome = self
            .db
            .transact(|ledger| {
                let mut rng = self
                    .rng
                    .lock()
                    .map_err(|_| TxError::<Rejection>::Internal(anyhow::anyhow!("rng mutex poisoned")))?;
                f(ledger, &mut rng).map_err(tx_err)
            })
            .await;
        Ok(outcome.into_result()?)
    }

    /// Bring cached click/second rates in line with the catalog. Run once
    /// before serving.
    pub async fn startup(&self) -> Result<usize, ServiceError> {
        let catalog = &self.catalog;
        let fixed = never(
            self.db
                .transact(|l| {
                    l.reconcile_caches(catalog)
                        .map_err(|e| TxError::Internal(e.into()))
                })
                .await,
        )?;
        if fixed > 0 {
            warn!(players = fixed, "rate caches were out of date and have been rebuilt");
        }
        Ok(fixed)
    }

    /// Resolve a click. `attached_to` is the id of the message the click came
    /// from, when it came from one.
    pub async fn click(
        &self,
        user: UserId,
        attached_to: Option<u64>,
        now: DateTime<Utc>,
    ) -> Result<Reply<ClickReply>, ServiceError> {
        let (catalog, config) = (&self.catalog, &self.config);
        let reply = self
            .act(|ledger, rng| {
                let outcome =
                    click::resolve_click(ledger, catalog, config, user, attached_to, now, &mut *rng)?;
                let quote = COOKIE_QUOTES.choose(&mut *rng).copied().unwrap_or("Om nom nom nom.");
                Ok((outcome, quote))
            })
            .await?;
        Ok(reply.map(|(outcome, quote)| ClickReply {
            text: render::click(&outcome, quote, config.bignum_places),
            outcome,
            quote,
        }))
    }

    pub async fn upgrades(&self, user: UserId) -> Result<UpgradeMenu, ServiceError> {
        let catalog = &self.catalog;
        let (balance, rows, chance) = self
            .db
            .read(|l| {
                let chance = l.swindle_probability(catalog, user)?;
                Ok::<_, EconError>((l.cookies(user), shop::upgrade_rows(l, catalog, user), chance))
            })
            .await??;
        let mut text = render::upgrade_menu(user, &balance, &rows, catalog, &self.config)?;
        if !chance.is_zero() {
            text.push('\n');
            text.push_str(&render::swindle_chance(chance));
        }
        Ok(UpgradeMenu {
            user,
            balance,
            swindle_chance: chance,
            rows,
            text,
        })
    }

    /// Buy the next level of `upgrade` from the menu opened by `owner`.
    pub async fn purchase(
        &self,
        user: UserId,
        owner: UserId,
        upgrade: UpgradeId,
    ) -> Result<Reply<PurchaseReceipt>, ServiceError> {
        let catalog = &self.catalog;
        self.act(|ledger, _| shop::purchase(ledger, catalog, user, owner, upgrade))
            .await
    }

    pub async fn progress(&self, user: UserId) -> Result<Option<Progress>, ServiceError> {
        Ok(self.db.read(|l| ranking::progress(l, user)).await?)
    }

    pub async fn jar(&self, user: UserId) -> Result<BigInt, ServiceError> {
        Ok(self.db.read(|l| l.cookies(user)).await?)
    }

    /// Current leaderboard text.
    pub async fn leaderboard(&self) -> Result<String, ServiceError> {
        let (size, places) = (self.config.leaderboard_size, self.config.bignum_places);
        Ok(self
            .db
            .read(|l| render::leaderboard(&ranking::top(l, size), &l.last_click(), places))
            .await?)
    }

    pub async fn admin(&self, action: AdminAction) -> Result<AdminReport, ServiceError> {
        let catalog = &self.catalog;
        never(
            self.db
                .transact(|l| admin::apply(l, catalog, action).map_err(|e| TxError::Internal(e.into())))
                .await,
        )
    }

    /// Point the periodic render at `msg`. Returns the previous pointer.
    pub async fn register_clicker_message(
        &self,
        msg: ClickerMessage,
    ) -> Result<Option<ClickerMessage>, ServiceError> {
        let previous = never(
            self.db
                .transact(|l| {
                    let previous = l.clicker_message();
                    l.set_clicker_message(msg);
                    Ok(previous)
                })
                .await,
        )?;
        info!(channel = msg.channel_id, message = msg.message_id, "clicker message registered");
        Ok(previous)
    }

    /// Credit idle income up to `now`.
    pub async fn accrue(&self, now: DateTime<Utc>) -> Result<AccrualReport, ServiceError> {
        let report = never(
            self.db
                .transact(|l| Ok(accrual::accrue(l, now)))
                .await,
        )?;
        debug!(secs = report.elapsed_secs, credited = %report.credited, "accrual tick");
        Ok(report)
    }

    /// Publish the leaderboard to the registered message, unless nothing
    /// changed since the last successful render.
    pub async fn render(&self) -> Result<RenderStatus, ServiceError> {
        let Ok(mut last) = self.last_render.try_lock() else {
            return Ok(RenderStatus::Busy);
        };
        let (size, places) = (self.config.leaderboard_size, self.config.bignum_places);
        let (target, text) = self
            .db
            .read(|l| {
                let text = render::leaderboard(&ranking::top(l, size), &l.last_click(), places);
                (l.clicker_message(), text)
            })
            .await?;
        let Some(target) = target else {
            return Ok(RenderStatus::NoTarget);
        };
        if matches!(last.as_ref(), Some((t, s)) if *t == target && *s == text) {
            return Ok(RenderStatus::Unchanged);
        }
        match self.surface.edit(target, text.clone()).await {
            Ok(()) => {
                *last = Some((target, text));
                Ok(RenderStatus::Rendered)
            }
            Err(SurfaceError::NotFound(_)) => {
                *last = None;
                let cleared = never(
                    self.db
                        .transact(|l| {
                            // a newer registration may have landed meanwhile
                            if l.clicker_message() == Some(target) {
                                l.clear_clicker_message();
                                Ok(true)
                            } else {
                                Ok(false)
                            }
                        })
                        .await,
                )?;
                warn!(
                    channel = target.channel_id,
                    message = target.message_id,
                    cleared,
                    "clicker message is gone"
                );
                Ok(RenderStatus::TargetLost(target))
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl<S, D> CookieService<S, D>
where
    S: Store<Ledger> + 'static,
    D: Surface + 'static,
{
    /// Reconcile caches, then run the accrual and render loops until
    /// `shutdown` resolves.
    pub async fn run<F>(self: Arc<Self>, shutdown: F) -> Result<(), ServiceError>
    where
        F: Future<Output = ()>,
    {
        self.startup().await?;
        let (stop_tx, stop_rx) = watch::channel(false);
        let accrual = tokio::spawn(Arc::clone(&self).accrual_loop(stop_rx.clone()));
        let render = tokio::spawn(Arc::clone(&self).render_loop(stop_rx));
        info!(every = ?self.config.update_rate(), "cookie service running");

        shutdown.await;
        let _ = stop_tx.send(true);
        for (name, handle) in [("accrual", accrual), ("render", render)] {
            if let Err(e) = handle.await {
                error!(task = name, error = %e, "background task ended abnormally");
            }
        }
        info!("cookie service stopped");
        Ok(())
    }

    async fn accrual_loop(self: Arc<Self>, mut stop: watch::Receiver<bool>) {
        let mut ticker = time::interval(self.config.update_rate());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.accrue(Utc::now()).await {
                        error!(error = %e, "accrual tick failed");
                    }
                }
                _ = stop.changed() => break,
            }
        }
    }

    async fn render_loop(self: Arc<Self>, mut stop: watch::Receiver<bool>) {
        let mut ticker = time::interval(self.config.update_rate());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.render().await {
                        Ok(status) => debug!(?status, "render tick"),
                        Err(e) => error!(error = %e, "render tick failed"),
                    }
                }
                _ = stop.changed() => break,
            }
        }
    }
}
