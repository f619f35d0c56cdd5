use chrono::{DateTime, Duration, TimeZone, Utc};
use cookie_core::{BigInt, ClickerMessage, UpgradeId, UserId};
use cookie_econ::{AdminAction, AdminReport, Ledger, Rejection};
use cookie_runtime::{CookieService, Game, GameConfig, RecordingSurface, RenderStatus};
use persistence::{JsonFileStore, MemoryStore, Store};
use std::sync::Arc;

const ALICE: UserId = UserId(1);
const BOB: UserId = UserId(2);
const CHEF: UpgradeId = UpgradeId(1);
const MSG: ClickerMessage = ClickerMessage {
    channel_id: 10,
    message_id: 500,
};

fn game() -> Game {
    let mut game = GameConfig::builtin().unwrap().build().unwrap();
    game.economy.rng_seed = Some(42);
    game
}

fn service() -> CookieService<MemoryStore, RecordingSurface> {
    CookieService::new(game(), MemoryStore::new(), RecordingSurface::new())
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
}

#[tokio::test]
async fn click_respects_global_cooldown() {
    let svc = service();
    let first = svc.click(ALICE, None, t0()).await.unwrap().unwrap();
    assert_eq!(first.outcome.total, BigInt::from(1));
    assert!(first.text.contains("<@1> got **+1** cookies!"));

    let blocked = svc
        .click(BOB, None, t0() + Duration::seconds(30))
        .await
        .unwrap();
    match blocked {
        Err(Rejection::OnCooldown { remaining }) => {
            assert_eq!(remaining, std::time::Duration::from_secs(30))
        }
        other => panic!("expected cooldown, got {other:?}"),
    }
    assert_eq!(svc.jar(BOB).await.unwrap(), BigInt::from(0));

    svc.click(BOB, None, t0() + Duration::seconds(60))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(svc.jar(BOB).await.unwrap(), BigInt::from(1));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_clicks_admit_exactly_one() {
    let svc = Arc::new(service());
    let mut handles = Vec::new();
    for id in 0..20u64 {
        let svc = Arc::clone(&svc);
        handles.push(tokio::spawn(async move {
            svc.click(UserId(id), None, t0()).await.unwrap().is_ok()
        }));
    }
    let mut admitted = 0;
    for h in handles {
        if h.await.unwrap() {
            admitted += 1;
        }
    }
    assert_eq!(admitted, 1);
    let total = svc
        .database()
        .read(|l: &Ledger| l.total_cookies())
        .await
        .unwrap();
    assert_eq!(total, BigInt::from(1));
}

#[tokio::test]
async fn clicks_on_superseded_message_are_stale() {
    let svc = service();
    svc.register_clicker_message(MSG).await.unwrap();
    let stale = svc.click(ALICE, Some(499), t0()).await.unwrap();
    assert_eq!(stale.unwrap_err(), Rejection::StaleSurface);
    assert!(svc.click(ALICE, Some(500), t0()).await.unwrap().is_ok());
}

#[tokio::test]
async fn purchase_then_accrue() {
    let svc = service();
    svc.admin(AdminAction::SetCookies {
        user: ALICE,
        cookies: BigInt::from(1000),
    })
    .await
    .unwrap();

    let receipt = svc.purchase(ALICE, ALICE, CHEF).await.unwrap().unwrap();
    assert_eq!(receipt.price, BigInt::from(100));
    assert_eq!(receipt.balance, BigInt::from(900));

    let wrong = svc.purchase(BOB, ALICE, CHEF).await.unwrap();
    assert_eq!(wrong.unwrap_err(), Rejection::WrongOwner);

    let first = svc.accrue(t0()).await.unwrap();
    assert_eq!(first.elapsed_secs, 0);
    let tick = svc.accrue(t0() + Duration::seconds(10)).await.unwrap();
    assert_eq!(tick.elapsed_secs, 10);
    assert_eq!(svc.jar(ALICE).await.unwrap(), BigInt::from(910));

    let menu = svc.upgrades(ALICE).await.unwrap();
    assert_eq!(menu.rows[CHEF.0].level, 1);
    assert!(menu.text.contains("Chef Freako"));
    // hidden and unowned
    assert!(menu.text.contains("+??? / sec"));
}

#[tokio::test]
async fn progress_reports_gap_to_next_rank() {
    let svc = service();
    for (user, cookies) in [(ALICE, 100), (BOB, 40)] {
        svc.admin(AdminAction::SetCookies {
            user,
            cookies: BigInt::from(cookies),
        })
        .await
        .unwrap();
    }
    let p = svc.progress(BOB).await.unwrap().unwrap();
    assert_eq!(p.entry.rank, 2);
    let chase = p.chase.unwrap();
    assert_eq!(chase.target, ALICE);
    assert_eq!(chase.distance, BigInt::from(61));
    assert_eq!(chase.eta_secs, None);
    assert!(svc.progress(UserId(77)).await.unwrap().is_none());
}

#[tokio::test]
async fn render_dedupes_and_drops_lost_target() {
    let svc = service();
    assert_eq!(svc.render().await.unwrap(), RenderStatus::NoTarget);

    svc.register_clicker_message(MSG).await.unwrap();
    assert_eq!(svc.render().await.unwrap(), RenderStatus::Rendered);
    assert_eq!(svc.render().await.unwrap(), RenderStatus::Unchanged);

    svc.click(ALICE, Some(MSG.message_id), t0()).await.unwrap().unwrap();
    assert_eq!(svc.render().await.unwrap(), RenderStatus::Rendered);
    let edits = svc.surface().edits();
    assert_eq!(edits.len(), 2);
    assert!(edits[1].1.contains("<@1> got **+1** cookies!"));

    svc.surface().delete(MSG);
    svc.admin(AdminAction::SetCookies {
        user: BOB,
        cookies: BigInt::from(5),
    })
    .await
    .unwrap();
    assert_eq!(svc.render().await.unwrap(), RenderStatus::TargetLost(MSG));
    assert_eq!(svc.render().await.unwrap(), RenderStatus::NoTarget);
}

#[tokio::test]
async fn startup_rebuilds_missing_caches() {
    let game = game();
    let mut ledger = Ledger::new();
    ledger
        .set_upgrade_level(&game.catalog, ALICE, CHEF, 3)
        .unwrap();
    ledger.clear_caches();
    let store = MemoryStore::with_document(&ledger).unwrap();
    let svc = CookieService::new(game, store, RecordingSurface::new());

    assert_eq!(svc.startup().await.unwrap(), 1);
    let cps = svc
        .database()
        .read(|l: &Ledger| l.cookies_per_second(ALICE))
        .await
        .unwrap();
    // lin(1, 1) at level 3
    assert_eq!(cps, BigInt::from(3));
    assert_eq!(svc.startup().await.unwrap(), 0);
}

#[tokio::test]
async fn reset_clears_players() {
    let svc = service();
    svc.click(ALICE, None, t0()).await.unwrap().unwrap();
    let report = svc.admin(AdminAction::Reset { user: None }).await.unwrap();
    assert_eq!(report, AdminReport::Reset { removed: 1 });
    let board = svc.leaderboard().await.unwrap();
    assert!(board.contains("Nobody has any cookies yet"));
}

#[tokio::test]
async fn state_survives_restart_on_disk() {
    let dir = std::env::temp_dir().join(format!("cookie-runtime-{}", std::process::id()));
    let path = dir.join("db.json");
    {
        let svc = CookieService::new(game(), JsonFileStore::new(&path), RecordingSurface::new());
        svc.click(ALICE, None, t0()).await.unwrap().unwrap();
        svc.register_clicker_message(MSG).await.unwrap();
    }
    let store = JsonFileStore::new(&path);
    let ledger: Ledger = store.load().unwrap();
    assert_eq!(ledger.cookies(ALICE), BigInt::from(1));
    assert_eq!(ledger.clicker_message(), Some(MSG));
    assert_eq!(ledger.last_click().at, t0());

    let svc = CookieService::new(game(), store, RecordingSurface::new());
    let blocked = svc.click(BOB, None, t0() + Duration::seconds(1)).await.unwrap();
    assert!(matches!(blocked, Err(Rejection::OnCooldown { .. })));
    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn run_loop_accrues_and_renders_until_shutdown() {
    let mut game = game();
    game.economy.update_rate_secs = 1;
    let svc = Arc::new(CookieService::new(
        game,
        MemoryStore::new(),
        RecordingSurface::new(),
    ));
    svc.register_clicker_message(MSG).await.unwrap();

    let (tx, rx) = tokio::sync::oneshot::channel::<()>();
    let runner = tokio::spawn(Arc::clone(&svc).run(async move {
        let _ = rx.await;
    }));
    tokio::time::sleep(std::time::Duration::from_millis(300)).await;
    let _ = tx.send(());
    runner.await.unwrap().unwrap();

    assert_eq!(svc.surface().edits().len(), 1);
    let stamped = svc
        .database()
        .read(|l: &Ledger| l.last_accrual())
        .await
        .unwrap();
    assert!(stamped.is_some());
}
