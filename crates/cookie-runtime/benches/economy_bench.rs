use chrono::{Duration, TimeZone, Utc};
use cookie_core::{BigInt, UpgradeId, UserId};
use cookie_econ::{accrual, click, ranking, Ledger};
use cookie_runtime::GameConfig;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn populated(players: u64) -> (cookie_runtime::Game, Ledger) {
    let game = GameConfig::builtin().unwrap().build().unwrap();
    let mut ledger = Ledger::new();
    for u in 0..players {
        let user = UserId(u);
        ledger.set_cookies(user, BigInt::from(u * 1_000));
        ledger
            .set_upgrade_level(&game.catalog, user, UpgradeId(1 + (u % 6) as usize), (u % 40) as u32)
            .unwrap();
    }
    (game, ledger)
}

fn bench_economy(c: &mut Criterion) {
    let (game, ledger) = populated(1_000);
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

    c.bench_function("accrue_1000_players", |b| {
        let mut l = ledger.clone();
        l.set_last_accrual(start);
        let mut now = start;
        b.iter(|| {
            now += Duration::seconds(10);
            black_box(accrual::accrue(&mut l, now));
        })
    });

    c.bench_function("click_with_cooldown_elapsed", |b| {
        let mut l = ledger.clone();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut now = start;
        b.iter(|| {
            now += Duration::seconds(60);
            let _ = black_box(click::resolve_click(
                &mut l,
                &game.catalog,
                &game.economy,
                UserId(7),
                None,
                now,
                &mut rng,
            ));
        })
    });

    c.bench_function("leaderboard_top_25", |b| {
        b.iter(|| black_box(ranking::top(&ledger, 25)))
    });

    c.bench_function("price_curve_level_200_cold", |b| {
        b.iter(|| {
            let fresh = GameConfig::builtin().unwrap().build().unwrap();
            let chef = fresh.catalog.get(UpgradeId(1)).unwrap();
            black_box(chef.price(200))
        })
    });
}

criterion_group!(benches, bench_economy);
criterion_main!(benches);
