//! Shared fixtures for unit tests.

use cookie_core::{Catalog, CurveSpec, UpgradeId, UpgradeKind, UpgradeSpec};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

pub const CLICK: UpgradeId = UpgradeId(0);
pub const PASSIVE: UpgradeId = UpgradeId(1);
pub const SWINDLE_HALF: UpgradeId = UpgradeId(2);
pub const SWINDLE_QUARTER: UpgradeId = UpgradeId(3);
pub const SURE_SWINDLE: UpgradeId = UpgradeId(4);
pub const CAPPED: UpgradeId = UpgradeId(5);

fn spec(name: &str, kind: UpgradeKind, yields: CurveSpec, price: CurveSpec) -> UpgradeSpec {
    UpgradeSpec {
        emoji: "🍪".into(),
        name: name.into(),
        kind,
        yields: yields.into(),
        price: price.into(),
        hidden: false,
    }
}

pub fn catalog() -> Catalog {
    Catalog::from_specs(vec![
        spec(
            "Clicker",
            UpgradeKind::Click,
            CurveSpec::lin("1", "1").unwrap(),
            CurveSpec::exp("10", "2").unwrap(),
        ),
        spec(
            "Oven",
            UpgradeKind::Passive,
            CurveSpec::lin("2", "2").unwrap(),
            CurveSpec::exp("100", "1.5").unwrap(),
        ),
        spec(
            "Half Swindle",
            UpgradeKind::Swindle,
            CurveSpec::lin("0.5", "0").unwrap(),
            CurveSpec::exp("1000", "10").unwrap(),
        ),
        spec(
            "Quarter Swindle",
            UpgradeKind::Swindle,
            CurveSpec::lin("0.25", "0.25").unwrap(),
            CurveSpec::exp("1000", "10").unwrap(),
        ),
        spec(
            "Sure Swindle",
            UpgradeKind::Swindle,
            CurveSpec::constant("1").unwrap(),
            CurveSpec::exp("1", "1").unwrap(),
        ),
        UpgradeSpec {
            hidden: true,
            ..spec(
                "Capped",
                UpgradeKind::Passive,
                CurveSpec::constant("1").unwrap(),
                CurveSpec::exp("100", "2").unwrap().cap(2),
            )
        },
    ])
    .unwrap()
}

pub fn seeded(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}
