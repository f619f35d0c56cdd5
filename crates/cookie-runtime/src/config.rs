//! Game configuration: economy tunables plus the upgrade catalog, loaded
//! from YAML.

use cookie_core::{Catalog, CatalogError, ConfigError, EconomyConfig, UpgradeSpec};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

const BUILTIN: &str = include_str!("../../../assets/cookie.yaml");

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing game config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid economy config: {0}")]
    Economy(#[from] ConfigError),
    #[error("invalid upgrade catalog: {0}")]
    Catalog(#[from] CatalogError),
}

/// Raw configuration document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    #[serde(default)]
    pub economy: EconomyConfig,
    pub upgrades: Vec<UpgradeSpec>,
}

/// Validated configuration, ready to drive a service.
#[derive(Clone, Debug)]
pub struct Game {
    pub economy: EconomyConfig,
    pub catalog: Catalog,
}

impl GameConfig {
    /// The configuration shipped with the binary.
    pub fn builtin() -> Result<Self, ConfigLoadError> {
        Self::from_yaml(BUILTIN)
    }

    pub fn from_yaml(text: &str) -> Result<Self, ConfigLoadError> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let cfg = Self::from_yaml(&text)?;
        info!(path = %path.display(), upgrades = cfg.upgrades.len(), "loaded game config");
        Ok(cfg)
    }

    /// Validate tunables and build the catalog.
    pub fn build(self) -> Result<Game, ConfigLoadError> {
        self.economy.validate()?;
        let catalog = Catalog::from_specs(self.upgrades)?;
        Ok(Game {
            economy: self.economy,
            catalog,
        })
    }
}

impl Game {
    /// Load from `path` when given, the builtin document otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigLoadError> {
        match path {
            Some(p) => GameConfig::load(p)?.build(),
            None => GameConfig::builtin()?.build(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cookie_core::{Amount, BigInt, UpgradeId, UpgradeKind};
    use rust_decimal::Decimal;

    #[test]
    fn builtin_config_builds() {
        let game = GameConfig::builtin().unwrap().build().unwrap();
        assert_eq!(game.economy, EconomyConfig::default());
        assert_eq!(game.catalog.len(), 10);
        let like = game.catalog.get(UpgradeId(0)).unwrap();
        assert_eq!(like.kind, UpgradeKind::Click);
        assert_eq!(like.price(1), Amount::Finite(BigInt::from(100)));
        assert_eq!(like.price(2), Amount::Finite(BigInt::from(150)));
    }

    #[test]
    fn builtin_hidden_upgrades() {
        let game = Game::load(None).unwrap();
        let blurbot = game.catalog.get(UpgradeId(7)).unwrap();
        assert!(blurbot.hidden);
        assert_eq!(blurbot.cookies_per_second(3).unwrap(), BigInt::from(9));
        assert!(blurbot.cookies_per_second(4).unwrap() < BigInt::from(0));

        let swindler = game.catalog.get(UpgradeId(8)).unwrap();
        assert_eq!(swindler.swindle_probability(1).unwrap(), Decimal::new(5, 2));
        assert_eq!(swindler.price(11), Amount::Unbounded);

        let googol = game.catalog.get(UpgradeId(9)).unwrap();
        assert_eq!(googol.cookies_per_second(1).unwrap(), BigInt::from(10u32).pow(100));
    }

    #[test]
    fn economy_section_is_optional() {
        let yaml = r#"
upgrades:
  - emoji: "x"
    name: Only
    kind: passive
    yield: { shape: constant, value: 2 }
    price: { shape: lin, intercept: 10, slope: 0 }
"#;
        let game = GameConfig::from_yaml(yaml).unwrap().build().unwrap();
        assert_eq!(game.economy.cookie_cooldown_secs, 60);
        assert_eq!(game.catalog.len(), 1);
    }

    #[test]
    fn invalid_economy_is_rejected() {
        let yaml = r#"
economy:
  cookie_range: [5, 1]
upgrades:
  - emoji: "x"
    name: Only
    kind: click
    yield: { shape: constant, value: 1 }
    price: { shape: constant, value: 1 }
"#;
        let err = GameConfig::from_yaml(yaml).unwrap().build().unwrap_err();
        assert!(matches!(err, ConfigLoadError::Economy(ConfigError::InvertedRange(5, 1))));
    }

    #[test]
    fn negative_price_is_rejected() {
        let yaml = r#"
upgrades:
  - emoji: "x"
    name: Cursed
    kind: click
    yield: { shape: constant, value: 1 }
    price: { shape: lin, intercept: 10, slope: -20 }
"#;
        let err = GameConfig::from_yaml(yaml).unwrap().build().unwrap_err();
        assert!(matches!(err, ConfigLoadError::Catalog(CatalogError::NegativePrice(_))));
    }
}
