#![deny(warnings)]

//! `cookiebot` command line: run the service loops, or apply one player or
//! admin action to the save document and print the reply.

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use cookie_core::format::{amount, time_str};
use cookie_core::{BigInt, ClickerMessage, UpgradeId, UserId};
use cookie_econ::{AdminAction, AdminReport, Ledger};
use cookie_runtime::{render, CookieService, Game, Reply, Surface, SurfaceError};
use persistence::{default_data_path, Database, JsonFileStore, TxError};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_SHA"),
    " ",
    env!("BUILD_DATE"),
    ")"
);

#[derive(Parser, Debug)]
#[command(author, version, long_version = LONG_VERSION, about = "Cookie clicker economy bot")]
struct Cli {
    /// Game config YAML. Defaults to the built-in catalog.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Save document.
    #[arg(long, global = true, default_value = default_data_path())]
    data: PathBuf,
    /// Override the clock (RFC 3339), for replaying actions.
    #[arg(long, global = true)]
    now: Option<DateTime<Utc>>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct UserArg {
    #[arg(long)]
    user: u64,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Click the cookie.
    Click {
        #[arg(long)]
        user: u64,
        /// Message id the click came from.
        #[arg(long)]
        message: Option<u64>,
    },
    /// Show a player's upgrade menu.
    Upgrades(UserArg),
    /// Buy the next level of an upgrade.
    Buy {
        #[arg(long)]
        user: u64,
        #[arg(long)]
        upgrade: usize,
        /// Player the menu was opened for; defaults to `user`.
        #[arg(long)]
        owner: Option<u64>,
    },
    /// Rank and distance to the next player.
    Progress(UserArg),
    /// Cookie jar of one player.
    Jar(UserArg),
    /// Print the leaderboard text.
    Leaderboard,
    /// Credit idle income up to now.
    Accrue,
    /// Point leaderboard renders at a message.
    RegisterMessage {
        #[arg(long)]
        channel: u64,
        #[arg(long)]
        message: u64,
    },
    #[command(subcommand)]
    Admin(AdminCommand),
    /// Run accrual and render loops until Ctrl-C. Renders go to stdout.
    Serve,
    /// Rewrite upgrade ids in the save document after a catalog reorder.
    Migrate {
        /// `OLD=NEW` pairs.
        #[arg(long = "remap", value_parser = parse_remap, required = true)]
        remap: Vec<(UpgradeId, UpgradeId)>,
    },
    /// Print price and value tables for every upgrade.
    Table {
        #[arg(long, default_value_t = 10)]
        to_level: u32,
    },
}

#[derive(Subcommand, Debug)]
enum AdminCommand {
    SetCookies {
        #[arg(long)]
        user: u64,
        #[arg(long, allow_hyphen_values = true)]
        cookies: BigInt,
    },
    SetLevel {
        #[arg(long)]
        user: u64,
        #[arg(long)]
        upgrade: usize,
        #[arg(long)]
        level: u32,
    },
    /// Reset one player, or everybody without `--user`.
    Reset {
        #[arg(long)]
        user: Option<u64>,
    },
    /// Rebuild every rate cache from upgrade levels.
    ClearCache,
}

fn parse_remap(s: &str) -> Result<(UpgradeId, UpgradeId), String> {
    let (old, new) = s
        .split_once('=')
        .ok_or_else(|| format!("expected OLD=NEW, got {s:?}"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<usize>()
            .map(UpgradeId)
            .map_err(|e| format!("{v:?}: {e}"))
    };
    Ok((parse(old)?, parse(new)?))
}

/// Leaderboard surface that prints every edit.
struct StdoutSurface;

impl Surface for StdoutSurface {
    async fn edit(&self, target: ClickerMessage, content: String) -> Result<(), SurfaceError> {
        println!(
            "---- #{} / {} ----\n{content}\n",
            target.channel_id, target.message_id
        );
        Ok(())
    }
}

fn print_reply<T>(reply: Reply<T>, places: u32, ok: impl FnOnce(T) -> String) {
    match reply {
        Ok(v) => println!("{}", ok(v)),
        Err(r) => {
            if let Some(text) = render::rejection(&r, places) {
                println!("{text}");
            }
        }
    }
}

fn admin_summary(report: &AdminReport) -> String {
    match report {
        AdminReport::CookiesSet { user, cookies } => format!("{} now has {cookies} cookies", user.mention()),
        AdminReport::LevelSet { user, upgrade, level } => {
            format!("{} upgrade {upgrade} set to level {level}", user.mention())
        }
        AdminReport::Reset { removed } => format!("reset {removed} player(s)"),
        AdminReport::CachesRebuilt { players } => format!("rebuilt caches for {players} player(s)"),
    }
}

fn print_table(game: &Game, to_level: u32) -> Result<()> {
    let places = game.economy.bignum_places;
    for u in game.catalog.iter() {
        println!("{} {}", u.emoji, u.name);
        println!("{:<8} {:<25} 🍪", "Lv.", "Cost");
        for lvl in 1..=i64::from(to_level) {
            let value = u.value_str(lvl, false, places)?;
            println!("{:<8} {:<25} {}", lvl, amount(&u.price(lvl), places), value);
        }
        println!();
    }
    Ok(())
}

async fn migrate(game: &Game, data: PathBuf, remap: Vec<(UpgradeId, UpgradeId)>) -> Result<()> {
    let map: BTreeMap<UpgradeId, UpgradeId> = remap.into_iter().collect();
    let db: Database<Ledger, _> = Database::new(JsonFileStore::new(&data));
    let catalog = &game.catalog;
    let players = db
        .transact(|l: &mut Ledger| {
            l.remap_upgrade_ids(&map);
            l.rebuild_caches(catalog)
                .map_err(|e| TxError::<()>::Internal(e.into()))
        })
        .await
        .into_result()?
        .map_err(|()| anyhow!("migration rejected"))?;
    info!(path = %data.display(), ids = map.len(), players, "save document migrated");
    println!("remapped {} id(s), rebuilt caches for {players} player(s)", map.len());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let game = Game::load(cli.config.as_deref()).context("loading game config")?;
    let places = game.economy.bignum_places;
    let now = cli.now.unwrap_or_else(Utc::now);

    match cli.command {
        Command::Table { to_level } => return print_table(&game, to_level),
        Command::Migrate { remap } => return migrate(&game, cli.data, remap).await,
        _ => {}
    }

    let svc = Arc::new(CookieService::new(
        game,
        JsonFileStore::new(&cli.data),
        StdoutSurface,
    ));
    match cli.command {
        Command::Click { user, message } => {
            let reply = svc.click(UserId(user), message, now).await?;
            print_reply(reply, places, |r| r.text);
        }
        Command::Upgrades(UserArg { user }) => {
            println!("{}", svc.upgrades(UserId(user)).await?.text);
        }
        Command::Buy { user, upgrade, owner } => {
            let user = UserId(user);
            let owner = owner.map_or(user, UserId);
            let reply = svc.purchase(user, owner, UpgradeId(upgrade)).await?;
            print_reply(reply, places, |r| render::purchase(&r, svc.catalog(), places));
        }
        Command::Progress(UserArg { user }) => {
            let p = svc.progress(UserId(user)).await?;
            println!("{}", render::progress(UserId(user), p.as_ref(), places));
        }
        Command::Jar(UserArg { user }) => {
            let cookies = svc.jar(UserId(user)).await?;
            println!("{}", render::jar(UserId(user), &cookies, places));
        }
        Command::Leaderboard => println!("{}", svc.leaderboard().await?),
        Command::Accrue => {
            let r = svc.accrue(now).await?;
            println!(
                "credited {} cookies over {} to {} player(s)",
                r.credited,
                time_str(&BigInt::from(r.elapsed_secs), places),
                r.participants
            );
        }
        Command::RegisterMessage { channel, message } => {
            let msg = ClickerMessage {
                channel_id: channel,
                message_id: message,
            };
            if let Some(prev) = svc.register_clicker_message(msg).await? {
                println!("replaced message {} in #{}", prev.message_id, prev.channel_id);
            }
            println!("clicker message is now {message} in #{channel}");
        }
        Command::Admin(cmd) => {
            let action = match cmd {
                AdminCommand::SetCookies { user, cookies } => AdminAction::SetCookies {
                    user: UserId(user),
                    cookies,
                },
                AdminCommand::SetLevel { user, upgrade, level } => AdminAction::SetUpgradeLevel {
                    user: UserId(user),
                    upgrade: UpgradeId(upgrade),
                    level,
                },
                AdminCommand::Reset { user } => AdminAction::Reset {
                    user: user.map(UserId),
                },
                AdminCommand::ClearCache => AdminAction::ClearCaches,
            };
            println!("{}", admin_summary(&svc.admin(action).await?));
        }
        Command::Serve => {
            info!(data = %cli.data.display(), "serving");
            Arc::clone(&svc)
                .run(async {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        tracing::error!(error = %e, "ctrl-c handler failed");
                    }
                })
                .await?;
        }
        Command::Table { .. } | Command::Migrate { .. } => bail!("handled above"),
    }
    Ok(())
}
