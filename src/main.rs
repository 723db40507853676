#![allow(missing_docs)]

//! skald binary — wire the components together and run until something fatal.
//!
//! Construct-and-inject, no globals: the transport, rate limiter, outbound
//! funnel, title resolver, liveness record, session dispatcher and feed
//! poller are built once here and handed to whoever needs them.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use skald::config::BotConfig;
use skald::dedup::DedupCache;
use skald::feed::cursor::FeedCursor;
use skald::feed::FeedPoller;
use skald::irc::transport;
use skald::limiter::RateLimiter;
use skald::logging;
use skald::outbound::Outbound;
use skald::session::Session;
use skald::titles::TitleResolver;
use skald::watchdog::{self, Liveness};

#[derive(Debug, Parser)]
#[command(name = "skald", version, about = "IRC channel companion")]
struct Cli {
    /// Path to the TOML config file (default: $SKALD_CONFIG_PATH or ./skald.toml).
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate the resolved configuration and exit without connecting.
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = BotConfig::load(cli.config.as_deref()).context("failed to load configuration")?;

    if let Some(Command::CheckConfig) = cli.command {
        config.validate()?;
        let (host, port) = config.irc.server_host_port();
        println!(
            "configuration OK: {host}:{port} as {} in {}",
            config.irc.nick, config.irc.channel
        );
        return Ok(());
    }

    let _logging = logging::init(config.log.dir.as_deref(), &config.log.level)
        .context("failed to initialise logging")?;
    config.validate()?;

    // Crypto provider for the rustls-based IRC transport.
    let _ = rustls::crypto::ring::default_provider().install_default();

    info!(version = env!("CARGO_PKG_VERSION"), "skald starting");

    let connection = transport::connect(&config.irc)
        .await
        .context("failed to establish IRC connection")?;

    let limiter = Arc::new(RateLimiter::chat_default());
    let outbound = Outbound::new(connection.outbound, limiter);

    let liveness = Arc::new(Liveness::new());
    tokio::spawn(watchdog::run(Arc::clone(&liveness)));

    let resolver = Arc::new(TitleResolver::new(DedupCache::default()));
    let (session, signals) = Session::new(
        &config.irc,
        outbound.clone(),
        resolver,
        Arc::clone(&liveness),
    );

    if let Some(feed_config) = config.feed.clone() {
        let cursor = FeedCursor::load(config.cursor_path()).await;
        let poller = FeedPoller::new(&feed_config, config.irc.channel.clone(), outbound, cursor);
        tokio::spawn(poller.run(signals.joined));
    }

    // The dispatcher runs until the inbound stream dies; that error is the
    // process's exit reason. The watchdog may exit us first.
    session.run(connection.inbound).await
}
