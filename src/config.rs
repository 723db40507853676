//! Configuration loading and validation.
//!
//! Loads bot configuration from `./skald.toml` (or `$SKALD_CONFIG_PATH`).
//! Environment variables override file values; file values override defaults.
//!
//! Precedence: env vars > config file > defaults.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Default IRC port when the server address carries none (TLS).
const DEFAULT_IRC_PORT: u16 = 6697;

/// Top-level configuration loaded from TOML.
///
/// Path: `./skald.toml` or `$SKALD_CONFIG_PATH`.
/// Env vars override file values; file values override defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// IRC connection and identity settings (`[irc]`).
    pub irc: IrcConfig,
    /// Optional feed announcement settings (`[feed]`).
    pub feed: Option<FeedConfig>,
    /// Logging settings (`[log]`).
    pub log: LogConfig,
}

/// IRC connection and identity settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IrcConfig {
    /// Server address as `host` or `host:port` (port defaults to 6697).
    pub server: String,
    /// Nick, also used as username and realname.
    pub nick: String,
    /// The one channel the bot joins and watches.
    pub channel: String,
    /// Optional local address to bind the outgoing socket to.
    pub local_addr: Option<String>,
    /// Optional NickServ registration credentials.
    pub nickserv: Option<NickservConfig>,
}

impl IrcConfig {
    /// Split the configured server address into host and port.
    ///
    /// Accepts `host`, `host:port`, and bracketed IPv6 `[addr]:port` forms.
    /// A missing or unparseable port falls back to 6697.
    pub fn server_host_port(&self) -> (String, u16) {
        split_host_port(&self.server)
    }
}

/// NickServ credentials. When present, the bot identifies before joining.
#[derive(Debug, Clone, Deserialize)]
pub struct NickservConfig {
    /// Account name passed to `IDENTIFY`.
    pub user: String,
    /// Account password passed to `IDENTIFY`.
    pub pass: String,
}

/// Feed poller settings.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// Feed URL to poll.
    pub url: String,
    /// Path of the cursor file. Defaults to the platform data directory.
    pub cursor_path: Option<PathBuf>,
    /// Pause between consecutive item announcements, in seconds.
    #[serde(default = "default_item_pause_secs")]
    pub item_pause_secs: u64,
}

fn default_item_pause_secs() -> u64 {
    1
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Directory for rotated JSON log files. Console-only when absent.
    pub dir: Option<PathBuf>,
    /// Default log level when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            dir: None,
            level: "info".to_owned(),
        }
    }
}

impl BotConfig {
    /// Load configuration with precedence: env vars > TOML file > defaults.
    ///
    /// Config file path: `path` when given, else `$SKALD_CONFIG_PATH`, else
    /// `./skald.toml`. If the file does not exist, starts from defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: Option<&std::path::Path>) -> Result<Self> {
        let mut config = Self::load_from_file(path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load from the TOML file only, no env overrides.
    fn load_from_file(explicit: Option<&std::path::Path>) -> Result<Self> {
        let path = match explicit {
            Some(p) => p.to_path_buf(),
            None => Self::config_path_with(|key| std::env::var(key).ok()),
        };
        match std::fs::read_to_string(&path) {
            Ok(contents) => {
                tracing::info!(path = %path.display(), "loading config from file");
                let config: BotConfig =
                    toml::from_str(&contents).context("failed to parse config TOML")?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("no config file found, using defaults");
                Ok(BotConfig::default())
            }
            Err(e) => Err(anyhow::anyhow!("failed to read config file: {e}")),
        }
    }

    /// Resolve the config file path using a custom env resolver (for testing).
    fn config_path_with(env: impl Fn(&str) -> Option<String>) -> PathBuf {
        match env("SKALD_CONFIG_PATH") {
            Some(p) => PathBuf::from(p),
            None => PathBuf::from("skald.toml"),
        }
    }

    /// Apply environment variable overrides (env > config > defaults).
    ///
    /// Takes a resolver function for testability (avoids unsafe `set_var` in tests).
    pub fn apply_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(v) = env("SKALD_SERVER") {
            self.irc.server = v;
        }
        if let Some(v) = env("SKALD_NICK") {
            self.irc.nick = v;
        }
        if let Some(v) = env("SKALD_CHANNEL") {
            self.irc.channel = v;
        }
        if let Some(v) = env("SKALD_LOCAL_ADDR") {
            self.irc.local_addr = Some(v);
        }

        // NickServ — both vars must be present to form credentials; either
        // one alone overrides an existing file-provided half.
        match (env("SKALD_NICKSERV_USER"), env("SKALD_NICKSERV_PASS")) {
            (Some(user), Some(pass)) => self.irc.nickserv = Some(NickservConfig { user, pass }),
            (Some(user), None) => {
                if let Some(ref mut ns) = self.irc.nickserv {
                    ns.user = user;
                }
            }
            (None, Some(pass)) => {
                if let Some(ref mut ns) = self.irc.nickserv {
                    ns.pass = pass;
                }
            }
            (None, None) => {}
        }

        // Feed — the URL env var alone is enough to enable the poller.
        if let Some(url) = env("SKALD_FEED_URL") {
            match self.feed {
                Some(ref mut feed) => feed.url = url,
                None => {
                    self.feed = Some(FeedConfig {
                        url,
                        cursor_path: None,
                        item_pause_secs: default_item_pause_secs(),
                    });
                }
            }
        }
        if let Some(p) = env("SKALD_CURSOR_PATH") {
            if let Some(ref mut feed) = self.feed {
                feed.cursor_path = Some(PathBuf::from(p));
            }
        }

        if let Some(v) = env("SKALD_LOG_DIR") {
            self.log.dir = Some(PathBuf::from(v));
        }
        if let Some(v) = env("SKALD_LOG_LEVEL") {
            self.log.level = v;
        }
    }

    /// Validate required fields.
    ///
    /// # Errors
    ///
    /// Returns an error naming every missing required field. The process
    /// should exit nonzero on failure — there is no interactive recovery.
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.irc.server.is_empty() {
            missing.push("irc.server (SKALD_SERVER)");
        }
        if self.irc.nick.is_empty() {
            missing.push("irc.nick (SKALD_NICK)");
        }
        if self.irc.channel.is_empty() {
            missing.push("irc.channel (SKALD_CHANNEL)");
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(anyhow::anyhow!(
                "missing required configuration: {}",
                missing.join(", ")
            ))
        }
    }

    /// Resolve the cursor file path: configured value, or the platform data
    /// directory (`~/.local/share/skald/feed-cursor` on Linux), or a file in
    /// the working directory as a last resort.
    pub fn cursor_path(&self) -> PathBuf {
        if let Some(path) = self.feed.as_ref().and_then(|f| f.cursor_path.clone()) {
            return path;
        }
        match directories::ProjectDirs::from("", "", "skald") {
            Some(dirs) => dirs.data_dir().join("feed-cursor"),
            None => PathBuf::from("feed-cursor"),
        }
    }
}

/// Split `host`, `host:port`, or `[v6addr]:port` into host and port.
fn split_host_port(server: &str) -> (String, u16) {
    if let Some(rest) = server.strip_prefix('[') {
        // Bracketed IPv6: everything up to ']' is the host.
        if let Some((host, tail)) = rest.split_once(']') {
            let port = tail
                .strip_prefix(':')
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_IRC_PORT);
            return (host.to_owned(), port);
        }
        return (rest.to_owned(), DEFAULT_IRC_PORT);
    }
    match server.rsplit_once(':') {
        Some((host, port)) if !host.contains(':') => (
            host.to_owned(),
            port.parse().unwrap_or(DEFAULT_IRC_PORT),
        ),
        // Unbracketed IPv6 literal or plain host.
        _ => (server.to_owned(), DEFAULT_IRC_PORT),
    }
}
