//! Session dispatcher: the single consumer of the inbound message stream.
//!
//! One message at a time, in arrival order. Every message beats the watchdog;
//! a handful of commands produce outbound traffic (join handshake, PING
//! replies, URL titles, defensive de-op). Slow title resolution stalls the
//! loop — accepted, channel volume is low.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};
use url::Url;

use crate::config::{IrcConfig, NickservConfig};
use crate::irc::Message;
use crate::outbound::Outbound;
use crate::titles::TitleResolver;
use crate::watchdog::Liveness;

/// Observable session milestones, for startup sequencing and tests.
pub struct SessionSignals {
    /// Flips to `true` once the bot has seen its own join echo for the
    /// monitored channel. Starts the feed poller.
    pub joined: watch::Receiver<bool>,
    /// Flips to `true` on the first inbound message of any kind.
    pub first_message: watch::Receiver<bool>,
}

/// The dispatcher state and its injected collaborators.
pub struct Session {
    nick: String,
    channel: String,
    nickserv: Option<NickservConfig>,
    outbound: Outbound,
    resolver: Arc<TitleResolver>,
    liveness: Arc<Liveness>,
    joined_tx: watch::Sender<bool>,
    first_message_tx: watch::Sender<bool>,
    /// A join is deferred until NickServ confirms identification.
    awaiting_identify: bool,
    seen_first_message: bool,
}

impl Session {
    /// Build a session from the IRC config and its collaborators.
    pub fn new(
        irc: &IrcConfig,
        outbound: Outbound,
        resolver: Arc<TitleResolver>,
        liveness: Arc<Liveness>,
    ) -> (Self, SessionSignals) {
        let (joined_tx, joined) = watch::channel(false);
        let (first_message_tx, first_message) = watch::channel(false);
        let session = Self {
            nick: irc.nick.clone(),
            channel: irc.channel.clone(),
            nickserv: irc.nickserv.clone(),
            outbound,
            resolver,
            liveness,
            joined_tx,
            first_message_tx,
            awaiting_identify: false,
            seen_first_message: false,
        };
        (
            session,
            SessionSignals {
                joined,
                first_message,
            },
        )
    }

    /// Consume the inbound stream until it closes.
    ///
    /// # Errors
    ///
    /// Returns an error when the stream ends — the transport reader is gone,
    /// which is fatal to the process.
    pub async fn run(mut self, mut inbound: mpsc::Receiver<Message>) -> Result<()> {
        while let Some(msg) = inbound.recv().await {
            self.handle_message(msg).await;
        }
        Err(anyhow::anyhow!("inbound event stream closed"))
    }

    /// Process one inbound message: beat the watchdog, then dispatch.
    pub async fn handle_message(&mut self, msg: Message) {
        self.liveness.beat();

        if !self.seen_first_message {
            self.seen_first_message = true;
            self.first_message_tx.send_replace(true);
        }

        match msg.command.as_str() {
            // Welcome: the server accepted our registration.
            "001" => self.handle_welcome().await,
            "NOTICE" => self.handle_notice(&msg).await,
            "PING" => {
                self.outbound.send(Message::new("PONG", msg.params)).await;
            }
            "JOIN" => self.handle_join(&msg),
            "PRIVMSG" => self.handle_privmsg(&msg).await,
            "MODE" => self.handle_mode(&msg).await,
            _ => {}
        }
    }

    async fn handle_welcome(&mut self) {
        match &self.nickserv {
            Some(creds) => {
                info!("identifying with NickServ before joining");
                let identify = format!("IDENTIFY {} {}", creds.user, creds.pass);
                self.outbound
                    .send(Message::privmsg("NickServ", &identify))
                    .await;
                self.awaiting_identify = true;
            }
            None => self.send_join().await,
        }
    }

    async fn handle_notice(&mut self, msg: &Message) {
        if self.awaiting_identify && is_identify_confirmation(msg) {
            self.awaiting_identify = false;
            self.send_join().await;
        }
    }

    /// Our own join echo confirms channel membership.
    fn handle_join(&self, msg: &Message) {
        let ours = msg
            .source_nick()
            .is_some_and(|nick| nick.eq_ignore_ascii_case(&self.nick))
            && msg
                .param(0)
                .is_some_and(|chan| chan.eq_ignore_ascii_case(&self.channel));
        if ours && !*self.joined_tx.borrow() {
            info!(channel = %self.channel, "joined channel");
            self.joined_tx.send_replace(true);
        }
    }

    async fn handle_privmsg(&mut self, msg: &Message) {
        let addressed_here = msg
            .param(0)
            .is_some_and(|target| target.eq_ignore_ascii_case(&self.channel));
        if !addressed_here {
            return;
        }
        let Some(text) = msg.param(1) else {
            return;
        };

        for url in extract_urls(text) {
            let title = self.resolver.resolve(&url).await;
            if title.is_empty() {
                continue;
            }
            self.outbound
                .send_gated(Message::privmsg(&self.channel, &title))
                .await;
        }
    }

    /// Refuse operator status the moment it is granted.
    async fn handle_mode(&self, msg: &Message) {
        let granted_to_us = msg.param(0) == Some(self.channel.as_str())
            && msg.param(1) == Some("+o")
            && msg.param(2) == Some(self.nick.as_str());
        if granted_to_us {
            debug!("dropping granted operator status");
            self.outbound
                .send(Message::new(
                    "MODE",
                    vec![self.channel.clone(), "-o".to_owned(), self.nick.clone()],
                ))
                .await;
        }
    }

    async fn send_join(&self) {
        self.outbound
            .send(Message::new("JOIN", vec![self.channel.clone()]))
            .await;
    }
}

/// Whitespace tokens of `text` that parse as absolute http(s) URLs.
///
/// Anything else — relative paths, bare words, other schemes — is treated
/// as absence of a URL and skipped.
pub fn extract_urls(text: &str) -> Vec<String> {
    text.split_whitespace()
        .filter(|token| {
            Url::parse(token)
                .map(|url| matches!(url.scheme(), "http" | "https"))
                .unwrap_or(false)
        })
        .map(str::to_owned)
        .collect()
}

/// A NOTICE from NickServ whose text mentions successful identification.
fn is_identify_confirmation(msg: &Message) -> bool {
    msg.source_nick()
        .is_some_and(|nick| nick.eq_ignore_ascii_case("NickServ"))
        && msg
            .param(1)
            .is_some_and(|text| text.to_ascii_lowercase().contains("identified"))
}
