//! Tests for `src/config.rs` — parsing, env precedence, validation.

use skald::config::BotConfig;

fn parsed(toml_text: &str) -> BotConfig {
    toml::from_str(toml_text).expect("test TOML should parse")
}

#[test]
fn defaults_fail_validation_naming_all_missing_fields() {
    let config = BotConfig::default();
    let err = config.validate().expect_err("empty config must not validate");
    let text = err.to_string();
    assert!(text.contains("irc.server"));
    assert!(text.contains("irc.nick"));
    assert!(text.contains("irc.channel"));
}

#[test]
fn complete_file_config_validates() {
    let config = parsed(
        r##"
        [irc]
        server = "irc.libera.chat:6697"
        nick = "skald"
        channel = "#songs"
        "##,
    );
    config.validate().expect("complete config should validate");
    assert!(config.feed.is_none());
    assert_eq!(config.log.level, "info");
}

#[test]
fn full_config_round_trips_all_sections() {
    let config = parsed(
        r##"
        [irc]
        server = "irc.libera.chat"
        nick = "skald"
        channel = "#songs"
        local_addr = "192.0.2.10"

        [irc.nickserv]
        user = "skald"
        pass = "hunter2"

        [feed]
        url = "https://example.org/feed.rss"
        cursor_path = "/var/lib/skald/cursor"
        item_pause_secs = 2

        [log]
        dir = "/var/log/skald"
        level = "debug"
        "##,
    );

    assert_eq!(config.irc.local_addr.as_deref(), Some("192.0.2.10"));
    let ns = config.irc.nickserv.as_ref().expect("nickserv section");
    assert_eq!(ns.user, "skald");

    let feed = config.feed.as_ref().expect("feed section");
    assert_eq!(feed.url, "https://example.org/feed.rss");
    assert_eq!(feed.item_pause_secs, 2);
    assert_eq!(config.cursor_path().to_string_lossy(), "/var/lib/skald/cursor");

    assert_eq!(config.log.level, "debug");
    assert_eq!(config.irc.server_host_port(), ("irc.libera.chat".to_owned(), 6697));
}

#[test]
fn env_overrides_file_values() {
    let mut config = parsed(
        r##"
        [irc]
        server = "irc.old.example:6697"
        nick = "oldnick"
        channel = "#old"
        "##,
    );

    config.apply_overrides(|key| match key {
        "SKALD_SERVER" => Some("irc.new.example:7000".to_owned()),
        "SKALD_NICK" => Some("newnick".to_owned()),
        _ => None,
    });

    assert_eq!(config.irc.server, "irc.new.example:7000");
    assert_eq!(config.irc.nick, "newnick");
    // Untouched values keep the file settings.
    assert_eq!(config.irc.channel, "#old");
}

#[test]
fn feed_url_env_alone_enables_the_poller() {
    let mut config = BotConfig::default();
    config.apply_overrides(|key| match key {
        "SKALD_FEED_URL" => Some("https://example.org/feed".to_owned()),
        _ => None,
    });

    let feed = config.feed.expect("feed enabled by env");
    assert_eq!(feed.url, "https://example.org/feed");
    assert_eq!(feed.item_pause_secs, 1);
}

#[test]
fn nickserv_env_pair_creates_credentials() {
    let mut config = BotConfig::default();
    config.apply_overrides(|key| match key {
        "SKALD_NICKSERV_USER" => Some("skald".to_owned()),
        "SKALD_NICKSERV_PASS" => Some("hunter2".to_owned()),
        _ => None,
    });

    let ns = config.irc.nickserv.expect("credentials from env pair");
    assert_eq!(ns.user, "skald");
    assert_eq!(ns.pass, "hunter2");
}

#[test]
fn lone_nickserv_env_var_does_not_create_credentials() {
    let mut config = BotConfig::default();
    config.apply_overrides(|key| match key {
        "SKALD_NICKSERV_USER" => Some("skald".to_owned()),
        _ => None,
    });
    assert!(config.irc.nickserv.is_none());
}

#[test]
fn cursor_path_has_a_default() {
    let config = BotConfig::default();
    assert!(!config.cursor_path().as_os_str().is_empty());
}
