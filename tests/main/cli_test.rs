//! Tests for the `skald` binary — exit behavior around configuration.

use assert_cmd::Command;

#[test]
fn check_config_with_nothing_configured_exits_nonzero() {
    let dir = tempfile::tempdir().expect("tempdir");
    Command::cargo_bin("skald")
        .expect("binary should build")
        .current_dir(dir.path())
        .env_clear()
        .arg("check-config")
        .assert()
        .failure();
}

#[test]
fn check_config_with_complete_env_config_succeeds() {
    let dir = tempfile::tempdir().expect("tempdir");
    Command::cargo_bin("skald")
        .expect("binary should build")
        .current_dir(dir.path())
        .env_clear()
        .env("SKALD_SERVER", "irc.example.org:6697")
        .env("SKALD_NICK", "skald")
        .env("SKALD_CHANNEL", "#songs")
        .arg("check-config")
        .assert()
        .success();
}

#[test]
fn check_config_reads_explicit_config_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("bot.toml");
    std::fs::write(
        &path,
        "[irc]\nserver = \"irc.example.org\"\nnick = \"skald\"\nchannel = \"#songs\"\n",
    )
    .expect("write config");

    Command::cargo_bin("skald")
        .expect("binary should build")
        .current_dir(dir.path())
        .env_clear()
        .arg("--config")
        .arg(&path)
        .arg("check-config")
        .assert()
        .success();
}

#[test]
fn unreadable_config_file_exits_nonzero() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("bot.toml");
    std::fs::write(&path, "this is not toml = = =").expect("write config");

    Command::cargo_bin("skald")
        .expect("binary should build")
        .current_dir(dir.path())
        .env_clear()
        .arg("--config")
        .arg(&path)
        .arg("check-config")
        .assert()
        .failure();
}
