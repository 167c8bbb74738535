use super::*;
use shared::protocol::{AvailableVideoChatProviders, VideoChatProviderInfo};

use std::{
    env,
    path::PathBuf,
    time::{SystemTime, UNIX_EPOCH},
};

fn provider(name: &str, id: i64) -> VideoChatProviderInfo {
    VideoChatProviderInfo {
        name: name.into(),
        id,
    }
}

fn temp_config_path(tag: &str) -> PathBuf {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    env::temp_dir().join(format!("call_tools_{tag}_{suffix}.toml"))
}

#[test]
fn file_values_override_defaults() {
    let settings = apply_file_config(
        &Settings::default(),
        r#"
log_filter = "client_core=debug"
server_jitsi_server_url = "https://meet.example.com"
evict_ignored_on_discard = "off"
"#,
    )
    .expect("apply config");

    assert_eq!(settings.log_filter, "client_core=debug");
    assert_eq!(
        settings.server_jitsi_server_url.as_deref(),
        Some("https://meet.example.com")
    );
    assert!(!settings.evict_ignored_on_discard);
}

#[test]
fn rejects_unparseable_flag() {
    let err = apply_file_config(&Settings::default(), "evict_ignored_on_discard = \"maybe\"")
        .expect_err("maybe is not a flag");
    assert!(err.to_string().contains("maybe"));
}

#[test]
fn non_string_values_are_rejected() {
    assert!(apply_file_config(&Settings::default(), "evict_ignored_on_discard = true").is_err());
}

#[test]
fn missing_file_keeps_defaults() {
    let settings = load_settings_from(&temp_config_path("missing")).expect("defaults");
    assert!(settings.evict_ignored_on_discard);
}

#[test]
fn bad_file_is_reported_and_applies_nothing() {
    let path = temp_config_path("bad");
    fs::write(
        &path,
        "log_filter = \"trace\"\nevict_ignored_on_discard = \"maybe\"\n",
    )
    .expect("write config");

    let err = load_settings_from(&path).expect_err("bad flag fails the whole file");
    let message = format!("{err:#}");
    assert!(message.contains(&path.display().to_string()));
    assert!(message.contains("maybe"));

    fs::remove_file(&path).expect("cleanup");
}

#[test]
fn environment_overrides_file_values() {
    const VAR: &str = "APP__SERVER_JITSI_SERVER_URL";
    let previous = env::var(VAR).ok();
    let path = temp_config_path("env");
    fs::write(&path, "server_jitsi_server_url = \"https://from-file.example\"\n")
        .expect("write config");

    env::set_var(VAR, "https://from-env.example");
    let loaded = load_settings_from(&path);
    match previous {
        Some(value) => env::set_var(VAR, value),
        None => env::remove_var(VAR),
    }
    fs::remove_file(&path).expect("cleanup");

    assert_eq!(
        loaded.expect("settings").server_jitsi_server_url.as_deref(),
        Some("https://from-env.example")
    );
}

#[test]
fn server_jitsi_url_only_fills_gaps() {
    let settings = Settings {
        server_jitsi_server_url: Some("https://meet.example.com".into()),
        ..Settings::default()
    };
    let mut realm = RealmCallSettings {
        video_chat_provider: 1,
        available_video_chat_providers: AvailableVideoChatProviders {
            disabled: provider("None", 0),
            jitsi_meet: provider("Jitsi Meet", 1),
            zoom: None,
            zoom_server_to_server: None,
            big_blue_button: None,
        },
        realm_jitsi_server_url: None,
        server_jitsi_server_url: None,
    };

    settings.apply_to(&mut realm);
    assert_eq!(
        realm.server_jitsi_server_url.as_deref(),
        Some("https://meet.example.com")
    );

    realm.server_jitsi_server_url = Some("https://jitsi.internal".into());
    settings.apply_to(&mut realm);
    assert_eq!(
        realm.server_jitsi_server_url.as_deref(),
        Some("https://jitsi.internal")
    );
}
