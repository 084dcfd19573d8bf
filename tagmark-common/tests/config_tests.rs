//! Unit tests for configuration loading and root folder resolution

use std::path::{Path, PathBuf};
use tagmark_common::config::{self, KioskConfig};

fn parse(raw: &str) -> KioskConfig {
    toml::from_str(raw).expect("valid config")
}

#[test]
fn test_empty_config_uses_defaults() {
    let cfg = parse("");
    assert_eq!(cfg.serial.port, None);
    assert_eq!(cfg.serial.baud_rate, 9600);
    assert_eq!(cfg.serial.poll_interval_ms, 100);
    assert_eq!(cfg.serial.duplicate_scan_window_secs, 3);
    assert!(cfg.email.is_none());
    assert_eq!(cfg.logging.level, "info");
    assert!(cfg.root_folder.is_none());
}

#[test]
fn test_full_config_parses() {
    let cfg = parse(
        r#"
        root_folder = "/var/lib/tagmark"

        [serial]
        port = "/dev/ttyUSB0"
        baud_rate = 115200
        poll_interval_ms = 50
        duplicate_scan_window_secs = 5

        [email]
        service_id = "service_abc"
        template_id = "template_def"
        user_id = "user_ghi"
        reply_to = "front-desk@example.com"
        from_name = "Front Desk"

        [logging]
        level = "debug"
        "#,
    );

    assert_eq!(cfg.root_folder, Some(PathBuf::from("/var/lib/tagmark")));
    assert_eq!(cfg.serial.port.as_deref(), Some("/dev/ttyUSB0"));
    assert_eq!(cfg.serial.baud_rate, 115200);
    assert_eq!(cfg.serial.poll_interval_ms, 50);
    assert_eq!(cfg.serial.duplicate_scan_window_secs, 5);

    let email = cfg.email.expect("email section present");
    assert_eq!(email.service_id, "service_abc");
    assert_eq!(email.template_id, "template_def");
    assert_eq!(email.user_id, "user_ghi");
    assert_eq!(email.reply_to, "front-desk@example.com");
    assert_eq!(email.from_name, "Front Desk");
    assert_eq!(email.endpoint, "https://api.emailjs.com/api/v1.0/email/send");

    assert_eq!(cfg.logging.level, "debug");
}

#[test]
fn test_email_identity_defaults() {
    let cfg = parse(
        r#"
        [email]
        service_id = "s"
        template_id = "t"
        user_id = "u"
        reply_to = "r@example.com"
        "#,
    );

    let email = cfg.email.expect("email section present");
    assert_eq!(email.from_name, "RFID System");
    assert_eq!(email.endpoint, "https://api.emailjs.com/api/v1.0/email/send");
}

#[test]
fn test_load_config_explicit_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[serial]\nbaud_rate = 19200\n").unwrap();

    let cfg = config::load_config(Some(&path)).unwrap();
    assert_eq!(cfg.serial.baud_rate, 19200);
}

#[test]
fn test_load_config_explicit_file_missing() {
    let dir = tempfile::tempdir().unwrap();
    let result = config::load_config(Some(&dir.path().join("nope.toml")));
    assert!(result.is_err());
}

#[test]
fn test_load_config_malformed_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[serial\nbaud_rate = ").unwrap();

    let result = config::load_config(Some(&path));
    assert!(result.is_err());
}

#[test]
fn test_root_folder_cli_wins() {
    let mut cfg = KioskConfig::default();
    cfg.root_folder = Some(PathBuf::from("/from/config"));

    let resolved = config::resolve_root_folder(Some(Path::new("/from/cli")), &cfg);
    assert_eq!(resolved, PathBuf::from("/from/cli"));
}

#[test]
fn test_root_folder_falls_back_to_config() {
    let mut cfg = KioskConfig::default();
    cfg.root_folder = Some(PathBuf::from("/from/config"));

    std::env::remove_var("TAGMARK_ROOT_FOLDER");
    let resolved = config::resolve_root_folder(None, &cfg);
    assert_eq!(resolved, PathBuf::from("/from/config"));
}

#[test]
fn test_database_path() {
    let path = config::database_path(Path::new("/var/lib/tagmark"));
    assert_eq!(path, PathBuf::from("/var/lib/tagmark/tagmark.db"));
}
