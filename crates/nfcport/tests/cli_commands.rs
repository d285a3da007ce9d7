#![cfg(feature = "cli")]

use std::process::{Command, Output};

fn nfcport(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_nfcport"))
        .env_remove("NFCPORT_PORT")
        .args(["--log-level", "off"])
        .args(args)
        .output()
        .expect("nfcport should run")
}

fn missing_port() -> String {
    let dir = std::env::temp_dir().join(format!("nfcport-cli-{}", std::process::id()));
    dir.join("no-such-tty").to_string_lossy().into_owned()
}

#[test]
fn version_prints_package_version() {
    let out = nfcport(&["version"]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert_eq!(
        stdout.trim(),
        format!("nfcport {}", env!("CARGO_PKG_VERSION"))
    );
}

#[test]
fn extended_version_lists_defaults() {
    let out = nfcport(&["version", "--extended"]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("baud=115200"), "{stdout}");
    assert!(stdout.contains("features: serial=true"), "{stdout}");
}

#[test]
fn device_commands_require_a_port() {
    let cases: [&[&str]; 3] = [&["firmware"], &["poll"], &["session", "rf-on"]];
    for args in cases {
        let out = nfcport(args);
        assert_eq!(out.status.code(), Some(2), "{args:?}");
        let stderr = String::from_utf8_lossy(&out.stderr);
        assert!(stderr.contains("--port"), "{stderr}");
    }
}

#[test]
fn port_can_come_from_environment() {
    let port = missing_port();
    let out = Command::new(env!("CARGO_BIN_EXE_nfcport"))
        .env("NFCPORT_PORT", &port)
        .args(["--log-level", "off", "firmware"])
        .output()
        .expect("nfcport should run");
    assert_eq!(out.status.code(), Some(3));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.starts_with("error: open failed"), "{stderr}");
}

#[test]
fn unopenable_port_is_a_transport_error() {
    let port = missing_port();
    let out = nfcport(&["poll", "--port", port.as_str()]);
    assert_eq!(out.status.code(), Some(3));
    assert!(out.stdout.is_empty());
}

#[test]
fn invalid_timeout_is_a_usage_error() {
    let port = missing_port();
    let out = nfcport(&["firmware", "--port", port.as_str(), "--ack-timeout", "0ms"]);
    assert_eq!(out.status.code(), Some(64));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("greater than zero"), "{stderr}");
}

#[test]
fn unknown_session_action_is_rejected() {
    let out = nfcport(&["session", "reboot", "--port", "x"]);
    assert_eq!(out.status.code(), Some(2));
}
