//! Config file + command-line override merge, as done at startup.

use std::io::Write;

use clap::Parser;
use tempfile::NamedTempFile;

use kube_secure_proxy::cli::Cli;
use kube_secure_proxy::config::{load_config, read_config, validate_config, LogFormat, ProxyConfig};
use kube_secure_proxy::lifecycle::build_pipeline;

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

const FULL: &str = r#"
[listener]
bind_address = "0.0.0.0:8443"

[listener.tls]
cert_path = "/etc/proxy/tls.crt"
key_path = "/etc/proxy/tls.key"

[upstream]
response_timeout_secs = 30

[[virtual_hosts]]
host = "kube.prod"
backend = "https://10.0.0.1:6443"

[[virtual_hosts]]
host = "kube.staging"
backend = "https://10.0.1.1:6443"

[policy]
reject_paths = "^/api/.*/pods/.*/exec"
accept_paths = "^/api/,^/apis/,^/version$"

[observability]
log_format = "json"

[reload]
watch = true
"#;

#[test]
fn full_file_loads_and_validates() {
    let file = config_file(FULL);
    let config = load_config(file.path()).unwrap();

    assert_eq!(config.virtual_hosts.len(), 2);
    assert_eq!(config.upstream.response_timeout_secs, 30);
    assert_eq!(config.upstream.connect_timeout_secs, 5);
    assert_eq!(config.observability.log_format, LogFormat::Json);
    assert!(config.reload.watch);
    assert_eq!(config.shutdown.grace_period_secs, 30);
}

#[test]
fn flags_override_file_then_validate() {
    let file = config_file(FULL);
    let mut config = read_config(file.path()).unwrap();

    let cli = Cli::parse_from([
        "kube-secure-proxy",
        "--config",
        file.path().to_str().unwrap(),
        "--listen",
        "127.0.0.1:9443",
        "--virtual-host",
        "kube.local",
        "--api-endpoint",
        "https://192.168.0.10:6443",
    ]);
    cli.apply(&mut config);

    assert!(validate_config(&config).is_ok());
    assert_eq!(config.listener.bind_address, "127.0.0.1:9443");
    assert_eq!(config.virtual_hosts.len(), 1);
    assert_eq!(config.virtual_hosts[0].host, "kube.local");
    // Untouched by flags.
    assert_eq!(config.policy.accept_paths, "^/api/,^/apis/,^/version$");
}

#[test]
fn flags_alone_need_certificate_and_endpoint() {
    let mut config = ProxyConfig::default();
    Cli::parse_from(["kube-secure-proxy"]).apply(&mut config);

    let errors = validate_config(&config).unwrap_err();
    let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
    assert!(fields.contains(&"listener.tls"));
    assert!(fields.contains(&"virtual_hosts"));
}

#[test]
fn loaded_config_builds_a_pipeline() {
    let file = config_file(FULL);
    let mut config = load_config(file.path()).unwrap();
    // No system roots in minimal environments; trust a generated CA instead.
    let rcgen::CertifiedKey { cert, .. } =
        rcgen::generate_simple_self_signed(vec!["10.0.0.1".to_string()]).unwrap();
    let ca = config_file(&cert.pem());
    config.upstream.ca_path = Some(ca.path().display().to_string());

    let proxy = build_pipeline(&config).unwrap();
    assert_eq!(proxy.hosts.snapshot().len(), 2);
}

#[test]
fn invalid_file_reports_every_problem() {
    let file = config_file(
        r#"
[listener]
bind_address = "not-an-address"

[[virtual_hosts]]
host = "a"
backend = "https://10.0.0.1/prefix"

[[virtual_hosts]]
host = "A"
backend = "ftp://10.0.0.2"

[policy]
accept_paths = "(unclosed"
"#,
    );

    let err = load_config(file.path()).unwrap_err().to_string();
    for needle in ["listener.bind_address", "listener.tls", "virtual_hosts[0].backend", "virtual_hosts[1].host", "virtual_hosts[1].backend", "policy.accept_paths"] {
        assert!(err.contains(needle), "missing {} in {}", needle, err);
    }
}
