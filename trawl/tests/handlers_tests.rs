use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;
use trawl::handlers::*;
use trawl::command_argument_builder;
use trawl_scanner::ConfigError;
use tracing::Level;

fn settings_from(argv: &[&str]) -> Result<RunSettings, ConfigError> {
    let matches = command_argument_builder()
        .try_get_matches_from(argv)
        .unwrap();
    RunSettings::from_matches(&matches)
}

// ============================================================================
// Seed Parsing Tests
// ============================================================================

#[test]
fn test_parse_url_line_with_scheme() {
    assert_eq!(parse_url_line("https://example.com"), "https://example.com");
}

#[test]
fn test_parse_url_line_without_scheme() {
    assert_eq!(parse_url_line("example.com"), "http://example.com");
    assert_eq!(parse_url_line("  localhost:8080/docs "), "http://localhost:8080/docs");
}

#[test]
fn test_build_config_defaults_scheme() {
    let config = build_config("example.com", 3, 20, 5.0).unwrap();
    assert_eq!(config.seed.as_str(), "http://example.com/");
}

#[test]
fn test_build_config_rejects_unsupported_scheme() {
    let result = build_config("ftp://example.com/", 3, 20, 5.0);
    assert!(matches!(result, Err(ConfigError::UnsupportedScheme(_))));
}

#[test]
fn test_build_config_rejects_zero_workers() {
    let result = build_config("http://example.com/", 3, 0, 5.0);
    assert_eq!(result.unwrap_err(), ConfigError::InvalidWorkerCount);
}

#[test]
fn test_build_config_rejects_oversized_worker_count() {
    let result = build_config("http://example.com/", 3, usize::MAX, 5.0);
    assert_eq!(result.unwrap_err(), ConfigError::InvalidWorkerCount);
}

#[test]
fn test_build_config_rejects_bad_timeouts() {
    for timeout in [0.0, -1.0, f64::NAN] {
        let result = build_config("http://example.com/", 3, 20, timeout);
        assert_eq!(result.unwrap_err(), ConfigError::InvalidTimeout);
    }
}

#[test]
fn test_build_config_fractional_timeout() {
    let config = build_config("http://example.com/", 1, 4, 0.25).unwrap();
    assert_eq!(config.timeout, Duration::from_millis(250));
    assert_eq!(config.max_depth, 1);
    assert_eq!(config.workers, 4);
}

// ============================================================================
// Command Line Tests
// ============================================================================

#[test]
fn test_command_requires_url() {
    let result = command_argument_builder().try_get_matches_from(["trawl"]);
    assert!(result.is_err());
}

#[test]
fn test_settings_defaults() {
    let settings = settings_from(&["trawl", "http://example.com/"]).unwrap();

    assert_eq!(settings.config.max_depth, 3);
    assert_eq!(settings.config.workers, 20);
    assert_eq!(settings.config.timeout, Duration::from_secs(5));
    assert_eq!(settings.sink.output_dir, PathBuf::from("."));
    assert!(!settings.sink.render);
    assert!(settings.db_path.is_none());
    assert!(!settings.quiet);
    assert_eq!(settings.verbosity, 0);
    assert!(settings.log_file.is_none());
    assert!(!settings.fetcher.accept_invalid_certs);
    assert!(settings.fetcher.user_agent.starts_with("Trawl/"));
}

#[test]
fn test_settings_all_flags() {
    let settings = settings_from(&[
        "trawl",
        "-q",
        "https://example.com:8443/start",
        "-d",
        "1",
        "--workers",
        "8",
        "-t",
        "2.5",
        "-o",
        "/tmp/trawl-out",
        "--render",
        "--db",
        "/tmp/trawl.db",
        "--insecure",
        "--user-agent",
        "custom-agent",
        "-vv",
        "--log-file",
        "/tmp/trawl.log",
    ])
    .unwrap();

    assert_eq!(settings.config.seed.as_str(), "https://example.com:8443/start");
    assert_eq!(settings.config.max_depth, 1);
    assert_eq!(settings.config.workers, 8);
    assert_eq!(settings.config.timeout, Duration::from_millis(2500));
    assert_eq!(settings.sink.output_dir, PathBuf::from("/tmp/trawl-out"));
    assert!(settings.sink.render);
    assert_eq!(settings.db_path, Some(PathBuf::from("/tmp/trawl.db")));
    assert!(settings.quiet);
    assert_eq!(settings.verbosity, 2);
    assert_eq!(settings.log_file, Some(PathBuf::from("/tmp/trawl.log")));
    assert!(settings.fetcher.accept_invalid_certs);
    assert_eq!(settings.fetcher.user_agent, "custom-agent");
}

#[test]
fn test_settings_invalid_seed() {
    let result = settings_from(&["trawl", "ftp://example.com/"]);
    assert!(matches!(result, Err(ConfigError::UnsupportedScheme(_))));
}

#[test]
fn test_non_numeric_depth_rejected_by_parser() {
    let result =
        command_argument_builder().try_get_matches_from(["trawl", "http://example.com/", "-d", "deep"]);
    assert!(result.is_err());
}

// ============================================================================
// Path and Logging Tests
// ============================================================================

#[test]
fn test_expand_path_plain() {
    assert_eq!(expand_path("out/run"), PathBuf::from("out/run"));
}

#[test]
fn test_expand_path_tilde() {
    let expanded = expand_path("~/trawl-out");
    assert!(!expanded.to_string_lossy().starts_with('~'));
    assert!(expanded.ends_with("trawl-out"));
}

#[test]
fn test_log_level_from_verbosity() {
    assert_eq!(log_level(0), Level::WARN);
    assert_eq!(log_level(1), Level::INFO);
    assert_eq!(log_level(2), Level::DEBUG);
    assert_eq!(log_level(3), Level::TRACE);
    assert_eq!(log_level(9), Level::TRACE);
}

#[test]
fn test_init_logging_unwritable_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("missing").join("trawl.log");
    assert!(init_logging(0, Some(&path)).is_err());
}
