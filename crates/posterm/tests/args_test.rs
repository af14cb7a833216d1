use clap::Parser;
use posterm::{Args, LogLevel, TerminalConfig};
use std::time::Duration;

#[test]
fn test_defaults() {
    let args = Args::try_parse_from(["posterm", "pos-server:10001"]).unwrap();
    assert_eq!(args.server, "pos-server:10001");
    assert_eq!(args.name, "posterm");
    assert_eq!(args.log_level, LogLevel::Warn);
    assert!(!args.headless);

    let config = TerminalConfig::from_args(&args);
    assert_eq!((config.width, config.height), (1024, 768));
    assert_eq!(config.grid(), (128, 48));
    assert_eq!(config.blank_timeout, None);
    assert_eq!(config.timer_period, Duration::from_millis(500));
    assert_eq!(config.max_read_failures, posterm_link::MAX_READ_FAILURES);
}

#[test]
fn test_full_command_line() {
    let log = tempfile::NamedTempFile::new().unwrap();
    let args = Args::try_parse_from([
        "posterm",
        "/run/pos/terminal.sock",
        "--name",
        "bar-2",
        "--width",
        "640",
        "--height",
        "480",
        "--cell-width",
        "10",
        "--cell-height",
        "20",
        "--blank-timeout",
        "90",
        "--touch",
        "--log-level",
        "debug",
        "--log-file",
        log.path().to_str().unwrap(),
        "--headless",
    ])
    .unwrap();

    assert_eq!(args.log_level, LogLevel::Debug);
    assert_eq!(args.log_file.as_deref(), Some(log.path()));
    assert!(args.headless);

    let config = TerminalConfig::from_args(&args);
    assert_eq!(config.name, "bar-2");
    assert_eq!(config.grid(), (64, 24));
    assert_eq!(config.blank_timeout, Some(Duration::from_secs(90)));
    assert!(config.touch);
}

#[test]
fn test_server_is_required() {
    assert!(Args::try_parse_from(["posterm"]).is_err());
}
