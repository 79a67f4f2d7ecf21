use crate::error::Result;
use chrono::Local;
use env_logger::{Builder, Env};
use log::{self, LevelFilter};
use std::io::Write;
use yansi::Paint;

/// Initializes the logging system with the specified log level
///
/// Valid log levels are: error, warn, info, debug, trace. `RUST_LOG` wins when set.
pub fn init(log_level: &str) -> Result<()> {
    let env = Env::default()
        .filter_or("RUST_LOG", parse_log_level(log_level).as_str())
        .write_style_or("RUST_LOG_STYLE", "auto");

    // A second init (tests, embedding) keeps the first logger.
    let _ = Builder::from_env(env)
        .format(|buf, record| writeln!(buf, "{}", format_log(record)))
        .try_init();

    Ok(())
}

/// Formats a log record for the terminal: `[time] LEVEL message`
///
/// Debug and trace records also name the module that emitted them.
pub fn format_log(record: &log::Record) -> String {
    let level = match record.level() {
        log::Level::Error => Paint::red("ERROR").bold(),
        log::Level::Warn => Paint::yellow("WARN ").bold(),
        log::Level::Info => Paint::cyan("INFO ").bold(),
        log::Level::Debug => Paint::blue("DEBUG").bold(),
        log::Level::Trace => Paint::new("TRACE"),
    };

    let timestamp = Local::now().format("%H:%M:%S");
    if record.level() >= log::Level::Debug {
        let target = record.module_path().unwrap_or_else(|| record.target());
        format!("[{}] {} {}: {}", timestamp, level, target, record.args())
    } else {
        format!("[{}] {} {}", timestamp, level, record.args())
    }
}

/// Parses a log level string into a LevelFilter, defaulting to Info
pub fn parse_log_level(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_level() {
        assert_eq!(parse_log_level("error"), LevelFilter::Error);
        assert_eq!(parse_log_level("WARN"), LevelFilter::Warn);
        assert_eq!(parse_log_level("info"), LevelFilter::Info);
        assert_eq!(parse_log_level("debug"), LevelFilter::Debug);
        assert_eq!(parse_log_level("trace"), LevelFilter::Trace);
        assert_eq!(parse_log_level("invalid"), LevelFilter::Info);
    }

    #[test]
    fn test_format_log_columns() {
        Paint::disable();
        let info = format_log(
            &log::Record::builder()
                .level(log::Level::Info)
                .module_path(Some("kodi_repo_builder::manifest"))
                .args(format_args!("Wrote addons.xml"))
                .build(),
        );
        assert!(info.ends_with("] INFO  Wrote addons.xml"), "{}", info);
        assert!(!info.contains("kodi_repo_builder"));

        let debug = format_log(
            &log::Record::builder()
                .level(log::Level::Debug)
                .module_path(Some("kodi_repo_builder::processors::git"))
                .args(format_args!("Expanded"))
                .build(),
        );
        assert!(debug.ends_with("] DEBUG kodi_repo_builder::processors::git: Expanded"), "{}", debug);
    }

    #[test]
    fn test_init_twice() {
        assert!(init("debug").is_ok());
        assert!(init("info").is_ok());
    }
}
