// Tue Jan 13 2026 - Alex

use log::LevelFilter;

pub struct LoggingUtils;

impl LoggingUtils {
    /// Installs env_logger at `level`. `RUST_LOG` still overrides per module.
    pub fn init_logger(level: LevelFilter) {
        env_logger::Builder::new()
            .filter_level(level)
            .parse_default_env()
            .format_timestamp(None)
            .format_target(true)
            .try_init()
            .ok();
    }

    pub fn level_from_str(s: &str) -> LevelFilter {
        match s.to_lowercase().as_str() {
            "error" => LevelFilter::Error,
            "warn" | "warning" => LevelFilter::Warn,
            "info" => LevelFilter::Info,
            "debug" => LevelFilter::Debug,
            "trace" => LevelFilter::Trace,
            "off" => LevelFilter::Off,
            _ => LevelFilter::Info,
        }
    }

    pub fn level_from_verbosity(verbosity: u8) -> LevelFilter {
        match verbosity {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

pub fn init_logger(level: LevelFilter) {
    LoggingUtils::init_logger(level);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_parsing() {
        assert_eq!(LoggingUtils::level_from_str("WARNING"), LevelFilter::Warn);
        assert_eq!(LoggingUtils::level_from_str("trace"), LevelFilter::Trace);
        assert_eq!(LoggingUtils::level_from_str("bogus"), LevelFilter::Info);
    }

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(LoggingUtils::level_from_verbosity(0), LevelFilter::Warn);
        assert_eq!(LoggingUtils::level_from_verbosity(2), LevelFilter::Debug);
        assert_eq!(LoggingUtils::level_from_verbosity(9), LevelFilter::Trace);
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init_logger(LevelFilter::Debug);
        init_logger(LevelFilter::Trace);
    }
}
