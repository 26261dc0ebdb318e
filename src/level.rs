use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use sentry_core::protocol::Level as Severity;

use crate::error::ConfigError;
use crate::event::{BREADCRUMB_TYPE_DEFAULT, BREADCRUMB_TYPE_ERROR};

/// Ordered integer severity of a [`LogRecord`](crate::record::LogRecord).
///
/// Higher values are more severe. The associated constants follow the
/// usual syslog-derived ladder, but any `i32` is a valid level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Level(pub i32);

impl Level {
    pub const DEBUG: Level = Level(100);
    pub const INFO: Level = Level(200);
    pub const NOTICE: Level = Level(250);
    pub const WARNING: Level = Level(300);
    pub const ERROR: Level = Level(400);
    pub const CRITICAL: Level = Level(500);
    pub const ALERT: Level = Level(550);
    pub const EMERGENCY: Level = Level(600);

    const NAMED: [(Level, &'static str); 8] = [
        (Level::DEBUG, "DEBUG"),
        (Level::INFO, "INFO"),
        (Level::NOTICE, "NOTICE"),
        (Level::WARNING, "WARNING"),
        (Level::ERROR, "ERROR"),
        (Level::CRITICAL, "CRITICAL"),
        (Level::ALERT, "ALERT"),
        (Level::EMERGENCY, "EMERGENCY"),
    ];

    /// Upper-case name for standard levels, `None` for anything else.
    pub fn name(self) -> Option<&'static str> {
        Self::NAMED
            .iter()
            .find(|(level, _)| *level == self)
            .map(|(_, name)| *name)
    }

    /// Map this level to the Sentry event level.
    ///
    /// Levels between the standard steps fall into the bucket below them;
    /// anything strictly above `ERROR` is fatal.
    pub fn to_severity(self) -> Severity {
        if self < Level::INFO {
            Severity::Debug
        } else if self < Level::WARNING {
            Severity::Info
        } else if self < Level::ERROR {
            Severity::Warning
        } else if self == Level::ERROR {
            Severity::Error
        } else {
            Severity::Fatal
        }
    }

    /// Map this level to the breadcrumb level and breadcrumb type.
    ///
    /// The type is `"error"` for every level at or above `ERROR`,
    /// regardless of the finer bucket.
    pub fn to_breadcrumb(self) -> (Severity, &'static str) {
        let ty = if self >= Level::ERROR {
            BREADCRUMB_TYPE_ERROR
        } else {
            BREADCRUMB_TYPE_DEFAULT
        };
        (self.to_severity(), ty)
    }
}

impl Default for Level {
    fn default() -> Self {
        Level::DEBUG
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "{}", self.0),
        }
    }
}

impl FromStr for Level {
    type Err = ConfigError;

    /// Accepts a standard level name (any case, `WARN` as an alias) or a
    /// plain integer.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(n) = trimmed.parse::<i32>() {
            return Ok(Level(n));
        }
        let upper = trimmed.to_ascii_uppercase();
        let upper = if upper == "WARN" { "WARNING".to_string() } else { upper };
        Self::NAMED
            .iter()
            .find(|(_, name)| *name == upper)
            .map(|(level, _)| *level)
            .ok_or_else(|| ConfigError::InvalidLevel(s.to_string()))
    }
}

impl From<&tracing::Level> for Level {
    fn from(level: &tracing::Level) -> Self {
        match *level {
            tracing::Level::TRACE | tracing::Level::DEBUG => Level::DEBUG,
            tracing::Level::INFO => Level::INFO,
            tracing::Level::WARN => Level::WARNING,
            tracing::Level::ERROR => Level::ERROR,
        }
    }
}

impl<'de> Deserialize<'de> for Level {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(i32),
            Name(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Number(n) => Ok(Level(n)),
            Repr::Name(name) => name.parse().map_err(serde::de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_follows_level_ladder() {
        assert_eq!(Level::DEBUG.to_severity(), Severity::Debug);
        assert_eq!(Level::INFO.to_severity(), Severity::Info);
        assert_eq!(Level::NOTICE.to_severity(), Severity::Info);
        assert_eq!(Level::WARNING.to_severity(), Severity::Warning);
        assert_eq!(Level::ERROR.to_severity(), Severity::Error);
        assert_eq!(Level::CRITICAL.to_severity(), Severity::Fatal);
        assert_eq!(Level::ALERT.to_severity(), Severity::Fatal);
        assert_eq!(Level::EMERGENCY.to_severity(), Severity::Fatal);
    }

    #[test]
    fn severity_is_total_over_integers() {
        assert_eq!(Level(i32::MIN).to_severity(), Severity::Debug);
        assert_eq!(Level(0).to_severity(), Severity::Debug);
        assert_eq!(Level(299).to_severity(), Severity::Info);
        assert_eq!(Level(401).to_severity(), Severity::Fatal);
        assert_eq!(Level(i32::MAX).to_severity(), Severity::Fatal);
    }

    #[test]
    fn levels_between_steps_use_bucket_below() {
        assert_eq!(Level(150).to_severity(), Severity::Debug);
        assert_eq!(Level(275).to_severity(), Severity::Info);
        assert_eq!(Level(350).to_severity(), Severity::Warning);
        assert_eq!(Level(350).to_breadcrumb(), (Severity::Warning, BREADCRUMB_TYPE_DEFAULT));
        assert_eq!(Level(450).to_breadcrumb(), (Severity::Fatal, BREADCRUMB_TYPE_ERROR));
    }

    #[test]
    fn breadcrumb_type_is_error_from_error_up() {
        assert_eq!(Level::WARNING.to_breadcrumb(), (Severity::Warning, "default"));
        assert_eq!(Level::ERROR.to_breadcrumb(), (Severity::Error, "error"));
        assert_eq!(Level::CRITICAL.to_breadcrumb(), (Severity::Fatal, "error"));
        assert_eq!(Level::DEBUG.to_breadcrumb(), (Severity::Debug, "default"));
    }

    #[test]
    fn parses_names_and_numbers() {
        assert_eq!("warning".parse::<Level>().unwrap(), Level::WARNING);
        assert_eq!("WARN".parse::<Level>().unwrap(), Level::WARNING);
        assert_eq!(" Critical ".parse::<Level>().unwrap(), Level::CRITICAL);
        assert_eq!("123".parse::<Level>().unwrap(), Level(123));
        assert!(matches!(
            "loud".parse::<Level>(),
            Err(ConfigError::InvalidLevel(name)) if name == "loud"
        ));
    }

    #[test]
    fn deserializes_from_name_or_number() {
        let level: Level = serde_json::from_str("\"error\"").unwrap();
        assert_eq!(level, Level::ERROR);
        let level: Level = serde_json::from_str("250").unwrap();
        assert_eq!(level, Level::NOTICE);
    }

    #[test]
    fn display_uses_name_when_known() {
        assert_eq!(Level::NOTICE.to_string(), "NOTICE");
        assert_eq!(Level(42).to_string(), "42");
    }
}
