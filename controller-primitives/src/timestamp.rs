//! Agent-formatted timestamps.

use std::fmt::{self, Display, Formatter};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Timestamp text exactly as emitted by the agent.
///
/// Agents have written both `2024-03-01 10:15:30.123456Z` and RFC 3339 forms over
/// time, so the raw text is preserved and only parsed on demand.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(String);

impl Timestamp {
    /// Wraps raw timestamp text without validating it.
    #[must_use]
    pub fn from_raw(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Formats a UTC instant the way the agent does.
    #[must_use]
    pub fn from_datetime(value: DateTime<Utc>) -> Self {
        Self(value.format("%Y-%m-%d %H:%M:%S%.6fZ").to_string())
    }

    /// Returns the raw text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parses the text into a UTC instant.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTimestamp`] when the text matches neither the
    /// agent's space-separated form nor RFC 3339.
    pub fn parse(&self) -> Result<DateTime<Utc>> {
        if let Ok(parsed) = DateTime::parse_from_rfc3339(&self.0) {
            return Ok(parsed.with_timezone(&Utc));
        }

        let trimmed = self.0.strip_suffix('Z').unwrap_or(&self.0);
        NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f")
            .map(|naive| naive.and_utc())
            .map_err(|_| Error::InvalidTimestamp {
                value: self.0.clone(),
            })
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, TimeZone, Timelike};

    use super::*;

    #[test]
    fn parses_space_separated_form() {
        let ts = Timestamp::from_raw("2024-03-01 10:15:30.123456Z");
        let parsed = ts.parse().expect("parse");
        assert_eq!(parsed.year(), 2024);
        assert_eq!(parsed.hour(), 10);
        assert_eq!(parsed.nanosecond(), 123_456_000);
    }

    #[test]
    fn parses_rfc3339_form() {
        let ts = Timestamp::from_raw("2024-03-01T10:15:30.5+02:00");
        let parsed = ts.parse().expect("parse");
        assert_eq!(parsed.hour(), 8);
    }

    #[test]
    fn formats_like_the_agent() {
        let instant = Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 1).unwrap();
        let ts = Timestamp::from_datetime(instant);
        assert_eq!(ts.as_str(), "2023-12-31 23:59:01.000000Z");
        assert_eq!(ts.parse().expect("parse"), instant);
    }

    #[test]
    fn rejects_garbage() {
        let err = Timestamp::from_raw("yesterday").parse().expect_err("garbage");
        assert_eq!(
            err,
            Error::InvalidTimestamp {
                value: "yesterday".into()
            }
        );
    }
}
