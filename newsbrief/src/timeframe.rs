use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};

/// Recency window applied to a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Timeframe {
    #[default]
    LastHour,
    Last12Hours,
    Last24Hours,
    Last7Days,
}

impl Timeframe {
    pub const ALL: [Timeframe; 4] = [
        Timeframe::LastHour,
        Timeframe::Last12Hours,
        Timeframe::Last24Hours,
        Timeframe::Last7Days,
    ];

    pub fn offset(self) -> Duration {
        match self {
            Timeframe::LastHour => Duration::hours(1),
            Timeframe::Last12Hours => Duration::hours(12),
            Timeframe::Last24Hours => Duration::days(1),
            Timeframe::Last7Days => Duration::days(7),
        }
    }

    /// Lower bound on publish time: `now - offset`.
    pub fn cutoff(self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.offset()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Timeframe::LastHour => "1h",
            Timeframe::Last12Hours => "12h",
            Timeframe::Last24Hours => "1d",
            Timeframe::Last7Days => "7d",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Timeframe::LastHour => "Last hour",
            Timeframe::Last12Hours => "Last 12h",
            Timeframe::Last24Hours => "Last 24h",
            Timeframe::Last7Days => "Last week",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1h" => Ok(Timeframe::LastHour),
            "12h" => Ok(Timeframe::Last12Hours),
            "1d" | "24h" => Ok(Timeframe::Last24Hours),
            "7d" => Ok(Timeframe::Last7Days),
            other => Err(format!("unknown timeframe '{}' (expected 1h, 12h, 1d or 7d)", other)),
        }
    }
}
