//! Time window resolution

use crate::error::InputError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default range-query resolution in seconds
const BASE_STEP_SECS: i64 = 30;

/// Prometheus rejects range queries returning more points than this per series
const MAX_POINTS_PER_SERIES: i64 = 11_000;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Canonical `[start_ts, end_ts]` window in epoch seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    start_ts: i64,
    end_ts: i64,
}

impl TimeWindow {
    /// Validate and build a window; `start_ts <= end_ts <= now` must hold.
    pub fn new(start_ts: i64, end_ts: i64) -> Result<Self, InputError> {
        Self::new_at(start_ts, end_ts, Utc::now().timestamp())
    }

    fn new_at(start_ts: i64, end_ts: i64, now: i64) -> Result<Self, InputError> {
        if start_ts < 0 {
            return Err(InputError::InvalidTimeRange(format!(
                "start {} is before the epoch",
                start_ts
            )));
        }
        if start_ts > end_ts {
            return Err(InputError::InvalidTimeRange(format!(
                "start {} is after end {}",
                start_ts, end_ts
            )));
        }
        if end_ts > now {
            return Err(InputError::InvalidTimeRange(format!(
                "end {} lies in the future",
                end_ts
            )));
        }
        Ok(Self { start_ts, end_ts })
    }

    /// Window of `duration_secs` ending now
    pub fn last(duration_secs: i64) -> Result<Self, InputError> {
        let now = Utc::now().timestamp();
        Self::new_at(now.saturating_sub(duration_secs), now, now)
    }

    pub fn start_ts(&self) -> i64 {
        self.start_ts
    }

    pub fn end_ts(&self) -> i64 {
        self.end_ts
    }

    pub fn duration_secs(&self) -> i64 {
        self.end_ts.saturating_sub(self.start_ts)
    }

    /// Range-query step: 30s, widened to stay under the per-series point limit
    pub fn step_secs(&self) -> i64 {
        let span = self.duration_secs();
        let min_step = (span + MAX_POINTS_PER_SERIES - 1) / MAX_POINTS_PER_SERIES;
        BASE_STEP_SECS.max(min_step)
    }
}

/// The three mutually exclusive ways a caller can describe a window
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRangeInput {
    /// Relative duration token such as `1h`, `24h`, `7d`
    pub time_range: Option<String>,
    pub start_datetime: Option<String>,
    pub end_datetime: Option<String>,
    pub start_ts: Option<i64>,
    pub end_ts: Option<i64>,
}

impl TimeRangeInput {
    pub fn relative(token: &str) -> Self {
        Self {
            time_range: Some(token.to_string()),
            ..Default::default()
        }
    }

    pub fn datetimes(start: &str, end: &str) -> Self {
        Self {
            start_datetime: Some(start.to_string()),
            end_datetime: Some(end.to_string()),
            ..Default::default()
        }
    }

    pub fn epochs(start_ts: i64, end_ts: i64) -> Self {
        Self {
            start_ts: Some(start_ts),
            end_ts: Some(end_ts),
            ..Default::default()
        }
    }

    pub fn resolve(&self) -> Result<TimeWindow, InputError> {
        self.resolve_at(Utc::now().timestamp())
    }

    /// Resolve against an explicit `now`
    pub fn resolve_at(&self, now: i64) -> Result<TimeWindow, InputError> {
        let has_relative = self.time_range.is_some();
        let has_datetimes = self.start_datetime.is_some() || self.end_datetime.is_some();
        let has_epochs = self.start_ts.is_some() || self.end_ts.is_some();

        let forms = [has_relative, has_datetimes, has_epochs]
            .iter()
            .filter(|&&f| f)
            .count();
        if forms > 1 {
            return Err(InputError::InvalidTimeRange(
                "supply only one of a relative range, a datetime pair, or an epoch pair"
                    .to_string(),
            ));
        }

        if let Some(token) = &self.time_range {
            let duration = parse_duration(token).ok_or_else(|| {
                InputError::InvalidTimeRange(format!("unrecognized duration '{}'", token))
            })?;
            return TimeWindow::new_at(now.saturating_sub(duration), now, now);
        }

        if has_datetimes {
            let (start, end) = match (&self.start_datetime, &self.end_datetime) {
                (Some(start), Some(end)) => (parse_datetime(start)?, parse_datetime(end)?),
                _ => {
                    return Err(InputError::InvalidTimeRange(
                        "both start and end datetimes are required".to_string(),
                    ))
                }
            };
            return TimeWindow::new_at(start, end, now);
        }

        match (self.start_ts, self.end_ts) {
            (Some(start), Some(end)) => TimeWindow::new_at(start, end, now),
            (None, None) => Err(InputError::InvalidTimeRange(
                "no time range supplied".to_string(),
            )),
            _ => Err(InputError::InvalidTimeRange(
                "both start and end timestamps are required".to_string(),
            )),
        }
    }
}

/// Parse `<n><unit>` with unit one of s, m, h, d, w into seconds
pub fn parse_duration(token: &str) -> Option<i64> {
    let token = token.trim().to_ascii_lowercase();
    let unit = token.chars().last()?;
    let multiplier = match unit {
        's' => 1,
        'm' => 60,
        'h' => 3_600,
        'd' => 86_400,
        'w' => 604_800,
        _ => return None,
    };
    let digits = &token[..token.len() - 1];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let amount: i64 = digits.parse().ok()?;
    if amount == 0 {
        return None;
    }
    amount.checked_mul(multiplier)
}

fn parse_datetime(raw: &str) -> Result<i64, InputError> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.timestamp());
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc().timestamp());
        }
    }
    if let Some(midnight) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(midnight.and_utc().timestamp());
    }
    Err(InputError::InvalidTimeRange(format!(
        "cannot parse datetime '{}'",
        raw
    )))
}
