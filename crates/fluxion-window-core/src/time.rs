// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz


use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, SecondsFormat, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use fluxion_window_types::LocalDateTime;

/// Offset-carrying formats tried after RFC 3339
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M%:z",
];

/// Naive formats, interpreted in the local zone
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// The configured local time zone
///
/// Single place where naive timestamps get a zone attached. Everything
/// downstream compares [`LocalDateTime`] values only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalZone(Tz);

impl LocalZone {
    pub fn new(tz: Tz) -> Self {
        Self(tz)
    }

    /// Parse an IANA zone name such as `Europe/Prague`
    pub fn from_name(name: &str) -> Option<Self> {
        name.trim().parse::<Tz>().ok().map(Self)
    }

    pub fn now(&self) -> LocalDateTime {
        Utc::now().with_timezone(&self.0)
    }

    /// Convert any aware timestamp into the local frame
    pub fn convert<Z: TimeZone>(&self, value: &DateTime<Z>) -> LocalDateTime {
        value.with_timezone(&self.0)
    }

    /// Attach the local zone to a naive timestamp
    ///
    /// Ambiguous wall times (DST fold) resolve to the earlier instant. Wall
    /// times that do not exist (DST gap) are shifted forward by one hour.
    pub fn localize(&self, naive: NaiveDateTime) -> Option<LocalDateTime> {
        self.0.from_local_datetime(&naive).earliest().or_else(|| {
            let shifted = naive.checked_add_signed(TimeDelta::hours(1))?;
            self.0.from_local_datetime(&shifted).earliest()
        })
    }

    /// Same wall-clock time on the following calendar day
    ///
    /// Across a DST change this is 23 or 25 hours later, not 24.
    pub fn next_day(&self, value: &LocalDateTime) -> LocalDateTime {
        let local = self.convert(value);
        local
            .naive_local()
            .checked_add_days(Days::new(1))
            .and_then(|naive| self.localize(naive))
            .or_else(|| local.checked_add_signed(TimeDelta::days(1)))
            .unwrap_or(local)
    }

    /// Parse a datetime string in any ISO-8601 form
    ///
    /// Values with an offset are converted to the local zone, naive values
    /// are interpreted as local time and a bare date means local midnight.
    pub fn parse_datetime(&self, value: &str) -> Option<LocalDateTime> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }

        if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
            return Some(self.convert(&parsed));
        }

        for format in OFFSET_FORMATS {
            if let Ok(parsed) = DateTime::parse_from_str(value, format) {
                return Some(self.convert(&parsed));
            }
        }

        for format in NAIVE_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
                return self.localize(naive);
            }
        }

        NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .and_then(|naive| self.localize(naive))
    }

    /// Parse a `HH:MM[:SS[.ffffff]]` time of day anchored to today's date
    ///
    /// Returns `None` for anything that looks like a full datetime (contains
    /// `T`, `-` or `/`) so the caller can fall back to [`Self::parse_datetime`].
    pub fn parse_time_of_day(&self, value: &str, now: LocalDateTime) -> Option<LocalDateTime> {
        let value = value.trim();
        if !value.contains(':') || value.contains(['T', '-', '/']) {
            return None;
        }

        let mut parts = value.split(':');
        let hour: u32 = parts.next()?.trim().parse().ok()?;
        let minute: u32 = parts.next()?.trim().parse().ok()?;
        let seconds: f64 = match parts.next() {
            Some(raw) => raw.trim().parse().ok()?,
            None => 0.0,
        };
        if !seconds.is_finite() || !(0.0..60.0).contains(&seconds) {
            return None;
        }

        let whole = seconds.trunc();
        let micro = ((seconds - whole) * 1_000_000.0).round();
        if micro >= 1_000_000.0 {
            return None;
        }

        #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (whole, micro) = (whole as u32, micro as u32);

        let naive = self
            .convert(&now)
            .date_naive()
            .and_hms_micro_opt(hour, minute, whole, micro)?;
        self.localize(naive)
    }

    /// Render a timestamp as ISO-8601 with the local offset
    pub fn to_iso(&self, value: &LocalDateTime) -> String {
        self.convert(value)
            .to_rfc3339_opts(SecondsFormat::AutoSi, false)
    }
}

impl Default for LocalZone {
    fn default() -> Self {
        Self(Tz::UTC)
    }
}
