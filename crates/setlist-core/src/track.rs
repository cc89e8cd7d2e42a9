//! Track records and play times.
//!
//! A [`TrackRecord`] has no identifier of its own: its identity is its index
//! in the owning session. Display positions are derived from that index each
//! time rows are produced, see [`TrackRow`].

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a play time string cannot be understood.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid play time '{input}'")]
pub struct PlaytimeParseError {
    /// The rejected input.
    pub input: String,
}

/// Time-of-day at which a track plays in the set.
///
/// Sources hand these over in several shapes (`00:03:00`, `3:00`,
/// `2018-05-12 00:03:00`, `0 days, 0:03:00`). Only the time-of-day part is
/// kept; any date or day count is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Playtime(NaiveTime);

impl Playtime {
    /// Midnight, used when a source row carries no time.
    pub const ZERO: Self = Self(NaiveTime::MIN);

    /// Build a play time from hours, minutes and seconds.
    #[must_use]
    pub fn from_hms(hours: u32, minutes: u32, seconds: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hours, minutes, seconds).map(Self)
    }

    /// Hour component.
    #[must_use]
    pub fn hours(&self) -> u32 {
        self.0.hour()
    }

    /// Minute component.
    #[must_use]
    pub fn minutes(&self) -> u32 {
        self.0.minute()
    }

    /// Second component.
    #[must_use]
    pub fn seconds(&self) -> u32 {
        self.0.second()
    }
}

impl Default for Playtime {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for Playtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M:%S"))
    }
}

impl FromStr for Playtime {
    type Err = PlaytimeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || PlaytimeParseError {
            input: s.to_string(),
        };

        // "1 day, 0:03:00" and "2018-05-12 00:03:00" both end with the clock part
        let clock = s
            .trim()
            .rsplit(", ")
            .next()
            .and_then(|part| part.rsplit(|c: char| c.is_whitespace() || c == 'T').next())
            .ok_or_else(err)?;

        let parts: Vec<&str> = clock.split(':').collect();
        let (h, m, sec) = match parts.as_slice() {
            [m, sec] => ("0", *m, *sec),
            [h, m, sec] => (*h, *m, *sec),
            _ => return Err(err()),
        };

        // Fractional seconds are truncated
        let sec = sec.split('.').next().unwrap_or(sec);

        let parse = |v: &str| {
            if v.is_empty() || !v.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            v.parse::<u32>().ok()
        };

        let (Some(h), Some(m), Some(sec)) = (parse(h), parse(m), parse(sec)) else {
            return Err(err());
        };

        Self::from_hms(h, m, sec).ok_or_else(err)
    }
}

impl TryFrom<String> for Playtime {
    type Error = PlaytimeParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Playtime> for String {
    fn from(value: Playtime) -> Self {
        value.to_string()
    }
}

/// One playlist entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackRecord {
    /// Performing artist; empty if the source omits it.
    pub artist: String,
    /// Song title; empty if the source omits it.
    pub song: String,
    /// When the track plays.
    pub playtime: Playtime,
}

impl TrackRecord {
    /// Create a new track record.
    pub fn new(artist: impl Into<String>, song: impl Into<String>, playtime: Playtime) -> Self {
        Self {
            artist: artist.into(),
            song: song.into(),
            playtime,
        }
    }

    /// Row view of this record at the given zero-based index.
    #[must_use]
    pub fn to_row(&self, index: usize) -> TrackRow {
        TrackRow {
            position: index + 1,
            artist: self.artist.clone(),
            song: self.song.clone(),
            playtime: self.playtime,
        }
    }
}

/// A track as shown to the user or written to an export.
///
/// `position` is 1-based and computed from the current order; rows are never
/// fed back into the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackRow {
    /// 1-based position in the playlist.
    pub position: usize,
    /// Performing artist.
    pub artist: String,
    /// Song title.
    pub song: String,
    /// When the track plays.
    pub playtime: Playtime,
}

/// Produce rows with freshly derived positions.
pub fn rows_of(tracks: &[TrackRecord]) -> Vec<TrackRow> {
    tracks
        .iter()
        .enumerate()
        .map(|(index, track)| track.to_row(index))
        .collect()
}
