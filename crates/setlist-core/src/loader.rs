//! Playlist source loading.
//!
//! The session never parses files itself; it asks a [`PlaylistLoader`].
//! [`FormatterLoader`] is the built-in implementation for the text formats.
//!
//! # Supported Formats
//!
//! - CSV with or without a header row
//! - TXT, one `[time] Artist - Song` entry per line. The time is a clock
//!   time of day, so `22:04` reads as `HH:MM`, unlike a CSV `Playtime`
//!   column where two parts are minutes and seconds.
//!
//! Spreadsheets (`.xlsx`, `.xlsm`) are recognised as playlist sources but
//! need an external loader plugged in through the trait.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::csv::split_record;
use crate::error::LoadError;
use crate::session::LoadedPlaylist;
use crate::track::{Playtime, TrackRecord};

/// File extensions accepted as playlist sources, for open-dialog filters.
pub const INPUT_EXTENSIONS: [&str; 4] = ["csv", "txt", "xlsx", "xlsm"];

static DATE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{4}[-.]\d{1,2}[-.]\d{1,2}|\d{1,2}\.\d{1,2}\.\d{4}").expect("valid date pattern")
});

static TXT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\[?(\d{1,2}:\d{2}(?::\d{2})?)\]?\s+)?(.*)$").expect("valid line pattern")
});

/// Source formats a playlist may be loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// Comma separated values.
    Csv,
    /// Plain text, one track per line.
    Txt,
    /// Excel workbook.
    Xlsx,
    /// Excel macro-enabled workbook.
    Xlsm,
}

impl InputFormat {
    /// Detect the format from a path's extension, ignoring case.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(Self::Csv),
            "txt" => Some(Self::Txt),
            "xlsx" => Some(Self::Xlsx),
            "xlsm" => Some(Self::Xlsm),
            _ => None,
        }
    }

    /// Canonical extension for this format.
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Txt => "txt",
            Self::Xlsx => "xlsx",
            Self::Xlsm => "xlsm",
        }
    }
}

/// Check if a path looks like a playlist source by its extension.
#[must_use]
pub fn is_supported_input(path: &Path) -> bool {
    InputFormat::from_path(path).is_some()
}

/// Parses a playlist source into tracks and session metadata.
///
/// This trait allows for mocking in tests.
#[cfg_attr(test, mockall::automock)]
pub trait PlaylistLoader: Send + Sync {
    /// Read and parse the playlist at `path`.
    fn load(&self, path: &Path) -> Result<LoadedPlaylist, LoadError>;
}

/// Built-in loader for CSV and TXT playlists.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatterLoader;

impl FormatterLoader {
    /// Create a new formatter loader.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl PlaylistLoader for FormatterLoader {
    fn load(&self, path: &Path) -> Result<LoadedPlaylist, LoadError> {
        let format = InputFormat::from_path(path).ok_or_else(|| unsupported(path))?;

        let tracks = match format {
            InputFormat::Csv => parse_csv(path, &read_source(path)?)?,
            InputFormat::Txt => parse_txt(&read_source(path)?),
            InputFormat::Xlsx | InputFormat::Xlsm => return Err(unsupported(path)),
        };

        if tracks.is_empty() {
            return Err(malformed(path, "no track rows"));
        }

        let (name, date) = name_and_date_from_path(path);
        debug!(
            "Parsed {} tracks from {} ({})",
            tracks.len(),
            path.display(),
            format.extension()
        );

        Ok(LoadedPlaylist { name, date, tracks })
    }
}

fn read_source(path: &Path) -> Result<String, LoadError> {
    let content = fs::read_to_string(path).map_err(|e| LoadError::Io {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(content.trim_start_matches('\u{feff}').to_string())
}

fn unsupported(path: &Path) -> LoadError {
    LoadError::UnsupportedFormat {
        path: path.to_path_buf(),
        extension: path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default(),
    }
}

fn malformed(path: &Path, reason: impl Into<String>) -> LoadError {
    LoadError::MalformedContent {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

/// Column indices of the track fields within a CSV record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColumnLayout {
    artist: usize,
    song: usize,
    playtime: Option<usize>,
}

const SONG_HEADERS: [&str; 4] = ["song", "title", "track", "song title"];
const PLAYTIME_HEADERS: [&str; 5] = ["playtime", "play time", "time", "start", "start time"];

impl ColumnLayout {
    fn from_header(header: &[String]) -> Option<Self> {
        let find = |names: &[&str]| {
            header
                .iter()
                .position(|cell| names.contains(&cell.trim().to_lowercase().as_str()))
        };
        Some(Self {
            artist: find(&["artist"])?,
            song: find(&SONG_HEADERS)?,
            playtime: find(&PLAYTIME_HEADERS),
        })
    }

    fn from_first_row(row: &[String]) -> Option<Self> {
        let numbered = row
            .first()
            .is_some_and(|cell| cell.trim().parse::<usize>().is_ok());

        match row.len() {
            n if n >= 4 && numbered => Some(Self {
                artist: 1,
                song: 2,
                playtime: Some(3),
            }),
            n if n >= 3 => Some(Self {
                artist: 0,
                song: 1,
                playtime: Some(2),
            }),
            2 => Some(Self {
                artist: 0,
                song: 1,
                playtime: None,
            }),
            _ => None,
        }
    }
}

fn is_header(record: &[String]) -> bool {
    record
        .iter()
        .any(|cell| cell.trim().eq_ignore_ascii_case("artist"))
}

fn parse_csv(path: &Path, content: &str) -> Result<Vec<TrackRecord>, LoadError> {
    let mut records = content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(n, line)| (n + 1, split_record(line)))
        .peekable();

    let Some((_, first)) = records.peek() else {
        return Ok(Vec::new());
    };

    let layout = if is_header(first) {
        let layout = ColumnLayout::from_header(first)
            .ok_or_else(|| malformed(path, "header lacks an artist or song column"))?;
        records.next();
        layout
    } else {
        ColumnLayout::from_first_row(first)
            .ok_or_else(|| malformed(path, "expected at least artist and song columns"))?
    };

    if layout.playtime.is_none() {
        warn!("No play time column in {}, using 00:00:00", path.display());
    }

    records
        .map(|(line_no, record)| -> Result<TrackRecord, LoadError> {
            let cell = |i: usize| record.get(i).map_or("", |s| s.trim());
            let playtime = match layout.playtime.map(cell) {
                None | Some("") => Playtime::ZERO,
                Some(raw) => raw
                    .parse()
                    .map_err(|e| malformed(path, format!("line {line_no}: {e}")))?,
            };
            Ok(TrackRecord::new(
                cell(layout.artist),
                cell(layout.song),
                playtime,
            ))
        })
        .collect()
}

fn parse_txt(content: &str) -> Vec<TrackRecord> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let caps = TXT_LINE.captures(line)?;
            let playtime = caps
                .get(1)
                .and_then(|m| parse_clock_time(m.as_str()))
                .unwrap_or(Playtime::ZERO);
            let rest = caps.get(2).map_or("", |m| m.as_str());
            let (artist, song) = rest.split_once(" - ").unwrap_or(("", rest));
            Some(TrackRecord::new(artist.trim(), song.trim(), playtime))
        })
        .collect()
}

/// Parse a TXT timestamp, where `HH:MM` has no seconds part.
fn parse_clock_time(raw: &str) -> Option<Playtime> {
    if raw.matches(':').count() == 1 {
        format!("{raw}:00").parse().ok()
    } else {
        raw.parse().ok()
    }
}

/// Derive the session name and date from a playlist file name.
///
/// A date token in the file stem becomes the date; what remains, trimmed of
/// separators, becomes the name. A stem that is only a date is also the name.
#[must_use]
pub fn name_and_date_from_path(path: &Path) -> (String, String) {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let Some(found) = DATE_TOKEN.find(&stem) else {
        return (stem.trim().to_string(), String::new());
    };

    let date = found.as_str().to_string();
    let rest = format!("{} {}", &stem[..found.start()], &stem[found.end()..]);
    let name = rest
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, '-' | '_' | '.'))
        .to_string();

    if name.is_empty() {
        (stem, date)
    } else {
        (name, date)
    }
}
