//! Playlist export.
//!
//! The [`ExportDispatcher`] picks a writer from the output path's extension
//! and writes the session through a temporary file in the destination
//! directory. The temporary file only replaces the target once it has been
//! written completely, so a failed export leaves nothing behind.

use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::config::ExportConfig;
use crate::csv::join_record;
use crate::error::ExportError;
use crate::session::PlaylistSession;
use crate::track::TrackRow;

/// Column names written as the CSV header row.
pub const CSV_HEADER: [&str; 4] = ["position", "artist", "song", "playtime"];

/// Output formats recognised by extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportFormat {
    /// `.csv`
    Csv,
    /// `.txt`, reserved.
    Txt,
    /// `.xlsx`, reserved.
    Xlsx,
    /// Anything else, with the extension as found (may be empty).
    Other(String),
}

impl ExportFormat {
    /// Detect the format from a path's extension, ignoring case.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "csv" => Self::Csv,
            "txt" => Self::Txt,
            "xlsx" => Self::Xlsx,
            _ => Self::Other(ext),
        }
    }
}

/// Writes playlist rows in one output format.
pub trait ExportStrategy {
    /// Short format name used in logs.
    fn format_name(&self) -> &'static str;

    /// Write all rows to `out`.
    fn write_rows(&self, rows: &[TrackRow], out: &mut dyn Write) -> io::Result<()>;
}

/// Header row plus one `position,artist,song,playtime` line per track.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvStrategy;

impl ExportStrategy for CsvStrategy {
    fn format_name(&self) -> &'static str {
        "csv"
    }

    fn write_rows(&self, rows: &[TrackRow], out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "{}", join_record(CSV_HEADER))?;
        for row in rows {
            let position = row.position.to_string();
            let playtime = row.playtime.to_string();
            writeln!(
                out,
                "{}",
                join_record([
                    position.as_str(),
                    row.artist.as_str(),
                    row.song.as_str(),
                    playtime.as_str()
                ])
            )?;
        }
        Ok(())
    }
}

/// Chooses an export strategy by output extension and runs it.
#[derive(Debug, Clone, Copy)]
pub struct ExportDispatcher {
    fallback_to_csv: bool,
}

impl Default for ExportDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ExportDispatcher {
    /// Create a dispatcher that writes unknown extensions as CSV.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            fallback_to_csv: true,
        }
    }

    /// Create a dispatcher from the export configuration.
    #[must_use]
    pub const fn from_config(config: &ExportConfig) -> Self {
        Self {
            fallback_to_csv: config.fallback_to_csv,
        }
    }

    /// Set whether unknown extensions fall back to CSV.
    #[must_use]
    pub const fn with_fallback(mut self, fallback_to_csv: bool) -> Self {
        self.fallback_to_csv = fallback_to_csv;
        self
    }

    /// Pick the strategy for `output_path`.
    pub fn resolve(&self, output_path: &Path) -> Result<Box<dyn ExportStrategy>, ExportError> {
        match ExportFormat::from_path(output_path) {
            ExportFormat::Csv => Ok(Box::new(CsvStrategy)),
            ExportFormat::Txt => Err(ExportError::NotImplemented {
                format: "txt".to_string(),
            }),
            ExportFormat::Xlsx => Err(ExportError::NotImplemented {
                format: "xlsx".to_string(),
            }),
            ExportFormat::Other(extension) => {
                if self.fallback_to_csv {
                    debug!(
                        "No writer for '{}', falling back to csv for {}",
                        extension,
                        output_path.display()
                    );
                    Ok(Box::new(CsvStrategy))
                } else {
                    Err(ExportError::UnsupportedFormat { extension })
                }
            }
        }
    }

    /// Export the session to `output_path`.
    ///
    /// The path is used as given; no extension is added or changed.
    pub fn export(&self, session: &PlaylistSession, output_path: &Path) -> Result<(), ExportError> {
        if !session.has_data() {
            return Err(ExportError::NoData);
        }

        let strategy = self.resolve(output_path)?;
        write_atomically(output_path, |out| {
            strategy.write_rows(&session.rows(), out)
        })?;

        info!(
            "Exported {} tracks as {} to {}",
            session.len(),
            strategy.format_name(),
            output_path.display()
        );
        Ok(())
    }
}

/// Write through a temporary sibling file, then move it over `path`.
fn write_atomically<F>(path: &Path, write: F) -> Result<(), ExportError>
where
    F: FnOnce(&mut dyn Write) -> io::Result<()>,
{
    let io_err = |e: io::Error| ExportError::Io {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    // Dropping the temp file on any early return removes it
    let mut temp = NamedTempFile::new_in(dir).map_err(io_err)?;
    {
        let mut out = BufWriter::new(temp.as_file_mut());
        write(&mut out).map_err(io_err)?;
        out.flush().map_err(io_err)?;
    }
    temp.as_file().sync_all().map_err(io_err)?;
    temp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}

/// Suggested path for a save dialog: `<library root>/<session name>`.
///
/// Purely a UI affordance; the dispatcher never uses it.
#[must_use]
pub fn default_save_path(library_root: &Path, session_name: &str) -> PathBuf {
    let name = session_name.trim();
    if name.is_empty() {
        library_root.to_path_buf()
    } else {
        library_root.join(name)
    }
}

/// File name stem used when the session has no name.
pub const UNTITLED_STEM: &str = "playlist";

/// Suggested export file: `<library root>/<session name>.<extension>`.
///
/// The extension is appended, so dots inside the name survive. A blank name
/// becomes [`UNTITLED_STEM`].
#[must_use]
pub fn default_export_path(library_root: &Path, session_name: &str, extension: &str) -> PathBuf {
    let name = session_name.trim();
    let stem = if name.is_empty() { UNTITLED_STEM } else { name };
    library_root.join(format!("{stem}.{extension}"))
}
