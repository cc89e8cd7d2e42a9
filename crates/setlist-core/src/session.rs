//! The playlist session aggregate.
//!
//! A [`PlaylistSession`] holds the one playlist the user is working on. It is
//! created empty, replaced wholesale by [`PlaylistSession::load`], reordered
//! and edited in place, and read by export and publish. All mutation goes
//! through `&mut self`, so a reader always sees a whole state.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{LoadError, ReorderError};
use crate::loader::PlaylistLoader;
use crate::reorder;
use crate::track::{TrackRecord, TrackRow, rows_of};

/// Parsed content of a playlist source, as produced by a loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedPlaylist {
    /// Session name suggested by the source.
    pub name: String,
    /// Session date suggested by the source.
    pub date: String,
    /// Tracks in playback order.
    pub tracks: Vec<TrackRecord>,
}

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// Nothing has been loaded yet.
    Empty,
    /// A playlist has been loaded; export and publish are possible.
    Loaded,
}

/// Point-in-time copy of a session for rendering and export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    /// Session name.
    pub name: String,
    /// Session date.
    pub date: String,
    /// File the playlist was loaded from.
    pub source_path: Option<PathBuf>,
    /// Tracks in playback order.
    pub tracks: Vec<TrackRecord>,
}

impl SessionSnapshot {
    /// Lifecycle state at the time of the snapshot.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        if self.source_path.is_some() {
            SessionState::Loaded
        } else {
            SessionState::Empty
        }
    }

    /// Rows with positions derived from the snapshot's order.
    #[must_use]
    pub fn rows(&self) -> Vec<TrackRow> {
        rows_of(&self.tracks)
    }
}

/// The in-memory playlist being edited.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaylistSession {
    source_path: Option<PathBuf>,
    name: String,
    date: String,
    tracks: Vec<TrackRecord>,
}

impl PlaylistSession {
    /// Create an empty session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a playlist from `path`, replacing the whole session on success.
    ///
    /// The loader runs before anything is touched; if it fails the session
    /// keeps its previous content.
    pub fn load<L>(&mut self, path: &Path, loader: &L) -> Result<SessionSnapshot, LoadError>
    where
        L: PlaylistLoader + ?Sized,
    {
        debug!("Loading playlist from {}", path.display());

        let loaded = loader.load(path).inspect_err(|e| {
            warn!("Keeping previous session, load failed: {}", e);
        })?;

        *self = Self {
            source_path: Some(path.to_path_buf()),
            name: loaded.name,
            date: loaded.date,
            tracks: loaded.tracks,
        };

        info!(
            "Loaded playlist '{}' with {} tracks from {}",
            self.name,
            self.tracks.len(),
            path.display()
        );
        Ok(self.snapshot())
    }

    /// Set the session name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Set the session date.
    pub fn set_date(&mut self, date: impl Into<String>) {
        self.date = date.into();
    }

    /// Move the track at `from` to `to`.
    pub fn move_track(&mut self, from: usize, to: usize) -> Result<(), ReorderError> {
        reorder::move_track(&mut self.tracks, from, to)?;
        debug!("Moved track {} -> {}", from, to);
        Ok(())
    }

    /// Move the track at `index` one position up.
    pub fn move_up(&mut self, index: usize) -> Result<(), ReorderError> {
        reorder::move_up(&mut self.tracks, index)
    }

    /// Move the track at `index` one position down.
    pub fn move_down(&mut self, index: usize) -> Result<(), ReorderError> {
        reorder::move_down(&mut self.tracks, index)
    }

    /// Copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            name: self.name.clone(),
            date: self.date.clone(),
            source_path: self.source_path.clone(),
            tracks: self.tracks.clone(),
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        if self.source_path.is_some() {
            SessionState::Loaded
        } else {
            SessionState::Empty
        }
    }

    /// Session name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Session date.
    #[must_use]
    pub fn date(&self) -> &str {
        &self.date
    }

    /// File the playlist was loaded from.
    #[must_use]
    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    /// Tracks in playback order.
    #[must_use]
    pub fn tracks(&self) -> &[TrackRecord] {
        &self.tracks
    }

    /// Rows with positions derived from the current order.
    #[must_use]
    pub fn rows(&self) -> Vec<TrackRow> {
        rows_of(&self.tracks)
    }

    /// Number of tracks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Whether the session holds no tracks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Whether there is something to export or publish.
    ///
    /// Any loaded playlist counts, including one without tracks.
    #[must_use]
    pub const fn has_data(&self) -> bool {
        matches!(self.state(), SessionState::Loaded)
    }
}
