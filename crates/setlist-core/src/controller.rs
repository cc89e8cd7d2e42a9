//! Command/query surface for session shells.
//!
//! A shell owns one [`SessionController`] and forwards user events to it.
//! After every operation the controller reports back through the shell's
//! [`SessionObserver`]: `render` after each successful mutation, `notify`
//! for every outcome, failures included.

use std::path::{Path, PathBuf};

use tracing::{debug, error, info};

use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::export::{ExportDispatcher, default_export_path, default_save_path};
use crate::loader::{FormatterLoader, PlaylistLoader};
use crate::publish::PublishGateway;
use crate::session::{PlaylistSession, SessionSnapshot};

/// Operations a shell can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Loading a playlist.
    Load,
    /// Moving a track.
    Reorder,
    /// Editing the name or date.
    Edit,
    /// Exporting to a file.
    Export,
    /// Publishing to the upload target.
    Publish,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Load => write!(f, "load"),
            Self::Reorder => write!(f, "reorder"),
            Self::Edit => write!(f, "edit"),
            Self::Export => write!(f, "export"),
            Self::Publish => write!(f, "publish"),
        }
    }
}

/// Outcome of an operation, for the shell's status line or message box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// A playlist was loaded.
    Loaded {
        /// Source file.
        path: PathBuf,
        /// Number of tracks loaded.
        tracks: usize,
    },
    /// A track was moved.
    Moved {
        /// Source index.
        from: usize,
        /// Destination index.
        to: usize,
    },
    /// Name or date changed.
    Edited,
    /// The playlist was written to a file.
    Saved {
        /// Output file.
        path: PathBuf,
    },
    /// The playlist was published.
    Published {
        /// Label sent.
        label: String,
        /// Date sent.
        date: String,
    },
    /// An operation failed; session state is unchanged.
    Failed {
        /// What was attempted.
        operation: Operation,
        /// Error message.
        message: String,
    },
}

/// Presentation side of a session: draws rows and shows messages.
pub trait SessionObserver {
    /// Redraw from a fresh snapshot.
    fn render(&mut self, snapshot: &SessionSnapshot);

    /// Show the outcome of an operation.
    fn notify(&mut self, notification: &Notification);
}

/// Observer that ignores everything, for headless use.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl SessionObserver for NullObserver {
    fn render(&mut self, _snapshot: &SessionSnapshot) {}

    fn notify(&mut self, _notification: &Notification) {}
}

/// Owns the session and its collaborators.
pub struct SessionController {
    session: PlaylistSession,
    loader: Box<dyn PlaylistLoader>,
    dispatcher: ExportDispatcher,
    gateway: PublishGateway,
    library_directory: PathBuf,
    publish_label: String,
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("session", &self.session)
            .field("dispatcher", &self.dispatcher)
            .field("gateway", &self.gateway)
            .field("library_directory", &self.library_directory)
            .field("publish_label", &self.publish_label)
            .finish_non_exhaustive()
    }
}

impl SessionController {
    /// Create a controller with the built-in loader and configured collaborators.
    #[must_use]
    pub fn new(config: &AppConfig) -> Self {
        Self::with_parts(
            Box::new(FormatterLoader::new()),
            ExportDispatcher::from_config(&config.export),
            PublishGateway::from_config(&config.publish),
        )
        .with_library_directory(config.library_directory.clone())
        .with_publish_label(config.publish.label.clone())
    }

    /// Create a controller from explicit collaborators.
    pub fn with_parts(
        loader: Box<dyn PlaylistLoader>,
        dispatcher: ExportDispatcher,
        gateway: PublishGateway,
    ) -> Self {
        Self {
            session: PlaylistSession::new(),
            loader,
            dispatcher,
            gateway,
            library_directory: PathBuf::from("."),
            publish_label: crate::config::DEFAULT_PUBLISH_LABEL.to_string(),
        }
    }

    /// Set the directory used for save suggestions.
    #[must_use]
    pub fn with_library_directory(mut self, dir: PathBuf) -> Self {
        self.library_directory = dir;
        self
    }

    /// Set the label used by [`Self::publish`].
    #[must_use]
    pub fn with_publish_label(mut self, label: String) -> Self {
        self.publish_label = label;
        self
    }

    /// The session being edited.
    #[must_use]
    pub const fn session(&self) -> &PlaylistSession {
        &self.session
    }

    /// Current snapshot of the session.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.snapshot()
    }

    /// Label sent by [`Self::publish`].
    #[must_use]
    pub fn publish_label(&self) -> &str {
        &self.publish_label
    }

    /// Suggested path for a save prompt.
    #[must_use]
    pub fn default_save_path(&self) -> PathBuf {
        default_save_path(&self.library_directory, self.session.name())
    }

    /// File a save without an explicit path writes to: the session name plus
    /// `.csv` inside the library directory.
    #[must_use]
    pub fn default_export_path(&self) -> PathBuf {
        default_export_path(&self.library_directory, self.session.name(), "csv")
    }

    /// Directory suggested by open prompts.
    #[must_use]
    pub fn library_directory(&self) -> &Path {
        &self.library_directory
    }

    /// Load a playlist, replacing the session on success.
    pub fn open(
        &mut self,
        path: &Path,
        observer: &mut dyn SessionObserver,
    ) -> Result<SessionSnapshot> {
        match self.session.load(path, self.loader.as_ref()) {
            Ok(snapshot) => {
                observer.render(&snapshot);
                observer.notify(&Notification::Loaded {
                    path: path.to_path_buf(),
                    tracks: snapshot.tracks.len(),
                });
                Ok(snapshot)
            }
            Err(e) => Err(fail(Operation::Load, e.into(), observer)),
        }
    }

    /// Handle a drop of one or more files: the first one is opened.
    pub fn drop_paths(
        &mut self,
        paths: &[PathBuf],
        observer: &mut dyn SessionObserver,
    ) -> Result<Option<SessionSnapshot>> {
        let Some((first, rest)) = paths.split_first() else {
            debug!("Drop event without paths ignored");
            return Ok(None);
        };
        if !rest.is_empty() {
            debug!("Ignoring {} additional dropped paths", rest.len());
        }
        self.open(first, observer).map(Some)
    }

    /// Rename the session.
    pub fn set_name(&mut self, name: &str, observer: &mut dyn SessionObserver) {
        self.session.set_name(name);
        self.edited(observer);
    }

    /// Change the session date.
    pub fn set_date(&mut self, date: &str, observer: &mut dyn SessionObserver) {
        self.session.set_date(date);
        self.edited(observer);
    }

    fn edited(&self, observer: &mut dyn SessionObserver) {
        observer.render(&self.session.snapshot());
        observer.notify(&Notification::Edited);
    }

    /// Move the track at `from` to `to`.
    pub fn move_track(
        &mut self,
        from: usize,
        to: usize,
        observer: &mut dyn SessionObserver,
    ) -> Result<()> {
        match self.session.move_track(from, to) {
            Ok(()) => {
                self.moved(from, to, observer);
                Ok(())
            }
            Err(e) => Err(fail(Operation::Reorder, e.into(), observer)),
        }
    }

    /// Move the track at `index` one step up.
    pub fn move_up(&mut self, index: usize, observer: &mut dyn SessionObserver) -> Result<()> {
        match self.session.move_up(index) {
            Ok(()) => {
                self.moved(index, index.saturating_sub(1), observer);
                Ok(())
            }
            Err(e) => Err(fail(Operation::Reorder, e.into(), observer)),
        }
    }

    /// Move the track at `index` one step down.
    pub fn move_down(&mut self, index: usize, observer: &mut dyn SessionObserver) -> Result<()> {
        match self.session.move_down(index) {
            Ok(()) => {
                let to = index.saturating_add(1).min(self.session.len().saturating_sub(1));
                self.moved(index, to, observer);
                Ok(())
            }
            Err(e) => Err(fail(Operation::Reorder, e.into(), observer)),
        }
    }

    fn moved(&self, from: usize, to: usize, observer: &mut dyn SessionObserver) {
        observer.render(&self.session.snapshot());
        observer.notify(&Notification::Moved { from, to });
    }

    /// Export the session to `path`.
    pub fn save(&self, path: &Path, observer: &mut dyn SessionObserver) -> Result<()> {
        match self.dispatcher.export(&self.session, path) {
            Ok(()) => {
                observer.notify(&Notification::Saved {
                    path: path.to_path_buf(),
                });
                Ok(())
            }
            Err(e) => Err(fail(Operation::Export, e.into(), observer)),
        }
    }

    /// Publish the configured label with the session's date.
    pub fn publish(&self, observer: &mut dyn SessionObserver) -> Result<()> {
        let label = self.publish_label.clone();
        let date = self.session.date().to_string();
        self.publish_with(&label, &date, observer)
    }

    /// Publish an explicit label and date.
    pub fn publish_with(
        &self,
        label: &str,
        date: &str,
        observer: &mut dyn SessionObserver,
    ) -> Result<()> {
        match self.gateway.push(&self.session, label, date) {
            Ok(()) => {
                info!("Session published as '{}'", label);
                observer.notify(&Notification::Published {
                    label: label.to_string(),
                    date: date.to_string(),
                });
                Ok(())
            }
            Err(e) => Err(fail(Operation::Publish, e.into(), observer)),
        }
    }
}

fn fail(operation: Operation, err: Error, observer: &mut dyn SessionObserver) -> Error {
    error!("{} failed: {}", operation, err);
    observer.notify(&Notification::Failed {
        operation,
        message: err.to_string(),
    });
    err
}
