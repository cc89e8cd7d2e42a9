//! `Setlist` Core Library
//!
//! This crate provides the core functionality for the `Setlist` application:
//! - Loading playlist listings from CSV/TXT sources
//! - An in-memory playlist session with stable, user-controlled ordering
//! - Exporting the session to a file, dispatched by output extension
//! - Publishing session metadata to an upload target
//! - Application configuration management
//!
//! Presentation lives outside this crate. A shell drives a
//! [`SessionController`] and receives renders and notifications through its
//! [`SessionObserver`] implementation.
//!
//! # Error Handling
//!
//! Each operation family has a typed error; the crate-level [`Error`] wraps
//! them. See the [`error`] module for details.
//!
//! ```rust,ignore
//! use setlist_core::{AppConfig, NullObserver, SessionController};
//!
//! let mut controller = SessionController::new(&AppConfig::default());
//! controller.open(Path::new("set.csv"), &mut NullObserver)?;
//! controller.move_track(2, 0, &mut NullObserver)?;
//! controller.save(Path::new("out.csv"), &mut NullObserver)?;
//! ```

pub mod config;
pub mod controller;
mod csv;
pub mod error;
pub mod export;
pub mod loader;
pub mod publish;
pub mod reorder;
pub mod session;
pub mod track;

pub use config::{AppConfig, ConfigManager, DEFAULT_PUBLISH_LABEL, ExportConfig, PublishConfig};
pub use controller::{Notification, NullObserver, Operation, SessionController, SessionObserver};
pub use error::{
    Error, ErrorKind, ExportError, LoadError, PublishError, ReorderError, Result,
};
pub use export::{
    CSV_HEADER, CsvStrategy, ExportDispatcher, ExportFormat, ExportStrategy, UNTITLED_STEM,
    default_export_path, default_save_path,
};
pub use loader::{
    FormatterLoader, INPUT_EXTENSIONS, InputFormat, PlaylistLoader, is_supported_input,
};
pub use publish::{
    DEFAULT_PUBLISH_TIMEOUT_SECS, HttpPublishTarget, PublishGateway, PublishRequest,
    PublishTarget, UnconfiguredTarget,
};
pub use session::{LoadedPlaylist, PlaylistSession, SessionSnapshot, SessionState};
pub use track::{Playtime, PlaytimeParseError, TrackRecord, TrackRow};
