//! Line-driven terminal shell over a [`SessionController`].
//!
//! Positions typed by the user are 1-based, as shown in the table.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use setlist_core::{
    Notification, SessionController, SessionObserver, SessionSnapshot, SessionState, TrackRow,
};
use thiserror::Error;
use tracing::{debug, warn};

const HELP: &str = "\
commands:
  open <file>          load a playlist (csv, txt)
  name <text>          rename the session
  date <text>          change the session date
  move <from> <to>     move the track at position <from> to <to>
  up <pos>             move a track one row up
  down <pos>           move a track one row down
  save [<file>]        export (default: <library>/<name>.csv, 'playlist' if unnamed)
  publish [<label>]    push label and date to the upload target
  show                 print the track table
  help                 show this help
  quit                 leave the shell";

/// A parsed shell command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Load a playlist.
    Open(PathBuf),
    /// Rename the session.
    Name(String),
    /// Change the session date.
    Date(String),
    /// Move a track, 0-based indices.
    Move {
        /// Source index.
        from: usize,
        /// Destination index.
        to: usize,
    },
    /// Move a track one row up, 0-based index.
    Up(usize),
    /// Move a track one row down, 0-based index.
    Down(usize),
    /// Export, optionally to an explicit path.
    Save(Option<PathBuf>),
    /// Publish, optionally with an explicit label.
    Publish(Option<String>),
    /// Print the table.
    Show,
    /// Print help.
    Help,
    /// Leave the shell.
    Quit,
}

/// Errors from parsing a command line.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CommandError {
    /// The first word is not a command.
    #[error("unknown command '{0}', type 'help' for a list")]
    Unknown(String),

    /// A required argument was not given.
    #[error("'{command}' needs {argument}")]
    MissingArgument {
        /// Command name.
        command: &'static str,
        /// Description of the argument.
        argument: &'static str,
    },

    /// A position was not a number of at least 1.
    #[error("invalid position '{0}', positions start at 1")]
    InvalidPosition(String),
}

/// Parse a 1-based position into a 0-based index.
pub fn parse_position(raw: &str) -> Result<usize, CommandError> {
    raw.trim()
        .parse::<usize>()
        .ok()
        .and_then(|p| p.checked_sub(1))
        .ok_or_else(|| CommandError::InvalidPosition(raw.to_string()))
}

impl Command {
    /// Parse one input line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(w, r)| (w, r.trim()));

        let required = |command: &'static str, argument: &'static str| {
            if rest.is_empty() {
                Err(CommandError::MissingArgument { command, argument })
            } else {
                Ok(rest.to_string())
            }
        };
        let optional = || (!rest.is_empty()).then(|| rest.to_string());

        let command = match word.to_lowercase().as_str() {
            "open" | "load" => Self::Open(PathBuf::from(required("open", "a file")?)),
            "name" => Self::Name(required("name", "a name")?),
            "date" => Self::Date(required("date", "a date")?),
            "move" | "mv" => {
                let mut args = rest.split_whitespace();
                let (Some(from), Some(to)) = (args.next(), args.next()) else {
                    return Err(CommandError::MissingArgument {
                        command: "move",
                        argument: "two positions",
                    });
                };
                Self::Move {
                    from: parse_position(from)?,
                    to: parse_position(to)?,
                }
            }
            "up" => Self::Up(parse_position(&required("up", "a position")?)?),
            "down" => Self::Down(parse_position(&required("down", "a position")?)?),
            "save" | "export" => Self::Save(optional().map(PathBuf::from)),
            "publish" => Self::Publish(optional()),
            "show" | "ls" => Self::Show,
            "help" | "?" => Self::Help,
            "quit" | "exit" | "q" => Self::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(Some(command))
    }
}

/// Observer that prints to a terminal.
pub struct TerminalShell<W: Write> {
    out: W,
    tables: bool,
    failures: bool,
}

impl<W: Write> TerminalShell<W> {
    /// Print tables and every notification.
    pub const fn new(out: W) -> Self {
        Self {
            out,
            tables: true,
            failures: true,
        }
    }

    /// Toggle table output on render.
    #[must_use]
    pub const fn with_tables(mut self, tables: bool) -> Self {
        self.tables = tables;
        self
    }

    /// Toggle printing of failure notifications.
    #[must_use]
    pub const fn with_failures(mut self, failures: bool) -> Self {
        self.failures = failures;
        self
    }

    /// Consume the shell, returning the writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Print a snapshot as a table, regardless of the table setting.
    pub fn print_table(&mut self, snapshot: &SessionSnapshot) {
        let text = format_table(snapshot);
        self.emit(&text);
    }

    fn emit(&mut self, text: &str) {
        if let Err(e) = writeln!(self.out, "{text}").and_then(|()| self.out.flush()) {
            warn!("Failed to write to terminal: {}", e);
        }
    }

    fn prompt(&mut self) -> io::Result<()> {
        write!(self.out, "> ")?;
        self.out.flush()
    }
}

impl<W: Write> SessionObserver for TerminalShell<W> {
    fn render(&mut self, snapshot: &SessionSnapshot) {
        if self.tables {
            self.print_table(snapshot);
        }
    }

    fn notify(&mut self, notification: &Notification) {
        let text = match notification {
            Notification::Loaded { path, tracks } => {
                format!("loaded {tracks} tracks from {}", path.display())
            }
            Notification::Moved { from, to } => format!("moved {} -> {}", from + 1, to + 1),
            Notification::Edited => return,
            Notification::Saved { path } => format!("saved {}", path.display()),
            Notification::Published { label, date } => {
                format!("published '{label}' ({date})")
            }
            Notification::Failed { operation, message } => {
                if !self.failures {
                    return;
                }
                format!("error: {operation} failed: {message}")
            }
        };
        self.emit(&text);
    }
}

/// Render a snapshot as a plain-text table.
#[must_use]
pub fn format_table(snapshot: &SessionSnapshot) -> String {
    if snapshot.state() == SessionState::Empty {
        return "(no playlist loaded)".to_string();
    }

    let rows = snapshot.rows();
    let mut text = format!(
        "{}  [{}]  {} tracks",
        if snapshot.name.is_empty() {
            "(untitled)"
        } else {
            snapshot.name.as_str()
        },
        if snapshot.date.is_empty() {
            "no date"
        } else {
            snapshot.date.as_str()
        },
        rows.len()
    );

    let width = |header: &str, cell: fn(&TrackRow) -> usize| {
        rows.iter().map(cell).max().unwrap_or(0).max(header.len())
    };
    let pos_w = width("#", |r| r.position.to_string().len());
    let artist_w = width("Artist", |r| r.artist.chars().count());
    let song_w = width("Song", |r| r.song.chars().count());

    text.push('\n');
    text.push_str(&format!(
        "{:>pos_w$}  {:<artist_w$}  {:<song_w$}  Playtime",
        "#", "Artist", "Song"
    ));
    for row in &rows {
        text.push('\n');
        text.push_str(&format!(
            "{:>pos_w$}  {:<artist_w$}  {:<song_w$}  {}",
            row.position, row.artist, row.song, row.playtime
        ));
    }
    text
}

/// Run the read-eval loop until `quit` or end of input.
///
/// Operation failures are shown through the observer and do not end the loop.
///
/// # Errors
///
/// Returns an error only if reading input or writing the prompt fails.
pub fn run_interactive<R: BufRead, W: Write>(
    controller: &mut SessionController,
    input: R,
    shell: &mut TerminalShell<W>,
) -> io::Result<()> {
    shell.emit("setlist shell, type 'help' for commands");
    shell.prompt()?;

    for line in input.lines() {
        let line = line?;
        match Command::parse(&line) {
            Ok(Some(Command::Quit)) => break,
            Ok(Some(command)) => execute(controller, command, shell),
            Ok(None) => {}
            Err(e) => shell.emit(&format!("error: {e}")),
        }
        shell.prompt()?;
    }

    debug!("Interactive shell finished");
    Ok(())
}

/// Apply one command. Failures are already reported through `shell`.
pub fn execute<W: Write>(
    controller: &mut SessionController,
    command: Command,
    shell: &mut TerminalShell<W>,
) {
    debug!("Executing {:?}", command);
    let result = match command {
        Command::Open(path) => controller.open(&path, shell).map(drop),
        Command::Name(name) => {
            controller.set_name(&name, shell);
            Ok(())
        }
        Command::Date(date) => {
            controller.set_date(&date, shell);
            Ok(())
        }
        Command::Move { from, to } => controller.move_track(from, to, shell),
        Command::Up(index) => controller.move_up(index, shell),
        Command::Down(index) => controller.move_down(index, shell),
        Command::Save(path) => {
            let path = path.unwrap_or_else(|| controller.default_export_path());
            controller.save(&path, shell)
        }
        Command::Publish(label) => {
            let label = label.unwrap_or_else(|| controller.publish_label().to_string());
            let date = controller.session().date().to_string();
            controller.publish_with(&label, &date, shell)
        }
        Command::Show => {
            shell.print_table(&controller.snapshot());
            Ok(())
        }
        Command::Help => {
            shell.emit(HELP);
            Ok(())
        }
        Command::Quit => Ok(()),
    };

    if let Err(e) = result {
        debug!("Command failed: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use setlist_core::{AppConfig, Playtime, TrackRecord};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn controller_in(dir: &Path) -> SessionController {
        let config = AppConfig {
            library_directory: dir.to_path_buf(),
            ..AppConfig::default()
        };
        SessionController::new(&config)
    }

    fn write_listing(dir: &Path) -> PathBuf {
        let path = dir.join("Ruff Cut 2018-05-12.csv");
        fs::write(
            &path,
            "Artist,Song,Playtime\nA,Song1,00:03:00\nB,Song2,00:04:30\nC,Song3,00:02:15\n",
        )
        .expect("Should write listing");
        path
    }

    fn output_of(shell: TerminalShell<Vec<u8>>) -> String {
        String::from_utf8(shell.into_inner()).expect("Should be UTF-8")
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            Command::parse("open  my set.csv"),
            Ok(Some(Command::Open(PathBuf::from("my set.csv"))))
        );
        assert_eq!(
            Command::parse("move 3 1"),
            Ok(Some(Command::Move { from: 2, to: 0 }))
        );
        assert_eq!(Command::parse("UP 2"), Ok(Some(Command::Up(1))));
        assert_eq!(Command::parse("save"), Ok(Some(Command::Save(None))));
        assert_eq!(
            Command::parse("publish Late Show"),
            Ok(Some(Command::Publish(Some("Late Show".to_string()))))
        );
        assert_eq!(Command::parse("   "), Ok(None));
        assert_eq!(Command::parse("q"), Ok(Some(Command::Quit)));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            Command::parse("frobnicate"),
            Err(CommandError::Unknown(_))
        ));
        assert!(matches!(
            Command::parse("move 1"),
            Err(CommandError::MissingArgument { .. })
        ));
        assert_eq!(
            Command::parse("up 0"),
            Err(CommandError::InvalidPosition("0".to_string()))
        );
        assert!(matches!(
            Command::parse("open"),
            Err(CommandError::MissingArgument { command: "open", .. })
        ));
    }

    #[test]
    fn test_format_table() {
        let snapshot = SessionSnapshot {
            name: "Ruff Cut".to_string(),
            date: "2018-05-12".to_string(),
            source_path: Some(PathBuf::from("set.csv")),
            tracks: vec![
                TrackRecord::new("A", "Song1", Playtime::ZERO),
                TrackRecord::new("Bee", "Song2", Playtime::ZERO),
            ],
        };
        let table = format_table(&snapshot);
        let lines: Vec<_> = table.lines().collect();
        assert_eq!(lines[0], "Ruff Cut  [2018-05-12]  2 tracks");
        assert_eq!(lines[1], "#  Artist  Song   Playtime");
        assert_eq!(lines[2], "1  A       Song1  00:00:00");
        assert_eq!(lines[3], "2  Bee     Song2  00:00:00");
    }

    #[test]
    fn test_format_empty_table() {
        let snapshot = SessionSnapshot {
            name: String::new(),
            date: String::new(),
            source_path: None,
            tracks: Vec::new(),
        };
        assert_eq!(format_table(&snapshot), "(no playlist loaded)");
    }

    #[test]
    fn test_interactive_session_saves_reordered_csv() {
        let dir = TempDir::new().expect("Should create temp dir");
        let listing = write_listing(dir.path());
        let mut controller = controller_in(dir.path());
        let mut shell = TerminalShell::new(Vec::new());

        let script = format!(
            "open {}\nmove 3 1\nname Friday\nsave\nquit\nshow\n",
            listing.display()
        );
        run_interactive(&mut controller, script.as_bytes(), &mut shell)
            .expect("Loop should finish");

        let saved = fs::read_to_string(dir.path().join("Friday.csv")).expect("Should read save");
        assert_eq!(
            saved.lines().nth(1),
            Some("1,C,Song3,00:02:15"),
            "first row should be the moved track"
        );

        let output = output_of(shell);
        assert!(output.contains("loaded 3 tracks"));
        assert!(output.contains("moved 3 -> 1"));
        assert!(output.contains("saved "));
    }

    #[test]
    fn test_default_save_keeps_dots_in_session_name() {
        let input = TempDir::new().expect("Should create input dir");
        let library = TempDir::new().expect("Should create library dir");
        let listing = input.path().join("Ruff Cut vol.2.csv");
        fs::write(&listing, "Artist,Song\nA,Song1\n").expect("Should write listing");
        let mut controller = controller_in(library.path());
        let mut shell = TerminalShell::new(Vec::new());

        execute(&mut controller, Command::Open(listing), &mut shell);
        assert_eq!(controller.session().name(), "Ruff Cut vol.2");
        execute(&mut controller, Command::Save(None), &mut shell);

        let saved = library.path().join("Ruff Cut vol.2.csv");
        assert!(saved.exists());
        assert!(!library.path().join("Ruff Cut vol.csv").exists());
        let content = fs::read_to_string(&saved).expect("Should read save");
        assert!(content.starts_with("position,artist,song,playtime"));
    }

    #[test]
    fn test_default_save_with_blank_name_stays_in_library() {
        let dir = TempDir::new().expect("Should create temp dir");
        let library = dir.path().join("Music");
        fs::create_dir(&library).expect("Should create library");
        let listing = write_listing(dir.path());
        let mut controller = controller_in(&library);
        let mut shell = TerminalShell::new(Vec::new());

        execute(&mut controller, Command::Open(listing), &mut shell);
        execute(&mut controller, Command::Name("  ".to_string()), &mut shell);
        execute(&mut controller, Command::Save(None), &mut shell);

        assert!(library.join("playlist.csv").exists());
        assert!(!dir.path().join("Music.csv").exists());
    }

    #[test]
    fn test_interactive_reports_failures_and_continues() {
        let dir = TempDir::new().expect("Should create temp dir");
        let mut controller = controller_in(dir.path());
        let mut shell = TerminalShell::new(Vec::new());

        let script = "save out.csv\nbogus\nmove 1 2\nhelp\n";
        run_interactive(&mut controller, script.as_bytes(), &mut shell)
            .expect("Loop should finish");

        let output = output_of(shell);
        assert!(output.contains("error: export failed: No playlist loaded"));
        assert!(output.contains("unknown command 'bogus'"));
        assert!(output.contains("error: reorder failed"));
        assert!(output.contains("commands:"));
    }

    #[test]
    fn test_quiet_shell_skips_tables_and_failures() {
        let dir = TempDir::new().expect("Should create temp dir");
        let listing = write_listing(dir.path());
        let mut controller = controller_in(dir.path());
        let mut shell = TerminalShell::new(Vec::new())
            .with_tables(false)
            .with_failures(false);

        execute(&mut controller, Command::Open(listing), &mut shell);
        execute(&mut controller, Command::Move { from: 9, to: 0 }, &mut shell);

        let output = output_of(shell);
        assert!(output.starts_with("loaded 3 tracks"));
        assert!(!output.contains("Artist"));
        assert!(!output.contains("error"));
    }
}
