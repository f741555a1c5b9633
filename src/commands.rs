/// Command types for the application
///
/// Commands represent requests to perform actions (imperative).
/// They are executed by the app's command executor.
use std::path::PathBuf;

use crate::models::{Part, Tuning};

/// Application commands
#[derive(Debug, Clone)]
pub enum Command {
    /// Show the front-page event (featured id, else next upcoming)
    FrontPage,

    /// List all upcoming events
    Upcoming,

    /// Show one event with its repertoire
    ShowEvent { id: i64 },

    /// Interactive playback over an event's visible versions
    Play { event_id: Option<i64> },

    /// Pin an event to the front page
    FeatureEvent { id: i64 },

    /// Unpin, falling back to the next upcoming event
    UnfeatureEvent,

    /// Show or hide a version in the public carousel
    SetVisibility { version_id: i64, visible: bool },

    /// Attach a file to a version
    UploadFile {
        version_id: i64,
        path: PathBuf,
        tuning: Option<Tuning>,
        part: Option<Part>,
    },

    /// Remove a file from a version
    DeleteFile { version_id: i64, file_id: i64 },

    /// Open the event's location in Google Maps
    OpenMap { event_id: i64 },
}

/// Result of command execution
#[derive(Debug)]
pub enum CommandResult {
    /// Command executed successfully
    Success,

    /// Command executed with a specific result
    SuccessWithValue(String),

    /// Command failed with an error
    Error(String),
}

impl Command {
    /// Get a human-readable description of the command
    pub fn description(&self) -> String {
        match self {
            Command::FrontPage => "Show front-page event".to_string(),
            Command::Upcoming => "List upcoming events".to_string(),
            Command::ShowEvent { id } => format!("Show event {}", id),
            Command::Play { event_id: Some(id) } => format!("Play event {}", id),
            Command::Play { event_id: None } => "Play front-page event".to_string(),
            Command::FeatureEvent { id } => format!("Feature event {}", id),
            Command::UnfeatureEvent => "Unfeature event".to_string(),
            Command::SetVisibility {
                version_id,
                visible,
            } => {
                if *visible {
                    format!("Show version {}", version_id)
                } else {
                    format!("Hide version {}", version_id)
                }
            }
            Command::UploadFile {
                version_id, path, ..
            } => format!("Upload {} to version {}", path.display(), version_id),
            Command::DeleteFile {
                version_id,
                file_id,
            } => format!("Delete file {} from version {}", file_id, version_id),
            Command::OpenMap { event_id } => format!("Open map for event {}", event_id),
        }
    }
}
