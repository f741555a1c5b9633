//! Command executor tying config, REST client, sync session, and playback
//! together. The interactive play mode is a single-threaded stdin loop; the
//! audio backend runs its own thread, so the prompt stays responsive.

use std::io::{self, BufRead, Write};

use crate::api::{FileUpload, SheetMusicClient};
use crate::carousel::position_of;
use crate::commands::{Command, CommandResult};
use crate::config::Config;
use crate::models::{Event, Version};
use crate::playback::{PlaybackController, RodioOutput};
use crate::store::FeaturedEventStore;
use crate::sync::RepertoireSession;

pub struct App {
    session: RepertoireSession<SheetMusicClient>,
    controller: PlaybackController,
}

impl App {
    pub fn new(config: &Config) -> Self {
        let client = SheetMusicClient::new(config);
        let store = FeaturedEventStore::open_default();
        let session = RepertoireSession::new(client, store);
        let output = RodioOutput::new(config.request_timeout_secs);
        let controller = PlaybackController::with_volume(Box::new(output), config.volume);

        Self {
            session,
            controller,
        }
    }

    pub fn execute(&mut self, command: Command) -> CommandResult {
        tracing::info!("Executing command: {}", command.description());

        match command {
            Command::FrontPage => self.front_page(),
            Command::Upcoming => self.upcoming(),
            Command::ShowEvent { id } => self.show_event(id),
            Command::Play { event_id } => self.play(event_id),
            Command::FeatureEvent { id } => match self.session.feature_event(id) {
                Ok(()) => CommandResult::SuccessWithValue(format!("Featured event {}", id)),
                Err(e) => CommandResult::Error(e.to_string()),
            },
            Command::UnfeatureEvent => match self.session.unfeature_event() {
                Ok(()) => CommandResult::Success,
                Err(e) => CommandResult::Error(e.to_string()),
            },
            Command::SetVisibility {
                version_id,
                visible,
            } => match self.session.set_version_visibility(version_id, visible) {
                Ok(()) => CommandResult::SuccessWithValue(format!(
                    "Version {} is now {}",
                    version_id,
                    if visible { "visible" } else { "hidden" }
                )),
                Err(e) => CommandResult::Error(e.to_string()),
            },
            Command::UploadFile {
                version_id,
                path,
                tuning,
                part,
            } => {
                let mut upload = match FileUpload::from_path(&path) {
                    Ok(upload) => upload,
                    Err(e) => return CommandResult::Error(e.to_string()),
                };
                if let (Some(tuning), Some(part)) = (tuning, part) {
                    upload = upload.with_sheet_metadata(tuning, part);
                }

                match self.session.api().upload_version_file(version_id, &upload) {
                    Ok(uploaded) => {
                        self.session.apply_uploaded_file(version_id, &upload, &uploaded);
                        CommandResult::SuccessWithValue(format!(
                            "Uploaded {} ({})",
                            upload.file_name,
                            upload.file_type.as_str()
                        ))
                    }
                    Err(e) => CommandResult::Error(e.to_string()),
                }
            }
            Command::DeleteFile {
                version_id,
                file_id,
            } => match self.session.api().delete_version_file(version_id, file_id) {
                Ok(()) => CommandResult::Success,
                Err(e) => CommandResult::Error(e.to_string()),
            },
            Command::OpenMap { event_id } => self.open_map(event_id),
        }
    }

    fn front_page(&mut self) -> CommandResult {
        match self.session.load_front_page() {
            Ok(Some(event)) => {
                println!("{}", render_event(event));
                CommandResult::Success
            }
            Ok(None) => CommandResult::SuccessWithValue("No upcoming events".to_string()),
            Err(e) => CommandResult::Error(e.to_string()),
        }
    }

    fn upcoming(&mut self) -> CommandResult {
        match self.session.api().upcoming_events() {
            Ok(events) => {
                if events.is_empty() {
                    return CommandResult::SuccessWithValue("No upcoming events".to_string());
                }
                for event in &events {
                    println!(
                        "  [{}] {} — {} — {}",
                        event.id,
                        event.format_date(),
                        event.title,
                        event.location_line()
                    );
                }
                CommandResult::Success
            }
            Err(e) => CommandResult::Error(e.to_string()),
        }
    }

    fn show_event(&mut self, id: i64) -> CommandResult {
        match self.session.fetch_event(id) {
            Ok(event) => {
                println!("{}", render_event(event));
                CommandResult::Success
            }
            Err(e) => CommandResult::Error(e.to_string()),
        }
    }

    fn open_map(&mut self, event_id: i64) -> CommandResult {
        let event = match self.session.fetch_event(event_id) {
            Ok(event) => event,
            Err(e) => return CommandResult::Error(e.to_string()),
        };

        match event.maps_url() {
            Some(url) => {
                if let Err(e) = open::that(&url) {
                    return CommandResult::Error(format!("Could not open browser: {}", e));
                }
                CommandResult::SuccessWithValue(url)
            }
            None => CommandResult::SuccessWithValue("Event has no location yet".to_string()),
        }
    }

    fn play(&mut self, event_id: Option<i64>) -> CommandResult {
        let loaded = match event_id {
            Some(id) => self.session.fetch_event(id).map(Some),
            None => self.session.load_front_page(),
        };
        let versions: Vec<Version> = match loaded {
            Ok(Some(event)) => {
                println!("{}", render_event(event));
                event.visible_versions().into_iter().cloned().collect()
            }
            Ok(None) => return CommandResult::SuccessWithValue("No upcoming events".to_string()),
            Err(e) => return CommandResult::Error(e.to_string()),
        };

        if versions.is_empty() {
            return CommandResult::SuccessWithValue("Event has no visible versions".to_string());
        }

        let stdin = io::stdin();
        self.play_loop(&versions, &mut stdin.lock());
        CommandResult::Success
    }

    /// Interactive loop: a number selects a version, `p` toggles play/pause,
    /// `r` restarts the current version, `q` quits.
    fn play_loop(&mut self, versions: &[Version], input: &mut dyn BufRead) {
        let mut selected = 0usize;
        self.controller.select(&versions[selected]);

        loop {
            println!("\n{}", render_carousel(versions, selected));
            print!("[1-{}] select | p play/pause | r restart | q quit > ", versions.len());
            let _ = io::stdout().flush();

            let mut line = String::new();
            match input.read_line(&mut line) {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }

            self.controller.refresh();
            match line.trim() {
                "q" => break,
                "p" => self.controller.toggle_play_pause(),
                "r" => self.controller.restart(),
                "" => {}
                other => match other.parse::<usize>() {
                    Ok(n) if n >= 1 && n <= versions.len() => {
                        selected = n - 1;
                        self.controller.select(&versions[selected]);
                        if !versions[selected].has_audio() {
                            println!("  (no audio recorded for this version)");
                        }
                    }
                    _ => println!("  Unrecognized input: {}", other),
                },
            }
        }

        self.controller.stop();
    }
}

/// Multi-line summary of an event and its visible repertoire
fn render_event(event: &Event) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", event.title));
    out.push_str(&format!("  {} — {}\n", event.format_date(), event.location_line()));
    if let Some(description) = &event.description {
        out.push_str(&format!("  {}\n", description));
    }

    let versions = event.visible_versions();
    if versions.is_empty() {
        out.push_str("  (no repertoire published yet)");
        return out;
    }

    out.push_str(&format!("  Repertoire ({} versions):\n", versions.len()));
    for (i, v) in versions.iter().enumerate() {
        out.push_str(&format!(
            "    {}. {} — {} [{}]{}{}\n",
            i + 1,
            v.theme_title,
            v.artist,
            v.tonalidad,
            if v.has_audio() { " ♪" } else { "" },
            if v.available_sheet_count() > 0 {
                format!(" ({} sheets)", v.available_sheet_count())
            } else {
                String::new()
            },
        ));
    }
    out
}

/// Text rendering of the carousel: cards indent with their offset band and
/// the selected one carries the marker.
fn render_carousel(versions: &[Version], selected: usize) -> String {
    let mut out = String::new();
    for (i, v) in versions.iter().enumerate() {
        let transform = position_of(i, selected, false);
        let indent = (transform.offset.abs() / 100.0) as usize;
        let marker = if transform.band() == 0 { "▶" } else { " " };
        out.push_str(&format!(
            "{} {}{}. {}\n",
            marker,
            "  ".repeat(indent),
            i + 1,
            v.theme_title
        ));
    }
    out.pop();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EventStatus, EventType, Repertoire};

    fn version(id: i64, theme: &str, is_visible: Option<bool>) -> Version {
        Version {
            id,
            title: String::new(),
            theme_title: theme.to_string(),
            artist: "Artista".to_string(),
            tonalidad: "F Major".to_string(),
            tempo: None,
            structure: None,
            description: None,
            order: id,
            sheet_music_count: 0,
            audio: None,
            image: None,
            is_visible,
            sheet_music_files: None,
        }
    }

    fn event(versions: Vec<Version>) -> Event {
        Event {
            id: 1,
            title: "Jam de Vientos — Edición 12".to_string(),
            slug: None,
            event_type: EventType::Concert,
            status: EventStatus::Confirmed,
            description: None,
            start_datetime: "2024-09-20T21:00:00-03:00".parse().unwrap(),
            end_datetime: None,
            location: None,
            location_name: Some("Club Social".to_string()),
            location_city: Some("San Isidro".to_string()),
            repertoire: Some(Repertoire {
                id: 1,
                name: "Set".to_string(),
                description: None,
                versions,
            }),
            is_public: true,
            price: None,
            is_upcoming: Some(true),
            is_ongoing: None,
        }
    }

    #[test]
    fn test_render_event_lists_only_visible_versions() {
        let rendered = render_event(&event(vec![
            version(1, "Caravan", None),
            version(2, "Moanin'", Some(false)),
        ]));

        assert!(rendered.contains("Jam de Vientos — Edición 12"));
        assert!(rendered.contains("Club Social, San Isidro"));
        assert!(rendered.contains("1. Caravan"));
        assert!(!rendered.contains("Moanin'"));
    }

    #[test]
    fn test_render_event_without_repertoire() {
        let mut e = event(vec![]);
        e.repertoire = None;
        assert!(render_event(&e).contains("no repertoire published yet"));
    }

    #[test]
    fn test_render_carousel_marks_selected() {
        let versions = vec![
            version(1, "Caravan", None),
            version(2, "Sir Duke", None),
            version(3, "Chameleon", None),
        ];
        let rendered = render_carousel(&versions, 1);
        let lines: Vec<&str> = rendered.lines().collect();

        assert!(lines[1].starts_with('▶'));
        assert!(!lines[0].starts_with('▶'));
        assert!(!lines[2].starts_with('▶'));
        // Outer cards indent with their offset band
        assert!(lines[0].contains("    1. Caravan"));
        assert!(lines[2].contains("    3. Chameleon"));
    }
}
