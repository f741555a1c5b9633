use std::path::PathBuf;

use anyhow::Context;

use jamdevientos::app::App;
use jamdevientos::commands::{Command, CommandResult};
use jamdevientos::config::Config;
use jamdevientos::models::{Part, Tuning};
use jamdevientos::AppResult;

/// Initialize tracing with file rotation
///
/// Logs are written to the platform config directory under
/// `jamdevientos/logs/`, one file per day. Debug builds also log to the
/// console; release builds keep the console for command output only.
fn initialize_tracing() {
    use tracing_appender::rolling;
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let log_dir = Config::app_dir().join("logs");
    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        eprintln!("Warning: Failed to create log directory: {}", e);
    }

    let file_appender = rolling::daily(&log_dir, "jamdevientos.log");

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true);

    #[cfg(debug_assertions)]
    {
        let console_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .with(console_layer)
            .init();
    }

    #[cfg(not(debug_assertions))]
    {
        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();
    }

    tracing::info!("Log directory: {}", log_dir.display());
}

fn main() {
    initialize_tracing();
    tracing::info!("Starting jamdevientos v{}", env!("CARGO_PKG_VERSION"));

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match parse_args(&args) {
        Ok(command) => command,
        Err(message) => {
            eprintln!("✗ {}", message);
            eprintln!();
            print_usage();
            std::process::exit(2);
        }
    };

    println!("===========================================");
    println!("  Jam de Vientos - Repertoire Console");
    println!("===========================================\n");

    if let Err(e) = run(command) {
        eprintln!("\n✗ {:#}", e);
        std::process::exit(1);
    }
}

fn run(command: Command) -> AppResult<()> {
    let config = Config::load().context("Failed to load configuration")?;
    println!("✓ Configuration loaded");
    println!("  API: {}", config.api_base_url);
    println!("  Collective: {}", config.collective);
    println!("  Config dir: {}\n", Config::config_dir_display());

    let mut app = App::new(&config);
    match app.execute(command) {
        CommandResult::Success => {
            println!("\n✓ Done");
            Ok(())
        }
        CommandResult::SuccessWithValue(value) => {
            println!("\n✓ {}", value);
            Ok(())
        }
        CommandResult::Error(message) => Err(anyhow::anyhow!(message)),
    }
}

fn print_usage() {
    eprintln!("Usage: jamdevientos <command>");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  front                          Show the front-page event");
    eprintln!("  upcoming                       List upcoming events");
    eprintln!("  show <event-id>                Show one event with repertoire");
    eprintln!("  play [event-id]                Interactive playback (front page if omitted)");
    eprintln!("  map <event-id>                 Open the event location in Google Maps");
    eprintln!("  feature <event-id>             Pin an event to the front page");
    eprintln!("  unfeature                      Unpin the featured event");
    eprintln!("  show-version <version-id>      Make a version visible in the carousel");
    eprintln!("  hide-version <version-id>      Hide a version from the carousel");
    eprintln!("  upload <version-id> <file> [tuning part]");
    eprintln!("                                 Attach a file; sheets need tuning and part");
    eprintln!("  delete-file <version-id> <file-id>");
    eprintln!();
    eprintln!("Tunings: Bb Eb C F C_BASS");
    eprintln!("Parts:   MELODIA_PRINCIPAL ARMONIA BAJO");
}

fn parse_args(args: &[String]) -> Result<Command, String> {
    let mut iter = args.iter();
    let Some(command) = iter.next() else {
        return Ok(Command::FrontPage);
    };

    match command.as_str() {
        "front" => Ok(Command::FrontPage),
        "upcoming" => Ok(Command::Upcoming),
        "show" => Ok(Command::ShowEvent {
            id: parse_id(iter.next(), "event id")?,
        }),
        "play" => Ok(Command::Play {
            event_id: iter.next().map(|raw| parse_id(Some(raw), "event id")).transpose()?,
        }),
        "map" => Ok(Command::OpenMap {
            event_id: parse_id(iter.next(), "event id")?,
        }),
        "feature" => Ok(Command::FeatureEvent {
            id: parse_id(iter.next(), "event id")?,
        }),
        "unfeature" => Ok(Command::UnfeatureEvent),
        "show-version" => Ok(Command::SetVisibility {
            version_id: parse_id(iter.next(), "version id")?,
            visible: true,
        }),
        "hide-version" => Ok(Command::SetVisibility {
            version_id: parse_id(iter.next(), "version id")?,
            visible: false,
        }),
        "upload" => {
            let version_id = parse_id(iter.next(), "version id")?;
            let path = iter
                .next()
                .map(PathBuf::from)
                .ok_or_else(|| "Missing file path".to_string())?;
            let tuning = iter.next().map(|raw| parse_tuning(raw)).transpose()?;
            let part = iter.next().map(|raw| parse_part(raw)).transpose()?;
            if tuning.is_some() != part.is_some() {
                return Err("Sheet uploads need both tuning and part".to_string());
            }
            Ok(Command::UploadFile {
                version_id,
                path,
                tuning,
                part,
            })
        }
        "delete-file" => Ok(Command::DeleteFile {
            version_id: parse_id(iter.next(), "version id")?,
            file_id: parse_id(iter.next(), "file id")?,
        }),
        other => Err(format!("Unknown command: {}", other)),
    }
}

fn parse_id(raw: Option<&String>, what: &str) -> Result<i64, String> {
    let raw = raw.ok_or_else(|| format!("Missing {}", what))?;
    raw.parse()
        .map_err(|_| format!("Invalid {}: {}", what, raw))
}

fn parse_tuning(raw: &str) -> Result<Tuning, String> {
    Tuning::ALL
        .into_iter()
        .find(|t| t.wire_name().eq_ignore_ascii_case(raw))
        .ok_or_else(|| format!("Unknown tuning: {}", raw))
}

fn parse_part(raw: &str) -> Result<Part, String> {
    Part::ALL
        .into_iter()
        .find(|p| p.wire_name().eq_ignore_ascii_case(raw))
        .ok_or_else(|| format!("Unknown part: {}", raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_no_args_is_front_page() {
        assert!(matches!(parse_args(&[]), Ok(Command::FrontPage)));
    }

    #[test]
    fn test_parse_show_and_play() {
        assert!(matches!(
            parse_args(&args(&["show", "12"])),
            Ok(Command::ShowEvent { id: 12 })
        ));
        assert!(matches!(
            parse_args(&args(&["play"])),
            Ok(Command::Play { event_id: None })
        ));
        assert!(matches!(
            parse_args(&args(&["play", "3"])),
            Ok(Command::Play { event_id: Some(3) })
        ));
    }

    #[test]
    fn test_parse_visibility_commands() {
        assert!(matches!(
            parse_args(&args(&["hide-version", "7"])),
            Ok(Command::SetVisibility {
                version_id: 7,
                visible: false
            })
        ));
        assert!(parse_args(&args(&["show-version", "x"])).is_err());
    }

    #[test]
    fn test_parse_upload_with_sheet_metadata() {
        let command = parse_args(&args(&["upload", "7", "melody.pdf", "bb", "armonia"])).unwrap();
        match command {
            Command::UploadFile {
                version_id,
                path,
                tuning,
                part,
            } => {
                assert_eq!(version_id, 7);
                assert_eq!(path, PathBuf::from("melody.pdf"));
                assert_eq!(tuning, Some(Tuning::Bb));
                assert_eq!(part, Some(Part::Harmony));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_upload_rejects_half_metadata() {
        assert!(parse_args(&args(&["upload", "7", "melody.pdf", "bb"])).is_err());
    }

    #[test]
    fn test_unknown_command() {
        assert!(parse_args(&args(&["dance"])).is_err());
    }
}
