//! Domain types mirroring the SheetMusic service's JSON contract.
//!
//! The wire names (`tonalidad`, `C_BASS`, `MELODIA_PRINCIPAL`, ...) are the
//! service's own and must not be renamed.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use url::Url;

/// Instrument tuning a sheet-music part is written for.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Tuning {
    Bb,
    Eb,
    C,
    F,
    #[serde(rename = "C_BASS")]
    CBass,
}

impl Tuning {
    pub const ALL: [Tuning; 5] = [Tuning::Bb, Tuning::Eb, Tuning::C, Tuning::F, Tuning::CBass];

    /// Name used on the wire and in upload form fields
    pub fn wire_name(&self) -> &'static str {
        match self {
            Tuning::Bb => "Bb",
            Tuning::Eb => "Eb",
            Tuning::C => "C",
            Tuning::F => "F",
            Tuning::CBass => "C_BASS",
        }
    }

    /// Display label shown to musicians
    pub fn label(&self) -> &'static str {
        match self {
            Tuning::Bb => "Bb (Trompeta, Tenor Sax, Clarinete)",
            Tuning::Eb => "Eb (Alto Sax, Barítono)",
            Tuning::C => "C (Flauta, Oboe)",
            Tuning::F => "F (Corno)",
            Tuning::CBass => "Clave de Fa (Trombón, Tuba, Fagot)",
        }
    }
}

/// Which line of the arrangement a sheet covers.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Part {
    #[serde(rename = "MELODIA_PRINCIPAL")]
    Melody,
    #[serde(rename = "ARMONIA")]
    Harmony,
    #[serde(rename = "BAJO")]
    Bass,
}

impl Part {
    pub const ALL: [Part; 3] = [Part::Melody, Part::Harmony, Part::Bass];

    /// Name used on the wire and in upload form fields
    pub fn wire_name(&self) -> &'static str {
        match self {
            Part::Melody => "MELODIA_PRINCIPAL",
            Part::Harmony => "ARMONIA",
            Part::Bass => "BAJO",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Part::Melody => "Melodía Principal",
            Part::Harmony => "Armonía/Contrapunto",
            Part::Bass => "Línea de Bajo",
        }
    }
}

/// Sheet-music availability per (tuning, part) pair. Absent entries mean no
/// file has been uploaded for that combination.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SheetMusicFiles(pub BTreeMap<Tuning, BTreeMap<Part, String>>);

impl SheetMusicFiles {
    pub fn url(&self, tuning: Tuning, part: Part) -> Option<&str> {
        self.0
            .get(&tuning)
            .and_then(|parts| parts.get(&part))
            .map(String::as_str)
    }

    /// Total number of uploaded sheets across all combinations
    pub fn count(&self) -> usize {
        self.0.values().map(BTreeMap::len).sum()
    }

    pub fn insert(&mut self, tuning: Tuning, part: Part, file_url: String) {
        self.0.entry(tuning).or_default().insert(part, file_url);
    }
}

/// A playable version of a theme within a repertoire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Version {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub theme_title: String,
    #[serde(default)]
    pub artist: String,
    /// Musical key, opaque display string
    #[serde(default)]
    pub tonalidad: String,
    /// Tempo label, opaque display string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tempo: Option<String>,
    /// Song structure notes, opaque display string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structure: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub order: i64,
    #[serde(default)]
    pub sheet_music_count: u32,
    #[serde(default)]
    pub audio: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    /// Missing means visible; only an explicit `false` hides the version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_visible: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet_music_files: Option<SheetMusicFiles>,
}

impl Version {
    /// Whether the version belongs in the public carousel.
    /// Default-visible unless explicitly hidden.
    pub fn is_public(&self) -> bool {
        self.is_visible != Some(false)
    }

    pub fn has_audio(&self) -> bool {
        self.audio.is_some()
    }

    pub fn sheet_music_url(&self, tuning: Tuning, part: Part) -> Option<&str> {
        self.sheet_music_files
            .as_ref()
            .and_then(|files| files.url(tuning, part))
    }

    /// Download is only offered when a file exists for the combination
    pub fn has_sheet_music(&self, tuning: Tuning, part: Part) -> bool {
        self.sheet_music_url(tuning, part).is_some()
    }

    pub fn available_sheet_count(&self) -> usize {
        self.sheet_music_files
            .as_ref()
            .map(SheetMusicFiles::count)
            .unwrap_or(0)
    }

    /// Display label, matching the public page's rendering
    pub fn version_label(&self) -> String {
        if self.title.is_empty() {
            "Versión estándar".to_string()
        } else {
            format!("Versión {}", self.title)
        }
    }
}

/// Ordered collection of versions belonging to one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repertoire {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub versions: Vec<Version>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub country: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    Concert,
    Rehearsal,
    Recording,
    Workshop,
    Other,
}

// Manual decode: event types the service adds later must not break the feed
impl<'de> Deserialize<'de> for EventType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(match raw.as_str() {
            "CONCERT" => EventType::Concert,
            "REHEARSAL" => EventType::Rehearsal,
            "RECORDING" => EventType::Recording,
            "WORKSHOP" => EventType::Workshop,
            _ => EventType::Other,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventStatus {
    Draft,
    Confirmed,
    Cancelled,
    Completed,
}

fn default_true() -> bool {
    true
}

/// A scheduled occurrence (concert, rehearsal, ...) owning at most one
/// repertoire. Fetched read-only from the SheetMusic service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    pub event_type: EventType,
    pub status: EventStatus,
    #[serde(default)]
    pub description: Option<String>,
    pub start_datetime: DateTime<FixedOffset>,
    #[serde(default)]
    pub end_datetime: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub location_name: Option<String>,
    #[serde(default)]
    pub location_city: Option<String>,
    #[serde(default)]
    pub repertoire: Option<Repertoire>,
    #[serde(default = "default_true")]
    pub is_public: bool,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub is_upcoming: Option<bool>,
    #[serde(default)]
    pub is_ongoing: Option<bool>,
}

impl Event {
    /// Versions that belong in the public carousel, in repertoire order
    pub fn visible_versions(&self) -> Vec<&Version> {
        self.repertoire
            .iter()
            .flat_map(|r| r.versions.iter())
            .filter(|v| v.is_public())
            .collect()
    }

    pub fn version(&self, version_id: i64) -> Option<&Version> {
        self.repertoire
            .as_ref()
            .and_then(|r| r.versions.iter().find(|v| v.id == version_id))
    }

    pub fn version_mut(&mut self, version_id: i64) -> Option<&mut Version> {
        self.repertoire
            .as_mut()
            .and_then(|r| r.versions.iter_mut().find(|v| v.id == version_id))
    }

    /// Google Maps search link. The structured location wins over the flat
    /// name/city pair; with neither there is no link.
    pub fn maps_url(&self) -> Option<String> {
        let query = if let Some(loc) = &self.location {
            format!("{}, {}, {}, {}", loc.name, loc.address, loc.city, loc.country)
        } else {
            match (&self.location_name, &self.location_city) {
                (Some(name), Some(city)) => format!("{}, {}", name, city),
                _ => return None,
            }
        };

        Url::parse_with_params(
            "https://www.google.com/maps/search/",
            [("api", "1"), ("query", query.as_str())],
        )
        .ok()
        .map(|u| u.to_string())
    }

    /// Human-readable location line for the header
    pub fn location_line(&self) -> String {
        match (&self.location_name, &self.location_city) {
            (Some(name), Some(city)) => format!("{}, {}", name, city),
            _ => "Por confirmar".to_string(),
        }
    }

    pub fn format_date(&self) -> String {
        self.start_datetime.format("%Y-%m-%d %H:%M").to_string()
    }
}

/// Listing endpoints answer either a bare array of events or a page object
/// with an `events` field. Decoded once here; anything else is a decode error.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EventsPayload {
    Page {
        events: Vec<Event>,
        #[serde(default)]
        total: Option<u64>,
    },
    List(Vec<Event>),
}

impl EventsPayload {
    pub fn into_events(self) -> Vec<Event> {
        match self {
            EventsPayload::Page { events, .. } => events,
            EventsPayload::List(events) => events,
        }
    }
}
