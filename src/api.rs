//! Blocking client for the SheetMusic REST service.
//!
//! All requests go through one `ureq` agent with a per-request timeout.
//! Listing endpoints are decoded through [`EventsPayload`] so shape handling
//! happens once, at this boundary.

use std::io::Read;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::ApiError;
use crate::models::{Event, EventsPayload, Part, Tuning, Version};

/// The subset of the service the sync client depends on. Lets tests drive
/// the sync logic without a live service.
pub trait RepertoireApi {
    fn upcoming_events(&self) -> Result<Vec<Event>, ApiError>;
    fn event_detail(&self, id: i64) -> Result<Event, ApiError>;
    fn set_version_visibility(&self, version_id: i64, visible: bool) -> Result<(), ApiError>;
}

/// Partial update for PATCH `versions/{id}/`. Only set fields are sent.
#[derive(Debug, Clone, Default, Serialize)]
pub struct VersionUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tonalidad: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_visible: Option<bool>,
}

/// Kind of file attached to a version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Image,
    Audio,
    SheetMusic,
}

impl FileType {
    /// Wire value for the `file_type` form field
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Image => "image",
            FileType::Audio => "audio",
            FileType::SheetMusic => "sheet_music",
        }
    }

    /// Infer the kind from the file name extension. Unknown extensions fall
    /// back to sheet music, matching the original upload flow.
    pub fn from_name(name: &str) -> FileType {
        let extension = name
            .rsplit('.')
            .next()
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "jpg" | "jpeg" | "png" | "gif" | "bmp" | "webp" | "svg" => FileType::Image,
            "mp3" | "wav" | "m4a" | "ogg" | "aac" | "flac" => FileType::Audio,
            _ => FileType::SheetMusic,
        }
    }

    fn content_type(&self, name: &str) -> &'static str {
        let lower = name.to_ascii_lowercase();
        match self {
            FileType::Image if lower.ends_with(".png") => "image/png",
            FileType::Image if lower.ends_with(".svg") => "image/svg+xml",
            FileType::Image => "image/jpeg",
            FileType::Audio if lower.ends_with(".wav") => "audio/wav",
            FileType::Audio if lower.ends_with(".ogg") => "audio/ogg",
            FileType::Audio => "audio/mpeg",
            FileType::SheetMusic if lower.ends_with(".pdf") => "application/pdf",
            FileType::SheetMusic => "application/octet-stream",
        }
    }
}

/// One file to attach to a version via POST `versions/{id}/files/`.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub file_type: FileType,
    pub score_type: Option<String>,
    pub tuning: Option<Tuning>,
    pub part: Option<Part>,
}

impl FileUpload {
    /// Read a local file, inferring the file type from its extension
    pub fn from_path(path: &Path) -> Result<Self, ApiError> {
        let bytes = std::fs::read(path).map_err(|e| ApiError::UploadRead {
            path: path.display().to_string(),
            source: e,
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let file_type = FileType::from_name(&file_name);

        Ok(Self {
            file_name,
            bytes,
            file_type,
            score_type: None,
            tuning: None,
            part: None,
        })
    }

    pub fn with_sheet_metadata(mut self, tuning: Tuning, part: Part) -> Self {
        self.tuning = Some(tuning);
        self.part = Some(part);
        self
    }
}

/// Server record for an uploaded file.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadedFile {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub file_type: Option<String>,
}

impl UploadedFile {
    /// The service has answered with either `url` or `file_url`
    pub fn resolved_url(&self) -> Option<&str> {
        self.url.as_deref().or(self.file_url.as_deref())
    }
}

/// Client for the SheetMusic service.
pub struct SheetMusicClient {
    agent: ureq::Agent,
    base_url: String,
    collective: String,
}

impl SheetMusicClient {
    pub fn new(config: &Config) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build();

        Self {
            agent,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            collective: config.collective.clone(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1/{}", self.base_url, path)
    }

    fn events_url(&self, suffix: &str) -> String {
        self.url(&format!("events/{}/{}", self.collective, suffix))
    }

    fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        tracing::debug!("GET {}", url);
        let response = self.agent.get(url).call()?;
        response.into_json().map_err(|e| ApiError::Decode {
            url: url.to_string(),
            source: e,
        })
    }

    /// List all public events
    pub fn list_events(&self) -> Result<Vec<Event>, ApiError> {
        let url = self.events_url("");
        let payload: EventsPayload = self.get_json(&url)?;
        Ok(payload.into_events())
    }

    /// Upcoming events with embedded repertoires
    pub fn upcoming_events(&self) -> Result<Vec<Event>, ApiError> {
        let url = self.events_url("upcoming/");
        let payload: EventsPayload = self.get_json(&url)?;
        Ok(payload.into_events())
    }

    /// Event detail with repertoire
    pub fn event_detail(&self, id: i64) -> Result<Event, ApiError> {
        let url = self.events_url(&format!("{}/", id));
        self.get_json(&url)
    }

    /// Complete repertoire for a specific event
    pub fn event_repertoire(&self, id: i64) -> Result<Event, ApiError> {
        let url = self.events_url(&format!("{}/repertoire/", id));
        self.get_json(&url)
    }

    /// Look an event up by its slug
    pub fn event_by_slug(&self, slug: &str) -> Result<Event, ApiError> {
        let url = self.events_url("by-slug/");
        tracing::debug!("GET {} slug={}", url, slug);
        let response = self.agent.get(&url).query("slug", slug).call()?;
        response.into_json().map_err(|e| ApiError::Decode {
            url,
            source: e,
        })
    }

    /// General field update on a version (admin only)
    pub fn update_version(
        &self,
        version_id: i64,
        update: &VersionUpdate,
    ) -> Result<Version, ApiError> {
        let url = self.url(&format!("versions/{}/", version_id));
        tracing::debug!("PATCH {}", url);
        let response = self.agent.request("PATCH", &url).send_json(update)?;
        response.into_json().map_err(|e| ApiError::Decode {
            url,
            source: e,
        })
    }

    /// Flip a version's carousel visibility (admin only)
    pub fn patch_version_visibility(
        &self,
        version_id: i64,
        visible: bool,
    ) -> Result<(), ApiError> {
        let url = self.url(&format!("versions/{}/", version_id));
        tracing::info!("PATCH {} is_visible={}", url, visible);
        self.agent
            .request("PATCH", &url)
            .send_json(serde_json::json!({ "is_visible": visible }))?;
        Ok(())
    }

    /// Attach a file to a version (admin only)
    pub fn upload_version_file(
        &self,
        version_id: i64,
        upload: &FileUpload,
    ) -> Result<UploadedFile, ApiError> {
        let url = self.url(&format!("versions/{}/files/", version_id));
        let boundary = multipart_boundary();
        let body = multipart_body(&boundary, upload);

        tracing::info!(
            "POST {} ({}, {} bytes)",
            url,
            upload.file_type.as_str(),
            upload.bytes.len()
        );
        let response = self
            .agent
            .post(&url)
            .set(
                "Content-Type",
                &format!("multipart/form-data; boundary={}", boundary),
            )
            .send_bytes(&body)?;
        response.into_json().map_err(|e| ApiError::Decode {
            url,
            source: e,
        })
    }

    /// Remove a file from a version (admin only)
    pub fn delete_version_file(&self, version_id: i64, file_id: i64) -> Result<(), ApiError> {
        let url = self.url(&format!("versions/{}/files/{}/", version_id, file_id));
        tracing::info!("DELETE {}", url);
        self.agent.delete(&url).call()?;
        Ok(())
    }

    /// Download a media file (sheet PDF, audio). Relative URLs from the
    /// service are resolved against the base URL.
    pub fn fetch_file(&self, file_url: &str) -> Result<Vec<u8>, ApiError> {
        let url = if file_url.starts_with("http://") || file_url.starts_with("https://") {
            file_url.to_string()
        } else {
            format!("{}/{}", self.base_url, file_url.trim_start_matches('/'))
        };

        tracing::debug!("GET {}", url);
        let response = self.agent.get(&url).call()?;
        let mut bytes = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut bytes)
            .map_err(|e| ApiError::Decode {
                url,
                source: e,
            })?;
        Ok(bytes)
    }
}

impl RepertoireApi for SheetMusicClient {
    fn upcoming_events(&self) -> Result<Vec<Event>, ApiError> {
        SheetMusicClient::upcoming_events(self)
    }

    fn event_detail(&self, id: i64) -> Result<Event, ApiError> {
        SheetMusicClient::event_detail(self, id)
    }

    fn set_version_visibility(&self, version_id: i64, visible: bool) -> Result<(), ApiError> {
        self.patch_version_visibility(version_id, visible)
    }
}

fn multipart_boundary() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    format!("----JamDeVientosBoundary{:x}", nanos)
}

/// Assemble a multipart/form-data body matching what the admin dashboard's
/// FormData submission sends: the file part first, then `file_type`, then any
/// sheet metadata fields.
fn multipart_body(boundary: &str, upload: &FileUpload) -> Vec<u8> {
    let mut body = Vec::with_capacity(upload.bytes.len() + 512);

    let mut push_text = |body: &mut Vec<u8>, name: &str, value: &str| {
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
        );
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    };

    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
            upload.file_name
        )
        .as_bytes(),
    );
    body.extend_from_slice(
        format!(
            "Content-Type: {}\r\n\r\n",
            upload.file_type.content_type(&upload.file_name)
        )
        .as_bytes(),
    );
    body.extend_from_slice(&upload.bytes);
    body.extend_from_slice(b"\r\n");

    push_text(&mut body, "file_type", upload.file_type.as_str());
    if let Some(score_type) = &upload.score_type {
        push_text(&mut body, "score_type", score_type);
    }
    if let Some(tuning) = upload.tuning {
        push_text(&mut body, "tuning", tuning.wire_name());
    }
    if let Some(part) = upload.part {
        push_text(&mut body, "part", part.wire_name());
    }

    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());
    body
}
