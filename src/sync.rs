//! Keeps a local copy of one event's repertoire in step with the SheetMusic
//! service.
//!
//! Visibility toggles are optimistic: the local copy changes first, the PATCH
//! goes out second, and a failed PATCH restores the exact value the version
//! had before the toggle. A re-fetch would lose any other local edits.

use crate::api::{FileType, FileUpload, RepertoireApi, UploadedFile};
use crate::error::{ApiError, StoreError};
use crate::models::{Event, Version};
use crate::store::FeaturedEventStore;

/// Local working copy of an event plus the API and featured-id store behind it.
pub struct RepertoireSession<A: RepertoireApi> {
    api: A,
    store: FeaturedEventStore,
    event: Option<Event>,
}

impl<A: RepertoireApi> RepertoireSession<A> {
    pub fn new(api: A, store: FeaturedEventStore) -> Self {
        Self {
            api,
            store,
            event: None,
        }
    }

    pub fn event(&self) -> Option<&Event> {
        self.event.as_ref()
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Load one event by id, replacing the working copy. API errors propagate.
    pub fn fetch_event(&mut self, id: i64) -> Result<&Event, ApiError> {
        let event = self.api.event_detail(id)?;
        tracing::info!("Loaded event {} ({})", event.id, event.title);
        Ok(self.event.insert(event))
    }

    /// Resolve which event the front page shows.
    ///
    /// A persisted featured id wins; an id that no longer parses or resolves
    /// is cleared and resolution falls through to the first upcoming event.
    /// No upcoming events means no front-page event, which is not an error.
    pub fn load_front_page(&mut self) -> Result<Option<&Event>, ApiError> {
        if let Some(raw) = self.featured_id() {
            match raw.parse::<i64>() {
                Ok(id) => match self.api.event_detail(id) {
                    Ok(event) => {
                        tracing::info!("Front page: featured event {}", event.id);
                        self.event = Some(event);
                        return Ok(self.event.as_ref());
                    }
                    Err(e) => {
                        tracing::warn!("Featured event {} no longer resolves: {}", id, e);
                        self.discard_featured();
                    }
                },
                Err(_) => {
                    tracing::warn!("Discarding unparseable featured event id {:?}", raw);
                    self.discard_featured();
                }
            }
        }

        let mut upcoming = self.api.upcoming_events()?;
        if upcoming.is_empty() {
            tracing::info!("Front page: no upcoming events");
            self.event = None;
            return Ok(None);
        }
        let event = upcoming.remove(0);
        tracing::info!("Front page: next upcoming event {}", event.id);
        self.event = Some(event);
        Ok(self.event.as_ref())
    }

    /// Mark an event as the featured one for future front-page loads
    pub fn feature_event(&mut self, id: i64) -> Result<(), StoreError> {
        self.store.set(&id.to_string())
    }

    pub fn unfeature_event(&mut self) -> Result<(), StoreError> {
        self.store.clear()
    }

    /// Persisted featured id; a broken store file reads as no selection
    fn featured_id(&self) -> Option<String> {
        match self.store.get() {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!("Featured event store unreadable: {}", e);
                None
            }
        }
    }

    fn discard_featured(&self) {
        if let Err(e) = self.store.clear() {
            tracing::warn!("Could not clear stale featured event: {}", e);
        }
    }

    /// Versions of the working copy that belong in the public carousel
    pub fn visible_versions(&self) -> Vec<&Version> {
        self.event
            .as_ref()
            .map(Event::visible_versions)
            .unwrap_or_default()
    }

    /// Toggle a version's visibility, optimistically.
    ///
    /// The local copy flips before the PATCH is sent. On failure the version
    /// gets back the exact visibility it had, `None` included, and the error
    /// is returned. Overlapping toggles of the same version are last-write-
    /// wins, each with its own rollback pair.
    pub fn set_version_visibility(
        &mut self,
        version_id: i64,
        visible: bool,
    ) -> Result<(), ApiError> {
        let prior = self
            .event
            .as_mut()
            .and_then(|e| e.version_mut(version_id))
            .map(|v| std::mem::replace(&mut v.is_visible, Some(visible)));

        match self.api.set_version_visibility(version_id, visible) {
            Ok(()) => Ok(()),
            Err(e) => {
                if let Some(prior) = prior {
                    if let Some(v) = self
                        .event
                        .as_mut()
                        .and_then(|ev| ev.version_mut(version_id))
                    {
                        v.is_visible = prior;
                    }
                }
                tracing::warn!("Visibility toggle for version {} failed: {}", version_id, e);
                Err(e)
            }
        }
    }

    /// Merge a completed upload into the working copy.
    ///
    /// Only call this after the service confirmed the upload; merging a
    /// pending upload would show files the service never stored.
    pub fn apply_uploaded_file(
        &mut self,
        version_id: i64,
        upload: &FileUpload,
        uploaded: &UploadedFile,
    ) {
        let Some(url) = uploaded.resolved_url().map(str::to_string) else {
            tracing::warn!("Upload response for version {} had no file URL", version_id);
            return;
        };
        let Some(version) = self
            .event
            .as_mut()
            .and_then(|e| e.version_mut(version_id))
        else {
            return;
        };

        match upload.file_type {
            FileType::Audio => version.audio = Some(url),
            FileType::Image => version.image = Some(url),
            FileType::SheetMusic => {
                if let (Some(tuning), Some(part)) = (upload.tuning, upload.part) {
                    version
                        .sheet_music_files
                        .get_or_insert_with(Default::default)
                        .insert(tuning, part, url);
                    version.sheet_music_count = version.available_sheet_count() as u32;
                } else {
                    tracing::warn!(
                        "Sheet upload for version {} is missing tuning/part metadata",
                        version_id
                    );
                }
            }
        }
    }
}
