use crate::models::Version;

use super::{AudioHandle, AudioOutput, PlaybackState};

/// Owns the current selection and the single live audio handle.
///
/// Selecting a version always stops the previous handle before anything else
/// happens; the playback position of the old version is discarded, not
/// paused-and-resumed. Dropping the controller stops whatever is playing.
pub struct PlaybackController {
    output: Box<dyn AudioOutput>,
    selected: Option<Version>,
    handle: Option<Box<dyn AudioHandle>>,
    state: PlaybackState,
    volume: f32,
}

impl PlaybackController {
    pub fn new(output: Box<dyn AudioOutput>) -> Self {
        Self::with_volume(output, 0.7)
    }

    pub fn with_volume(output: Box<dyn AudioOutput>, volume: f32) -> Self {
        Self {
            output,
            selected: None,
            handle: None,
            state: PlaybackState::Idle,
            volume: volume.clamp(0.0, 1.0),
        }
    }

    /// Select a version and start playing its audio if it has any.
    ///
    /// The previous handle is stopped unconditionally first. Returns as soon
    /// as the play request is issued; playback proceeds (or fails) on the
    /// audio backend's own time.
    pub fn select(&mut self, version: &Version) {
        if let Some(handle) = self.handle.as_mut() {
            handle.stop();
        }
        self.handle = None;
        self.state = PlaybackState::Idle;
        self.selected = Some(version.clone());

        let Some(audio_url) = version.audio.clone() else {
            tracing::debug!("Selected version {} has no audio", version.id);
            return;
        };

        self.state = PlaybackState::Loading;
        match self.output.open(&audio_url) {
            Ok(mut handle) => {
                handle.set_volume(self.volume);
                match handle.play() {
                    Ok(()) => self.state = PlaybackState::Playing,
                    Err(e) => {
                        tracing::warn!("Playback refused for version {}: {}", version.id, e);
                        self.state = PlaybackState::Idle;
                    }
                }
                self.handle = Some(handle);
            }
            Err(e) => {
                tracing::warn!("Could not load audio for version {}: {}", version.id, e);
                self.state = PlaybackState::Idle;
            }
        }
    }

    /// Pause if playing, resume otherwise. No-op without a handle; resume
    /// failures leave the controller not playing.
    pub fn toggle_play_pause(&mut self) {
        let Some(handle) = self.handle.as_mut() else {
            return;
        };

        if self.state == PlaybackState::Playing {
            handle.pause();
            self.state = PlaybackState::Paused;
        } else {
            match handle.play() {
                Ok(()) => self.state = PlaybackState::Playing,
                Err(e) => {
                    tracing::warn!("Resume failed: {}", e);
                    self.state = PlaybackState::Idle;
                }
            }
        }
    }

    /// Rewind to the beginning; starts playing if currently paused or idle.
    /// No-op without a handle.
    pub fn restart(&mut self) {
        let Some(handle) = self.handle.as_mut() else {
            return;
        };

        handle.seek_start();
        if self.state != PlaybackState::Playing {
            match handle.play() {
                Ok(()) => self.state = PlaybackState::Playing,
                Err(e) => {
                    tracing::warn!("Restart failed: {}", e);
                    self.state = PlaybackState::Idle;
                }
            }
        }
    }

    /// Observe handle completion: a stream that played to its end moves the
    /// session back to idle.
    pub fn refresh(&mut self) {
        if self.state == PlaybackState::Playing {
            if let Some(handle) = &self.handle {
                if handle.is_finished() {
                    self.state = PlaybackState::Idle;
                }
            }
        }
    }

    /// Stop playback, keeping the selection
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.as_mut() {
            handle.stop();
        }
        self.state = PlaybackState::Idle;
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        if let Some(handle) = self.handle.as_mut() {
            handle.set_volume(self.volume);
        }
    }

    pub fn selected(&self) -> Option<&Version> {
        self.selected.as_ref()
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }
}

impl Drop for PlaybackController {
    // Mandatory cleanup: no orphaned playback may outlive the controller
    fn drop(&mut self) {
        if let Some(handle) = self.handle.as_mut() {
            handle.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlaybackError;
    use std::cell::RefCell;
    use std::collections::HashSet;
    use std::rc::Rc;

    #[derive(Default)]
    struct FakeBackend {
        log: RefCell<Vec<String>>,
        playing: RefCell<HashSet<String>>,
        fail_play_for: RefCell<HashSet<String>>,
        fail_open_for: RefCell<HashSet<String>>,
        finished: RefCell<HashSet<String>>,
    }

    impl FakeBackend {
        fn log(&self) -> Vec<String> {
            self.log.borrow().clone()
        }

        fn playing_count(&self) -> usize {
            self.playing.borrow().len()
        }
    }

    struct FakeHandle {
        url: String,
        backend: Rc<FakeBackend>,
    }

    impl AudioHandle for FakeHandle {
        fn play(&mut self) -> Result<(), PlaybackError> {
            if self.backend.fail_play_for.borrow().contains(&self.url) {
                self.backend.log.borrow_mut().push(format!("deny:{}", self.url));
                return Err(PlaybackError::PlaybackFailed("autoplay blocked".into()));
            }
            self.backend.playing.borrow_mut().insert(self.url.clone());
            self.backend.log.borrow_mut().push(format!("play:{}", self.url));
            Ok(())
        }

        fn pause(&mut self) {
            self.backend.playing.borrow_mut().remove(&self.url);
            self.backend.log.borrow_mut().push(format!("pause:{}", self.url));
        }

        fn stop(&mut self) {
            self.backend.playing.borrow_mut().remove(&self.url);
            self.backend.log.borrow_mut().push(format!("stop:{}", self.url));
        }

        fn seek_start(&mut self) {
            self.backend.log.borrow_mut().push(format!("seek:{}", self.url));
        }

        fn is_finished(&self) -> bool {
            self.backend.finished.borrow().contains(&self.url)
        }

        fn set_volume(&mut self, _volume: f32) {}
    }

    struct FakeOutput {
        backend: Rc<FakeBackend>,
    }

    impl AudioOutput for FakeOutput {
        fn open(&self, url: &str) -> Result<Box<dyn AudioHandle>, PlaybackError> {
            if self.backend.fail_open_for.borrow().contains(url) {
                return Err(PlaybackError::FetchFailed {
                    url: url.to_string(),
                    source: "unreachable".into(),
                });
            }
            self.backend.log.borrow_mut().push(format!("open:{}", url));
            Ok(Box::new(FakeHandle {
                url: url.to_string(),
                backend: Rc::clone(&self.backend),
            }))
        }
    }

    fn controller() -> (Rc<FakeBackend>, PlaybackController) {
        let backend = Rc::new(FakeBackend::default());
        let output = FakeOutput {
            backend: Rc::clone(&backend),
        };
        (backend, PlaybackController::new(Box::new(output)))
    }

    fn version_with_audio(id: i64, url: &str) -> Version {
        Version {
            id,
            title: String::new(),
            theme_title: format!("Theme {}", id),
            artist: String::new(),
            tonalidad: String::new(),
            tempo: None,
            structure: None,
            description: None,
            order: 0,
            sheet_music_count: 0,
            audio: Some(url.to_string()),
            image: None,
            is_visible: None,
            sheet_music_files: None,
        }
    }

    fn version_without_audio(id: i64) -> Version {
        let mut v = version_with_audio(id, "");
        v.audio = None;
        v
    }

    #[test]
    fn test_select_stops_previous_before_starting_next() {
        let (backend, mut player) = controller();

        player.select(&version_with_audio(1, "a.mp3"));
        player.select(&version_with_audio(2, "b.mp3"));

        assert_eq!(
            backend.log(),
            vec!["open:a.mp3", "play:a.mp3", "stop:a.mp3", "open:b.mp3", "play:b.mp3"]
        );
        assert_eq!(backend.playing_count(), 1);
        assert!(player.is_playing());
        assert_eq!(player.selected().unwrap().id, 2);
    }

    #[test]
    fn test_never_more_than_one_playing() {
        let (backend, mut player) = controller();

        for i in 0..5 {
            player.select(&version_with_audio(i, &format!("{}.mp3", i)));
            assert!(backend.playing_count() <= 1);
        }
        assert_eq!(backend.playing_count(), 1);
    }

    #[test]
    fn test_toggle_and_restart_are_noops_without_selection() {
        let (backend, mut player) = controller();

        player.toggle_play_pause();
        player.restart();
        player.refresh();

        assert!(backend.log().is_empty());
        assert_eq!(player.state(), PlaybackState::Idle);
    }

    #[test]
    fn test_toggle_and_restart_are_noops_without_audio() {
        let (backend, mut player) = controller();

        player.select(&version_without_audio(9));
        player.toggle_play_pause();
        player.restart();

        assert!(backend.log().is_empty());
        assert!(!player.is_playing());
        assert_eq!(player.selected().unwrap().id, 9);
    }

    #[test]
    fn test_toggle_pauses_and_resumes() {
        let (backend, mut player) = controller();

        player.select(&version_with_audio(1, "a.mp3"));
        assert_eq!(player.state(), PlaybackState::Playing);

        player.toggle_play_pause();
        assert_eq!(player.state(), PlaybackState::Paused);
        assert_eq!(backend.playing_count(), 0);

        player.toggle_play_pause();
        assert_eq!(player.state(), PlaybackState::Playing);
        assert_eq!(backend.playing_count(), 1);
    }

    #[test]
    fn test_restart_seeks_and_plays_when_paused() {
        let (backend, mut player) = controller();

        player.select(&version_with_audio(1, "a.mp3"));
        player.toggle_play_pause();
        player.restart();

        let log = backend.log();
        assert_eq!(log.last().unwrap(), "play:a.mp3");
        assert!(log.contains(&"seek:a.mp3".to_string()));
        assert!(player.is_playing());
    }

    #[test]
    fn test_restart_while_playing_only_seeks() {
        let (backend, mut player) = controller();

        player.select(&version_with_audio(1, "a.mp3"));
        player.restart();

        assert_eq!(backend.log(), vec!["open:a.mp3", "play:a.mp3", "seek:a.mp3"]);
        assert!(player.is_playing());
    }

    #[test]
    fn test_denied_play_reduces_to_not_playing() {
        let (backend, mut player) = controller();
        backend.fail_play_for.borrow_mut().insert("a.mp3".to_string());

        player.select(&version_with_audio(1, "a.mp3"));

        assert!(!player.is_playing());
        assert_eq!(player.state(), PlaybackState::Idle);

        // Handle is retained: once the backend allows it, restart works
        backend.fail_play_for.borrow_mut().clear();
        player.restart();
        assert!(player.is_playing());
    }

    #[test]
    fn test_failed_open_leaves_idle_without_panicking() {
        let (backend, mut player) = controller();
        backend.fail_open_for.borrow_mut().insert("a.mp3".to_string());

        player.select(&version_with_audio(1, "a.mp3"));

        assert_eq!(player.state(), PlaybackState::Idle);
        assert!(!player.is_playing());

        // Subsequent operations stay no-ops
        player.toggle_play_pause();
        player.restart();
        assert_eq!(player.state(), PlaybackState::Idle);
    }

    #[test]
    fn test_ended_stream_returns_to_idle() {
        let (backend, mut player) = controller();

        player.select(&version_with_audio(1, "a.mp3"));
        backend.finished.borrow_mut().insert("a.mp3".to_string());

        player.refresh();
        assert_eq!(player.state(), PlaybackState::Idle);
    }

    #[test]
    fn test_drop_stops_active_handle() {
        let (backend, mut player) = controller();

        player.select(&version_with_audio(1, "a.mp3"));
        assert_eq!(backend.playing_count(), 1);

        drop(player);
        assert_eq!(backend.playing_count(), 0);
        assert_eq!(backend.log().last().unwrap(), "stop:a.mp3");
    }
}
