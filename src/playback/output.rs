use std::io::Read;
use std::sync::Arc;
use std::time::Duration;

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};

use crate::error::PlaybackError;

use super::{AudioHandle, AudioOutput};

/// Rodio-backed audio output.
///
/// `open` downloads the full stream up front and verifies it decodes before
/// handing back a handle, so later play/restart calls work from memory and
/// cannot hit the network.
pub struct RodioOutput {
    agent: ureq::Agent,
}

impl RodioOutput {
    pub fn new(timeout_secs: u64) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(timeout_secs))
            .build();
        Self { agent }
    }

    fn fetch(&self, url: &str) -> Result<Vec<u8>, PlaybackError> {
        if url.starts_with("http://") || url.starts_with("https://") {
            let response = self.agent.get(url).call().map_err(|e| PlaybackError::FetchFailed {
                url: url.to_string(),
                source: Box::new(e),
            })?;
            let mut bytes = Vec::new();
            response
                .into_reader()
                .read_to_end(&mut bytes)
                .map_err(|e| PlaybackError::FetchFailed {
                    url: url.to_string(),
                    source: Box::new(e),
                })?;
            Ok(bytes)
        } else {
            std::fs::read(url).map_err(|e| PlaybackError::FetchFailed {
                url: url.to_string(),
                source: Box::new(e),
            })
        }
    }
}

impl AudioOutput for RodioOutput {
    fn open(&self, url: &str) -> Result<Box<dyn AudioHandle>, PlaybackError> {
        let bytes = self.fetch(url)?;
        tracing::debug!("Fetched {} bytes of audio from {}", bytes.len(), url);

        let data = Arc::new(bytes);

        // Verify the audio can be decoded before committing to a handle
        let cursor = std::io::Cursor::new((*data).clone());
        let decoder = Decoder::new(cursor).map_err(|e| PlaybackError::DecodeFailed(Box::new(e)))?;
        drop(decoder);

        let (stream, stream_handle) = OutputStream::try_default()
            .map_err(|e| PlaybackError::StreamInitFailed(Box::new(e)))?;
        let sink = Sink::try_new(&stream_handle)
            .map_err(|e| PlaybackError::StreamInitFailed(Box::new(e)))?;

        Ok(Box::new(RodioHandle {
            _stream: stream,
            stream_handle,
            sink,
            data,
            volume: 1.0,
        }))
    }
}

/// One decoded stream and the sink playing it. The `OutputStream` must stay
/// alive for as long as the sink, hence the `_stream` field.
struct RodioHandle {
    _stream: OutputStream,
    stream_handle: OutputStreamHandle,
    sink: Sink,
    data: Arc<Vec<u8>>,
    volume: f32,
}

impl RodioHandle {
    fn append_from_start(&self) -> Result<(), PlaybackError> {
        let cursor = std::io::Cursor::new((*self.data).clone());
        let source = Decoder::new(cursor).map_err(|e| PlaybackError::DecodeFailed(Box::new(e)))?;
        self.sink.append(source);
        Ok(())
    }
}

impl AudioHandle for RodioHandle {
    fn play(&mut self) -> Result<(), PlaybackError> {
        // A stopped or drained sink has nothing queued; refill from the start
        if self.sink.empty() {
            self.append_from_start()?;
        }
        self.sink.set_volume(self.volume);
        self.sink.play();
        Ok(())
    }

    fn pause(&mut self) {
        self.sink.pause();
    }

    fn stop(&mut self) {
        self.sink.stop();
    }

    fn seek_start(&mut self) {
        let was_paused = self.sink.is_paused();

        // Rodio has no rewind; replace the sink and requeue from byte zero
        self.sink.stop();
        match Sink::try_new(&self.stream_handle) {
            Ok(sink) => self.sink = sink,
            Err(e) => {
                tracing::warn!("Could not recreate audio sink: {}", e);
                return;
            }
        }
        if let Err(e) = self.append_from_start() {
            tracing::warn!("Could not requeue audio: {}", e);
            return;
        }
        self.sink.set_volume(self.volume);
        if was_paused {
            self.sink.pause();
        } else {
            self.sink.play();
        }
    }

    fn is_finished(&self) -> bool {
        self.sink.empty()
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        self.sink.set_volume(self.volume);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Rodio needs actual audio hardware, so handle behavior is covered by
    // the controller tests against fakes. Here we only cover the fetch path.

    #[test]
    fn test_fetch_reads_local_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp3");
        std::fs::write(&path, b"not really mp3").unwrap();

        let output = RodioOutput::new(5);
        let bytes = output.fetch(path.to_str().unwrap()).unwrap();
        assert_eq!(bytes, b"not really mp3");
    }

    #[test]
    fn test_fetch_missing_file_is_fetch_failed() {
        let output = RodioOutput::new(5);
        let err = output.fetch("/no/such/clip.mp3").unwrap_err();
        assert!(matches!(err, PlaybackError::FetchFailed { .. }));
    }
}
