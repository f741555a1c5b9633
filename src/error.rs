use thiserror::Error;

/// Application-level errors using thiserror for structured error handling.
///
/// These errors represent domain-specific failures that can occur while
/// talking to the SheetMusic service or driving playback. They provide
/// context and can be chained with anyhow.

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("SheetMusic API returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("Network error talking to the SheetMusic API")]
    Network(#[source] Box<ureq::Transport>),

    #[error("Failed to decode SheetMusic API response from {url}")]
    Decode {
        url: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read upload payload: {path}")]
    UploadRead {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl From<ureq::Error> for ApiError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(status, response) => ApiError::Status {
                status,
                url: response.get_url().to_string(),
            },
            ureq::Error::Transport(transport) => ApiError::Network(Box::new(transport)),
        }
    }
}

#[derive(Error, Debug)]
pub enum PlaybackError {
    #[error("Failed to fetch audio from {url}")]
    FetchFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Failed to decode audio format")]
    DecodeFailed(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Failed to initialize audio output stream")]
    StreamInitFailed(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Audio playback failed")]
    PlaybackFailed(#[source] Box<dyn std::error::Error + Send + Sync>),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to read featured event from {path}")]
    ReadFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Failed to write featured event to {path}")]
    WriteFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration from {path}")]
    LoadFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Failed to save configuration to {path}")]
    SaveFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Failed to create config directory: {path}")]
    DirectoryCreationFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Type alias for application Results using anyhow for context chaining
pub type AppResult<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_error_display() {
        let err = ApiError::Status {
            status: 503,
            url: "http://localhost:8000/api/v1/events/jamdevientos/".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "SheetMusic API returned HTTP 503 for http://localhost:8000/api/v1/events/jamdevientos/"
        );
    }

    #[test]
    fn test_error_source_chain() {
        use std::io;

        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let store_err = StoreError::ReadFailed {
            path: "/test/featured_event.json".to_string(),
            source: Box::new(io_err),
        };

        assert!(store_err.source().is_some());
        assert_eq!(
            store_err.to_string(),
            "Failed to read featured event from /test/featured_event.json"
        );
    }
}
