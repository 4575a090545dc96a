use thiserror::Error;

/// Failure taxonomy shared by both indicator adapters.
///
/// `Input` is reported before any upstream request is made; the remaining
/// variants classify what went wrong during a single fetch attempt. Nothing
/// is retried.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("invalid request: {0}")]
    Input(String),

    #[error("upstream responded with HTTP {status}")]
    UpstreamStatus { status: u16 },

    #[error("upstream request failed: {0}")]
    Transport(String),

    #[error("{0}")]
    Parse(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Transport(err.to_string())
    }
}
