use thiserror::Error;

/// Failure of one external lookup call. Never fatal to a batch: the
/// resolver logs it, caches a negative entry and moves to the next tier.
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("lookup request failed: {0}")]
    Transport(String),

    #[error("unexpected lookup response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for LookupError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            LookupError::Decode(err.to_string())
        } else {
            LookupError::Transport(err.to_string())
        }
    }
}
