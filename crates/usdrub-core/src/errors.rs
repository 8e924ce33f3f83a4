/// Core error type.
///
/// Adapter crates map their specific errors into this type so callers can tell
/// configuration problems from transport failures.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("server error (status code: {status}) for {url}")]
    Status { status: u16, url: String },

    #[error("external error: {0}")]
    External(String),
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return Error::Transport(format!("request timed out: {e}"));
        }
        Error::Transport(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
