/// Core error type for the folder organizer.
///
/// Adapter crates map their library errors (HTTP, Telegram) into this type so
/// the planner can tell run-fatal failures from per-folder ones.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Network/auth failure talking to the messaging platform.
    #[error("transport error: {0}")]
    Transport(String),

    /// Classifier unreachable, or it returned an invalid / out-of-bound plan.
    #[error("classification error: {0}")]
    Classification(String),

    /// The folder id range has no free values left.
    #[error("folder id capacity exhausted: {issued} of {capacity} ids in use")]
    Capacity { issued: usize, capacity: usize },

    /// A single folder update was rejected by the platform.
    #[error("platform error: {0}")]
    Platform(String),

    #[error("external error: {0}")]
    External(String),
}

impl Error {
    /// Whether the error aborts the stage it happened in.
    ///
    /// Only `Platform` errors are isolated to the folder that produced them.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::Platform(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
