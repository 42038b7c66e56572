use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("unknown route: {0}")]
    UnknownRoute(u32),

    #[error("unknown step '{0}'")]
    UnknownStep(String),

    #[error("malformed step '{name}': {reason}")]
    MalformedStep { name: String, reason: String },

    #[error("unknown point: {0}")]
    UnknownPoint(String),

    #[error("unknown device profile '{0}'")]
    UnknownProfile(String),

    #[error("record_start #{ordinal} has no reserved slot ({planned} planned)")]
    PlanMismatch { ordinal: usize, planned: usize },

    #[error("device command failed: {0}")]
    Device(String),

    #[error("recorder error: {0}")]
    Recorder(String),

    #[error("interrupted")]
    Interrupted,

    #[error("home directory not found: set HOME environment variable")]
    HomeNotFound,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CaptureError>;
