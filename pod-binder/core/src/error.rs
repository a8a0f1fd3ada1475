use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{kind} {namespace}/{name} not found")]
    NotFound {
        kind: &'static str,
        namespace: String,
        name: String,
    },

    #[error("pod: {pod}, not found service")]
    NoService { pod: String },

    #[error("pod: {pod}, matches multiple services: {}", services.join(", "))]
    AmbiguousService { pod: String, services: Vec<String> },

    #[error("pod: {pod}, missing selector label {key}")]
    MissingLabel { pod: String, key: String },

    #[error("pod: {pod}, has no address")]
    NoAddress { pod: String },

    /// An orchestration API failure, carried as-is.
    #[error(transparent)]
    Transport(Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl Error {
    pub fn transport(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Box::new(error))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
