//! Errors surfaced by the user-action flows

#[derive(Debug, thiserror::Error)]
pub enum StudyError {
    /// Required input absent; the message is the notice shown to the user
    #[error("{0}")]
    MissingInput(String),

    #[error("API error ({status})")]
    Api { status: u16 },

    #[error("Transcription failed ({status})")]
    Transcription { status: u16 },

    #[error("{0}")]
    Request(String),

    #[error("{0}")]
    Extraction(String),
}

impl StudyError {
    pub fn missing(notice: &str) -> Self {
        StudyError::MissingInput(notice.to_string())
    }

    /// HTTP status carried by a collaborator failure
    pub fn status(&self) -> Option<u16> {
        match self {
            StudyError::Api { status } | StudyError::Transcription { status } => Some(*status),
            _ => None,
        }
    }
}

pub type StudyResult<T> = Result<T, StudyError>;
