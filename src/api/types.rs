use phrasa_core::TableError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("IO error: {msg}")]
    Io { msg: String },
    #[error("invalid data: {msg}")]
    InvalidData { msg: String },
    #[error("internal error: {msg}")]
    Internal { msg: String },
}

impl From<TableError> for EngineError {
    fn from(e: TableError) -> Self {
        let msg = e.to_string();
        match e {
            TableError::Io(_) => Self::Io { msg },
            TableError::UnknownTargetId(_) | TableError::MissingAlignment(_) => {
                Self::Internal { msg }
            }
            _ => Self::InvalidData { msg },
        }
    }
}

pub(crate) fn poisoned<T>(e: std::sync::PoisonError<T>) -> EngineError {
    EngineError::Internal { msg: e.to_string() }
}
