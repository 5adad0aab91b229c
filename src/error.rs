use serde::Serialize;

/// Failures surfaced by the data and mutation collaborators.
///
/// None of these are allowed to escape a view: callers convert them into a
/// [`Notice`] at the point of invocation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConsoleError {
    #[error("cluster {0:?} not found")]
    NotFound(String),
    #[error("fetch failed: {0}")]
    FetchFailed(String),
    #[error("mutation failed: {0}")]
    MutationFailed(String),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("{0} is not implemented")]
    NotImplemented(&'static str),
    #[error("request cancelled")]
    Cancelled,
}

pub type ConsoleResult<T> = Result<T, ConsoleError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

impl NoticeLevel {
    pub fn css_class(self) -> &'static str {
        match self {
            NoticeLevel::Success => "alert-success",
            NoticeLevel::Info => "alert-info",
            NoticeLevel::Warning => "alert-warning",
            NoticeLevel::Error => "alert-error",
        }
    }
}

/// Transient user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    pub fn css_class(&self) -> &'static str {
        self.level.css_class()
    }
}

impl From<&ConsoleError> for Notice {
    fn from(err: &ConsoleError) -> Self {
        match err {
            ConsoleError::Validation(_) | ConsoleError::NotImplemented(_) => {
                Notice::warning(err.to_string())
            }
            _ => Notice::error(err.to_string()),
        }
    }
}
