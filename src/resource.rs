use serde::Serialize;

/// Outcome of a network-backed operation, carried as data instead of an `Err`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Resource<T> {
    Loading,
    Success { data: T },
    Error { message: String },
}

impl<T> Resource<T> {
    pub fn success(data: T) -> Self {
        Resource::Success { data }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Resource::Error {
            message: message.into(),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Resource::Loading)
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Resource::Success { data } => Some(data),
            _ => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Resource::Error { message } => Some(message),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Resource<U> {
        match self {
            Resource::Loading => Resource::Loading,
            Resource::Success { data } => Resource::Success { data: f(data) },
            Resource::Error { message } => Resource::Error { message },
        }
    }
}
