use std::sync::Arc;

/// Outcome of a single metric probe.
#[derive(Debug, Clone)]
pub enum ProviderResult<T> {
    /// The probe succeeded.
    Found(T),

    /// A prerequisite of the probe does not exist (e.g. the branch or workflow is missing).
    Unavailable(Arc<str>),

    /// An error occurred while querying the hosting platform.
    Error(Arc<ohno::AppError>),
}

impl<T> ProviderResult<T> {
    /// Human-readable failure reason, or `None` if the result is `Found`.
    #[must_use]
    pub fn failure_reason(&self) -> Option<String> {
        match self {
            Self::Found(_) => None,
            Self::Unavailable(reason) => Some(reason.to_string()),
            Self::Error(e) => Some(format!("{e:#}")),
        }
    }
}

impl<T> From<crate::Result<T>> for ProviderResult<T> {
    fn from(result: crate::Result<T>) -> Self {
        match result {
            Ok(data) => Self::Found(data),
            Err(e) => Self::Error(Arc::new(e)),
        }
    }
}
