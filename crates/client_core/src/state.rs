use shared::error::FetchError;

/// Visible result of a keyed fetch.
///
/// `Failure` never carries [`FetchError::Cancelled`].
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ResultState<T> {
    #[default]
    Idle,
    Loading,
    Success(T),
    Failure(FetchError),
}

impl<T> ResultState<T> {
    pub const fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    /// Returns the payload if the fetch succeeded.
    pub const fn payload(&self) -> Option<&T> {
        match self {
            Self::Success(payload) => Some(payload),
            _ => None,
        }
    }

    pub const fn error(&self) -> Option<&FetchError> {
        match self {
            Self::Failure(error) => Some(error),
            _ => None,
        }
    }
}
