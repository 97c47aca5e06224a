//! Errors raised while reconciling and rendering assignments

use std::fmt::{Display, Formatter};

use thiserror::Error;

use crate::entity::EntityKey;

/// The error type returned by the external API collaborators.
///
/// It must be `Send + Sync` so that results can come back from spawned backfill tasks.
pub type ApiError = Box<dyn std::error::Error + Send + Sync>;
/// See [`ApiError`]
pub type ApiResult<T> = Result<T, ApiError>;

/// The call to an external collaborator that failed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ApiAction {
    FetchEntities,
    PersistStatus,
    CreateTask,
    UpdateTask,
    DeleteTask,
    FetchDescription,
}

impl ApiAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FetchEntities => "fetch assignments",
            Self::PersistStatus => "update status",
            Self::CreateTask => "create task",
            Self::UpdateTask => "update task",
            Self::DeleteTask => "delete task",
            Self::FetchDescription => "fetch description",
        }
    }
}

impl Display for ApiAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum Error {
    /// An invariant the core relies on does not hold. This is a programming error.
    #[error("non-null assertion failed! context: {0}")]
    Assertion(String),

    /// An external collaborator call failed
    #[error("unable to {action}: {source}")]
    Api {
        action: ApiAction,
        #[source]
        source: ApiError,
    },

    #[error("invalid entity record: {0}")]
    Data(#[from] serde_json::Error),

    #[error("invalid host date {input:?}: {source}")]
    Date {
        input: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("invalid link: {0}")]
    Url(#[from] url::ParseError),

    #[error("description backfill for {key} did not complete: {source}")]
    Backfill {
        key: EntityKey,
        #[source]
        source: tokio::task::JoinError,
    },
}

impl Error {
    pub fn assertion<S: Into<String>>(context: S) -> Self {
        Self::Assertion(context.into())
    }

    pub fn api(action: ApiAction, source: ApiError) -> Self {
        Self::Api { action, source }
    }

    /// The key used to group similar errors, e.g. to avoid alerting the user repeatedly
    pub fn category(&self) -> String {
        match self {
            Self::Api { action, .. } => action.as_str().to_string(),
            Self::Backfill { .. } => ApiAction::FetchDescription.as_str().to_string(),
            other => other.to_string(),
        }
    }
}
