use std::sync::Arc;

use async_trait::async_trait;

use crate::entity::{Entity, EntityId, Status};
use crate::error::{ApiResult, Error};
use crate::raw::RawTask;

/// The host application's API, as seen by the assignment center
#[async_trait]
pub trait AssignmentApi {
    /// Returns every assignment and task the host currently knows about.
    /// This may fail, e.g. in case the host is unreachable
    async fn fetch_all_entities(&self) -> ApiResult<Vec<Entity>>;

    /// Persist a new status. Tasks and assignments are updated through different endpoints
    async fn persist_status(&self, id: EntityId, is_task: bool, status: Status) -> ApiResult<()>;

    /// Create a task, and return the identifier the host gave it
    async fn persist_task_create(&self, task: &RawTask) -> ApiResult<EntityId>;
    async fn persist_task_update(&self, task: &RawTask) -> ApiResult<()>;
    async fn persist_task_delete(&self, id: EntityId) -> ApiResult<()>;

    /// Fetch the (HTML) description of an assignment.
    /// Descriptions are too slow to fetch along with the other fields, so they are loaded later on
    async fn fetch_description_for(&self, entity: &Entity) -> ApiResult<String>;
}

/// Where errors end up, e.g. to display them to the user.
///
/// Implementations must not panic.
pub trait ErrorReporter {
    fn report(&self, err: &Error);
}

impl<R: ErrorReporter + ?Sized> ErrorReporter for Arc<R> {
    fn report(&self, err: &Error) {
        (**self).report(err)
    }
}
