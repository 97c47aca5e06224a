//! In-memory stand-ins for the host API and the error sink, to exercise an [`AssignmentCenter`](crate::AssignmentCenter) without a host

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::diff::Diff;
use crate::entity::{Entity, EntityId, EntityKey, Status};
use crate::error::{ApiResult, Error};
use crate::mock_behaviour::MockBehaviour;
use crate::raw::RawTask;
use crate::traits::{AssignmentApi, ErrorReporter};

/// A call received by a [`MockApi`]
#[derive(Clone, Debug, PartialEq)]
pub enum ApiCall {
    FetchAll,
    PersistStatus { key: EntityKey, status: Status },
    CreateTask(RawTask),
    UpdateTask(RawTask),
    DeleteTask(EntityId),
    FetchDescription(EntityKey),
}

#[derive(Debug)]
struct MockState {
    /// What the host knows
    entities: Vec<Entity>,
    descriptions: HashMap<EntityKey, String>,
    next_task_id: i64,
    calls: Vec<ApiCall>,
    behaviour: MockBehaviour,
    description_delay: Option<Duration>,
}

/// A host that keeps its data in memory, and records every call it receives
#[derive(Debug)]
pub struct MockApi {
    state: Mutex<MockState>,
}

impl MockApi {
    pub fn new(entities: Vec<Entity>) -> Self {
        let next_task_id = entities.iter()
            .filter(|e| e.is_task())
            .map(|e| e.id().0 + 1)
            .max()
            .unwrap_or(1000);
        Self {
            state: Mutex::new(MockState {
                entities,
                descriptions: HashMap::new(),
                next_task_id,
                calls: Vec::new(),
                behaviour: MockBehaviour::new(),
                description_delay: None,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_behaviour(&self, behaviour: MockBehaviour) {
        self.state().behaviour = behaviour;
    }

    /// The description the host returns for an assignment. Assignments without one have an empty description
    pub fn set_description(&self, key: EntityKey, description: &str) {
        self.state().descriptions.insert(key, description.to_string());
    }

    /// Make description fetches take some time
    pub fn set_description_delay(&self, delay: Duration) {
        self.state().description_delay = Some(delay);
    }

    /// Replace what the host knows, e.g. to simulate changes made elsewhere
    pub fn set_entities(&self, entities: Vec<Entity>) {
        self.state().entities = entities;
    }

    pub fn entities(&self) -> Vec<Entity> {
        self.state().entities.clone()
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.state().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    fn record(&self, call: ApiCall) {
        log::debug!("Mock API received {:?}", call);
        self.state().calls.push(call);
    }
}

#[async_trait]
impl AssignmentApi for MockApi {
    async fn fetch_all_entities(&self) -> ApiResult<Vec<Entity>> {
        self.record(ApiCall::FetchAll);
        let mut state = self.state();
        state.behaviour.can_fetch_entities()?;
        Ok(state.entities.clone())
    }

    async fn persist_status(&self, id: EntityId, is_task: bool, status: Status) -> ApiResult<()> {
        let key = EntityKey { id, is_task };
        self.record(ApiCall::PersistStatus { key, status });
        let mut state = self.state();
        state.behaviour.can_persist_status()?;
        let entity = state.entities.iter_mut()
            .find(|e| e.key() == key)
            .ok_or_else(|| format!("no {} on the host", key))?;
        *entity = entity.apply(&Diff::status(status))?;
        Ok(())
    }

    async fn persist_task_create(&self, task: &RawTask) -> ApiResult<EntityId> {
        self.record(ApiCall::CreateTask(task.clone()));
        let mut state = self.state();
        state.behaviour.can_create_task()?;

        let id = state.next_task_id;
        state.next_task_id += 1;
        let stored = RawTask { user_task_id: Some(id), ..task.clone() };
        let entity = Entity::from_raw_task(&stored)?;
        state.entities.push(entity);
        Ok(EntityId(id))
    }

    async fn persist_task_update(&self, task: &RawTask) -> ApiResult<()> {
        self.record(ApiCall::UpdateTask(task.clone()));
        let mut state = self.state();
        state.behaviour.can_update_task()?;

        let updated = Entity::from_raw_task(task)?;
        let entity = state.entities.iter_mut()
            .find(|e| e.key() == updated.key())
            .ok_or_else(|| format!("no {} on the host", updated.key()))?;
        *entity = updated;
        Ok(())
    }

    async fn persist_task_delete(&self, id: EntityId) -> ApiResult<()> {
        self.record(ApiCall::DeleteTask(id));
        let mut state = self.state();
        state.behaviour.can_delete_task()?;
        state.entities.retain(|e| e.key() != EntityKey { id, is_task: true });
        Ok(())
    }

    async fn fetch_description_for(&self, entity: &Entity) -> ApiResult<String> {
        let key = entity.key();
        self.record(ApiCall::FetchDescription(key));
        let delay = self.state().description_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state();
        state.behaviour.can_fetch_description()?;
        Ok(state.descriptions.get(&key).cloned().unwrap_or_default())
    }
}


/// Keeps every reported error, so that tests can check what has been reported
#[derive(Debug, Default)]
pub struct RecordingReporter {
    reports: Mutex<Vec<(String, String)>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.lock().len()
    }

    /// The messages of the reported errors, in order
    pub fn messages(&self) -> Vec<String> {
        self.lock().iter().map(|(_, message)| message.clone()).collect()
    }

    /// The categories of the reported errors, in order
    pub fn categories(&self) -> Vec<String> {
        self.lock().iter().map(|(category, _)| category.clone()).collect()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(String, String)>> {
        self.reports.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ErrorReporter for RecordingReporter {
    fn report(&self, err: &Error) {
        log::info!("Reported: {}", err);
        self.lock().push((err.category(), err.to_string()));
    }
}
