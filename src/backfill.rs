//! Descriptions of assignments are loaded in the background, after the calendar has been rendered

use std::collections::HashMap;
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::entity::{Entity, EntityKey};
use crate::error::{ApiResult, Error};
use crate::traits::AssignmentApi;

/// The outcome of a background fetch
pub(crate) type BackfillOutcome = (EntityKey, Result<ApiResult<String>, Error>);

/// The description fetches in flight, at most one per entity
#[derive(Debug, Default)]
pub struct Backfills {
    in_flight: HashMap<EntityKey, JoinHandle<ApiResult<String>>>,
}

impl Backfills {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_in_flight(&self, key: &EntityKey) -> bool {
        self.in_flight.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.in_flight.len()
    }

    pub fn is_empty(&self) -> bool {
        self.in_flight.is_empty()
    }

    /// Start fetching the description of `entity`, unless it is already being fetched.
    ///
    /// Returns whether a fetch has been started. This requires a Tokio runtime, and does nothing outside of one.
    pub fn spawn<A>(&mut self, api: &Arc<A>, entity: &Entity) -> bool
    where
        A: AssignmentApi + Send + Sync + 'static,
    {
        let key = entity.key();
        if self.in_flight.contains_key(&key) {
            return false;
        }
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                log::warn!("No async runtime, the description of {} will not be loaded", key);
                return false;
            },
        };

        let api = Arc::clone(api);
        let entity = entity.clone();
        let handle = runtime.spawn(async move {
            api.fetch_description_for(&entity).await
        });
        log::debug!("Loading the description of {} in the background", key);
        self.in_flight.insert(key, handle);
        true
    }

    /// Abort the fetch for an entity, if any. Its result will never be delivered.
    pub fn cancel(&mut self, key: &EntityKey) {
        if let Some(handle) = self.in_flight.remove(key) {
            log::debug!("Cancelling the description fetch of {}", key);
            handle.abort();
        }
    }

    /// Collect the fetches that have already completed, without waiting for the others
    pub(crate) async fn take_finished(&mut self) -> Vec<BackfillOutcome> {
        let finished: Vec<EntityKey> = self.in_flight.iter()
            .filter(|(_, handle)| handle.is_finished())
            .map(|(key, _)| *key)
            .collect();

        let mut outcomes = Vec::with_capacity(finished.len());
        for key in finished {
            if let Some(handle) = self.in_flight.remove(&key) {
                outcomes.push(join(key, handle).await);
            }
        }
        outcomes
    }

    /// Wait for every fetch currently in flight
    pub(crate) async fn take_all(&mut self) -> Vec<BackfillOutcome> {
        let mut outcomes = Vec::with_capacity(self.in_flight.len());
        for (key, handle) in self.in_flight.drain().collect::<Vec<_>>() {
            outcomes.push(join(key, handle).await);
        }
        outcomes
    }
}

async fn join(key: EntityKey, handle: JoinHandle<ApiResult<String>>) -> BackfillOutcome {
    let outcome = handle.await.map_err(|source| Error::Backfill { key, source });
    (key, outcome)
}


#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use chrono::NaiveDate;

    use crate::entity::{AssignmentDetails, ClassInfo, Status};
    use crate::mock::MockApi;

    fn homework(id: i64) -> Entity {
        let due = NaiveDate::from_ymd_opt(2024, 1, 8).unwrap().and_hms_opt(8, 0, 0).unwrap();
        let class = ClassInfo { name: "History".to_string(), id: 3, link: None };
        Entity::assignment(id, "Essay", Status::ToDo, due, class, AssignmentDetails::default())
    }

    #[tokio::test]
    async fn one_fetch_per_entity() {
        let api = Arc::new(MockApi::new(vec![homework(1)]));
        api.set_description(EntityKey::assignment(1), "<p>Two pages</p>");
        let mut backfills = Backfills::new();

        assert!(backfills.spawn(&api, &homework(1)));
        assert!(backfills.spawn(&api, &homework(1)) == false);
        assert!(backfills.is_in_flight(&EntityKey::assignment(1)));
        assert_eq!(backfills.len(), 1);

        let outcomes = backfills.take_all().await;
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].0, EntityKey::assignment(1));
        assert!(matches!(&outcomes[0].1, Ok(Ok(description)) if description == "<p>Two pages</p>"));
        assert!(backfills.is_empty());
    }

    #[tokio::test]
    async fn cancelled_fetches_are_never_delivered() {
        let api = Arc::new(MockApi::new(vec![homework(1), homework(2)]));
        api.set_description_delay(Duration::from_millis(50));
        let mut backfills = Backfills::new();

        backfills.spawn(&api, &homework(1));
        backfills.spawn(&api, &homework(2));
        backfills.cancel(&EntityKey::assignment(1));
        backfills.cancel(&EntityKey::assignment(3));

        let outcomes = backfills.take_all().await;
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].0, EntityKey::assignment(2));
    }

    #[test]
    fn nothing_is_fetched_outside_of_a_runtime() {
        let api = Arc::new(MockApi::new(Vec::new()));
        let mut backfills = Backfills::new();
        assert!(backfills.spawn(&api, &homework(1)) == false);
        assert!(backfills.is_empty());
    }
}
