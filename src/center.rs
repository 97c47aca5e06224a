//! The assignment center: owns the entity collection and keeps the rendered calendar in sync with it

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, Local, NaiveDate};

use crate::backfill::{BackfillOutcome, Backfills};
use crate::calendar::{CalendarGrid, DateRange};
use crate::config::DEFAULT_WEEKS_SHOWN;
use crate::diff::{Change, Diff};
use crate::entity::{Entity, EntityId, EntityKey};
use crate::error::{ApiAction, Error};
use crate::raw::RawTask;
use crate::traits::{AssignmentApi, ErrorReporter};

/// Owns the live collection of assignments and tasks, and its projection in a calendar.
///
/// Every change to the collection goes through this struct, which updates the calendar incrementally:
/// items are inserted at their sorted position, refreshed in place, moved when their due date changes, or removed.
///
/// Operations never return errors: failures are forwarded to the [`ErrorReporter`] (exactly once per failure).
/// In case a call to the API fails, changes that were already applied locally are not rolled back.
pub struct AssignmentCenter<A, R> {
    /// In insertion order, not display order
    entities: Vec<Entity>,
    grid: CalendarGrid,
    backfills: Backfills,
    today: NaiveDate,

    api: Arc<A>,
    reporter: R,
}

impl<A, R> AssignmentCenter<A, R>
where
    A: AssignmentApi + Send + Sync + 'static,
    R: ErrorReporter,
{
    /// Create an assignment center showing the weeks around today.
    ///
    /// Nothing is rendered until [`Self::hydrate`] is called.
    pub fn new(entities: Vec<Entity>, api: Arc<A>, reporter: R) -> Self {
        Self::new_at(entities, api, reporter, Local::now().date_naive())
    }

    /// Same as [`Self::new`], with a custom date for "today"
    pub fn new_at(entities: Vec<Entity>, api: Arc<A>, reporter: R, today: NaiveDate) -> Self {
        let range = DateRange::weeks_around(today, DEFAULT_WEEKS_SHOWN);
        Self {
            entities,
            grid: CalendarGrid::new(range),
            backfills: Backfills::new(),
            today,
            api,
            reporter,
        }
    }

    pub fn entities(&self) -> &[Entity]         { &self.entities }
    pub fn grid(&self) -> &CalendarGrid         { &self.grid }
    pub fn backfills(&self) -> &Backfills       { &self.backfills }
    pub fn today(&self) -> NaiveDate            { self.today }
    pub fn api(&self) -> &Arc<A>                { &self.api }
    pub fn reporter(&self) -> &R                { &self.reporter }

    pub fn get(&self, key: &EntityKey) -> Option<&Entity> {
        self.entities.iter().find(|e| e.key() == *key)
    }

    fn position(&self, key: &EntityKey) -> Option<usize> {
        self.entities.iter().position(|e| e.key() == *key)
    }

    /// Synchronize the calendar with the collection.
    ///
    /// Entities due in the visible range are rendered (or refreshed in place if they already are).
    /// Assignments whose description is not loaded yet get it fetched in the background (see [`Self::apply_finished_backfills`]).
    pub fn hydrate(&mut self) {
        for entity in &self.entities {
            let key = entity.key();

            let rendered_due = self.grid.rendered(&key).map(|item| *item.entity().due_date());
            let shown = match rendered_due {
                Some(due) if due == *entity.due_date() => self.grid.refresh(entity),
                Some(_) => {
                    // Its due date changed behind our back (e.g. after a merge), so its day or its rank within the day may be stale
                    self.grid.remove(&key);
                    self.grid.insert(entity)
                },
                None => {
                    if self.grid.is_visible(entity.due_day()) == false {
                        continue;
                    }
                    self.grid.insert(entity)
                },
            };

            if shown && entity.needs_description() {
                self.backfills.spawn(&self.api, entity);
            }
        }

        self.update_selected_date();
    }

    /// Add entities to the collection, and render them
    pub fn add_entities(&mut self, new_entities: Vec<Entity>) {
        self.entities.extend(new_entities);
        self.hydrate();
    }

    /// Reconcile the collection with freshly fetched entities (see [`crate::merge::merge`]), and render the result
    pub fn merge_entities(&mut self, fresh: Vec<Entity>) {
        match crate::merge::merge(&self.entities, &fresh) {
            Err(err) => self.reporter.report(&err),
            Ok(merged) => {
                log::info!("Merged {} fetched entities into the assignment center", fresh.len());
                self.entities = merged;
                self.hydrate();
            },
        }
    }

    /// Fetch every entity from the API, and merge them in
    pub async fn refresh_from_api(&mut self) {
        match self.api.fetch_all_entities().await {
            Err(source) => self.reporter.report(&Error::api(ApiAction::FetchEntities, source)),
            Ok(fresh) => self.merge_entities(fresh),
        }
    }

    /// Apply a change requested on an entity, persist it if needed, and update its rendering.
    ///
    /// Does nothing if there is no such entity.
    pub async fn apply_change(&mut self, id: EntityId, is_task: bool, change: Change) {
        if let Err(err) = self.apply_change_inner(id, is_task, change).await {
            self.reporter.report(&err);
        }
    }

    async fn apply_change_inner(&mut self, id: EntityId, is_task: bool, change: Change) -> Result<(), Error> {
        let key = EntityKey { id, is_task };
        let index = match self.position(&key) {
            None => {
                log::debug!("No {} to change", key);
                return Ok(());
            },
            Some(index) => index,
        };

        let diff = match change {
            Change::Delete => return self.delete(index).await,
            Change::Update(diff) => diff,
        };

        self.entities[index] = self.entities[index].apply(&diff)?;

        if let Some(status) = diff.new_status()? {
            self.api.persist_status(id, is_task, status).await
                .map_err(|source| Error::api(ApiAction::PersistStatus, source))?;
        }

        let moved = diff.new_due_date()?.is_some();
        let entity = &self.entities[index];
        if moved {
            self.grid.remove(&key);
            if self.grid.insert(entity) == false {
                log::debug!("{} is now due on {}, outside of the calendar", key, entity.due_day());
            }
        } else {
            self.grid.refresh(entity);
        }

        if moved {
            self.update_selected_date();
        }
        Ok(())
    }

    async fn delete(&mut self, index: usize) -> Result<(), Error> {
        let key = self.entities[index].key();
        if key.is_task == false {
            return Err(Error::assertion(format!("{} cannot be deleted, only tasks can", key)));
        }

        self.api.persist_task_delete(key.id).await
            .map_err(|source| Error::api(ApiAction::DeleteTask, source))?;

        self.backfills.cancel(&key);
        self.entities.remove(index);
        self.grid.remove(&key);
        self.update_selected_date();
        Ok(())
    }

    /// Create a task, or update it if the payload refers to an existing one.
    ///
    /// Returns the identifier of the newly created task, if any.
    pub async fn create_task(&mut self, task: RawTask) -> Option<EntityId> {
        match self.create_task_inner(task).await {
            Ok(id) => id,
            Err(err) => {
                self.reporter.report(&err);
                None
            },
        }
    }

    async fn create_task_inner(&mut self, task: RawTask) -> Result<Option<EntityId>, Error> {
        if task.exists() {
            self.api.persist_task_update(&task).await
                .map_err(|source| Error::api(ApiAction::UpdateTask, source))?;

            let mut parsed = Entity::from_raw_task(&task)?;
            let stored = self.get(&parsed.key())
                .ok_or_else(|| Error::assertion(format!("{} should be in the assignment center", parsed.key())))?;
            parsed.inherit_presentation_from(stored);
            let diff = Diff::between(stored, &parsed)?;

            log::info!("Updating {}", parsed.key());
            self.apply_change_inner(parsed.id(), true, Change::Update(diff)).await?;
            Ok(None)
        } else {
            let id = self.api.persist_task_create(&task).await
                .map_err(|source| Error::api(ApiAction::CreateTask, source))?;
            log::info!("Task {} saved", id);

            // Identifiers are given by the host, so the tasks are reloaded altogether
            let tasks = self.fetch_tasks().await;
            self.entities.retain(|e| e.is_task() == false);
            self.entities.extend(tasks);

            let keys: HashSet<EntityKey> = self.entities.iter().map(|e| e.key()).collect();
            self.grid.retain(&keys);
            self.hydrate();
            Ok(Some(id))
        }
    }

    /// Every task the host knows about. In case they cannot be fetched, the rest of the calendar can still work without them.
    async fn fetch_tasks(&self) -> Vec<Entity> {
        match self.api.fetch_all_entities().await {
            Ok(entities) => entities.into_iter().filter(|e| e.is_task()).collect(),
            Err(source) => {
                self.reporter.report(&Error::api(ApiAction::FetchEntities, source));
                Vec::new()
            },
        }
    }

    /// Show more weeks: appended if `weeks` is positive, prepended if it is negative
    pub fn extend_visible_range(&mut self, weeks: i32) {
        if weeks == 0 || self.grid.extend(weeks) == false {
            return;
        }
        // TODO: only hydrate the added days
        self.hydrate();
    }

    /// Apply the descriptions that have been fetched so far, without waiting for the others
    pub async fn apply_finished_backfills(&mut self) {
        let outcomes = self.backfills.take_finished().await;
        for outcome in outcomes {
            self.apply_backfill(outcome).await;
        }
    }

    /// Wait for every description being fetched, and apply them
    pub async fn settle_backfills(&mut self) {
        while self.backfills.is_empty() == false {
            let outcomes = self.backfills.take_all().await;
            for outcome in outcomes {
                self.apply_backfill(outcome).await;
            }
        }
    }

    async fn apply_backfill(&mut self, (key, outcome): BackfillOutcome) {
        let description = match outcome {
            Err(err) => return self.reporter.report(&err),
            Ok(Err(source)) => return self.reporter.report(&Error::api(ApiAction::FetchDescription, source)),
            Ok(Ok(description)) => description,
        };

        // The entity may have changed, or even disappeared, since the fetch started.
        // Only the description is applied, on top of its current state.
        if self.get(&key).is_none() {
            log::warn!("Ignoring the description of {}, which is not in the assignment center anymore", key);
            return;
        }
        self.apply_change(key.id, key.is_task, Change::Update(Diff::description(&description))).await;
    }

    /// Highlight the first day after today that has something due
    fn update_selected_date(&mut self) {
        let range = *self.grid.range();
        let start = self.today + Duration::days(1);
        let due_days: HashSet<NaiveDate> = self.entities.iter().map(|e| e.due_day()).collect();
        let selected = range.days()
            .filter(|day| *day >= start)
            .find(|day| due_days.contains(day));
        self.grid.set_selected_date(selected);
    }
}
