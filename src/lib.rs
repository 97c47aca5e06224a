//! This crate keeps a student's assignments and personal tasks in sync with their calendar rendering.
//!
//! Assignments are scraped from the school's host application, and tasks are created by the user. Both are [`Entity`]s. \
//! Entities are exchanged with the host through an [`AssignmentApi`](traits::AssignmentApi), whose payloads are normalized in the [`raw`] module.
//!
//! An [`AssignmentCenter`] owns the collection, and keeps a [`CalendarGrid`](calendar::CalendarGrid) up to date with it:
//! * fetched data is reconciled with the current collection (see [`merge`]),
//! * changes are expressed as minimal [`Diff`](diff::Diff)s, applied locally and persisted to the host,
//! * the calendar is updated incrementally rather than rebuilt,
//! * descriptions of assignments are loaded in the background (see [`backfill`]).
//!
//! Failures never bubble up to the caller: they are forwarded to an [`ErrorReporter`](traits::ErrorReporter) (see [`report`]).

pub mod traits;
pub mod error;
pub mod config;

pub mod entity;
pub use entity::{Entity, EntityId, EntityKey, Status};
pub mod diff;
pub mod merge;
pub mod raw;

pub mod calendar;
pub mod backfill;
mod center;
pub use center::AssignmentCenter;
pub mod report;

pub mod mock;
pub mod mock_behaviour;
pub mod utils;
