//! Assignments and user tasks, as shown in the assignment center

use std::collections::HashMap;
use std::fmt::{Display, Formatter};

use bitflags::bitflags;
use chrono::{NaiveDate, NaiveDateTime};
use csscolorparser::Color;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::diff::Diff;
use crate::error::Error;

/// The numeric identifier the host gives to an assignment or a user task
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub i64);

impl Display for EntityId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The identity of an entity in every collection and index.
///
/// Tasks and assignments are numbered independently by the host, so the kind is part of the key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityKey {
    pub id: EntityId,
    pub is_task: bool,
}

impl EntityKey {
    pub fn task(id: i64) -> Self {
        Self { id: EntityId(id), is_task: true }
    }

    pub fn assignment(id: i64) -> Self {
        Self { id: EntityId(id), is_task: false }
    }
}

impl Display for EntityKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.is_task {
            true => write!(f, "task #{}", self.id),
            false => write!(f, "assignment #{}", self.id),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "To do")]
    ToDo,
    #[serde(rename = "In progress")]
    InProgress,
    Completed,
    Missing,
    Overdue,
    Graded,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ToDo => "To do",
            Self::InProgress => "In progress",
            Self::Completed => "Completed",
            Self::Missing => "Missing",
            Self::Overdue => "Overdue",
            Self::Graded => "Graded",
        }
    }

    /// The numeric code the host uses for this status
    pub fn code(&self) -> i32 {
        match self {
            Self::ToDo => -1,
            Self::InProgress => 0,
            Self::Completed => 1,
            Self::Missing => 2,
            Self::Overdue => 3,
            Self::Graded => 4,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            -1 => Some(Self::ToDo),
            0 => Some(Self::InProgress),
            1 => Some(Self::Completed),
            2 => Some(Self::Missing),
            3 => Some(Self::Overdue),
            4 => Some(Self::Graded),
            _ => None,
        }
    }

    /// The status a "Mark as ..." toggle switches to, or `None` if it cannot be toggled
    pub fn next(&self, due_day: NaiveDate, today: NaiveDate) -> Option<Self> {
        match self {
            Self::Overdue | Self::Missing | Self::ToDo | Self::InProgress => Some(Self::Completed),
            Self::Completed => {
                if due_day < today {
                    Some(Self::Overdue)
                } else {
                    Some(Self::ToDo)
                }
            },
            Self::Graded => None,
        }
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The course section an entity belongs to
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassInfo {
    pub name: String,
    pub id: i64,
    pub link: Option<Url>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Grade {
    pub value: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub url: Url,
    pub expired: bool,
}

/// Fields that only make sense for scraped assignments
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AssignmentDetails {
    /// HTML fragment. `None` means "not loaded yet", an empty string means "no description".
    pub description: Option<String>,
    pub link: Option<Url>,
    pub submission_method: Option<String>,
    pub attachments: Vec<Attachment>,
    pub grade: Grade,
    pub max_points: Option<f64>,
    /// The host's assignment type, e.g. "Homework" or "Test"
    pub category: String,
    pub is_extra_credit: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    /// A task created by the user
    Task,
    /// An assignment scraped from the host
    Assignment(AssignmentDetails),
}

bitflags! {
    /// Derived flags used to highlight an entity
    pub struct Classification: u8 {
        const MAJOR = 1;
        const REQUIRES_SUBMISSION = 2;
        const GRADED = 4;
        const COMPLETED = 8;
    }
}

/// An assignment or a user task
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    id: EntityId,
    /// HTML fragment
    title: String,
    status: Status,
    due_date: NaiveDateTime,
    assigned_date: NaiveDateTime,
    class: ClassInfo,
    /// Overrides the colour of the class
    color: Option<Color>,
    kind: EntityKind,
}

impl Entity {
    pub fn new(id: i64, title: String, status: Status,
               due_date: NaiveDateTime, assigned_date: NaiveDateTime,
               class: ClassInfo, kind: EntityKind) -> Self
    {
        Self {
            id: EntityId(id),
            title,
            status,
            due_date,
            assigned_date,
            class,
            color: None,
            kind,
        }
    }

    /// Create a user task, assigned on the day it is due
    pub fn task(id: i64, title: &str, status: Status, due_date: NaiveDateTime, class: ClassInfo) -> Self {
        Self::new(id, title.to_string(), status, due_date, due_date, class, EntityKind::Task)
    }

    /// Create an assignment, assigned on the day it is due
    pub fn assignment(id: i64, title: &str, status: Status, due_date: NaiveDateTime, class: ClassInfo, details: AssignmentDetails) -> Self {
        Self::new(id, title.to_string(), status, due_date, due_date, class, EntityKind::Assignment(details))
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_assigned_date(mut self, assigned_date: NaiveDateTime) -> Self {
        self.assigned_date = assigned_date;
        self
    }

    pub fn id(&self) -> EntityId               { self.id }
    pub fn key(&self) -> EntityKey             { EntityKey { id: self.id, is_task: self.is_task() } }
    pub fn title(&self) -> &str                { &self.title }
    pub fn status(&self) -> Status             { self.status }
    pub fn due_date(&self) -> &NaiveDateTime   { &self.due_date }
    pub fn assigned_date(&self) -> &NaiveDateTime { &self.assigned_date }
    pub fn class(&self) -> &ClassInfo          { &self.class }
    pub fn color(&self) -> Option<&Color>      { self.color.as_ref() }
    pub fn kind(&self) -> &EntityKind          { &self.kind }

    /// The calendar day this entity is placed on
    pub fn due_day(&self) -> NaiveDate {
        self.due_date.date()
    }

    pub fn is_task(&self) -> bool {
        matches!(self.kind, EntityKind::Task)
    }

    pub fn assignment_details(&self) -> Option<&AssignmentDetails> {
        match &self.kind {
            EntityKind::Assignment(details) => Some(details),
            EntityKind::Task => None,
        }
    }

    /// The description, if this is an assignment whose description has been loaded
    pub fn description(&self) -> Option<&str> {
        self.assignment_details().and_then(|d| d.description.as_deref())
    }

    /// Whether the description of this assignment still has to be fetched
    pub fn needs_description(&self) -> bool {
        self.assignment_details().map(|d| d.description.is_none()).unwrap_or(false)
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.status, Status::Completed | Status::Graded)
    }

    pub fn is_major(&self) -> bool {
        match self.assignment_details() {
            None => false,
            Some(details) => {
                let category = details.category.to_lowercase();
                crate::config::read(&crate::config::MAJOR_CATEGORIES)
                    .iter()
                    .any(|major| major.to_lowercase() == category)
            },
        }
    }

    pub fn requires_submission(&self) -> bool {
        self.assignment_details().map(|d| d.submission_method.is_some()).unwrap_or(false)
    }

    pub fn is_graded(&self) -> bool {
        self.status == Status::Graded
    }

    pub fn classification(&self) -> Classification {
        let mut flags = Classification::empty();
        flags.set(Classification::MAJOR, self.is_major());
        flags.set(Classification::REQUIRES_SUBMISSION, self.requires_submission());
        flags.set(Classification::GRADED, self.is_graded());
        flags.set(Classification::COMPLETED, self.is_completed());
        flags
    }

    /// The colour to display this entity with: its own override, or the colour of its class
    pub fn display_color(&self, class_colors: &HashMap<i64, Color>) -> Option<Color> {
        self.color.clone().or_else(|| class_colors.get(&self.class.id).cloned())
    }

    /// Return a copy of this entity with `diff` applied.
    ///
    /// The identity of an entity cannot be changed by a diff.
    /// Colours are serialized with 8 bits per channel, so the colour is only touched when the diff sets it.
    pub fn apply(&self, diff: &Diff) -> Result<Entity, Error> {
        let record = serde_json::to_value(self)?;
        let updated = crate::diff::apply_diff(Some(&record), Some(diff.as_map()));
        let mut updated: Entity = serde_json::from_value(updated)?;
        if diff.as_map().contains_key("color") == false {
            updated.color = self.color.clone();
        }
        if updated.key() != self.key() {
            return Err(Error::assertion(format!("a diff cannot change the identity of {}", self.key())));
        }
        Ok(updated)
    }

    /// Combine a stale copy and a fresh copy of the same entity, field by field.
    /// Fields that are null in `fresh` are taken from `stale`.
    pub fn filled_forward(stale: &Entity, fresh: &Entity) -> Result<Entity, Error> {
        let stale_record = serde_json::to_value(stale)?;
        let fresh_record = serde_json::to_value(fresh)?;
        let mut filled: Entity = serde_json::from_value(crate::diff::fill_forward(&stale_record, &fresh_record))?;
        filled.color = fresh.color.clone().or_else(|| stale.color.clone());
        Ok(filled)
    }

    /// Used when the host sends an updated task: keep the presentation data the host payload does not carry
    pub(crate) fn inherit_presentation_from(&mut self, stored: &Entity) {
        if self.color.is_none() {
            self.color = stored.color.clone();
        }
        if self.class.name.is_empty() && self.class.id == stored.class.id {
            self.class.name = stored.class.name.clone();
        }
    }
}
