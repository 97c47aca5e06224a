//! Payloads in the shape the host application exchanges them, and their normalization into [`Entity`]

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};
use url::Url;

use crate::config;
use crate::entity::{ClassInfo, Entity, EntityKind, Status};
use crate::error::Error;

/// A user task, as sent to (and received from) the host.
///
/// The host is not consistent with the names of the date fields, so both spellings are accepted.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawTask {
    #[serde(default, alias = "DateAssigned")]
    pub assigned_date: Option<String>,
    #[serde(default, alias = "DateDue")]
    pub due_date: Option<String>,
    pub short_description: String,
    pub task_status: i32,
    #[serde(default, deserialize_with = "lenient_string")]
    pub section_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub user_task_id: Option<i64>,
    #[serde(default)]
    pub group_name: Option<String>,
}

impl RawTask {
    /// Whether this payload describes a task the host already knows about
    pub fn exists(&self) -> bool {
        matches!(self.user_task_id, Some(id) if id != 0)
    }

    /// The payload the task editor sends when editing `task`
    pub fn from_entity(task: &Entity) -> Self {
        let due = format_raw_date(task.due_date());
        Self {
            assigned_date: Some(due.clone()),
            due_date: Some(due),
            short_description: task.title().to_string(),
            task_status: task.status().code(),
            section_id: Some(task.class().id.to_string()),
            user_id: None,
            user_task_id: Some(task.id().0),
            group_name: Some(task.class().name.clone()),
        }
    }
}

/// Every assignment and task of a student, grouped in the buckets the host uses
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct RawAssignmentData {
    pub due_today: Vec<RawTask>,
    pub due_tomorrow: Vec<RawTask>,
    pub due_this_week: Vec<RawTask>,
    pub due_next_week: Vec<RawTask>,
    pub due_after_next_week: Vec<RawTask>,
    pub past_this_week: Vec<RawTask>,
    pub past_last_week: Vec<RawTask>,
    pub past_before_last_week: Vec<RawTask>,
}

impl RawAssignmentData {
    /// The user tasks among every bucket
    pub fn tasks(&self) -> Result<Vec<Entity>, Error> {
        self.due_today.iter()
            .chain(&self.due_tomorrow)
            .chain(&self.due_this_week)
            .chain(&self.due_next_week)
            .chain(&self.due_after_next_week)
            .chain(&self.past_this_week)
            .chain(&self.past_last_week)
            .chain(&self.past_before_last_week)
            .filter(|raw| raw.exists())
            .map(Entity::from_raw_task)
            .collect()
    }
}

impl Entity {
    /// Normalize a host task payload into a task entity
    pub fn from_raw_task(raw: &RawTask) -> Result<Entity, Error> {
        let due_date = match raw.due_date.as_deref() {
            Some(date) => parse_raw_date(date)?,
            None => return Err(Error::assertion("a task must have a due date")),
        };
        let assigned_date = match raw.assigned_date.as_deref() {
            Some(date) => parse_raw_date(date)?,
            None => due_date,
        };

        let status = Status::from_code(raw.task_status).unwrap_or_else(|| {
            log::warn!("Unknown task status code {}, considering the task as to do", raw.task_status);
            Status::ToDo
        });

        let section = raw.section_id.as_deref().and_then(|id| id.trim().parse::<i64>().ok()).unwrap_or(0);
        let link = match section {
            0 => None,
            section => Some(class_link(section)?),
        };
        let class = ClassInfo {
            name: raw.group_name.clone().unwrap_or_default(),
            id: section,
            link,
        };

        Ok(Entity::new(
            raw.user_task_id.unwrap_or(0),
            raw.short_description.clone(),
            status,
            due_date,
            assigned_date,
            class,
            EntityKind::Task,
        ))
    }
}

/// Parse a host date, e.g. `1/5/2024 8:08 AM`
pub fn parse_raw_date(input: &str) -> Result<NaiveDateTime, Error> {
    NaiveDateTime::parse_from_str(input.trim(), config::RAW_DATE_FORMAT)
        .map_err(|source| Error::Date { input: input.to_string(), source })
}

pub fn format_raw_date(date: &NaiveDateTime) -> String {
    date.format("%-m/%-d/%Y %-I:%M %p").to_string()
}

fn class_link(section: i64) -> Result<Url, Error> {
    let origin = config::read(&config::SCHOOL_ORIGIN);
    let link = format!("{}/app/student#academicclass/{}/0/bulletinboard", origin.trim_end_matches('/'), section);
    Ok(Url::parse(&link)?)
}

/// The host sends some identifiers as numbers, and others as strings
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}


#[cfg(test)]
mod tests {
    use super::*;

    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn host_dates() {
        let date = parse_raw_date("1/5/2024 8:08 AM").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap().and_hms_opt(8, 8, 0).unwrap());
        let date = parse_raw_date("12/25/2023 11:59 PM").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2023, 12, 25).unwrap().and_hms_opt(23, 59, 0).unwrap());
        assert_eq!(format_raw_date(&date), "12/25/2023 11:59 PM");

        assert!(matches!(parse_raw_date("tomorrow"), Err(Error::Date { .. })));
    }

    #[test]
    fn task_payload() {
        let raw: RawTask = serde_json::from_value(json!({
            "DateAssigned": "1/8/2024 8:08 AM",
            "DateDue": "1/9/2024 8:08 AM",
            "ShortDescription": "Read <b>chapter 4</b>",
            "TaskStatus": 1,
            "SectionId": 12345,
            "UserId": "777",
            "UserTaskId": 31,
            "GroupName": "English 10",
        })).unwrap();
        assert!(raw.exists());
        assert_eq!(raw.section_id.as_deref(), Some("12345"));

        let task = Entity::from_raw_task(&raw).unwrap();
        assert!(task.is_task());
        assert_eq!(task.id().0, 31);
        assert_eq!(task.status(), Status::Completed);
        assert_eq!(task.due_day(), NaiveDate::from_ymd_opt(2024, 1, 9).unwrap());
        assert_eq!(task.assigned_date().date(), NaiveDate::from_ymd_opt(2024, 1, 8).unwrap());
        assert_eq!(task.class().name, "English 10");
        assert_eq!(
            task.class().link.as_ref().unwrap().as_str(),
            "https://hunterschools.myschoolapp.com/app/student#academicclass/12345/0/bulletinboard"
        );
    }

    #[test]
    fn new_tasks_have_no_host_id() {
        let raw = RawTask {
            due_date: Some("1/9/2024 8:08 AM".to_string()),
            short_description: "Buy a lab coat".to_string(),
            task_status: -1,
            ..RawTask::default()
        };
        assert!(raw.exists() == false);
        let task = Entity::from_raw_task(&raw).unwrap();
        assert_eq!(task.status(), Status::ToDo);
        assert_eq!(task.class().link, None);
        assert_eq!(task.assigned_date(), task.due_date());

        assert!(Entity::from_raw_task(&RawTask::default()).is_err());
    }

    #[test]
    fn editing_payload_round_trips() {
        let raw = RawTask {
            due_date: Some("1/9/2024 8:08 AM".to_string()),
            short_description: "Practice piano".to_string(),
            task_status: 0,
            section_id: Some("55".to_string()),
            user_task_id: Some(12),
            group_name: Some("Music".to_string()),
            ..RawTask::default()
        };
        let task = Entity::from_raw_task(&raw).unwrap();
        let again = Entity::from_raw_task(&RawTask::from_entity(&task)).unwrap();
        assert_eq!(task, again);
    }

    #[test]
    fn tasks_are_extracted_from_every_bucket() {
        let data: RawAssignmentData = serde_json::from_value(json!({
            "DueToday": [
                { "DueDate": "1/10/2024 8:08 AM", "ShortDescription": "Task", "TaskStatus": -1, "UserTaskId": 4 },
                { "DueDate": "1/10/2024 8:08 AM", "ShortDescription": "Assignment", "TaskStatus": -1, "UserTaskId": 0 },
            ],
            "PastLastWeek": [
                { "DateDue": "1/2/2024 8:08 AM", "ShortDescription": "Old task", "TaskStatus": 1, "UserTaskId": 2 },
                { "DateDue": "1/2/2024 8:08 AM", "ShortDescription": "Old assignment", "TaskStatus": 4 },
            ],
        })).unwrap();

        let tasks = data.tasks().unwrap();
        let titles: Vec<&str> = tasks.iter().map(|t| t.title()).collect();
        assert_eq!(titles, vec!["Task", "Old task"]);
    }
}
