//! Support for library configuration options

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use once_cell::sync::Lazy;

/// Origin of the school-management application. Class links of user tasks are built from it.
/// Feel free to override it when initing this library.
pub static SCHOOL_ORIGIN: Lazy<Arc<Mutex<String>>> = Lazy::new(|| Arc::new(Mutex::new("https://hunterschools.myschoolapp.com".to_string())));

/// Assignment categories (the host's assignment "type") that count as major assessments.
/// Compared case-insensitively.
pub static MAJOR_CATEGORIES: Lazy<Arc<Mutex<Vec<String>>>> = Lazy::new(|| Arc::new(Mutex::new(
    vec![
        "Major Assessment".to_string(),
        "Test".to_string(),
        "Exam".to_string(),
        "Project".to_string(),
    ]
)));

/// How many weeks the calendar shows before it is extended
pub const DEFAULT_WEEKS_SHOWN: u32 = 4;

/// The calendar cannot be extended beyond this many weeks
pub const MAX_WEEKS_SHOWN: u32 = 520;

/// Errors of the same category are only alerted once within this window
pub const ERROR_ALERT_WINDOW: Duration = Duration::from_secs(1);

/// Format of the dates in host payloads, e.g. `1/5/2024 8:08 AM`
pub const RAW_DATE_FORMAT: &str = "%m/%d/%Y %I:%M %p";

/// Read a setting, even if a thread panicked while holding it
pub(crate) fn read<T: Clone>(setting: &Mutex<T>) -> T {
    setting.lock().unwrap_or_else(PoisonError::into_inner).clone()
}

/// Override a setting
pub fn set<T>(setting: &Mutex<T>, value: T) {
    *setting.lock().unwrap_or_else(PoisonError::into_inner) = value;
}
