///! Some utility functions

pub mod comparison;

use chrono::{Datelike, Duration, NaiveDate};

use crate::calendar::CalendarGrid;
use crate::calendar::rendered::RenderedItem;
use crate::entity::Classification;

/// The Sunday that starts the week of `day`
pub fn sunday_of_week(day: NaiveDate) -> NaiveDate {
    day - Duration::days(i64::from(day.weekday().num_days_from_sunday()))
}

/// A debug utility that pretty-prints a calendar
pub fn print_calendar(grid: &CalendarGrid) {
    println!("CALENDAR {} -> {}", grid.range().first(), grid.range().last());
    for (day, keys) in grid.days() {
        if keys.is_empty() {
            continue;
        }
        let selected = if grid.selected_date() == Some(*day) { "*" } else { " " };
        println!("  {}{} ({})", selected, day, day.weekday());
        for key in keys {
            if let Some(item) = grid.rendered(key) {
                print_item(item);
            }
        }
    }
}

pub fn print_item(item: &RenderedItem) {
    let entity = item.entity();
    let completion = if entity.is_completed() { "✓" } else { " " };
    let major = if item.classification().contains(Classification::MAJOR) { "!" } else { " " };
    println!("    {}{} {}\t{}\t[{}]", completion, major, entity.title(), entity.status(), item.key());
}
