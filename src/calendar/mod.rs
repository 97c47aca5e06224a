//! The rendered calendar: a projection of the entity collection, one ordered list per visible day
//!
//! The grid is never the source of truth. It is a cache kept up to date by the [`AssignmentCenter`](crate::AssignmentCenter).

pub mod rendered;

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use itertools::Itertools;

use crate::config::MAX_WEEKS_SHOWN;
use crate::entity::{Entity, EntityKey};
use crate::utils::comparison::compare_entities;
use rendered::RenderedItem;

/// An inclusive span of calendar days
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateRange {
    first: NaiveDate,
    last: NaiveDate,
}

impl DateRange {
    pub fn new(first: NaiveDate, last: NaiveDate) -> Self {
        Self { first, last }
    }

    /// `weeks` full weeks, starting on the Sunday of the week of `day`
    pub fn weeks_around(day: NaiveDate, weeks: u32) -> Self {
        let first = crate::utils::sunday_of_week(day);
        let last = first + Duration::days(7 * i64::from(weeks) - 1);
        Self { first, last }
    }

    pub fn first(&self) -> NaiveDate { self.first }
    pub fn last(&self) -> NaiveDate  { self.last }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.first <= day && day <= self.last
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let first = self.first;
        let count = (self.last - self.first).num_days() + 1;
        (0..count.max(0)).map(move |offset| first + Duration::days(offset))
    }
}


/// Counts the rendered items per weekday, to decide whether weekend columns are shown.
///
/// Monday to Friday are always shown. Sunday and Saturday are shown as long as something is rendered on them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WeekdayVisibility {
    /// Indexed from Sunday (0) to Saturday (6)
    counts: [i32; 7],
    show_sunday: bool,
    show_saturday: bool,
}

impl WeekdayVisibility {
    pub fn show(&mut self, day: Weekday) {
        self.counts[day.num_days_from_sunday() as usize] += 1;
        match day {
            Weekday::Sun => self.show_sunday = true,
            Weekday::Sat => self.show_saturday = true,
            _ => (),
        }
    }

    pub fn hide(&mut self, day: Weekday) {
        let count = &mut self.counts[day.num_days_from_sunday() as usize];
        *count -= 1;
        if *count <= 0 {
            match day {
                Weekday::Sun => self.show_sunday = false,
                Weekday::Sat => self.show_saturday = false,
                _ => (),
            }
        }
    }

    pub fn count(&self, day: Weekday) -> i32 {
        self.counts[day.num_days_from_sunday() as usize]
    }

    pub fn is_shown(&self, day: Weekday) -> bool {
        match day {
            Weekday::Sun => self.show_sunday,
            Weekday::Sat => self.show_saturday,
            _ => true,
        }
    }
}


/// The calendar as currently displayed
#[derive(Clone, Debug)]
pub struct CalendarGrid {
    range: DateRange,
    /// One list per visible day, in display order
    days: BTreeMap<NaiveDate, Vec<EntityKey>>,
    items: HashMap<EntityKey, RenderedItem>,
    visibility: WeekdayVisibility,
    /// The day highlighted as the next one with work due
    selected_date: Option<NaiveDate>,
}

impl CalendarGrid {
    pub fn new(range: DateRange) -> Self {
        let days = range.days().map(|day| (day, Vec::new())).collect();
        Self {
            range,
            days,
            items: HashMap::new(),
            visibility: WeekdayVisibility::default(),
            selected_date: None,
        }
    }

    pub fn range(&self) -> &DateRange                   { &self.range }
    pub fn visibility(&self) -> &WeekdayVisibility      { &self.visibility }
    pub fn selected_date(&self) -> Option<NaiveDate>    { self.selected_date }

    pub fn is_weekday_shown(&self, day: Weekday) -> bool {
        self.visibility.is_shown(day)
    }

    pub fn is_visible(&self, day: NaiveDate) -> bool {
        self.days.contains_key(&day)
    }

    /// The keys rendered on a day, in display order. `None` if the day is not visible.
    pub fn day(&self, day: NaiveDate) -> Option<&[EntityKey]> {
        self.days.get(&day).map(|list| list.as_slice())
    }

    /// Every visible day with its rendered keys, in chronological order
    pub fn days(&self) -> impl Iterator<Item = (&NaiveDate, &Vec<EntityKey>)> {
        self.days.iter()
    }

    pub fn rendered(&self, key: &EntityKey) -> Option<&RenderedItem> {
        self.items.get(key)
    }

    pub fn is_rendered(&self, key: &EntityKey) -> bool {
        self.items.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Insert a projection of `entity` in the list of its due day, keeping that list sorted.
    ///
    /// Returns `false` if the due day is not visible. An entity that is already rendered is only refreshed.
    pub fn insert(&mut self, entity: &Entity) -> bool {
        let key = entity.key();
        if self.items.contains_key(&key) {
            self.refresh(entity);
            return true;
        }

        let day = entity.due_day();
        let list = match self.days.get_mut(&day) {
            None => return false,
            Some(list) => list,
        };

        // The final order of the list, once the new item is in. We insert right before whichever item follows it.
        let items = &self.items;
        let ideal: Vec<&Entity> = list.iter()
            .filter_map(|existing| items.get(existing))
            .map(|item| item.entity())
            .chain(std::iter::once(entity))
            .sorted_by(|a, b| compare_entities(a, b))
            .collect();
        let next_key = ideal.iter()
            .position(|e| e.key() == key)
            .and_then(|index| ideal.get(index + 1))
            .map(|e| e.key());

        let position = next_key
            .and_then(|next| list.iter().position(|k| *k == next))
            .unwrap_or(list.len());
        log::debug!("Rendering {} on {} at position {}", key, day, position);
        list.insert(position, key);

        self.items.insert(key, RenderedItem::new(entity.clone(), day));
        self.visibility.show(day.weekday());
        true
    }

    /// Update the projection of `entity` in place. Returns `false` if it is not rendered.
    pub fn refresh(&mut self, entity: &Entity) -> bool {
        match self.items.get_mut(&entity.key()) {
            None => false,
            Some(item) => {
                item.refresh(entity);
                true
            },
        }
    }

    /// Remove the projection of an entity, if any
    pub fn remove(&mut self, key: &EntityKey) -> Option<RenderedItem> {
        let item = self.items.remove(key)?;
        if let Some(list) = self.days.get_mut(&item.day()) {
            list.retain(|k| k != key);
        }
        self.visibility.hide(item.day().weekday());
        Some(item)
    }

    /// Remove the projections of every entity that is not in `keys`
    pub fn retain(&mut self, keys: &HashSet<EntityKey>) {
        let orphans: Vec<EntityKey> = self.items.keys()
            .filter(|key| keys.contains(key) == false)
            .cloned()
            .collect();
        for orphan in orphans {
            log::debug!("Removing {}, which is not in the collection anymore", orphan);
            self.remove(&orphan);
        }
    }

    /// Grow the visible range by whole weeks: appended if `weeks` is positive, prepended if it is negative.
    ///
    /// Returns `false`, leaving the range untouched, if the calendar would exceed [`MAX_WEEKS_SHOWN`] weeks
    /// or reach dates that cannot be represented.
    pub fn extend(&mut self, weeks: i32) -> bool {
        if weeks == 0 {
            return true;
        }
        let added_days = 7 * i64::from(weeks.unsigned_abs());
        let shown_days = (self.range.last - self.range.first).num_days() + 1;
        if shown_days + added_days > 7 * i64::from(MAX_WEEKS_SHOWN) {
            log::warn!("Not extending the calendar by {} weeks, it would show more than {} weeks", weeks, MAX_WEEKS_SHOWN);
            return false;
        }

        let delta = Duration::days(added_days);
        let added = if weeks < 0 {
            let first = match self.range.first.checked_sub_signed(delta) {
                Some(first) => first,
                None => {
                    log::warn!("Not extending the calendar by {} weeks, its first day would be out of range", weeks);
                    return false;
                },
            };
            let added = DateRange::new(first, self.range.first - Duration::days(1));
            self.range.first = first;
            added
        } else {
            let last = match self.range.last.checked_add_signed(delta) {
                Some(last) => last,
                None => {
                    log::warn!("Not extending the calendar by {} weeks, its last day would be out of range", weeks);
                    return false;
                },
            };
            let added = DateRange::new(self.range.last + Duration::days(1), last);
            self.range.last = last;
            added
        };
        for day in added.days() {
            self.days.insert(day, Vec::new());
        }
        true
    }

    pub(crate) fn set_selected_date(&mut self, day: Option<NaiveDate>) {
        self.selected_date = day;
    }
}
