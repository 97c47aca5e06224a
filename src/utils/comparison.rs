//! Utilities to compare entities
//!
//! These can be used to sort results, e.g. by using `sorted_by` from the `itertools` crate

use std::cmp::Ordering;

use crate::entity::Entity;

/// The display order of entities: by due date, then assignments before tasks, then by id.
///
/// This is a strict total order over distinct entity keys, so entities due at the same time never tie.
pub fn compare_entities(left: &Entity, right: &Entity) -> Ordering {
    left.due_date().cmp(right.due_date())
        .then_with(|| left.is_task().cmp(&right.is_task()))
        .then_with(|| left.id().cmp(&right.id()))
}
