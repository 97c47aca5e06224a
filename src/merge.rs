//! Reconciliation of two snapshots of the same collection of entities

use std::collections::{HashMap, HashSet};

use crate::entity::{Entity, EntityKey};
use crate::error::Error;

/// Merge a freshly fetched collection into a previous one.
///
/// * entities only in `old` are kept unchanged (e.g. local tasks, or items that were not re-fetched)
/// * entities in both are combined field by field, preferring `new` unless its value is missing (see [`Entity::filled_forward`])
/// * entities only in `new` are appended
///
/// Entities coming from `old` keep their relative order and come first, followed by the new ones in their relative order.
/// If a key appears several times in the same collection, its last occurrence wins, at the position of the first one.
pub fn merge(old: &[Entity], new: &[Entity]) -> Result<Vec<Entity>, Error> {
    let old_by_key = index_by_key(old);
    let new_by_key = index_by_key(new);

    let mut merged = Vec::with_capacity(old_by_key.len() + new_by_key.len());
    let mut handled = HashSet::new();

    for entity in old {
        let key = entity.key();
        if handled.insert(key) == false {
            continue;
        }
        let stale = old_by_key[&key];
        match new_by_key.get(&key) {
            None => merged.push(stale.clone()),
            Some(fresh) => merged.push(Entity::filled_forward(stale, fresh)?),
        }
    }

    let mut appended = 0;
    for entity in new {
        let key = entity.key();
        if handled.insert(key) == false {
            continue;
        }
        merged.push(new_by_key[&key].clone());
        appended += 1;
    }

    log::debug!("Merged {} known entities with {} fetched ones ({} new)", old_by_key.len(), new_by_key.len(), appended);
    Ok(merged)
}

fn index_by_key(entities: &[Entity]) -> HashMap<EntityKey, &Entity> {
    entities.iter()
        .map(|entity| (entity.key(), entity))
        .collect()
}
