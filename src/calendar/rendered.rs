//! The projection of a single entity in the calendar

use chrono::NaiveDate;

use crate::entity::{Classification, Entity, EntityKey};

/// What the calendar currently displays for an entity.
///
/// This is a snapshot: it only changes when the controller refreshes it.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderedItem {
    entity: Entity,
    /// The day list this item is placed in
    day: NaiveDate,
    classification: Classification,
}

impl RenderedItem {
    pub(crate) fn new(entity: Entity, day: NaiveDate) -> Self {
        let classification = entity.classification();
        Self { entity, day, classification }
    }

    /// Update the displayed fields in place
    pub(crate) fn refresh(&mut self, entity: &Entity) {
        self.entity = entity.clone();
        self.classification = entity.classification();
    }

    pub fn key(&self) -> EntityKey                  { self.entity.key() }
    pub fn entity(&self) -> &Entity                 { &self.entity }
    pub fn day(&self) -> NaiveDate                  { self.day }
    pub fn classification(&self) -> Classification  { self.classification }

    /// The text shown in place of the description
    pub fn description_text(&self) -> &str {
        if self.entity.is_task() {
            return "<i>Custom task</i>";
        }
        match self.entity.description() {
            None => "<i>Loading...</i>",
            Some("") => "<i>No description</i>",
            Some(description) => description,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::entity::{AssignmentDetails, ClassInfo, Status};

    #[test]
    fn description_placeholders() {
        let due = NaiveDate::from_ymd_opt(2024, 1, 8).unwrap().and_hms_opt(8, 8, 0).unwrap();
        let class = ClassInfo { name: "Art".to_string(), id: 3, link: None };
        let with_description = |description: Option<&str>| {
            Entity::assignment(1, "Sketch", Status::ToDo, due, class.clone(), AssignmentDetails {
                description: description.map(String::from),
                ..AssignmentDetails::default()
            })
        };

        let item = RenderedItem::new(with_description(None), due.date());
        assert_eq!(item.description_text(), "<i>Loading...</i>");
        let item = RenderedItem::new(with_description(Some("")), due.date());
        assert_eq!(item.description_text(), "<i>No description</i>");
        let item = RenderedItem::new(with_description(Some("<p>Draw a bowl</p>")), due.date());
        assert_eq!(item.description_text(), "<p>Draw a bowl</p>");

        let task = Entity::task(1, "Buy pencils", Status::ToDo, due, class.clone());
        let mut item = RenderedItem::new(task.clone(), due.date());
        assert_eq!(item.description_text(), "<i>Custom task</i>");
        assert!(item.classification().is_empty());

        let done = task.apply(&crate::diff::Diff::status(Status::Completed)).unwrap();
        item.refresh(&done);
        assert_eq!(item.classification(), Classification::COMPLETED);
        assert_eq!(item.entity().status(), Status::Completed);
    }
}
