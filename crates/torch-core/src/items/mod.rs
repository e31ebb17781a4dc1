//! Dream → Goal → Task hierarchy and the read-only views derived from it.
//!
//! Snapshots arrive whole from whatever loads them; nothing here mutates an
//! item. Progress and time totals are recomputed on every call.

mod grouping;
mod progress;
mod search;

pub use grouping::{group_by_parent, group_rows, Group, GroupKey, Groups, Parented};
pub use progress::{
    compute_progress, roll_up_dream, roll_up_goal, task_progress, DreamRollup, GoalRollup,
};
pub use search::{filter_and_project, find_item_by_id};

use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub type ItemId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ItemType {
    Task,
    Goal,
    Dream,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

/// Link from a child to its parent, as embedded in the child.
///
/// Only the id and title are read; any other fields of an embedded parent
/// are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentRef {
    pub id: ItemId,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: ItemId,
    pub title: String,
    /// Planned seconds of work.
    #[serde(default)]
    pub duration: Option<u64>,
    #[serde(default)]
    pub time_spent: u64,
    #[serde(default)]
    pub recurring: bool,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub target_date: Option<NaiveDate>,
    #[serde(default)]
    pub goal: Option<ParentRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: ItemId,
    pub title: String,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub time_spent: u64,
    /// As delivered by the loader. [`roll_up_goal`] recomputes it.
    #[serde(default)]
    pub total_time_spent: u64,
    #[serde(default)]
    pub dream: Option<ParentRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dream {
    pub id: ItemId,
    pub title: String,
    #[serde(default)]
    pub goals: Vec<Goal>,
    #[serde(default)]
    pub time_spent: u64,
    /// As delivered by the loader. [`roll_up_dream`] recomputes it.
    #[serde(default)]
    pub total_time_spent: u64,
}

impl Dream {
    /// Roll up every child goal, then the dream itself.
    pub fn roll_up(&self) -> DreamRollup {
        let goals: Vec<GoalRollup> = self.goals.iter().map(roll_up_goal).collect();
        roll_up_dream(self, &goals)
    }
}

/// Any item of the hierarchy, tagged by its `type` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum Item {
    Task(Task),
    Goal(Goal),
    Dream(Dream),
}

impl Item {
    pub fn view(&self) -> ItemRef<'_> {
        match self {
            Item::Task(task) => ItemRef::Task(task),
            Item::Goal(goal) => ItemRef::Goal(goal),
            Item::Dream(dream) => ItemRef::Dream(dream),
        }
    }

    pub fn id(&self) -> ItemId {
        self.view().id()
    }

    pub fn title(&self) -> &str {
        self.view().title()
    }

    pub fn item_type(&self) -> ItemType {
        self.view().item_type()
    }

    pub fn parent(&self) -> Option<&ParentRef> {
        match self {
            Item::Task(task) => task.goal.as_ref(),
            Item::Goal(goal) => goal.dream.as_ref(),
            Item::Dream(_) => None,
        }
    }
}

/// Borrowed view of one item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ItemRef<'a> {
    Task(&'a Task),
    Goal(&'a Goal),
    Dream(&'a Dream),
}

impl<'a> ItemRef<'a> {
    pub fn id(self) -> ItemId {
        match self {
            ItemRef::Task(task) => task.id,
            ItemRef::Goal(goal) => goal.id,
            ItemRef::Dream(dream) => dream.id,
        }
    }

    pub fn title(self) -> &'a str {
        match self {
            ItemRef::Task(task) => &task.title,
            ItemRef::Goal(goal) => &goal.title,
            ItemRef::Dream(dream) => &dream.title,
        }
    }

    pub fn item_type(self) -> ItemType {
        match self {
            ItemRef::Task(_) => ItemType::Task,
            ItemRef::Goal(_) => ItemType::Goal,
            ItemRef::Dream(_) => ItemType::Dream,
        }
    }

    pub fn parent(self) -> Option<&'a ParentRef> {
        match self {
            ItemRef::Task(task) => task.goal.as_ref(),
            ItemRef::Goal(goal) => goal.dream.as_ref(),
            ItemRef::Dream(_) => None,
        }
    }

    /// Project into a display row with freshly computed progress and time.
    ///
    /// Goals and dreams report their rolled-up totals as `time_spent` and
    /// the summed task durations as `duration`.
    pub fn row(self) -> ItemRow {
        let (progress, time_spent, duration) = match self {
            ItemRef::Task(task) => (task_progress(task), task.time_spent, task.duration),
            ItemRef::Goal(goal) => {
                let rollup = roll_up_goal(goal);
                (
                    rollup.progress,
                    rollup.total_time_spent,
                    Some(rollup.total_duration),
                )
            }
            ItemRef::Dream(dream) => {
                let rollup = dream.roll_up();
                (
                    rollup.progress,
                    rollup.total_time_spent,
                    Some(rollup.total_duration),
                )
            }
        };
        ItemRow {
            label: self.title().to_string(),
            value: self.id(),
            item_type: self.item_type(),
            progress,
            time_spent,
            duration,
            parent: self.parent().cloned(),
        }
    }
}

/// Read-only display row for lists and drop-downs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRow {
    pub label: String,
    pub value: ItemId,
    pub item_type: ItemType,
    pub progress: f64,
    pub time_spent: u64,
    pub duration: Option<u64>,
    pub parent: Option<ParentRef>,
}

/// One loaded snapshot, split by item type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemSet {
    #[serde(default)]
    pub dreams: Vec<Dream>,
    #[serde(default)]
    pub goals: Vec<Goal>,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl ItemSet {
    /// Split a flat, mixed list. Order within each type is preserved.
    pub fn from_items(items: impl IntoIterator<Item = Item>) -> Self {
        let mut set = Self::default();
        for item in items {
            match item {
                Item::Task(task) => set.tasks.push(task),
                Item::Goal(goal) => set.goals.push(goal),
                Item::Dream(dream) => set.dreams.push(dream),
            }
        }
        set
    }

    /// Parse a snapshot: either a flat JSON array of tagged items or an
    /// object with `dreams`, `goals` and `tasks` arrays.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        if value.is_array() {
            let items: Vec<Item> = serde_json::from_value(value)?;
            Ok(Self::from_items(items))
        } else {
            Ok(serde_json::from_value(value)?)
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn len(&self) -> usize {
        self.dreams.len() + self.goals.len() + self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dreams, then goals, then tasks.
    pub fn iter(&self) -> impl Iterator<Item = ItemRef<'_>> {
        self.dreams
            .iter()
            .map(ItemRef::Dream)
            .chain(self.goals.iter().map(ItemRef::Goal))
            .chain(self.tasks.iter().map(ItemRef::Task))
    }

    pub fn of_type(&self, item_type: ItemType) -> impl Iterator<Item = ItemRef<'_>> {
        self.iter().filter(move |item| item.item_type() == item_type)
    }

    /// Display rows for every item, in [`ItemSet::iter`] order.
    ///
    /// Rows here and from [`ItemSet::search`] take each parent's title from
    /// this snapshot when the parent is present in it, so both group the
    /// same way.
    pub fn rows(&self) -> Vec<ItemRow> {
        let mut rows: Vec<ItemRow> = self.iter().map(ItemRef::row).collect();
        self.resolve_parent_titles(&mut rows);
        rows
    }

    /// Rows of one type whose title matches `search_text`.
    pub fn search(&self, item_type: ItemType, search_text: &str) -> Vec<ItemRow> {
        let mut rows = filter_and_project(self.of_type(item_type), search_text);
        self.resolve_parent_titles(&mut rows);
        rows
    }

    fn resolve_parent_titles(&self, rows: &mut [ItemRow]) {
        for row in rows {
            if let Some(parent) = row.parent.as_mut() {
                if let Some(title) = self.parent_title(row.item_type, parent.id) {
                    parent.title = title.to_string();
                }
            }
        }
    }

    fn parent_title(&self, child_type: ItemType, parent_id: ItemId) -> Option<&str> {
        match child_type {
            ItemType::Task => self
                .goals
                .iter()
                .find(|goal| goal.id == parent_id)
                .map(|goal| goal.title.as_str()),
            ItemType::Goal => self
                .dreams
                .iter()
                .find(|dream| dream.id == parent_id)
                .map(|dream| dream.title.as_str()),
            ItemType::Dream => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = r#"[
        {"type": "DREAM", "id": 1, "title": "Run a marathon", "timeSpent": 0, "goals": []},
        {"type": "GOAL", "id": 1, "title": "Half marathon", "timeSpent": 600,
         "dream": {"id": 1, "title": "Run a marathon"},
         "tasks": [
            {"id": 100, "title": "Long run", "duration": 7200, "timeSpent": 1440},
            {"id": 101, "title": "Intervals", "duration": 7200, "timeSpent": 3600}
         ]},
        {"type": "TASK", "id": 100, "title": "Long run", "duration": 7200, "timeSpent": 1440,
         "priority": "high", "targetDate": "2024-05-01", "goal": {"id": 1, "title": "Half"}},
        {"type": "TASK", "id": 200, "title": "Stretch", "timeSpent": 30}
    ]"#;

    #[test]
    fn parses_flat_tagged_snapshot() {
        let set = ItemSet::from_json(SNAPSHOT).unwrap();
        assert_eq!(set.dreams.len(), 1);
        assert_eq!(set.goals.len(), 1);
        assert_eq!(set.tasks.len(), 2);
        assert_eq!(set.len(), 4);

        let task = &set.tasks[0];
        assert_eq!(task.priority, Some(Priority::High));
        assert_eq!(task.target_date, NaiveDate::from_ymd_opt(2024, 5, 1));
        assert_eq!(task.goal.as_ref().map(|g| g.id), Some(1));
        assert_eq!(set.tasks[1].duration, None);
        assert!(set.tasks[1].goal.is_none());
    }

    #[test]
    fn parses_split_snapshot() {
        let json = r#"{"goals": [{"id": 3, "title": "G"}], "tasks": []}"#;
        let set = ItemSet::from_json(json).unwrap();
        assert!(set.dreams.is_empty());
        assert_eq!(set.goals[0].id, 3);
        assert!(set.goals[0].tasks.is_empty());
    }

    #[test]
    fn rejects_unknown_item_type() {
        let json = r#"[{"type": "HABIT", "id": 1, "title": "x"}]"#;
        assert!(ItemSet::from_json(json).is_err());
    }

    #[test]
    fn iterates_dreams_goals_tasks() {
        let set = ItemSet::from_json(SNAPSHOT).unwrap();
        let order: Vec<(ItemType, ItemId)> =
            set.iter().map(|i| (i.item_type(), i.id())).collect();
        assert_eq!(
            order,
            vec![
                (ItemType::Dream, 1),
                (ItemType::Goal, 1),
                (ItemType::Task, 100),
                (ItemType::Task, 200),
            ]
        );
    }

    #[test]
    fn goal_row_carries_rolled_up_totals() {
        let set = ItemSet::from_json(SNAPSHOT).unwrap();
        let row = ItemRef::Goal(&set.goals[0]).row();
        assert_eq!(row.label, "Half marathon");
        assert_eq!(row.item_type, ItemType::Goal);
        assert_eq!(row.progress, 0.35);
        assert_eq!(row.time_spent, 600 + 5040);
        assert_eq!(row.duration, Some(14400));
        assert_eq!(row.parent.map(|p| p.id), Some(1));
    }

    #[test]
    fn task_row_without_duration_has_zero_progress() {
        let set = ItemSet::from_json(SNAPSHOT).unwrap();
        let row = ItemRef::Task(&set.tasks[1]).row();
        assert_eq!(row.progress, 0.0);
        assert_eq!(row.time_spent, 30);
        assert_eq!(row.duration, None);
        assert!(row.parent.is_none());
    }

    #[test]
    fn search_resolves_parent_title_from_snapshot() {
        let set = ItemSet::from_json(SNAPSHOT).unwrap();
        let rows = set.search(ItemType::Task, "LONG");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].parent.as_ref().unwrap().title, "Half marathon");
    }

    #[test]
    fn rows_and_search_agree_on_parent_titles() {
        let set = ItemSet::from_json(SNAPSHOT).unwrap();
        let all = set.rows();
        let from_rows = all.iter().find(|r| r.value == 100 && r.item_type == ItemType::Task);
        let searched = set.search(ItemType::Task, "");

        assert_eq!(from_rows.unwrap().parent.as_ref().unwrap().title, "Half marathon");
        assert_eq!(searched[0].parent, from_rows.unwrap().parent);

        let by_rows = group_by_parent(&all, ItemType::Task);
        let by_search = group_rows(&searched);
        let labels = |groups: &Groups<&ItemRow>| -> Vec<Option<String>> {
            groups.values().map(|g| g.parent_label.clone()).collect()
        };
        assert_eq!(labels(&by_rows), labels(&by_search));
        assert_eq!(labels(&by_rows)[0].as_deref(), Some("Half marathon"));
    }

    #[test]
    fn rows_do_not_mutate_snapshot() {
        let set = ItemSet::from_json(SNAPSHOT).unwrap();
        let before = set.clone();
        let _ = set.rows();
        let _ = set.search(ItemType::Goal, "");
        assert_eq!(set, before);
        assert_eq!(set.goals[0].total_time_spent, 0);
    }
}
