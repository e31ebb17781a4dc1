use std::fmt;

use indexmap::IndexMap;
use serde::{Serialize, Serializer};

use super::{Item, ItemId, ItemRef, ItemRow, ItemType, ParentRef};

const OTHER_LABEL: &str = "Other";

/// Key of one parent group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupKey {
    /// Children of the parent with this id.
    Parent(ItemId),
    /// Children without a parent.
    Other,
    /// The single group dreams are placed in.
    Empty,
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Parent(id) => write!(f, "{id}"),
            GroupKey::Other => f.write_str("other"),
            GroupKey::Empty => f.write_str("empty"),
        }
    }
}

impl Serialize for GroupKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Group<T> {
    pub parent_label: Option<String>,
    pub items: Vec<T>,
}

/// Groups in the order their keys were first seen.
pub type Groups<T> = IndexMap<GroupKey, Group<T>>;

/// Anything that knows its type and, optionally, its parent.
pub trait Parented {
    fn item_type(&self) -> ItemType;
    fn parent(&self) -> Option<&ParentRef>;
}

impl Parented for Item {
    fn item_type(&self) -> ItemType {
        Item::item_type(self)
    }

    fn parent(&self) -> Option<&ParentRef> {
        Item::parent(self)
    }
}

impl Parented for ItemRef<'_> {
    fn item_type(&self) -> ItemType {
        ItemRef::item_type(*self)
    }

    fn parent(&self) -> Option<&ParentRef> {
        ItemRef::parent(*self)
    }
}

impl Parented for ItemRow {
    fn item_type(&self) -> ItemType {
        self.item_type
    }

    fn parent(&self) -> Option<&ParentRef> {
        self.parent.as_ref()
    }
}

/// Group `items` of `item_type` by parent: goals by dream, tasks by goal,
/// dreams all together under [`GroupKey::Empty`]. Items of other types are
/// left out.
pub fn group_by_parent<T: Parented>(items: &[T], item_type: ItemType) -> Groups<&T> {
    group_items(items.iter().filter(|item| item.item_type() == item_type))
}

/// Re-group projected rows by each row's own parent.
pub fn group_rows(rows: &[ItemRow]) -> Groups<&ItemRow> {
    group_items(rows.iter())
}

fn group_items<'a, T: Parented + 'a>(items: impl IntoIterator<Item = &'a T>) -> Groups<&'a T> {
    let mut groups: Groups<&'a T> = IndexMap::new();
    for item in items {
        let (key, label) = slot(item.item_type(), item.parent());
        groups
            .entry(key)
            .or_insert_with(|| Group {
                parent_label: label,
                items: Vec::new(),
            })
            .items
            .push(item);
    }
    groups
}

fn slot(item_type: ItemType, parent: Option<&ParentRef>) -> (GroupKey, Option<String>) {
    match (item_type, parent) {
        (ItemType::Dream, _) => (GroupKey::Empty, None),
        (_, Some(parent)) => (GroupKey::Parent(parent.id), Some(parent.title.clone())),
        (_, None) => (GroupKey::Other, Some(OTHER_LABEL.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::{Dream, Goal, Task};

    fn task(id: u64, goal: Option<(u64, &str)>) -> Item {
        Item::Task(Task {
            id,
            title: format!("task {id}"),
            duration: None,
            time_spent: 0,
            recurring: false,
            priority: None,
            target_date: None,
            goal: goal.map(|(id, title)| ParentRef {
                id,
                title: title.into(),
            }),
        })
    }

    fn goal(id: u64, dream: Option<(u64, &str)>) -> Item {
        Item::Goal(Goal {
            id,
            title: format!("goal {id}"),
            tasks: vec![],
            time_spent: 0,
            total_time_spent: 0,
            dream: dream.map(|(id, title)| ParentRef {
                id,
                title: title.into(),
            }),
        })
    }

    fn dream(id: u64) -> Item {
        Item::Dream(Dream {
            id,
            title: format!("dream {id}"),
            goals: vec![],
            time_spent: 0,
            total_time_spent: 0,
        })
    }

    #[test]
    fn tasks_group_by_goal_with_other_bucket() {
        let items = vec![task(1, Some((10, "G1"))), task(2, None)];
        let groups = group_by_parent(&items, ItemType::Task);

        assert_eq!(groups.len(), 2);
        let g1 = &groups[&GroupKey::Parent(10)];
        assert_eq!(g1.parent_label.as_deref(), Some("G1"));
        assert_eq!(g1.items.len(), 1);
        assert_eq!(g1.items[0].id(), 1);

        let other = &groups[&GroupKey::Other];
        assert_eq!(other.parent_label.as_deref(), Some("Other"));
        assert_eq!(other.items[0].id(), 2);
    }

    #[test]
    fn serializes_with_string_keys() {
        let items = vec![task(1, Some((10, "G1"))), task(2, None)];
        let groups = group_by_parent(&items, ItemType::Task);
        let json = serde_json::to_value(&groups).unwrap();
        assert_eq!(json["10"]["parentLabel"], "G1");
        assert_eq!(json["other"]["parentLabel"], "Other");
        assert_eq!(json["other"]["items"][0]["id"], 2);
    }

    #[test]
    fn keys_follow_first_seen_order() {
        let items = vec![
            task(1, Some((30, "G3"))),
            task(2, None),
            task(3, Some((10, "G1"))),
            task(4, Some((30, "G3"))),
        ];
        let groups = group_by_parent(&items, ItemType::Task);
        let keys: Vec<String> = groups.keys().map(ToString::to_string).collect();
        assert_eq!(keys, vec!["30", "other", "10"]);
        assert_eq!(groups[&GroupKey::Parent(30)].items.len(), 2);
    }

    #[test]
    fn goals_group_by_dream() {
        let items = vec![goal(1, Some((7, "D7"))), goal(2, Some((7, "D7"))), goal(3, None)];
        let groups = group_by_parent(&items, ItemType::Goal);
        assert_eq!(groups[&GroupKey::Parent(7)].items.len(), 2);
        assert_eq!(groups[&GroupKey::Other].items.len(), 1);
    }

    #[test]
    fn dreams_share_one_unlabelled_group() {
        let items = vec![dream(1), dream(2)];
        let groups = group_by_parent(&items, ItemType::Dream);
        assert_eq!(groups.len(), 1);
        let empty = &groups[&GroupKey::Empty];
        assert!(empty.parent_label.is_none());
        assert_eq!(empty.items.len(), 2);
    }

    #[test]
    fn other_types_are_left_out() {
        let items = vec![dream(1), task(5, None), goal(2, None)];
        let groups = group_by_parent(&items, ItemType::Task);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[&GroupKey::Other].items[0].id(), 5);
    }

    #[test]
    fn empty_input_gives_no_groups() {
        let items: Vec<Item> = vec![];
        assert!(group_by_parent(&items, ItemType::Goal).is_empty());
    }
}
