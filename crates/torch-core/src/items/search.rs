use super::{ItemId, ItemRef, ItemRow, ItemSet};

/// First item with `id`, looking through dreams, then goals, then tasks.
///
/// Ids are only unique within one type, so a goal shadows a task with the
/// same id.
pub fn find_item_by_id(id: ItemId, items: &ItemSet) -> Option<ItemRef<'_>> {
    items.iter().find(|item| item.id() == id)
}

/// Rows for the items whose title contains `search_text`, ignoring case.
/// An empty search matches everything.
pub fn filter_and_project<'a>(
    items: impl IntoIterator<Item = ItemRef<'a>>,
    search_text: &str,
) -> Vec<ItemRow> {
    let needle = search_text.to_lowercase();
    items
        .into_iter()
        .filter(|item| item.title().to_lowercase().contains(&needle))
        .map(ItemRef::row)
        .collect()
}
