//! In-memory [`ListStore`] with server-style identifiers, used by tests and offline runs.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::model::{Attachment, FieldValue, Fields, ItemId, Record};
use crate::ports::{ListStore, StoreError};
use crate::query::{ID_FIELD, Query};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Store operations that can be made to fail once.
pub enum Operation {
    /// [`ListStore::add`].
    Add,
    /// [`ListStore::update`].
    Update,
    /// [`ListStore::delete`].
    Delete,
    /// [`ListStore::delete_attachment`].
    DeleteAttachment,
    /// [`ListStore::add_attachment`].
    AddAttachment,
}

#[derive(Debug, Default)]
struct StoredItem {
    fields: Fields,
    attachments: Vec<Attachment>,
}

#[derive(Debug, Default)]
struct State {
    next_id: u64,
    lists: HashMap<String, BTreeMap<ItemId, StoredItem>>,
    failures: Vec<Operation>,
}

impl State {
    fn take_failure(&mut self, operation: Operation) -> Result<(), StoreError> {
        match self.failures.iter().position(|planned| *planned == operation) {
            Some(index) => {
                self.failures.remove(index);
                Err(StoreError::Server {
                    status: 503,
                    message: Some(format!("injected {operation:?} failure")),
                })
            }
            None => Ok(()),
        }
    }

    fn item_mut(&mut self, list: &str, id: ItemId) -> Result<&mut StoredItem, StoreError> {
        self.lists
            .get_mut(list)
            .and_then(|items| items.get_mut(&id))
            .ok_or(StoreError::ItemNotFound(id))
    }
}

/// List store keeping every list in process memory.
///
/// Identifiers are shared across lists and never reused, like a server would.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    mutations: AtomicUsize,
}

impl MemoryStore {
    /// Empty store; the first item gets id 1.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next call of `operation` fail with a server error.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Internal`] if the store lock is poisoned.
    pub fn fail_next(&self, operation: Operation) -> Result<(), StoreError> {
        self.lock()?.failures.push(operation);
        Ok(())
    }

    /// Number of successful writes (items and attachments) so far.
    #[must_use]
    pub fn mutation_count(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    /// Number of items currently held by a list.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Internal`] if the store lock is poisoned.
    pub fn item_count(&self, list: &str) -> Result<usize, StoreError> {
        Ok(self.lock()?.lists.get(list).map_or(0, BTreeMap::len))
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, StoreError> {
        self.state
            .lock()
            .map_err(|err| StoreError::Internal(format!("memory store lock poisoned: {err}")))
    }

    fn mutated(&self) {
        self.mutations.fetch_add(1, Ordering::SeqCst);
    }
}

fn project(fields: &Fields, select: &[String]) -> Fields {
    if select.is_empty() {
        return fields.clone();
    }
    fields
        .iter()
        .filter(|(name, _)| select.iter().any(|wanted| wanted == *name))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

fn sort_key(record: &Record, field: &str) -> Option<String> {
    if field == ID_FIELD {
        return Some(format!("{:020}", record.id.0));
    }
    record.field(field).and_then(FieldValue::display_text)
}

#[async_trait]
impl ListStore for MemoryStore {
    async fn items(&self, list: &str, query: &Query) -> Result<Vec<Record>, StoreError> {
        let state = self.lock()?;
        let Some(items) = state.lists.get(list) else {
            return Ok(Vec::new());
        };

        let mut records = items
            .iter()
            .filter(|(id, item)| {
                query
                    .filter
                    .as_ref()
                    .is_none_or(|filter| filter.matches(**id, &item.fields))
            })
            .map(|(id, item)| Record {
                id: *id,
                fields: project(&item.fields, &query.select),
                attachments: if query.expand_attachments {
                    item.attachments
                        .iter()
                        .map(|file| file.file_name.clone())
                        .collect()
                } else {
                    Vec::new()
                },
            })
            .collect::<Vec<_>>();

        if let Some(order) = &query.order_by {
            records.sort_by_cached_key(|record| sort_key(record, &order.field));
            if order.descending {
                records.reverse();
            }
        }
        if let Some(top) = query.top {
            records.truncate(top);
        }
        Ok(records)
    }

    async fn add(&self, list: &str, fields: &Fields) -> Result<ItemId, StoreError> {
        let mut state = self.lock()?;
        state.take_failure(Operation::Add)?;
        state.next_id += 1;
        let id = ItemId(state.next_id);
        let stored = fields
            .iter()
            .filter(|(_, value)| **value != FieldValue::Null)
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        state.lists.entry(list.to_owned()).or_default().insert(
            id,
            StoredItem {
                fields: stored,
                attachments: Vec::new(),
            },
        );
        self.mutated();
        Ok(id)
    }

    async fn update(&self, list: &str, id: ItemId, fields: &Fields) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        state.take_failure(Operation::Update)?;
        let item = state.item_mut(list, id)?;
        for (name, value) in fields {
            if *value == FieldValue::Null {
                item.fields.remove(name);
            } else {
                item.fields.insert(name.clone(), value.clone());
            }
        }
        self.mutated();
        Ok(())
    }

    async fn delete(&self, list: &str, id: ItemId) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        state.take_failure(Operation::Delete)?;
        state
            .lists
            .get_mut(list)
            .and_then(|items| items.remove(&id))
            .ok_or(StoreError::ItemNotFound(id))?;
        self.mutated();
        Ok(())
    }

    async fn attachments(&self, list: &str, id: ItemId) -> Result<Vec<String>, StoreError> {
        let mut state = self.lock()?;
        let item = state.item_mut(list, id)?;
        Ok(item
            .attachments
            .iter()
            .map(|file| file.file_name.clone())
            .collect())
    }

    async fn delete_attachment(
        &self,
        list: &str,
        id: ItemId,
        file_name: &str,
    ) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        state.take_failure(Operation::DeleteAttachment)?;
        let item = state.item_mut(list, id)?;
        let index = item
            .attachments
            .iter()
            .position(|file| file.file_name == file_name)
            .ok_or_else(|| StoreError::AttachmentNotFound {
                id,
                file_name: file_name.to_owned(),
            })?;
        item.attachments.remove(index);
        self.mutated();
        Ok(())
    }

    async fn add_attachment(
        &self,
        list: &str,
        id: ItemId,
        file: &Attachment,
    ) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        state.take_failure(Operation::AddAttachment)?;
        let item = state.item_mut(list, id)?;
        if item
            .attachments
            .iter()
            .any(|existing| existing.file_name == file.file_name)
        {
            return Err(StoreError::Server {
                status: 409,
                message: Some(format!("A file named {} already exists.", file.file_name)),
            });
        }
        item.attachments.push(file.clone());
        self.mutated();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Filter;

    fn fields(title: &str) -> Fields {
        let mut fields = Fields::new();
        fields.insert("Title".to_owned(), FieldValue::from(title));
        fields
    }

    #[tokio::test]
    async fn ids_increase_and_are_never_reused() {
        let store = MemoryStore::new();
        let first = store.add("L", &fields("A")).await.expect("add");
        store.delete("L", first).await.expect("delete");
        let second = store.add("L", &fields("A")).await.expect("add");
        assert!(second > first);
    }

    #[tokio::test]
    async fn query_filters_orders_and_limits() {
        let store = MemoryStore::new();
        for title in ["A", "B", "A", "A"] {
            store.add("L", &fields(title)).await.expect("add");
        }

        let query = Query::new()
            .select([ID_FIELD])
            .filter(Filter::eq("Title", "A"))
            .order_by_desc(ID_FIELD)
            .top(2);
        let records = store.items("L", &query).await.expect("items");

        let ids = records.iter().map(|record| record.id).collect::<Vec<_>>();
        assert_eq!(ids, [ItemId(4), ItemId(3)]);
        assert!(records.iter().all(|record| record.fields.is_empty()));
    }

    #[tokio::test]
    async fn update_merges_and_null_clears() {
        let store = MemoryStore::new();
        let id = store.add("L", &fields("A")).await.expect("add");

        let mut patch = Fields::new();
        patch.insert("marca".to_owned(), FieldValue::from("Volvo"));
        store.update("L", id, &patch).await.expect("update");

        let mut clear = Fields::new();
        clear.insert("marca".to_owned(), FieldValue::Null);
        let records = store.items("L", &Query::new()).await.expect("items");
        assert_eq!(records.first().map(|record| record.text("marca")), Some("Volvo".to_owned()));
        assert_eq!(records.first().map(|record| record.text("Title")), Some("A".to_owned()));

        store.update("L", id, &clear).await.expect("update");
        let records = store.items("L", &Query::new()).await.expect("items");
        assert!(records.first().is_some_and(|record| record.field("marca").is_none()));
    }

    #[tokio::test]
    async fn injected_failures_fire_once() {
        let store = MemoryStore::new();
        let id = store.add("L", &fields("A")).await.expect("add");
        store
            .fail_next(Operation::AddAttachment)
            .expect("plan failure");

        let file = Attachment::new("a.pdf", vec![1, 2]);
        assert!(store.add_attachment("L", id, &file).await.is_err());
        store.add_attachment("L", id, &file).await.expect("second try");
        assert_eq!(store.attachments("L", id).await.expect("attachments"), ["a.pdf"]);
    }

    #[tokio::test]
    async fn missing_items_are_reported() {
        let store = MemoryStore::new();
        let result = store.delete("L", ItemId(9)).await;
        assert!(matches!(result, Err(StoreError::ItemNotFound(ItemId(9)))));
    }
}
