//! In-memory `KvStore`/`BlobStore` implementations used by the service-layer
//! unit and integration tests, grounded on the `Memory*Store` pattern of
//! storing everything behind a `Mutex<HashMap<...>>` and iterating for scans.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::Result;

use super::{BlobStore, Increments, Index, ItemKey, KvStore, PutItem, Query, StoredItem};

#[derive(Debug, Clone)]
struct Entry {
    value: serde_json::Value,
    gsi1_pk: Option<String>,
    gsi1_sk: Option<String>,
    gsi2_pk: Option<String>,
    gsi2_sk: Option<String>,
}

#[derive(Default)]
pub struct MemoryKvStore {
    items: Mutex<HashMap<(String, String), Entry>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get_item(&self, key: &ItemKey) -> Result<Option<serde_json::Value>> {
        let items = self.items.lock().unwrap();
        Ok(items
            .get(&(key.pk.clone(), key.sk.clone()))
            .map(|e| e.value.clone()))
    }

    async fn put_item(&self, key: ItemKey, value: serde_json::Value, put: PutItem) -> Result<()> {
        let mut items = self.items.lock().unwrap();
        items.insert(
            (key.pk, key.sk),
            Entry {
                value,
                gsi1_pk: put.gsi1_pk,
                gsi1_sk: put.gsi1_sk,
                gsi2_pk: put.gsi2_pk,
                gsi2_sk: put.gsi2_sk,
            },
        );
        Ok(())
    }

    async fn delete_item(&self, key: &ItemKey) -> Result<()> {
        let mut items = self.items.lock().unwrap();
        items.remove(&(key.pk.clone(), key.sk.clone()));
        Ok(())
    }

    async fn query(&self, query: &Query) -> Result<Vec<StoredItem>> {
        let items = self.items.lock().unwrap();
        let mut results: Vec<StoredItem> = items
            .iter()
            .filter(|((pk, _sk), entry)| match query.index {
                Index::Primary => pk == &query.partition,
                Index::Gsi1 => entry.gsi1_pk.as_deref() == Some(query.partition.as_str()),
                Index::Gsi2 => entry.gsi2_pk.as_deref() == Some(query.partition.as_str()),
            })
            .filter(|((_pk, sk), entry)| {
                let Some(prefix) = &query.sort_key_prefix else {
                    return true;
                };
                let sort_key = match query.index {
                    Index::Primary => sk.as_str(),
                    Index::Gsi1 => entry.gsi1_sk.as_deref().unwrap_or(""),
                    Index::Gsi2 => entry.gsi2_sk.as_deref().unwrap_or(""),
                };
                sort_key.starts_with(prefix.as_str())
            })
            .map(|((pk, sk), entry)| StoredItem {
                key: ItemKey::new(pk.clone(), sk.clone()),
                gsi1_pk: entry.gsi1_pk.clone(),
                gsi1_sk: entry.gsi1_sk.clone(),
                gsi2_pk: entry.gsi2_pk.clone(),
                gsi2_sk: entry.gsi2_sk.clone(),
                value: entry.value.clone(),
            })
            .collect();

        results.sort_by(|a, b| a.key.sk.cmp(&b.key.sk));
        Ok(results)
    }

    async fn increment_item(
        &self,
        key: &ItemKey,
        increments: Increments,
        patch: serde_json::Value,
        gsi1_sk: Option<String>,
    ) -> Result<()> {
        let mut items = self.items.lock().unwrap();
        let slot = (key.pk.clone(), key.sk.clone());
        let current = items
            .get(&slot)
            .map(|e| e.value.clone())
            .unwrap_or(serde_json::json!({}));
        let merged = apply_increments(current, increments, patch);
        let entry = items.entry(slot).or_insert(Entry {
            value: serde_json::json!({}),
            gsi1_pk: None,
            gsi1_sk: None,
            gsi2_pk: None,
            gsi2_sk: None,
        });
        entry.value = merged;
        if let Some(gsi1_sk) = gsi1_sk {
            entry.gsi1_sk = Some(gsi1_sk);
        }
        Ok(())
    }
}

/// Adds each counter in `increments` onto the matching field of `current`
/// (treating a missing/non-numeric field as zero), then overlays `patch` on
/// top so last-writer-wins fields (e.g. `updatedAt`) land unconditionally.
pub(super) fn apply_increments(
    mut current: serde_json::Value,
    increments: Increments,
    patch: serde_json::Value,
) -> serde_json::Value {
    if !current.is_object() {
        current = serde_json::json!({});
    }
    let obj = current.as_object_mut().unwrap();

    let add_u64 = |obj: &mut serde_json::Map<String, serde_json::Value>, field: &str, delta: u64| {
        let existing = obj.get(field).and_then(|v| v.as_u64()).unwrap_or(0);
        obj.insert(field.to_string(), serde_json::json!(existing + delta));
    };
    let add_f64 = |obj: &mut serde_json::Map<String, serde_json::Value>, field: &str, delta: f64| {
        let existing = obj.get(field).and_then(|v| v.as_f64()).unwrap_or(0.0);
        obj.insert(field.to_string(), serde_json::json!(existing + delta));
    };

    // Field names match the `camelCase`-serialized persisted record
    // (`Conversation` carries `#[serde(rename_all = "camelCase")]`), since
    // this function operates on the same opaque JSON `put_item` stores.
    add_u64(obj, "messageCount", increments.message_count);
    add_u64(obj, "totalInputTokens", increments.total_input_tokens);
    add_u64(obj, "totalOutputTokens", increments.total_output_tokens);
    add_f64(obj, "totalCost", increments.total_cost);

    if let Some(patch_obj) = patch.as_object() {
        for (k, v) in patch_obj {
            obj.insert(k.clone(), v.clone());
        }
    }

    current
}

#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, (Vec<u8>, String)>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<()> {
        let mut blobs = self.blobs.lock().unwrap();
        blobs.insert(key.to_string(), (bytes, content_type.to_string()));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let blobs = self.blobs.lock().unwrap();
        Ok(blobs.get(key).map(|(bytes, _)| bytes.clone()))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut blobs = self.blobs.lock().unwrap();
        blobs.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let store = MemoryKvStore::new();
        let key = ItemKey::new("USER#1", "META");
        store
            .put_item(key.clone(), serde_json::json!({"name": "a"}), PutItem::default())
            .await
            .unwrap();
        let got = store.get_item(&key).await.unwrap().unwrap();
        assert_eq!(got["name"], "a");
    }

    #[tokio::test]
    async fn query_filters_by_gsi2_partition() {
        let store = MemoryKvStore::new();
        store
            .put_item(
                ItemKey::new("FILE#1", "META"),
                serde_json::json!({"id": 1}),
                PutItem {
                    gsi2_pk: Some("ORG#acme".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        store
            .put_item(
                ItemKey::new("FILE#2", "META"),
                serde_json::json!({"id": 2}),
                PutItem::default(),
            )
            .await
            .unwrap();

        let results = store.query(&Query::gsi2("ORG#acme")).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].value["id"], 1);
    }

    #[tokio::test]
    async fn increment_item_adds_onto_existing_counters() {
        let store = MemoryKvStore::new();
        let key = ItemKey::new("CONV#1", "META");
        store
            .put_item(
                key.clone(),
                serde_json::json!({"messageCount": 2, "totalCost": 0.5}),
                PutItem::default(),
            )
            .await
            .unwrap();

        store
            .increment_item(
                &key,
                Increments {
                    message_count: 2,
                    total_input_tokens: 10,
                    total_output_tokens: 20,
                    total_cost: 0.25,
                },
                serde_json::json!({"updatedAt": "now"}),
                Some("CONV#2024-01-02T00:00:00Z".to_string()),
            )
            .await
            .unwrap();

        let got = store.get_item(&key).await.unwrap().unwrap();
        assert_eq!(got["messageCount"], 4);
        assert_eq!(got["totalCost"], 0.75);
        assert_eq!(got["updatedAt"], "now");
    }

    #[tokio::test]
    async fn increment_item_refreshes_gsi1_sk_and_preserves_gsi1_pk() {
        let store = MemoryKvStore::new();
        let key = ItemKey::new("CONV#1", "META");
        store
            .put_item(
                key.clone(),
                serde_json::json!({"messageCount": 0}),
                PutItem {
                    gsi1_pk: Some("USER#u1".to_string()),
                    gsi1_sk: Some("CONV#2024-01-01T00:00:00Z".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        store
            .increment_item(
                &key,
                Increments {
                    message_count: 2,
                    ..Default::default()
                },
                serde_json::json!({"updatedAt": "2024-01-02T00:00:00Z"}),
                Some("CONV#2024-01-02T00:00:00Z".to_string()),
            )
            .await
            .unwrap();

        let results = store.query(&Query::gsi1("USER#u1")).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].gsi1_sk.as_deref(), Some("CONV#2024-01-02T00:00:00Z"));
    }
}
