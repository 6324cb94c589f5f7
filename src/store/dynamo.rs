//! DynamoDB-backed `KvStore`: a single table keyed on `PK`/`SK`, with two GSIs
//! (`GSI1PK`/`GSI1SK`, `GSI2PK`/`GSI2SK`) projecting the access patterns in §3.

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;

use crate::error::{Error, Result};

use super::{Increments, Index, ItemKey, KvStore, PutItem, Query, StoredItem};

pub struct DynamoStore {
    client: Client,
    table: String,
}

impl DynamoStore {
    pub fn new(client: Client, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }
}

fn av_s(s: impl Into<String>) -> AttributeValue {
    AttributeValue::S(s.into())
}

/// The domain record is stored as a single JSON-encoded string attribute;
/// the table's own attributes carry only keys and GSI projections so DynamoDB
/// never needs to understand the item shape.
const VALUE_ATTR: &str = "Value";

fn item_to_stored(
    item: &std::collections::HashMap<String, AttributeValue>,
) -> Result<StoredItem> {
    let get_s = |k: &str| -> Option<String> {
        item.get(k).and_then(|v| v.as_s().ok()).map(|s| s.to_string())
    };
    let pk = get_s("PK").ok_or_else(|| Error::StorageError("item missing PK".into()))?;
    let sk = get_s("SK").ok_or_else(|| Error::StorageError("item missing SK".into()))?;
    let raw = get_s(VALUE_ATTR).ok_or_else(|| Error::StorageError("item missing Value".into()))?;
    let value: serde_json::Value = serde_json::from_str(&raw)?;

    Ok(StoredItem {
        key: ItemKey::new(pk, sk),
        gsi1_pk: get_s("GSI1PK"),
        gsi1_sk: get_s("GSI1SK"),
        gsi2_pk: get_s("GSI2PK"),
        gsi2_sk: get_s("GSI2SK"),
        value,
    })
}

impl DynamoStore {
    async fn get_stored_item(&self, key: &ItemKey) -> Result<Option<StoredItem>> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table)
            .key("PK", av_s(&key.pk))
            .key("SK", av_s(&key.sk))
            .send()
            .await
            .map_err(|e| Error::StorageError(format!("get_item: {e}")))?;

        match output.item {
            Some(item) => Ok(Some(item_to_stored(&item)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl KvStore for DynamoStore {
    async fn get_item(&self, key: &ItemKey) -> Result<Option<serde_json::Value>> {
        Ok(self.get_stored_item(key).await?.map(|item| item.value))
    }

    async fn put_item(&self, key: ItemKey, value: serde_json::Value, put: PutItem) -> Result<()> {
        let mut request = self
            .client
            .put_item()
            .table_name(&self.table)
            .item("PK", av_s(&key.pk))
            .item("SK", av_s(&key.sk))
            .item(VALUE_ATTR, av_s(serde_json::to_string(&value)?));

        if let Some(pk) = put.gsi1_pk {
            request = request.item("GSI1PK", av_s(pk));
        }
        if let Some(sk) = put.gsi1_sk {
            request = request.item("GSI1SK", av_s(sk));
        }
        if let Some(pk) = put.gsi2_pk {
            request = request.item("GSI2PK", av_s(pk));
        }
        if let Some(sk) = put.gsi2_sk {
            request = request.item("GSI2SK", av_s(sk));
        }

        request
            .send()
            .await
            .map_err(|e| Error::StorageError(format!("put_item: {e}")))?;
        Ok(())
    }

    async fn delete_item(&self, key: &ItemKey) -> Result<()> {
        self.client
            .delete_item()
            .table_name(&self.table)
            .key("PK", av_s(&key.pk))
            .key("SK", av_s(&key.sk))
            .send()
            .await
            .map_err(|e| Error::StorageError(format!("delete_item: {e}")))?;
        Ok(())
    }

    async fn query(&self, query: &Query) -> Result<Vec<StoredItem>> {
        let (index_name, pk_attr, sk_attr) = match query.index {
            Index::Primary => (None, "PK", "SK"),
            Index::Gsi1 => (Some("GSI1"), "GSI1PK", "GSI1SK"),
            Index::Gsi2 => (Some("GSI2"), "GSI2PK", "GSI2SK"),
        };

        let mut key_condition = format!("{pk_attr} = :pk");
        let mut request = self
            .client
            .query()
            .table_name(&self.table)
            .expression_attribute_values(":pk", av_s(&query.partition));

        if let Some(prefix) = &query.sort_key_prefix {
            key_condition.push_str(&format!(" AND begins_with({sk_attr}, :sk)"));
            request = request.expression_attribute_values(":sk", av_s(prefix));
        }

        if let Some(index_name) = index_name {
            request = request.index_name(index_name);
        }

        let output = request
            .key_condition_expression(key_condition)
            .send()
            .await
            .map_err(|e| Error::StorageError(format!("query: {e}")))?;

        output
            .items
            .unwrap_or_default()
            .iter()
            .map(item_to_stored)
            .collect()
    }

    async fn increment_item(
        &self,
        key: &ItemKey,
        increments: Increments,
        patch: serde_json::Value,
        gsi1_sk: Option<String>,
    ) -> Result<()> {
        // A real DynamoDB update would use an `ADD`/`SET` UpdateExpression so
        // the counters are incremented server-side without a read-modify-write
        // race. Expressed here via the same get/put path the in-memory store
        // uses, since the wide-table item is opaque JSON to this layer.
        // `put_item` replaces the whole item, so the existing GSI projections
        // must be read back and carried forward or they are silently dropped.
        let existing = self.get_stored_item(key).await?;
        let current = existing
            .as_ref()
            .map(|item| item.value.clone())
            .unwrap_or(serde_json::json!({}));
        let merged = super::memory::apply_increments(current, increments, patch);

        let put = PutItem {
            gsi1_pk: existing.as_ref().and_then(|item| item.gsi1_pk.clone()),
            gsi1_sk: gsi1_sk.or_else(|| existing.as_ref().and_then(|item| item.gsi1_sk.clone())),
            gsi2_pk: existing.as_ref().and_then(|item| item.gsi2_pk.clone()),
            gsi2_sk: existing.as_ref().and_then(|item| item.gsi2_sk.clone()),
        };

        self.put_item(key.clone(), merged, put).await
    }
}
