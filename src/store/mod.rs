//! Storage abstractions over the single wide key-value table (§3, §4.1) and
//! the flat-namespace blob store. Two traits (`KvStore`, `BlobStore`) decouple
//! the domain services from the concrete AWS backends so the in-memory test
//! doubles in `memory` can stand in for them without a live DynamoDB/S3.

pub mod dynamo;
pub mod memory;
pub mod s3;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::Result;

/// A single (partition key, sort key) addressed item.
#[derive(Debug, Clone)]
pub struct ItemKey {
    pub pk: String,
    pub sk: String,
}

impl ItemKey {
    pub fn new(pk: impl Into<String>, sk: impl Into<String>) -> Self {
        Self {
            pk: pk.into(),
            sk: sk.into(),
        }
    }
}

/// Which index a query runs against: the table's own (PK, SK), or one of the
/// two global secondary indexes described in §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Index {
    Primary,
    Gsi1,
    Gsi2,
}

/// A query against one partition, optionally narrowed by a sort-key prefix.
#[derive(Debug, Clone)]
pub struct Query {
    pub index: Index,
    pub partition: String,
    pub sort_key_prefix: Option<String>,
}

impl Query {
    pub fn primary(partition: impl Into<String>) -> Self {
        Self {
            index: Index::Primary,
            partition: partition.into(),
            sort_key_prefix: None,
        }
    }

    pub fn gsi1(partition: impl Into<String>) -> Self {
        Self {
            index: Index::Gsi1,
            partition: partition.into(),
            sort_key_prefix: None,
        }
    }

    pub fn gsi2(partition: impl Into<String>) -> Self {
        Self {
            index: Index::Gsi2,
            partition: partition.into(),
            sort_key_prefix: None,
        }
    }

    pub fn with_sort_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.sort_key_prefix = Some(prefix.into());
        self
    }
}

/// A single wide-table item: the two-part key, the GSI projections the item
/// was written with (if any), and the JSON-serialized domain record.
#[derive(Debug, Clone)]
pub struct StoredItem {
    pub key: ItemKey,
    pub gsi1_pk: Option<String>,
    pub gsi1_sk: Option<String>,
    pub gsi2_pk: Option<String>,
    pub gsi2_sk: Option<String>,
    pub value: serde_json::Value,
}

/// An item about to be written, carrying the GSI projections the caller
/// wants attached (computed by the model types, e.g. `FileRecord::gsi2_partition`).
#[derive(Debug, Clone, Default)]
pub struct PutItem {
    pub gsi1_pk: Option<String>,
    pub gsi1_sk: Option<String>,
    pub gsi2_pk: Option<String>,
    pub gsi2_sk: Option<String>,
}

/// Numeric counters to atomically increment on a conversation's metadata item
/// (§4.6, §9 Open Question #4: last-writer-wins on the non-numeric fields,
/// additive on these).
#[derive(Debug, Clone, Default)]
pub struct Increments {
    pub message_count: u64,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub total_cost: f64,
}

#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get_item(&self, key: &ItemKey) -> Result<Option<serde_json::Value>>;

    async fn put_item(&self, key: ItemKey, value: serde_json::Value, put: PutItem) -> Result<()>;

    async fn delete_item(&self, key: &ItemKey) -> Result<()>;

    async fn query(&self, query: &Query) -> Result<Vec<StoredItem>>;

    /// Atomically applies `increments` to a numeric-field item and
    /// last-writer-wins-overwrites `patch` fields on top, returning nothing:
    /// callers that need the new totals re-read the item. The item's
    /// existing GSI projections are preserved untouched, except `GSI1SK`,
    /// which is refreshed to `gsi1_sk` when given (e.g. bumping a
    /// conversation's recency ordering to its new `updatedAt`).
    async fn increment_item(
        &self,
        key: &ItemKey,
        increments: Increments,
        patch: serde_json::Value,
        gsi1_sk: Option<String>,
    ) -> Result<()>;
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<()>;

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    async fn delete(&self, key: &str) -> Result<()>;
}

/// Deserializes a stored item's JSON payload, translating a decode failure
/// into a storage error rather than panicking — corrupt rows should fail a
/// single request, not the process.
pub fn decode<T: DeserializeOwned>(value: serde_json::Value) -> Result<T> {
    serde_json::from_value(value).map_err(Into::into)
}

pub fn encode<T: Serialize>(value: &T) -> Result<serde_json::Value> {
    serde_json::to_value(value).map_err(Into::into)
}
