use std::sync::Arc;

use crate::config::Config;
use crate::identity::IdentityProvider;
use crate::providers::registry::ProviderTag;
use crate::providers::ChatProvider;
use crate::store::{BlobStore, KvStore};

/// Shared handles every handler/service needs: the wide-table store, the
/// blob store, the identity provider, and one `ChatProvider` per provider tag
/// in the model registry. Cloning is cheap — every field is an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn KvStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub bedrock: Arc<dyn ChatProvider>,
    pub gemini: Arc<dyn ChatProvider>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn KvStore>,
        blobs: Arc<dyn BlobStore>,
        identity: Arc<dyn IdentityProvider>,
        bedrock: Arc<dyn ChatProvider>,
        gemini: Arc<dyn ChatProvider>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            store,
            blobs,
            identity,
            bedrock,
            gemini,
            config,
        }
    }

    pub fn provider_for(&self, tag: ProviderTag) -> Arc<dyn ChatProvider> {
        match tag {
            ProviderTag::Bedrock => self.bedrock.clone(),
            ProviderTag::Gemini => self.gemini.clone(),
        }
    }
}
