use axum::extract::FromRef;

use crate::directory_store::DirectoryStore;
use crate::dispatch::DispatcherHandle;
use crate::listing::ListingCache;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type GuardedDirectoryStore = Arc<dyn DirectoryStore>;
pub type GuardedListingCache = Arc<ListingCache>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub store: GuardedDirectoryStore,
    pub cache: GuardedListingCache,
    pub dispatcher: DispatcherHandle,
    pub hash: String,
}

impl FromRef<ServerState> for GuardedDirectoryStore {
    fn from_ref(input: &ServerState) -> Self {
        input.store.clone()
    }
}

impl FromRef<ServerState> for GuardedListingCache {
    fn from_ref(input: &ServerState) -> Self {
        input.cache.clone()
    }
}

impl FromRef<ServerState> for DispatcherHandle {
    fn from_ref(input: &ServerState) -> Self {
        input.dispatcher.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
