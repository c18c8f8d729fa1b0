use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    config::Config,
    services::{
        media::{MediaManager, ObjectStorage},
        posts::PostManager,
        registry::CategoryRegistry,
        session::SessionAuthenticator,
    },
    store::Store,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub registry: Arc<CategoryRegistry>,
    pub sessions: SessionAuthenticator,
    pub media: MediaManager,
    pub posts: PostManager,
}

impl AppState {
    /// Wires every service over one store and one object storage backend.
    pub fn new(config: Config, store: Arc<dyn Store>, storage: Arc<dyn ObjectStorage>) -> Self {
        let registry = Arc::new(CategoryRegistry::builtin());
        let sessions = SessionAuthenticator::new(store.clone(), &config);
        let media = MediaManager::new(store.clone(), storage);
        let posts = PostManager::new(store, registry.clone(), media.clone());

        Self {
            config,
            registry,
            sessions,
            media,
            posts,
        }
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for Arc<CategoryRegistry> {
    fn from_ref(state: &AppState) -> Self {
        state.registry.clone()
    }
}

impl FromRef<AppState> for SessionAuthenticator {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}

impl FromRef<AppState> for MediaManager {
    fn from_ref(state: &AppState) -> Self {
        state.media.clone()
    }
}

impl FromRef<AppState> for PostManager {
    fn from_ref(state: &AppState) -> Self {
        state.posts.clone()
    }
}
