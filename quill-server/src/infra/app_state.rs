use std::{fmt, sync::Arc};

use quill_core::auth::AuthCore;
use quill_core::database::{PostsRepository, UsersRepository};

use crate::infra::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UsersRepository>,
    pub posts: Arc<dyn PostsRepository>,
    pub auth: Arc<AuthCore>,
    pub config: Arc<Config>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Wire both repository ports to the same store.
    pub fn new<D>(store: Arc<D>, auth: AuthCore, config: Config) -> Self
    where
        D: UsersRepository + PostsRepository + 'static,
    {
        Self {
            users: store.clone(),
            posts: store,
            auth: Arc::new(auth),
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
