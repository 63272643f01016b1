// src/state.rs

use std::sync::Arc;

use axum::extract::FromRef;

use crate::{config::Config, store::QuizStore};

pub type SharedStore = Arc<dyn QuizStore>;

#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub config: Config,
}

impl FromRef<AppState> for SharedStore {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
