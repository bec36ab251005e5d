use std::sync::Arc;

use solace_store::Store;

pub struct AppStateInner {
    pub store: Arc<Store>,
}

pub type AppState = Arc<AppStateInner>;
