use std::sync::Arc;

use crate::db::TodoRepository;
use crate::service::TodoService;
use crate::storage::ObjectStore;

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn TodoRepository>,
    pub store: Arc<dyn ObjectStore>,
}

impl AppState {
    pub fn service(&self) -> TodoService {
        TodoService::new(self.repo.clone(), self.store.clone())
    }
}
