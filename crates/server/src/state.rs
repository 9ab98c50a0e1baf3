use std::sync::Arc;

use tally_receipt::{CompletionBackend, ReceiptPipeline};
use tally_storage::Store;

use crate::auth::JwtKeys;

pub type SharedBackend = Arc<dyn CompletionBackend>;

/// Shared by every request. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub pipeline: Arc<ReceiptPipeline<SharedBackend>>,
    pub jwt: Arc<JwtKeys>,
}

impl AppState {
    pub fn new(store: Store, pipeline: ReceiptPipeline<SharedBackend>, jwt: JwtKeys) -> Self {
        Self {
            store,
            pipeline: Arc::new(pipeline),
            jwt: Arc::new(jwt),
        }
    }
}
