use std::sync::{Arc, Mutex};
use std::time::Instant;

use reasoning_core::FrameCoordinator;

/// Shared application state handed to every Axum handler.
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<Mutex<FrameCoordinator>>,
    pub host: String,
    pub port: u16,
    pub production: bool,
    pub started_at: Instant,
}
