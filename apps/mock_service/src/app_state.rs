use std::{
    collections::HashMap,
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use tokio::sync::Mutex;

use crate::{api::StoredMatrix, config::Settings};

pub(crate) struct AppState {
    pub(crate) simulated_delay: Duration,
    pub(crate) max_upload_bytes: usize,
    pub(crate) uploads: Mutex<HashMap<String, StoredMatrix>>,
    next_upload: AtomicU64,
}

impl AppState {
    pub(crate) fn new(settings: &Settings) -> Self {
        Self {
            simulated_delay: Duration::from_millis(settings.simulated_delay_ms),
            max_upload_bytes: settings.max_upload_bytes,
            uploads: Mutex::new(HashMap::new()),
            next_upload: AtomicU64::new(1),
        }
    }

    /// Server-side name for a new upload: a running counter prefixed to the
    /// client's filename.
    pub(crate) fn next_stored_name(&self, original_filename: &str) -> String {
        let id = self.next_upload.fetch_add(1, Ordering::Relaxed);
        format!("{id:04}_{original_filename}")
    }
}
