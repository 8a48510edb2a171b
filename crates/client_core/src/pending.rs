use std::sync::Arc;

use tokio::{runtime::Handle, sync::Mutex};

type Resolve<S> = Box<dyn FnOnce(&mut S) + Send>;

/// Armed while a submission is outstanding. If the submitting future is
/// dropped or unwinds before it stores its own outcome, `resolve` runs
/// against the controller state so the in-progress outcome does not stick.
pub(crate) struct PendingGuard<S: Send + 'static> {
    state: Arc<Mutex<S>>,
    resolve: Option<Resolve<S>>,
}

impl<S: Send + 'static> PendingGuard<S> {
    pub(crate) fn arm(
        state: Arc<Mutex<S>>,
        resolve: impl FnOnce(&mut S) + Send + 'static,
    ) -> Self {
        Self {
            state,
            resolve: Some(Box::new(resolve)),
        }
    }

    /// The submission stored its own outcome; nothing left to clean up.
    pub(crate) fn disarm(mut self) {
        self.resolve = None;
    }
}

impl<S: Send + 'static> Drop for PendingGuard<S> {
    fn drop(&mut self) {
        let Some(resolve) = self.resolve.take() else {
            return;
        };
        // The lock is never held across an await, so this only fails under a
        // concurrent state read; the spawned task then finishes the cleanup.
        if let Ok(mut guard) = self.state.try_lock() {
            resolve(&mut guard);
            return;
        }
        if let Ok(handle) = Handle::try_current() {
            let state = self.state.clone();
            handle.spawn(async move {
                resolve(&mut *state.lock().await);
            });
        }
    }
}
