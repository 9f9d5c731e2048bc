//! Process-wide hooks run whenever an index is created.
//!
//! Observers are called synchronously, in registration order, on the thread
//! that creates the index and before [`crate::index::Index::create`]
//! returns. Registration and removal may happen from any thread.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;

use crate::schema::spec::IndexSpec;

/// Callback invoked with the freshly created schema.
pub type CreateObserver = Arc<dyn Fn(&IndexSpec) + Send + Sync>;

/// Handle returned by [`register_on_create`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

static OBSERVERS: LazyLock<RwLock<Vec<(ObserverId, CreateObserver)>>> =
    LazyLock::new(|| RwLock::new(Vec::new()));

/// Register an observer for index creation.
pub fn register_on_create<F>(observer: F) -> ObserverId
where
    F: Fn(&IndexSpec) + Send + Sync + 'static,
{
    let id = ObserverId(NEXT_ID.fetch_add(1, Ordering::Relaxed));
    OBSERVERS.write().push((id, Arc::new(observer)));
    id
}

/// Remove an observer. Returns false if it was not registered.
pub fn unregister_on_create(id: ObserverId) -> bool {
    let mut observers = OBSERVERS.write();
    let before = observers.len();
    observers.retain(|(oid, _)| *oid != id);
    observers.len() != before
}

/// Run every registered observer against `spec`.
///
/// The list is copied first so an observer may register or remove
/// observers without deadlocking.
pub(crate) fn notify_created(spec: &IndexSpec) {
    let observers: Vec<CreateObserver> = OBSERVERS
        .read()
        .iter()
        .map(|(_, observer)| Arc::clone(observer))
        .collect();
    for observer in observers {
        observer(spec);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndexConfig;
    use parking_lot::Mutex;

    #[test]
    fn test_register_notify_unregister() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let id = register_on_create(move |spec| sink.lock().push(spec.name().to_string()));

        let spec = IndexSpec::new("observed_idx", &IndexConfig::default()).unwrap();
        notify_created(&spec);
        assert!(seen.lock().iter().any(|n| n == "observed_idx"));

        assert!(unregister_on_create(id));
        assert!(!unregister_on_create(id));

        let count = seen.lock().len();
        notify_created(&spec);
        assert_eq!(seen.lock().len(), count);
    }
}
