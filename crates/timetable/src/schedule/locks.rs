//! Per-resource serialization of schedule creation.

use dashmap::DashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A resource a schedule entry occupies, one per conflict class.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub enum ResourceKey {
    Teacher(String),
    Classroom { class_name: String, section: String },
    Course(String),
}

impl std::fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKey::Teacher(id) => write!(f, "teacher:{id}"),
            ResourceKey::Classroom {
                class_name,
                section,
            } => write!(f, "class:{class_name}-{section}"),
            ResourceKey::Course(id) => write!(f, "course:{id}"),
        }
    }
}

/// Lock table keyed by resource.
///
/// Uses DashMap so lookups for unrelated resources don't contend. Holding the
/// locks for all three resources of an entry across the conflict check and the
/// insert makes creation linearizable among callers sharing one table. It does
/// nothing for writers in other processes.
#[derive(Default)]
pub struct ResourceLocks {
    locks: DashMap<ResourceKey, Arc<Mutex<()>>>,
}

impl ResourceLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets or creates the lock for the given resource.
    pub fn get_lock(&self, key: &ResourceKey) -> Arc<Mutex<()>> {
        self.locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Runs `f` while holding the locks of every key.
    ///
    /// Keys are locked in sorted order so two callers with overlapping key
    /// sets cannot deadlock.
    pub fn with_locked<T>(&self, keys: &[ResourceKey], f: impl FnOnce() -> T) -> T {
        let mut keys = keys.to_vec();
        keys.sort();
        keys.dedup();

        let handles: Vec<Arc<Mutex<()>>> = keys.iter().map(|k| self.get_lock(k)).collect();
        // Guarded data is (), so a poisoned lock is still usable
        let _guards: Vec<MutexGuard<'_, ()>> = handles
            .iter()
            .map(|h| h.lock().unwrap_or_else(PoisonError::into_inner))
            .collect();

        f()
    }

    /// Drops lock entries nobody is holding.
    pub fn prune(&self) {
        self.locks.retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    /// Returns the number of tracked resources.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    fn teacher(id: &str) -> ResourceKey {
        ResourceKey::Teacher(id.to_string())
    }

    #[test]
    fn test_same_key_returns_same_lock() {
        let locks = ResourceLocks::new();
        let a = locks.get_lock(&teacher("t1"));
        let b = locks.get_lock(&teacher("t1"));
        let c = locks.get_lock(&teacher("t2"));

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(locks.len(), 2);
    }

    #[test]
    fn test_with_locked_excludes_overlapping_key_sets() {
        let locks = Arc::new(ResourceLocks::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));

        let workers: Vec<_> = (0..8)
            .map(|i| {
                let locks = locks.clone();
                let inside = inside.clone();
                let max_inside = max_inside.clone();
                // Every worker shares the course key; key order differs per worker
                let mut keys = vec![
                    ResourceKey::Course("math".to_string()),
                    teacher(&format!("t{i}")),
                ];
                if i % 2 == 0 {
                    keys.reverse();
                }
                thread::spawn(move || {
                    locks.with_locked(&keys, || {
                        let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                        max_inside.fetch_max(now, Ordering::SeqCst);
                        thread::sleep(Duration::from_millis(2));
                        inside.fetch_sub(1, Ordering::SeqCst);
                    })
                })
            })
            .collect();

        for w in workers {
            w.join().unwrap();
        }
        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_prune_keeps_held_locks() {
        let locks = ResourceLocks::new();
        let held = locks.get_lock(&teacher("busy"));
        let _ = locks.get_lock(&teacher("idle"));

        locks.prune();
        assert_eq!(locks.len(), 1);
        drop(held);

        locks.prune();
        assert!(locks.is_empty());
    }
}
