//! Compute-once cache with explicit reset.

use std::fmt;
use std::sync::{Arc, Mutex};

/// A slot filled at most once between resets.
///
/// The mutex is held across the initializer, so concurrent first callers
/// block until the winner has stored its result and then share it. A failed
/// initializer leaves the slot empty for the next caller.
pub struct LazyCell<T> {
    slot: Mutex<Option<Arc<T>>>,
}

impl<T> LazyCell<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    /// The cached value, without initializing.
    pub fn get(&self) -> Option<Arc<T>> {
        self.slot.lock().expect("lock poisoned").clone()
    }

    pub fn get_or_try_init<E>(&self, init: impl FnOnce() -> Result<T, E>) -> Result<Arc<T>, E> {
        let mut slot = self.slot.lock().expect("lock poisoned");
        if let Some(value) = slot.as_ref() {
            return Ok(Arc::clone(value));
        }
        let value = Arc::new(init()?);
        *slot = Some(Arc::clone(&value));
        Ok(value)
    }

    pub fn is_loaded(&self) -> bool {
        self.slot.lock().expect("lock poisoned").is_some()
    }

    /// Drop the cached value. Returns `true` if one was present.
    pub fn reset(&self) -> bool {
        self.slot.lock().expect("lock poisoned").take().is_some()
    }
}

impl<T> Default for LazyCell<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for LazyCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyCell")
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    use super::*;

    #[test]
    fn initializes_once() {
        let cell = LazyCell::new();
        let a = cell.get_or_try_init(|| Ok::<_, ()>(1)).unwrap();
        let b = cell.get_or_try_init(|| Ok::<_, ()>(2)).unwrap();
        assert_eq!((*a, *b), (1, 1));
    }

    #[test]
    fn failure_leaves_cell_empty() {
        let cell: LazyCell<u32> = LazyCell::new();
        assert_eq!(cell.get_or_try_init(|| Err("boom")).unwrap_err(), "boom");
        assert!(!cell.is_loaded());
        assert_eq!(*cell.get_or_try_init(|| Ok::<_, &str>(7)).unwrap(), 7);
    }

    #[test]
    fn reset_forces_reload() {
        let cell = LazyCell::new();
        cell.get_or_try_init(|| Ok::<_, ()>(1)).unwrap();
        assert!(cell.reset());
        assert!(!cell.reset());
        assert!(cell.get().is_none());
        assert_eq!(*cell.get_or_try_init(|| Ok::<_, ()>(2)).unwrap(), 2);
    }

    #[test]
    fn concurrent_first_access_runs_init_once() {
        let cell = LazyCell::new();
        let calls = AtomicUsize::new(0);
        thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    let v = cell
                        .get_or_try_init(|| {
                            calls.fetch_add(1, Ordering::SeqCst);
                            thread::sleep(Duration::from_millis(20));
                            Ok::<_, ()>(42)
                        })
                        .unwrap();
                    assert_eq!(*v, 42);
                });
            }
        });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
