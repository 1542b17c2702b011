//! Small helpers shared across the server modules.

use std::sync::{Mutex, MutexGuard};

/// Lock a std mutex, recovering the data if a panicking holder poisoned it.
/// Every structure guarded this way stays consistent between statements, so
/// the poison flag carries no information for us.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
