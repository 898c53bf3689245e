use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock `mutex`, recovering the data if a listener panicked while holding it.
/// Session data stays consistent across a panic, as every critical section is a plain assignment.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
