//! Single-slot document persistence.
//!
//! [`load`] and [`save`] fail soft: a broken or unavailable store degrades
//! to "changes are not saved" and never surfaces an error to the caller.
//! Blank documents are never stored; saving one removes the slot so the
//! next [`load`] falls back to the sample document.

mod store;

pub use store::{FileStore, KeyValueStore, MemoryStore, StorageError};

/// Read `key` from `store`, or `fallback` when the slot is missing, blank,
/// or the store cannot be read.
pub fn load<S: KeyValueStore + ?Sized>(store: &S, key: &str, fallback: &str) -> String {
    match store.get(key) {
        Ok(Some(value)) if !value.trim().is_empty() => value,
        Ok(_) => fallback.to_string(),
        Err(err) => {
            tracing::warn!(key, %err, "storage read failed, using fallback");
            fallback.to_string()
        }
    }
}

/// Persist the trimmed `value` under `key`, removing the slot when the
/// trimmed value is empty. Errors are logged and dropped.
pub fn save<S: KeyValueStore + ?Sized>(store: &mut S, key: &str, value: &str) {
    let trimmed = value.trim();
    let result = if trimmed.is_empty() {
        store.remove(key)
    } else {
        store.set(key, trimmed)
    };
    if let Err(err) = result {
        tracing::warn!(key, %err, "storage write failed, change not saved");
    }
}
