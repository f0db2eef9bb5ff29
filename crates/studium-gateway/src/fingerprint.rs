//! Duplicate-request detection.
//!
//! Each outbound operation registers a fingerprint for its duration; a
//! second submission with a matching fingerprint is rejected immediately
//! instead of queued. The registry is owned by the gateway instance, and
//! entries are released through an RAII guard so no exit path can leak one.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use studium_core::error::{Result, StudiumError};

/// Derived key identifying a logical in-flight operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    key: String,
}

impl Fingerprint {
    /// Fingerprint for a question: the operation tag plus a fixed-length
    /// prefix of the trimmed question text.
    pub fn for_question(question: &str, prefix_len: usize) -> Self {
        let prefix: String = question.trim().chars().take(prefix_len).collect();
        Self {
            key: format!("ask-{prefix}"),
        }
    }

    /// Fingerprint for an operation that allows one transfer at a time
    /// regardless of arguments (the upload targets).
    pub fn for_operation(operation: &str) -> Self {
        Self {
            key: operation.to_string(),
        }
    }

    /// The registry key.
    pub fn as_str(&self) -> &str {
        &self.key
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.key)
    }
}

/// Registry of in-flight request fingerprints.
///
/// The only shared mutable state in the gateway. Lock scope is a single
/// insert or remove; nothing is held across await points.
#[derive(Debug, Default)]
pub struct RequestRegistry {
    inflight: Mutex<HashSet<String>>,
}

impl RequestRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `fingerprint`, failing with `DuplicateInFlight` if an entry
    /// with the same key is already registered.
    ///
    /// The entry is held until the returned guard drops.
    pub fn acquire(self: &Arc<Self>, fingerprint: Fingerprint) -> Result<InFlightGuard> {
        let mut inflight = self.inflight.lock().expect("fingerprint registry poisoned");
        if !inflight.insert(fingerprint.key.clone()) {
            return Err(StudiumError::duplicate_in_flight(fingerprint.key));
        }
        drop(inflight);

        Ok(InFlightGuard {
            registry: Arc::clone(self),
            key: fingerprint.key,
        })
    }

    /// Whether a matching entry is currently registered.
    pub fn is_inflight(&self, fingerprint: &Fingerprint) -> bool {
        self.inflight
            .lock()
            .expect("fingerprint registry poisoned")
            .contains(&fingerprint.key)
    }

    fn release(&self, key: &str) {
        self.inflight
            .lock()
            .expect("fingerprint registry poisoned")
            .remove(key);
    }
}

/// Releases its registry entry on drop, whichever way the call exits.
#[derive(Debug)]
pub struct InFlightGuard {
    registry: Arc<RequestRegistry>,
    key: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.registry.release(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_fingerprint_uses_trimmed_prefix() {
        let a = Fingerprint::for_question("  What is the role of mitochondria in cells?", 20);
        let b = Fingerprint::for_question("What is the role of mitochondria in plants?", 20);
        // identical first 20 characters collide on purpose
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "ask-What is the role of ");
    }

    #[test]
    fn test_short_question_fingerprint() {
        let fp = Fingerprint::for_question("Why?", 20);
        assert_eq!(fp.as_str(), "ask-Why?");
    }

    #[test]
    fn test_acquire_rejects_duplicate() {
        let registry = Arc::new(RequestRegistry::new());
        let fp = Fingerprint::for_operation("ingest-document");

        let guard = registry.acquire(fp.clone()).unwrap();
        let err = registry.acquire(fp.clone()).unwrap_err();
        assert!(err.is_duplicate());

        drop(guard);
        assert!(!registry.is_inflight(&fp));
        // a repeat submission succeeds once the first resolved
        let _guard = registry.acquire(fp).unwrap();
    }

    #[test]
    fn test_guard_releases_on_error_path() {
        let registry = Arc::new(RequestRegistry::new());
        let fp = Fingerprint::for_question("what is x", 20);

        let failing_call = |registry: &Arc<RequestRegistry>| -> Result<()> {
            let _guard = registry.acquire(Fingerprint::for_question("what is x", 20))?;
            Err(StudiumError::network("connection refused", true))
        };
        assert!(failing_call(&registry).is_err());
        assert!(!registry.is_inflight(&fp));
    }

    #[test]
    fn test_distinct_fingerprints_are_independent() {
        let registry = Arc::new(RequestRegistry::new());
        let _doc = registry
            .acquire(Fingerprint::for_operation("ingest-document"))
            .unwrap();
        let _ask = registry
            .acquire(Fingerprint::for_question("unrelated question", 20))
            .unwrap();
    }
}
