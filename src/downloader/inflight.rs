//! Process-wide set of digests currently being downloaded.
//!
//! A digest is a member if and only if some worker sits between claiming and
//! releasing it. Claiming is a single check-and-insert under one lock, so two
//! workers can never both win the same digest. The map is never exposed; the
//! only ways in are [`InFlightTracker::try_claim`] and
//! [`InFlightTracker::release`].

use crate::digest::Digest;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Concurrent set of in-flight digests.
///
/// Cloning is cheap; every clone shares the same set.
#[derive(Debug, Clone, Default)]
pub struct InFlightTracker {
    /// Digest to the id of the worker owning it.
    owners: Arc<Mutex<HashMap<Digest, usize>>>,
}

impl InFlightTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    fn owners(&self) -> MutexGuard<'_, HashMap<Digest, usize>> {
        // The map is never left half-updated, so a poisoned lock is still usable.
        self.owners.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Atomically claim `digest` for worker `owner`.
    ///
    /// Returns `None` when another owner already holds it. The claim is
    /// released when the returned guard is dropped, including during a panic.
    pub fn try_claim(&self, digest: Digest, owner: usize) -> Option<InFlightClaim> {
        let mut owners = self.owners();
        if owners.contains_key(&digest) {
            return None;
        }
        owners.insert(digest, owner);
        Some(InFlightClaim {
            tracker: self.clone(),
            digest,
            owner,
        })
    }

    /// Remove `digest` from the set. Releasing an absent digest is a no-op.
    pub fn release(&self, digest: &Digest) {
        self.owners().remove(digest);
    }

    /// Whether some worker currently holds `digest`.
    pub fn contains(&self, digest: &Digest) -> bool {
        self.owners().contains_key(digest)
    }

    /// Worker currently owning `digest`.
    pub fn owner(&self, digest: &Digest) -> Option<usize> {
        self.owners().get(digest).copied()
    }

    /// Number of digests currently claimed.
    pub fn len(&self) -> usize {
        self.owners().len()
    }

    /// Whether no digest is claimed.
    pub fn is_empty(&self) -> bool {
        self.owners().is_empty()
    }
}

/// Ownership of an in-flight digest, released on drop.
#[derive(Debug)]
#[must_use = "dropping the claim releases the digest immediately"]
pub struct InFlightClaim {
    tracker: InFlightTracker,
    digest: Digest,
    owner: usize,
}

impl InFlightClaim {
    pub fn digest(&self) -> &Digest {
        &self.digest
    }
}

impl Drop for InFlightClaim {
    fn drop(&mut self) {
        // Only release what this claim still owns; the digest may have been
        // released explicitly and claimed again since.
        let mut owners = self.tracker.owners();
        if owners.get(&self.digest) == Some(&self.owner) {
            owners.remove(&self.digest);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::thread;

    #[test]
    fn test_claim_is_exclusive_until_released() {
        let tracker = InFlightTracker::new();
        let digest = Digest::of(b"one");

        let claim = tracker.try_claim(digest, 0).unwrap();
        assert!(tracker.try_claim(digest, 1).is_none());
        assert_eq!(tracker.owner(&digest), Some(0));

        drop(claim);
        assert!(!tracker.contains(&digest));
        assert!(tracker.try_claim(digest, 1).is_some());
    }

    #[test]
    fn test_release_absent_digest_is_noop() {
        let tracker = InFlightTracker::new();
        tracker.release(&Digest::of(b"never claimed"));
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_explicit_release_frees_digest() {
        let tracker = InFlightTracker::new();
        let digest = Digest::of(b"two");
        let claim = tracker.try_claim(digest, 3).unwrap();

        tracker.release(claim.digest());
        let reclaimed = tracker.try_claim(digest, 4).unwrap();

        // The stale guard must not release the new owner's claim.
        drop(claim);
        assert_eq!(tracker.owner(&digest), Some(4));

        drop(reclaimed);
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_concurrent_claims_have_a_single_winner() {
        const THREADS: usize = 16;
        let tracker = InFlightTracker::new();
        let digest = Digest::of(b"contended");
        let barrier = Arc::new(Barrier::new(THREADS));

        let handles: Vec<_> = (0..THREADS)
            .map(|id| {
                let tracker = tracker.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    tracker.try_claim(digest, id)
                })
            })
            .collect();

        let claims: Vec<_> = handles
            .into_iter()
            .filter_map(|h| h.join().unwrap())
            .collect();

        assert_eq!(claims.len(), 1);
        assert_eq!(tracker.len(), 1);
        drop(claims);
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_claim_released_on_panic() {
        let tracker = InFlightTracker::new();
        let digest = Digest::of(b"panicky");
        let inner = tracker.clone();

        let result = thread::spawn(move || {
            let _claim = inner.try_claim(digest, 0).unwrap();
            panic!("worker blew up");
        })
        .join();

        assert!(result.is_err());
        assert!(!tracker.contains(&digest));
    }
}
