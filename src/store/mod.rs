//! Thread-safe geohash-bucketed presence store with optional update
//! notifications.
//!
//! One bucket per geohash cell, at most one record per agent per bucket.
//! Buckets with zero records are never retained: absence of a key means no
//! live agents in that cell. All mutations take the write lock for the
//! duration of one operation and never across an await point.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Deserialize;
use tokio::sync::broadcast;
use tracing::debug;

use crate::clock::Clock;
use crate::domain::{AgentId, AgentRecord};

/// What happens to an agent's old-bucket record when it reports from a new
/// cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovePolicy {
    /// Leave the old record in place until the reaper evicts it. Matches the
    /// historical behavior of the system this replaces; renderers see a short
    /// trail across the cell boundary.
    #[default]
    Linger,
    /// Remove the agent from every other bucket in the same upsert, so each
    /// agent occupies exactly one bucket at all times.
    Migrate,
}

/// Notification sent when a record is upserted.
#[derive(Debug, Clone)]
pub struct PresenceUpdate {
    pub agent_id: AgentId,
    pub bucket_key: String,
}

type Bucket = HashMap<AgentId, AgentRecord>;

/// Thread-safe cache of live agent positions, bucketed by geohash cell.
pub struct PresenceStore {
    buckets: RwLock<HashMap<String, Bucket>>,
    /// Transport liveness flag: true while the broker connection is up.
    connected: AtomicBool,
    clock: Arc<dyn Clock>,
    policy: MovePolicy,
    /// Broadcast sender for update notifications.
    /// Wrapped in Option to allow construction without notifications.
    tx: Option<broadcast::Sender<PresenceUpdate>>,
}

impl PresenceStore {
    /// Create a new store without notifications, using the `linger` move
    /// policy.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            buckets: RwLock::new(HashMap::new()),
            connected: AtomicBool::new(false),
            clock,
            policy: MovePolicy::default(),
            tx: None,
        }
    }

    /// Set the bucket-migration policy applied on upsert.
    #[must_use]
    pub fn with_policy(mut self, policy: MovePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Create a new store with broadcast notifications.
    ///
    /// Returns the store and a receiver for subscribing to updates.
    /// Additional receivers can be created via `subscribe()`.
    #[must_use]
    pub fn with_notifications(
        clock: Arc<dyn Clock>,
        capacity: usize,
    ) -> (Self, broadcast::Receiver<PresenceUpdate>) {
        let (tx, rx) = broadcast::channel(capacity);
        let mut store = Self::new(clock);
        store.tx = Some(tx);
        (store, rx)
    }

    /// Subscribe to update notifications.
    ///
    /// Returns `None` if the store was created without notifications.
    #[must_use]
    pub fn subscribe(&self) -> Option<broadcast::Receiver<PresenceUpdate>> {
        self.tx.as_ref().map(|tx| tx.subscribe())
    }

    /// Insert or fully replace the record for `record.agent_id` in the named
    /// bucket, stamping `last_update_ms` from the store clock.
    ///
    /// After the call the bucket contains exactly one record for that agent.
    /// Under [`MovePolicy::Migrate`] the agent is also removed from every
    /// other bucket; under [`MovePolicy::Linger`] other buckets are untouched.
    pub fn upsert(&self, bucket_key: &str, mut record: AgentRecord) {
        record.last_update_ms = self.clock.now_ms();
        let agent_id = record.agent_id.clone();

        {
            let mut buckets = self.buckets.write();

            if self.policy == MovePolicy::Migrate {
                buckets.retain(|key, bucket| {
                    if key != bucket_key {
                        bucket.remove(&agent_id);
                    }
                    !bucket.is_empty()
                });
            }

            buckets
                .entry(bucket_key.to_string())
                .or_default()
                .insert(agent_id.clone(), record);
        }

        // Notify subscribers (ignore send errors - no receivers is fine)
        if let Some(ref tx) = self.tx {
            let _ = tx.send(PresenceUpdate {
                agent_id,
                bucket_key: bucket_key.to_string(),
            });
        }
    }

    /// Evict every record whose age meets or exceeds `ttl_ms`, then drop any
    /// bucket left empty. Idempotent: a second sweep with no intervening
    /// upserts removes nothing.
    ///
    /// # Panics
    ///
    /// Panics if `ttl_ms` is zero; that is a caller bug, not a runtime
    /// condition to recover from.
    pub fn remove_stale(&self, now_ms: u64, ttl_ms: u64) {
        assert!(ttl_ms > 0, "remove_stale called with zero TTL");

        let mut evicted = 0usize;
        let mut buckets = self.buckets.write();
        buckets.retain(|_, bucket| {
            let before = bucket.len();
            bucket.retain(|_, record| now_ms.saturating_sub(record.last_update_ms) < ttl_ms);
            evicted += before - bucket.len();
            !bucket.is_empty()
        });
        drop(buckets);

        if evicted > 0 {
            debug!(evicted, ttl_ms, "Evicted stale records");
        }
    }

    /// Set the transport liveness flag. Does not evict or clear data.
    pub fn mark_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Whether the transport connection is currently up.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Point-in-time flattened copy of all records across all buckets.
    ///
    /// Copy-on-read: mutating the returned records never affects store state.
    #[must_use]
    pub fn snapshot(&self) -> Vec<AgentRecord> {
        self.buckets
            .read()
            .values()
            .flat_map(|bucket| bucket.values().cloned())
            .collect()
    }

    /// Remove all buckets. The liveness flag is left as-is.
    pub fn clear(&self) {
        self.buckets.write().clear();
    }

    /// Total number of records across all buckets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.read().values().map(HashMap::len).sum()
    }

    /// Returns true if no records are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of non-empty buckets.
    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.buckets.read().len()
    }

    /// Number of records in one bucket, or zero if the bucket is absent.
    #[must_use]
    pub fn bucket_len(&self, bucket_key: &str) -> usize {
        self.buckets
            .read()
            .get(bucket_key)
            .map_or(0, HashMap::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::domain::Position;

    fn store_with_clock() -> (PresenceStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(0));
        let store = PresenceStore::new(clock.clone());
        (store, clock)
    }

    fn record(id: &str) -> AgentRecord {
        AgentRecord::new(AgentId::from(id), Position::new(37.0, -122.0))
    }

    #[test]
    fn upsert_replaces_in_place() {
        let (store, clock) = store_with_clock();

        store.upsert("9q94r", record("d1"));
        clock.advance(100);
        store.upsert("9q94r", record("d1"));

        assert_eq!(store.bucket_len("9q94r"), 1);
        let snap = store.snapshot();
        assert_eq!(snap.len(), 1);
        assert_eq!(snap[0].last_update_ms, 100);
    }

    #[test]
    fn linger_policy_leaves_old_bucket_record() {
        let (store, _clock) = store_with_clock();

        store.upsert("9q94r", record("d1"));
        store.upsert("9q8yy", record("d1"));

        assert_eq!(store.bucket_count(), 2);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn migrate_policy_removes_old_bucket_record() {
        let clock = Arc::new(ManualClock::new(0));
        let store = PresenceStore::new(clock).with_policy(MovePolicy::Migrate);

        store.upsert("9q94r", record("d1"));
        store.upsert("9q94r", record("d2"));
        store.upsert("9q8yy", record("d1"));

        assert_eq!(store.bucket_count(), 2);
        assert_eq!(store.bucket_len("9q94r"), 1);
        assert_eq!(store.bucket_len("9q8yy"), 1);
    }

    #[test]
    fn remove_stale_evicts_and_drops_empty_buckets() {
        let (store, clock) = store_with_clock();

        store.upsert("9q94r", record("d1"));
        clock.advance(3000);
        store.upsert("9q8yy", record("d2"));

        // d1 is 6000ms old, d2 is 3000ms old
        store.remove_stale(6000, 5000);

        assert_eq!(store.bucket_count(), 1);
        assert_eq!(store.bucket_len("9q94r"), 0);
        assert_eq!(store.bucket_len("9q8yy"), 1);
    }

    #[test]
    fn remove_stale_evicts_at_exact_ttl_boundary() {
        let (store, _clock) = store_with_clock();
        store.upsert("9q94r", record("d1"));

        // age == ttl counts as stale
        store.remove_stale(5000, 5000);
        assert!(store.is_empty());
    }

    #[test]
    fn remove_stale_is_idempotent() {
        let (store, clock) = store_with_clock();

        store.upsert("9q94r", record("d1"));
        clock.advance(1000);
        store.upsert("9q94r", record("d2"));
        store.upsert("9q8yy", record("d3"));

        store.remove_stale(6500, 5000);
        let after_first = store.snapshot();
        store.remove_stale(6500, 5000);
        let after_second = store.snapshot();

        assert_eq!(after_first.len(), after_second.len());
        let mut first_ids: Vec<_> = after_first.iter().map(|r| r.agent_id.clone()).collect();
        let mut second_ids: Vec<_> = after_second.iter().map(|r| r.agent_id.clone()).collect();
        first_ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        second_ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        assert_eq!(first_ids, second_ids);
    }

    #[test]
    #[should_panic(expected = "zero TTL")]
    fn remove_stale_rejects_zero_ttl() {
        let (store, _clock) = store_with_clock();
        store.remove_stale(1000, 0);
    }

    #[test]
    fn snapshot_is_a_copy() {
        let (store, _clock) = store_with_clock();
        store.upsert("9q94r", record("d1"));

        let mut snap = store.snapshot();
        snap[0].position = Position::new(0.0, 0.0);
        snap.clear();

        let fresh = store.snapshot();
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].position, Position::new(37.0, -122.0));
    }

    #[test]
    fn liveness_flag_does_not_touch_records() {
        let (store, _clock) = store_with_clock();
        store.upsert("9q94r", record("d1"));

        assert!(!store.is_connected());
        store.mark_connected(true);
        assert!(store.is_connected());
        store.mark_connected(false);
        assert!(!store.is_connected());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn clear_removes_all_buckets() {
        let (store, _clock) = store_with_clock();
        store.upsert("9q94r", record("d1"));
        store.upsert("9q8yy", record("d2"));

        store.clear();

        assert!(store.is_empty());
        assert_eq!(store.bucket_count(), 0);
    }

    #[tokio::test]
    async fn notifications_carry_agent_and_bucket() {
        let clock = Arc::new(ManualClock::new(0));
        let (store, mut rx) = PresenceStore::with_notifications(clock, 16);

        store.upsert("9q94r", record("d1"));

        let update = rx.recv().await.unwrap();
        assert_eq!(update.agent_id.as_str(), "d1");
        assert_eq!(update.bucket_key, "9q94r");
    }

    #[test]
    fn subscribe_requires_notifications() {
        let clock = Arc::new(ManualClock::new(0));
        let (store, _rx) = PresenceStore::with_notifications(clock.clone(), 16);
        assert!(store.subscribe().is_some());

        let plain = PresenceStore::new(clock);
        assert!(plain.subscribe().is_none());
    }
}
