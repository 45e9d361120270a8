//! ABOUTME: Processing-Status Tracker (§4.9) — in-memory concurrent documentId -> ProgressRecord map

use dashmap::DashMap;
use std::time::{Duration, Instant};

/// Phase of the ingestion pipeline a document is currently in, mirroring
/// the state machine in §4.5.5 with a finer-grained in-flight view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingPhase {
    ContextCreation,
    Splitting,
    VectorComputation,
    Completed,
    Failed,
}

/// One document's progress record (§4.9).
#[derive(Debug, Clone)]
pub struct ProgressRecord {
    pub phase: ProcessingPhase,
    pub chapters_count: usize,
    pub embeddings_total: usize,
    pub embeddings_processed: usize,
    pub embeddings_failed: usize,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub error_message: Option<String>,
}

impl ProgressRecord {
    #[must_use]
    pub fn started(now: chrono::DateTime<chrono::Utc>) -> Self {
        Self {
            phase: ProcessingPhase::ContextCreation,
            chapters_count: 0,
            embeddings_total: 0,
            embeddings_processed: 0,
            embeddings_failed: 0,
            started_at: now,
            completed_at: None,
            error_message: None,
        }
    }
}

struct Entry {
    record: ProgressRecord,
    retained_since: Option<Instant>,
}

/// Concurrent `documentId -> ProgressRecord` map (§4.9). Orchestrator
/// workers write on phase transitions; API handlers poll `get()`. Completed
/// entries are swept after `ttl` via [`StatusTracker::sweep_expired`] — the
/// orchestrator is expected to call this periodically (e.g. once per
/// ingestion loop iteration) rather than running its own timer task, to
/// keep this type free of a background-task lifecycle.
pub struct StatusTracker {
    entries: DashMap<i64, Entry>,
    ttl: Duration,
}

impl StatusTracker {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn start(&self, documento_id: i64, now: chrono::DateTime<chrono::Utc>) {
        self.entries.insert(
            documento_id,
            Entry {
                record: ProgressRecord::started(now),
                retained_since: None,
            },
        );
    }

    pub fn update(&self, documento_id: i64, update: impl FnOnce(&mut ProgressRecord)) {
        if let Some(mut entry) = self.entries.get_mut(&documento_id) {
            update(&mut entry.record);
        }
    }

    pub fn complete(
        &self,
        documento_id: i64,
        phase: ProcessingPhase,
        completed_at: chrono::DateTime<chrono::Utc>,
        error_message: Option<String>,
    ) {
        if let Some(mut entry) = self.entries.get_mut(&documento_id) {
            entry.record.phase = phase;
            entry.record.completed_at = Some(completed_at);
            entry.record.error_message = error_message;
            entry.retained_since = Some(Instant::now());
        }
    }

    #[must_use]
    pub fn get(&self, documento_id: i64) -> Option<ProgressRecord> {
        self.entries.get(&documento_id).map(|entry| entry.record.clone())
    }

    /// Remove completed entries whose retention window has elapsed.
    pub fn sweep_expired(&self) {
        self.entries.retain(|_, entry| match entry.retained_since {
            Some(since) => since.elapsed() < self.ttl,
            None => true,
        });
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_then_get_returns_initial_phase() {
        let tracker = StatusTracker::new(Duration::from_secs(60));
        tracker.start(1, chrono::Utc::now());
        let record = tracker.get(1).unwrap();
        assert_eq!(record.phase, ProcessingPhase::ContextCreation);
        assert_eq!(record.embeddings_processed, 0);
    }

    #[test]
    fn update_mutates_in_place() {
        let tracker = StatusTracker::new(Duration::from_secs(60));
        tracker.start(1, chrono::Utc::now());
        tracker.update(1, |record| {
            record.phase = ProcessingPhase::VectorComputation;
            record.embeddings_total = 10;
            record.embeddings_processed = 4;
        });
        let record = tracker.get(1).unwrap();
        assert_eq!(record.phase, ProcessingPhase::VectorComputation);
        assert_eq!(record.embeddings_processed, 4);
    }

    #[test]
    fn unknown_document_returns_none() {
        let tracker = StatusTracker::new(Duration::from_secs(60));
        assert!(tracker.get(999).is_none());
    }

    #[test]
    fn sweep_removes_only_expired_completed_entries() {
        let tracker = StatusTracker::new(Duration::from_millis(0));
        tracker.start(1, chrono::Utc::now());
        tracker.start(2, chrono::Utc::now());
        tracker.complete(1, ProcessingPhase::Completed, chrono::Utc::now(), None);
        std::thread::sleep(Duration::from_millis(5));
        tracker.sweep_expired();
        assert!(tracker.get(1).is_none());
        assert!(tracker.get(2).is_some());
    }
}
