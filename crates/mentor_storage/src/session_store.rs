#![forbid(unsafe_code)]

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::sync::{Mutex, MutexGuard, PoisonError, TryLockError};
use std::time::{Duration, Instant};

use mentor_kernel_contracts::progression::LearnerId;
use mentor_kernel_contracts::session::LearnerSession;
use mentor_kernel_contracts::MonotonicTimeNs;

pub const DEFAULT_SHARD_COUNT: usize = 16;
pub const DEFAULT_LOCK_WAIT: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The learner's shard lock stayed contended past the bounded wait.
    /// Retryable; the store is unchanged and no prior update was skipped.
    LockContention { waited_ns: u64 },
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LockContention { waited_ns } => {
                write!(f, "session shard lock contended for {waited_ns}ns")
            }
        }
    }
}

impl std::error::Error for StorageError {}

type Shard = Mutex<BTreeMap<LearnerId, LearnerSession>>;

/// In-memory keyed session table. Learners hash onto a fixed set of
/// mutex-guarded shards: one learner's read-modify-write is serialized on
/// its shard, learners on distinct shards never contend. Nothing is ever
/// evicted here; expiry belongs to an external collaborator.
#[derive(Debug)]
pub struct SessionStore {
    shards: Vec<Shard>,
    lock_wait: Duration,
}

impl SessionStore {
    pub fn new_in_memory() -> Self {
        Self::with_shards(DEFAULT_SHARD_COUNT, DEFAULT_LOCK_WAIT)
    }

    pub fn with_shards(shard_count: usize, lock_wait: Duration) -> Self {
        let shard_count = shard_count.max(1);
        let mut shards = Vec::with_capacity(shard_count);
        for _ in 0..shard_count {
            shards.push(Mutex::new(BTreeMap::new()));
        }
        Self { shards, lock_wait }
    }

    /// Returns the learner's session, lazily creating the neutral one on
    /// first reference.
    pub fn get_or_init(
        &self,
        learner_id: &LearnerId,
        now: MonotonicTimeNs,
    ) -> Result<LearnerSession, StorageError> {
        let mut shard = self.lock_shard(learner_id)?;
        let session = shard
            .entry(learner_id.clone())
            .or_insert_with(|| LearnerSession::fresh(learner_id.clone(), now));
        Ok(session.clone())
    }

    /// Serialized read-modify-write for one learner. The mutator runs under
    /// the shard lock, so concurrent updates for the same learner apply as
    /// if fully sequential and none is lost. Returns the post-mutation
    /// snapshot together with the mutator's output.
    pub fn update<T>(
        &self,
        learner_id: &LearnerId,
        now: MonotonicTimeNs,
        mutate: impl FnOnce(&mut LearnerSession) -> T,
    ) -> Result<(LearnerSession, T), StorageError> {
        let mut shard = self.lock_shard(learner_id)?;
        let session = shard
            .entry(learner_id.clone())
            .or_insert_with(|| LearnerSession::fresh(learner_id.clone(), now));
        let output = mutate(session);
        session.last_updated = now;
        Ok((session.clone(), output))
    }

    /// Read-only copy of the current session, if one exists.
    pub fn snapshot(&self, learner_id: &LearnerId) -> Result<Option<LearnerSession>, StorageError> {
        let shard = self.lock_shard(learner_id)?;
        Ok(shard.get(learner_id).cloned())
    }

    pub fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|shard| {
                shard
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .len()
            })
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn shard_index(&self, learner_id: &LearnerId) -> usize {
        let mut hasher = DefaultHasher::new();
        learner_id.hash(&mut hasher);
        (hasher.finish() as usize) % self.shards.len()
    }

    /// Bounded-wait acquisition: spin on `try_lock`, yielding between
    /// attempts, until the configured wait budget runs out. A poisoned lock
    /// is recovered; session invariants are value-level and re-checked by
    /// the contracts.
    fn lock_shard(
        &self,
        learner_id: &LearnerId,
    ) -> Result<MutexGuard<'_, BTreeMap<LearnerId, LearnerSession>>, StorageError> {
        let shard = &self.shards[self.shard_index(learner_id)];
        let started = Instant::now();
        loop {
            match shard.try_lock() {
                Ok(guard) => return Ok(guard),
                Err(TryLockError::Poisoned(poisoned)) => return Ok(poisoned.into_inner()),
                Err(TryLockError::WouldBlock) => {
                    let waited = started.elapsed();
                    if waited >= self.lock_wait {
                        return Err(StorageError::LockContention {
                            waited_ns: waited.as_nanos() as u64,
                        });
                    }
                    std::thread::yield_now();
                }
            }
        }
    }
}
