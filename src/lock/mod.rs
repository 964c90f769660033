//! # Locking queue
//!
//! A process-local, per-key FIFO mutual-exclusion primitive with atomic
//! handoff: `release(k)` never lets the lock become briefly unheld between
//! the releasing holder and the next waiter — ownership transfers directly.
//!
//! ## Concurrency model
//!
//! The spec's source system models `acquire`/`release` as suspension points
//! in a cooperative, single-threaded scheduler. This crate has no async
//! runtime in its dependency stack (see `DESIGN.md`), so `acquire` instead
//! **blocks the calling OS thread** until its turn, using the same
//! `std::sync::{Mutex, Condvar}` primitives the teacher uses for its WAL
//! file handle and engine-wide `RwLock`. Each key gets its own
//! [`KeyLock`]; a release hands the lock to the head of that key's waiter
//! queue by flipping its ready flag under the same mutex that guards the
//! queue, so "held" is never observably false during the handoff.

#[cfg(test)]
mod tests;

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Condvar, Mutex};

/// A single waiter's rendezvous point: the holder sets `ready` and notifies
/// under the same mutex, so the waiter either sees `ready == true`
/// immediately or is guaranteed to be woken.
struct Waiter {
    ready: Mutex<bool>,
    cvar: Condvar,
}

impl Waiter {
    fn new() -> Self {
        Self {
            ready: Mutex::new(false),
            cvar: Condvar::new(),
        }
    }

    fn wait_until_ready(&self) {
        let mut ready = self.ready.lock().unwrap_or_else(|e| e.into_inner());
        while !*ready {
            ready = self.cvar.wait(ready).unwrap_or_else(|e| e.into_inner());
        }
    }

    fn signal(&self) {
        let mut ready = self.ready.lock().unwrap_or_else(|e| e.into_inner());
        *ready = true;
        self.cvar.notify_one();
    }
}

struct KeyState {
    held: bool,
    waiters: VecDeque<Arc<Waiter>>,
}

impl KeyState {
    fn new() -> Self {
        Self {
            held: false,
            waiters: VecDeque::new(),
        }
    }
}

/// Per-key FIFO mutex. A single `KeyLock` guards exactly one key's queue.
struct KeyLock {
    state: Mutex<KeyState>,
}

impl KeyLock {
    fn new() -> Self {
        Self {
            state: Mutex::new(KeyState::new()),
        }
    }

    /// Blocking acquire. Whether this is the first-ever acquire for the key
    /// (spec: "create a record, held=true") or a later one on a currently
    /// free record (spec: "set held=true"), the observable effect is
    /// identical, so both are handled by the same free/contended branch.
    fn acquire(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if !state.held {
            state.held = true;
            return;
        }
        let waiter = Arc::new(Waiter::new());
        state.waiters.push_back(Arc::clone(&waiter));
        drop(state);
        waiter.wait_until_ready();
    }

    /// Non-blocking acquire: returns `true` if the lock was free and is now
    /// held by the caller, `false` if it was already held (the caller is
    /// *not* queued).
    fn try_acquire(&self) -> bool {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.held {
            false
        } else {
            state.held = true;
            true
        }
    }

    fn release(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(next) = state.waiters.pop_front() {
            // Ownership transfers directly to `next`; `held` stays `true`
            // throughout, so the lock is never observably free mid-handoff.
            drop(state);
            next.signal();
        } else {
            state.held = false;
        }
    }

    fn waiter_count(&self) -> usize {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).waiters.len()
    }

    fn is_held(&self) -> bool {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).held
    }
}

/// Per-key FIFO mutual-exclusion primitive. Cheap to clone (it's an
/// `Arc`-backed table); typically held once by an [`crate::engine::Engine`]
/// and shared across threads.
#[derive(Default)]
pub struct LockingQueue {
    table: Mutex<HashMap<String, Arc<KeyLock>>>,
}

impl LockingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, key: &str) -> Arc<KeyLock> {
        let mut table = self.table.lock().unwrap_or_else(|e| e.into_inner());
        table
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(KeyLock::new()))
            .clone()
    }

    /// Acquire the lock for `key`, blocking the calling thread if it is
    /// currently held. Returns a [`KeyGuard`] that releases on drop.
    pub fn acquire(&self, key: &str) -> KeyGuard {
        let lock = self.lock_for(key);
        lock.acquire();
        KeyGuard {
            key: key.to_string(),
            lock,
        }
    }

    /// Non-blocking variant used by tests that need to observe queue state
    /// without committing to a wait (spec Testable Property 8 / Scenario 6).
    pub fn try_acquire(&self, key: &str) -> Option<KeyGuard> {
        let lock = self.lock_for(key);
        if lock.try_acquire() {
            Some(KeyGuard {
                key: key.to_string(),
                lock,
            })
        } else {
            None
        }
    }

    /// Number of waiters currently queued behind `key`'s lock. `0` if the
    /// key has never been locked or isn't currently held.
    pub fn waiter_count(&self, key: &str) -> usize {
        let table = self.table.lock().unwrap_or_else(|e| e.into_inner());
        table.get(key).map(|l| l.waiter_count()).unwrap_or(0)
    }

    /// Whether `key` is currently held by anyone.
    pub fn is_held(&self, key: &str) -> bool {
        let table = self.table.lock().unwrap_or_else(|e| e.into_inner());
        table.get(key).map(|l| l.is_held()).unwrap_or(false)
    }
}

/// RAII guard returned by [`LockingQueue::acquire`]. Releasing — on drop,
/// including on panic unwinding — hands the lock to the next waiter or
/// marks it free.
pub struct KeyGuard {
    key: String,
    lock: Arc<KeyLock>,
}

impl KeyGuard {
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for KeyGuard {
    fn drop(&mut self) {
        self.lock.release();
    }
}
