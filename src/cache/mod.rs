//! In-memory memoization subsystem.
//!
//! # Data Flow
//! ```text
//! get_or_set(key, factory)
//!     → Ready entry?        → clone value, done (hit)
//!     → Pending marker?     → await the shared computation (coalesced)
//!     → nothing registered  → spawn factory, register marker (miss)
//!
//! Computation finished:
//!     Ok  → marker replaced by Ready entry, waiters woken
//!     Err → marker removed, waiters woken, next call retries
//! ```
//!
//! # Design Decisions
//! - Check-then-register happens under one dashmap shard lock
//! - Computations run as their own task; dropping a waiter never cancels them
//! - Entries are never evicted; the key space is the set of entry documents
//! - Failures are shared with current waiters but never stored

pub mod memo;

pub use memo::{CacheStats, MemoError, MemoMap};
