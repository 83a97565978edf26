//! # offer-store: Persistence Layer for Offer Desk
//!
//! Owns the only state that outlives a run: the article number counter.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Offer Desk Data Flow                             │
//! │                                                                         │
//! │  offer-desk complete --assign-article-numbers                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   offer-store (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ArticleNumberStore                                            │   │
//! │  │   ├── peek_next()                                               │   │
//! │  │   ├── allocate(count)                                           │   │
//! │  │   ├── reset(start)                                              │   │
//! │  │   └── assign(&mut records)                                      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  data/article_number.json  (+ .lock sidecar)                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`article_number`] - Locked, atomic counter store
//! - [`error`] - Store error types

// =============================================================================
// Module Declarations
// =============================================================================

pub mod article_number;
pub mod error;

// =============================================================================
// Re-exports
// =============================================================================

pub use article_number::ArticleNumberStore;
pub use error::{StoreError, StoreResult};

/// Default location of the counter state file, relative to the working
/// directory.
pub const DEFAULT_STATE_PATH: &str = "data/article_number.json";
