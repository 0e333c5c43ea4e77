//! Corpus-to-model pipeline and post generator of a chatty social bot.
//!
//! This crate provides:
//! - A cleaner for raw posts (links, mentions, retweet markers)
//! - An order-k word Markov chain with seeding, prefix picking and replies
//! - A digest store caching the built chain on disk
//! - A corpus loader rebuilding the chain in parallel on cache misses
//! - A readiness gate queuing consumers until the chain is built
//! - A length-bounded generation service
//!
//! Posting, streaming and scheduling belong to the front ends; they only
//! use `GenerationService::generate` and the loader's progress and
//! readiness callbacks.

pub mod config;

/// Corpus records and corpus file reading.
pub mod corpus;

/// Cached chain snapshots.
pub mod digest;

pub mod error;

/// One-shot readiness barrier.
pub mod gate;

/// Startup build of the chain.
pub mod loader;

/// Word chain and successor statistics.
pub mod model;

/// Post cleaning.
pub mod normalizer;

/// Length-bounded text generation.
pub mod service;

/// File helpers (atomic writes, temporary paths).
///
/// Not exposed
pub(crate) mod io;

pub use config::Config;
pub use corpus::CorpusRecord;
pub use digest::DigestStore;
pub use error::{Error, Result};
pub use gate::ReadinessGate;
pub use loader::CorpusLoader;
pub use model::WordChain;
pub use service::GenerationService;
