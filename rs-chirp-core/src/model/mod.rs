//! Word-level Markov chain used to generate posts.
//!
//! - Fixed-order chain (`WordChain`) with seeding, prefix picking,
//!   continuation and reply generation, and merging
//! - Internal successor statistics (`State`)

/// Order-k word chain and tokenizer.
pub mod chain;

/// Successor statistics of a single prefix.
///
/// Tracks observed next words and supports weighted random sampling.
pub mod state;

pub use chain::{Prefix, WordChain, tokenize};
