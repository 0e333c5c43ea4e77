use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the corpus-to-model pipeline and the generation engine.
///
/// Corpus errors are fatal to a rebuild: the loader returns them and the
/// readiness gate is never signaled. Digest errors on the cache-hit path are
/// recoverable (the loader rebuilds from the corpus instead).
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
	/// The corpus file could not be opened or read.
	#[error("cannot read corpus {}: {source}", .path.display())]
	CorpusRead {
		path: PathBuf,
		#[source]
		source: io::Error,
	},

	/// The corpus file is not a JSON array of records.
	#[error("cannot parse corpus {}: {source}", .path.display())]
	CorpusParse {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},

	/// The digest bytes do not decode into a valid chain.
	#[error("corrupt digest {}: {reason}", .path.display())]
	CorruptDigest { path: PathBuf, reason: String },

	/// The digest holds a chain of another order than the configured one.
	#[error("digest {} has order {found}, expected {expected}", .path.display())]
	DigestOrderMismatch {
		path: PathBuf,
		expected: usize,
		found: usize,
	},

	#[error("digest i/o on {}: {source}", .path.display())]
	DigestIo {
		path: PathBuf,
		#[source]
		source: io::Error,
	},

	#[error("cannot encode digest: {0}")]
	DigestEncode(#[from] postcard::Error),

	/// Generation was requested from a chain without any known prefix.
	#[error("model has no prefixes to generate from")]
	EmptyModel,

	/// Two chains of different orders cannot be merged.
	#[error("order mismatch: {left} vs {right}")]
	OrderMismatch { left: usize, right: usize },

	#[error("invalid configuration: {0}")]
	InvalidConfig(String),

	/// A queued generation request was dropped before it was answered.
	#[error("model never became ready")]
	NeverReady,
}

impl Error {
	/// True for the errors that mean the corpus itself is unusable.
	pub fn is_corpus_error(&self) -> bool {
		matches!(self, Error::CorpusRead { .. } | Error::CorpusParse { .. })
	}

	/// True for the errors after which the loader may rebuild from the corpus.
	pub fn is_stale_digest(&self) -> bool {
		matches!(self, Error::CorruptDigest { .. } | Error::DigestOrderMismatch { .. })
	}
}

pub type Result<T> = std::result::Result<T, Error>;
