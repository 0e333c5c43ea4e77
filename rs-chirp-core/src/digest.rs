use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::io::write_atomic;
use crate::model::WordChain;

/// Version of the digest envelope. Bump when `WordChain` changes shape.
const FORMAT_VERSION: u16 = 1;

#[derive(Serialize)]
struct DigestRef<'a> {
	format_version: u16,
	model: &'a WordChain,
}

#[derive(Deserialize)]
struct DigestOwned {
	format_version: u16,
	model: WordChain,
}

/// Cached snapshot of a fully built chain.
///
/// The file is a postcard-encoded envelope; its layout is private to this
/// store. Presence of the file is the only validity check made before
/// loading, and every save is a full snapshot written atomically.
#[derive(Debug, Clone)]
pub struct DigestStore {
	path: PathBuf,
	order: usize,
}

impl DigestStore {
	/// Store for chains of order `order` cached at `path`.
	pub fn new<P: Into<PathBuf>>(path: P, order: usize) -> Self {
		Self { path: path.into(), order }
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	pub fn exists(&self) -> bool {
		self.path.is_file()
	}

	/// Reads and decodes the cached chain.
	///
	/// # Errors
	/// - `DigestIo` if the file cannot be read
	/// - `CorruptDigest` if the bytes are not a valid chain
	/// - `DigestOrderMismatch` if the chain was built with another order
	pub fn load(&self) -> Result<WordChain> {
		let bytes = fs::read(&self.path).map_err(|source| Error::DigestIo { path: self.path.clone(), source })?;

		let digest: DigestOwned = postcard::from_bytes(&bytes).map_err(|e| self.corrupt(e.to_string()))?;
		if digest.format_version != FORMAT_VERSION {
			return Err(self.corrupt(format!("unknown format version {}", digest.format_version)));
		}
		digest.model.check_invariants().map_err(|reason| self.corrupt(reason))?;

		if digest.model.order() != self.order {
			return Err(Error::DigestOrderMismatch {
				path: self.path.clone(),
				expected: self.order,
				found: digest.model.order(),
			});
		}

		info!("loaded digest {} ({} prefixes)", self.path.display(), digest.model.len());
		Ok(digest.model)
	}

	/// Encodes `model` and replaces the digest file atomically.
	pub fn save(&self, model: &WordChain) -> Result<()> {
		let bytes = postcard::to_stdvec(&DigestRef { format_version: FORMAT_VERSION, model })?;
		write_atomic(&self.path, &bytes).map_err(|source| Error::DigestIo { path: self.path.clone(), source })?;
		debug!("wrote digest {} ({} bytes)", self.path.display(), bytes.len());
		Ok(())
	}

	fn corrupt(&self, reason: String) -> Error {
		Error::CorruptDigest { path: self.path.clone(), reason }
	}
}
