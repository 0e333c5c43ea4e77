use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};

/// One historical post of the corpus.
///
/// Accepts either an archived post object (only `text` is read, every
/// other field is ignored) or a bare string.
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum CorpusRecord {
	Text(String),
	Post {
		#[serde(default)]
		text: Option<String>,
	},
}

impl CorpusRecord {
	pub fn text(&self) -> Option<&str> {
		match self {
			CorpusRecord::Text(text) => Some(text.as_str()),
			CorpusRecord::Post { text } => text.as_deref(),
		}
	}
}

impl From<&str> for CorpusRecord {
	fn from(text: &str) -> Self {
		CorpusRecord::Text(text.to_owned())
	}
}

/// Reads the whole corpus, a JSON array of records.
///
/// # Errors
/// - `CorpusRead` if the file cannot be read
/// - `CorpusParse` if it is not a JSON array of records
pub fn read_corpus<P: AsRef<Path>>(path: P) -> Result<Vec<CorpusRecord>> {
	let path = path.as_ref();
	let raw = fs::read_to_string(path).map_err(|source| Error::CorpusRead { path: path.to_owned(), source })?;
	serde_json::from_str(&raw).map_err(|source| Error::CorpusParse { path: path.to_owned(), source })
}
