use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Maximum length, in characters, of a generated post.
pub const DEFAULT_MAX_CHARS: usize = 140;

/// Settings shared by the corpus loader and the generation service.
///
/// Keys use the upper-case names of the bot configuration file
/// (`MARKOV_ORDER`, `CORPUS`, ...). Only `MAX_CHARS` has a default.
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Config {
	/// Chain order k (number of words in a prefix).
	pub markov_order: usize,
	/// Path of the JSON corpus.
	pub corpus: PathBuf,
	/// Path of the cached model.
	pub corpus_digest: PathBuf,
	/// Maximum number of words generated per call.
	pub max_words: usize,
	#[serde(default = "default_max_chars")]
	pub max_chars: usize,
	/// Account name of the bot, used by front ends to skip self-mentions.
	#[serde(default)]
	pub bot_name: Option<String>,
}

fn default_max_chars() -> usize {
	DEFAULT_MAX_CHARS
}

impl Config {
	/// Reads a JSON configuration file.
	pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
		let path = path.as_ref();
		let raw = fs::read_to_string(path)
			.map_err(|e| Error::InvalidConfig(format!("{}: {e}", path.display())))?;
		let config: Config = serde_json::from_str(&raw)
			.map_err(|e| Error::InvalidConfig(format!("{}: {e}", path.display())))?;
		config.validate()?;
		Ok(config)
	}

	/// Reads the configuration from process environment variables.
	pub fn from_env() -> Result<Self> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Builds a configuration from any key lookup (environment, CLI map...).
	pub fn from_lookup<F>(lookup: F) -> Result<Self>
	where
		F: Fn(&str) -> Option<String>,
	{
		let required = |key: &str| lookup(key).ok_or_else(|| Error::InvalidConfig(format!("{key} is not set")));

		let config = Config {
			markov_order: parse_number("MARKOV_ORDER", &required("MARKOV_ORDER")?)?,
			corpus: PathBuf::from(required("CORPUS")?),
			corpus_digest: PathBuf::from(required("CORPUS_DIGEST")?),
			max_words: parse_number("MAX_WORDS", &required("MAX_WORDS")?)?,
			max_chars: match lookup("MAX_CHARS") {
				Some(raw) => parse_number("MAX_CHARS", &raw)?,
				None => DEFAULT_MAX_CHARS,
			},
			bot_name: lookup("BOT_NAME").filter(|name| !name.trim().is_empty()),
		};
		config.validate()?;
		Ok(config)
	}

	/// Rejects values that make the pipeline meaningless.
	pub fn validate(&self) -> Result<()> {
		if self.markov_order == 0 {
			return Err(Error::InvalidConfig("MARKOV_ORDER must be >= 1".to_owned()));
		}
		if self.max_chars == 0 {
			return Err(Error::InvalidConfig("MAX_CHARS must be >= 1".to_owned()));
		}
		Ok(())
	}
}

fn parse_number<T: FromStr>(key: &str, raw: &str) -> Result<T> {
	raw.trim()
		.parse()
		.map_err(|_| Error::InvalidConfig(format!("{key} must be a positive integer, got '{raw}'")))
}

#[cfg(test)]
mod tests {
	use std::collections::HashMap;

	use super::*;

	fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
		let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
		move |key| map.get(key).cloned()
	}

	#[test]
	fn parses_json_bot_config() {
		let config: Config = serde_json::from_str(
			r#"{
				"MARKOV_ORDER": 3,
				"CORPUS": "corpus/test.json",
				"CORPUS_DIGEST": "corpus/test.model",
				"BOT_NAME": "botanado",
				"MAX_WORDS": 5,
				"CONSUMER_KEY": "ignored"
			}"#,
		)
		.unwrap();
		assert_eq!(config.markov_order, 3);
		assert_eq!(config.max_chars, DEFAULT_MAX_CHARS);
		assert_eq!(config.bot_name.as_deref(), Some("botanado"));
		assert_eq!(config.corpus_digest, PathBuf::from("corpus/test.model"));
	}

	#[test]
	fn lookup_requires_core_keys() {
		let err = Config::from_lookup(lookup(&[("MARKOV_ORDER", "2"), ("CORPUS", "c.json")])).unwrap_err();
		assert!(err.to_string().contains("CORPUS_DIGEST"));
	}

	#[test]
	fn lookup_rejects_zero_order() {
		let err = Config::from_lookup(lookup(&[
			("MARKOV_ORDER", "0"),
			("CORPUS", "c.json"),
			("CORPUS_DIGEST", "c.model"),
			("MAX_WORDS", "10"),
		]))
		.unwrap_err();
		assert!(matches!(err, Error::InvalidConfig(_)));
	}

	#[test]
	fn lookup_reads_optional_keys() {
		let config = Config::from_lookup(lookup(&[
			("MARKOV_ORDER", "2"),
			("CORPUS", "c.json"),
			("CORPUS_DIGEST", "c.model"),
			("MAX_WORDS", " 12 "),
			("MAX_CHARS", "280"),
		]))
		.unwrap();
		assert_eq!(config.max_words, 12);
		assert_eq!(config.max_chars, 280);
		assert_eq!(config.bot_name, None);
	}

	#[test]
	fn from_file_reports_missing_file() {
		let err = Config::from_file("/definitely/not/here.json").unwrap_err();
		assert!(matches!(err, Error::InvalidConfig(_)));
	}
}
