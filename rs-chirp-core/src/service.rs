use std::sync::Arc;

use rand::Rng;
use tokio::sync::oneshot;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::gate::ReadinessGate;
use crate::model::{WordChain, tokenize};
use crate::normalizer;

/// Public entry point for text generation.
///
/// Calls made before the chain is ready wait on the readiness gate and are
/// answered, in registration order, once it is published.
#[derive(Debug, Clone)]
pub struct GenerationService {
	gate: Arc<ReadinessGate<WordChain>>,
	max_words: usize,
	max_chars: usize,
}

impl GenerationService {
	pub fn new(gate: Arc<ReadinessGate<WordChain>>, max_words: usize, max_chars: usize) -> Self {
		Self { gate, max_words, max_chars }
	}

	pub fn from_config(gate: Arc<ReadinessGate<WordChain>>, config: &Config) -> Self {
		Self::new(gate, config.max_words, config.max_chars)
	}

	pub fn gate(&self) -> &Arc<ReadinessGate<WordChain>> {
		&self.gate
	}

	/// Generates a post, or a reply to `input` when given.
	///
	/// `input` is cleaned like a corpus record before use. The result never
	/// exceeds `max_chars` characters and may be empty.
	///
	/// # Errors
	/// - `EmptyModel` if the published chain has no prefixes
	/// - `NeverReady` if the queued request was dropped without an answer
	pub async fn generate(&self, input: Option<&str>) -> Result<String> {
		let input = input.map(normalizer::clean);
		let (tx, rx) = oneshot::channel();
		let (max_words, max_chars) = (self.max_words, self.max_chars);

		self.gate.on_ready(move |model| {
			let _ = tx.send(compose(&model, input.as_deref(), max_words, max_chars, &mut rand::rng()));
		});

		rx.await.map_err(|_| Error::NeverReady)?
	}
}

/// Generates from a ready chain. `input` must already be cleaned.
pub fn compose<R: Rng + ?Sized>(
	model: &WordChain,
	input: Option<&str>,
	max_words: usize,
	max_chars: usize,
	rng: &mut R,
) -> Result<String> {
	let words = match input {
		None => model.babble_with(max_words, rng)?,
		Some(input) => model.respond_with(&tokenize(input), max_words, rng)?,
	};
	Ok(trim_to_length(words, max_chars))
}

/// Drops trailing words until the space-joined text fits in `max_chars`
/// characters.
pub fn trim_to_length(mut words: Vec<String>, max_chars: usize) -> String {
	// Joined length: every word plus one space between consecutive words.
	let mut length = words.iter().map(|word| word.chars().count()).sum::<usize>() + words.len().saturating_sub(1);

	while length > max_chars {
		let Some(last) = words.pop() else {
			break;
		};
		length -= last.chars().count() + usize::from(!words.is_empty());
	}

	words.join(" ")
}
