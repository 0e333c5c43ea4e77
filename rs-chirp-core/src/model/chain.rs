use std::collections::HashMap;

use rand::Rng;
use rand::prelude::IteratorRandom;
use serde::{Deserialize, Serialize};

use super::state::State;
use crate::error::{Error, Result};

/// A prefix of the chain: `order` consecutive words.
pub type Prefix = Vec<String>;

/// Splits a cleaned text into the words the chain is seeded with.
pub fn tokenize(text: &str) -> Vec<String> {
	text.split_whitespace().map(str::to_owned).collect()
}

/// Order-k word Markov chain.
///
/// Maps every observed k-word prefix to the distribution of the words that
/// followed it in the corpus.
///
/// # Responsibilities
/// - Build the chain from token sequences (`seed`)
/// - Pick a known prefix, extend a prefix, answer an input phrase
/// - Merge with another chain of the same order
///
/// # Invariants
/// - `order` is always >= 1 and never changes
/// - Every key in `states` has exactly `order` words
/// - Seeding is commutative: the final chain does not depend on the order in
///   which texts were seeded or partial chains merged
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct WordChain {
	/// Number of words in a prefix.
	order: usize, // must be >= 1

	states: HashMap<Prefix, State>,
}

impl WordChain {
	/// Creates an empty chain of order `order`.
	///
	/// # Errors
	/// Returns `InvalidConfig` if `order == 0`.
	pub fn new(order: usize) -> Result<Self> {
		if order == 0 {
			return Err(Error::InvalidConfig("chain order must be >= 1".to_owned()));
		}
		Ok(Self::empty(order))
	}

	/// Order was validated by the caller.
	pub(crate) fn empty(order: usize) -> Self {
		Self { order, states: HashMap::new() }
	}

	pub fn order(&self) -> usize {
		self.order
	}

	/// Number of known prefixes.
	pub fn len(&self) -> usize {
		self.states.len()
	}

	pub fn is_empty(&self) -> bool {
		self.states.is_empty()
	}

	/// True if `prefix` has been observed.
	pub fn contains<S: AsRef<str>>(&self, prefix: &[S]) -> bool {
		self.state(prefix).is_some()
	}

	/// Successor statistics of a prefix.
	pub fn state<S: AsRef<str>>(&self, prefix: &[S]) -> Option<&State> {
		if prefix.len() != self.order {
			return None;
		}
		let key: Prefix = prefix.iter().map(|word| word.as_ref().to_owned()).collect();
		self.states.get(&key)
	}

	/// Records, for every window of `order` tokens, the token that follows it.
	///
	/// Inputs with fewer than `order + 1` tokens are ignored.
	pub fn seed<S: AsRef<str>>(&mut self, tokens: &[S]) {
		if tokens.len() <= self.order {
			return;
		}

		for window in tokens.windows(self.order + 1) {
			let (prefix, next) = window.split_at(self.order);
			let key: Prefix = prefix.iter().map(|word| word.as_ref().to_owned()).collect();
			self.states.entry(key).or_default().add_transition(next[0].as_ref());
		}
	}

	/// Tokenizes and seeds one cleaned text.
	pub fn seed_text(&mut self, text: &str) {
		self.seed(&tokenize(text));
	}

	/// Returns a uniformly drawn known prefix.
	///
	/// # Errors
	/// Returns `EmptyModel` if nothing was seeded.
	pub fn pick(&self) -> Result<Prefix> {
		self.pick_with(&mut rand::rng())
	}

	pub fn pick_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Prefix> {
		self.states.keys().choose(rng).cloned().ok_or(Error::EmptyModel)
	}

	/// Extends `prefix` by at most `max_words` words and returns the words
	/// that were added.
	///
	/// Each step samples a successor of the trailing `order` words. Reaching
	/// a window without successors ends the generation early; an unknown
	/// prefix, or one shorter than `order`, yields an empty sequence.
	pub fn fill<S: AsRef<str>>(&self, prefix: &[S], max_words: usize) -> Vec<String> {
		self.fill_with(prefix, max_words, &mut rand::rng())
	}

	pub fn fill_with<S, R>(&self, prefix: &[S], max_words: usize, rng: &mut R) -> Vec<String>
	where
		S: AsRef<str>,
		R: Rng + ?Sized,
	{
		if prefix.len() < self.order {
			return Vec::new();
		}

		let mut window: Prefix = prefix[prefix.len() - self.order..]
			.iter()
			.map(|word| word.as_ref().to_owned())
			.collect();
		let mut words = Vec::new();

		while words.len() < max_words {
			let Some(state) = self.states.get(&window) else {
				break;
			};
			let Some(next) = state.predict_with(rng) else {
				break;
			};
			let next = next.to_owned();
			window.remove(0);
			window.push(next.clone());
			words.push(next);
		}

		words
	}

	/// Answers an input phrase.
	///
	/// If the last `order` tokens of `input` are a known prefix the answer
	/// continues it. Otherwise a prefix is picked and the answer is that
	/// prefix followed by its continuation.
	///
	/// # Errors
	/// Returns `EmptyModel` if nothing was seeded.
	pub fn respond<S: AsRef<str>>(&self, input: &[S], max_words: usize) -> Result<Vec<String>> {
		self.respond_with(input, max_words, &mut rand::rng())
	}

	pub fn respond_with<S, R>(&self, input: &[S], max_words: usize, rng: &mut R) -> Result<Vec<String>>
	where
		S: AsRef<str>,
		R: Rng + ?Sized,
	{
		if self.is_empty() {
			return Err(Error::EmptyModel);
		}

		if input.len() >= self.order {
			let suffix = &input[input.len() - self.order..];
			if self.contains(suffix) {
				return Ok(self.fill_with(suffix, max_words, rng));
			}
		}

		self.babble_with(max_words, rng)
	}

	/// Unconditioned generation: a picked prefix followed by its continuation.
	pub fn babble_with<R: Rng + ?Sized>(&self, max_words: usize, rng: &mut R) -> Result<Vec<String>> {
		let mut words = self.pick_with(rng)?;
		let continuation = self.fill_with(&words, max_words, rng);
		words.extend(continuation);
		Ok(words)
	}

	/// Merges another chain of the same order into this one.
	///
	/// # Errors
	/// Returns `OrderMismatch` if the orders differ.
	pub fn merge(&mut self, other: WordChain) -> Result<()> {
		if self.order != other.order {
			return Err(Error::OrderMismatch { left: self.order, right: other.order });
		}

		for (key, state) in other.states {
			match self.states.get_mut(&key) {
				Some(existing) => existing.merge(state),
				None => {
					self.states.insert(key, state);
				}
			}
		}

		Ok(())
	}

	/// Describes the first broken invariant, if any.
	pub(crate) fn check_invariants(&self) -> std::result::Result<(), String> {
		if self.order == 0 {
			return Err("order is 0".to_owned());
		}
		for (key, state) in &self.states {
			if key.len() != self.order {
				return Err(format!("prefix {key:?} has {} words, expected {}", key.len(), self.order));
			}
			if !state.is_well_formed() {
				return Err(format!("prefix {key:?} has no valid successors"));
			}
		}
		Ok(())
	}
}
