use std::collections::HashMap;

use rand::Rng;

use serde::{Deserialize, Serialize};


/// Successor statistics of one prefix of the chain.
///
/// A `State` stores every word observed right after a given k-word prefix,
/// weighted by the number of observations.
///
/// ## Responsibilities:
/// - Accumulate successor occurrences while seeding
/// - Predict the next word using weighted random sampling
/// - Merge with the state of the same prefix from another chain
///
/// ## Invariants
/// - Each occurrence count is strictly positive
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct State {
	/// Observed successors and how many times each one was seen.
	/// Example: { "world" => 42, "there" => 3 }
	transitions: HashMap<String, u32>
}

impl State {
	/// Records an occurrence of `next_word` after this prefix.
	pub fn add_transition(&mut self, next_word: &str) {
		match self.transitions.get_mut(next_word) {
			Some(occurrence) => *occurrence += 1,
			None => {
				self.transitions.insert(next_word.to_owned(), 1);
			}
		}
	}

	/// Total number of observations.
	pub fn total(&self) -> u64 {
		self.transitions.values().map(|occurrence| u64::from(*occurrence)).sum()
	}

	/// Number of distinct successors.
	pub fn len(&self) -> usize {
		self.transitions.len()
	}

	pub fn is_empty(&self) -> bool {
		self.transitions.is_empty()
	}

	/// Occurrence count of one successor.
	pub fn count(&self, next_word: &str) -> u32 {
		self.transitions.get(next_word).copied().unwrap_or(0)
	}

	/// Predicts the next word using weighted random sampling.
	///
	/// The probability of selecting a word is proportional to its
	/// occurrence count (cumulative subtraction over the transitions).
	///
	/// Returns `None` if the state has no transitions.
	pub fn predict_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&str> {
		let total = self.total();
		if total == 0 {
			return None;
		}

		let mut r = rng.random_range(0..total);

		let mut fallback: Option<&str> = None;
		for (next_word, occurrence) in &self.transitions {
			let occurrence = u64::from(*occurrence);
			if r < occurrence {
				return Some(next_word.as_str());
			}
			r -= occurrence;
			fallback = Some(next_word.as_str());
		}

		fallback
	}

	/// True when every occurrence count is positive.
	pub(crate) fn is_well_formed(&self) -> bool {
		!self.transitions.is_empty() && self.transitions.values().all(|occurrence| *occurrence > 0)
	}

	/// Merges another state of the same prefix into this one.
	///
	/// Occurrence counts are summed, so merging is commutative and
	/// associative.
	pub fn merge(&mut self, other: State) {
		for (next_word, occurrence) in other.transitions {
			*self.transitions.entry(next_word).or_insert(0) += occurrence;
		}
	}
}
