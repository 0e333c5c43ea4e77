use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;
use std::time::Instant;

use log::{debug, info, warn};

use crate::config::Config;
use crate::corpus::{CorpusRecord, read_corpus};
use crate::digest::DigestStore;
use crate::error::Result;
use crate::gate::ReadinessGate;
use crate::model::WordChain;
use crate::normalizer;

/// Events sent by the seeding workers.
enum Seeding {
	/// One more record was cleaned and seeded.
	Progress,
	/// A worker finished its chunk.
	Partial(WordChain),
}

/// Produces the ready chain at startup, from the digest or from the corpus.
#[derive(Debug, Clone)]
pub struct CorpusLoader {
	corpus: PathBuf,
	digest: DigestStore,
	order: usize,
}

impl CorpusLoader {
	/// # Errors
	/// Returns `InvalidConfig` if `order == 0`.
	pub fn new<PC, PD>(corpus: PC, digest: PD, order: usize) -> Result<Self>
	where
		PC: Into<PathBuf>,
		PD: Into<PathBuf>,
	{
		// Validates the order once for every chain built below.
		WordChain::new(order)?;
		Ok(Self { corpus: corpus.into(), digest: DigestStore::new(digest, order), order })
	}

	pub fn from_config(config: &Config) -> Result<Self> {
		Self::new(&config.corpus, &config.corpus_digest, config.markov_order)
	}

	pub fn corpus_path(&self) -> &Path {
		&self.corpus
	}

	pub fn digest(&self) -> &DigestStore {
		&self.digest
	}

	/// Builds the chain.
	///
	/// - Digest present and valid: load it, the corpus is not read and
	///   `progress` is never called.
	/// - Digest absent, unreadable, corrupt or of another order: read the
	///   corpus, clean and seed every record, then save a new digest.
	///
	/// `progress(done, total)` is called once per record on the calling
	/// thread, `done` increasing from 1 to `total`.
	///
	/// # Errors
	/// Corpus read and parse errors are returned as is; no partial chain
	/// is produced.
	pub fn build<F>(&self, progress: F) -> Result<WordChain>
	where
		F: FnMut(usize, usize),
	{
		if self.digest.exists() {
			match self.digest.load() {
				Ok(model) => return Ok(model),
				Err(e) => warn!("{e}, rebuilding from {}", self.corpus.display()),
			}
		}

		let started = Instant::now();
		let records = read_corpus(&self.corpus)?;
		info!("seeding {} records from {}", records.len(), self.corpus.display());

		let model = self.seed_all(&records, progress)?;
		info!("seeded {} prefixes in {:.2?}", model.len(), started.elapsed());

		if let Err(e) = self.digest.save(&model) {
			warn!("could not cache the model: {e}");
		}
		Ok(model)
	}

	/// Builds the chain and publishes it on `gate`.
	///
	/// On error the gate stays `Building`.
	pub fn run<F>(&self, gate: &ReadinessGate<WordChain>, progress: F) -> Result<()>
	where
		F: FnMut(usize, usize),
	{
		let model = self.build(progress)?;
		gate.signal_ready(model);
		Ok(())
	}

	/// Splits the records into chunks, seeds one private chain per chunk on
	/// scoped threads and merges the partial chains as they arrive.
	fn seed_all<F>(&self, records: &[CorpusRecord], mut progress: F) -> Result<WordChain>
	where
		F: FnMut(usize, usize),
	{
		let total = records.len();
		let mut final_model = WordChain::empty(self.order);
		if records.is_empty() {
			return Ok(final_model);
		}

		let cpus = num_cpus::get();
		let factor = 8;
		let chunks = cpus * factor;
		let chunk_size = total.div_ceil(chunks).max(1);
		let order = self.order;

		thread::scope(|scope| -> Result<()> {
			let (tx, rx) = mpsc::channel();
			for chunk in records.chunks(chunk_size) {
				let tx = tx.clone();
				scope.spawn(move || {
					let mut partial_model = WordChain::empty(order);
					for record in chunk {
						let text = normalizer::clean(record.text());
						partial_model.seed_text(&text);
						if tx.send(Seeding::Progress).is_err() {
							return;
						}
					}
					let _ = tx.send(Seeding::Partial(partial_model));
				});
			}
			drop(tx);

			let mut done = 0;
			for event in rx {
				match event {
					Seeding::Progress => {
						done += 1;
						progress(done, total);
					}
					Seeding::Partial(partial_model) => final_model.merge(partial_model)?,
				}
			}
			debug!("merged {} partial chains", total.div_ceil(chunk_size));
			Ok(())
		})?;

		Ok(final_model)
	}
}
