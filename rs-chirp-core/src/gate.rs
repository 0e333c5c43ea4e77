use std::collections::VecDeque;
use std::fmt;
use std::mem;
use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, warn};

type Continuation<T> = Box<dyn FnOnce(Arc<T>) + Send>;

enum GateState<T> {
	Building { pending: VecDeque<Continuation<T>> },
	// Published, but the queue is still being run by the signaling thread.
	Flushing { value: Arc<T>, pending: VecDeque<Continuation<T>> },
	Ready(Arc<T>),
}

/// One-shot readiness barrier publishing a value, typically the built chain.
///
/// The gate starts `Building`. Continuations registered meanwhile are queued
/// in registration order; `signal_ready` publishes the value exactly once
/// and runs the queue. Registrations arriving while the queue is still being
/// run join its back, so every continuation runs in registration order. Once
/// the queue is drained, later registrations run immediately on the caller's
/// thread.
///
/// Continuations always run outside the internal lock, so they may register
/// further continuations or query the gate.
pub struct ReadinessGate<T> {
	state: Mutex<GateState<T>>,
}

impl<T> ReadinessGate<T> {
	pub fn new() -> Self {
		Self { state: Mutex::new(GateState::Building { pending: VecDeque::new() }) }
	}

	/// Runs `continuation` once `value` is published, or now if it already is.
	pub fn on_ready<F>(&self, continuation: F)
	where
		F: FnOnce(Arc<T>) + Send + 'static,
	{
		let ready = {
			let mut state = self.lock();
			match &mut *state {
				GateState::Building { pending } | GateState::Flushing { pending, .. } => {
					pending.push_back(Box::new(continuation));
					return;
				}
				GateState::Ready(value) => Arc::clone(value),
			}
		};
		continuation(ready);
	}

	/// Publishes `value` and runs every queued continuation in order,
	/// including those registered while the queue runs.
	///
	/// Returns `false`, and drops `value`, if the gate was already signaled;
	/// queued continuations never run twice.
	pub fn signal_ready(&self, value: T) -> bool {
		let value = Arc::new(value);
		let mut batch = {
			let mut state = self.lock();
			let flushing = GateState::Flushing { value: Arc::clone(&value), pending: VecDeque::new() };
			match mem::replace(&mut *state, flushing) {
				GateState::Building { pending } => pending,
				previous => {
					*state = previous;
					warn!("readiness signaled more than once, ignoring");
					return false;
				}
			}
		};

		debug!("gate ready, flushing {} pending continuations", batch.len());
		loop {
			for continuation in batch {
				continuation(Arc::clone(&value));
			}

			let mut state = self.lock();
			batch = match &mut *state {
				GateState::Flushing { pending, .. } => mem::take(pending),
				_ => VecDeque::new(),
			};
			if batch.is_empty() {
				*state = GateState::Ready(Arc::clone(&value));
				return true;
			}
		}
	}

	/// Whether the value has been published.
	pub fn is_ready(&self) -> bool {
		!matches!(&*self.lock(), GateState::Building { .. })
	}

	/// The published value, if the gate is ready.
	pub fn get(&self) -> Option<Arc<T>> {
		match &*self.lock() {
			GateState::Ready(value) | GateState::Flushing { value, .. } => Some(Arc::clone(value)),
			GateState::Building { .. } => None,
		}
	}

	/// Number of continuations waiting to run.
	pub fn pending(&self) -> usize {
		match &*self.lock() {
			GateState::Building { pending } | GateState::Flushing { pending, .. } => pending.len(),
			GateState::Ready(_) => 0,
		}
	}

	fn lock(&self) -> MutexGuard<'_, GateState<T>> {
		// A poisoned lock only means a thread panicked between two plain
		// assignments; the state itself is always consistent.
		self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
	}
}

impl<T> Default for ReadinessGate<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T> fmt::Debug for ReadinessGate<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ReadinessGate")
			.field("ready", &self.is_ready())
			.field("pending", &self.pending())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::thread;

	use super::*;

	#[test]
	fn queued_continuations_run_in_order() {
		let gate = ReadinessGate::new();
		let seen = Arc::new(Mutex::new(Vec::new()));

		for i in 0..5 {
			let seen = Arc::clone(&seen);
			gate.on_ready(move |value: Arc<&str>| seen.lock().unwrap().push((i, *value)));
		}
		assert!(!gate.is_ready());
		assert_eq!(gate.pending(), 5);
		assert!(seen.lock().unwrap().is_empty());

		assert!(gate.signal_ready("model"));
		assert_eq!(*seen.lock().unwrap(), vec![(0, "model"), (1, "model"), (2, "model"), (3, "model"), (4, "model")]);
		assert_eq!(gate.pending(), 0);
	}

	#[test]
	fn second_signal_does_not_rerun() {
		let gate = ReadinessGate::new();
		let runs = Arc::new(AtomicUsize::new(0));
		let counter = Arc::clone(&runs);
		gate.on_ready(move |_: Arc<u32>| {
			counter.fetch_add(1, Ordering::SeqCst);
		});

		assert!(gate.signal_ready(1));
		assert!(!gate.signal_ready(2));
		assert_eq!(runs.load(Ordering::SeqCst), 1);
		assert_eq!(gate.get().as_deref(), Some(&1));
	}

	#[test]
	fn registrations_during_flush_keep_their_place() {
		let gate = Arc::new(ReadinessGate::new());
		let seen = Arc::new(Mutex::new(Vec::new()));

		let registrar_gate = Arc::clone(&gate);
		let registrar_seen = Arc::clone(&seen);
		gate.on_ready(move |_: Arc<()>| {
			registrar_seen.lock().unwrap().push("first");
			// Registers from another thread while the queue is being flushed
			let gate = Arc::clone(&registrar_gate);
			let seen = Arc::clone(&registrar_seen);
			thread::spawn(move || gate.on_ready(move |_| seen.lock().unwrap().push("late")))
				.join()
				.unwrap();
		});
		let counter_seen = Arc::clone(&seen);
		gate.on_ready(move |_| counter_seen.lock().unwrap().push("second"));

		assert!(gate.signal_ready(()));
		assert_eq!(*seen.lock().unwrap(), vec!["first", "second", "late"]);
		assert_eq!(gate.pending(), 0);
		assert!(!gate.signal_ready(()));
	}

	#[test]
	fn late_registration_runs_immediately() {
		let gate = ReadinessGate::new();
		gate.signal_ready(7u32);

		let runs = Arc::new(AtomicUsize::new(0));
		let counter = Arc::clone(&runs);
		gate.on_ready(move |value| {
			counter.fetch_add(*value as usize, Ordering::SeqCst);
		});
		assert_eq!(runs.load(Ordering::SeqCst), 7);
	}

	#[test]
	fn continuation_may_register_another() {
		let gate = Arc::new(ReadinessGate::new());
		let runs = Arc::new(AtomicUsize::new(0));

		let inner_gate = Arc::clone(&gate);
		let counter = Arc::clone(&runs);
		gate.on_ready(move |_: Arc<()>| {
			counter.fetch_add(1, Ordering::SeqCst);
			let counter = Arc::clone(&counter);
			inner_gate.on_ready(move |_| {
				counter.fetch_add(1, Ordering::SeqCst);
			});
		});

		gate.signal_ready(());
		assert_eq!(runs.load(Ordering::SeqCst), 2);
	}

	#[test]
	fn concurrent_registrations_are_never_lost() {
		let gate = Arc::new(ReadinessGate::new());
		let runs = Arc::new(AtomicUsize::new(0));

		let registrars: Vec<_> = (0..8)
			.map(|_| {
				let gate = Arc::clone(&gate);
				let runs = Arc::clone(&runs);
				thread::spawn(move || {
					for _ in 0..200 {
						let runs = Arc::clone(&runs);
						gate.on_ready(move |_: Arc<()>| {
							runs.fetch_add(1, Ordering::SeqCst);
						});
					}
				})
			})
			.collect();

		gate.signal_ready(());
		for registrar in registrars {
			registrar.join().unwrap();
		}
		assert_eq!(runs.load(Ordering::SeqCst), 8 * 200);
	}
}
