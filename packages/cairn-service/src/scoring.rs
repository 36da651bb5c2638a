use std::{collections::HashMap, sync::Arc, time::Duration as StdDuration};

use time::{Duration, OffsetDateTime};
use tokio::{sync::mpsc, task::JoinHandle, time as tokio_time};
use uuid::Uuid;

use crate::{Error, Result};
use cairn_storage::{Caller, FitnessDelta, GraphStore};

const BASE_BACKOFF_MS: i64 = 250;
const MAX_BACKOFF_MS: i64 = 5_000;

pub trait Clock
where
	Self: Send + Sync,
{
	fn now(&self) -> OffsetDateTime;
}

pub struct SystemClock;
impl Clock for SystemClock {
	fn now(&self) -> OffsetDateTime {
		OffsetDateTime::now_utc()
	}
}

/// Flush triggers for the scoring queue: whichever of the hit count or the age of the oldest
/// unflushed hit is reached first wins.
#[derive(Clone, Copy, Debug)]
pub struct FlushPolicy {
	pub max_pending: usize,
	pub max_age: Duration,
	pub max_attempts: u32,
}
impl FlushPolicy {
	pub fn from_config(cfg: &cairn_config::Scoring) -> Self {
		Self {
			max_pending: cfg.flush_max_pending,
			max_age: Duration::seconds(cfg.flush_interval_secs as i64),
			max_attempts: cfg.flush_max_attempts,
		}
	}
}

#[derive(Clone, Copy, Debug)]
pub struct Hit {
	pub concept_id: Uuid,
	pub relevance: f64,
}

/// The explicit accumulator behind the flusher: per-concept deltas, a hit counter, and the age
/// of the oldest unflushed hit. Owned by exactly one consumer; deltas leave it only through
/// [`Accumulator::mark_flushed`], after the store confirms a flush.
pub(crate) struct Accumulator {
	pending: HashMap<Uuid, FitnessDelta>,
	pending_hits: usize,
	oldest: Option<OffsetDateTime>,
	policy: FlushPolicy,
	clock: Arc<dyn Clock>,
}
impl Accumulator {
	pub(crate) fn new(policy: FlushPolicy, clock: Arc<dyn Clock>) -> Self {
		Self { pending: HashMap::new(), pending_hits: 0, oldest: None, policy, clock }
	}

	pub(crate) fn record(&mut self, hit: Hit) {
		let entry = self.pending.entry(hit.concept_id).or_insert_with(|| FitnessDelta {
			concept_id: hit.concept_id,
			count: 0,
			relevance_sum_delta: 0.0,
		});

		entry.count += 1;
		entry.relevance_sum_delta += hit.relevance.clamp(0.0, 1.0);
		self.pending_hits += 1;

		if self.oldest.is_none() {
			self.oldest = Some(self.clock.now());
		}
	}

	pub(crate) fn is_empty(&self) -> bool {
		self.pending_hits == 0
	}

	pub(crate) fn should_flush(&self) -> bool {
		if self.pending_hits >= self.policy.max_pending {
			return true;
		}

		match self.oldest {
			Some(oldest) => self.clock.now() - oldest >= self.policy.max_age,
			None => false,
		}
	}

	/// Remaining wait until the age trigger fires; `None` while the accumulator is empty.
	pub(crate) fn time_until_deadline(&self) -> Option<StdDuration> {
		let oldest = self.oldest?;
		let remaining = oldest + self.policy.max_age - self.clock.now();

		Some(to_std_duration(remaining))
	}

	pub(crate) fn deltas(&self) -> Vec<FitnessDelta> {
		let mut deltas = self.pending.values().cloned().collect::<Vec<_>>();

		deltas.sort_by_key(|delta| delta.concept_id);

		deltas
	}

	/// Clears confirmed deltas. Called exactly once per confirmed flush; an unconfirmed flush
	/// leaves everything in place for the retry.
	pub(crate) fn mark_flushed(&mut self) {
		self.pending.clear();
		self.pending_hits = 0;
		self.oldest = None;
	}

	/// Re-arms the age trigger after a failed flush round so retries pace at the flush interval
	/// instead of spinning.
	pub(crate) fn rearm(&mut self) {
		if self.pending_hits > 0 {
			self.oldest = Some(self.clock.now());
		}
	}
}

/// Usage-driven scoring pipeline: query hits enter a bounded channel and a single consumer
/// drains them into the accumulator, flushing in batches outside any query transaction. No two
/// flushes are ever in flight.
pub struct ScoreQueue {
	tx: mpsc::Sender<Hit>,
	task: JoinHandle<()>,
}
impl ScoreQueue {
	pub fn spawn(
		store: Arc<dyn GraphStore>,
		caller: Caller,
		policy: FlushPolicy,
		clock: Arc<dyn Clock>,
		capacity: usize,
	) -> Self {
		let (tx, rx) = mpsc::channel(capacity);
		let task = tokio::spawn(run_flusher(rx, store, caller, policy, clock));

		Self { tx, task }
	}

	/// Records one query hit. Cheap: a channel send, no store access. Waits for channel
	/// capacity rather than dropping usage data.
	pub async fn record_hit(&self, concept_id: Uuid, relevance: f64) -> Result<()> {
		self.tx
			.send(Hit { concept_id, relevance })
			.await
			.map_err(|_| Error::Flush { attempts: 0, message: "Scoring queue is closed.".to_string() })
	}

	/// Closes the queue: the consumer drains remaining hits, flushes them, and exits.
	pub async fn shutdown(self) -> Result<()> {
		drop(self.tx);

		self.task.await.map_err(|err| Error::Flush {
			attempts: 0,
			message: format!("Scoring flusher panicked: {err}."),
		})
	}
}

enum Step {
	Hit(Hit),
	Timer,
	Closed,
}

async fn run_flusher(
	mut rx: mpsc::Receiver<Hit>,
	store: Arc<dyn GraphStore>,
	caller: Caller,
	policy: FlushPolicy,
	clock: Arc<dyn Clock>,
) {
	let mut accumulator = Accumulator::new(policy, clock);

	loop {
		let step = match accumulator.time_until_deadline() {
			Some(wait) => match tokio_time::timeout(wait, rx.recv()).await {
				Ok(Some(hit)) => Step::Hit(hit),
				Ok(None) => Step::Closed,
				Err(_) => Step::Timer,
			},
			None => match rx.recv().await {
				Some(hit) => Step::Hit(hit),
				None => Step::Closed,
			},
		};

		match step {
			Step::Hit(hit) => {
				accumulator.record(hit);

				if accumulator.should_flush() {
					flush_with_retry(&mut accumulator, store.as_ref(), &caller, &policy).await;
				}
			},
			Step::Timer => {
				if !accumulator.is_empty() {
					flush_with_retry(&mut accumulator, store.as_ref(), &caller, &policy).await;
				}
			},
			Step::Closed => {
				if !accumulator.is_empty() {
					flush_with_retry(&mut accumulator, store.as_ref(), &caller, &policy).await;
				}

				return;
			},
		}
	}
}

/// One flush round: at most `max_attempts` tries with exponential backoff. Deltas are cleared
/// only after the store confirms; an exhausted round re-arms the age trigger and leaves them in
/// the accumulator, so counted units are applied at most once and dropped never.
async fn flush_with_retry(
	accumulator: &mut Accumulator,
	store: &dyn GraphStore,
	caller: &Caller,
	policy: &FlushPolicy,
) {
	let deltas = accumulator.deltas();

	if deltas.is_empty() {
		accumulator.mark_flushed();

		return;
	}

	let mut backoff = Duration::milliseconds(BASE_BACKOFF_MS);

	for attempt in 1..=policy.max_attempts {
		match store.batch_update_fitness(caller, &deltas).await {
			Ok(()) => {
				accumulator.mark_flushed();
				tracing::info!(deltas = deltas.len(), "Flushed fitness deltas.");

				return;
			},
			Err(err) => {
				tracing::error!(error = %err, attempt, "Fitness flush failed.");

				if attempt < policy.max_attempts {
					tokio_time::sleep(to_std_duration(backoff)).await;

					backoff = backoff.saturating_mul(2).min(Duration::milliseconds(MAX_BACKOFF_MS));
				}
			},
		}
	}

	accumulator.rearm();
	tracing::error!(
		attempts = policy.max_attempts,
		pending = deltas.len(),
		"Fitness flush round exhausted; deltas retained for the next trigger.",
	);
}

fn to_std_duration(duration: Duration) -> StdDuration {
	let millis = duration.whole_milliseconds();

	if millis <= 0 {
		return StdDuration::from_millis(0);
	}

	StdDuration::from_millis(millis as u64)
}
