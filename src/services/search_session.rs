//! Search Session for the reader.
//!
//! Runs one logical search at a time and reports cumulative snapshots to a
//! single listener. Results and the optional AI answer are fetched
//! concurrently; whichever arrives re-emits a snapshot carrying the latest
//! value of the other.
//!
//! Each run is tagged with a generation number held under the dispatch lock.
//! Starting a new run bumps the generation before the old run's tasks and
//! stream are cancelled, so a superseded run can never reach the listener
//! once `run` has returned.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::services::backend::ZimBackend;
use crate::services::stream_consumer::{StreamCanceller, StreamConsumer};
use crate::types::search::{SearchOutcome, SearchResult, SearchSnapshot};

/// Receives the progress of the current search.
pub trait SearchListener: Send + Sync {
    /// A new cumulative snapshot for the current query.
    fn on_snapshot(&self, snapshot: SearchSnapshot);

    /// The results axis of the current query has ended.
    fn on_finished(&self, _query: &str, _outcome: SearchOutcome) {}
}

struct Dispatcher {
    generation: u64,
    current: SearchSnapshot,
    listener: Arc<dyn SearchListener>,
}

/// Emits on behalf of one run, only while that run is current.
#[derive(Clone)]
struct Emitter {
    dispatch: Arc<Mutex<Dispatcher>>,
    generation: u64,
}

impl Emitter {
    /// Apply `update` to the current snapshot and deliver it. Returns false
    /// if the run has been superseded.
    fn emit(&self, update: impl FnOnce(&mut SearchSnapshot) -> bool) -> bool {
        let mut dispatch = lock(&self.dispatch);
        if dispatch.generation != self.generation {
            debug!(generation = self.generation, "dropping stale search update");
            return false;
        }
        if update(&mut dispatch.current) {
            let snapshot = dispatch.current.clone();
            dispatch.listener.on_snapshot(snapshot);
        }
        true
    }

    fn push_result(&self, result: SearchResult) -> bool {
        self.emit(|snapshot| {
            snapshot.results.push(result);
            true
        })
    }

    fn set_results(&self, results: Vec<SearchResult>) -> bool {
        self.emit(|snapshot| {
            snapshot.results = results;
            true
        })
    }

    fn set_answer(&self, answer: String) -> bool {
        self.emit(|snapshot| {
            if snapshot.answer == answer {
                return false;
            }
            snapshot.answer = answer;
            true
        })
    }

    fn finish(&self, outcome: SearchOutcome) {
        let dispatch = lock(&self.dispatch);
        if dispatch.generation != self.generation {
            return;
        }
        dispatch.listener.on_finished(&dispatch.current.query, outcome);
    }
}

#[derive(Default)]
struct InFlight {
    tasks: Vec<JoinHandle<()>>,
    stream: Arc<Mutex<Option<StreamCanceller>>>,
}

impl InFlight {
    fn cancel(self) {
        if let Some(canceller) = lock(&self.stream).take() {
            canceller.cancel();
        }
        for task in self.tasks {
            task.abort();
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Owns the in-flight search and its listener.
pub struct SearchSession {
    backend: Arc<dyn ZimBackend>,
    dispatch: Arc<Mutex<Dispatcher>>,
    in_flight: Mutex<Option<InFlight>>,
}

impl SearchSession {
    pub fn new(backend: Arc<dyn ZimBackend>, listener: Arc<dyn SearchListener>) -> Self {
        Self {
            backend,
            dispatch: Arc::new(Mutex::new(Dispatcher {
                generation: 0,
                current: SearchSnapshot::default(),
                listener,
            })),
            in_flight: Mutex::new(None),
        }
    }

    /// Start a search for `query`, superseding any search in flight.
    ///
    /// Returns immediately; progress arrives through the listener. Must be
    /// called from within a tokio runtime.
    pub fn run(&self, query: &str, streaming: bool) {
        let mut slot = lock(&self.in_flight);
        let generation = self.advance(&mut slot, query);
        let emitter = Emitter {
            dispatch: self.dispatch.clone(),
            generation,
        };

        if query.trim().is_empty() {
            debug!("blank query, clearing results");
            emitter.emit(|_| true);
            emitter.finish(SearchOutcome::Completed);
            return;
        }

        info!(query, streaming, generation, "starting search");
        let mut in_flight = InFlight::default();
        let results_task = if streaming {
            tokio::spawn(Self::stream_results(
                self.backend.clone(),
                query.to_string(),
                emitter.clone(),
                in_flight.stream.clone(),
            ))
        } else {
            tokio::spawn(Self::batch_results(
                self.backend.clone(),
                query.to_string(),
                emitter.clone(),
            ))
        };
        let answer_task = tokio::spawn(Self::fetch_answer(
            self.backend.clone(),
            query.to_string(),
            emitter,
        ));
        in_flight.tasks = vec![results_task, answer_task];
        *slot = Some(in_flight);
    }

    /// Stop the current search without starting another.
    pub fn cancel(&self) {
        let mut slot = lock(&self.in_flight);
        let query = lock(&self.dispatch).current.query.clone();
        self.advance(&mut slot, &query);
    }

    /// The latest snapshot of the current search.
    pub fn current_snapshot(&self) -> SearchSnapshot {
        lock(&self.dispatch).current.clone()
    }

    /// Bump the generation and reset state, then tear down the previous run.
    fn advance(&self, slot: &mut Option<InFlight>, query: &str) -> u64 {
        let generation = {
            let mut dispatch = lock(&self.dispatch);
            dispatch.generation += 1;
            dispatch.current = SearchSnapshot {
                query: query.to_string(),
                ..SearchSnapshot::default()
            };
            dispatch.generation
        };
        if let Some(previous) = slot.take() {
            debug!(generation, "cancelling superseded search");
            previous.cancel();
        }
        generation
    }

    async fn stream_results(
        backend: Arc<dyn ZimBackend>,
        query: String,
        emitter: Emitter,
        stream_slot: Arc<Mutex<Option<StreamCanceller>>>,
    ) {
        let source = match backend.stream_search(&query).await {
            Ok(source) => source,
            Err(e) => {
                warn!(query, error = %e, "stream search request failed");
                emitter.finish(SearchOutcome::Failed(e.to_string()));
                return;
            }
        };
        let mut handle = StreamConsumer::open(source);
        *lock(&stream_slot) = Some(handle.canceller());

        while let Some(item) = handle.next().await {
            match item {
                Ok(result) => {
                    if !emitter.push_result(result) {
                        handle.cancel();
                        return;
                    }
                }
                Err(e) => {
                    emitter.finish(SearchOutcome::Failed(e.to_string()));
                    return;
                }
            }
        }
        // a run with no hits and no answer has not been shown yet
        if !emitter.emit(|snapshot| snapshot.results.is_empty() && snapshot.answer.is_empty()) {
            return;
        }
        emitter.finish(SearchOutcome::Completed);
    }

    async fn batch_results(backend: Arc<dyn ZimBackend>, query: String, emitter: Emitter) {
        match backend.batch_search(&query).await {
            Ok(results) => {
                if emitter.set_results(results) {
                    emitter.finish(SearchOutcome::Completed);
                }
            }
            Err(e) => {
                warn!(query, error = %e, "batch search failed");
                emitter.finish(SearchOutcome::Failed(e.to_string()));
            }
        }
    }

    async fn fetch_answer(backend: Arc<dyn ZimBackend>, query: String, emitter: Emitter) {
        match backend.ai_enabled().await {
            Ok(true) => {}
            Ok(false) => return,
            Err(e) => {
                debug!(error = %e, "could not read AI capability, skipping answer");
                return;
            }
        }
        match backend.answer_query(&query).await {
            Ok(answer) => {
                emitter.set_answer(answer);
            }
            Err(e) => warn!(query, error = %e, "AI answer request failed"),
        }
    }
}

impl Drop for SearchSession {
    fn drop(&mut self) {
        if let Some(in_flight) = lock(&self.in_flight).take() {
            in_flight.cancel();
        }
    }
}
