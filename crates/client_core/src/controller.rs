//! Query-keyed fetch lifecycle.
//!
//! A [`QueryController`] holds at most one current [`FetchAttempt`]. Every key
//! change cancels the current attempt before a new one is issued, and a
//! completing attempt may only publish its outcome while it still holds the
//! current-attempt marker. Cancellation is reported to nobody: superseded
//! outcomes are dropped and logged at `debug`.

use std::sync::Arc;

use shared::{domain::QueryKey, error::FetchError};
use tokio::{
    sync::{watch, Mutex},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{fetcher::Fetcher, state::ResultState};

pub const DEFAULT_MIN_KEY_LEN: usize = 3;

type KeyChangeHook = Box<dyn Fn(&QueryKey) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AttemptId(pub u64);

#[derive(Debug, Clone)]
pub struct ControllerOptions {
    /// Keys shorter than this (in characters) clear the result instead of
    /// fetching.
    pub min_key_len: usize,
    /// Name used in log fields.
    pub label: &'static str,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            min_key_len: DEFAULT_MIN_KEY_LEN,
            label: "query",
        }
    }
}

impl ControllerOptions {
    pub fn new(label: &'static str, min_key_len: usize) -> Self {
        Self { min_key_len, label }
    }
}

/// What [`QueryController::on_key_change`] did with a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyChange {
    /// Same key as last time.
    Unchanged,
    /// Key failed validation; state is `Idle`.
    Cleared,
    Started(AttemptId),
}

struct FetchAttempt {
    id: AttemptId,
    key: QueryKey,
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl FetchAttempt {
    fn is_live(&self, id: AttemptId) -> bool {
        self.id == id && !self.token.is_cancelled()
    }
}

#[derive(Default)]
struct ControllerInner {
    last_key: Option<QueryKey>,
    next_attempt: u64,
    current: Option<FetchAttempt>,
}

pub struct QueryController<F: Fetcher> {
    fetcher: Arc<F>,
    options: ControllerOptions,
    inner: Arc<Mutex<ControllerInner>>,
    state_tx: Arc<watch::Sender<ResultState<F::Payload>>>,
    on_key_change: Option<KeyChangeHook>,
}

impl<F: Fetcher> QueryController<F> {
    pub fn new(fetcher: Arc<F>, options: ControllerOptions) -> Self {
        let (state_tx, _) = watch::channel(ResultState::Idle);
        Self {
            fetcher,
            options,
            inner: Arc::new(Mutex::new(ControllerInner::default())),
            state_tx: Arc::new(state_tx),
            on_key_change: None,
        }
    }

    /// Registers a callback run on every key change, before any fetch is
    /// issued. The callback runs under the controller lock and must not block.
    pub fn with_key_change_hook(mut self, hook: impl Fn(&QueryKey) + Send + Sync + 'static) -> Self {
        self.on_key_change = Some(Box::new(hook));
        self
    }

    pub fn options(&self) -> &ControllerOptions {
        &self.options
    }

    pub fn state(&self) -> ResultState<F::Payload> {
        self.state_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ResultState<F::Payload>> {
        self.state_tx.subscribe()
    }

    pub async fn current_key(&self) -> Option<QueryKey> {
        self.inner.lock().await.last_key.clone()
    }

    pub async fn current_attempt(&self) -> Option<AttemptId> {
        self.inner.lock().await.current.as_ref().map(|attempt| attempt.id)
    }

    pub fn is_valid_key(&self, key: &QueryKey) -> bool {
        key.char_len() >= self.options.min_key_len
    }

    pub async fn on_key_change(&self, new_key: impl Into<QueryKey>) -> KeyChange {
        let new_key = new_key.into();
        let label = self.options.label;
        let mut inner = self.inner.lock().await;

        if inner.last_key.as_ref() == Some(&new_key) {
            debug!(controller = label, key = %new_key, "key unchanged");
            return KeyChange::Unchanged;
        }
        inner.last_key = Some(new_key.clone());

        if let Some(hook) = &self.on_key_change {
            hook(&new_key);
        }

        if let Some(previous) = inner.current.take() {
            previous.token.cancel();
            debug!(
                controller = label,
                attempt = previous.id.0,
                key = %previous.key,
                "cancelled superseded fetch"
            );
        }

        if !self.is_valid_key(&new_key) {
            debug!(
                controller = label,
                key = %new_key,
                min_key_len = self.options.min_key_len,
                "key too short; clearing result"
            );
            self.state_tx.send_replace(ResultState::Idle);
            return KeyChange::Cleared;
        }

        inner.next_attempt += 1;
        let id = AttemptId(inner.next_attempt);
        let token = CancellationToken::new();
        self.state_tx.send_replace(ResultState::Loading);

        let task = tokio::spawn(run_attempt(
            Arc::clone(&self.fetcher),
            Arc::clone(&self.inner),
            Arc::clone(&self.state_tx),
            label,
            id,
            new_key.clone(),
            token.clone(),
        ));

        inner.current = Some(FetchAttempt {
            id,
            key: new_key,
            token,
            task: Some(task),
        });
        KeyChange::Started(id)
    }

    /// Cancels the current attempt, waits for its task and resets to `Idle`.
    /// The next key change fetches even if it repeats the last key.
    pub async fn shutdown(&self) {
        let attempt = {
            let mut inner = self.inner.lock().await;
            inner.last_key = None;
            // Published under the lock so a key change racing the await
            // below keeps its own `Loading`.
            self.state_tx.send_replace(ResultState::Idle);
            inner.current.take()
        };

        if let Some(mut attempt) = attempt {
            attempt.token.cancel();
            if let Some(task) = attempt.task.take() {
                let _ = task.await;
            }
            debug!(
                controller = self.options.label,
                attempt = attempt.id.0,
                key = %attempt.key,
                "cancelled fetch on shutdown"
            );
        }
    }
}

impl<F: Fetcher> Drop for QueryController<F> {
    fn drop(&mut self) {
        // A held lock means a completion is in progress and will clear the
        // attempt itself.
        if let Ok(mut inner) = self.inner.try_lock() {
            if let Some(attempt) = inner.current.take() {
                attempt.token.cancel();
            }
        }
    }
}

async fn run_attempt<F: Fetcher>(
    fetcher: Arc<F>,
    inner: Arc<Mutex<ControllerInner>>,
    state_tx: Arc<watch::Sender<ResultState<F::Payload>>>,
    label: &'static str,
    id: AttemptId,
    key: QueryKey,
    token: CancellationToken,
) {
    debug!(controller = label, attempt = id.0, key = %key, "fetch started");
    let outcome = tokio::select! {
        biased;
        _ = token.cancelled() => Err(FetchError::Cancelled),
        result = fetcher.fetch(&key) => result,
    };
    complete(&inner, &state_tx, label, id, &key, outcome).await;
}

/// Publishes `outcome` if `id` is still the live current attempt. Returns
/// whether the state changed.
async fn complete<P: Clone>(
    inner: &Mutex<ControllerInner>,
    state_tx: &watch::Sender<ResultState<P>>,
    label: &'static str,
    id: AttemptId,
    key: &QueryKey,
    outcome: Result<P, FetchError>,
) -> bool {
    let mut inner = inner.lock().await;
    let is_current = inner
        .current
        .as_ref()
        .is_some_and(|attempt| attempt.is_live(id));

    if !is_current {
        debug!(
            controller = label,
            attempt = id.0,
            key = %key,
            cancelled = matches!(outcome, Err(FetchError::Cancelled)),
            "discarding superseded fetch outcome"
        );
        return false;
    }
    inner.current = None;

    let next = match outcome {
        Ok(payload) => {
            info!(controller = label, attempt = id.0, key = %key, "fetch succeeded");
            ResultState::Success(payload)
        }
        Err(FetchError::Cancelled) => {
            debug!(
                controller = label,
                attempt = id.0,
                key = %key,
                "transport reported cancellation"
            );
            ResultState::Idle
        }
        Err(error) => {
            warn!(
                controller = label,
                attempt = id.0,
                key = %key,
                code = ?error.code(),
                "fetch failed: {error}"
            );
            ResultState::Failure(error)
        }
    };
    state_tx.send_replace(next);
    true
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
