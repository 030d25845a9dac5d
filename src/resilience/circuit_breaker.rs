//! Circuit breaker guarding the bank call.
//!
//! # States
//! - Closed: normal operation, calls pass through
//! - Open: bank assumed down, calls fail fast
//! - Half-Open: a limited number of probe calls test recovery
//!
//! # State Transitions
//! ```text
//! Closed → Open: consecutive failures >= failure_threshold
//! Closed: counts reset every `interval` (a new generation)
//! Open → Half-Open: after `timeout` has elapsed
//! Half-Open → Closed: `max_requests` consecutive successful probes
//! Half-Open → Open: any probe fails
//! ```
//!
//! # Design Decisions
//! - Counts live behind one mutex that is never held across the guarded call
//! - Results from an older generation are ignored
//! - State-change listeners run after the lock is released

use futures_util::future::BoxFuture;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

use crate::bank::{AuthStatus, DeclinedError};
use crate::config::CircuitBreakerConfig;

/// Breaker state.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed = 0,
    HalfOpen = 1,
    Open = 2,
}

impl BreakerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BreakerState::Closed => "closed",
            BreakerState::HalfOpen => "half-open",
            BreakerState::Open => "open",
        }
    }

    /// Value reported on the state gauge.
    pub fn gauge_value(&self) -> f64 {
        f64::from(*self as u8)
    }
}

impl From<u8> for BreakerState {
    fn from(val: u8) -> Self {
        match val {
            1 => BreakerState::HalfOpen,
            2 => BreakerState::Open,
            _ => BreakerState::Closed,
        }
    }
}

impl fmt::Display for BreakerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by a guarded call.
#[derive(Debug, Error)]
pub enum BreakerError<E> {
    /// The breaker is open; the call was not attempted.
    #[error("circuit breaker is open")]
    Open,

    /// The half-open probe quota is used up; the call was not attempted.
    #[error("too many requests")]
    TooManyRequests,

    /// The guarded call itself failed.
    #[error("{0}")]
    Call(E),
}

impl<E> BreakerError<E> {
    /// True when the breaker refused to run the call.
    pub fn is_rejection(&self) -> bool {
        matches!(self, BreakerError::Open | BreakerError::TooManyRequests)
    }
}

/// Future of the guarded bank call.
pub type CallFuture<'a> = BoxFuture<'a, Result<AuthStatus, DeclinedError>>;

/// Circuit breaker capability used by the request pipeline.
pub trait Breaker: Send + Sync {
    fn execute<'a>(
        &'a self,
        call: CallFuture<'a>,
    ) -> BoxFuture<'a, Result<AuthStatus, BreakerError<DeclinedError>>>;

    /// Point-in-time state. It may change before the caller acts on it.
    fn state(&self) -> BreakerState;

    fn state_value(&self) -> f64 {
        self.state().gauge_value()
    }
}

/// Callback invoked with `(name, from, to)` on every transition.
pub type StateListener = Arc<dyn Fn(&str, BreakerState, BreakerState) + Send + Sync>;

/// Request counts for the current generation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Counts {
    pub requests: u32,
    pub total_successes: u32,
    pub total_failures: u32,
    pub consecutive_successes: u32,
    pub consecutive_failures: u32,
}

impl Counts {
    fn on_success(&mut self) {
        self.total_successes += 1;
        self.consecutive_successes += 1;
        self.consecutive_failures = 0;
    }

    fn on_failure(&mut self) {
        self.total_failures += 1;
        self.consecutive_failures += 1;
        self.consecutive_successes = 0;
    }
}

type Transition = (BreakerState, BreakerState);

#[derive(Debug)]
struct Machine {
    state: BreakerState,
    generation: u64,
    counts: Counts,
    expiry: Option<Instant>,
}

#[derive(Debug, Clone)]
struct Settings {
    name: String,
    max_requests: u32,
    interval: Duration,
    timeout: Duration,
    failure_threshold: u32,
}

impl Machine {
    fn new(settings: &Settings, now: Instant) -> Self {
        let mut machine = Self {
            state: BreakerState::Closed,
            generation: 0,
            counts: Counts::default(),
            expiry: None,
        };
        machine.new_generation(settings, now);
        machine
    }

    /// Apply time-based transitions and return the resulting state.
    fn refresh(&mut self, settings: &Settings, now: Instant, out: &mut Vec<Transition>) -> BreakerState {
        let expired = self.expiry.is_some_and(|expiry| expiry <= now);
        match self.state {
            BreakerState::Closed if expired => self.new_generation(settings, now),
            BreakerState::Open if expired => {
                self.set_state(BreakerState::HalfOpen, settings, now, out)
            }
            _ => {}
        }
        self.state
    }

    fn set_state(&mut self, to: BreakerState, settings: &Settings, now: Instant, out: &mut Vec<Transition>) {
        if self.state == to {
            return;
        }
        let from = self.state;
        self.state = to;
        self.new_generation(settings, now);
        out.push((from, to));
    }

    fn new_generation(&mut self, settings: &Settings, now: Instant) {
        self.generation += 1;
        self.counts = Counts::default();
        self.expiry = match self.state {
            BreakerState::Closed if settings.interval.is_zero() => None,
            BreakerState::Closed => Some(now + settings.interval),
            BreakerState::Open => Some(now + settings.timeout),
            BreakerState::HalfOpen => None,
        };
    }
}

/// Consecutive-failure circuit breaker with generation-based windows.
pub struct CircuitBreaker {
    settings: Settings,
    machine: Mutex<Machine>,
    listener: Option<StateListener>,
}

impl CircuitBreaker {
    pub fn new(config: &CircuitBreakerConfig) -> Self {
        let settings = Settings {
            name: config.name.clone(),
            max_requests: config.max_requests.max(1),
            interval: config.interval(),
            timeout: config.timeout(),
            failure_threshold: config.failure_threshold.max(1),
        };
        let machine = Mutex::new(Machine::new(&settings, Instant::now()));

        Self {
            settings,
            machine,
            listener: None,
        }
    }

    /// Register the state-change callback.
    pub fn with_listener(mut self, listener: StateListener) -> Self {
        self.listener = Some(listener);
        self
    }

    pub fn name(&self) -> &str {
        &self.settings.name
    }

    /// Current state, applying any expired cooldown or window first.
    pub fn current_state(&self) -> BreakerState {
        let mut transitions = Vec::new();
        let state = {
            let mut machine = self.lock();
            machine.refresh(&self.settings, Instant::now(), &mut transitions)
        };
        self.notify(transitions);
        state
    }

    /// Counts of the current generation.
    pub fn counts(&self) -> Counts {
        self.lock().counts
    }

    /// Run `call` through the breaker.
    ///
    /// Rejected calls are never polled. A call that is dropped before it
    /// completes is recorded as a failure so its half-open slot is released.
    pub async fn call<F, T, E>(&self, call: F) -> Result<T, BreakerError<E>>
    where
        F: Future<Output = Result<T, E>>,
    {
        let generation = self.before_call()?;
        let mut guard = CallGuard {
            breaker: self,
            generation,
            done: false,
        };

        let result = call.await;
        guard.done = true;
        self.after_call(generation, result.is_ok());

        result.map_err(BreakerError::Call)
    }

    fn before_call<E>(&self) -> Result<u64, BreakerError<E>> {
        let mut transitions = Vec::new();
        let admitted = {
            let mut machine = self.lock();
            match machine.refresh(&self.settings, Instant::now(), &mut transitions) {
                BreakerState::Open => Err(BreakerError::Open),
                BreakerState::HalfOpen if machine.counts.requests >= self.settings.max_requests => {
                    Err(BreakerError::TooManyRequests)
                }
                _ => {
                    machine.counts.requests += 1;
                    Ok(machine.generation)
                }
            }
        };
        self.notify(transitions);
        admitted
    }

    fn after_call(&self, generation: u64, success: bool) {
        let mut transitions = Vec::new();
        {
            let mut machine = self.lock();
            let now = Instant::now();
            let state = machine.refresh(&self.settings, now, &mut transitions);
            if machine.generation == generation {
                if success {
                    machine.counts.on_success();
                    if state == BreakerState::HalfOpen
                        && machine.counts.consecutive_successes >= self.settings.max_requests
                    {
                        machine.set_state(BreakerState::Closed, &self.settings, now, &mut transitions);
                    }
                } else {
                    machine.counts.on_failure();
                    let trip = match state {
                        BreakerState::Closed => {
                            machine.counts.consecutive_failures >= self.settings.failure_threshold
                        }
                        BreakerState::HalfOpen => true,
                        BreakerState::Open => false,
                    };
                    if trip {
                        machine.set_state(BreakerState::Open, &self.settings, now, &mut transitions);
                    }
                }
            }
        }
        self.notify(transitions);
    }

    fn notify(&self, transitions: Vec<Transition>) {
        for (from, to) in transitions {
            tracing::info!(breaker = %self.settings.name, from = %from, to = %to, "circuit-breaker transition");
            if let Some(listener) = &self.listener {
                listener(&self.settings.name, from, to);
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Machine> {
        self.machine.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("settings", &self.settings)
            .field("machine", &*self.lock())
            .finish()
    }
}

impl Breaker for CircuitBreaker {
    fn execute<'a>(
        &'a self,
        call: CallFuture<'a>,
    ) -> BoxFuture<'a, Result<AuthStatus, BreakerError<DeclinedError>>> {
        Box::pin(self.call(call))
    }

    fn state(&self) -> BreakerState {
        self.current_state()
    }
}

struct CallGuard<'a> {
    breaker: &'a CircuitBreaker,
    generation: u64,
    done: bool,
}

impl Drop for CallGuard<'_> {
    fn drop(&mut self) {
        if !self.done {
            self.breaker.after_call(self.generation, false);
        }
    }
}

/// Breaker whose state is set by hand.
///
/// Open and half-open both fail fast with their usual errors; closed passes
/// every call through. Counts how many calls it let through.
#[derive(Debug, Default)]
pub struct ManualBreaker {
    state: AtomicU8,
    admitted: std::sync::atomic::AtomicU64,
}

impl ManualBreaker {
    pub fn new(state: BreakerState) -> Self {
        Self {
            state: AtomicU8::new(state as u8),
            admitted: std::sync::atomic::AtomicU64::new(0),
        }
    }

    pub fn set_state(&self, state: BreakerState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }

    pub fn admitted(&self) -> u64 {
        self.admitted.load(Ordering::SeqCst)
    }
}

impl Breaker for ManualBreaker {
    fn execute<'a>(
        &'a self,
        call: CallFuture<'a>,
    ) -> BoxFuture<'a, Result<AuthStatus, BreakerError<DeclinedError>>> {
        Box::pin(async move {
            match self.state() {
                BreakerState::Open => Err(BreakerError::Open),
                BreakerState::HalfOpen => Err(BreakerError::TooManyRequests),
                BreakerState::Closed => {
                    self.admitted.fetch_add(1, Ordering::SeqCst);
                    call.await.map_err(BreakerError::Call)
                }
            }
        })
    }

    fn state(&self) -> BreakerState {
        BreakerState::from(self.state.load(Ordering::SeqCst))
    }
}
