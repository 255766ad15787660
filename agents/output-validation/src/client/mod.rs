//! Reasoning service seam
//!
//! The semantic orchestrator talks to a remote, model-backed validator only
//! through the [`ReasoningService`] trait. [`ReasoningHandle`] owns the
//! process-wide, lazily initialized instance and its
//! `Uninitialized -> Initializing -> Ready | Unavailable` lifecycle.

pub mod chat;

pub use chat::{ChatClientConfig, ChatReasoningClient, ChatReasoningClientBuilder};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::config::EngineConfig;
use crate::contracts::{StructuralError, ValidationLevel};

/// Errors raised by reasoning service clients
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    /// Transport failure (connect, TLS, timeout at the HTTP layer)
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Remote returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Response arrived but could not be decoded into JSON
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// No credentials or endpoint configured
    #[error("Reasoning service not configured: {0}")]
    NotConfigured(String),

    #[error("Client configuration error: {0}")]
    Config(String),
}

/// A remote validator that judges whether data makes sense for a schema
#[async_trait]
pub trait ReasoningService: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &str;

    /// Run one validation prompt, returning the raw JSON verdict object.
    ///
    /// Shape checking is the caller's job; implementations only guarantee
    /// the value was decoded from the remote response.
    async fn run(&self, context: &PromptContext) -> Result<Value, ClientError>;
}

/// Everything a reasoning service needs to phrase one request
#[derive(Debug, Clone, Serialize)]
pub struct PromptContext {
    pub kind: String,
    pub level: ValidationLevel,
    pub schema: Value,
    pub data: Value,
    pub structural_errors: Vec<StructuralError>,
}

impl PromptContext {
    pub fn new(kind: impl Into<String>, level: ValidationLevel, schema: Value, data: Value) -> Self {
        Self {
            kind: kind.into(),
            level,
            schema,
            data,
            structural_errors: Vec::new(),
        }
    }

    pub fn with_structural_errors(mut self, errors: Vec<StructuralError>) -> Self {
        self.structural_errors = errors;
        self
    }

    /// Render the user prompt, worded per validation kind
    pub fn render_prompt(&self) -> String {
        let level = self.level.as_str();
        let focus = match self.kind.as_str() {
            "generic" => format!(
                "Validate this generic AI output with {} strictness.\n\
                 Check if the response is coherent, well-structured, and appropriate.",
                level
            ),
            "recommendation" => format!(
                "Validate this recommendation-type AI output with {} strictness.\n\
                 Check if the recommendations are relevant, specific, and actionable.",
                level
            ),
            "summary" => format!(
                "Validate this summary-type AI output with {} strictness.\n\
                 Check if the summary accurately captures the key points of the original text.",
                level
            ),
            "classification" => format!(
                "Validate this classification-type AI output with {} strictness.\n\
                 Check if the classification is accurate, well-justified, and appropriate.",
                level
            ),
            other => format!("Validate this {} AI output with {} strictness.", other, level),
        };

        let mut prompt = format!(
            "{}\n\nSchema:\n{}\n\nData:\n{}\n\n\
             Respond with a JSON object containing:\n\
             - is_semantically_valid (boolean): Is the data semantically valid?\n\
             - semantic_score (number): Score from 0.0 to 1.0\n\
             - issues (array of strings): Any semantic issues found\n\
             - suggestions (array of strings): How to fix the issues",
            focus,
            pretty(&self.schema),
            pretty(&self.data)
        );

        if !self.structural_errors.is_empty() {
            prompt.push_str(&format!(
                "\n\nNote that structural validation found these errors:\n{}\n\
                 Consider these when providing semantic validation.",
                pretty(&serde_json::to_value(&self.structural_errors).unwrap_or(Value::Null))
            ));
        }

        prompt
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Builds a service instance; `Err` leaves the handle `Unavailable`
pub type ServiceInitializer =
    Box<dyn Fn() -> Result<Arc<dyn ReasoningService>, ClientError> + Send + Sync>;

enum HandleState {
    Uninitialized,
    Initializing,
    Ready(Arc<dyn ReasoningService>),
    Unavailable { since: Instant, reason: String },
}

enum Decision {
    Use(Arc<dyn ReasoningService>),
    Skip,
    Initialize,
}

/// Observable lifecycle state of a [`ReasoningHandle`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleStatus {
    Uninitialized,
    Initializing,
    Ready,
    Unavailable,
}

impl fmt::Display for HandleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandleStatus::Uninitialized => write!(f, "uninitialized"),
            HandleStatus::Initializing => write!(f, "initializing"),
            HandleStatus::Ready => write!(f, "ready"),
            HandleStatus::Unavailable => write!(f, "unavailable"),
        }
    }
}

/// Shared, lazily initialized reasoning service slot.
///
/// Reads are concurrent. The first caller that finds the slot
/// uninitialized (or unavailable past `retry_after`) moves it to
/// `Initializing` and runs the initializer; everyone else sees no service
/// in the meantime and never waits on it.
pub struct ReasoningHandle {
    state: RwLock<HandleState>,
    initializer: Option<ServiceInitializer>,
    retry_after: Duration,
}

impl ReasoningHandle {
    /// Handle that initializes lazily on first use
    pub fn new(initializer: ServiceInitializer, retry_after: Duration) -> Self {
        Self {
            state: RwLock::new(HandleState::Uninitialized),
            initializer: Some(initializer),
            retry_after,
        }
    }

    /// Handle that is ready from the start
    pub fn ready(service: Arc<dyn ReasoningService>) -> Self {
        Self {
            state: RwLock::new(HandleState::Ready(service)),
            initializer: None,
            retry_after: Duration::MAX,
        }
    }

    /// Handle that never produces a service
    pub fn disabled() -> Self {
        Self {
            state: RwLock::new(HandleState::Unavailable {
                since: Instant::now(),
                reason: "reasoning service disabled".to_string(),
            }),
            initializer: None,
            retry_after: Duration::MAX,
        }
    }

    /// Handle backed by the HTTP chat client described by `config`, or a
    /// disabled handle when no API key is configured
    pub fn from_config(config: &EngineConfig) -> Self {
        if !config.has_reasoning_service() {
            return Self::disabled();
        }
        let client_config = ChatClientConfig::from_engine_config(config);
        let initializer: ServiceInitializer = Box::new(move || {
            let client = ChatReasoningClient::with_config(client_config.clone())?;
            Ok(Arc::new(client) as Arc<dyn ReasoningService>)
        });
        Self::new(
            initializer,
            Duration::from_millis(config.init_retry_after_ms),
        )
    }

    pub fn status(&self) -> HandleStatus {
        match &*self.state.read().unwrap_or_else(PoisonError::into_inner) {
            HandleState::Uninitialized => HandleStatus::Uninitialized,
            HandleState::Initializing => HandleStatus::Initializing,
            HandleState::Ready(_) => HandleStatus::Ready,
            HandleState::Unavailable { .. } => HandleStatus::Unavailable,
        }
    }

    /// Current service, initializing it first if due.
    ///
    /// Returns `None` while another caller is initializing, or when the
    /// service is unavailable and the retry interval has not elapsed.
    pub fn get(&self) -> Option<Arc<dyn ReasoningService>> {
        {
            let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
            match self.decide(&state) {
                Decision::Use(service) => return Some(service),
                Decision::Skip => return None,
                Decision::Initialize => {}
            }
        }

        let initializer = self.initializer.as_ref()?;

        {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            match self.decide(&state) {
                Decision::Use(service) => return Some(service),
                Decision::Skip => return None,
                Decision::Initialize => *state = HandleState::Initializing,
            }
        }

        let guard = InitializingGuard { handle: self };
        let outcome = initializer();
        std::mem::forget(guard);

        let (next, service) = match outcome {
            Ok(service) => {
                tracing::info!(service = service.name(), "Reasoning service ready");
                (HandleState::Ready(Arc::clone(&service)), Some(service))
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    retry_after_ms = self.retry_after.as_millis() as u64,
                    "Reasoning service unavailable, using heuristic validation"
                );
                (
                    HandleState::Unavailable {
                        since: Instant::now(),
                        reason: e.to_string(),
                    },
                    None,
                )
            }
        };

        *self.state.write().unwrap_or_else(PoisonError::into_inner) = next;
        service
    }

    /// Whether this handle can ever produce a service
    pub fn is_configured(&self) -> bool {
        self.initializer.is_some() || self.status() == HandleStatus::Ready
    }

    /// Why the service is unavailable, if it is
    pub fn unavailable_reason(&self) -> Option<String> {
        match &*self.state.read().unwrap_or_else(PoisonError::into_inner) {
            HandleState::Unavailable { reason, .. } => Some(reason.clone()),
            _ => None,
        }
    }

    fn decide(&self, state: &HandleState) -> Decision {
        match state {
            HandleState::Ready(service) => Decision::Use(Arc::clone(service)),
            HandleState::Initializing => Decision::Skip,
            HandleState::Unavailable { since, .. } if !self.retry_due(*since) => Decision::Skip,
            HandleState::Unavailable { .. } | HandleState::Uninitialized => Decision::Initialize,
        }
    }

    fn retry_due(&self, since: Instant) -> bool {
        self.initializer.is_some() && since.elapsed() >= self.retry_after
    }
}

/// Moves the handle out of `Initializing` when the initializer unwinds
struct InitializingGuard<'h> {
    handle: &'h ReasoningHandle,
}

impl Drop for InitializingGuard<'_> {
    fn drop(&mut self) {
        *self.handle.state.write().unwrap_or_else(PoisonError::into_inner) =
            HandleState::Unavailable {
                since: Instant::now(),
                reason: "reasoning service initializer panicked".to_string(),
            };
    }
}

impl fmt::Debug for ReasoningHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReasoningHandle")
            .field("status", &self.status())
            .field("retry_after", &self.retry_after)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{mpsc, Mutex};
    use std::thread;

    struct EchoService;

    #[async_trait]
    impl ReasoningService for EchoService {
        fn name(&self) -> &str {
            "echo"
        }

        async fn run(&self, _context: &PromptContext) -> Result<Value, ClientError> {
            Ok(json!({"is_semantically_valid": true, "semantic_score": 1.0}))
        }
    }

    fn counting_initializer(calls: Arc<AtomicUsize>, succeed: bool) -> ServiceInitializer {
        Box::new(move || {
            calls.fetch_add(1, Ordering::SeqCst);
            if succeed {
                Ok(Arc::new(EchoService) as Arc<dyn ReasoningService>)
            } else {
                Err(ClientError::NotConfigured("no api key".to_string()))
            }
        })
    }

    #[test]
    fn test_lazy_initialization_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handle = ReasoningHandle::new(
            counting_initializer(calls.clone(), true),
            Duration::from_secs(30),
        );
        assert_eq!(handle.status(), HandleStatus::Uninitialized);

        assert!(handle.get().is_some());
        assert!(handle.get().is_some());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(handle.status(), HandleStatus::Ready);
    }

    #[test]
    fn test_failed_initialization_waits_for_retry_interval() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handle = ReasoningHandle::new(
            counting_initializer(calls.clone(), false),
            Duration::from_secs(3600),
        );

        assert!(handle.get().is_none());
        assert!(handle.get().is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(handle.status(), HandleStatus::Unavailable);
        assert!(handle.unavailable_reason().unwrap().contains("no api key"));
    }

    #[test]
    fn test_failed_initialization_retries_after_interval() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handle = ReasoningHandle::new(counting_initializer(calls.clone(), false), Duration::ZERO);

        assert!(handle.get().is_none());
        assert!(handle.get().is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_panicking_initializer_leaves_handle_unavailable() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let handle = ReasoningHandle::new(
            Box::new(move || {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    panic!("client construction failed");
                }
                Ok(Arc::new(EchoService) as Arc<dyn ReasoningService>)
            }),
            Duration::ZERO,
        );

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| handle.get()));
        assert!(outcome.is_err());
        assert_eq!(handle.status(), HandleStatus::Unavailable);
        assert!(handle.unavailable_reason().unwrap().contains("panicked"));

        assert!(handle.get().is_some());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(handle.status(), HandleStatus::Ready);
    }

    #[test]
    fn test_concurrent_callers_do_not_wait_on_initialization() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let release_rx = Mutex::new(release_rx);
        let counter = calls.clone();
        let handle = Arc::new(ReasoningHandle::new(
            Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                let _ = release_rx
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .recv();
                Ok(Arc::new(EchoService) as Arc<dyn ReasoningService>)
            }),
            Duration::from_secs(30),
        ));

        let initializing = {
            let handle = Arc::clone(&handle);
            thread::spawn(move || handle.get().is_some())
        };
        while handle.status() != HandleStatus::Initializing {
            thread::yield_now();
        }

        let waiters: Vec<_> = (0..8)
            .map(|_| {
                let handle = Arc::clone(&handle);
                thread::spawn(move || handle.get().is_some())
            })
            .collect();
        for waiter in waiters {
            assert!(!waiter.join().unwrap());
        }
        assert_eq!(handle.status(), HandleStatus::Initializing);

        release_tx.send(()).unwrap();
        assert!(initializing.join().unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(handle.status(), HandleStatus::Ready);
        assert!(handle.get().is_some());
    }

    #[test]
    fn test_disabled_and_ready_handles() {
        assert!(ReasoningHandle::disabled().get().is_none());
        assert_eq!(ReasoningHandle::disabled().status(), HandleStatus::Unavailable);

        let ready = ReasoningHandle::ready(Arc::new(EchoService));
        assert_eq!(ready.get().map(|s| s.name().to_string()), Some("echo".to_string()));
    }

    #[test]
    fn test_from_config_without_key_is_disabled() {
        let handle = ReasoningHandle::from_config(&EngineConfig::default());
        assert!(!handle.is_configured());
        assert!(handle.get().is_none());

        let handle = ReasoningHandle::from_config(
            &EngineConfig::builder().reasoning_api_key("sk-test").build(),
        );
        assert!(handle.is_configured());
        assert_eq!(handle.status(), HandleStatus::Uninitialized);
    }

    #[test]
    fn test_prompt_wording_per_kind() {
        let context = PromptContext::new(
            "summary",
            ValidationLevel::Strict,
            json!({"summary": {"type": "string"}}),
            json!({"summary": "A short text"}),
        );
        let prompt = context.render_prompt();
        assert!(prompt.contains("summary-type AI output with strict strictness"));
        assert!(prompt.contains("A short text"));
        assert!(!prompt.contains("structural validation found"));

        let custom = PromptContext::new("translation", ValidationLevel::Basic, json!({}), json!({}));
        assert!(custom
            .render_prompt()
            .starts_with("Validate this translation AI output with basic strictness."));
    }

    #[test]
    fn test_prompt_includes_structural_errors() {
        let context = PromptContext::new("generic", ValidationLevel::Strict, json!({}), json!({}))
            .with_structural_errors(vec![StructuralError {
                loc: "email".to_string(),
                kind: crate::contracts::ErrorKind::FormatInvalid,
                msg: "bad".to_string(),
                suggestion: None,
            }]);
        assert!(context.render_prompt().contains("structural validation found these errors"));
    }
}
