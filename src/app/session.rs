use crate::app::report;
use crate::config::toml_config::WebhookConfig;
use crate::core::validator::DeckValidator;
use crate::domain::model::{DeckSubmission, PairValidation};
use crate::domain::ports::{CardCatalog, ReportSink, Storage};
use crate::utils::error::{Result, ValidatorError};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

/// 快取最後一次成功驗證結果的檔名
pub const CACHE_KEY: &str = "validated_decks.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Validating,
    Valid(PairValidation),
    Invalid(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Another validation was already running; nothing was done.
    Busy,
    Passed(PairValidation),
    Rejected(PairValidation),
    /// Orchestration failure such as a cache write error.
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Busy,
    Sent,
}

/// Clears the in-flight flag when dropped.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Validate/send workflow with a cached last-good result.
pub struct ValidationSession<C: CardCatalog, S: Storage, R: ReportSink> {
    validator: DeckValidator<C>,
    storage: S,
    sink: Option<R>,
    webhook: WebhookConfig,
    state: Mutex<SessionState>,
    validating: AtomicBool,
    sending: AtomicBool,
}

impl<C: CardCatalog, S: Storage, R: ReportSink> ValidationSession<C, S, R> {
    pub fn new(validator: DeckValidator<C>, storage: S, sink: Option<R>, webhook: WebhookConfig) -> Self {
        Self {
            validator,
            storage,
            sink,
            webhook,
            state: Mutex::new(SessionState::Idle),
            validating: AtomicBool::new(false),
            sending: AtomicBool::new(false),
        }
    }

    pub async fn state(&self) -> SessionState {
        self.state.lock().await.clone()
    }

    pub async fn can_send(&self) -> bool {
        self.sink.is_some() && matches!(*self.state.lock().await, SessionState::Valid(_))
    }

    pub async fn validate(&self, player1: &DeckSubmission, player2: &DeckSubmission) -> RunOutcome {
        let Some(_guard) = InFlight::acquire(&self.validating) else {
            tracing::warn!("Validation already in progress, ignoring request");
            return RunOutcome::Busy;
        };

        *self.state.lock().await = SessionState::Validating;
        let pair = self.validator.validate_pair(player1, player2).await;

        if !pair.is_valid() {
            let lines = report::error_lines(&pair);
            tracing::info!("Validation rejected with {} error block(s)", lines.len());
            *self.state.lock().await = SessionState::Invalid(lines);
            if let Err(e) = self.storage.remove_file(CACHE_KEY).await {
                tracing::warn!("Failed to clear cached result: {}", e);
            }
            return RunOutcome::Rejected(pair);
        }

        match self.store(&pair).await {
            Ok(()) => {
                tracing::info!("Validation passed, result cached");
                *self.state.lock().await = SessionState::Valid(pair.clone());
                RunOutcome::Passed(pair)
            }
            Err(e) => {
                tracing::error!("Failed to cache validation result: {}", e);
                let message = e.to_string();
                *self.state.lock().await = SessionState::Invalid(vec![message.clone()]);
                if let Err(e) = self.storage.remove_file(CACHE_KEY).await {
                    tracing::warn!("Failed to clear cached result: {}", e);
                }
                RunOutcome::Failed(message)
            }
        }
    }

    async fn store(&self, pair: &PairValidation) -> Result<()> {
        let data = serde_json::to_vec_pretty(pair)?;
        self.storage.write_file(CACHE_KEY, &data).await
    }

    /// Drops any cached result; an in-flight run is left to finish.
    pub async fn inputs_changed(&self) -> Result<()> {
        {
            let mut state = self.state.lock().await;
            if matches!(*state, SessionState::Valid(_) | SessionState::Invalid(_)) {
                *state = SessionState::Idle;
            }
        }
        self.storage.remove_file(CACHE_KEY).await?;
        tracing::debug!("Inputs changed, cached result cleared");
        Ok(())
    }

    /// Loads a cached result left by an earlier run.
    pub async fn restore(&self) -> Result<Option<PairValidation>> {
        let Some(data) = self.storage.read_file(CACHE_KEY).await? else {
            return Ok(None);
        };

        let pair: PairValidation = match serde_json::from_slice(&data) {
            Ok(pair) => pair,
            Err(e) => {
                tracing::warn!("Discarding unreadable cached result: {}", e);
                self.storage.remove_file(CACHE_KEY).await?;
                return Ok(None);
            }
        };

        if !pair.is_valid() {
            self.storage.remove_file(CACHE_KEY).await?;
            return Ok(None);
        }

        *self.state.lock().await = SessionState::Valid(pair.clone());
        Ok(Some(pair))
    }

    pub async fn send_report(&self) -> Result<SendOutcome> {
        let Some(_guard) = InFlight::acquire(&self.sending) else {
            tracing::warn!("Report already being sent, ignoring request");
            return Ok(SendOutcome::Busy);
        };

        let sink = self.sink.as_ref().ok_or_else(|| ValidatorError::MissingConfigError {
            field: "webhook.url".to_string(),
        })?;

        let cached = match &*self.state.lock().await {
            SessionState::Valid(pair) => Some(pair.clone()),
            _ => None,
        };
        let pair = match cached {
            Some(pair) => pair,
            None => self.restore().await?.ok_or_else(|| ValidatorError::NotValidated {
                reason: "no successful validation is cached".to_string(),
            })?,
        };

        let payload = report::build_payload(&pair, &self.webhook);
        sink.publish(&payload).await?;
        tracing::info!("Report sent to thread '{}'", payload.thread_name);
        Ok(SendOutcome::Sent)
    }
}
