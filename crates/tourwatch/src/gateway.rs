//! The boundary to the remote tourist registry.
//!
//! There is no real registry: [`SimulatedGateway`] only waits for the
//! configured latency before reporting success. Code that needs a
//! deterministic or failing registry supplies its own [`Gateway`].

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::actions::OperatorAction;
use crate::config::LatencyConfig;

/// Errors raised while carrying out an operator action.
#[derive(Debug, Error)]
pub enum ActionError {
    /// The registry refused or failed the request.
    #[error("{action} rejected: {message}")]
    Rejected {
        /// The action that was attempted.
        action: OperatorAction,
        /// Why it failed.
        message: String,
    },

    /// A generated report could not be written.
    #[error("failed to write report to {path}: {source}")]
    ReportWrite {
        /// Where the report was going.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Report serialization failed.
    #[error("failed to encode report: {0}")]
    ReportEncode(#[from] serde_json::Error),
}

impl ActionError {
    /// Create a rejection error.
    #[must_use]
    pub fn rejected(action: OperatorAction, message: impl Into<String>) -> Self {
        Self::Rejected {
            action,
            message: message.into(),
        }
    }
}

/// Remote operations behind the dashboard.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Resolve a scanned payload. Completion means the profile is ready.
    async fn lookup(&self, payload: &str);

    /// Submit an operator action for the given tourist.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError`] if the registry does not accept the action.
    async fn submit(&self, action: OperatorAction, tourist_id: &str) -> Result<(), ActionError>;
}

/// A gateway that only simulates network latency.
#[derive(Debug, Clone, Default)]
pub struct SimulatedGateway {
    latency: LatencyConfig,
}

impl SimulatedGateway {
    /// Create a gateway with the given latencies.
    #[must_use]
    pub fn new(latency: LatencyConfig) -> Self {
        Self { latency }
    }

    /// A gateway that completes everything immediately.
    #[must_use]
    pub fn instant() -> Self {
        Self::new(LatencyConfig::zero())
    }

    async fn wait(delay: Duration) {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl Gateway for SimulatedGateway {
    async fn lookup(&self, payload: &str) {
        debug!(payload_len = payload.len(), "resolving scan");
        Self::wait(self.latency.lookup()).await;
    }

    async fn submit(&self, action: OperatorAction, tourist_id: &str) -> Result<(), ActionError> {
        debug!(%action, tourist_id, "submitting action");
        Self::wait(self.latency.for_action(action)).await;
        Ok(())
    }
}
