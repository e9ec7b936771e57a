//! The research oracle: asynchronous access to an external knowledge
//! provider.
//!
//! The oracle is deliberately unreliable-by-contract: a consultation may
//! time out or fail, and the cognitive cycle must never block on it or
//! see its errors. One retry, then the answer degrades to "no new
//! information". Whatever text does come back re-enters the substrate
//! through the ordinary perception path, so external knowledge is
//! grounded exactly like a live percept.

use async_trait::async_trait;
use neuroweave_core::error::{OracleError, Result, WeaveError};
use neuroweave_core::fabric::Fabric;
use neuroweave_core::types::{ActivationEvent, NeuronKind};
use std::time::Duration;
use tokio::time::timeout;

/// Longest queries get truncated to this many grounded tokens, so one
/// verbose answer cannot drain the encoding budget.
const MAX_ABSORBED_TOKENS: usize = 12;

/// An external knowledge source the oracle can consult.
#[async_trait]
pub trait ResearchProvider: Send + Sync {
    async fn research(&self, query: &str) -> Result<String>;
}

/// Tunables for oracle consultations.
#[derive(Debug, Clone)]
pub struct OracleConfig {
    /// Per-attempt deadline (default: 5s).
    pub timeout: Duration,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
        }
    }
}

/// Front door to an external research provider.
pub struct Oracle {
    provider: Box<dyn ResearchProvider>,
    config: OracleConfig,
}

impl Oracle {
    pub fn new(provider: Box<dyn ResearchProvider>, config: OracleConfig) -> Self {
        Self { provider, config }
    }

    /// Consult the provider: one attempt, one retry, then degrade.
    ///
    /// Returns `None` when no answer could be obtained; the failure is
    /// logged and never escalates into the cognitive cycle.
    pub async fn consult(&self, query: &str) -> Option<String> {
        match self.attempt(query).await {
            Ok(answer) => Some(answer),
            Err(first) => {
                tracing::warn!(%query, error = %first, "research attempt failed; retrying");
                match self.attempt(query).await {
                    Ok(answer) => Some(answer),
                    Err(second) => {
                        tracing::warn!(%query, error = %second, "research failed; no new information");
                        None
                    }
                }
            }
        }
    }

    async fn attempt(&self, query: &str) -> Result<String> {
        match timeout(self.config.timeout, self.provider.research(query)).await {
            Ok(result) => result,
            Err(_) => Err(WeaveError::Oracle(OracleError::Timeout)),
        }
    }

    /// Ground a research answer in the fabric through the normal
    /// perception path: tokenize, then encode the tokens as sensory
    /// symbols so they propagate and learn like any percept.
    pub fn absorb(fabric: &mut Fabric, text: &str) -> Result<ActivationEvent> {
        let tokens = tokenize(text);
        let seeds: Vec<(&str, NeuronKind, f64)> = tokens
            .iter()
            .map(|t| (t.as_str(), NeuronKind::Sensory, 1.0))
            .collect();
        fabric.encode(&seeds)
    }

    /// Consult and, if an answer arrives, absorb it. Returns the
    /// resulting activation event, or `None` when research degraded.
    pub async fn research_into(&self, fabric: &mut Fabric, query: &str) -> Result<Option<ActivationEvent>> {
        match self.consult(query).await {
            Some(answer) => Ok(Some(Self::absorb(fabric, &answer)?)),
            None => Ok(None),
        }
    }
}

/// Lowercased alphanumeric tokens, deduplicated in first-seen order.
fn tokenize(text: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    for raw in text.split(|c: char| !c.is_alphanumeric()) {
        if raw.is_empty() {
            continue;
        }
        let token = raw.to_lowercase();
        if !tokens.contains(&token) {
            tokens.push(token);
        }
        if tokens.len() == MAX_ABSORBED_TOKENS {
            break;
        }
    }
    tokens
}
