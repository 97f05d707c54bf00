//! Per-descriptor region failover as an explicit state machine.
//!
//! Regions are tried strictly in order. A fatal error ends the run at once,
//! a transient error is recorded and the next region is tried, and the first
//! success wins.

use crate::errors::{FetchError, StoreError};
use crate::store::RegionClient;
use std::future::Future;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailoverState<T> {
    NotTried,
    Trying { region: String, errors: Vec<String> },
    Succeeded { region: String, value: T },
    FailedFatal { region: String, error: StoreError },
    FailedAllRegions { errors: Vec<String> },
}

impl<T> FailoverState<T> {
    /// Start an attempt against `region`. Terminal states are left alone.
    pub fn begin(self, region: &str) -> Self {
        match self {
            Self::NotTried => Self::Trying {
                region: region.to_string(),
                errors: Vec::new(),
            },
            Self::Trying { errors, .. } => Self::Trying {
                region: region.to_string(),
                errors,
            },
            terminal => terminal,
        }
    }

    /// Apply the outcome of the attempt in progress.
    pub fn record(self, outcome: Result<T, StoreError>) -> Self {
        let (region, mut errors) = match self {
            Self::Trying { region, errors } => (region, errors),
            other => return other,
        };
        match outcome {
            Ok(value) => Self::Succeeded { region, value },
            Err(error) if error.is_fatal() => Self::FailedFatal { region, error },
            Err(error) => {
                errors.push(format!("{region}: {error}"));
                Self::Trying { region, errors }
            }
        }
    }

    /// No region is left to try.
    pub fn exhaust(self) -> Self {
        match self {
            Self::NotTried => Self::FailedAllRegions { errors: Vec::new() },
            Self::Trying { errors, .. } => Self::FailedAllRegions { errors },
            terminal => terminal,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Succeeded { .. } | Self::FailedFatal { .. } | Self::FailedAllRegions { .. }
        )
    }

    /// Collapse a terminal state into the region that answered and its value.
    pub fn finish(self, subject: &str) -> Result<(String, T), FetchError> {
        match self.exhaust() {
            Self::Succeeded { region, value } => Ok((region, value)),
            Self::FailedFatal { region, error } => Err(FetchError::Fatal { region, error }),
            Self::FailedAllRegions { errors } => Err(FetchError::AllRegionsFailed {
                subject: subject.to_string(),
                errors,
            }),
            Self::NotTried | Self::Trying { .. } => Err(FetchError::AllRegionsFailed {
                subject: subject.to_string(),
                errors: Vec::new(),
            }),
        }
    }
}

/// Run `attempt` against each client in order until the state machine
/// reaches a terminal state.
pub async fn run<'a, A, T, F, Fut>(
    clients: &'a [RegionClient<A>],
    subject: &str,
    mut attempt: F,
) -> Result<(String, T), FetchError>
where
    A: ?Sized,
    F: FnMut(&'a RegionClient<A>) -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    let mut state = FailoverState::NotTried;
    for client in clients {
        state = state.begin(&client.region);
        let outcome = attempt(client).await;
        if let Err(err) = &outcome {
            if !err.is_fatal() {
                warn!(region = %client.region, object = %subject, error = %err, "region failed, trying next");
            }
        }
        state = state.record(outcome);
        if state.is_terminal() {
            break;
        }
    }
    if let FailoverState::Succeeded { region, .. } = &state {
        debug!(region = %region, object = %subject, "fetched");
    }
    state.finish(subject)
}
