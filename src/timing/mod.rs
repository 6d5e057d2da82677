//! Wraps a single adapter call with monotonic timing.

mod clock;

use log::{debug, error, warn};
use serde::Serialize;

use crate::backend::Backend;
use crate::core::{BackendTag, ErrorKind, NormalizationError};
use crate::normalize::normalize;
use crate::query::{QueryDescriptor, ResultRow};

pub use clock::{Clock, MonotonicClock};

/// One measured, possibly failed, execution attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimingSample {
    pub backend: BackendTag,
    pub duration_ms: f64,
    pub succeeded: bool,
    pub error_kind: Option<ErrorKind>,
}

/// A sample plus the normalized rows when the call succeeded.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub sample: TimingSample,
    pub rows: Option<Vec<ResultRow>>,
}

/// Executes and normalizes once, timing both. Adapter failures become a
/// failed sample; only a normalization failure is returned as an error.
pub async fn measure(
    backend: &dyn Backend,
    descriptor: &QueryDescriptor,
    clock: &dyn Clock,
) -> Result<Measurement, NormalizationError> {
    let tag = backend.tag();
    let start = clock.now();
    let outcome = match backend.execute(descriptor).await {
        Ok(raw) => Ok(normalize(tag, raw)
            .inspect_err(|e| error!(backend = tag; "normalization failed: {e}"))?),
        Err(err) => Err(err),
    };
    let duration_ms = clock.now().saturating_sub(start).as_secs_f64() * 1000.0;

    let measurement = match outcome {
        Ok(rows) => {
            debug!(backend = tag, duration_ms = duration_ms, rows = rows.len(); "sample succeeded");
            Measurement {
                sample: TimingSample {
                    backend: tag,
                    duration_ms,
                    succeeded: true,
                    error_kind: None,
                },
                rows: Some(rows),
            }
        }
        Err(err) => {
            warn!(backend = tag, duration_ms = duration_ms; "sample failed: {err}");
            Measurement {
                sample: TimingSample {
                    backend: tag,
                    duration_ms,
                    succeeded: false,
                    error_kind: Some(err.kind()),
                },
                rows: None,
            }
        }
    };
    Ok(measurement)
}
