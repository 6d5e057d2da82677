use serde::Serialize;

use crate::core::BackendTag;
use crate::timing::TimingSample;

/// Outcome of comparing one sample per backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    Faster {
        faster: BackendTag,
        /// `slower_ms / faster_ms`; absent when the faster call measured 0 ms.
        speedup_factor: Option<f64>,
        difference_ms: f64,
    },
    /// Durations within the configured epsilon.
    Indistinguishable { difference_ms: f64 },
    /// At least one side failed, so no comparison is claimed.
    InsufficientData { failed: Vec<BackendTag> },
}

impl Verdict {
    pub fn from_samples(a: &TimingSample, b: &TimingSample, epsilon_ms: f64) -> Self {
        let failed: Vec<BackendTag> = [a, b]
            .iter()
            .filter(|s| !s.succeeded)
            .map(|s| s.backend)
            .collect();
        if !failed.is_empty() {
            return Verdict::InsufficientData { failed };
        }

        let difference_ms = (a.duration_ms - b.duration_ms).abs();
        if difference_ms <= epsilon_ms {
            return Verdict::Indistinguishable { difference_ms };
        }

        let (faster, slower) = if a.duration_ms < b.duration_ms {
            (a, b)
        } else {
            (b, a)
        };
        let speedup_factor =
            (faster.duration_ms > 0.0).then(|| slower.duration_ms / faster.duration_ms);
        Verdict::Faster {
            faster: faster.backend,
            speedup_factor,
            difference_ms,
        }
    }

    pub fn analysis(&self) -> String {
        match self {
            Verdict::Faster {
                faster,
                speedup_factor: Some(speedup),
                ..
            } => format!(
                "{} was {:.2}x faster for this query",
                faster.as_str().to_uppercase(),
                speedup
            ),
            Verdict::Faster {
                faster,
                speedup_factor: None,
                difference_ms,
            } => format!(
                "{} was faster by {:.3} ms",
                faster.as_str().to_uppercase(),
                difference_ms
            ),
            Verdict::Indistinguishable { difference_ms } => format!(
                "Statistically indistinguishable: durations differ by {:.3} ms",
                difference_ms
            ),
            Verdict::InsufficientData { failed } => {
                let names: Vec<String> =
                    failed.iter().map(|t| t.as_str().to_uppercase()).collect();
                format!("Insufficient data: {} did not respond", names.join(" and "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ErrorKind;

    fn ok(backend: BackendTag, duration_ms: f64) -> TimingSample {
        TimingSample {
            backend,
            duration_ms,
            succeeded: true,
            error_kind: None,
        }
    }

    fn failed(backend: BackendTag) -> TimingSample {
        TimingSample {
            backend,
            duration_ms: 5000.0,
            succeeded: false,
            error_kind: Some(ErrorKind::Timeout),
        }
    }

    #[test]
    fn test_faster_backend_and_speedup() {
        let v =
            Verdict::from_samples(&ok(BackendTag::Sql, 20.0), &ok(BackendTag::Nosql, 50.0), 0.01);
        assert_eq!(
            v,
            Verdict::Faster {
                faster: BackendTag::Sql,
                speedup_factor: Some(2.5),
                difference_ms: 30.0,
            }
        );
        assert_eq!(v.analysis(), "SQL was 2.50x faster for this query");
    }

    #[test]
    fn test_within_epsilon_is_indistinguishable() {
        let v = Verdict::from_samples(
            &ok(BackendTag::Sql, 50.0),
            &ok(BackendTag::Nosql, 50.005),
            0.01,
        );
        assert!(matches!(v, Verdict::Indistinguishable { .. }));
    }

    #[test]
    fn test_failed_side_is_insufficient_data() {
        let v = Verdict::from_samples(&ok(BackendTag::Sql, 1.0), &failed(BackendTag::Nosql), 0.01);
        assert_eq!(
            v,
            Verdict::InsufficientData {
                failed: vec![BackendTag::Nosql]
            }
        );
        assert_eq!(v.analysis(), "Insufficient data: NOSQL did not respond");
    }

    #[test]
    fn test_zero_duration_has_no_speedup() {
        let v = Verdict::from_samples(&ok(BackendTag::Sql, 0.0), &ok(BackendTag::Nosql, 3.0), 0.01);
        assert_eq!(
            v,
            Verdict::Faster {
                faster: BackendTag::Sql,
                speedup_factor: None,
                difference_ms: 3.0,
            }
        );
    }

    #[test]
    fn test_serialized_shape() {
        let v =
            Verdict::from_samples(&ok(BackendTag::Sql, 40.0), &ok(BackendTag::Nosql, 10.0), 0.01);
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["verdict"], "faster");
        assert_eq!(json["faster"], "nosql");
        assert_eq!(json["speedup_factor"], 4.0);
        assert_eq!(json["difference_ms"], 30.0);
    }
}
