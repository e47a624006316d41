#![forbid(unsafe_code)]

use serde_json::Value;

use mentor_kernel_contracts::progression::{
    SignalBundle, SignalKind, TransitionWarning, SIGNAL_COUNT,
};

/// Default substituted for a missing or malformed payload field.
pub const NEUTRAL_SCORE: f64 = 0.5;

/// Per-signal scores in `SignalKind` order, plus the fallbacks taken while
/// producing them. Fallbacks degrade; they never abort a cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSignals {
    pub scores: [f64; SIGNAL_COUNT],
    pub fallbacks: Vec<TransitionWarning>,
}

/// Score all four payloads. Pure and deterministic: no I/O, no randomness,
/// output always within [0, 1] per signal.
pub fn normalize_bundle(bundle: &SignalBundle) -> NormalizedSignals {
    let mut scores = [NEUTRAL_SCORE; SIGNAL_COUNT];
    let mut fallbacks = Vec::new();
    for kind in SignalKind::ORDERED {
        scores[kind.index()] = normalize_signal(kind, bundle.payload(kind), &mut fallbacks);
    }
    NormalizedSignals { scores, fallbacks }
}

fn normalize_signal(
    kind: SignalKind,
    payload: Option<&Value>,
    fallbacks: &mut Vec<TransitionWarning>,
) -> f64 {
    let Some(payload) = payload else {
        fallbacks.push(TransitionWarning::NormalizationFallback {
            signal: kind,
            field: None,
        });
        return NEUTRAL_SCORE;
    };

    let score = match kind {
        SignalKind::Motivation => {
            0.6 * field_score(kind, payload, "readiness", fallbacks)
                + 0.4 * field_score(kind, payload, "preference", fallbacks)
        }
        SignalKind::Performance => {
            0.7 * field_score(kind, payload, "accuracy", fallbacks)
                + 0.3 * field_score(kind, payload, "retention", fallbacks)
        }
        SignalKind::Engagement => {
            let attention = field_score(kind, payload, "attention_level", fallbacks);
            let interaction = field_score(kind, payload, "interaction_rate", fallbacks);
            (attention + interaction) / 2.0
        }
        SignalKind::Curriculum => {
            0.5 * field_score(kind, payload, "completion_ratio", fallbacks)
                + 0.5 * field_score(kind, payload, "prerequisite_satisfaction", fallbacks)
        }
    };

    score.clamp(0.0, 1.0)
}

/// Read one named sub-field as a finite number clamped to [0, 1]. Anything
/// else (absent field, wrong type, non-finite, non-object payload) takes the
/// neutral default and records a fallback.
fn field_score(
    kind: SignalKind,
    payload: &Value,
    field: &'static str,
    fallbacks: &mut Vec<TransitionWarning>,
) -> f64 {
    match payload.get(field).and_then(Value::as_f64) {
        Some(raw) if raw.is_finite() => raw.clamp(0.0, 1.0),
        _ => {
            fallbacks.push(TransitionWarning::NormalizationFallback {
                signal: kind,
                field: Some(field),
            });
            NEUTRAL_SCORE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_bundle(value: f64) -> SignalBundle {
        SignalBundle::v1(
            Some(json!({ "readiness": value, "preference": value })),
            Some(json!({ "accuracy": value, "retention": value })),
            Some(json!({ "attention_level": value, "interaction_rate": value })),
            Some(json!({
                "completion_ratio": value,
                "prerequisite_satisfaction": value
            })),
        )
    }

    #[test]
    fn at_norm_01_uniform_fields_pass_through() {
        let normalized = normalize_bundle(&full_bundle(0.2));
        for score in normalized.scores {
            assert!((score - 0.2).abs() < 1e-12);
        }
        assert!(normalized.fallbacks.is_empty());
    }

    #[test]
    fn at_norm_02_missing_payloads_default_neutral() {
        let normalized = normalize_bundle(&SignalBundle::empty());
        assert_eq!(normalized.scores, [NEUTRAL_SCORE; SIGNAL_COUNT]);
        assert_eq!(normalized.fallbacks.len(), SIGNAL_COUNT);
        assert!(normalized.fallbacks.iter().all(|w| matches!(
            w,
            TransitionWarning::NormalizationFallback { field: None, .. }
        )));
    }

    #[test]
    fn at_norm_03_motivation_weighting() {
        let bundle = SignalBundle::v1(
            Some(json!({ "readiness": 1.0, "preference": 0.0 })),
            None,
            None,
            None,
        );
        let normalized = normalize_bundle(&bundle);
        assert!((normalized.scores[SignalKind::Motivation.index()] - 0.6).abs() < 1e-12);
    }

    #[test]
    fn at_norm_04_malformed_field_falls_back_per_field() {
        let bundle = SignalBundle::v1(
            Some(json!({ "readiness": "high", "preference": 0.8 })),
            None,
            None,
            None,
        );
        let normalized = normalize_bundle(&bundle);
        // 0.6 * default 0.5 + 0.4 * 0.8
        assert!((normalized.scores[SignalKind::Motivation.index()] - 0.62).abs() < 1e-12);
        assert!(normalized.fallbacks.contains(
            &TransitionWarning::NormalizationFallback {
                signal: SignalKind::Motivation,
                field: Some("readiness"),
            }
        ));
    }

    #[test]
    fn at_norm_05_out_of_range_fields_clamp() {
        let bundle = SignalBundle::v1(
            None,
            Some(json!({ "accuracy": 7.0, "retention": -3.0 })),
            None,
            None,
        );
        let normalized = normalize_bundle(&bundle);
        // 0.7 * 1.0 + 0.3 * 0.0
        assert!((normalized.scores[SignalKind::Performance.index()] - 0.7).abs() < 1e-12);
    }

    #[test]
    fn at_norm_06_non_object_payload_defaults_every_field() {
        let bundle = SignalBundle::v1(None, None, Some(json!("busy")), None);
        let normalized = normalize_bundle(&bundle);
        assert!(
            (normalized.scores[SignalKind::Engagement.index()] - NEUTRAL_SCORE).abs() < 1e-12
        );
        let engagement_fallbacks = normalized
            .fallbacks
            .iter()
            .filter(|w| matches!(
                w,
                TransitionWarning::NormalizationFallback {
                    signal: SignalKind::Engagement,
                    field: Some(_),
                }
            ))
            .count();
        assert_eq!(engagement_fallbacks, 2);
    }

    #[test]
    fn at_norm_07_scores_always_unit_bounded() {
        let normalized = normalize_bundle(&full_bundle(123.0));
        for score in normalized.scores {
            assert!((0.0..=1.0).contains(&score));
        }
    }
}
