//! Risk bucketing of no-show probabilities

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lower bound (inclusive) of the medium bucket
pub const MEDIUM_RISK_FROM: f64 = 0.3;

/// Lower bound (inclusive) of the high bucket
pub const HIGH_RISK_FROM: f64 = 0.7;

/// Discrete triage category
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskCategory {
    Low,
    Medium,
    High,
}

impl RiskCategory {
    /// `[0, 0.3)` low, `[0.3, 0.7)` medium, `[0.7, 1]` high.
    pub fn from_probability(probability: f64) -> Self {
        if probability < MEDIUM_RISK_FROM {
            RiskCategory::Low
        } else if probability < HIGH_RISK_FROM {
            RiskCategory::Medium
        } else {
            RiskCategory::High
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskCategory::Low => "low",
            RiskCategory::Medium => "medium",
            RiskCategory::High => "high",
        }
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Score for one pending appointment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub appointment_id: u64,
    /// Probability the attendee will not show up, in `[0, 1]`
    pub probability: f64,
    pub category: RiskCategory,
}

impl PredictionResult {
    pub fn new(appointment_id: u64, probability: f64) -> Self {
        Self {
            appointment_id,
            probability,
            category: RiskCategory::from_probability(probability),
        }
    }
}

/// Per-category counts over a prediction run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskSummary {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
}

impl RiskSummary {
    pub fn from_results(results: &[PredictionResult]) -> Self {
        results.iter().fold(Self::default(), |mut summary, r| {
            match r.category {
                RiskCategory::Low => summary.low += 1,
                RiskCategory::Medium => summary.medium += 1,
                RiskCategory::High => summary.high += 1,
            }
            summary
        })
    }

    pub fn total(&self) -> usize {
        self.low + self.medium + self.high
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_boundaries() {
        assert_eq!(RiskCategory::from_probability(0.0), RiskCategory::Low);
        assert_eq!(RiskCategory::from_probability(0.2999), RiskCategory::Low);
        assert_eq!(RiskCategory::from_probability(0.3), RiskCategory::Medium);
        assert_eq!(RiskCategory::from_probability(0.6999), RiskCategory::Medium);
        assert_eq!(RiskCategory::from_probability(0.7), RiskCategory::High);
        assert_eq!(RiskCategory::from_probability(1.0), RiskCategory::High);
    }

    #[test]
    fn test_category_serializes_lowercase() {
        let result = PredictionResult::new(12, 0.75);
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains(r#""category":"high""#));
        assert_eq!(RiskCategory::Medium.to_string(), "medium");
    }

    #[test]
    fn test_summary_counts() {
        let results = vec![
            PredictionResult::new(1, 0.1),
            PredictionResult::new(2, 0.5),
            PredictionResult::new(3, 0.9),
            PredictionResult::new(4, 0.95),
        ];
        let summary = RiskSummary::from_results(&results);
        assert_eq!(summary, RiskSummary { low: 1, medium: 1, high: 2 });
        assert_eq!(summary.total(), 4);
    }
}
