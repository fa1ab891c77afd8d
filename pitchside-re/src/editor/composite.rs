//! Composite rating policy
//!
//! The composite is a ranking scalar derived from the two effective ratings.
//! The weighting is pluggable; the only fixed rules are that it is a pure,
//! deterministic function and that it is undefined whenever either input is.

use crate::error::{Error, Result};
use pitchside_common::config::CompositeWeights;

/// Pure function combining skill and physical ratings into one scalar
pub trait CompositePolicy: Send + Sync {
    fn composite(&self, skill: u8, physical: u8) -> f64;
}

/// Weighted arithmetic mean of the two ratings
///
/// Both weights are positive and finite, so the result is always a real number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedMean {
    skill_weight: f64,
    physical_weight: f64,
}

impl WeightedMean {
    pub fn new(skill_weight: f64, physical_weight: f64) -> Result<Self> {
        for (name, weight) in [("skill", skill_weight), ("physical", physical_weight)] {
            if !(weight.is_finite() && weight > 0.0) {
                return Err(Error::Validation(format!(
                    "{} weight must be positive and finite, got {}",
                    name, weight
                )));
            }
        }
        Ok(Self {
            skill_weight,
            physical_weight,
        })
    }

    pub fn skill_weight(&self) -> f64 {
        self.skill_weight
    }

    pub fn physical_weight(&self) -> f64 {
        self.physical_weight
    }
}

impl Default for WeightedMean {
    fn default() -> Self {
        Self {
            skill_weight: 1.0,
            physical_weight: 1.0,
        }
    }
}

impl TryFrom<CompositeWeights> for WeightedMean {
    type Error = Error;

    fn try_from(weights: CompositeWeights) -> Result<Self> {
        Self::new(weights.skill, weights.physical)
    }
}

impl CompositePolicy for WeightedMean {
    fn composite(&self, skill: u8, physical: u8) -> f64 {
        let total = self.skill_weight + self.physical_weight;
        (f64::from(skill) * self.skill_weight + f64::from(physical) * self.physical_weight) / total
    }
}

/// Composite of two possibly-missing ratings
///
/// `None` unless both ratings are present.
pub fn resolve_composite(
    policy: &dyn CompositePolicy,
    skill: Option<u8>,
    physical: Option<u8>,
) -> Option<f64> {
    match (skill, physical) {
        (Some(skill), Some(physical)) => Some(policy.composite(skill, physical)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_weights_is_plain_mean() {
        let policy = WeightedMean::default();
        assert_eq!(policy.composite(5, 3), 4.0);
        assert_eq!(policy.composite(4, 1), 2.5);
    }

    #[test]
    fn test_weights_shift_the_mean() {
        let policy = WeightedMean::new(3.0, 1.0).unwrap();
        assert_eq!(policy.composite(5, 1), 4.0);
    }

    #[test]
    fn test_missing_input_propagates() {
        let policy = WeightedMean::default();
        assert_eq!(resolve_composite(&policy, Some(4), None), None);
        assert_eq!(resolve_composite(&policy, None, Some(4)), None);
        assert_eq!(resolve_composite(&policy, None, None), None);
        assert_eq!(resolve_composite(&policy, Some(4), Some(2)), Some(3.0));
    }

    #[test]
    fn test_deterministic() {
        let policy = WeightedMean::new(0.7, 0.3).unwrap();
        let first = resolve_composite(&policy, Some(3), Some(5));
        let second = resolve_composite(&policy, Some(3), Some(5));
        assert_eq!(first, second);
    }

    #[test]
    fn test_degenerate_weights_rejected() {
        for (skill, physical) in [(0.0, 0.0), (-1.0, 1.0), (1.0, f64::NAN), (f64::INFINITY, 1.0)] {
            let err = WeightedMean::new(skill, physical).unwrap_err();
            assert!(matches!(err, Error::Validation(_)));
        }
    }

    #[test]
    fn test_from_config_weights() {
        let policy = WeightedMean::try_from(CompositeWeights {
            skill: 2.0,
            physical: 1.0,
        })
        .unwrap();
        assert_eq!(policy.skill_weight(), 2.0);
        assert_eq!(policy.composite(4, 1), 3.0);

        let zero = CompositeWeights {
            skill: 0.0,
            physical: 0.0,
        };
        assert!(WeightedMean::try_from(zero).is_err());
    }
}
