use crate::error::{FusionError, Result};
use log::warn;
use serde::{Deserialize, Serialize};

const SUM_TOLERANCE: f32 = 1e-3;

/// Per-expert trust weights; index `i` belongs to expert `i`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f32>", into = "Vec<f32>")]
pub struct GateWeights(Vec<f32>);

impl GateWeights {
    /// Wrap raw weights, rejecting negative or non-finite entries.
    ///
    /// The sum is not enforced; a sum away from 1 is only logged.
    pub fn new(weights: Vec<f32>) -> Result<Self> {
        if let Some((index, &value)) = weights
            .iter()
            .enumerate()
            .find(|(_, w)| !w.is_finite() || **w < 0.0)
        {
            return Err(FusionError::MalformedGateWeights { index, value });
        }
        let sum: f32 = weights.iter().sum();
        if !weights.is_empty() && (sum - 1.0).abs() > SUM_TOLERANCE {
            warn!("GateWeights::new weights sum to {sum:.4}, expected 1");
        }
        Ok(Self(weights))
    }

    /// Equal weight for each of `n` experts.
    pub fn uniform(n: usize) -> Self {
        let w = if n == 0 { 0.0 } else { 1.0 / n as f32 };
        Self(vec![w; n])
    }

    /// Numerically stable softmax over raw gating logits.
    pub fn from_logits(logits: &[f32]) -> Result<Self> {
        if let Some((index, &value)) = logits.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(FusionError::MalformedGateWeights { index, value });
        }
        if logits.is_empty() {
            return Ok(Self(Vec::new()));
        }
        let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let exps: Vec<f32> = logits.iter().map(|&v| (v - max).exp()).collect();
        let sum: f32 = exps.iter().sum();
        Ok(Self(exps.into_iter().map(|e| e / sum).collect()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, expert: usize) -> Option<f32> {
        self.0.get(expert).copied()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    /// Fail with a configuration error unless there is one weight per expert.
    pub fn ensure_len(&self, experts: usize) -> Result<()> {
        if self.0.len() != experts {
            return Err(FusionError::config(format!(
                "gating produced {} weights for {} experts",
                self.0.len(),
                experts
            )));
        }
        Ok(())
    }
}

impl TryFrom<Vec<f32>> for GateWeights {
    type Error = FusionError;

    fn try_from(weights: Vec<f32>) -> Result<Self> {
        Self::new(weights)
    }
}

impl From<GateWeights> for Vec<f32> {
    fn from(weights: GateWeights) -> Self {
        weights.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_negative_and_nan_weights() {
        assert_eq!(
            GateWeights::new(vec![0.5, -0.1, 0.6]),
            Err(FusionError::MalformedGateWeights {
                index: 1,
                value: -0.1
            })
        );
        assert!(GateWeights::new(vec![f32::NAN]).is_err());
    }

    #[test]
    fn softmax_is_normalized_and_order_preserving() {
        let w = GateWeights::from_logits(&[2.0, 0.5, 1000.0, -3.0]).expect("finite logits");
        let sum: f32 = w.as_slice().iter().sum();
        assert!((sum - 1.0).abs() < 1e-5, "sum={sum}");
        assert!(w.as_slice().iter().all(|v| v.is_finite() && *v >= 0.0));
        assert!(w.get(2).unwrap() > 0.99);
        assert!(w.get(0).unwrap() >= w.get(1).unwrap());
    }

    #[test]
    fn ensure_len_reports_mismatch() {
        let w = GateWeights::uniform(3);
        assert!(w.ensure_len(3).is_ok());
        assert!(matches!(
            w.ensure_len(2),
            Err(FusionError::Configuration(_))
        ));
    }

    #[test]
    fn deserialization_goes_through_validation() {
        let ok: GateWeights = serde_json::from_str("[0.8, 0.2]").expect("valid weights");
        assert_eq!(ok.as_slice(), &[0.8, 0.2]);
        assert!(serde_json::from_str::<GateWeights>("[0.8, -0.2]").is_err());
    }
}
