/* ==================================================================================================
 *                           This file is part of the bachelor thesis project
 *                  Implementation and Analysis of Selected Noise Reduction Methods
 *                           Evaluation and Ranking of Candidate Outputs
 *                                  University of Wrocław, June 2025
 * ================================================================================================== */
use crate::error::{EvalError, Result};
use crate::metrics::{MetricVector, EPSILON};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;

/// Allowed deviation of the weight sum from 1.0
const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Weights of the metrics that contribute to the ranking score.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Weights {
    pub snr_db: f64,
    pub pesq_proxy: f64,
    pub stoi_proxy: f64,
    pub mse: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Weights { snr_db: 0.30, pesq_proxy: 0.30, stoi_proxy: 0.25, mse: 0.15 }
    }
}

impl Weights {
    /// Build weights from a name -> value map. Every metric must be present exactly once.
    pub fn from_map(map: &HashMap<String, f64>) -> Result<Self> {
        let known = |k: &String| matches!(k.as_str(), "snr_db" | "pesq_proxy" | "stoi_proxy" | "mse");
        if let Some(unknown) = map.keys().find(|k| !known(*k)) {
            return Err(EvalError::Config(format!("unknown weight '{}'", unknown)));
        }
        let get = |name: &str| {
            map.get(name).copied().ok_or_else(|| EvalError::Config(format!("missing weight '{}'", name)))
        };
        let weights = Weights {
            snr_db: get("snr_db")?,
            pesq_proxy: get("pesq_proxy")?,
            stoi_proxy: get("stoi_proxy")?,
            mse: get("mse")?,
        };
        weights.validate()?;
        Ok(weights)
    }

    /// Check that every weight is a finite non-negative number and that they sum to 1.0.
    pub fn validate(&self) -> Result<()> {
        let all = [
            ("snr_db", self.snr_db),
            ("pesq_proxy", self.pesq_proxy),
            ("stoi_proxy", self.stoi_proxy),
            ("mse", self.mse),
        ];
        for (name, w) in all {
            if !w.is_finite() || w < 0.0 {
                return Err(EvalError::Config(format!("weight '{}' must be a non-negative number, got {}", name, w)));
            }
        }
        let sum: f64 = all.iter().map(|(_, w)| w).sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(EvalError::Config(format!("weights must sum to 1.0, got {}", sum)));
        }
        Ok(())
    }
}

/// Candidate metric vectors in insertion order, keyed by unique method names.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CandidateTable {
    entries: Vec<(String, MetricVector)>,
}

impl CandidateTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a candidate. Names must be unique and every metric finite.
    pub fn insert(&mut self, name: impl Into<String>, metrics: MetricVector) -> Result<()> {
        let name = name.into();
        if self.get(&name).is_some() {
            return Err(EvalError::Config(format!("duplicate candidate '{}'", name)));
        }
        let values = [metrics.snr_db, metrics.mse, metrics.correlation, metrics.pesq_proxy, metrics.stoi_proxy];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(EvalError::Config(format!("candidate '{}' has a non-finite metric: {:?}", name, metrics)));
        }
        self.entries.push((name, metrics));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&MetricVector> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, m)| m)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetricVector)> {
        self.entries.iter().map(|(n, m)| (n.as_str(), m))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Serialized as a JSON object in insertion order.
impl Serialize for CandidateTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (name, metrics) in self.iter() {
            map.serialize_entry(name, metrics)?;
        }
        map.end()
    }
}

/// Metric vectors min-max rescaled to [0, 1] across one run; MSE is flipped so that higher is better.
pub type NormalizedTable = CandidateTable;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RankedCandidate {
    pub name: String,
    pub score: f64,
}

/// Candidates sorted by weighted score, best first.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RankingResult {
    ranking: Vec<RankedCandidate>,
    normalized: NormalizedTable,
    weights: Weights,
}

impl RankingResult {
    pub fn ranking(&self) -> &[RankedCandidate] {
        &self.ranking
    }

    pub fn normalized(&self) -> &NormalizedTable {
        &self.normalized
    }

    pub fn weights(&self) -> &Weights {
        &self.weights
    }

    /// Best candidate. Only `rank` builds a result, and it refuses an empty table.
    pub fn winner(&self) -> &RankedCandidate {
        &self.ranking[0]
    }
}

/// Min-max normalize one metric column: (v - min) / (max - min + EPSILON).
fn normalize_column(values: &[f64]) -> Vec<f64> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    values.iter().map(|v| (v - min) / (max - min + EPSILON)).collect()
}

fn column<F: Fn(&MetricVector) -> f64>(table: &CandidateTable, metric: F) -> Vec<f64> {
    let values: Vec<f64> = table.iter().map(|(_, m)| metric(m)).collect();
    normalize_column(&values)
}

/// Rescale every metric column of the table independently.
pub fn normalize_table(table: &CandidateTable) -> NormalizedTable {
    let snr = column(table, |m| m.snr_db);
    let mse = column(table, |m| m.mse);
    let corr = column(table, |m| m.correlation);
    let pesq = column(table, |m| m.pesq_proxy);
    let stoi = column(table, |m| m.stoi_proxy);

    let entries = table
        .iter()
        .enumerate()
        .map(|(i, (name, _))| {
            let normalized = MetricVector {
                snr_db: snr[i],
                mse: 1.0 - mse[i],
                correlation: corr[i],
                pesq_proxy: pesq[i],
                stoi_proxy: stoi[i],
            };
            (name.to_string(), normalized)
        })
        .collect();
    NormalizedTable { entries }
}

/// Weighted score of a normalized metric vector
fn score(normalized: &MetricVector, weights: &Weights) -> f64 {
    weights.snr_db * normalized.snr_db
        + weights.pesq_proxy * normalized.pesq_proxy
        + weights.stoi_proxy * normalized.stoi_proxy
        + weights.mse * normalized.mse
}

/// Rank candidates by a weighted sum of their min-max normalized metrics.
///
/// 1. Validate weights
/// 2. Normalize each metric column across candidates (MSE inverted)
/// 3. Score = sum of weight * normalized metric
/// 4. Stable sort by score, descending, so ties keep insertion order
///
/// # Arguments
/// * `table`   - Metric vectors of all candidates in this run.
/// * `weights` - Metric weights, must sum to 1.0.
///
/// # Returns
/// The ranking with its winner first, or `Config` / `EmptyInput` errors.
pub fn rank(table: &CandidateTable, weights: &Weights) -> Result<RankingResult> {
    weights.validate()?;
    if table.is_empty() {
        return Err(EvalError::EmptyInput("no candidates to rank".into()));
    }

    let normalized = normalize_table(table);
    let mut ranking: Vec<RankedCandidate> = normalized
        .iter()
        .map(|(name, n)| RankedCandidate { name: name.to_string(), score: score(n, weights) })
        .collect();
    ranking.sort_by(|a, b| b.score.total_cmp(&a.score));

    for (place, c) in ranking.iter().enumerate() {
        log::debug!("#{} {} score={:.4}", place + 1, c.name, c.score);
    }

    Ok(RankingResult { ranking, normalized, weights: *weights })
}
