//! Trend inference across health snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::TrendConfig;
use crate::errors::{RepoWardenError, Result};
use crate::health::HealthMetrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Improving,
    Declining,
    Stable,
}

impl TrendDirection {
    pub fn classify(change: i64, sensitivity: i64) -> Self {
        if change > sensitivity {
            TrendDirection::Improving
        } else if change < -sensitivity {
            TrendDirection::Declining
        } else {
            TrendDirection::Stable
        }
    }
}

impl std::fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrendDirection::Improving => f.write_str("improving"),
            TrendDirection::Declining => f.write_str("declining"),
            TrendDirection::Stable => f.write_str("stable"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricTrend {
    pub earliest: f64,
    pub latest: f64,
    /// `latest - earliest`, rounded to the nearest point
    pub change: i64,
    pub direction: TrendDirection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendReport {
    pub generated_at: DateTime<Utc>,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub snapshots_considered: usize,
    pub per_metric: BTreeMap<String, MetricTrend>,
}

impl TrendReport {
    pub fn direction(&self, metric: &str) -> Option<TrendDirection> {
        self.per_metric.get(metric).map(|t| t.direction)
    }
}

pub struct TrendAnalyzer {
    window: usize,
    sensitivity: i64,
}

impl TrendAnalyzer {
    pub fn new(config: &TrendConfig) -> Self {
        Self {
            window: config.window.max(2),
            sensitivity: config.sensitivity,
        }
    }

    /// Trend over the most recent `window` snapshots. `snapshots` must be
    /// ordered oldest first.
    pub fn analyze(&self, snapshots: &[HealthMetrics]) -> Result<TrendReport> {
        if snapshots.len() < 2 {
            return Err(RepoWardenError::insufficient(2, snapshots.len()));
        }
        let window = &snapshots[snapshots.len().saturating_sub(self.window)..];
        let earliest = &window[0];
        let latest = &window[window.len() - 1];
        Ok(self.build(earliest, latest, window.len()))
    }

    /// Before/after comparison of two snapshots. Either side missing is
    /// `InsufficientData`; nothing is guessed.
    pub fn compare(
        &self,
        before: Option<&HealthMetrics>,
        after: Option<&HealthMetrics>,
    ) -> Result<TrendReport> {
        match (before, after) {
            (Some(before), Some(after)) => Ok(self.build(before, after, 2)),
            (before, after) => Err(RepoWardenError::insufficient(
                2,
                usize::from(before.is_some()) + usize::from(after.is_some()),
            )),
        }
    }

    fn build(&self, earliest: &HealthMetrics, latest: &HealthMetrics, considered: usize) -> TrendReport {
        let per_metric = earliest
            .scores()
            .iter()
            .zip(latest.scores().iter())
            .map(|((name, first), (_, last))| {
                let change = (last - first).round() as i64;
                (
                    name.to_string(),
                    MetricTrend {
                        earliest: *first,
                        latest: *last,
                        change,
                        direction: TrendDirection::classify(change, self.sensitivity),
                    },
                )
            })
            .collect();

        TrendReport {
            generated_at: Utc::now(),
            from: earliest.timestamp,
            to: latest.timestamp,
            snapshots_considered: considered,
            per_metric,
        }
    }
}
