//! repowarden: repository redundancy and health analysis.
//!
//! Units (top-level functions and documentation sections) are extracted per
//! language class and compared pairwise; redundant pairs feed a weighted
//! health snapshot, trends across snapshots, tiered alerts and an optional
//! backed-up cleanup pass. The [`workflow`] module chains these into one
//! recorded run.

pub mod alerts;
pub mod cleanup;
pub mod cli;
pub mod commands;
pub mod config;
pub mod core;
pub mod engine;
pub mod errors;
pub mod extraction;
pub mod health;
pub mod io;
pub mod redundancy;
pub mod similarity;
pub mod trends;
pub mod workflow;

pub use crate::alerts::{Alert, AlertGenerator, AlertSet, AlertType, Severity};
pub use crate::cleanup::{CleanupMode, CleanupOrchestrator, CleanupPlan};
pub use crate::config::{load_config, RepoWardenConfig};
pub use crate::core::{ComparableUnit, Language, UnitKind};
pub use crate::engine::Engine;
pub use crate::errors::{RepoWardenError, Result};
pub use crate::extraction::UnitExtractor;
pub use crate::health::{HealthMetrics, HealthScorer};
pub use crate::redundancy::{AnalysisReport, RedundancyDetector, RedundancyReport};
pub use crate::similarity::{ComparisonProfile, SimilarityResult, SimilarityScorer};
pub use crate::trends::{TrendAnalyzer, TrendDirection, TrendReport};
pub use crate::workflow::{WorkflowCoordinator, WorkflowMode, WorkflowRun};
