//! Enneagram Core - Scoring and team aggregation engine for nine-type assessments
//!
//! The engine turns Likert-scale answers into a typed personality profile and
//! rolls many profiles into team composition reports through a deterministic
//! pipeline: response intake → score calculation → wing resolution → team
//! aggregation → balance scoring.
//!
//! Every stage is a pure function over immutable inputs. The only state lives
//! in [`AssessmentProcessor`], which records results and caches team reports.

pub mod balance;
pub mod cache;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod questions;
pub mod responses;
pub mod scoring;
pub mod team;
pub mod types;
pub mod wing;

pub use balance::{score, BalanceReport, BalanceScorer, TeamInsight};
pub use cache::{CacheEvent, CachePolicy, TeamReportCache};
pub use config::EngineConfig;
pub use error::EngineError;
pub use pipeline::{assess, team_report, AssessmentProcessor};
pub use questions::QuestionSet;
pub use scoring::{compute_scores, ScoreCalculator};
pub use team::{aggregate, TeamAggregator, TeamDistribution};
pub use types::{Center, EnneagramType, IndividualResult, Item, Response, ScoreVector};
pub use wing::{resolve_wing, TieBreak, WingResolver};

/// Engine version embedded in CLI output
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name reported by the CLI
pub const PRODUCER_NAME: &str = "enneagram-core";
