//! Team report caching
//!
//! Caches balance reports per normalized team key so repeated views of the
//! same team do not re-run aggregation. Entries are dropped when a
//! [`CacheEvent`] reports a change to that team, or when their TTL lapses.
//! [`CachePolicy::Live`] disables caching entirely.

use crate::balance::BalanceReport;
use crate::error::EngineError;
use crate::team::normalize_team_key;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

/// Default cache lifetime in seconds
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Longest TTL representable as a chrono duration
const MAX_TTL_SECS: u64 = (i64::MAX / 1_000) as u64;

/// How team reports are served
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CachePolicy {
    /// Always recompute; nothing is stored
    Live,
    /// Serve stored reports younger than `ttl_secs`
    Cached { ttl_secs: u64 },
}

impl Default for CachePolicy {
    fn default() -> Self {
        CachePolicy::Cached {
            ttl_secs: DEFAULT_CACHE_TTL_SECS,
        }
    }
}

impl CachePolicy {
    pub fn ttl(&self) -> Option<Duration> {
        match self {
            CachePolicy::Live => None,
            CachePolicy::Cached { ttl_secs } => {
                Some(Duration::seconds((*ttl_secs).min(MAX_TTL_SECS) as i64))
            }
        }
    }
}

/// Change notifications that invalidate cached reports
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    ResultRecorded { team: String },
    ResultDeleted { team: String },
}

#[derive(Debug, Clone)]
struct CacheEntry {
    report: BalanceReport,
    computed_at: DateTime<Utc>,
}

/// Per-team cache of balance reports
#[derive(Debug, Clone, Default)]
pub struct TeamReportCache {
    policy: CachePolicy,
    entries: HashMap<String, CacheEntry>,
}

impl TeamReportCache {
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            policy,
            entries: HashMap::new(),
        }
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    /// Switch policy; switching to live mode drops every stored report
    pub fn set_policy(&mut self, policy: CachePolicy) {
        self.policy = policy;
        if policy == CachePolicy::Live {
            self.entries.clear();
        }
    }

    /// Stored report for a team if it is still within its TTL at `now`
    pub fn get_at(&self, team: &str, now: DateTime<Utc>) -> Option<&BalanceReport> {
        let ttl = self.policy.ttl()?;
        let key = normalize_team_key(team)?;
        self.entries
            .get(&key)
            .filter(|entry| now.signed_duration_since(entry.computed_at) < ttl)
            .map(|entry| &entry.report)
    }

    /// Store a report computed at `now`; a no-op in live mode
    pub fn insert_at(&mut self, team: &str, report: BalanceReport, now: DateTime<Utc>) {
        if self.policy == CachePolicy::Live {
            return;
        }
        if let Some(key) = normalize_team_key(team) {
            self.entries.insert(
                key,
                CacheEntry {
                    report,
                    computed_at: now,
                },
            );
        }
    }

    /// Apply a change notification. Returns whether an entry was dropped.
    pub fn apply(&mut self, event: &CacheEvent) -> bool {
        match event {
            CacheEvent::ResultRecorded { team } | CacheEvent::ResultDeleted { team } => {
                self.invalidate(team)
            }
        }
    }

    /// Drop the stored report for one team
    pub fn invalidate(&mut self, team: &str) -> bool {
        let removed = normalize_team_key(team)
            .and_then(|key| self.entries.remove(&key))
            .is_some();
        if removed {
            debug!(team, "Team report invalidated");
        }
        removed
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Return a valid stored report or run `compute` and store its result
    pub fn get_or_compute<F>(
        &mut self,
        team: &str,
        compute: F,
    ) -> Result<BalanceReport, EngineError>
    where
        F: FnOnce(&str) -> Result<BalanceReport, EngineError>,
    {
        self.get_or_compute_at(team, Utc::now(), compute)
    }

    /// [`get_or_compute`](Self::get_or_compute) with an explicit clock
    pub fn get_or_compute_at<F>(
        &mut self,
        team: &str,
        now: DateTime<Utc>,
        compute: F,
    ) -> Result<BalanceReport, EngineError>
    where
        F: FnOnce(&str) -> Result<BalanceReport, EngineError>,
    {
        if let Some(report) = self.get_at(team, now) {
            debug!(team, "Team report served from cache");
            return Ok(report.clone());
        }

        let report = compute(team)?;
        if self.policy != CachePolicy::Live {
            info!(team, members = report.total_members, "Team report cached");
            self.insert_at(team, report.clone(), now);
        }
        Ok(report)
    }
}
