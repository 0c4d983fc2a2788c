//! Pipeline orchestration
//!
//! This module provides the public API for scoring and team reporting.
//! It chains the stages from raw responses to an individual result, and from
//! recorded results to a team balance report.

use crate::balance::{BalanceReport, BalanceScorer};
use crate::cache::{CacheEvent, TeamReportCache};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::questions::QuestionSet;
use crate::scoring::{validity_stats, ScoreCalculator};
use crate::team::{
    normalize_team_key, overall_distribution, TeamAggregator, TeamDistribution, TypeCounts,
};
use crate::types::{IndividualResult, Response};
use crate::wing::WingResolver;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::{info, warn};
use uuid::Uuid;

/// Characters stripped from display names
const UNSAFE_NAME_CHARS: [char; 6] = ['<', '>', '"', '\'', '&', '\0'];

/// Trim, truncate to `max_length` characters and strip markup-sensitive characters
pub fn sanitize_display_name(name: &str, max_length: usize) -> String {
    name.trim()
        .chars()
        .take(max_length)
        .filter(|c| !UNSAFE_NAME_CHARS.contains(c))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Score one participant's responses (stateless, one-shot).
///
/// # Arguments
/// * `display_name` - Participant name; sanitized before use
/// * `team` - Optional team name, kept as entered
/// * `responses` - One response per question, in any order
/// * `questions` - The question set the participant answered
/// * `config` - Tie-break rule and name limits
///
/// # Example
/// ```ignore
/// let result = assess("Ana", Some("alpha"), &responses, &questions, &EngineConfig::default())?;
/// ```
pub fn assess(
    display_name: &str,
    team: Option<&str>,
    responses: &[Response],
    questions: &QuestionSet,
    config: &EngineConfig,
) -> Result<IndividualResult, EngineError> {
    let display_name = sanitize_display_name(display_name, config.name_max_length);
    if display_name.is_empty() {
        return Err(EngineError::InvalidDisplayName(
            "name is empty after sanitization".to_string(),
        ));
    }

    // Stage 1: Accumulate per-type scores
    let scores = ScoreCalculator::compute(responses, questions)?;

    // Stage 2: Resolve primary type and wing
    let resolution = WingResolver::resolve_with(&scores, config.tie_break);

    // Stage 3: Response-style statistics
    let validity = validity_stats(responses);

    let tied_types = (resolution.tied_types.len() > 1).then_some(resolution.tied_types);

    Ok(IndividualResult {
        id: Uuid::new_v4(),
        display_name,
        team: team
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string),
        scores,
        primary_type: resolution.primary_type,
        wing: resolution.wing,
        wing_score: resolution.wing_score,
        tied_types,
        validity,
        recorded_at: Utc::now(),
    })
}

/// Aggregate and score one team from a full result history (stateless)
pub fn team_report(
    results: &[IndividualResult],
    team_key: &str,
    config: &EngineConfig,
) -> Result<BalanceReport, EngineError> {
    let distribution = TeamAggregator::aggregate(results, team_key)?;
    Ok(BalanceScorer::new(config.insights).score(&distribution))
}

/// Stateful processor holding recorded results and cached team reports.
///
/// Team distributions are maintained incrementally as results are recorded,
/// so serving a report never rescans the history.
pub struct AssessmentProcessor {
    questions: QuestionSet,
    config: EngineConfig,
    results: Vec<IndividualResult>,
    distributions: HashMap<String, TeamDistribution>,
    cache: TeamReportCache,
    scorer: BalanceScorer,
}

impl AssessmentProcessor {
    /// Create a processor with default settings
    pub fn new(questions: QuestionSet) -> Self {
        Self::with_config(questions, EngineConfig::default())
    }

    pub fn with_config(questions: QuestionSet, config: EngineConfig) -> Self {
        Self {
            cache: TeamReportCache::new(config.cache),
            scorer: BalanceScorer::new(config.insights),
            questions,
            config,
            results: Vec::new(),
            distributions: HashMap::new(),
        }
    }

    pub fn questions(&self) -> &QuestionSet {
        &self.questions
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn results(&self) -> &[IndividualResult] {
        &self.results
    }

    pub fn cache(&self) -> &TeamReportCache {
        &self.cache
    }

    /// Score a submission and record the result
    pub fn submit(
        &mut self,
        display_name: &str,
        team: Option<&str>,
        responses: &[Response],
    ) -> Result<IndividualResult, EngineError> {
        let result = assess(display_name, team, responses, &self.questions, &self.config)
            .inspect_err(|e| warn!(error = %e, "Submission rejected"))?;
        self.record(result.clone());
        Ok(result)
    }

    /// Record an already computed result and invalidate its team's report
    pub fn record(&mut self, result: IndividualResult) {
        info!(
            name = %result.display_name,
            primary_type = %result.primary_type,
            tied = result.tied_types.is_some(),
            "Result recorded"
        );

        if let Some(key) = result.team.as_deref().and_then(normalize_team_key) {
            self.distributions
                .entry(key.clone())
                .or_insert_with(|| TeamDistribution::empty(&key))
                .push(&result);
            self.cache.apply(&CacheEvent::ResultRecorded { team: key });
        }
        self.results.push(result);
    }

    /// Remove a result by id, returning it if it existed
    pub fn delete(&mut self, id: Uuid) -> Option<IndividualResult> {
        let position = self.results.iter().position(|r| r.id == id)?;
        let removed = self.results.remove(position);

        if let Some(key) = removed.team.as_deref().and_then(normalize_team_key) {
            match TeamAggregator::aggregate(&self.results, &key) {
                Ok(distribution) => {
                    self.distributions.insert(key.clone(), distribution);
                }
                Err(_) => {
                    self.distributions.remove(&key);
                }
            }
            self.cache.apply(&CacheEvent::ResultDeleted { team: key });
        }

        info!(name = %removed.display_name, "Result deleted");
        Some(removed)
    }

    /// Balance report for a team, served from the cache when still valid
    pub fn team_report(&mut self, team: &str) -> Result<BalanceReport, EngineError> {
        self.team_report_at(team, Utc::now())
    }

    /// [`team_report`](Self::team_report) with an explicit clock
    pub fn team_report_at(
        &mut self,
        team: &str,
        now: DateTime<Utc>,
    ) -> Result<BalanceReport, EngineError> {
        let distributions = &self.distributions;
        let scorer = &self.scorer;

        self.cache.get_or_compute_at(team, now, |requested| {
            normalize_team_key(requested)
                .and_then(|key| distributions.get(&key))
                .filter(|distribution| !distribution.is_empty())
                .map(|distribution| scorer.score(distribution))
                .ok_or_else(|| EngineError::EmptyTeam(requested.trim().to_string()))
        })
    }

    /// Primary-type counts across all recorded results
    pub fn overall_distribution(&self) -> TypeCounts {
        overall_distribution(&self.results)
    }

    /// Load recorded results from JSON, rebuilding team aggregates
    pub fn load_results(&mut self, json: &str) -> Result<(), EngineError> {
        let results: Vec<IndividualResult> = serde_json::from_str(json)?;
        self.results.clear();
        self.distributions.clear();
        self.cache.clear();
        for result in results {
            self.record(result);
        }
        Ok(())
    }

    /// Save recorded results to JSON
    pub fn save_results(&self) -> Result<String, EngineError> {
        Ok(serde_json::to_string(&self.results)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CachePolicy;
    use crate::types::{EnneagramType, ScoreVector};
    use crate::wing::TieBreak;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;

    fn sample_questions_json() -> &'static str {
        r#"[
            {"id": 1, "text": "I notice what should be improved", "type": 1},
            {"id": 2, "text": "I go out of my way to help", "type": 2},
            {"id": 3, "text": "I adapt my image to the audience", "type": 3},
            {"id": 4, "text": "I feel different from others", "type": 4},
            {"id": 5, "text": "I observe before engaging", "type": 5},
            {"id": 6, "text": "I look for what could go wrong", "type": 6},
            {"id": 7, "text": "I chase new experiences", "type": 7},
            {"id": 8, "text": "I confront problems head on", "type": 8},
            {"id": 9, "text": "I go along to keep the peace", "type": 9}
        ]"#
    }

    fn questions() -> QuestionSet {
        QuestionSet::from_json(sample_questions_json()).unwrap()
    }

    fn answers(values: [u8; 9]) -> Vec<Response> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| Response::new(i as u32 + 1, v))
            .collect()
    }

    /// Answers making `primary` the clear top type
    fn answers_for(primary: u8) -> Vec<Response> {
        let mut values = [2u8; 9];
        values[usize::from(primary - 1)] = 5;
        answers(values)
    }

    fn t(id: u8) -> EnneagramType {
        EnneagramType::new(id).unwrap()
    }

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_end_to_end_individual() {
        let result = assess(
            "Ana",
            Some("alpha"),
            &answers([5, 1, 1, 1, 1, 1, 1, 1, 1]),
            &questions(),
            &EngineConfig::default(),
        )
        .unwrap();

        assert_eq!(
            result.scores,
            ScoreVector::from_scores([5, 1, 1, 1, 1, 1, 1, 1, 1])
        );
        assert_eq!(result.primary_type, t(1));
        assert_eq!(result.wing, t(2));
        assert_eq!(result.wing_score, 1);
        assert_eq!(result.tied_types, None);
        assert_eq!(result.team.as_deref(), Some("alpha"));
    }

    #[test]
    fn test_tied_types_reported() {
        let result = assess(
            "Ben",
            None,
            &answers([1, 1, 1, 4, 2, 2, 4, 1, 1]),
            &questions(),
            &EngineConfig::default(),
        )
        .unwrap();

        assert_eq!(result.primary_type, t(4));
        assert_eq!(result.tied_types, Some(vec![t(4), t(7)]));
    }

    #[test]
    fn test_center_tie_break_config() {
        let config = EngineConfig {
            tie_break: TieBreak::Center,
            ..EngineConfig::default()
        };
        let result = assess(
            "Cy",
            None,
            &answers([1, 1, 1, 4, 2, 2, 4, 1, 1]),
            &questions(),
            &config,
        )
        .unwrap();

        assert_eq!(result.primary_type, t(7));
    }

    #[test]
    fn test_display_name_sanitized() {
        assert_eq!(sanitize_display_name("  <b>Dee</b> ", 100), "bDee/b");
        assert_eq!(sanitize_display_name("Eli O'Neil", 100), "Eli ONeil");
        assert_eq!(sanitize_display_name("abcdefgh", 3), "abc");

        let err = assess(
            " <> ",
            None,
            &answers([3; 9]),
            &questions(),
            &EngineConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::InvalidDisplayName(_)));
    }

    #[test]
    fn test_end_to_end_team() {
        let mut processor = AssessmentProcessor::new(questions());
        processor.submit("Ana", Some("alpha"), &answers_for(4)).unwrap();
        processor.submit("Ben", Some("Alpha "), &answers_for(4)).unwrap();
        processor.submit("Cy", Some("ALPHA"), &answers_for(7)).unwrap();
        processor.submit("Dee", Some("beta"), &answers_for(2)).unwrap();

        let report = processor.team_report("alpha").unwrap();
        assert_eq!(report.total_members, 3);
        assert_eq!(report.dominant_type, t(4));
        assert_eq!(report.distribution.count(t(4)), 2);
        assert_eq!(report.distribution.percentage(t(4)), 66.7);
        assert_eq!(report.distribution.count(t(7)), 1);
        assert_eq!(report.distribution.percentage(t(7)), 33.3);

        let expected: BTreeSet<EnneagramType> = [1, 2, 3, 5, 6, 8, 9].into_iter().map(t).collect();
        assert_eq!(report.underrepresented_types, expected);

        // incremental aggregate agrees with a full rescan
        let rescanned = team_report(processor.results(), "alpha", processor.config()).unwrap();
        assert_eq!(report, rescanned);
    }

    #[test]
    fn test_unknown_team() {
        let mut processor = AssessmentProcessor::new(questions());
        processor.submit("Ana", Some("alpha"), &answers_for(4)).unwrap();

        assert!(matches!(
            processor.team_report("gamma"),
            Err(EngineError::EmptyTeam(team)) if team == "gamma"
        ));
        assert!(matches!(
            team_report(&[], "alpha", &EngineConfig::default()),
            Err(EngineError::EmptyTeam(_))
        ));
    }

    #[test]
    fn test_recording_invalidates_cached_report() {
        let mut processor = AssessmentProcessor::new(questions());
        processor.submit("Ana", Some("alpha"), &answers_for(4)).unwrap();

        let first = processor.team_report_at("alpha", at(0)).unwrap();
        assert_eq!(first.total_members, 1);
        assert_eq!(processor.cache().len(), 1);

        processor.submit("Ben", Some("alpha"), &answers_for(6)).unwrap();
        assert!(processor.cache().is_empty());

        let second = processor.team_report_at("alpha", at(1)).unwrap();
        assert_eq!(second.total_members, 2);
    }

    #[test]
    fn test_other_team_cache_survives() {
        let mut processor = AssessmentProcessor::new(questions());
        processor.submit("Ana", Some("alpha"), &answers_for(4)).unwrap();
        processor.submit("Dee", Some("beta"), &answers_for(2)).unwrap();
        processor.team_report_at("alpha", at(0)).unwrap();
        processor.team_report_at("beta", at(0)).unwrap();

        processor.submit("Ben", Some("alpha"), &answers_for(6)).unwrap();
        assert!(processor.cache().get_at("beta", at(1)).is_some());
        assert!(processor.cache().get_at("alpha", at(1)).is_none());
    }

    #[test]
    fn test_live_mode() {
        let mut processor = AssessmentProcessor::with_config(questions(), EngineConfig::live());
        processor.submit("Ana", Some("alpha"), &answers_for(4)).unwrap();
        processor.team_report("alpha").unwrap();

        assert_eq!(processor.config().cache, CachePolicy::Live);
        assert!(processor.cache().is_empty());
    }

    #[test]
    fn test_rejected_submission_not_recorded() {
        let mut processor = AssessmentProcessor::new(questions());
        let mut partial = answers_for(4);
        partial.pop();

        assert!(matches!(
            processor.submit("Ana", Some("alpha"), &partial),
            Err(EngineError::IncompleteResponse { .. })
        ));
        assert!(processor.results().is_empty());
        assert!(processor.team_report("alpha").is_err());
    }

    #[test]
    fn test_delete_result() {
        let mut processor = AssessmentProcessor::new(questions());
        let ana = processor.submit("Ana", Some("alpha"), &answers_for(4)).unwrap();
        processor.submit("Ben", Some("alpha"), &answers_for(7)).unwrap();
        processor.team_report("alpha").unwrap();

        let removed = processor.delete(ana.id).unwrap();
        assert_eq!(removed.display_name, "Ana");
        assert!(processor.delete(ana.id).is_none());

        let report = processor.team_report("alpha").unwrap();
        assert_eq!(report.total_members, 1);
        assert_eq!(report.dominant_type, t(7));
    }

    #[test]
    fn test_delete_last_member_empties_team() {
        let mut processor = AssessmentProcessor::new(questions());
        let ana = processor.submit("Ana", Some("alpha"), &answers_for(4)).unwrap();
        processor.delete(ana.id);

        assert!(matches!(
            processor.team_report("alpha"),
            Err(EngineError::EmptyTeam(_))
        ));
    }

    #[test]
    fn test_results_persistence() {
        let mut processor = AssessmentProcessor::new(questions());
        processor.submit("Ana", Some("alpha"), &answers_for(4)).unwrap();
        processor.submit("Ben", None, &answers_for(9)).unwrap();
        let saved = processor.save_results().unwrap();

        let mut restored = AssessmentProcessor::new(questions());
        restored.load_results(&saved).unwrap();

        let ids = |p: &AssessmentProcessor| p.results().iter().map(|r| r.id).collect::<Vec<_>>();
        assert_eq!(ids(&restored), ids(&processor));
        assert_eq!(restored.results()[1].primary_type, t(9));
        assert_eq!(restored.team_report("alpha").unwrap().total_members, 1);
        assert_eq!(restored.overall_distribution().total(), 2);
    }
}
