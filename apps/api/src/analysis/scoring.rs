//! Scoring Engine: asks the completion model for a hireability report and repairs
//! whatever comes back into a result that honours the score bounds and verdict labels.
//!
//! Flow: demo short-circuit → API key check → sanitize + build prompt →
//!       up to `MAX_ATTEMPTS` model calls with exponential backoff →
//!       parse / validate / clamp → canned fallback when every attempt fails.
//!
//! Only a missing API key is surfaced as an error; everything else degrades to the
//! canned report marked with `isMockData`.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{info, warn};

use crate::analysis::prompts::{SCORING_SYSTEM, SCORING_USER_PREFIX};
use crate::analysis::sanitize::sanitize_profile;
use crate::llm_client::{extract_json, ChatMessage, CompletionModel, CompletionOptions, LlmError};
use crate::models::analysis::{
    AnalysisResult, DimensionScore, Dimensions, RecruiterVerdict, DIMENSION_KEYS,
    MAX_DIMENSION_SCORE, MAX_TOTAL_SCORE,
};
use crate::models::profile::ProfileRecord;

/// Logins that always get the canned report, compared case-insensitively.
pub const DEMO_LOGINS: [&str; 2] = ["demo", "test"];
pub const DEMO_LATENCY: Duration = Duration::from_millis(1500);
pub const MAX_ATTEMPTS: u32 = 2;
pub const BASE_RETRY_DELAY: Duration = Duration::from_millis(2000);
/// Five dimensions capped at 10 sum to at most 50; doubling maps that onto 0–100.
/// Must change together with `DIMENSION_KEYS` or `MAX_DIMENSION_SCORE`.
const DIMENSION_SUM_TO_TOTAL: u32 = 2;
const FALLBACK_NOTE: &str = "(System Note: Live analysis failed. Showing demo data.) ";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoringError {
    #[error("OPENROUTER_API_KEY is not set")]
    MissingApiKey,
}

/// Why a single model attempt was rejected.
#[derive(Debug, Error)]
enum AttemptError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("Response is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid response structure: {0}")]
    Structure(&'static str),
}

/// The canned report used for demo logins and as the last-resort fallback.
pub fn mock_analysis() -> AnalysisResult {
    AnalysisResult {
        total_score: 72,
        summary: "Solid profile with clear engineering depth. Projects demonstrate \
            architectural understanding and consistent contribution history."
            .to_string(),
        dimensions: Dimensions {
            documentation: DimensionScore {
                score: 8,
                comment: "READMEs are well-structured with demos and setup steps.".to_string(),
            },
            code_structure: DimensionScore {
                score: 7,
                comment: "Clean repo organization, though some legacy repos lack structure."
                    .to_string(),
            },
            consistency: DimensionScore {
                score: 7,
                comment: "Consistent commit history over the past 6 months.".to_string(),
            },
            impact: DimensionScore {
                score: 6,
                comment: "Mix of portfolio projects and practice repos; some solve real problems."
                    .to_string(),
            },
            technical_depth: DimensionScore {
                score: 8,
                comment: "Strong grasp of a modern stack and cloud infrastructure.".to_string(),
            },
        },
        recruiter_verdict: RecruiterVerdict::Interview,
        actionable_feedback: vec![
            "Archive or unpin low-quality forked repositories to focus on original work."
                .to_string(),
            "Add CONTRIBUTING.md to major projects to encourage open source engagement."
                .to_string(),
            "Update dependency chains on older projects to remove security alerts.".to_string(),
        ],
        is_mock_data: None,
    }
}

/// The canned report, flagged as mock and prefixed with a note that live scoring failed.
pub fn fallback_analysis() -> AnalysisResult {
    let mut result = mock_analysis();
    result.summary = format!("{FALLBACK_NOTE}{}", result.summary);
    result.is_mock_data = Some(true);
    result
}

pub struct ScoringEngine {
    model: Option<Arc<dyn CompletionModel>>,
    demo_mode: bool,
    options: CompletionOptions,
    max_attempts: u32,
    base_retry_delay: Duration,
}

impl ScoringEngine {
    /// `model` is `None` when no API key is configured.
    pub fn new(model: Option<Arc<dyn CompletionModel>>, demo_mode: bool) -> Self {
        Self {
            model,
            demo_mode,
            options: CompletionOptions::default(),
            max_attempts: MAX_ATTEMPTS,
            base_retry_delay: BASE_RETRY_DELAY,
        }
    }

    fn is_demo(&self, login: &str) -> bool {
        self.demo_mode
            || DEMO_LOGINS
                .iter()
                .any(|demo| login.eq_ignore_ascii_case(demo))
    }

    pub async fn score(&self, profile: &ProfileRecord) -> Result<AnalysisResult, ScoringError> {
        if self.is_demo(&profile.user.login) {
            info!("Demo mode: returning canned analysis for {}", profile.user.login);
            tokio::time::sleep(DEMO_LATENCY).await;
            return Ok(mock_analysis());
        }

        let model = self.model.as_ref().ok_or(ScoringError::MissingApiKey)?;

        let messages = match build_messages(profile) {
            Ok(messages) => messages,
            Err(e) => {
                warn!("Failed to serialize profile for scoring: {e}");
                return Ok(fallback_analysis());
            }
        };

        for attempt in 0..self.max_attempts {
            if attempt > 0 {
                let delay = self.base_retry_delay * 2u32.pow(attempt - 1);
                info!(
                    "Retry attempt {} after {}ms...",
                    attempt + 1,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            info!(
                "Calling scoring model ({}), attempt {}...",
                model.model_id(),
                attempt + 1
            );
            match self.attempt(model.as_ref(), &messages).await {
                Ok(result) => {
                    info!(
                        "Scoring succeeded: score={}, verdict={}",
                        result.total_score,
                        result.recruiter_verdict.label()
                    );
                    return Ok(result);
                }
                Err(e) => warn!("Scoring attempt {} failed: {}", attempt + 1, e),
            }
        }

        warn!(
            "All {} scoring attempts failed. Falling back to mock data.",
            self.max_attempts
        );
        Ok(fallback_analysis())
    }

    async fn attempt(
        &self,
        model: &dyn CompletionModel,
        messages: &[ChatMessage],
    ) -> Result<AnalysisResult, AttemptError> {
        let text = model.complete(messages, &self.options).await?;
        if text.trim().is_empty() {
            return Err(LlmError::EmptyContent.into());
        }
        parse_analysis(&text)
    }
}

/// System rubric plus the sanitized profile as the user turn.
fn build_messages(profile: &ProfileRecord) -> Result<Vec<ChatMessage>, serde_json::Error> {
    let raw_size = serde_json::to_vec(profile)?.len();
    let sanitized = serde_json::to_string(&sanitize_profile(profile))?;
    let clean_size = sanitized.len();

    info!(
        "Payload sanitized: {:.1}kb -> {:.1}kb ({}% reduction)",
        raw_size as f64 / 1024.0,
        clean_size as f64 / 1024.0,
        reduction_percent(raw_size, clean_size)
    );

    Ok(vec![
        ChatMessage::system(SCORING_SYSTEM),
        ChatMessage::user(format!("{SCORING_USER_PREFIX}{sanitized}")),
    ])
}

fn reduction_percent(raw_size: usize, clean_size: usize) -> i64 {
    if raw_size == 0 {
        return 0;
    }
    ((1.0 - clean_size as f64 / raw_size as f64) * 100.0).round() as i64
}

/// Parses model text into a result, treating every field as untrusted.
///
/// Required: an object with numeric `total_score`, string `summary`, and present
/// `dimensions` / `recruiter_verdict`. Everything else is repaired rather than rejected.
fn parse_analysis(text: &str) -> Result<AnalysisResult, AttemptError> {
    let value: Value = serde_json::from_str(extract_json(text))?;
    let obj = value
        .as_object()
        .ok_or(AttemptError::Structure("expected a JSON object"))?;

    let reported_total = obj
        .get("total_score")
        .and_then(Value::as_f64)
        .ok_or(AttemptError::Structure("total_score must be a number"))?;
    let summary = obj
        .get("summary")
        .and_then(Value::as_str)
        .ok_or(AttemptError::Structure("summary must be a string"))?;
    let raw_dimensions = obj
        .get("dimensions")
        .filter(|v| is_truthy(v))
        .ok_or(AttemptError::Structure("dimensions are missing"))?;
    let raw_verdict = obj
        .get("recruiter_verdict")
        .filter(|v| is_truthy(v))
        .ok_or(AttemptError::Structure("recruiter_verdict is missing"))?;

    let [documentation, code_structure, consistency, impact, technical_depth] =
        DIMENSION_KEYS.map(|key| repair_dimension(raw_dimensions.get(key)));
    let dimensions = Dimensions {
        documentation,
        code_structure,
        consistency,
        impact,
        technical_depth,
    };
    let calculated_total = dimensions.sum();

    // A zero (or sub-0.5) top-line score is read as an omission, not a verdict.
    let mut total_score = clamp_score(reported_total, MAX_TOTAL_SCORE);
    if total_score == 0 {
        total_score = calculated_total * DIMENSION_SUM_TO_TOTAL;
        info!("Recalculated total_score from dimensions: {total_score}");
    }

    let recruiter_verdict = raw_verdict
        .as_str()
        .and_then(RecruiterVerdict::from_label)
        .unwrap_or_else(|| RecruiterVerdict::from_total(total_score));

    Ok(AnalysisResult {
        total_score,
        summary: summary.to_string(),
        dimensions,
        recruiter_verdict,
        actionable_feedback: feedback_list(obj),
        is_mock_data: None,
    })
}

fn repair_dimension(raw: Option<&Value>) -> DimensionScore {
    let score = raw.and_then(|d| d.get("score"));
    let comment = raw
        .and_then(|d| d.get("comment"))
        .and_then(Value::as_str)
        .unwrap_or_default();
    DimensionScore {
        score: clamp_score(coerce_number(score), MAX_DIMENSION_SCORE),
        comment: comment.to_string(),
    }
}

fn feedback_list(obj: &Map<String, Value>) -> Vec<String> {
    obj.get("actionable_feedback")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Lenient numeric coercion: numbers pass through, numeric strings parse, booleans map
/// to 1/0, anything else (or non-finite) is 0.
fn coerce_number(value: Option<&Value>) -> f64 {
    let number = match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => {
            let s = s.trim();
            if s.is_empty() {
                0.0
            } else {
                s.parse::<f64>().unwrap_or(0.0)
            }
        }
        Some(Value::Bool(b)) => f64::from(u8::from(*b)),
        _ => 0.0,
    };
    if number.is_finite() {
        number
    } else {
        0.0
    }
}

fn clamp_score(value: f64, max: u32) -> u32 {
    value.round().clamp(0.0, f64::from(max)) as u32
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::profile::fixtures;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned replies in order and records every prompt it receives.
    struct ScriptedModel {
        replies: Mutex<VecDeque<Result<String, LlmError>>>,
        prompts: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedModel {
        fn new(replies: Vec<Result<String, LlmError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl CompletionModel for ScriptedModel {
        fn model_id(&self) -> &str {
            "scripted/model"
        }

        async fn complete(
            &self,
            messages: &[ChatMessage],
            _options: &CompletionOptions,
        ) -> Result<String, LlmError> {
            self.prompts.lock().unwrap().push(messages.to_vec());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(LlmError::EmptyContent))
        }
    }

    fn model_reply(total: Value, scores: [Value; 5], verdict: &str) -> String {
        let mut dimensions = Map::new();
        for (key, score) in DIMENSION_KEYS.iter().zip(scores) {
            dimensions.insert(
                key.to_string(),
                json!({ "score": score, "comment": format!("{key} comment") }),
            );
        }
        json!({
            "total_score": total,
            "summary": "Base Score: 80 (Professional).",
            "dimensions": dimensions,
            "recruiter_verdict": verdict,
            "actionable_feedback": ["Write more tests."]
        })
        .to_string()
    }

    fn engine_with(model: Arc<ScriptedModel>) -> ScoringEngine {
        ScoringEngine::new(Some(model), false)
    }

    #[test]
    fn test_zero_total_is_recomputed_from_dimensions() {
        let reply = model_reply(
            json!(0),
            [json!(8), json!(7), json!(7), json!(6), json!(8)],
            "Interview",
        );
        let result = parse_analysis(&reply).unwrap();
        assert_eq!(result.total_score, 72);
        assert_eq!(result.recruiter_verdict, RecruiterVerdict::Interview);
    }

    #[test]
    fn test_dimension_scores_are_clamped_and_coerced() {
        let reply = model_reply(
            json!(60),
            [json!(15), json!("7"), json!("abc"), json!(-3), json!(7.6)],
            "Pass",
        );
        let result = parse_analysis(&reply).unwrap();
        let scores: Vec<u32> = result.dimensions.iter().map(|d| d.score).collect();
        assert_eq!(scores, vec![10, 7, 0, 0, 8]);
        assert_eq!(result.total_score, 60);
        assert_eq!(result.dimensions.documentation.comment, "documentation comment");
    }

    #[test]
    fn test_total_score_is_rounded_and_clamped() {
        let dims = [json!(5), json!(5), json!(5), json!(5), json!(5)];
        let high = parse_analysis(&model_reply(json!(150), dims.clone(), "Strong Hire")).unwrap();
        assert_eq!(high.total_score, 100);
        let fractional = parse_analysis(&model_reply(json!(64.5), dims, "Interview")).unwrap();
        assert_eq!(fractional.total_score, 65);
    }

    #[test]
    fn test_negative_total_is_treated_as_missing() {
        let reply = model_reply(
            json!(-20),
            [json!(2), json!(2), json!(2), json!(2), json!(2)],
            "Pass",
        );
        assert_eq!(parse_analysis(&reply).unwrap().total_score, 20);
    }

    #[test]
    fn test_unknown_verdict_is_derived_from_final_total() {
        let reply = model_reply(
            json!(0),
            [json!(8), json!(7), json!(7), json!(6), json!(8)],
            "Maybe",
        );
        let result = parse_analysis(&reply).unwrap();
        assert_eq!(result.total_score, 72);
        assert_eq!(result.recruiter_verdict, RecruiterVerdict::StrongHire);

        let reply = model_reply(
            json!(50),
            [json!(5), json!(5), json!(5), json!(5), json!(5)],
            "strong hire",
        );
        assert_eq!(
            parse_analysis(&reply).unwrap().recruiter_verdict,
            RecruiterVerdict::Interview
        );
    }

    #[test]
    fn test_fenced_reply_is_parsed() {
        let reply = format!(
            "```json\n{}\n```",
            model_reply(
                json!(40),
                [json!(4), json!(4), json!(4), json!(4), json!(4)],
                "Pass"
            )
        );
        assert_eq!(parse_analysis(&reply).unwrap().total_score, 40);
    }

    #[test]
    fn test_missing_required_fields_are_rejected() {
        assert!(matches!(
            parse_analysis(r#"{"summary": "x", "dimensions": {}, "recruiter_verdict": "Pass"}"#),
            Err(AttemptError::Structure(_))
        ));
        assert!(matches!(
            parse_analysis(
                r#"{"total_score": "80", "summary": "x", "dimensions": {}, "recruiter_verdict": "Pass"}"#
            ),
            Err(AttemptError::Structure(_))
        ));
        assert!(matches!(
            parse_analysis(r#"{"total_score": 80, "summary": "x", "dimensions": {}, "recruiter_verdict": ""}"#),
            Err(AttemptError::Structure(_))
        ));
        assert!(matches!(parse_analysis("[1, 2, 3]"), Err(AttemptError::Structure(_))));
        assert!(matches!(parse_analysis("not json"), Err(AttemptError::Json(_))));
    }

    #[test]
    fn test_missing_dimensions_and_feedback_are_filled() {
        let reply = r#"{
            "total_score": 55,
            "summary": "Thin profile.",
            "dimensions": {"impact": {"score": 6}},
            "recruiter_verdict": "Interview",
            "actionable_feedback": "Add READMEs"
        }"#;
        let result = parse_analysis(reply).unwrap();
        assert_eq!(result.dimensions.impact.score, 6);
        assert_eq!(result.dimensions.impact.comment, "");
        assert_eq!(result.dimensions.documentation.score, 0);
        assert!(result.actionable_feedback.is_empty());
        assert_eq!(result.is_mock_data, None);
    }

    #[test]
    fn test_dimension_keys_land_on_matching_fields() {
        let reply = r#"{
            "total_score": 50,
            "summary": "ok",
            "dimensions": {
                "technical_depth": {"score": 1},
                "impact": {"score": 2},
                "consistency": {"score": 3},
                "code_structure": {"score": 4},
                "documentation": {"score": 5}
            },
            "recruiter_verdict": "Interview"
        }"#;
        let dims = parse_analysis(reply).unwrap().dimensions;
        assert_eq!(dims.documentation.score, 5);
        assert_eq!(dims.code_structure.score, 4);
        assert_eq!(dims.consistency.score, 3);
        assert_eq!(dims.impact.score, 2);
        assert_eq!(dims.technical_depth.score, 1);
    }

    #[test]
    fn test_reduction_percent() {
        assert_eq!(reduction_percent(1000, 250), 75);
        assert_eq!(reduction_percent(0, 10), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_demo_login_short_circuits_without_model() {
        let engine = ScoringEngine::new(None, false);
        let result = engine.score(&fixtures::profile("Demo")).await.unwrap();
        assert_eq!(result, mock_analysis());
        assert_eq!(result.total_score, 72);
        assert_eq!(result.recruiter_verdict, RecruiterVerdict::Interview);
        assert_eq!(result.is_mock_data, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_global_demo_mode_skips_model() {
        let model = ScriptedModel::new(vec![]);
        let engine = ScoringEngine::new(Some(model.clone()), true);
        let result = engine.score(&fixtures::profile("octocat")).await.unwrap();
        assert_eq!(result, mock_analysis());
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_api_key_is_fatal() {
        let engine = ScoringEngine::new(None, false);
        let err = engine.score(&fixtures::profile("octocat")).await.unwrap_err();
        assert_eq!(err, ScoringError::MissingApiKey);
    }

    #[tokio::test(start_paused = true)]
    async fn test_prompt_carries_rubric_and_sanitized_profile() {
        let model = ScriptedModel::new(vec![Ok(model_reply(
            json!(70),
            [json!(7), json!(7), json!(7), json!(7), json!(7)],
            "Strong Hire",
        ))]);
        engine_with(model.clone())
            .score(&fixtures::profile("octocat"))
            .await
            .unwrap();

        let prompts = model.prompts.lock().unwrap();
        let messages = &prompts[0];
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], ChatMessage::system(SCORING_SYSTEM));
        assert!(messages[1].content.starts_with(SCORING_USER_PREFIX));
        assert!(messages[1].content.contains("\"login\":\"octocat\""));
        assert!(!messages[1].content.contains("avatar_url"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_after_bad_reply_with_backoff() {
        let model = ScriptedModel::new(vec![
            Ok("Sorry, I cannot help with that.".to_string()),
            Ok(model_reply(
                json!(81),
                [json!(8), json!(8), json!(8), json!(8), json!(8)],
                "Strong Hire",
            )),
        ]);
        let started = tokio::time::Instant::now();
        let result = engine_with(model.clone())
            .score(&fixtures::profile("octocat"))
            .await
            .unwrap();

        assert_eq!(result.total_score, 81);
        assert_eq!(model.calls(), 2);
        assert!(started.elapsed() >= BASE_RETRY_DELAY);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_attempts_fall_back_to_marked_mock() {
        let model = ScriptedModel::new(vec![
            Err(LlmError::RateLimited("quota".to_string())),
            Ok(String::new()),
        ]);
        let result = engine_with(model.clone())
            .score(&fixtures::profile("octocat"))
            .await
            .unwrap();

        assert_eq!(model.calls(), MAX_ATTEMPTS as usize);
        assert_eq!(result.is_mock_data, Some(true));
        assert!(result.summary.starts_with(FALLBACK_NOTE));
        assert_eq!(result.total_score, 72);
    }
}
