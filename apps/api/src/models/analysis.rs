use serde::{Deserialize, Serialize};

use crate::models::profile::ProfileRecord;

/// Upper bound of a single dimension score.
pub const MAX_DIMENSION_SCORE: u32 = 10;
/// Upper bound of the overall score.
pub const MAX_TOTAL_SCORE: u32 = 100;

/// JSON keys of the five scored dimensions, in rubric order.
pub const DIMENSION_KEYS: [&str; 5] = [
    "documentation",
    "code_structure",
    "consistency",
    "impact",
    "technical_depth",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionScore {
    pub score: u32, // 0 – 10
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub documentation: DimensionScore,
    pub code_structure: DimensionScore,
    pub consistency: DimensionScore,
    pub impact: DimensionScore,
    pub technical_depth: DimensionScore,
}

impl Dimensions {
    pub fn iter(&self) -> impl Iterator<Item = &DimensionScore> {
        [
            &self.documentation,
            &self.code_structure,
            &self.consistency,
            &self.impact,
            &self.technical_depth,
        ]
        .into_iter()
    }

    pub fn sum(&self) -> u32 {
        self.iter().map(|d| d.score).sum()
    }
}

/// Hiring recommendation attached to every analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecruiterVerdict {
    #[serde(rename = "Strong Hire")]
    StrongHire,
    Interview,
    Pass,
}

impl RecruiterVerdict {
    pub fn label(self) -> &'static str {
        match self {
            RecruiterVerdict::StrongHire => "Strong Hire",
            RecruiterVerdict::Interview => "Interview",
            RecruiterVerdict::Pass => "Pass",
        }
    }

    /// Exact, case-sensitive match against the three labels.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Strong Hire" => Some(RecruiterVerdict::StrongHire),
            "Interview" => Some(RecruiterVerdict::Interview),
            "Pass" => Some(RecruiterVerdict::Pass),
            _ => None,
        }
    }

    /// Threshold rule: ≥70 strong hire, ≥45 interview, otherwise pass.
    pub fn from_total(total_score: u32) -> Self {
        if total_score >= 70 {
            RecruiterVerdict::StrongHire
        } else if total_score >= 45 {
            RecruiterVerdict::Interview
        } else {
            RecruiterVerdict::Pass
        }
    }
}

/// Full hireability report returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub total_score: u32, // 0 – 100
    pub summary: String,
    pub dimensions: Dimensions,
    pub recruiter_verdict: RecruiterVerdict,
    pub actionable_feedback: Vec<String>,
    /// Set only when live scoring failed and the canned report was substituted.
    #[serde(rename = "isMockData", default, skip_serializing_if = "Option::is_none")]
    pub is_mock_data: Option<bool>,
}

impl AnalysisResult {
    pub fn is_mock(&self) -> bool {
        self.is_mock_data.unwrap_or(false)
    }
}

/// Terminal artifact of the pipeline: what gets cached and what the caller sees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<AnalysisResult>,
    #[serde(rename = "profileData", default, skip_serializing_if = "Option::is_none")]
    pub profile_data: Option<ProfileRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnalysisResponse {
    pub fn success(data: AnalysisResult, profile_data: ProfileRecord) -> Self {
        Self {
            success: true,
            data: Some(data),
            profile_data: Some(profile_data),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            profile_data: None,
            error: Some(message.into()),
        }
    }

    pub fn is_mock(&self) -> bool {
        self.data.as_ref().map(AnalysisResult::is_mock).unwrap_or(false)
    }
}
