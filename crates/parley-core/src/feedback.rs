//! Feedback submissions and their translation into the orchestrator's
//! vocabulary.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Thumbs rating as the orchestrator records it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    ThumbsUp,
    ThumbsDown,
}

impl Rating {
    pub fn as_str(self) -> &'static str {
        match self {
            Rating::ThumbsUp => "thumbs_up",
            Rating::ThumbsDown => "thumbs_down",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "thumbs_up" => Some(Rating::ThumbsUp),
            "thumbs_down" => Some(Rating::ThumbsDown),
            _ => None,
        }
    }
}

/// Why an answer got a thumbs-down. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThumbsDownReason {
    NotFactuallyCorrect,
    DidntFollowInstructions,
    OffensiveUnsafe,
    WrongLanguage,
    Other,
}

impl ThumbsDownReason {
    pub const ALL: [ThumbsDownReason; 5] = [
        ThumbsDownReason::NotFactuallyCorrect,
        ThumbsDownReason::DidntFollowInstructions,
        ThumbsDownReason::OffensiveUnsafe,
        ThumbsDownReason::WrongLanguage,
        ThumbsDownReason::Other,
    ];

    /// Identifier used by chat clients.
    pub fn as_str(self) -> &'static str {
        match self {
            ThumbsDownReason::NotFactuallyCorrect => "not_factually_correct",
            ThumbsDownReason::DidntFollowInstructions => "didnt_follow_instructions",
            ThumbsDownReason::OffensiveUnsafe => "offensive_unsafe",
            ThumbsDownReason::WrongLanguage => "wrong_language",
            ThumbsDownReason::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.as_str() == s)
    }

    /// The orchestrator's `feedback_type` code for this reason.
    pub fn orchestrator_code(self) -> &'static str {
        match self {
            ThumbsDownReason::NotFactuallyCorrect => "not_factual",
            other => other.as_str(),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ThumbsDownReason::NotFactuallyCorrect => "Not factually correct",
            ThumbsDownReason::DidntFollowInstructions => "Didn't follow instructions",
            ThumbsDownReason::OffensiveUnsafe => "Offensive / Unsafe",
            ThumbsDownReason::WrongLanguage => "Wrong language",
            ThumbsDownReason::Other => "Other",
        }
    }
}

/// Feedback as a chat client submits it.
///
/// Fields stay loosely typed so that validation can report precisely what is
/// wrong instead of failing at deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedbackSubmission {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Feedback in the shape the orchestrator's `/feedback` endpoint expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestratorFeedback {
    pub agent_graph_run_id: String,
    pub rating: Rating,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl FeedbackSubmission {
    /// Validate and translate into the orchestrator's vocabulary.
    ///
    /// A missing `feedback_type` is rated as a thumbs-down. The reason is
    /// only checked, and only forwarded, when the type is explicitly
    /// `thumbs_down`.
    pub fn into_orchestrator(self) -> Result<OrchestratorFeedback, CoreError> {
        let run_id = self
            .run_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| CoreError::MissingField("run_id".to_string()))?;

        let declared = match self.feedback_type.as_deref() {
            None => None,
            Some(raw) => Some(
                Rating::parse(raw).ok_or_else(|| CoreError::InvalidFeedbackType(raw.to_string()))?,
            ),
        };

        let mut feedback_type = None;
        if declared == Some(Rating::ThumbsDown)
            && let Some(raw) = self.reason.as_deref()
        {
            let reason =
                ThumbsDownReason::parse(raw).ok_or_else(|| CoreError::InvalidReason(raw.to_string()))?;
            feedback_type = Some(reason.orchestrator_code().to_string());
        }

        let rating = match declared {
            Some(Rating::ThumbsUp) => Rating::ThumbsUp,
            _ => Rating::ThumbsDown,
        };

        Ok(OrchestratorFeedback {
            agent_graph_run_id: run_id,
            rating,
            feedback_type,
            question: self.question.filter(|q| !q.is_empty()),
            comment: self.comment.filter(|c| !c.is_empty()),
        })
    }
}
