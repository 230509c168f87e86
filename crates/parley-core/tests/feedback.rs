use parley_core::error::CoreError;
use parley_core::feedback::{FeedbackSubmission, Rating, ThumbsDownReason};

fn submission(feedback_type: Option<&str>, reason: Option<&str>) -> FeedbackSubmission {
    FeedbackSubmission {
        run_id: Some("run-1".to_string()),
        feedback_type: feedback_type.map(str::to_string),
        reason: reason.map(str::to_string),
        ..Default::default()
    }
}

#[test]
fn missing_run_id_is_rejected() {
    let err = FeedbackSubmission::default().into_orchestrator().unwrap_err();
    assert!(matches!(err, CoreError::MissingField(ref f) if f == "run_id"));
    assert_eq!(err.to_string(), "Missing run_id");

    let empty = FeedbackSubmission {
        run_id: Some(String::new()),
        ..Default::default()
    };
    assert!(empty.into_orchestrator().is_err());
}

#[test]
fn unknown_feedback_type_is_rejected() {
    let err = submission(Some("meh"), None).into_orchestrator().unwrap_err();
    assert!(matches!(err, CoreError::InvalidFeedbackType(_)));
}

#[test]
fn thumbs_down_with_invalid_reason_is_rejected() {
    let err = submission(Some("thumbs_down"), Some("invalid_value"))
        .into_orchestrator()
        .unwrap_err();
    assert!(matches!(err, CoreError::InvalidReason(_)));
    assert_eq!(err.to_string(), "Invalid reason");
}

#[test]
fn thumbs_down_without_reason_omits_feedback_type() {
    let fb = submission(Some("thumbs_down"), None).into_orchestrator().unwrap();
    assert_eq!(fb.rating, Rating::ThumbsDown);
    assert_eq!(fb.feedback_type, None);

    let body = serde_json::to_value(&fb).unwrap();
    assert!(body.get("feedback_type").is_none());
    assert_eq!(body["agent_graph_run_id"], "run-1");
    assert_eq!(body["rating"], "thumbs_down");
}

#[test]
fn reasons_map_to_orchestrator_codes() {
    let fb = submission(Some("thumbs_down"), Some("not_factually_correct"))
        .into_orchestrator()
        .unwrap();
    assert_eq!(fb.feedback_type.as_deref(), Some("not_factual"));

    for reason in ThumbsDownReason::ALL {
        let fb = submission(Some("thumbs_down"), Some(reason.as_str()))
            .into_orchestrator()
            .unwrap();
        assert_eq!(fb.feedback_type.as_deref(), Some(reason.orchestrator_code()));
    }
}

#[test]
fn thumbs_up_ignores_reason() {
    let fb = submission(Some("thumbs_up"), Some("invalid_value"))
        .into_orchestrator()
        .unwrap();
    assert_eq!(fb.rating, Rating::ThumbsUp);
    assert_eq!(fb.feedback_type, None);
}

#[test]
fn absent_feedback_type_rates_thumbs_down_without_reason() {
    let fb = submission(None, Some("other")).into_orchestrator().unwrap();
    assert_eq!(fb.rating, Rating::ThumbsDown);
    assert_eq!(fb.feedback_type, None);
}

#[test]
fn empty_question_and_comment_are_dropped() {
    let fb = FeedbackSubmission {
        run_id: Some("run-1".to_string()),
        feedback_type: Some("thumbs_up".to_string()),
        question: Some(String::new()),
        comment: Some("Only returned 3 titles".to_string()),
        ..Default::default()
    }
    .into_orchestrator()
    .unwrap();
    assert_eq!(fb.question, None);
    assert_eq!(fb.comment.as_deref(), Some("Only returned 3 titles"));
}
