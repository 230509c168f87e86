use std::collections::HashMap;

use parley_orchestrator::config::{
    DEFAULT_BASE_URL, OrchestratorConfig, PRIMARY_URL_VAR, SECONDARY_URL_VAR, STREAM_TIMEOUT,
    clean_env_value,
};

fn resolve(vars: &[(&str, &str)]) -> OrchestratorConfig {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    OrchestratorConfig::from_lookup(|name| vars.get(name).cloned())
}

#[test]
fn falls_back_to_default() {
    assert_eq!(resolve(&[]).base_url, DEFAULT_BASE_URL);
    assert_eq!(resolve(&[(PRIMARY_URL_VAR, "  ")]).base_url, DEFAULT_BASE_URL);
}

#[test]
fn primary_wins_over_secondary() {
    let config = resolve(&[
        (PRIMARY_URL_VAR, "http://primary:8000"),
        (SECONDARY_URL_VAR, "http://secondary:8000"),
    ]);
    assert_eq!(config.base_url, "http://primary:8000");

    let config = resolve(&[(PRIMARY_URL_VAR, ""), (SECONDARY_URL_VAR, "http://secondary:8000")]);
    assert_eq!(config.base_url, "http://secondary:8000");
}

#[test]
fn trailing_slash_is_stripped() {
    let config = resolve(&[(SECONDARY_URL_VAR, "http://orch.local/")]);
    assert_eq!(config.base_url, "http://orch.local");
    assert_eq!(config.stream_answer_url(), "http://orch.local/orchestrator/stream-answer");
    assert_eq!(config.feedback_url(), "http://orch.local/feedback");
}

#[test]
fn env_values_are_cleaned() {
    assert_eq!(
        clean_env_value("\"http://orch.local\" # staging").as_deref(),
        Some("http://orch.local")
    );
    assert_eq!(clean_env_value("'http://orch.local'").as_deref(), Some("http://orch.local"));
    assert_eq!(clean_env_value("# only a comment"), None);
    assert_eq!(clean_env_value("\"\""), None);
}

#[test]
fn stream_timeout_is_inside_relay_budget() {
    assert!(STREAM_TIMEOUT.as_secs() < 60);
    assert_eq!(resolve(&[]).stream_timeout, STREAM_TIMEOUT);
}
