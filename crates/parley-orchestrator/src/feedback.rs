use serde::Deserialize;
use tracing::info;

use parley_core::feedback::OrchestratorFeedback;

use crate::client::OrchestratorClient;
use crate::error::OrchestratorError;

/// Reply body of `POST /feedback`. Both fields are optional.
#[derive(Debug, Default, Deserialize)]
struct FeedbackReply {
    status: Option<String>,
    message: Option<String>,
}

impl OrchestratorClient {
    /// Forward one feedback submission.
    ///
    /// A 2xx reply counts as success unless its JSON body says
    /// `"status": "error"`; a 2xx body that isn't JSON is accepted.
    pub async fn submit_feedback(
        &self,
        feedback: &OrchestratorFeedback,
    ) -> Result<(), OrchestratorError> {
        let timeout = self.config.feedback_timeout;

        let response = self
            .http
            .post(self.config.feedback_url())
            .json(feedback)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| OrchestratorError::from_reqwest(e, timeout))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| OrchestratorError::from_reqwest(e, timeout))?;

        if !status.is_success() {
            return Err(OrchestratorError::status(status, body));
        }

        let reply: FeedbackReply = serde_json::from_str(&body).unwrap_or_default();
        if reply.status.as_deref() == Some("error") {
            return Err(OrchestratorError::Rejected(
                reply.message.unwrap_or_else(|| "feedback rejected".to_string()),
            ));
        }

        info!(
            run_id = %feedback.agent_graph_run_id,
            rating = feedback.rating.as_str(),
            "feedback forwarded"
        );
        Ok(())
    }
}
