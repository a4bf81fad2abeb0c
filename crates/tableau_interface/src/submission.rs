//! Remote assignment submission.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use tableau_core::SubmissionFile;
use tableau_error::SubmissionError;

/// Sends a learner's file to the course backend.
#[async_trait]
pub trait AssignmentSubmitter: Send + Sync {
    /// Submit `file` for `assignment_id`, returning the backend's response body.
    async fn submit(
        &self,
        assignment_id: &str,
        file: &SubmissionFile,
    ) -> Result<JsonValue, SubmissionError>;
}
