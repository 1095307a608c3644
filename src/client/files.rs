//! File upload endpoint.

use std::path::Path;

use reqwest::multipart::{Form, Part};

use crate::error::{ApiError, DifyError};
use crate::models::UploadedFile;

use super::DifyClient;

impl DifyClient {
    /// Upload a local file for use as a message or workflow input.
    ///
    /// The returned file ID goes into an [`crate::models::InputFile`]
    /// with the `local_file` transfer method.
    pub async fn upload_file(&self, path: &Path, user: &str) -> Result<UploadedFile, DifyError> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .ok_or_else(|| ApiError::Validation {
                message: format!("invalid file path: {}", path.display()),
            })?;

        let bytes = tokio::fs::read(path).await?;
        let form = Form::new()
            .part("file", Part::bytes(bytes).file_name(file_name))
            .text("user", user.to_string());

        let response = self
            .http
            .post(self.url("/files/upload"))
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .multipart(form)
            .send()
            .await?;
        Self::decode_response(response).await
    }
}
