use crate::error::HarnessError;

/// Validate a prompt before it is sent
pub fn validate_prompt(prompt: &str) -> Result<(), HarnessError> {
    if prompt.trim().is_empty() {
        return Err(HarnessError::InvalidInput(
            "Prompt cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validate the service base URL (e.g., http://localhost:8080)
pub fn validate_base_url(url: &str) -> Result<(), HarnessError> {
    let url = url.trim();
    let rest = url
        .strip_prefix("http://")
        .or_else(|| url.strip_prefix("https://"))
        .ok_or_else(|| {
            HarnessError::InvalidInput(format!(
                "Invalid base URL: {}. Expected http:// or https://",
                url
            ))
        })?;

    let host = rest.split('/').next().unwrap_or_default();
    if host.is_empty() || rest.chars().any(char::is_whitespace) {
        return Err(HarnessError::InvalidInput(format!(
            "Invalid base URL: {}",
            url
        )));
    }
    Ok(())
}

/// Validate an audio reference taken from a chat reply
pub fn validate_audio_url(url: &str) -> Result<(), HarnessError> {
    if url.trim().is_empty() {
        return Err(HarnessError::InvalidInput(
            "Audio URL cannot be empty".to_string(),
        ));
    }
    if url.chars().any(char::is_whitespace) {
        return Err(HarnessError::InvalidInput(format!(
            "Audio URL contains whitespace: {:?}",
            url
        )));
    }
    Ok(())
}
