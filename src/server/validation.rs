use crate::server::response::ApiError;

const MAX_EMAIL_LEN: usize = 254;
const MAX_DESIGN_NAME_LEN: usize = 120;
const MAX_PROMPT_LEN: usize = 4000;

/// Normalizes and checks an email address. Returns the lowercase form that
/// every admin source is keyed by.
pub fn validate_email(email: &str) -> Result<String, ApiError> {
    let email = email.trim().to_lowercase();
    if email.is_empty() {
        return Err(ApiError::bad_request("Email cannot be empty"));
    }
    if email.len() > MAX_EMAIL_LEN {
        return Err(ApiError::bad_request(format!(
            "Email cannot exceed {MAX_EMAIL_LEN} characters"
        )));
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(ApiError::bad_request("Email must be a valid address")),
    }
}

pub fn validate_design_name(name: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::bad_request("Design name cannot be empty"));
    }
    if name.len() > MAX_DESIGN_NAME_LEN {
        return Err(ApiError::bad_request(format!(
            "Design name cannot exceed {MAX_DESIGN_NAME_LEN} characters"
        )));
    }
    Ok(())
}

pub fn validate_prompt(prompt: &str) -> Result<(), ApiError> {
    if prompt.trim().is_empty() {
        return Err(ApiError::bad_request("Prompt cannot be empty"));
    }
    if prompt.len() > MAX_PROMPT_LEN {
        return Err(ApiError::bad_request(format!(
            "Prompt cannot exceed {MAX_PROMPT_LEN} characters"
        )));
    }
    Ok(())
}
