use thiserror::Error;

/// Every failure that can reach a caller. Transport and store errors are
/// mapped into one of these before they leave the service layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CocktailError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("no data received")]
    NoDataReceived,
    #[error("failed to decode response: {0}")]
    DecodeFailure(String),
    #[error("request timed out")]
    Timeout,
    #[error("no cocktails found")]
    NoCandidatesFound,
    #[error("no more cocktails available for {0}")]
    PoolExhausted(String),
    #[error("not signed in")]
    Unauthenticated,
    #[error("failed to sign in")]
    SignInFailure,
    #[error("failed to sign out")]
    SignOutFailure,
    #[error("failed to save cocktail: {0}")]
    SaveFailure(String),
    #[error("failed to delete cocktail: {0}")]
    DeleteFailure(String)
}

impl CocktailError {
    /// Name of the resource string holding the user-facing message.
    pub fn resource_name(&self) -> &'static str {
        match self {
            CocktailError::InvalidRequest(_) => "invalid_request_error_message_template",
            CocktailError::NoDataReceived => "no_data_received_error_message",
            CocktailError::DecodeFailure(_) => "decode_failure_error_message",
            CocktailError::Timeout => "timeout_error_message",
            CocktailError::NoCandidatesFound => "no_cocktails_found_error_message",
            CocktailError::PoolExhausted(_) => "no_more_cocktails_error_message_template",
            CocktailError::Unauthenticated => "unauthenticated_error_message",
            CocktailError::SignInFailure => "sign_in_error_message",
            CocktailError::SignOutFailure => "sign_out_error_message",
            CocktailError::SaveFailure(_) => "save_cocktail_error_message",
            CocktailError::DeleteFailure(_) => "delete_cocktail_error_message"
        }
    }

    /// Values available to the message template.
    pub fn template_data(&self) -> serde_json::Value {
        match self {
            CocktailError::InvalidRequest(detail) => serde_json::json!({ "detail": detail }),
            CocktailError::PoolExhausted(spirit) => serde_json::json!({ "spirit": spirit }),
            _ => serde_json::json!({})
        }
    }
}

impl From<reqwest::Error> for CocktailError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            CocktailError::Timeout
        } else if error.is_builder() {
            CocktailError::InvalidRequest(error.to_string())
        } else if error.is_decode() {
            CocktailError::DecodeFailure(error.to_string())
        } else {
            CocktailError::NoDataReceived
        }
    }
}

impl From<serde_json::Error> for CocktailError {
    fn from(error: serde_json::Error) -> Self {
        CocktailError::DecodeFailure(error.to_string())
    }
}
