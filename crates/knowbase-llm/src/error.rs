#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{provider} rate limited the request")]
    RateLimited { provider: String },

    #[error("{provider} rejected the API key (status {status})")]
    Unauthorized { provider: String, status: u16 },

    #[error("{provider} API request failed (status {status})")]
    Api { provider: String, status: u16 },

    #[error("empty response from {provider}")]
    EmptyResponse { provider: String },

    #[error("{provider} returned {got} embeddings for {expected} inputs")]
    EmbeddingCount {
        provider: String,
        expected: usize,
        got: usize,
    },

    #[error("embedding not supported by {provider}")]
    EmbedUnsupported { provider: String },

    #[error("{0}")]
    Other(String),
}

impl LlmError {
    /// Map a non-success HTTP status to the matching error variant.
    #[must_use]
    pub fn from_status(provider: &str, status: reqwest::StatusCode) -> Self {
        let code = status.as_u16();
        match status {
            reqwest::StatusCode::TOO_MANY_REQUESTS => Self::RateLimited {
                provider: provider.to_owned(),
            },
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
                Self::Unauthorized {
                    provider: provider.to_owned(),
                    status: code,
                }
            }
            _ => Self::Api {
                provider: provider.to_owned(),
                status: code,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_429_is_rate_limited() {
        let err = LlmError::from_status("groq", reqwest::StatusCode::TOO_MANY_REQUESTS);
        assert!(matches!(err, LlmError::RateLimited { .. }));
        assert_eq!(err.to_string(), "groq rate limited the request");
    }

    #[test]
    fn status_401_and_403_are_unauthorized() {
        for status in [
            reqwest::StatusCode::UNAUTHORIZED,
            reqwest::StatusCode::FORBIDDEN,
        ] {
            let err = LlmError::from_status("cohere", status);
            assert!(matches!(err, LlmError::Unauthorized { .. }));
        }
    }

    #[test]
    fn other_status_is_api_error() {
        let err = LlmError::from_status("groq", reqwest::StatusCode::BAD_GATEWAY);
        assert_eq!(err.to_string(), "groq API request failed (status 502)");
    }
}
