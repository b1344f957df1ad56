use thiserror::Error;

#[derive(Debug, Error)]
#[error("{0}")]
pub struct CliError(pub String);

impl From<String> for CliError {
    fn from(s: String) -> Self {
        CliError(s)
    }
}

impl From<&str> for CliError {
    fn from(s: &str) -> Self {
        CliError(s.to_string())
    }
}

impl From<reqwest::Error> for CliError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() {
            CliError(format!("Could not reach the gateway: {e}"))
        } else {
            CliError(format!("HTTP error: {e}"))
        }
    }
}

impl From<url::ParseError> for CliError {
    fn from(e: url::ParseError) -> Self {
        CliError(format!("Invalid gateway URL: {e}"))
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError(format!("JSON error: {e}"))
    }
}

pub type CliResult<T> = Result<T, CliError>;
