use std::env;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::error::{Result, ShoppingError};

pub const SEARCH_KEY_VAR: &str = "SERPAPI_KEY";
pub const COMPLETION_KEY_VAR: &str = "OPENAI_API_KEY";

pub const DEFAULT_SEARCH_ENDPOINT: &str = "https://serpapi.com/search";
pub const DEFAULT_COMPLETION_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// The two API keys a session needs before it can answer anything.
///
/// Blank values are treated the same as missing ones.
#[derive(Debug, Default)]
pub struct Credentials {
    search_api_key: Option<SecretString>,
    completion_api_key: Option<SecretString>,
}

impl Credentials {
    pub fn new(search_api_key: Option<String>, completion_api_key: Option<String>) -> Self {
        Self {
            search_api_key: secret_value(search_api_key),
            completion_api_key: secret_value(completion_api_key),
        }
    }

    /// Reads both keys from the process environment (including anything
    /// `dotenv` loaded from `.env`).
    pub fn from_env() -> Self {
        Self::new(env::var(SEARCH_KEY_VAR).ok(), env::var(COMPLETION_KEY_VAR).ok())
    }

    pub fn search_api_key(&self) -> Result<&SecretString> {
        self.search_api_key
            .as_ref()
            .ok_or(ShoppingError::CredentialMissing(SEARCH_KEY_VAR))
    }

    pub fn completion_api_key(&self) -> Result<&SecretString> {
        self.completion_api_key
            .as_ref()
            .ok_or(ShoppingError::CredentialMissing(COMPLETION_KEY_VAR))
    }

    pub fn set_search_api_key(&mut self, value: String) {
        self.search_api_key = secret_value(Some(value));
    }

    pub fn set_completion_api_key(&mut self, value: String) {
        self.completion_api_key = secret_value(Some(value));
    }

    pub fn is_complete(&self) -> bool {
        self.search_api_key.is_some() && self.completion_api_key.is_some()
    }

    /// Names of the environment variables whose keys are still missing.
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.completion_api_key.is_none() {
            missing.push(COMPLETION_KEY_VAR);
        }
        if self.search_api_key.is_none() {
            missing.push(SEARCH_KEY_VAR);
        }
        missing
    }
}

fn secret_value(value: Option<String>) -> Option<SecretString> {
    value
        .map(SecretString::from)
        .filter(|secret| !secret.expose_secret().trim().is_empty())
}

/// Non-secret runtime settings, all sourced from command line flags.
#[derive(Debug, Clone)]
pub struct Settings {
    pub search_endpoint: Url,
    pub completion_endpoint: Url,
    pub timeout: Duration,
}

impl Settings {
    /// Builds the shared HTTP client with the request timeout applied.
    pub fn http_client(&self) -> Result<reqwest::Client> {
        let client = reqwest::Client::builder().timeout(self.timeout).build()?;
        Ok(client)
    }
}
