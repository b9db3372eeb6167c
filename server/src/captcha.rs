//! # Turnstile
//!
//! Cloudflare human-verification proxy. The widget on the frontend
//! issues a one-time token; we confirm it server-side before writing
//! anything. Verification is a single form POST bounded by the shared
//! client's 5 second timeout: an unreachable verifier is a failure, not
//! a retry.
use reqwest::Client;
use serde::Deserialize;

use crate::{config::Config, error::AppError};

const VERIFY_URL: &str = "https://challenges.cloudflare.com/turnstile/v0/siteverify";

#[derive(Deserialize)]
struct VerifyResponse {
    success: bool,
}

pub async fn verify_turnstile(
    config: &Config,
    http: &Client,
    token: &str,
    client_ip: &str,
) -> Result<(), AppError> {
    if config.captcha_test_bypass {
        return Ok(());
    }

    if token.is_empty() {
        return Err(AppError::CaptchaMissing);
    }

    let form = [
        ("secret", config.turnstile_secret.as_str()),
        ("response", token),
        ("remoteip", client_ip),
    ];

    let response = http
        .post(VERIFY_URL)
        .form(&form)
        .send()
        .await
        .map_err(|_| AppError::CaptchaUnavailable)?;

    let verdict: VerifyResponse = response
        .json()
        .await
        .map_err(|_| AppError::CaptchaUnavailable)?;

    if !verdict.success {
        return Err(AppError::CaptchaRejected);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use reqwest::Client;

    use super::verify_turnstile;
    use crate::{config::Config, error::AppError};

    fn test_config(bypass: bool) -> Config {
        Config {
            port: 0,
            database_url: String::new(),
            turnstile_secret: "secret".to_string(),
            cors_origins: vec!["*".to_string()],
            captcha_test_bypass: bypass,
        }
    }

    #[tokio::test]
    async fn test_bypass_skips_verification() {
        let config = test_config(true);

        let result = verify_turnstile(&config, &Client::new(), "", "1.2.3.4").await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_empty_token_rejected_before_any_call() {
        let config = test_config(false);

        let result = verify_turnstile(&config, &Client::new(), "", "1.2.3.4").await;

        assert!(matches!(result, Err(AppError::CaptchaMissing)));
    }
}
