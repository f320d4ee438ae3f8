//! Connection-token exchange.
//!
//! Sources that carry `client_id`, `client_secret`, and `connection_id`
//! instead of an access token authenticate through a third-party
//! authorization service: the client credentials are sent as HTTP basic
//! auth together with the connection id, and the service answers with a
//! bearer token for the connected Instagram account.
//!
//! ```text
//! POST {token_exchange_url}
//! Authorization: Basic base64(client_id:client_secret)
//! { "connection_id": "..." }
//!
//! 200 { "access_token": "..." }
//! ```
//!
//! There is no retry. The caller is responsible for dropping the triple
//! once the token is obtained.

use serde::{Deserialize, Serialize};

use crate::error::{HarnessError, Result};
use crate::models::OAuthTriple;

#[derive(Serialize)]
struct ExchangeRequest<'a> {
    connection_id: &'a str,
}

#[derive(Deserialize)]
struct ExchangeResponse {
    access_token: Option<String>,
}

/// Exchange `triple` for an access token at `endpoint`.
pub async fn exchange_connection_token(
    client: &reqwest::Client,
    endpoint: &str,
    triple: &OAuthTriple,
) -> Result<String> {
    tracing::debug!(
        connection_id = %triple.connection_id,
        "Exchanging client credentials for a connection token"
    );

    let resp = client
        .post(endpoint)
        .basic_auth(&triple.client_id, Some(&triple.client_secret))
        .json(&ExchangeRequest {
            connection_id: &triple.connection_id,
        })
        .send()
        .await?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(HarnessError::Auth(format!(
            "HTTP {}: {}",
            status.as_u16(),
            body.chars().take(500).collect::<String>()
        )));
    }

    let body: ExchangeResponse = resp.json().await?;
    match body.access_token {
        Some(token) if !token.is_empty() => Ok(token),
        _ => Err(HarnessError::Auth(
            "response did not contain an access_token".to_string(),
        )),
    }
}
