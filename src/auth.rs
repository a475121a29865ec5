//! HTTP token acquisition.
//!
//! Every provider exposes a plain `GET /auth` endpoint that authorizes
//! either via an `api_key` query parameter or HTTP Basic auth, and returns
//! the websocket token as the raw response body. Tokens are valid for 24
//! hours; [`crate::models::Session::is_stale`] drives the supervisor's
//! re-auth schedule.

use crate::config::Config;
use crate::error::{IntrinioError, Result};
use crate::models::{Provider, Session};

pub(crate) const CLIENT_INFORMATION: &str = "IntrinioRustSDKv1.0.0";

fn auth_base_url(provider: Provider, manual_ip_address: Option<&str>) -> Result<String> {
  Ok(match provider {
    Provider::Realtime => "https://realtime-mx.intrinio.com/auth".to_string(),
    Provider::DelayedSip => "https://realtime-delayed-sip.intrinio.com/auth".to_string(),
    Provider::NasdaqBasic => "https://realtime-nasdaq-basic.intrinio.com/auth".to_string(),
    Provider::CboeOne => "https://cboe-one.intrinio.com/auth".to_string(),
    Provider::Opra => "https://realtime-options.intrinio.com/auth".to_string(),
    Provider::Manual => {
      let ip = manual_ip_address.ok_or_else(|| {
        IntrinioError::Configuration("manual_ip_address is required for Provider::Manual".into())
      })?;
      format!("http://{ip}/auth")
    }
  })
}

/// The websocket host (without scheme) used to build the connection URL,
/// mirrored 1:1 with [`auth_base_url`]'s provider dispatch.
pub(crate) fn websocket_url(config: &Config, token: &str) -> String {
  let delayed = if config.delayed { "&delayed=true" } else { "" };
  let base = match config.provider {
    Provider::Realtime => "wss://realtime-mx.intrinio.com/socket/websocket".to_string(),
    Provider::DelayedSip => "wss://realtime-delayed-sip.intrinio.com/socket/websocket".to_string(),
    Provider::NasdaqBasic => {
      "wss://realtime-nasdaq-basic.intrinio.com/socket/websocket".to_string()
    }
    Provider::CboeOne => "wss://cboe-one.intrinio.com/socket/websocket".to_string(),
    Provider::Opra => "wss://realtime-options.intrinio.com/socket/websocket".to_string(),
    Provider::Manual => format!(
      "ws://{}/socket/websocket",
      config.manual_ip_address.as_deref().unwrap_or_default()
    ),
  };
  format!("{base}?vsn=1.0.0&token={token}{delayed}")
}

/// Requests a fresh token from the provider's auth endpoint and wraps it in
/// a new [`Session`].
pub async fn authenticate(http: &reqwest::Client, config: &Config) -> Result<Session> {
  let mut url = auth_base_url(config.provider, config.manual_ip_address.as_deref())?;
  let mut request = if let Some(api_key) = &config.api_key {
    let sep = if url.contains('?') { "&" } else { "?" };
    url = format!("{url}{sep}api_key={api_key}");
    http.get(&url)
  } else {
    let username = config.username.clone().unwrap_or_default();
    let password = config.password.clone().unwrap_or_default();
    http.get(&url).basic_auth(username, Some(password))
  };
  request = request.header("Client-Information", CLIENT_INFORMATION);

  log::debug!("authenticating against {url}");
  let response = request.timeout(config.auth_timeout).send().await?;
  let status = response.status();
  let body = response.text().await.unwrap_or_default();

  if !status.is_success() {
    return Err(IntrinioError::Auth { status, body });
  }

  log::info!("authentication successful");
  Ok(Session::new(body))
}
