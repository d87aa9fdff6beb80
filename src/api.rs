// API client module: a small blocking HTTP client that talks to the
// evm-runners server. Every call is synchronous; the CLI does one thing per
// invocation and waits for it.

use crate::config::Config;
use crate::error::CliError;
use anyhow::{Context, Result};
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
/// Listings (solve counts, solved markers) must not hold up the level list.
const LISTING_TIMEOUT: Duration = Duration::from_secs(1);

/// Holds a reqwest blocking client, the server base URL and an optional
/// bearer token for authenticated calls.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

/// Identity returned after the browser login. `id` is kept as a
/// `serde_json::Value` because the server has sent it both as a number and
/// as a string.
#[derive(Serialize, Deserialize, Debug)]
pub struct AuthResponse {
    pub id: serde_json::Value,
    pub name: String,
    pub access_token: String,
}

impl AuthResponse {
    pub fn user_id(&self) -> String {
        match &self.id {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// A submission as stored by the server.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct SubmissionData {
    #[serde(deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(deserialize_with = "lenient_string")]
    pub level_id: String,
    #[serde(deserialize_with = "lenient_string")]
    pub user_id: String,
    pub bytecode: String,
    #[serde(deserialize_with = "lenient_string")]
    pub gas: String,
    #[serde(deserialize_with = "lenient_string")]
    pub size: String,
    pub submitted_at: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub optimized_for: String,
    pub user_name: String,
    pub level_name: String,
    pub rank: Option<u64>,
}

impl SubmissionData {
    pub fn gas_score(&self) -> Option<u64> {
        self.gas.trim().parse().ok()
    }

    pub fn size_score(&self) -> Option<u64> {
        self.size.trim().parse().ok()
    }
}

/// Payload for `POST submissions`.
#[derive(Serialize, Debug)]
pub struct SubmitRequest<'a> {
    pub bytecode: &'a str,
    #[serde(rename = "type")]
    pub kind: &'a str,
    pub user_id: &'a str,
    pub level_id: &'a str,
}

#[derive(Serialize, Debug)]
struct WalletRequest<'a> {
    address: &'a str,
}

/// Which leaderboard to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Gas,
    Size,
}

impl Metric {
    pub fn as_str(self) -> &'static str {
        match self {
            Metric::Gas => "gas",
            Metric::Size => "size",
        }
    }
}

// Scores and ids arrive as JSON numbers or strings depending on the
// endpoint; store them as strings either way.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

impl ApiClient {
    pub fn new(base_url: &str, token: Option<&str>) -> Result<Self> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(ApiClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()).map(str::to_string),
        })
    }

    /// Client configured from the user's config: server URL plus token when
    /// they have authenticated.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.server, Some(config.token.as_str()))
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Page that starts the Discord login in the browser.
    pub fn auth_url(&self) -> String {
        self.url("auth")
    }

    fn with_auth(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(t) => req.bearer_auth(t),
            None => req,
        }
    }

    /// Turn a non-2xx response into `CliError::Http` carrying the body.
    fn check(res: Response) -> Result<Response> {
        let status = res.status();
        tracing::debug!(%status, url = %res.url(), "response");
        if !status.is_success() {
            let body = res.text().unwrap_or_default();
            return Err(CliError::Http { status: status.as_u16(), body }.into());
        }
        Ok(res)
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str, authed: bool) -> Result<T> {
        let url = self.url(path);
        tracing::debug!(%url, "GET");
        let mut req = self.client.get(&url);
        if authed {
            req = self.with_auth(req);
        }
        let res = req.send().with_context(|| format!("Failed to send request to {}", url))?;
        Self::check(res)?
            .json()
            .with_context(|| format!("Failed to parse response from {}", url))
    }

    /// Exchange the PIN shown after the browser login for an identity.
    pub fn exchange_pin(&self, pin: &str) -> Result<AuthResponse> {
        self.get_json(&format!("users/info/{}", pin.trim()), false)
            .context("Failed to authenticate with server")
    }

    /// Link a wallet address to the authenticated account.
    pub fn link_wallet(&self, address: &str) -> Result<()> {
        let url = self.url("users/wallet");
        tracing::debug!(%url, "POST");
        let res = self
            .with_auth(self.client.post(&url))
            .json(&WalletRequest { address })
            .send()
            .context("Failed to send wallet request")?;
        Self::check(res)?;
        Ok(())
    }

    /// The user's submissions, for one level or for all levels.
    pub fn user_submissions(&self, level_id: Option<&str>) -> Result<Vec<SubmissionData>> {
        let path = format!("submissions/user/{}", level_id.unwrap_or_default());
        self.get_json(&path, true)
            .context("Failed to fetch your submissions")
    }

    /// Same as `user_submissions(None)` but bounded by the listing timeout.
    pub fn user_submissions_quick(&self) -> Result<Vec<SubmissionData>> {
        let url = self.url("submissions/user/");
        let res = self
            .with_auth(self.client.get(&url))
            .timeout(LISTING_TIMEOUT)
            .send()?;
        Ok(Self::check(res)?.json()?)
    }

    /// Submit a validated solution. The server answers with the ranked
    /// submission records.
    pub fn submit(&self, req: &SubmitRequest<'_>) -> Result<Vec<SubmissionData>> {
        let url = self.url("submissions");
        tracing::debug!(%url, level_id = req.level_id, kind = req.kind, "POST");
        let res = self
            .with_auth(self.client.post(&url))
            .json(req)
            .send()
            .context("Failed to send submission")?;
        let body = Self::check(res)?.text().context("Failed to read submission response")?;
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&body).context("Failed to parse submission response")
    }

    pub fn leaderboard(&self, metric: Metric, level_id: &str) -> Result<Vec<SubmissionData>> {
        self.get_json(
            &format!("submissions/leaderboard/{}/{}", metric.as_str(), level_id),
            false,
        )
        .with_context(|| format!("Failed to fetch {} leaderboard", metric.as_str()))
    }

    /// Number of players that solved a level, as the raw response body.
    /// Any failure yields an empty string: the count is decoration only.
    pub fn level_solves(&self, level_id: &str) -> String {
        let url = self.url(&format!("levels/{}/total", level_id));
        let res = self
            .client
            .get(&url)
            .timeout(LISTING_TIMEOUT)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.text());
        match res {
            Ok(body) => body.trim().to_string(),
            Err(e) => {
                tracing::debug!(%url, error = %e, "solve count unavailable");
                String::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_join_with_single_slash() {
        let api = ApiClient::new("https://evm-runners.fly.dev/", None).unwrap();
        assert_eq!(api.auth_url(), "https://evm-runners.fly.dev/auth");
        assert_eq!(api.url("/levels/1/total"), "https://evm-runners.fly.dev/levels/1/total");
        assert!(!api.has_token());

        let api = ApiClient::new("http://localhost:3000", Some("tok")).unwrap();
        assert_eq!(api.url("submissions"), "http://localhost:3000/submissions");
        assert!(api.has_token());
    }

    #[test]
    fn empty_token_means_unauthenticated() {
        let api = ApiClient::new("http://localhost", Some("")).unwrap();
        assert!(!api.has_token());
    }

    #[test]
    fn submissions_accept_numbers_and_strings() {
        let raw = r#"[
            {"id": 3, "level_id": 1, "user_id": "9", "gas": "1000", "size": 20,
             "submitted_at": "2023-06-01T10:00:00.000Z", "type": "huff",
             "optimized_for": "gas", "user_name": "kyre", "level_name": "Average", "rank": 2},
            {"id": "4", "gas": null}
        ]"#;
        let subs: Vec<SubmissionData> = serde_json::from_str(raw).unwrap();
        assert_eq!(subs[0].id, "3");
        assert_eq!(subs[0].gas_score(), Some(1000));
        assert_eq!(subs[0].size_score(), Some(20));
        assert_eq!(subs[0].kind, "huff");
        assert_eq!(subs[0].rank, Some(2));
        assert_eq!(subs[1].gas_score(), None);
        assert_eq!(subs[1].rank, None);
    }

    #[test]
    fn auth_response_id_as_string() {
        let resp: AuthResponse =
            serde_json::from_str(r#"{"id": 12, "name": "beskay", "access_token": "t"}"#).unwrap();
        assert_eq!(resp.user_id(), "12");
        let resp: AuthResponse =
            serde_json::from_str(r#"{"id": "ab", "name": "b", "access_token": "t"}"#).unwrap();
        assert_eq!(resp.user_id(), "ab");
    }

    #[test]
    fn submit_payload_shape() {
        let req = SubmitRequest { bytecode: "0x00", kind: "sol", user_id: "1", level_id: "2" };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"bytecode": "0x00", "type": "sol", "user_id": "1", "level_id": "2"})
        );
    }

    #[test]
    fn unreachable_server_gives_empty_solve_count() {
        let api = ApiClient::new("http://127.0.0.1:9", None).unwrap();
        assert_eq!(api.level_solves("1"), "");
    }
}
