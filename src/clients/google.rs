use anyhow::Result;
use reqwest::Client;
use serde::Deserialize;

use crate::config::GoogleOAuthConfig;

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

/// Tokens returned by the authorization-code exchange.
#[derive(Debug, Clone)]
pub struct TokenSet {
    pub access_token: String,
    pub id_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    id_token: Option<String>,
}

/// Profile fields from the identity provider's userinfo endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleProfile {
    pub id: Option<String>,
    pub email: Option<String>,
    pub verified_email: Option<bool>,
    pub name: Option<String>,
    pub picture: Option<String>,
}

#[derive(Clone)]
pub struct GoogleOAuthClient {
    client: Client,
    config: GoogleOAuthConfig,
}

impl GoogleOAuthClient {
    #[must_use]
    pub fn new(config: GoogleOAuthConfig) -> Self {
        Self::with_shared_client(Client::new(), config)
    }

    #[must_use]
    pub const fn with_shared_client(client: Client, config: GoogleOAuthConfig) -> Self {
        Self { client, config }
    }

    /// The provider's authorization URL the login page sends the browser to.
    #[must_use]
    pub fn authorization_url(&self) -> String {
        format!(
            "{}?response_type=code&client_id={}&redirect_uri={}&scope=openid%20profile%20email&access_type=offline",
            AUTH_URL,
            urlencoding::encode(&self.config.client_id),
            urlencoding::encode(&self.config.redirect_uri),
        )
    }

    /// Exchange an authorization code for tokens via a server-to-server call.
    /// A non-success status or a missing `access_token` is an error; the
    /// caller must not mutate session state in that case.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenSet> {
        let params = [
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ];

        let response = self.client.post(TOKEN_URL).form(&params).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!(
                "Token exchange failed: {} - {}",
                status,
                body
            ));
        }

        let token: TokenResponse = response.json().await?;
        let access_token = token
            .access_token
            .ok_or_else(|| anyhow::anyhow!("Token exchange response had no access_token"))?;

        Ok(TokenSet {
            access_token,
            id_token: token.id_token,
        })
    }

    /// Fetch the external profile using the access token.
    pub async fn fetch_profile(&self, access_token: &str) -> Result<GoogleProfile> {
        let response = self
            .client
            .get(USERINFO_URL)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!(
                "Userinfo request failed: {} - {}",
                status,
                body
            ));
        }

        Ok(response.json().await?)
    }
}
