use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::{header::HeaderMap, Client, Url};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub wallet_address: String,
    #[serde(default)]
    pub referral_code: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Referral {
    pub referrer_wallet: String,
    pub referred_wallet: String,
}

/// External user/referral store. Everything here is best-effort: failures
/// are logged and come back as `None`.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn save_user(&self, wallet: &str) -> Option<UserProfile>;
    async fn record_referral(&self, referrer: &str, referred: &str) -> Option<Referral>;
    async fn referral_code(&self, wallet: &str) -> Option<String>;
}

/// Builds the link a wallet shares to refer others.
pub fn referral_link(base_url: &str, wallet: &str) -> Result<String> {
    let mut url = Url::parse(base_url).context("parsing referral base url")?;
    url.query_pairs_mut().append_pair("ref", wallet);
    Ok(url.to_string())
}

/// Profile store behind a PostgREST endpoint (`users` and `referrals` tables).
pub struct RestProfileStore {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl RestProfileStore {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        let base_url = Url::parse(base_url).context("parsing profile store url")?;
        Ok(Self {
            client: Client::new(),
            base_url,
            api_key: api_key.to_string(),
        })
    }

    fn table_url(&self, table: &str) -> Result<Url> {
        self.base_url
            .join(&format!("rest/v1/{}", table))
            .context("building table url")
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert("apikey", self.api_key.parse()?);
        headers.insert("Authorization", format!("Bearer {}", self.api_key).parse()?);
        Ok(headers)
    }

    async fn insert<T>(&self, table: &str, row: serde_json::Value) -> Result<Option<T>>
    where
        T: for<'de> Deserialize<'de>,
    {
        let response = self
            .client
            .post(self.table_url(table)?)
            .headers(self.headers()?)
            .header("Prefer", "return=representation")
            .json(&json!([row]))
            .send()
            .await
            .with_context(|| format!("inserting into {}", table))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("insert into {} failed: {} {}", table, status, body);
        }
        let mut rows: Vec<T> = response.json().await.context("decoding inserted rows")?;
        Ok(if rows.is_empty() { None } else { Some(rows.remove(0)) })
    }

    async fn fetch_referral_code(&self, wallet: &str) -> Result<Option<String>> {
        let mut url = self.table_url("users")?;
        url.query_pairs_mut()
            .append_pair("select", "referral_code")
            .append_pair("wallet_address", &format!("eq.{}", wallet));

        let response = self
            .client
            .get(url)
            .headers(self.headers()?)
            .send()
            .await
            .context("fetching referral code")?;
        if !response.status().is_success() {
            bail!("fetching referral code failed: {}", response.status());
        }
        let rows: Vec<UserProfile> = response.json().await.context("decoding users")?;
        match rows.as_slice() {
            [row] => Ok(row.referral_code.clone()),
            rows => bail!("expected a single user for {}, got {}", wallet, rows.len()),
        }
    }
}

#[async_trait]
impl ProfileStore for RestProfileStore {
    async fn save_user(&self, wallet: &str) -> Option<UserProfile> {
        if wallet.is_empty() {
            return None;
        }
        match self
            .insert::<UserProfile>("users", json!({ "wallet_address": wallet }))
            .await
        {
            Ok(user) => {
                info!("Saved user {}", wallet);
                user
            }
            Err(err) => {
                error!("Error saving user: {:#}", err);
                None
            }
        }
    }

    async fn record_referral(&self, referrer: &str, referred: &str) -> Option<Referral> {
        if referrer.is_empty() || referred.is_empty() {
            return None;
        }
        let row = json!({ "referrer_wallet": referrer, "referred_wallet": referred });
        match self.insert::<Referral>("referrals", row).await {
            Ok(referral) => {
                info!("Recorded referral {} -> {}", referrer, referred);
                referral
            }
            Err(err) => {
                error!("Error recording referral: {:#}", err);
                None
            }
        }
    }

    async fn referral_code(&self, wallet: &str) -> Option<String> {
        match self.fetch_referral_code(wallet).await {
            Ok(code) => code,
            Err(err) => {
                error!("Error fetching referral code: {:#}", err);
                None
            }
        }
    }
}
