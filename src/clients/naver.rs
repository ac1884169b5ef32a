use anyhow::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::NaverConfig;

const BLOG_SEARCH_URL: &str = "https://openapi.naver.com/v1/search/blog";
const LOCAL_SEARCH_URL: &str = "https://openapi.naver.com/v1/search/local.json";
const DATALAB_URL: &str = "https://openapi.naver.com/v1/datalab/search";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlogSearchResponse {
    pub total: i64,
    pub start: i32,
    pub display: i32,
    pub items: Vec<BlogItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlogItem {
    pub title: String,
    pub link: String,
    pub description: String,
    #[serde(default)]
    pub bloggername: String,
    #[serde(default)]
    pub bloggerlink: String,
    #[serde(default)]
    pub postdate: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalSearchResponse {
    pub total: i64,
    pub start: i32,
    pub display: i32,
    pub items: Vec<LocalItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalItem {
    pub title: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub telephone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default, rename = "roadAddress")]
    pub road_address: String,
}

/// Request body for the Datalab keyword-trend endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatalabRequest {
    pub start_date: String,
    pub end_date: String,
    pub time_unit: String,
    pub keyword_groups: Vec<KeywordGroup>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ages: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordGroup {
    pub group_name: String,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatalabResponse {
    pub start_date: String,
    pub end_date: String,
    pub time_unit: String,
    pub results: Vec<DatalabResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatalabResult {
    pub title: String,
    pub keywords: Vec<String>,
    pub data: Vec<DatalabPoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatalabPoint {
    pub period: String,
    pub ratio: f64,
}

/// Stateless pass-through client for the Naver open API. Credentials ride in
/// request headers; failures are surfaced to the caller without retries.
#[derive(Clone)]
pub struct NaverClient {
    client: Client,
    config: NaverConfig,
}

impl NaverClient {
    #[must_use]
    pub fn new(config: NaverConfig) -> Self {
        Self::with_shared_client(Client::new(), config)
    }

    #[must_use]
    pub const fn with_shared_client(client: Client, config: NaverConfig) -> Self {
        Self { client, config }
    }

    fn search_request(
        &self,
        url: &str,
        query: &str,
        display: u8,
        sort: &str,
    ) -> reqwest::RequestBuilder {
        self.client
            .get(url)
            .header("X-Naver-Client-Id", &self.config.client_id)
            .header("X-Naver-Client-Secret", &self.config.client_secret)
            .query(&[
                ("query", query),
                ("display", &display.to_string()),
                ("sort", sort),
            ])
    }

    pub async fn search_blog(
        &self,
        query: &str,
        display: u8,
        sort: &str,
    ) -> Result<BlogSearchResponse> {
        let response = self
            .search_request(BLOG_SEARCH_URL, query, display, sort)
            .send()
            .await?;

        Self::check_and_parse(response, "blog search").await
    }

    pub async fn search_local(
        &self,
        query: &str,
        display: u8,
        sort: &str,
    ) -> Result<LocalSearchResponse> {
        let response = self
            .search_request(LOCAL_SEARCH_URL, query, display, sort)
            .send()
            .await?;

        Self::check_and_parse(response, "local search").await
    }

    pub async fn search_datalab(&self, request: &DatalabRequest) -> Result<DatalabResponse> {
        let response = self
            .client
            .post(DATALAB_URL)
            .header("X-Naver-Client-Id", &self.config.client_id)
            .header("X-Naver-Client-Secret", &self.config.client_secret)
            .json(request)
            .send()
            .await?;

        Self::check_and_parse(response, "datalab").await
    }

    async fn check_and_parse<T: for<'de> Deserialize<'de>>(
        response: reqwest::Response,
        endpoint: &str,
    ) -> Result<T> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!(
                "Naver {} error: {} - {}",
                endpoint,
                status,
                body
            ));
        }

        Ok(response.json().await?)
    }
}
