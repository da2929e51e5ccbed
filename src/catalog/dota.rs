use super::*;
use serde::Deserialize;

/// Hero list from the public Dota 2 datafeed
pub struct Dota2HeroSource {
    client: reqwest::Client,
    base_url: String,
}

impl Dota2HeroSource {
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct HeroListResponse {
    result: Option<HeroListResult>,
}

#[derive(Debug, Deserialize)]
struct HeroListResult {
    data: Option<HeroListData>,
}

#[derive(Debug, Deserialize)]
struct HeroListData {
    #[serde(default)]
    heroes: Vec<Hero>,
}

#[async_trait]
impl CatalogSource for Dota2HeroSource {
    async fn fetch(&self) -> CatalogResult<Vec<CatalogItem>> {
        let url = format!("{}/datafeed/herolist?language=english", self.base_url);

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Hero list request failed: {}", e);
                CatalogError::Upstream("Failed to fetch Dota 2 heroes".to_string())
            })?;

        if !response.status().is_success() {
            tracing::error!("Hero datafeed returned status: {}", response.status());
            return Err(CatalogError::Upstream(
                "Failed to fetch Dota 2 heroes".to_string(),
            ));
        }

        let body: HeroListResponse = response
            .json()
            .await
            .map_err(|e| CatalogError::ParseError(e.to_string()))?;

        let heroes = body
            .result
            .and_then(|r| r.data)
            .map(|d| d.heroes)
            .unwrap_or_default();

        Ok(heroes.into_iter().map(CatalogItem::Hero).collect())
    }

    fn name(&self) -> &str {
        "dota2"
    }
}
