use super::*;
use serde::Deserialize;

const WHITELIST_HINT: &str = ". This usually means your IP address is not whitelisted. \
    Go to developer.clashroyale.com → My Account → API Keys and add your server's IP \
    address to 'Allowed IP Addresses'.";

/// Card list from the official Clash Royale API
pub struct ClashRoyaleSource {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl ClashRoyaleSource {
    pub fn new(client: reqwest::Client, base_url: String, api_key: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CardListResponse {
    #[serde(default)]
    items: Vec<ClashRoyaleCard>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    reason: Option<String>,
    message: Option<String>,
}

/// Build a readable error from a failed API response
fn describe_failure(status: reqwest::StatusCode, body: &str) -> String {
    let mut message = format!("Clash Royale API error: {}", status.as_u16());

    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(details) => {
            if let Some(reason) = details.reason {
                message.push_str(&format!(" - {}", reason));
            }
            if let Some(detail) = details.message {
                message.push_str(&format!(" - {}", detail));
            }
        }
        Err(_) if !body.trim().is_empty() => message.push_str(&format!(" - {}", body.trim())),
        Err(_) => {}
    }

    if status == reqwest::StatusCode::FORBIDDEN {
        message.push_str(WHITELIST_HINT);
    }
    message
}

#[async_trait]
impl CatalogSource for ClashRoyaleSource {
    async fn fetch(&self) -> CatalogResult<Vec<CatalogItem>> {
        let url = format!("{}/v1/cards", self.base_url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| CatalogError::Upstream(format!("Clash Royale API unreachable: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = describe_failure(status, &body);
            tracing::error!("Clash Royale API Error: {}", message);
            return Err(CatalogError::Upstream(message));
        }

        let body: CardListResponse = response
            .json()
            .await
            .map_err(|e| CatalogError::ParseError(e.to_string()))?;

        Ok(body.items.into_iter().map(CatalogItem::Card).collect())
    }

    fn name(&self) -> &str {
        "clashroyale"
    }
}
