//! Hero/card catalogs that feed random selection into the game actions.
//!
//! Each catalog is a [`CatalogSource`]. Remote sources are wrapped in a
//! [`CachedSource`] so a room start does not hit the upstream API every time.

mod cache;
mod clash;
mod dota;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{env_parse, env_string};
use crate::types::{ClashRoyaleCard, GameHint, GameType, Hero};

pub use cache::CachedSource;
pub use clash::ClashRoyaleSource;
pub use dota::Dota2HeroSource;

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors that can occur while loading a catalog
#[derive(Debug, Clone, thiserror::Error)]
pub enum CatalogError {
    #[error("{0}")]
    Upstream(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("{0}")]
    NotConfigured(String),

    #[error("Response parsing failed: {0}")]
    ParseError(String),

    #[error("{0}")]
    Empty(String),
}

const HERO_IMAGE_BASE: &str =
    "https://cdn.cloudflare.steamstatic.com/apps/dota2/images/dota_react/heroes";

/// One selectable secret item
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogItem {
    Hero(Hero),
    Card(ClashRoyaleCard),
}

impl CatalogItem {
    /// Unique key, used to keep heads-up assignments distinct
    pub fn key(&self) -> String {
        match self {
            CatalogItem::Hero(hero) => format!("hero:{}", hero.id),
            CatalogItem::Card(card) => format!("card:{}", card.id),
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            CatalogItem::Hero(hero) => &hero.name_english_loc,
            CatalogItem::Card(card) => &card.name,
        }
    }

    pub fn image_url(&self) -> Option<String> {
        match self {
            CatalogItem::Hero(hero) => Some(hero_image_url(hero)),
            CatalogItem::Card(card) => {
                (!card.icon_urls.medium.is_empty()).then(|| card.icon_urls.medium.clone())
            }
        }
    }

    /// Hints shown to the imposter when hints are enabled
    pub fn hints(&self) -> Vec<GameHint> {
        match self {
            CatalogItem::Hero(hero) => {
                let attribute = match hero.primary_attr {
                    0 => "Strength",
                    1 => "Agility",
                    2 => "Intelligence",
                    3 => "Universal",
                    _ => "Unknown",
                };
                vec![
                    GameHint::new("Primary Attribute", attribute),
                    GameHint::new("Complexity", format!("{}/3", hero.complexity)),
                ]
            }
            CatalogItem::Card(card) => {
                let mut hints = vec![
                    GameHint::new("Elixir Cost", card.elixir_cost.to_string()),
                    GameHint::new("Max Level", card.max_level.to_string()),
                ];
                if let Some(rarity) = &card.rarity {
                    hints.push(GameHint::new("Rarity", rarity.clone()));
                }
                hints
            }
        }
    }
}

/// CDN portrait for a hero (npc_dota_hero_antimage -> antimage.png)
pub fn hero_image_url(hero: &Hero) -> String {
    let short_name = hero
        .name
        .strip_prefix("npc_dota_hero_")
        .unwrap_or(&hero.name);
    format!("{}/{}.png", HERO_IMAGE_BASE, short_name)
}

/// Trait that all catalog sources implement
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Load the full list of items
    async fn fetch(&self) -> CatalogResult<Vec<CatalogItem>>;

    /// Name of this source, for logging
    fn name(&self) -> &str;
}

/// Fixed in-memory catalog
pub struct StaticSource {
    name: String,
    items: Vec<CatalogItem>,
}

impl StaticSource {
    pub fn new(name: &str, items: Vec<CatalogItem>) -> Self {
        Self {
            name: name.to_string(),
            items,
        }
    }
}

#[async_trait]
impl CatalogSource for StaticSource {
    async fn fetch(&self) -> CatalogResult<Vec<CatalogItem>> {
        Ok(self.items.clone())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// The catalogs available to the game, one per [`GameType`]
#[derive(Clone, Default)]
pub struct Catalogs {
    pub dota2: Option<Arc<dyn CatalogSource>>,
    pub clash_royale: Option<Arc<dyn CatalogSource>>,
}

impl Catalogs {
    pub fn new(
        dota2: Option<Arc<dyn CatalogSource>>,
        clash_royale: Option<Arc<dyn CatalogSource>>,
    ) -> Self {
        Self {
            dota2,
            clash_royale,
        }
    }

    fn source(&self, game_type: GameType) -> CatalogResult<&Arc<dyn CatalogSource>> {
        match game_type {
            GameType::Dota2 => self.dota2.as_ref().ok_or_else(|| {
                CatalogError::NotConfigured("Dota 2 hero catalog not configured".to_string())
            }),
            GameType::ClashRoyale => self.clash_royale.as_ref().ok_or_else(|| {
                CatalogError::NotConfigured("Clash Royale API key not configured".to_string())
            }),
        }
    }

    /// Load the items for a game type, failing if the catalog is empty
    pub async fn items(&self, game_type: GameType) -> CatalogResult<Vec<CatalogItem>> {
        let source = self.source(game_type)?;
        let items = source.fetch().await?;
        if items.is_empty() {
            return Err(CatalogError::Empty(match game_type {
                GameType::Dota2 => "No heroes available".to_string(),
                GameType::ClashRoyale => {
                    "No cards available. Check your Clash Royale API key.".to_string()
                }
            }));
        }
        tracing::debug!(source = source.name(), count = items.len(), "Catalog loaded");
        Ok(items)
    }

    pub async fn heroes(&self) -> CatalogResult<Vec<Hero>> {
        let items = self.source(GameType::Dota2)?.fetch().await?;
        Ok(items
            .into_iter()
            .filter_map(|item| match item {
                CatalogItem::Hero(hero) => Some(hero),
                CatalogItem::Card(_) => None,
            })
            .collect())
    }

    pub async fn cards(&self) -> CatalogResult<Vec<ClashRoyaleCard>> {
        let items = self.source(GameType::ClashRoyale)?.fetch().await?;
        Ok(items
            .into_iter()
            .filter_map(|item| match item {
                CatalogItem::Card(card) => Some(card),
                CatalogItem::Hero(_) => None,
            })
            .collect())
    }

    /// Fill the caches of every configured catalog concurrently
    pub async fn warm_up(&self) {
        let sources: Vec<_> = [&self.dota2, &self.clash_royale]
            .into_iter()
            .flatten()
            .cloned()
            .collect();

        let results = futures::future::join_all(sources.iter().map(|s| s.fetch())).await;
        for (source, result) in sources.iter().zip(results) {
            match result {
                Ok(items) => tracing::info!("Catalog {} ready ({} items)", source.name(), items.len()),
                Err(e) => tracing::warn!("Catalog {} unavailable: {}", source.name(), e),
            }
        }
    }
}

/// Configuration for catalog sources
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub dota2_base_url: String,
    pub clash_royale_base_url: String,
    /// Clash Royale API key (None = catalog disabled)
    pub clash_royale_api_key: Option<String>,
    pub cache_ttl: Duration,
    pub request_timeout: Duration,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            dota2_base_url: "https://www.dota2.com".to_string(),
            clash_royale_base_url: "https://api.clashroyale.com".to_string(),
            clash_royale_api_key: None,
            cache_ttl: Duration::from_secs(3600),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl CatalogConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let clash_royale_api_key = env_string("CLASH_ROYALE_API_KEY");
        if clash_royale_api_key.is_none() {
            tracing::warn!("CLASH_ROYALE_API_KEY not set, Clash Royale games are disabled");
        }

        Self {
            dota2_base_url: env_string("DOTA2_API_BASE").unwrap_or(defaults.dota2_base_url),
            clash_royale_base_url: env_string("CLASH_ROYALE_API_BASE")
                .unwrap_or(defaults.clash_royale_base_url),
            clash_royale_api_key,
            cache_ttl: env_parse("CATALOG_CACHE_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.cache_ttl),
            request_timeout: defaults.request_timeout,
        }
    }

    /// Build the cached remote catalogs
    pub fn build_catalogs(&self) -> CatalogResult<Catalogs> {
        let client = reqwest::Client::builder()
            .timeout(self.request_timeout)
            .build()
            .map_err(|e| CatalogError::NotConfigured(format!("HTTP client: {}", e)))?;

        let dota2: Arc<dyn CatalogSource> = Arc::new(CachedSource::new(
            Dota2HeroSource::new(client.clone(), self.dota2_base_url.clone()),
            self.cache_ttl,
        ));

        let clash_royale = self.clash_royale_api_key.as_ref().map(|key| {
            Arc::new(CachedSource::new(
                ClashRoyaleSource::new(client.clone(), self.clash_royale_base_url.clone(), key.clone()),
                self.cache_ttl,
            )) as Arc<dyn CatalogSource>
        });

        Ok(Catalogs::new(Some(dota2), clash_royale))
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::types::CardIcons;

    pub fn hero(id: u32, short_name: &str, primary_attr: u8) -> Hero {
        Hero {
            id,
            name: format!("npc_dota_hero_{}", short_name),
            name_loc: short_name.to_string(),
            name_english_loc: short_name.to_string(),
            primary_attr,
            complexity: 2,
        }
    }

    pub fn card(id: u64, name: &str) -> ClashRoyaleCard {
        ClashRoyaleCard {
            name: name.to_string(),
            id,
            max_level: 14,
            max_evolution_level: None,
            elixir_cost: 4,
            rarity: Some("rare".to_string()),
            icon_urls: CardIcons {
                medium: format!("https://cdn.example/{}.png", id),
                ..Default::default()
            },
        }
    }

    pub fn heroes(n: u32) -> Vec<CatalogItem> {
        (1..=n)
            .map(|i| CatalogItem::Hero(hero(i, &format!("hero{}", i), (i % 4) as u8)))
            .collect()
    }

    pub fn cards(n: u64) -> Vec<CatalogItem> {
        (1..=n)
            .map(|i| CatalogItem::Card(card(26_000_000 + i, &format!("Card {}", i))))
            .collect()
    }

    pub fn static_catalogs(heroes: u32, cards: u64) -> Catalogs {
        Catalogs::new(
            Some(Arc::new(StaticSource::new("static-heroes", self::heroes(heroes)))),
            Some(Arc::new(StaticSource::new("static-cards", self::cards(cards)))),
        )
    }
}
