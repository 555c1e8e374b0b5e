use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

const API_URL: &str = "https://www.gamerpower.com/api/giveaways";

/// Tag the API uses for full-game giveaways, matched exactly.
pub const GAME_TYPE: &str = "Game";

/// One giveaway listing as returned by the GamerPower API. The API
/// sometimes omits fields, so everything is optional; unknown fields
/// are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct Giveaway {
    pub id: Option<u64>,
    pub title: Option<String>,
    pub platforms: Option<String>,
    pub worth: Option<String>,
    pub description: Option<String>,
    pub end_date: Option<String>,
    pub image: Option<String>,
    pub open_giveaway: Option<String>,
    #[serde(rename = "type")]
    pub giveaway_type: Option<String>,
}

impl Giveaway {
    pub fn is_game(&self) -> bool {
        self.giveaway_type.as_deref() == Some(GAME_TYPE)
    }
}

/// Source of the current giveaway listing.
#[async_trait]
pub trait GiveawaySource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<Giveaway>>;
}

pub struct GamerPowerClient {
    client: reqwest::Client,
    base_url: String,
}

impl GamerPowerClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: API_URL.to_string(),
        }
    }
}

#[async_trait]
impl GiveawaySource for GamerPowerClient {
    /// One GET for game-type giveaways. Any transport or parse
    /// failure surfaces as an error; the dispatch loop degrades it to
    /// an empty cycle and the next poll is the retry.
    async fn fetch(&self) -> Result<Vec<Giveaway>> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("type", "game")])
            .send()
            .await
            .context("Failed to reach the giveaway API")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Giveaway API returned {}", status);
        }

        response
            .json()
            .await
            .context("Failed to parse the giveaway listing")
    }
}
