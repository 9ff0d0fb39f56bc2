//! `GET /api/ratings/me`: the player's rating after a match.

use crate::error::ClientError;
use serde::{Deserialize, Serialize};
use tokio_retry::{
    strategy::{jitter, ExponentialBackoff},
    Retry,
};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Rating {
    pub rating: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wins: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub losses: Option<u32>,
}

pub fn ratings_url(api_url: &str) -> String {
    format!("{}/api/ratings/me", api_url.trim_end_matches('/'))
}

/// Fetches the rating, retrying twice on failure.
pub async fn fetch_my_rating(
    client: &reqwest::Client,
    api_url: &str,
    token: &str,
) -> Result<Rating, ClientError> {
    let url = ratings_url(api_url);
    let url = url.as_str();
    let strategy = ExponentialBackoff::from_millis(100).map(jitter).take(2);

    let rating = Retry::start(strategy, move || async move {
        client
            .get(url)
            .header("x-auth-token", token)
            .send()
            .await?
            .error_for_status()?
            .json::<Rating>()
            .await
    })
    .await?;
    Ok(rating)
}

/// Post-game lookup: a failed fetch is logged and yields `None`.
pub async fn rating_after_game(client: &reqwest::Client, api_url: &str, token: &str) -> Option<Rating> {
    match fetch_my_rating(client, api_url, token).await {
        Ok(rating) => Some(rating),
        Err(e) => {
            log::error!("Failed to fetch post-game rating: {e}");
            None
        }
    }
}
