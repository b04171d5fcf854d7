//! Read-only TMDB gateway.
//!
//! Every call is a direct pass-through: no retries, no caching, no rate
//! limiting. Transport failures surface as `Error::Transport`, non-2xx
//! answers as `Error::Catalog`.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::models::MediaType;
use crate::requests::{RequestKey, RequestSlots};

/// Videos are only reliably listed in English.
const VIDEO_LANGUAGE: &str = "en-US";

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum SearchTarget {
    Movie,
    Series,
    Multi,
}

impl SearchTarget {
    pub fn as_path(&self) -> &'static str {
        match self {
            SearchTarget::Movie => "movie",
            SearchTarget::Series => "tv",
            SearchTarget::Multi => "multi",
        }
    }
}

impl From<MediaType> for SearchTarget {
    fn from(media_type: MediaType) -> Self {
        match media_type {
            MediaType::Movie => SearchTarget::Movie,
            MediaType::Series => SearchTarget::Series,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Page<T> {
    pub page: u32,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u32,
}

/// One entry of a discover or search page.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MediaSummary {
    pub id: u64,
    pub title: Option<String>, // movies
    pub name: Option<String>,  // series
    #[serde(default)]
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub vote_average: f32,
    pub release_date: Option<String>,
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub genre_ids: Vec<u32>,
    pub media_type: Option<String>, // only on multi search
}

impl MediaSummary {
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or_default()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Genre {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MediaDetails {
    pub id: u64,
    pub title: Option<String>,
    pub name: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    pub tagline: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub vote_average: f32,
    pub release_date: Option<String>,
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub genres: Vec<Genre>,
    pub runtime: Option<u32>,
    #[serde(default)]
    pub episode_run_time: Vec<u32>,
}

impl MediaDetails {
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or_default()
    }

    /// Movie runtime, or the first listed episode length for series.
    pub fn runtime_minutes(&self) -> Option<u32> {
        self.runtime
            .filter(|m| *m > 0)
            .or_else(|| self.episode_run_time.first().copied())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Video {
    #[serde(rename = "type")]
    pub kind: String,
    pub site: String,
    pub key: String,
    pub name: Option<String>,
}

#[derive(Deserialize)]
struct VideoList {
    #[serde(default)]
    results: Vec<Video>,
}

#[derive(Deserialize)]
struct GenreList {
    #[serde(default)]
    genres: Vec<Genre>,
}

/// First YouTube trailer in server order.
pub fn select_trailer(videos: &[Video]) -> Option<&Video> {
    videos
        .iter()
        .find(|v| v.kind == "Trailer" && v.site == "YouTube")
}

#[derive(Clone)]
pub struct CatalogClient {
    client: Client,
    base_url: String,
    image_base_url: String,
    api_key: String,
    language: String,
    slots: Arc<RequestSlots<RequestKey>>,
}

impl CatalogClient {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        image_base_url: impl Into<String>,
        api_key: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            image_base_url: image_base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            language: language.into(),
            slots: Arc::new(RequestSlots::new()),
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let client = Client::builder()
            .tcp_nodelay(true)
            .user_agent("Cinelog/1.0")
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self::new(
            client,
            &config.tmdb_base_url,
            &config.tmdb_image_base_url,
            &config.tmdb_api_key,
            &config.language,
        ))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        language: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!(path, "catalog request");

        let resp = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .query(&[("api_key", self.api_key.as_str()), ("language", language)])
            .query(params)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Catalog { status, body });
        }

        Ok(resp.json::<T>().await?)
    }

    pub async fn discover(
        &self,
        media_type: MediaType,
        page: u32,
        genre_id: Option<u32>,
    ) -> Result<Page<MediaSummary>> {
        let mut params = vec![("page", page.to_string())];
        if let Some(genre) = genre_id {
            params.push(("with_genres", genre.to_string()));
        }
        let path = format!("/discover/{}", media_type.as_path());
        self.get_json(&path, &self.language, &params).await
    }

    pub async fn search(
        &self,
        target: SearchTarget,
        query: &str,
        page: u32,
    ) -> Result<Page<MediaSummary>> {
        let params = [("query", query.to_string()), ("page", page.to_string())];
        let path = format!("/search/{}", target.as_path());
        self.get_json(&path, &self.language, &params).await
    }

    pub async fn details(&self, media_type: MediaType, id: u64) -> Result<MediaDetails> {
        let path = format!("/{}/{}", media_type.as_path(), id);
        self.get_json(&path, &self.language, &[]).await
    }

    pub async fn videos(&self, media_type: MediaType, id: u64) -> Result<Vec<Video>> {
        let path = format!("/{}/{}/videos", media_type.as_path(), id);
        let list: VideoList = self.get_json(&path, VIDEO_LANGUAGE, &[]).await?;
        Ok(list.results)
    }

    pub async fn trailer_key(&self, media_type: MediaType, id: u64) -> Result<Option<String>> {
        let videos = self.videos(media_type, id).await?;
        Ok(select_trailer(&videos).map(|v| v.key.clone()))
    }

    pub async fn genres(&self, media_type: MediaType) -> Result<Vec<Genre>> {
        let path = format!("/genre/{}/list", media_type.as_path());
        let list: GenreList = self.get_json(&path, &self.language, &[]).await?;
        Ok(list.genres)
    }

    // --- Superseding variants: a newer call for the same slot aborts the older one ---

    pub async fn discover_latest(
        &self,
        media_type: MediaType,
        page: u32,
        genre_id: Option<u32>,
    ) -> Result<Page<MediaSummary>> {
        let key = RequestKey::new("discover", media_type.as_path(), None, Some(page));
        let this = self.clone();
        self.slots
            .run(key, async move { this.discover(media_type, page, genre_id).await })
            .await
    }

    pub async fn search_latest(
        &self,
        target: SearchTarget,
        query: &str,
        page: u32,
    ) -> Result<Page<MediaSummary>> {
        let key = RequestKey::new("search", target.as_path(), None, Some(page));
        let this = self.clone();
        let query = query.to_string();
        self.slots
            .run(key, async move { this.search(target, &query, page).await })
            .await
    }

    pub async fn details_latest(&self, media_type: MediaType, id: u64) -> Result<MediaDetails> {
        let key = RequestKey::new("details", media_type.as_path(), Some(id), None);
        let this = self.clone();
        self.slots
            .run(key, async move { this.details(media_type, id).await })
            .await
    }

    /// Aborts every superseding request still in flight.
    pub fn cancel_pending(&self) {
        self.slots.cancel_all();
    }

    // --- Images ---

    fn image_url(&self, path: Option<&str>, size: &str) -> String {
        match path {
            Some(p) if !p.is_empty() => format!("{}/{}{}", self.image_base_url, size, p),
            _ => String::new(),
        }
    }

    pub fn poster_url(&self, path: Option<&str>) -> String {
        self.image_url(path, "w500")
    }

    pub fn backdrop_url(&self, path: Option<&str>) -> String {
        self.image_url(path, "original")
    }
}
