use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    #[serde(rename = "movie")]
    Movie,
    #[serde(rename = "tv")]
    Series,
}

impl MediaType {
    /// Path segment used by the catalog API.
    pub fn as_path(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Series => "tv",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct MediaKey {
    pub media_id: u64,
    pub media_type: MediaType,
}

impl MediaKey {
    pub fn new(media_id: u64, media_type: MediaType) -> Self {
        Self { media_id, media_type }
    }

    pub fn movie(media_id: u64) -> Self {
        Self::new(media_id, MediaType::Movie)
    }

    pub fn series(media_id: u64) -> Self {
        Self::new(media_id, MediaType::Series)
    }
}

// --- Identity ---

/// A signed-in or registered user, without the password secret.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub username: String,
    pub email: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub bio: String,
    pub joined_date: DateTime<Utc>,
}

/// Registry entry: the account plus its Argon2 PHC hash.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(flatten)]
    pub account: Account,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub display_name: String,
}

// --- Interactions ---

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MediaRating {
    pub id: String,
    pub user_id: String,
    #[serde(flatten)]
    pub key: MediaKey,
    pub rating: f32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WatchLog {
    pub id: String,
    pub user_id: String,
    #[serde(flatten)]
    pub key: MediaKey,
    pub media_title: String,
    pub poster_path: Option<String>,
    pub watched_date: NaiveDate,
    pub rating: Option<f32>,
    pub review: Option<String>, // short note, not a MediaReview
    pub created_at: DateTime<Utc>,
}

/// Caller-supplied part of a watch log.
#[derive(Debug, Clone)]
pub struct NewWatchLog {
    pub key: MediaKey,
    pub media_title: String,
    pub poster_path: Option<String>,
    pub watched_date: NaiveDate,
    pub rating: Option<f32>,
    pub review: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MediaReview {
    pub id: String,
    pub user_id: String,
    pub username: String,
    pub user_avatar: Option<String>,
    #[serde(flatten)]
    pub key: MediaKey,
    pub media_title: String,
    pub poster_path: Option<String>,
    pub rating: Option<f32>,
    pub review_text: String,
    pub contains_spoilers: bool,
    #[serde(default)]
    pub likes: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ReviewDraft {
    pub key: MediaKey,
    pub media_title: String,
    pub poster_path: Option<String>,
    pub rating: Option<f32>,
    pub review_text: String,
    pub contains_spoilers: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistItem {
    pub id: String,
    pub user_id: String,
    #[serde(flatten)]
    pub key: MediaKey,
    pub media_title: String,
    pub poster_path: Option<String>,
    pub release_date: Option<String>,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewWatchlistItem {
    pub key: MediaKey,
    pub media_title: String,
    pub poster_path: Option<String>,
    pub release_date: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MediaLike {
    pub id: String,
    pub user_id: String,
    #[serde(flatten)]
    pub key: MediaKey,
    pub media_title: Option<String>,
    pub poster_path: Option<String>,
    pub liked_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ListEntry {
    #[serde(flatten)]
    pub key: MediaKey,
    pub title: String,
    pub poster_path: Option<String>,
    pub added_date: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MediaList {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub user_id: String,
    #[serde(default)]
    pub movies: Vec<ListEntry>,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MediaList {
    pub fn contains(&self, key: MediaKey) -> bool {
        self.movies.iter().any(|m| m.key == key)
    }
}

/// One account's full interaction snapshot, persisted as a unit.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserInteractions {
    #[serde(default)]
    pub ratings: Vec<MediaRating>,
    #[serde(default)]
    pub watch_logs: Vec<WatchLog>,
    #[serde(default)]
    pub reviews: Vec<MediaReview>,
    #[serde(default)]
    pub watchlist: Vec<WatchlistItem>,
    #[serde(default)]
    pub likes: Vec<MediaLike>,
    #[serde(default)]
    pub lists: Vec<MediaList>,
}

impl UserInteractions {
    /// Drops records stamped with another owner. Returns how many were removed.
    pub fn retain_owned_by(&mut self, user_id: &str) -> usize {
        let before = self.len();
        self.ratings.retain(|r| r.user_id == user_id);
        self.watch_logs.retain(|r| r.user_id == user_id);
        self.reviews.retain(|r| r.user_id == user_id);
        self.watchlist.retain(|r| r.user_id == user_id);
        self.likes.retain(|r| r.user_id == user_id);
        self.lists.retain(|r| r.user_id == user_id);
        before - self.len()
    }

    pub fn len(&self) -> usize {
        self.ratings.len()
            + self.watch_logs.len()
            + self.reviews.len()
            + self.watchlist.len()
            + self.likes.len()
            + self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_watched: usize,
    pub this_year: usize,
    pub total_reviews: usize,
    pub total_lists: usize,
    pub average_rating: f32,
}

/// Whole persisted document.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct CollectionData {
    #[serde(default)]
    pub users: Vec<UserRecord>,
    #[serde(default)]
    pub session: Option<Account>,
    #[serde(default)]
    pub interactions_by_user: HashMap<String, UserInteractions>,
}
