//! Per-account ratings, watch logs, reviews, watchlist, likes and lists.
//!
//! The store holds one account's snapshot in memory. Every change is
//! written through to the [`SnapshotStore`] as a whole snapshot, keyed by
//! the account id. If that write fails the in-memory state is kept and the
//! store stays dirty until [`InteractionStore::flush`] or the next
//! successful write.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::database::SnapshotStore;
use crate::error::{Error, Result};
use crate::models::{
    Account, ListEntry, MediaKey, MediaLike, MediaList, MediaRating, MediaReview,
    NewWatchLog, NewWatchlistItem, ReviewDraft, UserInteractions, UserStats, WatchLog,
    WatchlistItem,
};
use crate::validation;

fn new_id() -> String {
    Uuid::now_v7().to_string()
}

pub struct InteractionStore {
    store: Arc<dyn SnapshotStore>,
    session: Option<Account>,
    data: UserInteractions,
    loading: bool,
    dirty: bool,
}

impl InteractionStore {
    pub fn new(store: Arc<dyn SnapshotStore>) -> Self {
        Self {
            store,
            session: None,
            data: UserInteractions::default(),
            loading: true,
            dirty: false,
        }
    }

    /// Swaps in the snapshot of `session` (empty when signed out).
    ///
    /// Unsaved changes of the outgoing account are written first. If that
    /// write fails the outgoing account stays loaded and the error is
    /// returned, so nothing is dropped.
    ///
    /// A read failure leaves the store ready but signed out, so later
    /// mutations cannot overwrite the unreadable snapshot.
    pub fn load(&mut self, session: Option<&Account>) -> Result<()> {
        self.flush()?;
        self.loading = true;
        self.dirty = false;
        self.data = UserInteractions::default();
        self.session = None;

        if let Some(account) = session {
            match self.store.get(&account.id) {
                Ok(Some(mut snapshot)) => {
                    let dropped = snapshot.retain_owned_by(&account.id);
                    if dropped > 0 {
                        warn!(user = %account.username, dropped, "dropped records owned by another account");
                    }
                    self.data = snapshot;
                }
                Ok(None) => {}
                Err(e) => {
                    self.loading = false;
                    warn!(user = %account.username, error = %e, "could not load interactions");
                    return Err(e);
                }
            }
            info!(user = %account.username, records = self.data.len(), "interactions loaded");
            self.session = Some(account.clone());
        }

        self.loading = false;
        Ok(())
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn account(&self) -> Option<&Account> {
        self.session.as_ref()
    }

    pub fn snapshot(&self) -> &UserInteractions {
        &self.data
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.dirty
    }

    /// Retries a failed write. A no-op when everything is saved.
    pub fn flush(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        self.persist()
    }

    fn active_account(&self, op: &str) -> Option<Account> {
        if self.loading || self.session.is_none() {
            warn!(op, "ignored: no active session");
            return None;
        }
        self.session.clone()
    }

    fn persist(&mut self) -> Result<()> {
        let Some(account) = &self.session else {
            return Ok(());
        };
        match self.store.put(&account.id, &self.data) {
            Ok(()) => {
                self.dirty = false;
                Ok(())
            }
            Err(e) => {
                self.dirty = true;
                warn!(user = %account.username, error = %e, "interactions not saved");
                Err(match e {
                    Error::Persistence(_) => e,
                    other => Error::Persistence(other.to_string()),
                })
            }
        }
    }

    // --- Ratings ---

    pub fn get_rating(&self, key: MediaKey) -> Option<&MediaRating> {
        self.data.ratings.iter().find(|r| r.key == key)
    }

    pub fn all_ratings(&self) -> &[MediaRating] {
        &self.data.ratings
    }

    pub fn set_rating(&mut self, key: MediaKey, rating: f32) -> Result<()> {
        validation::validate_rating(rating)?;
        let Some(account) = self.active_account("set_rating") else {
            return Ok(());
        };

        let now = Utc::now();
        match self.data.ratings.iter_mut().find(|r| r.key == key) {
            Some(existing) => {
                existing.rating = rating;
                existing.updated_at = now;
            }
            None => self.data.ratings.push(MediaRating {
                id: new_id(),
                user_id: account.id,
                key,
                rating,
                created_at: now,
                updated_at: now,
            }),
        }
        debug!(media_id = key.media_id, rating, "rating set");
        self.persist()
    }

    pub fn remove_rating(&mut self, key: MediaKey) -> Result<()> {
        if self.active_account("remove_rating").is_none() {
            return Ok(());
        }
        let before = self.data.ratings.len();
        self.data.ratings.retain(|r| r.key != key);
        if self.data.ratings.len() == before {
            return Ok(());
        }
        self.persist()
    }

    // --- Watch logs ---

    pub fn is_watched(&self, key: MediaKey) -> bool {
        self.data.watch_logs.iter().any(|l| l.key == key)
    }

    pub fn get_watch_log(&self, key: MediaKey) -> Option<&WatchLog> {
        self.data.watch_logs.iter().find(|l| l.key == key)
    }

    pub fn all_watch_logs(&self) -> &[WatchLog] {
        &self.data.watch_logs
    }

    /// At most one log per title: logging a title again replaces the
    /// existing entry's details and keeps its id.
    pub fn add_watch_log(&mut self, log: NewWatchLog) -> Result<()> {
        validation::validate_watched_date(log.watched_date, Utc::now().date_naive())?;
        validation::validate_watch_note(log.review.as_deref())?;
        if let Some(r) = log.rating {
            validation::validate_rating(r)?;
        }
        let Some(account) = self.active_account("add_watch_log") else {
            return Ok(());
        };

        let key = log.key;
        match self.data.watch_logs.iter_mut().find(|l| l.key == key) {
            Some(existing) => {
                existing.media_title = log.media_title;
                existing.poster_path = log.poster_path;
                existing.watched_date = log.watched_date;
                existing.rating = log.rating;
                existing.review = log.review;
                let keep = existing.id.clone();
                self.data
                    .watch_logs
                    .retain(|l| l.key != key || l.id == keep);
            }
            None => self.data.watch_logs.push(WatchLog {
                id: new_id(),
                user_id: account.id,
                key,
                media_title: log.media_title,
                poster_path: log.poster_path,
                watched_date: log.watched_date,
                rating: log.rating,
                review: log.review,
                created_at: Utc::now(),
            }),
        }
        debug!(media_id = key.media_id, "watch logged");
        self.persist()
    }

    /// Removes every log for the title.
    pub fn remove_watch_log(&mut self, key: MediaKey) -> Result<()> {
        if self.active_account("remove_watch_log").is_none() {
            return Ok(());
        }
        let before = self.data.watch_logs.len();
        self.data.watch_logs.retain(|l| l.key != key);
        if self.data.watch_logs.len() == before {
            return Ok(());
        }
        self.persist()
    }

    // --- Reviews ---

    pub fn get_review(&self, key: MediaKey) -> Option<&MediaReview> {
        self.data.reviews.iter().find(|r| r.key == key)
    }

    pub fn all_reviews(&self) -> &[MediaReview] {
        &self.data.reviews
    }

    pub fn add_review(&mut self, draft: ReviewDraft) -> Result<()> {
        validation::validate_review_text(&draft.review_text)?;
        if let Some(r) = draft.rating {
            validation::validate_rating(r)?;
        }
        let Some(account) = self.active_account("add_review") else {
            return Ok(());
        };

        let now = Utc::now();
        let key = draft.key;
        match self.data.reviews.iter_mut().find(|r| r.key == key) {
            Some(existing) => {
                existing.media_title = draft.media_title;
                existing.poster_path = draft.poster_path;
                existing.rating = draft.rating;
                existing.review_text = draft.review_text;
                existing.contains_spoilers = draft.contains_spoilers;
                existing.updated_at = now;
            }
            None => self.data.reviews.push(MediaReview {
                id: new_id(),
                user_id: account.id,
                username: account.username,
                user_avatar: account.avatar_url,
                key,
                media_title: draft.media_title,
                poster_path: draft.poster_path,
                rating: draft.rating,
                review_text: draft.review_text,
                contains_spoilers: draft.contains_spoilers,
                likes: 0,
                created_at: now,
                updated_at: now,
            }),
        }
        debug!(media_id = key.media_id, "review saved");
        self.persist()
    }

    pub fn update_review(
        &mut self,
        review_id: &str,
        review_text: &str,
        contains_spoilers: bool,
    ) -> Result<()> {
        validation::validate_review_text(review_text)?;
        if self.active_account("update_review").is_none() {
            return Ok(());
        }
        let Some(review) = self.data.reviews.iter_mut().find(|r| r.id == review_id) else {
            return Ok(());
        };
        review.review_text = review_text.to_string();
        review.contains_spoilers = contains_spoilers;
        review.updated_at = Utc::now();
        self.persist()
    }

    pub fn delete_review(&mut self, review_id: &str) -> Result<()> {
        if self.active_account("delete_review").is_none() {
            return Ok(());
        }
        let before = self.data.reviews.len();
        self.data.reviews.retain(|r| r.id != review_id);
        if self.data.reviews.len() == before {
            return Ok(());
        }
        self.persist()
    }

    // --- Watchlist ---

    pub fn is_in_watchlist(&self, key: MediaKey) -> bool {
        self.data.watchlist.iter().any(|i| i.key == key)
    }

    pub fn watchlist(&self) -> &[WatchlistItem] {
        &self.data.watchlist
    }

    pub fn add_to_watchlist(&mut self, item: NewWatchlistItem) -> Result<()> {
        let Some(account) = self.active_account("add_to_watchlist") else {
            return Ok(());
        };
        if self.is_in_watchlist(item.key) {
            return Ok(());
        }
        self.data.watchlist.push(WatchlistItem {
            id: new_id(),
            user_id: account.id,
            key: item.key,
            media_title: item.media_title,
            poster_path: item.poster_path,
            release_date: item.release_date,
            added_at: Utc::now(),
        });
        self.persist()
    }

    pub fn remove_from_watchlist(&mut self, key: MediaKey) -> Result<()> {
        if self.active_account("remove_from_watchlist").is_none() {
            return Ok(());
        }
        let before = self.data.watchlist.len();
        self.data.watchlist.retain(|i| i.key != key);
        if self.data.watchlist.len() == before {
            return Ok(());
        }
        self.persist()
    }

    // --- Likes ---

    pub fn is_liked(&self, key: MediaKey) -> bool {
        self.data.likes.iter().any(|l| l.key == key)
    }

    pub fn all_likes(&self) -> &[MediaLike] {
        &self.data.likes
    }

    /// Returns whether the title is liked afterwards.
    pub fn toggle_like(
        &mut self,
        key: MediaKey,
        media_title: Option<String>,
        poster_path: Option<String>,
    ) -> Result<bool> {
        let Some(account) = self.active_account("toggle_like") else {
            return Ok(false);
        };
        let liked = if self.is_liked(key) {
            self.data.likes.retain(|l| l.key != key);
            false
        } else {
            self.data.likes.push(MediaLike {
                id: new_id(),
                user_id: account.id,
                key,
                media_title,
                poster_path,
                liked_at: Utc::now(),
            });
            true
        };
        self.persist()?;
        Ok(liked)
    }

    // --- Lists ---

    pub fn all_lists(&self) -> &[MediaList] {
        &self.data.lists
    }

    pub fn get_list(&self, list_id: &str) -> Option<&MediaList> {
        self.data.lists.iter().find(|l| l.id == list_id)
    }

    pub fn is_in_list(&self, list_id: &str, key: MediaKey) -> bool {
        self.get_list(list_id).is_some_and(|l| l.contains(key))
    }

    pub fn create_list(
        &mut self,
        name: &str,
        description: Option<&str>,
        is_public: bool,
    ) -> Result<MediaList> {
        let name = name.trim();
        let description = description.map(str::trim).filter(|d| !d.is_empty());
        validation::validate_list_fields(name, description)?;
        let account = self
            .active_account("create_list")
            .ok_or(Error::NotAuthenticated)?;

        let now = Utc::now();
        let list = MediaList {
            id: new_id(),
            name: name.to_string(),
            description: description.map(str::to_string),
            user_id: account.id,
            movies: Vec::new(),
            is_public,
            created_at: now,
            updated_at: now,
        };
        self.data.lists.push(list.clone());
        info!(list = %list.name, "list created");
        self.persist()?;
        Ok(list)
    }

    pub fn delete_list(&mut self, list_id: &str) -> Result<()> {
        if self.active_account("delete_list").is_none() {
            return Ok(());
        }
        let before = self.data.lists.len();
        self.data.lists.retain(|l| l.id != list_id);
        if self.data.lists.len() == before {
            return Ok(());
        }
        self.persist()
    }

    /// No-op when the list is unknown or already holds the title.
    pub fn add_to_list(
        &mut self,
        list_id: &str,
        key: MediaKey,
        title: &str,
        poster_path: Option<String>,
    ) -> Result<()> {
        if self.active_account("add_to_list").is_none() {
            return Ok(());
        }
        let Some(list) = self.data.lists.iter_mut().find(|l| l.id == list_id) else {
            return Ok(());
        };
        if list.contains(key) {
            return Ok(());
        }
        let now = Utc::now();
        list.movies.push(ListEntry {
            key,
            title: title.to_string(),
            poster_path,
            added_date: now,
        });
        list.updated_at = now;
        self.persist()
    }

    pub fn remove_from_list(&mut self, list_id: &str, key: MediaKey) -> Result<()> {
        if self.active_account("remove_from_list").is_none() {
            return Ok(());
        }
        let Some(list) = self.data.lists.iter_mut().find(|l| l.id == list_id) else {
            return Ok(());
        };
        let before = list.movies.len();
        list.movies.retain(|m| m.key != key);
        if list.movies.len() == before {
            return Ok(());
        }
        list.updated_at = Utc::now();
        self.persist()
    }

    // --- Profile ---

    pub fn stats(&self, today: NaiveDate) -> UserStats {
        let watched: HashSet<MediaKey> = self.data.watch_logs.iter().map(|l| l.key).collect();
        let this_year = self
            .data
            .watch_logs
            .iter()
            .filter(|l| l.watched_date.year() == today.year())
            .count();
        let average_rating = if self.data.ratings.is_empty() {
            0.0
        } else {
            let sum: f32 = self.data.ratings.iter().map(|r| r.rating).sum();
            sum / self.data.ratings.len() as f32
        };

        UserStats {
            total_watched: watched.len(),
            this_year,
            total_reviews: self.data.reviews.len(),
            total_lists: self.data.lists.len(),
            average_rating,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use assert_matches::assert_matches;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn account(id: &str, username: &str) -> Account {
        Account {
            id: id.to_string(),
            username: username.to_string(),
            email: format!("{username}@x.com"),
            display_name: username.to_string(),
            avatar_url: Some(format!("https://avatars.test/{username}")),
            bio: String::new(),
            joined_date: Utc::now(),
        }
    }

    fn ready_store() -> (Arc<Database>, InteractionStore) {
        let db = Arc::new(Database::in_memory());
        let mut store = InteractionStore::new(db.clone());
        store.load(Some(&account("u1", "alice"))).unwrap();
        (db, store)
    }

    fn watch(key: MediaKey, date: NaiveDate) -> NewWatchLog {
        NewWatchLog {
            key,
            media_title: "Fight Club".to_string(),
            poster_path: Some("/poster.jpg".to_string()),
            watched_date: date,
            rating: Some(4.0),
            review: None,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Snapshot store whose writes can be switched off.
    struct FlakyStore {
        inner: Database,
        failing: AtomicBool,
    }

    impl SnapshotStore for FlakyStore {
        fn get(&self, account_id: &str) -> Result<Option<UserInteractions>> {
            self.inner.get(account_id)
        }

        fn put(&self, account_id: &str, snapshot: &UserInteractions) -> Result<()> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(Error::Persistence("quota exceeded".to_string()));
            }
            self.inner.put(account_id, snapshot)
        }
    }

    #[test]
    fn starts_loading_and_empty() {
        let store = InteractionStore::new(Arc::new(Database::in_memory()));
        assert!(store.is_loading());
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn mutations_without_session_are_ignored() {
        let db = Arc::new(Database::in_memory());
        let mut store = InteractionStore::new(db.clone());
        store.set_rating(MediaKey::movie(1), 3.0).unwrap();

        store.load(None).unwrap();
        assert!(!store.is_loading());
        store.set_rating(MediaKey::movie(1), 3.0).unwrap();
        assert!(!store.toggle_like(MediaKey::movie(1), None, None).unwrap());
        assert!(store.all_ratings().is_empty());
        assert!(store.all_likes().is_empty());
        assert_matches!(
            store.create_list("Favorites", None, true),
            Err(Error::NotAuthenticated)
        );
    }

    #[test]
    fn rating_upsert_keeps_one_entry() {
        let (db, mut store) = ready_store();
        let key = MediaKey::movie(550);
        store.set_rating(key, 3.5).unwrap();
        let id = store.get_rating(key).unwrap().id.clone();
        store.set_rating(key, 5.0).unwrap();

        assert_eq!(store.get_rating(key).unwrap().rating, 5.0);
        assert_eq!(store.get_rating(key).unwrap().id, id);
        assert_eq!(store.all_ratings().iter().filter(|r| r.key == key).count(), 1);
        assert_eq!(store.get_rating(key).unwrap().user_id, "u1");
        assert_eq!(db.get("u1").unwrap().unwrap().ratings.len(), 1);
    }

    #[test]
    fn rating_keys_distinguish_media_type() {
        let (_db, mut store) = ready_store();
        store.set_rating(MediaKey::movie(7), 2.0).unwrap();
        store.set_rating(MediaKey::series(7), 4.0).unwrap();
        assert_eq!(store.all_ratings().len(), 2);
        store.remove_rating(MediaKey::movie(7)).unwrap();
        assert!(store.get_rating(MediaKey::movie(7)).is_none());
        assert_eq!(store.get_rating(MediaKey::series(7)).unwrap().rating, 4.0);
    }

    #[test]
    fn invalid_rating_rejected() {
        let (_db, mut store) = ready_store();
        assert_matches!(
            store.set_rating(MediaKey::movie(1), 4.2),
            Err(Error::Validation(_))
        );
        assert!(store.all_ratings().is_empty());
    }

    #[test]
    fn watch_log_is_unique_per_title() {
        let (_db, mut store) = ready_store();
        let key = MediaKey::movie(550);
        store.add_watch_log(watch(key, date(2023, 1, 2))).unwrap();
        let first_id = store.get_watch_log(key).unwrap().id.clone();

        let mut again = watch(key, date(2023, 6, 1));
        again.review = Some("second viewing".to_string());
        store.add_watch_log(again).unwrap();

        assert_eq!(store.all_watch_logs().len(), 1);
        let log = store.get_watch_log(key).unwrap();
        assert_eq!(log.id, first_id);
        assert_eq!(log.watched_date, date(2023, 6, 1));
        assert_eq!(log.review.as_deref(), Some("second viewing"));
        assert!(store.is_watched(key));

        store.remove_watch_log(key).unwrap();
        assert!(!store.is_watched(key));
    }

    #[test]
    fn remove_watch_log_purges_legacy_duplicates() {
        let db = Arc::new(Database::in_memory());
        let owner = account("u1", "alice");
        let key = MediaKey::movie(550);
        let entry = |id: &str| WatchLog {
            id: id.to_string(),
            user_id: "u1".to_string(),
            key,
            media_title: "Fight Club".to_string(),
            poster_path: None,
            watched_date: date(2022, 1, 1),
            rating: None,
            review: None,
            created_at: Utc::now(),
        };
        db.put(
            "u1",
            &UserInteractions {
                watch_logs: vec![entry("a"), entry("b")],
                ..Default::default()
            },
        )
        .unwrap();

        let mut store = InteractionStore::new(db);
        store.load(Some(&owner)).unwrap();
        assert_eq!(store.get_watch_log(key).unwrap().id, "a");
        store.remove_watch_log(key).unwrap();
        assert!(store.all_watch_logs().is_empty());
    }

    #[test]
    fn future_watch_date_rejected() {
        let (_db, mut store) = ready_store();
        let tomorrow = Utc::now().date_naive().succ_opt().unwrap();
        assert_matches!(
            store.add_watch_log(watch(MediaKey::movie(1), tomorrow)),
            Err(Error::Validation(_))
        );
    }

    #[test]
    fn review_snapshots_author_and_updates_by_id() {
        let (_db, mut store) = ready_store();
        let key = MediaKey::series(1399);
        store
            .add_review(ReviewDraft {
                key,
                media_title: "Game of Thrones".to_string(),
                poster_path: None,
                rating: Some(4.5),
                review_text: "Dragons, mostly.".to_string(),
                contains_spoilers: false,
            })
            .unwrap();
        let review = store.get_review(key).unwrap().clone();
        assert_eq!(review.username, "alice");
        assert_eq!(review.user_avatar.as_deref(), Some("https://avatars.test/alice"));
        assert_eq!(review.likes, 0);

        store
            .update_review(&review.id, "The ending was rushed.", true)
            .unwrap();
        let updated = store.get_review(key).unwrap();
        assert!(updated.contains_spoilers);
        assert_eq!(updated.review_text, "The ending was rushed.");

        assert_matches!(
            store.update_review(&review.id, "short", false),
            Err(Error::Validation(_))
        );

        store.delete_review(&review.id).unwrap();
        assert!(store.all_reviews().is_empty());
    }

    #[test]
    fn watchlist_add_is_idempotent() {
        let (_db, mut store) = ready_store();
        let item = NewWatchlistItem {
            key: MediaKey::movie(27205),
            media_title: "Inception".to_string(),
            poster_path: None,
            release_date: Some("2010-07-15".to_string()),
        };
        store.add_to_watchlist(item.clone()).unwrap();
        store.add_to_watchlist(item.clone()).unwrap();
        assert_eq!(store.watchlist().len(), 1);
        assert!(store.is_in_watchlist(item.key));
        store.remove_from_watchlist(item.key).unwrap();
        assert!(!store.is_in_watchlist(item.key));
    }

    #[test]
    fn toggle_like_twice_restores_state() {
        let (_db, mut store) = ready_store();
        let key = MediaKey::movie(13);
        assert!(!store.is_liked(key));
        assert!(store
            .toggle_like(key, Some("Forrest Gump".to_string()), None)
            .unwrap());
        assert!(store.is_liked(key));
        assert!(!store.toggle_like(key, None, None).unwrap());
        assert!(!store.is_liked(key));
        assert!(store.all_likes().is_empty());
    }

    #[test]
    fn list_membership_is_unique() {
        let (_db, mut store) = ready_store();
        let list = store
            .create_list("  Noir  ", Some("Shadows and rain"), false)
            .unwrap();
        assert_eq!(list.name, "Noir");
        assert!(!list.is_public);

        let key = MediaKey::movie(289);
        store.add_to_list(&list.id, key, "Casablanca", None).unwrap();
        assert!(store.is_in_list(&list.id, key));
        store.add_to_list(&list.id, key, "Casablanca", None).unwrap();
        assert_eq!(store.get_list(&list.id).unwrap().movies.len(), 1);

        store.add_to_list("missing", key, "Casablanca", None).unwrap();
        assert!(!store.is_in_list("missing", key));

        store.remove_from_list(&list.id, key).unwrap();
        assert!(!store.is_in_list(&list.id, key));

        store.delete_list(&list.id).unwrap();
        assert!(store.all_lists().is_empty());
    }

    #[test]
    fn list_name_length_validated() {
        let (_db, mut store) = ready_store();
        assert_matches!(
            store.create_list(&"x".repeat(51), None, true),
            Err(Error::Validation(_))
        );
    }

    #[test]
    fn foreign_records_dropped_on_load() {
        let db = Arc::new(Database::in_memory());
        let now = Utc::now();
        let rating = |user: &str| MediaRating {
            id: new_id(),
            user_id: user.to_string(),
            key: MediaKey::movie(1),
            rating: 3.0,
            created_at: now,
            updated_at: now,
        };
        db.put(
            "u1",
            &UserInteractions {
                ratings: vec![rating("u1"), rating("intruder")],
                ..Default::default()
            },
        )
        .unwrap();

        let mut store = InteractionStore::new(db);
        store.load(Some(&account("u1", "alice"))).unwrap();
        assert_eq!(store.all_ratings().len(), 1);
        assert_eq!(store.all_ratings()[0].user_id, "u1");
    }

    #[test]
    fn failed_write_keeps_memory_and_flush_retries() {
        let flaky = Arc::new(FlakyStore {
            inner: Database::in_memory(),
            failing: AtomicBool::new(true),
        });
        let mut store = InteractionStore::new(flaky.clone());
        store.load(Some(&account("u1", "alice"))).unwrap();

        let key = MediaKey::movie(550);
        assert_matches!(store.set_rating(key, 4.0), Err(Error::Persistence(_)));
        assert_eq!(store.get_rating(key).unwrap().rating, 4.0);
        assert!(store.has_unsaved_changes());
        assert!(flaky.inner.get("u1").unwrap().is_none());

        flaky.failing.store(false, Ordering::SeqCst);
        store.flush().unwrap();
        assert!(!store.has_unsaved_changes());
        assert_eq!(flaky.inner.get("u1").unwrap().unwrap().ratings.len(), 1);
    }

    #[test]
    fn switch_with_unsaved_changes_keeps_them() {
        let flaky = Arc::new(FlakyStore {
            inner: Database::in_memory(),
            failing: AtomicBool::new(true),
        });
        let alice = account("u1", "alice");
        let bob = account("u2", "bob");
        let mut store = InteractionStore::new(flaky.clone());
        store.load(Some(&alice)).unwrap();

        let key = MediaKey::movie(550);
        assert!(store.set_rating(key, 4.0).is_err());
        assert!(store.has_unsaved_changes());

        assert_matches!(store.load(Some(&bob)), Err(Error::Persistence(_)));
        assert_eq!(store.account().map(|a| a.id.as_str()), Some("u1"));
        assert_eq!(store.get_rating(key).unwrap().rating, 4.0);

        flaky.failing.store(false, Ordering::SeqCst);
        store.load(Some(&bob)).unwrap();
        assert!(store.all_ratings().is_empty());
        store.load(Some(&alice)).unwrap();
        assert_eq!(store.get_rating(key).unwrap().rating, 4.0);
    }

    #[test]
    fn update_unknown_review_is_a_no_op() {
        let (db, mut store) = ready_store();
        store
            .update_review("no-such-review", "A perfectly valid review.", true)
            .unwrap();
        assert!(store.all_reviews().is_empty());
        assert!(!store.has_unsaved_changes());
        assert!(db.get("u1").unwrap().is_none());
    }

    #[test]
    fn stats_summarize_snapshot() {
        let (_db, mut store) = ready_store();
        let today = Utc::now().date_naive();
        let last_year = date(today.year() - 1, 6, 1);

        store.add_watch_log(watch(MediaKey::movie(1), today)).unwrap();
        store.add_watch_log(watch(MediaKey::movie(2), last_year)).unwrap();
        store.set_rating(MediaKey::movie(1), 4.0).unwrap();
        store.set_rating(MediaKey::movie(2), 3.0).unwrap();
        store.create_list("Faves", None, true).unwrap();

        let stats = store.stats(today);
        assert_eq!(stats.total_watched, 2);
        assert_eq!(stats.this_year, 1);
        assert_eq!(stats.total_reviews, 0);
        assert_eq!(stats.total_lists, 1);
        assert_eq!(stats.average_rating, 3.5);
    }
}
