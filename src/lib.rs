pub mod auth;
pub mod catalog;
pub mod config;
pub mod database;
pub mod error;
pub mod interactions;
pub mod logging;
pub mod models;
pub mod password;
pub mod requests;
pub mod state;
pub mod validation;


pub use auth::IdentityStore;
pub use catalog::{CatalogClient, SearchTarget};
pub use config::AppConfig;
pub use database::{AccountStore, Database, SnapshotStore};
pub use error::{Error, Result};
pub use interactions::InteractionStore;
pub use models::{MediaKey, MediaType};
pub use state::AppState;
