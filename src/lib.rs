//! Fetch, browse, and locally favorite NASA's Astronomy Picture of the Day.

pub mod api;
pub mod db;
pub mod models;
pub mod settings;

pub use api::{date_in_range, ApodClient, FetchError, FetchEvent, FetchTask, FIRST_APOD_DATE};
pub use db::{Database, InsertError};
pub use models::{ImageRecord, MediaType};
pub use settings::SettingsStore;
