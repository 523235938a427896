pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{scryfall::ScryfallClient, storage::LocalStorage, webhook::DiscordWebhook};
pub use app::{LogReport, RunOutcome, SendOutcome, ValidationSession};
pub use config::TomlConfig;
pub use core::{catalog::LookupSettings, validator::DeckValidator};
pub use domain::model::{DeckSubmission, PairValidation, ValidationResult};
pub use utils::error::{Result, ValidatorError};
