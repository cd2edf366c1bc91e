//! Shared application state handed to every HTTP handler.

use crate::chrome::ChromeController;
use crate::config::Config;
use crate::store::keywords::KeywordStore;
use crate::store::settings::SettingsStore;
use std::sync::Arc;

pub struct AppState {
    pub config: Config,
    pub keywords: KeywordStore,
    pub settings: SettingsStore,
    pub chrome: ChromeController,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(config: Config) -> Self {
        let keywords = KeywordStore::new(&config.data_dir);
        let settings = SettingsStore::new(&config.data_dir);
        Self {
            config,
            keywords,
            settings,
            chrome: ChromeController::default(),
        }
    }
}
