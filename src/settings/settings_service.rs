use log::warn;
use std::sync::Arc;

use crate::errors::Result;
use crate::settings::settings_model::ThemeMode;
use crate::store::LocalStore;

const THEME_KEY: &str = "cryptoflash-theme";

/// Account-local presentation settings
pub struct SettingsService {
    local: Arc<dyn LocalStore>,
}

impl SettingsService {
    pub fn new(local: Arc<dyn LocalStore>) -> Self {
        Self { local }
    }

    /// Stored theme, or the default when unset or unreadable
    pub fn theme(&self) -> ThemeMode {
        match self.local.get(THEME_KEY) {
            Ok(Some(value)) => ThemeMode::parse(&value).unwrap_or_else(|| {
                warn!("unknown stored theme {value:?}, using default");
                ThemeMode::default()
            }),
            Ok(None) => ThemeMode::default(),
            Err(err) => {
                warn!("could not read stored theme: {err}");
                ThemeMode::default()
            }
        }
    }

    pub fn set_theme(&self, theme: ThemeMode) -> Result<()> {
        self.local.set(THEME_KEY, theme.as_str())?;
        Ok(())
    }
}
