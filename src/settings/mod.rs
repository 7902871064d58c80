pub(crate) mod settings_model;
pub(crate) mod settings_service;

pub use settings_model::ThemeMode;
pub use settings_service::SettingsService;
