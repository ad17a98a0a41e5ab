use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use loader_core::LoaderSettings;
use loader_engine::{ClientSettings, WidgetLabels};
use loader_logging::{loader_info, loader_warn};
use serde::{Deserialize, Serialize};

/// Page loader configuration, read from a RON file. Every field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LoaderConfig {
    pub selectors: SelectorConfig,
    pub timings: TimingConfig,
    pub messages: MessageConfig,
    pub service: ServiceConfig,
    /// Promote `data-src` into `src` for images in injected content.
    pub lazy_images: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub menu: String,
    pub content: String,
    pub hero: String,
    /// Relative to the hero element.
    pub hero_title: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            menu: ".ajax-menu".to_string(),
            content: ".curriculum-description .col-inner".to_string(),
            hero: ".northern-hero".to_string(),
            hero_title: ".title h1".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub fade_out_ms: u64,
    pub fade_in_ms: u64,
    pub reinit_ms: u64,
    pub submenu_close_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        let settings = LoaderSettings::default();
        Self {
            fade_out_ms: millis(settings.fade_out_delay),
            fade_in_ms: millis(settings.fade_in_duration),
            reinit_ms: millis(settings.reinit_delay),
            submenu_close_ms: millis(settings.submenu_close_delay),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageConfig {
    pub loading: String,
    pub error: String,
    pub expand: String,
    pub collapse: String,
}

impl Default for MessageConfig {
    fn default() -> Self {
        let settings = LoaderSettings::default();
        let labels = WidgetLabels::default();
        Self {
            loading: settings.loading_text,
            error: settings.error_text,
            expand: labels.expand,
            collapse: labels.collapse,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub endpoint: String,
    pub action: String,
    pub token: Option<String>,
    pub request_timeout_ms: Option<u64>,
    pub max_bytes: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        let client = ClientSettings::default();
        Self {
            endpoint: client.endpoint,
            action: client.action,
            token: client.token,
            request_timeout_ms: None,
            max_bytes: client.max_bytes,
        }
    }
}

impl LoaderConfig {
    /// Reads `path`. A missing file yields the defaults; a malformed one is an error.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                loader_warn!("No config at {:?}; using defaults", path);
                return Ok(Self::default());
            }
            Err(err) => {
                return Err(err).with_context(|| format!("reading config {}", path.display()));
            }
        };

        let config: Self = ron::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        loader_info!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn settings(&self) -> LoaderSettings {
        LoaderSettings {
            fade_out_delay: Duration::from_millis(self.timings.fade_out_ms),
            fade_in_duration: Duration::from_millis(self.timings.fade_in_ms),
            reinit_delay: Duration::from_millis(self.timings.reinit_ms),
            submenu_close_delay: Duration::from_millis(self.timings.submenu_close_ms),
            loading_text: self.messages.loading.clone(),
            error_text: self.messages.error.clone(),
        }
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            endpoint: self.service.endpoint.clone(),
            action: self.service.action.clone(),
            token: self.service.token.clone(),
            request_timeout: self.service.request_timeout_ms.map(Duration::from_millis),
            max_bytes: self.service.max_bytes,
        }
    }

    pub fn widget_labels(&self) -> WidgetLabels {
        WidgetLabels {
            expand: self.messages.expand.clone(),
            collapse: self.messages.collapse.clone(),
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
