//! Config loading.
//!
//! Settings come from built-in defaults, then the user file
//! (`~/.helpdesk/helpdesk.json5`), then the nearest project file above the
//! working directory, then an explicitly named file, and finally `HELPDESK_*`
//! environment variables. Later layers win.

mod env;
mod files;
mod overlay;
mod schema;

#[cfg(test)]
mod tests;

use crate::{ConfigError, HelpdeskConfig, NotifierKind};
use log::{debug, info};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

/// Effective config plus the layers it was built from.
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub config: HelpdeskConfig,
    /// Layers that contributed, lowest precedence first.
    pub layers: Vec<ConfigLayer>,
}

/// Where a config layer came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLayerSource {
    /// `~/.helpdesk/helpdesk.json5`.
    User,
    /// Nearest `helpdesk.json5` or `.helpdesk/helpdesk.json5` above the cwd.
    Project,
    /// File named on the command line.
    File,
    /// `HELPDESK_*` environment variables.
    Env,
}

/// One layer that contributed to the effective config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLayer {
    pub source: ConfigLayerSource,
    /// File path, or the variable names for the environment layer.
    pub origin: String,
}

/// Inputs for `HelpdeskConfig::load_layered_with_options`.
#[derive(Debug, Clone)]
pub struct LayeredConfigOptions {
    /// Directory the project config search starts from.
    pub cwd: PathBuf,
    /// Per-user config file; `None` skips the user layer.
    pub user_config_path: Option<PathBuf>,
    /// Explicit config file. Unlike the other files it must exist.
    pub config_path: Option<PathBuf>,
    /// `HELPDESK_*` variables to apply last.
    pub env: BTreeMap<String, String>,
}

impl LayeredConfigOptions {
    /// Default locations, reading overrides from the process environment.
    pub fn new(cwd: impl AsRef<Path>) -> Self {
        Self {
            user_config_path: files::user_config_path(),
            env: env::process_vars(),
            ..Self::isolated(cwd)
        }
    }

    /// Only the project search under `cwd`: no user file and no environment.
    pub fn isolated(cwd: impl AsRef<Path>) -> Self {
        Self {
            cwd: cwd.as_ref().to_path_buf(),
            user_config_path: None,
            config_path: None,
            env: BTreeMap::new(),
        }
    }

    pub fn with_config_path(mut self, path: impl AsRef<Path>) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(name.into(), value.into());
        self
    }
}

impl HelpdeskConfig {
    /// Load one file on its own, without other layers or environment overrides.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!("loading config from path: {}", path.display());
        let layer = files::read_layer(path, &layer_label(ConfigLayerSource::File, path))?;
        config_from_layers(layer)
    }

    /// Load config from JSON5 text.
    pub fn load_from_str(contents: &str) -> Result<Self, ConfigError> {
        debug!("loading config from raw contents (len={})", contents.len());
        let value: Value = json5::from_str(contents)?;
        schema::validate_layer_schema(&value, "config")?;
        let Value::Object(layer) = value else {
            return Err(ConfigError::Invalid("config: expected object".to_string()));
        };
        config_from_layers(layer)
    }

    /// Load every layer from its default location.
    pub fn load_layered(cwd: impl AsRef<Path>) -> Result<LayeredConfig, ConfigError> {
        Self::load_layered_with_options(LayeredConfigOptions::new(cwd))
    }

    /// Load user, project, explicit and environment layers, in that order.
    pub fn load_layered_with_options(
        options: LayeredConfigOptions,
    ) -> Result<LayeredConfig, ConfigError> {
        info!("loading layered config (cwd={})", options.cwd.display());
        let mut merged = Map::new();
        let mut layers = Vec::new();

        let user_path = options
            .user_config_path
            .as_deref()
            .filter(|path| path.is_file());
        if let Some(path) = user_path {
            let layer = files::read_layer(path, &layer_label(ConfigLayerSource::User, path))?;
            overlay::apply(&mut merged, layer);
            layers.push(file_layer(ConfigLayerSource::User, path));
        }

        let explicit = options.config_path.as_deref();
        let project = files::find_project_config(&options.cwd, options.user_config_path.as_deref())
            .filter(|found| Some(found.as_path()) != explicit);
        if let Some(path) = project.as_deref() {
            let layer = files::read_layer(path, &layer_label(ConfigLayerSource::Project, path))?;
            overlay::apply(&mut merged, layer);
            layers.push(file_layer(ConfigLayerSource::Project, path));
        } else {
            debug!("no project config found (cwd={})", options.cwd.display());
        }

        if let Some(path) = explicit {
            let layer = files::read_layer(path, &layer_label(ConfigLayerSource::File, path))?;
            overlay::apply(&mut merged, layer);
            layers.push(file_layer(ConfigLayerSource::File, path));
        }

        let (env_layer, used) = env::overrides(&options.env)?;
        if !used.is_empty() {
            schema::validate_layer_schema(&Value::Object(env_layer.clone()), "env")?;
            overlay::apply(&mut merged, env_layer);
            layers.push(ConfigLayer {
                source: ConfigLayerSource::Env,
                origin: used.join(","),
            });
        }

        let config = config_from_layers(merged)?;
        info!("layered config loaded (layers={})", layers.len());
        Ok(LayeredConfig { config, layers })
    }

    /// Validate configuration invariants that cannot be expressed in serde.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let threshold = self.resolution.intent_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ConfigError::InvalidField {
                path: "resolution.intent_threshold".to_string(),
                message: format!("must be within [0, 1], got {threshold}"),
            });
        }

        let mut seen = HashSet::new();
        for source in &self.resolution.order {
            if !seen.insert(*source) {
                return Err(ConfigError::InvalidField {
                    path: "resolution.order".to_string(),
                    message: format!("duplicate source {source:?}"),
                });
            }
        }

        if self.generation.timeout_secs == 0 {
            return Err(ConfigError::InvalidField {
                path: "generation.timeout_secs".to_string(),
                message: "must be positive".to_string(),
            });
        }

        if !matches!(self.storage.provider.as_str(), "jsonl" | "memory") {
            return Err(ConfigError::InvalidField {
                path: "storage.provider".to_string(),
                message: format!("unsupported provider {}", self.storage.provider),
            });
        }

        if !matches!(self.knowledge.provider.as_str(), "file" | "memory") {
            return Err(ConfigError::InvalidField {
                path: "knowledge.provider".to_string(),
                message: format!("unsupported provider {}", self.knowledge.provider),
            });
        }

        let escalation = &self.escalation;
        if escalation.notifier == NotifierKind::Webhook
            && escalation
                .webhook_url
                .as_deref()
                .is_none_or(|url| url.trim().is_empty())
        {
            return Err(ConfigError::Invalid(
                "webhook notifier requires escalation.webhook_url".to_string(),
            ));
        }
        if escalation.notifier == NotifierKind::Webhook && escalation.webhook_timeout_secs == 0 {
            return Err(ConfigError::InvalidField {
                path: "escalation.webhook_timeout_secs".to_string(),
                message: "must be positive".to_string(),
            });
        }

        Ok(())
    }
}

fn config_from_layers(merged: Map<String, Value>) -> Result<HelpdeskConfig, ConfigError> {
    let config: HelpdeskConfig = serde_json::from_value(Value::Object(merged))?;
    config.validate()?;
    Ok(config)
}

fn file_layer(source: ConfigLayerSource, path: &Path) -> ConfigLayer {
    ConfigLayer {
        source,
        origin: path.display().to_string(),
    }
}

fn layer_label(source: ConfigLayerSource, path: &Path) -> String {
    let name = match source {
        ConfigLayerSource::User => "user",
        ConfigLayerSource::Project => "project",
        ConfigLayerSource::File => "file",
        ConfigLayerSource::Env => "env",
    };
    format!("{name}({})", path.display())
}
