//! User configuration.
//!
//! ## Note for adding new keys
//!
//! New keys added to the config _must_ use `#[serde(default)]` to maintain compatibility with
//! older configs. These keys will be added to the user's configuration automatically.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use instant::Duration;
use serde::{Deserialize, Serialize};

use crate::layers::LayerLimits;
use crate::settings::{BrushSettings, BrushShape, FogMode, SessionSettings, Tool};

/// The tool and brush the session starts with. Saved whenever they change.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
   pub tool: Tool,
   pub brush_shape: BrushShape,
   pub line_width: f64,
   pub mode: FogMode,
   pub token_id: u32,
   pub token_size: f64,
}

impl SessionConfig {
   pub fn settings(&self) -> SessionSettings {
      SessionSettings::new(
         self.tool,
         BrushSettings::new(self.brush_shape, self.line_width, self.mode),
         self.token_id,
         self.token_size,
      )
   }

   pub fn set_settings(&mut self, settings: &SessionSettings) {
      self.tool = settings.tool;
      self.brush_shape = settings.brush.shape;
      self.line_width = settings.brush.line_width();
      self.mode = settings.brush.mode;
      self.token_id = settings.token_id();
      self.token_size = settings.token_size();
   }
}

impl Default for SessionConfig {
   fn default() -> Self {
      let mut config = Self {
         tool: Tool::default(),
         brush_shape: BrushShape::default(),
         line_width: 0.0,
         mode: FogMode::default(),
         token_id: 0,
         token_size: 0.0,
      };
      config.set_settings(&SessionSettings::default());
      config
   }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
   /// Where the directory map store keeps its maps.
   pub maps_directory: PathBuf,
}

impl Default for StorageConfig {
   fn default() -> Self {
      Self {
         maps_directory: UserConfig::data_dir().join("maps"),
      }
   }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PersistenceConfig {
   /// How long the fog has to stay untouched before it's saved.
   pub save_debounce_ms: u64,
}

impl PersistenceConfig {
   pub fn save_debounce(&self) -> Duration {
      Duration::from_millis(self.save_debounce_ms)
   }
}

impl Default for PersistenceConfig {
   fn default() -> Self {
      Self {
         save_debounce_ms: 500,
      }
   }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LayersConfig {
   pub max_width: f64,
   pub max_height: f64,
   /// The opacity of the fog when previewing the map.
   pub fog_opacity: f32,
}

impl LayersConfig {
   pub fn limits(&self) -> LayerLimits {
      LayerLimits {
         max_width: self.max_width,
         max_height: self.max_height,
      }
   }
}

impl Default for LayersConfig {
   fn default() -> Self {
      let limits = LayerLimits::default();
      Self {
         max_width: limits.max_width,
         max_height: limits.max_height,
         fog_opacity: 0.5,
      }
   }
}

/// A user `config.toml` file.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct UserConfig {
   #[serde(default)]
   pub session: SessionConfig,
   #[serde(default)]
   pub storage: StorageConfig,
   #[serde(default)]
   pub persistence: PersistenceConfig,
   #[serde(default)]
   pub layers: LayersConfig,
}

impl UserConfig {
   fn project_dirs() -> Option<ProjectDirs> {
      ProjectDirs::from("", "", "FogCanv")
   }

   /// Returns the platform-specific configuration directory.
   pub fn config_dir() -> PathBuf {
      match Self::project_dirs() {
         Some(dirs) => dirs.config_dir().to_owned(),
         None => PathBuf::from(".fogcanv"),
      }
   }

   /// Returns the platform-specific data directory.
   pub fn data_dir() -> PathBuf {
      match Self::project_dirs() {
         Some(dirs) => dirs.data_dir().to_owned(),
         None => PathBuf::from(".fogcanv"),
      }
   }

   /// Returns the path to the `config.toml` file.
   pub fn path() -> PathBuf {
      Self::config_dir().join("config.toml")
   }

   /// Loads the `config.toml` file from the platform-specific configuration directory.
   pub fn load_or_create() -> anyhow::Result<Self> {
      Self::load_or_create_at(&Self::path())
   }

   /// Loads the config file at `path`.
   ///
   /// If the file doesn't exist, it's created with values inherited from `UserConfig::default`.
   pub fn load_or_create_at(path: &Path) -> anyhow::Result<Self> {
      if let Some(dir) = path.parent() {
         std::fs::create_dir_all(dir)?;
      }
      if !path.is_file() {
         let config = Self::default();
         config.save_at(path)?;
         Ok(config)
      } else {
         let file = std::fs::read_to_string(path)?;
         let config: Self = match toml::from_str(&file) {
            Ok(config) => config,
            Err(error) => {
               log::warn!("error while deserializing config file: {}", error);
               log::warn!("falling back to default config");
               return Ok(Self::default());
            }
         };
         // Preemptively save the config to the disk if any new keys have been added.
         config.save_at(path)?;
         Ok(config)
      }
   }

   /// Saves the user configuration to the `config.toml` file.
   pub fn save(&self) -> anyhow::Result<()> {
      self.save_at(&Self::path())
   }

   pub fn save_at(&self, path: &Path) -> anyhow::Result<()> {
      std::fs::write(path, toml::to_string(self)?)?;
      Ok(())
   }
}
