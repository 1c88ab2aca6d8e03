//! Where maps come from and where fog goes to.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use fogcanv_protocol::fog::FogPayload;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A backend storing map images and fog snapshots, keyed by map id.
pub trait MapStore: Send + Sync {
   /// Fetches the encoded background image of a map.
   fn load_map_image(&self, map_id: &str) -> Result<Vec<u8>>;

   /// Fetches the last saved fog of a map. A map that was never saved has no fog.
   fn load_fog_image(&self, map_id: &str) -> Result<Option<FogPayload>>;

   fn save_fog(&self, map_id: &str, payload: &FogPayload) -> Result<()>;

   /// Shows the map with the given fog to the audience.
   fn send_live_map(&self, map_id: &str, payload: &FogPayload) -> Result<()>;

   /// Stops showing any map to the audience.
   fn hide_live_map(&self) -> Result<()>;

   /// Returns the id of the map currently shown to the audience.
   fn live_map(&self) -> Result<Option<String>>;
}

/// The map currently shown to the audience.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct LiveMap {
   pub map_id: String,
   pub fog: FogPayload,
}

/// A store keeping each map in its own directory.
///
/// ```text
/// <root>/
///    live.json
///    <map id>/
///       map.png (or .jpg, .jpeg, .webp)
///       fog.json
/// ```
pub struct DirectoryStore {
   root: PathBuf,
}

impl DirectoryStore {
   pub const MAP_EXTENSIONS: &'static [&'static str] = &["png", "jpg", "jpeg", "webp"];

   pub fn new(root: impl Into<PathBuf>) -> Self {
      Self { root: root.into() }
   }

   pub fn root(&self) -> &Path {
      &self.root
   }

   fn map_dir(&self, map_id: &str) -> PathBuf {
      self.root.join(map_id)
   }

   fn fog_path(&self, map_id: &str) -> PathBuf {
      self.map_dir(map_id).join("fog.json")
   }

   fn live_path(&self) -> PathBuf {
      self.root.join("live.json")
   }

   /// Lists the ids of all maps that have a background image.
   pub fn map_ids(&self) -> Result<Vec<String>> {
      let mut ids = Vec::new();
      for entry in std::fs::read_dir(&self.root)? {
         let entry = entry?;
         if !entry.file_type()?.is_dir() {
            continue;
         }
         if let Some(id) = entry.file_name().to_str() {
            if self.find_map_image(id).is_some() {
               ids.push(id.to_owned());
            }
         }
      }
      ids.sort();
      Ok(ids)
   }

   fn find_map_image(&self, map_id: &str) -> Option<PathBuf> {
      let dir = self.map_dir(map_id);
      Self::MAP_EXTENSIONS
         .iter()
         .map(|extension| dir.join("map").with_extension(extension))
         .find(|path| path.is_file())
   }

   fn read_optional(path: &Path) -> Result<Option<String>> {
      match std::fs::read_to_string(path) {
         Ok(text) => Ok(Some(text)),
         Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(None),
         Err(error) => Err(error.into()),
      }
   }
}

impl MapStore for DirectoryStore {
   fn load_map_image(&self, map_id: &str) -> Result<Vec<u8>> {
      let path = self.find_map_image(map_id).ok_or_else(|| Error::MapNotFound(map_id.to_owned()))?;
      log::debug!("reading map image from {:?}", path);
      Ok(std::fs::read(path)?)
   }

   fn load_fog_image(&self, map_id: &str) -> Result<Option<FogPayload>> {
      match Self::read_optional(&self.fog_path(map_id))? {
         Some(json) => Ok(Some(serde_json::from_str(&json)?)),
         None => Ok(None),
      }
   }

   fn save_fog(&self, map_id: &str, payload: &FogPayload) -> Result<()> {
      std::fs::create_dir_all(self.map_dir(map_id))?;
      std::fs::write(self.fog_path(map_id), serde_json::to_string(payload)?)?;
      Ok(())
   }

   fn send_live_map(&self, map_id: &str, payload: &FogPayload) -> Result<()> {
      let live = LiveMap {
         map_id: map_id.to_owned(),
         fog: payload.clone(),
      };
      std::fs::create_dir_all(&self.root)?;
      std::fs::write(self.live_path(), serde_json::to_string(&live)?)?;
      Ok(())
   }

   fn hide_live_map(&self) -> Result<()> {
      match std::fs::remove_file(self.live_path()) {
         Ok(()) => Ok(()),
         Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
         Err(error) => Err(error.into()),
      }
   }

   fn live_map(&self) -> Result<Option<String>> {
      match Self::read_optional(&self.live_path())? {
         Some(json) => {
            let live: LiveMap = serde_json::from_str(&json)?;
            Ok(Some(live.map_id))
         }
         None => Ok(None),
      }
   }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
   mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A store that keeps everything in memory.
#[derive(Default)]
pub struct MemoryStore {
   maps: Mutex<HashMap<String, Vec<u8>>>,
   fogs: Mutex<HashMap<String, FogPayload>>,
   live: Mutex<Option<LiveMap>>,
   saves: AtomicUsize,
}

impl MemoryStore {
   pub fn new() -> Self {
      Self::default()
   }

   /// Adds a map with the given encoded background image.
   pub fn insert_map(&self, map_id: &str, image: Vec<u8>) {
      lock(&self.maps).insert(map_id.to_owned(), image);
   }

   pub fn insert_fog(&self, map_id: &str, payload: FogPayload) {
      lock(&self.fogs).insert(map_id.to_owned(), payload);
   }

   pub fn fog(&self, map_id: &str) -> Option<FogPayload> {
      lock(&self.fogs).get(map_id).cloned()
   }

   pub fn live(&self) -> Option<LiveMap> {
      lock(&self.live).clone()
   }

   /// How many times fog was saved.
   pub fn save_count(&self) -> usize {
      self.saves.load(Ordering::SeqCst)
   }
}

impl MapStore for MemoryStore {
   fn load_map_image(&self, map_id: &str) -> Result<Vec<u8>> {
      lock(&self.maps).get(map_id).cloned().ok_or_else(|| Error::MapNotFound(map_id.to_owned()))
   }

   fn load_fog_image(&self, map_id: &str) -> Result<Option<FogPayload>> {
      Ok(self.fog(map_id))
   }

   fn save_fog(&self, map_id: &str, payload: &FogPayload) -> Result<()> {
      self.insert_fog(map_id, payload.clone());
      self.saves.fetch_add(1, Ordering::SeqCst);
      Ok(())
   }

   fn send_live_map(&self, map_id: &str, payload: &FogPayload) -> Result<()> {
      *lock(&self.live) = Some(LiveMap {
         map_id: map_id.to_owned(),
         fog: payload.clone(),
      });
      Ok(())
   }

   fn hide_live_map(&self) -> Result<()> {
      *lock(&self.live) = None;
      Ok(())
   }

   fn live_map(&self) -> Result<Option<String>> {
      Ok(self.live().map(|live| live.map_id))
   }
}
