//! Fog of war for tabletop maps.
//!
//! A [`Session`] owns a loaded map's layers and turns pointer input into edits of its fog layer,
//! saving the fog with a debounce and exchanging tokens and markers with observers over a
//! [`SyncChannel`].

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use instant::Instant;

pub mod area;
pub mod config;
mod error;
pub mod fog;
pub mod geometry;
pub mod image_coder;
pub mod input;
pub mod layers;
pub mod loader;
pub mod mask;
pub mod overlay;
pub mod paint;
pub mod persistence;
pub mod session;
pub mod settings;
pub mod store;
pub mod stroke;
pub mod sync;
pub mod viewport;

pub use error::*;
pub use session::{LiveStatus, Session};
pub use sync::SyncChannel;

use config::UserConfig;
use image_coder::ImageCoder;
use store::DirectoryStore;
use viewport::FixedViewport;

const USAGE: &str =
   "usage: fogcanv <map id> [export <output.png> | shroud-all | clear-all | live | hide]";

fn export(session: &Session, fog_opacity: f32, path: &Path) -> anyhow::Result<()> {
   let pixmap = session.composite(fog_opacity)?;
   let png = ImageCoder::encode_png_data(&ImageCoder::pixmap_to_image(&pixmap))?;
   std::fs::write(path, png).with_context(|| format!("cannot write {:?}", path))?;
   log::info!("exported to {:?}", path);
   Ok(())
}

/// The headless front-end: loads a map from the configured maps directory and runs a single
/// command on it.
pub fn main() -> anyhow::Result<()> {
   let mut args = std::env::args();
   args.next();
   let map_id = match args.next() {
      Some(map_id) => map_id,
      None => bail!(USAGE),
   };
   let command = args.next();

   let config = UserConfig::load_or_create()?;
   log::debug!("maps directory: {:?}", config.storage.maps_directory);
   let store = Arc::new(DirectoryStore::new(&config.storage.maps_directory));
   let mut session = Session::from_config(
      store,
      SyncChannel::loopback(),
      Box::new(FixedViewport::default()),
      &config,
   );

   session
      .load_map_blocking(&map_id, Instant::now())
      .with_context(|| format!("cannot load map {:?}", map_id))?;

   match command.as_deref() {
      None => {
         if let Some(layers) = session.layers() {
            let dimensions = layers.dimensions();
            println!(
               "{}: {}x{} (scaled by {}), {:?}",
               map_id,
               layers.fog().width(),
               layers.fog().height(),
               dimensions.ratio,
               session.live_status()
            );
         }
      }
      Some("export") => match args.next() {
         Some(path) => export(&session, config.layers.fog_opacity, Path::new(&path))?,
         None => bail!(USAGE),
      },
      Some("shroud-all") => session.shroud_all(Instant::now())?,
      Some("clear-all") => session.clear_all(Instant::now())?,
      Some("live") => session.send_live_map()?,
      Some("hide") => session.hide_map()?,
      Some(other) => bail!("unknown command {:?}\n{}", other, USAGE),
   }

   session.flush();
   Ok(())
}
