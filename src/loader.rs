//! Fetching and decoding maps off the main thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::channel::oneshot;
use image::RgbaImage;

use crate::image_coder::ImageCoder;
use crate::store::MapStore;
use crate::{Error, Result};

/// A decoded map, ready to be turned into layers.
pub struct LoadedMap {
   pub map_id: String,
   pub background: RgbaImage,
   /// The previously saved fog, if there is any usable one.
   pub fog: Option<RgbaImage>,
}

/// Fetches and decodes a map.
///
/// A missing or broken background is an error. A missing or broken fog image is not; the map
/// simply starts out fully shrouded.
pub fn load_map(store: &dyn MapStore, map_id: &str) -> Result<LoadedMap> {
   log::info!("loading map {:?}", map_id);
   let background = ImageCoder::decode_image_data(&store.load_map_image(map_id)?)?;
   let fog = match store.load_fog_image(map_id).and_then(|payload| match payload {
      Some(payload) => ImageCoder::decode_payload(&payload).map(Some),
      None => Ok(None),
   }) {
      Ok(fog) => fog,
      Err(error) => {
         log::warn!("could not load the fog of {:?}, starting out shrouded: {}", map_id, error);
         None
      }
   };
   Ok(LoadedMap {
      map_id: map_id.to_owned(),
      background,
      fog,
   })
}

/// A map being loaded on a background thread.
///
/// Dropping or cancelling the task abandons the load; its result is never delivered.
pub struct LoadTask {
   map_id: String,
   result_rx: oneshot::Receiver<Result<LoadedMap>>,
   cancelled: Arc<AtomicBool>,
}

impl LoadTask {
   pub fn spawn(store: Arc<dyn MapStore>, map_id: &str) -> Self {
      let (result_tx, result_rx) = oneshot::channel();
      let cancelled = Arc::new(AtomicBool::new(false));
      let thread_cancelled = Arc::clone(&cancelled);
      let thread_map_id = map_id.to_owned();
      std::thread::spawn(move || {
         let result = load_map(store.as_ref(), &thread_map_id);
         if thread_cancelled.load(Ordering::SeqCst) {
            log::debug!("load of {:?} was cancelled, dropping the result", thread_map_id);
            return;
         }
         // The receiver may already be gone, in which case nobody's interested anymore.
         let _ = result_tx.send(result);
      });
      Self {
         map_id: map_id.to_owned(),
         result_rx,
         cancelled,
      }
   }

   pub fn map_id(&self) -> &str {
      &self.map_id
   }

   pub fn cancel(&mut self) {
      log::debug!("cancelling load of {:?}", self.map_id);
      self.cancelled.store(true, Ordering::SeqCst);
      self.result_rx.close();
   }

   /// Checks whether the load finished, without blocking.
   pub fn poll(&mut self) -> Option<Result<LoadedMap>> {
      if self.cancelled.load(Ordering::SeqCst) {
         return Some(Err(Error::LoadCancelled));
      }
      match self.result_rx.try_recv() {
         Ok(Some(result)) => Some(result),
         Ok(None) => None,
         Err(oneshot::Canceled) => Some(Err(Error::LoadCancelled)),
      }
   }

   /// Blocks until the load finishes.
   pub fn wait(mut self) -> Result<LoadedMap> {
      futures::executor::block_on(&mut self.result_rx).map_err(|_| Error::LoadCancelled)?
   }
}

impl Drop for LoadTask {
   fn drop(&mut self) {
      self.cancelled.store(true, Ordering::SeqCst);
   }
}
