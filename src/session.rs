//! The editing session: one loaded map, the operator's tools, and everything they drive.
//!
//! All handlers run synchronously on the caller's thread and take the current time as an argument,
//! so the host decides what a clock is. The host is expected to call [`Session::tick`]
//! periodically, which finishes map loads, applies received sync events, and fires debounced
//! saves.

use std::sync::Arc;

use fogcanv_protocol::sync::{Event, MarkerId, TokenId};
use instant::{Duration, Instant};
use tiny_skia::Pixmap;

use crate::area::{AreaCompositor, AreaState};
use crate::config::UserConfig;
use crate::geometry::Point;
use crate::input::{Gesture, InputEvent};
use crate::layers::{LayerLimits, LayerStack};
use crate::loader::{self, LoadTask, LoadedMap};
use crate::mask::{build_mask, MaskKind};
use crate::paint::PaintOp;
use crate::persistence::PersistenceGate;
use crate::settings::{BrushShape, FogMode, SessionSettings, Tool};
use crate::store::MapStore;
use crate::stroke::{StrokeCompositor, StrokeState};
use crate::sync::{self, SyncChannel};
use crate::viewport::{CoordinateMapper, Viewport};
use crate::{Error, Result};

/// Whether the audience is looking at a map.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LiveStatus {
   NotLive,
   CurrentMapLive,
   OtherMapLive,
}

struct ActiveMap {
   map_id: String,
   layers: LayerStack,
   mapper: CoordinateMapper,
}

pub struct Session {
   store: Arc<dyn MapStore>,
   sync: SyncChannel,
   viewport: Box<dyn Viewport>,
   settings: SessionSettings,
   limits: LayerLimits,

   map: Option<ActiveMap>,
   loading: Option<LoadTask>,
   stroke: StrokeCompositor,
   area: AreaCompositor,
   gate: PersistenceGate,
   live_map_id: Option<String>,
}

impl Session {
   pub fn new(
      store: Arc<dyn MapStore>,
      sync: SyncChannel,
      mut viewport: Box<dyn Viewport>,
      settings: SessionSettings,
   ) -> Self {
      viewport.set_enabled(settings.tool == Tool::Move);
      let live_map_id = match store.live_map() {
         Ok(id) => id,
         Err(error) => {
            log::warn!("could not query the live map: {}", error);
            None
         }
      };
      Self {
         store,
         sync,
         viewport,
         settings,
         limits: LayerLimits::default(),
         map: None,
         loading: None,
         stroke: StrokeCompositor::new(),
         area: AreaCompositor::new(),
         gate: PersistenceGate::default(),
         live_map_id,
      }
   }

   /// Creates a session with the settings and limits from the user's config.
   pub fn from_config(
      store: Arc<dyn MapStore>,
      sync: SyncChannel,
      viewport: Box<dyn Viewport>,
      config: &UserConfig,
   ) -> Self {
      Self::new(store, sync, viewport, config.session.settings())
         .with_limits(config.layers.limits())
         .with_save_debounce(config.persistence.save_debounce())
   }

   pub fn with_limits(mut self, limits: LayerLimits) -> Self {
      self.limits = limits;
      self
   }

   pub fn with_save_debounce(mut self, interval: Duration) -> Self {
      self.gate = PersistenceGate::new(interval);
      self
   }

   pub fn settings(&self) -> &SessionSettings {
      &self.settings
   }

   pub fn viewport(&self) -> &dyn Viewport {
      self.viewport.as_ref()
   }

   pub fn viewport_mut(&mut self) -> &mut dyn Viewport {
      self.viewport.as_mut()
   }

   pub fn map_id(&self) -> Option<&str> {
      self.map.as_ref().map(|map| map.map_id.as_str())
   }

   pub fn layers(&self) -> Option<&LayerStack> {
      self.map.as_ref().map(|map| &map.layers)
   }

   pub fn stroke_state(&self) -> StrokeState {
      self.stroke.state()
   }

   pub fn area_state(&self) -> AreaState {
      self.area.state()
   }

   pub fn is_loading(&self) -> bool {
      self.loading.is_some()
   }

   pub fn is_save_pending(&self) -> bool {
      self.gate.is_pending()
   }

   // Settings

   /// Switches tools. Pan and zoom are only available with the move tool.
   pub fn set_tool(&mut self, tool: Tool, now: Instant) {
      if tool == self.settings.tool {
         return;
      }
      log::debug!("tool changed to {}", tool);
      self.abandon_stroke(now);
      self.area.cancel();
      self.clear_cursor();
      self.settings.tool = tool;
      self.viewport.set_enabled(tool == Tool::Move);
   }

   pub fn set_brush_shape(&mut self, shape: BrushShape) {
      self.settings.brush.shape = shape;
   }

   pub fn set_line_width(&mut self, line_width: f64) {
      self.settings.brush.set_line_width(line_width);
   }

   pub fn set_mode(&mut self, mode: FogMode) {
      self.settings.brush.mode = mode;
   }

   /// Flips between revealing and shrouding.
   pub fn toggle_mode(&mut self) {
      self.settings.brush.mode = self.settings.brush.mode.toggled();
   }

   pub fn set_token_id(&mut self, id: u32) {
      self.settings.set_token_id(id);
   }

   pub fn set_token_size(&mut self, size: f64) {
      self.settings.set_token_size(size);
   }

   // Map lifecycle

   /// Starts loading a map in the background, unloading the current one.
   ///
   /// The map is installed by a later [`tick`][Self::tick] once it has loaded.
   pub fn load_map(&mut self, map_id: &str) {
      self.teardown();
      self.loading = Some(LoadTask::spawn(Arc::clone(&self.store), map_id));
   }

   /// Loads a map on the current thread, unloading the current one.
   pub fn load_map_blocking(&mut self, map_id: &str, now: Instant) -> Result<()> {
      self.teardown();
      let loaded = loader::load_map(self.store.as_ref(), map_id)?;
      self.install(loaded, now)
   }

   fn install(&mut self, loaded: LoadedMap, now: Instant) -> Result<()> {
      let layers = LayerStack::new(&loaded.background, loaded.fog.as_ref(), self.limits)?;
      let dimensions = layers.dimensions();
      self.viewport.auto_center(dimensions.width as f32, dimensions.height as f32);
      log::info!(
         "map {:?} loaded at {}x{}",
         loaded.map_id,
         layers.fog().width(),
         layers.fog().height()
      );
      self.map = Some(ActiveMap {
         map_id: loaded.map_id,
         layers,
         mapper: CoordinateMapper::new(dimensions.display_ratio()),
      });
      if loaded.fog.is_none() {
         // Persist the initial shroud, so that observers see a fully fogged map.
         self.gate.schedule(now);
      }
      Ok(())
   }

   /// Unloads the current map and abandons any map being loaded.
   ///
   /// A pending save is dropped, not forced: the last edit is lost unless its save already fired.
   pub fn teardown(&mut self) {
      if let Some(mut task) = self.loading.take() {
         task.cancel();
      }
      self.gate.cancel();
      self.stroke.cancel();
      self.area.cancel();
      if let Some(map) = self.map.take() {
         log::info!("unloading map {:?}", map.map_id);
      }
   }

   /// Performs periodic work: installs loaded maps, applies received sync events, and saves the
   /// fog once the debounce interval has passed.
   pub fn tick(&mut self, now: Instant) -> Result<()> {
      if let Some(task) = self.loading.as_mut() {
         if let Some(result) = task.poll() {
            self.loading = None;
            self.install(result?, now)?;
         }
      }
      self.drain_sync();
      if self.gate.poll(now) {
         self.save_now();
      }
      Ok(())
   }

   /// Saves the fog right away if a save is pending.
   pub fn flush(&mut self) {
      if self.gate.flush() {
         self.save_now();
      }
   }

   fn save_now(&self) {
      let map = match &self.map {
         Some(map) => map,
         None => return,
      };
      let saved = map.layers.fog().snapshot().and_then(|payload| {
         self.store.save_fog(&map.map_id, &payload)
      });
      match saved {
         Ok(()) => log::info!("fog of {:?} saved", map.map_id),
         Err(error) => log::error!("could not save the fog of {:?}: {}", map.map_id, error),
      }
   }

   // Whole-map edits

   pub fn shroud_all(&mut self, now: Instant) -> Result<()> {
      let map = self.map.as_mut().ok_or(Error::NoMapLoaded)?;
      map.layers.fog_mut().shroud_all();
      self.gate.schedule(now);
      Ok(())
   }

   pub fn clear_all(&mut self, now: Instant) -> Result<()> {
      let map = self.map.as_mut().ok_or(Error::NoMapLoaded)?;
      map.layers.fog_mut().clear_all();
      self.gate.schedule(now);
      Ok(())
   }

   /// Renders the map with its fog for previewing.
   pub fn composite(&self, fog_opacity: f32) -> Result<Pixmap> {
      let map = self.map.as_ref().ok_or(Error::NoMapLoaded)?;
      Ok(map.layers.composite(fog_opacity))
   }

   // Live map

   /// Shows the current map and its fog to the audience.
   pub fn send_live_map(&mut self) -> Result<()> {
      let map = self.map.as_ref().ok_or(Error::NoMapLoaded)?;
      let payload = map.layers.fog().snapshot()?;
      self.store.send_live_map(&map.map_id, &payload)?;
      log::info!("map {:?} is now live", map.map_id);
      self.live_map_id = Some(map.map_id.clone());
      Ok(())
   }

   pub fn hide_map(&mut self) -> Result<()> {
      self.store.hide_live_map()?;
      log::info!("live map hidden");
      self.live_map_id = None;
      Ok(())
   }

   pub fn live_status(&self) -> LiveStatus {
      match (&self.live_map_id, self.map_id()) {
         (None, _) => LiveStatus::NotLive,
         (Some(live), Some(current)) if live == current => LiveStatus::CurrentMapLive,
         (Some(_), _) => LiveStatus::OtherMapLive,
      }
   }

   // Tokens and markers

   /// Asks observers to remove the token with the currently selected id.
   pub fn remove_token(&mut self) -> Result<()> {
      self.sync.send(Event::RemoveToken {
         id: TokenId(self.settings.token_id()),
      })
   }

   /// Removes a marker from the local overlay.
   pub fn remove_marker(&mut self, id: &MarkerId) -> bool {
      match self.map.as_mut() {
         Some(map) => map.layers.overlay_mut().remove_marker(id),
         None => false,
      }
   }

   fn drain_sync(&mut self) {
      while let Some(event) = self.sync.recv() {
         match self.map.as_mut() {
            Some(map) => {
               let ratio = map.layers.dimensions().ratio;
               sync::apply_inbound(map.layers.overlay_mut(), event, ratio);
            }
            None => log::debug!("no map loaded, dropping {}", event.name()),
         }
      }
   }

   // Input

   fn to_display(&mut self, page: Point) -> Result<Point> {
      let map = self.map.as_mut().ok_or(Error::NoMapLoaded)?;
      map.mapper.to_display(self.viewport.as_ref(), page)
   }

   fn to_raster(&mut self, page: Point) -> Result<Point> {
      let map = self.map.as_mut().ok_or(Error::NoMapLoaded)?;
      map.mapper.to_raster(self.viewport.as_ref(), page)
   }

   fn paint(&mut self, ops: &[PaintOp]) {
      if let Some(map) = self.map.as_mut() {
         map.layers.fog_mut().apply_all(ops);
      }
   }

   fn clear_cursor(&mut self) {
      if let Some(map) = self.map.as_mut() {
         map.layers.clear_cursor();
      }
   }

   fn draw_cursor(&mut self, at: Point) {
      let settings = self.settings;
      let layers = match self.map.as_mut() {
         Some(map) => &mut map.layers,
         None => return,
      };
      match settings.tool {
         Tool::Brush => layers.draw_cursor(&build_mask(at, &settings.brush, MaskKind::Brush)),
         Tool::Tokens => layers.draw_cursor(&build_mask(
            at,
            &settings.brush,
            MaskKind::Token {
               radius: settings.token_size(),
            },
         )),
         Tool::Area => match self.area.preview() {
            Some((from, to)) => layers.draw_area_preview(from, to),
            None => layers.draw_crosshair(at),
         },
         Tool::Move | Tool::Mark => (),
      }
   }

   /// Handles an input event. Events arriving while no map is loaded are ignored.
   pub fn handle(&mut self, event: &InputEvent, now: Instant) -> Result<()> {
      let gesture = match event.gesture() {
         Some(gesture) => gesture,
         None => return Ok(()),
      };
      if self.map.is_none() {
         return Ok(());
      }
      match self.settings.tool {
         Tool::Move => {
            if gesture == Gesture::Leave {
               self.clear_cursor();
            }
            Ok(())
         }
         Tool::Brush => self.handle_brush(gesture, now),
         Tool::Area => self.handle_area(gesture, now),
         Tool::Mark | Tool::Tokens => self.handle_placement(gesture),
      }
   }

   fn handle_brush(&mut self, gesture: Gesture, now: Instant) -> Result<()> {
      let brush = self.settings.brush;
      match gesture {
         Gesture::Down(page) => {
            let at = self.to_raster(page)?;
            let ops = self.stroke.begin(at, &brush);
            self.paint(&ops);
            self.draw_cursor(at);
         }
         Gesture::Move(page) => {
            let at = self.to_raster(page)?;
            match self.stroke.extend(at, &brush) {
               Ok(ops) => self.paint(&ops),
               Err(error) => {
                  log::error!("stroke aborted: {}", error);
                  self.abandon_stroke(now);
                  return Err(error);
               }
            }
            self.draw_cursor(at);
         }
         Gesture::Up => {
            if let Some(ops) = self.stroke.finish(&brush) {
               self.paint(&ops);
               self.gate.schedule(now);
            }
         }
         Gesture::Leave => {
            // Leaving ends the stroke without any guarantee of a pointer-up, so save right away.
            if let Some(ops) = self.stroke.finish(&brush) {
               self.paint(&ops);
               self.gate.flush();
               self.save_now();
            }
            self.clear_cursor();
         }
         Gesture::Cancel => self.abandon_stroke(now),
         Gesture::Click(_) => (),
      }
      Ok(())
   }

   /// Drops the stroke in progress. Whatever it painted so far stays, so it still needs saving.
   fn abandon_stroke(&mut self, now: Instant) {
      if self.stroke.has_pending() {
         self.stroke.cancel();
         self.gate.schedule(now);
      }
   }

   fn handle_area(&mut self, gesture: Gesture, now: Instant) -> Result<()> {
      match gesture {
         Gesture::Down(page) => {
            let at = self.to_raster(page)?;
            self.area.begin(at);
            self.draw_cursor(at);
         }
         Gesture::Move(page) => {
            let at = self.to_raster(page)?;
            self.area.update(at);
            self.draw_cursor(at);
         }
         Gesture::Up => {
            if let Some(op) = self.area.commit(&self.settings.brush) {
               self.paint(&[op]);
               self.gate.schedule(now);
            }
            self.clear_cursor();
         }
         Gesture::Leave | Gesture::Cancel => {
            self.area.cancel();
            self.clear_cursor();
         }
         Gesture::Click(_) => (),
      }
      Ok(())
   }

   fn handle_placement(&mut self, gesture: Gesture) -> Result<()> {
      match gesture {
         Gesture::Click(page) => {
            let display = self.to_display(page)?;
            let ratio = self.map.as_ref().ok_or(Error::NoMapLoaded)?.layers.dimensions().ratio;
            let wire = sync::to_wire(display, ratio);
            let event = match self.settings.tool {
               Tool::Tokens => Event::AddToken {
                  id: TokenId(self.settings.token_id()),
                  x: wire.x,
                  y: wire.y,
                  radius: self.settings.token_size(),
               },
               _ => Event::MarkArea {
                  id: None,
                  x: wire.x,
                  y: wire.y,
               },
            };
            self.sync.send(event)?;
         }
         Gesture::Move(page) if self.settings.tool == Tool::Tokens => {
            let at = self.to_raster(page)?;
            self.draw_cursor(at);
         }
         Gesture::Leave => self.clear_cursor(),
         _ => (),
      }
      Ok(())
   }
}

#[cfg(test)]
mod tests {
   use image::{Rgba, RgbaImage};

   use super::*;
   use crate::image_coder::ImageCoder;
   use crate::input::Key;
   use crate::store::MemoryStore;
   use crate::viewport::FixedViewport;

   fn session_with_map(width: u32, height: u32) -> (Session, Arc<MemoryStore>, SyncChannel) {
      let store = Arc::new(MemoryStore::new());
      let png = ImageCoder::encode_png_data(&RgbaImage::from_pixel(
         width,
         height,
         Rgba([90, 120, 60, 255]),
      ))
      .unwrap();
      store.insert_map("map", png);
      let (ours, theirs) = SyncChannel::pair();
      let mut session = Session::new(
         store.clone(),
         ours,
         Box::new(FixedViewport::default()),
         SessionSettings::default(),
      )
      .with_limits(LayerLimits {
         max_width: width as f64,
         max_height: height as f64,
      });
      session.load_map_blocking("map", Instant::now()).unwrap();
      (session, store, theirs)
   }

   #[test]
   fn missing_fog_is_shrouded_and_saved() {
      let (mut session, store, _) = session_with_map(32, 16);
      assert_eq!(session.layers().unwrap().fog().alpha_at(10, 10), Some(255));
      assert!(session.is_save_pending());
      session.tick(Instant::now() + Duration::from_secs(1)).unwrap();
      assert_eq!(store.save_count(), 1);
      assert!(store.fog("map").is_some());
   }

   #[test]
   fn move_tool_enables_the_viewport() {
      let (mut session, _, _) = session_with_map(32, 16);
      let now = Instant::now();
      session.set_tool(Tool::Move, now);
      assert!(session.viewport().is_enabled());
      session.set_tool(Tool::Area, now);
      assert!(!session.viewport().is_enabled());
   }

   #[test]
   fn escape_resets_the_area_tool() {
      let (mut session, _, _) = session_with_map(64, 64);
      let now = Instant::now();
      session.set_tool(Tool::Area, now);
      session.handle(&InputEvent::PointerDown(Point::new(5.0, 5.0)), now).unwrap();
      session.handle(&InputEvent::PointerMove(Point::new(30.0, 30.0)), now).unwrap();
      assert!(session.layers().unwrap().has_cursor());
      session.handle(&InputEvent::Key(Key::Escape), now).unwrap();
      assert_eq!(session.area_state(), AreaState::default());
      assert!(!session.layers().unwrap().has_cursor());
      session.handle(&InputEvent::PointerUp(Point::new(30.0, 30.0)), now).unwrap();
      assert_eq!(session.layers().unwrap().fog().alpha_at(20, 20), Some(255));
   }

   #[test]
   fn live_status_follows_the_loaded_map() {
      let (mut session, store, _) = session_with_map(8, 8);
      assert_eq!(session.live_status(), LiveStatus::NotLive);
      session.send_live_map().unwrap();
      assert_eq!(session.live_status(), LiveStatus::CurrentMapLive);
      assert_eq!(store.live().unwrap().map_id, "map");
      session.teardown();
      assert_eq!(session.live_status(), LiveStatus::OtherMapLive);
      session.hide_map().unwrap();
      assert_eq!(session.live_status(), LiveStatus::NotLive);
      assert!(store.live().is_none());
   }

   #[test]
   fn edits_require_a_map() {
      let (mut session, _, _) = session_with_map(8, 8);
      session.teardown();
      assert!(matches!(session.shroud_all(Instant::now()), Err(Error::NoMapLoaded)));
      assert!(matches!(session.send_live_map(), Err(Error::NoMapLoaded)));
      session.handle(&InputEvent::PointerDown(Point::new(1.0, 1.0)), Instant::now()).unwrap();
   }
}
