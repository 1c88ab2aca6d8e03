//! Whole sessions driven by input events, against an in-memory store.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use fogcanv::fog::FogLayer;
use fogcanv::geometry::Point;
use fogcanv::image_coder::ImageCoder;
use fogcanv::input::{InputEvent, Key};
use fogcanv::layers::LayerLimits;
use fogcanv::overlay::Token;
use fogcanv::settings::{SessionSettings, Tool};
use fogcanv::store::MemoryStore;
use fogcanv::viewport::FixedViewport;
use fogcanv::{Error, Session, SyncChannel};
use fogcanv_protocol::sync::{Event, TokenId};
use image::{Rgba, RgbaImage};
use instant::{Duration, Instant};
use pretty_assertions::assert_eq;

const WIDTH: u32 = 400;
const HEIGHT: u32 = 200;

fn png(width: u32, height: u32) -> Vec<u8> {
   ImageCoder::encode_png_data(&RgbaImage::from_pixel(width, height, Rgba([60, 90, 30, 255])))
      .unwrap()
}

/// A store with one map, whose fog was saved fully shrouded.
fn store() -> Arc<MemoryStore> {
   let store = Arc::new(MemoryStore::new());
   store.insert_map("map", png(WIDTH, HEIGHT));
   store.insert_fog("map", FogLayer::shrouded(WIDTH, HEIGHT).unwrap().snapshot().unwrap());
   store
}

fn session(store: &Arc<MemoryStore>, limits: LayerLimits) -> (Session, SyncChannel) {
   let (ours, theirs) = SyncChannel::pair();
   let session = Session::new(
      store.clone(),
      ours,
      Box::new(FixedViewport::default()),
      SessionSettings::default(),
   )
   .with_limits(limits);
   (session, theirs)
}

fn native_limits() -> LayerLimits {
   LayerLimits {
      max_width: WIDTH as f64,
      max_height: HEIGHT as f64,
   }
}

fn stroke(session: &mut Session, from: Point, to: Point, now: Instant) {
   session.handle(&InputEvent::PointerDown(from), now).unwrap();
   session.handle(&InputEvent::PointerMove(to), now).unwrap();
   session.handle(&InputEvent::PointerUp(to), now).unwrap();
}

fn fog_alpha(session: &Session, x: u32, y: u32) -> Option<u8> {
   session.layers().unwrap().fog().alpha_at(x, y)
}

#[test]
fn restored_fog_needs_no_initial_save() {
   let store = store();
   let (mut session, _) = session(&store, native_limits());
   let now = Instant::now();
   session.load_map_blocking("map", now).unwrap();
   assert!(!session.is_save_pending());
   session.tick(now + Duration::from_secs(5)).unwrap();
   assert_eq!(store.save_count(), 0);
}

#[test]
fn rapid_edits_coalesce_into_one_save() {
   let store = store();
   let (mut session, _) = session(&store, native_limits());
   let start = Instant::now();
   session.load_map_blocking("map", start).unwrap();

   let mut now = start;
   for i in 0..8 {
      now = start + Duration::from_millis(i * 100);
      let x = 20.0 + i as f64 * 30.0;
      stroke(&mut session, Point::new(x, 50.0), Point::new(x + 10.0, 60.0), now);
      session.tick(now).unwrap();
   }
   assert_eq!(store.save_count(), 0);
   session.tick(now + Duration::from_millis(600)).unwrap();
   assert_eq!(store.save_count(), 1);
   session.tick(now + Duration::from_secs(10)).unwrap();
   assert_eq!(store.save_count(), 1);
}

#[test]
fn spaced_edits_save_each_time() {
   let store = store();
   let (mut session, _) = session(&store, native_limits());
   let start = Instant::now();
   session.load_map_blocking("map", start).unwrap();

   for i in 0..4 {
      let now = start + Duration::from_secs(i);
      let x = 20.0 + i as f64 * 30.0;
      stroke(&mut session, Point::new(x, 50.0), Point::new(x + 10.0, 60.0), now);
      session.tick(now + Duration::from_millis(600)).unwrap();
   }
   assert_eq!(store.save_count(), 4);

   // The saved snapshot is taken when the save fires, so it contains the last stroke.
   let saved = ImageCoder::decode_payload(&store.fog("map").unwrap()).unwrap();
   assert_eq!(saved.get_pixel(115, 55).0[3], 0);
}

#[test]
fn leaving_mid_stroke_saves_immediately() {
   let store = store();
   let (mut session, _) = session(&store, native_limits());
   let now = Instant::now();
   session.load_map_blocking("map", now).unwrap();

   session.handle(&InputEvent::PointerDown(Point::new(50.0, 50.0)), now).unwrap();
   session.handle(&InputEvent::PointerMove(Point::new(90.0, 50.0)), now).unwrap();
   session.handle(&InputEvent::PointerLeave, now).unwrap();
   assert_eq!(store.save_count(), 1);
   assert!(!session.is_save_pending());
   assert!(!session.stroke_state().is_drawing);
   assert!(!session.layers().unwrap().has_cursor());
}

#[test]
fn escaping_mid_stroke_still_saves_what_was_painted() {
   let store = store();
   let (mut session, _) = session(&store, native_limits());
   let now = Instant::now();
   session.load_map_blocking("map", now).unwrap();

   session.handle(&InputEvent::PointerDown(Point::new(50.0, 50.0)), now).unwrap();
   session.handle(&InputEvent::PointerMove(Point::new(90.0, 50.0)), now).unwrap();
   session.handle(&InputEvent::Key(Key::Escape), now).unwrap();
   session.handle(&InputEvent::PointerUp(Point::new(90.0, 50.0)), now).unwrap();
   assert!(!session.stroke_state().is_drawing);
   assert!(session.is_save_pending());

   session.tick(now + Duration::from_millis(600)).unwrap();
   assert_eq!(store.save_count(), 1);
   let saved = ImageCoder::decode_payload(&store.fog("map").unwrap()).unwrap();
   assert_eq!(saved.get_pixel(70, 50).0[3], 0);
}

#[test]
fn switching_tools_mid_stroke_saves_on_the_host_clock() {
   let store = store();
   let (mut session, _) = session(&store, native_limits());
   let now = Instant::now() + Duration::from_secs(60);
   session.load_map_blocking("map", now).unwrap();

   session.handle(&InputEvent::PointerDown(Point::new(50.0, 50.0)), now).unwrap();
   session.handle(&InputEvent::PointerMove(Point::new(90.0, 50.0)), now).unwrap();
   session.set_tool(Tool::Area, now);
   session.tick(now + Duration::from_millis(400)).unwrap();
   assert_eq!(store.save_count(), 0);
   session.tick(now + Duration::from_millis(600)).unwrap();
   assert_eq!(store.save_count(), 1);
}

#[test]
fn teardown_drops_the_pending_save() {
   let store = store();
   let (mut session, _) = session(&store, native_limits());
   let now = Instant::now();
   session.load_map_blocking("map", now).unwrap();

   stroke(&mut session, Point::new(100.0, 100.0), Point::new(120.0, 100.0), now);
   assert_eq!(fog_alpha(&session, 110, 100), Some(0));
   assert!(session.is_save_pending());

   // Switching maps before the debounce fires loses the last edit.
   session.teardown();
   session.tick(now + Duration::from_secs(5)).unwrap();
   assert_eq!(store.save_count(), 0);

   session.load_map_blocking("map", now + Duration::from_secs(6)).unwrap();
   assert_eq!(fog_alpha(&session, 110, 100), Some(255));
}

#[test]
fn touch_strokes_reveal_like_pointer_strokes() {
   let store = store();
   let (mut session, _) = session(&store, native_limits());
   let now = Instant::now();
   session.load_map_blocking("map", now).unwrap();

   session.handle(&InputEvent::TouchStart(vec![Point::new(30.0, 30.0)]), now).unwrap();
   session.handle(&InputEvent::TouchMove(vec![Point::new(70.0, 30.0)]), now).unwrap();
   session.handle(&InputEvent::TouchEnd, now).unwrap();
   assert_eq!(fog_alpha(&session, 50, 30), Some(0));
   assert_eq!(fog_alpha(&session, 50, 60), Some(255));
   assert!(session.is_save_pending());
}

#[test]
fn area_tool_reveals_the_dragged_rectangle() {
   let store = store();
   let (mut session, _) = session(&store, native_limits());
   let now = Instant::now();
   session.load_map_blocking("map", now).unwrap();
   session.set_tool(Tool::Area, now);

   session.handle(&InputEvent::PointerDown(Point::new(200.0, 150.0)), now).unwrap();
   session.handle(&InputEvent::PointerMove(Point::new(100.0, 50.0)), now).unwrap();
   assert_eq!(fog_alpha(&session, 150, 100), Some(255));
   session.handle(&InputEvent::PointerUp(Point::new(100.0, 50.0)), now).unwrap();
   assert_eq!(fog_alpha(&session, 150, 100), Some(0));
   assert_eq!(fog_alpha(&session, 99, 100), Some(255));
   assert!(session.is_save_pending());
}

#[test]
fn large_maps_are_scaled_to_fit() {
   let store = Arc::new(MemoryStore::new());
   store.insert_map("big", png(4000, 2000));
   let (mut session, _) = session(&store, LayerLimits::default());
   session.load_map_blocking("big", Instant::now()).unwrap();

   let layers = session.layers().unwrap();
   assert_eq!((layers.fog().width(), layers.fog().height()), (3000, 1500));
   assert_eq!((layers.cursor().width(), layers.cursor().height()), (3000, 1500));
   assert_eq!((layers.background().width(), layers.background().height()), (3000, 1500));
   assert_eq!(layers.dimensions().ratio, 0.75);
   // No fog was ever saved, so the map starts out shrouded and that gets saved.
   assert_eq!(layers.fog().alpha_at(2999, 1499), Some(255));
   assert!(session.is_save_pending());
}

#[test]
fn tokens_round_trip_through_the_relay() {
   let store = store();
   let limits = LayerLimits {
      max_width: 800.0,
      max_height: 800.0,
   };
   let (mut session, mut relay) = session(&store, limits);
   let now = Instant::now();
   session.load_map_blocking("map", now).unwrap();
   session.set_tool(Tool::Tokens, now);
   session.set_token_id(3);
   session.set_token_size(12.0);

   session.handle(&InputEvent::Click(Point::new(100.0, 50.0)), now).unwrap();
   let event = relay.recv().unwrap();
   assert_eq!(
      event,
      Event::AddToken {
         id: TokenId(3),
         x: 50.0,
         y: 25.0,
         radius: 12.0,
      }
   );

   // Echo it back twice: the second one replaces the first.
   relay.send(event.clone()).unwrap();
   relay.send(event).unwrap();
   session.tick(now).unwrap();
   assert_eq!(
      session.layers().unwrap().overlay().tokens(),
      &[Token {
         id: TokenId(3),
         x: 100.0,
         y: 50.0,
         radius: 24.0,
      }]
   );

   // Removing a token nobody placed changes nothing.
   relay.send(Event::RemoveToken { id: TokenId(7) }).unwrap();
   session.tick(now).unwrap();
   assert_eq!(session.layers().unwrap().overlay().tokens().len(), 1);

   session.remove_token().unwrap();
   let removal = relay.recv().unwrap();
   assert_eq!(removal, Event::RemoveToken { id: TokenId(3) });
   relay.send(removal).unwrap();
   session.tick(now).unwrap();
   assert!(session.layers().unwrap().overlay().tokens().is_empty());
}

#[test]
fn marks_are_sent_without_an_id_and_appended_on_receipt() {
   let store = store();
   let (mut session, mut relay) = session(&store, native_limits());
   let now = Instant::now();
   session.load_map_blocking("map", now).unwrap();
   session.set_tool(Tool::Mark, now);

   session.handle(&InputEvent::Click(Point::new(40.0, 60.0)), now).unwrap();
   assert_eq!(
      relay.recv(),
      Some(Event::MarkArea {
         id: None,
         x: 40.0,
         y: 60.0,
      })
   );
   // Mark ignores movement entirely.
   session.handle(&InputEvent::PointerMove(Point::new(10.0, 10.0)), now).unwrap();
   assert!(!session.layers().unwrap().has_cursor());

   for _ in 0..2 {
      relay
         .send(Event::MarkArea {
            id: None,
            x: 40.0,
            y: 60.0,
         })
         .unwrap();
   }
   session.tick(now).unwrap();
   assert_eq!(session.layers().unwrap().overlay().markers().len(), 2);
}

#[test]
fn maps_load_in_the_background() {
   let store = store();
   let (mut session, _) = session(&store, native_limits());
   session.load_map("map");
   assert!(session.is_loading());

   let mut attempts = 0;
   while session.map_id().is_none() {
      session.tick(Instant::now()).unwrap();
      attempts += 1;
      assert!(attempts < 500, "map never loaded");
      std::thread::sleep(StdDuration::from_millis(10));
   }
   assert_eq!(session.map_id(), Some("map"));
   assert!(!session.is_loading());

   // Loading another map abandons the first one, and a missing map is an error.
   session.load_map("missing");
   assert_eq!(session.map_id(), None);
   let mut result = Ok(());
   for _ in 0..500 {
      result = session.tick(Instant::now());
      if result.is_err() || !session.is_loading() {
         break;
      }
      std::thread::sleep(StdDuration::from_millis(10));
   }
   assert!(matches!(result, Err(Error::MapNotFound(_))));
}
