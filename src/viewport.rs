//! The pan/zoom viewport and the mapping from page coordinates to fog raster coordinates.

use tiny_skia::Transform;

use crate::geometry::Point;
use crate::{Error, Result};

/// A pan/zoom view onto the map.
pub trait Viewport {
   /// Returns the transform from content (display) coordinates to page coordinates.
   fn transform(&self) -> Transform;

   /// Scales and centers content of the given size so that it fills the viewport.
   fn auto_center(&mut self, content_width: f32, content_height: f32);

   /// Enables or disables panning and zooming by the user. Programmatic centering always works.
   fn set_enabled(&mut self, enabled: bool);

   fn is_enabled(&self) -> bool;

   /// A counter that changes every time the transform changes.
   fn generation(&self) -> u64;
}

/// The standard pan/zoom viewport.
#[derive(Clone, Debug)]
pub struct PanZoom {
   width: f32,
   height: f32,
   pan: (f32, f32),
   zoom: f32,
   enabled: bool,
   generation: u64,
}

impl PanZoom {
   /// How much of the viewport centered content takes up.
   pub const AUTO_CENTER_FILL: f32 = 0.85;

   pub const MIN_ZOOM: f32 = 0.05;
   pub const MAX_ZOOM: f32 = 20.0;

   /// Creates a viewport of the given size, with no pan and no zoom.
   pub fn new(width: f32, height: f32) -> Self {
      Self {
         width,
         height,
         pan: (0.0, 0.0),
         zoom: 1.0,
         enabled: true,
         generation: 0,
      }
   }

   pub fn zoom(&self) -> f32 {
      self.zoom
   }

   pub fn pan_offset(&self) -> (f32, f32) {
      self.pan
   }

   fn changed(&mut self) {
      self.generation = self.generation.wrapping_add(1);
   }

   /// Pans by the given page-space delta.
   pub fn pan(&mut self, dx: f32, dy: f32) {
      if !self.enabled {
         return;
      }
      self.pan.0 += dx;
      self.pan.1 += dy;
      self.changed();
   }

   /// Zooms by `factor`, keeping the page point `anchor` in place.
   pub fn zoom_at(&mut self, anchor: (f32, f32), factor: f32) {
      if !self.enabled {
         return;
      }
      let zoom = (self.zoom * factor).clamp(Self::MIN_ZOOM, Self::MAX_ZOOM);
      let actual = zoom / self.zoom;
      self.pan.0 = anchor.0 - (anchor.0 - self.pan.0) * actual;
      self.pan.1 = anchor.1 - (anchor.1 - self.pan.1) * actual;
      self.zoom = zoom;
      self.changed();
   }

   pub fn resize(&mut self, width: f32, height: f32) {
      self.width = width;
      self.height = height;
      self.changed();
   }
}

impl Viewport for PanZoom {
   fn transform(&self) -> Transform {
      Transform::from_row(self.zoom, 0.0, 0.0, self.zoom, self.pan.0, self.pan.1)
   }

   fn auto_center(&mut self, content_width: f32, content_height: f32) {
      if content_width <= 0.0 || content_height <= 0.0 {
         return;
      }
      let zoom = (self.width / content_width).min(self.height / content_height)
         * Self::AUTO_CENTER_FILL;
      self.zoom = zoom.clamp(Self::MIN_ZOOM, Self::MAX_ZOOM);
      self.pan = (
         (self.width - content_width * self.zoom) / 2.0,
         (self.height - content_height * self.zoom) / 2.0,
      );
      self.changed();
   }

   fn set_enabled(&mut self, enabled: bool) {
      self.enabled = enabled;
   }

   fn is_enabled(&self) -> bool {
      self.enabled
   }

   fn generation(&self) -> u64 {
      self.generation
   }
}

/// A viewport that never pans or zooms: page coordinates are display coordinates.
#[derive(Clone, Debug, Default)]
pub struct FixedViewport {
   enabled: bool,
}

impl Viewport for FixedViewport {
   fn transform(&self) -> Transform {
      Transform::identity()
   }

   fn auto_center(&mut self, _content_width: f32, _content_height: f32) {}

   fn set_enabled(&mut self, enabled: bool) {
      self.enabled = enabled;
   }

   fn is_enabled(&self) -> bool {
      self.enabled
   }

   fn generation(&self) -> u64 {
      0
   }
}

/// Maps page coordinates to display and raster coordinates.
///
/// The inverse of the viewport transform is cached, and rebuilt lazily once the viewport reports a
/// new generation or the mapper is invalidated.
#[derive(Clone, Debug)]
pub struct CoordinateMapper {
   display_ratio: f64,
   inverse: Option<(u64, Transform)>,
}

impl CoordinateMapper {
   /// Creates a mapper for a raster displayed at `display_ratio` times its native size.
   pub fn new(display_ratio: f64) -> Self {
      Self {
         display_ratio,
         inverse: None,
      }
   }

   pub fn display_ratio(&self) -> f64 {
      self.display_ratio
   }

   pub fn set_display_ratio(&mut self, display_ratio: f64) {
      self.display_ratio = display_ratio;
   }

   /// Drops the cached inverse transform.
   pub fn invalidate(&mut self) {
      self.inverse = None;
   }

   fn inverse(&mut self, viewport: &dyn Viewport) -> Result<Transform> {
      let generation = viewport.generation();
      match self.inverse {
         Some((cached, inverse)) if cached == generation => Ok(inverse),
         _ => {
            let inverse = viewport.transform().invert().ok_or(Error::DegenerateViewport)?;
            self.inverse = Some((generation, inverse));
            Ok(inverse)
         }
      }
   }

   /// Maps a page point to display coordinates.
   pub fn to_display(&mut self, viewport: &dyn Viewport, page: Point) -> Result<Point> {
      let mut points = [page.to_skia()];
      self.inverse(viewport)?.map_points(&mut points);
      Ok(Point::new(points[0].x as f64, points[0].y as f64))
   }

   /// Maps a page point to native raster coordinates.
   pub fn to_raster(&mut self, viewport: &dyn Viewport, page: Point) -> Result<Point> {
      let display = self.to_display(viewport, page)?;
      Ok(self.display_to_raster(display))
   }

   pub fn display_to_raster(&self, display: Point) -> Point {
      display.scale(1.0 / self.display_ratio)
   }

   pub fn raster_to_display(&self, raster: Point) -> Point {
      raster.scale(self.display_ratio)
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   fn assert_close(a: Point, b: Point) {
      assert!((a.x - b.x).abs() < 1e-3 && (a.y - b.y).abs() < 1e-3, "{:?} != {:?}", a, b);
   }

   #[test]
   fn page_to_raster_undoes_pan_and_zoom() {
      let mut viewport = PanZoom::new(800.0, 600.0);
      viewport.pan(100.0, 50.0);
      viewport.zoom_at((100.0, 50.0), 2.0);
      let mut mapper = CoordinateMapper::new(2.0);
      // Content point (10, 20) is at page (120, 90).
      let display = mapper.to_display(&viewport, Point::new(120.0, 90.0)).unwrap();
      assert_close(display, Point::new(10.0, 20.0));
      let raster = mapper.to_raster(&viewport, Point::new(120.0, 90.0)).unwrap();
      assert_close(raster, Point::new(5.0, 10.0));
   }

   #[test]
   fn cached_inverse_follows_viewport_changes() {
      let mut viewport = PanZoom::new(800.0, 600.0);
      let mut mapper = CoordinateMapper::new(1.0);
      let page = Point::new(50.0, 50.0);
      assert_close(mapper.to_display(&viewport, page).unwrap(), page);
      viewport.pan(10.0, 0.0);
      assert_close(mapper.to_display(&viewport, page).unwrap(), Point::new(40.0, 50.0));
   }

   #[test]
   fn disabled_viewport_ignores_user_input() {
      let mut viewport = PanZoom::new(800.0, 600.0);
      viewport.set_enabled(false);
      viewport.pan(10.0, 10.0);
      viewport.zoom_at((0.0, 0.0), 3.0);
      assert_eq!(viewport.pan_offset(), (0.0, 0.0));
      assert_eq!(viewport.zoom(), 1.0);
      assert_eq!(viewport.generation(), 0);
   }

   #[test]
   fn auto_center_fits_content() {
      let mut viewport = PanZoom::new(1000.0, 1000.0);
      viewport.auto_center(2000.0, 1000.0);
      assert!((viewport.zoom() - 0.425).abs() < 1e-6);
      let (x, y) = viewport.pan_offset();
      assert!((x - 75.0).abs() < 1e-3);
      assert!((y - 287.5).abs() < 1e-3);
   }

   #[test]
   fn display_raster_round_trip() {
      let mapper = CoordinateMapper::new(1.0003);
      let display = Point::new(1234.5678, 91.011);
      let back = mapper.raster_to_display(mapper.display_to_raster(display));
      assert!((back.x - display.x).abs() < 1e-9);
      assert!((back.y - display.y).abs() < 1e-9);
   }

   #[test]
   fn zero_zoom_is_degenerate() {
      struct Flat;
      impl Viewport for Flat {
         fn transform(&self) -> Transform {
            Transform::from_scale(0.0, 0.0)
         }
         fn auto_center(&mut self, _: f32, _: f32) {}
         fn set_enabled(&mut self, _: bool) {}
         fn is_enabled(&self) -> bool {
            true
         }
         fn generation(&self) -> u64 {
            0
         }
      }
      let mut mapper = CoordinateMapper::new(1.0);
      assert!(matches!(
         mapper.to_display(&Flat, Point::new(1.0, 1.0)),
         Err(Error::DegenerateViewport)
      ));
   }
}
