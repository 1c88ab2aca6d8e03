//! Paint operations produced by the compositors, and their rasterization.
//!
//! Compositors never touch a raster directly. They emit [`PaintOp`]s, which the fog layer applies
//! afterwards. That keeps stroke logic testable without any pixels involved.

use tiny_skia::{
   BlendMode, Color, FillRule, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Rect, Stroke,
   Transform,
};

use crate::geometry::{midpoint, Point};
use crate::mask::MaskDescriptor;
use crate::settings::FogMode;

/// How a paint operation combines with what's already on the fog layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompositeMode {
   /// Adds fog.
   SourceOver,
   /// Removes fog wherever the shape covers it.
   DestinationOut,
}

impl CompositeMode {
   pub fn for_mode(mode: FogMode) -> Self {
      match mode {
         FogMode::Clear => CompositeMode::DestinationOut,
         FogMode::Shroud => CompositeMode::SourceOver,
      }
   }

   fn blend_mode(self) -> BlendMode {
      match self {
         CompositeMode::SourceOver => BlendMode::SourceOver,
         CompositeMode::DestinationOut => BlendMode::DestinationOut,
      }
   }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
   /// A single brush impression.
   Mask(MaskDescriptor),
   /// A filled quadrilateral, usually a bridge between two square impressions.
   Quad([Point; 4]),
   /// A round-capped stroke that curves from `from` towards the midpoint and then runs straight to
   /// `to`.
   Curve { from: Point, to: Point, width: f64 },
   /// The axis-aligned rectangle spanned by two opposite corners.
   Rect { from: Point, to: Point },
}

#[derive(Clone, Debug, PartialEq)]
pub struct PaintOp {
   pub shape: Shape,
   pub composite: CompositeMode,
}

impl PaintOp {
   pub fn new(shape: Shape, composite: CompositeMode) -> Self {
      Self { shape, composite }
   }
}

/// The color of fog.
pub const FOG_COLOR: Color = Color::BLACK;

fn fog_paint(composite: CompositeMode, anti_alias: bool) -> Paint<'static> {
   let mut paint = Paint::default();
   paint.set_color(FOG_COLOR);
   paint.blend_mode = composite.blend_mode();
   paint.anti_alias = anti_alias;
   paint
}

/// Returns the rectangle spanned by `a` and `b`, or `None` if it has no area.
pub fn spanned_rect(a: Point, b: Point) -> Option<Rect> {
   Rect::from_ltrb(
      a.x.min(b.x) as f32,
      a.y.min(b.y) as f32,
      a.x.max(b.x) as f32,
      a.y.max(b.y) as f32,
   )
   .filter(|rect| rect.width() > 0.0 && rect.height() > 0.0)
}

fn fill_circle(pixmap: &mut Pixmap, center: Point, radius: f64, composite: CompositeMode) {
   if let Some(path) = PathBuilder::from_circle(center.x as f32, center.y as f32, radius as f32) {
      pixmap.fill_path(
         &path,
         &fog_paint(composite, true),
         FillRule::Winding,
         Transform::identity(),
         None,
      );
   }
}

/// Rasterizes a single paint operation onto `pixmap`.
///
/// Squares, bridges and rectangles are filled without anti-aliasing, so their edges land on pixel
/// boundaries and erasing the same area twice changes nothing the second time.
pub fn apply(pixmap: &mut Pixmap, op: &PaintOp) {
   log::trace!("paint {:?}", op);
   match op.shape {
      Shape::Mask(MaskDescriptor::Circle { center, radius, .. }) => {
         fill_circle(pixmap, center, radius, op.composite);
      }
      Shape::Mask(MaskDescriptor::Square {
         origin,
         width,
         height,
      }) => {
         let to = Point::new(origin.x + width, origin.y + height);
         if let Some(rect) = spanned_rect(origin, to) {
            pixmap.fill_rect(rect, &fog_paint(op.composite, false), Transform::identity(), None);
         }
      }
      Shape::Quad(points) => {
         let mut builder = PathBuilder::new();
         builder.move_to(points[0].x as f32, points[0].y as f32);
         for point in &points[1..] {
            builder.line_to(point.x as f32, point.y as f32);
         }
         builder.close();
         if let Some(path) = builder.finish() {
            pixmap.fill_path(
               &path,
               &fog_paint(op.composite, false),
               FillRule::Winding,
               Transform::identity(),
               None,
            );
         }
      }
      Shape::Curve { from, to, width } => {
         let mid = midpoint(from, to);
         let mut builder = PathBuilder::new();
         builder.move_to(from.x as f32, from.y as f32);
         builder.quad_to(from.x as f32, from.y as f32, mid.x as f32, mid.y as f32);
         builder.line_to(to.x as f32, to.y as f32);
         let stroke = Stroke {
            width: width as f32,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Stroke::default()
         };
         match builder.finish() {
            Some(path) => {
               pixmap.stroke_path(
                  &path,
                  &fog_paint(op.composite, true),
                  &stroke,
                  Transform::identity(),
                  None,
               );
            }
            // A curve that doesn't go anywhere still leaves a round dot behind.
            None => fill_circle(pixmap, to, width / 2.0, op.composite),
         }
      }
      Shape::Rect { from, to } => {
         if let Some(rect) = spanned_rect(from, to) {
            pixmap.fill_rect(rect, &fog_paint(op.composite, false), Transform::identity(), None);
         }
      }
   }
}
