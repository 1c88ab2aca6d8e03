//! The brush stroke state machine.

use crate::geometry::{optimal_bridging_quad, Point};
use crate::mask::{build_mask, MaskKind};
use crate::paint::{CompositeMode, PaintOp, Shape};
use crate::settings::{BrushSettings, BrushShape};
use crate::Result;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StrokeState {
   pub is_drawing: bool,
   pub last_point: Option<Point>,
}

/// Turns a sparse sequence of pointer positions into continuous paint operations.
///
/// The compositor only produces [`PaintOp`]s; applying them to a raster is up to the caller.
#[derive(Debug, Default)]
pub struct StrokeCompositor {
   state: StrokeState,
}

impl StrokeCompositor {
   pub fn new() -> Self {
      Self::default()
   }

   pub fn state(&self) -> StrokeState {
      self.state
   }

   pub fn is_drawing(&self) -> bool {
      self.state.is_drawing
   }

   /// Whether a stroke was started and not finished yet.
   pub fn has_pending(&self) -> bool {
      self.state.is_drawing || self.state.last_point.is_some()
   }

   /// Starts a stroke at `at`, painting the initial brush impression.
   pub fn begin(&mut self, at: Point, brush: &BrushSettings) -> Vec<PaintOp> {
      log::debug!("stroke begins at {:?}", at);
      self.state = StrokeState {
         is_drawing: true,
         last_point: Some(at),
      };
      vec![PaintOp::new(
         Shape::Mask(build_mask(at, brush, MaskKind::Brush)),
         CompositeMode::for_mode(brush.mode),
      )]
   }

   /// Extends the stroke to `to`. Does nothing if no stroke is in progress.
   ///
   /// Round brushes produce a single curve from the last point. Square brushes produce a square at
   /// the last point, followed by the quad bridging it with `to`.
   pub fn extend(&mut self, to: Point, brush: &BrushSettings) -> Result<Vec<PaintOp>> {
      if !self.state.is_drawing {
         return Ok(Vec::new());
      }
      let composite = CompositeMode::for_mode(brush.mode);
      let previous = match self.state.last_point {
         Some(previous) => previous,
         None => {
            self.state.last_point = Some(to);
            return Ok(Vec::new());
         }
      };

      let ops = match brush.shape {
         BrushShape::Round => vec![PaintOp::new(
            Shape::Curve {
               from: previous,
               to,
               width: brush.line_width(),
            },
            composite,
         )],
         BrushShape::Square => {
            let bridge = optimal_bridging_quad(to, previous, brush.line_width())?;
            let mut ops = vec![PaintOp::new(
               Shape::Mask(build_mask(previous, brush, MaskKind::Brush)),
               composite,
            )];
            ops.extend(bridge.map(|quad| PaintOp::new(Shape::Quad(quad), composite)));
            ops
         }
      };
      self.state.last_point = Some(to);
      Ok(ops)
   }

   /// Ends the stroke, returning `None` if there was nothing to end.
   ///
   /// Square strokes are capped with a final impression at the last point, which the bridge that
   /// led there doesn't cover.
   pub fn finish(&mut self, brush: &BrushSettings) -> Option<Vec<PaintOp>> {
      if !self.has_pending() {
         return None;
      }
      let last_point = self.state.last_point;
      self.state = StrokeState::default();
      log::debug!("stroke finished at {:?}", last_point);
      let ops = match (brush.shape, last_point) {
         (BrushShape::Square, Some(at)) => vec![PaintOp::new(
            Shape::Mask(build_mask(at, brush, MaskKind::Brush)),
            CompositeMode::for_mode(brush.mode),
         )],
         _ => Vec::new(),
      };
      Some(ops)
   }

   /// Abandons the stroke. Whatever was already painted stays.
   pub fn cancel(&mut self) {
      self.state = StrokeState::default();
   }
}
