//! Brush masks: the shape painted for a single brush impression.

use std::f64::consts::TAU;

use crate::geometry::Point;
use crate::settings::{BrushSettings, BrushShape};

/// One shape instance to paint. Masks are derived from the current settings every time they're
/// needed and never stored.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MaskDescriptor {
   Circle {
      center: Point,
      radius: f64,
      start_angle: f64,
      end_angle: f64,
   },
   Square {
      /// The top-left corner.
      origin: Point,
      width: f64,
      height: f64,
   },
}

impl MaskDescriptor {
   /// A full circle.
   pub fn circle(center: Point, radius: f64) -> Self {
      Self::Circle {
         center,
         radius,
         start_angle: 0.0,
         end_angle: TAU,
      }
   }

   /// A square of side `side` centered on `center`.
   pub fn centered_square(center: Point, side: f64) -> Self {
      Self::Square {
         origin: Point::new(center.x - side / 2.0, center.y - side / 2.0),
         width: side,
         height: side,
      }
   }
}

/// What a mask is being built for.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MaskKind {
   /// The fog brush.
   Brush,
   /// A token of the given radius. Tokens are always round.
   Token { radius: f64 },
}

/// Builds the mask for a brush impression or token placed at `at`.
pub fn build_mask(at: Point, brush: &BrushSettings, kind: MaskKind) -> MaskDescriptor {
   match kind {
      MaskKind::Token { radius } => MaskDescriptor::circle(at, radius),
      MaskKind::Brush => match brush.shape {
         BrushShape::Round => MaskDescriptor::circle(at, brush.line_width() / 2.0),
         BrushShape::Square => MaskDescriptor::centered_square(at, brush.line_width()),
      },
   }
}
