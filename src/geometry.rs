//! Geometry for connecting square brush impressions.
//!
//! Pointer events arrive sparsely, so consecutive brush impressions rarely touch. Round brushes are
//! connected with a stroked curve, but stroking a square brush distorts its footprint when moving
//! diagonally: square caps rotate into diamonds and butt caps are too thin along the hypotenuse.
//! Instead, each pair of impressions is connected with the quadrilateral spanned by the four corners
//! that face each other, which [`optimal_bridging_quad`] finds.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A point in canvas space. The y axis grows downwards.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Point {
   pub x: f64,
   pub y: f64,
}

impl Point {
   pub const fn new(x: f64, y: f64) -> Self {
      Self { x, y }
   }

   /// Multiplies both coordinates by `factor`.
   pub fn scale(self, factor: f64) -> Self {
      Self::new(self.x * factor, self.y * factor)
   }

   pub(crate) fn to_skia(self) -> tiny_skia::Point {
      tiny_skia::Point::from_xy(self.x as f32, self.y as f32)
   }
}

/// Returns the point halfway between `a` and `b`.
pub fn midpoint(a: Point, b: Point) -> Point {
   Point::new(a.x + (b.x - a.x) / 2.0, a.y + (b.y - a.y) / 2.0)
}

/// Returns the Euclidean distance between `a` and `b`.
pub fn distance(a: Point, b: Point) -> f64 {
   (a.x - b.x).hypot(a.y - b.y)
}

/// A corner of a square brush impression.
///
/// Corners are numbered counter-clockwise starting from the bottom left, as seen on screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Corner {
   BottomLeft = 1,
   TopLeft = 2,
   TopRight = 3,
   BottomRight = 4,
}

impl Corner {
   pub const ALL: [Corner; 4] = [
      Corner::BottomLeft,
      Corner::TopLeft,
      Corner::TopRight,
      Corner::BottomRight,
   ];
}

/// Returns the four corners of a `line_width`-sized square centered at `center`.
pub fn square_corners(center: Point, line_width: f64) -> [(Corner, Point); 4] {
   let r = line_width / 2.0;
   // y grows downwards, so "bottom" is +r.
   Corner::ALL.map(|corner| {
      let point = match corner {
         Corner::BottomLeft => Point::new(center.x - r, center.y + r),
         Corner::TopLeft => Point::new(center.x - r, center.y - r),
         Corner::TopRight => Point::new(center.x + r, center.y - r),
         Corner::BottomRight => Point::new(center.x + r, center.y + r),
      };
      (corner, point)
   })
}

/// Which of the two impressions a corner belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum Origin {
   Previous = 1,
   Current = 2,
}

#[derive(Clone, Copy, Debug)]
struct TaggedCorner {
   corner: Corner,
   origin: Origin,
   point: Point,
   distance_class: i64,
}

impl TaggedCorner {
   fn sort_key(&self) -> (Corner, Origin) {
      (self.corner, self.origin)
   }
}

/// Distances are compared at 10 decimal places, which collapses floating point noise.
const DISTANCE_SCALE: f64 = 1e10;

fn distance_class(distance: f64) -> i64 {
   (distance * DISTANCE_SCALE).round() as i64
}

/// Computes the quadrilateral that connects square impressions at `previous` and `current`.
///
/// Returns `Ok(None)` when the impressions coincide and there is nothing to bridge. The points are
/// ordered such that connecting them in sequence traces a simple (non-self-intersecting) polygon.
///
/// Every corner of both squares is classified by its distance to the midpoint between the two
/// impressions:
/// - two distinct distances mean the squares are aligned horizontally or vertically; the four
///   nearest corners face each other,
/// - three or four distinct distances mean a diagonal offset; the two nearest and two farthest
///   corners are skipped and the middle four span the bridge.
///
/// Any other number of distinct distances means the geometry is broken, and is reported as
/// [`Error::UnexpectedDistanceClasses`].
pub fn optimal_bridging_quad(
   current: Point,
   previous: Point,
   line_width: f64,
) -> Result<Option<[Point; 4]>> {
   // Distances are taken from offsets to the midpoint, so mirrored corners compare exactly equal.
   let half = Point::new((current.x - previous.x) / 2.0, (current.y - previous.y) / 2.0);
   let current_offsets = square_corners(half, line_width);
   let previous_offsets = square_corners(Point::new(-half.x, -half.y), line_width);
   let tagged = |origin: Origin, center: Point, offsets: [(Corner, Point); 4]| {
      square_corners(center, line_width).into_iter().zip(offsets).map(
         move |((corner, point), (_, offset))| TaggedCorner {
            corner,
            origin,
            point,
            distance_class: distance_class(offset.x.hypot(offset.y)),
         },
      )
   };
   let mut corners: Vec<TaggedCorner> = tagged(Origin::Current, current, current_offsets)
      .chain(tagged(Origin::Previous, previous, previous_offsets))
      .collect();

   let class_count = corners.iter().map(|c| c.distance_class).collect::<BTreeSet<_>>().len();
   corners.sort_by_key(|c| c.distance_class);
   let chosen = match class_count {
      1 => return Ok(None),
      2 => &mut corners[0..4],
      3 | 4 => &mut corners[2..6],
      n => return Err(Error::UnexpectedDistanceClasses(n)),
   };
   chosen.sort_by_key(TaggedCorner::sort_key);

   let mut quad = [chosen[0].point, chosen[1].point, chosen[2].point, chosen[3].point];
   if class_count > 2 {
      // Sorting by corner pairs up opposite sides of a diagonal bridge; without the swap the
      // outline would cross itself into a bowtie.
      quad.swap(2, 3);
   }
   Ok(Some(quad))
}
