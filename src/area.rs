//! The rectangular area state machine.

use crate::geometry::Point;
use crate::paint::{CompositeMode, PaintOp, Shape};
use crate::settings::BrushSettings;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AreaState {
   pub start_point: Option<Point>,
   pub current_point: Option<Point>,
}

#[derive(Debug, Default)]
pub struct AreaCompositor {
   state: AreaState,
}

impl AreaCompositor {
   pub fn new() -> Self {
      Self::default()
   }

   pub fn state(&self) -> AreaState {
      self.state
   }

   pub fn is_selecting(&self) -> bool {
      self.state.start_point.is_some()
   }

   pub fn begin(&mut self, at: Point) {
      log::debug!("area selection begins at {:?}", at);
      self.state = AreaState {
         start_point: Some(at),
         current_point: None,
      };
   }

   /// Moves the free corner of the selection, returning the rectangle to preview.
   pub fn update(&mut self, at: Point) -> Option<(Point, Point)> {
      let start = self.state.start_point?;
      self.state.current_point = Some(at);
      Some((start, at))
   }

   /// The corners of the rectangle being selected, if both are known.
   pub fn preview(&self) -> Option<(Point, Point)> {
      Some((self.state.start_point?, self.state.current_point?))
   }

   /// Ends the selection, returning the fill to apply if both corners were set.
   ///
   /// The selection is reset either way.
   pub fn commit(&mut self, brush: &BrushSettings) -> Option<PaintOp> {
      let selection = self.preview();
      self.state = AreaState::default();
      let (from, to) = selection?;
      log::debug!("area committed: {:?} to {:?}", from, to);
      Some(PaintOp::new(
         Shape::Rect { from, to },
         CompositeMode::for_mode(brush.mode),
      ))
   }

   pub fn cancel(&mut self) {
      if self.is_selecting() {
         log::debug!("area selection cancelled");
      }
      self.state = AreaState::default();
   }
}

#[cfg(test)]
mod tests {
   use super::*;
   use crate::settings::{BrushShape, FogMode};

   #[test]
   fn drag_commits_a_rectangle() {
      let brush = BrushSettings::new(BrushShape::Round, 5.0, FogMode::Shroud);
      let mut area = AreaCompositor::new();
      assert_eq!(area.update(Point::new(1.0, 1.0)), None);
      area.begin(Point::new(10.0, 10.0));
      assert!(area.is_selecting());
      assert_eq!(
         area.update(Point::new(4.0, 30.0)),
         Some((Point::new(10.0, 10.0), Point::new(4.0, 30.0)))
      );
      assert_eq!(
         area.commit(&brush),
         Some(PaintOp::new(
            Shape::Rect {
               from: Point::new(10.0, 10.0),
               to: Point::new(4.0, 30.0),
            },
            CompositeMode::SourceOver,
         ))
      );
      assert_eq!(area.state(), AreaState::default());
   }

   #[test]
   fn click_without_drag_commits_nothing() {
      let mut area = AreaCompositor::new();
      area.begin(Point::new(10.0, 10.0));
      assert_eq!(area.commit(&BrushSettings::default()), None);
      assert!(!area.is_selecting());
   }

   #[test]
   fn cancel_discards_the_selection() {
      let mut area = AreaCompositor::new();
      area.begin(Point::new(10.0, 10.0));
      area.update(Point::new(20.0, 20.0));
      area.cancel();
      assert_eq!(area.preview(), None);
      assert_eq!(area.commit(&BrushSettings::default()), None);
   }
}
