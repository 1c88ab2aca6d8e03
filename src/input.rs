//! Input abstraction layer.
//!
//! Mouse and touch events are normalized into [`Gesture`]s, so the compositors only ever deal with
//! one kind of pointer.

use crate::geometry::Point;

/// An input event, in page coordinates.
#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
   PointerDown(Point),
   PointerMove(Point),
   PointerUp(Point),
   /// The pointer left the map. Ends any gesture in progress.
   PointerLeave,
   /// A press and release without dragging.
   Click(Point),

   /// Touches currently on the surface. Only the first one is tracked.
   TouchStart(Vec<Point>),
   TouchMove(Vec<Point>),
   TouchEnd,

   Key(Key),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Key {
   Escape,
   Other(String),
}

/// A device-independent pointer gesture.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Gesture {
   Down(Point),
   Move(Point),
   Up,
   Leave,
   Click(Point),
   /// Abandons the current gesture without committing anything.
   Cancel,
}

impl InputEvent {
   /// Extracts the position of the event, if it has one.
   pub fn position(&self) -> Option<Point> {
      match self {
         Self::PointerDown(p) | Self::PointerMove(p) | Self::PointerUp(p) | Self::Click(p) => {
            Some(*p)
         }
         Self::TouchStart(touches) | Self::TouchMove(touches) => touches.first().copied(),
         _ => None,
      }
   }

   /// Normalizes the event into a gesture.
   ///
   /// Touch events without any touch points and keys other than Escape don't map to a gesture.
   pub fn gesture(&self) -> Option<Gesture> {
      Some(match self {
         Self::PointerDown(p) => Gesture::Down(*p),
         Self::PointerMove(p) => Gesture::Move(*p),
         Self::PointerUp(_) | Self::TouchEnd => Gesture::Up,
         Self::PointerLeave => Gesture::Leave,
         Self::Click(p) => Gesture::Click(*p),
         Self::TouchStart(touches) => Gesture::Down(*touches.first()?),
         Self::TouchMove(touches) => Gesture::Move(*touches.first()?),
         Self::Key(Key::Escape) => Gesture::Cancel,
         Self::Key(Key::Other(_)) => return None,
      })
   }
}
