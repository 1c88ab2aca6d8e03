//! Token and marker events exchanged over the sync channel.
//!
//! Coordinates on the wire are always in map space, that is the display coordinates of the sender
//! divided by its scale ratio. Receivers multiply by their own ratio before displaying anything.

use serde::{Deserialize, Serialize};

/// Bumped whenever the layout of [`Event`] changes.
pub const PROTOCOL_VERSION: u32 = 1;

/// The largest encoded event a peer is allowed to send.
pub const MAX_PACKET_SIZE: u32 = 16 * 1024;

/// The number shown on a token. The operator picks it, so two tokens with the same id are the
/// same token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(transparent)]
pub struct TokenId(pub u32);

/// An area marker identifier. Markers are assigned their ids by the relay.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct MarkerId(pub String);

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub enum Event {
   /// Places a token, replacing any token with the same id.
   #[serde(rename = "add token")]
   AddToken {
      id: TokenId,
      x: f64,
      y: f64,
      radius: f64,
   },
   #[serde(rename = "remove token")]
   RemoveToken { id: TokenId },
   /// Marks a point of interest. Outgoing marks have no id yet.
   #[serde(rename = "mark area")]
   MarkArea {
      id: Option<MarkerId>,
      x: f64,
      y: f64,
   },
}

impl Event {
   /// Returns the event's name as used by the relay.
   pub fn name(&self) -> &'static str {
      match self {
         Event::AddToken { .. } => "add token",
         Event::RemoveToken { .. } => "remove token",
         Event::MarkArea { .. } => "mark area",
      }
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn events_use_relay_names() {
      let event = Event::RemoveToken { id: TokenId(7) };
      let json = serde_json::to_string(&event).unwrap();
      assert_eq!(json, r#"{"remove token":{"id":7}}"#);
      assert_eq!(event.name(), "remove token");
   }

   #[test]
   fn mark_area_without_id_survives_bincode() {
      let event = Event::MarkArea {
         id: None,
         x: 12.5,
         y: 40.0,
      };
      let bytes = bincode::serialize(&event).unwrap();
      assert!(bytes.len() < MAX_PACKET_SIZE as usize);
      let decoded: Event = bincode::deserialize(&bytes).unwrap();
      assert_eq!(decoded, event);
   }
}
