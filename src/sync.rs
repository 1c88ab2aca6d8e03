//! The sync channel: token and marker events shared with other observers.

use fogcanv_protocol::sync::{Event, MAX_PACKET_SIZE};
use futures::channel::mpsc;

use crate::geometry::Point;
use crate::overlay::{Marker, Token, VectorOverlay};
use crate::{Error, Result};

/// One end of a sync channel.
///
/// The transport itself lives elsewhere. It feeds received events into the inbound end and drains
/// the outbound end.
pub struct SyncChannel {
   recv_rx: mpsc::UnboundedReceiver<Event>,
   send_tx: mpsc::UnboundedSender<Event>,
}

impl SyncChannel {
   pub fn new(
      recv_rx: mpsc::UnboundedReceiver<Event>,
      send_tx: mpsc::UnboundedSender<Event>,
   ) -> Self {
      Self { recv_rx, send_tx }
   }

   /// Creates two channel ends connected to each other.
   pub fn pair() -> (Self, Self) {
      let (a_tx, a_rx) = mpsc::unbounded();
      let (b_tx, b_rx) = mpsc::unbounded();
      (Self::new(a_rx, b_tx), Self::new(b_rx, a_tx))
   }

   /// Creates a channel end whose sent events are received by itself, as a relay echoing
   /// everything back would.
   pub fn loopback() -> Self {
      let (tx, rx) = mpsc::unbounded();
      Self::new(rx, tx)
   }

   pub fn send(&self, event: Event) -> Result<()> {
      log::debug!("sending {}", event.name());
      self.send_tx.unbounded_send(event).map_err(|_| Error::ChannelClosed)
   }

   /// Receives an event, if there is one waiting.
   pub fn recv(&mut self) -> Option<Event> {
      self.recv_rx.try_next().ok().flatten()
   }
}

/// Serializes an event for a byte-oriented transport.
pub fn encode_event(event: &Event) -> Result<Vec<u8>> {
   let bytes = bincode::serialize(event)?;
   if bytes.len() > MAX_PACKET_SIZE as usize {
      return Err(Error::PacketTooBig {
         size: bytes.len(),
         max: MAX_PACKET_SIZE as usize,
      });
   }
   Ok(bytes)
}

pub fn decode_event(bytes: &[u8]) -> Result<Event> {
   if bytes.len() > MAX_PACKET_SIZE as usize {
      return Err(Error::PacketTooBig {
         size: bytes.len(),
         max: MAX_PACKET_SIZE as usize,
      });
   }
   Ok(bincode::deserialize(bytes)?)
}

/// Converts display coordinates into the map coordinates used on the wire.
pub fn to_wire(display: Point, ratio: f64) -> Point {
   display.scale(1.0 / ratio)
}

/// Converts wire coordinates into display coordinates.
pub fn from_wire(wire: Point, ratio: f64) -> Point {
   wire.scale(ratio)
}

/// Applies a received event to the overlay, scaling it by the map's `ratio`.
pub fn apply_inbound(overlay: &mut VectorOverlay, event: Event, ratio: f64) {
   log::debug!("received {}", event.name());
   match event {
      Event::AddToken { id, x, y, radius } => {
         let at = from_wire(Point::new(x, y), ratio);
         overlay.upsert_token(Token {
            id,
            x: at.x,
            y: at.y,
            radius: radius * ratio,
         });
      }
      Event::RemoveToken { id } => {
         overlay.remove_token(id);
      }
      Event::MarkArea { id, x, y } => {
         let at = from_wire(Point::new(x, y), ratio);
         overlay.append_marker(Marker { id, x: at.x, y: at.y });
      }
   }
}
