//! Debounced saving of the fog layer.

use instant::{Duration, Instant};

/// Coalesces bursts of save requests into a single save after a quiet interval.
///
/// The gate only decides _when_ to save. The caller serializes the fog layer once [`poll`] says a
/// save is due, so that the saved snapshot is always the latest one.
///
/// [`poll`]: PersistenceGate::poll
#[derive(Clone, Debug)]
pub struct PersistenceGate {
   interval: Duration,
   deadline: Option<Instant>,
}

impl PersistenceGate {
   pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(500);

   pub fn new(interval: Duration) -> Self {
      Self {
         interval,
         deadline: None,
      }
   }

   pub fn interval(&self) -> Duration {
      self.interval
   }

   /// Requests a save. The save happens once no other request arrived for the quiet interval.
   pub fn schedule(&mut self, now: Instant) {
      self.deadline = Some(now + self.interval);
   }

   /// Drops the pending save, if any.
   pub fn cancel(&mut self) {
      if self.deadline.take().is_some() {
         log::debug!("pending save cancelled");
      }
   }

   pub fn is_pending(&self) -> bool {
      self.deadline.is_some()
   }

   /// Returns `true` once a scheduled save is due, clearing it.
   pub fn poll(&mut self, now: Instant) -> bool {
      match self.deadline {
         Some(deadline) if now >= deadline => {
            self.deadline = None;
            true
         }
         _ => false,
      }
   }

   /// Returns `true` if a save was pending, clearing it regardless of the deadline.
   pub fn flush(&mut self) -> bool {
      self.deadline.take().is_some()
   }
}

impl Default for PersistenceGate {
   fn default() -> Self {
      Self::new(Self::DEFAULT_INTERVAL)
   }
}
