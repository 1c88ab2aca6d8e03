//! The fog snapshot payload, shared by persistence and the live push.

use serde::{Deserialize, Serialize};

/// Prefix of every image data URI carried in a [`FogPayload`].
pub const DATA_URI_PREFIX: &str = "data:image/png;base64,";

/// A serialized fog layer: `{ "image": "data:image/png;base64,..." }`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct FogPayload {
   pub image: String,
}

impl FogPayload {
   /// Wraps base64-encoded PNG data into a data URI payload.
   pub fn from_base64_png(base64: &str) -> Self {
      Self {
         image: format!("{}{}", DATA_URI_PREFIX, base64),
      }
   }

   /// Returns the base64 part of the data URI, or `None` if the URI is not a PNG data URI.
   pub fn base64_data(&self) -> Option<&str> {
      self.image.strip_prefix(DATA_URI_PREFIX)
   }
}
