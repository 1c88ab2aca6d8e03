//! Tokens and area markers drawn on top of the fog.
//!
//! Everything here is in display coordinates. The overlay is only ever changed in response to
//! events received over the sync channel.

use fogcanv_protocol::sync::{MarkerId, TokenId};

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
   pub id: TokenId,
   pub x: f64,
   pub y: f64,
   pub radius: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Marker {
   pub id: Option<MarkerId>,
   pub x: f64,
   pub y: f64,
}

#[derive(Debug, Default)]
pub struct VectorOverlay {
   tokens: Vec<Token>,
   markers: Vec<Marker>,
}

impl VectorOverlay {
   pub fn new() -> Self {
      Self::default()
   }

   pub fn tokens(&self) -> &[Token] {
      &self.tokens
   }

   pub fn markers(&self) -> &[Marker] {
      &self.markers
   }

   pub fn token(&self, id: TokenId) -> Option<&Token> {
      self.tokens.iter().find(|token| token.id == id)
   }

   /// Adds a token, replacing the token with the same id if there is one.
   pub fn upsert_token(&mut self, token: Token) {
      self.tokens.retain(|existing| existing.id != token.id);
      self.tokens.push(token);
   }

   /// Adds a marker. Markers are never deduplicated.
   pub fn append_marker(&mut self, marker: Marker) {
      self.markers.push(marker);
   }

   /// Removes the token with the given id, returning whether there was one.
   pub fn remove_token(&mut self, id: TokenId) -> bool {
      let count = self.tokens.len();
      self.tokens.retain(|token| token.id != id);
      self.tokens.len() != count
   }

   /// Removes all markers with the given id, returning whether there were any.
   pub fn remove_marker(&mut self, id: &MarkerId) -> bool {
      let count = self.markers.len();
      self.markers.retain(|marker| marker.id.as_ref() != Some(id));
      self.markers.len() != count
   }

   pub fn clear(&mut self) {
      self.tokens.clear();
      self.markers.clear();
   }
}
