//! Tool and brush settings chosen by the operator.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::Error;

/// The active tool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Tool {
   /// Pans and zooms the view. The only tool that doesn't interact with the map.
   Move,
   /// Reveals or shrouds a rectangular area.
   Area,
   /// Reveals or shrouds along the pointer's path.
   Brush,
   /// Marks a point of interest for the observers.
   Mark,
   /// Places numbered tokens.
   Tokens,
}

impl Tool {
   /// Parses a tool name, as stored in the configuration.
   pub fn parse(name: &str) -> crate::Result<Self> {
      name.parse().map_err(|_| Error::UnknownTool(name.to_owned()))
   }
}

impl Default for Tool {
   fn default() -> Self {
      Self::Brush
   }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize, Display, EnumString)]
pub enum BrushShape {
   #[serde(rename = "round", alias = "circle")]
   #[strum(to_string = "round", serialize = "circle")]
   Round,
   #[serde(rename = "square")]
   #[strum(to_string = "square")]
   Square,
}

impl BrushShape {
   /// Parses a brush shape name.
   ///
   /// An unknown shape is a configuration error and never silently replaced by a default.
   pub fn parse(name: &str) -> crate::Result<Self> {
      name.parse().map_err(|_| Error::UnknownBrushShape(name.to_owned()))
   }
}

impl Default for BrushShape {
   fn default() -> Self {
      Self::Square
   }
}

/// Whether painting reveals the map or shrouds it again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FogMode {
   /// Erases fog.
   Clear,
   /// Paints fog.
   Shroud,
}

impl FogMode {
   pub fn toggled(self) -> Self {
      match self {
         FogMode::Clear => FogMode::Shroud,
         FogMode::Shroud => FogMode::Clear,
      }
   }
}

impl Default for FogMode {
   fn default() -> Self {
      Self::Clear
   }
}

pub const MIN_LINE_WIDTH: f64 = 1.0;
pub const MAX_LINE_WIDTH: f64 = 200.0;
pub const MIN_TOKEN_ID: u32 = 1;
pub const MAX_TOKEN_ID: u32 = 28;
pub const MIN_TOKEN_SIZE: f64 = 1.0;
pub const MAX_TOKEN_SIZE: f64 = 200.0;

/// The brush used by the stroke and area compositors.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BrushSettings {
   pub shape: BrushShape,
   line_width: f64,
   pub mode: FogMode,
}

impl BrushSettings {
   pub fn new(shape: BrushShape, line_width: f64, mode: FogMode) -> Self {
      Self {
         shape,
         line_width: clamp_line_width(line_width),
         mode,
      }
   }

   /// The brush's width, always within `MIN_LINE_WIDTH..=MAX_LINE_WIDTH`.
   pub fn line_width(&self) -> f64 {
      self.line_width
   }

   pub fn set_line_width(&mut self, line_width: f64) {
      self.line_width = clamp_line_width(line_width);
   }
}

impl Default for BrushSettings {
   fn default() -> Self {
      Self::new(BrushShape::default(), 15.0, FogMode::default())
   }
}

fn clamp_line_width(width: f64) -> f64 {
   if width.is_nan() {
      MIN_LINE_WIDTH
   } else {
      width.clamp(MIN_LINE_WIDTH, MAX_LINE_WIDTH)
   }
}

/// Everything the operator can tweak between gestures.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SessionSettings {
   pub tool: Tool,
   pub brush: BrushSettings,
   token_id: u32,
   token_size: f64,
}

impl SessionSettings {
   pub fn new(tool: Tool, brush: BrushSettings, token_id: u32, token_size: f64) -> Self {
      let mut settings = Self {
         tool,
         brush,
         token_id: MIN_TOKEN_ID,
         token_size: MIN_TOKEN_SIZE,
      };
      settings.set_token_id(token_id);
      settings.set_token_size(token_size);
      settings
   }

   pub fn token_id(&self) -> u32 {
      self.token_id
   }

   pub fn set_token_id(&mut self, id: u32) {
      self.token_id = id.clamp(MIN_TOKEN_ID, MAX_TOKEN_ID);
   }

   pub fn token_size(&self) -> f64 {
      self.token_size
   }

   pub fn set_token_size(&mut self, size: f64) {
      self.token_size = if size.is_nan() {
         MIN_TOKEN_SIZE
      } else {
         size.clamp(MIN_TOKEN_SIZE, MAX_TOKEN_SIZE)
      };
   }
}

impl Default for SessionSettings {
   fn default() -> Self {
      Self::new(Tool::default(), BrushSettings::default(), 1, 15.0)
   }
}
