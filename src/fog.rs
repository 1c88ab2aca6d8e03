//! The fog layer: the authoritative raster of what is shrouded.

use fogcanv_protocol::fog::FogPayload;
use image::RgbaImage;
use tiny_skia::{Color, Pixmap};

use crate::image_coder::ImageCoder;
use crate::paint::{self, PaintOp, FOG_COLOR};
use crate::{Error, Result};

pub struct FogLayer {
   pixmap: Pixmap,
}

impl FogLayer {
   /// Creates a fully revealed fog layer.
   pub fn new(width: u32, height: u32) -> Result<Self> {
      let pixmap = Pixmap::new(width, height).ok_or(Error::RasterAllocation { width, height })?;
      Ok(Self { pixmap })
   }

   /// Creates a fully shrouded fog layer.
   pub fn shrouded(width: u32, height: u32) -> Result<Self> {
      let mut fog = Self::new(width, height)?;
      fog.shroud_all();
      Ok(fog)
   }

   /// Restores a fog layer from a previously saved image, stretching it to the given size.
   pub fn from_image(image: &RgbaImage, width: u32, height: u32) -> Result<Self> {
      Ok(Self {
         pixmap: ImageCoder::image_to_pixmap(image, width, height)?,
      })
   }

   pub fn width(&self) -> u32 {
      self.pixmap.width()
   }

   pub fn height(&self) -> u32 {
      self.pixmap.height()
   }

   pub fn pixmap(&self) -> &Pixmap {
      &self.pixmap
   }

   /// Returns the fog opacity at the given pixel.
   pub fn alpha_at(&self, x: u32, y: u32) -> Option<u8> {
      self.pixmap.pixel(x, y).map(|pixel| pixel.alpha())
   }

   pub fn apply(&mut self, op: &PaintOp) {
      paint::apply(&mut self.pixmap, op);
   }

   pub fn apply_all(&mut self, ops: &[PaintOp]) {
      for op in ops {
         self.apply(op);
      }
   }

   pub fn shroud_all(&mut self) {
      self.pixmap.fill(FOG_COLOR);
   }

   pub fn clear_all(&mut self) {
      self.pixmap.fill(Color::TRANSPARENT);
   }

   /// Serializes the current contents of the layer.
   pub fn snapshot(&self) -> Result<FogPayload> {
      ImageCoder::encode_payload(&self.pixmap)
   }
}
