use std::io::Cursor;

use fogcanv_protocol::fog::FogPayload;
use image::codecs::png::PngEncoder;
use image::imageops::{self, FilterType};
use image::{ColorType, ImageEncoder, Rgba, RgbaImage};
use tiny_skia::{ColorU8, Pixmap};

use crate::{Error, Result};

pub struct ImageCoder;

impl ImageCoder {
   /// Encodes an image to PNG data.
   pub fn encode_png_data(image: &RgbaImage) -> Result<Vec<u8>> {
      let mut bytes: Vec<u8> = Vec::new();
      match PngEncoder::new(Cursor::new(&mut bytes)).write_image(
         image,
         image.width(),
         image.height(),
         ColorType::Rgba8,
      ) {
         Ok(()) => (),
         Err(error) => {
            log::error!("error while encoding: {}", error);
            return Err(error.into());
         }
      }
      Ok(bytes)
   }

   /// Decodes a PNG, JPEG, or WebP file.
   pub fn decode_image_data(data: &[u8]) -> Result<RgbaImage> {
      Ok(image::load_from_memory(data)?.to_rgba8())
   }

   /// Converts a raster into a straight-alpha image.
   pub fn pixmap_to_image(pixmap: &Pixmap) -> RgbaImage {
      let mut image = RgbaImage::new(pixmap.width(), pixmap.height());
      for (dest, pixel) in image.pixels_mut().zip(pixmap.pixels()) {
         let color = pixel.demultiply();
         *dest = Rgba([color.red(), color.green(), color.blue(), color.alpha()]);
      }
      image
   }

   /// Converts an image into a raster of the given size, stretching it if the sizes differ.
   pub fn image_to_pixmap(image: &RgbaImage, width: u32, height: u32) -> Result<Pixmap> {
      let resized;
      let image = if image.dimensions() == (width, height) {
         image
      } else {
         resized = imageops::resize(image, width, height, FilterType::Triangle);
         &resized
      };
      let mut pixmap = Pixmap::new(width, height).ok_or(Error::RasterAllocation { width, height })?;
      for (dest, pixel) in pixmap.pixels_mut().iter_mut().zip(image.pixels()) {
         let Rgba([r, g, b, a]) = *pixel;
         *dest = ColorU8::from_rgba(r, g, b, a).premultiply();
      }
      Ok(pixmap)
   }

   /// Encodes a raster as a PNG data URI payload.
   pub fn encode_payload(pixmap: &Pixmap) -> Result<FogPayload> {
      let png = Self::encode_png_data(&Self::pixmap_to_image(pixmap))?;
      Ok(FogPayload::from_base64_png(&base64::encode(&png)))
   }

   /// Decodes a PNG data URI payload.
   pub fn decode_payload(payload: &FogPayload) -> Result<RgbaImage> {
      let data = payload.base64_data().ok_or(Error::InvalidDataUri)?;
      Self::decode_image_data(&base64::decode(data)?)
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn payload_preserves_alpha() {
      let mut pixmap = Pixmap::new(4, 2).unwrap();
      pixmap.fill(tiny_skia::Color::from_rgba8(0, 0, 0, 255));
      pixmap.pixels_mut()[5] = ColorU8::from_rgba(0, 0, 0, 0).premultiply();

      let payload = ImageCoder::encode_payload(&pixmap).unwrap();
      assert!(payload.image.starts_with("data:image/png;base64,"));

      let image = ImageCoder::decode_payload(&payload).unwrap();
      assert_eq!(image.dimensions(), (4, 2));
      assert_eq!(image.get_pixel(0, 0).0[3], 255);
      assert_eq!(image.get_pixel(1, 1).0[3], 0);
   }

   #[test]
   fn images_are_stretched_to_the_raster() {
      let image = RgbaImage::from_pixel(8, 8, Rgba([10, 20, 30, 255]));
      let pixmap = ImageCoder::image_to_pixmap(&image, 4, 2).unwrap();
      assert_eq!((pixmap.width(), pixmap.height()), (4, 2));
      let pixel = pixmap.pixel(3, 1).unwrap().demultiply();
      assert_eq!((pixel.red(), pixel.green(), pixel.blue(), pixel.alpha()), (10, 20, 30, 255));
   }

   #[test]
   fn rejects_foreign_data_uri() {
      let payload = FogPayload {
         image: "data:text/plain;base64,aGk=".to_owned(),
      };
      assert!(matches!(ImageCoder::decode_payload(&payload), Err(Error::InvalidDataUri)));
   }
}
