//! The layer stack: background, fog, cursor preview, and the vector overlay.

use image::RgbaImage;
use tiny_skia::{Color, ColorU8, FilterQuality, Paint, PathBuilder, Pixmap, PixmapPaint, Stroke, Transform};

use crate::fog::FogLayer;
use crate::geometry::Point;
use crate::image_coder::ImageCoder;
use crate::mask::MaskDescriptor;
use crate::overlay::VectorOverlay;
use crate::paint::spanned_rect;
use crate::{Error, Result};

/// The largest size a map is scaled to.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayerLimits {
   pub max_width: f64,
   pub max_height: f64,
}

impl Default for LayerLimits {
   fn default() -> Self {
      Self {
         max_width: 3000.0,
         max_height: 8000.0,
      }
   }
}

/// The size a map is displayed at, and the ratio between that and its natural size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Dimensions {
   pub width: f64,
   pub height: f64,
   pub ratio: f64,
}

impl Dimensions {
   /// The size of the rasters backing the layers. Fractional pixels are truncated.
   pub fn raster_size(&self) -> (u32, u32) {
      (self.width.floor() as u32, self.height.floor() as u32)
   }

   /// The ratio between the displayed width and the raster's native width.
   pub fn display_ratio(&self) -> f64 {
      let native = self.width.floor();
      if native > 0.0 {
         self.width / native
      } else {
         1.0
      }
   }
}

/// Scales `natural_width`×`natural_height` to the largest size fitting in `limits`, keeping the
/// aspect ratio. Small maps are scaled up.
pub fn optimal_dimensions(
   natural_width: f64,
   natural_height: f64,
   limits: LayerLimits,
) -> Dimensions {
   let ratio = (limits.max_width / natural_width).min(limits.max_height / natural_height);
   Dimensions {
      width: natural_width * ratio,
      height: natural_height * ratio,
      ratio,
   }
}

/// Aqua.
pub const CURSOR_COLOR: ColorU8 = ColorU8::from_rgba(0, 255, 255, 255);
pub const CURSOR_LINE_WIDTH: f32 = 2.0;
pub const CROSSHAIR_SIZE: f64 = 10.0;

/// All layers of a loaded map, sized consistently.
pub struct LayerStack {
   dimensions: Dimensions,
   background: Pixmap,
   fog: FogLayer,
   cursor: Pixmap,
   overlay: VectorOverlay,
}

impl LayerStack {
   /// Builds the layers for a map. The fog is restored from `fog` if there is one, and is fully
   /// shrouded otherwise.
   pub fn new(
      background: &RgbaImage,
      fog: Option<&RgbaImage>,
      limits: LayerLimits,
   ) -> Result<Self> {
      let dimensions =
         optimal_dimensions(background.width() as f64, background.height() as f64, limits);
      let (width, height) = dimensions.raster_size();
      log::debug!(
         "map of size {}x{} scaled to {}x{} (ratio {})",
         background.width(),
         background.height(),
         width,
         height,
         dimensions.ratio
      );
      let fog = match fog {
         Some(image) => FogLayer::from_image(image, width, height)?,
         None => FogLayer::shrouded(width, height)?,
      };
      Ok(Self {
         dimensions,
         background: ImageCoder::image_to_pixmap(background, width, height)?,
         fog,
         cursor: Pixmap::new(width, height).ok_or(Error::RasterAllocation { width, height })?,
         overlay: VectorOverlay::new(),
      })
   }

   pub fn dimensions(&self) -> Dimensions {
      self.dimensions
   }

   pub fn background(&self) -> &Pixmap {
      &self.background
   }

   pub fn fog(&self) -> &FogLayer {
      &self.fog
   }

   pub fn fog_mut(&mut self) -> &mut FogLayer {
      &mut self.fog
   }

   pub fn cursor(&self) -> &Pixmap {
      &self.cursor
   }

   pub fn overlay(&self) -> &VectorOverlay {
      &self.overlay
   }

   pub fn overlay_mut(&mut self) -> &mut VectorOverlay {
      &mut self.overlay
   }

   pub fn clear_cursor(&mut self) {
      self.cursor.fill(Color::TRANSPARENT);
   }

   fn outline(&mut self, builder: PathBuilder) {
      if let Some(path) = builder.finish() {
         let mut paint = Paint::default();
         paint.set_color_rgba8(CURSOR_COLOR.red(), CURSOR_COLOR.green(), CURSOR_COLOR.blue(), CURSOR_COLOR.alpha());
         paint.anti_alias = true;
         let stroke = Stroke {
            width: CURSOR_LINE_WIDTH,
            ..Stroke::default()
         };
         self.cursor.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
      }
   }

   /// Redraws the cursor layer with the outline of `mask`.
   pub fn draw_cursor(&mut self, mask: &MaskDescriptor) {
      self.clear_cursor();
      let mut builder = PathBuilder::new();
      match *mask {
         MaskDescriptor::Circle { center, radius, .. } => {
            builder.push_circle(center.x as f32, center.y as f32, radius as f32);
         }
         MaskDescriptor::Square {
            origin,
            width,
            height,
         } => {
            let to = Point::new(origin.x + width, origin.y + height);
            if let Some(rect) = spanned_rect(origin, to) {
               builder.push_rect(rect);
            }
         }
      }
      self.outline(builder);
   }

   /// Redraws the cursor layer with a crosshair at `at`.
   pub fn draw_crosshair(&mut self, at: Point) {
      self.clear_cursor();
      let mut builder = PathBuilder::new();
      builder.move_to((at.x - CROSSHAIR_SIZE) as f32, at.y as f32);
      builder.line_to((at.x + CROSSHAIR_SIZE) as f32, at.y as f32);
      builder.move_to(at.x as f32, (at.y - CROSSHAIR_SIZE) as f32);
      builder.line_to(at.x as f32, (at.y + CROSSHAIR_SIZE) as f32);
      self.outline(builder);
   }

   /// Redraws the cursor layer with the outline of the selected area, plus a crosshair at its free
   /// corner.
   pub fn draw_area_preview(&mut self, from: Point, to: Point) {
      self.draw_crosshair(to);
      if let Some(rect) = spanned_rect(from, to) {
         let mut builder = PathBuilder::new();
         builder.push_rect(rect);
         self.outline(builder);
      }
   }

   /// Renders the fog over the background, with the fog at the given opacity.
   pub fn composite(&self, fog_opacity: f32) -> Pixmap {
      let mut output = self.background.clone();
      output.draw_pixmap(
         0,
         0,
         self.fog.pixmap().as_ref(),
         &PixmapPaint {
            opacity: fog_opacity.clamp(0.0, 1.0),
            quality: FilterQuality::Nearest,
            ..PixmapPaint::default()
         },
         Transform::identity(),
         None,
      );
      output
   }

   /// Whether anything is drawn on the cursor layer.
   pub fn has_cursor(&self) -> bool {
      self.cursor.pixels().iter().any(|pixel| pixel.alpha() != 0)
   }
}
