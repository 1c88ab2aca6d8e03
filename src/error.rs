use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
   #[error("image error: {0}")]
   Image(#[from] image::ImageError),
   #[error("I/O error: {0}")]
   Io(#[from] std::io::Error),
   #[error("JSON error: {0}")]
   Json(#[from] serde_json::Error),
   #[error("packet serialization error: {0}")]
   Bincode(#[from] bincode::Error),
   #[error("invalid base64 data: {0}")]
   Base64(#[from] base64::DecodeError),

   #[error("the fog image is not a PNG data URI")]
   InvalidDataUri,
   #[error("unknown brush shape {0:?}")]
   UnknownBrushShape(String),
   #[error("unknown tool {0:?}")]
   UnknownTool(String),
   #[error("bridging quad saw {0} distinct corner distances, expected 1 to 4")]
   UnexpectedDistanceClasses(usize),
   #[error("the viewport transform cannot be inverted")]
   DegenerateViewport,
   #[error("cannot allocate a {width}x{height} raster")]
   RasterAllocation { width: u32, height: u32 },
   #[error("map {0:?} does not exist")]
   MapNotFound(String),
   #[error("no map is loaded")]
   NoMapLoaded,
   #[error("map loading was cancelled")]
   LoadCancelled,
   #[error("tried to send a packet that is too big ({size} bytes, max is {max})")]
   PacketTooBig { size: usize, max: usize },
   #[error("the sync channel is closed")]
   ChannelClosed,
}
