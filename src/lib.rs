//! A GIF87a/GIF89a decoder: parses the logical screen descriptor, palettes,
//! image descriptors and Graphic Control Extensions, and runs the
//! variable-width LZW and interlace stages, producing fully decoded
//! animation frames as palette-index buffers.
//!
//! ```no_run
//! let data = std::fs::read("example.gif").unwrap();
//! let gif = gifdecode::Gif::parse(&data).unwrap();
//! for image in &gif.images {
//!     let _palette = image.palette(&gif);
//! }
//! ```

mod color_table;
mod cursor;
mod error;
mod frame;
mod gif;
mod image;
mod interlace;
mod lzw;

pub use color_table::ColorTable;
pub use error::{Error, Result};
pub use frame::{DisposalMethod, GraphicControl};
pub use gif::{Gif, Version};
pub use image::Image;
