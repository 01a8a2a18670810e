//! A single decoded sub-image (one animation frame).

use crate::color_table::ColorTable;
use crate::frame::GraphicControl;
use crate::gif::Gif;

/// One decoded frame: position and size within the logical screen, its
/// own local palette if it has one, graphic control metadata if a
/// Graphic Control Extension preceded it, and its de-interlaced palette
/// indices in raster order.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Image {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
    pub local_color_table: Option<ColorTable>,
    pub graphic_control: Option<GraphicControl>,
    pub indices: Vec<u8>,
}

impl Image {
    /// The color table in force for this image: its own local table if
    /// present, otherwise the parent `Gif`'s global table. `None` only
    /// for a malformed container (invariant 4 of the decoder's data model
    /// forbids this after a successful parse).
    pub fn palette<'a>(&'a self, gif: &'a Gif) -> Option<&'a ColorTable> {
        self.local_color_table
            .as_ref()
            .or(gif.global_color_table.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gif::Version;

    fn table(n: usize) -> ColorTable {
        ColorTable::from_bytes(&vec![0u8; n * 3])
    }

    #[test]
    fn prefers_local_over_global_palette() {
        let gif = Gif {
            version: Version::Gif89a,
            width: 1,
            height: 1,
            bg_index: 0,
            global_color_table: Some(table(2)),
            images: Vec::new(),
        };
        let img = Image {
            x: 0,
            y: 0,
            width: 1,
            height: 1,
            local_color_table: Some(table(4)),
            graphic_control: None,
            indices: vec![0],
        };
        assert_eq!(img.palette(&gif).unwrap().num_colors(), 4);
    }

    #[test]
    fn falls_back_to_global_palette() {
        let gif = Gif {
            version: Version::Gif89a,
            width: 1,
            height: 1,
            bg_index: 0,
            global_color_table: Some(table(2)),
            images: Vec::new(),
        };
        let img = Image {
            x: 0,
            y: 0,
            width: 1,
            height: 1,
            local_color_table: None,
            graphic_control: None,
            indices: vec![0],
        };
        assert_eq!(img.palette(&gif).unwrap().num_colors(), 2);
    }
}
