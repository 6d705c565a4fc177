/*!
    Borrowed view over the planes of a decoded image.
*/

use crate::{Error, PixelFormat, Result};

/**
    One plane of image data. `stride` is the distance in bytes between the
    starts of two consecutive rows and may exceed the visible row width.
*/
#[derive(Clone, Copy, Debug)]
pub struct Plane<'a> {
    pub data: &'a [u8],
    pub stride: usize,
}

impl<'a> Plane<'a> {
    pub fn new(data: &'a [u8], stride: usize) -> Self {
        Self { data, stride }
    }
}

/**
    A decoded image whose planes are borrowed from somewhere else, usually
    an FFmpeg frame. Constructing one validates that every plane is large
    enough for its geometry, so row accessors never go out of bounds.
*/
#[derive(Clone, Debug)]
pub struct PlanarImage<'a> {
    width: u32,
    height: u32,
    format: PixelFormat,
    planes: Vec<Plane<'a>>,
}

impl<'a> PlanarImage<'a> {
    pub fn new(width: u32, height: u32, format: PixelFormat, planes: Vec<Plane<'a>>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::invalid_data("image has zero dimensions"));
        }
        if planes.len() < format.plane_count() {
            return Err(Error::invalid_data(format!(
                "{} image needs {} planes, got {}",
                format,
                format.plane_count(),
                planes.len()
            )));
        }

        let image = Self {
            width,
            height,
            format,
            planes,
        };

        for index in 0..format.plane_count() {
            let plane = &image.planes[index];
            let row_bytes = image.row_bytes(index);
            let rows = image.plane_height(index) as usize;
            if plane.stride < row_bytes {
                return Err(Error::invalid_data(format!(
                    "plane {index} stride {} is smaller than its row width {row_bytes}",
                    plane.stride
                )));
            }
            let needed = if rows == 0 {
                0
            } else {
                plane.stride * (rows - 1) + row_bytes
            };
            if plane.data.len() < needed {
                return Err(Error::invalid_data(format!(
                    "plane {index} holds {} bytes, {needed} needed",
                    plane.data.len()
                )));
            }
        }

        Ok(image)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn plane(&self, index: usize) -> &Plane<'a> {
        &self.planes[index]
    }

    pub fn plane_count(&self) -> usize {
        self.format.plane_count()
    }

    /**
        Visible bytes per row of plane `index`, excluding stride padding.
    */
    pub fn row_bytes(&self, index: usize) -> usize {
        let (width, _) = self.format.plane_dimensions(index, self.width, self.height);
        if index == 0 {
            width as usize * self.format.bytes_per_pixel()
        } else {
            width as usize
        }
    }

    pub fn plane_height(&self, index: usize) -> u32 {
        self.format.plane_dimensions(index, self.width, self.height).1
    }

    /**
        Row `y` of plane `index`, trimmed to its visible width.
    */
    pub fn row(&self, index: usize, y: usize) -> &'a [u8] {
        let plane = self.planes[index];
        let start = y * plane.stride;
        &plane.data[start..start + self.row_bytes(index)]
    }

    pub fn rows(&self, index: usize) -> impl Iterator<Item = &'a [u8]> + '_ {
        (0..self.plane_height(index) as usize).map(move |y| self.row(index, y))
    }
}
