//! Grayscale image buffers used by the search engine.
//!
//! `ImageView` is a borrowed 2D view into a 1D buffer with an explicit stride.
//! The stride counts elements between the starts of consecutive rows, so a
//! stride larger than the width represents padded rows. `OwnedImage` is the
//! contiguous, mutable counterpart produced by capture, decoding and resizing.

use crate::util::{ScreenMatchError, ScreenMatchResult};

pub mod io;
pub(crate) mod resize;

/// Borrowed 2D image view with an explicit stride.
#[derive(Copy, Clone, Debug)]
pub struct ImageView<'a, T> {
    data: &'a [T],
    width: usize,
    height: usize,
    stride: usize,
}

impl<'a, T> ImageView<'a, T> {
    /// Creates a contiguous view with `stride == width`.
    pub fn from_slice(data: &'a [T], width: usize, height: usize) -> ScreenMatchResult<Self> {
        Self::new(data, width, height, width)
    }

    /// Creates a view with an explicit stride.
    pub fn new(
        data: &'a [T],
        width: usize,
        height: usize,
        stride: usize,
    ) -> ScreenMatchResult<Self> {
        let needed = required_len(width, height, stride)?;
        if data.len() < needed {
            return Err(ScreenMatchError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            stride,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the stride in elements between row starts.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Returns the element at `(x, y)` if it is within bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<&'a T> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = y.checked_mul(self.stride)?.checked_add(x)?;
        self.data.get(idx)
    }

    /// Returns a contiguous slice for row `y` with length `width`.
    pub fn row(&self, y: usize) -> Option<&'a [T]> {
        if y >= self.height {
            return None;
        }
        let start = y.checked_mul(self.stride)?;
        let end = start.checked_add(self.width)?;
        self.data.get(start..end)
    }

    /// Returns true if a `width x height` window fits inside this view.
    pub fn fits(&self, width: usize, height: usize) -> bool {
        width <= self.width && height <= self.height
    }
}

fn required_len(width: usize, height: usize, stride: usize) -> ScreenMatchResult<usize> {
    if width == 0 || height == 0 {
        return Err(ScreenMatchError::InvalidDimensions { width, height });
    }
    if stride < width {
        return Err(ScreenMatchError::InvalidStride { width, stride });
    }
    (height - 1)
        .checked_mul(stride)
        .and_then(|v| v.checked_add(width))
        .ok_or(ScreenMatchError::InvalidDimensions { width, height })
}

/// Owned contiguous grayscale image buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OwnedImage {
    data: Vec<u8>,
    width: usize,
    height: usize,
}

impl OwnedImage {
    /// Wraps a row-major buffer of exactly `width * height` bytes.
    pub fn new(data: Vec<u8>, width: usize, height: usize) -> ScreenMatchResult<Self> {
        if width == 0 || height == 0 {
            return Err(ScreenMatchError::InvalidDimensions { width, height });
        }
        let needed = width
            .checked_mul(height)
            .ok_or(ScreenMatchError::InvalidDimensions { width, height })?;
        if data.len() < needed {
            return Err(ScreenMatchError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        if data.len() > needed {
            return Err(ScreenMatchError::InvalidDimensions { width, height });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Creates an image filled with a single value.
    pub fn filled(width: usize, height: usize, value: u8) -> ScreenMatchResult<Self> {
        let len = width
            .checked_mul(height)
            .ok_or(ScreenMatchError::InvalidDimensions { width, height })?;
        Self::new(vec![value; len], width, height)
    }

    /// Copies a (possibly strided) view into a contiguous buffer.
    pub fn from_view(view: ImageView<'_, u8>) -> ScreenMatchResult<Self> {
        let mut data = Vec::with_capacity(view.width() * view.height());
        for y in 0..view.height() {
            let row = view.row(y).ok_or(ScreenMatchError::BufferTooSmall {
                needed: (y + 1) * view.stride(),
                got: view.data.len(),
            })?;
            data.extend_from_slice(row);
        }
        Self::new(data, view.width(), view.height())
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the row-major pixel buffer.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns a borrowed view of the image.
    pub fn view(&self) -> ImageView<'_, u8> {
        ImageView {
            data: &self.data,
            width: self.width,
            height: self.height,
            stride: self.width,
        }
    }

    /// Fills the rectangle at `(x, y)` with `value`, clipped to the image.
    pub fn fill_rect(&mut self, x: usize, y: usize, width: usize, height: usize, value: u8) {
        if x >= self.width || y >= self.height {
            return;
        }
        let x1 = x.saturating_add(width).min(self.width);
        let y1 = y.saturating_add(height).min(self.height);
        for row in y..y1 {
            let start = row * self.width;
            self.data[start + x..start + x1].fill(value);
        }
    }

    /// Pastes `src` with its top-left corner at `(x, y)`, clipped to the image.
    pub fn paste(&mut self, src: ImageView<'_, u8>, x: usize, y: usize) {
        for sy in 0..src.height() {
            let dy = y + sy;
            if dy >= self.height {
                break;
            }
            let Some(row) = src.row(sy) else { break };
            let avail = self.width.saturating_sub(x).min(row.len());
            if avail == 0 {
                break;
            }
            let start = dy * self.width + x;
            self.data[start..start + avail].copy_from_slice(&row[..avail]);
        }
    }
}
