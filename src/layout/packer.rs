// Generic word-cloud packing with no notion of bearings. Packers get the whole
// word list at once and answer for the whole batch.

use std::future::Future;

use crate::config::PackerConfig;
use crate::geometry::Rect;

use super::{PackError, PlacedSet};

/// One word submitted to a packer.
#[derive(Debug, Clone, PartialEq)]
pub struct PackWord {
    /// Caller-side index, echoed back in [`PackedWord::index`].
    pub index: usize,
    pub text: String,
    pub font_size: f32,
    pub width: f32,
    pub height: f32,
}

/// Position of a packed word's center, relative to the packing origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PackedWord {
    pub index: usize,
    pub x: f32,
    pub y: f32,
}

/// Asynchronous batch packer.
///
/// The returned future resolves once with positions for every submitted
/// word, or fails for the whole batch.
pub trait Packer {
    fn pack(&self, words: Vec<PackWord>) -> impl Future<Output = Result<Vec<PackedWord>, PackError>>;
}

/// Built-in packer walking an Archimedean spiral out from the origin for
/// each word in submission order, as d3-cloud does with rotation disabled.
#[derive(Debug, Clone, Copy)]
pub struct ArchimedeanPacker {
    width: f32,
    height: f32,
    padding: f32,
}

impl Default for ArchimedeanPacker {
    fn default() -> Self {
        Self::new(&PackerConfig::default())
    }
}

impl ArchimedeanPacker {
    pub fn new(config: &PackerConfig) -> Self {
        Self {
            width: config.canvas_width.max(1.0),
            height: config.canvas_height.max(1.0),
            padding: config.padding.max(0.0),
        }
    }

    /// Point `t` steps along the spiral, stretched to the canvas aspect ratio.
    fn spiral(&self, t: f32) -> (f32, f32) {
        let aspect = self.width / self.height;
        let t = t * 0.1;
        (aspect * t * t.cos(), t * t.sin())
    }

    fn fits_canvas(&self, rect: &Rect) -> bool {
        let half_w = self.width / 2.0;
        let half_h = self.height / 2.0;
        rect.left() >= -half_w && rect.right() <= half_w && rect.top() >= -half_h && rect.bottom() <= half_h
    }

    fn place_word(&self, word: &PackWord, placed: &PlacedSet) -> Option<(f32, f32)> {
        let max_delta = self.width.hypot(self.height);
        let mut t = 0.0f32;
        loop {
            let (dx, dy) = self.spiral(t);
            t += 1.0;
            if dx.abs().min(dy.abs()) >= max_delta {
                return None;
            }
            let candidate = Rect::new(dx, dy, word.width, word.height);
            if !self.fits_canvas(&candidate) {
                // Past both canvas extents the spiral can never come back.
                if dx.abs() > self.width && dy.abs() > self.height {
                    return None;
                }
                continue;
            }
            if !placed.collides(&candidate) {
                return Some((dx, dy));
            }
        }
    }

    /// Pack on the calling thread.
    pub fn pack_now(&self, words: &[PackWord]) -> Result<Vec<PackedWord>, PackError> {
        let mut placed = PlacedSet::new(self.padding);
        let mut out = Vec::with_capacity(words.len());
        for word in words {
            if !(word.width.is_finite() && word.height.is_finite()) {
                return Err(PackError::Failed(format!(
                    "word {:?} has a non-finite extent",
                    word.text
                )));
            }
            if let Some((x, y)) = self.place_word(word, &placed) {
                placed.push(Rect::new(x, y, word.width, word.height));
                out.push(PackedWord {
                    index: word.index,
                    x,
                    y,
                });
            }
        }
        if out.len() < words.len() {
            return Err(PackError::Incomplete {
                unplaced: words.len() - out.len(),
                total: words.len(),
            });
        }
        Ok(out)
    }
}

impl Packer for ArchimedeanPacker {
    fn pack(&self, words: Vec<PackWord>) -> impl Future<Output = Result<Vec<PackedWord>, PackError>> {
        let packer = *self;
        async move { packer.pack_now(&words) }
    }
}
