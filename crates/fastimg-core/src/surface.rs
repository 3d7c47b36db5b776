//! The mutable raster surface and its 2D draw context.
//!
//! One pipeline instance owns exactly one [`RasterSurface`]: an RGBA8
//! backing store plus canvas-style draw state (an affine transform with a
//! save/restore stack and an optional rounded-rect clip region). The store
//! is created once at `ready()` and resized in place by later operations;
//! it is never replaced.
//!
//! # Drawing
//!
//! Drawing uses inverse mapping: for each device pixel inside the
//! transformed destination rectangle, the current transform is inverted to
//! find the source coordinates, which are sampled with bilinear
//! interpolation and composited source-over onto the store. Pixels outside
//! the clip region are left untouched.

use image::{Rgba, RgbaImage};

use crate::codec::DrawableImage;
use crate::geometry::RoundedRectPath;

/// Opaque white, the pre-fill used before drawing into lossy targets
/// (lossy encodings have no alpha channel).
pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// A 2D affine transform in canvas order `[a b c d e f]`:
///
/// ```text
/// | a c e |
/// | b d f |
/// | 0 0 1 |
/// ```
///
/// Angles follow the canvas convention: y grows downward, so a positive
/// rotation appears clockwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub fn translation(tx: f64, ty: f64) -> Self {
        Self {
            e: tx,
            f: ty,
            ..Self::IDENTITY
        }
    }

    pub fn rotation(radians: f64) -> Self {
        let (sin, cos) = radians.sin_cos();
        Self {
            a: cos,
            b: sin,
            c: -sin,
            d: cos,
            e: 0.0,
            f: 0.0,
        }
    }

    pub fn scaling(sx: f64, sy: f64) -> Self {
        Self {
            a: sx,
            d: sy,
            ..Self::IDENTITY
        }
    }

    /// Matrix product `self * other`: `other` is applied first, then `self`.
    pub fn then(&self, other: &Transform) -> Self {
        Self {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            e: self.a * other.e + self.c * other.f + self.e,
            f: self.b * other.e + self.d * other.f + self.f,
        }
    }

    /// Map a point through the transform.
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// The inverse transform, or `None` when the matrix is singular.
    pub fn invert(&self) -> Option<Self> {
        let det = self.a * self.d - self.b * self.c;
        if det.abs() < f64::EPSILON {
            return None;
        }
        Some(Self {
            a: self.d / det,
            b: -self.b / det,
            c: -self.c / det,
            d: self.a / det,
            e: (self.c * self.f - self.d * self.e) / det,
            f: (self.b * self.e - self.a * self.f) / det,
        })
    }
}

/// A clip region captured in device space.
///
/// The path is recorded together with the inverse of the transform that was
/// current when the clip was set, so membership tests map device pixels back
/// into the path's own coordinates.
#[derive(Debug, Clone)]
struct ClipRegion {
    path: RoundedRectPath,
    to_path: Option<Transform>,
}

impl ClipRegion {
    fn contains(&self, device_x: f64, device_y: f64) -> bool {
        match &self.to_path {
            Some(inverse) => {
                let (x, y) = inverse.apply(device_x, device_y);
                self.path.contains(x, y)
            }
            // Singular transform at clip time: nothing is drawable.
            None => false,
        }
    }
}

/// The save/restore-able draw state.
#[derive(Debug, Clone)]
struct DrawState {
    transform: Transform,
    clip: Option<ClipRegion>,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            transform: Transform::IDENTITY,
            clip: None,
        }
    }
}

/// The single mutable drawing surface of a pipeline.
#[derive(Debug)]
pub struct RasterSurface {
    pixels: RgbaImage,
    state: DrawState,
    stack: Vec<DrawState>,
}

impl RasterSurface {
    /// Create a surface sized to an image's natural dimensions with the
    /// image drawn at `(0, 0)` unscaled.
    pub fn from_image(image: &DrawableImage) -> Self {
        let mut surface = Self {
            pixels: RgbaImage::new(image.natural_width(), image.natural_height()),
            state: DrawState::default(),
            stack: Vec::new(),
        };
        surface.draw_image(
            image,
            0.0,
            0.0,
            image.natural_width() as f64,
            image.natural_height() as f64,
        );
        surface
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// The backing store, for export encoding. Exports never mutate.
    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Clear and resize the backing store, optionally pre-filling with an
    /// opaque background color.
    ///
    /// Clearing before resize is mandatory so stale pixels never bleed
    /// across a differently-sized store. Like a canvas size assignment,
    /// this also resets the draw state: transform back to identity, clip
    /// and save stack dropped.
    pub fn resize_and_clear(&mut self, width: u32, height: u32, fill: Option<Rgba<u8>>) {
        self.pixels = match fill {
            Some(color) => RgbaImage::from_pixel(width, height, color),
            None => RgbaImage::new(width, height),
        };
        self.state = DrawState::default();
        self.stack.clear();
    }

    /// Push the current draw state.
    pub fn save(&mut self) {
        self.stack.push(self.state.clone());
    }

    /// Pop back to the most recently saved draw state. A bare `restore`
    /// with an empty stack is a no-op, as on a canvas.
    pub fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
    }

    /// Translate the draw origin.
    pub fn translate(&mut self, tx: f64, ty: f64) {
        self.state.transform = self.state.transform.then(&Transform::translation(tx, ty));
    }

    /// Rotate the draw context clockwise by `degrees`.
    pub fn rotate_deg(&mut self, degrees: f64) {
        self.state.transform = self
            .state
            .transform
            .then(&Transform::rotation(degrees.to_radians()));
    }

    /// Scale the draw context.
    pub fn scale_by(&mut self, sx: f64, sy: f64) {
        self.state.transform = self.state.transform.then(&Transform::scaling(sx, sy));
    }

    /// Intersect the draw context with a rounded-rect clip path.
    ///
    /// The path is interpreted in the current user space; pixels outside it
    /// stay unwritten until the clip is dropped by `restore` past the
    /// owning `save`, or by the next resize.
    pub fn set_clip(&mut self, path: RoundedRectPath) {
        let to_path = self.state.transform.invert();
        if to_path.is_none() {
            log::warn!("clip set under a singular transform, nothing will draw");
        }
        self.state.clip = Some(ClipRegion { path, to_path });
    }

    /// Fill an axis-aligned rectangle (in user space) with a color.
    pub fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: Rgba<u8>) {
        self.rasterize(x, y, width, height, |_, _| color);
    }

    /// Draw an image scaled into the user-space rectangle
    /// `(dx, dy, dw, dh)` without clearing.
    pub fn draw_image(&mut self, image: &DrawableImage, dx: f64, dy: f64, dw: f64, dh: f64) {
        if image.natural_width() == 0 || image.natural_height() == 0 {
            return;
        }
        let src = image.pixels();
        let sw = image.natural_width() as f64;
        let sh = image.natural_height() as f64;
        self.rasterize(dx, dy, dw, dh, |u, v| {
            // Normalized rect position -> source pixel coordinates.
            let sx = u * sw - 0.5;
            let sy = v * sh - 0.5;
            sample_bilinear(src, sx, sy)
        });
    }

    /// Shared rasterization loop: walk every device pixel covered by the
    /// transformed user-space rectangle, inverse-map it, and source-over
    /// composite whatever `shade` returns for the normalized in-rect
    /// position.
    fn rasterize<F>(&mut self, x: f64, y: f64, width: f64, height: f64, shade: F)
    where
        F: Fn(f64, f64) -> Rgba<u8>,
    {
        if width <= 0.0 || height <= 0.0 {
            return;
        }
        let Some(inverse) = self.state.transform.invert() else {
            return;
        };

        let (x0, y0, x1, y1) = match self.device_bounds(x, y, width, height) {
            Some(bounds) => bounds,
            None => return,
        };

        for py in y0..y1 {
            for px in x0..x1 {
                let cx = px as f64 + 0.5;
                let cy = py as f64 + 0.5;

                if let Some(clip) = &self.state.clip {
                    if !clip.contains(cx, cy) {
                        continue;
                    }
                }

                let (ux, uy) = inverse.apply(cx, cy);
                if ux < x || ux >= x + width || uy < y || uy >= y + height {
                    continue;
                }

                let color = shade((ux - x) / width, (uy - y) / height);
                blend_source_over(self.pixels.get_pixel_mut(px, py), color);
            }
        }
    }

    /// Device-space pixel bounds covered by a transformed user-space rect,
    /// clamped to the surface. `None` when entirely off-surface.
    fn device_bounds(&self, x: f64, y: f64, w: f64, h: f64) -> Option<(u32, u32, u32, u32)> {
        let t = &self.state.transform;
        let corners = [
            t.apply(x, y),
            t.apply(x + w, y),
            t.apply(x, y + h),
            t.apply(x + w, y + h),
        ];

        let min_x = corners.iter().map(|c| c.0).fold(f64::INFINITY, f64::min);
        let min_y = corners.iter().map(|c| c.1).fold(f64::INFINITY, f64::min);
        let max_x = corners.iter().map(|c| c.0).fold(f64::NEG_INFINITY, f64::max);
        let max_y = corners.iter().map(|c| c.1).fold(f64::NEG_INFINITY, f64::max);

        let x0 = min_x.floor().max(0.0) as u32;
        let y0 = min_y.floor().max(0.0) as u32;
        let x1 = (max_x.ceil().max(0.0) as u32).min(self.width());
        let y1 = (max_y.ceil().max(0.0) as u32).min(self.height());

        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some((x0, y0, x1, y1))
    }
}

/// Sample an RGBA image with bilinear interpolation, clamping at the edges.
fn sample_bilinear(src: &RgbaImage, x: f64, y: f64) -> Rgba<u8> {
    let max_x = (src.width() - 1) as f64;
    let max_y = (src.height() - 1) as f64;
    let x = x.clamp(0.0, max_x);
    let y = y.clamp(0.0, max_y);

    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    let x1 = (x0 + 1).min(src.width() - 1);
    let y1 = (y0 + 1).min(src.height() - 1);

    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    let p00 = src.get_pixel(x0, y0);
    let p10 = src.get_pixel(x1, y0);
    let p01 = src.get_pixel(x0, y1);
    let p11 = src.get_pixel(x1, y1);

    let mut out = [0u8; 4];
    for (i, channel) in out.iter_mut().enumerate() {
        let v = p00[i] as f64 * (1.0 - fx) * (1.0 - fy)
            + p10[i] as f64 * fx * (1.0 - fy)
            + p01[i] as f64 * (1.0 - fx) * fy
            + p11[i] as f64 * fx * fy;
        *channel = v.clamp(0.0, 255.0).round() as u8;
    }
    Rgba(out)
}

/// Source-over alpha compositing of straight-alpha RGBA8.
fn blend_source_over(dst: &mut Rgba<u8>, src: Rgba<u8>) {
    let sa = src[3] as f64 / 255.0;
    if sa <= 0.0 {
        return;
    }
    if src[3] == 255 {
        *dst = src;
        return;
    }

    let da = dst[3] as f64 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    for i in 0..3 {
        let c = (src[i] as f64 * sa + dst[i] as f64 * da * (1.0 - sa)) / out_a;
        dst[i] = c.clamp(0.0, 255.0).round() as u8;
    }
    dst[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}
