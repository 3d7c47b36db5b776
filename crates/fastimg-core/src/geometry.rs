//! Pure geometry for the pipeline operations.
//!
//! Three families of computation live here, all free of surface state:
//!
//! - **Aspect-preserving sizes**: filling in a missing width or height from
//!   a reference ratio ([`resolve_aspect_size`]).
//! - **Rounded-rect clip paths**: the eight-segment path (four arcs, four
//!   edges) used to mask drawing to a rounded rectangle
//!   ([`rounded_rect_path`]).
//! - **Rotation bounding boxes**: the canvas growth needed to hold a rotated
//!   image ([`rotated_bounds`]).

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// A width/height pair. Copied by value; no ownership concerns.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Resolve a partially specified target size against a reference size.
///
/// The three-way branch:
/// - both given: returned as-is (independent aspect, caller's
///   responsibility);
/// - only width: `height = ref_height / ref_width * width`;
/// - only height: `width = ref_width / ref_height * height`;
/// - neither: the reference size unchanged.
///
/// The reference is the *current* state at call time - operations resolve
/// against the live surface dimensions, except `mix`, which passes the
/// overlay image's own native size.
pub fn resolve_aspect_size(
    width: Option<f64>,
    height: Option<f64>,
    ref_width: f64,
    ref_height: f64,
) -> Size {
    match (width, height) {
        (Some(w), Some(h)) => Size::new(w, h),
        (Some(w), None) => Size::new(w, ref_height / ref_width * w),
        (None, Some(h)) => Size::new(ref_width / ref_height * h, h),
        (None, None) => Size::new(ref_width, ref_height),
    }
}

/// One segment of a rounded-rect path.
///
/// Angles follow the canvas convention: 0 points along +x, angles grow
/// clockwise (y-down), so the top-left corner arc sweeps from `PI` to
/// `3*PI/2`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSegment {
    /// A 90-degree corner arc centered at `(cx, cy)`.
    Arc {
        cx: f64,
        cy: f64,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
    },
    /// A straight edge to `(x, y)`.
    LineTo { x: f64, y: f64 },
    /// Close back to the path start.
    Close,
}

/// A closed rounded-rectangle path anchored at the origin.
///
/// Built by [`rounded_rect_path`]; consumed as a clip region by the draw
/// context, which tests pixel membership via [`RoundedRectPath::contains`].
#[derive(Debug, Clone, PartialEq)]
pub struct RoundedRectPath {
    width: f64,
    height: f64,
    radius: f64,
    segments: Vec<PathSegment>,
}

impl RoundedRectPath {
    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// The path's segments in construction order.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Whether a point lies inside the rounded rectangle.
    ///
    /// Inside means within the plain rectangle and, when the point falls in
    /// one of the four corner squares, within that corner's arc.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        if x < 0.0 || y < 0.0 || x > self.width || y > self.height {
            return false;
        }
        if self.radius <= 0.0 {
            return true;
        }

        let r = self.radius;
        // Corner arc centers; the point is only constrained when it falls
        // inside a corner square.
        let cx = if x < r {
            r
        } else if x > self.width - r {
            self.width - r
        } else {
            return true;
        };
        let cy = if y < r {
            r
        } else if y > self.height - r {
            self.height - r
        } else {
            return true;
        };

        let (dx, dy) = (x - cx, y - cy);
        dx * dx + dy * dy <= r * r
    }
}

/// Construct the eight-segment rounded-rect path.
///
/// Starts at the top-left corner arc (sweeping from `PI` toward the top
/// edge) and proceeds clockwise through all four corners before closing.
/// A zero radius degenerates to an ordinary rectangle traced the same way.
/// The radius is clamped to half the shorter side so the arcs cannot
/// self-intersect; `width == height` with `radius == width / 2` yields a
/// circle.
pub fn rounded_rect_path(width: f64, height: f64, radius: f64) -> RoundedRectPath {
    let r = radius.clamp(0.0, (width / 2.0).min(height / 2.0));

    let segments = vec![
        // Top-left corner, then clockwise.
        PathSegment::Arc {
            cx: r,
            cy: r,
            radius: r,
            start_angle: PI,
            end_angle: PI * 3.0 / 2.0,
        },
        PathSegment::LineTo {
            x: width - r,
            y: 0.0,
        },
        PathSegment::Arc {
            cx: width - r,
            cy: r,
            radius: r,
            start_angle: PI * 3.0 / 2.0,
            end_angle: PI * 2.0,
        },
        PathSegment::LineTo {
            x: width,
            y: height - r,
        },
        PathSegment::Arc {
            cx: width - r,
            cy: height - r,
            radius: r,
            start_angle: 0.0,
            end_angle: PI / 2.0,
        },
        PathSegment::LineTo { x: r, y: height },
        PathSegment::Arc {
            cx: r,
            cy: height - r,
            radius: r,
            start_angle: PI / 2.0,
            end_angle: PI,
        },
        PathSegment::Close,
    ];

    RoundedRectPath {
        width,
        height,
        radius: r,
        segments,
    }
}

/// Compute the canvas size needed to hold a rotated image.
///
/// Quarter-turn multiples are exact: even quarter-turns keep `(w, h)`, odd
/// ones swap to `(h, w)`, with no floating-point drift. Any other angle
/// returns the smallest square whose side is the source diagonal
/// `sqrt(w^2 + h^2)` - deliberately conservative (non-tight) so the rotated
/// source never exceeds the canvas regardless of angle.
pub fn rotated_bounds(width: u32, height: u32, degrees: f64) -> (u32, u32) {
    if degrees % 90.0 == 0.0 {
        let quarter_turns = (degrees / 90.0) as i64;
        if quarter_turns % 2 == 0 {
            return (width, height);
        }
        return (height, width);
    }

    let w = width as f64;
    let h = height as f64;
    let side = (w * w + h * h).sqrt().round() as u32;
    (side, side)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aspect_both_given() {
        let size = resolve_aspect_size(Some(30.0), Some(40.0), 400.0, 300.0);
        assert_eq!(size, Size::new(30.0, 40.0));
    }

    #[test]
    fn test_aspect_width_only() {
        let size = resolve_aspect_size(Some(200.0), None, 400.0, 300.0);
        assert_eq!(size, Size::new(200.0, 150.0));
    }

    #[test]
    fn test_aspect_height_only() {
        let size = resolve_aspect_size(None, Some(150.0), 400.0, 300.0);
        assert_eq!(size, Size::new(200.0, 150.0));
    }

    #[test]
    fn test_aspect_neither_is_identity() {
        let size = resolve_aspect_size(None, None, 400.0, 300.0);
        assert_eq!(size, Size::new(400.0, 300.0));
    }

    #[test]
    fn test_rotated_bounds_quarter_turns_exact() {
        assert_eq!(rotated_bounds(400, 300, 0.0), (400, 300));
        assert_eq!(rotated_bounds(400, 300, 90.0), (300, 400));
        assert_eq!(rotated_bounds(400, 300, 180.0), (400, 300));
        assert_eq!(rotated_bounds(400, 300, 270.0), (300, 400));
        assert_eq!(rotated_bounds(400, 300, 450.0), (300, 400));
        assert_eq!(rotated_bounds(400, 300, -90.0), (300, 400));
    }

    #[test]
    fn test_rotated_bounds_45_is_diagonal_square() {
        let (w, h) = rotated_bounds(100, 100, 45.0);
        // Diagonal of a 100x100 square is ~141.4
        assert_eq!(w, h);
        assert!((w as f64 - (2.0f64).sqrt() * 100.0).abs() < 1.0, "side was {w}");
    }

    #[test]
    fn test_rotated_bounds_arbitrary_angle_square() {
        let (w, h) = rotated_bounds(400, 300, 30.0);
        assert_eq!(w, h);
        assert_eq!(w, 500); // 3-4-5 triangle
    }

    #[test]
    fn test_rounded_path_has_eight_segments() {
        let path = rounded_rect_path(100.0, 80.0, 10.0);
        assert_eq!(path.segments().len(), 8);
        assert!(matches!(path.segments()[0], PathSegment::Arc { .. }));
        assert!(matches!(path.segments()[7], PathSegment::Close));
    }

    #[test]
    fn test_rounded_path_starts_at_top_left_arc() {
        let path = rounded_rect_path(100.0, 80.0, 10.0);
        match path.segments()[0] {
            PathSegment::Arc {
                cx,
                cy,
                radius,
                start_angle,
                ..
            } => {
                assert_eq!((cx, cy), (10.0, 10.0));
                assert_eq!(radius, 10.0);
                assert_eq!(start_angle, PI);
            }
            _ => panic!("first segment should be the top-left arc"),
        }
    }

    #[test]
    fn test_zero_radius_traces_plain_rectangle() {
        let path = rounded_rect_path(100.0, 80.0, 0.0);
        // Degenerate arcs collapse onto the four corners.
        for &(x, y) in &[(0.0, 0.0), (100.0, 0.0), (100.0, 80.0), (0.0, 80.0)] {
            assert!(path.contains(x, y), "corner ({x}, {y}) should be inside");
        }
    }

    #[test]
    fn test_rounded_corners_excluded() {
        let path = rounded_rect_path(100.0, 100.0, 20.0);
        // The square corner tips fall outside the arcs.
        assert!(!path.contains(0.0, 0.0));
        assert!(!path.contains(100.0, 0.0));
        assert!(!path.contains(0.0, 100.0));
        assert!(!path.contains(100.0, 100.0));
        // Centers of edges and the middle stay inside.
        assert!(path.contains(50.0, 0.0));
        assert!(path.contains(0.0, 50.0));
        assert!(path.contains(50.0, 50.0));
    }

    #[test]
    fn test_half_width_radius_is_circular() {
        let path = rounded_rect_path(100.0, 100.0, 50.0);
        // A point just inside the inscribed circle.
        assert!(path.contains(50.0, 1.0));
        // A point inside the rect but outside the circle.
        assert!(!path.contains(10.0, 10.0));
        // Circle membership: distance from center (50,50) <= 50.
        assert!(path.contains(50.0 + 35.0, 50.0 + 35.0));
        assert!(!path.contains(50.0 + 36.0, 50.0 + 36.0));
    }

    #[test]
    fn test_radius_clamped_to_half_side() {
        let path = rounded_rect_path(100.0, 40.0, 500.0);
        assert_eq!(path.radius(), 20.0);
    }

    #[test]
    fn test_outside_rectangle_never_contained() {
        let path = rounded_rect_path(100.0, 80.0, 10.0);
        assert!(!path.contains(-1.0, 40.0));
        assert!(!path.contains(101.0, 40.0));
        assert!(!path.contains(50.0, -1.0));
        assert!(!path.contains(50.0, 81.0));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn reference_strategy() -> impl Strategy<Value = (f64, f64)> {
        (1.0f64..=4096.0, 1.0f64..=4096.0)
    }

    proptest! {
        /// Property: with only a width given, the result preserves the
        /// reference aspect ratio.
        #[test]
        fn prop_width_only_preserves_ratio(
            (ref_w, ref_h) in reference_strategy(),
            w in 1.0f64..=4096.0,
        ) {
            let size = resolve_aspect_size(Some(w), None, ref_w, ref_h);
            let got = size.height / size.width;
            let want = ref_h / ref_w;
            prop_assert!((got - want).abs() < 1e-9, "ratio {got} vs {want}");
        }

        /// Property: with only a height given, the result preserves the
        /// reference aspect ratio.
        #[test]
        fn prop_height_only_preserves_ratio(
            (ref_w, ref_h) in reference_strategy(),
            h in 1.0f64..=4096.0,
        ) {
            let size = resolve_aspect_size(None, Some(h), ref_w, ref_h);
            let got = size.width / size.height;
            let want = ref_w / ref_h;
            prop_assert!((got - want).abs() < 1e-9, "ratio {got} vs {want}");
        }

        /// Property: both omitted is the identity on the reference.
        #[test]
        fn prop_neither_is_identity((ref_w, ref_h) in reference_strategy()) {
            let size = resolve_aspect_size(None, None, ref_w, ref_h);
            prop_assert_eq!(size, Size::new(ref_w, ref_h));
        }

        /// Property: quarter-turn bounds are an exact swap or identity.
        #[test]
        fn prop_quarter_turns_exact(
            w in 1u32..=4096,
            h in 1u32..=4096,
            k in -8i64..=8,
        ) {
            let (bw, bh) = rotated_bounds(w, h, (k * 90) as f64);
            if k % 2 == 0 {
                prop_assert_eq!((bw, bh), (w, h));
            } else {
                prop_assert_eq!((bw, bh), (h, w));
            }
        }

        /// Property: non-quarter-turn bounds are a square at least as large
        /// as either source dimension.
        #[test]
        fn prop_diagonal_square_covers_source(
            w in 1u32..=2048,
            h in 1u32..=2048,
            degrees in 1.0f64..=89.0,
        ) {
            let (bw, bh) = rotated_bounds(w, h, degrees);
            prop_assert_eq!(bw, bh);
            prop_assert!(bw >= w.max(h));
        }

        /// Property: containment is monotone along rays from the rect
        /// center - points strictly inside the clamped-radius inset are
        /// always contained.
        #[test]
        fn prop_inner_rect_always_contained(
            w in 10.0f64..=500.0,
            h in 10.0f64..=500.0,
            r in 0.0f64..=250.0,
        ) {
            let path = rounded_rect_path(w, h, r);
            let r = path.radius();
            // The rectangle inset by the radius is entirely inside the path.
            let (x0, y0) = (r, r);
            let (x1, y1) = (w - r, h - r);
            for (x, y) in [(x0, y0), (x1, y0), (x0, y1), (x1, y1), ((x0 + x1) / 2.0, (y0 + y1) / 2.0)] {
                prop_assert!(path.contains(x, y), "({x}, {y}) in {w}x{h} r={r}");
            }
        }
    }
}
