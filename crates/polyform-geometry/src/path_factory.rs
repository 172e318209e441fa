//! A factory for generating common paths.
//!
//! Most paths approximate a canonical shape: a line, a circle, a rounded
//! rectangle. Instead of embedding the generators in [`Path`] (which has
//! enough to do on its own), they live in this factory. The factory only
//! generates boundary paths, intended to be drawn as lines or extruded
//! later; for solid, triangulated shapes use
//! [`PolyFactory`](crate::PolyFactory).

use std::f32::consts::{FRAC_PI_2, PI, TAU};

use glam::Vec2;
use polyform_core::geometry::Rect;

use crate::error::{GeometryError, GeometryResult};
use crate::path::Path;
use crate::polygon::Polygon;
use crate::stroke::{Capsule, Traversal};

/// The default curve tolerance for rounded shapes.
pub(crate) const DEFAULT_TOLERANCE: f32 = 0.5;

/// The number of segments needed to keep a radial curve within tolerance.
///
/// For radius `r` and tolerance `tol`, a chord subtending the angle
/// `2·acos(r / (r + tol))` deviates from the arc by exactly `tol`, so
/// `ceil(arc / da)` segments keep every point of the true curve within
/// tolerance of the polygonal approximation. Floored at 2.
pub(crate) fn curve_segments(radius: f32, arc: f32, tolerance: f32) -> usize {
    let da = (radius / (radius + tolerance)).acos() * 2.0;
    ((arc / da).ceil() as usize).max(2)
}

/// A generator for canonical boundary paths.
///
/// The one tunable is the curve tolerance: curved shapes get enough segments
/// that every point of the true curve lies within tolerance of the
/// approximation. The factory is stateless beyond that and may be reused
/// freely.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathFactory {
    /// The curve tolerance for rounded shapes.
    tolerance: f32,
}

impl Default for PathFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl PathFactory {
    /// Create a factory with the default curve tolerance.
    pub fn new() -> Self {
        PathFactory {
            tolerance: DEFAULT_TOLERANCE,
        }
    }

    /// Create a factory with the given curve tolerance.
    pub fn with_tolerance(tolerance: f32) -> Self {
        PathFactory { tolerance }
    }

    /// The curve tolerance for rounded shapes.
    pub fn tolerance(&self) -> f32 {
        self.tolerance
    }

    /// Set the curve tolerance for rounded shapes.
    pub fn set_tolerance(&mut self, tolerance: f32) {
        self.tolerance = tolerance;
    }

    /// A line segment from `origin` to `dest`, as an open two-point path.
    pub fn make_line(&self, origin: Vec2, dest: Vec2) -> Path {
        let mut path = Path::new();
        path.push(origin, true);
        path.push(dest, true);
        path
    }

    /// A closed triangle through the three given vertices.
    pub fn make_triangle(&self, a: Vec2, b: Vec2, c: Vec2) -> Path {
        let mut path = Path::new();
        path.push(a, true);
        path.push(b, true);
        path.push(c, true);
        path.closed = true;
        path
    }

    /// A closed rectangle path with all four vertices flagged as corners.
    pub fn make_rect(&self, rect: Rect<f32>) -> Path {
        Path::from_rect(rect)
    }

    /// A closed regular polygon centered at `center`.
    ///
    /// A regular polygon is a circle with an explicit segment count instead
    /// of one implied by the curve tolerance. No vertices are corners.
    pub fn make_ngon(&self, center: Vec2, radius: f32, sides: usize) -> Path {
        let coef = TAU / sides as f32;
        let mut path = Path::new();
        path.reserve(sides);
        for i in 0..sides {
            let rads = i as f32 * coef;
            path.push(center + Vec2::from_angle(rads) * radius, false);
        }
        path.closed = true;
        path
    }

    /// A closed ellipse path of the given diameters.
    pub fn make_ellipse(&self, center: Vec2, size: Vec2) -> Path {
        let radii = size * 0.5;
        let segments = curve_segments(radii.x.max(radii.y), TAU, self.tolerance);
        let coef = TAU / segments as f32;

        let mut path = Path::new();
        path.reserve(segments);
        for i in 0..segments {
            let rads = i as f32 * coef;
            path.push(center + Vec2::from_angle(rads) * radii, false);
        }
        path.closed = true;
        path
    }

    /// A closed circle path of the given radius.
    pub fn make_circle(&self, center: Vec2, radius: f32) -> Path {
        self.make_ellipse(center, Vec2::splat(2.0 * radius))
    }

    /// An arc of the circle around `center`, measured in degrees.
    ///
    /// The sweep must lie in (0, 360]. When `closed` is true the arc is
    /// closed into a pie slice through the center point (a full 360-degree
    /// arc closes on itself without the center).
    pub fn make_arc(
        &self,
        center: Vec2,
        radius: f32,
        start: f32,
        degrees: f32,
        closed: bool,
    ) -> GeometryResult<Path> {
        if degrees <= 0.0 || degrees > 360.0 {
            return Err(GeometryError::DegreesOutOfRange { degrees });
        }

        let arc = degrees.to_radians();
        let mut segments = curve_segments(radius, arc, self.tolerance);
        // Never more segments than whole degrees.
        if (degrees as usize) < segments {
            segments = (degrees as usize).max(1);
        }
        let srad = start.to_radians();
        let coef = arc / segments as f32;

        let mut path = Path::new();
        path.reserve(segments + 2);
        for i in 0..=segments {
            let rads = srad + i as f32 * coef;
            path.push(center + Vec2::from_angle(rads) * radius, false);
        }
        if closed && degrees != 360.0 {
            path.push(center, true);
        }
        path.closed = closed;
        Ok(path)
    }

    /// A closed rounded-rectangle path.
    ///
    /// The corner radius must not exceed half the width or half the height.
    pub fn make_rounded_rect(&self, rect: Rect<f32>, radius: f32) -> GeometryResult<Path> {
        let mut path = Path::new();
        self.rounded_rect_boundary(&mut path, rect, radius)?;
        path.closed = true;
        Ok(path)
    }

    /// A closed capsule path fitting the given bounding box.
    ///
    /// A capsule is a pill shape: when the box is taller than wide the
    /// rounded portions go on the top and bottom, otherwise on the left and
    /// right. Half capsules round only one end and keep corner flags on the
    /// flat one.
    pub fn make_capsule(&self, shape: Capsule, rect: Rect<f32>) -> Path {
        let (w, h) = (rect.width, rect.height);
        let center = Vec2::new(rect.x + w / 2.0, rect.y + h / 2.0);
        if shape == Capsule::Degenerate || w == h {
            return self.make_ellipse(center, Vec2::new(w, h));
        }

        let radius = w.min(h) / 2.0;
        let segments = curve_segments(radius, PI, self.tolerance);
        let coef = PI / segments as f32;
        let mut path = Path::new();

        if w <= h {
            let iy = rect.y + radius;
            let ih = h - w;

            // Around the bottom.
            if shape == Capsule::HalfReverse {
                path.push(Vec2::new(center.x - radius, iy), true);
                path.push(Vec2::new(center.x + radius, iy), true);
            } else {
                for i in 0..=segments {
                    // Pin the final angle so round-off cannot overshoot.
                    let rads = if i == segments { PI } else { i as f32 * coef };
                    path.push(
                        Vec2::new(center.x - radius * rads.cos(), iy - radius * rads.sin()),
                        false,
                    );
                }
            }

            // Around the top.
            if shape == Capsule::Half {
                path.push(Vec2::new(center.x + radius, iy + ih), true);
                path.push(Vec2::new(center.x - radius, iy + ih), true);
            } else {
                for i in 0..=segments {
                    let rads = if i == segments { PI } else { i as f32 * coef };
                    path.push(
                        Vec2::new(
                            center.x + radius * rads.cos(),
                            iy + ih + radius * rads.sin(),
                        ),
                        false,
                    );
                }
            }
        } else {
            let ix = rect.x + radius;
            let iw = w - h;

            // Up the left side.
            if shape == Capsule::HalfReverse {
                path.push(Vec2::new(ix, center.y + radius), true);
                path.push(Vec2::new(ix, center.y - radius), true);
            } else {
                for i in 0..=segments {
                    let rads = if i == segments { PI } else { i as f32 * coef };
                    path.push(
                        Vec2::new(ix - radius * rads.sin(), center.y + radius * rads.cos()),
                        false,
                    );
                }
            }

            // Down the right side.
            if shape == Capsule::Half {
                path.push(Vec2::new(ix + iw, center.y - radius), true);
                path.push(Vec2::new(ix + iw, center.y + radius), true);
            } else {
                for i in 0..=segments {
                    let rads = if i == segments { PI } else { i as f32 * coef };
                    path.push(
                        Vec2::new(
                            ix + iw + radius * rads.sin(),
                            center.y - radius * rads.cos(),
                        ),
                        false,
                    );
                }
            }
        }
        path.closed = true;
        path
    }

    /// A wireframe of an existing polygon as a set of paths.
    ///
    /// `Open` and `Closed` traverse each boundary loop of the polygon
    /// separately; `Interior` produces one closed triangle path per
    /// tessellation triangle; `None` produces nothing.
    pub fn make_traversal(&self, src: &Polygon, traversal: Traversal) -> Vec<Path> {
        match traversal {
            Traversal::None => Vec::new(),
            Traversal::Open => self.boundary_traversal(src, false),
            Traversal::Closed => self.boundary_traversal(src, true),
            Traversal::Interior => self.interior_traversal(src),
        }
    }

    /// One path per boundary loop of the polygon, open or closed.
    fn boundary_traversal(&self, src: &Polygon, closed: bool) -> Vec<Path> {
        src.boundaries()
            .into_iter()
            .map(|ring| {
                let mut path = Path::new();
                path.reserve(ring.len());
                for index in ring {
                    path.push(src.vertices[index as usize], true);
                }
                path.closed = closed;
                path
            })
            .collect()
    }

    /// One closed path per triangle of the polygon's tessellation.
    fn interior_traversal(&self, src: &Polygon) -> Vec<Path> {
        src.indices
            .chunks_exact(3)
            .map(|tri| {
                let mut path = Path::new();
                for &index in tri {
                    path.push(src.vertices[index as usize], true);
                }
                path.closed = true;
                path
            })
            .collect()
    }

    /// Append the boundary vertices of a rounded rectangle to `path`.
    ///
    /// Emits the four quarter-circle corners counter-clockwise starting from
    /// the top-right. Shared with the solid factory.
    pub(crate) fn rounded_rect_boundary(
        &self,
        path: &mut Path,
        rect: Rect<f32>,
        radius: f32,
    ) -> GeometryResult<()> {
        let (w, h) = (rect.width, rect.height);
        let half_w = (w / 2.0).abs();
        let half_h = (h / 2.0).abs();
        if radius > half_w {
            return Err(GeometryError::RadiusTooLarge {
                radius,
                limit: half_w,
            });
        }
        if radius > half_h {
            return Err(GeometryError::RadiusTooLarge {
                radius,
                limit: half_h,
            });
        }

        let segments = curve_segments(radius, FRAC_PI_2, self.tolerance);
        let coef = FRAC_PI_2 / segments as f32;

        // Corner circle centers, tolerating negative extents.
        let c1 = Vec2::new(w.max(0.0), h.max(0.0)); // top right
        let c2 = Vec2::new(w.min(0.0), h.max(0.0)); // top left
        let c3 = Vec2::new(w.min(0.0), h.min(0.0)); // bottom left
        let c4 = Vec2::new(w.max(0.0), h.min(0.0)); // bottom right
        let origin = Vec2::new(rect.x, rect.y);

        path.reserve(4 * (segments + 1));

        let center = origin + c1 + Vec2::new(-radius, -radius);
        for i in 0..=segments {
            let rads = i as f32 * coef;
            path.push(center + radius * Vec2::new(rads.cos(), rads.sin()), false);
        }

        let center = origin + c2 + Vec2::new(radius, -radius);
        for i in 0..=segments {
            let rads = i as f32 * coef;
            path.push(center + radius * Vec2::new(-rads.sin(), rads.cos()), false);
        }

        let center = origin + c3 + Vec2::new(radius, radius);
        for i in 0..=segments {
            let rads = i as f32 * coef;
            path.push(center + radius * Vec2::new(-rads.cos(), -rads.sin()), false);
        }

        let center = origin + c4 + Vec2::new(-radius, radius);
        for i in 0..=segments {
            let rads = i as f32 * coef;
            path.push(center + radius * Vec2::new(rads.sin(), -rads.cos()), false);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_curve_segments_tolerance_bound() {
        // Every chord of the approximation must stay within tolerance.
        for (radius, tol) in [(1.0f32, 0.5f32), (10.0, 0.5), (100.0, 0.1)] {
            let segments = curve_segments(radius, TAU, tol);
            let da = TAU / segments as f32;
            let sagitta = radius * (1.0 - (da / 2.0).cos());
            assert!(sagitta <= tol + 1e-5);
        }
        assert_eq!(curve_segments(0.001, TAU, 10.0), 2);
    }

    #[test]
    fn test_make_line() {
        let path = PathFactory::new().make_line(Vec2::ZERO, Vec2::new(3.0, 4.0));
        assert_eq!(path.len(), 2);
        assert!(!path.closed);
        assert!(path.is_corner(0) && path.is_corner(1));
    }

    #[test]
    fn test_make_ngon() {
        let path = PathFactory::new().make_ngon(Vec2::ZERO, 2.0, 6);
        assert_eq!(path.len(), 6);
        assert!(path.closed);
        assert!(path.is_convex());
        assert_eq!(path.orientation(), -1);
        for v in &path.vertices {
            assert!((v.length() - 2.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_make_circle_within_tolerance() {
        let factory = PathFactory::with_tolerance(0.1);
        let path = factory.make_circle(Vec2::ZERO, 10.0);
        assert!(path.closed);
        // All vertices on the circle, and segment midpoints within tolerance.
        let n = path.len();
        for i in 0..n {
            let a = path.vertices[i];
            let b = path.vertices[(i + 1) % n];
            assert!((a.length() - 10.0).abs() < 1e-4);
            assert!(10.0 - ((a + b) * 0.5).length() <= 0.1 + 1e-4);
        }
    }

    #[test]
    fn test_make_arc_rejects_bad_sweep() {
        let factory = PathFactory::new();
        assert!(factory.make_arc(Vec2::ZERO, 1.0, 0.0, 0.0, false).is_err());
        assert!(factory.make_arc(Vec2::ZERO, 1.0, 0.0, -10.0, false).is_err());
        assert!(factory.make_arc(Vec2::ZERO, 1.0, 0.0, 361.0, false).is_err());
        assert!(factory.make_arc(Vec2::ZERO, 1.0, 0.0, 360.0, false).is_ok());
    }

    #[test]
    fn test_make_arc_pie_slice() {
        let factory = PathFactory::new();
        let path = factory
            .make_arc(Vec2::ZERO, 10.0, 0.0, 90.0, true)
            .unwrap();
        assert!(path.closed);
        // Ends with the center point of the pie.
        assert_eq!(*path.vertices.last().unwrap(), Vec2::ZERO);
        assert!(path.area() > 0.0);
        assert_eq!(path.orientation(), -1);
        // A quarter disc of radius 10 has area 25π; the polygonal slice
        // undershoots a little.
        assert!((path.area() - 25.0 * PI).abs() < 4.0);
    }

    #[test]
    fn test_make_rounded_rect_radius_limit() {
        let factory = PathFactory::new();
        let rect = Rect::new(0.0, 0.0, 4.0, 2.0);
        assert!(matches!(
            factory.make_rounded_rect(rect, 1.5),
            Err(GeometryError::RadiusTooLarge { .. })
        ));
        let path = factory.make_rounded_rect(rect, 0.5).unwrap();
        assert!(path.closed);
        assert!(path.is_convex());
        // Area between the inner rect (3x1 + side slabs) and the full rect.
        assert!(path.area() < 8.0 && path.area() > 7.5);
    }

    #[test]
    fn test_make_capsule_full() {
        let factory = PathFactory::with_tolerance(0.01);
        let path = factory.make_capsule(Capsule::Full, Rect::new(0.0, 0.0, 2.0, 6.0));
        assert!(path.closed);
        let (min, max) = path.bounds().unwrap();
        assert!((min - Vec2::ZERO).length() < 1e-4);
        assert!((max - Vec2::new(2.0, 6.0)).length() < 1e-4);
        // Rect portion plus two semicircle caps of radius 1.
        assert!((path.area() - (2.0 * 4.0 + PI)).abs() < 0.2);
    }

    #[test]
    fn test_make_capsule_half_variants() {
        let factory = PathFactory::with_tolerance(0.01);
        let rect = Rect::new(0.0, 0.0, 2.0, 6.0);
        let half = factory.make_capsule(Capsule::Half, rect);
        let reverse = factory.make_capsule(Capsule::HalfReverse, rect);
        // One round end each: the flat end sits at the interior rectangle
        // edge, so the area is the rect portion plus a single cap.
        assert!((half.area() - (2.0 * 4.0 + PI / 2.0)).abs() < 0.2);
        assert!((half.area() - reverse.area()).abs() < 0.1);
        // The flat ends carry corner flags.
        assert_eq!(half.corners.len(), 2);
        assert_eq!(reverse.corners.len(), 2);
    }

    #[test]
    fn test_make_capsule_degenerate() {
        let factory = PathFactory::new();
        let path = factory.make_capsule(Capsule::Full, Rect::new(0.0, 0.0, 4.0, 4.0));
        // Width == height degenerates to the inscribed circle.
        let center = Vec2::new(2.0, 2.0);
        for v in &path.vertices {
            assert!((v.distance(center) - 2.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_traversal_interior() {
        let poly = Polygon::from_rect(Rect::new(0.0, 0.0, 1.0, 1.0));
        let paths = PathFactory::new().make_traversal(&poly, Traversal::Interior);
        assert_eq!(paths.len(), 2);
        assert!(paths.iter().all(|p| p.closed && p.len() == 3));
        assert!(PathFactory::new()
            .make_traversal(&poly, Traversal::None)
            .is_empty());
    }

    #[test]
    fn test_traversal_boundary() {
        let poly = Polygon::from_rect(Rect::new(0.0, 0.0, 1.0, 1.0));
        let paths = PathFactory::new().make_traversal(&poly, Traversal::Closed);
        assert_eq!(paths.len(), 1);
        assert!(paths[0].closed);
        assert_eq!(paths[0].len(), 4);
        let open = PathFactory::new().make_traversal(&poly, Traversal::Open);
        assert!(!open[0].closed);
    }
}
