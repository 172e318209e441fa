//! A factory for generating common solid polygons.
//!
//! This is the solid counterpart to [`PathFactory`](crate::PathFactory):
//! the same canonical shapes, but emitted as fan-triangulated meshes ready
//! for rendering. Curved shapes fan from their centroid; a triangle or
//! rectangle is emitted directly.
//!
//! Each generator comes in two forms: `make_*` returns a fresh
//! [`Polygon`], and `*_into` appends to an existing one (re-basing the
//! indices), so a batch of shapes can accumulate into a single mesh without
//! reallocation.

use std::f32::consts::TAU;

use glam::Vec2;
use polyform_core::geometry::Rect;

use crate::error::{GeometryError, GeometryResult};
use crate::path::Path;
use crate::path_factory::{DEFAULT_TOLERANCE, PathFactory, curve_segments};
use crate::polygon::Polygon;
use crate::stroke::Capsule;

/// A generator for canonical solid polygons.
///
/// Shares the curve-tolerance convention with [`PathFactory`]: curved shapes
/// get enough segments that the true curve stays within tolerance of the
/// mesh boundary. Calculation and materialization are one step here; the
/// generators are cheap enough that no set/calculate split is needed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolyFactory {
    /// The curve tolerance for rounded shapes.
    tolerance: f32,
}

impl Default for PolyFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl PolyFactory {
    /// Create a factory with the default curve tolerance.
    pub fn new() -> Self {
        PolyFactory {
            tolerance: DEFAULT_TOLERANCE,
        }
    }

    /// Create a factory with the given curve tolerance.
    pub fn with_tolerance(tolerance: f32) -> Self {
        PolyFactory { tolerance }
    }

    /// The curve tolerance for rounded shapes.
    pub fn tolerance(&self) -> f32 {
        self.tolerance
    }

    /// Set the curve tolerance for rounded shapes.
    pub fn set_tolerance(&mut self, tolerance: f32) {
        self.tolerance = tolerance;
    }

    /// A solid triangle through the three given vertices.
    pub fn make_triangle(&self, a: Vec2, b: Vec2, c: Vec2) -> Polygon {
        let mut poly = Polygon::new();
        self.triangle_into(&mut poly, a, b, c);
        poly
    }

    /// Append a solid triangle to `poly`.
    ///
    /// The indices are ordered so the triangle is counter-clockwise
    /// regardless of the winding of the input points.
    pub fn triangle_into(&self, poly: &mut Polygon, a: Vec2, b: Vec2, c: Vec2) {
        let offset = poly.vertices.len() as u16;
        poly.vertices.extend([a, b, c]);
        if Path::orientation_of(a, b, c) >= 0 {
            poly.indices.extend([offset + 2, offset + 1, offset]);
        } else {
            poly.indices.extend([offset, offset + 1, offset + 2]);
        }
    }

    /// A solid rectangle.
    pub fn make_rect(&self, rect: Rect<f32>) -> Polygon {
        let mut poly = Polygon::new();
        self.rect_into(&mut poly, rect);
        poly
    }

    /// Append a solid rectangle to `poly` as two triangles.
    pub fn rect_into(&self, poly: &mut Polygon, rect: Rect<f32>) {
        let offset = poly.vertices.len() as u16;
        poly.vertices
            .extend(rect.corners().iter().map(|&(x, y)| Vec2::new(x, y)));
        poly.indices.extend([
            offset,
            offset + 1,
            offset + 2,
            offset + 2,
            offset + 3,
            offset,
        ]);
    }

    /// A solid regular polygon centered at `center`.
    ///
    /// A regular polygon is a circle with an explicit segment count instead
    /// of one implied by the curve tolerance.
    pub fn make_ngon(&self, center: Vec2, radius: f32, sides: usize) -> Polygon {
        let mut poly = Polygon::new();
        self.ngon_into(&mut poly, center, radius, sides);
        poly
    }

    /// Append a solid regular polygon to `poly`, fanned from its center.
    pub fn ngon_into(&self, poly: &mut Polygon, center: Vec2, radius: f32, sides: usize) {
        let coef = TAU / sides as f32;
        let boundary: Vec<Vec2> = (0..sides)
            .map(|i| center + Vec2::from_angle(i as f32 * coef) * radius)
            .collect();
        fan_into(poly, &boundary, center, true);
    }

    /// A solid ellipse of the given diameters.
    pub fn make_ellipse(&self, center: Vec2, size: Vec2) -> Polygon {
        let mut poly = Polygon::new();
        self.ellipse_into(&mut poly, center, size);
        poly
    }

    /// Append a solid ellipse to `poly`, fanned from its center.
    pub fn ellipse_into(&self, poly: &mut Polygon, center: Vec2, size: Vec2) {
        let radii = size * 0.5;
        let segments = curve_segments(radii.x.max(radii.y), TAU, self.tolerance);
        let coef = TAU / segments as f32;
        let boundary: Vec<Vec2> = (0..segments)
            .map(|i| center + Vec2::from_angle(i as f32 * coef) * radii)
            .collect();
        fan_into(poly, &boundary, center, true);
    }

    /// A solid circle of the given radius.
    pub fn make_circle(&self, center: Vec2, radius: f32) -> Polygon {
        self.make_ellipse(center, Vec2::splat(2.0 * radius))
    }

    /// Append a solid circle to `poly`.
    pub fn circle_into(&self, poly: &mut Polygon, center: Vec2, radius: f32) {
        self.ellipse_into(poly, center, Vec2::splat(2.0 * radius));
    }

    /// A solid pie slice of the circle around `center`, measured in degrees.
    ///
    /// The sweep must lie in (0, 360].
    pub fn make_arc(
        &self,
        center: Vec2,
        radius: f32,
        start: f32,
        degrees: f32,
    ) -> GeometryResult<Polygon> {
        let mut poly = Polygon::new();
        self.arc_into(&mut poly, center, radius, start, degrees)?;
        Ok(poly)
    }

    /// Append a solid pie slice to `poly`, fanned from the circle center.
    pub fn arc_into(
        &self,
        poly: &mut Polygon,
        center: Vec2,
        radius: f32,
        start: f32,
        degrees: f32,
    ) -> GeometryResult<()> {
        if degrees <= 0.0 || degrees > 360.0 {
            return Err(GeometryError::DegreesOutOfRange { degrees });
        }
        let arc = degrees.to_radians();
        let mut segments = curve_segments(radius, arc, self.tolerance);
        if (degrees as usize) < segments {
            segments = (degrees as usize).max(1);
        }
        let srad = start.to_radians();
        let coef = arc / segments as f32;

        let boundary: Vec<Vec2> = (0..=segments)
            .map(|i| center + Vec2::from_angle(srad + i as f32 * coef) * radius)
            .collect();
        fan_into(poly, &boundary, center, degrees == 360.0);
        Ok(())
    }

    /// A solid rounded rectangle.
    ///
    /// The corner radius must not exceed half the width or half the height.
    pub fn make_rounded_rect(&self, rect: Rect<f32>, radius: f32) -> GeometryResult<Polygon> {
        let mut poly = Polygon::new();
        self.rounded_rect_into(&mut poly, rect, radius)?;
        Ok(poly)
    }

    /// Append a solid rounded rectangle to `poly`, fanned from its center.
    pub fn rounded_rect_into(
        &self,
        poly: &mut Polygon,
        rect: Rect<f32>,
        radius: f32,
    ) -> GeometryResult<()> {
        let mut boundary = Path::new();
        PathFactory::with_tolerance(self.tolerance)
            .rounded_rect_boundary(&mut boundary, rect, radius)?;
        let center = Vec2::new(rect.x + rect.width / 2.0, rect.y + rect.height / 2.0);
        fan_into(poly, &boundary.vertices, center, true);
        Ok(())
    }

    /// A solid capsule fitting the given bounding box.
    pub fn make_capsule(&self, shape: Capsule, rect: Rect<f32>) -> Polygon {
        let mut poly = Polygon::new();
        self.capsule_into(&mut poly, shape, rect);
        poly
    }

    /// Append a solid capsule to `poly`, fanned from its center.
    ///
    /// The boundary layout matches
    /// [`PathFactory::make_capsule`](crate::PathFactory::make_capsule).
    pub fn capsule_into(&self, poly: &mut Polygon, shape: Capsule, rect: Rect<f32>) {
        let (w, h) = (rect.width, rect.height);
        let center = Vec2::new(rect.x + w / 2.0, rect.y + h / 2.0);
        if shape == Capsule::Degenerate || w == h {
            self.ellipse_into(poly, center, Vec2::new(w, h));
            return;
        }
        let boundary = PathFactory::with_tolerance(self.tolerance).make_capsule(shape, rect);
        fan_into(poly, &boundary.vertices, center, true);
    }
}

/// Append a triangle fan over `boundary` to `poly`, pivoting on `center`.
///
/// With `wrap`, a closing triangle connects the last boundary point back to
/// the first.
fn fan_into(poly: &mut Polygon, boundary: &[Vec2], center: Vec2, wrap: bool) {
    if boundary.is_empty() {
        return;
    }
    let offset = poly.vertices.len() as u16;
    let count = boundary.len() as u16;
    poly.vertices.extend_from_slice(boundary);
    poly.vertices.push(center);

    for i in 0..count - 1 {
        poly.indices.extend([offset + i, offset + i + 1, offset + count]);
    }
    if wrap {
        poly.indices
            .extend([offset + count - 1, offset, offset + count]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn mesh_area(poly: &Polygon) -> f32 {
        poly.indices
            .chunks_exact(3)
            .map(|t| {
                let a = poly.vertices[t[0] as usize];
                let b = poly.vertices[t[1] as usize];
                let c = poly.vertices[t[2] as usize];
                (b - a).perp_dot(c - a) * 0.5
            })
            .sum()
    }

    #[test]
    fn test_triangle_winding_fixed() {
        let factory = PolyFactory::new();
        let ccw = factory.make_triangle(Vec2::ZERO, Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0));
        let cw = factory.make_triangle(Vec2::ZERO, Vec2::new(0.0, 1.0), Vec2::new(1.0, 0.0));
        assert!(mesh_area(&ccw) > 0.0);
        assert!(mesh_area(&cw) > 0.0);
    }

    #[test]
    fn test_rect_mesh() {
        let poly = PolyFactory::new().make_rect(Rect::new(0.0, 0.0, 4.0, 2.0));
        assert_eq!(poly.vertex_count(), 4);
        assert_eq!(poly.triangle_count(), 2);
        assert!((mesh_area(&poly) - 8.0).abs() < 1e-5);
    }

    #[test]
    fn test_ngon_fan() {
        let poly = PolyFactory::new().make_ngon(Vec2::ZERO, 2.0, 8);
        assert_eq!(poly.vertex_count(), 9);
        assert_eq!(poly.triangle_count(), 8);
        assert!(poly.contains(Vec2::ZERO));
        // Area of a regular octagon: 2√2 r².
        assert!((mesh_area(&poly) - 2.0 * 2.0_f32.sqrt() * 4.0).abs() < 1e-4);
    }

    #[test]
    fn test_circle_mesh() {
        let poly = PolyFactory::with_tolerance(0.01).make_circle(Vec2::new(1.0, 1.0), 2.0);
        assert!(poly.contains(Vec2::new(1.0, 1.0)));
        assert!(!poly.contains(Vec2::new(3.5, 1.0)));
        assert!((mesh_area(&poly) - PI * 4.0).abs() < 0.1);
    }

    #[test]
    fn test_arc_mesh() {
        let factory = PolyFactory::new();
        assert!(factory.make_arc(Vec2::ZERO, 1.0, 0.0, 400.0).is_err());

        let poly = factory.make_arc(Vec2::ZERO, 10.0, 0.0, 90.0).unwrap();
        // All triangles fan from the center, none degenerate.
        assert_eq!(poly.triangle_count(), poly.vertex_count() - 2);
        assert!(mesh_area(&poly) > 0.0);
        assert!(poly.contains(Vec2::new(5.0, 5.0)));
        assert!(!poly.contains(Vec2::new(-5.0, 5.0)));
    }

    #[test]
    fn test_full_arc_matches_circle_area() {
        let factory = PolyFactory::new();
        let arc = factory.make_arc(Vec2::ZERO, 5.0, 0.0, 360.0).unwrap();
        let circle = factory.make_circle(Vec2::ZERO, 5.0);
        assert!((mesh_area(&arc) - mesh_area(&circle)).abs() < 0.5);
    }

    #[test]
    fn test_rounded_rect_mesh() {
        let factory = PolyFactory::new();
        let rect = Rect::new(0.0, 0.0, 4.0, 2.0);
        assert!(factory.make_rounded_rect(rect, 3.0).is_err());

        let poly = factory.make_rounded_rect(rect, 0.5).unwrap();
        let expected = 8.0 - (4.0 - PI) * 0.25;
        assert!((mesh_area(&poly) - expected).abs() < 0.15);
        assert!(poly.contains(Vec2::new(2.0, 1.0)));
        assert!(!poly.contains(Vec2::new(0.05, 0.05)));
    }

    #[test]
    fn test_capsule_mesh() {
        let factory = PolyFactory::with_tolerance(0.01);
        let poly = factory.make_capsule(Capsule::Full, Rect::new(0.0, 0.0, 6.0, 2.0));
        assert!((mesh_area(&poly) - (2.0 * 4.0 + PI)).abs() < 0.2);
        assert!(poly.contains(Vec2::new(3.0, 1.0)));

        let degenerate = factory.make_capsule(Capsule::Full, Rect::new(0.0, 0.0, 2.0, 2.0));
        assert!((mesh_area(&degenerate) - PI).abs() < 0.1);
    }

    #[test]
    fn test_append_into_offsets_indices() {
        let factory = PolyFactory::new();
        let mut poly = factory.make_rect(Rect::new(0.0, 0.0, 1.0, 1.0));
        factory.rect_into(&mut poly, Rect::new(2.0, 0.0, 1.0, 1.0));
        assert_eq!(poly.vertex_count(), 8);
        assert_eq!(poly.triangle_count(), 4);
        assert!((mesh_area(&poly) - 2.0).abs() < 1e-5);
        // Both rects reachable through the shared mesh.
        assert!(poly.contains(Vec2::new(0.5, 0.5)));
        assert!(poly.contains(Vec2::new(2.5, 0.5)));
    }
}
