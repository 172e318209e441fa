//! A factory for flattening a spline into a path.
//!
//! All of the rendering tools work on paths and polygons, so a spline must be
//! approximated by line segments before it can be drawn. In addition to the
//! flattened path, this factory materializes side products for curve-editing
//! UIs: the parameter of each flattened point, tangent and normal lists, and
//! small circular markers for anchors and tangent handles.
//!
//! As with the other factories, the methods split into initialization,
//! calculation, and materialization. The factory owns a copy of its spline,
//! so a worker thread can run [`calculate`](SplineFlattener::calculate)
//! while the original is edited; the factory itself must not be shared
//! mid-calculation.

use glam::Vec2;
use polyform_core::alloc::HashMap;

use crate::path::Path;
use crate::polygon::Polygon;
use crate::spline::Spline;

/// Maximum recursion depth for the subdivision.
const MAX_DEPTH: u32 = 8;

/// The default flatness tolerance for the approximation.
const DEFAULT_FLATNESS: f32 = 0.5;

/// A spline-to-path approximator using recursive de Casteljau subdivision.
///
/// Each bezier segment is recursively bisected into two geometrically
/// equivalent halves until the control polygon is flat enough (or a depth
/// bound is hit). The flattened output keeps the control-point structure
/// (`anchor, tangent, tangent, anchor, ...`), so it can also be re-read as a
/// refined spline with [`refinement`](Self::refinement).
#[derive(Debug, Clone)]
pub struct SplineFlattener {
    /// The spline under approximation.
    spline: Option<Spline>,
    /// The flattened control points.
    point_buffer: Vec<Vec2>,
    /// The curve parameter at each flattened anchor.
    param_buffer: Vec<f32>,
    /// Positions in the point buffer holding original anchors, with the
    /// anchor index.
    anchors: HashMap<usize, usize>,
    /// Whether the approximated curve is closed.
    closed: bool,
    /// Whether the calculation has been run.
    calculated: bool,
    /// The flatness tolerance.
    tolerance: f32,
}

impl Default for SplineFlattener {
    fn default() -> Self {
        Self::new()
    }
}

impl SplineFlattener {
    /// Create a flattener with no spline data.
    pub fn new() -> Self {
        SplineFlattener {
            spline: None,
            point_buffer: Vec::new(),
            param_buffer: Vec::new(),
            anchors: HashMap::new(),
            closed: false,
            calculated: false,
            tolerance: DEFAULT_FLATNESS,
        }
    }

    /// Create a flattener over a copy of the given spline.
    pub fn from_spline(spline: &Spline) -> Self {
        let mut flattener = Self::new();
        flattener.set(spline);
        flattener
    }

    /// Set the spline to approximate, copying it.
    ///
    /// Resets any previous calculation.
    pub fn set(&mut self, spline: &Spline) {
        self.reset();
        self.spline = Some(spline.clone());
    }

    /// The flatness tolerance.
    pub fn tolerance(&self) -> f32 {
        self.tolerance
    }

    /// Set the flatness tolerance.
    ///
    /// Smaller values produce more segments. Takes effect on the next
    /// [`calculate`](Self::calculate).
    pub fn set_tolerance(&mut self, tolerance: f32) {
        self.tolerance = tolerance;
    }

    /// Clear the computed data, keeping the spline and settings.
    ///
    /// Use this to re-run the approximation at a different tolerance.
    pub fn reset(&mut self) {
        self.calculated = false;
        self.point_buffer.clear();
        self.param_buffer.clear();
        self.anchors.clear();
    }

    /// Clear all data including the spline.
    pub fn clear(&mut self) {
        self.reset();
        self.spline = None;
    }

    /// Run the approximation.
    ///
    /// Does nothing when no spline is set or the spline has no segments.
    pub fn calculate(&mut self) {
        self.reset();
        let Some(spline) = self.spline.take() else {
            return;
        };

        let size = spline.segments();
        if size > 0 {
            let points = spline.control_points();
            for i in 0..size {
                self.anchors.insert(self.point_buffer.len(), i);
                let base = 3 * i;
                self.generate(
                    i as f32,
                    points[base],
                    points[base + 1],
                    points[base + 2],
                    points[base + 3],
                    0,
                );
            }
            // The final anchor terminates the last segment.
            self.anchors.insert(self.point_buffer.len(), size);
            self.point_buffer.push(points[3 * size]);
            self.param_buffer.push(size as f32);
            self.closed = spline.is_closed();
            self.calculated = true;
        }
        self.spline = Some(spline);
    }

    /// The flattened spline as a path.
    ///
    /// The path vertices are the anchors of the subdivided control polygon.
    /// Original anchors that are not smooth become path corners, so a later
    /// extrusion gives hinges a joint and keeps curve interiors seamless.
    /// Without a calculation this falls back to the control points of the
    /// original spline.
    pub fn path(&self) -> Path {
        let points = self.active_points();
        if points.is_empty() {
            return Path::new();
        }

        let mut path = Path::new();
        let size = points.len();
        // A closed approximation repeats the first anchor at the end.
        let limit = if self.is_closed_active() {
            size.saturating_sub(4)
        } else {
            size - 1
        };
        path.reserve(limit / 3 + 1);
        let mut i = 0;
        while 3 * i <= limit {
            path.push(points[3 * i], false);
            i += 1;
        }

        if let Some(spline) = &self.spline {
            if self.calculated {
                for (&pos, &anchor) in &self.anchors {
                    let vertex = pos / 3;
                    if vertex < path.len() && !spline.is_smooth(anchor).unwrap_or(true) {
                        path.corners.insert(vertex);
                    }
                }
            } else {
                for anchor in 0..path.len() {
                    if !spline.is_smooth(anchor).unwrap_or(true) {
                        path.corners.insert(anchor);
                    }
                }
            }
        }
        path.closed = self.is_closed_active();
        path
    }

    /// The curve parameter generating each flattened anchor.
    ///
    /// Evaluating the original spline at these parameters reproduces the
    /// path vertices. Without a calculation this is the integer anchor
    /// parameters of the original spline.
    pub fn parameters(&self) -> Vec<f32> {
        if self.calculated {
            self.param_buffer.clone()
        } else if let Some(spline) = &self.spline {
            (0..=spline.segments()).map(|i| i as f32).collect()
        } else {
            Vec::new()
        }
    }

    /// The tangent vectors of the approximation, in control-point order.
    ///
    /// Per flattened segment: the right tangent of its first anchor, then
    /// the left tangent of its second. A polygon of `n` points yields
    /// `2(n - 1)` tangents.
    pub fn tangents(&self) -> Vec<Vec2> {
        let points = self.active_points();
        if points.is_empty() {
            return Vec::new();
        }
        let segments = (points.len() - 1) / 3;
        let mut result = Vec::with_capacity(2 * segments);
        for i in 0..segments {
            let base = 3 * i;
            result.push(points[base + 1] - points[base]);
            result.push(points[base + 2] - points[base + 3]);
        }
        result
    }

    /// The normal vectors of the approximation, one per flattened anchor.
    ///
    /// Normals are perpendicular to the right tangents; the final anchor of
    /// an open spline takes its normal from its left tangent instead.
    pub fn normals(&self) -> Vec<Vec2> {
        let points = self.active_points();
        if points.len() < 2 {
            return Vec::new();
        }
        let segments = (points.len() - 1) / 3;
        let mut result = Vec::with_capacity(segments + 1);
        for i in 0..segments {
            let base = 3 * i;
            result.push((points[base + 1] - points[base]).perp());
        }
        let last = points.len() - 1;
        result.push((points[last] - points[last - 1]).perp());
        result
    }

    /// Circular markers for the anchor points, as one polygon.
    ///
    /// Every anchor gets a filled n-gon of the given radius, suitable for
    /// drawing editor handles (the closed duplicate anchor is skipped).
    pub fn anchor_markers(&self, radius: f32, segments: usize) -> Polygon {
        let points = self.active_points();
        let mut poly = Polygon::new();
        if points.is_empty() {
            return poly;
        }
        let last = if self.is_closed_active() {
            points.len().saturating_sub(4) / 3
        } else {
            (points.len() - 1) / 3
        };
        for i in 0..=last {
            fill_marker(&mut poly, points[3 * i], radius, segments);
        }
        poly
    }

    /// Circular markers for the tangent points, as one polygon.
    ///
    /// Every tangent of every flattened segment gets a filled n-gon of the
    /// given radius.
    pub fn tangent_markers(&self, radius: f32, segments: usize) -> Polygon {
        let points = self.active_points();
        let mut poly = Polygon::new();
        let count = (points.len().saturating_sub(1)) / 3;
        for i in 0..count {
            fill_marker(&mut poly, points[3 * i + 1], radius, segments);
            fill_marker(&mut poly, points[3 * i + 2], radius, segments);
        }
        poly
    }

    /// The subdivided control polygon as a new spline.
    ///
    /// The refinement is geometrically equal to the original spline but has
    /// an anchor at every flattened point, which makes localized editing
    /// possible. Without a calculation this copies the original spline.
    pub fn refinement(&self) -> Spline {
        let points = self.active_points();
        let Ok(mut spline) = Spline::from_control_points(points.to_vec()) else {
            return Spline::default();
        };
        if self.is_closed_active() {
            let _ = spline.set_closed(true);
        }
        spline
    }

    /// Recursively subdivide one bezier, appending terminal control points.
    ///
    /// `t` is the curve parameter at the start of this sub-segment. Stops at
    /// the depth bound, on degenerate tangent handles, or when the interior
    /// control points deviate from the chord by less than the tolerance.
    fn generate(&mut self, t: f32, p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2, depth: u32) {
        let terminate = if depth >= MAX_DEPTH {
            true
        } else if p0 == p1 && p2 == p3 {
            true
        } else {
            let chord = p3 - p0;
            let d2 = (p1 - p3).perp_dot(chord).abs();
            let d3 = (p2 - p3).perp_dot(chord).abs();
            (d2 + d3) * (d2 + d3)
                < self.tolerance * self.tolerance * chord.length_squared()
        };

        if terminate {
            self.param_buffer.push(t);
            self.point_buffer.extend([p0, p1, p2]);
            return;
        }

        // The cross bar of de Casteljau's construction.
        let h = (p1 + p2) * 0.5;
        let l1 = (p0 + p1) * 0.5;
        let l2 = (l1 + h) * 0.5;
        let r2 = (p2 + p3) * 0.5;
        let r1 = (r2 + h) * 0.5;
        let center = (l2 + r1) * 0.5;

        let s = t + 1.0 / (1 << (depth + 1)) as f32;
        self.generate(t, p0, l1, l2, center, depth + 1);
        self.generate(s, center, r1, r2, p3, depth + 1);
    }

    /// The active control points: the calculation output, or the original
    /// spline's control points before any calculation.
    fn active_points(&self) -> &[Vec2] {
        if self.calculated {
            &self.point_buffer
        } else if let Some(spline) = &self.spline {
            spline.control_points()
        } else {
            &[]
        }
    }

    /// Whether the active approximation is closed.
    fn is_closed_active(&self) -> bool {
        if self.calculated {
            self.closed
        } else {
            self.spline.as_ref().is_some_and(|s| s.is_closed())
        }
    }
}

/// Append a filled n-gon marker at `center` to `poly`.
fn fill_marker(poly: &mut Polygon, center: Vec2, radius: f32, segments: usize) {
    if segments < 3 {
        return;
    }
    let offset = poly.vertices.len() as u16;
    poly.vertices.push(center);
    let coef = std::f32::consts::TAU / segments as f32;
    for i in 0..segments {
        let rads = i as f32 * coef;
        poly.vertices.push(center + Vec2::from_angle(rads) * radius);
    }
    for i in 0..segments as u16 {
        let next = (i + 1) % segments as u16;
        poly.indices.extend([offset, offset + 1 + i, offset + 1 + next]);
    }
}
