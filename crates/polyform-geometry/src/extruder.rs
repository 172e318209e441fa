//! A factory for extruding a path into a solid stroke polygon.
//!
//! An extrusion follows a path but gives it width, turning a zero-width
//! polyline into a filled shape. This is more involved than triangulating
//! the path itself: the output needs extra vertices depending on the joint
//! rule at each corner and the cap rule at the ends.
//!
//! The emission strategy guarantees the triangle mesh is "in order" (no
//! back-filling pass after the segments) while staying linear in the path
//! length plus joint complexity: the walk keeps exactly two trailing vertex
//! indices, and every new vertex closes one triangle against them before
//! replacing the older of the two. The approach derives from the stroke
//! expansion in NanoVG by Mikko Mononen.
//!
//! As with the other factories, the methods split into initialization,
//! calculation, and materialization so long extrusions can run on a worker
//! thread. The factory is not thread safe: do not touch an instance while
//! its calculation is in flight. Paths produced by drawing input should be
//! run through a [`PathSmoother`](crate::PathSmoother) first.

use std::f32::consts::PI;

use bitflags::bitflags;
use glam::Vec2;

use crate::path::Path;
use crate::path_factory::curve_segments;
use crate::polygon::Polygon;
use crate::stroke::{EndCap, Joint};

/// Default rounding tolerance.
const TOLERANCE: f32 = 0.25;
/// Default mitre limit.
const MITRE_LIMIT: f32 = 10.0;
/// Epsilon for small angles and segments.
const EPSILON: f32 = 1.0e-6;
/// Cap on the miter scale factor near 180-degree turns.
const SCALE_LIMIT: f32 = 600.0;

/// The side mark of a left vertex.
const LEFT_MK: f32 = -1.0;
/// The side mark of a right vertex.
const RIGHT_MK: f32 = 1.0;
/// The cap mark of a vertex on the head cap.
const HEAD_MK: f32 = -1.0;
/// The cap mark of a vertex on the tail cap.
const TAIL_MK: f32 = 1.0;

bitflags! {
    /// Per-point annotations computed by the analysis pass.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    struct PointFlags: u8 {
        /// The point is a corner and takes a mitre or rounded joint.
        const CORNER = 0x01;
        /// The path turns left at this point.
        const LEFT = 0x02;
        /// The joint must be beveled (square or round, or past the limit).
        const BEVEL = 0x04;
        /// The stroke is wider than an adjacent segment; the inner side
        /// would self-overlap, so the join uses the segment normals.
        const INNER = 0x08;
    }
}

/// An annotated point of the path under extrusion.
///
/// Caching the direction and length to the next point cuts down on repeated
/// calculation during the emission walk. Neighbors are reached by modular
/// indexing into the point array.
#[derive(Debug, Clone, Copy, Default)]
struct PathPoint {
    /// The point position.
    pos: Vec2,
    /// The unit direction to the next point.
    dir: Vec2,
    /// The distance to the next point.
    len: f32,
    /// The averaged-normal miter vector, scaled by `1 / |m|²` (capped).
    miter: Vec2,
    /// The analysis annotations.
    flags: PointFlags,
}

/// A path-to-stroke extruder with configurable joints and end caps.
///
/// Besides the stroke polygon itself, the extruder materializes the left
/// and right borders as paths and a per-vertex side annotation for stroke
/// shaders. Asymmetric extrusion (different left and right widths) is
/// supported directly, which allows extruding only one side of a
/// centerline.
#[derive(Debug, Clone)]
pub struct PathExtruder {
    /// The joint rule for interior corners.
    joint: Joint,
    /// The cap rule for the ends of an open path.
    cap: EndCap,
    /// The tolerance used for rounded joints and caps.
    tolerance: f32,
    /// The mitre limit (a bevel replaces any sharper mitre).
    mitre_limit: f32,

    /// Whether the source path is closed.
    closed: bool,
    /// Whether the analysis found every turn to be a left turn.
    convex: bool,
    /// Whether the calculation has been run.
    calculated: bool,

    /// The annotated input points.
    points: Vec<PathPoint>,

    /// The emitted stroke vertices.
    verts: Vec<Vec2>,
    /// The side/cap marks of each emitted vertex.
    sides: Vec<Vec2>,
    /// The left border of the extrusion, in emission order.
    lefts: Vec<Vec2>,
    /// The right border of the extrusion, in emission order.
    rights: Vec<Vec2>,
    /// The triangle indices of the stroke mesh.
    indices: Vec<u16>,

    /// The older of the two trailing strip indices.
    iback2: usize,
    /// The newer of the two trailing strip indices.
    iback1: usize,
}

impl Default for PathExtruder {
    fn default() -> Self {
        Self::new()
    }
}

impl PathExtruder {
    /// Create an extruder with no path data.
    pub fn new() -> Self {
        PathExtruder {
            joint: Joint::default(),
            cap: EndCap::default(),
            tolerance: TOLERANCE,
            mitre_limit: MITRE_LIMIT,
            closed: false,
            convex: true,
            calculated: false,
            points: Vec::new(),
            verts: Vec::new(),
            sides: Vec::new(),
            lefts: Vec::new(),
            rights: Vec::new(),
            indices: Vec::new(),
            iback2: 0,
            iback1: 0,
        }
    }

    /// Create an extruder over a copy of the given path.
    pub fn from_path(path: &Path) -> Self {
        let mut extruder = Self::new();
        extruder.set(path);
        extruder
    }

    /// Set the path to extrude, copying its data.
    ///
    /// Corner flags are taken from the path. Resets any previous
    /// calculation.
    pub fn set(&mut self, path: &Path) {
        self.clear();
        self.closed = path.closed;
        self.ingest(&path.vertices, |i| path.is_corner(i));
    }

    /// Set the path to extrude from raw points, copying them.
    ///
    /// Every point is treated as a corner. Resets any previous calculation.
    pub fn set_points(&mut self, points: &[Vec2], closed: bool) {
        self.clear();
        self.closed = closed;
        self.ingest(points, |_| true);
    }

    /// Clear the computed data, keeping the input path and settings.
    pub fn reset(&mut self) {
        self.verts.clear();
        self.sides.clear();
        self.lefts.clear();
        self.rights.clear();
        self.indices.clear();
        self.iback1 = 0;
        self.iback2 = 0;
        self.calculated = false;
    }

    /// Clear all data including the input path.
    pub fn clear(&mut self) {
        self.reset();
        self.points.clear();
        self.closed = false;
        self.convex = true;
    }

    /// The joint rule for interior corners.
    pub fn joint(&self) -> Joint {
        self.joint
    }

    /// Set the joint rule for interior corners.
    ///
    /// Resets any previous calculation.
    pub fn set_joint(&mut self, joint: Joint) {
        self.reset();
        self.joint = joint;
    }

    /// Builder-style variant of [`set_joint`](Self::set_joint).
    pub fn with_joint(mut self, joint: Joint) -> Self {
        self.set_joint(joint);
        self
    }

    /// The cap rule for the ends of an open path.
    pub fn end_cap(&self) -> EndCap {
        self.cap
    }

    /// Set the cap rule for the ends of an open path.
    ///
    /// Resets any previous calculation.
    pub fn set_end_cap(&mut self, cap: EndCap) {
        self.reset();
        self.cap = cap;
    }

    /// Builder-style variant of [`set_end_cap`](Self::set_end_cap).
    pub fn with_end_cap(mut self, cap: EndCap) -> Self {
        self.set_end_cap(cap);
        self
    }

    /// The error tolerance for rounded joints and caps.
    pub fn tolerance(&self) -> f32 {
        self.tolerance
    }

    /// Set the error tolerance for rounded joints and caps.
    ///
    /// This determines the number of segments in a rounded joint or cap.
    pub fn set_tolerance(&mut self, tolerance: f32) {
        self.tolerance = tolerance;
    }

    /// The mitre limit.
    pub fn mitre_limit(&self) -> f32 {
        self.mitre_limit
    }

    /// Set the mitre limit.
    ///
    /// Sharp corners produce long mitre points; when the scaled miter vector
    /// of a corner exceeds this limit, the extrusion falls back to a bevel
    /// there. Small angles can otherwise push the mitre point far off
    /// screen.
    pub fn set_mitre_limit(&mut self, limit: f32) {
        self.mitre_limit = limit;
    }

    /// Check if the analysis found the path to be convex.
    ///
    /// Meaningful after [`calculate`](Self::calculate).
    pub fn is_convex(&self) -> bool {
        self.convex
    }

    /// Extrude the path symmetrically with the given total stroke width.
    ///
    /// The width is measured across the stroke, so half of it lands on each
    /// side of the path.
    pub fn calculate(&mut self, width: f32) {
        self.calculate_uneven(width / 2.0, width / 2.0);
    }

    /// Extrude the path with independent left and right widths.
    ///
    /// A zero width on one side extrudes only the other, starting from the
    /// centerline. Does nothing when already calculated or without a path.
    pub fn calculate_uneven(&mut self, left_width: f32, right_width: f32) {
        if self.calculated || self.points.len() < 2 {
            return;
        }

        let leftmark = if left_width > 0.0 { LEFT_MK } else { 0.0 };
        let rightmark = if right_width > 0.0 { RIGHT_MK } else { 0.0 };

        let width = left_width + right_width;
        let ncap = curve_segments(width, PI, self.tolerance);
        let nbevel = self.analyze(width);

        // Vertex estimate, used to preallocate the output buffers.
        let psize = self.points.len();
        let mut cverts = if self.joint == Joint::Round {
            (psize + nbevel * (ncap + 2) + 1) * 2
        } else {
            (psize + nbevel * 5 + 1) * 2
        };
        if !self.closed {
            cverts += if self.cap == EndCap::Round {
                (ncap * 2 + 2) * 2
            } else {
                12
            };
        }
        self.verts.reserve(cverts);
        self.sides.reserve(cverts);
        self.indices.reserve(cverts * 3);

        let n = psize;
        let (mut p0, mut p1, s, e);
        if self.closed {
            p0 = n - 1;
            p1 = 0;
            s = 0;
            e = n;
        } else {
            p0 = 0;
            p1 = 1;
            s = 1;
            e = n - 1;
            let head = self.points[0];
            let mut dv = self.points[1].pos - head.pos;
            let mag = dv.length();
            if mag > EPSILON {
                dv /= mag;
            }
            match self.cap {
                EndCap::Butt => self.start_butt(head, dv, left_width, right_width),
                EndCap::Square => self.start_square(head, dv, left_width, right_width, width),
                EndCap::Round => self.start_round(head, dv, left_width, right_width, ncap),
            }
        }

        for i in s..e {
            let prev = self.points[p0];
            let point = self.points[p1];
            if point.flags.intersects(PointFlags::BEVEL | PointFlags::INNER) {
                if self.joint == Joint::Round {
                    self.join_round(
                        prev,
                        point,
                        left_width,
                        right_width,
                        ncap,
                        self.closed && i == s,
                    );
                } else {
                    self.join_bevel(prev, point, left_width, right_width, self.closed && i == s);
                }
            } else if self.closed && i == s {
                self.iback2 =
                    self.add_point(point.pos - point.miter * left_width, leftmark, 0.0);
                self.iback1 =
                    self.add_point(point.pos + point.miter * right_width, rightmark, 0.0);
                self.add_left(self.iback2);
                self.add_right(self.iback1);
            } else {
                let ind = self.add_point(point.pos - point.miter * left_width, leftmark, 0.0);
                self.add_left(ind);
                self.tri_left(ind);
                let ind = self.add_point(point.pos + point.miter * right_width, rightmark, 0.0);
                self.add_right(ind);
                self.tri_right(ind);
            }
            p0 = (p0 + 1) % n;
            p1 = (p1 + 1) % n;
        }

        if self.closed {
            // Close the strip against the first two vertices.
            self.add_left(0);
            self.tri_left(0);
            self.add_right(1);
            self.tri_right(1);
        } else {
            let tail = self.points[e];
            let prev = self.points[e - 1];
            let mut dv = tail.pos - prev.pos;
            let mag = dv.length();
            if mag > EPSILON {
                dv /= mag;
            }
            match self.cap {
                EndCap::Butt => self.end_butt(tail, dv, left_width, right_width),
                EndCap::Square => self.end_square(tail, dv, left_width, right_width, width),
                EndCap::Round => self.end_round(tail, dv, left_width, right_width, ncap),
            }
        }

        self.calculated = true;
        tracing::trace!(
            vertices = self.verts.len(),
            triangles = self.indices.len() / 3,
            "extrusion complete"
        );
    }

    /// The stroke polygon.
    ///
    /// Empty until [`calculate`](Self::calculate) has been run. The extruder
    /// keeps no reference to the returned polygon; it is safe to modify.
    pub fn polygon(&self) -> Polygon {
        if self.calculated {
            Polygon::from_parts(self.verts.clone(), self.indices.clone())
        } else {
            Polygon::new()
        }
    }

    /// The border(s) of the extrusion as closed paths.
    ///
    /// For a closed input the right and left sides form two separate loops
    /// (in that order). For an open input the two sides are concatenated
    /// into a single loop. Counter-clockwise borders are exterior
    /// boundaries; clockwise ones are potential holes.
    ///
    /// Empty until [`calculate`](Self::calculate) has been run.
    pub fn border(&self) -> Vec<Path> {
        if !self.calculated {
            return Vec::new();
        }
        let mut result = Vec::new();
        if self.closed {
            let mut right = Path::new();
            right.vertices = self.rights.clone();
            right.closed = true;
            result.push(right);
            let mut left = Path::new();
            left.vertices = self.lefts.clone();
            left.closed = true;
            result.push(left);
        } else {
            let mut ring = Path::new();
            ring.vertices.reserve(self.rights.len() + self.lefts.len());
            ring.vertices.extend_from_slice(&self.rights);
            ring.vertices.extend_from_slice(&self.lefts);
            ring.closed = true;
            result.push(ring);
        }
        result
    }

    /// The side annotations of the emitted vertices, parallel to the stroke
    /// polygon's vertex buffer.
    ///
    /// The first component marks the side: −1 on the left border, +1 on the
    /// right, 0 on the path itself. The second tracks cap progress for an
    /// open path: −1 on the head cap, +1 on the tail cap, 0 along the body.
    /// Rounded joints and caps interpolate between these extremes, tracking
    /// the traversal from one side to the other, which is what dash and
    /// gradient shaders key on.
    pub fn sides(&self) -> &[Vec2] {
        &self.sides
    }

    /// The side annotation of one emitted vertex.
    pub fn side(&self, index: usize) -> Option<Vec2> {
        self.sides.get(index).copied()
    }

    /// Build the annotated point array from raw vertices.
    ///
    /// The direction of the last point wraps around to the first; for an
    /// open path it is simply never used.
    fn ingest(&mut self, points: &[Vec2], corner: impl Fn(usize) -> bool) {
        let n = points.len();
        self.points.reserve(n);
        for i in 0..n {
            let pos = points[i];
            let mut dir = points[(i + 1) % n] - pos;
            let len = dir.length();
            if len > EPSILON {
                dir /= len;
            }
            self.points.push(PathPoint {
                pos,
                dir,
                len,
                miter: Vec2::ZERO,
                flags: if corner(i) {
                    PointFlags::CORNER
                } else {
                    PointFlags::empty()
                },
            });
        }
    }

    /// Annotate every point and return the number of beveled joints.
    ///
    /// Computes the miter vector (the bisector of the adjacent normals,
    /// scaled by the inverse square of its length, capped near 180-degree
    /// turns), classifies the turn direction, and flags points needing a
    /// bevel or an inner join. Also records whether the path is convex.
    fn analyze(&mut self, width: f32) -> usize {
        let iwidth = if width > 0.0 { 1.0 / width } else { 0.0 };
        let mut nleft = 0;
        let mut nbevel = 0;
        let n = self.points.len();

        for i in 0..n {
            let v0 = self.points[(i + n - 1) % n];
            let v1 = self.points[i];
            let dl0 = left_normal(v0.dir);
            let dl1 = left_normal(v1.dir);

            let mut miter = (dl0 + dl1) * 0.5;
            let dmr2 = miter.length_squared();
            if dmr2 > EPSILON {
                let scale = (1.0 / dmr2).min(SCALE_LIMIT);
                miter *= scale;
            }

            // Clear the analysis flags but keep the corner.
            let mut flags = v1.flags & PointFlags::CORNER;

            let cross = v1.dir.x * v0.dir.y - v0.dir.x * v1.dir.y;
            if cross < 0.0 {
                nleft += 1;
                flags |= PointFlags::LEFT;
            }

            // Use the segment normals when the stroke is wider than the
            // shorter adjacent segment.
            let limit = (v0.len.min(v1.len) * iwidth).max(1.01);
            if dmr2 * limit * limit < 1.0 {
                flags |= PointFlags::INNER;
            }

            if flags.contains(PointFlags::CORNER)
                && (dmr2 * self.mitre_limit * self.mitre_limit < 1.0
                    || self.joint == Joint::Square
                    || self.joint == Joint::Round)
            {
                flags |= PointFlags::BEVEL;
            }

            if flags.intersects(PointFlags::BEVEL | PointFlags::INNER) {
                nbevel += 1;
            }

            self.points[i].miter = miter;
            self.points[i].flags = flags;
        }

        self.convex = nleft == n;
        nbevel
    }

    /// The pair of bevel vertices on one side of the joint at `p1`.
    ///
    /// An inner join offsets along the two segment normals; otherwise both
    /// vertices collapse onto the miter point.
    fn choose_bevel(inner: bool, p0: PathPoint, p1: PathPoint, w: f32) -> (Vec2, Vec2) {
        if inner {
            (
                p1.pos + left_normal(p0.dir) * w,
                p1.pos + left_normal(p1.dir) * w,
            )
        } else {
            (p1.pos + p1.miter * w, p1.pos + p1.miter * w)
        }
    }

    /// Produce a round joint at `p1`.
    fn join_round(
        &mut self,
        p0: PathPoint,
        p1: PathPoint,
        lw: f32,
        rw: f32,
        ncap: usize,
        start: bool,
    ) {
        let dl0 = left_normal(p0.dir);
        let dl1 = left_normal(p1.dir);
        let leftmark = if lw > 0.0 { LEFT_MK } else { 0.0 };
        let rightmark = if rw > 0.0 { RIGHT_MK } else { 0.0 };
        let inner = p1.flags.contains(PointFlags::INNER);

        if p1.flags.contains(PointFlags::LEFT) {
            // Left turn: the arc sweeps the right side.
            let (l0, l1) = Self::choose_bevel(inner, p0, p1, -lw);
            let a0 = dl0.y.atan2(dl0.x);
            let mut a1 = dl1.y.atan2(dl1.x);
            if a1 < a0 {
                a1 += 2.0 * PI;
            }

            if start {
                self.iback2 = self.add_point(l0, leftmark, 0.0);
                self.add_left(self.iback2);
                self.iback1 = self.add_point(p1.pos + dl0 * rw, rightmark, 0.0);
                self.add_right(self.iback1);
            } else {
                let ind = self.add_point(l0, leftmark, 0.0);
                self.add_left(ind);
                self.tri_left(ind);
                let ind = self.add_point(p1.pos + dl0 * rw, rightmark, 0.0);
                self.add_right(ind);
                self.tri_right(ind);
            }

            let segs = (((a1 - a0) / PI * ncap as f32).ceil() as usize).clamp(2, ncap);
            let center = self.add_point(p1.pos, 0.0, 0.0);
            self.tri_left(center);
            for i in 0..segs {
                let u = i as f32 / (segs - 1) as f32;
                let a = a0 + u * (a1 - a0);
                let arc = p1.pos + Vec2::new(a.cos(), a.sin()) * rw;
                let ind = self.add_point(arc, rightmark, 0.0);
                self.add_right(ind);
                self.tri_right(ind);
                self.iback2 = ind;
                self.iback1 = center;
            }

            self.iback1 = self.iback2;
            self.iback2 = center;
            let ind = self.add_point(l1, leftmark, 0.0);
            self.add_left(ind);
            self.tri_left(ind);
            let ind = self.add_point(p1.pos + dl1 * rw, rightmark, 0.0);
            self.add_right(ind);
            self.tri_right(ind);
        } else {
            // Right turn: the arc sweeps the left side.
            let (r0, r1) = Self::choose_bevel(inner, p0, p1, rw);
            let a0 = (-dl0.y).atan2(-dl0.x);
            let mut a1 = (-dl1.y).atan2(-dl1.x);
            if a1 > a0 {
                a1 -= 2.0 * PI;
            }

            if start {
                self.iback1 = self.add_point(p1.pos - dl0 * lw, leftmark, 0.0);
                self.iback2 = self.add_point(r0, rightmark, 0.0);
            } else {
                let ind = self.add_point(p1.pos - dl0 * lw, leftmark, 0.0);
                self.add_left(ind);
                self.tri_left(ind);
                let ind = self.add_point(r0, rightmark, 0.0);
                self.add_right(ind);
                self.tri_right(ind);

                let arc = p1.pos + Vec2::new(a0.cos(), a0.sin()) * lw;
                let ind = self.add_point(arc, leftmark, 0.0);
                self.add_left(ind);
                self.tri_left(ind);
            }

            let segs = (((a0 - a1) / PI * ncap as f32).ceil() as usize).clamp(2, ncap);
            let center = self.add_point(p1.pos, 0.0, 0.0);
            self.tri_right(center);
            for i in 0..segs {
                let u = i as f32 / (segs - 1) as f32;
                let a = a0 + u * (a1 - a0);
                let arc = p1.pos + Vec2::new(a.cos(), a.sin()) * lw;
                let ind = self.add_point(arc, leftmark, 0.0);
                self.iback1 = center;
                self.add_left(ind);
                self.tri_left(ind);
                self.iback2 = ind;
            }

            self.iback1 = center;
            let ind = self.add_point(p1.pos - dl1 * lw, leftmark, 0.0);
            self.add_left(ind);
            self.tri_left(ind);
            let ind = self.add_point(r1, rightmark, 0.0);
            self.add_right(ind);
            self.tri_right(ind);
        }
    }

    /// Produce a bevel (or inner mitre) joint at `p1`.
    fn join_bevel(&mut self, p0: PathPoint, p1: PathPoint, lw: f32, rw: f32, start: bool) {
        let dl0 = left_normal(p0.dir);
        let dl1 = left_normal(p1.dir);
        let leftmark = if lw > 0.0 { LEFT_MK } else { 0.0 };
        let rightmark = if rw > 0.0 { RIGHT_MK } else { 0.0 };
        let inner = p1.flags.contains(PointFlags::INNER);

        if p1.flags.contains(PointFlags::LEFT) {
            // Left turn: chamfer the right side.
            let (l0, l1) = Self::choose_bevel(inner, p0, p1, -lw);

            if start {
                self.iback2 = self.add_point(l0, leftmark, 0.0);
                self.iback1 = self.add_point(p1.pos + dl0 * rw, rightmark, 0.0);
            } else {
                let ind = self.add_point(l0, leftmark, 0.0);
                self.add_left(ind);
                self.tri_left(ind);
                let ind = self.add_point(p1.pos + dl0 * rw, rightmark, 0.0);
                self.add_right(ind);
                self.tri_right(ind);
            }

            if p1.flags.contains(PointFlags::BEVEL) {
                let ind = self.add_point(l1, leftmark, 0.0);
                self.tri_left(ind);
                let ind = self.add_point(p1.pos + dl1 * rw, rightmark, 0.0);
                self.tri_right(ind);
            } else {
                // Inner mitre: stitch through the path point itself.
                let r0 = p1.pos + p1.miter * rw;

                let ind = self.add_point(p1.pos, 0.0, 0.0);
                self.tri_left(ind);
                let ind = self.add_point(p1.pos + dl0 * rw, rightmark, 0.0);
                self.add_right(ind);
                self.tri_right(ind);

                let ind = self.add_point(r0, rightmark, 0.0);
                self.add_right(ind);
                self.tri_left(ind);

                self.iback2 = ind;
                self.iback1 = self.add_point(p1.pos, 0.0, 0.0);
                let ind = self.add_point(p1.pos + dl1 * rw, rightmark, 0.0);
                self.add_right(ind);
                self.tri_right(ind);
            }

            let ind = self.add_point(l1, leftmark, 0.0);
            self.add_left(ind);
            self.tri_left(ind);
            let ind = self.add_point(p1.pos + dl1 * rw, rightmark, 0.0);
            self.add_right(ind);
            self.tri_right(ind);
        } else {
            // Right turn: chamfer the left side.
            let (r0, r1) = Self::choose_bevel(inner, p0, p1, rw);

            if start {
                self.iback2 = self.add_point(p1.pos - dl0 * lw, leftmark, 0.0);
                self.iback1 = self.add_point(r0, rightmark, 0.0);
            } else {
                let ind = self.add_point(p1.pos - dl0 * lw, leftmark, 0.0);
                self.add_left(ind);
                self.tri_left(ind);
                let ind = self.add_point(r0, rightmark, 0.0);
                self.add_right(ind);
                self.tri_right(ind);
            }

            if p1.flags.contains(PointFlags::BEVEL) {
                let ind = self.add_point(p1.pos - dl1 * lw, leftmark, 0.0);
                self.add_left(ind);
                self.tri_left(ind);
                let ind = self.add_point(r1, rightmark, 0.0);
                self.add_right(ind);
                self.tri_right(ind);
            } else {
                // Inner mitre: stitch through the path point itself.
                let l0 = p1.pos - p1.miter * lw;

                let ind = self.add_point(p1.pos - dl0 * lw, leftmark, 0.0);
                self.add_left(ind);
                self.tri_left(ind);
                let ind = self.add_point(p1.pos, 0.0, 0.0);
                self.tri_right(ind);

                let ind = self.add_point(l0, leftmark, 0.0);
                self.add_left(ind);
                self.tri_left(ind);

                self.iback2 = ind;
                self.iback1 = self.add_point(p1.pos - dl1 * lw, leftmark, 0.0);
                let ind = self.add_point(p1.pos, 0.0, 0.0);
                self.add_left(self.iback1);
                self.tri_right(ind);
            }

            let ind = self.add_point(p1.pos - dl1 * lw, leftmark, 0.0);
            self.add_left(ind);
            self.tri_left(ind);
            let ind = self.add_point(r1, rightmark, 0.0);
            self.add_right(ind);
            self.tri_right(ind);
        }
    }

    /// Produce a butt (flat, unextended) cap at the head of the path.
    fn start_butt(&mut self, p: PathPoint, dir: Vec2, lw: f32, rw: f32) {
        let dl = left_normal(dir);
        self.iback2 = self.add_point(
            p.pos - dl * lw,
            if lw > 0.0 { LEFT_MK } else { 0.0 },
            0.0,
        );
        self.add_left(self.iback2);
        self.iback1 = self.add_point(
            p.pos + dl * rw,
            if rw > 0.0 { RIGHT_MK } else { 0.0 },
            0.0,
        );
        self.add_right(self.iback1);
    }

    /// Produce a butt (flat, unextended) cap at the tail of the path.
    fn end_butt(&mut self, p: PathPoint, dir: Vec2, lw: f32, rw: f32) {
        let dl = left_normal(dir);
        let ind = self.add_point(
            p.pos - dl * lw,
            if lw > 0.0 { LEFT_MK } else { 0.0 },
            0.0,
        );
        self.add_left(ind);
        self.tri_left(ind);
        let ind = self.add_point(
            p.pos + dl * rw,
            if rw > 0.0 { RIGHT_MK } else { 0.0 },
            0.0,
        );
        self.add_right(ind);
        self.tri_right(ind);
    }

    /// Produce a square cap at the head, extending the path by `d`.
    fn start_square(&mut self, p: PathPoint, dir: Vec2, lw: f32, rw: f32, d: f32) {
        let dl = left_normal(dir);
        let leftmark = if lw > 0.0 { LEFT_MK } else { 0.0 };
        let rightmark = if rw > 0.0 { RIGHT_MK } else { 0.0 };

        let px = p.pos - dir * d;
        self.iback2 = self.add_point(px - dl * lw, leftmark, HEAD_MK);
        self.add_left(self.iback2);
        self.iback1 = self.add_point(px + dl * rw, rightmark, HEAD_MK);
        self.add_right(self.iback1);

        let ind = self.add_point(p.pos - dl * lw, leftmark, 0.0);
        self.add_left(ind);
        self.tri_left(ind);
        let ind = self.add_point(p.pos + dl * rw, rightmark, 0.0);
        self.add_right(ind);
        self.tri_right(ind);
    }

    /// Produce a square cap at the tail, extending the path by `d`.
    fn end_square(&mut self, p: PathPoint, dir: Vec2, lw: f32, rw: f32, d: f32) {
        let dl = left_normal(dir);
        let leftmark = if lw > 0.0 { LEFT_MK } else { 0.0 };
        let rightmark = if rw > 0.0 { RIGHT_MK } else { 0.0 };

        let ind = self.add_point(p.pos - dl * lw, leftmark, 0.0);
        self.tri_left(ind);
        let ind = self.add_point(p.pos + dl * rw, rightmark, 0.0);
        self.tri_right(ind);

        let px = p.pos + dir * d;
        let ind = self.add_point(px - dl * lw, leftmark, TAIL_MK);
        self.add_left(ind);
        self.tri_left(ind);
        let ind = self.add_point(px + dl * rw, rightmark, TAIL_MK);
        self.add_right(ind);
        self.tri_right(ind);
    }

    /// Produce a semicircular cap of `ncap` segments at the head.
    fn start_round(&mut self, p: PathPoint, dir: Vec2, lw: f32, rw: f32, ncap: usize) {
        let dl = left_normal(dir);
        let w = (lw + rw) / 2.0;
        // Asymmetric widths shift the cap center off the path point.
        let px = p.pos + (dl * rw - dl * lw) / 2.0;
        let leftmark = if lw > 0.0 { LEFT_MK } else { 0.0 };
        let rightmark = if rw > 0.0 { RIGHT_MK } else { 0.0 };

        let center = self.add_point(px, 0.0, 0.0);
        let first = self.add_point(px - dl * w, leftmark, 0.0);
        self.iback1 = center;
        self.iback2 = first;
        self.add_left(first);

        let mut ind = first;
        for i in 0..ncap {
            let a = i as f32 * PI / (ncap - 1) as f32;
            let cx = a.cos();
            let ax = cx * w;
            let ay = a.sin() * w;
            ind = self.add_point(
                px - dl * ax - dir * ay,
                leftmark * (1.0 + cx) / 2.0 + rightmark * (1.0 - cx) / 2.0,
                HEAD_MK * ay / w,
            );
            self.add_right(ind);
            self.tri_right(ind);
            self.iback2 = self.iback1;
            self.iback1 = center;
        }

        self.iback1 = ind;
        self.iback2 = first;
    }

    /// Produce a semicircular cap of `ncap` segments at the tail.
    fn end_round(&mut self, p: PathPoint, dir: Vec2, lw: f32, rw: f32, ncap: usize) {
        let dl = left_normal(dir);
        let w = (lw + rw) / 2.0;
        let px = p.pos + (dl * rw - dl * lw) / 2.0;
        let leftmark = if lw > 0.0 { LEFT_MK } else { 0.0 };
        let rightmark = if rw > 0.0 { RIGHT_MK } else { 0.0 };

        let first = self.add_point(px - dl * w, leftmark, 0.0);
        let last = self.add_point(px + dl * w, rightmark, 0.0);
        self.add_left(first);
        self.tri_left(first);
        self.add_right(last);
        self.tri_right(last);

        let center = self.add_point(px, 0.0, 0.0);
        self.iback1 = center;

        for i in 1..ncap.saturating_sub(1) {
            let a = i as f32 * PI / (ncap - 1) as f32;
            let cx = a.cos();
            let ax = cx * w;
            let ay = a.sin() * w;
            let ind = self.add_point(
                px - dl * ax + dir * ay,
                leftmark * (1.0 + cx) / 2.0 + rightmark * (1.0 - cx) / 2.0,
                TAIL_MK * ay / w,
            );
            self.add_left(ind);
            self.tri_left(ind);
            self.iback2 = self.iback1;
            self.iback1 = center;
        }

        self.tri_left(last);
        self.iback1 = center;
    }

    /// Append an annotated vertex and return its index.
    fn add_point(&mut self, pos: Vec2, u: f32, v: f32) -> usize {
        self.verts.push(pos);
        self.sides.push(Vec2::new(u, v));
        self.verts.len() - 1
    }

    /// Record a vertex on the left border.
    fn add_left(&mut self, index: usize) {
        self.lefts.push(self.verts[index]);
    }

    /// Record a vertex on the right border.
    fn add_right(&mut self, index: usize) {
        self.rights.push(self.verts[index]);
    }

    /// Close a counter-clockwise triangle on the left side of the strip.
    ///
    /// The triangle spans the two trailing indices and `index`, which then
    /// replaces the older trailing index. Colinear triangles are skipped.
    fn tri_left(&mut self, index: usize) {
        if self.valid_tri(index) {
            self.indices.extend([
                self.iback2 as u16,
                self.iback1 as u16,
                index as u16,
            ]);
        }
        self.iback2 = self.iback1;
        self.iback1 = index;
    }

    /// Close a counter-clockwise triangle on the right side of the strip.
    ///
    /// Mirrors [`tri_left`](Self::tri_left) with the trailing indices in
    /// reverse order, keeping the winding consistent across sides.
    fn tri_right(&mut self, index: usize) {
        if self.valid_tri(index) {
            self.indices.extend([
                self.iback1 as u16,
                self.iback2 as u16,
                index as u16,
            ]);
        }
        self.iback2 = self.iback1;
        self.iback1 = index;
    }

    /// Check that the trailing indices and `index` form a triangle with
    /// nonzero signed area.
    fn valid_tri(&self, index: usize) -> bool {
        let p = self.verts[self.iback1];
        let q = self.verts[self.iback2];
        let r = self.verts[index];
        p.x * (q.y - r.y) + q.x * (r.y - p.y) + r.x * (p.y - q.y) != 0.0
    }
}

/// The left-hand normal of a unit direction.
fn left_normal(dir: Vec2) -> Vec2 {
    Vec2::new(dir.y, -dir.x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polyform_core::geometry::Rect;

    fn signed_area(poly: &Polygon, tri: usize) -> f32 {
        let a = poly.vertices[poly.indices[3 * tri] as usize];
        let b = poly.vertices[poly.indices[3 * tri + 1] as usize];
        let c = poly.vertices[poly.indices[3 * tri + 2] as usize];
        (b - a).perp_dot(c - a) * 0.5
    }

    #[test]
    fn test_materialize_before_calculate_is_empty() {
        let extruder = PathExtruder::from_path(&Path::from_rect(Rect::new(0.0, 0.0, 1.0, 1.0)));
        assert!(extruder.polygon().is_empty());
        assert!(extruder.border().is_empty());
        assert!(extruder.sides().is_empty());
    }

    #[test]
    fn test_single_segment_butt() {
        let mut extruder = PathExtruder::new();
        extruder.set_points(&[Vec2::ZERO, Vec2::new(10.0, 0.0)], false);
        extruder.calculate(2.0);
        let poly = extruder.polygon();
        // A plain quad strip: four vertices, two triangles.
        assert_eq!(poly.vertex_count(), 4);
        assert_eq!(poly.triangle_count(), 2);
        let (min, max) = poly.bounds().unwrap();
        assert_eq!(min, Vec2::new(0.0, -1.0));
        assert_eq!(max, Vec2::new(10.0, 1.0));
    }

    #[test]
    fn test_single_segment_square_cap_extends() {
        let mut extruder = PathExtruder::new().with_end_cap(EndCap::Square);
        extruder.set_points(&[Vec2::ZERO, Vec2::new(10.0, 0.0)], false);
        extruder.calculate(2.0);
        let (min, max) = extruder.polygon().bounds().unwrap();
        // Padded by the full stroke width on each end.
        assert_eq!(min, Vec2::new(-2.0, -1.0));
        assert_eq!(max, Vec2::new(12.0, 1.0));
    }

    #[test]
    fn test_all_triangles_ccw() {
        let mut extruder = PathExtruder::new();
        extruder.set(&Path::from_rect(Rect::new(0.0, 0.0, 4.0, 2.0)));
        extruder.calculate(1.0);
        let poly = extruder.polygon();
        assert!(!poly.is_empty());
        for tri in 0..poly.triangle_count() {
            assert!(signed_area(&poly, tri) > 0.0, "triangle {} not ccw", tri);
        }
    }

    #[test]
    fn test_side_marks() {
        let mut extruder = PathExtruder::new();
        extruder.set_points(&[Vec2::ZERO, Vec2::new(10.0, 0.0)], false);
        extruder.calculate(2.0);
        let sides = extruder.sides();
        assert_eq!(sides.len(), extruder.polygon().vertex_count());
        assert!(sides.iter().any(|s| s.x == -1.0));
        assert!(sides.iter().any(|s| s.x == 1.0));
        // Butt caps stay in the stroke body.
        assert!(sides.iter().all(|s| s.y == 0.0));
    }

    #[test]
    fn test_uneven_extrusion_single_side() {
        let mut extruder = PathExtruder::new();
        extruder.set_points(&[Vec2::ZERO, Vec2::new(10.0, 0.0)], false);
        extruder.calculate_uneven(2.0, 0.0);
        let (min, max) = extruder.polygon().bounds().unwrap();
        // Only the left side of the travel direction (+y here) is extruded.
        assert_eq!(min, Vec2::new(0.0, 0.0));
        assert_eq!(max, Vec2::new(10.0, 2.0));
        // Vertices on the path itself are marked 0.
        assert!(extruder.sides().iter().any(|s| s.x == 0.0));
    }

    #[test]
    fn test_recalculate_needs_reset() {
        let mut extruder = PathExtruder::new();
        extruder.set_points(&[Vec2::ZERO, Vec2::new(10.0, 0.0)], false);
        extruder.calculate(2.0);
        let before = extruder.polygon();
        // A second calculate without reset is a no-op.
        extruder.calculate(4.0);
        assert_eq!(extruder.polygon(), before);
        extruder.reset();
        extruder.calculate(4.0);
        assert!(extruder.polygon().bounds().unwrap().1.y > before.bounds().unwrap().1.y);
    }

    #[test]
    fn test_closed_borders_are_two_loops() {
        let mut extruder = PathExtruder::new();
        extruder.set(&Path::from_rect(Rect::new(0.0, 0.0, 4.0, 2.0)));
        extruder.calculate(1.0);
        let borders = extruder.border();
        assert_eq!(borders.len(), 2);
        assert!(borders.iter().all(|b| b.closed));
    }

    #[test]
    fn test_open_border_is_one_loop() {
        let mut extruder = PathExtruder::new();
        extruder.set_points(&[Vec2::ZERO, Vec2::new(10.0, 0.0), Vec2::new(10.0, 10.0)], false);
        extruder.calculate(2.0);
        let borders = extruder.border();
        assert_eq!(borders.len(), 1);
        assert!(borders[0].closed);
    }
}
