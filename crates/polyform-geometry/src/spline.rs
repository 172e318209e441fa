//! A spline of cubic beziers.
//!
//! A bezier spline is a sequence of cubic beziers where the end anchor of one
//! segment is the start anchor of the next. The spline entity is purposefully
//! kept lightweight: it has no drawing functionality. To render one, flatten
//! it to a [`Path`](crate::Path) with a
//! [`SplineFlattener`](crate::SplineFlattener) and then extrude or wireframe
//! the result like any other path.

use glam::Vec2;

use crate::error::{GeometryError, GeometryResult};

/// Maximum recursion depth for de Casteljau subdivision.
const MAX_DEPTH: u32 = 8;
/// Squared-direction tolerance to identify an anchor as smooth.
const SMOOTH_TOLERANCE: f32 = 1.0e-4;

/// A sequence of cubic bezier segments sharing anchors.
///
/// A single cubic bezier is four control points: the anchors `P1`, `P2` and
/// their tangents `T1`, `T2`. Tangents are stored as points, not vectors, so
/// the tangent vector of an anchor is `T - P`; a segment whose tangents
/// coincide with its anchors is a straight line.
///
/// Consecutive segments share an anchor, so a spline of `n` segments stores
/// `3n + 1` control points in the order
///
/// ```text
/// anchor, tangent, tangent, anchor, tangent, tangent, anchor, ...
/// ```
///
/// Each anchor carries a `smooth` flag: a smooth anchor keeps its left and
/// right tangents parallel, so the derivative is continuous there. Only a
/// non-smooth anchor can form a hinge. In a closed spline the first and last
/// anchors coincide, so anchors have no notion of "the end" and nothing can
/// be appended; anchors may only be inserted between existing ones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Spline {
    /// The control points: `3 * segments + 1` entries when non-degenerate.
    points: Vec<Vec2>,
    /// Per-anchor smoothness flags (`segments + 1` entries).
    smooth: Vec<bool>,
    /// Whether the first and last anchor coincide.
    closed: bool,
    /// The number of bezier segments.
    size: usize,
}

impl Spline {
    /// Create a degenerate spline of a single anchor and no segments.
    ///
    /// Useful as the seed when building a spline incrementally.
    pub fn new(point: Vec2) -> Self {
        Spline {
            points: vec![point],
            smooth: vec![false],
            closed: false,
            size: 0,
        }
    }

    /// Create a single-segment spline forming a line between two points.
    ///
    /// Both tangents are degenerate (equal to their anchors), which makes the
    /// bezier a straight line. The spline is closed only when `start == end`.
    pub fn line(start: Vec2, end: Vec2) -> Self {
        Spline {
            points: vec![start, start, end, end],
            smooth: vec![false, false],
            closed: start == end,
            size: 1,
        }
    }

    /// Create an open spline from a raw control-point sequence.
    ///
    /// The points must follow the `anchor, tangent, tangent, anchor, ...`
    /// layout, i.e. the count must be of the form `3n + 1`. Interior anchors
    /// whose tangents are already parallel are detected as smooth.
    pub fn from_control_points(points: Vec<Vec2>) -> GeometryResult<Self> {
        if points.is_empty() || points.len() % 3 != 1 {
            return Err(GeometryError::MalformedControlPoints {
                count: points.len(),
            });
        }
        let size = (points.len() - 1) / 3;
        let mut spline = Spline {
            points,
            smooth: vec![false; size + 1],
            closed: false,
            size,
        };
        for i in 1..size {
            spline.smooth[i] = spline.check_smooth(i);
        }
        Ok(spline)
    }

    /// The number of bezier segments in this spline.
    pub fn segments(&self) -> usize {
        self.size
    }

    /// Check if the spline is closed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// The raw control points, `3n + 1` for `n` segments.
    pub fn control_points(&self) -> &[Vec2] {
        &self.points
    }

    /// Open or close the spline.
    ///
    /// Closing a spline whose ends do not already coincide appends a closing
    /// segment (with degenerate tangents) back to the first anchor; the
    /// closing anchor is not smooth unless changed with
    /// [`set_smooth`](Self::set_smooth). Opening a closed spline deletes the
    /// shared end anchor.
    pub fn set_closed(&mut self, flag: bool) -> GeometryResult<()> {
        if self.points.is_empty() {
            return Ok(());
        }
        if flag && !self.closed {
            if self.points[0] != self.points[self.points.len() - 1] {
                self.add_anchor(self.points[0])?;
            }
        } else if !flag && self.closed {
            self.closed = false;
            self.delete_anchor(self.size)?;
        }
        self.closed = flag;
        Ok(())
    }

    /// Evaluate the spline at parameter `t`.
    ///
    /// Each segment is parameterized over a unit interval: `t` is an anchor
    /// when it is an integer, and lies within segment `floor(t)` otherwise.
    /// Valid parameters run from `0` to the segment count.
    pub fn point_at(&self, t: f32) -> GeometryResult<Vec2> {
        if t < 0.0 || t > self.size as f32 {
            return Err(GeometryError::InvalidParameter { param: t });
        }
        if self.size == 0 {
            return match self.points.first() {
                Some(&p) => Ok(p),
                None => Err(GeometryError::InvalidParameter { param: t }),
            };
        }
        let mut segment = t.floor() as usize;
        let mut local = t - segment as f32;
        if segment == self.size {
            // The very end of the last segment.
            segment = self.size.saturating_sub(1);
            local = 1.0;
        }
        Ok(self.eval(segment, local))
    }

    /// The anchor point at the given index.
    pub fn anchor(&self, index: usize) -> GeometryResult<Vec2> {
        self.check_anchor(index)?;
        Ok(self.points[3 * index])
    }

    /// Move the anchor at the given index.
    ///
    /// Both of the anchor's tangents move rigidly with it, so the curve keeps
    /// its local shape (the behavior of dragging an anchor in a vector
    /// editor). An open spline of `n` segments has `n + 1` anchors; a closed
    /// one has `n` (the shared end anchor is addressed as index 0).
    pub fn set_anchor(&mut self, index: usize, point: Vec2) -> GeometryResult<()> {
        self.check_anchor(index)?;
        let delta = point - self.points[3 * index];

        // Left tangent (wrapping to the shared end for a closed spline).
        if index > 0 {
            self.points[3 * index - 1] += delta;
        } else if self.closed {
            self.points[3 * self.size - 1] += delta;
        }

        // Right tangent.
        if index < self.size {
            self.points[3 * index + 1] += delta;
        }

        self.points[3 * index] = point;
        if self.closed && index == 0 {
            // Keep the shared end anchor coincident.
            let last = 3 * self.size;
            self.points[last] = point;
        }
        Ok(())
    }

    /// Check if the anchor at the given index is smooth.
    pub fn is_smooth(&self, index: usize) -> GeometryResult<bool> {
        self.check_anchor(index)?;
        Ok(self.smooth[index])
    }

    /// Set the smoothness of the anchor at the given index.
    ///
    /// Turning smoothness on averages the two tangent directions, making
    /// them parallel while preserving their lengths. The end anchors of an
    /// open spline can never be smooth.
    pub fn set_smooth(&mut self, index: usize, flag: bool) -> GeometryResult<()> {
        self.check_anchor(index)?;
        if !self.closed && (index == 0 || index == self.size) {
            return Err(GeometryError::IndexOutOfBounds {
                index,
                len: self.size,
            });
        }

        self.smooth[index] = flag;
        if !flag {
            return Ok(());
        }

        // The left tangent lives before the anchor; for the shared anchor of
        // a closed spline that is the final tangent in the buffer.
        let lindex = if index == 0 { 3 * self.size } else { 3 * index };
        let anchor = self.points[3 * index];
        let mut left = self.points[lindex - 1] - anchor;
        let mut right = anchor - self.points[3 * index + 1];

        if left == Vec2::ZERO {
            left = right;
        } else if right == Vec2::ZERO {
            right = left;
        } else {
            let lscale = left.length();
            let rscale = right.length();
            let mean = (left.normalize() + right.normalize()) * 0.5;
            let mean = mean.normalize_or_zero();
            left = mean * lscale;
            right = mean * rscale;
        }

        self.points[lindex - 1] = anchor + left;
        self.points[3 * index + 1] = anchor - right;
        Ok(())
    }

    /// The tangent point at the given index.
    ///
    /// A spline of `n` segments has `2n` tangents, open or closed. Even
    /// indices are right tangents, odd indices left tangents; tangent
    /// `2n - 1` of a closed spline is the left tangent of the first anchor.
    pub fn tangent(&self, index: usize) -> GeometryResult<Vec2> {
        if index >= 2 * self.size {
            return Err(GeometryError::IndexOutOfBounds {
                index,
                len: 2 * self.size,
            });
        }
        Ok(self.points[Self::tangent_slot(index)])
    }

    /// Move the tangent point at the given index.
    ///
    /// If the owning anchor is smooth, the opposite tangent rotates to stay
    /// parallel (its length is preserved). With `symmetric`, the opposite
    /// tangent is mirrored outright, matching length and direction. These are
    /// the standard vector-editor behaviors.
    pub fn set_tangent(
        &mut self,
        index: usize,
        point: Vec2,
        symmetric: bool,
    ) -> GeometryResult<()> {
        if index >= 2 * self.size {
            return Err(GeometryError::IndexOutOfBounds {
                index,
                len: 2 * self.size,
            });
        }
        let owner = (index + 1) / 2;
        let anchor_slot = 3 * owner;
        let slot = Self::tangent_slot(index);

        // The opposite tangent of the owning anchor; the end anchors of an
        // open spline have only one tangent, and the shared anchor of a
        // closed spline wraps around the buffer.
        let mirror = if owner == 0 {
            self.closed.then_some(3 * self.size - 1)
        } else if owner == self.size {
            self.closed.then_some(1)
        } else if index % 2 == 1 {
            Some(anchor_slot + 1)
        } else {
            Some(anchor_slot - 1)
        };

        let anchor = self.points[anchor_slot];
        if let Some(mirror) = mirror {
            if symmetric {
                self.points[mirror] = anchor + (anchor - point);
            } else if self.smooth[owner] {
                let length = (anchor - self.points[mirror]).length();
                let direction = (anchor - point).normalize_or_zero();
                self.points[mirror] = anchor + direction * length;
            }
        }

        self.points[slot] = point;
        Ok(())
    }

    /// Append a new segment from the current end to `point`.
    ///
    /// The new anchor's left tangent is degenerate, making a hinge. Fails on
    /// closed splines, which have no end.
    pub fn add_anchor(&mut self, point: Vec2) -> GeometryResult<usize> {
        self.add_anchor_with_tangent(point, point)
    }

    /// Append a new segment from the current end to `point` with the given
    /// left tangent.
    ///
    /// The previous end keeps its smoothness: if smooth, its new right
    /// tangent mirrors its left tangent; otherwise it is degenerate. On a
    /// degenerate spline with no control points at all this just seeds the
    /// first anchor, keeping the segment count at zero. Fails on closed
    /// splines.
    pub fn add_anchor_with_tangent(&mut self, point: Vec2, tangent: Vec2) -> GeometryResult<usize> {
        if self.closed {
            return Err(GeometryError::ClosedSpline);
        }
        if self.points.is_empty() {
            *self = Spline::new(point);
            return Ok(0);
        }

        let end = self.points[self.points.len() - 1];
        let right = if self.smooth[self.size] {
            // Mirror the left tangent through the anchor.
            end * 2.0 - self.points[self.points.len() - 2]
        } else {
            end
        };
        self.points.extend([right, tangent, point]);
        self.smooth.push(false);
        self.size += 1;
        Ok(self.size)
    }

    /// Append a cubic bezier segment from the current end to `point`.
    ///
    /// `control1` becomes the right tangent of the previous end anchor (its
    /// smoothness is re-derived from the new tangent pair) and `control2`
    /// the left tangent of `point`. A spline with no control points builds
    /// the bezier from the origin. Fails on closed splines.
    pub fn add_bezier(
        &mut self,
        control1: Vec2,
        control2: Vec2,
        point: Vec2,
    ) -> GeometryResult<usize> {
        if self.closed {
            return Err(GeometryError::ClosedSpline);
        }
        if self.points.is_empty() {
            *self = Spline::new(Vec2::ZERO);
        }

        self.points.extend([control1, control2, point]);
        self.smooth.push(false);
        self.size += 1;
        let joint = self.size - 1;
        if joint > 0 {
            self.smooth[joint] = self.check_smooth(joint);
        }
        Ok(self.size)
    }

    /// Append a quadratic bezier segment from the current end to `point`.
    ///
    /// The quadratic control point is elevated to the cubic tangent pair
    /// with the standard 2/3 rule. Fails on closed splines.
    pub fn add_quad(&mut self, control: Vec2, point: Vec2) -> GeometryResult<usize> {
        let start = self.points.last().copied().unwrap_or(Vec2::ZERO);
        let control1 = start + (control - start) * (2.0 / 3.0);
        let control2 = point + (control - point) * (2.0 / 3.0);
        self.add_bezier(control1, control2, point)
    }

    /// Delete the anchor at the given index together with its tangents.
    ///
    /// The two segments meeting at the anchor merge into one; remaining
    /// anchors shift down. Deleting from a closed spline keeps it closed.
    pub fn delete_anchor(&mut self, index: usize) -> GeometryResult<()> {
        self.check_anchor(index)?;
        if self.size == 0 {
            return Err(GeometryError::IndexOutOfBounds { index, len: 0 });
        }

        if index == 0 {
            self.points.drain(0..3);
            if self.closed {
                // The shared end anchor must follow the new first anchor.
                let first = self.points[0];
                let last = self.points.len() - 1;
                self.points[last] = first;
            }
        } else if index == self.size {
            self.points.truncate(self.points.len() - 3);
        } else {
            self.points.drain(3 * index - 1..3 * index + 2);
        }
        self.smooth.remove(index);
        self.size -= 1;
        Ok(())
    }

    /// Insert a new anchor at parameter `t` without changing the curve.
    ///
    /// The containing segment is split with de Casteljau subdivision, so the
    /// existing point at that parameter simply becomes an anchor (with
    /// parallel tangents, hence smooth). This changes the parameterization
    /// of everything after the split, as the segment count grows by one.
    pub fn insert_anchor(&mut self, t: f32) -> GeometryResult<()> {
        let segment = t.floor() as usize;
        self.insert_anchor_at(segment, t - segment as f32)
    }

    /// Insert a new anchor inside `segment` at local parameter `param`.
    pub fn insert_anchor_at(&mut self, segment: usize, param: f32) -> GeometryResult<()> {
        if segment >= self.size {
            return Err(GeometryError::IndexOutOfBounds {
                index: segment,
                len: self.size,
            });
        }
        if param <= 0.0 || param >= 1.0 {
            return Err(GeometryError::InvalidParameter { param });
        }

        let (left, right) = self.subdivide(segment, param);
        let base = 3 * segment;
        self.points[base..base + 3].copy_from_slice(&left[0..3]);
        // left[3] == right[0] is the new anchor.
        let _ = self.points.splice(base + 3..base + 3, right[0..3].iter().copied());
        self.smooth.insert(segment + 1, true);
        self.size += 1;
        Ok(())
    }

    /// The point on the spline nearest to `point`.
    ///
    /// Effectively the projection of the point onto the curve; the result
    /// need not be an anchor. This supports selecting an arbitrary curve
    /// location with a pointer in an editor.
    pub fn nearest_point(&self, point: Vec2) -> Option<Vec2> {
        self.point_at(self.nearest_parameter(point)?).ok()
    }

    /// The parameter of the point on the spline nearest to `point`.
    ///
    /// Walks each segment at a fixed resolution, so the answer is
    /// approximate to `1 / 2^8` of a segment.
    pub fn nearest_parameter(&self, point: Vec2) -> Option<f32> {
        if self.size == 0 {
            return None;
        }
        let mut best: Option<(f32, f32)> = None;
        for segment in 0..self.size {
            let (t, d) = self.project_slow(point, segment);
            if best.is_none_or(|(_, bd)| d < bd) {
                best = Some((segment as f32 + t, d));
            }
        }
        best.map(|(t, _)| t)
    }

    /// The index of the anchor nearest to `point`, if any lies within the
    /// given squared-distance threshold.
    pub fn nearest_anchor(&self, point: Vec2, threshold: f32) -> Option<usize> {
        let mut best = f32::MAX;
        let mut found = None;
        for i in 0..=self.size {
            let d = self.points[3 * i].distance_squared(point);
            if d < threshold && d < best {
                best = d;
                found = Some(i);
            }
        }
        found
    }

    /// The index of the tangent nearest to `point`, if any lies within the
    /// given squared-distance threshold.
    ///
    /// The returned index follows the [`tangent`](Self::tangent) numbering.
    pub fn nearest_tangent(&self, point: Vec2, threshold: f32) -> Option<usize> {
        let mut best = f32::MAX;
        let mut found = None;
        for i in 0..self.size {
            let right = self.points[3 * i + 1].distance_squared(point);
            if right < threshold && right < best {
                best = right;
                found = Some(2 * i);
            }
            let left = self.points[3 * i + 2].distance_squared(point);
            if left < threshold && left < best {
                best = left;
                found = Some(2 * i + 1);
            }
        }
        found
    }

    /// Remove all control points, producing a degenerate spline.
    pub fn clear(&mut self) {
        self.points.clear();
        self.smooth.clear();
        self.closed = false;
        self.size = 0;
    }

    /// Evaluate segment `segment` at local parameter `t` with the cubic
    /// bezier basis.
    fn eval(&self, segment: usize, t: f32) -> Vec2 {
        let base = 3 * segment;
        let s = 1.0 - t;
        let a = s * s * s;
        let b = 3.0 * t * s * s;
        let c = 3.0 * s * t * t;
        let d = t * t * t;
        self.points[base] * a
            + self.points[base + 1] * b
            + self.points[base + 2] * c
            + self.points[base + 3] * d
    }

    /// Split segment `segment` at parameter `t` into two geometrically
    /// equivalent beziers (de Casteljau).
    fn subdivide(&self, segment: usize, t: f32) -> ([Vec2; 4], [Vec2; 4]) {
        let base = 3 * segment;
        let p0 = self.points[base];
        let p1 = self.points[base + 1];
        let p2 = self.points[base + 2];
        let p3 = self.points[base + 3];

        let p01 = p0.lerp(p1, t);
        let p12 = p1.lerp(p2, t);
        let p23 = p2.lerp(p3, t);
        let p012 = p01.lerp(p12, t);
        let p123 = p12.lerp(p23, t);
        let mid = p012.lerp(p123, t);

        ([p0, p01, p012, mid], [mid, p123, p23, p3])
    }

    /// The nearest parameter on one segment, by brute-force resolution walk,
    /// returned with its squared distance.
    fn project_slow(&self, point: Vec2, segment: usize) -> (f32, f32) {
        let resolution = 1usize << MAX_DEPTH;
        let mut best = (0.0, f32::MAX);
        for i in 0..resolution {
            let t = i as f32 / resolution as f32;
            let d = self.eval(segment, t).distance_squared(point);
            if d < best.1 {
                best = (t, d);
            }
        }
        // The walk never lands exactly on the far anchor.
        let d = self.points[3 * segment + 3].distance_squared(point);
        if d < best.1 {
            best = (1.0, d);
        }
        best
    }

    /// The buffer slot of the tangent with the given external index.
    fn tangent_slot(index: usize) -> usize {
        let anchor = 3 * ((index + 1) / 2);
        if index % 2 == 1 { anchor - 1 } else { anchor + 1 }
    }

    /// Whether the anchor at `index` has (suitably) parallel tangents.
    fn check_smooth(&self, index: usize) -> bool {
        let anchor = self.points[3 * index];
        let incoming = (anchor - self.points[3 * index - 1]).normalize_or_zero();
        let outgoing = (self.points[3 * index + 1] - anchor).normalize_or_zero();
        (incoming - outgoing).length_squared() < SMOOTH_TOLERANCE
    }

    /// Bounds-check an anchor index for the current open/closed state.
    ///
    /// An open spline of `n` segments has `n + 1` anchors; a closed one has
    /// `n`, with the shared end anchor addressed as index 0.
    fn check_anchor(&self, index: usize) -> GeometryResult<()> {
        let count = if self.closed { self.size } else { self.size + 1 };
        if index >= count {
            return Err(GeometryError::IndexOutOfBounds { index, len: count });
        }
        Ok(())
    }
}
