//! A factory for smoothing a path, reducing the number of points.
//!
//! Tracking a finger gesture or a mouse drag records far more points than the
//! shape needs. If points are within a tolerance of the chord between their
//! neighbors, they can be removed without visibly altering the path — which
//! also keeps downstream extrusion fast.
//!
//! This uses the Ramer–Douglas–Peucker algorithm. The right epsilon is found
//! by experimentation; it depends on the coordinate scale of the path being
//! smoothed.
//!
//! Like the other factories, the methods split into initialization,
//! calculation, and materialization, so the calculation can be moved to a
//! worker thread. The factory is not thread safe: do not touch an instance
//! while its calculation is in flight.

use glam::Vec2;

use crate::path::Path;

/// The default epsilon, suited to touch coordinates.
const DEFAULT_EPSILON: f32 = 1.0;

/// A polyline simplifier.
///
/// The output is always an in-order subset of the input points and always
/// keeps the first and last point.
#[derive(Debug, Clone)]
pub struct PathSmoother {
    /// The points to smooth.
    input: Vec<Vec2>,
    /// The surviving points after smoothing.
    output: Vec<Vec2>,
    /// The minimum perpendicular deviation for a point to be kept.
    epsilon: f32,
    /// Whether the calculation has been run.
    calculated: bool,
}

impl Default for PathSmoother {
    fn default() -> Self {
        Self::new()
    }
}

impl PathSmoother {
    /// Create a path smoother with no point data.
    pub fn new() -> Self {
        PathSmoother {
            input: Vec::new(),
            output: Vec::new(),
            epsilon: DEFAULT_EPSILON,
            calculated: false,
        }
    }

    /// Create a path smoother over a copy of the given points.
    pub fn from_points(points: &[Vec2]) -> Self {
        let mut smoother = Self::new();
        smoother.set_points(points);
        smoother
    }

    /// Set the point data, copying it.
    ///
    /// Resets any previous calculation.
    pub fn set_points(&mut self, points: &[Vec2]) {
        self.clear();
        self.input.extend_from_slice(points);
    }

    /// Set the point data from a path, copying the vertices.
    ///
    /// Only the vertex data is taken; whether the path is closed is ignored.
    /// Resets any previous calculation.
    pub fn set_path(&mut self, path: &Path) {
        self.set_points(&path.vertices);
    }

    /// The epsilon value of the smoothing algorithm.
    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    /// Set the epsilon value of the smoothing algorithm.
    ///
    /// Any point within epsilon of the chord between the surviving points
    /// around it is dropped. For touch paths (integer coordinates) the value
    /// should be at least 1, which is the default.
    pub fn set_epsilon(&mut self, epsilon: f32) {
        self.epsilon = epsilon;
    }

    /// Clear the computed data, keeping the input points and settings.
    pub fn reset(&mut self) {
        self.output.clear();
        self.calculated = false;
    }

    /// Clear all data including the input points.
    pub fn clear(&mut self) {
        self.reset();
        self.input.clear();
    }

    /// Run the smoothing calculation.
    ///
    /// Does nothing when already calculated.
    pub fn calculate(&mut self) {
        if self.calculated {
            return;
        }
        if self.input.len() < 2 {
            self.output = self.input.clone();
        } else {
            self.simplify(0, self.input.len() - 1);
        }
        self.calculated = true;
    }

    /// The smoothed points.
    ///
    /// Empty until [`calculate`](Self::calculate) has been run.
    pub fn points(&self) -> &[Vec2] {
        &self.output
    }

    /// The smoothed points as an open path.
    ///
    /// Empty until [`calculate`](Self::calculate) has been run.
    pub fn path(&self) -> Path {
        Path {
            vertices: self.output.clone(),
            ..Path::default()
        }
    }

    /// Recursively simplify `input[start..=end]`, appending survivors to the
    /// output.
    ///
    /// Picks the point of maximum perpendicular distance from the chord; if
    /// it deviates more than epsilon, both halves are simplified and spliced
    /// (dropping the duplicated joint point), otherwise the whole range
    /// collapses to its two endpoints. Every recursive call strictly shrinks
    /// its index range, so the depth is bounded by the input size.
    fn simplify(&mut self, start: usize, end: usize) {
        let s = self.input[start];
        let e = self.input[end];

        if end - start <= 1 {
            self.output.push(s);
            self.output.push(e);
            return;
        }

        if s == e {
            // Degenerate chord: scan ahead for the first distinct point.
            self.output.push(s);
            match (start + 1..end).find(|&i| self.input[i] != s) {
                Some(index) => self.simplify(index, end),
                None => self.output.push(e),
            }
            return;
        }

        let chord = e - s;
        let inv_len = 1.0 / chord.length();
        let mut dmax = 0.0;
        let mut index = start;
        for i in start + 1..end {
            let v = self.input[i];
            let dist = (chord.y * v.x - chord.x * v.y + e.x * s.y - e.y * s.x).abs() * inv_len;
            if dist > dmax {
                index = i;
                dmax = dist;
            }
        }

        if dmax > self.epsilon {
            self.simplify(start, index);
            // The joint point would be emitted by both halves.
            self.output.pop();
            self.simplify(index, end);
        } else {
            self.output.push(s);
            self.output.push(e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_straight_line_collapses() {
        let points: Vec<Vec2> = (0..10).map(|i| Vec2::new(i as f32, 0.0)).collect();
        let mut smoother = PathSmoother::from_points(&points);
        smoother.calculate();
        assert_eq!(smoother.points(), &[points[0], points[9]]);
    }

    #[test]
    fn test_keeps_significant_deviation() {
        let points = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(5.0, 4.0),
            Vec2::new(10.0, 0.0),
        ];
        let mut smoother = PathSmoother::from_points(&points);
        smoother.calculate();
        assert_eq!(smoother.points(), points.as_slice());
    }

    #[test]
    fn test_drops_small_deviation() {
        let points = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(5.0, 0.4),
            Vec2::new(10.0, 0.0),
        ];
        let mut smoother = PathSmoother::from_points(&points);
        smoother.calculate();
        assert_eq!(smoother.points(), &[points[0], points[2]]);
    }

    #[test]
    fn test_no_duplicate_joint() {
        let points = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(5.0, 10.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(15.0, 10.0),
            Vec2::new(20.0, 0.0),
        ];
        let mut smoother = PathSmoother::from_points(&points);
        smoother.calculate();
        assert_eq!(smoother.points(), points.as_slice());
    }

    #[test]
    fn test_coincident_endpoints() {
        let points = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(4.0, 4.0),
            Vec2::new(8.0, 0.0),
            Vec2::new(0.0, 0.0),
        ];
        let mut smoother = PathSmoother::from_points(&points);
        smoother.calculate();
        let out = smoother.points();
        assert_eq!(out.first(), Some(&points[0]));
        assert_eq!(out.last(), Some(&points[3]));
        assert!(out.contains(&points[1]));
    }

    #[test]
    fn test_all_points_coincident() {
        let points = vec![Vec2::new(2.0, 2.0); 5];
        let mut smoother = PathSmoother::from_points(&points);
        smoother.calculate();
        assert_eq!(smoother.points(), &[points[0], points[0]]);
    }

    #[test]
    fn test_materialize_before_calculate_is_empty() {
        let smoother = PathSmoother::from_points(&[Vec2::ZERO, Vec2::ONE]);
        assert!(smoother.points().is_empty());
        assert!(smoother.path().is_empty());
    }

    #[test]
    fn test_path_output_is_open() {
        let mut smoother =
            PathSmoother::from_points(&[Vec2::ZERO, Vec2::new(1.0, 5.0), Vec2::new(2.0, 0.0)]);
        smoother.calculate();
        let path = smoother.path();
        assert!(!path.closed);
        assert_eq!(path.len(), 3);
    }
}
