//! Error types for geometry operations.

use std::fmt;

/// Errors produced by geometry construction and editing operations.
///
/// All of these are detected synchronously at the call that violates the
/// precondition; the operation aborts without mutating the receiver.
#[derive(Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// A path or polygon was given fewer vertices than it needs.
    TooFewVertices {
        /// How many vertices were supplied.
        count: usize,
        /// The minimum that the operation requires.
        required: usize,
    },

    /// A slice or segment range had `start > end`.
    InvalidRange {
        /// The start of the range.
        start: usize,
        /// The end of the range.
        end: usize,
    },

    /// An index access past the end of a buffer.
    IndexOutOfBounds {
        /// The offending index.
        index: usize,
        /// The buffer length.
        len: usize,
    },

    /// A scale operation was given a zero factor.
    ZeroScale,

    /// A rounded-rect corner radius exceeded half the width or height.
    RadiusTooLarge {
        /// The requested radius.
        radius: f32,
        /// The largest radius the extents allow.
        limit: f32,
    },

    /// An arc sweep outside the half-open range (0, 360].
    DegreesOutOfRange {
        /// The requested sweep in degrees.
        degrees: f32,
    },

    /// A spline control-point array whose length is not `3n + 1` points.
    MalformedControlPoints {
        /// How many control points were supplied.
        count: usize,
    },

    /// An append to a closed spline, which has no end.
    ClosedSpline,

    /// A curve parameter outside its valid interval.
    InvalidParameter {
        /// The offending parameter value.
        param: f32,
    },
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryError::TooFewVertices { count, required } => {
                write!(f, "Expected at least {} vertices, got {}", required, count)
            }
            GeometryError::InvalidRange { start, end } => {
                write!(f, "Invalid range: start {} exceeds end {}", start, end)
            }
            GeometryError::IndexOutOfBounds { index, len } => {
                write!(f, "Index {} out of bounds for length {}", index, len)
            }
            GeometryError::ZeroScale => {
                write!(f, "Cannot scale by zero")
            }
            GeometryError::RadiusTooLarge { radius, limit } => {
                write!(f, "Corner radius {} exceeds half-extent {}", radius, limit)
            }
            GeometryError::DegreesOutOfRange { degrees } => {
                write!(f, "Arc sweep {} degrees outside (0, 360]", degrees)
            }
            GeometryError::MalformedControlPoints { count } => {
                write!(
                    f,
                    "Control point count {} is not of the form 3n + 1",
                    count
                )
            }
            GeometryError::ClosedSpline => {
                write!(f, "Cannot append to a closed spline")
            }
            GeometryError::InvalidParameter { param } => {
                write!(f, "Curve parameter {} out of range", param)
            }
        }
    }
}

impl std::error::Error for GeometryError {}

/// Result type alias for geometry operations.
pub type GeometryResult<T> = Result<T, GeometryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GeometryError::TooFewVertices {
            count: 1,
            required: 2,
        };
        assert_eq!(err.to_string(), "Expected at least 2 vertices, got 1");

        let err = GeometryError::DegreesOutOfRange { degrees: 400.0 };
        assert!(err.to_string().contains("400"));
    }
}
