//! Configuration enums shared by the extruder and the factories.

/// How an extrusion connects two line segments at an interior corner.
///
/// Without a joint, a wide stroke would look like a sequence of overlapping
/// rectangles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Joint {
    /// Sharp corner extended to the miter point. Falls back to a bevel when
    /// the miter length exceeds the miter limit.
    Mitre,
    /// Bevel joint; the corner is replaced by a flat chamfer.
    #[default]
    Square,
    /// Round joint; the corner is replaced by a circular arc.
    Round,
}

/// How an extrusion terminates the ends of an open path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EndCap {
    /// No cap; the stroke stops flat at the end vertices.
    #[default]
    Butt,
    /// Flat cap padded by half the stroke width.
    Square,
    /// Semicircular cap with radius half the stroke width.
    Round,
}

/// How a polygon's boundary is converted back into paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Traversal {
    /// No traversal; produces no paths.
    #[default]
    None,
    /// One open path per boundary loop.
    Open,
    /// One closed path per boundary loop.
    Closed,
    /// One closed path per individual triangle of the tessellation.
    Interior,
}

/// The shape of a generated capsule.
///
/// A capsule is a box with semicircular ends along its major axis. The
/// half variants round only one end, sized so the corresponding full capsule
/// would fit the same bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Capsule {
    /// A capsule with equal width and height degenerates to an ellipse.
    Degenerate,
    /// Round ends on both sides of the major axis.
    #[default]
    Full,
    /// A rounded end on the default side (left for a horizontal capsule,
    /// bottom for a vertical one).
    Half,
    /// A rounded end on the side opposite the default.
    HalfReverse,
}
