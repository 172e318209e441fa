//! Stroke extrusion scenarios.
//!
//! These tests verify the extruder end to end: the mesh structure for
//! canonical inputs, joint and cap behavior, and the border/side-annotation
//! side products.

use glam::Vec2;
use polyform_core::geometry::Rect;
use polyform_geometry::{EndCap, Joint, PathExtruder, PathFactory, Polygon};

fn triangle_area(poly: &Polygon, tri: usize) -> f32 {
    let a = poly.vertices[poly.indices[3 * tri] as usize];
    let b = poly.vertices[poly.indices[3 * tri + 1] as usize];
    let c = poly.vertices[poly.indices[3 * tri + 2] as usize];
    (b - a).perp_dot(c - a) * 0.5
}

fn assert_contains_point(poly: &Polygon, expected: Vec2) {
    assert!(
        poly.vertices.iter().any(|v| (*v - expected).length() < 1e-4),
        "no vertex near {:?}",
        expected
    );
}

#[test]
fn test_rect_mitre_extrusion_is_concentric_rects() {
    let path = PathFactory::new().make_rect(Rect::new(0.0, 0.0, 4.0, 2.0));
    let mut extruder = PathExtruder::from_path(&path).with_joint(Joint::Mitre);
    extruder.calculate(1.0);
    let poly = extruder.polygon();

    // Two concentric rectangles: outer 5x3, inner 3x1, center aligned.
    assert_eq!(poly.vertex_count(), 8);
    assert_eq!(poly.triangle_count(), 8);
    for corner in [
        Vec2::new(0.5, 0.5),
        Vec2::new(3.5, 0.5),
        Vec2::new(3.5, 1.5),
        Vec2::new(0.5, 1.5),
        Vec2::new(-0.5, -0.5),
        Vec2::new(4.5, -0.5),
        Vec2::new(4.5, 2.5),
        Vec2::new(-0.5, 2.5),
    ] {
        assert_contains_point(&poly, corner);
    }
    for tri in 0..poly.triangle_count() {
        assert!(triangle_area(&poly, tri) != 0.0, "triangle {} degenerate", tri);
    }
}

#[test]
fn test_rect_square_joints_chamfer_outer_corners() {
    let path = PathFactory::new().make_rect(Rect::new(0.0, 0.0, 4.0, 2.0));
    let mut extruder = PathExtruder::from_path(&path).with_joint(Joint::Square);
    extruder.calculate(1.0);
    let poly = extruder.polygon();

    // The chamfer replaces each outer mitre corner with two offset points.
    assert_contains_point(&poly, Vec2::new(-0.5, 0.0));
    assert_contains_point(&poly, Vec2::new(0.0, -0.5));
    // The sharp mitre corner itself is gone from the outside.
    assert!(
        !poly
            .vertices
            .iter()
            .any(|v| (*v - Vec2::new(-0.5, -0.5)).length() < 1e-4)
    );
    // More triangles than the mitre variant, all valid.
    assert!(poly.triangle_count() > 8);
    for tri in 0..poly.triangle_count() {
        assert!(triangle_area(&poly, tri) != 0.0);
    }
}

#[test]
fn test_closed_convex_extrusion_triangle_count() {
    // Plain mitre joints on a convex loop: two vertices and two triangles
    // per path point, nothing more.
    let path = PathFactory::new().make_ngon(Vec2::ZERO, 10.0, 12);
    assert!(path.is_convex());
    let mut extruder = PathExtruder::from_path(&path).with_joint(Joint::Mitre);
    extruder.calculate(2.0);
    let poly = extruder.polygon();
    assert_eq!(poly.vertex_count(), 2 * path.len());
    assert_eq!(poly.triangle_count(), 2 * path.len());
    for tri in 0..poly.triangle_count() {
        assert!(triangle_area(&poly, tri) > 0.0, "triangle {} not ccw", tri);
    }
}

#[test]
fn test_elbow_with_round_caps() {
    // An open 3-point elbow: two semicircular caps plus one beveled joint
    // at the corner.
    let points = [Vec2::ZERO, Vec2::new(10.0, 0.0), Vec2::new(10.0, 10.0)];
    let mut extruder = PathExtruder::new().with_end_cap(EndCap::Round);
    extruder.set_points(&points, false);
    extruder.calculate(2.0);
    let poly = extruder.polygon();
    assert!(!poly.is_empty());

    // Caps protrude past each endpoint, staying within one radius; the
    // bevel joint covers the outer corner at exactly one radius.
    let (min, max) = poly.bounds().unwrap();
    assert!(min.x < -0.8 && min.x >= -1.0 - 1e-4, "head cap at {}", min.x);
    assert!((min.y + 1.0).abs() < 1e-4);
    assert!((max.x - 11.0).abs() < 1e-4);
    assert!(max.y > 10.8 && max.y <= 11.0 + 1e-4, "tail cap at {}", max.y);

    // Head and tail cap vertices carry cap progress marks.
    let sides = extruder.sides();
    assert!(sides.iter().any(|s| s.y < 0.0), "no head cap vertices");
    assert!(sides.iter().any(|s| s.y > 0.0), "no tail cap vertices");
    assert!(sides.iter().filter(|s| s.y == 0.0).count() > 4);

    for tri in 0..poly.triangle_count() {
        assert!(triangle_area(&poly, tri) != 0.0);
    }
}

#[test]
fn test_round_joint_covers_corner() {
    let points = [Vec2::ZERO, Vec2::new(10.0, 0.0), Vec2::new(10.0, 10.0)];
    let mut extruder = PathExtruder::new().with_joint(Joint::Round);
    extruder.set_points(&points, false);
    extruder.calculate(2.0);
    let poly = extruder.polygon();

    // The rounded outer corner stays within one radius of the path point.
    let corner = Vec2::new(10.0, 0.0);
    let outermost = poly
        .vertices
        .iter()
        .map(|v| v.distance(corner))
        .fold(0.0f32, f32::max);
    assert!(outermost <= 10.0 + 1.0 + 1e-4);
    // And the arc fans from the corner itself.
    assert_contains_point(&poly, corner);
}

#[test]
fn test_sharp_mitre_degrades_to_bevel() {
    // A 170-degree hairpin: the mitre point would fly off to infinity, so
    // the extrusion must fall back to a bevel within the mitre limit.
    let points = [
        Vec2::new(0.0, 0.0),
        Vec2::new(10.0, 0.0),
        Vec2::new(0.0, 1.5),
    ];
    let mut extruder = PathExtruder::new().with_joint(Joint::Mitre);
    extruder.set_points(&points, false);
    extruder.calculate(1.0);
    let poly = extruder.polygon();

    let limit = extruder.mitre_limit();
    let (min, max) = poly.bounds().unwrap();
    assert!(max.x < 10.0 + limit && max.y < 10.0 + limit);
    assert!(min.x > -limit && min.y > -limit);
}

#[test]
fn test_closed_borders_trace_offsets() {
    let path = PathFactory::new().make_rect(Rect::new(0.0, 0.0, 4.0, 2.0));
    let mut extruder = PathExtruder::from_path(&path).with_joint(Joint::Mitre);
    extruder.calculate(1.0);

    let borders = extruder.border();
    assert_eq!(borders.len(), 2);
    // Right side of a counter-clockwise loop is the outer boundary.
    let (outer_min, outer_max) = borders[0].bounds().unwrap();
    assert_eq!(outer_min, Vec2::new(-0.5, -0.5));
    assert_eq!(outer_max, Vec2::new(4.5, 2.5));
    let (inner_min, inner_max) = borders[1].bounds().unwrap();
    assert_eq!(inner_min, Vec2::new(0.5, 0.5));
    assert_eq!(inner_max, Vec2::new(3.5, 1.5));
}

#[test]
fn test_mesh_round_trips_through_boundaries() {
    // Extrude, then recover the stroke outline from the mesh alone.
    let path = PathFactory::new().make_rect(Rect::new(0.0, 0.0, 4.0, 2.0));
    let mut extruder = PathExtruder::from_path(&path).with_joint(Joint::Mitre);
    extruder.calculate(1.0);
    let poly = extruder.polygon();

    let rings = poly.boundaries();
    // A closed stroke is an annulus: outer boundary plus hole.
    assert_eq!(rings.len(), 2);
    let mut sizes: Vec<usize> = rings.iter().map(|r| r.len()).collect();
    sizes.sort_unstable();
    assert_eq!(sizes, vec![4, 4]);
}

#[test]
fn test_stroke_vertices_pack_sides() {
    let points = [Vec2::ZERO, Vec2::new(10.0, 0.0)];
    let mut extruder = PathExtruder::new();
    extruder.set_points(&points, false);
    extruder.calculate(2.0);
    let poly = extruder.polygon();
    let verts = polyform_geometry::stroke_vertices(&poly, extruder.sides());
    assert_eq!(verts.len(), poly.vertex_count());
    assert!(verts.iter().any(|v| v.side[0] == -1.0));
    assert!(verts.iter().any(|v| v.side[0] == 1.0));
}
