//! A simple polygon mesh.
//!
//! This type separates the geometry of a triangulated polygon from any
//! rendering pipeline: a vertex buffer plus a triangle index buffer, directly
//! consumable as a GPU mesh. It is deliberately lightweight. There is no
//! verification that the indices describe a valid, non-self-intersecting
//! triangulation; producers (the factories and the extruder) are responsible
//! for emitting well-formed meshes.

use ahash::{AHashMap as HashMap, AHashSet as HashSet};
use glam::{Vec2, Vec3};
use polyform_core::geometry::Rect;

use crate::error::{GeometryError, GeometryResult};

/// A vertex buffer with a triangle index buffer.
///
/// Indices reference the vertex buffer in groups of three, one group per
/// triangle. Indices are 16-bit: meshes produced here are expected to stay
/// within a `u16` index range.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Polygon {
    /// The vertices of this polygon.
    pub vertices: Vec<Vec2>,
    /// The triangle indices, three per triangle.
    pub indices: Vec<u16>,
}

/// A triangle of the mesh, interpreted as a node of the dual graph.
///
/// Two nodes are adjacent when they share exactly two vertex indices (an
/// edge). The elements are kept sorted so a node is uniquely identified by
/// its contents.
struct TriNode {
    /// The vertex indices of this triangle, ascending.
    elements: [u16; 3],
    /// Indices of the adjacent nodes in the decomposition.
    neighbors: Vec<usize>,
}

impl TriNode {
    fn contains(&self, index: u16) -> bool {
        self.elements.contains(&index)
    }

    /// A boundary index of this node not present in `exclude`.
    ///
    /// A boundary index appears in at most one neighbor: it belongs to the
    /// first or last triangle of a traversal (or to an ear). Indices with
    /// fewer containing neighbors are preferred.
    fn pick(&self, nodes: &[TriNode], exclude: &HashSet<u16>) -> Option<u16> {
        let mut counts = [0usize; 3];
        for &nb in &self.neighbors {
            for (i, &e) in self.elements.iter().enumerate() {
                if nodes[nb].contains(e) {
                    counts[i] += 1;
                }
            }
        }
        let mut best: Option<usize> = None;
        for i in 0..3 {
            if counts[i] <= 1 && !exclude.contains(&self.elements[i]) {
                match best {
                    None => best = Some(i),
                    Some(b) if counts[i] < counts[b] => best = Some(i),
                    _ => {}
                }
            }
        }
        best.map(|i| self.elements[i])
    }
}

impl Polygon {
    /// Create a new empty polygon.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a polygon from a vertex buffer and a triangle index buffer.
    ///
    /// The indices are not validated.
    pub fn from_parts(vertices: Vec<Vec2>, indices: Vec<u16>) -> Self {
        Polygon { vertices, indices }
    }

    /// Create a polygon covering the given rectangle.
    ///
    /// The polygon has four corner vertices and two triangles. This is much
    /// cheaper than running a triangulator.
    pub fn from_rect(rect: Rect<f32>) -> Self {
        Polygon {
            vertices: rect
                .corners()
                .iter()
                .map(|&(x, y)| Vec2::new(x, y))
                .collect(),
            indices: vec![0, 1, 2, 0, 2, 3],
        }
    }

    /// The number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// The number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Check if the polygon has no geometry.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.indices.is_empty()
    }

    /// Remove all vertices and indices.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
    }

    /// Scale every vertex from the origin of the coordinate space.
    pub fn scale(&mut self, factor: Vec2) -> &mut Self {
        for v in &mut self.vertices {
            *v *= factor;
        }
        self
    }

    /// Scale every vertex by the inverse of the given factor.
    ///
    /// Fails with [`GeometryError::ZeroScale`] when either component is zero.
    pub fn inv_scale(&mut self, factor: Vec2) -> GeometryResult<&mut Self> {
        if factor.x == 0.0 || factor.y == 0.0 {
            return Err(GeometryError::ZeroScale);
        }
        Ok(self.scale(factor.recip()))
    }

    /// Translate every vertex by the given offset.
    pub fn translate(&mut self, offset: Vec2) -> &mut Self {
        for v in &mut self.vertices {
            *v += offset;
        }
        self
    }

    /// The bounding box of this polygon as `(min, max)` corners.
    pub fn bounds(&self) -> Option<(Vec2, Vec2)> {
        let first = *self.vertices.first()?;
        let mut min = first;
        let mut max = first;
        for &v in &self.vertices[1..] {
            min = min.min(v);
            max = max.max(v);
        }
        Some((min, max))
    }

    /// Check if this polygon contains the given point.
    ///
    /// Unlike [`Path`](crate::Path), this does not use an even-odd rule.
    /// The point is tested for membership in the triangle mesh, so holes in
    /// the mesh are respected. Containment is not strict: boundary points
    /// are inside.
    pub fn contains(&self, point: Vec2) -> bool {
        (0..self.triangle_count()).any(|tri| {
            let b = self.barycentric(point, tri);
            (0.0..=1.0).contains(&b.x) && (0.0..=1.0).contains(&b.y) && (0.0..=1.0).contains(&b.z)
        })
    }

    /// Check if the given point lies on a boundary of this polygon, within a
    /// distance tolerance.
    pub fn incident(&self, point: Vec2, tolerance: f32) -> bool {
        for ring in self.boundaries() {
            for i in 0..ring.len() {
                let a = self.vertices[ring[i] as usize];
                let b = self.vertices[ring[(i + 1) % ring.len()] as usize];
                if segment_distance(point, a, b) <= tolerance {
                    return true;
                }
            }
        }
        false
    }

    /// The set of vertex indices on a boundary of this polygon, unordered.
    ///
    /// An index is interior when every incident edge has a triangle on both
    /// sides; equivalently, the triangles containing it form a closed fan.
    /// Unlike [`boundaries`](Self::boundaries), this method does not order
    /// the indices or split them into connected loops.
    pub fn exterior(&self) -> Vec<u16> {
        let mut tri_count: HashMap<u16, usize> = HashMap::new();
        for tri in self.indices.chunks_exact(3) {
            for &i in tri {
                *tri_count.entry(i).or_insert(0) += 1;
            }
        }

        // Each manifold edge (shared by two triangles) contributes one
        // adjacent-triangle pair touching both of its endpoints.
        let mut pair_count: HashMap<u16, usize> = HashMap::new();
        for (&(a, b), tris) in &self.edge_map() {
            if tris.len() >= 2 {
                *pair_count.entry(a).or_insert(0) += tris.len() - 1;
                *pair_count.entry(b).or_insert(0) += tris.len() - 1;
            }
        }

        let mut result = Vec::new();
        for index in 0..self.vertices.len() as u16 {
            if let Some(&count) = tri_count.get(&index) {
                if pair_count.get(&index).copied().unwrap_or(0) < count {
                    result.push(index);
                }
            }
        }
        result
    }

    /// The connected boundary loops of this polygon.
    ///
    /// This detriangulates the mesh, recovering the outer hull and discarding
    /// interior points. A simple polygon yields exactly one loop. A
    /// discontinuous mesh yields one loop per component, and each hole comes
    /// back as its own loop. Loops are implicitly closed and arrive in
    /// reverse discovery order; the traversal produces clockwise loops, so
    /// reverse them to obtain the counter-clockwise exterior convention.
    ///
    /// If only interior vertices remain after some loops are extracted (a
    /// malformed mesh), extraction stops early with the loops found so far.
    pub fn boundaries(&self) -> Vec<Vec<u16>> {
        let nodes = self.decompose();
        let total: HashSet<u16> = self.indices.iter().copied().collect();
        let mut inuse: HashSet<u16> = HashSet::new();
        let mut result: Vec<Vec<u16>> = Vec::new();

        while inuse.len() != total.len() {
            // Pick a valid (exterior) starting point.
            let mut start = None;
            for (i, node) in nodes.iter().enumerate() {
                if let Some(index) = node.pick(&nodes, &inuse) {
                    start = Some((i, index));
                    break;
                }
            }
            // All remaining indices are internal.
            let Some((node, mut index)) = start else {
                break;
            };

            // Self-crossings may allow a point to be reused, so each loop
            // trace keeps its own visited set and traversal history.
            let mut previous: Vec<Option<usize>> = vec![None; nodes.len()];
            let mut visited: HashSet<u16> = HashSet::new();
            let mut ring: Vec<u16> = Vec::new();

            let mut current = follow(&nodes, &mut previous, node, index);
            while let Some(cur) = current {
                visited.insert(index);
                ring.push(index);
                match nodes[cur].pick(&nodes, &visited) {
                    Some(next) => {
                        index = next;
                        current = follow(&nodes, &mut previous, cur, index);
                    }
                    None => current = None,
                }
            }

            inuse.extend(visited.iter().copied());
            result.push(ring);
        }

        // Loops are reported in reverse discovery order.
        result.reverse();
        result
    }

    /// The mesh edges, keyed by their (ascending) endpoint indices, each with
    /// the list of triangles containing the edge.
    fn edge_map(&self) -> HashMap<(u16, u16), Vec<usize>> {
        let mut edges: HashMap<(u16, u16), Vec<usize>> = HashMap::new();
        for (tri, chunk) in self.indices.chunks_exact(3).enumerate() {
            for j in 0..3 {
                let a = chunk[j];
                let b = chunk[(j + 1) % 3];
                let key = (a.min(b), a.max(b));
                edges.entry(key).or_default().push(tri);
            }
        }
        edges
    }

    /// Build the dual-graph decomposition of the triangle mesh.
    ///
    /// Duplicate triangles collapse to one node. Adjacency is derived from
    /// the edge map: nodes sharing an edge are neighbors.
    fn decompose(&self) -> Vec<TriNode> {
        let mut nodes: Vec<TriNode> = Vec::new();
        let mut lookup: HashMap<[u16; 3], usize> = HashMap::new();
        let mut tri_to_node: Vec<usize> = Vec::with_capacity(self.triangle_count());

        for chunk in self.indices.chunks_exact(3) {
            let mut key = [chunk[0], chunk[1], chunk[2]];
            key.sort_unstable();
            let node = *lookup.entry(key).or_insert_with(|| {
                nodes.push(TriNode {
                    elements: key,
                    neighbors: Vec::new(),
                });
                nodes.len() - 1
            });
            tri_to_node.push(node);
        }

        for tris in self.edge_map().values() {
            for i in 0..tris.len() {
                for j in i + 1..tris.len() {
                    let a = tri_to_node[tris[i]];
                    let b = tri_to_node[tris[j]];
                    if a != b && !nodes[a].neighbors.contains(&b) {
                        nodes[a].neighbors.push(b);
                        nodes[b].neighbors.push(a);
                    }
                }
            }
        }
        nodes
    }

    /// The barycentric coordinates of `point` relative to triangle `tri`.
    fn barycentric(&self, point: Vec2, tri: usize) -> Vec3 {
        let a = self.vertices[self.indices[3 * tri] as usize];
        let b = self.vertices[self.indices[3 * tri + 1] as usize];
        let c = self.vertices[self.indices[3 * tri + 2] as usize];

        let det = (b.y - c.y) * (a.x - c.x) + (c.x - b.x) * (a.y - c.y);
        let u = ((b.y - c.y) * (point.x - c.x) + (c.x - b.x) * (point.y - c.y)) / det;
        let v = ((c.y - a.y) * (point.x - c.x) + (a.x - c.x) * (point.y - c.y)) / det;
        Vec3::new(u, v, 1.0 - u - v)
    }
}

/// Walk the dual graph from `node` to the opposite transition point for
/// `index`.
///
/// A transition point is a triangle for which `index` is a boundary value: it
/// has no further neighbor containing `index` in the direction of travel.
/// The `previous` history prevents immediate backtracking; it persists across
/// the crawls of one loop trace so a traversal never re-walks the path it
/// came from.
fn follow(
    nodes: &[TriNode],
    previous: &mut [Option<usize>],
    node: usize,
    index: u16,
) -> Option<usize> {
    previous[node] = None;
    let mut current = node;
    loop {
        if !nodes[current].contains(index) {
            return None;
        }
        let mut next = None;
        for &nb in &nodes[current].neighbors {
            if previous[current] != Some(nb) && nodes[nb].contains(index) {
                next = Some(nb);
            }
        }
        match next {
            None => return Some(current),
            Some(nb) => {
                if previous[nb] == Some(current) {
                    return None;
                }
                previous[nb] = Some(current);
                current = nb;
            }
        }
    }
}

/// The distance from `point` to the segment `a`-`b`.
fn segment_distance(point: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len2 = ab.length_squared();
    if len2 == 0.0 {
        return point.distance(a);
    }
    let t = ((point - a).dot(ab) / len2).clamp(0.0, 1.0);
    point.distance(a + ab * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A 2x2 grid of unit squares, each split into two triangles.
    /// Vertex 4 (the center) is the only interior vertex.
    fn grid_mesh() -> Polygon {
        let vertices = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(2.0, 0.0),
            Vec2::new(0.0, 1.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(2.0, 1.0),
            Vec2::new(0.0, 2.0),
            Vec2::new(1.0, 2.0),
            Vec2::new(2.0, 2.0),
        ];
        let mut indices = Vec::new();
        for (a, b) in [(0u16, 1u16), (1, 2), (3, 4), (4, 5)] {
            // Cell with bottom-left index a, bottom-right b.
            indices.extend_from_slice(&[a, b, b + 3]);
            indices.extend_from_slice(&[a, b + 3, a + 3]);
        }
        Polygon::from_parts(vertices, indices)
    }

    #[test]
    fn test_from_rect() {
        let poly = Polygon::from_rect(Rect::new(0.0, 0.0, 2.0, 1.0));
        assert_eq!(poly.vertex_count(), 4);
        assert_eq!(poly.triangle_count(), 2);
    }

    #[test]
    fn test_contains() {
        let poly = Polygon::from_rect(Rect::new(0.0, 0.0, 2.0, 1.0));
        assert!(poly.contains(Vec2::new(1.0, 0.5)));
        assert!(poly.contains(Vec2::new(0.0, 0.0)));
        assert!(!poly.contains(Vec2::new(2.1, 0.5)));
    }

    #[test]
    fn test_transforms() {
        let mut poly = Polygon::from_rect(Rect::new(0.0, 0.0, 1.0, 1.0));
        poly.scale(Vec2::splat(2.0)).translate(Vec2::new(1.0, 0.0));
        let (min, max) = poly.bounds().unwrap();
        assert_eq!(min, Vec2::new(1.0, 0.0));
        assert_eq!(max, Vec2::new(3.0, 2.0));

        assert_eq!(
            poly.inv_scale(Vec2::ZERO).unwrap_err(),
            GeometryError::ZeroScale
        );
    }

    #[test]
    fn test_exterior_excludes_interior_vertex() {
        let mut exterior = grid_mesh().exterior();
        exterior.sort_unstable();
        assert_eq!(exterior, vec![0, 1, 2, 3, 5, 6, 7, 8]);
    }

    #[test]
    fn test_boundaries_simple() {
        let poly = Polygon::from_rect(Rect::new(0.0, 0.0, 1.0, 1.0));
        let rings = poly.boundaries();
        assert_eq!(rings.len(), 1);
        let mut ring = rings[0].clone();
        ring.sort_unstable();
        assert_eq!(ring, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_boundaries_grid() {
        let rings = grid_mesh().boundaries();
        assert_eq!(rings.len(), 1);
        // All eight boundary vertices, no center.
        let mut ring = rings[0].clone();
        ring.sort_unstable();
        assert_eq!(ring, vec![0, 1, 2, 3, 5, 6, 7, 8]);
    }

    #[test]
    fn test_boundaries_disjoint() {
        // Two separate triangles.
        let poly = Polygon::from_parts(
            vec![
                Vec2::new(0.0, 0.0),
                Vec2::new(1.0, 0.0),
                Vec2::new(0.0, 1.0),
                Vec2::new(5.0, 0.0),
                Vec2::new(6.0, 0.0),
                Vec2::new(5.0, 1.0),
            ],
            vec![0, 1, 2, 3, 4, 5],
        );
        let rings = poly.boundaries();
        assert_eq!(rings.len(), 2);
        let mut sizes: Vec<usize> = rings.iter().map(|r| r.len()).collect();
        sizes.sort_unstable();
        assert_eq!(sizes, vec![3, 3]);
    }

    #[test]
    fn test_incident_on_boundary() {
        let poly = Polygon::from_rect(Rect::new(0.0, 0.0, 2.0, 1.0));
        assert!(poly.incident(Vec2::new(1.0, 0.0), 1e-4));
        assert!(!poly.incident(Vec2::new(1.0, 0.5), 1e-4));
    }
}
