//! Renderable surface of a finite element mesh.
//!
//! Viewer formats (STL, OBJ, WRL) only carry polygons, so volume meshes are
//! reduced to their outer skin: a solid face is on the boundary when exactly
//! one element references it. Shell elements contribute their own face and
//! line elements contribute nothing.

use std::collections::HashMap;

use nalgebra::{Point3, Vector3};
use rt3d_model::Mesh;
use tracing::debug;

/// Triangle referencing surface vertices, tagged with its source element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Triangle {
    /// Vertex indices (mesh node positions)
    pub vertices: [usize; 3],
    /// Position of the owning element in mesh order
    pub element: usize,
}

/// Triangulated boundary of a mesh.
///
/// Vertices are every mesh node in mesh order, so a nodal attribute indexes
/// them directly; nodes not on the boundary are simply unreferenced.
#[derive(Debug, Clone, Default)]
pub struct Surface {
    pub vertices: Vec<Point3<f64>>,
    pub triangles: Vec<Triangle>,
}

impl Surface {
    /// Extract the boundary surface of `mesh`
    pub fn extract(mesh: &Mesh) -> Self {
        let vertices: Vec<Point3<f64>> = mesh.nodes().iter().map(|n| n.point()).collect();

        // Faces as (element position, corner node positions), in element order
        let mut faces: Vec<(usize, Vec<usize>)> = Vec::new();
        let mut solid_face_count: HashMap<Vec<usize>, usize> = HashMap::new();

        for (element_pos, element) in mesh.elements().iter().enumerate() {
            for local_face in element.shape.corner_faces() {
                let corners: Option<Vec<usize>> = local_face
                    .iter()
                    .map(|&local| {
                        element
                            .nodes
                            .get(local)
                            .and_then(|&id| mesh.node_position(id))
                    })
                    .collect();
                let Some(corners) = corners else {
                    continue;
                };

                if element.shape.is_solid() {
                    *solid_face_count.entry(face_key(&corners)).or_insert(0) += 1;
                }
                faces.push((element_pos, corners));
            }
        }

        let mut triangles = Vec::new();
        for (element_pos, corners) in faces {
            let is_solid = mesh.elements()[element_pos].shape.is_solid();
            if is_solid && solid_face_count.get(&face_key(&corners)) != Some(&1) {
                continue;
            }
            // Fan triangulation; faces are triangles or convex quads
            for i in 1..corners.len().saturating_sub(1) {
                triangles.push(Triangle {
                    vertices: [corners[0], corners[i], corners[i + 1]],
                    element: element_pos,
                });
            }
        }

        debug!(
            "extracted surface: {} vertices, {} triangles",
            vertices.len(),
            triangles.len()
        );
        Self {
            vertices,
            triangles,
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Unit normal of a triangle, zero for degenerate triangles
    pub fn normal(&self, triangle: &Triangle) -> Vector3<f64> {
        let [a, b, c] = triangle.vertices.map(|i| self.vertices[i]);
        (b - a)
            .cross(&(c - a))
            .try_normalize(f64::EPSILON)
            .unwrap_or_else(Vector3::zeros)
    }

    /// Vertex indices referenced by at least one triangle, ascending
    pub fn used_vertices(&self) -> Vec<usize> {
        let mut used: Vec<usize> = self
            .triangles
            .iter()
            .flat_map(|t| t.vertices)
            .collect();
        used.sort_unstable();
        used.dedup();
        used
    }
}

fn face_key(corners: &[usize]) -> Vec<usize> {
    let mut key = corners.to_vec();
    key.sort_unstable();
    key
}

#[cfg(test)]
mod tests {
    use super::*;
    use rt3d_model::{Element, ElementShape, Node};

    /// Two hexahedra sharing the face at x = 1
    fn two_hex_block() -> Mesh {
        let mut mesh = Mesh::new();
        for iz in 0..2 {
            for iy in 0..2 {
                for ix in 0..3 {
                    let id = 1 + ix + 3 * iy + 6 * iz;
                    mesh.add_node(Node::new(id, ix as f64, iy as f64, iz as f64));
                }
            }
        }
        mesh.add_element(Element::new(1, ElementShape::Hex8, vec![1, 2, 5, 4, 7, 8, 11, 10]))
            .unwrap();
        mesh.add_element(Element::new(2, ElementShape::Hex8, vec![2, 3, 6, 5, 8, 9, 12, 11]))
            .unwrap();
        mesh
    }

    #[test]
    fn shared_solid_faces_are_interior() {
        let surface = Surface::extract(&two_hex_block());
        // 12 faces, 2 shared -> 10 boundary quads -> 20 triangles
        assert_eq!(surface.triangle_count(), 20);
        assert_eq!(surface.vertices.len(), 12);
        assert_eq!(surface.used_vertices().len(), 12);
    }

    #[test]
    fn triangles_remember_their_element() {
        let surface = Surface::extract(&two_hex_block());
        let from_second = surface.triangles.iter().filter(|t| t.element == 1).count();
        assert_eq!(from_second, 10);
    }

    #[test]
    fn hex_boundary_normals_point_outward() {
        let surface = Surface::extract(&two_hex_block());
        let center = Point3::new(1.0, 0.5, 0.5);
        for triangle in &surface.triangles {
            let centroid = triangle
                .vertices
                .iter()
                .fold(Vector3::zeros(), |acc, &i| acc + surface.vertices[i].coords)
                / 3.0;
            let outward = centroid - center.coords;
            assert!(surface.normal(triangle).dot(&outward) > 0.0);
        }
    }

    #[test]
    fn shells_are_kept_and_beams_dropped() {
        let mut mesh = Mesh::new();
        mesh.add_node(Node::new(1, 0.0, 0.0, 0.0));
        mesh.add_node(Node::new(2, 1.0, 0.0, 0.0));
        mesh.add_node(Node::new(3, 1.0, 1.0, 0.0));
        mesh.add_node(Node::new(4, 0.0, 1.0, 0.0));
        mesh.add_element(Element::new(1, ElementShape::Quad4, vec![1, 2, 3, 4]))
            .unwrap();
        mesh.add_element(Element::new(2, ElementShape::Beam2, vec![1, 3]))
            .unwrap();

        let surface = Surface::extract(&mesh);
        assert_eq!(surface.triangle_count(), 2);
        assert!(surface.triangles.iter().all(|t| t.element == 0));
        let normal = surface.normal(&surface.triangles[0]);
        assert!((normal.z - 1.0).abs() < 1e-12);
    }
}
