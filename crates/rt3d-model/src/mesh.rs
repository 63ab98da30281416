//! Mesh data structures for result translation.
//!
//! Nodes and elements keep the solver's integer ids but are stored in insertion
//! order, so every consumer (deformer, mapper, writers) sees the same stable
//! entity ordering. Lookups by id go through a side index.

use std::collections::HashMap;

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// A node in the finite element mesh
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Node ID (1-based numbering from the result file)
    pub id: i32,
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
    /// Z coordinate
    pub z: f64,
}

impl Node {
    /// Create a new node
    pub fn new(id: i32, x: f64, y: f64, z: f64) -> Self {
        Self { id, x, y, z }
    }

    /// Get coordinates as an array
    pub fn coords(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    pub fn point(&self) -> Point3<f64> {
        Point3::new(self.x, self.y, self.z)
    }

    /// Move the node by `delta`
    pub fn translate(&mut self, delta: &Vector3<f64>) {
        self.x += delta.x;
        self.y += delta.y;
        self.z += delta.z;
    }
}

/// Element shape, independent of the element formulation used by the solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementShape {
    /// 8-node hexahedron
    Hex8,
    /// 6-node wedge
    Wedge6,
    /// 4-node tetrahedron
    Tet4,
    /// 20-node hexahedron
    Hex20,
    /// 15-node wedge
    Wedge15,
    /// 10-node tetrahedron
    Tet10,
    /// 3-node triangle (shell/membrane)
    Tri3,
    /// 6-node triangle (shell/membrane)
    Tri6,
    /// 4-node quadrilateral (shell/membrane)
    Quad4,
    /// 8-node quadrilateral (shell/membrane)
    Quad8,
    /// 2-node beam or truss
    Beam2,
    /// 3-node beam or truss
    Beam3,
}

const HEX_FACES: &[&[usize]] = &[
    &[0, 3, 2, 1],
    &[4, 5, 6, 7],
    &[0, 1, 5, 4],
    &[1, 2, 6, 5],
    &[2, 3, 7, 6],
    &[3, 0, 4, 7],
];
const WEDGE_FACES: &[&[usize]] = &[
    &[0, 2, 1],
    &[3, 4, 5],
    &[0, 1, 4, 3],
    &[1, 2, 5, 4],
    &[2, 0, 3, 5],
];
const TET_FACES: &[&[usize]] = &[&[0, 2, 1], &[0, 1, 3], &[1, 2, 3], &[2, 0, 3]];
const TRI_FACES: &[&[usize]] = &[&[0, 1, 2]];
const QUAD_FACES: &[&[usize]] = &[&[0, 1, 2, 3]];

impl ElementShape {
    /// Get the number of nodes for this shape
    pub fn num_nodes(self) -> usize {
        match self {
            ElementShape::Hex8 => 8,
            ElementShape::Wedge6 => 6,
            ElementShape::Tet4 => 4,
            ElementShape::Hex20 => 20,
            ElementShape::Wedge15 => 15,
            ElementShape::Tet10 => 10,
            ElementShape::Tri3 => 3,
            ElementShape::Tri6 => 6,
            ElementShape::Quad4 => 4,
            ElementShape::Quad8 => 8,
            ElementShape::Beam2 => 2,
            ElementShape::Beam3 => 3,
        }
    }

    /// Map an FRD element type code (cgx manual, § 11) to a shape
    pub fn from_frd_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(ElementShape::Hex8),
            2 => Some(ElementShape::Wedge6),
            3 => Some(ElementShape::Tet4),
            4 => Some(ElementShape::Hex20),
            5 => Some(ElementShape::Wedge15),
            6 => Some(ElementShape::Tet10),
            7 => Some(ElementShape::Tri3),
            8 => Some(ElementShape::Tri6),
            9 => Some(ElementShape::Quad4),
            10 => Some(ElementShape::Quad8),
            11 => Some(ElementShape::Beam2),
            12 => Some(ElementShape::Beam3),
            _ => None,
        }
    }

    pub fn is_solid(self) -> bool {
        matches!(
            self,
            ElementShape::Hex8
                | ElementShape::Wedge6
                | ElementShape::Tet4
                | ElementShape::Hex20
                | ElementShape::Wedge15
                | ElementShape::Tet10
        )
    }

    pub fn is_shell(self) -> bool {
        matches!(
            self,
            ElementShape::Tri3 | ElementShape::Tri6 | ElementShape::Quad4 | ElementShape::Quad8
        )
    }

    /// Faces of the element as local corner-node indices, oriented outward
    /// for solids. Higher-order shapes reuse their linear counterpart since
    /// corner nodes come first. Line elements have no faces.
    pub fn corner_faces(self) -> &'static [&'static [usize]] {
        match self {
            ElementShape::Hex8 | ElementShape::Hex20 => HEX_FACES,
            ElementShape::Wedge6 | ElementShape::Wedge15 => WEDGE_FACES,
            ElementShape::Tet4 | ElementShape::Tet10 => TET_FACES,
            ElementShape::Tri3 | ElementShape::Tri6 => TRI_FACES,
            ElementShape::Quad4 | ElementShape::Quad8 => QUAD_FACES,
            ElementShape::Beam2 | ElementShape::Beam3 => &[],
        }
    }
}

/// An element in the finite element mesh
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Element ID (1-based numbering from the result file)
    pub id: i32,
    pub shape: ElementShape,
    /// Node connectivity (node IDs)
    pub nodes: Vec<i32>,
}

impl Element {
    /// Create a new element
    pub fn new(id: i32, shape: ElementShape, nodes: Vec<i32>) -> Self {
        Self { id, shape, nodes }
    }

    /// Validate that the element has the correct number of nodes
    pub fn validate(&self) -> Result<(), String> {
        let expected = self.shape.num_nodes();
        let actual = self.nodes.len();
        if actual != expected {
            return Err(format!(
                "Element {} of shape {:?} has {} nodes but expected {}",
                self.id, self.shape, actual, expected
            ));
        }
        Ok(())
    }
}

/// Complete finite element mesh
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    nodes: Vec<Node>,
    elements: Vec<Element>,
    node_index: HashMap<i32, usize>,
    element_index: HashMap<i32, usize>,
}

impl Mesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node to the mesh. A node with an existing id replaces the old
    /// coordinates in place.
    pub fn add_node(&mut self, node: Node) {
        match self.node_index.get(&node.id) {
            Some(&pos) => self.nodes[pos] = node,
            None => {
                self.node_index.insert(node.id, self.nodes.len());
                self.nodes.push(node);
            }
        }
    }

    /// Add an element to the mesh
    pub fn add_element(&mut self, element: Element) -> Result<(), String> {
        element.validate()?;
        match self.element_index.get(&element.id) {
            Some(&pos) => self.elements[pos] = element,
            None => {
                self.element_index.insert(element.id, self.elements.len());
                self.elements.push(element);
            }
        }
        Ok(())
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Get a node by ID
    pub fn get_node(&self, id: i32) -> Option<&Node> {
        self.node_index.get(&id).map(|&pos| &self.nodes[pos])
    }

    /// Get an element by ID
    pub fn get_element(&self, id: i32) -> Option<&Element> {
        self.element_index.get(&id).map(|&pos| &self.elements[pos])
    }

    /// Position of a node id in mesh order
    pub fn node_position(&self, id: i32) -> Option<usize> {
        self.node_index.get(&id).copied()
    }

    /// Position of an element id in mesh order
    pub fn element_position(&self, id: i32) -> Option<usize> {
        self.element_index.get(&id).copied()
    }

    /// Translate the node at `position`. Ids and ordering are untouched.
    pub fn translate_node(&mut self, position: usize, delta: &Vector3<f64>) {
        if let Some(node) = self.nodes.get_mut(position) {
            node.translate(delta);
        }
    }

    /// Validate the mesh
    pub fn validate(&self) -> Result<(), String> {
        for element in &self.elements {
            for &node_id in &element.nodes {
                if !self.node_index.contains_key(&node_id) {
                    return Err(format!(
                        "Element {} references non-existent node {}",
                        element.id, node_id
                    ));
                }
            }
        }
        Ok(())
    }

    /// Axis-aligned bounding box, `None` for an empty mesh
    pub fn bounding_box(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let first = self.nodes.first()?.point();
        let bounds = self.nodes.iter().fold((first, first), |(min, max), node| {
            let p = node.point();
            (min.inf(&p), max.sup(&p))
        });
        Some(bounds)
    }

    /// Largest extent of the mesh along any single coordinate axis
    pub fn characteristic_size(&self) -> f64 {
        self.bounding_box()
            .map(|(min, max)| (max - min).max())
            .unwrap_or(0.0)
    }

    /// Get mesh statistics
    pub fn statistics(&self) -> MeshStatistics {
        let mut shape_counts = HashMap::new();
        for element in &self.elements {
            *shape_counts.entry(element.shape).or_insert(0) += 1;
        }

        MeshStatistics {
            num_nodes: self.nodes.len(),
            num_elements: self.elements.len(),
            characteristic_size: self.characteristic_size(),
            shape_counts,
        }
    }
}

/// Mesh statistics for reporting
#[derive(Debug, Clone)]
pub struct MeshStatistics {
    /// Total number of nodes
    pub num_nodes: usize,
    /// Total number of elements
    pub num_elements: usize,
    /// Largest axis extent
    pub characteristic_size: f64,
    /// Count of each element shape
    pub shape_counts: HashMap<ElementShape, usize>,
}

impl MeshStatistics {
    /// Format as a human-readable string
    pub fn format(&self) -> String {
        let mut lines = vec![
            format!("Nodes: {}", self.num_nodes),
            format!("Elements: {}", self.num_elements),
            format!("Characteristic size: {}", self.characteristic_size),
        ];

        if !self.shape_counts.is_empty() {
            lines.push("Element shapes:".to_string());
            let mut shapes: Vec<_> = self.shape_counts.iter().collect();
            shapes.sort_by_key(|(k, _)| format!("{:?}", k));
            for (shape, count) in shapes {
                lines.push(format!("  {:?}: {}", shape, count));
            }
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_cube() -> Mesh {
        let mut mesh = Mesh::new();
        let corners = [
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
            [1.0, 0.0, 1.0],
            [1.0, 1.0, 1.0],
            [0.0, 1.0, 1.0],
        ];
        for (i, c) in corners.iter().enumerate() {
            mesh.add_node(Node::new(i as i32 + 1, c[0], c[1], c[2]));
        }
        mesh.add_element(Element::new(1, ElementShape::Hex8, (1..=8).collect()))
            .unwrap();
        mesh
    }

    #[test]
    fn node_creation() {
        let node = Node::new(1, 0.0, 0.0, 0.0);
        assert_eq!(node.id, 1);
        assert_eq!(node.coords(), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn frd_codes_map_to_shapes() {
        assert_eq!(ElementShape::from_frd_code(1), Some(ElementShape::Hex8));
        assert_eq!(ElementShape::from_frd_code(6), Some(ElementShape::Tet10));
        assert_eq!(ElementShape::from_frd_code(11), Some(ElementShape::Beam2));
        assert_eq!(ElementShape::from_frd_code(42), None);
        assert_eq!(ElementShape::Hex20.num_nodes(), 20);
        assert!(ElementShape::Beam3.corner_faces().is_empty());
    }

    #[test]
    fn element_validation() {
        let elem = Element::new(1, ElementShape::Hex8, vec![1, 2, 3, 4, 5, 6, 7, 8]);
        assert!(elem.validate().is_ok());

        let bad_elem = Element::new(2, ElementShape::Hex8, vec![1, 2, 3]);
        assert!(bad_elem.validate().is_err());
    }

    #[test]
    fn mesh_keeps_insertion_order() {
        let mut mesh = Mesh::new();
        mesh.add_node(Node::new(10, 0.0, 0.0, 0.0));
        mesh.add_node(Node::new(3, 1.0, 0.0, 0.0));
        mesh.add_node(Node::new(7, 2.0, 0.0, 0.0));

        let ids: Vec<i32> = mesh.nodes().iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![10, 3, 7]);
        assert_eq!(mesh.node_position(3), Some(1));
        assert_eq!(mesh.node_position(4), None);
    }

    #[test]
    fn duplicate_node_id_replaces_coordinates() {
        let mut mesh = Mesh::new();
        mesh.add_node(Node::new(1, 0.0, 0.0, 0.0));
        mesh.add_node(Node::new(1, 5.0, 0.0, 0.0));
        assert_eq!(mesh.node_count(), 1);
        assert_eq!(mesh.get_node(1).unwrap().x, 5.0);
    }

    #[test]
    fn mesh_validates_element_nodes() {
        let mut mesh = Mesh::new();
        mesh.add_node(Node::new(1, 0.0, 0.0, 0.0));
        mesh.add_node(Node::new(2, 1.0, 0.0, 0.0));

        mesh.add_element(Element::new(1, ElementShape::Beam2, vec![1, 3]))
            .unwrap();

        let result = mesh.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("non-existent node 3"));
    }

    #[test]
    fn characteristic_size_is_largest_axis_extent() {
        let mut mesh = Mesh::new();
        mesh.add_node(Node::new(1, -2.0, 0.0, 0.0));
        mesh.add_node(Node::new(2, 3.0, 10.0, 1.0));
        mesh.add_node(Node::new(3, 0.0, 4.0, -1.0));
        assert_eq!(mesh.characteristic_size(), 10.0);
        assert_eq!(Mesh::new().characteristic_size(), 0.0);
    }

    #[test]
    fn translate_node_moves_only_target() {
        let mut mesh = unit_cube();
        mesh.translate_node(6, &Vector3::new(0.5, 0.0, -0.5));
        assert_eq!(mesh.nodes()[6].coords(), [1.5, 1.0, 0.5]);
        assert_eq!(mesh.nodes()[0].coords(), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn mesh_statistics() {
        let stats = unit_cube().statistics();
        assert_eq!(stats.num_nodes, 8);
        assert_eq!(stats.num_elements, 1);
        assert_eq!(stats.shape_counts.get(&ElementShape::Hex8), Some(&1));
        assert!(stats.format().contains("Hex8: 1"));
    }
}
