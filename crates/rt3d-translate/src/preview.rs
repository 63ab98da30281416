//! Renderable scenes for the optional preview step.

use rt3d_io::{ColorScale, Surface, UNDEFINED_COLOR};
use rt3d_model::{DenseAttribute, Mesh, ResultLocation};
use tracing::info;

use crate::progress::ProgressSink;

/// Color binding of a scene
#[derive(Debug, Clone, PartialEq)]
pub enum SceneColors {
    /// One color per surface vertex
    PerVertex(Vec<[f32; 3]>),
    /// One color per surface triangle
    PerFace(Vec<[f32; 3]>),
}

/// Deformed surface with result colors
#[derive(Debug, Clone)]
pub struct Scene {
    pub surface: Surface,
    pub colors: Option<SceneColors>,
    pub attribute_name: Option<String>,
    /// Finite range of the attribute magnitude
    pub range: Option<(f64, f64)>,
}

impl Scene {
    pub fn build(mesh: &Mesh, attribute: Option<&DenseAttribute>) -> Self {
        let surface = Surface::extract(mesh);
        let Some(attribute) = attribute else {
            return Self {
                surface,
                colors: None,
                attribute_name: None,
                range: None,
            };
        };

        let scale = ColorScale::for_attribute(attribute);
        let color_of = |index: usize| match scale {
            Some(scale) => scale.color(attribute.magnitude(index)),
            None => UNDEFINED_COLOR,
        };
        let colors = match attribute.location {
            ResultLocation::Nodal => Some(SceneColors::PerVertex(
                (0..surface.vertices.len()).map(color_of).collect(),
            )),
            ResultLocation::Elemental => Some(SceneColors::PerFace(
                surface.triangles.iter().map(|t| color_of(t.element)).collect(),
            )),
            ResultLocation::ElementNodal => None,
        };

        Self {
            surface,
            colors,
            attribute_name: Some(attribute.name.clone()),
            range: scale.map(|s| (s.min, s.max)),
        }
    }
}

/// Displays a scene before the output file is written
pub trait Previewer {
    fn show(&self, scene: &Scene, sink: &mut dyn ProgressSink);
}

/// Previewer that only reports what would be rendered
#[derive(Debug, Clone, Copy, Default)]
pub struct LogPreviewer;

impl Previewer for LogPreviewer {
    fn show(&self, scene: &Scene, sink: &mut dyn ProgressSink) {
        let name = scene.attribute_name.as_deref().unwrap_or("geometry");
        let range = match scene.range {
            Some((min, max)) => format!("{} .. {}", min, max),
            None => "undefined".to_string(),
        };
        info!(
            "preview scene: {} vertices, {} triangles, {} in [{}]",
            scene.surface.vertices.len(),
            scene.surface.triangle_count(),
            name,
            range
        );
        sink.line(&format!(
            "   Preview: {} triangles, {} range {}",
            scene.surface.triangle_count(),
            name,
            range
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rt3d_model::{Element, ElementShape, Node};

    fn quad() -> Mesh {
        let mut mesh = Mesh::new();
        mesh.add_node(Node::new(1, 0.0, 0.0, 0.0));
        mesh.add_node(Node::new(2, 1.0, 0.0, 0.0));
        mesh.add_node(Node::new(3, 1.0, 1.0, 0.0));
        mesh.add_node(Node::new(4, 0.0, 1.0, 0.0));
        mesh.add_element(Element::new(1, ElementShape::Quad4, vec![1, 2, 3, 4]))
            .unwrap();
        mesh
    }

    #[test]
    fn nodal_attribute_colors_vertices() {
        let attribute = DenseAttribute {
            name: "temperature".to_string(),
            location: ResultLocation::Nodal,
            components: 1,
            values: vec![0.0, 1.0, 2.0, f64::NAN],
        };
        let scene = Scene::build(&quad(), Some(&attribute));

        assert_eq!(scene.range, Some((0.0, 2.0)));
        match scene.colors {
            Some(SceneColors::PerVertex(colors)) => {
                assert_eq!(colors.len(), 4);
                assert_eq!(colors[3], UNDEFINED_COLOR);
            }
            other => panic!("unexpected colors {:?}", other),
        }
    }

    #[test]
    fn elemental_attribute_colors_faces() {
        let attribute = DenseAttribute::undefined("seqv", ResultLocation::Elemental, 1, 1);
        let scene = Scene::build(&quad(), Some(&attribute));
        assert_eq!(
            scene.colors,
            Some(SceneColors::PerFace(vec![UNDEFINED_COLOR; 2]))
        );
        assert_eq!(scene.range, None);
    }

    #[test]
    fn log_previewer_reports_to_the_sink() {
        let scene = Scene::build(&quad(), None);
        let mut lines: Vec<String> = Vec::new();
        LogPreviewer.show(&scene, &mut lines);
        assert_eq!(lines, vec!["   Preview: 2 triangles, geometry range undefined"]);
    }
}
