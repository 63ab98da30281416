use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use approx::assert_relative_eq;
use rt3d_io::{FrdFile, read_vtk_points};
use rt3d_model::{
    Element, ElementShape, MemoryRepository, Mesh, Node, Quantity, ResultField, ResultLocation,
    ResultRepository,
};
use rt3d_translate::{
    PeakMode, PipelineState, Previewer, ProgressSink, RequestForm, Scene, StressLocation,
    TranslateError, TranslationPipeline, TranslationRequest, TranslatorConfig,
};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../tests/fixtures")
        .join(name)
}

fn request(archive: &Path, set: u32, kind: &str, percent: f64, format: &str) -> TranslationRequest {
    RequestForm {
        result_set: Some(set.to_string()),
        percent: Some(percent.to_string()),
        result_kind: Some(kind.to_string()),
        result_file: Some(archive.to_path_buf()),
        output_format: Some(format.to_string()),
        output_root: Some("case".to_string()),
        plot: false,
    }
    .validate()
    .unwrap()
}

fn pipeline_into(dir: &Path) -> TranslationPipeline {
    TranslationPipeline::new(TranslatorConfig {
        output_dir: Some(dir.to_path_buf()),
        ..TranslatorConfig::default()
    })
}

/// Bar of length 100 along x with a side node at y = 10
fn bar_archive(displacement: [[f64; 3]; 3]) -> MemoryRepository {
    let mut mesh = Mesh::new();
    mesh.add_node(Node::new(1, 0.0, 0.0, 0.0));
    mesh.add_node(Node::new(2, 100.0, 0.0, 0.0));
    mesh.add_node(Node::new(3, 0.0, 10.0, 0.0));
    mesh.add_element(Element::new(1, ElementShape::Beam2, vec![1, 2]))
        .unwrap();
    mesh.add_element(Element::new(2, ElementShape::Beam2, vec![1, 3]))
        .unwrap();

    let field = ResultField::vector(
        "DISP",
        ResultLocation::Nodal,
        [(1, displacement[0]), (2, displacement[1]), (3, displacement[2])],
    );
    MemoryRepository::new(mesh).with_quantity(1, Quantity::Displacement, field)
}

fn undeformed_points(archive: &dyn ResultRepository) -> Vec<nalgebra::Point3<f64>> {
    archive.mesh().nodes().iter().map(|n| n.point()).collect()
}

#[test]
fn usum_at_ten_percent_scales_by_five_and_round_trips_through_vtk() {
    let dir = tempfile::tempdir().unwrap();
    let archive = bar_archive([[0.0; 3], [2.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
    let request = request(&dir.path().join("bar.frd"), 1, "usum", 10.0, "vtk");

    let mut progress: Vec<String> = Vec::new();
    let report = TranslationPipeline::default()
        .run(&request, &archive, &mut progress)
        .unwrap();

    assert_eq!(report.scale_factor, Some(5.0));
    let output = report.output.unwrap();
    assert_eq!(output, dir.path().join("case-usum-1.vtk"));

    let points = read_vtk_points(&output).unwrap();
    assert_eq!(points[0], nalgebra::Point3::new(0.0, 0.0, 0.0));
    assert_eq!(points[1], nalgebra::Point3::new(110.0, 0.0, 0.0));
    assert_eq!(points[2], nalgebra::Point3::new(0.0, 15.0, 0.0));

    let text = fs::read_to_string(&output).unwrap();
    assert!(text.contains("SCALARS displacement_magnitude double 1"));
}

#[test]
fn temperature_never_scales_and_keeps_coordinates() {
    let dir = tempfile::tempdir().unwrap();
    let archive_path = fixture("beam_block_thermal.frd");
    let request = request(&archive_path, 1, "tmp", 50.0, "vtk");

    let mut progress: Vec<String> = Vec::new();
    let report = pipeline_into(dir.path())
        .run_file(&request, &mut progress)
        .unwrap();

    assert_eq!(report.scale_factor, None);
    assert!(!report.states.contains(&PipelineState::Scaled));
    assert!(!report.states.contains(&PipelineState::Deformed));
    assert_eq!(report.defined, 12);

    let frd = FrdFile::from_file(&archive_path).unwrap();
    let points = read_vtk_points(report.output.unwrap()).unwrap();
    assert_eq!(points, undeformed_points(&frd));
    assert!(
        !progress
            .iter()
            .any(|l| l.contains("Calculating deflection distortion"))
    );
}

#[test]
fn stl_succeeds_with_an_entirely_undefined_attribute() {
    let dir = tempfile::tempdir().unwrap();
    let frd = FrdFile::from_file(fixture("beam_block.frd")).unwrap();
    let archive = MemoryRepository::new(frd.mesh.clone())
        .with_quantity(
            1,
            Quantity::Displacement,
            frd.quantity(1, Quantity::Displacement).unwrap(),
        )
        .with_quantity(
            1,
            Quantity::Stress,
            ResultField::new("STRESS", ResultLocation::Nodal, 6),
        );
    let request = request(&dir.path().join("beam.frd"), 1, "sx", 10.0, "stl");

    let mut progress: Vec<String> = Vec::new();
    let report = TranslationPipeline::default()
        .run(&request, &archive, &mut progress)
        .unwrap();

    assert_eq!(report.defined, 0);
    assert_eq!(report.entities, 12);
    let output = report.output.unwrap();
    let mut file = fs::File::open(&output).unwrap();
    assert_eq!(stl_io::read_stl(&mut file).unwrap().faces.len(), 20);
}

#[test]
fn displacement_scales_linearly_with_percent() {
    let archive_path = fixture("beam_block.frd");
    let frd = FrdFile::from_file(&archive_path).unwrap();
    let original = undeformed_points(&frd);

    let deformed_at = |percent: f64| {
        let dir = tempfile::tempdir().unwrap();
        let mut progress: Vec<String> = Vec::new();
        let report = pipeline_into(dir.path())
            .run_file(&request(&archive_path, 1, "ux", percent, "vtk"), &mut progress)
            .unwrap();
        read_vtk_points(report.output.unwrap()).unwrap()
    };
    let ten = deformed_at(10.0);
    let twenty = deformed_at(20.0);

    for i in 0..original.len() {
        let d10 = ten[i] - original[i];
        let d20 = twenty[i] - original[i];
        assert_relative_eq!(d20, d10 * 2.0, epsilon = 1e-9);
    }
    // node 3 sits at x = 2 with u = (0.002, 0, -0.04); factor 100 at 10 %
    assert_relative_eq!(ten[2].x, 2.2, epsilon = 1e-9);
    assert_relative_eq!(ten[2].z, -4.0, epsilon = 1e-9);
}

#[test]
fn zero_percent_exports_the_undeformed_mesh() {
    let dir = tempfile::tempdir().unwrap();
    let archive_path = fixture("beam_block.frd");
    let frd = FrdFile::from_file(&archive_path).unwrap();

    let mut progress: Vec<String> = Vec::new();
    let report = pipeline_into(dir.path())
        .run_file(&request(&archive_path, 2, "u", 0.0, "vtk"), &mut progress)
        .unwrap();

    assert_eq!(report.scale_factor, None);
    let points = read_vtk_points(report.output.unwrap()).unwrap();
    assert_eq!(points, undeformed_points(&frd));
}

#[test]
fn zero_displacement_is_degenerate_and_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let archive = bar_archive([[0.0; 3]; 3]);

    for percent in [1.0, 10.0, 100.0] {
        let request = request(&dir.path().join("bar.frd"), 1, "u", percent, "obj");
        let mut progress: Vec<String> = Vec::new();
        let err = TranslationPipeline::default()
            .run(&request, &archive, &mut progress)
            .unwrap_err();

        assert!(matches!(err, TranslateError::DegenerateField { .. }));
        assert!(progress.iter().any(|l| l == "    ERROR"));
    }
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn peak_mode_changes_the_factor() {
    let archive_path = fixture("beam_block.frd");
    let frd = FrdFile::from_file(&archive_path).unwrap();
    let request = request(&archive_path, 1, "usum", 10.0, "none");

    let run = |mode: PeakMode| {
        let pipeline = TranslationPipeline::new(TranslatorConfig {
            peak_mode: mode,
            ..TranslatorConfig::default()
        });
        let mut progress: Vec<String> = Vec::new();
        pipeline
            .run(&request, &frd, &mut progress)
            .unwrap()
            .scale_factor
            .unwrap()
    };

    // axis-max peak 0.002 from ux; the norm also sees uz = -0.04
    assert_relative_eq!(run(PeakMode::AxisMax), 100.0, epsilon = 1e-9);
    let norm_peak = (0.002_f64.powi(2) + 0.04_f64.powi(2)).sqrt();
    assert_relative_eq!(run(PeakMode::VectorNorm), 0.2 / norm_peak, epsilon = 1e-9);
}

#[test]
fn elemental_von_mises_to_obj_with_materials() {
    let dir = tempfile::tempdir().unwrap();
    let archive_path = fixture("beam_block.frd");
    let pipeline = TranslationPipeline::new(TranslatorConfig {
        stress_location: StressLocation::Elemental,
        output_dir: Some(dir.path().to_path_buf()),
        color_bands: 4,
        ..TranslatorConfig::default()
    });

    let mut progress: Vec<String> = Vec::new();
    let report = pipeline
        .run_file(&request(&archive_path, 1, "seqv", 10.0, "obj"), &mut progress)
        .unwrap();

    assert_eq!(report.field, "von_mises_stress_set1");
    assert_eq!(report.entities, 2);
    assert_eq!(report.defined, 2);

    let output = report.output.unwrap();
    assert_eq!(output, dir.path().join("case-seqv-1.obj"));
    let obj = fs::read_to_string(&output).unwrap();
    assert!(obj.contains("# attribute: von_mises_stress (elemental)"));
    assert!(obj.contains("mtllib case-seqv-1.mtl"));
    assert!(dir.path().join("case-seqv-1.mtl").exists());
}

struct RecordingPreviewer {
    triangles: Rc<RefCell<Vec<usize>>>,
}

impl Previewer for RecordingPreviewer {
    fn show(&self, scene: &Scene, sink: &mut dyn ProgressSink) {
        self.triangles.borrow_mut().push(scene.surface.triangle_count());
        sink.line("preview shown");
    }
}

#[test]
fn plot_flag_previews_before_export() {
    let dir = tempfile::tempdir().unwrap();
    let archive_path = fixture("beam_block.frd");
    let triangles = Rc::new(RefCell::new(Vec::new()));
    let pipeline = pipeline_into(dir.path()).with_previewer(Box::new(RecordingPreviewer {
        triangles: Rc::clone(&triangles),
    }));

    let mut form = RequestForm {
        result_set: Some("2".to_string()),
        percent: Some("5".to_string()),
        result_kind: Some("uz".to_string()),
        result_file: Some(archive_path),
        output_format: Some("wrl".to_string()),
        output_root: Some("case".to_string()),
        plot: true,
    };
    let mut progress: Vec<String> = Vec::new();
    let report = pipeline
        .run_file(&form.validate().unwrap(), &mut progress)
        .unwrap();

    assert_eq!(*triangles.borrow(), vec![20]);
    let shown = progress.iter().position(|l| l == "preview shown").unwrap();
    let exported = progress
        .iter()
        .position(|l| l == "++ Making output file")
        .unwrap();
    assert!(shown < exported);
    assert_eq!(
        report.states,
        vec![
            PipelineState::Idle,
            PipelineState::FieldSelected,
            PipelineState::Scaled,
            PipelineState::Deformed,
            PipelineState::Mapped,
            PipelineState::Exported,
            PipelineState::Idle,
        ]
    );

    // without the flag nothing is previewed
    form.plot = false;
    pipeline
        .run_file(&form.validate().unwrap(), &mut progress)
        .unwrap();
    assert_eq!(triangles.borrow().len(), 1);
}

#[test]
fn missing_archive_fails_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let mut progress: Vec<String> = Vec::new();
    let err = pipeline_into(dir.path())
        .run_file(
            &request(&dir.path().join("absent.frd"), 1, "u", 10.0, "vtk"),
            &mut progress,
        )
        .unwrap_err();
    assert!(matches!(err, TranslateError::Io(_)));
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn overflowing_scale_factor_fails_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let archive = bar_archive([[0.0; 3], [1e-310, 0.0, 0.0], [0.0; 3]]);
    let request = request(&dir.path().join("bar.frd"), 1, "usum", 10.0, "vtk");

    let mut progress: Vec<String> = Vec::new();
    let err = TranslationPipeline::default()
        .run(&request, &archive, &mut progress)
        .unwrap_err();

    assert!(matches!(err, TranslateError::DegenerateField { .. }));
    assert!(!progress.iter().any(|l| l.starts_with("   Scale factor")));
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn archive_stays_usable_after_a_failed_request() {
    let dir = tempfile::tempdir().unwrap();
    let archive_path = fixture("beam_block.frd");
    let frd = FrdFile::from_file(&archive_path).unwrap();
    let original = undeformed_points(&frd);
    let pipeline = pipeline_into(dir.path());
    let mut progress: Vec<String> = Vec::new();

    let err = pipeline
        .run(&request(&archive_path, 3, "seqv", 10.0, "vtk"), &frd, &mut progress)
        .unwrap_err();
    assert!(matches!(err, TranslateError::ResultNotFound(_)));
    // stress only exists in set 1
    let err = pipeline
        .run(&request(&archive_path, 2, "seqv", 10.0, "vtk"), &frd, &mut progress)
        .unwrap_err();
    assert!(matches!(err, TranslateError::ResultNotFound(_)));
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);

    let report = pipeline
        .run(&request(&archive_path, 1, "usum", 10.0, "vtk"), &frd, &mut progress)
        .unwrap();
    assert_eq!(report.output, Some(dir.path().join("case-usum-1.vtk")));
    assert_relative_eq!(report.scale_factor.unwrap(), 100.0, epsilon = 1e-9);

    let points = read_vtk_points(report.output.unwrap()).unwrap();
    assert_eq!(points.len(), original.len());
    assert_relative_eq!(points[2].x, 2.2, epsilon = 1e-9);
    assert_relative_eq!(points[2].z, -4.0, epsilon = 1e-9);
    assert_eq!(points[0], original[0]);

    // the archive's own mesh is never deformed
    assert_eq!(undeformed_points(&frd), original);
}

#[test]
fn thermal_archive_recovers_after_a_structural_request() {
    let dir = tempfile::tempdir().unwrap();
    let archive_path = fixture("beam_block_thermal.frd");
    let frd = FrdFile::from_file(&archive_path).unwrap();
    let pipeline = pipeline_into(dir.path());
    let mut progress: Vec<String> = Vec::new();

    let err = pipeline
        .run(&request(&archive_path, 1, "seqv", 10.0, "obj"), &frd, &mut progress)
        .unwrap_err();
    assert!(matches!(err, TranslateError::ResultNotFound(_)));

    let report = pipeline
        .run(&request(&archive_path, 1, "tmp", 10.0, "vtk"), &frd, &mut progress)
        .unwrap();
    assert_eq!(report.defined, 12);
    let points = read_vtk_points(report.output.unwrap()).unwrap();
    assert_eq!(points, undeformed_points(&frd));
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}
