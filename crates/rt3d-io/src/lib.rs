//! I/O support for the rt3d result translator.
//!
//! This crate provides:
//! - **FRD (result file)** reader serving meshes and result fields
//! - **Postprocessing utilities** (von Mises, principal stresses)
//! - **Surface extraction** of volume meshes for polygon-only viewers
//! - **VTK export** for ParaView, plus a legacy VTK point reader
//! - **STL / OBJ / WRL export** of the colored boundary surface
//! - **Atomic output**: files appear only once fully written

mod atomic;
pub mod colormap;
pub mod error;
pub mod frd_reader;
pub mod obj_writer;
pub mod postprocess;
pub mod stl_writer;
pub mod surface;
pub mod vtk_writer;
pub mod wrl_writer;

pub use atomic::{AtomicFile, write_atomic};
pub use colormap::{ColorScale, UNDEFINED_COLOR};
pub use error::{IoError, Result};
pub use frd_reader::{FrdFile, FrdHeader, ResultBlock, ResultDataset};
pub use obj_writer::{DEFAULT_COLOR_BANDS, ObjWriter};
pub use postprocess::{
    PrincipalValues, TensorComponents, compute_mises_stress, compute_principal_stresses,
};
pub use stl_writer::write_stl;
pub use surface::{Surface, Triangle};
pub use vtk_writer::{VtkCellType, VtkWriter, read_vtk_points};
pub use wrl_writer::write_wrl;
