//! Derived stress quantities
//!
//! Provides the scalar measures result translation can export from a raw
//! stress tensor:
//! - von Mises equivalent stress
//! - Principal stresses
//!
//! ## Usage
//!
//! ```rust
//! use rt3d_io::postprocess::{compute_mises_stress, TensorComponents};
//!
//! let stress = TensorComponents::from_voigt(&[100.0, 50.0, 25.0, 10.0, 5.0, 2.0]);
//! let mises = compute_mises_stress(&stress);
//! println!("von Mises stress: {}", mises);
//! ```

use nalgebra::Matrix3;

/// Stress tensor components (Voigt notation)
#[derive(Debug, Clone, Copy, Default)]
pub struct TensorComponents {
    /// Normal component XX
    pub xx: f64,
    /// Normal component YY
    pub yy: f64,
    /// Normal component ZZ
    pub zz: f64,
    /// Shear component XY
    pub xy: f64,
    /// Shear component YZ
    pub yz: f64,
    /// Shear component XZ
    pub xz: f64,
}

impl TensorComponents {
    /// Build from values ordered xx, yy, zz, xy, yz, xz (the FRD `STRESS`
    /// order). Missing trailing values are zero.
    pub fn from_voigt(values: &[f64]) -> Self {
        let at = |i: usize| values.get(i).copied().unwrap_or(0.0);
        Self {
            xx: at(0),
            yy: at(1),
            zz: at(2),
            xy: at(3),
            yz: at(4),
            xz: at(5),
        }
    }

    /// Symmetric 3×3 tensor
    pub fn to_matrix(&self) -> Matrix3<f64> {
        Matrix3::new(
            self.xx, self.xy, self.xz, //
            self.xy, self.yy, self.yz, //
            self.xz, self.yz, self.zz,
        )
    }
}

/// Principal values (eigenvalues of tensor)
#[derive(Debug, Clone, Copy)]
pub struct PrincipalValues {
    /// Maximum principal value
    pub max: f64,
    /// Middle principal value
    pub mid: f64,
    /// Minimum principal value
    pub min: f64,
}

/// Equivalent (von Mises) stress:
/// `sqrt(((xx-yy)² + (yy-zz)² + (zz-xx)²) / 2 + 3 (xy² + yz² + xz²))`
///
/// ```
/// use rt3d_io::postprocess::{compute_mises_stress, TensorComponents};
///
/// let uniaxial = TensorComponents::from_voigt(&[240.0]);
/// assert_eq!(compute_mises_stress(&uniaxial), 240.0);
/// ```
pub fn compute_mises_stress(stress: &TensorComponents) -> f64 {
    let TensorComponents {
        xx,
        yy,
        zz,
        xy,
        yz,
        xz,
    } = *stress;
    let normal = ((xx - yy).powi(2) + (yy - zz).powi(2) + (zz - xx).powi(2)) / 2.0;
    let shear = 3.0 * (xy * xy + yz * yz + xz * xz);
    (normal + shear).sqrt()
}

/// Principal stresses, ordered max/mid/min
pub fn compute_principal_stresses(stress: &TensorComponents) -> PrincipalValues {
    if stress.xy == 0.0 && stress.yz == 0.0 && stress.xz == 0.0 {
        return sorted([stress.xx, stress.yy, stress.zz]);
    }
    let eigen = stress.to_matrix().symmetric_eigenvalues();
    sorted([eigen[0], eigen[1], eigen[2]])
}

fn sorted(mut values: [f64; 3]) -> PrincipalValues {
    values.sort_by(|a, b| b.total_cmp(a));
    PrincipalValues {
        max: values[0],
        mid: values[1],
        min: values[2],
    }
}
