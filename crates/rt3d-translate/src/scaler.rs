//! Deflection scale factor.
//!
//! The displacement field is magnified so its peak reaches `percent` of the
//! mesh's largest extent:
//!
//! ```text
//! factor = (percent / 100) * characteristic_size / peak
//! ```

use rt3d_model::{Mesh, ResultField};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, TranslateError};

/// How the peak displacement is measured
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PeakMode {
    /// Largest positive per-component maximum
    #[default]
    AxisMax,
    /// Largest Euclidean norm over the support
    VectorNorm,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DeflectionScaler {
    mode: PeakMode,
}

impl DeflectionScaler {
    pub fn new(mode: PeakMode) -> Self {
        Self { mode }
    }

    /// Peak magnitude of `displacement` under the configured mode. Starts
    /// at zero, so fields without positive values have a zero peak in
    /// `AxisMax` mode.
    pub fn peak_magnitude(&self, displacement: &ResultField) -> f64 {
        match self.mode {
            PeakMode::AxisMax => (0..displacement.components())
                .filter_map(|c| displacement.component_max(c))
                .fold(0.0, f64::max),
            PeakMode::VectorNorm => displacement
                .iter()
                .map(|(_, v)| v.iter().map(|x| x * x).sum::<f64>().sqrt())
                .filter(|norm| !norm.is_nan())
                .fold(0.0, f64::max),
        }
    }

    /// Scale factor bringing the peak displacement to `percent` of the
    /// mesh's characteristic size
    pub fn scale(&self, mesh: &Mesh, displacement: &ResultField, percent: f64) -> Result<f64> {
        let peak = self.peak_magnitude(displacement);
        if peak == 0.0 || !peak.is_finite() {
            return Err(TranslateError::DegenerateField {
                field: displacement.name().to_string(),
                peak,
            });
        }

        let size = mesh.characteristic_size();
        let factor = (percent / 100.0) * size / peak;
        debug!(
            "deflection scale: size={} peak={} ({:?}) percent={} factor={}",
            size, peak, self.mode, percent, factor
        );
        // subnormal peaks or huge percentages overflow the ratio
        if !factor.is_finite() {
            return Err(TranslateError::DegenerateField {
                field: displacement.name().to_string(),
                peak,
            });
        }
        Ok(factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rt3d_model::{Node, ResultLocation};

    fn bar(length: f64) -> Mesh {
        let mut mesh = Mesh::new();
        mesh.add_node(Node::new(1, 0.0, 0.0, 0.0));
        mesh.add_node(Node::new(2, length, 0.0, 0.0));
        mesh.add_node(Node::new(3, 0.0, length / 10.0, 0.0));
        mesh
    }

    #[test]
    fn test_factor_from_size_and_peak() {
        let disp = ResultField::vector(
            "u",
            ResultLocation::Nodal,
            [(1, [0.0, 0.0, 0.0]), (2, [2.0, 0.0, 0.0])],
        );
        let factor = DeflectionScaler::default().scale(&bar(100.0), &disp, 10.0).unwrap();
        assert_relative_eq!(factor, 5.0);
    }

    #[test]
    fn test_axis_max_ignores_the_norm() {
        let disp = ResultField::vector("u", ResultLocation::Nodal, [(1, [3.0, 4.0, 0.0])]);
        assert_eq!(DeflectionScaler::new(PeakMode::AxisMax).peak_magnitude(&disp), 4.0);
        assert_eq!(DeflectionScaler::new(PeakMode::VectorNorm).peak_magnitude(&disp), 5.0);
    }

    #[test]
    fn test_negative_only_field_is_degenerate_under_axis_max() {
        let disp = ResultField::vector("u", ResultLocation::Nodal, [(1, [-1.0, -2.0, 0.0])]);
        let mesh = bar(10.0);

        let err = DeflectionScaler::new(PeakMode::AxisMax)
            .scale(&mesh, &disp, 10.0)
            .unwrap_err();
        assert!(matches!(err, TranslateError::DegenerateField { peak, .. } if peak == 0.0));

        let factor = DeflectionScaler::new(PeakMode::VectorNorm)
            .scale(&mesh, &disp, 10.0)
            .unwrap();
        assert_relative_eq!(factor, 0.1 * 10.0 / 5.0_f64.sqrt());
    }

    #[test]
    fn test_zero_peak_never_yields_infinity() {
        let disp = ResultField::vector("u", ResultLocation::Nodal, [(1, [0.0; 3]), (2, [0.0; 3])]);
        for percent in [0.0, 1.0, 250.0] {
            for mode in [PeakMode::AxisMax, PeakMode::VectorNorm] {
                let result = DeflectionScaler::new(mode).scale(&bar(3.0), &disp, percent);
                assert!(matches!(result, Err(TranslateError::DegenerateField { .. })));
            }
        }
    }

    #[test]
    fn test_empty_support_is_degenerate() {
        let disp = ResultField::new("u", ResultLocation::Nodal, 3);
        assert!(DeflectionScaler::default().scale(&bar(1.0), &disp, 5.0).is_err());
    }

    #[test]
    fn test_subnormal_peak_is_degenerate() {
        let disp = ResultField::vector(
            "u",
            ResultLocation::Nodal,
            [(1, [0.0; 3]), (2, [1e-310, 0.0, 0.0])],
        );
        for mode in [PeakMode::AxisMax, PeakMode::VectorNorm] {
            let err = DeflectionScaler::new(mode)
                .scale(&bar(100.0), &disp, 10.0)
                .unwrap_err();
            assert!(matches!(err, TranslateError::DegenerateField { peak, .. } if peak > 0.0));
        }
    }

    #[test]
    fn test_overflowing_percent_is_degenerate() {
        let disp = ResultField::vector("u", ResultLocation::Nodal, [(1, [1e-300, 0.0, 0.0])]);
        let result = DeflectionScaler::default().scale(&bar(1e10), &disp, f64::MAX);
        assert!(matches!(result, Err(TranslateError::DegenerateField { .. })));
    }
}
