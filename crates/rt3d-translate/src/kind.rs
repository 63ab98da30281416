//! Result-kind keywords.

use std::fmt;
use std::str::FromStr;

use rt3d_model::Quantity;

use crate::error::TranslateError;

/// One selectable result quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultKind {
    /// Displacement vector
    U,
    Ux,
    Uy,
    Uz,
    /// Displacement magnitude
    Usum,
    Sx,
    Sy,
    Sz,
    Sxy,
    Sxz,
    Syz,
    /// Maximum principal stress
    S1,
    /// Middle principal stress
    S2,
    /// Minimum principal stress
    S3,
    /// von Mises equivalent stress
    Seqv,
    /// Temperature
    Tmp,
}

impl ResultKind {
    pub const ALL: [ResultKind; 16] = [
        ResultKind::U,
        ResultKind::Ux,
        ResultKind::Uy,
        ResultKind::Uz,
        ResultKind::Usum,
        ResultKind::Sx,
        ResultKind::Sy,
        ResultKind::Sz,
        ResultKind::Sxy,
        ResultKind::Sxz,
        ResultKind::Syz,
        ResultKind::S1,
        ResultKind::S2,
        ResultKind::S3,
        ResultKind::Seqv,
        ResultKind::Tmp,
    ];

    /// Keyword used on the command line and in output file names
    pub fn keyword(self) -> &'static str {
        match self {
            ResultKind::U => "u",
            ResultKind::Ux => "ux",
            ResultKind::Uy => "uy",
            ResultKind::Uz => "uz",
            ResultKind::Usum => "usum",
            ResultKind::Sx => "sx",
            ResultKind::Sy => "sy",
            ResultKind::Sz => "sz",
            ResultKind::Sxy => "xy",
            ResultKind::Sxz => "xz",
            ResultKind::Syz => "yz",
            ResultKind::S1 => "s1",
            ResultKind::S2 => "s2",
            ResultKind::S3 => "s3",
            ResultKind::Seqv => "seqv",
            ResultKind::Tmp => "tmp",
        }
    }

    /// Base name of the selected field, also the exported attribute name
    pub fn label(self) -> &'static str {
        match self {
            ResultKind::U => "displacement",
            ResultKind::Ux => "displacement_x",
            ResultKind::Uy => "displacement_y",
            ResultKind::Uz => "displacement_z",
            ResultKind::Usum => "displacement_magnitude",
            ResultKind::Sx => "stress_xx",
            ResultKind::Sy => "stress_yy",
            ResultKind::Sz => "stress_zz",
            ResultKind::Sxy => "stress_xy",
            ResultKind::Sxz => "stress_xz",
            ResultKind::Syz => "stress_yz",
            ResultKind::S1 => "principal_stress_1",
            ResultKind::S2 => "principal_stress_2",
            ResultKind::S3 => "principal_stress_3",
            ResultKind::Seqv => "von_mises_stress",
            ResultKind::Tmp => "temperature",
        }
    }

    /// Archive quantity the kind is derived from
    pub fn quantity(self) -> Quantity {
        match self {
            ResultKind::U | ResultKind::Ux | ResultKind::Uy | ResultKind::Uz | ResultKind::Usum => {
                Quantity::Displacement
            }
            ResultKind::Tmp => Quantity::Temperature,
            _ => Quantity::Stress,
        }
    }

    /// Thermal kinds never deform the mesh
    pub fn is_thermal(self) -> bool {
        self.quantity() == Quantity::Temperature
    }

    /// Number of values per entity in the selected field
    pub fn components(self) -> usize {
        match self {
            ResultKind::U => 3,
            _ => 1,
        }
    }
}

impl fmt::Display for ResultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl FromStr for ResultKind {
    type Err = TranslateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ResultKind::ALL
            .into_iter()
            .find(|kind| kind.keyword() == wanted)
            .ok_or_else(|| TranslateError::UnsupportedResultKind(s.to_string()))
    }
}
