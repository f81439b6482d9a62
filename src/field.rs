//! The unknowns of the mixed poroelastic model.
use serde::{Deserialize, Serialize};
use std::fmt;

/// Spatial dimension of the model.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dimension {
    Two,
    Three,
}

impl Dimension {
    pub fn dim(&self) -> usize {
        match self {
            Self::Two => 2,
            Self::Three => 3,
        }
    }
}

impl Default for Dimension {
    fn default() -> Self {
        Self::Two
    }
}

/// The group a field belongs to. Boundary passes operate on whole groups.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldGroup {
    Displacement,
    Pressure,
    Seepage,
}

/// A scalar unknown of the model.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Field {
    SolidX,
    SolidY,
    SolidZ,
    Pressure,
    SeepageX,
    SeepageY,
    SeepageZ,
}

const ORDER_2D: [Field; 5] = [
    Field::SolidX,
    Field::SolidY,
    Field::Pressure,
    Field::SeepageX,
    Field::SeepageY,
];

const ORDER_3D: [Field; 7] = [
    Field::SolidX,
    Field::SolidY,
    Field::SolidZ,
    Field::Pressure,
    Field::SeepageX,
    Field::SeepageY,
    Field::SeepageZ,
];

impl Field {
    /// The fields active in the given dimension, in the fixed model order:
    /// solid components, pressure, seepage components.
    pub fn ordered(dimension: Dimension) -> &'static [Field] {
        match dimension {
            Dimension::Two => &ORDER_2D,
            Dimension::Three => &ORDER_3D,
        }
    }

    /// The solid displacement/velocity components in the given dimension.
    pub fn solid(dimension: Dimension) -> &'static [Field] {
        &Self::ordered(dimension)[..dimension.dim()]
    }

    /// The seepage velocity components in the given dimension.
    pub fn seepage(dimension: Dimension) -> &'static [Field] {
        &Self::ordered(dimension)[dimension.dim() + 1..]
    }

    pub fn group(&self) -> FieldGroup {
        match self {
            Self::SolidX | Self::SolidY | Self::SolidZ => FieldGroup::Displacement,
            Self::Pressure => FieldGroup::Pressure,
            Self::SeepageX | Self::SeepageY | Self::SeepageZ => FieldGroup::Seepage,
        }
    }

    /// Spatial component of vector-valued fields. The pressure has component 0.
    pub fn component(&self) -> usize {
        match self {
            Self::SolidX | Self::SeepageX | Self::Pressure => 0,
            Self::SolidY | Self::SeepageY => 1,
            Self::SolidZ | Self::SeepageZ => 2,
        }
    }

    /// Position of the field in [`Field::ordered`] for the given dimension, if active.
    pub fn index_in(&self, dimension: Dimension) -> Option<usize> {
        Self::ordered(dimension).iter().position(|f| f == self)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::SolidX => "s_u",
            Self::SolidY => "s_v",
            Self::SolidZ => "s_w",
            Self::Pressure => "s_p",
            Self::SeepageX => "x",
            Self::SeepageY => "y",
            Self::SeepageZ => "z",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
