use crate::element::ReferenceElement;
use serde::{Deserialize, Serialize};
use std::ops::{Deref, DerefMut};

pub trait Connectivity: Clone {
    fn reference_element(&self) -> ReferenceElement;

    fn vertex_indices(&self) -> &[usize];

    fn num_faces(&self) -> usize {
        self.reference_element().num_faces()
    }

    /// Global vertex indices of the given face, ordered so that the face normal points out
    /// of the cell.
    fn get_face_connectivity(&self, index: usize) -> Option<Vec<usize>> {
        let local = self.reference_element().face_vertices(index)?;
        let vertices = self.vertex_indices();
        Some(local.iter().map(|&i| vertices[i]).collect())
    }
}

/// Connectivity for a two-dimensional bilinear quadrilateral.
///
/// Vertices are ordered counter-clockwise, see [`ReferenceElement::Quad4`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quad4d2Connectivity(pub [usize; 4]);

impl Connectivity for Quad4d2Connectivity {
    fn reference_element(&self) -> ReferenceElement {
        ReferenceElement::Quad4
    }

    fn vertex_indices(&self) -> &[usize] {
        &self.0
    }
}

impl Deref for Quad4d2Connectivity {
    type Target = [usize; 4];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Quad4d2Connectivity {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

/// Connectivity for a trilinear hexahedron, see [`ReferenceElement::Hex8`] for the ordering.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hex8Connectivity(pub [usize; 8]);

impl Connectivity for Hex8Connectivity {
    fn reference_element(&self) -> ReferenceElement {
        ReferenceElement::Hex8
    }

    fn vertex_indices(&self) -> &[usize] {
        &self.0
    }
}

impl Deref for Hex8Connectivity {
    type Target = [usize; 8];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Hex8Connectivity {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}
