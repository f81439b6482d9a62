//! Reference elements with multilinear geometry.
//!
//! Quadrilaterals live on the reference domain `[-1, 1]^2` and hexahedra on `[-1, 1]^3`.
//! All points and gradients are stored as 3-vectors; two-dimensional elements simply have a
//! vanishing third component, which keeps the assembly code free of dimension generics.
use crate::field::Dimension;
use nalgebra::{Matrix3, Point3, Vector3};
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceElement {
    /// Bilinear quadrilateral.
    ///
    /// ```text
    /// 3_________2
    /// |         |
    /// |         |
    /// |         |
    /// 0_________1
    /// ```
    Quad4,
    /// Trilinear hexahedron. Nodes 0-3 form the bottom face (`z = -1`) in the same order as
    /// [`ReferenceElement::Quad4`], nodes 4-7 the top face.
    Hex8,
}

#[rustfmt::skip]
const QUAD4_VERTICES: [[f64; 3]; 4] = [
    [-1.0, -1.0, 0.0],
    [ 1.0, -1.0, 0.0],
    [ 1.0,  1.0, 0.0],
    [-1.0,  1.0, 0.0],
];

#[rustfmt::skip]
const HEX8_VERTICES: [[f64; 3]; 8] = [
    [-1.0, -1.0, -1.0],
    [ 1.0, -1.0, -1.0],
    [ 1.0,  1.0, -1.0],
    [-1.0,  1.0, -1.0],
    [-1.0, -1.0,  1.0],
    [ 1.0, -1.0,  1.0],
    [ 1.0,  1.0,  1.0],
    [-1.0,  1.0,  1.0],
];

// Faces are listed so that their vertex order, together with the right-hand rule,
// gives the exterior normal.
const QUAD4_FACES: [&[usize]; 4] = [&[0, 1], &[1, 2], &[2, 3], &[3, 0]];
const HEX8_FACES: [&[usize]; 6] = [
    &[3, 2, 1, 0],
    &[0, 1, 5, 4],
    &[1, 2, 6, 5],
    &[2, 3, 7, 6],
    &[4, 7, 3, 0],
    &[5, 6, 7, 4],
];

/// Linear Lagrange function on `[-1, 1]` with value 1 at `alpha` (either -1 or 1).
pub fn phi_linear_1d(alpha: f64, xi: f64) -> f64 {
    (1.0 + alpha * xi) / 2.0
}

pub fn phi_linear_1d_grad(alpha: f64) -> f64 {
    alpha / 2.0
}

impl ReferenceElement {
    pub fn dimension(&self) -> Dimension {
        match self {
            Self::Quad4 => Dimension::Two,
            Self::Hex8 => Dimension::Three,
        }
    }

    pub fn num_nodes(&self) -> usize {
        self.reference_vertices().len()
    }

    pub fn num_faces(&self) -> usize {
        match self {
            Self::Quad4 => QUAD4_FACES.len(),
            Self::Hex8 => HEX8_FACES.len(),
        }
    }

    /// Local vertex indices of the given face, or `None` if the face index is out of bounds.
    pub fn face_vertices(&self, face: usize) -> Option<&'static [usize]> {
        match self {
            Self::Quad4 => QUAD4_FACES.get(face).copied(),
            Self::Hex8 => HEX8_FACES.get(face).copied(),
        }
    }

    pub fn reference_vertices(&self) -> &'static [[f64; 3]] {
        match self {
            Self::Quad4 => &QUAD4_VERTICES,
            Self::Hex8 => &HEX8_VERTICES,
        }
    }

    /// Evaluates all nodal basis functions at the reference point `xi`.
    ///
    /// # Panics
    ///
    /// Panics if `output` does not have one entry per node.
    pub fn populate_basis(&self, output: &mut [f64], xi: &Point3<f64>) {
        assert_eq!(output.len(), self.num_nodes(), "Basis buffer must have one entry per node");
        let phi = phi_linear_1d;
        for (value, alpha) in output.iter_mut().zip(self.reference_vertices()) {
            *value = match self {
                Self::Quad4 => phi(alpha[0], xi[0]) * phi(alpha[1], xi[1]),
                Self::Hex8 => phi(alpha[0], xi[0]) * phi(alpha[1], xi[1]) * phi(alpha[2], xi[2]),
            };
        }
    }

    /// Evaluates the gradients of all nodal basis functions with respect to the reference
    /// coordinates at `xi`.
    pub fn populate_gradients(&self, output: &mut [Vector3<f64>], xi: &Point3<f64>) {
        assert_eq!(output.len(), self.num_nodes(), "Gradient buffer must have one entry per node");
        let phi = phi_linear_1d;
        let grad = phi_linear_1d_grad;
        for (value, alpha) in output.iter_mut().zip(self.reference_vertices()) {
            *value = match self {
                Self::Quad4 => Vector3::new(
                    grad(alpha[0]) * phi(alpha[1], xi[1]),
                    phi(alpha[0], xi[0]) * grad(alpha[1]),
                    0.0,
                ),
                Self::Hex8 => Vector3::new(
                    grad(alpha[0]) * phi(alpha[1], xi[1]) * phi(alpha[2], xi[2]),
                    phi(alpha[0], xi[0]) * grad(alpha[1]) * phi(alpha[2], xi[2]),
                    phi(alpha[0], xi[0]) * phi(alpha[1], xi[1]) * grad(alpha[2]),
                ),
            };
        }
    }

    /// Jacobian of the reference-to-physical map, given reference gradients of the geometric
    /// basis at some point.
    ///
    /// For two-dimensional elements the third row and column are those of the identity, so
    /// that the determinant and inverse of the returned matrix are those of the planar map.
    #[allow(non_snake_case)]
    pub fn reference_jacobian(&self, vertices: &[Point3<f64>], reference_gradients: &[Vector3<f64>]) -> Matrix3<f64> {
        assert_eq!(vertices.len(), reference_gradients.len());
        let mut J = Matrix3::zeros();
        for (x, g) in vertices.iter().zip(reference_gradients) {
            J.ger(1.0, &x.coords, g, 1.0);
        }
        if self.dimension() == Dimension::Two {
            J[(2, 2)] = 1.0;
        }
        J
    }

    /// Maps a reference point to physical coordinates given the geometric basis values there.
    pub fn map_reference_coords(vertices: &[Point3<f64>], basis_values: &[f64]) -> Point3<f64> {
        assert_eq!(vertices.len(), basis_values.len());
        vertices
            .iter()
            .zip(basis_values)
            .fold(Point3::origin(), |acc, (x, &phi)| acc + x.coords * phi)
    }
}
