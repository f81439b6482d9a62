//! Gauss rules on reference cells and reference faces.
use crate::element::ReferenceElement;
use fenris_quadrature::tensor::{hexahedron_gauss, quadrilateral_gauss};
use fenris_quadrature::univariate::gauss;
use nalgebra::Point3;

/// A quadrature rule with points stored as 3-vectors.
///
/// Rules of lower dimension leave the unused trailing coordinates at zero.
#[derive(Debug, Clone, PartialEq)]
pub struct QuadratureRule {
    weights: Vec<f64>,
    points: Vec<Point3<f64>>,
}

impl QuadratureRule {
    /// Tensor-product Gauss rule on the reference cell.
    pub fn gauss(reference: ReferenceElement, points_per_dim: usize) -> Self {
        match reference {
            ReferenceElement::Quad4 => {
                let (weights, points) = quadrilateral_gauss(points_per_dim);
                let points = points.into_iter().map(|[x, y]| Point3::new(x, y, 0.0)).collect();
                Self { weights, points }
            }
            ReferenceElement::Hex8 => {
                let (weights, points) = hexahedron_gauss(points_per_dim);
                let points = points.into_iter().map(Point3::from).collect();
                Self { weights, points }
            }
        }
    }

    /// Gauss rule on the reference domain of a face of the given cell.
    ///
    /// Faces of quadrilaterals are parametrized over `[-1, 1]`, faces of hexahedra over
    /// `[-1, 1]^2`.
    pub fn gauss_face(reference: ReferenceElement, points_per_dim: usize) -> Self {
        match reference {
            ReferenceElement::Quad4 => {
                let (weights, points) = gauss(points_per_dim);
                let points = points.into_iter().map(|[s]| Point3::new(s, 0.0, 0.0)).collect();
                Self { weights, points }
            }
            ReferenceElement::Hex8 => Self::gauss(ReferenceElement::Quad4, points_per_dim),
        }
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn points(&self) -> &[Point3<f64>] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Approximates the integral of the given function over the reference domain.
    pub fn integrate(&self, f: impl Fn(&Point3<f64>) -> f64) -> f64 {
        self.weights
            .iter()
            .zip(&self.points)
            .map(|(w, p)| w * f(p))
            .sum()
    }
}
