//! Function spaces and their values at quadrature points.
//!
//! Geometry is always described by the multilinear map of the reference element. The function
//! spaces only determine which basis functions are evaluated on top of that map.
use crate::element::ReferenceElement;
use crate::field::Dimension;
use crate::quadrature::QuadratureRule;
use nalgebra::{Matrix3, Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FunctionSpace {
    /// Continuous, piecewise multilinear functions with one DOF per mesh node.
    Lagrange1,
    /// Discontinuous, piecewise constant functions with one DOF per element.
    Constant,
}

impl FunctionSpace {
    pub fn num_local_dofs(&self, reference: ReferenceElement) -> usize {
        match self {
            Self::Lagrange1 => reference.num_nodes(),
            Self::Constant => 1,
        }
    }

    /// Whether DOFs are attached to mesh nodes (as opposed to elements).
    pub fn is_nodal(&self) -> bool {
        matches!(self, Self::Lagrange1)
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum EvaluationError {
    /// The reference-to-physical map is singular or inverted at the given quadrature point.
    DegenerateMap { quadrature_point: usize, determinant: f64 },
    /// The requested face does not exist on the reference element.
    InvalidSide(usize),
}

impl fmt::Display for EvaluationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DegenerateMap {
                quadrature_point,
                determinant,
            } => write!(
                f,
                "degenerate element map at quadrature point {quadrature_point} (det J = {determinant:e})"
            ),
            Self::InvalidSide(side) => write!(f, "side {side} does not exist on the reference element"),
        }
    }
}

impl std::error::Error for EvaluationError {}

/// Basis values and physical gradients of one function space on one element.
///
/// Values are stored point-major: `phi(i, q)` is the value of basis function `i` at
/// quadrature point `q`.
#[derive(Debug, Clone, Default)]
pub struct ElementValues {
    n_basis: usize,
    jxw: Vec<f64>,
    points: Vec<Point3<f64>>,
    phi: Vec<f64>,
    gradients: Vec<Vector3<f64>>,
}

impl ElementValues {
    pub fn new(
        space: FunctionSpace,
        reference: ReferenceElement,
        vertices: &[Point3<f64>],
        rule: &QuadratureRule,
    ) -> Result<Self, EvaluationError> {
        let mut values = Self::default();
        values.reinit(space, reference, vertices, rule)?;
        Ok(values)
    }

    /// Re-evaluates the values for a new element, reusing the allocated storage.
    pub fn reinit(
        &mut self,
        space: FunctionSpace,
        reference: ReferenceElement,
        vertices: &[Point3<f64>],
        rule: &QuadratureRule,
    ) -> Result<(), EvaluationError> {
        self.clear(space.num_local_dofs(reference));
        let mut buffers = GeometryBuffers::new(reference);

        for (q, (w, xi)) in rule.weights().iter().zip(rule.points()).enumerate() {
            let det = buffers.evaluate(space, reference, vertices, xi, q)?;
            self.jxw.push(w * det);
            self.points.push(buffers.x);
            self.phi.extend_from_slice(&buffers.phi);
            self.gradients.extend_from_slice(&buffers.gradients);
        }
        Ok(())
    }

    fn clear(&mut self, n_basis: usize) {
        self.n_basis = n_basis;
        self.jxw.clear();
        self.points.clear();
        self.phi.clear();
        self.gradients.clear();
    }

    pub fn n_points(&self) -> usize {
        self.jxw.len()
    }

    pub fn n_basis(&self) -> usize {
        self.n_basis
    }

    /// Quadrature weight times the Jacobian determinant at the given point.
    pub fn jxw(&self, q: usize) -> f64 {
        self.jxw[q]
    }

    /// Physical location of the given quadrature point.
    pub fn point(&self, q: usize) -> &Point3<f64> {
        &self.points[q]
    }

    pub fn phi(&self, i: usize, q: usize) -> f64 {
        self.phi[q * self.n_basis + i]
    }

    /// Gradient of basis function `i` with respect to physical coordinates.
    pub fn grad(&self, i: usize, q: usize) -> &Vector3<f64> {
        &self.gradients[q * self.n_basis + i]
    }

    /// Integrates the given function of the physical coordinates over the element.
    pub fn integrate(&self, f: impl Fn(&Point3<f64>) -> f64) -> f64 {
        self.jxw.iter().zip(&self.points).map(|(jxw, x)| jxw * f(x)).sum()
    }
}

/// Values of a function space on one face of an element, including exterior normals.
///
/// Here `jxw` holds the quadrature weight times the surface measure of the face.
#[derive(Debug, Clone, Default)]
pub struct FaceValues {
    values: ElementValues,
    normals: Vec<Vector3<f64>>,
}

impl FaceValues {
    pub fn new(
        space: FunctionSpace,
        reference: ReferenceElement,
        vertices: &[Point3<f64>],
        side: usize,
        face_rule: &QuadratureRule,
    ) -> Result<Self, EvaluationError> {
        let mut values = Self::default();
        values.reinit(space, reference, vertices, side, face_rule)?;
        Ok(values)
    }

    pub fn reinit(
        &mut self,
        space: FunctionSpace,
        reference: ReferenceElement,
        vertices: &[Point3<f64>],
        side: usize,
        face_rule: &QuadratureRule,
    ) -> Result<(), EvaluationError> {
        let face_vertices = reference
            .face_vertices(side)
            .ok_or(EvaluationError::InvalidSide(side))?;
        self.values.clear(space.num_local_dofs(reference));
        self.normals.clear();

        let reference_corners: Vec<Vector3<f64>> = face_vertices
            .iter()
            .map(|&k| Vector3::from(reference.reference_vertices()[k]))
            .collect();
        let physical_corners: Vec<Vector3<f64>> = face_vertices.iter().map(|&k| vertices[k].coords).collect();

        // Normals are oriented along the offset from the cell centroid to the face centroid.
        let cell_centroid = vertices.iter().map(|v| v.coords).sum::<Vector3<f64>>() / vertices.len() as f64;
        let face_centroid = physical_corners.iter().sum::<Vector3<f64>>() / physical_corners.len() as f64;
        let outward = face_centroid - cell_centroid;

        let mut face_phi = vec![0.0; face_vertices.len()];
        let mut face_grad = vec![Vector3::zeros(); face_vertices.len()];
        let mut buffers = GeometryBuffers::new(reference);

        for (q, (w, s)) in face_rule.weights().iter().zip(face_rule.points()).enumerate() {
            populate_face_basis(reference.dimension(), s, &mut face_phi, &mut face_grad);

            let xi = Point3::from(
                reference_corners
                    .iter()
                    .zip(&face_phi)
                    .map(|(r, phi)| r * *phi)
                    .sum::<Vector3<f64>>(),
            );
            let tangent = |direction: usize| -> Vector3<f64> {
                physical_corners
                    .iter()
                    .zip(&face_grad)
                    .map(|(x, g)| x * g[direction])
                    .sum()
            };
            let area_normal = match reference.dimension() {
                Dimension::Two => {
                    let t = tangent(0);
                    Vector3::new(t.y, -t.x, 0.0)
                }
                Dimension::Three => tangent(0).cross(&tangent(1)),
            };
            let ds = area_normal.norm();
            if !(ds > 0.0) {
                return Err(EvaluationError::DegenerateMap {
                    quadrature_point: q,
                    determinant: ds,
                });
            }
            let mut normal = area_normal / ds;
            if normal.dot(&outward) < 0.0 {
                normal = -normal;
            }

            buffers.evaluate(space, reference, vertices, &xi, q)?;
            self.values.jxw.push(w * ds);
            self.values.points.push(buffers.x);
            self.values.phi.extend_from_slice(&buffers.phi);
            self.values.gradients.extend_from_slice(&buffers.gradients);
            self.normals.push(normal);
        }
        Ok(())
    }

    pub fn n_points(&self) -> usize {
        self.values.n_points()
    }

    pub fn n_basis(&self) -> usize {
        self.values.n_basis()
    }

    pub fn jxw(&self, q: usize) -> f64 {
        self.values.jxw(q)
    }

    pub fn point(&self, q: usize) -> &Point3<f64> {
        self.values.point(q)
    }

    pub fn phi(&self, i: usize, q: usize) -> f64 {
        self.values.phi(i, q)
    }

    pub fn grad(&self, i: usize, q: usize) -> &Vector3<f64> {
        self.values.grad(i, q)
    }

    /// Unit exterior normal at the given quadrature point.
    pub fn normal(&self, q: usize) -> &Vector3<f64> {
        &self.normals[q]
    }
}

/// Face basis over the face reference domain: linear on `[-1, 1]` for edges, bilinear on
/// `[-1, 1]^2` for quadrilateral faces.
fn populate_face_basis(dimension: Dimension, s: &Point3<f64>, phi: &mut [f64], grad: &mut [Vector3<f64>]) {
    match dimension {
        Dimension::Two => {
            phi[0] = (1.0 - s[0]) / 2.0;
            phi[1] = (1.0 + s[0]) / 2.0;
            grad[0] = Vector3::new(-0.5, 0.0, 0.0);
            grad[1] = Vector3::new(0.5, 0.0, 0.0);
        }
        Dimension::Three => {
            ReferenceElement::Quad4.populate_basis(phi, s);
            ReferenceElement::Quad4.populate_gradients(grad, s);
        }
    }
}

/// Scratch storage for evaluating the geometric map and a function space at one point.
struct GeometryBuffers {
    geometric_phi: Vec<f64>,
    reference_gradients: Vec<Vector3<f64>>,
    x: Point3<f64>,
    phi: Vec<f64>,
    gradients: Vec<Vector3<f64>>,
}

impl GeometryBuffers {
    fn new(reference: ReferenceElement) -> Self {
        let n = reference.num_nodes();
        Self {
            geometric_phi: vec![0.0; n],
            reference_gradients: vec![Vector3::zeros(); n],
            x: Point3::origin(),
            phi: Vec::with_capacity(n),
            gradients: Vec::with_capacity(n),
        }
    }

    /// Evaluates the map and the space basis at `xi`, returning the Jacobian determinant.
    #[allow(non_snake_case)]
    fn evaluate(
        &mut self,
        space: FunctionSpace,
        reference: ReferenceElement,
        vertices: &[Point3<f64>],
        xi: &Point3<f64>,
        q: usize,
    ) -> Result<f64, EvaluationError> {
        reference.populate_basis(&mut self.geometric_phi, xi);
        reference.populate_gradients(&mut self.reference_gradients, xi);
        self.x = ReferenceElement::map_reference_coords(vertices, &self.geometric_phi);

        let J = reference.reference_jacobian(vertices, &self.reference_gradients);
        let det = J.determinant();
        let degenerate = EvaluationError::DegenerateMap {
            quadrature_point: q,
            determinant: det,
        };
        if !(det > 0.0) {
            return Err(degenerate);
        }
        let J_inv_t: Matrix3<f64> = J.try_inverse().ok_or(degenerate)?.transpose();

        self.phi.clear();
        self.gradients.clear();
        match space {
            FunctionSpace::Lagrange1 => {
                self.phi.extend_from_slice(&self.geometric_phi);
                self.gradients
                    .extend(self.reference_gradients.iter().map(|g| J_inv_t * g));
            }
            FunctionSpace::Constant => {
                self.phi.push(1.0);
                self.gradients.push(Vector3::zeros());
            }
        }
        Ok(det)
    }
}
