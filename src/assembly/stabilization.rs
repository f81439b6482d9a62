//! Pressure-jump stabilization across interior faces.
//!
//! Piecewise-constant pressures paired with multilinear velocities are not inf-sup stable.
//! Penalizing the pressure jump between face neighbours restores stability; the terms scale
//! with `dt`, the configured gain and a measure of the face size.
use crate::config::PoroConfig;
use crate::dof::DofMap;
use crate::error::AssemblyError;
use crate::field::{Dimension, Field};
use crate::mesh::Topology;
use itertools::iproduct;
use nalgebra::Point3;

/// A single coefficient destined for the global matrix.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct StabilizationTerm {
    pub row: usize,
    pub col: usize,
    pub coefficient: f64,
}

/// Coordinates shared by the nodes of two elements, in the node order of `element`.
///
/// Matching uses exact coordinate equality, which holds for conforming meshes where
/// neighbours reference the same vertices.
pub fn shared_node_coords(topology: &(impl Topology + ?Sized), element: usize, neighbor: usize) -> Vec<Point3<f64>> {
    iproduct!(topology.element_nodes(element), topology.element_nodes(neighbor))
        .map(|(&a, &b)| (topology.node_coords(a), topology.node_coords(b)))
        .filter(|(x, y)| x == y)
        .map(|(x, _)| *x)
        .collect()
}

/// Stabilization terms for all interior sides of `element`.
///
/// For every side with a neighbour, two terms are produced on the row of the element's first
/// pressure DOF: `+s` on the diagonal and `-s` in the neighbour's column, where
/// `s = dt * gain * h_term`. In 2-D `h_term` is the squared length of the shared edge,
/// in 3-D the cube of the element's largest vertex distance.
pub fn pressure_jump_terms(
    topology: &(impl Topology + ?Sized),
    dofs: &DofMap,
    config: &PoroConfig,
    element: usize,
) -> Result<Vec<StabilizationTerm>, AssemblyError> {
    let mut terms = Vec::new();
    let mut pressure_dofs = Vec::new();
    dofs.field_dofs(topology, element, Field::Pressure, &mut pressure_dofs);
    let own_dof = *pressure_dofs
        .first()
        .ok_or_else(|| AssemblyError::precondition(element, "stabilization requires a pressure DOF"))?;

    for side in 0..topology.num_sides(element) {
        let Some(neighbor) = topology.neighbor(element, side) else {
            continue;
        };

        let shared = shared_node_coords(topology, element, neighbor);
        let length_term = match config.dimension {
            Dimension::Two => {
                if shared.len() != 2 {
                    return Err(AssemblyError::face_precondition(
                        element,
                        side,
                        format!("expected 2 nodes shared with element {neighbor}, found {}", shared.len()),
                    ));
                }
                (shared[0] - shared[1]).norm_squared()
            }
            Dimension::Three => {
                let face_nodes = topology.side_local_nodes(element, side).len();
                if shared.len() != face_nodes {
                    return Err(AssemblyError::face_precondition(
                        element,
                        side,
                        format!(
                            "expected {face_nodes} nodes shared with element {neighbor}, found {}",
                            shared.len()
                        ),
                    ));
                }
                topology.hmax(element).powi(3)
            }
        };

        dofs.field_dofs(topology, neighbor, Field::Pressure, &mut pressure_dofs);
        let neighbor_dof = *pressure_dofs.first().ok_or_else(|| {
            AssemblyError::face_precondition(element, side, format!("neighbour {neighbor} has no pressure DOF"))
        })?;

        let factor = -(config.dt * config.stabilization_gain) * length_term;
        terms.push(StabilizationTerm {
            row: own_dof,
            col: own_dof,
            coefficient: -factor,
        });
        terms.push(StabilizationTerm {
            row: own_dof,
            col: neighbor_dof,
            coefficient: factor,
        });
    }

    Ok(terms)
}
