use crate::connectivity::{Connectivity, Hex8Connectivity, Quad4d2Connectivity};
use crate::element::ReferenceElement;
use crate::field::Dimension;
use itertools::Itertools;
use nalgebra::Point3;
use rustc_hash::FxHashMap;

pub mod procedural;

/// Read-only view of the mesh that assembly works on.
///
/// Elements are identified by their index in `0 .. num_elements()`, sides by their local face
/// index in `0 .. num_sides(element)`. Node coordinates always have three components; for
/// two-dimensional meshes the third component is zero.
pub trait Topology: Sync {
    fn dimension(&self) -> Dimension;

    fn num_elements(&self) -> usize;

    fn num_nodes(&self) -> usize;

    fn reference_element(&self, element: usize) -> ReferenceElement;

    /// Global node indices of the element, in reference order.
    fn element_nodes(&self, element: usize) -> &[usize];

    fn node_coords(&self, node: usize) -> &Point3<f64>;

    fn num_sides(&self, element: usize) -> usize {
        self.reference_element(element).num_faces()
    }

    /// Element-local indices of the nodes on the given side.
    ///
    /// Returns an empty slice for out-of-bounds sides.
    fn side_local_nodes(&self, element: usize, side: usize) -> &'static [usize] {
        self.reference_element(element)
            .face_vertices(side)
            .unwrap_or(&[])
    }

    /// The element across the given side, or `None` if the side lies on the domain boundary.
    fn neighbor(&self, element: usize, side: usize) -> Option<usize>;

    fn element_vertices(&self, element: usize) -> Vec<Point3<f64>> {
        self.element_nodes(element)
            .iter()
            .map(|&n| *self.node_coords(n))
            .collect()
    }

    /// Smallest distance between two vertices of the element.
    fn hmin(&self, element: usize) -> f64 {
        vertex_distances(self, element).fold(f64::INFINITY, f64::min)
    }

    /// Largest distance between two vertices of the element.
    fn hmax(&self, element: usize) -> f64 {
        vertex_distances(self, element).fold(0.0, f64::max)
    }
}

fn vertex_distances<'a, M: Topology + ?Sized>(topology: &'a M, element: usize) -> impl 'a + Iterator<Item = f64> {
    topology
        .element_nodes(element)
        .iter()
        .tuple_combinations()
        .map(move |(&a, &b)| (topology.node_coords(a) - topology.node_coords(b)).norm())
}

/// Index-based data structure for conforming meshes (i.e. no hanging nodes).
///
/// Face adjacency is computed on construction. Faces shared by more than two cells are
/// not considered interior: only the first two cells found for such a face are paired.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh<C> {
    vertices: Vec<Point3<f64>>,
    connectivity: Vec<C>,
    neighbors: Vec<Vec<Option<usize>>>,
}

pub type QuadMesh2d = Mesh<Quad4d2Connectivity>;
pub type HexMesh = Mesh<Hex8Connectivity>;

impl<C: Connectivity> Mesh<C> {
    pub fn from_vertices_and_connectivity(vertices: Vec<Point3<f64>>, connectivity: Vec<C>) -> Self {
        let neighbors = compute_face_neighbors(&connectivity);
        Self {
            vertices,
            connectivity,
            neighbors,
        }
    }

    pub fn vertices(&self) -> &[Point3<f64>] {
        &self.vertices
    }

    pub fn connectivity(&self) -> &[C] {
        &self.connectivity
    }

    /// Returns indices of all cells with at least one face on the boundary.
    pub fn find_boundary_cells(&self) -> Vec<usize> {
        self.neighbors
            .iter()
            .enumerate()
            .filter(|(_, faces)| faces.iter().any(Option::is_none))
            .map(|(cell_index, _)| cell_index)
            .collect()
    }

    /// Returns sorted indices of all vertices that lie on a boundary face.
    pub fn find_boundary_vertices(&self) -> Vec<usize> {
        let mut indices = Vec::new();
        for (cell, faces) in self.connectivity.iter().zip(&self.neighbors) {
            for (face, neighbor) in faces.iter().enumerate() {
                if neighbor.is_none() {
                    if let Some(face_vertices) = cell.get_face_connectivity(face) {
                        indices.extend(face_vertices);
                    }
                }
            }
        }
        indices.sort_unstable();
        indices.dedup();
        indices
    }
}

fn compute_face_neighbors<C: Connectivity>(connectivity: &[C]) -> Vec<Vec<Option<usize>>> {
    let mut neighbors: Vec<Vec<Option<usize>>> = connectivity
        .iter()
        .map(|cell| vec![None; cell.num_faces()])
        .collect();
    let mut first_occurrence: FxHashMap<Vec<usize>, (usize, usize)> = FxHashMap::default();

    for (cell_index, cell) in connectivity.iter().enumerate() {
        for face_index in 0..cell.num_faces() {
            let Some(mut key) = cell.get_face_connectivity(face_index) else {
                continue;
            };
            key.sort_unstable();
            match first_occurrence.get(&key) {
                Some(&(other_cell, other_face)) => {
                    if neighbors[other_cell][other_face].is_none() {
                        neighbors[other_cell][other_face] = Some(cell_index);
                        neighbors[cell_index][face_index] = Some(other_cell);
                    }
                }
                None => {
                    first_occurrence.insert(key, (cell_index, face_index));
                }
            }
        }
    }

    neighbors
}

impl<C> Topology for Mesh<C>
where
    C: Connectivity + Sync,
{
    fn dimension(&self) -> Dimension {
        self.connectivity
            .first()
            .map(|cell| cell.reference_element().dimension())
            .unwrap_or_default()
    }

    fn num_elements(&self) -> usize {
        self.connectivity.len()
    }

    fn num_nodes(&self) -> usize {
        self.vertices.len()
    }

    fn reference_element(&self, element: usize) -> ReferenceElement {
        self.connectivity[element].reference_element()
    }

    fn element_nodes(&self, element: usize) -> &[usize] {
        self.connectivity[element].vertex_indices()
    }

    fn node_coords(&self, node: usize) -> &Point3<f64> {
        &self.vertices[node]
    }

    fn neighbor(&self, element: usize, side: usize) -> Option<usize> {
        self.neighbors
            .get(element)
            .and_then(|faces| faces.get(side).copied().flatten())
    }
}
