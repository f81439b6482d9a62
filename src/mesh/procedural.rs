//! Basic procedural mesh generation routines.
use crate::connectivity::{Hex8Connectivity, Quad4d2Connectivity};
use crate::mesh::{HexMesh, QuadMesh2d};
use nalgebra::{Point3, Vector2, Vector3};

pub fn create_unit_square_uniform_quad_mesh_2d(cells_per_dim: usize) -> QuadMesh2d {
    create_rectangular_uniform_quad_mesh_2d(1.0, 1, 1, cells_per_dim, &Vector2::new(0.0, 1.0))
}

pub fn create_unit_box_uniform_hex_mesh_3d(cells_per_dim: usize) -> HexMesh {
    create_rectangular_uniform_hex_mesh(1.0, 1, 1, 1, cells_per_dim)
}

/// Generates an axis-aligned rectangular uniform mesh given a unit length,
/// dimensions as multipliers of the unit length and the number of cells per unit length.
pub fn create_rectangular_uniform_quad_mesh_2d(
    unit_length: f64,
    units_x: usize,
    units_y: usize,
    cells_per_unit: usize,
    top_left: &Vector2<f64>,
) -> QuadMesh2d {
    if cells_per_unit == 0 || units_x == 0 || units_y == 0 {
        QuadMesh2d::from_vertices_and_connectivity(Vec::new(), Vec::new())
    } else {
        let mut vertices = Vec::new();
        let mut cells = Vec::new();

        let cell_size = unit_length / cells_per_unit as f64;
        let num_cells_x = units_x * cells_per_unit;
        let num_cells_y = units_y * cells_per_unit;
        let num_vertices_x = num_cells_x + 1;
        let num_vertices_y = num_cells_y + 1;

        let to_global_vertex_index = |i, j| (num_cells_x + 1) * j + i;

        for j in 0..num_vertices_y {
            for i in 0..num_vertices_x {
                let v = top_left + Vector2::new(i as f64, -(j as f64)) * cell_size;
                vertices.push(Point3::new(v.x, v.y, 0.0));
            }
        }

        for j in 0..num_cells_y {
            for i in 0..num_cells_x {
                let quad = Quad4d2Connectivity([
                    to_global_vertex_index(i, j + 1),
                    to_global_vertex_index(i + 1, j + 1),
                    to_global_vertex_index(i + 1, j),
                    to_global_vertex_index(i, j),
                ]);
                cells.push(quad);
            }
        }

        QuadMesh2d::from_vertices_and_connectivity(vertices, cells)
    }
}

/// Generates an axis-aligned box mesh with its lower corner at the origin.
pub fn create_rectangular_uniform_hex_mesh(
    unit_length: f64,
    units_x: usize,
    units_y: usize,
    units_z: usize,
    cells_per_unit: usize,
) -> HexMesh {
    if cells_per_unit == 0 || units_x == 0 || units_y == 0 || units_z == 0 {
        return HexMesh::from_vertices_and_connectivity(Vec::new(), Vec::new());
    }

    let mut vertices = Vec::new();
    let mut cells = Vec::new();

    let cell_size = unit_length / cells_per_unit as f64;
    let num_cells_x = units_x * cells_per_unit;
    let num_cells_y = units_y * cells_per_unit;
    let num_cells_z = units_z * cells_per_unit;
    let num_vertices_x = num_cells_x + 1;
    let num_vertices_y = num_cells_y + 1;
    let num_vertices_z = num_cells_z + 1;

    let to_global_vertex_index = |i, j, k| num_vertices_x * num_vertices_y * k + num_vertices_x * j + i;

    for k in 0..num_vertices_z {
        for j in 0..num_vertices_y {
            for i in 0..num_vertices_x {
                let v = Vector3::new(i as f64, j as f64, k as f64) * cell_size;
                vertices.push(Point3::from(v));
            }
        }
    }

    for k in 0..num_cells_z {
        for j in 0..num_cells_y {
            for i in 0..num_cells_x {
                let idx = &to_global_vertex_index;
                cells.push(Hex8Connectivity([
                    idx(i, j, k),
                    idx(i + 1, j, k),
                    idx(i + 1, j + 1, k),
                    idx(i, j + 1, k),
                    idx(i, j, k + 1),
                    idx(i + 1, j, k + 1),
                    idx(i + 1, j + 1, k + 1),
                    idx(i, j + 1, k + 1),
                ]));
            }
        }
    }

    HexMesh::from_vertices_and_connectivity(vertices, cells)
}
