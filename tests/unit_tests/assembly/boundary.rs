use crate::unit_square_with_dofs;
use matrixcompare::{assert_matrix_eq, assert_scalar_eq};
use nalgebra::{DMatrix, DVector, Point3};
use porous_fem::assembly::boundary::{
    apply_row_elimination, collect_element_constraints, strategy_for, BoundaryConditionStrategy, BoundaryConstraint,
    BoundaryIntegral, BoxBoundary, ConstraintSet, DirichletBoundary, ElementContext, NoBoundary, Penalty,
    RowElimination,
};
use porous_fem::assembly::global::GlobalSystem;
use porous_fem::assembly::layout::BlockLayout;
use porous_fem::assembly::local::ElementSystem;
use porous_fem::config::{BcStrategy, PoroConfig};
use porous_fem::dof::DofMap;
use porous_fem::field::{Dimension, Field, FieldGroup};
use porous_fem::mesh::{QuadMesh2d, Topology};
use util::{dense, is_scaled_unit_row, vector_from_fn};

struct Fixture {
    mesh: QuadMesh2d,
    dofs: DofMap,
    layout: BlockLayout,
    vertices: Vec<Point3<f64>>,
    element: usize,
}

impl Fixture {
    fn new(cells_per_dim: usize, element: usize) -> Self {
        let (mesh, dofs) = unit_square_with_dofs(cells_per_dim);
        let counts = dofs.element_dofs(&mesh, element).counts();
        let layout = BlockLayout::new(element, Dimension::Two, &counts).unwrap();
        let vertices = mesh.element_vertices(element);
        Self {
            mesh,
            dofs,
            layout,
            vertices,
            element,
        }
    }

    fn context<'a>(&'a self, boundary: &'a dyn DirichletBoundary) -> ElementContext<'a> {
        ElementContext {
            element: self.element,
            topology: &self.mesh,
            dofs: &self.dofs,
            layout: &self.layout,
            boundary,
            vertices: &self.vertices,
        }
    }
}

#[test]
fn box_boundary_matches_coordinate_thresholds() {
    let boundary = BoxBoundary::unit(Dimension::Two);
    assert!(boundary.on_boundary(&Point3::new(0.0, 0.5, 0.0)));
    assert!(boundary.on_boundary(&Point3::new(0.5, 0.9995, 0.0)));
    assert!(!boundary.on_boundary(&Point3::new(0.5, 0.5, 0.0)));
    // z is ignored in two dimensions
    assert!(!boundary.on_boundary(&Point3::new(0.5, 0.5, 0.0005)));
    assert!(BoxBoundary::unit(Dimension::Three).on_boundary(&Point3::new(0.5, 0.5, 0.0005)));

    let x = Point3::new(1.0, 0.5, 0.0);
    assert!(boundary.prescribes(Field::SolidX, &x));
    assert!(boundary.prescribes(Field::Pressure, &x));
    assert_eq!(boundary.value(Field::SeepageY, &x), 0.0);

    let displacement_only = BoxBoundary::unit(Dimension::Two)
        .with_groups(&[FieldGroup::Displacement])
        .with_values(|field: Field, x: &Point3<f64>| if field == Field::SolidY { x.y } else { 0.0 });
    assert!(displacement_only.prescribes(Field::SolidY, &x));
    assert!(!displacement_only.prescribes(Field::SeepageX, &x));
    assert_eq!(displacement_only.value(Field::SolidY, &x), 0.5);

    assert!(!NoBoundary.prescribes(Field::SolidX, &x));
}

#[test]
fn constraints_skip_pressure_unless_pinned() {
    let fixture = Fixture::new(2, 0);
    let boundary = BoxBoundary::unit(Dimension::Two);
    let context = fixture.context(&boundary);

    let constraints = collect_element_constraints(&context, false);
    assert!(constraints.group(FieldGroup::Pressure).is_empty());

    // Element 0 of the 2x2 mesh touches the boundary with three of its four nodes.
    let nodes = fixture.mesh.element_nodes(0);
    let boundary_nodes: Vec<usize> = nodes
        .iter()
        .copied()
        .filter(|&n| boundary.on_boundary(fixture.mesh.node_coords(n)))
        .collect();
    assert_eq!(boundary_nodes.len(), 3);
    let mut displacement: Vec<usize> = constraints
        .group(FieldGroup::Displacement)
        .iter()
        .map(|c| c.dof)
        .collect();
    displacement.sort_unstable();
    let mut expected: Vec<usize> = [Field::SolidX, Field::SolidY]
        .iter()
        .flat_map(|&field| boundary_nodes.iter().map(move |&n| (n, field)))
        .map(|(n, field)| fixture.dofs.node_dof(n, field).unwrap())
        .collect();
    expected.sort_unstable();
    assert_eq!(displacement, expected);
    assert_eq!(constraints.group(FieldGroup::Seepage).len(), 6);

    let pinned = collect_element_constraints(&context, true);
    assert_eq!(
        pinned.group(FieldGroup::Pressure),
        &[BoundaryConstraint {
            dof: fixture.dofs.element_dof(0, Field::Pressure).unwrap(),
            value: 0.0
        }]
    );
}

#[test]
fn constraints_skip_unowned_dofs() {
    let (mesh, dofs) = unit_square_with_dofs(1);
    let dofs = dofs.with_owned_range(0..4);
    let counts = dofs.element_dofs(&mesh, 0).counts();
    let layout = BlockLayout::new(0, Dimension::Two, &counts).unwrap();
    let vertices = mesh.element_vertices(0);
    let boundary = BoxBoundary::unit(Dimension::Two);
    let context = ElementContext {
        element: 0,
        topology: &mesh,
        dofs: &dofs,
        layout: &layout,
        boundary: &boundary,
        vertices: &vertices,
    };
    let constraints = collect_element_constraints(&context, true);
    assert_eq!(constraints.len(), 4);
    assert!(constraints
        .group(FieldGroup::Displacement)
        .iter()
        .all(|c| dofs.is_locally_owned(c.dof)));
}

#[test]
fn row_elimination_is_idempotent() {
    let n = 6;
    let matrix = DMatrix::from_fn(n, n, |i, j| 1.0 + (i * n + j) as f64);
    let rows: Vec<usize> = (0..n).collect();
    let mut system = GlobalSystem::serial(n);
    system.add_matrix(&matrix, &rows, &rows);
    system.add_vector(&vector_from_fn(n, |i| i as f64), &rows);

    let constraints = [
        BoundaryConstraint { dof: 1, value: 2.5 },
        BoundaryConstraint { dof: 4, value: -1.0 },
    ];
    apply_row_elimination(&mut system, &constraints).unwrap();
    let once_matrix = dense(system.matrix().unwrap());
    let once_rhs = system.rhs().clone();

    assert!(is_scaled_unit_row(system.matrix().unwrap(), 1, 1.0));
    assert!(is_scaled_unit_row(system.matrix().unwrap(), 4, 1.0));
    assert_eq!(once_rhs, DVector::from_column_slice(&[0.0, 2.5, 2.0, 3.0, -1.0, 5.0]));
    // Unconstrained rows are untouched.
    assert_eq!(once_matrix.row(0), matrix.row(0));

    apply_row_elimination(&mut system, &constraints).unwrap();
    assert_eq!(dense(system.matrix().unwrap()), once_matrix);
    assert_eq!(system.rhs(), &once_rhs);
}

#[test]
fn row_elimination_finalize_runs_group_passes() {
    let n = 4;
    let rows: Vec<usize> = (0..n).collect();
    let mut system = GlobalSystem::serial(n);
    system.add_matrix(&DMatrix::repeat(n, n, 3.0), &rows, &rows);

    let mut constraints = ConstraintSet::default();
    constraints.push(FieldGroup::Displacement, BoundaryConstraint { dof: 0, value: 1.0 });
    constraints.push(FieldGroup::Seepage, BoundaryConstraint { dof: 2, value: 2.0 });

    let strategy = RowElimination { pin_pressure: false };
    // Finalizing an open system closes it first.
    strategy.finalize(&mut system, &constraints).unwrap();
    assert!(system.is_closed());
    let matrix = system.matrix().unwrap();
    assert!(is_scaled_unit_row(matrix, 0, 1.0));
    assert!(is_scaled_unit_row(matrix, 2, 1.0));
    assert!(!is_scaled_unit_row(matrix, 1, 1.0));
    assert_eq!(system.rhs().as_slice(), &[1.0, 0.0, 2.0, 0.0]);
}

#[test]
fn penalty_adds_to_prescribed_diagonals() {
    let fixture = Fixture::new(1, 0);
    let boundary = BoxBoundary::unit(Dimension::Two)
        .with_values(|field: Field, _: &Point3<f64>| if field == Field::SolidX { 0.25 } else { 0.0 });
    let strategy = Penalty {
        penalty: 100.0,
        pin_pressure: false,
    };
    let total = fixture.layout.total();
    let mut output = ElementSystem::zeros(total);
    strategy.apply_local(&fixture.context(&boundary), &mut output).unwrap();

    let p = fixture.layout.block(Field::Pressure).offset;
    for i in 0..total {
        let expected = if i == p { 0.0 } else { 100.0 };
        assert_eq!(output.matrix[(i, i)], expected);
    }
    // Only diagonal entries are modified.
    assert_eq!(output.matrix.sum(), 100.0 * (total - 1) as f64);
    let solid_x = fixture.layout.block(Field::SolidX);
    for i in 0..total {
        let expected = if solid_x.range().contains(&i) { 25.0 } else { 0.0 };
        assert_scalar_eq!(output.vector[i], expected, comp = abs, tol = 1e-12);
    }

    let pinned = Penalty {
        penalty: 100.0,
        pin_pressure: true,
    };
    let mut output = ElementSystem::zeros(total);
    pinned.apply_local(&fixture.context(&boundary), &mut output).unwrap();
    assert_eq!(output.matrix[(p, p)], 100.0);
}

#[test]
fn penalty_ignores_interior_elements() {
    let fixture = Fixture::new(3, 4);
    let boundary = BoxBoundary::unit(Dimension::Two);
    let strategy = Penalty {
        penalty: 1e10,
        pin_pressure: true,
    };
    let mut output = ElementSystem::zeros(fixture.layout.total());
    strategy.apply_local(&fixture.context(&boundary), &mut output).unwrap();
    assert_eq!(output.matrix.norm(), 0.0);
}

fn nitsche(config: &PoroConfig) -> BoundaryIntegral {
    BoundaryIntegral {
        lame: config.lame(),
        gamma: config.nitsche_gamma,
        points_per_dim: config.quadrature_points_per_dim,
        spaces: config.spaces,
    }
}

#[test]
fn nitsche_velocity_terms_are_symmetric() {
    let fixture = Fixture::new(2, 0);
    let config = PoroConfig::default();
    let boundary = BoxBoundary::unit(Dimension::Two);
    let mut output = ElementSystem::zeros(fixture.layout.total());
    nitsche(&config)
        .apply_local(&fixture.context(&boundary), &mut output)
        .unwrap();

    // Homogeneous data gives no rhs.
    assert_eq!(output.vector.norm(), 0.0);
    // Pressure is never enforced weakly.
    let p = fixture.layout.block(Field::Pressure).offset;
    assert_eq!(output.matrix.row(p).norm(), 0.0);

    let mut velocity = output.matrix.clone();
    velocity.column_mut(p).fill(0.0);
    assert!(velocity.norm() > 0.0);
    assert_matrix_eq!(velocity, velocity.transpose(), comp = abs, tol = 1e-12);
}

#[test]
fn nitsche_adds_boundary_pressure_flux() {
    // Element 0 is the upper left cell [0, 0.5] x [0.5, 1], touching x = 0 and y = 1.
    let fixture = Fixture::new(2, 0);
    assert_eq!(fixture.vertices[3], Point3::new(0.0, 1.0, 0.0));
    let config = PoroConfig::default();
    let boundary = BoxBoundary::unit(Dimension::Two);
    let mut output = ElementSystem::zeros(fixture.layout.total());
    nitsche(&config)
        .apply_local(&fixture.context(&boundary), &mut output)
        .unwrap();

    let layout = &fixture.layout;
    // Each column sum is the face length times the normal component.
    for (field, expected) in [
        (Field::SolidX, -0.5),
        (Field::SolidY, 0.5),
        (Field::SeepageX, -0.5),
        (Field::SeepageY, 0.5),
    ] {
        let flux = layout.matrix_block(&output.matrix, field, Field::Pressure);
        assert_scalar_eq!(flux.sum(), expected, comp = abs, tol = 1e-12);
    }
    // The corner node sees half of each adjacent face, node 0 at (0, 0.5) only the left one.
    let flux_x = layout.matrix_block(&output.matrix, Field::SolidX, Field::Pressure);
    let flux_y = layout.matrix_block(&output.matrix, Field::SolidY, Field::Pressure);
    assert_scalar_eq!(flux_x[(3, 0)], -0.25, comp = abs, tol = 1e-12);
    assert_scalar_eq!(flux_y[(3, 0)], 0.25, comp = abs, tol = 1e-12);
    assert_scalar_eq!(flux_x[(0, 0)], -0.25, comp = abs, tol = 1e-12);
    assert_scalar_eq!(flux_y[(0, 0)], 0.0, comp = abs, tol = 1e-12);
}

#[test]
fn nitsche_is_consistent_for_constant_data() {
    let fixture = Fixture::new(1, 0);
    let config = PoroConfig::default();
    let boundary = BoxBoundary::unit(Dimension::Two).with_values(|field: Field, _: &Point3<f64>| match field {
        Field::SolidX => 1.0,
        Field::SolidY => -0.5,
        Field::SeepageY => 2.0,
        _ => 0.0,
    });
    let mut output = ElementSystem::zeros(fixture.layout.total());
    nitsche(&config)
        .apply_local(&fixture.context(&boundary), &mut output)
        .unwrap();

    // The interpolant of constant data has zero stress, so it satisfies the weak boundary
    // equations exactly.
    let mut interpolant = DVector::zeros(fixture.layout.total());
    for (field, value) in [(Field::SolidX, 1.0), (Field::SolidY, -0.5), (Field::SeepageY, 2.0)] {
        fixture.layout.vector_block_mut(&mut interpolant, field).fill(value);
    }
    let residual = &output.matrix * &interpolant - &output.vector;
    assert!(residual.norm() < 1e-10 * output.vector.norm());
}

#[test]
fn strategy_selection_follows_config() {
    for (strategy, name) in [
        (BcStrategy::RowElimination, "row elimination"),
        (BcStrategy::Penalty, "penalty"),
        (BcStrategy::BoundaryIntegral, "boundary integral"),
    ] {
        let config = PoroConfig::default().with_bc_strategy(strategy);
        assert_eq!(strategy_for(&config).name(), name);
    }
}
