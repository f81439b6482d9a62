//! Enforcement of Dirichlet data.
//!
//! Exactly one [`BoundaryConditionStrategy`] is active in an assembly pass. Strategies get two
//! hooks: one inside local assembly, operating on the dense element system, and one after all
//! element contributions have been scattered, operating on the global system.
use crate::assembly::global::GlobalSystem;
use crate::assembly::layout::BlockLayout;
use crate::assembly::local::ElementSystem;
use crate::config::{BcStrategy, FieldSpaces, LameParameters, PoroConfig};
use crate::dof::DofMap;
use crate::error::AssemblyError;
use crate::field::{Dimension, Field, FieldGroup};
use crate::mesh::Topology;
use crate::quadrature::QuadratureRule;
use crate::space::FaceValues;
use log::debug;
use nalgebra::{Point3, Vector3};

/// Where Dirichlet data is prescribed, and what it is.
pub trait DirichletBoundary: Sync {
    /// Whether `field` is prescribed at the boundary point `x`.
    fn prescribes(&self, field: Field, x: &Point3<f64>) -> bool;

    fn value(&self, field: Field, x: &Point3<f64>) -> f64;
}

/// Prescribes nothing.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct NoBoundary;

impl DirichletBoundary for NoBoundary {
    fn prescribes(&self, _field: Field, _x: &Point3<f64>) -> bool {
        false
    }

    fn value(&self, _field: Field, _x: &Point3<f64>) -> f64 {
        0.0
    }
}

pub type ValueFn = fn(Field, &Point3<f64>) -> f64;

fn zero_value(_field: Field, _x: &Point3<f64>) -> f64 {
    0.0
}

/// Dirichlet data on the boundary of an axis-aligned box.
///
/// A point is on the prescribed boundary if any of its coordinates lies within `tolerance`
/// of the box's lower or upper bound (only the first `dimension` coordinates are checked).
#[derive(Clone, Debug)]
pub struct BoxBoundary<F = ValueFn> {
    min: Point3<f64>,
    max: Point3<f64>,
    tolerance: f64,
    dimension: Dimension,
    groups: Vec<FieldGroup>,
    values: F,
}

impl BoxBoundary {
    /// Homogeneous data for displacement, pressure and seepage on the unit square/cube.
    pub fn unit(dimension: Dimension) -> Self {
        Self::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0), dimension)
    }

    pub fn new(min: Point3<f64>, max: Point3<f64>, dimension: Dimension) -> Self {
        Self {
            min,
            max,
            tolerance: 0.001,
            dimension,
            groups: vec![FieldGroup::Displacement, FieldGroup::Pressure, FieldGroup::Seepage],
            values: zero_value,
        }
    }
}

impl<F> BoxBoundary<F> {
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Restricts the prescribed fields to the given groups.
    pub fn with_groups(mut self, groups: &[FieldGroup]) -> Self {
        self.groups = groups.to_vec();
        self
    }

    pub fn with_values<G>(self, values: G) -> BoxBoundary<G>
    where
        G: Fn(Field, &Point3<f64>) -> f64 + Sync,
    {
        BoxBoundary {
            min: self.min,
            max: self.max,
            tolerance: self.tolerance,
            dimension: self.dimension,
            groups: self.groups,
            values,
        }
    }

    pub fn on_boundary(&self, x: &Point3<f64>) -> bool {
        let tol = self.tolerance;
        (0..self.dimension.dim()).any(|c| x[c] < self.min[c] + tol || x[c] > self.max[c] - tol)
    }
}

impl<F> DirichletBoundary for BoxBoundary<F>
where
    F: Fn(Field, &Point3<f64>) -> f64 + Sync,
{
    fn prescribes(&self, field: Field, x: &Point3<f64>) -> bool {
        self.groups.contains(&field.group()) && self.on_boundary(x)
    }

    fn value(&self, field: Field, x: &Point3<f64>) -> f64 {
        (self.values)(field, x)
    }
}

/// A prescribed value for one global DOF.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BoundaryConstraint {
    pub dof: usize,
    pub value: f64,
}

/// Constraints of a pass, kept per field group in the order they were found.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConstraintSet {
    displacement: Vec<BoundaryConstraint>,
    pressure: Vec<BoundaryConstraint>,
    seepage: Vec<BoundaryConstraint>,
}

impl ConstraintSet {
    pub fn push(&mut self, group: FieldGroup, constraint: BoundaryConstraint) {
        match group {
            FieldGroup::Displacement => self.displacement.push(constraint),
            FieldGroup::Pressure => self.pressure.push(constraint),
            FieldGroup::Seepage => self.seepage.push(constraint),
        }
    }

    pub fn group(&self, group: FieldGroup) -> &[BoundaryConstraint] {
        match group {
            FieldGroup::Displacement => &self.displacement,
            FieldGroup::Pressure => &self.pressure,
            FieldGroup::Seepage => &self.seepage,
        }
    }

    /// Appends all constraints of `other`, preserving order within each group.
    pub fn extend(&mut self, other: ConstraintSet) {
        self.displacement.extend(other.displacement);
        self.pressure.extend(other.pressure);
        self.seepage.extend(other.seepage);
    }

    pub fn len(&self) -> usize {
        self.displacement.len() + self.pressure.len() + self.seepage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Everything a strategy may inspect about the element being assembled.
#[derive(Clone, Copy)]
pub struct ElementContext<'a> {
    pub element: usize,
    pub topology: &'a dyn Topology,
    pub dofs: &'a DofMap,
    pub layout: &'a BlockLayout,
    pub boundary: &'a dyn DirichletBoundary,
    pub vertices: &'a [Point3<f64>],
}

impl<'a> ElementContext<'a> {
    /// Sides of the element without a neighbour.
    pub fn boundary_sides(&self) -> impl 'a + Iterator<Item = usize> {
        let (topology, element) = (self.topology, self.element);
        (0..topology.num_sides(element)).filter(move |&side| topology.neighbor(element, side).is_none())
    }

    /// Element-local indices of all nodes on boundary sides, without duplicates.
    pub fn boundary_local_nodes(&self) -> Vec<usize> {
        let mut nodes: Vec<usize> = self
            .boundary_sides()
            .flat_map(|side| self.topology.side_local_nodes(self.element, side).iter().copied())
            .collect();
        nodes.sort_unstable();
        nodes.dedup();
        nodes
    }
}

/// Finds the constraints contributed by one element.
///
/// Nodal fields are constrained at every prescribed node of every boundary side. Element-wise
/// fields (the pressure) are constrained through their single element DOF. Pressure
/// constraints are only produced when `pin_pressure` is set. DOFs outside the owned range
/// are skipped.
pub fn collect_element_constraints(context: &ElementContext, pin_pressure: bool) -> ConstraintSet {
    let ElementContext {
        element,
        topology,
        dofs,
        boundary,
        ..
    } = *context;
    let mut constraints = ConstraintSet::default();
    let mut seen = Vec::new();

    for local_node in context.boundary_local_nodes() {
        let node = topology.element_nodes(element)[local_node];
        let x = topology.node_coords(node);
        for &field in Field::ordered(dofs.dimension()) {
            if field.group() == FieldGroup::Pressure && !pin_pressure {
                continue;
            }
            if !boundary.prescribes(field, x) {
                continue;
            }
            let dof = if dofs.space(field).is_nodal() {
                dofs.node_dof(node, field)
            } else {
                dofs.element_dof(element, field)
            };
            let Some(dof) = dof.filter(|&dof| dofs.is_locally_owned(dof)) else {
                continue;
            };
            if seen.contains(&dof) {
                continue;
            }
            seen.push(dof);
            let value = boundary.value(field, x);
            constraints.push(field.group(), BoundaryConstraint { dof, value });
        }
    }
    constraints
}

/// One row-elimination pass over a closed system: the rows of all constrained DOFs become unit
/// rows and their rhs entries are overwritten with the prescribed values.
///
/// Applying the same constraints again leaves the system unchanged.
pub fn apply_row_elimination(
    system: &mut GlobalSystem,
    constraints: &[BoundaryConstraint],
) -> Result<(), AssemblyError> {
    system.close();
    let rows: Vec<usize> = constraints.iter().map(|c| c.dof).collect();
    system.zero_rows(&rows, 1.0)?;
    for constraint in constraints {
        system.set_rhs(constraint.dof, constraint.value)?;
    }
    system.close();
    Ok(())
}

pub trait BoundaryConditionStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Modifies the element system during local assembly.
    fn apply_local(&self, _context: &ElementContext, _output: &mut ElementSystem) -> Result<(), AssemblyError> {
        Ok(())
    }

    /// Constraints to be applied to the global system after the element loop.
    fn collect_constraints(&self, _context: &ElementContext) -> ConstraintSet {
        ConstraintSet::default()
    }

    /// Completes the global system once all element contributions have been added.
    fn finalize(&self, system: &mut GlobalSystem, _constraints: &ConstraintSet) -> Result<(), AssemblyError> {
        system.close();
        Ok(())
    }
}

/// Builds the strategy selected by the configuration.
pub fn strategy_for(config: &PoroConfig) -> Box<dyn BoundaryConditionStrategy> {
    match config.bc_strategy {
        BcStrategy::RowElimination => Box::new(RowElimination {
            pin_pressure: config.pin_pressure,
        }),
        BcStrategy::Penalty => Box::new(Penalty {
            penalty: config.penalty,
            pin_pressure: config.pin_pressure,
        }),
        BcStrategy::BoundaryIntegral => Box::new(BoundaryIntegral {
            lame: config.lame(),
            gamma: config.nitsche_gamma,
            points_per_dim: config.quadrature_points_per_dim,
            spaces: config.spaces,
        }),
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RowElimination {
    pub pin_pressure: bool,
}

impl BoundaryConditionStrategy for RowElimination {
    fn name(&self) -> &'static str {
        "row elimination"
    }

    fn collect_constraints(&self, context: &ElementContext) -> ConstraintSet {
        collect_element_constraints(context, self.pin_pressure)
    }

    /// Runs three independent passes: displacement, seepage, then pressure.
    fn finalize(&self, system: &mut GlobalSystem, constraints: &ConstraintSet) -> Result<(), AssemblyError> {
        for group in [FieldGroup::Displacement, FieldGroup::Seepage, FieldGroup::Pressure] {
            let group_constraints = constraints.group(group);
            debug!("Eliminating {} constrained {:?} rows", group_constraints.len(), group);
            apply_row_elimination(system, group_constraints)?;
        }
        Ok(())
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Penalty {
    pub penalty: f64,
    pub pin_pressure: bool,
}

impl BoundaryConditionStrategy for Penalty {
    fn name(&self) -> &'static str {
        "penalty"
    }

    fn apply_local(&self, context: &ElementContext, output: &mut ElementSystem) -> Result<(), AssemblyError> {
        let ElementContext {
            element,
            topology,
            dofs,
            layout,
            boundary,
            ..
        } = *context;
        let mut penalized = Vec::new();

        for local_node in context.boundary_local_nodes() {
            let x = topology.node_coords(topology.element_nodes(element)[local_node]);
            for &field in Field::ordered(layout.dimension()) {
                if field.group() == FieldGroup::Pressure && !self.pin_pressure {
                    continue;
                }
                if !boundary.prescribes(field, x) {
                    continue;
                }
                let local_index = if dofs.space(field).is_nodal() { local_node } else { 0 };
                let block = layout.block(field);
                if local_index >= block.len {
                    continue;
                }
                let idx = block.offset + local_index;
                // Element-wise fields are reached from several boundary nodes; penalize once.
                if penalized.contains(&idx) {
                    continue;
                }
                penalized.push(idx);
                output.matrix[(idx, idx)] += self.penalty;
                output.vector[idx] += self.penalty * boundary.value(field, x);
            }
        }
        Ok(())
    }
}

/// Weak (Nitsche-type) enforcement through integrals over boundary faces.
///
/// Displacement data is imposed with the symmetric Nitsche method for the stress
/// `σ(u) = 2μ ε(u) + λ (div u) I` at face quadrature points where every solid component is
/// prescribed. Seepage data is imposed with a face penalty only. The penalty is
/// `gamma / h` with `h` the smallest vertex distance of the element.
///
/// The pressure enters the momentum and Darcy rows through integrated-by-parts gradients.
/// On faces with prescribed velocities their boundary parts `∫ p (v · n)` are added, so that
/// a constant pressure with vanishing velocities leaves no residual.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BoundaryIntegral {
    pub lame: LameParameters,
    pub gamma: f64,
    pub points_per_dim: usize,
    pub spaces: FieldSpaces,
}

/// Values of all field groups on the same boundary face.
struct FaceFields {
    displacement: FaceValues,
    pressure: FaceValues,
    seepage: FaceValues,
}

impl BoundaryIntegral {
    /// Component `a` of the traction `σ(φ e_b) n` for a scalar basis function with gradient `g`.
    fn traction(&self, a: usize, b: usize, g: &Vector3<f64>, n: &Vector3<f64>) -> f64 {
        let LameParameters { mu, lambda } = self.lame;
        let mut t = mu * g[a] * n[b] + lambda * g[b] * n[a];
        if a == b {
            t += mu * g.dot(n);
        }
        t
    }

    /// Adds `∫ φ_i n_c ψ_j` to the `(row, pressure)` block at face quadrature point `q`.
    fn add_pressure_flux(
        layout: &BlockLayout,
        velocity: &FaceValues,
        pressure: &FaceValues,
        row: Field,
        c: usize,
        q: usize,
        output: &mut ElementSystem,
    ) {
        let jxw = velocity.jxw(q);
        let n = velocity.normal(q);
        let mut k = layout.matrix_block_mut(&mut output.matrix, row, Field::Pressure);
        for i in 0..k.nrows() {
            for j in 0..k.ncols() {
                k[(i, j)] += jxw * velocity.phi(i, q) * n[c] * pressure.phi(j, q);
            }
        }
    }

    fn add_displacement_terms(
        &self,
        context: &ElementContext,
        faces: &FaceFields,
        penalty: f64,
        output: &mut ElementSystem,
    ) {
        let layout = context.layout;
        let face = &faces.displacement;
        let solid = Field::solid(layout.dimension());
        let n_basis = face.n_basis();

        for q in 0..face.n_points() {
            let x = face.point(q);
            if !solid.iter().all(|&field| context.boundary.prescribes(field, x)) {
                continue;
            }
            let g: Vec<f64> = solid.iter().map(|&field| context.boundary.value(field, x)).collect();
            let n = face.normal(q);
            let jxw = face.jxw(q);

            for (a, &row) in solid.iter().enumerate() {
                for (b, &col) in solid.iter().enumerate() {
                    let mut k = layout.matrix_block_mut(&mut output.matrix, row, col);
                    for i in 0..n_basis {
                        for j in 0..n_basis {
                            let consistency = face.phi(i, q) * self.traction(a, b, face.grad(j, q), n);
                            let symmetry = face.phi(j, q) * self.traction(b, a, face.grad(i, q), n);
                            let stabilization = if a == b {
                                penalty * face.phi(i, q) * face.phi(j, q)
                            } else {
                                0.0
                            };
                            k[(i, j)] += jxw * (stabilization - consistency - symmetry);
                        }
                    }
                }
                Self::add_pressure_flux(layout, face, &faces.pressure, row, a, q, output);

                let mut f = layout.vector_block_mut(&mut output.vector, row);
                for i in 0..n_basis {
                    let symmetry: f64 = (0..solid.len())
                        .map(|b| g[b] * self.traction(b, a, face.grad(i, q), n))
                        .sum();
                    f[i] += jxw * (penalty * g[a] * face.phi(i, q) - symmetry);
                }
            }
        }
    }

    fn add_seepage_terms(
        &self,
        context: &ElementContext,
        faces: &FaceFields,
        penalty: f64,
        output: &mut ElementSystem,
    ) {
        let layout = context.layout;
        let face = &faces.seepage;
        for (c, &field) in Field::seepage(layout.dimension()).iter().enumerate() {
            if layout.block(field).is_empty() {
                continue;
            }
            for q in 0..face.n_points() {
                let x = face.point(q);
                if !context.boundary.prescribes(field, x) {
                    continue;
                }
                let value = context.boundary.value(field, x);
                let jxw = face.jxw(q);
                {
                    let mut k = layout.matrix_block_mut(&mut output.matrix, field, field);
                    for i in 0..face.n_basis() {
                        for j in 0..face.n_basis() {
                            k[(i, j)] += jxw * penalty * face.phi(i, q) * face.phi(j, q);
                        }
                    }
                }
                Self::add_pressure_flux(layout, face, &faces.pressure, field, c, q, output);
                let mut f = layout.vector_block_mut(&mut output.vector, field);
                for i in 0..face.n_basis() {
                    f[i] += jxw * penalty * value * face.phi(i, q);
                }
            }
        }
    }
}

impl BoundaryConditionStrategy for BoundaryIntegral {
    fn name(&self) -> &'static str {
        "boundary integral"
    }

    fn apply_local(&self, context: &ElementContext, output: &mut ElementSystem) -> Result<(), AssemblyError> {
        let element = context.element;
        let reference = context.topology.reference_element(element);
        let face_rule = QuadratureRule::gauss_face(reference, self.points_per_dim);
        let penalty = self.gamma / context.topology.hmin(element);

        for side in context.boundary_sides() {
            let face_values = |space| {
                FaceValues::new(space, reference, context.vertices, side, &face_rule)
                    .map_err(|err| AssemblyError::face_precondition(element, side, err.to_string()))
            };
            let faces = FaceFields {
                displacement: face_values(self.spaces.displacement)?,
                pressure: face_values(self.spaces.pressure)?,
                seepage: face_values(self.spaces.seepage)?,
            };
            self.add_displacement_terms(context, &faces, penalty, output);
            self.add_seepage_terms(context, &faces, penalty, output);
        }
        Ok(())
    }
}
