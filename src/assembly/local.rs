//! Element-level quadrature loop of the mixed poroelastic system.
use crate::assembly::layout::BlockLayout;
use crate::config::PoroConfig;
use crate::field::{Field, FieldGroup};
use crate::space::ElementValues;
use nalgebra::{DMatrix, DVector, Point3};

/// A scalar function of the physical coordinates, such as an analytic source term.
pub trait SourceFunction: Sync {
    fn evaluate(&self, x: &Point3<f64>) -> f64;
}

impl<F> SourceFunction for F
where
    F: Fn(&Point3<f64>) -> f64 + Sync,
{
    fn evaluate(&self, x: &Point3<f64>) -> f64 {
        self(x)
    }
}

/// Dense element matrix and rhs vector.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementSystem {
    pub matrix: DMatrix<f64>,
    pub vector: DVector<f64>,
}

impl ElementSystem {
    pub fn zeros(n: usize) -> Self {
        Self {
            matrix: DMatrix::zeros(n, n),
            vector: DVector::zeros(n),
        }
    }

    /// Resizes to `n` local DOFs and fills with zeros.
    pub fn reset(&mut self, n: usize) {
        self.matrix.resize_mut(n, n, 0.0);
        self.matrix.fill(0.0);
        self.vector.resize_vertically_mut(n, 0.0);
        self.vector.fill(0.0);
    }
}

/// Values of the three field groups on the same element and quadrature rule.
#[derive(Debug, Clone, Copy)]
pub struct FieldValues<'a> {
    pub displacement: &'a ElementValues,
    pub pressure: &'a ElementValues,
    pub seepage: &'a ElementValues,
}

impl<'a> FieldValues<'a> {
    pub fn of(&self, group: FieldGroup) -> &'a ElementValues {
        match group {
            FieldGroup::Displacement => self.displacement,
            FieldGroup::Pressure => self.pressure,
            FieldGroup::Seepage => self.seepage,
        }
    }
}

/// Computes the element matrix and rhs of the Stokes/Darcy poroelastic system.
///
/// Blocks are addressed exclusively through the [`BlockLayout`], so every coupling term
/// lands in the block of the field it belongs to. The individual contributions are exposed
/// separately so that they can be inspected in isolation.
#[derive(Clone, Copy)]
pub struct LocalBlockAssembler<'a> {
    config: &'a PoroConfig,
    forcing: Option<&'a dyn SourceFunction>,
}

impl<'a> LocalBlockAssembler<'a> {
    pub fn new(config: &'a PoroConfig) -> Self {
        Self { config, forcing: None }
    }

    /// Adds the analytic source to the mass balance. Ignored unless
    /// `analytic_forcing_enabled` is set in the configuration.
    pub fn with_forcing(mut self, forcing: &'a dyn SourceFunction) -> Self {
        self.forcing = Some(forcing);
        self
    }

    /// Zeroes `output` and accumulates all volume contributions of one element.
    ///
    /// `old_displacement` holds the displacement of the previous time step with one row per
    /// solid component and one column per local displacement DOF.
    ///
    /// # Panics
    ///
    /// Panics if the values do not match the layout or were evaluated with different rules.
    pub fn assemble_element(
        &self,
        layout: &BlockLayout,
        values: &FieldValues,
        old_displacement: &DMatrix<f64>,
        output: &mut ElementSystem,
    ) {
        let d = layout.dimension().dim();
        let n_points = values.displacement.n_points();
        assert_eq!(values.pressure.n_points(), n_points, "All fields must share the quadrature rule");
        assert_eq!(values.seepage.n_points(), n_points, "All fields must share the quadrature rule");
        for &field in Field::ordered(layout.dimension()) {
            assert_eq!(
                layout.block(field).len,
                values.of(field.group()).n_basis(),
                "Block of field {field} does not match its basis"
            );
        }
        assert_eq!(old_displacement.shape(), (d, values.displacement.n_basis()));

        output.reset(layout.total());
        for q in 0..n_points {
            self.add_momentum(layout, values.displacement, q, output);
            self.add_pressure_coupling(layout, values, q, output);
            self.add_mass_conservation(layout, values, q, output);
            self.add_darcy(layout, values, q, output);
            self.add_sources(layout, values, old_displacement, q, output);
        }
    }

    /// Viscous and volumetric terms of the solid momentum balance at quadrature point `q`.
    pub fn add_momentum(&self, layout: &BlockLayout, phi: &ElementValues, q: usize, output: &mut ElementSystem) {
        let mu = self.config.viscosity;
        let lambda = self.config.lambda;
        let jxw = phi.jxw(q);
        let n = phi.n_basis();
        let solid = Field::solid(layout.dimension());

        for (a, &row) in solid.iter().enumerate() {
            for (b, &col) in solid.iter().enumerate() {
                let mut k = layout.matrix_block_mut(&mut output.matrix, row, col);
                for i in 0..n {
                    let gi = phi.grad(i, q);
                    for j in 0..n {
                        let gj = phi.grad(j, q);
                        let viscous = if a == b {
                            let cross: f64 = (0..solid.len())
                                .filter(|&c| c != a)
                                .map(|c| gi[c] * gj[c])
                                .sum();
                            gi[a] * gj[a] + 0.5 * cross
                        } else {
                            0.5 * gi[b] * gj[a]
                        };
                        k[(i, j)] += jxw * (2.0 * mu * viscous + lambda * gi[a] * gj[b]);
                    }
                }
            }
        }
    }

    /// Pressure gradient in the momentum balance: `K_ap(i, j) -= JxW ∂_a φ_i ψ_j`.
    pub fn add_pressure_coupling(
        &self,
        layout: &BlockLayout,
        values: &FieldValues,
        q: usize,
        output: &mut ElementSystem,
    ) {
        let (phi, psi) = (values.displacement, values.pressure);
        let jxw = phi.jxw(q);
        for (a, &row) in Field::solid(layout.dimension()).iter().enumerate() {
            let mut k = layout.matrix_block_mut(&mut output.matrix, row, Field::Pressure);
            for i in 0..phi.n_basis() {
                for j in 0..psi.n_basis() {
                    k[(i, j)] -= jxw * phi.grad(i, q)[a] * psi.phi(j, q);
                }
            }
        }
    }

    /// Mass balance rows: divergence of the solid velocity and `dt` times the divergence of
    /// the seepage velocity.
    pub fn add_mass_conservation(
        &self,
        layout: &BlockLayout,
        values: &FieldValues,
        q: usize,
        output: &mut ElementSystem,
    ) {
        let (phi, psi, f) = (values.displacement, values.pressure, values.seepage);
        let jxw = phi.jxw(q);
        let dt = self.config.dt;
        let dim = layout.dimension();

        for (a, &col) in Field::solid(dim).iter().enumerate() {
            let mut k = layout.matrix_block_mut(&mut output.matrix, Field::Pressure, col);
            for i in 0..psi.n_basis() {
                for j in 0..phi.n_basis() {
                    k[(i, j)] += jxw * psi.phi(i, q) * phi.grad(j, q)[a];
                }
            }
        }
        for (c, &col) in Field::seepage(dim).iter().enumerate() {
            let mut k = layout.matrix_block_mut(&mut output.matrix, Field::Pressure, col);
            for i in 0..psi.n_basis() {
                for j in 0..f.n_basis() {
                    k[(i, j)] += dt * jxw * psi.phi(i, q) * f.grad(j, q)[c];
                }
            }
        }
    }

    /// Darcy law for each seepage component: `(1/κ) u_c - ∂_c p`.
    pub fn add_darcy(&self, layout: &BlockLayout, values: &FieldValues, q: usize, output: &mut ElementSystem) {
        let (psi, f) = (values.pressure, values.seepage);
        let jxw = f.jxw(q);
        let inverse_permeability = 1.0 / self.config.permeability;

        for (c, &field) in Field::seepage(layout.dimension()).iter().enumerate() {
            {
                let mut k = layout.matrix_block_mut(&mut output.matrix, field, field);
                for i in 0..f.n_basis() {
                    for j in 0..f.n_basis() {
                        k[(i, j)] += inverse_permeability * jxw * f.phi(i, q) * f.phi(j, q);
                    }
                }
            }
            let mut k = layout.matrix_block_mut(&mut output.matrix, field, Field::Pressure);
            for i in 0..f.n_basis() {
                for j in 0..psi.n_basis() {
                    k[(i, j)] -= jxw * f.grad(i, q)[c] * psi.phi(j, q);
                }
            }
        }
    }

    /// Mass balance rhs: divergence of the previous displacement plus the optional source.
    pub fn add_sources(
        &self,
        layout: &BlockLayout,
        values: &FieldValues,
        old_displacement: &DMatrix<f64>,
        q: usize,
        output: &mut ElementSystem,
    ) {
        let (phi, psi) = (values.displacement, values.pressure);
        let jxw = phi.jxw(q);
        let d = layout.dimension().dim();

        let mut div_old = 0.0;
        for a in 0..d {
            for l in 0..phi.n_basis() {
                div_old += phi.grad(l, q)[a] * old_displacement[(a, l)];
            }
        }
        let source = match self.forcing {
            Some(forcing) if self.config.analytic_forcing_enabled => forcing.evaluate(psi.point(q)),
            _ => 0.0,
        };

        let mut f_p = layout.vector_block_mut(&mut output.vector, Field::Pressure);
        for i in 0..psi.n_basis() {
            f_p[i] += (div_old + source) * jxw * psi.phi(i, q);
        }
    }
}
