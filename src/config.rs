//! Immutable configuration of one assembly pass.
use crate::error::AssemblyError;
use crate::field::{Dimension, FieldGroup};
use crate::space::FunctionSpace;
use log::warn;
use serde::{Deserialize, Serialize};

/// Penalties above this magnitude are reported as a conditioning hazard.
pub const PENALTY_WARNING_THRESHOLD: f64 = 1e8;

/// Strategy used to enforce Dirichlet data. Exactly one is active per pass.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BcStrategy {
    /// Zero constrained rows of the closed global system and overwrite the rhs.
    RowElimination,
    /// Add a large diagonal coefficient during local assembly.
    Penalty,
    /// Weak enforcement through face integrals (Nitsche-type).
    BoundaryIntegral,
}

impl Default for BcStrategy {
    fn default() -> Self {
        Self::RowElimination
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LameParameters {
    pub mu: f64,
    pub lambda: f64,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct YoungPoisson {
    pub young: f64,
    pub poisson: f64,
}

impl From<YoungPoisson> for LameParameters {
    fn from(params: YoungPoisson) -> Self {
        let YoungPoisson { young, poisson } = params;
        let mu = 0.5 * young / (1.0 + poisson);
        let lambda = young * poisson / ((1.0 + poisson) * (1.0 - 2.0 * poisson));
        Self { mu, lambda }
    }
}

/// Function spaces used for each field group.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpaces {
    pub displacement: FunctionSpace,
    pub pressure: FunctionSpace,
    pub seepage: FunctionSpace,
}

impl Default for FieldSpaces {
    /// Bilinear/trilinear displacement and seepage, piecewise constant pressure.
    fn default() -> Self {
        Self {
            displacement: FunctionSpace::Lagrange1,
            pressure: FunctionSpace::Constant,
            seepage: FunctionSpace::Lagrange1,
        }
    }
}

impl FieldSpaces {
    pub fn of(&self, group: FieldGroup) -> FunctionSpace {
        match group {
            FieldGroup::Displacement => self.displacement,
            FieldGroup::Pressure => self.pressure,
            FieldGroup::Seepage => self.seepage,
        }
    }
}

/// Coefficients and switches for the poroelastic assembly.
///
/// The configuration is validated once and then shared immutably by every component of the
/// pass. Missing fields take their defaults when deserializing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoroConfig {
    /// Viscosity-like shear coefficient (Lamé `mu`).
    pub viscosity: f64,
    /// Volumetric coefficient (Lamé `lambda`).
    pub lambda: f64,
    /// Permeability `kappa`; the Darcy block is scaled by `1 / kappa`.
    pub permeability: f64,
    pub dt: f64,
    pub stabilization_gain: f64,
    pub dimension: Dimension,
    pub bc_strategy: BcStrategy,
    pub stabilization_enabled: bool,
    pub analytic_forcing_enabled: bool,
    /// Diagonal coefficient of the penalty strategy.
    pub penalty: f64,
    /// Apply the pressure row-elimination pass. Disabled by default.
    pub pin_pressure: bool,
    /// Dimensionless penalty of the boundary-integral strategy, divided by the element size.
    pub nitsche_gamma: f64,
    pub quadrature_points_per_dim: usize,
    pub spaces: FieldSpaces,
}

impl Default for PoroConfig {
    fn default() -> Self {
        let LameParameters { mu, lambda } = YoungPoisson {
            young: 1.0,
            poisson: 0.15,
        }
        .into();
        Self {
            viscosity: mu,
            lambda,
            permeability: 0.1,
            dt: 1.0,
            stabilization_gain: 1.0,
            dimension: Dimension::Two,
            bc_strategy: BcStrategy::RowElimination,
            stabilization_enabled: true,
            analytic_forcing_enabled: false,
            penalty: 1e10,
            pin_pressure: false,
            nitsche_gamma: 10.0,
            quadrature_points_per_dim: 2,
            spaces: FieldSpaces::default(),
        }
    }
}

impl PoroConfig {
    pub fn with_lame(mut self, lame: impl Into<LameParameters>) -> Self {
        let LameParameters { mu, lambda } = lame.into();
        self.viscosity = mu;
        self.lambda = lambda;
        self
    }

    pub fn with_dimension(mut self, dimension: Dimension) -> Self {
        self.dimension = dimension;
        self
    }

    pub fn with_bc_strategy(mut self, strategy: BcStrategy) -> Self {
        self.bc_strategy = strategy;
        self
    }

    pub fn lame(&self) -> LameParameters {
        LameParameters {
            mu: self.viscosity,
            lambda: self.lambda,
        }
    }

    /// Checks the coefficients for values that would make the system meaningless.
    ///
    /// Also emits the conditioning warning for large penalties, so that it is reported once
    /// per pass rather than once per element.
    pub fn validate(&self) -> Result<(), AssemblyError> {
        let reject = |msg: String| Err(AssemblyError::InvalidConfiguration(msg));
        if !(self.permeability > 0.0) {
            return reject(format!("permeability must be positive, got {}", self.permeability));
        }
        if !(self.dt > 0.0) {
            return reject(format!("time step must be positive, got {}", self.dt));
        }
        if !self.viscosity.is_finite() || !self.lambda.is_finite() {
            return reject("elastic coefficients must be finite".to_string());
        }
        if !(self.stabilization_gain >= 0.0) {
            return reject(format!(
                "stabilization gain must be non-negative, got {}",
                self.stabilization_gain
            ));
        }
        if self.quadrature_points_per_dim == 0 {
            return reject("quadrature needs at least one point per dimension".to_string());
        }
        if self.spaces.displacement != FunctionSpace::Lagrange1 {
            return reject("displacement fields require a nodal (Lagrange1) space".to_string());
        }
        match self.bc_strategy {
            BcStrategy::Penalty => {
                if !(self.penalty > 0.0) {
                    return reject(format!("penalty must be positive, got {}", self.penalty));
                }
                if self.penalty > PENALTY_WARNING_THRESHOLD {
                    warn!(
                        "Penalty boundary conditions with coefficient {:e} will make the system \
                         ill-conditioned; expect a loss of accuracy proportional to the penalty",
                        self.penalty
                    );
                }
            }
            BcStrategy::BoundaryIntegral => {
                if !(self.nitsche_gamma > 0.0) {
                    return reject(format!("Nitsche penalty must be positive, got {}", self.nitsche_gamma));
                }
            }
            BcStrategy::RowElimination => {}
        }
        Ok(())
    }
}
