//! Assembly of the global poroelastic system.
//!
//! [`PoroAssembler`] runs one pass: element contributions are computed in parallel, scattered
//! into a [`GlobalSystem`] serially in element order, and the boundary strategy completes the
//! system.
use crate::assembly::boundary::{
    strategy_for, BoundaryConditionStrategy, ConstraintSet, DirichletBoundary, ElementContext, NoBoundary,
};
use crate::assembly::global::GlobalSystem;
use crate::assembly::layout::BlockLayout;
use crate::assembly::local::{ElementSystem, FieldValues, LocalBlockAssembler, SourceFunction};
use crate::assembly::stabilization::{pressure_jump_terms, StabilizationTerm};
use crate::config::PoroConfig;
use crate::dof::{DofMap, ElementDofs};
use crate::element::ReferenceElement;
use crate::error::AssemblyError;
use crate::field::{Field, FieldGroup};
use crate::mesh::Topology;
use crate::quadrature::QuadratureRule;
use crate::space::ElementValues;
use eyre::WrapErr;
use log::{debug, info};
use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;

pub mod boundary;
pub mod global;
pub mod layout;
pub mod local;
pub mod stabilization;

static NO_BOUNDARY: NoBoundary = NoBoundary;

/// Everything one element contributes to a pass.
#[derive(Debug, Clone)]
pub struct ElementContribution {
    pub dofs: ElementDofs,
    pub system: ElementSystem,
    pub stabilization: Vec<StabilizationTerm>,
    pub constraints: ConstraintSet,
}

/// Assembles the mixed Stokes/Darcy system on a mesh.
///
/// The configuration is validated and the boundary strategy is selected on construction;
/// both stay fixed for the lifetime of the assembler.
pub struct PoroAssembler<'a, M> {
    topology: &'a M,
    dofs: &'a DofMap,
    config: &'a PoroConfig,
    boundary: &'a dyn DirichletBoundary,
    forcing: Option<&'a dyn SourceFunction>,
    previous: Option<&'a DVector<f64>>,
    strategy: Box<dyn BoundaryConditionStrategy>,
    rule: QuadratureRule,
}

impl<'a, M> PoroAssembler<'a, M>
where
    M: Topology,
{
    pub fn new(topology: &'a M, dofs: &'a DofMap, config: &'a PoroConfig) -> eyre::Result<Self> {
        config.validate().wrap_err("failed to set up poroelastic assembly")?;
        if topology.dimension() != config.dimension || dofs.dimension() != config.dimension {
            return Err(AssemblyError::InvalidConfiguration(format!(
                "configured for {:?} but the mesh is {:?} and the DOF map {:?}",
                config.dimension,
                topology.dimension(),
                dofs.dimension()
            ))
            .into());
        }
        if dofs.spaces() != &config.spaces {
            return Err(AssemblyError::InvalidConfiguration(
                "DOF map was numbered for different function spaces".to_string(),
            )
            .into());
        }

        let strategy = strategy_for(config);
        debug!("Using {} boundary conditions", strategy.name());
        let reference = match topology.num_elements() {
            0 => ReferenceElement::Quad4,
            _ => topology.reference_element(0),
        };
        Ok(Self {
            topology,
            dofs,
            config,
            boundary: &NO_BOUNDARY,
            forcing: None,
            previous: None,
            strategy,
            rule: QuadratureRule::gauss(reference, config.quadrature_points_per_dim),
        })
    }

    pub fn with_boundary(mut self, boundary: &'a dyn DirichletBoundary) -> Self {
        self.boundary = boundary;
        self
    }

    /// Analytic source of the mass balance, used when `analytic_forcing_enabled` is set.
    pub fn with_forcing(mut self, forcing: &'a dyn SourceFunction) -> Self {
        self.forcing = Some(forcing);
        self
    }

    /// Global solution of the previous time step. Its displacement drives the mass balance rhs.
    pub fn with_previous_solution(mut self, previous: &'a DVector<f64>) -> Self {
        self.previous = Some(previous);
        self
    }

    pub fn config(&self) -> &PoroConfig {
        self.config
    }

    fn quadrature_rule(&self, element: usize) -> QuadratureRule {
        let reference = self.topology.reference_element(element);
        if self.topology.reference_element(0) == reference {
            self.rule.clone()
        } else {
            QuadratureRule::gauss(reference, self.config.quadrature_points_per_dim)
        }
    }

    /// Previous displacement on the element, one row per solid component.
    fn old_displacement(&self, dofs: &ElementDofs, n_basis: usize) -> Result<DMatrix<f64>, AssemblyError> {
        let solid = Field::solid(self.config.dimension);
        let mut old = DMatrix::zeros(solid.len(), n_basis);
        if let Some(previous) = self.previous {
            if previous.len() != self.dofs.num_dofs() {
                return Err(AssemblyError::InvalidConfiguration(format!(
                    "previous solution has length {}, but there are {} DOFs",
                    previous.len(),
                    self.dofs.num_dofs()
                )));
            }
            for (a, &field) in solid.iter().enumerate() {
                for (l, &dof) in dofs.field(field).iter().enumerate() {
                    old[(a, l)] = previous[dof];
                }
            }
        }
        Ok(old)
    }

    /// Computes the contribution of a single element without touching any global state.
    pub fn assemble_element(&self, element: usize) -> Result<ElementContribution, AssemblyError> {
        let topology = self.topology;
        let dofs = self.dofs.element_dofs(topology, element);
        let layout = BlockLayout::new(element, self.config.dimension, &dofs.counts())?;

        let reference = topology.reference_element(element);
        let vertices = topology.element_vertices(element);
        let rule = self.quadrature_rule(element);
        let evaluate = |group: FieldGroup| {
            ElementValues::new(self.config.spaces.of(group), reference, &vertices, &rule)
                .map_err(|err| AssemblyError::precondition(element, err.to_string()))
        };
        let displacement = evaluate(FieldGroup::Displacement)?;
        let pressure = evaluate(FieldGroup::Pressure)?;
        let seepage = evaluate(FieldGroup::Seepage)?;
        let values = FieldValues {
            displacement: &displacement,
            pressure: &pressure,
            seepage: &seepage,
        };

        let mut local = LocalBlockAssembler::new(self.config);
        if let Some(forcing) = self.forcing {
            local = local.with_forcing(forcing);
        }
        let old = self.old_displacement(&dofs, displacement.n_basis())?;
        let mut system = ElementSystem::zeros(layout.total());
        local.assemble_element(&layout, &values, &old, &mut system);

        let context = ElementContext {
            element,
            topology,
            dofs: self.dofs,
            layout: &layout,
            boundary: self.boundary,
            vertices: &vertices,
        };
        self.strategy.apply_local(&context, &mut system)?;
        let constraints = self.strategy.collect_constraints(&context);

        let stabilization = if self.config.stabilization_enabled {
            pressure_jump_terms(topology, self.dofs, self.config, element)?
        } else {
            Vec::new()
        };

        Ok(ElementContribution {
            dofs,
            system,
            stabilization,
            constraints,
        })
    }

    /// Assembles a fresh global system owning the DOF map's owned range.
    pub fn assemble(&self) -> eyre::Result<GlobalSystem> {
        let mut system = GlobalSystem::new(self.dofs.num_dofs(), self.dofs.owned_range());
        self.assemble_into(&mut system)?;
        Ok(system)
    }

    /// Adds one full pass to `system` and applies the boundary strategy.
    ///
    /// On error, `system` is left untouched.
    pub fn assemble_into(&self, system: &mut GlobalSystem) -> eyre::Result<()> {
        if system.size() != self.dofs.num_dofs() {
            return Err(AssemblyError::InvalidConfiguration(format!(
                "global system has size {}, but there are {} DOFs",
                system.size(),
                self.dofs.num_dofs()
            ))
            .into());
        }
        if self.config.analytic_forcing_enabled && self.forcing.is_none() {
            return Err(AssemblyError::InvalidConfiguration(
                "analytic forcing is enabled, but no source function was provided".to_string(),
            )
            .into());
        }

        let contributions = (0..self.topology.num_elements())
            .into_par_iter()
            .map(|element| {
                self.assemble_element(element)
                    .wrap_err_with(|| format!("failed to assemble element {element}"))
            })
            .collect::<eyre::Result<Vec<_>>>()?;

        let mut constraints = ConstraintSet::default();
        for contribution in contributions {
            let indices = contribution.dofs.all();
            system.add_matrix(&contribution.system.matrix, indices, indices);
            system.add_vector(&contribution.system.vector, indices);
            for term in &contribution.stabilization {
                system.add_entry(term.row, term.col, term.coefficient);
            }
            constraints.extend(contribution.constraints);
        }

        self.strategy
            .finalize(system, &constraints)
            .wrap_err("failed to apply boundary conditions")?;
        info!("rhs l2 norm: {:e}", system.rhs_norm());
        Ok(())
    }
}
