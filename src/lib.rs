//! Assembly of mixed Stokes/Darcy poroelastic finite element systems.
//!
//! The unknowns are the solid velocity/displacement (multilinear), a piecewise constant pressure
//! and the seepage (Darcy) velocity (multilinear) on quadrilateral or hexahedral meshes. One
//! assembly pass produces a sparse global matrix and rhs ready to be handed to a linear solver.
pub mod assembly;
pub mod config;
pub mod connectivity;
pub mod dof;
pub mod element;
pub mod error;
pub mod field;
pub mod mesh;
pub mod quadrature;
pub mod space;

pub extern crate nalgebra;
pub extern crate nalgebra_sparse;

pub use assembly::PoroAssembler;
pub use config::PoroConfig;
pub use error::AssemblyError;
