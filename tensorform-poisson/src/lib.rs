//! Discontinuous Galerkin kernels for the Poisson equation, specified with `tensorform`.
use log::info;
use tensorform::{Generator, KernelSpecification, TensorModel};

mod kernels;
mod parameters;
mod tensors;

pub use kernels::*;
pub use parameters::*;
pub use tensors::*;

pub const ASSEMBLE_VOLUME: &str = "assembleVolume";
pub const ASSEMBLE_FACET_LOCAL: &str = "assembleFacetLocal";
pub const ASSEMBLE_FACET_NEIGHBOUR: &str = "assembleFacetNeighbour";
pub const RHS_VOLUME: &str = "rhsVolume";
pub const RHS_FACET: &str = "rhsFacet";

/// Registers all Poisson kernel groups with the given specification.
///
/// The groups are added in the order [`ASSEMBLE_VOLUME`], [`ASSEMBLE_FACET_LOCAL`],
/// [`ASSEMBLE_FACET_NEIGHBOUR`], [`RHS_VOLUME`], [`RHS_FACET`]. Returns the declared entities so
/// that callers can provide values for them.
pub fn add<G: Generator>(
    specification: &mut KernelSpecification<G>,
    parameters: &DimensionParameters,
) -> eyre::Result<PoissonTensors> {
    let mut model = TensorModel::new();
    let t = PoissonTensors::declare(&mut model, parameters)?;
    info!("declared {} Poisson entities", model.len());

    specification.add(ASSEMBLE_VOLUME, assemble_volume(&t)?)?;
    specification.add(ASSEMBLE_FACET_LOCAL, assemble_facet_local(&t)?)?;
    specification.add(ASSEMBLE_FACET_NEIGHBOUR, assemble_facet_neighbour(&t)?)?;
    specification.add(RHS_VOLUME, rhs_volume(&t)?)?;
    specification.add(RHS_FACET, rhs_facet(&t)?)?;
    Ok(t)
}
