//! Dimension parameters of the DG-Poisson kernels.
use serde::{Deserialize, Serialize};
use tensorform::{Size, SpecificationError};

/// The extents that the Poisson kernels are specified over.
///
/// Every entry is either a concrete number or a symbolic token that the kernel generator resolves.
/// In serialized form integers are read as fixed sizes and strings as symbolic tokens:
///
/// ```
/// # use tensorform_poisson::DimensionParameters;
/// # use tensorform::Size;
/// let parameters: DimensionParameters = serde_json::from_str(
///     r#"{ "dim": 2, "facet_basis": "nbf", "element_basis": "Nbf",
///          "facet_quadrature": "nq", "volume_quadrature": "Nq" }"#,
/// ).unwrap();
/// assert_eq!(parameters.dim, Size::Fixed(2));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionParameters {
    /// Number of spatial dimensions.
    pub dim: Size,
    /// Number of basis functions on a facet.
    pub facet_basis: Size,
    /// Number of basis functions on an element.
    pub element_basis: Size,
    /// Number of facet quadrature points.
    pub facet_quadrature: Size,
    /// Number of volume quadrature points.
    pub volume_quadrature: Size,
}

impl Default for DimensionParameters {
    fn default() -> Self {
        Self {
            dim: Size::symbolic("dim"),
            facet_basis: Size::symbolic("nbf"),
            element_basis: Size::symbolic("Nbf"),
            facet_quadrature: Size::symbolic("nq"),
            volume_quadrature: Size::symbolic("Nq"),
        }
    }
}

impl DimensionParameters {
    /// Checks that every parameter is a usable axis extent.
    pub fn validate(&self) -> Result<(), SpecificationError> {
        let entries = [
            ("dim", &self.dim),
            ("facet_basis", &self.facet_basis),
            ("element_basis", &self.element_basis),
            ("facet_quadrature", &self.facet_quadrature),
            ("volume_quadrature", &self.volume_quadrature),
        ];
        match entries.into_iter().find(|(_, size)| !size.is_valid()) {
            Some((parameter, size)) => Err(SpecificationError::InvalidParameter {
                parameter,
                size: size.clone(),
            }),
            None => Ok(()),
        }
    }
}
