//! Declaration of named tensors and scalars.
//!
//! Every quantity that takes part in an index expression is declared once through a
//! [`TensorModel`], which guarantees that names are unique within a specification and that
//! every axis has a valid extent. Declared entities are immutable and compare by name.
use crate::error::SpecificationError;
use log::trace;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// An opaque, symbolic axis extent such as `Nq` or `Nbf`.
///
/// Tokens are only ever compared for identity; two differently named tokens never compare equal,
/// even if they later resolve to the same number.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SizeToken(String);

impl SizeToken {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SizeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The extent of a single tensor axis.
///
/// Serialized untagged, so that `4` deserializes to a fixed size and `"Nq"` to a symbolic one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Size {
    Fixed(usize),
    Symbolic(SizeToken),
}

impl Size {
    pub fn symbolic(name: impl Into<String>) -> Self {
        Size::Symbolic(SizeToken::new(name))
    }

    /// Whether the size can be used as an axis extent.
    ///
    /// Fixed sizes must be positive and symbolic tokens must be non-empty.
    pub fn is_valid(&self) -> bool {
        match self {
            Size::Fixed(n) => *n > 0,
            Size::Symbolic(token) => !token.as_str().is_empty(),
        }
    }
}

impl From<usize> for Size {
    fn from(n: usize) -> Self {
        Size::Fixed(n)
    }
}

impl From<&str> for Size {
    fn from(name: &str) -> Self {
        Size::symbolic(name)
    }
}

impl From<SizeToken> for Size {
    fn from(token: SizeToken) -> Self {
        Size::Symbolic(token)
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Size::Fixed(n) => write!(f, "{n}"),
            Size::Symbolic(token) => write!(f, "{token}"),
        }
    }
}

/// A named quantity with a fixed shape.
///
/// Two tensors are the same entity if and only if they have the same name.
#[derive(Debug, Clone, Serialize)]
pub struct Tensor {
    name: String,
    shape: Vec<Size>,
}

impl Tensor {
    pub(crate) fn new_unchecked(name: String, shape: Vec<Size>) -> Self {
        Self { name, shape }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shape(&self) -> &[Size] {
        &self.shape
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }
}

impl PartialEq for Tensor {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Tensor {}

impl Hash for Tensor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state)
    }
}

/// A named rank-0 quantity, typically a penalty or weighting coefficient.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Scalar {
    name: String,
}

impl Scalar {
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Anything that can be referenced in an index expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum Entity {
    Tensor(Tensor),
    Scalar(Scalar),
}

impl Entity {
    pub fn name(&self) -> &str {
        match self {
            Entity::Tensor(tensor) => tensor.name(),
            Entity::Scalar(scalar) => scalar.name(),
        }
    }

    /// The shape of the entity. Scalars have an empty shape.
    pub fn shape(&self) -> &[Size] {
        match self {
            Entity::Tensor(tensor) => tensor.shape(),
            Entity::Scalar(_) => &[],
        }
    }

    pub fn rank(&self) -> usize {
        self.shape().len()
    }
}

impl From<Tensor> for Entity {
    fn from(tensor: Tensor) -> Self {
        Entity::Tensor(tensor)
    }
}

impl From<&Tensor> for Entity {
    fn from(tensor: &Tensor) -> Self {
        Entity::Tensor(tensor.clone())
    }
}

impl From<Scalar> for Entity {
    fn from(scalar: Scalar) -> Self {
        Entity::Scalar(scalar)
    }
}

impl From<&Scalar> for Entity {
    fn from(scalar: &Scalar) -> Self {
        Entity::Scalar(scalar.clone())
    }
}

/// Registry of the entities declared for a single specification.
#[derive(Debug, Clone, Default)]
pub struct TensorModel {
    names: FxHashSet<String>,
}

impl TensorModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a tensor with the given name and shape.
    ///
    /// Fails if the name is empty or already taken, or if any axis has an invalid size.
    pub fn declare_tensor(
        &mut self,
        name: impl Into<String>,
        shape: impl IntoIterator<Item = Size>,
    ) -> Result<Tensor, SpecificationError> {
        let name = name.into();
        let shape: Vec<Size> = shape.into_iter().collect();
        self.check_name(&name)?;
        if let Some(axis) = shape.iter().position(|size| !size.is_valid()) {
            return Err(SpecificationError::InvalidShape { entity: name, axis });
        }
        trace!("declared tensor {name} with rank {}", shape.len());
        self.names.insert(name.clone());
        Ok(Tensor::new_unchecked(name, shape))
    }

    /// Declares a tensor with the same shape as an existing one.
    pub fn declare_tensor_like(&mut self, name: impl Into<String>, other: &Tensor) -> Result<Tensor, SpecificationError> {
        self.declare_tensor(name, other.shape().iter().cloned())
    }

    pub fn declare_scalar(&mut self, name: impl Into<String>) -> Result<Scalar, SpecificationError> {
        let name = name.into();
        self.check_name(&name)?;
        trace!("declared scalar {name}");
        self.names.insert(name.clone());
        Ok(Scalar { name })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    fn check_name(&self, name: &str) -> Result<(), SpecificationError> {
        if name.is_empty() {
            Err(SpecificationError::InvalidName)
        } else if self.names.contains(name) {
            Err(SpecificationError::DuplicateName { name: name.to_string() })
        } else {
            Ok(())
        }
    }
}
