//! Index-notation specification of finite element assembly kernels.
//!
//! Tensors and scalars are declared through a [`TensorModel`], combined into index expressions
//! and bound to output tensors as [`Equation`]s. Named, ordered groups of equations are then
//! registered with a [`KernelSpecification`], which hands them to a [`Generator`] backend.
//!
//! ```
//! use tensorform::{bind, product_of, KernelSpecification, RecordingGenerator, Size, TensorModel};
//!
//! # fn main() -> eyre::Result<()> {
//! let (nbf, nq) = (Size::symbolic("Nbf"), Size::symbolic("Nq"));
//! let mut model = TensorModel::new();
//! let e = model.declare_tensor("E", [nbf.clone(), nq.clone()])?;
//! let w = model.declare_tensor("W", [nq.clone()])?;
//! let m = model.declare_tensor("M", [nbf.clone(), nbf])?;
//!
//! let mass = bind(&m, "kl", product_of([w.at("q")?, e.at("kq")?, e.at("lq")?])?)?;
//! assert_eq!(mass.contracted_indices().iter().collect::<String>(), "q");
//!
//! let mut spec = KernelSpecification::new(RecordingGenerator::new());
//! spec.add("mass", [mass])?;
//! assert_eq!(spec.generator().names(), ["mass"]);
//! # Ok(())
//! # }
//! ```
pub mod equation;
pub mod error;
pub mod eval;
pub mod expression;
pub mod kernel;
pub mod tensor;

#[cfg(feature = "proptest-support")]
pub mod proptest;

pub use equation::{bind, Equation};
pub use error::{FreeIndexReason, IndexBinding, SpecificationError};
pub use expression::{product, product_of, reference, scale, sum, Coefficient, Expr, Indices, Node};
pub use kernel::{Generator, KernelGroup, KernelSpecification, RecordingGenerator};
pub use tensor::{Entity, Scalar, Size, SizeToken, Tensor, TensorModel};

pub extern crate nalgebra;
