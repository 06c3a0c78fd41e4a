//! Binding of index expressions to output tensors.
use crate::error::{FreeIndexReason, IndexBinding, SpecificationError};
use crate::expression::{Expr, Indices};
use crate::tensor::{Entity, Tensor};
use itertools::Itertools;
use log::debug;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// A validated definition `lhs[indices] <= rhs`.
///
/// Evaluating the equation produces a complete new value for the left-hand side: every entry is
/// the Einstein summation of the right-hand side over the contracted letters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Equation {
    lhs: Tensor,
    lhs_indices: Indices,
    rhs: Expr,
    contracted: BTreeSet<char>,
}

impl Equation {
    pub fn lhs(&self) -> &Tensor {
        &self.lhs
    }

    pub fn rhs(&self) -> &Expr {
        &self.rhs
    }

    /// The output letters, in axis order of the left-hand side.
    pub fn free_indices(&self) -> &Indices {
        &self.lhs_indices
    }

    /// The letters summed over in at least one additive term.
    pub fn contracted_indices(&self) -> &BTreeSet<char> {
        &self.contracted
    }

    pub fn terms(&self) -> Vec<&Expr> {
        self.rhs.terms()
    }

    /// The entities read by the right-hand side, in order of first use and without repetition.
    ///
    /// Scalar coefficients are included after the referenced entities.
    pub fn inputs(&self) -> Vec<Entity> {
        let mut inputs: Vec<Entity> = Vec::new();
        self.rhs.for_each_entity(&mut |entity| inputs.push(entity.clone()));
        self.rhs
            .for_each_coefficient(&mut |scalar| inputs.push(scalar.into()));
        inputs
            .into_iter()
            .unique_by(|entity| entity.name().to_string())
            .collect()
    }

    /// Validates the equation again from its parts.
    pub fn rebind(&self) -> Result<Equation, SpecificationError> {
        bind(&self.lhs, &self.lhs_indices.to_string(), self.rhs.clone())
    }
}

impl fmt::Display for Equation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}] <= {}", self.lhs.name(), self.lhs_indices, self.rhs)
    }
}

/// Binds `rhs` to the tensor `lhs` indexed by `indices`.
///
/// Each additive term of `rhs` is checked on its own:
///
/// - every output letter must occur in the term, bound to an axis of the same size as the
///   corresponding axis of `lhs`,
/// - every letter that occurs exactly once in the term must be an output letter,
/// - all other letters of the term are contracted.
///
/// Output letters may occur several times in a term, in which case the axis is carried through
/// element-wise rather than summed.
pub fn bind(lhs: &Tensor, indices: &str, rhs: Expr) -> Result<Equation, SpecificationError> {
    let lhs_indices = Indices::new(indices);
    if lhs_indices.len() != lhs.rank() {
        return Err(SpecificationError::RankMismatch {
            entity: lhs.name().to_string(),
            rank: lhs.rank(),
            indices: lhs_indices.to_string(),
        });
    }
    if let Some(duplicate) = lhs_indices.first_duplicate() {
        return Err(SpecificationError::FreeIndexMismatch {
            index: Some(duplicate),
            expected: lhs_indices.to_string(),
            found: lhs_indices.to_string(),
            reason: FreeIndexReason::DuplicateInLhs,
        });
    }

    let mut contracted = BTreeSet::new();
    for term in rhs.terms() {
        check_term(lhs, &lhs_indices, term)?;
        // Includes letters summed inside nested sums, which the term's signature does not carry
        term.for_each_reference(&mut |_, indices| {
            contracted.extend(
                indices
                    .letters()
                    .iter()
                    .filter(|&&index| !lhs_indices.contains(index)),
            )
        });
    }

    debug!(
        "bound {}[{}] with contracted indices {{{}}}",
        lhs.name(),
        lhs_indices,
        contracted.iter().join(",")
    );
    Ok(Equation {
        lhs: lhs.clone(),
        lhs_indices,
        rhs,
        contracted,
    })
}

fn check_term(lhs: &Tensor, lhs_indices: &Indices, term: &Expr) -> Result<(), SpecificationError> {
    let signature = term.signature();
    let found = || signature.letters().collect::<String>();

    for (&index, size) in lhs_indices.letters().iter().zip(lhs.shape()) {
        let occurrence = signature
            .get(index)
            .ok_or_else(|| SpecificationError::FreeIndexMismatch {
                index: Some(index),
                expected: lhs_indices.to_string(),
                found: found(),
                reason: FreeIndexReason::MissingFromTerm,
            })?;
        if &occurrence.size != size {
            return Err(SpecificationError::SizeMismatch {
                index,
                first: occurrence.binding(),
                second: IndexBinding::new(lhs.name(), size.clone()),
            });
        }
    }

    if let Some(unmatched) = signature
        .exposed()
        .find(|occurrence| !lhs_indices.contains(occurrence.index))
    {
        return Err(SpecificationError::FreeIndexMismatch {
            index: Some(unmatched.index),
            expected: lhs_indices.to_string(),
            found: found(),
            reason: FreeIndexReason::NotInLhs,
        });
    }
    Ok(())
}
