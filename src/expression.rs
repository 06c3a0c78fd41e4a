//! Index-notation expressions over declared tensors and scalars.
//!
//! Expressions are built bottom-up from [`reference`]s with [`product`], [`scale`] and [`sum`].
//! Every node caches the index letters it carries together with their axis sizes and the number of
//! operand axes they are bound to, so that size conflicts are reported as soon as two operands are
//! combined. Whether a letter is summed over can only be decided once the expression is bound to
//! an output, see [`bind`](crate::equation::bind).
use crate::error::{FreeIndexReason, IndexBinding, SpecificationError};
use crate::tensor::{Entity, Scalar, Size, Tensor};
use itertools::Itertools;
use serde::{Serialize, Serializer};
use std::fmt;

/// An ordered string of index letters, one per tensor axis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Indices(Vec<char>);

impl Indices {
    pub fn new(letters: &str) -> Self {
        Self(letters.chars().collect())
    }

    pub fn letters(&self) -> &[char] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, index: char) -> bool {
        self.0.contains(&index)
    }

    /// Returns the first letter that occurs more than once, if any.
    pub fn first_duplicate(&self) -> Option<char> {
        self.0
            .iter()
            .enumerate()
            .find(|(i, c)| self.0[..*i].contains(c))
            .map(|(_, c)| *c)
    }
}

impl From<&str> for Indices {
    fn from(letters: &str) -> Self {
        Self::new(letters)
    }
}

impl fmt::Display for Indices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.iter().try_for_each(|c| write!(f, "{c}"))
    }
}

/// A multiplicative coefficient applied to an expression.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Coefficient {
    Scalar(Scalar),
    Constant(f64),
}

impl From<Scalar> for Coefficient {
    fn from(scalar: Scalar) -> Self {
        Coefficient::Scalar(scalar)
    }
}

impl From<&Scalar> for Coefficient {
    fn from(scalar: &Scalar) -> Self {
        Coefficient::Scalar(scalar.clone())
    }
}

impl From<f64> for Coefficient {
    fn from(value: f64) -> Self {
        Coefficient::Constant(value)
    }
}

impl fmt::Display for Coefficient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Coefficient::Scalar(scalar) => write!(f, "{}", scalar.name()),
            Coefficient::Constant(value) => write!(f, "{value}"),
        }
    }
}

/// How one index letter is used by an expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexOccurrence {
    pub index: char,
    pub size: Size,
    /// The entity that first bound the letter.
    pub entity: String,
    /// The number of operand axes the letter is bound to.
    pub count: usize,
}

impl IndexOccurrence {
    pub fn binding(&self) -> IndexBinding {
        IndexBinding::new(self.entity.clone(), self.size.clone())
    }
}

/// The index letters carried by an expression, in order of first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature(Vec<IndexOccurrence>);

impl Signature {
    pub fn get(&self, index: char) -> Option<&IndexOccurrence> {
        self.0.iter().find(|occurrence| occurrence.index == index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &IndexOccurrence> {
        self.0.iter()
    }

    pub fn letters(&self) -> impl Iterator<Item = char> + '_ {
        self.0.iter().map(|occurrence| occurrence.index)
    }

    /// Letters bound to exactly one operand axis.
    pub fn exposed(&self) -> impl Iterator<Item = &IndexOccurrence> {
        self.0.iter().filter(|occurrence| occurrence.count == 1)
    }

    fn bind(&mut self, occurrence: IndexOccurrence) -> Result<(), SpecificationError> {
        match self.0.iter_mut().find(|existing| existing.index == occurrence.index) {
            Some(existing) if existing.size != occurrence.size => Err(SpecificationError::SizeMismatch {
                index: occurrence.index,
                first: existing.binding(),
                second: occurrence.binding(),
            }),
            Some(existing) => {
                existing.count += occurrence.count;
                Ok(())
            }
            None => {
                self.0.push(occurrence);
                Ok(())
            }
        }
    }

    fn render_exposed(&self) -> String {
        render_free(&self.exposed().cloned().collect_vec())
    }
}

/// The kinds of expression nodes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Node {
    Ref { entity: Entity, indices: Indices },
    Product(Box<Expr>, Box<Expr>),
    Sum(Vec<Expr>),
    Scale(Coefficient, Box<Expr>),
}

/// An immutable, validated index expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    node: Node,
    signature: Signature,
}

impl Expr {
    pub fn node(&self) -> &Node {
        &self.node
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Visits every referenced entity in left-to-right order, including scalar coefficients.
    pub fn for_each_entity<'a>(&'a self, f: &mut impl FnMut(&'a Entity)) {
        match &self.node {
            Node::Ref { entity, .. } => f(entity),
            Node::Product(a, b) => {
                a.for_each_entity(f);
                b.for_each_entity(f);
            }
            Node::Sum(terms) => terms.iter().for_each(|term| term.for_each_entity(f)),
            Node::Scale(_, inner) => inner.for_each_entity(f),
        }
    }

    /// Visits every indexed reference in left-to-right order, including those inside nested sums.
    pub fn for_each_reference<'a>(&'a self, f: &mut impl FnMut(&'a Entity, &'a Indices)) {
        match &self.node {
            Node::Ref { entity, indices } => f(entity, indices),
            Node::Product(a, b) => {
                a.for_each_reference(f);
                b.for_each_reference(f);
            }
            Node::Sum(terms) => terms.iter().for_each(|term| term.for_each_reference(f)),
            Node::Scale(_, inner) => inner.for_each_reference(f),
        }
    }

    /// Visits every scalar used as a coefficient.
    pub fn for_each_coefficient<'a>(&'a self, f: &mut impl FnMut(&'a Scalar)) {
        match &self.node {
            Node::Ref { .. } => {}
            Node::Product(a, b) => {
                a.for_each_coefficient(f);
                b.for_each_coefficient(f);
            }
            Node::Sum(terms) => terms.iter().for_each(|term| term.for_each_coefficient(f)),
            Node::Scale(coefficient, inner) => {
                if let Coefficient::Scalar(scalar) = coefficient {
                    f(scalar);
                }
                inner.for_each_coefficient(f);
            }
        }
    }

    /// The additive terms of the expression, with nested top-level sums flattened.
    pub fn terms(&self) -> Vec<&Expr> {
        match &self.node {
            Node::Sum(terms) => terms.iter().flat_map(|term| term.terms()).collect(),
            _ => vec![self],
        }
    }

    fn is_sum(&self) -> bool {
        matches!(self.node, Node::Sum(_))
    }
}

impl Serialize for Expr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.node.serialize(serializer)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let operand = |f: &mut fmt::Formatter<'_>, expr: &Expr| {
            if expr.is_sum() {
                write!(f, "({expr})")
            } else {
                write!(f, "{expr}")
            }
        };
        match &self.node {
            Node::Ref { entity, indices } if indices.is_empty() => write!(f, "{}", entity.name()),
            Node::Ref { entity, indices } => write!(f, "{}[{indices}]", entity.name()),
            Node::Product(a, b) => {
                operand(f, a)?;
                write!(f, " * ")?;
                operand(f, b)
            }
            Node::Sum(terms) => write!(f, "{}", terms.iter().format(" + ")),
            Node::Scale(coefficient, inner) => {
                write!(f, "{coefficient} * ")?;
                operand(f, inner)
            }
        }
    }
}

/// References an entity with one index letter per axis.
pub fn reference(entity: impl Into<Entity>, indices: &str) -> Result<Expr, SpecificationError> {
    let entity = entity.into();
    let indices = Indices::new(indices);
    if indices.len() != entity.rank() {
        return Err(SpecificationError::RankMismatch {
            entity: entity.name().to_string(),
            rank: entity.rank(),
            indices: indices.to_string(),
        });
    }

    let mut signature = Signature::default();
    for (&index, size) in indices.letters().iter().zip(entity.shape()) {
        signature.bind(IndexOccurrence {
            index,
            size: size.clone(),
            entity: entity.name().to_string(),
            count: 1,
        })?;
    }

    Ok(Expr {
        node: Node::Ref { entity, indices },
        signature,
    })
}

impl Tensor {
    /// Shorthand for [`reference`].
    pub fn at(&self, indices: &str) -> Result<Expr, SpecificationError> {
        reference(self, indices)
    }
}

impl Scalar {
    /// References the scalar as a rank-0 factor.
    pub fn value(&self) -> Expr {
        Expr {
            node: Node::Ref {
                entity: self.into(),
                indices: Indices::default(),
            },
            signature: Signature::default(),
        }
    }
}

/// Forms the product of two expressions.
///
/// Every letter shared by the operands must be bound to axes of equal size.
pub fn product(a: Expr, b: Expr) -> Result<Expr, SpecificationError> {
    let mut signature = a.signature.clone();
    for occurrence in b.signature.iter() {
        signature.bind(occurrence.clone())?;
    }
    Ok(Expr {
        node: Node::Product(Box::new(a), Box::new(b)),
        signature,
    })
}

/// Forms the left-associated product of all factors.
pub fn product_of(factors: impl IntoIterator<Item = Expr>) -> Result<Expr, SpecificationError> {
    let mut factors = factors.into_iter();
    let first = factors
        .next()
        .ok_or(SpecificationError::Empty { what: "product" })?;
    factors.try_fold(first, product)
}

/// Scales an expression by a scalar or a constant. The index letters are unaffected.
pub fn scale(coefficient: impl Into<Coefficient>, expr: Expr) -> Expr {
    let signature = expr.signature.clone();
    Expr {
        node: Node::Scale(coefficient.into(), Box::new(expr)),
        signature,
    }
}

/// Sums expressions that share the same free index letters with the same sizes.
///
/// The free letters of the sum are the letters exposed by any addend. Every addend must bind each
/// of them to an axis of the same size, either once or several times as a batched axis. A single
/// term is returned unchanged. The letters contracted inside each addend stay private to it, so the
/// sum itself only carries the shared free letters.
pub fn sum(terms: impl IntoIterator<Item = Expr>) -> Result<Expr, SpecificationError> {
    let mut terms: Vec<Expr> = terms.into_iter().collect();
    match terms.len() {
        0 => return Err(SpecificationError::Empty { what: "sum" }),
        1 => return Ok(terms.remove(0)),
        _ => {}
    }

    let free: Vec<IndexOccurrence> = terms
        .iter()
        .flat_map(|term| term.signature.exposed())
        .unique_by(|occurrence| occurrence.index)
        .map(|occurrence| IndexOccurrence {
            count: 1,
            ..occurrence.clone()
        })
        .collect();
    for occurrence in &free {
        for term in &terms {
            match term.signature.get(occurrence.index) {
                Some(other) if other.size == occurrence.size => {}
                _ => {
                    return Err(SpecificationError::FreeIndexMismatch {
                        index: Some(occurrence.index),
                        expected: render_free(&free),
                        found: term.signature.render_exposed(),
                        reason: FreeIndexReason::AddendMismatch,
                    })
                }
            }
        }
    }

    Ok(Expr {
        node: Node::Sum(terms),
        signature: Signature(free),
    })
}

fn render_free(free: &[IndexOccurrence]) -> String {
    free.iter()
        .map(|occurrence| format!("{}({})", occurrence.index, occurrence.size))
        .join(" ")
}
