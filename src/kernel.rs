//! Named groups of equations and their hand-off to a kernel generator.
use crate::equation::Equation;
use crate::error::SpecificationError;
use crate::tensor::{Entity, Tensor};
use eyre::WrapErr;
use itertools::Itertools;
use log::{info, warn};
use rustc_hash::FxHashSet;
use serde::Serialize;
use std::fmt;

/// An ordered, named set of equations compiled together into one kernel.
///
/// Later equations may read tensors assigned by earlier ones.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KernelGroup {
    name: String,
    equations: Vec<Equation>,
}

impl KernelGroup {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn equations(&self) -> &[Equation] {
        &self.equations
    }

    /// Tensors assigned by the group, in order of first assignment.
    pub fn outputs(&self) -> Vec<&Tensor> {
        self.equations
            .iter()
            .map(Equation::lhs)
            .unique()
            .collect()
    }

    /// Entities read by the group before it assigns them, in order of first use.
    pub fn inputs(&self) -> Vec<Entity> {
        let mut assigned = FxHashSet::default();
        let mut seen = FxHashSet::default();
        let mut inputs = Vec::new();
        for equation in &self.equations {
            for entity in equation.inputs() {
                let name = entity.name().to_string();
                if !assigned.contains(&name) && seen.insert(name) {
                    inputs.push(entity);
                }
            }
            assigned.insert(equation.lhs().name().to_string());
        }
        inputs
    }

    /// Tensors assigned by one equation and read by a later equation of the same group.
    pub fn temporaries(&self) -> Vec<&Tensor> {
        self.outputs()
            .into_iter()
            .filter(|tensor| {
                let Some(first) = self
                    .equations
                    .iter()
                    .position(|equation| equation.lhs() == *tensor)
                else {
                    return false;
                };
                self.equations[first + 1..].iter().any(|equation| {
                    equation
                        .inputs()
                        .iter()
                        .any(|entity| entity.name() == tensor.name())
                })
            })
            .collect()
    }
}

impl fmt::Display for KernelGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.name)?;
        for equation in &self.equations {
            write!(f, "\n    {equation}")?;
        }
        Ok(())
    }
}

/// The backend that lowers accepted kernel groups into executable code.
///
/// Groups arrive fully validated and in submission order. A generator may still reject a group, in
/// which case the group is not registered.
pub trait Generator {
    fn accept(&mut self, group: &KernelGroup) -> eyre::Result<()>;
}

impl<G> Generator for &mut G
where
    G: Generator + ?Sized,
{
    fn accept(&mut self, group: &KernelGroup) -> eyre::Result<()> {
        (**self).accept(group)
    }
}

/// A generator that stores every accepted group.
#[derive(Debug, Clone, Default)]
pub struct RecordingGenerator {
    groups: Vec<KernelGroup>,
}

impl RecordingGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepted groups in submission order.
    pub fn groups(&self) -> &[KernelGroup] {
        &self.groups
    }

    pub fn get(&self, name: &str) -> Option<&KernelGroup> {
        self.groups.iter().find(|group| group.name() == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.groups.iter().map(KernelGroup::name).collect()
    }

    pub fn into_groups(self) -> Vec<KernelGroup> {
        self.groups
    }
}

impl Generator for RecordingGenerator {
    fn accept(&mut self, group: &KernelGroup) -> eyre::Result<()> {
        self.groups.push(group.clone());
        Ok(())
    }
}

/// Registry of the kernel groups of one specification.
#[derive(Debug)]
pub struct KernelSpecification<G> {
    generator: G,
    names: FxHashSet<String>,
}

impl<G: Generator> KernelSpecification<G> {
    pub fn new(generator: G) -> Self {
        Self {
            generator,
            names: FxHashSet::default(),
        }
    }

    /// Registers the equations under `name` and forwards them to the generator.
    ///
    /// Names must be non-empty and unique, and a group needs at least one equation. Errors raised
    /// here are [`SpecificationError`]s wrapped in the report. Nothing is registered on failure.
    pub fn add(&mut self, name: impl Into<String>, equations: impl IntoIterator<Item = Equation>) -> eyre::Result<()> {
        let name = name.into();
        if name.is_empty() {
            return Err(SpecificationError::InvalidName.into());
        }
        if self.names.contains(&name) {
            return Err(SpecificationError::DuplicateName { name }.into());
        }
        let equations: Vec<Equation> = equations.into_iter().collect();
        if equations.is_empty() {
            return Err(SpecificationError::Empty { what: "kernel group" }.into());
        }

        let group = KernelGroup { name, equations };
        for (tensor, count) in group.equations.iter().map(Equation::lhs).counts() {
            if count > 1 {
                warn!(
                    "kernel group {} assigns {} {count} times, later equations replace earlier values",
                    group.name,
                    tensor.name()
                );
            }
        }

        self.generator
            .accept(&group)
            .wrap_err_with(|| format!("generator rejected kernel group {}", group.name))?;
        info!(
            "registered kernel group {} with {} equation(s)",
            group.name,
            group.equations.len()
        );
        self.names.insert(group.name);
        Ok(())
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

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn generator_mut(&mut self) -> &mut G {
        &mut self.generator
    }

    pub fn into_generator(self) -> G {
        self.generator
    }
}
