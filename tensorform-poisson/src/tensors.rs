//! The tensors and scalars the Poisson kernels operate on.
use crate::parameters::DimensionParameters;
use tensorform::{Scalar, SpecificationError, Tensor, TensorModel};

/// One of the two elements sharing a facet.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Side {
    Local,
    Neighbour,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Local, Side::Neighbour];

    pub fn index(self) -> usize {
        match self {
            Side::Local => 0,
            Side::Neighbour => 1,
        }
    }
}

/// A pair of entities, one per facet side.
#[derive(Debug, Clone)]
pub struct PerSide<T>([T; 2]);

impl<T> PerSide<T> {
    fn try_new<E>(mut f: impl FnMut(usize) -> Result<T, E>) -> Result<Self, E> {
        Ok(Self([f(0)?, f(1)?]))
    }

    pub fn get(&self, side: Side) -> &T {
        &self.0[side.index()]
    }
}

/// Every entity referenced by the DG-Poisson kernels.
///
/// Upper-case names live on volume quadrature points, lower-case names on facet quadrature points.
#[allow(non_snake_case)]
#[derive(Debug, Clone)]
pub struct PoissonTensors {
    /// Determinant of the element Jacobian.
    pub J: Tensor,
    /// Inverse Jacobian of the geometric map.
    pub G: Tensor,
    /// Coefficient vector of the material field.
    pub K: Tensor,
    /// Volume quadrature weights.
    pub W: Tensor,
    /// Basis functions at volume quadrature points.
    pub E: Tensor,
    /// Material modes at volume quadrature points.
    pub Em: Tensor,
    /// Reference-space basis gradients.
    pub D_xi: Tensor,
    /// Physical-space basis gradients.
    pub D_x: Tensor,
    /// Element stiffness matrix.
    pub A: Tensor,
    /// Load vector.
    pub b: Tensor,
    /// Source term at volume quadrature points.
    pub F: Tensor,

    /// Inverse Jacobian of the geometric map at facet quadrature points.
    pub g: Tensor,
    /// Facet normals.
    pub n: Tensor,
    /// Facet normal length.
    pub nl: Tensor,
    /// Facet quadrature weights.
    pub w: Tensor,
    /// Boundary datum at facet quadrature points.
    pub f: Tensor,
    pub e: PerSide<Tensor>,
    pub em: PerSide<Tensor>,
    pub d_xi: PerSide<Tensor>,
    pub d_x: PerSide<Tensor>,
    /// Facet coupling blocks, indexed by test side then trial side.
    pub a: PerSide<PerSide<Tensor>>,

    /// Weights of the consistency term.
    pub c0: PerSide<Scalar>,
    /// Weights of the symmetrising term.
    pub c1: PerSide<Scalar>,
    /// Penalty weights, same side first.
    pub c2: PerSide<Scalar>,
}

impl PoissonTensors {
    /// Declares every entity with shapes derived from `parameters`.
    #[allow(non_snake_case)]
    pub fn declare(model: &mut TensorModel, parameters: &DimensionParameters) -> Result<Self, SpecificationError> {
        parameters.validate()?;
        let dim = parameters.dim.clone();
        let Nbf = parameters.element_basis.clone();
        let nq = parameters.facet_quadrature.clone();
        let Nq = parameters.volume_quadrature.clone();

        let D_xi = model.declare_tensor("D_xi", [Nbf.clone(), dim.clone(), Nq.clone()])?;
        Ok(Self {
            J: model.declare_tensor("J", [Nq.clone()])?,
            G: model.declare_tensor("G", [dim.clone(), dim.clone(), Nq.clone()])?,
            K: model.declare_tensor("K", [Nbf.clone()])?,
            W: model.declare_tensor("W", [Nq.clone()])?,
            E: model.declare_tensor("E", [Nbf.clone(), Nq.clone()])?,
            Em: model.declare_tensor("Em", [Nq.clone(), Nbf.clone()])?,
            D_x: model.declare_tensor_like("D_x", &D_xi)?,
            D_xi,
            A: model.declare_tensor("A", [Nbf.clone(), Nbf.clone()])?,
            b: model.declare_tensor("b", [Nbf.clone()])?,
            F: model.declare_tensor("F", [Nq])?,

            g: model.declare_tensor("g", [dim.clone(), dim.clone(), nq.clone()])?,
            n: model.declare_tensor("n", [dim.clone(), nq.clone()])?,
            nl: model.declare_tensor("nl", [nq.clone()])?,
            w: model.declare_tensor("w", [nq.clone()])?,
            f: model.declare_tensor("f", [nq.clone()])?,
            e: PerSide::try_new(|x| model.declare_tensor(format!("e({x})"), [Nbf.clone(), nq.clone()]))?,
            em: PerSide::try_new(|x| model.declare_tensor(format!("em({x})"), [nq.clone(), Nbf.clone()]))?,
            d_xi: PerSide::try_new(|x| {
                model.declare_tensor(format!("d_xi({x})"), [Nbf.clone(), dim.clone(), nq.clone()])
            })?,
            d_x: PerSide::try_new(|x| {
                model.declare_tensor(format!("d_x({x})"), [Nbf.clone(), dim.clone(), nq.clone()])
            })?,
            a: PerSide::try_new(|x| {
                PerSide::try_new(|y| model.declare_tensor(format!("a({x},{y})"), [Nbf.clone(), Nbf.clone()]))
            })?,

            c0: PerSide::try_new(|x| model.declare_scalar(format!("c0{x}")))?,
            c1: PerSide::try_new(|x| model.declare_scalar(format!("c1{x}")))?,
            c2: PerSide::try_new(|x| model.declare_scalar(format!("c2{x}")))?,
        })
    }

    /// The penalty weight coupling `test` and `trial`: `c2[0]` on the same side, `c2[1]` across.
    pub fn penalty(&self, test: Side, trial: Side) -> &Scalar {
        let distance = test.index().abs_diff(trial.index());
        &self.c2.0[distance]
    }
}
