//! Equations of the interior penalty DG discretization of the Poisson equation.
//!
//! With basis functions $\phi_k$, material coefficient $K$ and facet normal $n$, the element
//! stiffness matrix is
//! $$
//! A_{kl} = \sum_q J_q W_q \, K(x_q) \, \nabla \phi_k(x_q) \cdot \nabla \phi_l(x_q),
//! $$
//! and each facet couples the test side $x$ with the trial side $y$ through
//! $$
//! a^{xy}_{kl} = c_0^y \sum_q w_q \, K \nabla \phi^x_k \cdot n \, \phi^y_l
//!             + c_1^x \sum_q w_q \, K \nabla \phi^y_l \cdot n \, \phi^x_k
//!             + c_2^{|y-x|} \sum_q w_q \, \phi^x_k \phi^y_l \, |n|.
//! $$
use crate::tensors::{PoissonTensors, Side};
use tensorform::{bind, product_of, scale, sum, Equation, SpecificationError};

/// Physical basis gradients and the element stiffness matrix.
pub fn assemble_volume(t: &PoissonTensors) -> Result<Vec<Equation>, SpecificationError> {
    let gradient = bind(&t.D_x, "kiq", product_of([t.G.at("eiq")?, t.D_xi.at("keq")?])?)?;
    let stiffness = bind(
        &t.A,
        "kl",
        product_of([
            t.J.at("q")?,
            t.W.at("q")?,
            t.K.at("m")?,
            t.Em.at("qm")?,
            t.D_x.at("kiq")?,
            t.D_x.at("liq")?,
        ])?,
    )?;
    Ok(vec![gradient, stiffness])
}

/// Physical basis gradients on one side of a facet, weighted by the material coefficient.
pub fn facet_gradient(t: &PoissonTensors, side: Side) -> Result<Equation, SpecificationError> {
    bind(
        t.d_x.get(side),
        "kiq",
        product_of([
            t.K.at("m")?,
            t.em.get(side).at("qm")?,
            t.g.at("eiq")?,
            t.d_xi.get(side).at("keq")?,
        ])?,
    )
}

/// The facet block `a(x, y)` coupling test functions of side `x` with trial functions of side `y`.
pub fn surface(t: &PoissonTensors, x: Side, y: Side) -> Result<Equation, SpecificationError> {
    let consistency = scale(
        t.c0.get(y),
        product_of([
            t.w.at("q")?,
            t.d_x.get(x).at("kiq")?,
            t.n.at("iq")?,
            t.e.get(y).at("lq")?,
        ])?,
    );
    let symmetry = scale(
        t.c1.get(x),
        product_of([
            t.w.at("q")?,
            t.d_x.get(y).at("liq")?,
            t.n.at("iq")?,
            t.e.get(x).at("kq")?,
        ])?,
    );
    let penalty = scale(
        t.penalty(x, y),
        product_of([
            t.w.at("q")?,
            t.e.get(x).at("kq")?,
            t.e.get(y).at("lq")?,
            t.nl.at("q")?,
        ])?,
    );
    bind(t.a.get(x).get(y), "kl", sum([consistency, symmetry, penalty])?)
}

pub fn assemble_facet_local(t: &PoissonTensors) -> Result<Vec<Equation>, SpecificationError> {
    Ok(vec![
        facet_gradient(t, Side::Local)?,
        surface(t, Side::Local, Side::Local)?,
    ])
}

/// Facet blocks involving the neighbour. Reads `d_x(0)` computed by [`assemble_facet_local`].
pub fn assemble_facet_neighbour(t: &PoissonTensors) -> Result<Vec<Equation>, SpecificationError> {
    Ok(vec![
        facet_gradient(t, Side::Neighbour)?,
        surface(t, Side::Local, Side::Neighbour)?,
        surface(t, Side::Neighbour, Side::Local)?,
        surface(t, Side::Neighbour, Side::Neighbour)?,
    ])
}

/// Volume contribution of the source term to the load vector.
pub fn rhs_volume(t: &PoissonTensors) -> Result<Vec<Equation>, SpecificationError> {
    let load = bind(
        &t.b,
        "k",
        product_of([t.J.at("q")?, t.W.at("q")?, t.E.at("kq")?, t.F.at("q")?])?,
    )?;
    Ok(vec![load])
}

/// Boundary contribution of the datum `f` to the load vector.
pub fn rhs_facet(t: &PoissonTensors) -> Result<Vec<Equation>, SpecificationError> {
    let local = Side::Local;
    let consistency = scale(
        t.c1.get(local),
        product_of([
            t.w.at("q")?,
            t.K.at("m")?,
            t.em.get(local).at("qm")?,
            t.g.at("eiq")?,
            t.d_xi.get(local).at("keq")?,
            t.n.at("iq")?,
            t.f.at("q")?,
        ])?,
    );
    let penalty = scale(
        t.penalty(local, local),
        product_of([
            t.w.at("q")?,
            t.e.get(local).at("kq")?,
            t.nl.at("q")?,
            t.f.at("q")?,
        ])?,
    );
    Ok(vec![bind(&t.b, "k", sum([consistency, penalty])?)?])
}
