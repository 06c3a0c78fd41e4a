use crate::StiffnessSetup;
use std::collections::BTreeSet;
use tensorform::{
    bind, product, product_of, scale, sum, FreeIndexReason, IndexBinding, Size, SpecificationError, TensorModel,
};
use util::assert_err_matches;

#[test]
fn stiffness_equation_contracts_quadrature_dimension_and_mode() {
    let setup = StiffnessSetup::new("Nq");
    let equation = bind(&setup.A, "kl", setup.rhs().unwrap()).unwrap();

    let contracted: BTreeSet<char> = "qmi".chars().collect();
    assert_eq!(equation.contracted_indices(), &contracted);
    assert_eq!(equation.free_indices().letters(), ['k', 'l']);
    assert_eq!(equation.lhs(), &setup.A);
    assert_eq!(equation.terms().len(), 1);
}

#[test]
fn stiffness_equation_renders_in_index_notation() {
    let setup = StiffnessSetup::new("Nq");
    let equation = bind(&setup.A, "kl", setup.rhs().unwrap()).unwrap();
    insta::assert_snapshot!(
        equation.to_string(),
        @"A[kl] <= J[q] * W[q] * K[m] * Em[qm] * D_x[kiq] * D_x[liq]"
    );
}

#[test]
fn inputs_are_listed_once_in_order_of_use() {
    let setup = StiffnessSetup::new("Nq");
    let equation = bind(&setup.A, "kl", setup.rhs().unwrap()).unwrap();
    let names: Vec<String> = equation
        .inputs()
        .iter()
        .map(|entity| entity.name().to_string())
        .collect();
    assert_eq!(names, ["J", "W", "K", "Em", "D_x"]);
}

#[test]
fn rebinding_is_idempotent() {
    let setup = StiffnessSetup::new("Nq");
    let equation = bind(&setup.A, "kl", setup.rhs().unwrap()).unwrap();
    let rebound = equation.rebind().unwrap();

    assert_eq!(rebound, equation);
    assert_eq!(rebound.contracted_indices(), equation.contracted_indices());
    assert_eq!(rebound.free_indices(), equation.free_indices());
}

#[test]
fn output_index_string_must_match_rank() {
    let setup = StiffnessSetup::new("Nq");
    assert_err_matches!(
        bind(&setup.A, "k", setup.rhs().unwrap()),
        SpecificationError::RankMismatch { rank: 2, .. }
    );
}

#[test]
fn output_index_string_must_not_repeat_letters() {
    let setup = StiffnessSetup::new("Nq");
    let rhs = product(setup.K.at("k").unwrap(), setup.K.at("l").unwrap()).unwrap();
    assert_err_matches!(
        bind(&setup.A, "kk", rhs),
        SpecificationError::FreeIndexMismatch {
            index: Some('k'),
            reason: FreeIndexReason::DuplicateInLhs,
            ..
        }
    );
}

#[test]
fn output_sizes_must_match_the_bound_axes() {
    let mut model = TensorModel::new();
    let nbf = Size::symbolic("Nbf");
    let dim = Size::symbolic("dim");
    let k = model.declare_tensor("K", [nbf.clone()]).unwrap();
    let wrong = model.declare_tensor("B", [nbf.clone(), dim.clone()]).unwrap();

    let rhs = product(k.at("k").unwrap(), k.at("l").unwrap()).unwrap();
    assert_eq!(
        bind(&wrong, "kl", rhs),
        Err(SpecificationError::SizeMismatch {
            index: 'l',
            first: IndexBinding::new("K", nbf),
            second: IndexBinding::new("B", dim),
        })
    );
}

#[test]
fn every_output_letter_must_occur_in_each_term() {
    let setup = StiffnessSetup::new("Nq");
    let rhs = product(setup.J.at("q").unwrap(), setup.W.at("q").unwrap()).unwrap();
    assert_err_matches!(
        bind(&setup.K, "k", rhs),
        SpecificationError::FreeIndexMismatch {
            index: Some('k'),
            reason: FreeIndexReason::MissingFromTerm,
            ..
        }
    );
}

#[test]
fn single_occurrence_letters_must_be_outputs() {
    let setup = StiffnessSetup::new("Nq");
    // No implicit reduction over m
    let rhs = product(setup.J.at("q").unwrap(), setup.Em.at("qm").unwrap()).unwrap();
    assert_err_matches!(
        bind(&setup.J, "q", rhs),
        SpecificationError::FreeIndexMismatch {
            index: Some('m'),
            reason: FreeIndexReason::NotInLhs,
            ..
        }
    );
}

#[test]
fn output_letters_may_be_carried_element_wise() {
    let mut model = TensorModel::new();
    let (nbf, dim, nq) = (Size::symbolic("Nbf"), Size::symbolic("dim"), Size::symbolic("Nq"));
    let g = model
        .declare_tensor("G", [dim.clone(), dim.clone(), nq.clone()])
        .unwrap();
    let d_xi = model
        .declare_tensor("D_xi", [nbf.clone(), dim.clone(), nq.clone()])
        .unwrap();
    let d_x = model.declare_tensor_like("D_x", &d_xi).unwrap();

    let equation = bind(&d_x, "kiq", product(g.at("eiq").unwrap(), d_xi.at("keq").unwrap()).unwrap()).unwrap();
    assert_eq!(equation.contracted_indices().iter().collect::<String>(), "e");
}

#[test]
fn addends_are_validated_against_the_output_individually() {
    let mut model = TensorModel::new();
    let (nbf, nq) = (Size::symbolic("Nbf"), Size::symbolic("nq"));
    let w = model.declare_tensor("w", [nq.clone()]).unwrap();
    let e = model.declare_tensor("e", [nbf.clone(), nq.clone()]).unwrap();
    let nl = model.declare_tensor("nl", [nq.clone()]).unwrap();
    let f = model.declare_tensor("f", [nq]).unwrap();
    let b = model.declare_tensor("b", [nbf]).unwrap();
    let c = model.declare_scalar("c").unwrap();

    let rhs = sum([
        scale(&c, product_of([w.at("q").unwrap(), e.at("kq").unwrap(), f.at("q").unwrap()]).unwrap()),
        product_of([w.at("q").unwrap(), e.at("kq").unwrap(), nl.at("q").unwrap()]).unwrap(),
    ])
    .unwrap();
    let equation = bind(&b, "k", rhs).unwrap();

    assert_eq!(equation.terms().len(), 2);
    assert_eq!(equation.contracted_indices().iter().collect::<String>(), "q");
    let names: Vec<String> = equation
        .inputs()
        .iter()
        .map(|entity| entity.name().to_string())
        .collect();
    assert_eq!(names, ["w", "e", "f", "nl", "c"]);
    assert_eq!(
        equation.to_string(),
        "b[k] <= c * w[q] * e[kq] * f[q] + w[q] * e[kq] * nl[q]"
    );
}

#[test]
fn rank_zero_outputs_contract_everything() {
    let mut model = TensorModel::new();
    let u = model.declare_tensor("u", [Size::Fixed(3)]).unwrap();
    let norm = model.declare_tensor("norm", Vec::new()).unwrap();

    let equation = bind(&norm, "", product(u.at("k").unwrap(), u.at("k").unwrap()).unwrap()).unwrap();
    assert!(equation.free_indices().is_empty());
    assert_eq!(equation.to_string(), "norm[] <= u[k] * u[k]");
}

#[test]
fn letters_summed_inside_nested_sums_are_contracted() {
    let mut model = TensorModel::new();
    let (nbf, nq) = (Size::symbolic("Nbf"), Size::symbolic("nq"));
    let x = model.declare_tensor("x", [nbf.clone(), nq.clone()]).unwrap();
    let y = model.declare_tensor("y", [nbf.clone(), nq]).unwrap();
    let z = model.declare_tensor("z", [nbf.clone(), nbf.clone()]).unwrap();
    let a = model.declare_tensor("A", [nbf.clone(), nbf]).unwrap();
    let c = model.declare_scalar("c").unwrap();

    // A[kl] <= c * (x[kq] * y[lq] + z[kl])
    let inner = sum([
        product(x.at("kq").unwrap(), y.at("lq").unwrap()).unwrap(),
        z.at("kl").unwrap(),
    ])
    .unwrap();
    let equation = bind(&a, "kl", scale(&c, inner)).unwrap();

    assert_eq!(equation.terms().len(), 1);
    assert_eq!(equation.contracted_indices().iter().collect::<String>(), "q");
}

#[test]
fn batched_and_plain_addends_bind_to_the_same_output() {
    let mut model = TensorModel::new();
    let (n, q) = (Size::symbolic("N"), Size::symbolic("Q"));
    let a = model.declare_tensor("a", [n.clone(), q.clone()]).unwrap();
    let b = model.declare_tensor("b", [q.clone()]).unwrap();
    let c = model.declare_tensor("c", [n.clone(), q.clone()]).unwrap();
    let out = model.declare_tensor("out", [n, q]).unwrap();

    let batched = product(a.at("iq").unwrap(), b.at("q").unwrap()).unwrap();
    let plain = c.at("iq").unwrap();
    assert!(bind(&out, "iq", batched.clone()).is_ok());
    assert!(bind(&out, "iq", plain.clone()).is_ok());

    let equation = bind(&out, "iq", sum([batched, plain]).unwrap()).unwrap();
    assert!(equation.contracted_indices().is_empty());
    assert_eq!(equation.to_string(), "out[iq] <= a[iq] * b[q] + c[iq]");
}
