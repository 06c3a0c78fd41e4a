use proptest::prelude::*;
use std::collections::BTreeSet;
use tensorform::proptest::size;
use tensorform::{KernelSpecification, RecordingGenerator, TensorModel};
use tensorform_poisson::{surface, DimensionParameters, PoissonTensors, Side};

fn dimension_parameters() -> impl Strategy<Value = DimensionParameters> {
    (size(), size(), size(), size(), size()).prop_map(
        |(dim, facet_basis, element_basis, facet_quadrature, volume_quadrature)| DimensionParameters {
            dim,
            facet_basis,
            element_basis,
            facet_quadrature,
            volume_quadrature,
        },
    )
}

proptest! {
    #[test]
    fn surface_blocks_are_square_in_the_element_basis(parameters in dimension_parameters()) {
        let mut model = TensorModel::new();
        let t = PoissonTensors::declare(&mut model, &parameters).unwrap();
        let summed: BTreeSet<char> = "iq".chars().collect();

        for x in Side::BOTH {
            for y in Side::BOTH {
                let equation = surface(&t, x, y).unwrap();
                prop_assert_eq!(equation.free_indices().to_string(), "kl");
                prop_assert_eq!(equation.contracted_indices(), &summed);
                prop_assert_eq!(
                    equation.lhs().shape(),
                    [parameters.element_basis.clone(), parameters.element_basis.clone()]
                );
            }
        }
    }

    #[test]
    fn every_group_is_registered_for_any_dimensions(parameters in dimension_parameters()) {
        let mut spec = KernelSpecification::new(RecordingGenerator::new());
        tensorform_poisson::add(&mut spec, &parameters).unwrap();
        prop_assert_eq!(spec.generator().groups().len(), 5);
    }
}
