use image_orderer::{
    nn::{LinearTransform, Parameter, SharedWeightCoordinator, WeightId},
    Error, Var,
};
use ndarray::Array2;
use ndarray_rand::{rand_distr::Uniform, RandomExt};
use rand::{rngs::StdRng, SeedableRng};

fn random(shape: (usize, usize), rng: &mut StdRng) -> Array2<f64> {
    Array2::random_using(shape, Uniform::new(-1., 1.), rng)
}

/// Registers one encoding instance per image.
fn encode_all(
    coordinator: &mut SharedWeightCoordinator,
    (matrix, weights): (WeightId, WeightId),
    images: &[Array2<f64>],
) {
    for (index, image) in images.iter().enumerate() {
        let encoding = LinearTransform::apply_with(
            Var::from(image.clone()),
            coordinator.use_at_index(matrix, index).unwrap(),
            coordinator.use_at_index(weights, index).unwrap(),
        )
        .unwrap()
        .sum_rows();
        encoding.forward();
        coordinator.register_result(encoding);
    }
}

#[test]
fn gradients_sum_over_instances() {
    let mut rng = StdRng::seed_from_u64(1);
    let matrix = Parameter::xavier_uniform((3, 6), &mut rng);
    let weights = Parameter::xavier_uniform((3, 3), &mut rng);
    let images: Vec<_> = (0..4).map(|_| random((2, 6), &mut rng)).collect();
    let upstream: Vec<_> = (0..4).map(|_| random((1, 6), &mut rng)).collect();

    let mut expected = (Array2::<f64>::zeros((3, 6)), Array2::<f64>::zeros((3, 3)));
    for (image, gradient) in images.iter().zip(&upstream) {
        let mut single = SharedWeightCoordinator::new();
        let ids = (
            single.register_shared_weight(&matrix),
            single.register_shared_weight(&weights),
        );
        encode_all(&mut single, ids, std::slice::from_ref(image));
        single
            .backpropagate_all(std::slice::from_ref(gradient))
            .unwrap();

        expected.0 += single.gradient(ids.0).unwrap();
        expected.1 += single.gradient(ids.1).unwrap();
    }

    let mut coordinator = SharedWeightCoordinator::new();
    let ids = (
        coordinator.register_shared_weight(&matrix),
        coordinator.register_shared_weight(&weights),
    );
    encode_all(&mut coordinator, ids, &images);
    coordinator.backpropagate_all(&upstream).unwrap();

    assert!(coordinator
        .gradient(ids.0)
        .unwrap()
        .abs_diff_eq(&expected.0, 1e-12));
    assert!(coordinator
        .gradient(ids.1)
        .unwrap()
        .abs_diff_eq(&expected.1, 1e-12));
}

#[test]
fn gradient_count_must_match() {
    let mut rng = StdRng::seed_from_u64(2);
    let matrix = Parameter::xavier_uniform((2, 4), &mut rng);
    let weights = Parameter::xavier_uniform((2, 2), &mut rng);
    let images: Vec<_> = (0..3).map(|_| random((2, 4), &mut rng)).collect();

    let mut coordinator = SharedWeightCoordinator::new();
    let ids = (
        coordinator.register_shared_weight(&matrix),
        coordinator.register_shared_weight(&weights),
    );
    encode_all(&mut coordinator, ids, &images);

    for count in [2, 4] {
        let upstream = vec![Array2::ones((1, 4)); count];
        assert!(matches!(
            coordinator.backpropagate_all(&upstream),
            Err(Error::CountMismatch {
                expected: 3,
                actual
            }) if actual == count
        ));
    }

    coordinator
        .backpropagate_all(&vec![Array2::ones((1, 4)); 3])
        .unwrap();
    assert!(coordinator
        .gradient(ids.0)
        .unwrap()
        .iter()
        .any(|el| *el != 0.));
}

#[test]
fn reset_zeroes_gradients() {
    let mut rng = StdRng::seed_from_u64(3);
    let matrix = Parameter::xavier_uniform((2, 4), &mut rng);
    let weights = Parameter::xavier_uniform((2, 2), &mut rng);
    let values = matrix.data().clone();

    let mut coordinator = SharedWeightCoordinator::new();
    let ids = (
        coordinator.register_shared_weight(&matrix),
        coordinator.register_shared_weight(&weights),
    );
    encode_all(&mut coordinator, ids, &[random((3, 4), &mut rng)]);
    coordinator
        .backpropagate_all(&[Array2::ones((1, 4))])
        .unwrap();

    coordinator.reset();
    assert_eq!(coordinator.gradient(ids.0).unwrap(), &Array2::<f64>::zeros((2, 4)));
    assert_eq!(coordinator.gradient(ids.1).unwrap(), &Array2::<f64>::zeros((2, 2)));
    assert_eq!(coordinator.results_len(), 0);
    assert_eq!(*matrix.data(), values);
}
