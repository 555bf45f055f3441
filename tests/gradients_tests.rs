use image_orderer::{
    nn::{Encoder, LinearTransform},
    trainer::{Checkpoint, Strategy, TrainerConfig, VectorImageOrderer},
    Permutation, SequenceCriterion, Tensor, Var,
};
use ndarray::Array2;
use ndarray_rand::{rand_distr::Uniform, RandomExt};
use rand::{rngs::StdRng, SeedableRng};

const EPS: f64 = 1e-6;
const TOLERANCE: f64 = 1e-4;

/// Central differences of `f` at `point`, one entry at a time.
fn finite_difference<F>(f: F, point: &Array2<f64>) -> Array2<f64>
where
    F: Fn(&Array2<f64>) -> f64,
{
    let mut perturbed = point.clone();
    let mut gradient = Array2::zeros(point.raw_dim());

    for (index, el) in gradient.indexed_iter_mut() {
        let original = point[index];

        perturbed[index] = original + EPS;
        let plus = f(&perturbed);
        perturbed[index] = original - EPS;
        let minus = f(&perturbed);
        perturbed[index] = original;

        *el = (plus - minus) / (2. * EPS);
    }

    gradient
}

fn assert_close(analytic: &Array2<f64>, numeric: &Array2<f64>) {
    assert!(
        analytic.abs_diff_eq(numeric, TOLERANCE),
        "analytic: {} | numeric: {}",
        analytic,
        numeric
    );
}

fn random(shape: (usize, usize), rng: &mut StdRng) -> Array2<f64> {
    Array2::random_using(shape, Uniform::new(0., 1.), rng)
}

/// Encodes `image` and contracts the encoding with `upstream`.
fn encoder_objective(
    matrix: &Array2<f64>,
    weights: &Array2<f64>,
    image: &Array2<f64>,
    upstream: &Array2<f64>,
) -> f64 {
    let transform = LinearTransform::from_arrays(matrix.clone(), weights.clone()).unwrap();
    let encoding = Encoder::new(transform).encode(image).unwrap();

    (&encoding * upstream).sum()
}

#[test]
fn encoder_matches_finite_differences() {
    let mut rng = StdRng::seed_from_u64(11);
    let transform = LinearTransform::new(8, &mut rng).unwrap();
    let matrix = transform.matrix().data().clone();
    let weights = transform.weights().data().clone();
    let image = random((4, 8), &mut rng);
    let upstream = random((1, 8), &mut rng);

    let mut encoder = Encoder::new(transform);
    let input = Var::from(image.clone()).requires_grad();
    encoder.encode_instance(0, input.clone()).unwrap();
    encoder.backpropagate(&[upstream.clone()]).unwrap();
    let (matrix_grad, weights_grad) = encoder.gradients().unwrap();

    assert_close(
        matrix_grad,
        &finite_difference(
            |m| encoder_objective(m, &weights, &image, &upstream),
            &matrix,
        ),
    );
    assert_close(
        weights_grad,
        &finite_difference(
            |w| encoder_objective(&matrix, w, &image, &upstream),
            &weights,
        ),
    );
    assert_close(
        &input.grad(),
        &finite_difference(
            |x| encoder_objective(&matrix, &weights, x, &upstream),
            &image,
        ),
    );
}

#[test]
fn sequence_losses_match_finite_differences() {
    let mut rng = StdRng::seed_from_u64(5);
    let sequence = random((5, 4), &mut rng);

    for criterion in [SequenceCriterion::Curvature, SequenceCriterion::Stride] {
        let x = Var::from(sequence.clone()).requires_grad();
        let loss = x.clone().sequence_loss(criterion).unwrap();
        loss.forward();
        loss.backward(1.);

        let numeric = finite_difference(|s| criterion.loss(&s.view()).unwrap(), &sequence);
        assert_close(&x.grad(), &numeric);
    }
}

fn batch(rng: &mut StdRng) -> Vec<Tensor> {
    (0..3)
        .map(|_| Tensor::from(random((4, 8), rng)))
        .collect()
}

fn evaluate_with(
    config: &TrainerConfig,
    checkpoint: &Checkpoint,
    batch: &[Tensor],
    order: &Permutation,
) -> f64 {
    VectorImageOrderer::from_checkpoint(config.clone(), checkpoint)
        .unwrap()
        .evaluate(batch, order)
        .unwrap()
}

#[test]
fn training_step_matches_finite_differences() {
    let mut rng = StdRng::seed_from_u64(2);
    let batch = batch(&mut rng);
    let order = Permutation::new(vec![2, 0, 1]).unwrap();

    for strategy in [Strategy::TransformThenPermute, Strategy::PermuteThenTransform] {
        let config = TrainerConfig::default()
            .with_vector_size(8)
            .with_strategy(strategy)
            .with_seed(9);
        let mut orderer = VectorImageOrderer::new(config.clone()).unwrap();
        let checkpoint = orderer.checkpoint();
        let report = orderer.step(&batch, &order).unwrap();

        let encoding_matrix = checkpoint.encoding_matrix.to_matrix().unwrap();
        let numeric = finite_difference(
            |m| {
                let mut perturbed = checkpoint.clone();
                perturbed.encoding_matrix = Tensor::from(m.clone());
                evaluate_with(&config, &perturbed, &batch, &order)
            },
            &encoding_matrix,
        );
        assert_close(&report.encoder_gradients.0, &numeric);

        let encoding_weights = checkpoint.encoding_weights.to_matrix().unwrap();
        let numeric = finite_difference(
            |w| {
                let mut perturbed = checkpoint.clone();
                perturbed.encoding_weights = Tensor::from(w.clone());
                evaluate_with(&config, &perturbed, &batch, &order)
            },
            &encoding_weights,
        );
        assert_close(&report.encoder_gradients.1, &numeric);

        let ordering_matrix = checkpoint.ordering_matrix.to_matrix().unwrap();
        let numeric = finite_difference(
            |m| {
                let mut perturbed = checkpoint.clone();
                perturbed.ordering_matrix = Tensor::from(m.clone());
                evaluate_with(&config, &perturbed, &batch, &order)
            },
            &ordering_matrix,
        );
        assert_close(&report.ordering_gradients.0, &numeric);

        let ordering_weights = checkpoint.ordering_weights.to_matrix().unwrap();
        let numeric = finite_difference(
            |w| {
                let mut perturbed = checkpoint.clone();
                perturbed.ordering_weights = Tensor::from(w.clone());
                evaluate_with(&config, &perturbed, &batch, &order)
            },
            &ordering_weights,
        );
        assert_close(&report.ordering_gradients.1, &numeric);
    }
}
