use serpentine_nn::{
    AlphaInit, Linear, Loss, MeanSquaredError, Module, Sequential, Snake, Tensor,
};

fn periodic_batch(samples: usize) -> (Tensor, Tensor) {
    let input = Tensor::from_fn(samples, 1, |r, _| {
        -1.5 + 3.0 * r as f32 / samples as f32
    })
    .unwrap();
    let target = Tensor::from_fn(samples, 1, |r, _| {
        let x = -1.5 + 3.0 * r as f32 / samples as f32;
        (2.0 * x).sin()
    })
    .unwrap();
    (input, target)
}

fn snake_mlp(trainable_alpha: bool) -> Sequential {
    let mut model = Sequential::new();
    model.push(Linear::with_seed("encode", 1, 8, Some(11)).unwrap());
    model.push(Snake::with_init("ripple", 8, AlphaInit::fixed(1.0), trainable_alpha, None).unwrap());
    model.push(Linear::with_seed("decode", 8, 1, Some(12)).unwrap());
    model
}

#[test]
fn snake_mlp_reduces_loss_on_periodic_target() {
    let (input, target) = periodic_batch(32);
    let mut model = snake_mlp(true);
    let mut loss = MeanSquaredError::new();

    let initial = loss
        .forward(&model.forward(&input).unwrap(), &target)
        .unwrap()
        .data()[0];

    for _ in 0..200 {
        let prediction = model.forward(&input).unwrap();
        let grad = loss.backward(&prediction, &target).unwrap();
        model.backward(&input, &grad).unwrap();
        model.apply_step(0.05).unwrap();
    }

    let trained = loss
        .forward(&model.forward(&input).unwrap(), &target)
        .unwrap()
        .data()[0];
    assert!(
        trained < initial,
        "loss failed to decrease: {initial} -> {trained}"
    );
}

#[test]
fn frozen_alpha_stays_fixed_while_the_rest_trains() {
    let (input, target) = periodic_batch(16);
    let mut model = snake_mlp(false);
    let mut loss = MeanSquaredError::new();

    let alpha_before: Vec<f32> = {
        let mut snapshot = Vec::new();
        model
            .visit_parameters(&mut |param| {
                if param.name().ends_with("::alpha") {
                    snapshot = param.value().data().to_vec();
                }
                Ok(())
            })
            .unwrap();
        snapshot
    };

    for _ in 0..50 {
        let prediction = model.forward(&input).unwrap();
        let grad = loss.backward(&prediction, &target).unwrap();
        model.backward(&input, &grad).unwrap();
        model.apply_step(0.05).unwrap();
    }

    model
        .visit_parameters(&mut |param| {
            if param.name().ends_with("::alpha") {
                assert_eq!(param.value().data(), alpha_before.as_slice());
            } else {
                assert!(param.trainable());
            }
            Ok(())
        })
        .unwrap();
}

#[test]
fn trainable_alpha_moves_during_training() {
    let (input, target) = periodic_batch(16);
    let mut model = snake_mlp(true);
    let mut loss = MeanSquaredError::new();

    let alpha_before: Vec<f32> = {
        let mut snapshot = Vec::new();
        model
            .visit_parameters(&mut |param| {
                if param.name().ends_with("::alpha") {
                    snapshot = param.value().data().to_vec();
                }
                Ok(())
            })
            .unwrap();
        snapshot
    };

    for _ in 0..50 {
        let prediction = model.forward(&input).unwrap();
        let grad = loss.backward(&prediction, &target).unwrap();
        model.backward(&input, &grad).unwrap();
        model.apply_step(0.05).unwrap();
    }

    let mut moved = false;
    model
        .visit_parameters(&mut |param| {
            if param.name().ends_with("::alpha") {
                moved = param.value().data() != alpha_before.as_slice();
            }
            Ok(())
        })
        .unwrap();
    assert!(moved, "trainable alpha never changed");
}

#[test]
fn state_dict_round_trips_across_models() {
    let (input, target) = periodic_batch(16);
    let mut trained = snake_mlp(true);
    let mut loss = MeanSquaredError::new();
    for _ in 0..20 {
        let prediction = trained.forward(&input).unwrap();
        let grad = loss.backward(&prediction, &target).unwrap();
        trained.backward(&input, &grad).unwrap();
        trained.apply_step(0.05).unwrap();
    }

    let state = trained.state_dict().unwrap();
    let mut fresh = snake_mlp(true);
    fresh.load_state_dict(&state).unwrap();

    let lhs = trained.forward(&input).unwrap();
    let rhs = fresh.forward(&input).unwrap();
    assert_eq!(lhs, rhs);
}
