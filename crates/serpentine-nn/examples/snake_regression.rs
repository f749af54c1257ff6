// Run with `RUST_LOG=info cargo run -p serpentine-nn --example snake_regression`
// to watch the loss decay while the frequency mixture adapts.

use serpentine_nn::{
    Linear, Loss, MeanSquaredError, Module, PureResult, Sequential, Snake, Tensor,
};

fn main() -> PureResult<()> {
    serpentine_config::tracing::init_tracing().ok();

    let samples = 64usize;
    let input = Tensor::from_fn(samples, 1, |r, _| -2.0 + 4.0 * r as f32 / samples as f32)?;
    let target = Tensor::from_fn(samples, 1, |r, _| {
        let x = -2.0 + 4.0 * r as f32 / samples as f32;
        (2.5 * x).sin() + 0.3 * x
    })?;

    let mut model = Sequential::new();
    model.push(Linear::with_seed("encode", 1, 8, Some(7))?);
    model.push(Snake::with_init(
        "ripple",
        8,
        serpentine_nn::AlphaInit::default(),
        true,
        Some(7),
    )?);
    model.push(Linear::with_seed("decode", 8, 1, Some(8))?);

    let mut loss = MeanSquaredError::new();
    let learning_rate = 0.02f32;

    for epoch in 0..400 {
        let prediction = model.forward(&input)?;
        let value = loss.forward(&prediction, &target)?;
        let grad = loss.backward(&prediction, &target)?;
        model.backward(&input, &grad)?;
        model.apply_step(learning_rate)?;

        if epoch % 50 == 0 {
            tracing::info!(epoch, loss = value.data()[0], "fitting periodic target");
        }
    }

    let prediction = model.forward(&input)?;
    let final_loss = loss.forward(&prediction, &target)?;
    tracing::info!(loss = final_loss.data()[0], "finished");
    Ok(())
}
