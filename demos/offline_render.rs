use noisebed::wav::render_to_wav;
use noisebed::{EngineConfig, NoiseType};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = EngineConfig::default();
    for noise in NoiseType::AUDIBLE {
        let path = format!("{}.wav", noise);
        match render_to_wav(&config, noise, 0.5, 10.0, &path) {
            Ok(frames) => println!("{}: {} frames -> {}", noise, frames, path),
            Err(e) => eprintln!("{}: {}", noise, e),
        }
    }
}
