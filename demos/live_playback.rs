use noisebed::device::CpalDevice;
use noisebed::{EngineConfig, NoiseEngine, NoiseType};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .init();

    let mut engine = NoiseEngine::new(EngineConfig::default(), CpalDevice::new())
        .expect("default config is valid");

    // Cycle through every type without stopping the stream
    for noise in NoiseType::AUDIBLE {
        engine.play(noise);
        println!("playing {} (connected: {})", noise, engine.is_connected());
        std::thread::sleep(Duration::from_secs(4));
    }

    engine.set_volume(0.2);
    std::thread::sleep(Duration::from_secs(2));
    engine.stop();
}
