use noisebed::harness::ManualDevice;
use noisebed::rt::render_offline;
use noisebed::sink::Interleaved;
use noisebed::{EngineConfig, NoiseEngine, NoiseType, RenderStatus};

fn engine() -> NoiseEngine<ManualDevice> {
    NoiseEngine::new(EngineConfig::default(), ManualDevice::new()).unwrap()
}

#[test]
fn stop_then_render_is_exact_silence() {
    let mut engine = engine();
    engine.play(NoiseType::Brown);
    engine.device().pull(512);
    engine.stop();

    let renderer = engine.renderer();
    let mut out = vec![0.7; 512];
    let status = renderer.render(256, &mut Interleaved::new(&mut out));
    assert_eq!(status, RenderStatus::Silent);
    assert!(out.iter().all(|&s| s == 0.0), "all 512 values must be 0.0");
}

#[test]
fn play_off_silences_every_type() {
    for noise in NoiseType::AUDIBLE {
        let mut engine = engine();
        engine.play(noise);
        engine.play(NoiseType::Off);
        let output = render_offline(&engine.renderer(), 1_024, 128).unwrap();
        assert!(output.iter().all(|&s| s == 0.0), "{} leaked after off", noise);
    }
}

#[test]
fn zero_volume_is_silent_while_running() {
    let mut engine = engine();
    engine.play(NoiseType::Wind);
    engine.set_volume(0.0);
    let mut out = vec![1.0; 256];
    assert_eq!(engine.device().pump(&mut out), Some(RenderStatus::Silent));
    assert!(out.iter().all(|&s| s == 0.0));
    assert!(engine.is_connected());
}

#[test]
fn stopped_transport_is_never_pumped() {
    let mut engine = engine();
    engine.play(NoiseType::White);
    engine.stop();
    let mut out = vec![0.0; 64];
    assert_eq!(engine.device().pump(&mut out), None);
}
