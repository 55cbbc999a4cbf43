// End-to-end traces through the detection pipeline, pinned as regression
// fixtures.

use slap_core::motion::GRAVITY_ALPHA;
use slap_core::{PipelineConfig, SlapPhase, SlapPipeline, Vector3};

const THRESHOLD: f32 = 1.0;

fn run(samples: &[Vector3], threshold: f32, spacing_ms: u32) -> Vec<(f32, Vector3, SlapPhase, f32)> {
    let mut pipe = SlapPipeline::new(PipelineConfig::default());
    samples
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let report = pipe
                .tick(*s, threshold, i as u32 * spacing_ms)
                .expect("ticks are spaced one interval apart");
            (
                report.magnitude,
                pipe.estimator().gravity(),
                report.evaluation.phase,
                report.evaluation.peak_magnitude,
            )
        })
        .collect()
}

#[test]
fn five_tick_fixture_stays_below_the_threshold() {
    assert_eq!(GRAVITY_ALPHA, 0.8);
    let samples = [
        Vector3::new(0.0, 0.0, 1.0),
        Vector3::new(0.0, 0.0, 1.0),
        Vector3::new(0.0, 0.0, 2.2),
        Vector3::new(0.0, 0.0, 1.0),
        Vector3::new(0.0, 0.0, 1.0),
    ];
    let trace = run(&samples, THRESHOLD, 100);

    // (gravity_z, magnitude) per tick. Tick 3: 0.8 * 1.0 + 0.2 * 2.2 = 1.24,
    // leaving 0.96 g of linear acceleration.
    let expected: [(f32, f32); 5] = [
        (1.0, 0.0),
        (1.0, 0.0),
        (1.24, 0.96),
        (1.192, 0.192),
        (1.1536, 0.1536),
    ];
    for (i, ((magnitude, gravity, phase, peak), (gz, m))) in
        trace.iter().zip(expected.iter()).enumerate()
    {
        assert!(
            (gravity.z - gz).abs() < 1e-5,
            "tick {}: gravity_z {} != {}",
            i + 1,
            gravity.z,
            gz
        );
        assert!(
            (magnitude - m).abs() < 1e-5,
            "tick {}: magnitude {} != {}",
            i + 1,
            magnitude,
            m
        );
        assert_eq!(gravity.x, 0.0);
        assert_eq!(gravity.y, 0.0);
        assert_eq!(*phase, SlapPhase::Quiet, "tick {}", i + 1);
        assert_eq!(*peak, 0.0);
    }
}

#[test]
fn spike_on_the_threshold_does_not_trigger() {
    // Strict comparison: a magnitude equal to the threshold stays quiet.
    let samples = [
        Vector3::new(0.0, 0.0, 1.0),
        Vector3::new(0.0, 0.0, 1.0),
        Vector3::new(0.0, 0.0, 2.2),
    ];
    let trace = run(&samples, 0.0, 100);
    let spike = trace[2].0;
    let at_threshold = run(&samples, spike, 100);
    assert_eq!(at_threshold[2].2, SlapPhase::Quiet);

    let just_below = run(&samples, spike - 1e-4, 100);
    assert_eq!(just_below[2].2, SlapPhase::Active);
}

#[test]
fn same_spike_with_lower_threshold_triggers_once() {
    let samples = [
        Vector3::new(0.0, 0.0, 1.0),
        Vector3::new(0.0, 0.0, 1.0),
        Vector3::new(0.0, 0.0, 2.2),
        Vector3::new(0.0, 0.0, 1.0),
        Vector3::new(0.0, 0.0, 1.0),
    ];
    let trace = run(&samples, 0.9, 100);
    let phases: Vec<SlapPhase> = trace.iter().map(|t| t.2).collect();
    assert_eq!(
        phases,
        [
            SlapPhase::Quiet,
            SlapPhase::Quiet,
            SlapPhase::Active,
            SlapPhase::Active,
            SlapPhase::Active,
        ]
    );
    assert!((trace[4].3 - 0.96).abs() < 1e-5);
}

#[test]
fn identical_inputs_give_bit_identical_trajectories() {
    let samples: Vec<Vector3> = (0..200)
        .map(|i| {
            let t = i as f32 * 0.1;
            let jolt = if i % 37 == 0 { 2.5 } else { 0.0 };
            Vector3::new(0.3 * t.sin(), 0.2 * t.cos() + jolt, 1.0 - 0.05 * t.sin())
        })
        .collect();
    let thresholds = |i: usize| if i < 100 { 1.0 } else { 0.6 };

    let mut a = SlapPipeline::default();
    let mut b = SlapPipeline::default();
    for (i, s) in samples.iter().enumerate() {
        let now = i as u32 * 100;
        let ra = a.tick(*s, thresholds(i), now);
        let rb = b.tick(*s, thresholds(i), now);
        assert_eq!(ra, rb);

        let (ga, gb) = (a.estimator().gravity(), b.estimator().gravity());
        assert_eq!(ga.x.to_bits(), gb.x.to_bits());
        assert_eq!(ga.y.to_bits(), gb.y.to_bits());
        assert_eq!(ga.z.to_bits(), gb.z.to_bits());

        let (sa, sb) = (a.detector().state(), b.detector().state());
        assert_eq!(sa.phase, sb.phase);
        assert_eq!(sa.peak_magnitude.to_bits(), sb.peak_magnitude.to_bits());
        assert_eq!(sa.last_motion_ms, sb.last_motion_ms);
    }
}

#[test]
fn corrupted_sample_mid_stream_does_not_poison_the_filter() {
    let mut pipe = SlapPipeline::default();
    for i in 0..30u32 {
        pipe.tick(Vector3::new(0.0, 0.0, 1.0), THRESHOLD, i * 100);
    }
    let report = pipe
        .tick(Vector3::new(f32::NAN, 0.0, 1.0), THRESHOLD, 3000)
        .unwrap();
    assert_eq!(report.magnitude, 0.0);
    assert!(!report.evaluation.is_active());

    let report = pipe
        .tick(Vector3::new(0.0, 0.0, 1.0), THRESHOLD, 3100)
        .unwrap();
    assert!(report.magnitude < 1e-5);
    assert!(pipe.estimator().gravity().is_finite());
}
