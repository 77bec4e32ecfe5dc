//! Editing, replay and commit across the whole state crate

use std::sync::{Arc, Mutex};

use approx::assert_abs_diff_eq;
use sm_core::{
    BaselineOrder, DataType, InMemoryRecord, ProcessingConfig, ProcessingStatus, SmError,
    SmResult, SourceRecord, TimeWindow,
};
use sm_state::{
    BaselineStep, CommitGate, EditorSession, ProductSet, ProductWriter,
    WaveformState, format_baseline_step, parse_baseline_steps, reconstruct_from_annotations,
};

const DT: f64 = 0.01;

/// Reproducible noise from a simple LCG
fn generate_noise(samples: usize, seed: u64) -> Vec<f64> {
    let mut state = seed;
    (0..samples)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (state as f64 / u64::MAX as f64) * 2.0 - 1.0
        })
        .collect()
}

/// Quiet lead-in, decaying shaking, constant instrument offset
fn accelerogram(samples: usize) -> Vec<f64> {
    let noise = generate_noise(samples, 42);
    (0..samples)
        .map(|i| {
            let t = i as f64 * DT;
            let shaking = if t > 3.0 {
                (-(t - 3.0) * 0.5).exp() * (2.0 * std::f64::consts::PI * 2.0 * t).sin()
            } else {
                0.0
            };
            0.01 + shaking + 0.001 * noise[i]
        })
        .collect()
}

fn shared_record(samples: usize) -> Arc<dyn SourceRecord> {
    InMemoryRecord::new("HNE", DT, accelerogram(samples))
        .unwrap()
        .with_source_path("station/HNE.json")
        .into_shared()
}

#[derive(Default)]
struct MemoryWriter {
    written: Mutex<Vec<String>>,
}

impl ProductWriter for MemoryWriter {
    fn write_products(&self, products: &ProductSet<'_>) -> SmResult<Vec<String>> {
        let mut written = self.written.lock().unwrap();
        written.push(products.metadata.channel.clone());
        Ok(vec![format!(
            "{}: {} spectral bins",
            products.metadata.channel,
            products.spectrum.len()
        )])
    }
}

fn edited_session() -> EditorSession {
    let mut session = EditorSession::open(shared_record(1000), ProcessingConfig::default()).unwrap();
    let base = session.default_params();

    session.draw_marker(base).unwrap();
    session
        .commit_correction(base.with_order(BaselineOrder::Mean).with_fit(0.0, 2.0))
        .unwrap();
    session
        .show_baseline(
            base.with_viewer(DataType::Vel)
                .with_order(BaselineOrder::Order1)
                .with_fit(0.0, 10.0),
        )
        .unwrap();
    session
        .commit_correction(
            base.with_viewer(DataType::Vel)
                .with_order(BaselineOrder::Order1)
                .with_fit(0.0, 10.0),
        )
        .unwrap();
    session
        .commit_correction(
            base.with_order(BaselineOrder::Spline)
                .with_fit(4.0, 10.0)
                .with_app(4.0, 10.0),
        )
        .unwrap();
    session
        .apply_filter(base.with_corners(0.1, 25.0))
        .unwrap();
    session
}

#[test]
fn test_replay_is_bit_identical() {
    let session = edited_session();
    let record = session.record();
    let config = session.config();
    let recorder = session.recorder();
    let last = recorder.len() - 1;

    let a = recorder.replay_up_to(record, config, last).unwrap();
    let b = recorder.replay_up_to(record, config, last).unwrap();

    assert_eq!(a.state.acc(), b.state.acc());
    assert_eq!(a.state.vel(), b.state.vel());
    assert_eq!(a.state.dis(), b.state.dis());
    assert_eq!(&a.state, session.state());
}

#[test]
fn test_replay_prefix_matches_history() {
    let mut session = edited_session();
    session.go_to(2).unwrap();
    assert_eq!(session.state().status(), ProcessingStatus::Corrected);
    assert_eq!(session.state().correction_steps().len(), 1);
    assert!(session.overlay().is_none());

    session.go_to(3).unwrap();
    assert!(session.overlay().is_some());

    session.go_to(6).unwrap();
    assert_eq!(session.state().status(), ProcessingStatus::Filtered);
    assert!(session.go_to(7).is_err());
    assert_eq!(session.recorder().position(), 6);
}

#[test]
fn test_branch_cut_discards_tail() {
    let mut session = edited_session();
    assert_eq!(session.recorder().len(), 6);

    session.go_to(2).unwrap();
    let before = session.recorder().position();
    session.draw_marker(session.default_params()).unwrap();

    assert_eq!(session.recorder().len(), before + 1);
    assert!(!session.recorder().can_go_forward());
    assert!(!session.redo().unwrap());
    assert_eq!(session.state().correction_steps().len(), 1);
}

#[test]
fn test_preview_never_changes_log_or_counts() {
    let mut session = EditorSession::open(shared_record(1000), ProcessingConfig::default()).unwrap();
    let params = session
        .default_params()
        .with_order(BaselineOrder::Order2)
        .with_fit(0.0, 3.0);
    session.commit_correction(params).unwrap();
    let committed = session.state().clone();

    for _ in 0..4 {
        session.preview_correction(params).unwrap();
    }
    assert_eq!(session.state(), &committed);
    assert_eq!(session.state().correction_steps().len(), 1);
    assert_eq!(session.state().corrected_count(), 1);
    assert_eq!(session.state().status(), ProcessingStatus::Corrected);
    let preview = session.preview().unwrap();
    assert_eq!(preview.correction_steps().len(), 1);
    assert_eq!(preview.corrected_count(), 1);
}

#[test]
fn test_preview_matches_commit_with_same_params() {
    let mut session = EditorSession::open(shared_record(1000), ProcessingConfig::default()).unwrap();
    assert!(session.state().event_onset() < 5.0);
    let params = session
        .default_params()
        .with_viewer(DataType::Vel)
        .with_order(BaselineOrder::Order1)
        .with_fit(4.0, 10.0)
        .with_app(0.0, 10.0)
        .with_onset(5.0);

    session.show_baseline(params).unwrap();
    session.preview_correction(params).unwrap();
    assert_eq!(session.overlay().unwrap().fitted.len(), 1000);
    let preview = session.preview().unwrap().clone();
    assert_eq!(preview.event_onset(), 5.0);
    // Neither operation moves the onset of the edited state
    assert!(session.state().event_onset() < 5.0);

    session.commit_correction(params).unwrap();
    let committed = session.state();
    assert_eq!(committed.event_onset(), 5.0);
    assert_eq!(preview.acc(), committed.acc());
    assert_eq!(preview.vel(), committed.vel());
    assert_eq!(preview.dis(), committed.dis());
}

#[test]
fn test_velocity_degree_propagation() {
    let mut session = EditorSession::open(shared_record(1000), ProcessingConfig::default()).unwrap();
    let vel = session.default_params().with_viewer(DataType::Vel).with_fit(0.0, 10.0);

    for order in [BaselineOrder::Order2, BaselineOrder::Order1, BaselineOrder::Mean] {
        session.commit_correction(vel.with_order(order)).unwrap();
    }
    let finals: Vec<_> = session
        .state()
        .correction_steps()
        .iter()
        .map(BaselineStep::order_final)
        .collect();
    assert_eq!(
        finals,
        vec![BaselineOrder::Order1, BaselineOrder::Mean, BaselineOrder::None]
    );

    assert!(matches!(
        session.commit_correction(vel.with_order(BaselineOrder::Order3)),
        Err(SmError::InvalidParameter(_))
    ));
}

#[test]
fn test_commit_gating() {
    let writer = MemoryWriter::default();
    let mut session = EditorSession::open(shared_record(1000), ProcessingConfig::default()).unwrap();
    let params = session.default_params().with_fit(0.0, 2.0);

    assert!(session.commit(&writer).is_err());
    session.commit_correction(params).unwrap();
    session.commit_correction(params).unwrap();
    session.apply_filter(params).unwrap();
    assert!(matches!(
        session.commit(&writer),
        Err(SmError::CommitNotReady {
            corrected: 2,
            filtered: 1,
            ..
        })
    ));

    session.apply_filter(params).unwrap();
    assert!(CommitGate::is_ready(session.state()));
    session.commit_correction(params).unwrap();
    assert!(session.commit(&writer).is_err());
    assert!(writer.written.lock().unwrap().is_empty());
}

#[test]
fn test_annotation_round_trip_every_order() {
    let fit = TimeWindow::new(0.125, 3.75);
    let app = TimeWindow::new(0.0, 60.5);
    let cases = [
        (DataType::Acc, BaselineOrder::Mean),
        (DataType::Acc, BaselineOrder::Order1),
        (DataType::Acc, BaselineOrder::Order2),
        (DataType::Acc, BaselineOrder::Order3),
        (DataType::Acc, BaselineOrder::Spline),
        (DataType::Vel, BaselineOrder::Mean),
        (DataType::Vel, BaselineOrder::Order1),
        (DataType::Vel, BaselineOrder::Order2),
        (DataType::Vel, BaselineOrder::Spline),
    ];
    for (source, order) in cases {
        let step = BaselineStep::resolve(source, order, fit, app, 0).unwrap();
        let parsed = parse_baseline_steps(&[format_baseline_step(&step)]);
        assert_eq!(parsed, vec![step]);
    }
}

#[test]
fn test_reconstruct_matches_session() {
    let config = ProcessingConfig::default();
    let mut session = EditorSession::open(shared_record(1000), config.clone()).unwrap();
    let base = session.default_params();
    session
        .commit_correction(base.with_order(BaselineOrder::Mean).with_fit(0.0, 2.0))
        .unwrap();
    session
        .commit_correction(
            base.with_viewer(DataType::Vel)
                .with_order(BaselineOrder::Order2)
                .with_fit(3.0, 10.0)
                .with_app(3.0, 10.0),
        )
        .unwrap();

    let mut lines = vec!["Station: TEST".to_string()];
    lines.extend(session.annotations());
    let rebuilt = reconstruct_from_annotations(
        session.record(),
        &lines,
        &config,
        Some(session.state().event_onset()),
    )
    .unwrap();

    assert_eq!(rebuilt.correction_steps(), session.state().correction_steps());
    assert_eq!(rebuilt.acc(), session.state().acc());
    assert_eq!(rebuilt.vel(), session.state().vel());
    assert_eq!(rebuilt.status(), ProcessingStatus::Corrected);
}

#[test]
fn test_filter_bounds_leave_state_unchanged() {
    let record = shared_record(1000);
    let config = ProcessingConfig::default();
    let mut state = WaveformState::create(record.as_ref(), &config, Some(1.0)).unwrap();
    let before = state.clone();

    assert!(matches!(
        state.apply_filter(-1.0, 5.0, 1.0, &config),
        Err(SmError::OutOfBounds { .. })
    ));
    assert!(matches!(
        state.apply_filter(6.0, 5.0, 1.0, &config),
        Err(SmError::OutOfBounds { .. })
    ));
    assert_eq!(state, before);
}

#[test]
fn test_mean_correction_then_filter_commits() {
    // Constant offset on a 1 Hz oscillation: whole periods in both windows
    let samples: Vec<f64> = (0..1000)
        .map(|i| 0.05 + 0.2 * (2.0 * std::f64::consts::PI * i as f64 * DT).sin())
        .collect();
    let record = InMemoryRecord::new("HNZ", DT, samples).unwrap().into_shared();
    let writer = MemoryWriter::default();

    let mut session = EditorSession::open(record, ProcessingConfig::default()).unwrap();
    let params = session
        .default_params()
        .with_order(BaselineOrder::Mean)
        .with_fit(0.0, 2.0)
        .with_app(0.0, 10.0)
        .with_corners(0.1, 25.0);

    session.commit_correction(params).unwrap();
    let acc = session.state().acc();
    let mean = acc.iter().sum::<f64>() / acc.len() as f64;
    assert_abs_diff_eq!(mean, 0.0, epsilon = 1e-9);
    assert_abs_diff_eq!(acc[25], 0.2, epsilon = 1e-9);

    session.apply_filter(params).unwrap();
    let state = session.state();
    assert_eq!(state.status(), ProcessingStatus::Filtered);
    assert_eq!(state.corrected_count(), 1);
    assert_eq!(state.filtered_count(), 1);

    let lines = session.commit(&writer).unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(writer.written.lock().unwrap().as_slice(), ["HNZ".to_string()]);
}
