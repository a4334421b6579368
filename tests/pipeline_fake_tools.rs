//! End-to-end runs against scripted stand-ins for ffmpeg/ffprobe.
//! Unix only: the fakes are `/bin/sh` scripts.
#![cfg(unix)]

mod support;

use std::fs;

use serial_test::serial;
use slidecast_core::{PipelineError, ProgressRecorder, Stage, run_pipeline};
use support::{FailAt, IntegrationEnv};

const DECODE_ERROR: &str = "Error while processing the decoded data";

fn assert_non_decreasing_to_one(values: &[f64]) {
    assert!(!values.is_empty(), "no progress reported");
    assert!(
        values.windows(2).all(|w| w[0] <= w[1]),
        "progress went backwards: {:?}",
        values
    );
    assert_eq!(values.last().copied(), Some(1.0));
}

#[test]
#[serial]
fn produces_output_and_cleans_working_dir() {
    let env = IntegrationEnv::new();
    let audio = vec![
        env.audio("a1.mp3", 2.0),
        env.audio("a2.mp3", 3.0),
        env.audio("a3.mp3", 1.0),
    ];
    let images = vec![
        env.image("i1.png"),
        env.image("i2.png"),
        env.image("i3.png"),
        env.image("extra.png"),
    ];
    let recorder = ProgressRecorder::new();

    let output = run_pipeline(&audio, &images, &env.config(), Some(recorder.callback())).unwrap();

    assert_eq!(output, env.output());
    assert_eq!(fs::read_to_string(&output).unwrap(), "encoded");
    assert!(!env.work_dir().exists());

    let calls = env.ffmpeg_calls();
    assert_eq!(calls.len(), 3);
    assert!(calls[0].contains("-filter_complex"));
    assert!(calls[0].contains("concat=n=3:v=1:a=0[v]"));
    assert!(!calls[0].contains("extra.png"));
    assert!(calls[1].contains("-f concat -safe 0"));
    assert!(calls[2].contains("-movflags +faststart -t 6"));

    assert_eq!(recorder.for_stage(Stage::Probe).last().copied(), Some(1.0));
    assert_non_decreasing_to_one(&recorder.for_stage(Stage::Video));
    assert_non_decreasing_to_one(&recorder.for_stage(Stage::Merge));
    assert_eq!(recorder.for_stage(Stage::Audio), vec![1.0]);
    assert_eq!(recorder.for_stage(Stage::Video), vec![0.0, 0.5, 1.0]);

    let stages: Vec<Stage> = recorder.events().iter().map(|e| e.stage).collect();
    let first = |s: Stage| stages.iter().position(|&x| x == s).unwrap();
    assert!(first(Stage::Probe) < first(Stage::Video));
    assert!(first(Stage::Video) < first(Stage::Audio));
    assert!(first(Stage::Audio) < first(Stage::Merge));
}

#[test]
#[serial]
fn probe_failure_names_the_asset_and_encodes_nothing() {
    let env = IntegrationEnv::new();
    let bad = env.broken_audio("b.mp3");
    let audio = vec![env.audio("a.mp3", 2.0), bad.clone()];
    let images = vec![env.image("1.png"), env.image("2.png")];

    let err = run_pipeline(&audio, &images, &env.config(), None).unwrap_err();

    match &err {
        PipelineError::Probe { asset, .. } => assert_eq!(asset, &bad),
        other => panic!("expected Probe, got {:?}", other),
    }
    assert_eq!(err.asset(), Some(bad.as_path()));
    assert!(env.ffmpeg_calls().is_empty());
    assert!(!env.work_dir().exists());
    assert!(!env.output().exists());
}

#[test]
#[serial]
fn encode_failure_stops_before_audio() {
    let env = IntegrationEnv::with_failure(FailAt::Video);
    let audio = vec![env.audio("a.mp3", 2.0)];
    let images = vec![env.image("1.png")];

    let err = run_pipeline(&audio, &images, &env.config(), None).unwrap_err();

    match &err {
        PipelineError::Encode { code, stderr } => {
            assert_eq!(*code, 1);
            assert!(stderr.contains(DECODE_ERROR));
        }
        other => panic!("expected Encode, got {:?}", other),
    }
    assert_eq!(env.ffmpeg_calls().len(), 1);
    assert!(!env.work_dir().exists());
    assert!(!env.output().exists());
}

#[test]
#[serial]
fn mux_failure_is_reported_for_audio_stage() {
    let env = IntegrationEnv::with_failure(FailAt::Audio);
    let audio = vec![env.audio("a.mp3", 2.0), env.audio("b.mp3", 1.5)];
    let images = vec![env.image("1.png"), env.image("2.png")];

    let err = run_pipeline(&audio, &images, &env.config(), None).unwrap_err();

    assert!(matches!(err, PipelineError::Mux { code: 1, .. }));
    assert_eq!(err.stage(), Stage::Audio);
    assert_eq!(env.ffmpeg_calls().len(), 2);
    assert!(!env.work_dir().exists());
    assert!(!env.output().exists());
}

#[test]
#[serial]
fn merge_failure_removes_partial_output() {
    let env = IntegrationEnv::with_failure(FailAt::Merge);
    let audio = vec![env.audio("a.mp3", 2.0)];
    let images = vec![env.image("1.png")];

    let err = run_pipeline(&audio, &images, &env.config(), None).unwrap_err();

    assert!(matches!(err, PipelineError::Merge { code: 1, .. }));
    let payload = err.payload();
    assert_eq!(payload.summary, "Final merge: FFmpeg failed.");
    assert!(payload.detail.contains(DECODE_ERROR));
    assert!(!env.output().exists());
    assert!(!env.work_dir().exists());
}

#[test]
#[serial]
fn missing_ffmpeg_override_is_a_launch_error() {
    let env = IntegrationEnv::new();
    let audio = vec![env.audio("a.mp3", 2.0)];
    let images = vec![env.image("1.png")];
    let mut config = env.config();
    config.ffmpeg_path = Some(env.path("no-such-ffmpeg"));

    let err = run_pipeline(&audio, &images, &config, None).unwrap_err();

    assert!(matches!(err, PipelineError::Launch { .. }), "got {:?}", err);
    assert!(!env.work_dir().exists());
}

#[test]
#[serial]
fn repeated_runs_write_identical_manifests() {
    let env = IntegrationEnv::new();
    let audio = vec![env.audio("a.mp3", 2.0), env.audio("b.mp3", 4.0)];
    let images = vec![env.image("1.png"), env.image("2.png")];

    run_pipeline(&audio, &images, &env.config(), None).unwrap();
    run_pipeline(&audio, &images, &env.config(), None).unwrap();

    let manifests = env.manifests();
    assert_eq!(manifests.len(), 2);
    assert_eq!(manifests[0], manifests[1]);
    let expected = format!(
        "file '{}'\nfile '{}'\n",
        audio[0].display(),
        audio[1].display()
    );
    assert_eq!(manifests[0], expected);
    assert!(!env.work_dir().exists());
}

#[test]
#[serial]
fn stale_state_is_cleared_before_run() {
    let env = IntegrationEnv::with_failure(FailAt::Video);
    fs::create_dir_all(env.work_dir().join("old")).unwrap();
    fs::write(env.work_dir().join("video.mp4"), b"old").unwrap();
    fs::create_dir_all(env.output().parent().unwrap()).unwrap();
    fs::write(env.output(), b"old output").unwrap();
    let audio = vec![env.audio("a.mp3", 2.0)];
    let images = vec![env.image("1.png")];

    assert!(run_pipeline(&audio, &images, &env.config(), None).is_err());

    assert!(!env.work_dir().exists());
    assert!(!env.output().exists());
}

#[test]
#[serial]
fn work_dir_holding_inputs_is_refused() {
    let env = IntegrationEnv::new();
    let audio = vec![env.audio("a.mp3", 2.0)];
    let images = vec![env.image("1.png")];
    let mut config = env.config();
    config.work_dir = Some(env.path("in"));

    let err = run_pipeline(&audio, &images, &config, None).unwrap_err();

    assert!(matches!(err, PipelineError::Config(_)), "got {:?}", err);
    assert!(audio[0].exists());
    assert!(images[0].exists());
    assert!(env.ffmpeg_calls().is_empty());
}

#[test]
#[serial]
fn output_reached_through_parent_dir_is_refused() {
    let env = IntegrationEnv::new();
    let audio = vec![env.audio("a.mp3", 2.0)];
    let images = vec![env.image("1.png")];
    let mut config = env.config();
    config.work_dir = Some(env.path("x/../work"));
    config.output_path = Some(env.path("work/out.mp4"));

    let err = run_pipeline(&audio, &images, &config, None).unwrap_err();

    assert!(matches!(err, PipelineError::Config(_)), "got {:?}", err);
    assert!(env.ffmpeg_calls().is_empty());
}
