use std::fs;
use std::path::Path;
use std::process::Command;

use aero_gl::{ContextConfig, GlContext, RecordingDevice};
use aero_gl_trace_replay::{parse_trace, replay_calls, ReplayError};

const ARRAYS_TRACE: &str = r#"{"call":"VertexPointer","size":3,"ty":5126,"stride":0,"pointer":{"client":{"type":"f32","data":[0,0,0, 1,0,0, 1,1,0, 0,1,0]}}}
{"call":"EnableClientState","array":32884}
{"call":"ColorPointer","size":4,"ty":5121,"stride":0,"pointer":{"client":{"type":"u8","data":[255,0,0,255, 0,255,0,255, 0,0,255,255, 255,255,255,255]}}}
{"call":"EnableClientState","array":32886}
{"call":"DrawArrays","mode":7,"first":0,"count":4}
{"call":"DrawElements","mode":4,"count":3,"ty":5123,"indices":{"client":{"type":"u16","data":[3,1,2]}}}
"#;

fn write_trace(dir: &Path, text: &str) -> std::path::PathBuf {
    let path = dir.join("trace.jsonl");
    fs::write(&path, text).unwrap();
    path
}

#[test]
fn library_replay_counts_draws() {
    let mut ctx = GlContext::new(RecordingDevice::new(31, 16), ContextConfig::default()).unwrap();
    let summary = replay_calls(&mut ctx, parse_trace(ARRAYS_TRACE.as_bytes()).unwrap()).unwrap();
    assert_eq!(summary.calls, 6);
    assert_eq!(summary.draws, 2);
    // Quads are expanded into an index list, so both draws are indexed.
    assert_eq!(summary.device.indexed_draws, 2);
    assert_eq!(summary.device.live_buffers, 0);
}

#[test]
fn library_replay_stops_at_exhausted_stream_pool() {
    let config = ContextConfig {
        stream_slots: 1,
        ..ContextConfig::default()
    };
    let mut ctx = GlContext::new(RecordingDevice::new(1, 16), config).unwrap();
    let err = replay_calls(&mut ctx, parse_trace(ARRAYS_TRACE.as_bytes()).unwrap()).unwrap_err();
    assert_eq!(err.line(), 5);
    assert!(matches!(err, ReplayError::Call { .. }));
    assert!(ctx.slots().all_free());
}

#[test]
fn cli_prints_json_summary_and_dumps_programs() {
    let dir = tempfile::tempdir().unwrap();
    let trace = write_trace(dir.path(), ARRAYS_TRACE);
    let shaders = dir.path().join("shaders");

    let output = Command::new(env!("CARGO_BIN_EXE_aero-gl-trace-replay"))
        .arg(&trace)
        .arg("--summary-json")
        .arg("--dump-shaders")
        .arg(&shaders)
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["calls"], 6);
    assert_eq!(summary["draws"], 2);
    assert_eq!(summary["device"]["live_programs"], 0);

    let vertex = fs::read_to_string(shaders.join("draw00001.vs.wgsl")).unwrap();
    assert!(vertex.contains("vs_main"));
    assert!(shaders.join("draw00001.fs.wgsl").exists());
}

#[test]
fn cli_fails_with_the_offending_line() {
    let dir = tempfile::tempdir().unwrap();
    let trace = write_trace(dir.path(), "{\"call\":\"End\"}\n");

    let output = Command::new(env!("CARGO_BIN_EXE_aero-gl-trace-replay"))
        .arg(&trace)
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("line 1"), "stderr: {stderr}");
}

#[test]
fn cli_rejects_empty_sampler_pool() {
    let dir = tempfile::tempdir().unwrap();
    let trace = write_trace(dir.path(), "");

    let output = Command::new(env!("CARGO_BIN_EXE_aero-gl-trace-replay"))
        .arg(&trace)
        .args(["--sampler-slots", "0"])
        .output()
        .unwrap();
    assert!(!output.status.success());
}
