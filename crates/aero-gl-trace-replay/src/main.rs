use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use aero_gl::{ContextConfig, GlContext, RecordingDevice, ShaderStage};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(
    name = "aero-gl-trace-replay",
    about = "Replay a JSON-lines legacy GL trace through the fixed-function translation core."
)]
struct Args {
    /// Trace file, one JSON call record per line
    trace: PathBuf,

    /// Number of vertex stream slots the device exposes
    #[arg(long, value_name = "N", default_value_t = ContextConfig::default().stream_slots)]
    stream_slots: u32,

    /// Number of sampler slots the device exposes
    #[arg(long, value_name = "N", default_value_t = ContextConfig::default().sampler_slots)]
    sampler_slots: u32,

    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Write the programs of every draw into this directory
    #[arg(long, value_name = "DIR")]
    dump_shaders: Option<PathBuf>,

    /// Print the replay summary as JSON
    #[arg(long, action = clap::ArgAction::SetTrue)]
    summary_json: bool,
}

fn init_logging(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn dump_shaders(ctx: &GlContext<RecordingDevice>, dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    for (index, draw) in ctx.device().draws().iter().enumerate() {
        for code in [&draw.vertex_shader, &draw.fragment_shader] {
            let stage = match code.stage {
                ShaderStage::Vertex => "vs",
                ShaderStage::Fragment => "fs",
            };
            let path = dir.join(format!("draw{index:05}.{stage}.wgsl"));
            fs::write(&path, &code.source).with_context(|| format!("write {}", path.display()))?;
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_format);

    let config = ContextConfig {
        stream_slots: args.stream_slots,
        sampler_slots: args.sampler_slots,
        ..ContextConfig::default()
    };
    let device = RecordingDevice::new(config.stream_slots, config.sampler_slots);
    let mut ctx = GlContext::new(device, config).context("invalid context configuration")?;

    let file = File::open(&args.trace).with_context(|| format!("open {}", args.trace.display()))?;
    let records = aero_gl_trace_replay::parse_trace(BufReader::new(file))
        .with_context(|| format!("decode {}", args.trace.display()))?;
    let summary = aero_gl_trace_replay::replay_calls(&mut ctx, records)
        .with_context(|| format!("replay {}", args.trace.display()))?;

    if let Some(dir) = &args.dump_shaders {
        dump_shaders(&ctx, dir)?;
    }

    if args.summary_json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "{} calls, {} draws ({} indexed), {} bytes uploaded",
            summary.calls, summary.draws, summary.device.indexed_draws, summary.device.bytes_uploaded
        );
    }
    Ok(())
}
