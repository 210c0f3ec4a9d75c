use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "scrubreel", version)]
struct Cli {
    /// Log transport, scheduler and splash decisions to stderr.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Make a looping GIF play once and hold its first frame for the fade-in.
    PatchGif(PatchGifArgs),
    /// Print the section timing table for a device variant.
    Table(TableArgs),
    /// Run a scripted session against simulated videos and print the event log as JSON.
    Simulate(SimulateArgs),
}

#[derive(Parser, Debug)]
struct PatchGifArgs {
    /// Input GIF.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output GIF path.
    #[arg(long)]
    out: PathBuf,

    /// Decode the patched output to check it is still a valid GIF.
    #[arg(long)]
    verify: bool,
}

#[derive(Parser, Debug)]
struct TableArgs {
    /// Experience config JSON. Defaults to the built-in preset for `--device`.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Device preset used when no config is given.
    #[arg(long, value_enum, default_value_t = DeviceChoice::Pointer)]
    device: DeviceChoice,

    /// Print JSON instead of a text table.
    #[arg(long)]
    json: bool,
}

#[derive(Parser, Debug)]
struct SimulateArgs {
    /// Script JSON.
    #[arg(long)]
    script: PathBuf,

    /// Experience config JSON. Defaults to the built-in preset for `--device`.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Device preset used when no config is given.
    #[arg(long, value_enum, default_value_t = DeviceChoice::Pointer)]
    device: DeviceChoice,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DeviceChoice {
    Pointer,
    Touch,
}

impl From<DeviceChoice> for scrubreel::DeviceClass {
    fn from(d: DeviceChoice) -> Self {
        match d {
            DeviceChoice::Pointer => Self::Pointer,
            DeviceChoice::Touch => Self::Touch,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::PatchGif(args) => cmd_patch_gif(args),
        Command::Table(args) => cmd_table(args),
        Command::Simulate(args) => cmd_simulate(args),
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn read_config(
    path: Option<&Path>,
    device: DeviceChoice,
) -> anyhow::Result<scrubreel::ExperienceConfig> {
    let Some(path) = path else {
        return Ok(scrubreel::ExperienceConfig::for_device(device.into()));
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read config '{}'", path.display()))?;
    scrubreel::ExperienceConfig::from_json(&text)
        .with_context(|| format!("parse config '{}'", path.display()))
}

fn cmd_patch_gif(args: PatchGifArgs) -> anyhow::Result<()> {
    let bytes = std::fs::read(&args.in_path)
        .with_context(|| format!("read gif '{}'", args.in_path.display()))?;
    let layout = scrubreel::scan_gif(&bytes)
        .with_context(|| format!("scan gif '{}'", args.in_path.display()))?;
    let patched = scrubreel::patch_gif(&bytes);

    let decoded_delays = if args.verify {
        Some(decoded_delays_ms(&patched.bytes).with_context(|| "decode patched gif")?)
    } else {
        None
    };

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(&args.out, &patched.bytes)
        .with_context(|| format!("write gif '{}'", args.out.display()))?;

    println!(
        "frames={} loop_field={} duration_ms={}",
        layout.frame_delays_cs.len(),
        layout.loop_count_offset.is_some(),
        patched.duration_ms
    );
    if let Some(delays) = decoded_delays {
        let list: Vec<String> = delays.iter().map(u32::to_string).collect();
        println!("decoded_delays_ms={}", list.join(","));
    }
    Ok(())
}

fn decoded_delays_ms(bytes: &[u8]) -> anyhow::Result<Vec<u32>> {
    use image::AnimationDecoder as _;

    let decoder = image::codecs::gif::GifDecoder::new(std::io::Cursor::new(bytes))?;
    let frames = decoder.into_frames().collect_frames()?;
    anyhow::ensure!(!frames.is_empty(), "patched gif has no frames");
    Ok(frames
        .iter()
        .map(|f| {
            let (num, den) = f.delay().numer_denom_ms();
            if den == 0 { 0 } else { num / den }
        })
        .collect())
}

fn cmd_table(args: TableArgs) -> anyhow::Result<()> {
    let cfg = read_config(args.config.as_deref(), args.device)?;
    let table = cfg.timing_table()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&table)?);
        return Ok(());
    }

    println!(
        "fps={}/{} total_frames={} sections={}",
        table.fps().num,
        table.fps().den,
        table.total_frames(),
        table.section_count()
    );
    println!("section  forward      reverse      freeze_s");
    for section in 1..=table.section_count() {
        let fwd = table
            .forward_range(section)
            .with_context(|| format!("section {section}"))?;
        let rev = table
            .reverse_range(section)
            .with_context(|| format!("section {section}"))?;
        let freeze = table
            .freeze_time(scrubreel::Track::Forward, section)
            .with_context(|| format!("section {section}"))?;
        println!(
            "{section:>7}  {:>4}..{:<5}  {:>4}..{:<5}  {freeze:.3}",
            fwd.0.0, fwd.1.0, rev.0.0, rev.1.0
        );
    }
    Ok(())
}

fn cmd_simulate(args: SimulateArgs) -> anyhow::Result<()> {
    let cfg = read_config(args.config.as_deref(), args.device)?;
    let text = std::fs::read_to_string(&args.script)
        .with_context(|| format!("read script '{}'", args.script.display()))?;
    let script = scrubreel::Script::from_json(&text)
        .with_context(|| format!("parse script '{}'", args.script.display()))?;
    let report = scrubreel::Simulation::run_script(cfg, &script)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
