use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use doppler_sim_core::{
    EngineEvent, Entity, Scenario, SimulationConfig, SimulationEngine, TimeSpeed, TraceRecorder,
    TraceSettings, Vector2,
};
use tracing_subscriber::EnvFilter;

fn main() -> doppler_sim_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run_simulation(args),
        Commands::Scenarios => {
            list_scenarios();
            Ok(())
        }
    }
}

fn run_simulation(args: RunArgs) -> doppler_sim_core::Result<()> {
    let config = build_config(&args)?;

    let scenario: Scenario = args.scenario.parse()?;
    tracing::info!(%scenario, duration = args.duration, "starting simulation");

    let mut engine = SimulationEngine::with_scenario(config, scenario)?;
    let mut recorder = TraceRecorder::new(TraceSettings::default());
    if args.export.is_some() {
        recorder.start();
    }

    let frame_dt = 1.0 / f64::from(args.fps.max(1));
    let frames = (args.duration / frame_dt).ceil() as usize;
    let mut detections = 0usize;
    let mut emitted = 0usize;
    let mut peak_frequency: Option<f64> = None;

    for _ in 0..frames {
        engine.step(frame_dt, false);
        recorder.record(engine.frame_record());

        if engine.take_wave_detected() {
            detections += 1;
        }
        for event in engine.drain_events() {
            match event {
                EngineEvent::WavefrontAdded(_) => emitted += 1,
                EngineEvent::ObservedFrequencyChanged(Some(hz)) => {
                    peak_frequency = Some(peak_frequency.map_or(hz, |peak| peak.max(hz)));
                }
                EngineEvent::Rewound { time } => tracing::trace!(time, "rewound"),
                _ => {}
            }
        }
    }

    if let Some(seconds) = args.rewind {
        let before = engine.time();
        engine.set_time_speed(TimeSpeed::Reverse.factor())?;
        let rewind_frames = (seconds / frame_dt).ceil() as usize;
        for _ in 0..rewind_frames {
            engine.step(frame_dt, false);
            recorder.record(engine.frame_record());
        }
        tracing::info!(from = before, to = engine.time(), "rewound simulation");
    }

    let measured = engine.measured_observed_frequency()?;
    let source = engine.body(Entity::Source);
    let observer = engine.body(Entity::Observer);
    tracing::info!(
        time = engine.time(),
        source = ?(source.position.x, source.position.y),
        observer = ?(observer.position.x, observer.position.y),
        live_wavefronts = engine.wavefronts().len(),
        emitted,
        detections,
        observed_hz = ?engine.observed_frequency(),
        peak_hz = ?peak_frequency,
        measured_hz = ?measured,
        "simulation finished"
    );

    if let Some(path) = &args.export {
        recorder.stop();
        recorder.write_to(path, scenario)?;
    }
    Ok(())
}

fn build_config(args: &RunArgs) -> doppler_sim_core::Result<SimulationConfig> {
    let mut config = match &args.config {
        Some(path) => SimulationConfig::from_path(path)?,
        None => SimulationConfig::default(),
    };
    if let Some(sound_speed) = args.sound_speed {
        config.sound_speed = sound_speed;
    }
    if let Some(frequency) = args.frequency {
        config.emitted_frequency = frequency;
    }
    if let Some(speed) = args.time_speed {
        config.time_speed = speed.into_time_speed().factor();
    }
    if let Some((x, y)) = args.mic {
        config.microphone.position = Vector2::new(x, y);
        config.microphone.enabled = true;
    }
    Ok(config)
}

fn list_scenarios() {
    for scenario in Scenario::ALL {
        println!("{:<22} {}", scenario.name(), scenario.description());
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

fn parse_point(raw: &str) -> Result<(f64, f64), String> {
    let (x, y) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected `X,Y`, got `{raw}`"))?;
    let x = x.trim().parse::<f64>().map_err(|err| err.to_string())?;
    let y = y.trim().parse::<f64>().map_err(|err| err.to_string())?;
    Ok((x, y))
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless acoustic Doppler effect simulator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Step the engine at a fixed frame rate and log a summary.
    Run(RunArgs),
    /// List the built-in scenarios.
    Scenarios,
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    /// Scenario name, see `scenarios`.
    #[arg(short, long, default_value = "source-approaching")]
    scenario: String,
    /// Real seconds to simulate.
    #[arg(short, long, default_value_t = 5.0)]
    duration: f64,
    /// Frames per real second.
    #[arg(long, default_value_t = 60)]
    fps: u32,
    /// Playback speed; defaults to the config file value.
    #[arg(long, value_enum)]
    time_speed: Option<SpeedArg>,
    /// Override the speed of sound in m/s.
    #[arg(long)]
    sound_speed: Option<f64>,
    /// Override the emitted frequency in Hz.
    #[arg(long)]
    frequency: Option<f64>,
    /// JSON config file; CLI overrides win.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Enable the microphone probe at `X,Y` meters.
    #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
    mic: Option<(f64, f64)>,
    /// Rewind this many real seconds after the forward run.
    #[arg(long)]
    rewind: Option<f64>,
    /// Write a JSON trace of every frame to this path.
    #[arg(short, long)]
    export: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SpeedArg {
    Normal,
    Slow,
    Fast,
}

impl SpeedArg {
    fn into_time_speed(self) -> TimeSpeed {
        match self {
            SpeedArg::Normal => TimeSpeed::Normal,
            SpeedArg::Slow => TimeSpeed::Slow,
            SpeedArg::Fast => TimeSpeed::Fast,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_points() {
        assert_eq!(parse_point("30,-12.5").unwrap(), (30.0, -12.5));
        assert_eq!(parse_point(" 1 , 2 ").unwrap(), (1.0, 2.0));
        assert!(parse_point("30").is_err());
        assert!(parse_point("a,b").is_err());
    }

    #[test]
    fn cli_accepts_run_flags() {
        let cli = Cli::try_parse_from([
            "doppler-sim",
            "run",
            "--scenario",
            "fly-by",
            "--mic",
            "-10,5",
            "--time-speed",
            "slow",
            "--rewind",
            "1.5",
        ])
        .unwrap();

        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.scenario, "fly-by");
        assert_eq!(args.mic, Some((-10.0, 5.0)));
        assert_eq!(args.rewind, Some(1.5));
        assert!(matches!(args.time_speed, Some(SpeedArg::Slow)));
    }

    fn run_args(extra: &[&str]) -> RunArgs {
        let mut argv = vec!["doppler-sim", "run"];
        argv.extend_from_slice(extra);
        let cli = Cli::try_parse_from(argv).unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        args
    }

    #[test]
    fn config_file_time_speed_survives_without_flag() {
        let path = std::env::temp_dir().join(format!("doppler-config-{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "time_speed": 0.25, "sound_speed": 300.0 }"#).unwrap();
        let path_arg = path.to_string_lossy().into_owned();

        let from_file = build_config(&run_args(&["--config", &path_arg])).unwrap();
        let overridden =
            build_config(&run_args(&["--config", &path_arg, "--time-speed", "fast"])).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert!(run_args(&[]).time_speed.is_none());
        assert_eq!(from_file.time_speed, 0.25);
        assert_eq!(from_file.sound_speed, 300.0);
        assert_eq!(overridden.time_speed, 2.0);
    }
}
