use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use soma_core::SomaConfig;
use soma_reasoning::{
    create_generator, Entry, LoopHandles, SimClock, SimulationLoop, ThoughtEngine, ThoughtGenerator,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod display;

use display::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Plain,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "soma", version, about = "An embodied agent whose thoughts come from its body", long_about = None)]
struct Args {
    /// Path to config file
    #[arg(short, long, default_value = "soma.toml")]
    config: PathBuf,

    /// Use the offline mock generator instead of a real model
    #[arg(long)]
    mock: bool,

    /// Disable coloured output
    #[arg(long)]
    no_color: bool,

    /// Start the WebSocket gateway regardless of config
    #[cfg(feature = "gateway")]
    #[arg(long)]
    gateway: bool,

    /// Openness, 0.0-1.0
    #[arg(long)]
    openness: Option<f64>,

    /// Conscientiousness, 0.0-1.0
    #[arg(long)]
    conscientiousness: Option<f64>,

    /// Extraversion, 0.0-1.0
    #[arg(long)]
    extraversion: Option<f64>,

    /// Agreeableness, 0.0-1.0
    #[arg(long)]
    agreeableness: Option<f64>,

    /// Neuroticism, 0.0-1.0
    #[arg(long)]
    neuroticism: Option<f64>,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Plain, env = "SOMA_LOG_FORMAT")]
    log_format: LogFormat,

    /// Write logs to a daily rolling file instead of stderr
    #[arg(long, env = "SOMA_LOG_FILE")]
    log_file: Option<PathBuf>,
}

impl Args {
    /// Command-line flags win over the config file and environment.
    fn apply(&self, config: &mut SomaConfig) {
        if self.mock {
            config.llm.provider = "mock".to_string();
        }
        #[cfg(feature = "gateway")]
        {
            if self.gateway {
                config.gateway.enabled = true;
            }
        }
        let p = &mut config.personality;
        for (flag, trait_level) in [
            (self.openness, &mut p.openness),
            (self.conscientiousness, &mut p.conscientiousness),
            (self.extraversion, &mut p.extraversion),
            (self.agreeableness, &mut p.agreeableness),
            (self.neuroticism, &mut p.neuroticism),
        ] {
            if let Some(v) = flag {
                *trait_level = v.clamp(0.0, 1.0);
            }
        }
    }
}

fn init_logging(args: &Args) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (writer, guard) = match &args.log_file {
        Some(path) => {
            let dir = path.parent().filter(|d| !d.as_os_str().is_empty()).unwrap_or(std::path::Path::new("."));
            let name = path.file_name().context("--log-file needs a file name")?;
            let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, name));
            (BoxMakeWriter::new(writer), Some(guard))
        }
        None => (BoxMakeWriter::new(std::io::stderr), None),
    };
    let ansi = args.log_file.is_none() && !args.no_color;

    let registry = tracing_subscriber::registry().with(filter);
    match args.log_format {
        LogFormat::Json => registry.with(fmt::layer().json().with_writer(writer)).init(),
        LogFormat::Plain => registry.with(fmt::layer().with_ansi(ansi).with_writer(writer)).init(),
    }
    Ok(guard)
}

/// Terminal plus, when enabled, the gateway.
struct Outputs {
    display: Display,
    #[cfg(feature = "gateway")]
    hub: Option<Arc<soma_gateway::Hub>>,
}

impl Outputs {
    fn emit(&self, entry: &Entry) {
        self.display.entry(entry);
        #[cfg(feature = "gateway")]
        {
            if let Some(hub) = &self.hub {
                hub.broadcast(&soma_gateway::ServerMessage::from(entry));
            }
        }
    }
}

#[cfg(feature = "gateway")]
fn start_gateway(
    config: &SomaConfig,
    input: mpsc::Sender<String>,
    snapshots: watch::Receiver<soma_reasoning::Snapshot>,
) -> Option<Arc<soma_gateway::Hub>> {
    if !config.gateway.enabled {
        return None;
    }
    let hub = Arc::new(soma_gateway::Hub::new(config.gateway.listener_queue));
    soma_gateway::GatewayServer::new(&config.gateway, hub.clone(), input, snapshots).start();
    Some(hub)
}

/// Read stdin on a plain thread; tokio's stdin would hold the runtime open at exit.
fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            let Ok(line) = line else { break };
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
        tracing::debug!("stdin closed");
    });
    rx
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    let _log_guard = init_logging(&args)?;

    let mut config = SomaConfig::load_or_default(&args.config);
    args.apply(&mut config);

    let generator = create_generator(&config.llm)?;
    info!("Thought generator: {} ({})", generator.name(), config.llm.model);

    let clock = Arc::new(SimClock::default());
    let engine = ThoughtEngine::new(generator, &config);
    let (sim, handles) = SimulationLoop::new(&config, engine, Arc::clone(&clock));
    let LoopHandles {
        input,
        mut entries,
        snapshots,
    } = handles;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sim_task = sim.spawn(shutdown_rx);

    let outputs = Outputs {
        display: Display::new(!args.no_color),
        #[cfg(feature = "gateway")]
        hub: start_gateway(&config, input.clone(), snapshots.clone()),
    };
    outputs.display.notice(
        "Speak plainly, *act* between asterisks, ~change the environment. /pause /resume /status /quit",
    );

    let mut lines = spawn_stdin_reader();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            entry = entries.recv() => match entry {
                Some(entry) => outputs.emit(&entry),
                None => break,
            },
            Some(line) = lines.recv() => match line.trim() {
                "/quit" | "/exit" => break,
                "/pause" => {
                    clock.pause();
                    outputs.display.notice("paused");
                }
                "/resume" => {
                    clock.resume();
                    outputs.display.notice("resumed");
                }
                "/status" => outputs.display.status(&snapshots.borrow()),
                "" => {}
                _ => {
                    if input.send(line.trim().to_string()).await.is_err() {
                        break;
                    }
                }
            },
            _ = &mut ctrl_c => {
                info!("Interrupted");
                break;
            }
        }
    }

    shutdown_tx.send_replace(true);
    sim_task.await.context("simulation task panicked")?;
    while let Ok(entry) = entries.try_recv() {
        outputs.emit(&entry);
    }
    info!("Simulation stopped after {:?}", clock.elapsed());
    Ok(())
}
