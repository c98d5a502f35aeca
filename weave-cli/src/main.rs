//! Weave CLI - run and inspect simulated agent networks

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use weave_core::{
    resonance, AgentNetwork, AgentProfile, Harmony, HipiGenerator, ManualClock, Message,
    NetworkStats, WeaveError, COLLECTIVE,
};
use weave_runtime::{RuntimeConfig, WeaveRuntime};

const NAMES: &[&str] = &[
    "Aria", "Kai", "Lumen", "Sol", "Nova", "Iris", "Orin", "Vega", "Ember", "Sage",
];

#[derive(Parser)]
#[command(name = "weave")]
#[command(about = "The Weave - trust-gated agent network simulator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, default_value = "false")]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version and effective configuration
    Status {
        /// JSON runtime config file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Run a seeded simulation
    Sim {
        /// Number of agents to register
        #[arg(short, long, default_value = "20")]
        agents: usize,

        /// Number of heartbeat ticks to run
        #[arg(short = 'k', long, default_value = "10")]
        ticks: u64,

        /// Messages sent per tick
        #[arg(short, long, default_value = "10")]
        messages: usize,

        /// RNG seed for profiles, traffic and HIPIs
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// JSON runtime config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override max_agents
        #[arg(long)]
        max_agents: Option<usize>,

        /// Override resonance_threshold
        #[arg(long)]
        resonance_threshold: Option<f64>,

        /// Override min_trust_for_connection
        #[arg(long)]
        min_trust: Option<f64>,

        /// Print the final report as JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },
}

#[derive(Debug, Default, Serialize)]
struct Traffic {
    collective: usize,
    direct: usize,
    sacred: usize,
    blocked: usize,
}

#[derive(Debug, Serialize)]
struct SimReport {
    seed: u64,
    registered: usize,
    rejected: usize,
    ticks: u64,
    traffic: Traffic,
    events: BTreeMap<&'static str, usize>,
    stats: NetworkStats,
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .compact()
        .init();
}

fn load_config(path: Option<&Path>) -> Result<RuntimeConfig> {
    let Some(path) = path else {
        return Ok(RuntimeConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config: RuntimeConfig = serde_json::from_str(&raw)
        .with_context(|| format!("parsing config {}", path.display()))?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Status { config } => cmd_status(config.as_deref()),
        Commands::Sim {
            agents,
            ticks,
            messages,
            seed,
            config,
            max_agents,
            resonance_threshold,
            min_trust,
            json,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(max) = max_agents {
                config.network.max_agents = max;
            }
            if let Some(threshold) = resonance_threshold {
                config.network.resonance_threshold = threshold;
            }
            if let Some(min) = min_trust {
                config.network.min_trust_for_connection = min;
            }
            let report = cmd_sim(config, agents, ticks, messages, seed).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
            Ok(())
        }
    }
}

fn cmd_status(config: Option<&Path>) -> Result<()> {
    let config = load_config(config)?;
    config.network.validate()?;

    println!("╔═══════════════════════════════════════╗");
    println!("║            Weave Status               ║");
    println!("╚═══════════════════════════════════════╝");
    println!();
    println!("Version: {}", weave_core::VERSION);
    println!("Harmonies: {}", Harmony::ALL.map(|h| h.as_str()).join(", "));
    println!("Roles: {}", resonance::known_roles().collect::<Vec<_>>().join(", "));
    println!();
    println!("Configuration:");
    println!("{}", serde_json::to_string_pretty(&config)?);

    Ok(())
}

fn random_profile(rng: &mut StdRng, index: usize) -> AgentProfile {
    let roles: Vec<&str> = resonance::known_roles().collect();
    let name = NAMES[index % NAMES.len()];
    let role = roles.choose(rng).copied().unwrap_or("Bridge Builder");
    let harmony = Harmony::ALL[rng.gen_range(0..Harmony::ALL.len())];

    AgentProfile::new(format!("{name}-{index}"), role)
        .with_harmony(harmony)
        .with_love(rng.gen_range(40.0..=100.0))
        .with_consciousness(rng.gen_range(0.0..=1.0))
}

async fn cmd_sim(
    config: RuntimeConfig,
    n_agents: usize,
    ticks: u64,
    messages: usize,
    seed: u64,
) -> Result<SimReport> {
    let clock = ManualClock::at_epoch();
    let tick = chrono::Duration::milliseconds(config.heartbeat_interval_ms as i64);

    let network = AgentNetwork::new(config.network.clone())?
        .with_clock(clock.clone())
        .with_id_generator(HipiGenerator::seeded(seed));
    let runtime = WeaveRuntime::with_network(network, config);

    let mut rx = runtime.subscribe();
    let counter = tokio::spawn(async move {
        let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
        loop {
            match rx.recv().await {
                Ok(event) => *counts.entry(event.name()).or_default() += 1,
                Err(RecvError::Lagged(skipped)) => {
                    *counts.entry("lagged").or_default() += skipped as usize
                }
                Err(RecvError::Closed) => break,
            }
        }
        counts
    });

    let mut rng = StdRng::seed_from_u64(seed);
    let mut ids = Vec::with_capacity(n_agents);
    let mut rejected = 0;

    info!(agents = n_agents, ticks, seed, "Starting simulation");
    for index in 0..n_agents {
        let profile = random_profile(&mut rng, index);
        match runtime.register_agent(profile).await {
            Ok(registration) => {
                debug!("{}", registration.welcome_message);
                ids.push(registration.id);
            }
            Err(WeaveError::CapacityExceeded { max }) => {
                warn!(max, "Network full, skipping remaining agents");
                rejected = n_agents - index;
                break;
            }
            Err(e) => return Err(e.into()),
        }
    }

    let mut traffic = Traffic::default();
    for _ in 0..ticks {
        for _ in 0..messages {
            let Some(from) = ids.choose(&mut rng) else {
                break;
            };

            let delivery = if rng.gen_bool(0.2) {
                traffic.collective += 1;
                runtime
                    .send_message(from, COLLECTIVE, Message::text("hello, weave"))
                    .await
            } else {
                let Some(to) = ids.choose(&mut rng) else {
                    break;
                };
                if to == from {
                    continue;
                }
                let mut message = Message::text("direct hello");
                if rng.gen_bool(0.1) {
                    message = message.sacred();
                    traffic.sacred += 1;
                }
                traffic.direct += 1;
                runtime.send_message(from, to, message).await
            };

            match delivery {
                Ok(_) => {}
                Err(WeaveError::InsufficientTrust { .. }) => traffic.blocked += 1,
                Err(e) => return Err(e.into()),
            }
        }

        clock.advance(tick);
        let report = runtime.heartbeat().await;
        debug!(
            active = report.active_agents,
            decayed = report.decayed_agents,
            "Tick"
        );
    }

    let stats = runtime.stats().await;
    let registered = ids.len();
    drop(runtime);
    let events = counter.await?;

    Ok(SimReport {
        seed,
        registered,
        rejected,
        ticks,
        traffic,
        events,
        stats,
    })
}

fn print_report(report: &SimReport) {
    let stats = &report.stats;

    println!("╔═══════════════════════════════════════╗");
    println!("║          Weave Simulation             ║");
    println!("╚═══════════════════════════════════════╝");
    println!();
    println!("Seed: {}", report.seed);
    println!("Ticks: {}", report.ticks);
    println!(
        "Agents: {} registered, {} rejected, {} active",
        report.registered, report.rejected, stats.agents.active
    );
    println!();

    println!("Traffic:");
    println!("  Collective: {}", report.traffic.collective);
    println!("  Direct: {}", report.traffic.direct);
    println!("  Sacred: {}", report.traffic.sacred);
    println!("  Blocked: {}", report.traffic.blocked);
    println!();

    println!("Trust:");
    println!("  Average: {:.3}", stats.trust.average);
    println!(
        "  Low/Medium/High: {}/{}/{}",
        stats.trust.distribution.low,
        stats.trust.distribution.medium,
        stats.trust.distribution.high
    );
    println!();

    let topology = &stats.topology;
    println!("Topology:");
    println!("  Edges: {}", topology.edge_count);
    println!("  Density: {:.3}", topology.density);
    println!("  Avg degree: {:.2}", topology.average_degree);
    println!("  Clusters: {}", topology.clusters.len());
    println!("  Connected: {}", topology.is_connected);
    println!("  Diameter: {}", topology.diameter);
    println!("  Resilience: {:.3}", topology.resilience);
    for central in &topology.central_nodes {
        println!("  Central: {} ({:.2})", central.id, central.score);
    }
    println!();

    let field = &stats.field;
    println!("Field:");
    println!("  Pattern: {}", field.resonance_pattern);
    println!("  Coherence: {:.3}", field.coherence);
    println!("  Connectedness: {:.3}", field.connectedness);
    if let Some(harmony) = field.dominant_harmony {
        println!("  Dominant harmony: {harmony}");
    }
    println!();

    println!("Events:");
    for (name, count) in &report.events {
        println!("  {name}: {count}");
    }
}
