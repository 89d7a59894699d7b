use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use camwatch_core::{
    sync_once, CameraStatus, Gateway, GistStore, SimulatedProbe, Simulator, SimulatorConfig,
    SyncSettings,
};
use camwatch_core::analysis::SiteAnalyst;
use camwatch_core::geo::{IpLocator, Locator};
use clap::{Parser, Subcommand, ValueEnum};
use tokio::time::{interval_at, sleep, Instant};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod render;
mod viewer;

#[derive(Debug, Parser)]
#[command(name = "camwatch")]
#[command(about = "Camera roster monitor with simulated liveness checks and cloud sync")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(long, default_value = "./data")]
    data_dir: PathBuf,

    #[arg(long, default_value_t = 60)]
    check_interval_secs: u64,

    #[arg(long, default_value_t = 3500)]
    first_check_delay_ms: u64,

    #[arg(long, default_value_t = 0.01)]
    toggle_probability: f64,

    #[arg(long, default_value_t = 24)]
    history_cap: usize,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the roster, optionally filtered.
    List {
        #[arg(long)]
        search: Option<String>,
        #[arg(long, value_enum)]
        status: Option<StatusArg>,
        #[arg(long, value_enum, default_value = "human")]
        format: OutputFormat,
    },
    /// Register a camera with explicit fields.
    Add {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "192.168.1.xxx")]
        ip: String,
        #[arg(long, default_value = "")]
        address: String,
        #[arg(long)]
        lat: f64,
        #[arg(long)]
        lng: f64,
        #[arg(long, value_enum, default_value = "online")]
        status: StatusArg,
        #[arg(long)]
        video_url: Option<String>,
    },
    /// Pin-mode creation: only coordinates, everything else defaulted.
    Pin { lat: f64, lng: f64 },
    /// Edit any subset of a camera's fields.
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        ip: Option<String>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        lat: Option<f64>,
        #[arg(long)]
        lng: Option<f64>,
        #[arg(long, value_enum)]
        status: Option<StatusArg>,
        #[arg(long)]
        video_url: Option<String>,
    },
    /// Soft-delete a camera (kept as a tombstone for sync).
    Remove { id: String },
    /// Run one liveness cycle and print the result.
    Check {
        #[arg(long, value_enum, default_value = "human")]
        format: OutputFormat,
    },
    /// Keep running liveness cycles on the regular schedule.
    Watch {
        #[arg(long, value_enum, default_value = "human")]
        format: OutputFormat,
    },
    /// Full-screen dashboard with live status refresh.
    View,
    /// Merge the roster with the cloud snapshot and push the result back.
    Sync,
    /// Store or show cloud sync credentials.
    Settings {
        #[arg(long)]
        token: Option<String>,
        #[arg(long)]
        gist_id: Option<String>,
        #[arg(long)]
        show: bool,
    },
    /// Ask the AI collaborator for a coverage assessment.
    Analyze {
        #[arg(long)]
        api_key: Option<String>,
    },
    /// Look up the operator's coarse position.
    Locate,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StatusArg {
    Online,
    Offline,
}

impl From<StatusArg> for CameraStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Online => Self::Online,
            StatusArg::Offline => Self::Offline,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
    Ndjson,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let config = SimulatorConfig {
        toggle_probability: cli.toggle_probability,
        history_cap: cli.history_cap,
        check_interval: Duration::from_secs(cli.check_interval_secs),
        first_check_delay: Duration::from_millis(cli.first_check_delay_ms),
        ..SimulatorConfig::default()
    };

    let mut gateway = Gateway::open(&cli.data_dir)?;

    match cli.command {
        Command::List {
            search,
            status,
            format,
        } => {
            let snapshot = gateway.snapshot();
            let term = search.unwrap_or_default();
            let hits = camwatch_core::filter(&snapshot, &term, status.map(Into::into));
            render::print_roster(&hits, camwatch_core::stats(&snapshot), format)?;
        }
        Command::Add {
            name,
            ip,
            address,
            lat,
            lng,
            status,
            video_url,
        } => {
            let record = gateway.create(camwatch_core::NewCamera {
                name,
                ip,
                address,
                lat,
                lng,
                status: status.into(),
                video_url,
            })?;
            println!("added {} ({})", record.name, record.id);
        }
        Command::Pin { lat, lng } => {
            let record = gateway.pin(lat, lng)?;
            println!(
                "pinned {} at ({:.5}, {:.5}) — edit it to fill in the details",
                record.id, record.lat, record.lng
            );
        }
        Command::Edit {
            id,
            name,
            ip,
            address,
            lat,
            lng,
            status,
            video_url,
        } => {
            let mut record = gateway
                .find(&id)
                .ok_or_else(|| anyhow::anyhow!("no camera with id {id}"))?;
            if let Some(name) = name {
                record.name = name;
            }
            if let Some(ip) = ip {
                record.ip = ip;
            }
            if let Some(address) = address {
                record.address = address;
            }
            if let Some(lat) = lat {
                record.lat = lat;
            }
            if let Some(lng) = lng {
                record.lng = lng;
            }
            if let Some(status) = status {
                record.status = status.into();
            }
            if let Some(url) = video_url {
                record.video_url = if url.is_empty() { None } else { Some(url) };
            }
            let saved = gateway.update(record)?;
            println!("saved {} ({})", saved.name, saved.id);
        }
        Command::Remove { id } => {
            let removed = gateway.soft_delete(&id)?;
            println!("removed {} ({})", removed.name, removed.id);
        }
        Command::Check { format } => {
            let mut simulator = Simulator::new(SimulatedProbe::new(&config), config);
            let outcome = simulator.run_cycle(&mut gateway).await?;
            render::print_cycle(&gateway.snapshot(), outcome, format)?;
        }
        Command::Watch { format } => {
            let simulator = Simulator::new(SimulatedProbe::new(&config), config);
            watch_loop(&mut gateway, simulator, format).await?;
        }
        Command::View => {
            let simulator = Simulator::new(SimulatedProbe::new(&config), config);
            viewer::run_viewer(&mut gateway, simulator).await?;
        }
        Command::Sync => {
            let settings = SyncSettings::load(&cli.data_dir)?;
            let remote = GistStore::new()?;
            match sync_once(&mut gateway, &remote, &settings).await {
                Ok(report) => println!(
                    "sync complete: {} local + {} remote -> {} cameras",
                    report.local_count, report.remote_count, report.merged_count
                ),
                Err(err) => println!("sync failed: {err}"),
            }
        }
        Command::Settings {
            token,
            gist_id,
            show,
        } => {
            let mut settings = SyncSettings::load(&cli.data_dir)?;
            let changed = token.is_some() || gist_id.is_some();
            if let Some(token) = token {
                settings.token = token;
            }
            if let Some(gist_id) = gist_id {
                settings.gist_id = gist_id;
            }
            if changed {
                settings.save(&cli.data_dir)?;
            }
            if show {
                println!("token:   {}", render::redact_token(&settings.token));
                println!(
                    "gist id: {}",
                    if settings.gist_id.is_empty() {
                        "(unset)"
                    } else {
                        settings.gist_id.as_str()
                    }
                );
            } else {
                println!(
                    "settings saved ({})",
                    if settings.is_configured() {
                        "sync ready"
                    } else {
                        "incomplete, sync will refuse to run"
                    }
                );
            }
        }
        Command::Analyze { api_key } => {
            let key = api_key
                .or_else(|| std::env::var("GEMINI_API_KEY").ok())
                .unwrap_or_default();
            if key.is_empty() {
                println!("no API key: pass --api-key or set GEMINI_API_KEY");
            } else {
                let analyst = SiteAnalyst::new(key);
                let text = analyst.analyze_coverage(&gateway.snapshot()).await;
                println!("{text}");
            }
        }
        Command::Locate => {
            let locator = IpLocator::new()?;
            match locator.current_position().await {
                Ok(point) => println!("current position: ({:.5}, {:.5})", point.lat, point.lng),
                Err(err) => println!("{err}"),
            }
        }
    }

    Ok(())
}

/// Recurring liveness schedule: one early cycle shortly after startup, then
/// the regular interval. Both timers live inside the select, so ctrl-c (or
/// dropping the future) cancels them together.
async fn watch_loop(
    gateway: &mut Gateway,
    mut simulator: Simulator<SimulatedProbe>,
    format: OutputFormat,
) -> Result<()> {
    let interval = simulator.config().check_interval;
    let first = sleep(simulator.config().first_check_delay);
    tokio::pin!(first);
    let mut first_done = false;
    let mut ticker = interval_at(Instant::now() + interval, interval);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                warn!("received ctrl-c, stopping");
                break;
            }
            () = &mut first, if !first_done => {
                first_done = true;
                let outcome = simulator.run_cycle(gateway).await?;
                render::print_cycle(&gateway.snapshot(), outcome, format)?;
                info!(checked = outcome.checked, toggled = outcome.toggled, "first cycle");
            }
            _ = ticker.tick() => {
                let outcome = simulator.run_cycle(gateway).await?;
                render::print_cycle(&gateway.snapshot(), outcome, format)?;
                info!(checked = outcome.checked, toggled = outcome.toggled, "cycle");
            }
        }
    }

    Ok(())
}
