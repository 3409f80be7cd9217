use rfid_jukebox::app::{Jukebox, RestartReason};
use rfid_jukebox::config::{self, JukeboxConfig};
use rfid_jukebox::console::{self, ConsoleRouter};
use rfid_jukebox::model::AudioBackend;
use rfid_jukebox::web::WebSurface;
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
struct CliArgs {
    config_dir: Option<PathBuf>,
    bind: Option<String>,
    no_web: bool,
    backend: Option<AudioBackend>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args(std::env::args().skip(1).collect())?;
    let root = match args.config_dir.clone() {
        Some(dir) => dir,
        None => config::config_root()?,
    };

    match config::write_default_config(&root) {
        Ok(true) => info!(path = %config::config_path(&root).display(), "wrote default config"),
        Ok(false) => {}
        Err(err) => warn!(error = ?err, "could not write default config"),
    }

    let router = ConsoleRouter::new();
    let _console = console::spawn_reader(router.clone());

    loop {
        let mut settings = config::load_config(&root)?;
        apply_overrides(&mut settings, &args);

        let reason = run_session(&settings, &root, &router)?;
        info!(?reason, delay = ?settings.reset_delay(), "restarting");
        println!("Restarting...");
        thread::sleep(settings.reset_delay());
    }
}

fn run_session(
    settings: &JukeboxConfig,
    root: &std::path::Path,
    router: &ConsoleRouter,
) -> anyhow::Result<RestartReason> {
    let (web_tx, web_rx) = mpsc::channel();
    let surface = if settings.web_enabled {
        match WebSurface::start(&settings.bind_addr, web_tx, settings.network_timeout()) {
            Ok(surface) => {
                println!("WEB: Web Interface: http://{}/", surface.local_addr());
                Some(surface)
            }
            Err(err) => {
                warn!(error = %err, "continuing without web interface");
                None
            }
        }
    } else {
        None
    };

    let web = surface.as_ref().map(|_| web_rx);
    let mut jukebox = Jukebox::from_config(settings, root, router.connect(), web)?;
    let reason = jukebox.run();
    drop(surface);
    Ok(reason)
}

fn apply_overrides(settings: &mut JukeboxConfig, args: &CliArgs) {
    if let Some(bind) = &args.bind {
        settings.bind_addr = bind.clone();
    }
    if args.no_web {
        settings.web_enabled = false;
    }
    if let Some(backend) = args.backend {
        settings.audio_backend = backend;
    }
}

fn parse_args(args: Vec<String>) -> anyhow::Result<CliArgs> {
    let mut out = CliArgs::default();
    let mut index = 0;
    while index < args.len() {
        match args[index].as_str() {
            "--config-dir" => {
                index += 1;
                let Some(value) = args.get(index) else {
                    anyhow::bail!("--config-dir requires a directory");
                };
                out.config_dir = Some(PathBuf::from(value.trim()));
            }
            "--bind" => {
                index += 1;
                let Some(value) = args.get(index) else {
                    anyhow::bail!("--bind requires host:port value");
                };
                if value.trim().is_empty() {
                    anyhow::bail!("--bind cannot be empty");
                }
                out.bind = Some(value.trim().to_string());
            }
            "--no-web" => out.no_web = true,
            "--backend" => {
                index += 1;
                let Some(value) = args.get(index) else {
                    anyhow::bail!("--backend requires simulated, desktop or none");
                };
                let Some(backend) = AudioBackend::parse(value) else {
                    anyhow::bail!("unknown backend {value}");
                };
                out.backend = Some(backend);
            }
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            other => anyhow::bail!("unknown argument {other}"),
        }
        index += 1;
    }
    Ok(out)
}

fn print_help() {
    println!("rfid-jukebox");
    println!("  --config-dir DIR      Directory holding config.json and cards.json");
    println!("  --bind host:port      Web interface bind address");
    println!("  --no-web              Run without the web interface");
    println!("  --backend NAME        Audio backend: simulated, desktop or none");
    println!();
    println!("Console: single-letter commands, a track number, 'program', 'jukebox',");
    println!("'tap <card uid hex>' and 'press <play|next|prev|shuffle|reset>'.");
}
