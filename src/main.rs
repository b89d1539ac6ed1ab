//! Binary entrypoint for figure-rotator.
//!
//! Delegates sequencing to the library crate; this file only wires tasks.

use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

use figure_rotator::config::Configuration;
use figure_rotator::controller::{ShowOutcome, SlideshowController, TickCallback};
use figure_rotator::events::{SlideshowCommand, VisibilityChanged};
use figure_rotator::host::{DirectoryHost, FigureHost};
use figure_rotator::tasks;
use figure_rotator::timer::{ManualTimer, TokioTimer};

#[derive(Debug, Parser)]
#[command(
    name = "figure-rotator",
    version,
    about = "Shuffled slideshow over a directory of figures"
)]
struct Args {
    /// Path to YAML config
    #[arg(value_name = "CONFIG")]
    config: PathBuf,
    /// Deterministic RNG seed for the traversal shuffle (overrides shuffle-seed)
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,
    /// Auto-advance delay, e.g. "10s" or "1m 30s" (overrides interval)
    #[arg(long, value_name = "DURATION", value_parser = humantime::parse_duration)]
    interval: Option<Duration>,
    /// Print the first STEPS figures of the traversal without starting the slideshow
    #[arg(long = "dry-run", value_name = "STEPS")]
    dry_run: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // init tracing (RUST_LOG controls level, default = info)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    let Args {
        config,
        seed,
        interval,
        dry_run,
    } = Args::parse();

    let mut cfg = Configuration::from_yaml_file(&config)
        .with_context(|| format!("failed to load configuration from {}", config.display()))?;
    if seed.is_some() {
        cfg.shuffle_seed = seed;
    }
    if let Some(interval) = interval {
        cfg.interval = interval;
    }
    let cfg = cfg.validated().context("invalid configuration values")?;
    tracing::info!(
        "Loaded configuration from {}:\n{:#?}",
        config.display(),
        cfg
    );

    if let Some(steps) = dry_run {
        return run_dry_run(&cfg, steps);
    }

    // Channels (small/bounded)
    let (command_tx, command_rx) = mpsc::channel::<SlideshowCommand>(cfg.command_queue_capacity); // Timer/Input/Signals -> Slideshow
    let (visibility_tx, visibility_rx) = mpsc::channel::<VisibilityChanged>(64); // Host -> Viewer

    let cancel = CancellationToken::new();

    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::warn!("ctrl-c handler failed: {err}");
                return;
            }
            tracing::info!("ctrl-c received; initiating shutdown");
            cancel.cancel();
        });
    }

    #[cfg(unix)]
    {
        spawn_signal_navigation(
            SignalKind::user_defined1(),
            SlideshowCommand::Next,
            command_tx.clone(),
            cancel.clone(),
        );
        spawn_signal_navigation(
            SignalKind::user_defined2(),
            SlideshowCommand::Previous,
            command_tx.clone(),
            cancel.clone(),
        );
    }

    let on_tick: TickCallback = {
        let command_tx = command_tx.clone();
        Arc::new(move |generation| {
            if let Err(err) = command_tx.try_send(SlideshowCommand::Tick { generation }) {
                tracing::warn!(generation, "failed to deliver auto-advance tick: {err}");
            }
        })
    };
    let host = DirectoryHost::new(&cfg.figure_library_path).with_events(visibility_tx);
    let controller = SlideshowController::new(
        host,
        TokioTimer::new(cancel.clone()),
        cfg.interval,
        cfg.shuffle_rng(),
        on_tick,
    );

    let mut tasks = JoinSet::new();

    // Slideshow
    tasks.spawn({
        let cancel = cancel.clone();
        async move {
            tasks::slideshow::run(controller, command_rx, cancel)
                .await
                .context("slideshow task failed")
        }
    });

    // Viewer
    tasks.spawn({
        let cancel = cancel.clone();
        async move {
            tasks::viewer::run(visibility_rx, cancel)
                .await
                .map(|_| ())
                .context("viewer task failed")
        }
    });

    // Operator input; Ctrl-D on a terminal shuts the slideshow down
    if io::stdin().is_terminal() {
        let to_slideshow = command_tx.clone();
        let cancel = cancel.clone();
        tasks.spawn(async move {
            let reader = BufReader::new(tokio::io::stdin());
            let res = tasks::input::run(reader, to_slideshow, cancel.clone())
                .await
                .context("input task failed");
            if !cancel.is_cancelled() {
                tracing::info!("stdin closed; initiating shutdown");
                cancel.cancel();
            }
            res
        });
    } else {
        tracing::debug!("stdin is not a terminal; skipping operator input");
    }
    drop(command_tx);

    cancel.cancelled().await;

    // Drain JoinSet (wait for other tasks to complete)
    while let Some(res) = tasks.join_next().await {
        match res {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!("task error: {e:?}"),
            Err(e) => tracing::error!("join error: {e}"),
        }
    }

    Ok(())
}

#[cfg(unix)]
fn spawn_signal_navigation(
    kind: SignalKind,
    command: SlideshowCommand,
    to_slideshow: mpsc::Sender<SlideshowCommand>,
    cancel: CancellationToken,
) {
    tokio::spawn(async move {
        match signal(kind) {
            Ok(mut stream) => loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    received = stream.recv() => {
                        if received.is_none() {
                            break;
                        }
                        tracing::info!(?command, "signal received; navigating");
                        if let Err(err) = to_slideshow.send(command).await {
                            tracing::warn!("failed to forward navigation request: {err}");
                            break;
                        }
                    }
                }
            },
            Err(err) => tracing::warn!("failed to register navigation signal handler: {err}"),
        }
    });
}

fn run_dry_run(cfg: &Configuration, steps: usize) -> Result<()> {
    let host = DirectoryHost::new(&cfg.figure_library_path);
    let figures = host.figures().context("failed to scan figure library")?;

    println!(
        "# slideshow dry run\n# figures: {}\n# interval: {}\n# steps: {}\n# seed: {}\n",
        figures.len(),
        humantime::format_duration(cfg.interval),
        steps,
        cfg.shuffle_seed
            .map_or_else(|| "(random)".to_string(), |s| s.to_string())
    );

    if figures.is_empty() {
        println!(
            "(no figures discovered under {})",
            cfg.figure_library_path.display()
        );
        return Ok(());
    }

    let mut controller = SlideshowController::new(
        host,
        ManualTimer::new(),
        cfg.interval,
        cfg.shuffle_rng(),
        Arc::new(|_: u64| {}),
    );

    println!("# planned order:");
    for step in 0..steps {
        let outcome = if step == 0 {
            controller.start()?
        } else {
            controller.advance_forward()?
        };
        let ShowOutcome::Displayed {
            position,
            figure_index,
            regenerated,
        } = outcome
        else {
            println!("  {:>4}: (nothing to display)", step + 1);
            continue;
        };
        let Some(path) = figures.get(figure_index) else {
            continue;
        };
        let marker = if regenerated { " (reshuffled)" } else { "" };
        println!(
            "  {:>4}: [{:>3}] {}{}",
            step + 1,
            position,
            path.display(),
            marker
        );
    }

    Ok(())
}
