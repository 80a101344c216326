use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use rf_app::{AppResult, RunOptions, RunProgressEvent, RunReport, RunStage, run_service};
use rf_sim::SimulationConfig;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "reactflow")]
#[command(about = "Reacting-flow time advancement driver", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a case
    Run {
        /// Path to the case YAML file
        config_path: PathBuf,
        /// Number of in-process workers
        #[arg(long, default_value_t = 1)]
        ranks: usize,
        /// Restart file root; rank r reads ROOT-rrrr.json
        #[arg(long)]
        restart_file: Option<PathBuf>,
        /// Override the case name used for output files
        #[arg(long)]
        casename: Option<String>,
        /// Draw a progress bar on stdout
        #[arg(long)]
        progress: bool,
    },
    /// Validate a case file
    Validate {
        /// Path to the case YAML file
        config_path: PathBuf,
    },
    /// Print a default case file
    Init {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> AppResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config_path,
            ranks,
            restart_file,
            casename,
            progress,
        } => cmd_run(
            &config_path,
            ranks,
            RunOptions {
                restart_root: restart_file,
                casename,
            },
            progress,
        ),
        Commands::Validate { config_path } => cmd_validate(&config_path),
        Commands::Init { output } => cmd_init(output.as_deref()),
    }
}

fn cmd_validate(config_path: &Path) -> AppResult<()> {
    println!("Validating case: {}", config_path.display());
    let config = run_service::load_config(config_path)?;
    println!("✓ Case '{}' is valid", config.case_name);
    println!("  fingerprint: {}", config.fingerprint()?);
    Ok(())
}

fn cmd_init(output: Option<&Path>) -> AppResult<()> {
    let yaml = SimulationConfig::default()
        .to_yaml()
        .map_err(rf_app::AppError::from)?;
    match output {
        Some(path) => {
            std::fs::write(path, yaml)?;
            println!("✓ Wrote default case to {}", path.display());
        }
        None => print!("{yaml}"),
    }
    Ok(())
}

fn cmd_run(
    config_path: &Path,
    ranks: usize,
    options: RunOptions,
    show_progress: bool,
) -> AppResult<()> {
    let config = run_service::load_config(config_path)?;
    println!(
        "Running case '{}' on {} worker(s)",
        options.casename.as_deref().unwrap_or(&config.case_name),
        ranks
    );

    let mut last_emit = Instant::now();
    let mut last_fraction = -1.0f64;
    let mut render = |event: RunProgressEvent| {
        let fraction = event
            .stepping
            .as_ref()
            .map(|s| s.fraction_complete)
            .unwrap_or(-1.0);
        let emit_now = (fraction >= 0.0 && (fraction - last_fraction).abs() >= 0.005)
            || last_emit.elapsed().as_millis() >= 100;
        if emit_now {
            render_cli_progress(&event);
            if fraction >= 0.0 {
                last_fraction = fraction;
            }
            last_emit = Instant::now();
        }
    };
    let progress: Option<&mut (dyn FnMut(RunProgressEvent) + Send)> = if show_progress {
        Some(&mut render)
    } else {
        None
    };

    let reports = run_service::run_threads_with_progress(&config, ranks, &options, progress)?;
    if show_progress {
        clear_progress_line();
    }
    print_summary(&reports);
    Ok(())
}

fn clear_progress_line() {
    print!("\r{}\r", " ".repeat(120));
    let _ = io::stdout().flush();
}

fn render_cli_progress(event: &RunProgressEvent) {
    match (&event.stage, &event.stepping) {
        (RunStage::Stepping, Some(s)) => {
            let width = 28usize;
            let filled = ((s.fraction_complete * width as f64).round() as usize).min(width);
            let bar = format!(
                "{}{}",
                "#".repeat(filled),
                "-".repeat(width.saturating_sub(filled))
            );
            print!(
                "\r[{}] {:>6.2}%  t={:.4e}/{:.4e}s  step={}  dt={:.3e}  elapsed={:.1}s",
                bar,
                s.fraction_complete * 100.0,
                s.sim_time_s,
                s.t_final_s,
                s.step,
                s.dt_s,
                event.elapsed_wall_s
            );
        }
        _ => {
            let spinner = ['|', '/', '-', '\\'];
            let spin_idx = ((event.elapsed_wall_s * 10.0) as usize) % spinner.len();
            let mut line = format!(
                "\r{} {}  elapsed={:.2}s",
                spinner[spin_idx],
                event.stage.label(),
                event.elapsed_wall_s
            );
            if let Some(msg) = &event.message {
                line.push_str(&format!("  {}", msg));
            }
            print!("{}", line);
        }
    }
    let _ = io::stdout().flush();
}

fn print_summary(reports: &[RunReport]) {
    let Some(root) = reports.first() else {
        return;
    };
    match root.summary() {
        None => println!("✓ Setup finished; stopped as requested"),
        Some(summary) => {
            println!(
                "✓ Case '{}' completed: step={} t={:e}",
                root.case_name, summary.step, summary.t
            );
            if root.restarted {
                println!("  Restarted run");
            }
            println!("  Steps taken: {}", summary.steps_taken);
            println!("  Last dt:     {:e}", summary.last_dt);
            let checkpoints: usize = reports
                .iter()
                .filter_map(|r| r.summary())
                .map(|s| s.checkpoints.len())
                .sum();
            println!("  Checkpoint files: {}", checkpoints);
        }
    }
    let wall = reports.iter().map(|r| r.wall_time_s).fold(0.0, f64::max);
    println!("  Wall time:   {:.3}s", wall);
}
