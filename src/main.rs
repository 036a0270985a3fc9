mod analytics;
mod app_service;
mod app_state;
mod catalog;
mod commands;
mod dataset;
mod generate;
mod ui;

use anyhow::{bail, Context};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::info;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

use crate::analytics::{render_text, DashboardSnapshot, OrderFilter};
use crate::app_service::DashboardService;
use crate::app_state::{App, AppEvent};
use crate::commands::AppCommand;
use crate::dataset::{read_orders, validate, OrderStatus};
use crate::generate::{generate_to_file, GeneratorConfig};
use crate::ui::draw;

const DEFAULT_DATASET: &str = "data/shopify_orders.csv";

#[derive(Parser)]
#[command(name = "shopsynth")]
#[command(version, about = "Synthetic storefront order generator and dashboard")]
struct Cli {
    /// Debug-level logging for this crate
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a dataset and atomically replace the output file
    Generate {
        #[arg(short, long, env = "SHOPSYNTH_OUTPUT", default_value = DEFAULT_DATASET)]
        output: PathBuf,

        #[command(flatten)]
        generator: GeneratorArgs,
    },

    /// Check a dataset file against the generator invariants
    Validate {
        #[arg(env = "SHOPSYNTH_OUTPUT", default_value = DEFAULT_DATASET)]
        path: PathBuf,

        #[command(flatten)]
        generator: GeneratorArgs,
    },

    /// Print KPIs and breakdowns for a dataset file
    Summary {
        #[arg(env = "SHOPSYNTH_OUTPUT", default_value = DEFAULT_DATASET)]
        path: PathBuf,

        #[command(flatten)]
        filter: FilterArgs,

        /// Emit the snapshot as JSON
        #[arg(long)]
        json: bool,
    },

    /// Interactive terminal dashboard
    Dashboard {
        #[arg(env = "SHOPSYNTH_OUTPUT", default_value = DEFAULT_DATASET)]
        path: PathBuf,

        #[command(flatten)]
        generator: GeneratorArgs,
    },
}

#[derive(Args, Debug, Clone, Default)]
struct GeneratorArgs {
    /// JSON file with generator settings and reference tables
    #[arg(long, env = "SHOPSYNTH_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long, env = "SHOPSYNTH_ROWS")]
    rows: Option<usize>,

    /// First day of the window (YYYY-MM-DD), inclusive
    #[arg(long, env = "SHOPSYNTH_START")]
    start: Option<NaiveDate>,

    /// End of the window (YYYY-MM-DD), exclusive
    #[arg(long, env = "SHOPSYNTH_END")]
    end: Option<NaiveDate>,

    #[arg(long, env = "SHOPSYNTH_SEED")]
    seed: Option<u64>,

    #[arg(long)]
    discount_rate: Option<f64>,
}

impl GeneratorArgs {
    /// Defaults, then the JSON file, then flags/environment.
    fn resolve(&self) -> anyhow::Result<GeneratorConfig> {
        let mut cfg = match &self.config {
            Some(path) => GeneratorConfig::from_json_file(path)?,
            None => GeneratorConfig::default(),
        };
        if let Some(rows) = self.rows {
            cfg.rows = rows;
        }
        if let Some(start) = self.start {
            cfg.start = start;
        }
        if let Some(end) = self.end {
            cfg.end = end;
        }
        if self.seed.is_some() {
            cfg.seed = self.seed;
        }
        if let Some(rate) = self.discount_rate {
            cfg.discount_rate = rate;
        }
        Ok(cfg)
    }
}

#[derive(Args, Debug, Clone, Default)]
struct FilterArgs {
    /// Earliest order day, inclusive
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Latest order day, inclusive
    #[arg(long)]
    to: Option<NaiveDate>,

    #[arg(long = "category")]
    categories: Vec<String>,

    #[arg(long = "country")]
    countries: Vec<String>,

    #[arg(long = "status")]
    statuses: Vec<OrderStatus>,
}

impl From<FilterArgs> for OrderFilter {
    fn from(a: FilterArgs) -> Self {
        OrderFilter {
            from: a.from,
            to: a.to,
            categories: a.categories,
            countries: a.countries,
            statuses: a.statuses,
        }
    }
}

fn init_cli_logging(verbose: bool) {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Warn)
        .filter_module(
            "shopsynth",
            if verbose {
                log::LevelFilter::Debug
            } else {
                log::LevelFilter::Info
            },
        )
        .init();
}

/// The dashboard owns the terminal, so logs go to `logs/dashboard-<ts>.log`.
fn init_file_logging(verbose: bool) -> io::Result<PathBuf> {
    let ts = Local::now().format("%Y%m%d-%H%M%S").to_string();
    let log_dir = PathBuf::from("logs");
    std::fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join(format!("dashboard-{}.log", ts));
    let log_file = std::fs::File::create(&log_path)?;
    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter_level(log::LevelFilter::Warn)
        .filter_module(
            "shopsynth",
            if verbose {
                log::LevelFilter::Debug
            } else {
                log::LevelFilter::Info
            },
        )
        .init();
    Ok(log_path)
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate { output, generator } => {
            init_cli_logging(cli.verbose);
            let config = generator.resolve()?;
            let res = tokio::task::spawn_blocking(move || generate_to_file(&config, &output))
                .await??;
            println!(
                "wrote {} orders ({} customers, {} discounted, revenue {}) to {}",
                res.rows,
                res.customers,
                res.discounted,
                res.revenue,
                res.path.display()
            );
        }
        Commands::Validate { path, generator } => {
            init_cli_logging(cli.verbose);
            run_validate(&path, &generator.resolve()?)?;
        }
        Commands::Summary { path, filter, json } => {
            init_cli_logging(cli.verbose);
            let orders = read_orders(&path)?;
            let snapshot = DashboardSnapshot::compute(&orders, &filter.into());
            if json {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            } else {
                print!("{}", render_text(&snapshot));
            }
        }
        Commands::Dashboard { path, generator } => {
            let log_path = init_file_logging(cli.verbose)?;
            let config = generator.resolve()?;
            config.validate().context("invalid generator configuration")?;
            info!("dashboard starting on {}", path.display());
            run_dashboard(path, config, log_path).await?;
        }
    }
    Ok(())
}

fn run_validate(path: &Path, config: &GeneratorConfig) -> anyhow::Result<()> {
    let orders = read_orders(path)?;
    let report = validate(&orders, config);
    if report.is_ok() {
        println!("{}: {} rows, all invariants hold", path.display(), report.rows);
        return Ok(());
    }
    for v in &report.violations {
        match v.row {
            Some(row) => eprintln!("row {} ({}): {}", row + 1, v.order_id, v.kind),
            None => eprintln!("dataset: {}", v.kind),
        }
    }
    if report.total_violations > report.violations.len() {
        eprintln!(
            "... and {} more",
            report.total_violations - report.violations.len()
        );
    }
    bail!(
        "{} violations in {} rows of {}",
        report.total_violations,
        report.rows,
        path.display()
    )
}

async fn run_dashboard(
    path: PathBuf,
    config: GeneratorConfig,
    log_path: PathBuf,
) -> anyhow::Result<()> {
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<AppCommand>();
    let (evt_tx, evt_rx) = mpsc::unbounded_channel::<AppEvent>();

    tokio::spawn(DashboardService::new(path.clone(), config, evt_tx).run(cmd_rx));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(path, cmd_tx, evt_rx);
    app.loading = true;
    app.add_log(format!("日志文件: {}", log_path.display()));

    let rx = app.evt_rx.take().context("event receiver already taken")?;
    let res = run_app_loop(&mut terminal, &mut app, rx).await;
    let _ = app.cmd_tx.send(AppCommand::Quit);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res.context("dashboard loop failed")
}

async fn run_app_loop<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    mut evt_rx: mpsc::UnboundedReceiver<AppEvent>,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| draw(f, app))?;

        while let Ok(event) = evt_rx.try_recv() {
            app.handle_event(event);
        }

        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && app.handle_key_event(key.code) {
                    return Ok(());
                }
            }
        }
    }
}
