mod config;
mod plan_cmds;
mod serve_cmd;

use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use quickchef_core::model::MealSlot;
use quickchef_core::{GeminiGenerator, PlanCoordinator};

use config::QuickchefConfig;
use plan_cmds::{MealTarget, PlanArgs};

#[derive(Parser)]
#[command(
    name = "quickchef",
    about = "Meal plans, grocery lists and cooking schedules from your pantry"
)]
struct Cli {
    /// Gemini API key (overrides QUICKCHEF_API_KEY env var)
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Gemini model name (overrides QUICKCHEF_MODEL env var)
    #[arg(long, global = true)]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a quickchef config file (takes --api-key and --model)
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Generate a meal plan from a request TOML file
    Plan {
        /// Path to the request TOML file
        request: PathBuf,
        /// Write the plan JSON here (defaults to stdout)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Also write the schedule as an iCalendar file
        #[arg(long)]
        ics: Option<PathBuf>,
        /// Calendar anchor date, YYYY-MM-DD (defaults to today)
        #[arg(long)]
        start_date: Option<NaiveDate>,
    },
    /// Replace one meal in a plan file with a different recipe
    Replace {
        /// Path to the plan JSON file
        plan: PathBuf,
        /// Request TOML the plan was generated from
        #[arg(long)]
        request: PathBuf,
        /// Day number, starting at 1
        #[arg(long)]
        day: u32,
        /// Meal slot: breakfast, lunch or dinner
        #[arg(long)]
        slot: MealSlot,
        /// What the new meal should be like
        #[arg(long, default_value = "")]
        criteria: String,
        /// Write the updated plan here (defaults to stdout)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Regenerate one meal in a plan file with ingredient swaps
    Swap {
        /// Path to the plan JSON file
        plan: PathBuf,
        /// Request TOML the plan was generated from
        #[arg(long)]
        request: PathBuf,
        /// Day number, starting at 1
        #[arg(long)]
        day: u32,
        /// Meal slot: breakfast, lunch or dinner
        #[arg(long)]
        slot: MealSlot,
        /// Swap as `ingredient=replacement`, or just `ingredient` to let the
        /// model pick (repeatable)
        #[arg(long = "swap", required = true)]
        swaps: Vec<String>,
        /// Write the updated plan here (defaults to stdout)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Move a schedule task to another day and time
    Reschedule {
        /// Path to the plan JSON file
        plan: PathBuf,
        /// Task ID to move
        #[arg(long)]
        task: String,
        /// Day number, starting at 1
        #[arg(long)]
        day: u32,
        /// New time block (e.g. "Day 2 @ 19:00")
        #[arg(long)]
        time: String,
        /// Write the updated plan here (defaults to stdout)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Export a plan's schedule as iCalendar
    Export {
        /// Path to the plan JSON file
        plan: PathBuf,
        /// Output file path (defaults to stdout)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Calendar anchor date, YYYY-MM-DD (defaults to today)
        #[arg(long)]
        start_date: Option<NaiveDate>,
    },
    /// Run the HTTP API
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
        /// Port to listen on
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
}

/// Execute the `quickchef init` command: write config file.
fn cmd_init(api_key: Option<&str>, model: Option<&str>, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let cfg = config::ConfigFile {
        gemini: config::GeminiSection {
            api_key: api_key.map(str::to_string),
            model: model.map(str::to_string),
        },
        planner: Default::default(),
    };

    let path = config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    match api_key {
        Some(key) if key.len() > 8 => {
            let prefix: String = key.chars().take(4).collect();
            println!("  gemini.api_key = {prefix}...");
        }
        Some(_) => println!("  gemini.api_key = (set)"),
        None => {
            println!("  gemini.api_key = (not set)");
            println!();
            println!("Set {} or re-run with --api-key.", config::API_KEY_ENV);
        }
    }
    println!(
        "  gemini.model = {}",
        model.unwrap_or(quickchef_core::generator::gemini::DEFAULT_MODEL)
    );

    Ok(())
}

fn build_coordinator(
    cli_api_key: Option<&str>,
    cli_model: Option<&str>,
) -> anyhow::Result<PlanCoordinator> {
    let resolved = QuickchefConfig::resolve(cli_api_key, cli_model)?;
    tracing::debug!(model = %resolved.model, "using Gemini generator");
    let generator = GeminiGenerator::new(resolved.api_key, resolved.model);
    Ok(PlanCoordinator::with_config(Arc::new(generator), resolved.planner))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let api_key = cli.api_key.as_deref();
    let model = cli.model.as_deref();

    match cli.command {
        Commands::Init { force } => {
            cmd_init(api_key, model, force)?;
        }
        Commands::Plan {
            request,
            output,
            ics,
            start_date,
        } => {
            let coordinator = build_coordinator(api_key, model)?;
            let args = PlanArgs {
                request,
                output,
                ics,
                start_date,
            };
            plan_cmds::run_plan(&coordinator, &args).await?;
        }
        Commands::Replace {
            plan,
            request,
            day,
            slot,
            criteria,
            output,
        } => {
            let coordinator = build_coordinator(api_key, model)?;
            let target = MealTarget {
                plan,
                request,
                day,
                slot,
                output,
            };
            plan_cmds::run_replace(&coordinator, &target, &criteria).await?;
        }
        Commands::Swap {
            plan,
            request,
            day,
            slot,
            swaps,
            output,
        } => {
            let coordinator = build_coordinator(api_key, model)?;
            let target = MealTarget {
                plan,
                request,
                day,
                slot,
                output,
            };
            plan_cmds::run_swap(&coordinator, &target, &swaps).await?;
        }
        Commands::Reschedule {
            plan,
            task,
            day,
            time,
            output,
        } => {
            plan_cmds::run_reschedule(&plan, &task, day, &time, output.as_deref())?;
        }
        Commands::Export {
            plan,
            output,
            start_date,
        } => {
            plan_cmds::run_export(&plan, output.as_deref(), start_date)?;
        }
        Commands::Serve { bind, port } => {
            let coordinator = build_coordinator(api_key, model)?;
            serve_cmd::run_serve(coordinator, &bind, port).await?;
        }
    }

    Ok(())
}
