use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use serde::Serialize;
use tracing::{error, info};

use stockflow::{
    common::RequestContext,
    config,
    db::{self, DbPool, UnitOfWork},
    events::{self, EventSender},
    services::{
        factory::{ServiceContainer, ServiceFactory},
        numbering::NumberScope,
    },
};

#[derive(Parser)]
#[command(name = "stockflow", about = "Operate the stockflow inventory engine", version)]
struct Cli {
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON"
    )]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending schema migrations
    Migrate,
    /// Allocate and consume the next document number
    NextNumber {
        #[arg(long)]
        team: i32,
        #[arg(long, value_parser = parse_scope)]
        scope: NumberScope,
    },
    /// Show the next document number without consuming it
    PreviewNumber {
        #[arg(long)]
        team: i32,
        #[arg(long, value_parser = parse_scope)]
        scope: NumberScope,
    },
    /// Print a transfer order with its line items and deferred orders
    ShowTransfer {
        #[arg(long)]
        team: i32,
        #[arg(long)]
        id: i32,
    },
}

fn parse_scope(value: &str) -> Result<NumberScope, String> {
    value
        .parse::<NumberScope>()
        .map_err(|_| format!("unknown scope '{}', expected goods, stock_transfer, stock_out or stock_in", value))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config().context("failed to load configuration")?;
    config::init_tracing(&cfg.log_level, cfg.log_json);

    let db_pool = db::establish_connection_from_app_config(&cfg)
        .await
        .context("failed to connect to the database")?;

    if matches!(cli.command, Commands::Migrate) {
        db::run_migrations(&db_pool).await.map_err(|e| {
            error!("Failed running migrations: {}", e);
            e
        })?;
        println!("Migrations applied");
        return Ok(());
    }
    if cfg.auto_migrate {
        db::run_migrations(&db_pool).await?;
    }

    let db_pool: Arc<DbPool> = Arc::new(db_pool);
    let (event_sender, event_rx) = EventSender::channel(cfg.event_channel_capacity);
    let processor = tokio::spawn(events::process_events(event_rx));
    let factory = ServiceFactory::new(db_pool.clone(), event_sender, cfg.inventory.clone());

    let services = ServiceContainer::new(&factory);

    let outcome = run(&cli, &cfg, factory.db_pool(), &services).await;

    // Closing the last sender lets the processor drain and exit.
    drop(services);
    drop(factory);
    if let Err(e) = processor.await {
        error!("Event processor failed: {}", e);
    }
    outcome
}

async fn run(
    cli: &Cli,
    cfg: &config::AppConfig,
    db_pool: &DbPool,
    services: &ServiceContainer,
) -> Result<()> {
    match &cli.command {
        Commands::Migrate => Ok(()),
        Commands::NextNumber { team, scope } => {
            let uow = UnitOfWork::begin(db_pool, cfg.inventory.lock_timeout()).await?;
            let result = services.numbering.next_number(uow.conn(), *team, *scope).await;
            let number = uow.finish(result).await?;
            info!(team_id = *team, scope = %scope, %number, "Number allocated from CLI");
            print_output(cli.json, &number, |n| n.to_string())
        }
        Commands::PreviewNumber { team, scope } => {
            let number = services
                .numbering
                .preview_number(*team, *scope)
                .await?;
            print_output(cli.json, &number, |n| n.to_string())
        }
        Commands::ShowTransfer { team, id } => {
            let ctx = RequestContext::new(*team, 0);
            let detail = services
                .transfers
                .get_transfer(&ctx, *id)
                .await
                .with_context(|| format!("failed to load transfer {}", id))?;
            print_output(cli.json, &detail, |d| {
                let mut out = format!(
                    "{} {} -> {} total {}{}",
                    d.order.number,
                    d.order.out_warehouse_id,
                    d.order.in_warehouse_id,
                    d.order.total_quantity,
                    if d.order.is_void { " (void)" } else { "" }
                );
                for line in &d.goods {
                    out.push_str(&format!("\n  goods {} x {}", line.goods_id, line.stock_transfer_quantity));
                }
                out
            })
        }
    }
}

fn print_output<T, F>(json: bool, value: &T, plain: F) -> Result<()>
where
    T: Serialize,
    F: FnOnce(&T) -> String,
{
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", plain(value));
    }
    Ok(())
}
