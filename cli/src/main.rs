mod commands;
mod config;
mod server;
mod woocommerce;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use catalogo_core::service::CatalogService;

use crate::commands::PDF_FILENAME;
use crate::config::Config;
use crate::woocommerce::WooClient;

#[derive(Parser)]
#[command(name = "catalogo", version)]
#[command(about = "Sync a WooCommerce store, curate prices, export a branded PDF catalog")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pull the product catalog from the configured store
    Sync {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the local catalog
    List {
        /// Filter by name substring
        #[arg(short, long)]
        search: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set or clear a product's catalog price override
    Price {
        /// Product id (the store's id, as shown by 'list')
        woo_id: i64,
        /// New price, or 'clear' to drop the override
        value: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Render selected products into a PDF catalog
    Export {
        /// Product id to include (repeatable)
        #[arg(long = "id", value_name = "WOO_ID")]
        ids: Vec<i64>,
        /// Include every active product
        #[arg(long, conflicts_with = "ids")]
        all: bool,
        /// Output file
        #[arg(short, long, default_value = PDF_FILENAME)]
        out: PathBuf,
        /// Date printed in the subtitle (defaults to today)
        #[arg(long, value_name = "YYYY-MM-DD")]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Company branding and store connection settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },
    /// Start the REST API server backing the browser UI
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
        /// Address to bind to
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
        /// Disable API key authentication
        #[arg(long)]
        no_auth: bool,
    },
}

#[derive(Subcommand)]
enum SettingsCommands {
    /// Show current settings (secrets redacted)
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Update settings; omitted flags keep their stored value
    Set {
        /// Company name printed in the catalog header
        #[arg(long)]
        company: Option<String>,
        /// Company logo URL
        #[arg(long)]
        logo_url: Option<String>,
        /// Contact phone for the catalog footer
        #[arg(long)]
        phone: Option<String>,
        /// Contact email for the catalog footer
        #[arg(long)]
        email: Option<String>,
        /// WooCommerce store base URL
        #[arg(long)]
        base_url: Option<String>,
        /// WooCommerce consumer key
        #[arg(long)]
        api_key: Option<String>,
        /// WooCommerce consumer secret
        #[arg(long)]
        api_secret: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load()?;
    let service = CatalogService::new(&config.db_path)?;

    match cli.command {
        Commands::Sync { json } => {
            let client = WooClient::new();
            commands::cmd_sync(&service, &client, json)
        }
        Commands::List { search, json } => commands::cmd_list(&service, search.as_deref(), json),
        Commands::Price {
            woo_id,
            value,
            json,
        } => commands::cmd_price(&service, woo_id, &value, json),
        Commands::Export {
            ids,
            all,
            out,
            date,
            json,
        } => commands::cmd_export(&service, &ids, all, &out, date.as_deref(), json),
        Commands::Settings { command } => match command {
            SettingsCommands::Show { json } => commands::cmd_settings_show(&service, json),
            SettingsCommands::Set {
                company,
                logo_url,
                phone,
                email,
                base_url,
                api_key,
                api_secret,
                json,
            } => {
                let update = commands::SettingsUpdate {
                    company,
                    logo_url,
                    phone,
                    email,
                    base_url,
                    api_key,
                    api_secret,
                };
                commands::cmd_settings_set(&service, &update, json)
            }
        },
        Commands::Serve {
            port,
            bind,
            no_auth,
        } => {
            let api_key = if no_auth {
                None
            } else {
                let (key, _new) = config.load_or_create_api_key()?;
                Some(key)
            };
            server::start_server(service, port, &bind, api_key).await
        }
    }
}
