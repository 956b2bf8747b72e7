//! `console-list`: fetch one page of a console resource table and print it
//! as JSON.
//!
//! | Env Var           | Default | Meaning                                         |
//! |-------------------|---------|-------------------------------------------------|
//! | `CONSOLE_RESOURCE`| `users` | users, organizations, roles, permissions, clients |
//! | `CONSOLE_PAGE`    | `1`     | Page to fetch                                   |
//! | `CONSOLE_SEARCH`  | empty   | Search term sent to the server                  |
//! | `CONSOLE_SORT`    | unset   | `field` or `field:desc`, applied locally        |
//!
//! API location and credentials come from [`ClientConfig::from_env`].

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use console_client::api::{ApiError, ConsoleApi};
use console_client::config::{ClientConfig, ConfigError};
use console_client::controller::{ControllerOptions, ListController, LoadOutcome};
use console_core::error::CoreError;
use console_core::listing::clients::Clients;
use console_core::listing::organizations::Organizations;
use console_core::listing::permissions::Permissions;
use console_core::listing::roles::Roles;
use console_core::listing::users::Users;
use console_core::listing::{ListFilters, ManagedResource, SortOrder, SortUpdate};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("Failed to encode output: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("CONSOLE_PAGE must be a positive integer, got '{0}'")]
    Page(String),
    #[error("{0}")]
    Load(String),
}

struct ListArgs {
    page: u32,
    search: String,
    sort: Option<String>,
}

impl ListArgs {
    fn from_env() -> Result<Self, CliError> {
        let page = match std::env::var("CONSOLE_PAGE") {
            Ok(raw) => raw.trim().parse().map_err(|_| CliError::Page(raw))?,
            Err(_) => 1,
        };
        Ok(Self {
            page,
            search: std::env::var("CONSOLE_SEARCH").unwrap_or_default(),
            sort: std::env::var("CONSOLE_SORT").ok().filter(|s| !s.trim().is_empty()),
        })
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "console_client=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(err) = run().await {
        tracing::error!(error = %err, "console-list failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    let config = ClientConfig::from_env()?;
    tracing::info!(api_url = %config.api_url, "Loaded client configuration");

    let api = Arc::new(ConsoleApi::new(&config)?);
    let options = ControllerOptions::from(&config);
    let args = ListArgs::from_env()?;

    let resource = std::env::var("CONSOLE_RESOURCE").unwrap_or_else(|_| "users".into());
    match resource.as_str() {
        "users" => list::<Users>(api, options, &args).await,
        "organizations" => list::<Organizations>(api, options, &args).await,
        "roles" => list::<Roles>(api, options, &args).await,
        "permissions" => list::<Permissions>(api, options, &args).await,
        "clients" => list::<Clients>(api, options, &args).await,
        other => Err(CoreError::UnknownValue {
            kind: "resource",
            value: other.to_string(),
        }
        .into()),
    }
}

async fn list<R: ManagedResource>(
    api: Arc<ConsoleApi>,
    options: ControllerOptions,
    args: &ListArgs,
) -> Result<(), CliError> {
    let controller = ListController::<R>::new(api, options);

    if let Some(sort) = &args.sort {
        controller.update_sorting(parse_sort::<R>(sort)?);
    }

    let mut filters = R::Filters::default();
    filters.set_search(&args.search);

    if controller.load(args.page, filters).await == LoadOutcome::Failed {
        return Err(CliError::Load(controller.error().unwrap_or_default()));
    }
    if let Err(err) = controller.refresh_stats().await {
        tracing::warn!(error = %err, "Continuing without statistics");
    }

    let snapshot = controller.snapshot();
    let output = serde_json::json!({
        "resource": R::NAME,
        "items": snapshot.items,
        "pagination": snapshot.pagination,
        "stats": snapshot.stats,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn parse_sort<R: ManagedResource>(raw: &str) -> Result<SortUpdate<R::SortField>, CoreError> {
    let (field, order) = match raw.split_once(':') {
        Some((field, order)) => (field, order.parse::<SortOrder>()?),
        None => (raw, SortOrder::Asc),
    };
    Ok(SortUpdate::explicit(field.trim().parse()?, order))
}
