use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use client_core::{
    datasets::{SourceMode, UrlMode, WikidataItem},
    grid::{truncate_cell, FilterItem, SortDirection, DEFAULT_CELL_MAX_CHARS},
    load_settings, CreateOutcome, DatasetClient, DatasetForm, DeleteOutcome, FilterModel,
    ListItem, LoadState, Notification, NotificationVariant, PaginatedListController,
};
use serde_json::json;
use shared::domain::{format_uuid_short, Dataset, DiscoveryRow, SearchMode};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "datasets-console", about = "Browse, discover and manage datasets")]
struct Cli {
    /// Overrides `api_base_url` from client.toml / APP__API_BASE_URL.
    #[arg(long, global = true)]
    api_url: Option<String>,
    #[arg(long, global = true)]
    token: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(subcommand)]
    Datasets(DatasetsCommand),
    /// Search dataset contents for a term.
    Discover {
        term: Option<String>,
        #[command(flatten)]
        paging: Paging,
    },
}

#[derive(Subcommand, Debug)]
enum DatasetsCommand {
    List {
        #[command(flatten)]
        paging: Paging,
        /// Free-text search tokens.
        #[arg(long, num_args = 1..)]
        search: Vec<String>,
        #[arg(long, requires_all = ["filter_op", "filter_value"])]
        filter_field: Option<String>,
        #[arg(long, requires = "filter_field")]
        filter_op: Option<String>,
        #[arg(long, requires = "filter_field")]
        filter_value: Option<String>,
    },
    Delete {
        id: String,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
    Create(CreateArgs),
}

#[derive(Args, Debug)]
struct Paging {
    #[arg(long, default_value_t = 0)]
    page: u32,
    #[arg(long)]
    limit: Option<u32>,
    #[arg(long)]
    sort: Option<String>,
    #[arg(long, requires = "sort")]
    desc: bool,
}

#[derive(Args, Debug)]
struct CreateArgs {
    #[arg(long)]
    name: String,
    #[arg(long, default_value = "")]
    description: String,
    #[arg(long, value_enum, default_value_t = SearchModeArg::Local)]
    search_mode: SearchModeArg,
    #[command(subcommand)]
    source: SourceArgs,
}

#[derive(Subcommand, Debug)]
enum SourceArgs {
    Existing {
        database: String,
    },
    Urls {
        #[arg(required = true)]
        urls: Vec<String>,
    },
    Wikidata {
        #[arg(value_enum)]
        item: WikidataItemArg,
        identifier: String,
    },
    Sparql {
        endpoint: String,
    },
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SearchModeArg {
    Local,
    Wikidata,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum WikidataItemArg {
    Entity,
    Property,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();
    let cli = Cli::parse();

    let mut settings = load_settings();
    if let Some(url) = cli.api_url {
        settings.api_base_url = url;
    }
    if let Some(token) = cli.token {
        settings.api_token = Some(token);
    }
    tracing::debug!(api = %settings.api_base_url, style = ?settings.query_style, "loaded settings");
    let client = DatasetClient::from_settings(&settings).context("invalid client settings")?;
    let mut notifications = client.subscribe_notifications();
    let default_limit = settings.default_page_size;

    let result = match cli.command {
        Command::Datasets(DatasetsCommand::List {
            paging,
            search,
            filter_field,
            filter_op,
            filter_value,
        }) => {
            let mut list = client.datasets().with_page_size(default_limit);
            let mut model = FilterModel::default();
            if !search.is_empty() {
                model.quick_filter_values = Some(search);
            }
            if let (Some(field), Some(op), Some(value)) = (filter_field, filter_op, filter_value) {
                model.items.push(FilterItem::new(field, op, json!(value)));
            }
            let _ = list.set_filter_model(&model);
            load_page(&mut list, &paging).await;
            print_datasets(&list)
        }
        Command::Datasets(DatasetsCommand::Delete { id, yes }) => {
            delete_dataset(&client, &id, yes).await
        }
        Command::Datasets(DatasetsCommand::Create(args)) => create_dataset(&client, args).await,
        Command::Discover { term, paging } => {
            let mut list = client.discoveries().with_page_size(default_limit);
            if let Some(term) = term {
                let _ = list.set_filter_model(&FilterModel::with_item(FilterItem::new(
                    "terms",
                    "contains",
                    json!(term),
                )));
            }
            load_page(&mut list, &paging).await;
            print_discoveries(&list)
        }
    };

    drain_notifications(&mut notifications);
    result
}

async fn load_page<T: ListItem>(list: &mut PaginatedListController<T>, paging: &Paging) {
    if let Some(limit) = paging.limit {
        let _ = list.set_limit(limit);
    }
    if let Some(field) = &paging.sort {
        let direction = if paging.desc {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        };
        let _ = list.set_sort(field.clone(), direction);
    }
    let ticket = list.set_page(paging.page);
    list.fetch(ticket).await;
}

fn ensure_loaded(state: &LoadState) -> Result<()> {
    match state {
        LoadState::Failed(message) => bail!("failed to load rows: {message}"),
        _ => Ok(()),
    }
}

fn print_page_footer<T: ListItem>(list: &PaginatedListController<T>) {
    println!(
        "-- page {} ({} per page), {} total",
        list.page(),
        list.limit(),
        list.total_count()
    );
}

fn cell(value: &str) -> String {
    match truncate_cell(value, DEFAULT_CELL_MAX_CHARS) {
        (text, true) => format!("{text}..."),
        (text, false) => text.to_string(),
    }
}

fn print_datasets(list: &PaginatedListController<Dataset>) -> Result<()> {
    ensure_loaded(list.load_state())?;
    for dataset in list.rows() {
        let id = dataset.id.to_string();
        println!(
            "{}\t{}\t{}\t{}",
            format_uuid_short(&id),
            dataset.name,
            dataset.database.as_deref().unwrap_or("-"),
            cell(dataset.description.as_deref().unwrap_or_default())
        );
    }
    print_page_footer(list);
    Ok(())
}

fn print_discoveries(list: &PaginatedListController<DiscoveryRow>) -> Result<()> {
    ensure_loaded(list.load_state())?;
    for row in list.rows() {
        let id = row.id.to_string();
        println!(
            "{}\t{}\t{}",
            format_uuid_short(&id),
            row.name,
            cell(&row.terms_summary())
        );
    }
    print_page_footer(list);
    Ok(())
}

async fn confirm(prompt: &str) -> Result<bool> {
    println!("{prompt} [y/N]");
    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .context("failed to read confirmation")?;
    Ok(matches!(line.trim(), "y" | "Y" | "yes"))
}

async fn delete_dataset(client: &DatasetClient, id: &str, yes: bool) -> Result<()> {
    let mut list = client.raw_list(client_core::datasets::DATASETS_ENDPOINT);
    list.request_delete(json!({ "id": id }))?;

    if !yes && !confirm(&format!("Do you really want to delete dataset {id}?")).await? {
        list.cancel_delete();
        println!("cancelled");
        return Ok(());
    }

    match list.confirm_delete().await {
        DeleteOutcome::Deleted => {
            println!("deleted {id}");
            Ok(())
        }
        DeleteOutcome::Failed(message) => bail!("delete failed: {message}"),
        DeleteOutcome::NothingPending => Ok(()),
    }
}

async fn create_dataset(client: &DatasetClient, args: CreateArgs) -> Result<()> {
    let mut form = DatasetForm {
        name: args.name,
        description: args.description,
        search_mode: match args.search_mode {
            SearchModeArg::Local => SearchMode::Local,
            SearchModeArg::Wikidata => SearchMode::Wikidata,
        },
        ..DatasetForm::default()
    };
    match args.source {
        SourceArgs::Existing { database } => {
            form.mode = SourceMode::Existing;
            form.database = database;
        }
        SourceArgs::Urls { urls } => {
            form.mode = SourceMode::Urls;
            form.source = urls.join("\n");
        }
        SourceArgs::Wikidata { item, identifier } => {
            form.mode = SourceMode::Urls;
            form.url_mode = UrlMode::Wikidata;
            form.source = identifier;
            form.wikidata_item = Some(match item {
                WikidataItemArg::Entity => WikidataItem::Entity,
                WikidataItemArg::Property => WikidataItem::Property,
            });
        }
        SourceArgs::Sparql { endpoint } => {
            form.mode = SourceMode::Sparql;
            form.sparql = endpoint;
        }
        SourceArgs::Upload { files } => {
            form.mode = SourceMode::Upload;
            form.files = files;
        }
    }

    match client.creator().submit(&form).await {
        CreateOutcome::Created => Ok(()),
        CreateOutcome::Failed(message) => bail!(message),
    }
}

fn drain_notifications(rx: &mut broadcast::Receiver<Notification>) {
    while let Ok(notification) = rx.try_recv() {
        let tag = match notification.variant {
            NotificationVariant::Success => "ok",
            NotificationVariant::Warning => "warning",
            NotificationVariant::Error => "error",
        };
        eprintln!("[{tag}] {}", notification.message);
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn partial_field_filter_is_rejected() {
        let partial: [&[&str]; 3] = [
            &["datasets-console", "datasets", "list", "--filter-value", "cats"],
            &["datasets-console", "datasets", "list", "--filter-op", "contains"],
            &["datasets-console", "datasets", "list", "--filter-field", "name", "--filter-op", "contains"],
        ];
        for args in partial {
            assert!(Cli::try_parse_from(args).is_err(), "{args:?}");
        }
    }

    #[test]
    fn complete_field_filter_is_parsed() {
        let cli = Cli::try_parse_from([
            "datasets-console",
            "datasets",
            "list",
            "--filter-field",
            "name",
            "--filter-op",
            "contains",
            "--filter-value",
            "cats",
        ])
        .expect("parse");
        match cli.command {
            Command::Datasets(DatasetsCommand::List {
                filter_field,
                filter_op,
                filter_value,
                ..
            }) => {
                assert_eq!(filter_field.as_deref(), Some("name"));
                assert_eq!(filter_op.as_deref(), Some("contains"));
                assert_eq!(filter_value.as_deref(), Some("cats"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
