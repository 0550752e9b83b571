use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Parser, Subcommand};
use log::{debug, error, info};
use serde::Serialize;

mod annotations;
mod archive;
mod collection;
mod config;
mod derivatives;
mod iiif;
mod manifest;
mod options;
mod resolver;
mod search;
mod vtt;

use archive::{ArchiveClient, ArchiveError, MetadataGateway, Result};
use config::{AppSettings, Config};
use manifest::BuildOutcome;
use options::BuildOptions;
use resolver::ItemRef;

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Blue.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Yellow.on_default())
    .error(AnsiColor::Red.on_default().effects(Effects::BOLD))
    .valid(AnsiColor::Green.on_default())
    .invalid(AnsiColor::Red.on_default());

/// Generates IIIF Presentation API documents (manifests, collections, annotations and search results) for Internet Archive items.
#[derive(Parser)]
#[command(name = "iiify")]
#[command(version, about)]
#[command(disable_help_subcommand = true)]
#[command(styles = STYLES)]
#[command(override_usage = "iiify [OPTIONS] <COMMAND> [ARGS]...")]
struct Cli {
    /// Base URL the produced documents are published under, e.g. https://example.org/iiif/.
    #[arg(long, global = true)]
    domain: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Shows the application configuration as JSON.
    ShowConfig,

    /// Prints the Presentation 3.0 manifest of an item.
    ///
    /// Collections print their first collection page instead.
    Manifest {
        /// The item identifier, optionally with a leaf, e.g. goody$3.
        identifier: String,
    },

    /// Prints the Presentation 2.1 manifest of an item.
    Manifest2 {
        /// The item identifier, optionally with a leaf.
        identifier: String,
    },

    /// Prints one page of a collection.
    Collection {
        /// The collection identifier.
        identifier: String,

        /// The page number to retrieve (1-indexed).
        #[arg(long, default_value_t = 1)]
        page: u32,

        /// The number of children per page, at most 1000.
        #[arg(long, default_value_t = collection::MAX_ROWS)]
        rows: u32,
    },

    /// Prints the OCR word annotations of one page.
    Annotations {
        /// The item identifier.
        identifier: String,

        /// The DjVu XML file of the item, e.g. journalofexpedit00ford_djvu.xml.
        file: String,

        /// The page number (1-indexed).
        page: u32,

        /// Presentation API version used in the page id.
        #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u8).range(2..=3))]
        api_version: u8,
    },

    /// Prints the reviews of an item as commenting annotations.
    Comments {
        /// The item identifier.
        identifier: String,
    },

    /// Searches the text of an item and prints the hits as an annotation list.
    Search {
        /// The item identifier.
        identifier: String,

        /// The text to search for.
        query: String,
    },

    /// Prints the subtitles of a restricted video as one WebVTT document.
    Vtt {
        /// The item identifier.
        identifier: String,
    },

    /// Prints the image server URL of an item's image.
    Resolve {
        /// The item identifier, with a leaf for pages of a text.
        identifier: String,

        /// Image API version.
        #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u8).range(2..=3))]
        api_version: u8,

        /// An image request such as full/max/0/default.jpg; info.json when omitted.
        #[arg(long)]
        request: Option<String>,
    },
}

fn to_json<T: Serialize>(document: &T) -> Result<String> {
    serde_json::to_string_pretty(document).map_err(|e| {
        ArchiveError::MalformedSource(format!("Failed to serialize document: {}", e))
    })
}

fn bare_identifier(raw: &str) -> Result<String> {
    Ok(ItemRef::parse(raw)?.identifier)
}

/// Run one document command and return what it prints.
fn run(
    command: Commands,
    settings: &AppSettings,
    gateway: &dyn MetadataGateway,
    options: &BuildOptions,
) -> Result<String> {
    match command {
        Commands::ShowConfig => to_json(settings),
        Commands::Manifest { identifier } => {
            let item_ref = ItemRef::parse(&identifier)?;
            match manifest::build_manifest(gateway, &item_ref, options)? {
                BuildOutcome::Manifest(manifest) => to_json(&manifest),
                BuildOutcome::IsCollection => {
                    info!("{} is a collection, printing its first page", item_ref.identifier);
                    to_json(&collection::build_collection(
                        gateway,
                        &item_ref.identifier,
                        1,
                        collection::MAX_ROWS,
                        options,
                    )?)
                }
            }
        }
        Commands::Manifest2 { identifier } => {
            let item_ref = ItemRef::parse(&identifier)?;
            to_json(&manifest::v2::build_manifest_v2(gateway, &item_ref, options)?)
        }
        Commands::Collection {
            identifier,
            page,
            rows,
        } => {
            let identifier = bare_identifier(&identifier)?;
            to_json(&collection::build_collection(
                gateway, &identifier, page, rows, options,
            )?)
        }
        Commands::Annotations {
            identifier,
            file,
            page,
            api_version,
        } => {
            let identifier = bare_identifier(&identifier)?;
            to_json(&annotations::build_ocr_page(
                gateway,
                &identifier,
                &file,
                page,
                api_version,
                options,
            )?)
        }
        Commands::Comments { identifier } => {
            let identifier = bare_identifier(&identifier)?;
            to_json(&annotations::build_comments_page(
                gateway,
                &identifier,
                options,
            )?)
        }
        Commands::Search { identifier, query } => {
            let identifier = bare_identifier(&identifier)?;
            to_json(&search::build_search(gateway, &identifier, &query, options)?)
        }
        Commands::Vtt { identifier } => {
            let identifier = bare_identifier(&identifier)?;
            vtt::build_vtt(gateway, &identifier)
        }
        Commands::Resolve {
            identifier,
            api_version,
            request,
        } => {
            let item_ref = ItemRef::parse(&identifier)?;
            let item = gateway.item(&item_ref.identifier)?;
            let path = resolver::resolve_required(&item, &item_ref)?;
            Ok(resolver::image_request_url(
                &options.image_server,
                api_version,
                &path,
                request.as_deref(),
            ))
        }
    }
}

fn main() {
    // Initialize configuration from environment variables
    let config = Config::from_env();

    // Initialize logger with the configured log level
    env_logger::Builder::new()
        .filter_level(config.log_level)
        .init();

    debug!(
        "Configuration loaded: log_level={:?}, user_agent={}",
        config.log_level, config.user_agent
    );

    let cli = Cli::parse();

    let settings_path = config.settings_file_path();
    let settings = match AppSettings::load_or_create_default(&settings_path) {
        Ok(settings) => settings,
        Err(e) => {
            error!(
                "Failed to load or create settings file '{}': {}",
                settings_path.display(),
                e
            );
            std::process::exit(1);
        }
    };
    info!("Settings loaded from {}", settings_path.display());

    let client = match ArchiveClient::new(settings.archive.clone(), &config.user_agent) {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to create archive client: {}", e);
            std::process::exit(1);
        }
    };
    let options = BuildOptions::from_settings(&settings, cli.domain.as_deref());
    debug!("Publishing documents under {}", options.domain);

    match run(cli.command, &settings, &client, &options) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            error!("{}", e);
            std::process::exit(e.exit_code());
        }
    }
}
