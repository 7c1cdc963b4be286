//! Command-line interface for search-porter
//!
//! This module handles:
//! - Command-line argument parsing using clap
//! - Configuration loading and CLI overrides
//! - Connection descriptor construction
//! - Subcommand dispatch and exit status

use chrono::{DateTime, Local};
use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::{Config, LogLevel};
use crate::connection::{ConnectionDescriptor, mask_key};
use crate::error::{AuthError, ConfigError, PorterError, Result};
use crate::executor::{ExportRequest, ImportReport, ImportRequest, export_to_file, import_from_file};
use crate::formatter::SummaryFormatter;
use crate::search::{ExportQuery, IndexAction, SearchClient};

pub mod completion;

/// Exit status when every document was transferred
pub const EXIT_SUCCESS: i32 = 0;

/// Exit status for a fatal error
pub const EXIT_FAILURE: i32 = 1;

/// Exit status when an import finished but some documents failed
pub const EXIT_PARTIAL: i32 = 2;

/// Exit status after Ctrl+C
pub const EXIT_INTERRUPTED: i32 = 130;

/// Search Porter - move documents between JSON files and search indexes
#[derive(Parser, Debug)]
#[command(
    name = "search-porter",
    version,
    about = "Export and import Azure AI Search documents as JSON",
    long_about = "Export the documents of an Azure AI Search index to a JSON array file,
or import such a file into an index in batches."
)]
pub struct CliArgs {
    /// Configuration file path
    #[arg(short = 'c', long = "config", value_name = "FILE", global = true)]
    pub config_file: Option<PathBuf>,

    /// Quiet mode (errors only, no progress bar)
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,

    /// Verbose mode (detailed logging)
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Very verbose mode (trace logging)
    #[arg(long = "vv", global = true)]
    pub very_verbose: bool,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECONDS", global = true)]
    pub timeout: Option<u64>,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands for search-porter
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export index documents to a JSON file
    Export(ExportArgs),

    /// Import documents from a JSON file into an index
    Import(ImportArgs),

    /// Generate shell completion script
    Completion {
        /// Shell type
        #[arg(value_name = "SHELL", value_enum)]
        shell: Shell,
    },

    /// Show configuration
    Config {
        /// Show effective configuration
        #[arg(long)]
        show: bool,

        /// Validate configuration file
        #[arg(long)]
        validate: bool,
    },
}

/// Flags identifying the target index
#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// Search service name, e.g. `contoso` for contoso.search.windows.net
    #[arg(long, value_name = "NAME", conflicts_with = "endpoint")]
    pub service: Option<String>,

    /// Full service endpoint URL
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Index name
    #[arg(long, value_name = "NAME")]
    pub index: String,

    /// Admin API key
    #[arg(
        long,
        value_name = "KEY",
        env = "SEARCH_PORTER_API_KEY",
        hide_env_values = true
    )]
    pub key: Option<String>,
}

/// Flags of the `export` subcommand
#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Output JSON file (default: <index>-<timestamp>.json)
    #[arg(short = 'o', long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Fields to include (space or comma separated)
    #[arg(long, value_name = "FIELD", num_args = 1..)]
    pub select: Vec<String>,

    /// OData filter expression
    #[arg(long, value_name = "EXPR")]
    pub filter: Option<String>,

    /// Maximum number of documents to export
    #[arg(long, value_name = "N")]
    pub top: Option<usize>,

    /// OData order-by expression, keeps paging stable
    #[arg(long = "order-by", value_name = "EXPR")]
    pub order_by: Option<String>,

    /// Documents per search request (max 1000)
    #[arg(long, value_name = "N")]
    pub page_size: Option<usize>,

    /// Write JSON without indentation
    #[arg(long)]
    pub compact: bool,

    /// Hide progress bar
    #[arg(long)]
    pub no_progress: bool,
}

/// Flags of the `import` subcommand
#[derive(Args, Debug, Clone)]
pub struct ImportArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Input JSON file
    #[arg(short = 'i', long, value_name = "FILE")]
    pub input: PathBuf,

    /// Batch size for uploads (default: 1000)
    #[arg(long, value_name = "N")]
    pub batch_size: Option<usize>,

    /// Merge with existing documents instead of replacing; missing documents fail
    #[arg(long, conflicts_with = "merge_or_upload")]
    pub merge: bool,

    /// Merge with existing documents, creating the ones that do not exist
    #[arg(long)]
    pub merge_or_upload: bool,

    /// Hide progress bar
    #[arg(long)]
    pub no_progress: bool,
}

impl ImportArgs {
    /// Write mode selected by the flags
    pub fn action(&self) -> IndexAction {
        if self.merge {
            IndexAction::Merge
        } else if self.merge_or_upload {
            IndexAction::MergeOrUpload
        } else {
            IndexAction::Upload
        }
    }
}

/// CLI interface handler
pub struct CliInterface {
    /// Parsed command-line arguments
    args: CliArgs,

    /// Loaded configuration
    config: Config,
}

impl CliInterface {
    /// Create a new CLI interface
    ///
    /// # Returns
    /// * `Result<Self>` - New CLI interface or error
    pub fn new() -> Result<Self> {
        Self::from_args(CliArgs::parse())
    }

    /// Create a CLI interface from already parsed arguments
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let config = Self::load_config(&args)?;
        Ok(Self { args, config })
    }

    /// Load configuration from file and merge with arguments
    ///
    /// # Arguments
    /// * `args` - Command-line arguments
    ///
    /// # Returns
    /// * `Result<Config>` - Loaded configuration or error
    fn load_config(args: &CliArgs) -> Result<Config> {
        // `config --validate` reports problems itself
        let config_command = matches!(args.command, Commands::Config { .. });

        let mut config = match Config::load_from_file(args.config_file.as_deref()) {
            Ok(config) => config,
            Err(_) if config_command => Config::default(),
            Err(e) => return Err(e),
        };
        Self::apply_args_to_config(&mut config, args);

        if !config_command {
            config.validate()?;
        }

        Ok(config)
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Apply CLI arguments to configuration
    ///
    /// Overrides configuration values with CLI arguments where provided
    fn apply_args_to_config(config: &mut Config, args: &CliArgs) {
        Self::apply_logging_args(config, args);

        if let Some(timeout) = args.timeout {
            config.connection.timeout = timeout;
        }
        if args.quiet {
            config.transfer.show_progress = false;
        }

        match &args.command {
            Commands::Export(export) => {
                Self::apply_connection_args(config, &export.connection);
                if let Some(page_size) = export.page_size {
                    config.transfer.page_size = page_size;
                }
                if export.compact {
                    config.transfer.pretty = false;
                }
                if export.no_progress {
                    config.transfer.show_progress = false;
                }
            }
            Commands::Import(import) => {
                Self::apply_connection_args(config, &import.connection);
                if let Some(batch_size) = import.batch_size {
                    config.transfer.batch_size = batch_size;
                }
                if import.no_progress {
                    config.transfer.show_progress = false;
                }
            }
            Commands::Completion { .. } | Commands::Config { .. } => {}
        }
    }

    /// Apply logging-related CLI arguments to configuration
    fn apply_logging_args(config: &mut Config, args: &CliArgs) {
        config.logging.level = if args.very_verbose {
            LogLevel::Trace
        } else if args.verbose {
            LogLevel::Debug
        } else if args.quiet {
            LogLevel::Error
        } else {
            config.logging.level
        };
    }

    /// Apply connection-related CLI arguments to configuration
    ///
    /// An explicit `--service` or `--endpoint` replaces both configured values.
    fn apply_connection_args(config: &mut Config, conn: &ConnectionArgs) {
        if conn.service.is_some() || conn.endpoint.is_some() {
            config.connection.service = conn.service.clone();
            config.connection.endpoint = conn.endpoint.clone();
        }
        if let Some(key) = &conn.key {
            config.connection.api_key = Some(key.clone());
        }
    }

    /// Connection flags of the current subcommand
    fn connection_args(&self) -> Option<&ConnectionArgs> {
        match &self.args.command {
            Commands::Export(export) => Some(&export.connection),
            Commands::Import(import) => Some(&import.connection),
            _ => None,
        }
    }

    /// Build the connection descriptor for the current subcommand
    ///
    /// Endpoint priority: `--endpoint`, `--service`, configured endpoint,
    /// configured service. The key comes from `--key`, the
    /// `SEARCH_PORTER_API_KEY` environment variable or the config file.
    ///
    /// # Returns
    /// * `Result<ConnectionDescriptor>` - Validated descriptor or error
    pub fn connection_descriptor(&self) -> Result<ConnectionDescriptor> {
        let conn_args = self.connection_args().ok_or_else(|| {
            PorterError::Generic("This command does not connect to a service".to_string())
        })?;
        let conn = &self.config.connection;

        let api_key = conn.api_key.as_deref().ok_or(AuthError::MissingKey)?;

        match (&conn.endpoint, &conn.service) {
            (Some(endpoint), _) => {
                ConnectionDescriptor::new(endpoint, &conn_args.index, api_key, &conn.api_version)
            }
            (None, Some(service)) => ConnectionDescriptor::for_service(
                service,
                &conn_args.index,
                api_key,
                &conn.api_version,
            ),
            (None, None) => {
                Err(ConfigError::MissingField("--service or --endpoint".to_string()).into())
            }
        }
    }

    /// Mask a credential for display
    ///
    /// # Arguments
    /// * `key` - API key
    ///
    /// # Returns
    /// * `String` - Masked key, only the last four characters visible
    pub fn sanitize_key(key: &str) -> String {
        mask_key(key)
    }

    /// Run the selected subcommand
    ///
    /// # Arguments
    /// * `cancel` - Token cancelled on Ctrl+C
    ///
    /// # Returns
    /// * `Result<i32>` - Process exit status, or the fatal error
    pub async fn run(&self, cancel: CancellationToken) -> Result<i32> {
        match &self.args.command {
            Commands::Export(export) => self.run_export(export, cancel).await,
            Commands::Import(import) => self.run_import(import, cancel).await,
            Commands::Completion { shell } => {
                completion::generate_completion(*shell, &mut std::io::stdout());
                Ok(EXIT_SUCCESS)
            }
            Commands::Config { show, validate } => self.handle_config_command(*show, *validate),
        }
    }

    /// Export subcommand
    async fn run_export(&self, args: &ExportArgs, cancel: CancellationToken) -> Result<i32> {
        let descriptor = self.connection_descriptor()?;
        debug!("Exporting from {} with key {}", descriptor, descriptor.masked_key());

        let output = args
            .output
            .clone()
            .unwrap_or_else(|| default_output_path(descriptor.index(), Local::now()));

        let request = ExportRequest {
            query: ExportQuery {
                select: split_fields(&args.select),
                filter: args.filter.clone(),
                top: args.top,
                order_by: args.order_by.clone(),
            },
            output,
            page_size: self.config.transfer.page_size,
            show_progress: self.config.transfer.show_progress,
            pretty: self.config.transfer.pretty,
        };

        let client = SearchClient::new(descriptor, self.config.request_timeout())?;
        let result = export_to_file(&client, request, Some(cancel)).await?;

        println!("{}", self.summary_formatter().format_export(&result));
        Ok(EXIT_SUCCESS)
    }

    /// Import subcommand
    async fn run_import(&self, args: &ImportArgs, cancel: CancellationToken) -> Result<i32> {
        let descriptor = self.connection_descriptor()?;
        debug!("Importing into {} with key {}", descriptor, descriptor.masked_key());

        let request = ImportRequest {
            input: args.input.clone(),
            batch_size: self.config.transfer.batch_size,
            action: args.action(),
            show_progress: self.config.transfer.show_progress,
        };

        let client = SearchClient::new(descriptor, self.config.request_timeout())?;
        let report = match import_from_file(&client, request, Some(cancel)).await {
            Ok(report) => report,
            Err(PorterError::ImportAborted { report, cause }) => {
                println!("{}", self.summary_formatter().format_import(&report));
                return Err(*cause);
            }
            Err(e) => return Err(e),
        };

        println!("{}", self.summary_formatter().format_import(&report));
        Ok(import_exit_status(&report))
    }

    fn summary_formatter(&self) -> SummaryFormatter {
        SummaryFormatter::new(self.args.verbose || self.args.very_verbose)
    }

    /// Handle config subcommand
    ///
    /// # Arguments
    /// * `show` - Whether to show configuration
    /// * `validate` - Whether to validate configuration
    ///
    /// # Returns
    /// * `Result<i32>` - Exit status, failure when validation fails
    fn handle_config_command(&self, show: bool, validate: bool) -> Result<i32> {
        let mut status = EXIT_SUCCESS;

        if validate && !self.validate_config_file() {
            status = EXIT_FAILURE;
        }

        if show || !validate {
            self.show_config()?;
        }

        Ok(status)
    }

    /// Validate configuration file, printing the outcome
    fn validate_config_file(&self) -> bool {
        let path = self.config_path();
        println!("Validating configuration file: {}", path.display());

        if !path.exists() {
            println!("Configuration file does not exist, defaults apply");
            return true;
        }

        match Config::from_file(&path).and_then(|config| config.validate()) {
            Ok(()) => {
                println!("Configuration is valid");
                true
            }
            Err(e) => {
                println!("Configuration is invalid: {}", e);
                false
            }
        }
    }

    /// Show effective configuration with the API key masked
    fn show_config(&self) -> Result<()> {
        let path = self.config_path();
        println!("Configuration file: {}", path.display());
        if path.exists()
            && let Err(e) = Config::from_file(&path)
        {
            println!("Configuration file could not be loaded, showing defaults: {}", e);
        }
        println!();

        let mut config = self.config.clone();
        config.connection.api_key = config.connection.api_key.as_deref().map(mask_key);
        println!("{}", config.to_toml()?);
        Ok(())
    }

    /// Get configuration file path (from args or default)
    fn config_path(&self) -> PathBuf {
        self.args
            .config_file
            .clone()
            .unwrap_or_else(Config::default_config_path)
    }
}

/// Exit status for a finished import
pub fn import_exit_status(report: &ImportReport) -> i32 {
    if report.cancelled {
        EXIT_INTERRUPTED
    } else if report.failed > 0 {
        EXIT_PARTIAL
    } else {
        EXIT_SUCCESS
    }
}

/// Exit status for a failed run
pub fn error_exit_status(error: &PorterError) -> i32 {
    match error.cause() {
        PorterError::Cancelled => EXIT_INTERRUPTED,
        _ => EXIT_FAILURE,
    }
}

/// `<index>-YYYY-mm-dd_HH-MM-SS.json` in the working directory
pub fn default_output_path(index: &str, now: DateTime<Local>) -> PathBuf {
    PathBuf::from(format!("{}-{}.json", index, now.format("%Y-%m-%d_%H-%M-%S")))
}

/// Flatten `--select` values, accepting both `a b` and `a,b`
pub fn split_fields(values: &[String]) -> Vec<String> {
    values
        .iter()
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .filter(|field| !field.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn cli(argv: &[&str]) -> CliInterface {
        let args = CliArgs::try_parse_from(argv).unwrap();
        let mut config = Config::default();
        CliInterface::apply_args_to_config(&mut config, &args);
        CliInterface { args, config }
    }

    #[test]
    fn test_export_args_parsing() {
        let args = CliArgs::try_parse_from([
            "search-porter",
            "export",
            "--service",
            "contoso",
            "--index",
            "hotels",
            "--key",
            "secret",
            "--select",
            "id",
            "name,rating",
            "--filter",
            "rating ge 4",
            "--top",
            "50",
        ])
        .unwrap();

        let Commands::Export(export) = args.command else {
            panic!("expected export");
        };
        assert_eq!(export.connection.service.as_deref(), Some("contoso"));
        assert_eq!(export.connection.index, "hotels");
        assert_eq!(split_fields(&export.select), vec!["id", "name", "rating"]);
        assert_eq!(export.filter.as_deref(), Some("rating ge 4"));
        assert_eq!(export.top, Some(50));
        assert!(export.output.is_none());
    }

    #[test]
    fn test_import_modes() {
        let base = ["search-porter", "import", "--service", "s", "--index", "i", "--input", "in.json"];

        let args = CliArgs::try_parse_from(base).unwrap();
        let Commands::Import(import) = args.command else {
            panic!("expected import");
        };
        assert_eq!(import.action(), IndexAction::Upload);
        assert_eq!(import.batch_size, None);

        let args = CliArgs::try_parse_from(base.iter().chain(&["--merge"])).unwrap();
        let Commands::Import(import) = args.command else {
            panic!("expected import");
        };
        assert_eq!(import.action(), IndexAction::Merge);

        let args = CliArgs::try_parse_from(base.iter().chain(&["--merge-or-upload"])).unwrap();
        let Commands::Import(import) = args.command else {
            panic!("expected import");
        };
        assert_eq!(import.action(), IndexAction::MergeOrUpload);

        assert!(CliArgs::try_parse_from(base.iter().chain(&["--merge", "--merge-or-upload"])).is_err());
    }

    #[test]
    fn test_service_and_endpoint_conflict() {
        let result = CliArgs::try_parse_from([
            "search-porter",
            "export",
            "--service",
            "a",
            "--endpoint",
            "https://b.search.windows.net",
            "--index",
            "i",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_index_is_required() {
        assert!(CliArgs::try_parse_from(["search-porter", "export", "--service", "a"]).is_err());
    }

    #[test]
    fn test_args_override_config() {
        let cli = cli(&[
            "search-porter",
            "-v",
            "--timeout",
            "5",
            "import",
            "--service",
            "contoso",
            "--index",
            "hotels",
            "--key",
            "secret",
            "--input",
            "in.json",
            "--batch-size",
            "250",
            "--no-progress",
        ]);

        assert_eq!(cli.config().logging.level, LogLevel::Debug);
        assert_eq!(cli.config().connection.timeout, 5);
        assert_eq!(cli.config().transfer.batch_size, 250);
        assert!(!cli.config().transfer.show_progress);
        assert_eq!(cli.config().connection.api_key.as_deref(), Some("secret"));
    }

    #[test]
    fn test_compact_and_page_size() {
        let cli = cli(&[
            "search-porter",
            "export",
            "--endpoint",
            "http://localhost:8080",
            "--index",
            "hotels",
            "--compact",
            "--page-size",
            "200",
        ]);
        assert!(!cli.config().transfer.pretty);
        assert_eq!(cli.config().transfer.page_size, 200);
    }

    #[test]
    fn test_descriptor_from_service() {
        let cli = cli(&[
            "search-porter",
            "export",
            "--service",
            "contoso",
            "--index",
            "hotels",
            "--key",
            "secret-key-1234",
        ]);
        let descriptor = cli.connection_descriptor().unwrap();
        assert_eq!(
            descriptor.endpoint().as_str(),
            "https://contoso.search.windows.net/"
        );
        assert_eq!(descriptor.index(), "hotels");
    }

    #[test]
    fn test_descriptor_prefers_cli_endpoint_over_config_service() {
        let args = CliArgs::try_parse_from([
            "search-porter",
            "export",
            "--endpoint",
            "http://localhost:7700",
            "--index",
            "hotels",
            "--key",
            "k",
        ])
        .unwrap();
        let mut config = Config::default();
        config.connection.service = Some("configured".to_string());
        CliInterface::apply_args_to_config(&mut config, &args);
        let cli = CliInterface { args, config };

        let descriptor = cli.connection_descriptor().unwrap();
        assert_eq!(descriptor.endpoint().as_str(), "http://localhost:7700/");
    }

    #[test]
    fn test_descriptor_requires_endpoint() {
        let cli = cli(&["search-porter", "export", "--index", "hotels", "--key", "k"]);
        assert!(matches!(
            cli.connection_descriptor(),
            Err(PorterError::Config(ConfigError::MissingField(_)))
        ));
    }

    #[test]
    fn test_default_output_path() {
        let now = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(
            default_output_path("hotels", now),
            PathBuf::from("hotels-2024-03-09_14-05-07.json")
        );
    }

    #[test]
    fn test_sanitize_key() {
        let masked = CliInterface::sanitize_key("abcdefgh1234");
        assert!(!masked.contains("abcdefgh"));
        assert!(masked.ends_with("1234"));
    }

    #[test]
    fn test_import_exit_status() {
        let clean = ImportReport {
            total: 2,
            succeeded: 2,
            ..Default::default()
        };
        let partial = ImportReport {
            total: 2,
            succeeded: 1,
            failed: 1,
            ..Default::default()
        };
        let cancelled = ImportReport {
            total: 2,
            cancelled: true,
            ..Default::default()
        };

        assert_eq!(import_exit_status(&clean), EXIT_SUCCESS);
        assert_eq!(import_exit_status(&partial), EXIT_PARTIAL);
        assert_eq!(import_exit_status(&cancelled), EXIT_INTERRUPTED);
        assert_eq!(error_exit_status(&PorterError::Cancelled), EXIT_INTERRUPTED);
        assert_eq!(error_exit_status(&"boom".into()), EXIT_FAILURE);

        let aborted = PorterError::ImportAborted {
            report: Box::new(ImportReport::new(2)),
            cause: Box::new("index not found".into()),
        };
        assert_eq!(error_exit_status(&aborted), EXIT_FAILURE);
    }

    #[test]
    fn test_malformed_config_reaches_validate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[transfer\nbatch_size = ").unwrap();
        let path = path.to_str().unwrap();

        let args = CliArgs::try_parse_from(["search-porter", "-c", path, "config", "--validate"])
            .unwrap();
        let cli = CliInterface::from_args(args).unwrap();
        assert_eq!(cli.handle_config_command(false, true).unwrap(), EXIT_FAILURE);

        let args = CliArgs::try_parse_from([
            "search-porter",
            "-c",
            path,
            "export",
            "--service",
            "s",
            "--index",
            "i",
        ])
        .unwrap();
        assert!(matches!(
            CliInterface::from_args(args),
            Err(PorterError::Config(ConfigError::InvalidFormat(_)))
        ));
    }

    #[test]
    fn test_completion_subcommand() {
        let args = CliArgs::try_parse_from(["search-porter", "completion", "zsh"]).unwrap();
        assert!(matches!(args.command, Commands::Completion { shell: Shell::Zsh }));
    }
}
