use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::Duration;

use crate::auth::Token;
use crate::config::{Config, OutputFormat};
use crate::metrics::{create_table_statement, BuildSuccess, Collector};
use crate::output::{export_report, CollectionProgress};
use crate::providers::buildkite::BuildkiteClient;
use crate::report::MetricsReport;

#[derive(Parser)]
#[command(name = "ci-metrics")]
#[command(author, version, about = "CI build metrics collector", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ./ci-metrics.{toml,json,yaml,yml})
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Write output to this file instead of stdout
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Output format (defaults to the config file's, then table)
    #[arg(short, long, global = true, value_enum)]
    format: Option<OutputFormat>,

    /// Pretty-print JSON output
    #[arg(short, long, global = true, default_value_t = false)]
    pretty: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Per-platform pass/fail verdicts of the most recent builds
    BuildSuccess(BuildSuccessArgs),

    /// Print the CREATE TABLE statement of the build_success table
    Schema,
}

#[derive(Args, Default)]
struct BuildSuccessArgs {
    #[arg(short, long, env = "BUILDKITE_API_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Buildkite API base URL
    #[arg(short, long)]
    url: Option<String>,

    /// Organization slug owning the pipelines
    #[arg(long)]
    org: Option<String>,

    /// Number of most recent builds to inspect per pipeline
    #[arg(short, long)]
    builds: Option<usize>,

    /// Pipeline to inspect; repeat for several pipelines
    #[arg(short = 'P', long = "pipeline")]
    pipelines: Vec<String>,

    /// Request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,
}

/// Effective build_success settings after merging config file and arguments.
#[derive(Debug)]
struct BuildSuccessSettings {
    token: Option<Token>,
    base_url: String,
    organization: String,
    builds: usize,
    pipelines: Vec<String>,
    timeout: Duration,
}

impl BuildSuccessSettings {
    fn resolve(config: &Config, args: &BuildSuccessArgs) -> Result<Self> {
        let organization = args
            .org
            .clone()
            .or_else(|| config.buildkite.organization.clone())
            .context("No Buildkite organization given (use --org or buildkite.organization)")?;

        let pipelines = if args.pipelines.is_empty() {
            config.build_success.pipelines.clone()
        } else {
            args.pipelines.clone()
        };
        if pipelines.is_empty() {
            anyhow::bail!("At least one pipeline is required (use --pipeline or build-success.pipelines)");
        }

        let builds = args.builds.unwrap_or(config.build_success.builds);
        if builds == 0 {
            anyhow::bail!("The number of builds to inspect must be at least 1");
        }

        Ok(Self {
            token: args
                .token
                .as_deref()
                .or(config.buildkite.token.as_deref())
                .map(Token::from),
            base_url: args
                .url
                .clone()
                .unwrap_or_else(|| config.buildkite.base_url.clone()),
            organization,
            builds,
            pipelines,
            timeout: Duration::from_secs(args.timeout.unwrap_or(config.buildkite.timeout_secs)),
        })
    }
}

impl Cli {
    fn writer(&self) -> Result<Box<dyn Write>> {
        match &self.output {
            Some(path) => {
                let file = File::create(path)
                    .with_context(|| format!("Failed to create output file: {}", path.display()))?;
                Ok(Box::new(BufWriter::new(file)))
            }
            None => Ok(Box::new(std::io::stdout().lock())),
        }
    }

    fn finish_output(&self, mut writer: Box<dyn Write>) -> Result<()> {
        writer.flush()?;
        if let Some(path) = &self.output {
            info!("Output written to: {}", path.display());
        }
        Ok(())
    }

    async fn execute_build_success(&self, config: &Config, args: &BuildSuccessArgs) -> Result<()> {
        let settings = BuildSuccessSettings::resolve(config, args)?;

        info!(
            "Collecting build success for {} pipeline(s) of organization {}",
            settings.pipelines.len(),
            settings.organization
        );

        let client = BuildkiteClient::new(
            &settings.base_url,
            settings.organization,
            settings.token,
            settings.timeout,
        )?;

        let pipeline_count = settings.pipelines.len();
        let collector = BuildSuccess::new(client, settings.builds, settings.pipelines);

        let progress = CollectionProgress::start(collector.name(), pipeline_count);
        let data = match collector.collect().await {
            Ok(data) => data,
            Err(e) => {
                progress.abandon();
                return Err(e.into());
            }
        };
        progress.finish(data.len());

        let report = MetricsReport::new(collector.name(), &data);

        let format = self.format.unwrap_or(config.output.format);
        let pretty = self.pretty || config.output.pretty;

        let mut writer = self.writer()?;
        export_report(&report, format, pretty, &mut writer)?;
        self.finish_output(writer)
    }

    fn execute_schema(&self) -> Result<()> {
        let statement = create_table_statement(
            BuildSuccess::<BuildkiteClient>::NAME,
            BuildSuccess::<BuildkiteClient>::COLUMNS,
        );

        let mut writer = self.writer()?;
        writeln!(writer, "{statement}")?;
        self.finish_output(writer)
    }

    pub async fn execute(&self) -> Result<()> {
        let config = Config::load(self.config.as_deref())?;

        match &self.command {
            Commands::BuildSuccess(args) => self.execute_build_success(&config, args).await,
            Commands::Schema => self.execute_schema(),
        }
    }
}
