use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use optlib_fetch::app::{App, ProgressSink, TracingSink};
use optlib_fetch::config::{ConfigLoader, Settings};
use optlib_fetch::domain::{Library, Status};
use optlib_fetch::error::OptlibError;
use optlib_fetch::output::{CatalogResult, JsonOutput, OutputMode, QueryResult, TextOutput};
use optlib_fetch::query::InstanceQuery;
use optlib_fetch::remote::HttpRemoteSource;

#[derive(Parser)]
#[command(name = "optlib")]
#[command(about = "Fetch and filter instances of MIPLIB 2017, MINLPLib and QPLIB")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    library: Option<Library>,

    #[arg(long, global = true)]
    cache_dir: Option<Utf8PathBuf>,

    /// File format to download (MINLPLIB and QPLIB only).
    #[arg(long, global = true)]
    file_extension: Option<String>,

    #[arg(long, global = true)]
    config: Option<String>,

    #[arg(long, short, global = true)]
    verbose: bool,

    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Build the local catalog, or reuse the existing one")]
    Catalog {
        #[arg(long)]
        force: bool,
    },
    #[command(about = "Download the instances matching the given filters")]
    Query(QueryArgs),
}

#[derive(Args)]
struct QueryArgs {
    #[arg(long)]
    force: bool,

    /// List matching instances without downloading them.
    #[arg(long)]
    dry_run: bool,

    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    min_var: Option<u64>,
    #[arg(long)]
    max_var: Option<u64>,
    #[arg(long)]
    min_bin: Option<u64>,
    #[arg(long)]
    max_bin: Option<u64>,
    #[arg(long)]
    min_int: Option<u64>,
    #[arg(long)]
    max_int: Option<u64>,
    #[arg(long)]
    min_cont: Option<u64>,
    #[arg(long)]
    max_cont: Option<u64>,
    #[arg(long)]
    min_cons: Option<u64>,
    #[arg(long)]
    max_cons: Option<u64>,
    #[arg(long)]
    min_nz: Option<u64>,
    #[arg(long)]
    max_nz: Option<u64>,
    #[arg(long)]
    with_status: Option<Status>,
    #[arg(long)]
    without_status: Option<Status>,
    #[arg(long)]
    min_sos: Option<u64>,
    #[arg(long)]
    max_sos: Option<u64>,
    #[arg(long)]
    min_semi: Option<u64>,
    #[arg(long)]
    max_semi: Option<u64>,
    #[arg(long = "type")]
    problem_type: Option<String>,
    #[arg(long)]
    min_obj_density: Option<f64>,
    #[arg(long)]
    max_obj_density: Option<f64>,
    #[arg(long)]
    min_problematic_ev_density: Option<f64>,
    #[arg(long)]
    max_problematic_ev_density: Option<f64>,
    #[arg(long)]
    min_quadratic_cons: Option<u64>,
    #[arg(long)]
    max_quadratic_cons: Option<u64>,
    #[arg(long)]
    objective_type: Option<String>,
    #[arg(long)]
    variables_type: Option<String>,
    #[arg(long)]
    constraints_type: Option<String>,
}

impl QueryArgs {
    fn to_query(&self) -> InstanceQuery {
        InstanceQuery {
            instance_name: self.name.clone(),
            min_var: self.min_var,
            max_var: self.max_var,
            min_bin: self.min_bin,
            max_bin: self.max_bin,
            min_int: self.min_int,
            max_int: self.max_int,
            min_cont: self.min_cont,
            max_cont: self.max_cont,
            min_cons: self.min_cons,
            max_cons: self.max_cons,
            min_nz: self.min_nz,
            max_nz: self.max_nz,
            with_status: self.with_status,
            without_status: self.without_status,
            min_sos: self.min_sos,
            max_sos: self.max_sos,
            min_semi: self.min_semi,
            max_semi: self.max_semi,
            problem_type: self.problem_type.clone(),
            min_obj_density: self.min_obj_density,
            max_obj_density: self.max_obj_density,
            min_problematic_ev_density: self.min_problematic_ev_density,
            max_problematic_ev_density: self.max_problematic_ev_density,
            min_quadratic_cons: self.min_quadratic_cons,
            max_quadratic_cons: self.max_quadratic_cons,
            objective_type: self.objective_type.clone(),
            variables_type: self.variables_type.clone(),
            constraints_type: self.constraints_type.clone(),
        }
    }
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<OptlibError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &OptlibError) -> u8 {
    match error {
        OptlibError::Precondition(_)
        | OptlibError::InvalidLibrary(_)
        | OptlibError::InvalidStatus(_)
        | OptlibError::MissingConfig
        | OptlibError::ConfigRead(_)
        | OptlibError::ConfigParse(_) => 2,
        OptlibError::Http(_) | OptlibError::HttpStatus { .. } => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    let cli = Cli::parse();

    let mut settings = ConfigLoader::resolve_or_default(cli.config.as_deref())?;
    apply_overrides(&mut settings, &cli);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_log_level(&settings)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Text
    };

    let remote = HttpRemoteSource::new()?;

    match cli.command {
        Commands::Catalog { force } => {
            settings.force_refresh |= force;
            let app = App::new(settings, remote)?;
            let path = app.refresh_catalog(sink_for(output_mode))?;
            let result = CatalogResult {
                library: app.library(),
                path: &path,
            };
            match output_mode {
                OutputMode::Json => JsonOutput::print_catalog(&result).into_diagnostic()?,
                OutputMode::Text => TextOutput::print_catalog(&result).into_diagnostic()?,
            }
        }
        Commands::Query(args) => {
            settings.force_refresh |= args.force;
            let app = App::new(settings, remote)?;
            let sink = sink_for(output_mode);
            app.refresh_catalog(sink)?;
            let query = args.to_query();
            let instances = if args.dry_run {
                app.list_instances(&query)?
            } else {
                app.get_instances(&query, sink)?
            };
            let result = QueryResult {
                library: app.library(),
                count: instances.len(),
                instances: &instances,
            };
            match output_mode {
                OutputMode::Json => JsonOutput::print_query(&result).into_diagnostic()?,
                OutputMode::Text => TextOutput::print_query(&result).into_diagnostic()?,
            }
        }
    }
    Ok(())
}

fn apply_overrides(settings: &mut Settings, cli: &Cli) {
    if let Some(library) = cli.library {
        settings.library = library;
    }
    if let Some(dir) = &cli.cache_dir {
        settings.local_directory = dir.clone();
    }
    if let Some(extension) = &cli.file_extension {
        settings.file_extension = Some(extension.clone());
    }
    settings.verbose |= cli.verbose;
}

/// `RUST_LOG` wins; otherwise `verbose` from the config file or the flag
/// turns on progress logging.
fn default_log_level(settings: &Settings) -> &'static str {
    if settings.verbose { "info" } else { "warn" }
}

fn sink_for(mode: OutputMode) -> &'static dyn ProgressSink {
    match mode {
        OutputMode::Json => &JsonOutput,
        OutputMode::Text => &TracingSink,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_for(config: &str, args: &[&str]) -> Settings {
        let cli = Cli::try_parse_from(args).unwrap();
        let mut settings = ConfigLoader::parse(config).unwrap();
        apply_overrides(&mut settings, &cli);
        settings
    }

    #[test]
    fn verbose_from_config_enables_info_logging() {
        let settings = settings_for(r#"{"verbose": true}"#, &["optlib", "catalog"]);
        assert_eq!(default_log_level(&settings), "info");
    }

    #[test]
    fn verbose_flag_enables_info_logging() {
        let settings = settings_for("{}", &["optlib", "query", "-v"]);
        assert_eq!(default_log_level(&settings), "info");
    }

    #[test]
    fn quiet_by_default() {
        let settings = settings_for("{}", &["optlib", "catalog"]);
        assert_eq!(default_log_level(&settings), "warn");
    }

    #[test]
    fn config_errors_map_to_usage_exit_code() {
        let err = ConfigLoader::parse(r#"{"library": "miplib3"}"#).unwrap_err();
        assert_eq!(map_exit_code(&err), 2);
    }
}
