pub mod cli;
pub mod config;
pub mod filter;
pub mod record;
pub mod schema;
pub mod search;
pub mod source;
pub mod summary;

use crate::config::FilterConfig;
use crate::filter::{ConfigurationError, Criteria, CriterionSpec, FilterExpression, SearchSpec};
use crate::search::SearchContext;
use crate::source::{FileSource, RecordSource};
use anyhow::{Context, Result};
use log::{debug, info};
use std::fs;
use std::path::Path;

pub use cli::{Cli, ColorMode, Commands, FilterArgs, OutputFormat, cli_parse};
pub use config::{ConfigError, load_config, resolve_config};
pub use record::{FieldKind, FieldValue, LoadError, Record, load_records};
pub use schema::Schema;

/// Everything one search or count run filters with
#[derive(Debug, Clone)]
struct FilterPlan {
    search_spec: SearchSpec,
    search_term: String,
    criteria: Criteria,
}

fn init_logging(cli: &Cli) {
    // RUST_LOG, when set, wins over the -v/-q flags
    let _ = env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_default_env()
        .format_timestamp(None)
        .try_init();
}

fn apply_color_mode(mode: ColorMode) {
    match mode {
        ColorMode::Always => colored::control::set_override(true),
        ColorMode::Never => colored::control::set_override(false),
        ColorMode::Auto => {}
    }
}

fn write_output_file(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content)
        .with_context(|| format!("Failed to write output file '{}'", path.display()))
}

/// Print to stdout and mirror into the output file, if any
fn emit(content: &str, output: Option<&Path>) -> Result<()> {
    print!("{content}");
    if let Some(path) = output {
        write_output_file(path, content)?;
        info!("Wrote output to {}", path.display());
    }
    Ok(())
}

fn load_file(file: &Path, config: &FilterConfig) -> Result<Vec<Record>> {
    let source = FileSource::new(file, config.schema.clone());
    let records = source
        .load()
        .with_context(|| format!("Failed to load records from '{}'", source.describe()))?;
    debug!("Loaded {} records from {}", records.len(), source.describe());
    Ok(records)
}

fn load_criteria_file(path: &Path, schema: &Schema) -> Result<Criteria> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read criteria file '{}'", path.display()))?;
    let specs: Vec<CriterionSpec> = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse criteria file '{}'", path.display()))?;

    let mut criteria = Criteria::new();
    for spec in &specs {
        let criterion = spec
            .to_criterion()
            .and_then(|criterion| schema.validate_criterion(&criterion).map(|_| criterion))
            .with_context(|| format!("Invalid criteria in '{}'", path.display()))?;
        criteria.insert(criterion);
    }
    debug!("Read {} criteria from {}", criteria.len(), path.display());
    Ok(criteria)
}

/// Merge config defaults, the criteria file and the --filter expression, later wins per field
fn build_plan(config: &FilterConfig, args: &FilterArgs, records: &[Record]) -> Result<FilterPlan> {
    let mut criteria = config
        .default_criteria()
        .context("Invalid criteria in config")?;

    if let Some(path) = &args.criteria {
        criteria.merge(load_criteria_file(path, &config.schema)?);
    }

    let mut words = Vec::new();
    if let Some(term) = args.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        words.push(term.to_string());
    }

    // Without a declared schema, kinds seen in the data steer bare filter values
    let inferred = if config.schema.is_empty() {
        Schema::infer(records)
    } else {
        Schema::default()
    };

    if let Some(expr) = &args.filter {
        let parsed = FilterExpression::parse_with_kinds(expr, &config.schema, &inferred)
            .with_context(|| format!("Invalid filter expression '{expr}'"))?;
        criteria.merge(parsed.criteria);
        if !parsed.search_term.is_empty() {
            words.push(parsed.search_term);
        }
    }

    let mut search_spec = if args.fields.is_empty() {
        config.search_spec()
    } else {
        SearchSpec::new(&args.fields)
    };
    config
        .schema
        .validate_search(&search_spec)
        .context("Invalid search fields")?;
    if search_spec.is_empty() {
        search_spec = SearchSpec::new(Schema::infer(records).searchable_fields());
        debug!("Search fields inferred from data: {:?}", search_spec.fields());
    }

    Ok(FilterPlan {
        search_spec,
        search_term: words.join(" "),
        criteria,
    })
}

fn run_profiles(format: OutputFormat, output: Option<&Path>) -> Result<()> {
    let profiles: Vec<FilterConfig> = config::builtin_profile_names()
        .into_iter()
        .filter_map(|name| config::load_builtin_profile(name).transpose())
        .collect::<Result<_, _>>()
        .context("Failed to load built-in profiles")?;

    let content = match format {
        OutputFormat::Text => {
            let mut text = String::new();
            for profile in &profiles {
                text.push_str(&format!(
                    "{:<12} {} fields, search: {}\n",
                    profile.profile_name,
                    profile.schema.len(),
                    profile.search_spec().fields().join(", ")
                ));
            }
            text
        }
        OutputFormat::Json => {
            let entries: Vec<_> = profiles
                .iter()
                .map(|profile| {
                    serde_json::json!({
                        "name": profile.profile_name,
                        "schema": profile.schema,
                        "search_fields": profile.search_spec().fields(),
                    })
                })
                .collect();
            let json = serde_json::to_string_pretty(&serde_json::json!({ "profiles": entries }))
                .unwrap_or_else(|_| "{\"profiles\":[]}".into());
            format!("{json}\n")
        }
    };

    emit(&content, output)
}

pub fn run() -> Result<()> {
    let cli = cli_parse();
    init_logging(&cli);
    apply_color_mode(cli.color);

    let format = cli.format;
    let output = cli.output.as_deref();

    if let Commands::Profiles = cli.command {
        return run_profiles(format, output);
    }

    let config = resolve_config(cli.config.as_deref(), cli.profile.as_deref())
        .context("Failed to load config")?;
    info!("Using profile '{}'", config.profile_name);
    if let Some(path) = &cli.config {
        debug!("Config file: {}", path.display());
    }

    match &cli.command {
        Commands::Search {
            file,
            filters,
            limit,
            show,
        } => {
            let records = load_file(file, &config)?;
            let plan = build_plan(&config, filters, &records)?;
            let matches = filter::filter(
                &records,
                &plan.search_spec,
                &plan.search_term,
                &plan.criteria,
            )?;
            info!("{} of {} records matched", matches.len(), records.len());

            let source = file.display().to_string();
            let context = SearchContext {
                source: &source,
                total: records.len(),
                search_term: &plan.search_term,
                criteria: &plan.criteria,
            };
            let content = match format {
                OutputFormat::Text => search::format_search_text(&context, &matches, show, *limit),
                OutputFormat::Json => {
                    format!("{}\n", search::format_search_json(&context, &matches, *limit))
                }
            };
            emit(&content, output)?;
        }
        Commands::Count { file, by, filters } => {
            if !config.schema.is_empty() && !config.schema.declares(by) {
                return Err(ConfigurationError::UnknownField(by.clone()))
                    .context("Invalid --by field");
            }

            let records = load_file(file, &config)?;
            let plan = build_plan(&config, filters, &records)?;
            let matches = filter::filter(
                &records,
                &plan.search_spec,
                &plan.search_term,
                &plan.criteria,
            )?;
            let groups = search::build_count_groups(&matches, by);
            info!(
                "{} matches grouped into {} values of '{by}'",
                matches.len(),
                groups.len()
            );

            let content = match format {
                OutputFormat::Text => search::format_count_text(by, matches.len(), &groups),
                OutputFormat::Json => {
                    let source = file.display().to_string();
                    let context = SearchContext {
                        source: &source,
                        total: records.len(),
                        search_term: &plan.search_term,
                        criteria: &plan.criteria,
                    };
                    format!(
                        "{}\n",
                        search::format_count_json(&context, by, matches.len(), &groups)
                    )
                }
            };
            emit(&content, output)?;
        }
        Commands::Info { file } => {
            let records = load_file(file, &config)?;
            let source = file.display().to_string();
            let summary =
                summary::summarize(&source, &config.profile_name, &records, &config.schema);

            match format {
                OutputFormat::Text => {
                    summary::display_summary(&summary);
                    if let Some(path) = output {
                        write_output_file(path, &summary::format_summary_text(&summary))?;
                    }
                }
                OutputFormat::Json => {
                    emit(&format!("{}\n", summary::format_summary_json(&summary)), output)?;
                }
            }
        }
        Commands::Profiles => {}
    }

    Ok(())
}
