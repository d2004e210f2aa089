//! bl-lookup CLI
//!
//! Loads the configured Biolink versions and answers one query per
//! invocation, printing JSON on stdout:
//! - `versions`: loaded version labels
//! - `entity`: schema properties of a class or slot
//! - `hierarchy`: ancestors / descendants / lineage
//! - `uri-lookup`: entities claiming an external identifier
//! - `resolve`: external relation identifiers → canonical predicates

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use bl_lookup_index::VersionRegistry;
use bl_lookup_service::{LookupConfig, LookupFacade, PredicateResolver, VersionLoader};

#[derive(Parser, Debug)]
#[command(name = "bl-lookup")]
#[command(author, version, about = "Biolink model hierarchy and predicate lookups")]
struct Cli {
    /// JSON config file (default: $BL_LOOKUP_CONFIG, then built-in defaults)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Schema version to query (default: the config's default_version)
    #[arg(long = "version-label", short = 'l', global = true)]
    version_label: Option<String>,

    /// Extra schema documents, as LABEL=PATH_OR_URL
    #[arg(long = "schema", value_name = "LABEL=LOCATION", global = true)]
    schemas: Vec<String>,

    /// Limit on one authority walk in milliseconds (0: no limit)
    #[arg(long, value_name = "MS", global = true)]
    walk_timeout_ms: Option<u64>,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List loaded schema versions
    Versions,

    /// Show the schema properties of a class or slot
    Entity {
        /// Name, snake_case name or CURIE (`biological process`, `biolink:BiologicalProcess`)
        name: String,
    },

    /// Show a hierarchy list of a class or slot
    Hierarchy {
        name: String,
        /// ancestors | descendants | lineage
        #[arg(default_value = "lineage")]
        field: String,
    },

    /// List entities mapped to an external identifier
    UriLookup { identifier: String },

    /// Resolve external relation identifiers to Biolink predicates
    Resolve {
        #[arg(required = true)]
        identifiers: Vec<String>,
    },

    /// Summary of one loaded version
    Info,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(cli: &Cli) -> Result<LookupConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let mut config = LookupConfig::from_path(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            config
                .apply_overrides(|name| std::env::var(format!("BL_LOOKUP_{name}")).ok())
                .context("invalid BL_LOOKUP_* override")?;
            config
        }
        None => LookupConfig::from_env().context("failed to load configuration")?,
    };

    for entry in &cli.schemas {
        let (label, location) = entry
            .split_once('=')
            .ok_or_else(|| anyhow!("--schema expects LABEL=LOCATION, got `{entry}`"))?;
        config
            .versions
            .insert(label.trim().to_string(), location.trim().to_string());
    }
    if let Some(ms) = cli.walk_timeout_ms {
        config.resolver.walk_timeout_ms = (ms > 0).then_some(ms);
    }
    config.validate()?;
    Ok(config)
}

async fn run(cli: Cli) -> Result<Value> {
    let config = load_config(&cli)?;
    let registry = Arc::new(VersionRegistry::new());
    let loader = VersionLoader::new(config.build_source()?, Arc::clone(&registry), config.index_options()?);
    let resolver = PredicateResolver::new(config.build_authority()?, config.resolver.clone());
    let facade = LookupFacade::new(Arc::clone(&registry), resolver);

    let label = cli
        .version_label
        .clone()
        .unwrap_or_else(|| config.default_version.clone());

    // `versions` reports everything that loads; every other command needs one.
    let wanted = match cli.command {
        Commands::Versions => loader.available(),
        _ => vec![label.clone()],
    };
    for (failed, result) in loader.load_all(&wanted).await {
        if let Err(err) = result {
            if !matches!(cli.command, Commands::Versions) {
                return Err(anyhow!(err).context(format!("failed to load version `{failed}`")));
            }
        }
    }

    let out = match &cli.command {
        Commands::Versions => serde_json::to_value(facade.list_versions())?,
        Commands::Entity { name } => Value::Object(facade.get_entity(&label, name)?),
        Commands::Hierarchy { name, field } => {
            serde_json::to_value(facade.get_hierarchy_field(&label, name, field)?)?
        }
        Commands::UriLookup { identifier } => {
            serde_json::to_value(facade.lookup_by_external_identifier(&label, identifier)?)?
        }
        Commands::Resolve { identifiers } => {
            serde_json::to_value(facade.resolve_predicates(&label, identifiers.as_slice()).await?)?
        }
        Commands::Info => serde_json::to_value(facade.version_info(&label)?)?,
    };
    Ok(out)
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let pretty = cli.pretty;

    let out = run(cli).await?;
    let text = if pretty {
        serde_json::to_string_pretty(&out)?
    } else {
        serde_json::to_string(&out)?
    };
    println!("{text}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"
version: 3.1.2
slots:
  related to:
    symmetric: true
    exact_mappings: [skos:relatedMatch]
  treats:
    is_a: related to
    narrow_mappings: [RO:0002606]
classes:
  named thing: {}
  biological entity:
    is_a: named thing
"#;

    fn args(dir: &std::path::Path, rest: &[&str]) -> Cli {
        let schema = dir.join("biolink-model.yaml");
        std::fs::write(&schema, DOC).unwrap();
        let config = dir.join("bl-lookup.json");
        std::fs::write(&config, r#"{"default_version": "v3.1.2"}"#).unwrap();

        let mut argv = vec![
            "bl-lookup".to_string(),
            "--config".to_string(),
            config.display().to_string(),
            "--schema".to_string(),
            format!("v3.1.2={}", schema.display()),
        ];
        argv.extend(rest.iter().map(|s| s.to_string()));
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn walk_timeout_flag_sets_the_resolver_limit() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&args(dir.path(), &["--walk-timeout-ms", "250", "info"])).unwrap();
        assert_eq!(config.resolver.walk_timeout_ms, Some(250));

        let config = load_config(&args(dir.path(), &["info"])).unwrap();
        assert_eq!(config.resolver.walk_timeout_ms, None);
    }

    #[tokio::test]
    async fn hierarchy_command_prints_uris() {
        let dir = tempfile::tempdir().unwrap();
        let out = run(args(dir.path(), &["hierarchy", "biological_entity", "ancestors"]))
            .await
            .unwrap();
        assert_eq!(out, serde_json::json!(["biolink:NamedThing"]));
    }

    #[tokio::test]
    async fn resolve_command_returns_a_map() {
        let dir = tempfile::tempdir().unwrap();
        let out = run(args(dir.path(), &["resolve", "RO:0002606"])).await.unwrap();
        assert_eq!(out["RO:0002606"]["predicate"], "biolink:treats");
        assert_eq!(out["RO:0002606"]["inverted"], false);
    }

    #[tokio::test]
    async fn unknown_version_labels_fail() {
        let dir = tempfile::tempdir().unwrap();
        let err = run(args(dir.path(), &["--version-label", "v0.1.0", "entity", "named thing"]))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("v0.1.0"));
    }
}
