use mailtriage::classify::KeywordClassifier;
use mailtriage::cli::{Cli, Commands, ConfigAction};
use mailtriage::config::{expand_tilde, Config, ConfigValidator};
use mailtriage::entities::PatternEntityExtractor;
use mailtriage::error::{Result, TriageError};
use mailtriage::patterns::PatternRegistry;
use mailtriage::pipeline::{write_results, Collaborators, Pipeline};
use mailtriage::storage::{MemoryRecordStore, RecordStore, SqliteRecordStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    // Config commands manage the file itself and must work without a valid one
    let command = match cli.command {
        Commands::Config { action } => {
            let _guard = init_logging(cli.verbose, None)?;
            return cmd_config(cli.config, action);
        }
        command => command,
    };

    let config_path = resolve_config_path(cli.config)?;
    let config = load_config(&config_path)?;

    // Initialize logging
    let _guard = init_logging(cli.verbose, config.output.log_file.as_deref())?;
    if !config_path.exists() {
        tracing::warn!(
            "Config file not found, using defaults. Run 'mailtriage config init' to create one."
        );
    }

    match command {
        Commands::Process {
            dir,
            output,
            audit_log,
            database,
            workers,
            ephemeral,
        } => {
            let mut config = config;
            if let Some(output) = output {
                config.output.results_file = output;
            }
            if let Some(audit_log) = audit_log {
                config.output.audit_log = audit_log;
            }
            if let Some(database) = database {
                config.storage.database = database;
            }
            if let Some(workers) = workers {
                config.pipeline.workers = workers;
            }
            cmd_process(&config, &dir, ephemeral)?;
        }
        Commands::Stats { fingerprint } => {
            cmd_stats(&config, fingerprint.as_deref())?;
        }
        Commands::Taxonomy => {
            cmd_taxonomy(&config);
        }
        Commands::Config { .. } => {}
    }

    Ok(())
}

/// Console layer plus, when configured, a non-blocking file layer.
/// The returned guard must be held until exit so buffered lines are flushed.
fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let default_level = if verbose {
        "mailtriage=debug"
    } else {
        "mailtriage=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let path = expand_tilde(path);
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            let name = path
                .file_name()
                .ok_or_else(|| TriageError::InvalidConfigValue {
                    path: "output.log_file".to_string(),
                    message: format!("Not a file path: {:?}", path),
                })?;

            std::fs::create_dir_all(&dir).map_err(|e| TriageError::Io {
                source: e,
                context: format!("Failed to create log directory: {:?}", dir),
            })?;

            let appender = tracing_appender::rolling::never(&dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_target(true)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(guard)
}

fn cmd_process(config: &Config, dir: &Path, ephemeral: bool) -> Result<()> {
    let patterns = Arc::new(PatternRegistry::from_config(&config.patterns)?);

    let store: Arc<dyn RecordStore> = if ephemeral {
        tracing::info!("Using in-memory record store");
        Arc::new(MemoryRecordStore::new())
    } else {
        let db_path = expand_tilde(&config.storage.database);
        tracing::info!("Using record database at {:?}", db_path);
        Arc::new(SqliteRecordStore::open(&db_path, config.storage.pool_size)?)
    };

    let collaborators = Collaborators {
        classifier: Arc::new(KeywordClassifier::from_taxonomy(&config.taxonomy)),
        entities: Arc::new(PatternEntityExtractor::new(patterns)),
        store,
    };
    let pipeline = Pipeline::from_config(config, collaborators)?;

    let report = pipeline.run_blocking(dir)?;

    let results_path = expand_tilde(&config.output.results_file);
    write_results(&results_path, &report.results)?;

    let stats = &report.stats;
    println!("✓ Processed {} of {} messages", stats.processed, stats.discovered);
    if stats.skipped > 0 || stats.failed > 0 {
        println!(
            "  Skipped: {}, failed: {} (see log for causes)",
            stats.skipped, stats.failed
        );
    }
    let duplicates = report.results.iter().filter(|r| r.is_duplicate).count();
    println!("  Duplicates: {}", duplicates);
    println!("  Results: {}", results_path.display());
    println!(
        "  Audit log: {}",
        expand_tilde(&config.output.audit_log).display()
    );
    println!("  Duration: {}ms", stats.duration_ms);

    Ok(())
}

fn cmd_stats(config: &Config, fingerprint: Option<&str>) -> Result<()> {
    let db_path = expand_tilde(&config.storage.database);
    if !db_path.exists() {
        println!("No record database at {}", db_path.display());
        return Ok(());
    }

    let store = SqliteRecordStore::open(&db_path, 1)?;
    store.ensure_schema()?;

    println!("Record Store");
    println!("============");
    println!("Database: {}", db_path.display());
    println!("Records:  {}", store.count()?);
    if let Some(fp) = fingerprint {
        println!("Matching {}: {}", fp, store.count_fingerprint(fp)?);
    }

    Ok(())
}

fn cmd_taxonomy(config: &Config) {
    let taxonomy = &config.taxonomy;

    println!("Categories");
    println!("==========");
    for category in &taxonomy.categories {
        println!(
            "\n{} -> {} (priority {})",
            category.name, category.team, category.priority
        );
        for sub in &category.subcategories {
            println!("  - {}", sub.name);
        }
    }
    println!("\nUnmapped categories -> {}", taxonomy.default_team);
    println!(
        "Unknown category priority: {}",
        config.scoring.default_priority
    );
}

fn cmd_config(config_path: Option<PathBuf>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(&resolve_config_path(config_path)?)?;
            let content = toml::to_string_pretty(&config)?;
            println!("{}", content);
        }
        ConfigAction::Validate { file } => {
            let path = resolve_config_path(file.or(config_path))?;
            let config = Config::load(&path)?;
            println!("✓ Configuration is valid");
            println!("  Schema version: {}", config.meta.schema_version);
            println!("  Categories: {}", config.taxonomy.categories.len());
        }
        ConfigAction::Init { force } => {
            let path = resolve_config_path(config_path)?;

            if path.exists() && !force {
                println!("Configuration file already exists at: {}", path.display());
                println!("Use --force to overwrite");
                return Ok(());
            }

            // Create parent directory
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| TriageError::Io {
                    source: e,
                    context: format!("Failed to create config directory: {:?}", parent),
                })?;
            }

            // Save default config
            let config = Config::default();
            config.save(&path)?;

            println!("✓ Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}

fn resolve_config_path(config_path: Option<PathBuf>) -> Result<PathBuf> {
    match config_path {
        Some(path) => Ok(path),
        None => Config::default_path(),
    }
}

fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        let mut config = Config::default();
        config.apply_env_overrides();
        ConfigValidator::validate(&config)?;
        return Ok(config);
    }

    Config::load(path)
}
