use docqa::app;
use docqa::cli::{Cli, Commands, ConfigAction};
use docqa::config::{Config, ConfigValidator};
use docqa::error::{QaError, Result};
use docqa::store::DocumentStore;
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    // Initialize logging
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Ask {
            run,
            retriever_top_k,
            details,
        } => {
            let mut config = load_config(cli.config, cli.profile)?;
            run.apply(&mut config);
            if let Some(k) = run.top_k {
                config.reader.top_k = k;
            }
            if let Some(k) = retriever_top_k {
                config.retriever.bm25_top_k = k;
            }
            if let Some(details) = details {
                config.output.details = details;
            }
            ConfigValidator::validate(&config)?;

            let stats = app::run_ask(&config, &mut std::io::stdin().lock(), &mut std::io::stdout())?;
            tracing::debug!("Answered {} questions", stats.queries);
        }
        Commands::Search {
            run,
            rebuild,
            details,
        } => {
            let mut config = load_config(cli.config, cli.profile)?;
            run.apply(&mut config);
            if let Some(k) = run.top_k {
                config.retriever.embedding_top_k = k;
            }
            if let Some(details) = details {
                config.output.details = details;
            }
            ConfigValidator::validate(&config)?;

            app::run_search(
                &config,
                rebuild,
                &mut std::io::stdin().lock(),
                &mut std::io::stdout(),
            )?;
        }
        Commands::Read { run, details } => {
            let mut config = load_config(cli.config, cli.profile)?;
            run.apply(&mut config);
            if let Some(k) = run.top_k {
                config.reader.standalone_top_k = k;
            }
            if let Some(details) = details {
                config.output.details = details;
            }
            ConfigValidator::validate(&config)?;

            app::run_read(&config, &mut std::io::stdin().lock(), &mut std::io::stdout())?;
        }
        Commands::Index { data_dir } => {
            let mut config = load_config(cli.config, cli.profile)?;
            if let Some(dir) = data_dir {
                config.data.doc_dir = dir;
            }
            ConfigValidator::validate(&config)?;

            let embedder = app::build_embedder(&config)?;
            let store = app::build_index(&config, &embedder)?;

            println!("✓ Index written to {}", config.store.index_path.display());
            println!("  Documents:  {}", store.get_document_count());
            println!("  Embeddings: {}", store.get_embedding_count());
            println!("  Model:      {}", embedder.model_name());
        }
        Commands::Config { action } => {
            cmd_config(cli.config, cli.profile, action)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "docqa=debug" } else { "docqa=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_config(
    config_path: Option<PathBuf>,
    profile: Option<String>,
    action: ConfigAction,
) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(config_path, profile)?;
            let toml_str = toml::to_string_pretty(&config)?;
            println!("{}", toml_str);
        }
        ConfigAction::Validate { file } => {
            let path = match file.or(config_path) {
                Some(path) => path,
                None => Config::default_path()?,
            };
            let config = Config::load(&path)?;
            println!("✓ Configuration is valid");
            println!("  Schema version: {}", config.meta.schema_version);
        }
        ConfigAction::Init { force } => {
            let path = match config_path {
                Some(path) => path,
                None => Config::default_path()?,
            };

            if path.exists() && !force {
                println!("Configuration file already exists at: {}", path.display());
                println!("Use --force to overwrite");
                return Ok(());
            }

            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|e| {
                    QaError::io(e, format!("Failed to create config directory: {:?}", parent))
                })?;
            }

            Config::default().save(&path)?;
            println!("✓ Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}

fn load_config(config_path: Option<PathBuf>, profile: Option<String>) -> Result<Config> {
    let path = match config_path {
        Some(path) => path,
        None => Config::default_path()?,
    };

    if !path.exists() {
        tracing::warn!(
            "Config file not found at {}, using defaults. Run 'docqa config init' to create one.",
            path.display()
        );
        let mut config = Config::default();
        config.apply_env_overrides();
        if let Some(profile) = profile {
            config.apply_profile(&profile)?;
        }
        return Ok(config);
    }

    if let Some(profile) = profile {
        Config::load_with_profile(&path, &profile)
    } else {
        Config::load(&path)
    }
}
