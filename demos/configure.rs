use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::Result;

use fm_config::bdd::BddConfig;
use fm_config::configuration::{ConfigurationState, FeatureState};
use fm_config::error::ConfigurationError;
use fm_config::feature::FeatureId;
use fm_config::model::FeatureModel;
use fm_config::source::ModelSource;

#[derive(Parser)]
#[command(author, version, about = "Interactive feature-model configurator")]
struct Cli {
    /// Feature model (JSON)
    #[arg(short, long, value_name = "FILE")]
    model: PathBuf,

    /// Configuration to start from (JSON, as written with `--output`)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Where to write the edited configuration, if it is complete
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Unique table size (in bits, so the initial size is `2^size` nodes)
    #[arg(long, value_name = "INT")]
    bdd_size: Option<usize>,

    /// Computed table size (in bits)
    #[arg(long, value_name = "INT")]
    cache_size: Option<usize>,

    /// Maximum number of diagram nodes
    #[arg(long, value_name = "INT")]
    max_nodes: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show statistics about the feature model
    Stats,

    /// Show the state of every feature
    Show,

    /// Select features, then show the result
    Select { names: Vec<String> },

    /// Deselect features, then show the result
    Deselect { names: Vec<String> },

    /// Drop manual decisions, then show the result
    Reset { names: Vec<String> },

    /// Override the value of a valued feature, then show the result
    Value { name: String, value: String },
}

fn main() -> Result<()> {
    color_eyre::install()?;

    simplelog::TermLogger::init(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let cli = Cli::parse();

    let source: ModelSource = serde_json::from_str(&fs::read_to_string(&cli.model)?)?;
    let mut bdd_config = BddConfig::default();
    if let Some(bits) = cli.bdd_size {
        bdd_config = bdd_config.with_storage_bits(bits);
    }
    if let Some(bits) = cli.cache_size {
        bdd_config = bdd_config.with_cache_bits(bits);
    }
    if let Some(max_nodes) = cli.max_nodes {
        bdd_config = bdd_config.with_max_nodes(max_nodes);
    }
    let model = FeatureModel::load_with_config(&source, &bdd_config)?;

    let config = match &cli.config {
        Some(path) => model.deserialize(&fs::read_to_string(path)?)?,
        None => model.empty_configuration(),
    };

    let config = match cli.command {
        Commands::Stats => {
            stats(&model);
            return Ok(());
        }
        Commands::Show => config,
        Commands::Select { names } => edit(&model, config, &names, ConfigurationState::with_selection)?,
        Commands::Deselect { names } => edit(&model, config, &names, ConfigurationState::with_deselection)?,
        Commands::Reset { names } => edit(&model, config, &names, ConfigurationState::with_reset)?,
        Commands::Value { name, value } => config.with_value(model.feature_id(&name)?, value)?,
    };
    show(&config);

    if let Some(output) = &cli.output {
        fs::write(output, config.serialize()?)?;
        println!("Saved configuration to {}", output.display());
    }

    Ok(())
}

fn edit(
    model: &Arc<FeatureModel>,
    mut config: ConfigurationState,
    names: &[String],
    step: fn(&ConfigurationState, FeatureId) -> Result<ConfigurationState, ConfigurationError>,
) -> Result<ConfigurationState> {
    for name in names {
        config = step(&config, model.feature_id(name)?)?;
    }
    Ok(config)
}

fn stats(model: &FeatureModel) {
    let tree = model.tree();
    let engine = model.engine();
    let names = |ids: Vec<FeatureId>| {
        ids.into_iter()
            .map(|id| tree[id].name().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    };

    println!("=== Feature Model Statistics ===");
    println!("Root: {}", tree.root().name());
    println!("Features: {}", tree.len());
    println!("Cross-tree constraints: {}", tree.constraints().len());
    println!("Clauses: {}", engine.formula().num_clauses());
    println!("Diagram nodes: {}", engine.formula().size());
    println!("Void: {}", engine.is_void());
    println!("Valid configurations: {}", engine.count_configurations());
    println!("Core features: {}", names(engine.core_features()));
    println!("Dead features: {}", names(engine.dead_features()));
}

fn show(config: &ConfigurationState) {
    let tree = config.model().tree();
    for feature in tree.features() {
        let id = feature.id();
        let depth = std::iter::successors(feature.parent(), |&p| tree[p].parent()).count();
        let mark = match config.state(id) {
            FeatureState::Enabled => "[x]",
            FeatureState::Disabled => "[ ]",
            FeatureState::Undetermined => "[?]",
        };
        let how = if config.is_manual(id) {
            " (manual)"
        } else if config.is_locked(id) {
            " (auto)"
        } else {
            ""
        };
        let value = config.value(id).map(|v| format!(" = {}", v)).unwrap_or_default();
        println!("{}{} {}{}{}", "  ".repeat(depth), mark, feature.name(), value, how);
    }
    println!();
    println!("valid: {}, complete: {}", config.is_valid(), config.is_complete());
    if !config.is_valid() {
        eprintln!("The manual decisions contradict the model");
    }
}
