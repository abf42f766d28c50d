use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use ida_protocol::{CandidateMatch, CategoryMatches};
use ida_resolver::{load_config, load_effective_config, Resolver, ResolverConfig, StrategyKind};
use serde::Deserialize;
use serde_json::json;

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum StrategyArg {
    ClosedForm,
    Exhaustive,
}

impl From<StrategyArg> for StrategyKind {
    fn from(value: StrategyArg) -> Self {
        match value {
            StrategyArg::ClosedForm => StrategyKind::ClosedForm,
            StrategyArg::Exhaustive => StrategyKind::Exhaustive,
        }
    }
}

#[derive(Args)]
pub struct ResolveArgs {
    /// JSON file: an array of candidate matches or an object keyed by category
    #[arg(long)]
    pub input: PathBuf,
    /// Resolver config (TOML); defaults to IDA_CONFIG or configs/resolver.toml
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Override the configured search strategy
    #[arg(long, value_enum)]
    pub strategy: Option<StrategyArg>,
    /// Also print the score breakdown and diagnostics
    #[arg(long)]
    pub explain: bool,
}

/// Accepted input layouts.
#[derive(Deserialize)]
#[serde(untagged)]
enum InputDoc {
    List(Vec<CandidateMatch>),
    ByCategory(CategoryMatches),
}

impl From<InputDoc> for CategoryMatches {
    fn from(doc: InputDoc) -> Self {
        match doc {
            InputDoc::List(list) => list.into_iter().collect(),
            InputDoc::ByCategory(matches) => matches,
        }
    }
}

fn read_input(path: &Path) -> Result<CategoryMatches> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading candidate matches from {}", path.display()))?;
    let doc: InputDoc = serde_json::from_str(&text)
        .with_context(|| format!("parsing candidate matches in {}", path.display()))?;
    let matches: CategoryMatches = doc.into();
    tracing::debug!(path = %path.display(), matches = matches.len(), "loaded candidate matches");
    Ok(matches)
}

fn effective_config(args: &ResolveArgs) -> Result<ResolverConfig> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => load_effective_config(),
    };
    if let Some(strategy) = args.strategy {
        config.search.strategy = strategy.into();
    }
    Ok(config)
}

pub fn run(args: ResolveArgs) -> Result<()> {
    let matches = read_input(&args.input)?;
    let resolver = Resolver::new(effective_config(&args)?)?;
    let resolution = resolver.resolve(&matches)?;
    let output = if args.explain {
        json!({
            "situation": resolution.situation,
            "explanation": resolution.explain(),
        })
    } else {
        serde_json::to_value(&resolution.situation)?
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
