use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use contact_graph::graph::{
    Filter, GraphModelBuilder, NoEnrichment, SessionOptions, StaticCatalogue,
};

use crate::Args;

#[derive(Clone, Debug)]
pub enum Enrichment {
    Builtin,
    Catalogue(StaticCatalogue),
    Disabled,
}

impl Enrichment {
    pub fn builder(&self) -> GraphModelBuilder {
        match self {
            Self::Builtin => GraphModelBuilder::default(),
            Self::Catalogue(catalogue) => GraphModelBuilder::new(catalogue.clone()),
            Self::Disabled => GraphModelBuilder::new(NoEnrichment),
        }
    }
}

/// Everything the window needs to (re)load records and mount a session.
#[derive(Clone, Debug)]
pub struct Settings {
    pub records_path: PathBuf,
    pub filter: Filter,
    pub enrichment: Enrichment,
    pub options: SessionOptions,
}

impl Settings {
    pub fn from_args(args: Args) -> Result<Self> {
        let mut options = match &args.config {
            Some(path) => load_options(path)?,
            None => SessionOptions::default(),
        };
        if args.retain_positions {
            options.retain_positions = true;
        }

        let enrichment = if args.no_enrichment {
            Enrichment::Disabled
        } else if let Some(path) = &args.catalogue {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read link catalogue {}", path.display()))?;
            let catalogue = StaticCatalogue::from_json(&raw)
                .with_context(|| format!("failed to parse {}", path.display()))?;
            tracing::info!(entries = catalogue.len(), "using custom link catalogue");
            Enrichment::Catalogue(catalogue)
        } else {
            Enrichment::Builtin
        };

        Ok(Self {
            records_path: args.records,
            filter: Filter::new(args.categories, args.min_strength.min(100)),
            enrichment,
            options,
        })
    }
}

fn load_options(path: &Path) -> Result<SessionOptions> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid config in {}", path.display()))
}
