use breathwell_core::{
    cycle_seconds, BuiltinCatalog, Config, CoreError, JsonCatalog, TechniqueProvider,
};
use clap::Subcommand;

use super::describe_phases;

#[derive(Subcommand)]
pub enum TechniqueAction {
    /// List available techniques
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one technique with its parsed phases
    Show {
        /// Technique slug
        slug: String,
    },
}

/// The configured catalog, or the built-in one if none is set or it fails to load.
pub fn load_catalog(config: &Config) -> Box<dyn TechniqueProvider> {
    let Some(path) = config.catalog_path.as_deref() else {
        return Box::new(BuiltinCatalog::new());
    };
    match JsonCatalog::open(path) {
        Ok(catalog) => Box::new(catalog),
        Err(err) => {
            tracing::warn!(
                path,
                error = %err,
                "technique catalog failed to load, using built-in list"
            );
            Box::new(BuiltinCatalog::new())
        }
    }
}

pub fn run(action: TechniqueAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let catalog = load_catalog(&config);

    match action {
        TechniqueAction::List { json } => {
            let techniques = catalog.fetch_techniques();
            if json {
                println!("{}", serde_json::to_string_pretty(&techniques)?);
                return Ok(());
            }
            for t in &techniques {
                let pattern = match t.phases() {
                    Ok(phases) if !phases.is_empty() => describe_phases(&phases),
                    Ok(_) => "-".to_string(),
                    Err(err) => format!("({err})"),
                };
                println!("{:<22} {:<22} {}", t.id, t.name, pattern);
            }
        }
        TechniqueAction::Show { slug } => {
            let technique = catalog
                .find_by_slug(&slug)
                .ok_or_else(|| CoreError::UnknownTechnique(slug.clone()))?;
            let phases = technique.phases()?;
            let out = serde_json::json!({
                "technique": technique,
                "phases": phases,
                "cycle_secs": cycle_seconds(&phases),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
    }
    Ok(())
}
