//! Source factory - builds the configured reading source

use contracts::{PitBlueprint, ReadingSource, SourceId, SourceType};
use tracing::info;

use crate::error::{IngestionError, Result};
use crate::fixed::FixedSource;
use crate::simulated::{SimulatedConfig, SimulatedSource};

/// Create the reading source described by the blueprint
pub fn create_source(blueprint: &PitBlueprint) -> Result<Box<dyn ReadingSource>> {
    let source_type = blueprint.source.source_type;
    if blueprint.probes.is_empty() {
        return Err(IngestionError::NoProbes {
            source_name: format!("{source_type:?}"),
        });
    }

    let params = &blueprint.source.params;
    let source: Box<dyn ReadingSource> = match source_type {
        SourceType::Simulated => {
            let config = SimulatedConfig::from_params(params)?;
            let probes = blueprint
                .probes
                .iter()
                .map(|p| (SourceId::from(p.id.as_str()), p.role))
                .collect();
            Box::new(SimulatedSource::new(probes, config))
        }
        SourceType::Fixed => Box::new(FixedSource::from_params(&blueprint.source_ids(), params)?),
    };

    info!(
        source = source.name(),
        probes = blueprint.probes.len(),
        "Reading source created"
    );
    Ok(source)
}
