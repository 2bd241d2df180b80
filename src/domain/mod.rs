//! Capabilities published through the registry
//!
//! Holds the report tool and the documentation resource that describes its output.

pub mod resources;
pub mod tools;

use crate::registry::{CapabilityRegistry, RegistryError};

/// Builds the registry with every capability this server ships.
pub fn default_registry() -> Result<CapabilityRegistry, RegistryError> {
    Ok(CapabilityRegistry::builder()
        .register_tool(tools::analysis_report_tool())?
        .register_resource(resources::interpreting_reports_resource())?
        .build())
}
