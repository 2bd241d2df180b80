//! Static table of the tools and resources this server exposes
//!
//! The registry is assembled once at startup through [`RegistryBuilder`] and
//! is read-only afterwards; it is shared between requests behind an `Arc`.

use std::fmt;
use std::sync::Arc;

use rust_mcp_sdk::schema::{ContentBlock, TextResourceContents};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityKind {
    Tool,
    Resource,
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tool => f.write_str("tool"),
            Self::Resource => f.write_str("resource"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("duplicate {kind} '{name}'")]
    Duplicate { kind: CapabilityKind, name: String },
}

pub trait ToolHandler: Send + Sync {
    fn call(&self, args: Map<String, Value>) -> Result<Vec<ContentBlock>, AppError>;
}

pub trait ResourceHandler: Send + Sync {
    fn read(&self, uri: &str) -> Result<Vec<TextResourceContents>, AppError>;
}

pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
    pub handler: Arc<dyn ToolHandler>,
}

pub struct ResourceDescriptor {
    pub name: String,
    pub uri: String,
    pub metadata: Value,
    pub handler: Arc<dyn ResourceHandler>,
}

/// Entry of the `listTools` result.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ToolSummary {
    pub name: String,
    pub description: String,
    pub schema: Value,
}

/// Entry of the `listResources` result.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ResourceSummary {
    pub name: String,
    pub uri: String,
    pub metadata: Value,
}

impl ToolDescriptor {
    pub fn summary(&self) -> ToolSummary {
        ToolSummary {
            name: self.name.clone(),
            description: self.description.clone(),
            schema: self.input_schema.clone(),
        }
    }
}

impl ResourceDescriptor {
    pub fn summary(&self) -> ResourceSummary {
        ResourceSummary {
            name: self.name.clone(),
            uri: self.uri.clone(),
            metadata: self.metadata.clone(),
        }
    }
}

#[derive(Default)]
pub struct RegistryBuilder {
    tools: Vec<ToolDescriptor>,
    resources: Vec<ResourceDescriptor>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_tool(mut self, descriptor: ToolDescriptor) -> Result<Self, RegistryError> {
        if self.tools.iter().any(|tool| tool.name == descriptor.name) {
            return Err(RegistryError::Duplicate {
                kind: CapabilityKind::Tool,
                name: descriptor.name,
            });
        }
        self.tools.push(descriptor);
        Ok(self)
    }

    /// Resources are keyed by URI; the display name may repeat.
    pub fn register_resource(
        mut self,
        descriptor: ResourceDescriptor,
    ) -> Result<Self, RegistryError> {
        if self
            .resources
            .iter()
            .any(|resource| resource.uri == descriptor.uri)
        {
            return Err(RegistryError::Duplicate {
                kind: CapabilityKind::Resource,
                name: descriptor.uri,
            });
        }
        self.resources.push(descriptor);
        Ok(self)
    }

    pub fn build(self) -> CapabilityRegistry {
        CapabilityRegistry {
            tools: self.tools,
            resources: self.resources,
        }
    }
}

pub struct CapabilityRegistry {
    tools: Vec<ToolDescriptor>,
    resources: Vec<ResourceDescriptor>,
}

impl CapabilityRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    pub fn tool(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.iter().find(|tool| tool.name == name)
    }

    pub fn resource(&self, uri: &str) -> Option<&ResourceDescriptor> {
        self.resources.iter().find(|resource| resource.uri == uri)
    }

    pub fn list_tools(&self) -> Vec<ToolSummary> {
        self.tools.iter().map(ToolDescriptor::summary).collect()
    }

    pub fn list_resources(&self) -> Vec<ResourceSummary> {
        self.resources
            .iter()
            .map(ResourceDescriptor::summary)
            .collect()
    }
}
