//! Static documentation resources served through `readResource`

use std::sync::Arc;

use rust_mcp_sdk::schema::TextResourceContents;
use serde_json::json;

use crate::errors::AppError;
use crate::registry::{ResourceDescriptor, ResourceHandler};

pub const INTERPRETING_REPORTS_URI: &str = "docs://interpreting-reports";
pub const INTERPRETING_REPORTS_TEXT: &str = "Reports from this MCP include an array of text that informs the growth over a specified number of days. It's unstructured text but is consistent so parsing the information can be based on looking at a single line to understand where the data is.";

pub struct StaticTextResource {
    pub mime_type: &'static str,
    pub text: &'static str,
}

impl ResourceHandler for StaticTextResource {
    fn read(&self, uri: &str) -> Result<Vec<TextResourceContents>, AppError> {
        Ok(vec![TextResourceContents {
            meta: None,
            mime_type: Some(self.mime_type.to_string()),
            text: self.text.to_string(),
            uri: uri.to_string(),
        }])
    }
}

pub fn interpreting_reports_resource() -> ResourceDescriptor {
    ResourceDescriptor {
        name: "interpreting-reports".to_string(),
        uri: INTERPRETING_REPORTS_URI.to_string(),
        metadata: json!({ "mimeType": "text/plain" }),
        handler: Arc::new(StaticTextResource {
            mime_type: "text/plain",
            text: INTERPRETING_REPORTS_TEXT,
        }),
    }
}
