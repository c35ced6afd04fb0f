//! Tool registrations
//!
//! A tool is a callable capability known to the gate: its name, parameter
//! schema, and the two trust-override flags policy evaluation consults.

use serde::{Deserialize, Serialize};

/// A registered tool
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    /// Unique tool name
    pub name: String,
    /// Human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON schema of the tool's parameters
    #[serde(default)]
    pub parameters: serde_json::Value,
    /// Bypass the untrusted-context gate entirely for this tool
    #[serde(default)]
    pub allow_usage_when_untrusted_data_is_present: bool,
    /// Results from this tool are trusted unless a policy says otherwise
    #[serde(default)]
    pub data_is_trusted_by_default: bool,
}

impl Tool {
    /// Create a tool registration with default (strict) trust flags.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            parameters: serde_json::Value::Object(Default::default()),
            allow_usage_when_untrusted_data_is_present: false,
            data_is_trusted_by_default: false,
        }
    }

    /// Set the parameter schema.
    pub fn with_parameters(mut self, parameters: serde_json::Value) -> Self {
        self.parameters = parameters;
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Allow this tool even when the conversation context is untrusted.
    pub fn allow_when_untrusted(mut self) -> Self {
        self.allow_usage_when_untrusted_data_is_present = true;
        self
    }

    /// Trust this tool's results unless a policy blocks them.
    pub fn trusted_by_default(mut self) -> Self {
        self.data_is_trusted_by_default = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_tool_is_strict() {
        let tool = Tool::new("email-lookup");
        assert!(!tool.allow_usage_when_untrusted_data_is_present);
        assert!(!tool.data_is_trusted_by_default);
    }

    #[test]
    fn test_builder_flags() {
        let tool = Tool::new("search").allow_when_untrusted().trusted_by_default();
        assert!(tool.allow_usage_when_untrusted_data_is_present);
        assert!(tool.data_is_trusted_by_default);
    }

    #[test]
    fn test_serialization_camel_case() {
        let tool = Tool::new("fetch").with_description("Fetch a URL");
        let json = serde_json::to_string(&tool).unwrap();
        assert!(json.contains("\"allowUsageWhenUntrustedDataIsPresent\""));
        assert!(json.contains("\"dataIsTrustedByDefault\""));
    }

    #[test]
    fn test_deserialization_defaults() {
        let tool: Tool = serde_json::from_str(r#"{"name": "minimal"}"#).unwrap();
        assert_eq!(tool.name, "minimal");
        assert!(!tool.allow_usage_when_untrusted_data_is_present);
    }
}
