//! Global configuration collaborator.
//!
//! The type-annotation attribute name is derived from a configurable scope
//! name plus a fixed `Type` suffix (scope `dojo` → attribute `dojoType`).
//! The script-child `type` prefix and the `jsId` handle attribute are fixed
//! parts of the markup contract and never vary with the scope.

use serde::{Deserialize, Serialize};

/// Reserved prefix on the `type` attribute of declarative script children,
/// e.g. `dojo/connect`, `dojo/method`.
pub const SCRIPT_TYPE_PREFIX: &str = "dojo/";

/// Reserved attribute for global-handle registration.
pub const HANDLE_ATTRIBUTE: &str = "jsId";

const TYPE_ATTRIBUTE_SUFFIX: &str = "Type";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParserConfig {
    /// Scope name the annotation attribute is derived from.
    pub scope_name: String,
    /// When set, the load-sequence callback triggers a full-document parse.
    pub parse_on_load: bool,
    /// Prefix every url-typed attribute value is concatenated onto.
    pub base_url: String,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            scope_name: "dojo".to_string(),
            parse_on_load: false,
            base_url: String::new(),
        }
    }
}

impl ParserConfig {
    pub fn with_scope(scope_name: &str) -> Self {
        ParserConfig {
            scope_name: scope_name.to_string(),
            ..Default::default()
        }
    }

    /// Name of the type-annotation attribute, e.g. `dojoType`.
    pub fn type_attribute(&self) -> String {
        format!("{}{}", self.scope_name, TYPE_ATTRIBUTE_SUFFIX)
    }
}
