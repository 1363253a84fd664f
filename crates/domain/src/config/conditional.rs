use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Domain to upstream-endpoints mapping for conditional routing. The key
/// `"."` routes single-label (unqualified) names.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ConditionalConfig {
    #[serde(default)]
    pub mapping: HashMap<String, Vec<String>>,
}
