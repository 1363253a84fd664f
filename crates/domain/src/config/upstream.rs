use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Group name used when no explicit group applies.
pub const DEFAULT_UPSTREAM_GROUP: &str = "default";

/// Named groups of upstream endpoint strings. Endpoints stay as strings
/// here and are parsed into [`crate::UpstreamSpec`]s when the resolvers
/// that use them are constructed.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UpstreamGroups {
    #[serde(default)]
    pub groups: HashMap<String, Vec<String>>,
}

impl UpstreamGroups {
    pub fn default_group(&self) -> Option<&[String]> {
        self.groups.get(DEFAULT_UPSTREAM_GROUP).map(Vec::as_slice)
    }
}
