//! Log formatting helpers

use serde::Serialize;
use std::fmt::Debug;

/// Renders a value as YAML in tracing output, with a leading newline.
///
/// ```ignore
/// tracing::debug!("board after resync: {}", Pretty(&snapshot));
/// ```
///
/// Falls back to pretty `Debug` output if YAML serialization fails.
pub struct Pretty<T>(pub T);

impl<T: Serialize + Debug> std::fmt::Display for Pretty<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match serde_yaml_ng::to_string(&self.0) {
            Ok(yaml) => write!(f, "\n{}", yaml),
            Err(_) => write!(f, "\n{:#?}", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Lane, LanePosition, SortKey};

    #[test]
    fn test_pretty_renders_yaml() {
        let position = LanePosition {
            status: Lane::Review,
            sort_order: SortKey::new(1500),
            done_at: None,
        };
        let rendered = Pretty(&position).to_string();
        assert!(rendered.starts_with('\n'));
        assert!(rendered.contains("status: review"));
        assert!(rendered.contains("sort_order: 1500"));
    }
}
