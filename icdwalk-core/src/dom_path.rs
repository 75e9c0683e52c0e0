//! Human readable CSS-like paths for DOM nodes, used in diagnostics only.
//!
//! Collecting the ancestry is the automation layer's job (see
//! [`crate::node::TreeNode::ancestry`]); this module only formats it.

use serde::{Deserialize, Serialize};

/// One step of a node's ancestry, innermost first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ancestor {
    /// Tag name as reported by the DOM (any case).
    pub tag: String,
    /// Zero-based rank among the parent's children with the same tag.
    pub index: usize,
    /// Number of the parent's children sharing this tag.
    pub count: usize,
    /// The parent of this element is a shadow root; resolution continued
    /// from its host.
    #[serde(default)]
    pub in_shadow_root: bool,
}

impl Ancestor {
    pub fn new(tag: &str, index: usize, count: usize) -> Self {
        Self {
            tag: tag.to_string(),
            index,
            count,
            in_shadow_root: false,
        }
    }

    pub fn in_shadow_root(mut self) -> Self {
        self.in_shadow_root = true;
        self
    }
}

/// Format an ancestry chain (node first, `html` last) as
/// `body > div:nth-of-type(2) > x-host::shadow > div`.
///
/// Returns `None` for an empty chain.
pub fn resolve(chain: &[Ancestor]) -> Option<String> {
    if chain.is_empty() {
        return None;
    }

    let mut segments = Vec::with_capacity(chain.len());
    let mut host_of_shadow = false;
    for step in chain {
        let mut segment = step.tag.to_lowercase();
        if host_of_shadow {
            segment.push_str("::shadow");
        }
        if step.count > 1 {
            segment.push_str(&format!(":nth-of-type({})", step.index + 1));
        }
        segments.push(segment);
        host_of_shadow = step.in_shadow_root;
    }

    // outermost segment is the html element
    segments.pop();
    segments.reverse();
    Some(segments.join(" > "))
}
