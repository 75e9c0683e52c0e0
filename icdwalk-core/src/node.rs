use crate::dom_path::Ancestor;
use crate::error::Result;

/// CSS selectors for the YUI TreeView markup the ICD-11 browser renders.
pub mod selectors {
    /// Table of the classification's root node.
    pub const ROOT_TABLE: &str = "#ygtvtableel1";
    /// Any rendered item below the root.
    pub const ROOT_ITEMS: &str = "#ygtvc1 div.ygtvitem";
    /// Top-level categories (chapters).
    pub const TOP_CATEGORIES: &str = "#ygtvc1 > div.ygtvitem";
    /// Expand toggle of a collapsed item that has children, not yet marked
    /// adopted. YUI draws a spacer on every row; the cell class tells them
    /// apart (`ygtvtp`/`ygtvlp` collapsed, `ygtvtn`/`ygtvln` leaf, `h` while
    /// hovered).
    pub const TOGGLE_COLLAPSED: &str = "table td.ygtvtp > a.ygtvspacer:not(.adopted), \
        table td.ygtvlp > a.ygtvspacer:not(.adopted), \
        table td.ygtvtph > a.ygtvspacer:not(.adopted), \
        table td.ygtvlph > a.ygtvspacer:not(.adopted)";
    /// Items rendered inside a node's children container.
    pub const CHILD_ITEMS: &str = ".ygtvchildren div.ygtvitem";
    pub const LABEL: &str = "table .ygtvcontent a.ygtvlabel";
    pub const LABEL_UNADOPTED: &str = "table .ygtvcontent a.ygtvlabel:not(.adopted)";
    pub const CODE: &str = ".icode";
}

/// An element handle owned by the browser automation layer.
///
/// Handles are only valid for the traversal step that obtained them; the
/// walker never keeps one across unrelated awaits.
#[allow(async_fn_in_trait)]
pub trait TreeNode: Sized {
    /// First descendant matching `selector`, if any.
    async fn query(&self, selector: &str) -> Result<Option<Self>>;

    /// All descendants matching `selector`, in document order.
    async fn query_all(&self, selector: &str) -> Result<Vec<Self>>;

    /// Rendered text of the element, untrimmed.
    async fn text(&self) -> Result<String>;

    /// Dispatch a click on the element.
    async fn click(&self) -> Result<()>;

    /// The element's ancestry, innermost first, up to the `html` element.
    async fn ancestry(&self) -> Result<Vec<Ancestor>>;
}
