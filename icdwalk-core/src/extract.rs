use crate::error::Result;
use crate::model::{CategoryMap, DiseaseStore};
use crate::node::{TreeNode, selectors};
use tracing::{debug, warn};

/// Post-processing applied by [`get_sub_label`] once the code is known.
pub enum SubLabelHook<'a> {
    /// Return the code untouched.
    None,
    /// Record the label under its code, see [`save_categories`].
    SaveCategory(&'a mut CategoryMap),
}

/// A label element together with the code rendered inside it.
pub struct SubLabel<N> {
    pub code: String,
    pub node: N,
}

/// Outcome of reading a disease label that was not skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    pub code: String,
    pub title: String,
    /// False when the label had no code and nothing was stored.
    pub recorded: bool,
}

/// Trimmed rendered text of `node`.
pub async fn get_label<N: TreeNode>(node: &N) -> Result<String> {
    Ok(node.text().await?.trim().to_string())
}

/// Label text with the code the widget renders in front of it removed.
/// The code must stand alone: `1A001 x` keeps its text under code `1A00`.
pub fn strip_code(label: &str, code: &str) -> String {
    match label.strip_prefix(code) {
        Some(rest) if !code.is_empty() && (rest.is_empty() || rest.starts_with(char::is_whitespace)) => {
            rest.trim_start().to_string()
        }
        _ => label.to_string(),
    }
}

async fn read_code<N: TreeNode>(label: &N) -> Result<String> {
    match label.query(selectors::CODE).await? {
        Some(code) => get_label(&code).await,
        None => Ok(String::new()),
    }
}

/// Locate the item's not-yet-adopted label and read its code.
///
/// `None` means there is no further label to read.
pub async fn get_sub_label<N: TreeNode>(
    item: &N,
    hook: SubLabelHook<'_>,
) -> Result<Option<SubLabel<N>>> {
    let Some(node) = item.query(selectors::LABEL_UNADOPTED).await? else {
        return Ok(None);
    };
    let code = read_code(&node).await?;
    let code = match hook {
        SubLabelHook::None => code,
        SubLabelHook::SaveCategory(categories) => save_categories(categories, &node, code).await?,
    };
    Ok(Some(SubLabel { code, node }))
}

/// Store the label's title under `code` and hand the code back.
pub async fn save_categories<N: TreeNode>(
    categories: &mut CategoryMap,
    label: &N,
    code: String,
) -> Result<String> {
    let title = strip_code(&get_label(label).await?, &code);
    debug!("Category {} => {}", code, title);
    categories.insert(code.clone(), title);
    Ok(code)
}

/// Read the disease under `item` and upsert it into `diseases`.
///
/// Returns `None` when the item's label is adopted (already processed
/// elsewhere) and the caller should not descend into it.
pub async fn save_disease<N: TreeNode>(
    diseases: &mut DiseaseStore,
    item: &N,
    parent_code: &str,
    category_code: &str,
) -> Result<Option<Extracted>> {
    let Some(SubLabel { code, node }) = get_sub_label(item, SubLabelHook::None).await? else {
        return Ok(None);
    };
    let title = strip_code(&get_label(&node).await?, &code);

    if code.is_empty() {
        warn!(
            "Label without code under {} (category {}): '{}', not recorded",
            parent_code, category_code, title
        );
        return Ok(Some(Extracted {
            code,
            title,
            recorded: false,
        }));
    }

    diseases.upsert(&code, &title, Some(category_code));
    Ok(Some(Extracted {
        code,
        title,
        recorded: true,
    }))
}
