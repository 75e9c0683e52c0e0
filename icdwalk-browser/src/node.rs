use crate::error::automation;
use chromiumoxide::element::Element;
use icdwalk_core::dom_path::Ancestor;
use icdwalk_core::{HarvestError, Result, TreeNode};

/// Collects the ancestry of `this` for `dom_path::resolve`, crossing shadow
/// roots into their host. Returned as a JSON string so it survives CDP
/// without `returnByValue`.
const ANCESTRY_JS: &str = r#"function() {
    const chain = [];
    let el = this;
    while (el && el.parentNode) {
        const parent = el.parentNode;
        let index = 0;
        let count = 0;
        for (const sib of parent.childNodes) {
            if (sib.nodeName === el.nodeName) {
                if (sib === el) {
                    index = count;
                }
                count++;
            }
        }
        const step = { tag: el.nodeName, index: index, count: count, in_shadow_root: false };
        chain.push(step);
        el = parent;
        if (el.nodeType === 11) {
            step.in_shadow_root = true;
            el = el.host;
        }
    }
    return JSON.stringify(chain);
}"#;

const CLICK_JS: &str = "function() { this.click(); }";

/// A live DOM element in the automated page.
#[derive(Debug)]
pub struct CdpNode {
    element: Element,
}

impl CdpNode {
    pub fn new(element: Element) -> Self {
        Self { element }
    }

    async fn call(&self, function: &str) -> Result<Option<serde_json::Value>> {
        let returns = self
            .element
            .call_js_fn(function, false)
            .await
            .map_err(automation)?;
        if let Some(exception) = returns.exception_details {
            return Err(HarvestError::Automation(format!(
                "script threw: {}",
                exception.text
            )));
        }
        Ok(returns.result.value)
    }
}

impl TreeNode for CdpNode {
    async fn query(&self, selector: &str) -> Result<Option<Self>> {
        let found = self
            .element
            .find_elements(selector)
            .await
            .map_err(automation)?;
        Ok(found.into_iter().next().map(CdpNode::new))
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<Self>> {
        let found = self
            .element
            .find_elements(selector)
            .await
            .map_err(automation)?;
        Ok(found.into_iter().map(CdpNode::new).collect())
    }

    async fn text(&self) -> Result<String> {
        let text = self.element.inner_text().await.map_err(automation)?;
        Ok(text.unwrap_or_default())
    }

    async fn click(&self) -> Result<()> {
        self.call(CLICK_JS).await?;
        Ok(())
    }

    async fn ancestry(&self) -> Result<Vec<Ancestor>> {
        let value = self.call(ANCESTRY_JS).await?;
        let json = value
            .as_ref()
            .and_then(|v| v.as_str())
            .ok_or_else(|| HarvestError::Automation("ancestry script returned nothing".into()))?;
        Ok(serde_json::from_str(json)?)
    }
}
