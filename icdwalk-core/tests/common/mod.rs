// Synthetic YUI TreeView widget for exercising the walker without a browser.
//
// The page is parsed once with `scraper`; lazy rendering is simulated by
// hiding every element inside a `div.ygtvchildren` whose owning item has
// not been expanded by a click on its toggle.

#![allow(dead_code)]

use icdwalk_core::dom_path::Ancestor;
use icdwalk_core::error::{HarvestError, Result};
use icdwalk_core::node::{TreeNode, selectors};
use scraper::{ElementRef, Html, Selector};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

#[derive(Clone)]
pub struct Item {
    pub code: String,
    pub title: String,
    pub adopted: bool,
    pub children: Vec<Item>,
    /// Render a collapsed toggle that never produces children.
    pub broken_toggle: bool,
}

pub fn leaf(code: &str, title: &str) -> Item {
    Item {
        code: code.to_string(),
        title: title.to_string(),
        adopted: false,
        children: Vec::new(),
        broken_toggle: false,
    }
}

pub fn branch(code: &str, title: &str, children: Vec<Item>) -> Item {
    Item {
        children,
        ..leaf(code, title)
    }
}

pub fn adopted(item: Item) -> Item {
    Item {
        adopted: true,
        ..item
    }
}

/// YUI class of the toggle cell: `t`/`l` for a middle or last sibling,
/// `p` for a collapsed item with children, `n` for a leaf.
fn toggle_cell_class(item: &Item, last: bool) -> String {
    let position = if last { "l" } else { "t" };
    let state = if !item.children.is_empty() || item.broken_toggle {
        "p"
    } else {
        "n"
    };
    format!("ygtv{}{}", position, state)
}

fn render_item(item: &Item, last: bool, html: &mut String) {
    let adopted = if item.adopted { " adopted" } else { "" };
    html.push_str(r#"<div class="ygtvitem"><table><tr>"#);
    html.push_str(&format!(
        r#"<td class="ygtvcell {}"><a class="ygtvspacer{}">&#160;</a></td>"#,
        toggle_cell_class(item, last),
        adopted
    ));
    html.push_str(&format!(
        r#"<td class="ygtvcell ygtvcontent"><a class="ygtvlabel{}"><span class="icode">{}</span> {}</a></td>"#,
        adopted, item.code, item.title
    ));
    html.push_str(r#"</tr></table><div class="ygtvchildren">"#);
    render_items(&item.children, html);
    html.push_str("</div></div>");
}

fn render_items(items: &[Item], html: &mut String) {
    for (i, item) in items.iter().enumerate() {
        render_item(item, i + 1 == items.len(), html);
    }
}

pub fn render_page(categories: &[Item]) -> String {
    let mut html = String::from(
        r#"<html><body><div id="ygtvtableel1"></div><div id="ygtvc1" class="ygtvroot">"#,
    );
    render_items(categories, &mut html);
    html.push_str("</div></body></html>");
    html
}

/// Elements are addressed by their position in document order.
type Id = usize;

fn has_class(el: ElementRef<'_>, class: &str) -> bool {
    el.value().classes().any(|c| c == class)
}

pub struct Widget {
    html: Html,
    expanded: RefCell<HashSet<Id>>,
    /// Queries left before a freshly expanded item shows its children.
    pending: RefCell<HashMap<Id, usize>>,
    render_lag: usize,
    clicks: Cell<usize>,
}

impl Widget {
    pub fn new(categories: &[Item]) -> Rc<Self> {
        Self::with_render_lag(categories, 0)
    }

    /// Children appear only after `lag` further queries following a click.
    pub fn with_render_lag(categories: &[Item], lag: usize) -> Rc<Self> {
        Rc::new(Self {
            html: Html::parse_document(&render_page(categories)),
            expanded: RefCell::new(HashSet::new()),
            pending: RefCell::new(HashMap::new()),
            render_lag: lag,
            clicks: Cell::new(0),
        })
    }

    pub fn clicks(&self) -> usize {
        self.clicks.get()
    }

    pub fn categories(self: &Rc<Self>) -> Vec<WidgetNode> {
        let selector = Selector::parse(selectors::TOP_CATEGORIES).unwrap();
        self.html
            .select(&selector)
            .map(|el| WidgetNode {
                widget: Rc::clone(self),
                id: self.id_of(el),
            })
            .collect()
    }

    fn elements(&self) -> impl Iterator<Item = ElementRef<'_>> {
        self.html
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
    }

    fn element(&self, id: Id) -> ElementRef<'_> {
        self.elements().nth(id).unwrap()
    }

    fn id_of(&self, el: ElementRef<'_>) -> Id {
        self.elements().position(|e| e == el).unwrap()
    }

    fn tick(&self) {
        let mut pending = self.pending.borrow_mut();
        let mut expanded = self.expanded.borrow_mut();
        pending.retain(|id, left| {
            if *left == 0 {
                expanded.insert(*id);
                false
            } else {
                *left -= 1;
                true
            }
        });
    }

    fn is_rendered(&self, el: ElementRef<'_>) -> bool {
        let expanded = self.expanded.borrow();
        el.ancestors().filter_map(ElementRef::wrap).all(|ancestor| {
            if !has_class(ancestor, "ygtvchildren") {
                return true;
            }
            match ancestor.parent().and_then(ElementRef::wrap) {
                Some(owner) => expanded.contains(&self.id_of(owner)),
                None => true,
            }
        })
    }

    fn select(&self, scope: Id, selector: &str) -> Result<Vec<Id>> {
        self.tick();
        let selector = Selector::parse(selector)
            .map_err(|e| HarvestError::Automation(format!("bad selector {}: {:?}", selector, e)))?;
        Ok(self
            .element(scope)
            .select(&selector)
            .filter(|el| self.is_rendered(*el))
            .map(|el| self.id_of(el))
            .collect())
    }
}

#[derive(Clone)]
pub struct WidgetNode {
    widget: Rc<Widget>,
    id: Id,
}

impl WidgetNode {
    fn wrap(&self, id: Id) -> Self {
        Self {
            widget: Rc::clone(&self.widget),
            id,
        }
    }
}

impl TreeNode for WidgetNode {
    async fn query(&self, selector: &str) -> Result<Option<Self>> {
        let ids = self.widget.select(self.id, selector)?;
        Ok(ids.first().map(|id| self.wrap(*id)))
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<Self>> {
        let ids = self.widget.select(self.id, selector)?;
        Ok(ids.into_iter().map(|id| self.wrap(id)).collect())
    }

    async fn text(&self) -> Result<String> {
        Ok(self.widget.element(self.id).text().collect())
    }

    async fn click(&self) -> Result<()> {
        self.widget.clicks.set(self.widget.clicks.get() + 1);
        let el = self.widget.element(self.id);
        let owner = el
            .ancestors()
            .filter_map(ElementRef::wrap)
            .find(|a| has_class(*a, "ygtvitem"))
            .ok_or_else(|| HarvestError::ElementNotFound("toggle owner".into()))?;

        let has_children = owner
            .children()
            .filter_map(ElementRef::wrap)
            .find(|c| has_class(*c, "ygtvchildren"))
            .map(|container| container.children().next().is_some())
            .unwrap_or(false);
        // a toggle over an empty container never renders anything
        if has_children {
            self.widget
                .pending
                .borrow_mut()
                .insert(self.widget.id_of(owner), self.widget.render_lag);
        }
        Ok(())
    }

    async fn ancestry(&self) -> Result<Vec<Ancestor>> {
        let mut chain = Vec::new();
        let mut current = Some(self.widget.element(self.id));
        while let Some(el) = current {
            let tag = el.value().name().to_uppercase();
            let parent = el.parent();
            let (index, count) = match parent {
                Some(parent) => {
                    let same: Vec<_> = parent
                        .children()
                        .filter_map(ElementRef::wrap)
                        .filter(|s| s.value().name() == el.value().name())
                        .collect();
                    let index = same.iter().position(|s| *s == el).unwrap_or(0);
                    (index, same.len())
                }
                None => (0, 1),
            };
            chain.push(Ancestor::new(&tag, index, count));
            current = parent.and_then(ElementRef::wrap);
        }
        Ok(chain)
    }
}
