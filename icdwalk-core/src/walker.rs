use crate::dom_path;
use crate::error::{HarvestError, Result};
use crate::extract::{self, SubLabelHook};
use crate::model::{CaptureMark, CategoryMap, DiseaseStore};
use crate::node::{TreeNode, selectors};
use crate::store::{self, Checkpoint, DEFAULT_CHECKPOINT_INTERVAL, StorePaths};
use crate::wait::{DEFAULT_POLL_INTERVAL, poll_until};
use std::sync::Arc;
use std::time::Duration;
use tracing::{Level, debug, error, info, warn};

pub const DEFAULT_EXPAND_TIMEOUT: Duration = Duration::from_secs(5);

/// Options for configuring a walk
#[derive(Debug, Clone)]
pub struct WalkOptions {
    /// How long to wait for children to render after clicking a toggle.
    pub expand_timeout: Duration,
    pub poll_interval: Duration,
    /// Flush the disease store every time it grows to a multiple of this.
    pub checkpoint_interval: usize,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            expand_timeout: DEFAULT_EXPAND_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            checkpoint_interval: DEFAULT_CHECKPOINT_INTERVAL,
        }
    }
}

/// Snapshot handed to the progress callback each time a node is visited.
#[derive(Debug, Clone)]
pub struct WalkProgress {
    pub category: String,
    pub parent: String,
    pub label: String,
    /// Records held in `data`.
    pub records: usize,
    /// The store's `count` field at the same moment.
    pub count: usize,
}

/// Callback for reporting walk progress
pub type ProgressCallback = Arc<dyn Fn(WalkProgress) + Send + Sync>;

/// Counters collected over a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarvestStats {
    pub categories_walked: usize,
    pub categories_skipped: usize,
    pub categories_unlabelled: usize,
    pub records_added: usize,
    pub adopted_skipped: usize,
    pub uncoded_labels: usize,
    pub expansions: usize,
    pub checkpoints: usize,
    pub category_flushes: usize,
    pub save_failures: usize,
    pub captured_conflicts: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryOutcome {
    Walked { code: String, records_added: usize },
    AlreadyCaptured { code: String },
    Unlabelled,
}

/// In-memory state of a harvest: both documents, where they live on disk,
/// and the checkpoint bookkeeping.
pub struct Harvest {
    paths: StorePaths,
    categories: CategoryMap,
    diseases: DiseaseStore,
    checkpoint: Checkpoint,
    options: WalkOptions,
    stats: HarvestStats,
    progress_callback: Option<ProgressCallback>,
}

impl Harvest {
    /// Load both documents from `paths`, starting empty where absent.
    pub fn open(paths: StorePaths) -> Self {
        let categories = store::load_categories(&paths.categories);
        let diseases = store::load_diseases(&paths.diseases);
        info!(
            "Loaded {} categories, {} records, {} captured",
            categories.len(),
            diseases.len(),
            diseases.captured.len()
        );
        Self::from_parts(paths, categories, diseases)
    }

    pub fn from_parts(paths: StorePaths, categories: CategoryMap, diseases: DiseaseStore) -> Self {
        let options = WalkOptions::default();
        Self {
            paths,
            categories,
            diseases,
            checkpoint: Checkpoint::new(options.checkpoint_interval),
            options,
            stats: HarvestStats::default(),
            progress_callback: None,
        }
    }

    pub fn with_options(mut self, options: WalkOptions) -> Self {
        self.checkpoint = Checkpoint::new(options.checkpoint_interval);
        self.options = options;
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn categories(&self) -> &CategoryMap {
        &self.categories
    }

    pub fn diseases(&self) -> &DiseaseStore {
        &self.diseases
    }

    pub fn stats(&self) -> &HarvestStats {
        &self.stats
    }

    pub fn paths(&self) -> &StorePaths {
        &self.paths
    }

    /// Write the disease store. Failures are logged, never returned.
    pub fn flush_diseases(&mut self) -> bool {
        match store::save_diseases(&self.paths.diseases, &mut self.diseases) {
            Ok(()) => {
                self.checkpoint.mark_flushed(self.diseases.len());
                true
            }
            Err(e) => {
                error!("Failed to save {}: {}", self.paths.diseases.display(), e);
                self.stats.save_failures += 1;
                false
            }
        }
    }

    /// Write the category map. Failures are logged, never returned.
    pub fn flush_categories(&mut self) -> bool {
        match store::save_categories(&self.paths.categories, &self.categories) {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to save {}: {}", self.paths.categories.display(), e);
                self.stats.save_failures += 1;
                false
            }
        }
    }

    fn checkpoint_if_due(&mut self) {
        let size = self.diseases.len();
        if self.checkpoint.is_due(size) {
            debug!("Checkpoint at {} records", size);
            if self.flush_diseases() {
                self.stats.checkpoints += 1;
            }
        }
    }

    fn report_progress(&self, category: &str, parent: &str, label: &str) {
        if let Some(ref callback) = self.progress_callback {
            callback(WalkProgress {
                category: category.to_string(),
                parent: parent.to_string(),
                label: label.to_string(),
                records: self.diseases.len(),
                count: self.diseases.count,
            });
        }
    }

    /// Expand `node` if needed and capture every non-adopted descendant.
    pub async fn open_tree<N: TreeNode>(
        &mut self,
        node: &N,
        node_id: &str,
        category_id: &str,
    ) -> Result<()> {
        let label = own_label(node).await?;
        self.checkpoint_if_due();
        debug!(
            "Cat IS: {} Item {} ===> Tree -> {}",
            category_id,
            self.diseases.len(),
            label
        );
        self.report_progress(category_id, node_id, &label);

        if node.query(selectors::CHILD_ITEMS).await?.is_none() {
            let Some(toggle) = node.query(selectors::TOGGLE_COLLAPSED).await? else {
                debug!("{} has no children", label);
                return Ok(());
            };
            self.expand(node, &toggle, &label).await?;
        }

        let children = node.query_all(selectors::CHILD_ITEMS).await?;
        for child in children {
            let before = self.diseases.len();
            let extracted =
                extract::save_disease(&mut self.diseases, &child, node_id, category_id).await?;
            let Some(extracted) = extracted else {
                self.stats.adopted_skipped += 1;
                continue;
            };
            if self.diseases.len() > before {
                self.stats.records_added += 1;
            }
            if !extracted.recorded {
                self.stats.uncoded_labels += 1;
            }
            Box::pin(self.open_tree(&child, &extracted.code, category_id)).await?;
        }

        Ok(())
    }

    async fn expand<N: TreeNode>(&mut self, node: &N, toggle: &N, label: &str) -> Result<()> {
        if tracing::enabled!(Level::DEBUG) {
            let path = node_path(node).await;
            debug!("Expanding {}", path.as_deref().unwrap_or(label));
        }

        toggle.click().await?;
        self.stats.expansions += 1;

        let rendered = poll_until(self.options.expand_timeout, self.options.poll_interval, || {
            node.query(selectors::CHILD_ITEMS)
        })
        .await?;

        if rendered.is_none() {
            return Err(HarvestError::ExpansionFailed {
                label: label.to_string(),
                path: node_path(node).await,
                waited: self.options.expand_timeout,
            });
        }
        Ok(())
    }

    /// Walk one top-level category unless an earlier run already captured it.
    pub async fn process_category<N: TreeNode>(&mut self, node: &N) -> Result<CategoryOutcome> {
        let sub_label =
            extract::get_sub_label(node, SubLabelHook::SaveCategory(&mut self.categories)).await?;
        let Some(sub_label) = sub_label else {
            warn!("Category without a readable label, skipping");
            self.stats.categories_unlabelled += 1;
            return Ok(CategoryOutcome::Unlabelled);
        };
        let code = sub_label.code;

        if self.diseases.is_captured(&code) {
            info!("Category {} already captured, skipping", code);
            self.stats.categories_skipped += 1;
            return Ok(CategoryOutcome::AlreadyCaptured { code });
        }

        info!("Walking category {}", code);
        let before = self.diseases.len();
        self.open_tree(node, &code, &code).await?;

        if self.diseases.mark_captured(&code) == CaptureMark::Conflict {
            warn!(
                "Category {} was captured while it was being walked; deduplicated captured list",
                code
            );
            self.stats.captured_conflicts += 1;
        }

        self.flush_categories();
        self.flush_diseases();
        self.stats.category_flushes += 1;
        self.stats.categories_walked += 1;

        let records_added = self.diseases.len().saturating_sub(before);
        info!("Category {} done, {} new records", code, records_added);
        Ok(CategoryOutcome::Walked {
            code,
            records_added,
        })
    }

    /// Process every category in order. The first failure aborts the run.
    pub async fn run<N: TreeNode>(&mut self, categories: &[N]) -> Result<HarvestStats> {
        info!("Processing {} top-level categories", categories.len());
        for category in categories {
            self.process_category(category).await?;
        }
        info!(
            "Harvest complete: {} walked, {} skipped, {} records total",
            self.stats.categories_walked,
            self.stats.categories_skipped,
            self.diseases.len()
        );
        Ok(self.stats.clone())
    }
}

/// The node's own label text, or its whole text if it has no label.
async fn own_label<N: TreeNode>(node: &N) -> Result<String> {
    match node.query(selectors::LABEL).await? {
        Some(label) => extract::get_label(&label).await,
        None => extract::get_label(node).await,
    }
}

/// Best-effort DOM path for diagnostics.
pub async fn node_path<N: TreeNode>(node: &N) -> Option<String> {
    match node.ancestry().await {
        Ok(chain) => dom_path::resolve(&chain),
        Err(e) => {
            debug!("Could not resolve DOM path: {}", e);
            None
        }
    }
}
