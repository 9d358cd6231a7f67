use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::config::DashboardConfig;
use crate::data::filter::{Choice, Selection};
use crate::data::model::{Dataset, Value};
use crate::error::DashboardError;
use crate::pipeline::{self, FilterControl, RunOutcome, Selections};

// ---------------------------------------------------------------------------
// Load cache key
// ---------------------------------------------------------------------------

/// Identity of an input file; a change in any field triggers a reload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileIdentity {
    pub path: PathBuf,
    pub len: u64,
    pub modified: Option<SystemTime>,
}

impl FileIdentity {
    pub fn of(path: &Path) -> Option<Self> {
        let meta = std::fs::metadata(path).ok()?;
        Some(FileIdentity {
            path: path.to_path_buf(),
            len: meta.len(),
            modified: meta.modified().ok(),
        })
    }
}

// ---------------------------------------------------------------------------
// Multi-select state
// ---------------------------------------------------------------------------

/// What a multi-select control has ticked: the `All` entry and/or values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionState {
    pub all: bool,
    pub values: BTreeSet<Value>,
}

impl Default for SelectionState {
    fn default() -> Self {
        Self {
            all: true,
            values: BTreeSet::new(),
        }
    }
}

impl SelectionState {
    pub fn selection(&self) -> Selection {
        let all = self.all.then_some(Choice::All);
        Selection::from_choices(all.into_iter().chain(self.values.iter().cloned().map(Choice::Value)))
    }

    /// Header summary, e.g. `All` or `2 selected`.
    pub fn summary(&self) -> String {
        if self.all {
            "All".to_string()
        } else {
            format!("{} selected", self.values.len())
        }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// State of one dashboard, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,

    /// Prepared dataset (None until loaded, or after a fatal error).
    pub dataset: Option<Dataset>,

    /// File the cached dataset was loaded from.
    loaded_from: Option<FileIdentity>,

    /// Number of times the input file was actually read.
    loads: usize,

    /// Sidebar controls derived from the dataset.
    pub controls: Vec<FilterControl>,

    /// Per-column multi-select state.
    pub selections: BTreeMap<String, SelectionState>,

    /// Result of the last run.
    pub outcome: Option<RunOutcome>,

    /// Fatal error of the last run; nothing else is shown while set.
    pub error: Option<DashboardError>,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            config,
            dataset: None,
            loaded_from: None,
            loads: 0,
            controls: Vec::new(),
            selections: BTreeMap::new(),
            outcome: None,
            error: None,
        }
    }

    pub fn loads(&self) -> usize {
        self.loads
    }

    /// Execute the whole pipeline for the current selection.  The load step is
    /// skipped while the input file is unchanged.
    pub fn run(&mut self) {
        self.outcome = None;
        if let Err(e) = self.ensure_dataset() {
            self.dataset = None;
            self.loaded_from = None;
            self.controls.clear();
            self.error = Some(e);
            return;
        }
        self.error = None;

        if let Some(ds) = &self.dataset {
            let selections = self.current_selections();
            self.outcome = Some(pipeline::render(ds, &self.config, &selections));
        }
    }

    fn ensure_dataset(&mut self) -> Result<(), DashboardError> {
        let identity = FileIdentity::of(&self.config.data_path);
        if self.dataset.is_some() && identity.is_some() && identity == self.loaded_from {
            log::debug!("{}: input unchanged, reusing loaded dataset", self.config.id);
            return Ok(());
        }

        let dataset = pipeline::prepare(&self.config)?;
        self.loads += 1;
        self.controls = pipeline::filter_controls(&dataset, &self.config);

        // Forget ticked values that no longer exist in the data.
        for control in &self.controls {
            if let Some(state) = self.selections.get_mut(&control.column) {
                state.values.retain(|v| control.options.contains(v));
            }
        }

        self.dataset = Some(dataset);
        self.loaded_from = identity;
        Ok(())
    }

    pub fn current_selections(&self) -> Selections {
        self.selections
            .iter()
            .map(|(col, state)| (col.clone(), state.selection()))
            .collect()
    }

    /// Tick or untick the `All` entry of a column.
    pub fn set_all(&mut self, column: &str, checked: bool) {
        self.selections.entry(column.to_string()).or_default().all = checked;
        self.run();
    }

    /// Tick or untick a single value of a column.
    pub fn set_value(&mut self, column: &str, value: &Value, checked: bool) {
        let state = self.selections.entry(column.to_string()).or_default();
        if checked {
            state.values.insert(value.clone());
        } else {
            state.values.remove(value);
        }
        self.run();
    }

    /// Untick everything in a column, `All` included.
    pub fn select_none(&mut self, column: &str) {
        let state = self.selections.entry(column.to_string()).or_default();
        state.all = false;
        state.values.clear();
        self.run();
    }

    /// Back to the default: `All` only.
    pub fn reset_filters(&mut self) {
        self.selections.clear();
        self.run();
    }

    pub fn total_rows(&self) -> usize {
        self.dataset.as_ref().map_or(0, Dataset::len)
    }

    pub fn visible_rows(&self) -> usize {
        match &self.outcome {
            Some(RunOutcome::Rendered(view)) => view.row_count,
            _ => 0,
        }
    }
}
