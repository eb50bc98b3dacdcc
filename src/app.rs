//! View state owned by the UI thread. Shared state pushed by background
//! requests is only read through the `Backend` handle.

use tracing::{debug, info};

use crate::catalog::{CatalogGroup, ExpandedChecks, OpenGroups, Row, display_rows, group_by_category, step_cursor};
use crate::filter::{CatalogRefresh, FilterState};
use crate::models::{CatalogEntry, Target, View};
use crate::network::{Backend, lock};
use crate::selection::{SelectionGate, SelectionStore};

/// Display copy of the catalog state, taken once per frame.
#[derive(Debug, Default)]
pub struct CatalogSnapshot {
    pub groups: Vec<CatalogGroup>,
    pub error: Option<String>,
    pub loading: bool,
    pub fetched_at: Option<String>,
    pub revision: u64,
}

impl CatalogSnapshot {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn entry(&self, row: Row) -> Option<&CatalogEntry> {
        match row {
            Row::Check { group, check } | Row::Remediation { group, check } => {
                self.groups.get(group).and_then(|g| g.checks.get(check))
            }
            Row::Group { .. } => None,
        }
    }
}

pub struct App {
    pub view: View,
    pub filter: FilterState<Backend>,
    pub backend: Backend,
    pub targets: Vec<Target>,
    pub target_cursor: usize,
    active_target: Option<usize>,
    pub selections: SelectionStore,
    pub expanded: ExpandedChecks,
    pub open_groups: OpenGroups,
    pub cursor: usize,
    seen_revision: u64,
}

impl App {
    /// Builds the app and fires the initial catalog refresh.
    pub fn new(backend: Backend, targets: Vec<Target>) -> Self {
        let filter = FilterState::new(backend.clone());
        filter.refresh();
        Self {
            view: View::Catalog,
            filter,
            backend,
            targets,
            target_cursor: 0,
            active_target: None,
            selections: SelectionStore::default(),
            expanded: ExpandedChecks::default(),
            open_groups: OpenGroups::default(),
            cursor: 0,
            seen_revision: 0,
        }
    }

    pub fn catalog(&self) -> CatalogSnapshot {
        let state = lock(&self.backend.catalog);
        CatalogSnapshot {
            groups: group_by_category(&state.data),
            error: state.error.clone(),
            loading: state.loading,
            fetched_at: state.fetched_at.map(|t| t.format("%H:%M:%S").to_string()),
            revision: state.revision(),
        }
    }

    /// Reconciles view state with catalog data that arrived since last frame.
    pub fn sync(&mut self, catalog: &CatalogSnapshot) {
        if catalog.revision != self.seen_revision {
            self.seen_revision = catalog.revision;
            let ids = catalog.groups.iter().flat_map(CatalogGroup::check_ids);
            debug!(revision = catalog.revision, count = ids.clone().count(), "catalog data arrived");
            self.expanded.retain_present(ids);
        }
        let rows = self.rows(catalog);
        self.cursor = step_cursor(&rows, self.cursor, 0);
    }

    pub fn rows(&self, catalog: &CatalogSnapshot) -> Vec<Row> {
        display_rows(&catalog.groups, &self.open_groups, &self.expanded)
    }

    pub fn move_cursor(&mut self, delta: isize) {
        let rows = self.rows(&self.catalog());
        self.cursor = step_cursor(&rows, self.cursor, delta);
    }

    pub fn current_row(&self, catalog: &CatalogSnapshot) -> Option<Row> {
        self.rows(catalog).get(self.cursor).copied()
    }

    /// Opens/closes the group under the cursor, or expands the check's remediation.
    pub fn activate_row(&mut self) {
        let catalog = self.catalog();
        match self.current_row(&catalog) {
            Some(Row::Group { group }) => {
                if let Some(g) = catalog.groups.get(group) {
                    self.open_groups.toggle(&g.name);
                }
            }
            Some(row) => {
                if let Some(entry) = catalog.entry(row) {
                    self.expanded.toggle(&entry.id);
                }
            }
            None => {}
        }
    }

    pub fn show_view(&mut self, view: View) {
        if view == self.view {
            return;
        }
        debug!(?view, "switching view");
        self.view = view;
        self.cursor = 0;
        self.open_groups.reset();
        if view == View::Catalog {
            self.filter.refresh();
        }
    }

    pub fn move_target_cursor(&mut self, delta: isize) {
        if self.targets.is_empty() {
            return;
        }
        let last = self.targets.len() as isize - 1;
        self.target_cursor = (self.target_cursor as isize + delta).clamp(0, last) as usize;
    }

    /// Enters the selection page for the target under the cursor.
    pub fn open_target(&mut self) {
        let Some(target) = self.targets.get(self.target_cursor).cloned() else {
            return;
        };
        info!(target_id = %target.id, "opening check selection");
        match self.backend.saved_selection(&target.id) {
            Some(saved) => self.selections.load_saved(&target.id, &saved),
            None => {
                self.selections.gate_mut(&target.id);
            }
        }
        self.active_target = Some(self.target_cursor);
        self.show_view(View::Selection);
        self.backend.refresh(&target.catalog_filter());
    }

    pub fn active_target(&self) -> Option<&Target> {
        self.active_target.and_then(|idx| self.targets.get(idx))
    }

    pub fn active_gate(&self) -> Option<&SelectionGate> {
        self.active_target().and_then(|t| self.selections.gate(&t.id))
    }

    /// Whether a save for the active target is in flight. Read fresh each time.
    pub fn saving(&self) -> bool {
        self.active_target().is_some_and(|t| self.backend.is_saving(&t.id))
    }

    /// Last persisted selection of the active target. Executions run this
    /// list, not the unsaved toggles.
    pub fn saved_gate(&self) -> Option<SelectionGate> {
        let target = self.active_target()?;
        let mut gate = SelectionGate::default();
        gate.replace_all(self.backend.saved_selection(&target.id).unwrap_or_default());
        Some(gate)
    }

    pub fn can_start_execution(&self) -> bool {
        let saving = self.saving();
        self.saved_gate().is_some_and(|g| g.can_start_execution(saving))
    }

    /// Toggles the check under the cursor, or the whole group on a header.
    pub fn toggle_selection(&mut self) {
        let Some(target_id) = self.active_target().map(|t| t.id.clone()) else {
            return;
        };
        let catalog = self.catalog();
        let row = self.current_row(&catalog);
        let gate = self.selections.gate_mut(&target_id);
        match row {
            Some(Row::Group { group }) => {
                if let Some(g) = catalog.groups.get(group) {
                    gate.toggle_group(g.check_ids());
                }
            }
            Some(row) => {
                if let Some(entry) = catalog.entry(row) {
                    gate.toggle(&entry.id);
                }
            }
            None => {}
        }
    }

    pub fn save_selection(&self) {
        let (Some(target), Some(gate)) = (self.active_target(), self.active_gate()) else {
            return;
        };
        if self.saving() {
            return;
        }
        self.backend.save_selection(target, gate.selected());
    }

    /// Dispatches the saved selection if allowed; returns whether it did.
    pub fn start_execution(&mut self) -> bool {
        if !self.can_start_execution() {
            return false;
        }
        let (Some(target), Some(gate)) = (self.active_target(), self.saved_gate()) else {
            return false;
        };
        self.backend.request_execution(target, gate.selected());
        self.show_view(View::Targets);
        true
    }

    pub fn remediation_under_cursor(&self) -> Option<String> {
        let catalog = self.catalog();
        self.current_row(&catalog)
            .and_then(|row| catalog.entry(row))
            .map(|e| e.remediation.clone())
    }

    pub fn dismiss_notice(&self) {
        lock(&self.backend.notice).visible = false;
    }
}
