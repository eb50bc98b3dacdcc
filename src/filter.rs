//! Catalog filter with the target type -> cluster type dependency.
//!
//! Every setter produces exactly one refresh notification carrying the full
//! snapshot, taken after any dependent reset has been applied.

use tracing::debug;

use crate::models::{ClusterType, FilterSelection, Provider, TargetType};

/// Receives the effective filter whenever it changes.
pub trait CatalogRefresh {
    fn refresh(&self, filter: &FilterSelection);
}

pub struct FilterState<R: CatalogRefresh> {
    selection: FilterSelection,
    refresher: R,
}

impl<R: CatalogRefresh> FilterState<R> {
    pub fn new(refresher: R) -> Self {
        Self {
            selection: FilterSelection::default(),
            refresher,
        }
    }

    /// Sets the target type. Leaving `Cluster` resets the cluster type to `All`.
    pub fn set_target_type(&mut self, target_type: TargetType) {
        if target_type != TargetType::Cluster {
            self.selection.cluster_type = ClusterType::All;
        }
        self.selection.target_type = target_type;
        self.notify();
    }

    /// Overwrites the cluster type even when the control is disabled.
    pub fn set_cluster_type(&mut self, cluster_type: ClusterType) {
        self.selection.cluster_type = cluster_type;
        self.notify();
    }

    pub fn set_provider(&mut self, provider: Provider) {
        self.selection.provider = provider;
        self.notify();
    }

    pub fn effective_filter(&self) -> FilterSelection {
        self.selection.clone()
    }

    /// Whether the cluster type control should accept input.
    pub fn cluster_type_enabled(&self) -> bool {
        self.selection.target_type == TargetType::Cluster
    }

    /// Re-emits the current snapshot without changing it.
    pub fn refresh(&self) {
        self.notify();
    }

    pub fn refresher(&self) -> &R {
        &self.refresher
    }

    fn notify(&self) {
        debug!(filter = %self.selection, "catalog filter changed");
        self.refresher.refresh(&self.selection);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder {
        seen: RefCell<Vec<FilterSelection>>,
    }

    impl CatalogRefresh for Recorder {
        fn refresh(&self, filter: &FilterSelection) {
            self.seen.borrow_mut().push(filter.clone());
        }
    }

    fn filter(t: TargetType, c: ClusterType, p: Provider) -> FilterSelection {
        FilterSelection {
            target_type: t,
            cluster_type: c,
            provider: p,
        }
    }

    #[test]
    fn starts_with_everything_unfiltered() {
        let state = FilterState::new(Recorder::default());
        assert_eq!(state.effective_filter(), FilterSelection::default());
        assert!(state.refresher().seen.borrow().is_empty());
        assert!(!state.cluster_type_enabled());
    }

    #[test]
    fn cluster_then_host_scenario() {
        let mut state = FilterState::new(Recorder::default());

        state.set_target_type(TargetType::Cluster);
        let expected = filter(TargetType::Cluster, ClusterType::All, Provider::All);
        assert_eq!(state.effective_filter(), expected);
        assert_eq!(*state.refresher().seen.borrow(), vec![expected]);
        assert!(state.cluster_type_enabled());

        state.set_cluster_type(ClusterType::HanaScaleUp);
        assert_eq!(
            state.effective_filter(),
            filter(TargetType::Cluster, ClusterType::HanaScaleUp, Provider::All)
        );

        state.set_target_type(TargetType::Host);
        let expected = filter(TargetType::Host, ClusterType::All, Provider::All);
        assert_eq!(state.effective_filter(), expected);
        let seen = state.refresher().seen.borrow();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[2], expected);
    }

    #[test]
    fn leaving_cluster_always_resets_cluster_type() {
        let sequence = [
            TargetType::Cluster,
            TargetType::All,
            TargetType::Cluster,
            TargetType::Host,
            TargetType::Other("vm".to_string()),
            TargetType::Cluster,
        ];
        let mut state = FilterState::new(Recorder::default());
        for target_type in sequence {
            state.set_cluster_type(ClusterType::AscsErs);
            state.set_target_type(target_type.clone());
            if target_type != TargetType::Cluster {
                assert_eq!(state.effective_filter().cluster_type, ClusterType::All);
            } else {
                assert_eq!(state.effective_filter().cluster_type, ClusterType::AscsErs);
            }
        }
    }

    #[test]
    fn observer_never_sees_host_with_specific_cluster_type() {
        let mut state = FilterState::new(Recorder::default());
        state.set_target_type(TargetType::Cluster);
        state.set_cluster_type(ClusterType::HanaScaleOut);
        state.set_target_type(TargetType::Host);
        state.set_provider(Provider::Gcp);

        for snapshot in state.refresher().seen.borrow().iter() {
            if snapshot.target_type != TargetType::Cluster {
                assert_eq!(snapshot.cluster_type, ClusterType::All);
            }
        }
    }

    #[test]
    fn disabled_cluster_control_still_accepts_writes() {
        let mut state = FilterState::new(Recorder::default());
        state.set_cluster_type(ClusterType::HanaScaleUp);
        assert_eq!(state.effective_filter().cluster_type, ClusterType::HanaScaleUp);
        assert_eq!(state.refresher().seen.borrow().len(), 1);
    }

    #[test]
    fn explicit_refresh_resends_snapshot() {
        let mut state = FilterState::new(Recorder::default());
        state.set_provider(Provider::Azure);
        state.refresh();
        let seen = state.refresher().seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], seen[1]);
        assert_eq!(seen[1].provider, Provider::Azure);
    }
}
