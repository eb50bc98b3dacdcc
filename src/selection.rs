use std::collections::{BTreeSet, HashMap};

/// How much of a check group is currently selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupSelection {
    All,
    Some,
    None,
}

/// Selected checks for a single target and the execution predicate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionGate {
    selected: BTreeSet<String>,
}

impl SelectionGate {
    pub fn toggle(&mut self, check_id: &str) {
        if !self.selected.remove(check_id) {
            self.selected.insert(check_id.to_string());
        }
    }

    /// Replaces the whole selection, e.g. with a previously saved one.
    pub fn replace_all<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selected = ids.into_iter().map(Into::into).collect();
    }

    /// `saving` is owned by the persistence layer and must be read fresh.
    pub fn can_start_execution(&self, saving: bool) -> bool {
        !self.selected.is_empty() && !saving
    }

    pub fn contains(&self, check_id: &str) -> bool {
        self.selected.contains(check_id)
    }

    pub fn selected(&self) -> Vec<String> {
        self.selected.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn group_selection<'a>(&self, ids: impl IntoIterator<Item = &'a str>) -> GroupSelection {
        let (mut total, mut chosen) = (0, 0);
        for id in ids {
            total += 1;
            if self.selected.contains(id) {
                chosen += 1;
            }
        }
        match chosen {
            0 => GroupSelection::None,
            n if n == total => GroupSelection::All,
            _ => GroupSelection::Some,
        }
    }

    /// Deselects a fully selected group, otherwise selects every id in it.
    pub fn toggle_group<'a>(&mut self, ids: impl IntoIterator<Item = &'a str> + Clone) {
        if self.group_selection(ids.clone()) == GroupSelection::All {
            for id in ids {
                self.selected.remove(id);
            }
        } else {
            for id in ids {
                self.selected.insert(id.to_string());
            }
        }
    }
}

/// One gate per visited target, created on first use.
#[derive(Debug, Default)]
pub struct SelectionStore {
    gates: HashMap<String, SelectionGate>,
}

impl SelectionStore {
    pub fn gate(&self, target_id: &str) -> Option<&SelectionGate> {
        self.gates.get(target_id)
    }

    pub fn gate_mut(&mut self, target_id: &str) -> &mut SelectionGate {
        self.gates.entry(target_id.to_string()).or_default()
    }

    pub fn load_saved(&mut self, target_id: &str, ids: &[String]) {
        self.gate_mut(target_id).replace_all(ids.iter().cloned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_twice_is_identity() {
        let mut gate = SelectionGate::default();
        gate.replace_all(["a", "b"]);
        for id in ["a", "c", ""] {
            let before = gate.clone();
            gate.toggle(id);
            assert_ne!(gate, before);
            gate.toggle(id);
            assert_eq!(gate, before);
        }
    }

    #[test]
    fn replace_all_collapses_duplicates() {
        let mut gate = SelectionGate::default();
        gate.toggle("old");
        gate.replace_all(["x", "y", "x"]);
        assert_eq!(gate.selected(), vec!["x".to_string(), "y".to_string()]);
        assert!(!gate.contains("old"));
    }

    #[test]
    fn saving_always_blocks_execution() {
        let mut gate = SelectionGate::default();
        assert!(!gate.can_start_execution(false));
        assert!(!gate.can_start_execution(true));
        gate.replace_all(["a", "b", "c"]);
        assert!(gate.can_start_execution(false));
        assert!(!gate.can_start_execution(true));
    }

    #[test]
    fn save_cycle_scenario() {
        let mut gate = SelectionGate::default();
        let mut saving = false;
        assert!(!gate.can_start_execution(saving));

        gate.toggle("check-1");
        assert!(gate.can_start_execution(saving));

        saving = true;
        assert!(!gate.can_start_execution(saving));

        saving = false;
        assert!(gate.can_start_execution(saving));
    }

    #[test]
    fn group_toggle_selects_then_clears() {
        let mut gate = SelectionGate::default();
        let group = ["a", "b", "c"];
        gate.toggle("b");
        assert_eq!(gate.group_selection(group), GroupSelection::Some);

        gate.toggle_group(group);
        assert_eq!(gate.group_selection(group), GroupSelection::All);

        gate.toggle("outside");
        gate.toggle_group(group);
        assert_eq!(gate.group_selection(group), GroupSelection::None);
        assert_eq!(gate.selected(), vec!["outside".to_string()]);
    }

    #[test]
    fn store_keeps_targets_independent() {
        let mut store = SelectionStore::default();
        assert!(store.gate("h1").is_none());
        store.gate_mut("h1").toggle("a");
        store.load_saved("h2", &["b".to_string(), "c".to_string()]);

        assert_eq!(store.gate("h1").map(SelectionGate::len), Some(1));
        assert_eq!(store.gate("h2").map(SelectionGate::len), Some(2));
        assert!(!store.gate("h2").is_some_and(|g| g.contains("a")));
    }
}
