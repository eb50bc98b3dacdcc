//! Display derivations over the flat catalog: grouping, accordion rows and
//! per-check remediation expansion.

use std::collections::HashSet;

use crate::models::{CatalogEntry, ClusterType, FilterSelection, Provider, TargetType};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogGroup {
    pub name: String,
    pub checks: Vec<CatalogEntry>,
}

impl CatalogGroup {
    pub fn check_ids(&self) -> impl Iterator<Item = &str> + Clone {
        self.checks.iter().map(|c| c.id.as_str())
    }
}

/// Groups entries by `group`, in order of first appearance. Entries keep
/// their input order within a group.
pub fn group_by_category(entries: &[CatalogEntry]) -> Vec<CatalogGroup> {
    let mut groups: Vec<CatalogGroup> = Vec::new();
    for entry in entries {
        let name = entry.group_name();
        match groups.iter_mut().find(|g| g.name == name) {
            Some(group) => group.checks.push(entry.clone()),
            None => groups.push(CatalogGroup {
                name: name.to_string(),
                checks: vec![entry.clone()],
            }),
        }
    }
    groups
}

/// Whether `entry` belongs in the catalog for `filter`. A dimension the entry
/// does not declare matches any filter value.
pub fn matches_filter(entry: &CatalogEntry, filter: &FilterSelection) -> bool {
    let meta = entry.metadata.clone().unwrap_or_default();
    dimension_matches(&filter.target_type, &TargetType::All, meta.target_type.as_ref())
        && dimension_matches(&filter.cluster_type, &ClusterType::All, meta.cluster_type.as_ref())
        && dimension_matches(&filter.provider, &Provider::All, meta.provider.as_ref())
}

fn dimension_matches<T: PartialEq>(wanted: &T, all: &T, declared: Option<&T>) -> bool {
    wanted == all || declared.is_none_or(|d| d == wanted)
}

/// Ids of checks whose remediation is shown, owned by the list.
#[derive(Debug, Default)]
pub struct ExpandedChecks {
    ids: HashSet<String>,
}

impl ExpandedChecks {
    pub fn toggle(&mut self, check_id: &str) {
        if !self.ids.remove(check_id) {
            self.ids.insert(check_id.to_string());
        }
    }

    pub fn is_expanded(&self, check_id: &str) -> bool {
        self.ids.contains(check_id)
    }

    /// Forgets checks that are no longer listed.
    pub fn retain_present<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>) {
        let present: HashSet<&str> = ids.into_iter().collect();
        self.ids.retain(|id| present.contains(id.as_str()));
    }
}

/// One navigable or rendered line of the grouped catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Row {
    Group { group: usize },
    Check { group: usize, check: usize },
    Remediation { group: usize, check: usize },
}

impl Row {
    /// Remediation lines are rendered but skipped by the cursor.
    pub fn is_selectable(&self) -> bool {
        !matches!(self, Row::Remediation { .. })
    }
}

/// Accordion state: which groups are collapsed. Groups start collapsed except
/// the first one.
#[derive(Debug, Default)]
pub struct OpenGroups {
    toggled: HashSet<String>,
}

impl OpenGroups {
    pub fn is_open(&self, index: usize, name: &str) -> bool {
        (index == 0) != self.toggled.contains(name)
    }

    pub fn toggle(&mut self, name: &str) {
        if !self.toggled.remove(name) {
            self.toggled.insert(name.to_string());
        }
    }

    pub fn reset(&mut self) {
        self.toggled.clear();
    }
}

pub fn display_rows(groups: &[CatalogGroup], open: &OpenGroups, expanded: &ExpandedChecks) -> Vec<Row> {
    let mut rows = Vec::new();
    for (gi, group) in groups.iter().enumerate() {
        rows.push(Row::Group { group: gi });
        if !open.is_open(gi, &group.name) {
            continue;
        }
        for (ci, check) in group.checks.iter().enumerate() {
            rows.push(Row::Check { group: gi, check: ci });
            if expanded.is_expanded(&check.id) {
                rows.push(Row::Remediation { group: gi, check: ci });
            }
        }
    }
    rows
}

/// Moves `cursor` by `delta` selectable rows, clamping at both ends.
pub fn step_cursor(rows: &[Row], cursor: usize, delta: isize) -> usize {
    let selectable: Vec<usize> = rows
        .iter()
        .enumerate()
        .filter(|(_, r)| r.is_selectable())
        .map(|(i, _)| i)
        .collect();
    if selectable.is_empty() {
        return 0;
    }
    let pos = selectable.iter().position(|&i| i >= cursor).unwrap_or(selectable.len() - 1);
    let next = (pos as isize + delta).clamp(0, selectable.len() as isize - 1) as usize;
    selectable[next]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CheckMetadata, UNCATEGORIZED};

    fn entry(id: &str, group: Option<&str>) -> CatalogEntry {
        CatalogEntry {
            id: id.to_string(),
            name: format!("check {id}"),
            group: group.map(str::to_string),
            description: format!("description of {id}"),
            remediation: format!("fix {id}"),
            premium: false,
            metadata: None,
        }
    }

    fn ids(group: &CatalogGroup) -> Vec<&str> {
        group.check_ids().collect()
    }

    #[test]
    fn groups_in_first_seen_order() {
        let entries = vec![
            entry("1", Some("security")),
            entry("2", Some("corosync")),
            entry("3", Some("security")),
        ];
        let groups = group_by_category(&entries);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].name, "security");
        assert_eq!(ids(&groups[0]), vec!["1", "3"]);
        assert_eq!(groups[1].name, "corosync");
        assert_eq!(ids(&groups[1]), vec!["2"]);
    }

    #[test]
    fn group_order_is_not_alphabetical() {
        let entries: Vec<_> = ["B", "A", "B", "A"]
            .iter()
            .enumerate()
            .map(|(i, g)| entry(&i.to_string(), Some(g)))
            .collect();
        let groups = group_by_category(&entries);
        let names: Vec<_> = groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);
        let total: usize = groups.iter().map(|g| g.checks.len()).sum();
        assert_eq!(total, entries.len());
    }

    #[test]
    fn empty_catalog_has_no_groups() {
        assert!(group_by_category(&[]).is_empty());
    }

    #[test]
    fn missing_group_goes_to_uncategorized() {
        let groups = group_by_category(&[entry("1", None), entry("2", Some("sbd")), entry("3", None)]);
        assert_eq!(groups[0].name, UNCATEGORIZED);
        assert_eq!(ids(&groups[0]), vec!["1", "3"]);
    }

    #[test]
    fn filter_matching_ignores_undeclared_dimensions() {
        let mut e = entry("1", Some("g"));
        let azure_hosts = FilterSelection {
            target_type: TargetType::Host,
            cluster_type: ClusterType::All,
            provider: Provider::Azure,
        };
        assert!(matches_filter(&e, &azure_hosts));

        e.metadata = Some(CheckMetadata {
            target_type: Some(TargetType::Cluster),
            cluster_type: None,
            provider: Some(Provider::Azure),
        });
        assert!(!matches_filter(&e, &azure_hosts));
        assert!(matches_filter(&e, &FilterSelection::default()));

        let aws_clusters = FilterSelection {
            target_type: TargetType::Cluster,
            cluster_type: ClusterType::HanaScaleUp,
            provider: Provider::Aws,
        };
        assert!(!matches_filter(&e, &aws_clusters));
    }

    #[test]
    fn expanded_checks_flip_independently() {
        let mut expanded = ExpandedChecks::default();
        expanded.toggle("a");
        expanded.toggle("b");
        expanded.toggle("a");
        assert!(!expanded.is_expanded("a"));
        assert!(expanded.is_expanded("b"));

        expanded.retain_present(["c"]);
        assert!(!expanded.is_expanded("b"));
    }

    #[test]
    fn rows_follow_accordion_and_expansion() {
        let groups = group_by_category(&[
            entry("1", Some("security")),
            entry("2", Some("corosync")),
            entry("3", Some("security")),
        ]);
        let mut open = OpenGroups::default();
        let mut expanded = ExpandedChecks::default();
        expanded.toggle("3");

        let rows = display_rows(&groups, &open, &expanded);
        assert_eq!(
            rows,
            vec![
                Row::Group { group: 0 },
                Row::Check { group: 0, check: 0 },
                Row::Check { group: 0, check: 1 },
                Row::Remediation { group: 0, check: 1 },
                Row::Group { group: 1 },
            ]
        );

        open.toggle("security");
        open.toggle("corosync");
        let rows = display_rows(&groups, &open, &expanded);
        assert_eq!(
            rows,
            vec![
                Row::Group { group: 0 },
                Row::Group { group: 1 },
                Row::Check { group: 1, check: 0 },
            ]
        );
    }

    #[test]
    fn cursor_skips_remediation_rows() {
        let rows = vec![
            Row::Group { group: 0 },
            Row::Check { group: 0, check: 0 },
            Row::Remediation { group: 0, check: 0 },
            Row::Check { group: 0, check: 1 },
        ];
        assert_eq!(step_cursor(&rows, 1, 1), 3);
        assert_eq!(step_cursor(&rows, 3, -1), 1);
        assert_eq!(step_cursor(&rows, 3, 5), 3);
        assert_eq!(step_cursor(&rows, 0, -1), 0);
        assert_eq!(step_cursor(&[], 4, 1), 0);
    }
}
