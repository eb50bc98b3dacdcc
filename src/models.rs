use std::fmt;

use serde::{Deserialize, Serialize};

/// Group key used for catalog entries that carry no group.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Kind of target a check applies to. `All` is the "no filter" option.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TargetType {
    #[default]
    All,
    Host,
    Cluster,
    Other(String),
}

impl TargetType {
    pub const OPTIONS: [TargetType; 3] = [TargetType::All, TargetType::Host, TargetType::Cluster];

    /// Query parameter value, `None` for `All`.
    pub fn param(&self) -> Option<&str> {
        match self {
            TargetType::All => None,
            TargetType::Host => Some("host"),
            TargetType::Cluster => Some("cluster"),
            TargetType::Other(token) => Some(token),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            TargetType::All => "All targets",
            TargetType::Host => "Hosts",
            TargetType::Cluster => "Clusters",
            TargetType::Other(token) => token,
        }
    }

    pub fn next(&self) -> TargetType {
        cycle(&Self::OPTIONS, self)
    }
}

impl From<&str> for TargetType {
    fn from(token: &str) -> Self {
        match token {
            "" | "all" => TargetType::All,
            "host" => TargetType::Host,
            "cluster" => TargetType::Cluster,
            other => TargetType::Other(other.to_string()),
        }
    }
}

/// Cluster flavour. Only meaningful while the target type is `Cluster`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ClusterType {
    #[default]
    All,
    HanaScaleUp,
    HanaScaleOut,
    AscsErs,
    Other(String),
}

impl ClusterType {
    pub const OPTIONS: [ClusterType; 4] = [
        ClusterType::All,
        ClusterType::HanaScaleUp,
        ClusterType::HanaScaleOut,
        ClusterType::AscsErs,
    ];

    pub fn param(&self) -> Option<&str> {
        match self {
            ClusterType::All => None,
            ClusterType::HanaScaleUp => Some("hana_scale_up"),
            ClusterType::HanaScaleOut => Some("hana_scale_out"),
            ClusterType::AscsErs => Some("ascs_ers"),
            ClusterType::Other(token) => Some(token),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            ClusterType::All => "All cluster types",
            ClusterType::HanaScaleUp => "HANA Scale Up",
            ClusterType::HanaScaleOut => "HANA Scale Out",
            ClusterType::AscsErs => "ASCS/ERS",
            ClusterType::Other(token) => token,
        }
    }

    pub fn next(&self) -> ClusterType {
        cycle(&Self::OPTIONS, self)
    }
}

impl From<&str> for ClusterType {
    fn from(token: &str) -> Self {
        match token {
            "" | "all" => ClusterType::All,
            "hana_scale_up" => ClusterType::HanaScaleUp,
            "hana_scale_out" => ClusterType::HanaScaleOut,
            "ascs_ers" => ClusterType::AscsErs,
            other => ClusterType::Other(other.to_string()),
        }
    }
}

/// Infrastructure provider a check applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Provider {
    #[default]
    All,
    Azure,
    Aws,
    Gcp,
    Kvm,
    Vmware,
    Nutanix,
    Other(String),
}

impl Provider {
    pub const OPTIONS: [Provider; 7] = [
        Provider::All,
        Provider::Azure,
        Provider::Aws,
        Provider::Gcp,
        Provider::Kvm,
        Provider::Vmware,
        Provider::Nutanix,
    ];

    pub fn param(&self) -> Option<&str> {
        match self {
            Provider::All => None,
            Provider::Azure => Some("azure"),
            Provider::Aws => Some("aws"),
            Provider::Gcp => Some("gcp"),
            Provider::Kvm => Some("kvm"),
            Provider::Vmware => Some("vmware"),
            Provider::Nutanix => Some("nutanix"),
            Provider::Other(token) => Some(token),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Provider::All => "All providers",
            Provider::Azure => "Azure",
            Provider::Aws => "AWS",
            Provider::Gcp => "GCP",
            Provider::Kvm => "KVM",
            Provider::Vmware => "VMware",
            Provider::Nutanix => "Nutanix",
            Provider::Other(token) => token,
        }
    }

    pub fn next(&self) -> Provider {
        cycle(&Self::OPTIONS, self)
    }
}

impl From<&str> for Provider {
    fn from(token: &str) -> Self {
        match token {
            "" | "all" => Provider::All,
            "azure" => Provider::Azure,
            "aws" => Provider::Aws,
            "gcp" => Provider::Gcp,
            "kvm" => Provider::Kvm,
            "vmware" => Provider::Vmware,
            "nutanix" => Provider::Nutanix,
            other => Provider::Other(other.to_string()),
        }
    }
}

// Wire conversions shared by the three filter enums.
macro_rules! wire_token {
    ($ty:ty) => {
        impl From<String> for $ty {
            fn from(token: String) -> Self {
                <$ty>::from(token.as_str())
            }
        }

        impl From<$ty> for String {
            fn from(value: $ty) -> Self {
                value.param().unwrap_or("all").to_string()
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.param().unwrap_or("all"))
            }
        }
    };
}

wire_token!(TargetType);
wire_token!(ClusterType);
wire_token!(Provider);

/// Next option after `current`; unknown values wrap to the first option.
fn cycle<T: Clone + PartialEq>(options: &[T], current: &T) -> T {
    match options.iter().position(|o| o == current) {
        Some(idx) => options[(idx + 1) % options.len()].clone(),
        None => options[0].clone(),
    }
}

/// Snapshot of the three catalog filter dimensions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterSelection {
    pub target_type: TargetType,
    pub cluster_type: ClusterType,
    pub provider: Provider,
}

impl FilterSelection {
    /// Query parameters for the catalog endpoint, skipping `All` dimensions.
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(p) = self.target_type.param() {
            params.push(("target_type", p.to_string()));
        }
        if let Some(p) = self.cluster_type.param() {
            params.push(("cluster_type", p.to_string()));
        }
        if let Some(p) = self.provider.param() {
            params.push(("provider", p.to_string()));
        }
        params
    }
}

impl fmt::Display for FilterSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "target_type={} cluster_type={} provider={}",
            self.target_type, self.cluster_type, self.provider
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CheckMetadata {
    #[serde(default)]
    pub target_type: Option<TargetType>,
    #[serde(default)]
    pub cluster_type: Option<ClusterType>,
    #[serde(default)]
    pub provider: Option<Provider>,
}

/// One check as delivered by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub remediation: String,
    #[serde(default)]
    pub premium: bool,
    #[serde(default)]
    pub metadata: Option<CheckMetadata>,
}

impl CatalogEntry {
    pub fn group_name(&self) -> &str {
        self.group.as_deref().unwrap_or(UNCATEGORIZED)
    }

    pub fn target_type(&self) -> Option<&TargetType> {
        self.metadata.as_ref().and_then(|m| m.target_type.as_ref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    Host,
    Cluster,
}

impl TargetKind {
    /// Path segment used by the persistence and execution endpoints.
    pub fn collection(&self) -> &'static str {
        match self {
            TargetKind::Host => "hosts",
            TargetKind::Cluster => "clusters",
        }
    }
}

/// A host or cluster checks can be selected for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub id: String,
    pub name: String,
    pub kind: TargetKind,
    #[serde(default)]
    pub provider: Provider,
    #[serde(default)]
    pub cluster_type: ClusterType,
}

impl Target {
    /// Filter the target's selection page refreshes the catalog with.
    pub fn catalog_filter(&self) -> FilterSelection {
        match self.kind {
            TargetKind::Host => FilterSelection {
                target_type: TargetType::Host,
                cluster_type: ClusterType::All,
                provider: self.provider.clone(),
            },
            TargetKind::Cluster => FilterSelection {
                target_type: TargetType::Cluster,
                cluster_type: self.cluster_type.clone(),
                provider: self.provider.clone(),
            },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum View {
    Catalog,
    Targets,
    Selection,
}

/// Popup used for feedback from background requests.
#[derive(Debug, Default)]
pub struct Notice {
    pub visible: bool,
    pub text: String,
    pub loading: bool,
}

impl Notice {
    pub fn show(&mut self, text: impl Into<String>) {
        self.visible = true;
        self.loading = false;
        self.text = text.into();
    }

    pub fn show_loading(&mut self, text: impl Into<String>) {
        self.visible = true;
        self.loading = true;
        self.text = text.into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_tokens_pass_through() {
        assert_eq!(TargetType::from("vm"), TargetType::Other("vm".to_string()));
        assert_eq!(Provider::from("openstack").param(), Some("openstack"));
        assert_eq!(String::from(ClusterType::from("weird")), "weird");
    }

    #[test]
    fn cycling_visits_every_option_and_wraps() {
        let mut current = Provider::All;
        for _ in 0..Provider::OPTIONS.len() {
            current = current.next();
        }
        assert_eq!(current, Provider::All);
        assert_eq!(TargetType::Other("vm".into()).next(), TargetType::All);
        assert_eq!(TargetType::Host.next(), TargetType::Cluster);
    }

    #[test]
    fn query_params_skip_all_dimensions() {
        let filter = FilterSelection {
            target_type: TargetType::Cluster,
            cluster_type: ClusterType::All,
            provider: Provider::Azure,
        };
        assert_eq!(
            filter.query_params(),
            vec![("target_type", "cluster".to_string()), ("provider", "azure".to_string())]
        );
        assert!(FilterSelection::default().query_params().is_empty());
    }

    #[test]
    fn entry_deserializes_with_missing_fields() {
        let entry: CatalogEntry = serde_json::from_str(
            r#"{"id":"156F64","description":"d","metadata":{"target_type":"cluster"}}"#,
        )
        .unwrap();
        assert_eq!(entry.group_name(), UNCATEGORIZED);
        assert_eq!(entry.target_type(), Some(&TargetType::Cluster));
        assert!(!entry.premium);
    }

    #[test]
    fn cluster_target_filter_keeps_cluster_type() {
        let target = Target {
            id: "c1".into(),
            name: "hana-cluster".into(),
            kind: TargetKind::Cluster,
            provider: Provider::Aws,
            cluster_type: ClusterType::HanaScaleOut,
        };
        let filter = target.catalog_filter();
        assert_eq!(filter.target_type, TargetType::Cluster);
        assert_eq!(filter.cluster_type, ClusterType::HanaScaleOut);
        assert_eq!(filter.provider, Provider::Aws);

        let host = Target { kind: TargetKind::Host, ..target };
        assert_eq!(host.catalog_filter().cluster_type, ClusterType::All);
    }
}
