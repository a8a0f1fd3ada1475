use crate::labels::Labels;

/// A point-in-time snapshot of a pod, fetched fresh for every decision.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorkloadInstance {
    pub name: String,
    pub namespace: String,
    pub labels: Labels,

    /// The pod IP, if one has been assigned.
    pub address: Option<String>,

    /// Whether the pod's `Ready` condition is true.
    pub ready: bool,
}

/// A named routing target selected by its labels.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Service {
    pub name: String,
    pub namespace: String,
    pub labels: Labels,
}
