#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod client;
mod convert;

pub use self::{
    client::KubeClusterApi,
    convert::{is_pod_ready, lifecycle_event, service, workload_instance},
};
pub use k8s_openapi::{
    api::core::v1::{Event, ObjectReference, Pod, PodCondition, PodStatus, Service},
    apimachinery::pkg::apis::meta::v1::{MicroTime, Time},
};
pub use kube::{
    api::{Api, ListParams, ObjectMeta},
    runtime::watcher,
    Client,
};
