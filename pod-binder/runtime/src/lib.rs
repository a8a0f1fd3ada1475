#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub use pod_binder_controller as controller;
pub use pod_binder_core as core;
pub use pod_binder_k8s_api as k8s;

mod args;
mod deliver;

pub use self::args::Args;
