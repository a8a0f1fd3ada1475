#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod dedup;
mod dispatch;
mod flow;
mod metrics;
mod queue;
mod ready;
mod resolve;
mod router;
mod validate;


pub use self::{
    dedup::{Deduplicator, DEFAULT_WINDOW as DEFAULT_DEDUP_WINDOW},
    dispatch::{Dispatcher, LogUpstream},
    flow::{FlowError, Pipeline, DEFAULT_READY_GRACE},
    metrics::Metrics,
    queue::FlowQueue,
    ready::{ReadinessWaiter, TimedOut, DEFAULT_POLL_INTERVAL, DEFAULT_TIMEOUT},
    resolve::{ServiceResolver, TieBreak, DEFAULT_LIST_LIMIT, DEFAULT_SELECTOR_KEYS},
    router::{Config, Router},
    validate::EventValidator,
};
