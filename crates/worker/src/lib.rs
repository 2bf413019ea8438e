//! Cache-policy engine for lantern.
//!
//! This crate provides the request model, resource classification, the
//! retrieval policies, the network backend, and the controller that
//! dispatches worker lifecycle events.

pub mod classify;
pub mod controller;
pub mod fetch;
pub mod policy;
pub mod request;
pub mod response;

pub use classify::{ClassifyRules, ResourceClass, classify};
pub use controller::{
    Controller, EventOutcome, InstallFailure, InstallReport, SweepReport, WorkerCommand, WorkerEvent,
};
pub use fetch::{FetchConfig, FetchOutcome, FetchResponse, HttpBackend, ReqwestBackend};
pub use policy::Policy;
pub use request::{Destination, WorkerRequest};
pub use response::{ServedFrom, WorkerResponse};

pub use reqwest::{Method, StatusCode};
