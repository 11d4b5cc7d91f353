pub mod config;
pub mod error;
pub mod models;
pub mod postgres;
pub mod readiness;
pub mod report;
pub mod repository;
pub mod retry;
pub mod service;
pub mod visual;

pub use crate::config::Config;
pub use crate::error::{ReportError, Result};
pub use crate::readiness::{Readiness, ReadinessProbe, wait_for_ready, wait_for_ready_with};
pub use crate::report::{Report, ReportKind};
