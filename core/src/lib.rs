//! Synthetic messaging fraud/billing data and the daily fraud report.
//!
//! `simulator` produces the tables, `snapshot` moves them to and from
//! flat files, `report` turns them into daily e-mail summaries.

pub mod billing_model;
pub mod calendar;
pub mod config;
pub mod content_generator;
pub mod error;
pub mod fraud_model;
pub mod pattern_rules;
pub mod record;
pub mod reference;
pub mod report;
pub mod rng;
pub mod simulator;
pub mod snapshot;
pub mod types;
pub mod weighted;

pub use error::{GenError, GenResult};
pub use simulator::{generate, Dataset, EventSimulator};
