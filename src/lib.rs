//! Project planning engine: critical path scheduling, resource balancing,
//! budget estimation with earned value, and Monte-Carlo risk analysis,
//! combined by [`planner::ProjectPlanner`] into versioned plans.

pub mod budget;
pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod output;
pub mod planner;
pub mod repository;
pub mod resource;
pub mod retry;
pub mod risk;
pub mod timeline;
