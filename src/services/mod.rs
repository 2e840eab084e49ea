pub mod overview_service;

pub use overview_service::{OverviewError, OverviewService};
