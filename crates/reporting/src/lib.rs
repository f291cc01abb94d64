//! Campaign analytics over the four influencer tables — filter engine,
//! ROAS/engagement aggregations, and report assembly/export.

pub mod filters;
pub mod kpi;
pub mod report;

pub use filters::{FilterOptions, FilterSelection};
pub use report::{CampaignReport, ReportEngine, ReportSection};
