//! IO modules - external system interfaces
//!
//! This module contains all external IO operations:
//! - `store` - File-backed fleet data (devices, groups, positions)
//! - `audit` - Audit sinks (structured log, JSONL file)
//! - `egress` - Search result output (JSON or JSONL)

pub mod audit;
pub mod egress;
pub mod store;

// Re-export commonly used types
pub use audit::{AuditFanout, JsonlAudit, TracingAudit};
pub use egress::VisitEgress;
pub use store::FleetStore;
