pub mod access;
pub mod calculator;
pub mod ledger;
pub mod orchestrator;
pub mod policy;
pub mod types;

pub use access::AccessEvaluator;
pub use calculator::CostCalculator;
pub use ledger::{InMemoryUsageLedger, UsageLedger};
pub use orchestrator::BillingOrchestrator;
pub use policy::{AccessPolicy, BillingRate};
