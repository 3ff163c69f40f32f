pub mod policies;

pub use policies::{InMemoryPolicyRepository, PolicyRepository};
