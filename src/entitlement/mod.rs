pub(crate) mod entitlement_model;
pub(crate) mod entitlement_resolver;

pub use entitlement_model::EntitlementFact;
pub use entitlement_resolver::{resolve, EntitlementResolver};
