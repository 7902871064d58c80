pub(crate) mod alerts_errors;
pub(crate) mod alerts_model;
pub(crate) mod alerts_service;

pub use alerts_errors::AlertError;
pub use alerts_model::{AlertDirection, PriceAlert};
pub use alerts_service::{AlertNotifier, AlertService};
