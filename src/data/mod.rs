pub mod builder;
pub mod covariate;
pub mod dosage;
pub mod request;
pub mod unit;
pub mod value;
pub use covariate::*;
pub use dosage::*;
pub use request::{RequestContext, Treatment};
pub use unit::Unit;
pub use value::{CovariateValue, DataType};
