pub mod catalog;
pub mod parser;
pub mod reconcile;
pub mod rules;
pub mod validator;

pub use crate::domain::model::{PairValidation, ValidationResult};
pub use crate::domain::ports::{CardCatalog, ConfigProvider, Storage};
pub use crate::utils::error::Result;
