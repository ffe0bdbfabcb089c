pub mod config;
pub mod domain;
pub mod errors;
pub mod registry;
pub mod store;
pub mod tier;
pub mod validation;

pub use domain::customer::{
    parse_timestamp, Customer, CustomerId, CustomerInput, CustomerView, NewCustomer,
};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use registry::CustomerRegistry;
pub use store::{CustomerStore, StoreError};
pub use tier::{classify, Tier};
