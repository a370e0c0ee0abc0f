// Domain module: business models, algebraic model and solver contract

pub mod catalog;
pub mod expression;
pub mod inventory;
pub mod models;
pub mod profile;
pub mod solver_service;
pub mod value_objects;

pub use catalog::*;
pub use expression::*;
pub use inventory::*;
pub use models::*;
pub use profile::*;
pub use solver_service::*;
pub use value_objects::*;
