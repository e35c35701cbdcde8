pub mod domain;
pub mod health;
pub mod keyword;
pub mod query;
