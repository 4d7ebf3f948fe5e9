pub mod action;
pub mod agents;
pub mod auth;
pub mod catalog;
pub mod compliance;
pub mod error;
pub mod report;
pub mod selection;
pub mod upstream;
