//! Use-case services over a collection store.
//!
//! # Responsibility
//! - Expose the todo and cart workflows with their variant-specific rules.
//! - Keep front ends decoupled from slot and store details.

pub mod cart_service;
pub mod todo_service;
