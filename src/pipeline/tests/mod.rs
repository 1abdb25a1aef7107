//! Test modules for the message processing pipeline
//!
//! Scenario tests are organized by functional area; shared processor doubles
//! live in `support`.

mod support;

mod failure;
mod ordering;
