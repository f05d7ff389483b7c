//! `Record` implementations, grouped like the schema.

mod access;
mod contract;
mod geography;
mod indicator;
mod project;
mod support;
