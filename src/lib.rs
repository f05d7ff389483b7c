//! Project management information system for donor-funded infrastructure
//! projects.
//!
//! This crate keeps contracts, payments, work progress approvals,
//! procurement plans, geographic coverage and KPI indicators in SQLite and
//! exposes them over an HTTP JSON API with role-based permission checks.

#![warn(missing_docs)]

pub mod access;
pub mod api;
pub mod calculation;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod reports;
pub mod workflow;
