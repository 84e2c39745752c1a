//! Payroll core: roster records in, deterministic period runs out.

pub mod coerce;
pub mod entry;
pub mod service;
pub mod totals;
