//! Conservation diagnostics.
//!
//! The channel scheme conserves mass exactly up to round-off. The tools here
//! verify that after every external step and report segments that went dry
//! beyond empty.
//!
//! # Example
//!
//! ```ignore
//! use sw1d::analysis::{check_waterbalance, negative_volumes};
//!
//! let report = scheduler.run_step(&mut network, &ctx);
//! if let Some(warning) = check_waterbalance(&report.balance, 1e-9, ctx.step) {
//!     eprintln!("{}", warning);
//! }
//! for warning in negative_volumes(&network, ctx.step) {
//!     eprintln!("{}", warning);
//! }
//! ```

mod balance;

pub use balance::{BalanceWarning, WaterBalance, check_waterbalance, negative_volumes};
