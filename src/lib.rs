//! Blend Optimizer
//!
//! Finds the cheapest mix of raw-material batches that meets a target price and sensory profile,
//! under stock, cardinality and minimum-share limits, while favouring older stock. Blends are
//! modelled as mixed-integer linear programs and solved with `good_lp`; when a first attempt is
//! infeasible or too expensive, the relaxing engine loosens tolerances and tries again.
//!
//! ```no_run
//! use blend_optimizer::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! initialise()?;
//!
//! let batches = vec![Batch::new(
//!     "B01",
//!     "Robusta",
//!     AttributeProfile::new(115_000.0, 4.0, 8.0, 3.0, 2.5),
//!     1_000.0,
//!     30,
//! )];
//! let target = BlendTarget::new(
//!     OptimizationMode::Balanced,
//!     AttributeProfile::new(120_000.0, 4.0, 8.0, 3.0, 2.5),
//!     100.0,
//! );
//!
//! let request = BlendRequest::new(batches, target).with_algorithm(Algorithm::Relaxing);
//! let result = BlendService::new().optimize(&request)?;
//!
//! assert!(result.feasible);
//! # Ok(())
//! # }
//! ```

pub mod attributes;
pub mod batches;
pub mod engine;
pub mod fixtures;
pub mod observability;
pub mod params;
pub mod prelude;
pub mod relaxation;
pub mod report;
pub mod result;
pub mod service;
pub mod solvers;
pub mod target;
pub mod utils;
