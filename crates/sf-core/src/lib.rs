//! sf-core: shared foundation for segflow.
//!
//! Contains:
//! - units (uom SI types + constructors)
//! - numeric (finiteness checks + norms)
//! - ids (compact IDs for mission segments)
//! - error (shared error types)

pub mod error;
pub mod ids;
pub mod numeric;
pub mod units;

pub use error::{SfError, SfResult};
pub use ids::*;
pub use numeric::*;
pub use units::*;
