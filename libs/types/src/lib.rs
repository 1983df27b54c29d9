//! Types library for the quote services
//!
//! Shared definitions for the batch quote aggregator, the HTTP gateway and
//! polling clients.
//!
//! # Modules
//! - `symbol`: Instrument identifiers and de-duplication
//! - `quote`: Per-symbol outcomes (`QuoteResult`, `FailureReason`)
//! - `wire`: JSON envelope of the batch endpoint (`c`/`d`/`dp`)
//! - `errors`: Error taxonomy

pub mod symbol;
pub mod quote;
pub mod wire;
pub mod errors;

// Library version constant
pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::symbol::*;
    pub use crate::quote::*;
    pub use crate::wire::*;
    pub use crate::errors::*;
}
