//! Output persistence for collected and processed data.
//!
//! # Submodules
//!
//! - [`json`]: writes the raw post list and the day-block file, and loads
//!   previously written raw files for re-aggregation
//!
//! # Output Structure
//!
//! ```text
//! data/raw/
//! └── stocks.json
//!
//! data/processed/
//! └── stocks_preprocessed/
//!     └── posts_by_blocks_of_days.json
//! ```

pub mod json;
