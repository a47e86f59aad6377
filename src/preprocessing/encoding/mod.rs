//! Encoders turning listing labels into numbers.
//!
//! - [`CategoricalEncoder`]: one label column through a closed lookup table.
//! - [`CompoundSplitter`]: one compound label column into several numeric columns.
//! - [`AppliancesExpander`]: a free-text inventory into per-appliance 0/1 flags.

pub mod appliances;
pub mod categorical;
pub mod compound;

pub use appliances::AppliancesExpander;
pub use categorical::CategoricalEncoder;
pub use compound::CompoundSplitter;
