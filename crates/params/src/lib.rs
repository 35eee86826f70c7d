//! # hefacade-params
//!
//! Security parameters for the hefacade workspace.
//!
//! This crate owns everything that happens before an HE context exists:
//! - [`SecurityParameters`]: the heuristic inputs a caller provides, with
//!   validation, a builder, named presets and TOML (de)serialization
//! - [`ChainLengthEstimator`]: pluggable estimation of the modulus-chain length
//! - [`search`]: cyclotomic-index searches for odd and power-of-two rings
//! - [`derive_parameters`]: fills in whatever the caller left unset
//!
//! Engines plug their preferred ring search in through [`CyclotomicSearch`].

pub mod constants;
pub mod derive;
pub mod errors;
pub mod estimate;
pub mod parameters;
pub mod ring;
pub mod search;

pub use derive::{ResolvedParameters, derive_parameters};
pub use errors::{ParamsError, ParamsResult};
pub use estimate::{ChainLengthEstimator, HeuristicChainLength};
pub use parameters::{SecurityParameters, SecurityParametersBuilder};
pub use ring::{ContextBase, RingQuery};
pub use search::CyclotomicSearch;
