mod chain;
mod collection;
pub mod searcher;
mod signature;

pub use chain::{ChainStep, PointerChain, walk};
pub use collection::{ChainKind, PointerChains};
pub use signature::{Signature, format_pattern, parse_pattern};
