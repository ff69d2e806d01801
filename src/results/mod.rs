//! Result types, aggregation and the client-facing response
//!
//! Engines produce [`RawResult`]s into a [`ResultContainer`]; the normalizer
//! turns them into [`SearchHit`]s inside a [`SearchResponse`].

mod container;
pub mod normalize;
mod response;
mod types;

pub use container::ResultContainer;
pub use response::*;
pub use types::*;
