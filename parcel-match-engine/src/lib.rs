//! Parcel-to-driver matching engine.
//!
//! The engine precomputes shortest distances over the station network,
//! expands every driver offer into a time-expanded graph of
//! `(time, station, offer)` vertices, and routes parcels greedily through it
//! with a capacity-aware Dijkstra search. Routing a parcel narrows the offers
//! it rides and issues continuation offers, so later parcels see the
//! remaining capacity only.
//!
//! [`GreedyMatcher`] implements [`parcel_match_core::Matcher`] on top of
//! [`MatchingModel`].

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod driver;
mod error;
mod greedy;
mod heap;
mod lifecycle;
mod model;
mod offer;
mod search;
mod station_graph;
mod time_expanded;
mod time_table;

pub use driver::{Driver, Pace};
pub use error::EngineError;
pub use greedy::{GreedyMatcher, GreedyMatcherConfig};
pub use heap::{FibonacciHeap, Handle, HeapError};
pub use lifecycle::{OfferLifecycle, Segment, route_distance, segments};
pub use model::{MatchingModel, ShuffleMode};
pub use offer::{Offer, OfferBook, OfferId, OfferTerms};
pub use search::{TimeExpandedDijkstra, TimePath};
pub use station_graph::{DetourPath, StationGraph, StationGraphError};
pub use time_expanded::{EdgeId, EdgeKind, TimeEdge, TimeExpandedGraph, TimeVertex, VertexId};
pub use time_table::TimeTable;
