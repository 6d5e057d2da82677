pub mod api;
pub mod backend;
pub mod bench;
pub mod compare;
pub mod conf;
pub mod core;
pub mod normalize;
pub mod query;
pub mod service;
pub mod timing;

#[cfg(feature = "testutil")]
pub mod testutil;
