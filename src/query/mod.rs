//! Canonical request and result shapes shared by both backends.

mod descriptor;
mod params;
mod row;

pub use descriptor::{
    Filters, MAX_LIMIT, MAX_WINDOW_DAYS, MAX_YEAR, MIN_YEAR, QueryDescriptor, QueryKind,
};
pub use params::QueryParams;
pub use row::ResultRow;
