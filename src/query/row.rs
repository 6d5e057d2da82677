use serde::{Deserialize, Serialize};

/// One normalized result row, identical in shape regardless of which backend
/// produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    /// Movie id. The same movie carries the same id in both stores.
    pub entity_id: i64,
    pub display_name: String,
    /// Average rating, trending weight or popularity depending on the query kind.
    pub score: f64,
    /// Number of observations backing `score`. Zero is a real value.
    ///
    /// Not unified across backends: for trending queries the relational store
    /// counts ratings while the document store counts raw interaction events.
    pub support_count: i64,
}
