use std::fmt;

pub type QueryId = String;
pub type LoopId = i64;
pub type ModelId = String;
pub type ModelName = String;

/// Stable identity of a loop across scoring and persistence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LoopKey {
    pub query_id: QueryId,
    pub loop_id: LoopId,
}

impl LoopKey {
    pub fn new(query_id: impl Into<QueryId>, loop_id: LoopId) -> Self {
        Self {
            query_id: query_id.into(),
            loop_id,
        }
    }
}

impl fmt::Display for LoopKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.query_id, self.loop_id)
    }
}
