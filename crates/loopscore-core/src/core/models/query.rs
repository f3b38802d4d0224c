use super::ids::{LoopId, LoopKey, QueryId};
use super::result::MISSING_SEQUENCE_ID;
use phf::{Map, phf_map};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoopCategory {
    Hairpin,  // HL
    Internal, // IL
    Junction, // J3
}

static CATEGORY_TAGS: Map<&'static str, LoopCategory> = phf_map! {
    "HL" => LoopCategory::Hairpin,
    "HAIRPIN" => LoopCategory::Hairpin,
    "IL" => LoopCategory::Internal,
    "INTERNAL" => LoopCategory::Internal,
    "J3" => LoopCategory::Junction,
    "JUNCTION" => LoopCategory::Junction,
};

impl LoopCategory {
    /// Short tag used both in query files and as the model repository subdirectory.
    pub fn tag(&self) -> &'static str {
        match self {
            LoopCategory::Hairpin => "HL",
            LoopCategory::Internal => "IL",
            LoopCategory::Junction => "J3",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown loop category: '{0}'")]
pub struct ParseLoopCategoryError(String);

impl FromStr for LoopCategory {
    type Err = ParseLoopCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CATEGORY_TAGS
            .get(s.trim().to_ascii_uppercase().as_str())
            .copied()
            .ok_or_else(|| ParseLoopCategoryError(s.to_string()))
    }
}

impl fmt::Display for LoopCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopSequence {
    pub id: String,
    pub sequence: String,
}

impl LoopSequence {
    pub fn new(id: impl Into<String>, sequence: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            sequence: sequence.into(),
        }
    }

    /// The id under which this instance is tracked; empty ids map to [`MISSING_SEQUENCE_ID`].
    pub fn effective_id(&self) -> &str {
        if self.id.is_empty() {
            MISSING_SEQUENCE_ID
        } else {
            &self.id
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Loop {
    id: LoopId,
    category: LoopCategory,
    query_id: QueryId,
    sequences: Vec<LoopSequence>,
}

impl Loop {
    pub fn id(&self) -> LoopId {
        self.id
    }

    pub fn category(&self) -> LoopCategory {
        self.category
    }

    pub fn query_id(&self) -> &str {
        &self.query_id
    }

    pub fn sequences(&self) -> &[LoopSequence] {
        &self.sequences
    }

    pub fn key(&self) -> LoopKey {
        LoopKey::new(self.query_id.clone(), self.id)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("Loop {loop_id} appears more than once in query '{query_id}'")]
    DuplicateLoop { query_id: QueryId, loop_id: LoopId },
}

/// An ordered collection of loops. Loop order is the scoring and result order.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    id: QueryId,
    loops: Vec<Loop>,
    loop_ids: HashSet<LoopId>,
}

impl Query {
    pub fn new(id: impl Into<QueryId>) -> Self {
        Self {
            id: id.into(),
            loops: Vec::new(),
            loop_ids: HashSet::new(),
        }
    }

    pub fn add_loop(
        &mut self,
        loop_id: LoopId,
        category: LoopCategory,
        sequences: Vec<LoopSequence>,
    ) -> Result<&Loop, QueryError> {
        if !self.loop_ids.insert(loop_id) {
            return Err(QueryError::DuplicateLoop {
                query_id: self.id.clone(),
                loop_id,
            });
        }
        self.loops.push(Loop {
            id: loop_id,
            category,
            query_id: self.id.clone(),
            sequences,
        });
        Ok(&self.loops[self.loops.len() - 1])
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn loops(&self) -> &[Loop] {
        &self.loops
    }

    pub fn len(&self) -> usize {
        self.loops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loops.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Loop> {
        self.loops.iter()
    }
}

impl<'a> IntoIterator for &'a Query {
    type Item = &'a Loop;
    type IntoIter = std::slice::Iter<'a, Loop>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
