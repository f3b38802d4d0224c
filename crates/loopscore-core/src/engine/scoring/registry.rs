use super::LoopScorer;
use crate::core::models::query::LoopCategory;
use std::collections::HashMap;
use std::fmt;

/// Maps loop categories to the scorer responsible for them.
///
/// Categories without a registered scorer produce an empty result list.
#[derive(Default)]
pub struct ScorerRegistry {
    scorers: HashMap<LoopCategory, Box<dyn LoopScorer>>,
}

impl ScorerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `scorer` for `category`, returning the scorer it replaced.
    pub fn register(
        &mut self,
        category: LoopCategory,
        scorer: impl LoopScorer + 'static,
    ) -> Option<Box<dyn LoopScorer>> {
        self.scorers.insert(category, Box::new(scorer))
    }

    pub fn with(mut self, category: LoopCategory, scorer: impl LoopScorer + 'static) -> Self {
        self.register(category, scorer);
        self
    }

    pub fn scorer_for(&self, category: LoopCategory) -> Option<&dyn LoopScorer> {
        self.scorers.get(&category).map(|s| s.as_ref())
    }

    pub fn supports(&self, category: LoopCategory) -> bool {
        self.scorers.contains_key(&category)
    }
}

impl fmt::Debug for ScorerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut categories: Vec<&LoopCategory> = self.scorers.keys().collect();
        categories.sort_by_key(|c| c.tag());
        f.debug_struct("ScorerRegistry")
            .field("categories", &categories)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::query::{Loop, Query};
    use crate::core::models::result::LoopResult;
    use crate::core::repository::ModelSet;
    use crate::engine::scoring::ScoringError;

    fn empty_scorer(_: &Loop, _: &ModelSet, _: usize) -> Result<Vec<LoopResult>, ScoringError> {
        Ok(Vec::new())
    }

    fn failing_scorer(_: &Loop, _: &ModelSet, _: usize) -> Result<Vec<LoopResult>, ScoringError> {
        Err(ScoringError::new("boom"))
    }

    #[test]
    fn new_registry_supports_no_category() {
        let registry = ScorerRegistry::new();
        assert!(!registry.supports(LoopCategory::Internal));
        assert!(registry.scorer_for(LoopCategory::Hairpin).is_none());
    }

    #[test]
    fn registered_scorer_is_returned_for_its_category_only() {
        let registry = ScorerRegistry::new().with(LoopCategory::Internal, empty_scorer);
        assert!(registry.supports(LoopCategory::Internal));
        assert!(!registry.supports(LoopCategory::Junction));
    }

    #[test]
    fn register_replaces_existing_scorer() {
        let mut registry = ScorerRegistry::new();
        assert!(registry.register(LoopCategory::Internal, failing_scorer).is_none());
        assert!(registry.register(LoopCategory::Internal, empty_scorer).is_some());

        let mut query = Query::new("Q");
        let lp = query.add_loop(1, LoopCategory::Internal, Vec::new()).unwrap();
        let scorer = registry.scorer_for(LoopCategory::Internal).unwrap();
        assert!(scorer.score(lp, &ModelSet::default(), 20).unwrap().is_empty());
    }

    #[test]
    fn debug_lists_registered_categories() {
        let registry = ScorerRegistry::new().with(LoopCategory::Internal, empty_scorer);
        assert_eq!(
            format!("{registry:?}"),
            "ScorerRegistry { categories: [Internal] }"
        );
    }
}
