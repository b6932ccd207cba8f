mod table;

pub use table::{SchemeTable, SchemeTableError};

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::domain::Demographics;
use super::repository::RepositoryError;

/// Caste category that admits every applicant.
pub const ANY_CATEGORY: &str = "Any";

/// Financial-aid programme and its eligibility rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scheme {
    pub id: u32,
    pub name: String,
    pub min_grade: u8,
    pub max_grade: u8,
    /// Highest annual family income (inclusive) the scheme accepts.
    pub income_limit: u32,
    pub caste_category: String,
}

impl Scheme {
    pub fn admits(&self, criteria: &SchemeCriteria) -> bool {
        let grade_ok = (self.min_grade..=self.max_grade).contains(&criteria.grade_level);
        let income_ok = criteria.family_income <= self.income_limit;
        let caste_ok = self.caste_category.eq_ignore_ascii_case(ANY_CATEGORY)
            || self
                .caste_category
                .eq_ignore_ascii_case(criteria.caste_category.trim());
        grade_ok && income_ok && caste_ok
    }
}

/// Lookup key derived from a student's demographics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemeCriteria {
    pub grade_level: u8,
    pub family_income: u32,
    pub caste_category: String,
}

impl SchemeCriteria {
    /// Returns `None` when income was never declared, since no income ceiling can be checked.
    pub fn from_demographics(demographics: &Demographics) -> Option<Self> {
        demographics.family_income.map(|family_income| Self {
            grade_level: demographics.grade_level,
            family_income,
            caste_category: demographics.caste_category.clone(),
        })
    }
}

/// Source of candidate schemes. Implementations may filter coarsely; the
/// matcher re-checks every rule.
pub trait SchemeCatalog: Send + Sync {
    fn candidates(&self, criteria: &SchemeCriteria) -> Result<Vec<Scheme>, RepositoryError>;
}

/// Picks the best-fit scheme: the matching row with the lowest id.
pub struct EligibilityMatcher<C> {
    catalog: Arc<C>,
}

impl<C> EligibilityMatcher<C>
where
    C: SchemeCatalog,
{
    pub fn new(catalog: Arc<C>) -> Self {
        Self { catalog }
    }

    pub fn match_scheme(
        &self,
        demographics: &Demographics,
    ) -> Result<Option<Scheme>, RepositoryError> {
        let Some(criteria) = SchemeCriteria::from_demographics(demographics) else {
            return Ok(None);
        };

        let mut candidates = self.catalog.candidates(&criteria)?;
        candidates.sort_by_key(|scheme| scheme.id);

        Ok(candidates
            .into_iter()
            .find(|scheme| scheme.admits(&criteria)))
    }
}
