//! Which models forecast which temporal level.

use crate::error::{ReconcileError, Result};
use std::collections::BTreeMap;

/// Model assignment for the levels of a hierarchy.
///
/// # Example
/// ```
/// use temporal_reconcile::thief::ModelSelection;
///
/// let uniform = ModelSelection::uniform("Naive");
/// assert_eq!(uniform.resolve(&[1, 2, 4]).unwrap().len(), 3);
///
/// let per_level = ModelSelection::per_level([
///     (1, vec!["Naive", "SES"]),
///     (2, vec!["SES"]),
/// ]);
/// assert!(per_level.resolve(&[1, 2, 4]).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSelection {
    /// The same model on every level.
    Uniform(String),
    /// One or more models per aggregation factor.
    PerLevel(BTreeMap<usize, Vec<String>>),
}

impl ModelSelection {
    pub fn uniform(model: impl Into<String>) -> Self {
        Self::Uniform(model.into())
    }

    pub fn per_level<I, M, S>(levels: I) -> Self
    where
        I: IntoIterator<Item = (usize, M)>,
        M: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::PerLevel(
            levels
                .into_iter()
                .map(|(factor, models)| (factor, models.into_iter().map(Into::into).collect()))
                .collect(),
        )
    }

    /// Model list for every factor, aligned with `factors`.
    ///
    /// Fails when a per-level selection does not name exactly the given
    /// factors, or assigns no model to one of them.
    pub fn resolve(&self, factors: &[usize]) -> Result<Vec<Vec<String>>> {
        match self {
            Self::Uniform(model) => Ok(vec![vec![model.clone()]; factors.len()]),
            Self::PerLevel(map) => {
                if map.len() != factors.len() {
                    return Err(ReconcileError::Configuration(format!(
                        "{} model assignments for {} temporal levels",
                        map.len(),
                        factors.len()
                    )));
                }
                factors
                    .iter()
                    .map(|factor| match map.get(factor) {
                        Some(models) if !models.is_empty() => Ok(models.clone()),
                        Some(_) => Err(ReconcileError::Configuration(format!(
                            "no model assigned to level {factor}"
                        ))),
                        None => Err(ReconcileError::Configuration(format!(
                            "level {factor} is missing from the model selection"
                        ))),
                    })
                    .collect()
            }
        }
    }
}

impl From<&str> for ModelSelection {
    fn from(model: &str) -> Self {
        Self::uniform(model)
    }
}

impl From<String> for ModelSelection {
    fn from(model: String) -> Self {
        Self::Uniform(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_applies_to_every_level() {
        let resolved = ModelSelection::from("SES").resolve(&[1, 2, 3, 6]).unwrap();
        assert_eq!(resolved.len(), 4);
        assert!(resolved.iter().all(|models| models == &vec!["SES".to_string()]));
    }

    #[test]
    fn per_level_follows_factor_order() {
        let selection = ModelSelection::per_level([
            (4, vec!["SES"]),
            (1, vec!["Naive", "SeasonalNaive"]),
            (2, vec!["HistoricAverage"]),
        ]);
        let resolved = selection.resolve(&[1, 2, 4]).unwrap();

        assert_eq!(resolved[0], vec!["Naive", "SeasonalNaive"]);
        assert_eq!(resolved[1], vec!["HistoricAverage"]);
        assert_eq!(resolved[2], vec!["SES"]);
    }

    #[test]
    fn count_mismatch_is_configuration_error() {
        let selection = ModelSelection::per_level([(1, vec!["Naive"]), (2, vec!["Naive"])]);
        assert!(matches!(
            selection.resolve(&[1, 2, 3, 6]),
            Err(ReconcileError::Configuration(_))
        ));
    }

    #[test]
    fn unknown_factor_or_empty_list_is_rejected() {
        let wrong_key = ModelSelection::per_level([(1, vec!["Naive"]), (5, vec!["Naive"])]);
        assert!(wrong_key.resolve(&[1, 2]).is_err());

        let empty = ModelSelection::per_level([(1, vec!["Naive"]), (2, Vec::<&str>::new())]);
        assert!(empty.resolve(&[1, 2]).is_err());
    }
}
