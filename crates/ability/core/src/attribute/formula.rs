//! Formulas that turn a child attribute's final value into a parent modifier.
//!
//! Formulas are a closed set dispatched by `match`; authored content picks a
//! variant per edge. All arithmetic is integer so both peers agree exactly.

use crate::ids::AttributeId;

/// Contribution of one child edge to its parent's modifier.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Formula {
    /// `child.final * per_point`
    Linear { per_point: i32 },

    /// `child.final * percent / 100`
    Percent { percent: i32 },

    /// `(child.final / every) * bonus`; a non-positive `every` contributes nothing.
    Step { every: i32, bonus: i32 },

    /// `min(child.final * percent / 100, dependency.max)`.
    ///
    /// The dependency is looked up through the parent's named dependency set and
    /// never propagates changes.
    CappedByDependency { dependency: AttributeId, percent: i32 },
}

impl Formula {
    /// One point of the child is one point of the parent.
    pub const IDENTITY: Self = Formula::Linear { per_point: 1 };

    /// Named dependency read by this formula, if any.
    pub fn dependency(&self) -> Option<AttributeId> {
        match self {
            Formula::CappedByDependency { dependency, .. } => Some(*dependency),
            _ => None,
        }
    }

    /// Evaluates the contribution for `child_final`.
    ///
    /// `dependency_max` resolves a dependency's max value; `None` means the
    /// dependency is missing and the edge contributes 0.
    pub fn evaluate<F>(&self, child_final: i32, dependency_max: F) -> Option<i32>
    where
        F: FnOnce(AttributeId) -> Option<i32>,
    {
        let child = i64::from(child_final);
        let raw = match *self {
            Formula::Linear { per_point } => child * i64::from(per_point),
            Formula::Percent { percent } => child * i64::from(percent) / 100,
            Formula::Step { every, bonus } => {
                if every <= 0 {
                    0
                } else {
                    (child / i64::from(every)) * i64::from(bonus)
                }
            }
            Formula::CappedByDependency {
                dependency,
                percent,
            } => {
                let cap = i64::from(dependency_max(dependency)?);
                (child * i64::from(percent) / 100).min(cap)
            }
        };
        Some(saturate(raw))
    }
}

pub(crate) fn saturate(value: i64) -> i32 {
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}
