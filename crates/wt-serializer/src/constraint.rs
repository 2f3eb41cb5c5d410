//! Newline-count constraints between adjacent output chunks.

/// Allowed number of newlines at one boundary.
///
/// Two constraints meeting at a boundary are merged by taking the larger
/// minimum and the smaller maximum. An empty merged range resolves to its
/// minimum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeparatorConstraint {
    /// Fewest newlines allowed.
    pub min: u32,
    /// Most newlines allowed (`None` = unbounded).
    pub max: Option<u32>,
}

impl SeparatorConstraint {
    /// No constraint: `[0, unbounded]`.
    #[must_use]
    pub const fn none() -> Self {
        Self { min: 0, max: None }
    }

    /// Exactly `n` newlines.
    #[must_use]
    pub const fn exactly(n: u32) -> Self {
        Self::range(n, n)
    }

    /// Between `min` and `max` newlines inclusive.
    #[must_use]
    pub const fn range(min: u32, max: u32) -> Self {
        Self {
            min,
            max: Some(max),
        }
    }

    /// At least `min` newlines.
    #[must_use]
    pub const fn at_least(min: u32) -> Self {
        Self { min, max: None }
    }

    /// Combine with the constraint from the other side of a boundary.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        let max = match (self.max, other.max) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        Self {
            min: self.min.max(other.min),
            max,
        }
    }

    /// Lower the maximum to at most `cap`.
    #[must_use]
    pub fn cap(self, cap: u32) -> Self {
        self.merge(Self::range(0, cap))
    }

    /// The range left for a separator when `newlines` already end the output.
    #[must_use]
    pub fn after_emitted(self, newlines: u32) -> Self {
        Self {
            min: self.min.saturating_sub(newlines),
            max: self.max.map(|max| max.saturating_sub(newlines)),
        }
    }

    /// Whether some newline count satisfies the constraint.
    #[must_use]
    pub fn is_satisfiable(&self) -> bool {
        self.max.is_none_or(|max| self.min <= max)
    }

    /// The range after the empty-range tie-break: `[min, min]` when empty.
    #[must_use]
    pub fn effective(self) -> Self {
        if self.is_satisfiable() {
            self
        } else {
            Self::exactly(self.min)
        }
    }

    /// Whether `newlines` lies within the range.
    #[must_use]
    pub fn allows(&self, newlines: usize) -> bool {
        let Ok(count) = u32::try_from(newlines) else {
            return false;
        };
        count >= self.min && self.max.is_none_or(|max| count <= max)
    }
}
