// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-node health status.

use serde::{Deserialize, Serialize};

/// Health of a validated pipeline item, in ascending severity.
///
/// Statuses aggregate as a maximum: a pipeline is only as healthy as
/// its sickest item.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum HealthStatus {
    /// No problems found
    #[default]
    Healthy,
    /// Soft warning; the pipeline still translates
    Chilled,
    /// Hard error; the pipeline cannot be translated
    Sick,
}

impl HealthStatus {
    /// The worse of two statuses.
    pub fn worst(self, other: Self) -> Self {
        self.max(other)
    }

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Chilled => "chilled",
            Self::Sick => "sick",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(HealthStatus::Healthy < HealthStatus::Chilled);
        assert!(HealthStatus::Chilled < HealthStatus::Sick);
    }

    #[test]
    fn test_worst_is_max() {
        assert_eq!(
            HealthStatus::Healthy.worst(HealthStatus::Chilled),
            HealthStatus::Chilled
        );
        assert_eq!(
            HealthStatus::Sick.worst(HealthStatus::Chilled),
            HealthStatus::Sick
        );
    }
}
