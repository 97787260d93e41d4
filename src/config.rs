//! Batch configuration.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Which barriers a ray query may report.
///
/// Only walls are ray targets; the filter controls whether walls inside
/// linked models are included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BarrierFilter {
    pub include_linked: bool,
}

impl BarrierFilter {
    /// Walls of the target model and of every linked model.
    #[must_use]
    pub fn walls() -> Self {
        Self {
            include_linked: true,
        }
    }

    /// Walls owned by the target model only.
    #[must_use]
    pub fn host_walls() -> Self {
        Self {
            include_linked: false,
        }
    }
}

impl Default for BarrierFilter {
    fn default() -> Self {
        Self::walls()
    }
}

/// Names and lookups that drive one placement batch.
///
/// Defaults match the project templates the tool was written for: the
/// mechanical ("ОВ") model, the "Отверстие" opening family and its
/// "ширина"/"высота" size parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PlacementConfig {
    /// Substring of the mechanical model's title.
    pub source_title_needle: String,
    /// Family name of the placeholder type in the target model.
    pub placeholder_family: String,
    pub width_parameter: String,
    pub height_parameter: String,
    pub transaction_label: String,
    pub barrier_filter: BarrierFilter,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            source_title_needle: "ОВ".to_owned(),
            placeholder_family: "Отверстие".to_owned(),
            width_parameter: "ширина".to_owned(),
            height_parameter: "высота".to_owned(),
            transaction_label: "Создание отверстий".to_owned(),
            barrier_filter: BarrierFilter::walls(),
        }
    }
}

impl PlacementConfig {
    #[must_use]
    pub fn with_source_title_needle(mut self, needle: impl Into<String>) -> Self {
        self.source_title_needle = needle.into();
        self
    }

    #[must_use]
    pub fn with_placeholder_family(mut self, family: impl Into<String>) -> Self {
        self.placeholder_family = family.into();
        self
    }

    /// Sets the names of the width and height parameters on the placeholder.
    #[must_use]
    pub fn with_size_parameters(
        mut self,
        width: impl Into<String>,
        height: impl Into<String>,
    ) -> Self {
        self.width_parameter = width.into();
        self.height_parameter = height.into();
        self
    }

    #[must_use]
    pub fn with_transaction_label(mut self, label: impl Into<String>) -> Self {
        self.transaction_label = label.into();
        self
    }

    #[must_use]
    pub fn with_barrier_filter(mut self, filter: BarrierFilter) -> Self {
        self.barrier_filter = filter;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let config = PlacementConfig::default()
            .with_source_title_needle("MEP")
            .with_placeholder_family("Opening")
            .with_size_parameters("Width", "Height")
            .with_barrier_filter(BarrierFilter::host_walls());

        assert_eq!(config.source_title_needle, "MEP");
        assert_eq!(config.placeholder_family, "Opening");
        assert_eq!(config.width_parameter, "Width");
        assert_eq!(config.height_parameter, "Height");
        assert!(!config.barrier_filter.include_linked);
        assert_eq!(config.transaction_label, "Создание отверстий");
    }
}
