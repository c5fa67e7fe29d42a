//! Study totals and display formatting.

use serde::{Deserialize, Serialize};

use crate::categories::Category;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub id: String,
    pub name: String,
    pub color: String,
    pub total_minutes: u64,
    pub formatted: String,
}

/// Accumulated time across every category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StudySummary {
    pub total_minutes: u64,
    pub formatted_total: String,
    pub categories: Vec<CategoryTotal>,
}

impl StudySummary {
    /// Summarize categories in their stored order.
    pub fn from_categories(categories: &[Category]) -> Self {
        let total_minutes = categories.iter().map(|c| c.total_minutes).sum();
        Self {
            total_minutes,
            formatted_total: format_minutes(total_minutes),
            categories: categories
                .iter()
                .map(|c| CategoryTotal {
                    id: c.id.clone(),
                    name: c.name.clone(),
                    color: c.color.clone(),
                    total_minutes: c.total_minutes,
                    formatted: format_minutes(c.total_minutes),
                })
                .collect(),
        }
    }

    /// No categories, or nothing recorded in any of them.
    pub fn is_empty(&self) -> bool {
        self.total_minutes == 0
    }
}

/// `"2h 5m"`, or `"45m"` under an hour.
pub fn format_minutes(total_minutes: u64) -> String {
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

/// `MM:SS` countdown, rounding partial seconds up.
pub fn format_countdown(remaining_ms: u64) -> String {
    let total_seconds = remaining_ms.div_ceil(1000);
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}
