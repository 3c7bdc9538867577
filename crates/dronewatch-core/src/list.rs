//! Windowed list view over tracked drones for the sidebar.

use serde::Serialize;

use crate::models::{Category, Entity};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListRow {
    pub id: String,
    pub display_name: String,
    pub status_label: String,
    pub category: Category,
    pub color: &'static str,
    pub altitude: f64,
    pub battery_pct: f64,
    /// Highlighted because it is the current selection
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListPage {
    pub rows: Vec<ListRow>,
    /// Number of drones matching the filter, before windowing
    pub total: usize,
    pub offset: usize,
}

/// Scroll window and filter for the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListProjection {
    pub offset: usize,
    pub limit: usize,
    pub category: Option<Category>,
}

impl Default for ListProjection {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
            category: None,
        }
    }
}

impl ListProjection {
    pub fn window(offset: usize, limit: usize) -> Self {
        Self {
            offset,
            limit,
            ..Self::default()
        }
    }

    pub fn only(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    /// Rows ordered by display name, then id.
    pub fn project<'a>(
        &self,
        entities: impl IntoIterator<Item = &'a Entity>,
        selected: Option<&str>,
    ) -> ListPage {
        let mut matching: Vec<&Entity> = entities
            .into_iter()
            .filter(|e| self.category.map_or(true, |c| e.category == c))
            .collect();
        matching.sort_by(|a, b| {
            a.display_name
                .cmp(&b.display_name)
                .then_with(|| a.id.cmp(&b.id))
        });

        let total = matching.len();
        let rows = matching
            .into_iter()
            .skip(self.offset)
            .take(self.limit)
            .map(|e| ListRow {
                id: e.id.clone(),
                display_name: e.display_name.clone(),
                status_label: e.status_label.clone(),
                category: e.category,
                color: e.category.color(),
                altitude: e.position.altitude,
                battery_pct: e.battery_pct,
                selected: selected == Some(e.id.as_str()),
            })
            .collect();

        ListPage {
            rows,
            total,
            offset: self.offset,
        }
    }
}
