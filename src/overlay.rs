//! What a host view draws on top of the scene.
//!
//! The overlay is derived from the viewer's published state only. It never
//! reaches into the scene.

use crate::{flow::Viewer, placer::PlacementProgress};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatBadge {
    pub label: &'static str,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LegendEntry {
    pub category: String,
    /// `#rrggbb`
    pub colour: String,
    pub placed: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Overlay {
    /// Shown instead of everything else while the scene is not ready.
    pub progress_label: Option<String>,
    pub badges: Vec<StatBadge>,
    pub legend: Vec<LegendEntry>,
    pub truncation_notice: Option<String>,
    pub selection_label: Option<String>,
}

impl Overlay {
    pub fn from_viewer(viewer: &Viewer) -> Self {
        let status = viewer.status();
        if !status.is_ready {
            let label = if viewer.is_initializing() {
                "Waiting for the viewport...".to_string()
            } else if let Some(reason) = &status.renderer_error {
                format!("3D view unavailable: {}", reason)
            } else {
                "No model loaded".to_string()
            };
            return Self {
                progress_label: Some(label),
                ..Default::default()
            };
        }

        let placed = viewer.placed_elements();
        let mut legend: Vec<LegendEntry> = Vec::new();
        for element in placed {
            match legend.iter_mut().find(|entry| entry.category == element.category) {
                Some(entry) => entry.placed += 1,
                None => legend.push(LegendEntry {
                    category: element.category.clone(),
                    colour: element.base_colour.hex(),
                    placed: 1,
                }),
            }
        }

        let selection_label = status.selected_element_id.as_deref().map(|id| {
            placed
                .iter()
                .find(|element| element.id == id)
                .map(|element| format!("{} ({})", element.display_name, element.category))
                .unwrap_or_else(|| id.to_string())
        });

        let badges = vec![
            StatBadge {
                label: "Elements",
                value: status.placed_count.to_string(),
            },
            StatBadge {
                label: "Available",
                value: status.total_available.to_string(),
            },
            StatBadge {
                label: "Selected",
                value: status
                    .selected_element_id
                    .clone()
                    .unwrap_or_else(|| "none".to_string()),
            },
            StatBadge {
                label: "Mode",
                value: if status.wireframe_enabled {
                    "wireframe".to_string()
                } else {
                    "solid".to_string()
                },
            },
        ];

        let truncation_notice = status.truncated.then(|| {
            format!(
                "Showing {} of {} elements",
                status.placed_count, status.total_available
            )
        });

        Self {
            progress_label: None,
            badges,
            legend,
            truncation_notice,
            selection_label,
        }
    }

    /// Shown from a progress update while elements are being placed.
    pub fn loading(progress: &PlacementProgress) -> Self {
        Self {
            progress_label: Some(format!("Loading 3D model... {}%", progress.percent)),
            ..Default::default()
        }
    }

    /// One-line summary, e.g. for a window title.
    pub fn title(&self) -> String {
        if let Some(progress) = &self.progress_label {
            return progress.clone();
        }
        let mut title = match &self.truncation_notice {
            Some(notice) => notice.clone(),
            None => {
                let count = self
                    .badges
                    .iter()
                    .find(|badge| badge.label == "Elements")
                    .map(|badge| badge.value.as_str())
                    .unwrap_or("0");
                format!("{} elements", count)
            }
        };
        if let Some(selection) = &self.selection_label {
            title.push_str(" | ");
            title.push_str(selection);
        }
        title
    }
}
