use serde::{Deserialize, Serialize};

use crate::location;

/// Label of the first segment of every trail
pub const ROOT_LABEL: &str = "root";

/// One step of the trail from root to the current directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreadcrumbSegment {
    pub label: String,
    /// Directory this segment navigates to
    pub target_location: String,
    /// False only for the last segment ("you are here")
    pub is_clickable: bool,
}

/// Trail from the storage root to the current directory plus the "up" control
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breadcrumb {
    pub segments: Vec<BreadcrumbSegment>,
    /// Parent of the current directory; `None` (control disabled) at root
    pub up: Option<String>,
}

impl Breadcrumb {
    /// Derive the trail for `current` relative to `root`.
    ///
    /// Both locations are normalized first, so trailing and doubled slashes
    /// do not produce empty segments. Returns `None` if `current` is outside
    /// `root`.
    pub fn derive(root: &str, current: &str) -> Option<Self> {
        let components = location::relative_components(root, current)?;
        let root = location::normalize_dir(root);

        let Some((_, parents)) = components.split_last() else {
            return Some(Self {
                segments: vec![BreadcrumbSegment {
                    label: ROOT_LABEL.to_string(),
                    target_location: root,
                    is_clickable: false,
                }],
                up: None,
            });
        };

        let mut segments = Vec::with_capacity(components.len() + 1);
        segments.push(BreadcrumbSegment {
            label: ROOT_LABEL.to_string(),
            target_location: root.clone(),
            is_clickable: true,
        });
        for (i, component) in components.iter().enumerate() {
            segments.push(BreadcrumbSegment {
                label: component.clone(),
                target_location: location::join_dir(&root, &components[..=i]),
                is_clickable: i + 1 < components.len(),
            });
        }

        Some(Self {
            segments,
            up: Some(location::join_dir(&root, parents)),
        })
    }

    pub fn is_root(&self) -> bool {
        self.up.is_none()
    }

    /// Number of components between root and the current directory
    pub fn depth(&self) -> usize {
        self.segments.len().saturating_sub(1)
    }

    /// Labels joined the way a trail is usually shown
    pub fn display_path(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.label.as_str())
            .collect::<Vec<_>>()
            .join(" / ")
    }
}
