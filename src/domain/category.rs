//! Domain types representing expense categories.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::common::*;

/// Labels plain expense entries for budgeting and reporting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub color: String,
}

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let color = pastel_color_for(&name);
        Self {
            id: Uuid::new_v4(),
            name,
            color,
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }
}

impl Identifiable for Category {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl NamedEntity for Category {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Displayable for Category {
    fn display_label(&self) -> String {
        format!("{} [{}]", self.name, self.color)
    }
}

/// Derives a stable pastel HSL color from the category name, so repeated
/// runs and tests always agree on the default palette.
pub fn pastel_color_for(name: &str) -> String {
    let mut hash: u32 = 2166136261;
    for byte in name.as_bytes() {
        hash ^= u32::from(*byte);
        hash = hash.wrapping_mul(16777619);
    }
    let hue = hash % 360;
    let saturation = 70 + (hash >> 9) % 31;
    let lightness = 70 + (hash >> 17) % 21;
    format!("hsl({hue}, {saturation}%, {lightness}%)")
}
