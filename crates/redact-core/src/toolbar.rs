//! Editor toolbar state

use crate::export::SaveMode;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    /// Drag out a rectangle on the rendered page
    Rectangle,
    /// Drop a fixed-size redaction where the page is clicked
    Click,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Toolbar {
    enabled: bool,
    selected_tool: Option<Tool>,
}

impl Default for Toolbar {
    fn default() -> Self {
        Self {
            enabled: true,
            selected_tool: Some(Tool::Rectangle),
        }
    }
}

impl Toolbar {
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn selected_tool(&self) -> Option<Tool> {
        self.selected_tool
    }

    pub fn select_tool(&mut self, tool: Option<Tool>) {
        self.selected_tool = tool;
    }

    /// The tool that should receive pointer input, if any
    pub fn active_tool(&self) -> Option<Tool> {
        self.selected_tool.filter(|_| self.enabled)
    }

    pub fn request_save(&self, mode: SaveMode) -> Option<SaveMode> {
        self.enabled.then_some(mode)
    }
}
