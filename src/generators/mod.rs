// Wistro Coder: Generation Building Blocks
// Naming and scoring of generated step logic

pub mod complexity;
pub mod naming;

pub use complexity::{calculate_complexity, ComplexityReport};
pub use naming::sanitize_name;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::templates::ScriptLanguage;

/// Everything one agent invocation produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedScript {
    /// Sanitized task name, used as the step name
    pub name: String,
    pub language: String,
    /// Raw backend output spliced into the script
    pub logic: String,
    pub complexity: ComplexityReport,
    pub score: i32,
    pub script: String,
    pub generation_time_ms: u64,
}

impl GeneratedScript {
    /// `<name>.<ext>` for the script's language
    pub fn file_name(&self) -> Result<String> {
        let language: ScriptLanguage = self.language.parse()?;
        Ok(format!("{}.{}", self.name, language.extension()))
    }
}
