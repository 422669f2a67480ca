use thiserror::Error;

pub const DEFAULT_EXTENSIONS: [&str; 5] = [".pdf", ".txt", ".png", ".jpg", ".jpeg"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtensionError {
    #[error("extension '{0}' must start with '.'")]
    MissingDot(String),
    #[error("extension needs a name after '.'")]
    Empty,
}

/// Known extensions and the subset sent as `required_exts`.
///
/// Both lists keep insertion order and never hold duplicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionSet {
    available: Vec<String>,
    selected: Vec<String>,
    field_error: Option<ExtensionError>,
}

impl Default for ExtensionSet {
    fn default() -> Self {
        let defaults: Vec<String> = DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect();
        ExtensionSet {
            available: defaults.clone(),
            selected: defaults,
            field_error: None,
        }
    }
}

impl ExtensionSet {
    /// Defaults, with only `selected` chosen when it is non-empty.
    /// Entries outside the defaults are added to the available list.
    pub fn with_selection(selected: &[String]) -> Result<Self, ExtensionError> {
        let mut set = ExtensionSet::default();
        if selected.is_empty() {
            return Ok(set);
        }
        set.selected.clear();
        for ext in selected {
            set.add(ext)?;
        }
        Ok(set)
    }

    fn validate(raw: &str) -> Result<String, ExtensionError> {
        let ext = raw.trim();
        if !ext.starts_with('.') {
            return Err(ExtensionError::MissingDot(ext.to_string()));
        }
        if ext.len() == 1 {
            return Err(ExtensionError::Empty);
        }
        Ok(ext.to_string())
    }

    /// Add a new extension to both lists. Invalid input sets the field error
    /// and leaves the lists unchanged.
    pub fn add(&mut self, raw: &str) -> Result<(), ExtensionError> {
        let ext = match Self::validate(raw) {
            Ok(ext) => ext,
            Err(err) => {
                self.field_error = Some(err.clone());
                return Err(err);
            }
        };
        self.field_error = None;
        if !self.available.contains(&ext) {
            self.available.push(ext.clone());
        }
        if !self.selected.contains(&ext) {
            self.selected.push(ext);
        }
        Ok(())
    }

    /// Select or deselect an available extension. Returns the new state.
    pub fn toggle(&mut self, ext: &str) -> bool {
        if let Some(pos) = self.selected.iter().position(|e| e == ext) {
            self.selected.remove(pos);
            false
        } else if self.available.iter().any(|e| e == ext) {
            self.selected.push(ext.to_string());
            true
        } else {
            false
        }
    }

    pub fn available(&self) -> &[String] {
        &self.available
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    /// Selected extensions in selection order, joined with `;`.
    pub fn joined(&self) -> String {
        self.selected().join(";")
    }

    pub fn is_selected(&self, ext: &str) -> bool {
        self.selected.iter().any(|e| e == ext)
    }

    pub fn field_error(&self) -> Option<&ExtensionError> {
        self.field_error.as_ref()
    }

    pub fn clear_field_error(&mut self) {
        self.field_error = None;
    }
}
