//! Text layouts: named regex patterns describing one textual row format.
//!
//! Each `.toml` file in `packages/pdf/layouts/` is baked into the binary at
//! compile time via [`include_str!`]. Additional layouts can be loaded from
//! user-supplied TOML files at runtime with [`LayoutRegistry::load_file`].
//!
//! Every layout pattern must declare the eight named capture groups listed
//! in [`REQUIRED_GROUPS`]; the groups map one-to-one onto the fields of
//! [`schedule_models::Appointment`].

use std::path::Path;

use regex::{Regex, RegexBuilder};
use serde::Deserialize;

use crate::PdfError;

/// Layout TOML configs embedded at compile time.
const LAYOUT_TOMLS: &[(&str, &str)] = &[
    ("compact", include_str!("../layouts/compact.toml")),
    ("delimited", include_str!("../layouts/delimited.toml")),
    ("iso", include_str!("../layouts/iso.toml")),
];

/// Named capture groups every layout pattern must define.
pub const REQUIRED_GROUPS: [&str; 8] = [
    "date", "time", "doctor", "patient", "service", "duration", "pay", "status",
];

/// A serializable layout definition, as written in a layout TOML file.
#[derive(Debug, Clone, Deserialize)]
pub struct LayoutDefinition {
    /// Unique identifier (e.g. `"compact"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Description of the row format, usually with an example row.
    #[serde(default)]
    pub description: String,
    /// Whether the pattern matches case-insensitively.
    #[serde(default)]
    pub case_insensitive: bool,
    /// Regex pattern with the [`REQUIRED_GROUPS`] named groups.
    pub pattern: String,
}

impl LayoutDefinition {
    /// Compiles the pattern and verifies that it declares every required
    /// named group.
    ///
    /// # Errors
    ///
    /// * [`PdfError::Regex`] if the pattern fails to compile.
    /// * [`PdfError::Layout`] if a required group is missing.
    pub fn compile(&self) -> Result<CompiledLayout, PdfError> {
        let regex = RegexBuilder::new(&self.pattern)
            .case_insensitive(self.case_insensitive)
            .build()?;

        let names: Vec<&str> = regex.capture_names().flatten().collect();
        let missing: Vec<&str> = REQUIRED_GROUPS
            .iter()
            .copied()
            .filter(|group| !names.contains(group))
            .collect();

        if !missing.is_empty() {
            return Err(PdfError::Layout {
                id: self.id.clone(),
                message: format!("pattern is missing named groups: {}", missing.join(", ")),
            });
        }

        Ok(CompiledLayout {
            id: self.id.clone(),
            regex,
        })
    }
}

/// A layout whose pattern has been compiled and validated.
#[derive(Debug, Clone)]
pub struct CompiledLayout {
    /// Identifier of the source [`LayoutDefinition`].
    pub id: String,
    /// The compiled row pattern.
    pub regex: Regex,
}

/// Parses a single layout definition from TOML.
///
/// # Errors
///
/// Returns [`PdfError::Toml`] if the document is malformed.
pub fn parse_layout_toml(toml_str: &str) -> Result<LayoutDefinition, PdfError> {
    Ok(toml::de::from_str(toml_str)?)
}

/// The set of layouts available to the extraction engine, in priority
/// order.
#[derive(Debug, Clone)]
pub struct LayoutRegistry {
    layouts: Vec<LayoutDefinition>,
}

impl LayoutRegistry {
    /// Returns a registry holding every built-in layout.
    ///
    /// # Panics
    ///
    /// Panics if any embedded TOML config is malformed (the configs ship
    /// with the binary and are covered by tests).
    #[must_use]
    pub fn builtin() -> Self {
        let layouts = LAYOUT_TOMLS
            .iter()
            .map(|(name, toml)| {
                parse_layout_toml(toml)
                    .unwrap_or_else(|e| panic!("Failed to parse layouts/{name}.toml: {e}"))
            })
            .collect();

        Self { layouts }
    }

    /// Adds a layout after the existing ones.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError::Layout`] if a layout with the same id is already
    /// registered or the pattern does not compile with all required groups.
    pub fn add(&mut self, layout: LayoutDefinition) -> Result<(), PdfError> {
        if self.get(&layout.id).is_some() {
            return Err(PdfError::Layout {
                id: layout.id,
                message: "a layout with this id is already registered".to_owned(),
            });
        }

        layout.compile()?;
        log::debug!("Registered layout '{}' ({})", layout.id, layout.name);
        self.layouts.push(layout);
        Ok(())
    }

    /// Loads a layout definition from a TOML file and registers it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid layout
    /// TOML, or fails [`Self::add`].
    pub fn load_file(&mut self, path: &Path) -> Result<(), PdfError> {
        let contents = std::fs::read_to_string(path)?;
        let layout = parse_layout_toml(&contents)?;
        log::info!("Loaded layout '{}' from {}", layout.id, path.display());
        self.add(layout)
    }

    /// Looks up a layout by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&LayoutDefinition> {
        self.layouts.iter().find(|l| l.id == id)
    }

    /// Iterates over all registered layouts in priority order.
    pub fn iter(&self) -> impl Iterator<Item = &LayoutDefinition> {
        self.layouts.iter()
    }

    /// Compiles the layouts named in `ids`, or every registered layout when
    /// `ids` is empty.
    ///
    /// The result keeps registry order regardless of the order of `ids`.
    ///
    /// # Errors
    ///
    /// * [`PdfError::UnknownLayout`] if an id is not registered.
    /// * Any error from [`LayoutDefinition::compile`].
    pub fn compile(&self, ids: &[String]) -> Result<Vec<CompiledLayout>, PdfError> {
        if let Some(unknown) = ids.iter().find(|id| self.get(id).is_none()) {
            return Err(PdfError::UnknownLayout(unknown.clone()));
        }

        self.layouts
            .iter()
            .filter(|l| ids.is_empty() || ids.contains(&l.id))
            .map(LayoutDefinition::compile)
            .collect()
    }
}

impl Default for LayoutRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPECTED_LAYOUT_COUNT: usize = 3;

    #[test]
    fn loads_all_builtin_layouts() {
        let registry = LayoutRegistry::builtin();
        assert_eq!(registry.iter().count(), EXPECTED_LAYOUT_COUNT);
    }

    #[test]
    fn layout_ids_are_unique() {
        let registry = LayoutRegistry::builtin();
        let mut ids: Vec<&str> = registry.iter().map(|l| l.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), EXPECTED_LAYOUT_COUNT);
    }

    #[test]
    fn all_builtin_layouts_compile_with_required_groups() {
        let compiled = LayoutRegistry::builtin().compile(&[]).unwrap();
        assert_eq!(compiled.len(), EXPECTED_LAYOUT_COUNT);
    }

    #[test]
    fn rejects_pattern_missing_groups() {
        let layout = parse_layout_toml(
            r#"
id = "partial"
name = "Partial"
pattern = '(?P<date>\d+) (?P<time>\d+)'
"#,
        )
        .unwrap();

        let err = layout.compile().unwrap_err();
        let PdfError::Layout { id, message } = err else {
            panic!("expected layout error, got {err:?}");
        };
        assert_eq!(id, "partial");
        assert!(message.contains("doctor"));
        assert!(message.contains("status"));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let mut registry = LayoutRegistry::builtin();
        let duplicate = registry.get("compact").unwrap().clone();
        assert!(matches!(
            registry.add(duplicate),
            Err(PdfError::Layout { .. })
        ));
    }

    #[test]
    fn compiles_selected_layouts_in_registry_order() {
        let registry = LayoutRegistry::builtin();
        let compiled = registry
            .compile(&["iso".to_owned(), "compact".to_owned()])
            .unwrap();
        let ids: Vec<&str> = compiled.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["compact", "iso"]);
    }

    #[test]
    fn unknown_layout_id_is_an_error() {
        let registry = LayoutRegistry::builtin();
        let err = registry.compile(&["nope".to_owned()]).unwrap_err();
        assert!(matches!(err, PdfError::UnknownLayout(id) if id == "nope"));
    }

    #[test]
    fn loads_layout_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipe.toml");
        std::fs::write(
            &path,
            r#"
id = "pipe"
name = "Pipe separated"
pattern = '(?P<date>[^|]+)\|(?P<time>[^|]+)\|(?P<doctor>[^|]+)\|(?P<patient>[^|]+)\|(?P<service>[^|]+)\|(?P<duration>[^|]+)\|(?P<pay>[^|]+)\|(?P<status>\w+)'
"#,
        )
        .unwrap();

        let mut registry = LayoutRegistry::builtin();
        registry.load_file(&path).unwrap();
        assert!(registry.get("pipe").is_some());
        assert_eq!(registry.iter().count(), EXPECTED_LAYOUT_COUNT + 1);
    }
}
