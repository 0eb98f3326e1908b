//! Reviewer-facing wording for fields and checks. This is data, not
//! behavior: labels, hints, and check names ship with compiled-in defaults
//! and can be patched from a TOML table for deployments that need different
//! terminology.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::domain::declaration::{DeclarationField, FIELD_COUNT};
use crate::pipeline::{ComplianceCheck, CHECK_COUNT};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("could not read catalog file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse catalog file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("unknown declaration field `{key}` in catalog patch")]
    UnknownField { key: String },
    #[error("unknown compliance check `{key}` in catalog patch")]
    UnknownCheck { key: String },
    #[error("catalog validation failed: {0}")]
    Validation(String),
}

/// Labels and hints for the seven fields plus the five check names.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldCatalog {
    labels: [String; FIELD_COUNT],
    hints: [String; FIELD_COUNT],
    check_names: [String; CHECK_COUNT],
    generic_hint: String,
}

impl Default for FieldCatalog {
    fn default() -> Self {
        let labels = [
            "Shipper",
            "Receiver",
            "Goods Description",
            "Declared Value",
            "Country of Origin",
            "HS Code",
            "Weight",
        ]
        .map(str::to_string);

        let hints = [
            "Enter the full shipper name and address as printed on the document.",
            "Enter the full receiver name and address as printed on the document.",
            "Describe the goods specifically enough to classify them.",
            "Include the declared value with its currency, e.g. `USD 1,200`.",
            "Use the name of the country where the goods were manufactured.",
            "Enter a 4-10 digit Harmonized System code, e.g. `854231`.",
            "Include the weight with its unit, e.g. `12.5 kg`.",
        ]
        .map(str::to_string);

        let check_names = ComplianceCheck::ALL.map(|check| check.name().to_string());

        Self {
            labels,
            hints,
            check_names,
            generic_hint: "Review this field against the source document and correct it if needed."
                .to_string(),
        }
    }
}

impl FieldCatalog {
    pub fn label(&self, field: DeclarationField) -> &str {
        &self.labels[field.index()]
    }

    pub fn hint(&self, field: DeclarationField) -> &str {
        &self.hints[field.index()]
    }

    pub fn check_name(&self, check: ComplianceCheck) -> &str {
        &self.check_names[check.index()]
    }

    /// Hint used when a check-derived issue lands on a field without its own
    /// guidance entry (hints have defaults, so this mostly covers patches
    /// that blank one out).
    pub fn generic_hint(&self) -> &str {
        &self.generic_hint
    }

    /// Hint for a field, falling back to the generic wording when the
    /// per-field entry is blank.
    pub fn hint_or_generic(&self, field: DeclarationField) -> &str {
        let hint = self.hint(field);
        if hint.trim().is_empty() {
            self.generic_hint()
        } else {
            hint
        }
    }

    /// Defaults patched from a TOML document. Patch keys are wire names for
    /// fields and snake_case ids for checks; unknown keys are rejected.
    pub fn from_toml_str(raw: &str) -> Result<Self, CatalogError> {
        let patch: CatalogPatch = toml::from_str(raw)?;
        let mut catalog = Self::default();
        catalog.apply_patch(patch)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| CatalogError::ReadFile { path: path.to_path_buf(), source })?;
        Self::from_toml_str(&raw)
    }

    fn apply_patch(&mut self, patch: CatalogPatch) -> Result<(), CatalogError> {
        for (key, label) in patch.labels {
            let field = DeclarationField::from_wire_name(&key)
                .ok_or(CatalogError::UnknownField { key: key.clone() })?;
            self.labels[field.index()] = label;
        }
        for (key, hint) in patch.hints {
            let field = DeclarationField::from_wire_name(&key)
                .ok_or(CatalogError::UnknownField { key: key.clone() })?;
            self.hints[field.index()] = hint;
        }
        for (key, name) in patch.checks {
            let check = check_from_key(&key)
                .ok_or(CatalogError::UnknownCheck { key: key.clone() })?;
            self.check_names[check.index()] = name;
        }
        if let Some(generic_hint) = patch.generic_hint {
            self.generic_hint = generic_hint;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        for field in DeclarationField::ALL {
            if self.label(field).trim().is_empty() {
                return Err(CatalogError::Validation(format!(
                    "label for `{}` must not be empty",
                    field.wire_name()
                )));
            }
        }
        for check in ComplianceCheck::ALL {
            if self.check_name(check).trim().is_empty() {
                return Err(CatalogError::Validation(format!(
                    "name for check index {} must not be empty",
                    check.index()
                )));
            }
        }
        if self.generic_hint.trim().is_empty() {
            return Err(CatalogError::Validation("generic_hint must not be empty".to_string()));
        }
        Ok(())
    }
}

fn check_from_key(key: &str) -> Option<ComplianceCheck> {
    match key {
        "hs_code_validation" => Some(ComplianceCheck::HsCodeValidation),
        "country_restrictions" => Some(ComplianceCheck::CountryRestrictions),
        "value_declaration" => Some(ComplianceCheck::ValueDeclaration),
        "shipper_verification" => Some(ComplianceCheck::ShipperVerification),
        "document_completeness" => Some(ComplianceCheck::DocumentCompleteness),
        _ => None,
    }
}

#[derive(Debug, Default, Deserialize)]
struct CatalogPatch {
    #[serde(default)]
    labels: BTreeMap<String, String>,
    #[serde(default)]
    hints: BTreeMap<String, String>,
    #[serde(default)]
    checks: BTreeMap<String, String>,
    generic_hint: Option<String>,
}
