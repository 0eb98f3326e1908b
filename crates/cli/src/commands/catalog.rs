use std::fs;
use std::path::Path;

use toml::Value;

use crate::commands::CommandResult;
use cleardesk_core::{ComplianceCheck, DeclarationField, FieldCatalog};

/// Render the effective reviewer-facing catalog with per-entry source
/// attribution, so operators can see which wording a TOML override actually
/// changed.
pub fn run(file: Option<&str>) -> CommandResult {
    let (catalog, overrides) = match file {
        None => (FieldCatalog::default(), None),
        Some(path) => {
            let catalog = match FieldCatalog::load(Path::new(path)) {
                Ok(catalog) => catalog,
                Err(error) => {
                    return CommandResult::failure(
                        "catalog",
                        "catalog",
                        format!("failed to load catalog `{path}`: {error}"),
                        5,
                    )
                }
            };
            (catalog, load_override_doc(path))
        }
    };

    let mut lines =
        vec!["effective catalog (source precedence: file > default):".to_string()];

    for field in DeclarationField::ALL {
        let key = field.wire_name();
        lines.push(render_line(
            &format!("labels.{key}"),
            catalog.label(field),
            source_for(overrides.as_ref(), "labels", key, file),
        ));
        lines.push(render_line(
            &format!("hints.{key}"),
            catalog.hint_or_generic(field),
            source_for(overrides.as_ref(), "hints", key, file),
        ));
    }

    for check in ComplianceCheck::ALL {
        let key = check_key(check);
        lines.push(render_line(
            &format!("checks.{key}"),
            catalog.check_name(check),
            source_for(overrides.as_ref(), "checks", key, file),
        ));
    }

    lines.push(render_line(
        "generic_hint",
        catalog.generic_hint(),
        generic_hint_source(overrides.as_ref(), file),
    ));

    CommandResult { exit_code: 0, output: lines.join("\n") }
}

fn check_key(check: ComplianceCheck) -> &'static str {
    match check {
        ComplianceCheck::HsCodeValidation => "hs_code_validation",
        ComplianceCheck::CountryRestrictions => "country_restrictions",
        ComplianceCheck::ValueDeclaration => "value_declaration",
        ComplianceCheck::ShipperVerification => "shipper_verification",
        ComplianceCheck::DocumentCompleteness => "document_completeness",
    }
}

fn load_override_doc(path: &str) -> Option<Value> {
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn source_for(doc: Option<&Value>, table: &str, key: &str, path: Option<&str>) -> String {
    let overridden = doc
        .and_then(|doc| doc.get(table))
        .and_then(|table| table.get(key))
        .is_some();
    if overridden {
        format!("file ({})", path.unwrap_or("override"))
    } else {
        "default".to_string()
    }
}

fn generic_hint_source(doc: Option<&Value>, path: Option<&str>) -> String {
    if doc.and_then(|doc| doc.get("generic_hint")).is_some() {
        format!("file ({})", path.unwrap_or("override"))
    } else {
        "default".to_string()
    }
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
