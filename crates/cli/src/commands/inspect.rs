use std::fs;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::commands::CommandResult;
use cleardesk_core::{
    ComplianceOutput, ExtractionOutput, FieldCatalog, IssueKind, ReviewInputs, ReviewSession,
    RiskLevel,
};

/// Pipeline payload pair as captured by the backend: the extraction stage
/// output plus the compliance verdict for the same document.
#[derive(Debug, Deserialize)]
struct PayloadFile {
    extraction: ExtractionOutput,
    compliance: ComplianceOutput,
}

#[derive(Debug, Serialize)]
struct IssuePreview {
    field: String,
    kind: IssueKind,
    title: String,
    description: String,
    hint: String,
}

#[derive(Debug, Serialize)]
struct InspectReport {
    command: &'static str,
    status: &'static str,
    document_id: String,
    risk_level: RiskLevel,
    issue_count: usize,
    missing_fields: Vec<String>,
    extraction_confidence: f64,
    compliance_confidence: f64,
    issues: Vec<IssuePreview>,
}

pub fn run(path: &str, catalog_path: Option<&str>) -> CommandResult {
    let catalog = match load_catalog(catalog_path) {
        Ok(catalog) => catalog,
        Err(result) => return result,
    };

    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(error) => {
            return CommandResult::failure(
                "inspect",
                "io",
                format!("failed to read `{path}`: {error}"),
                2,
            )
        }
    };

    let payload: PayloadFile = match serde_json::from_str(&raw) {
        Ok(payload) => payload,
        Err(error) => {
            return CommandResult::failure(
                "inspect",
                "payload_parse",
                format!("failed to parse `{path}`: {error}"),
                3,
            )
        }
    };

    let risk = match payload.compliance.risk() {
        Ok(risk) => risk,
        Err(error) => {
            return CommandResult::failure("inspect", "contract", error.to_string(), 4)
        }
    };

    let inputs = match ReviewInputs::from_pipeline(&payload.extraction, &payload.compliance) {
        Ok(inputs) => inputs,
        Err(error) => {
            return CommandResult::failure("inspect", "contract", error.to_string(), 4)
        }
    };

    debug!(document_id = %inputs.document_id, "opening preview session");
    let session = ReviewSession::open(inputs, &catalog);

    let report = InspectReport {
        command: "inspect",
        status: "ok",
        document_id: session.document_id().to_string(),
        risk_level: risk,
        issue_count: session.issues().len(),
        missing_fields: session
            .snapshot()
            .missing_fields()
            .into_iter()
            .map(|field| field.wire_name().to_string())
            .collect(),
        extraction_confidence: session.original_scores().extraction,
        compliance_confidence: session.original_scores().compliance,
        issues: session
            .issues()
            .iter()
            .map(|issue| IssuePreview {
                field: issue.field.wire_name().to_string(),
                kind: issue.kind,
                title: issue.title.clone(),
                description: issue.description.clone(),
                hint: issue.hint.clone(),
            })
            .collect(),
    };

    let human = format!(
        "inspect: {} issues for document {} (risk {:?})",
        report.issue_count, report.document_id, report.risk_level
    );
    let machine = serde_json::to_string(&report).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"inspect\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    });

    CommandResult { exit_code: 0, output: format!("{human}\n{machine}") }
}

fn load_catalog(path: Option<&str>) -> Result<FieldCatalog, CommandResult> {
    match path {
        None => Ok(FieldCatalog::default()),
        Some(path) => FieldCatalog::load(path.as_ref()).map_err(|error| {
            CommandResult::failure(
                "inspect",
                "catalog",
                format!("failed to load catalog `{path}`: {error}"),
                5,
            )
        }),
    }
}
