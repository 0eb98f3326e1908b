//! Contracts for the payloads the upstream pipeline stages hand to the
//! review engine. Field names match the original backend responses so fixture
//! files and live payloads deserialize unchanged.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::confidence::FieldConfidence;
use crate::domain::declaration::{Declaration, DeclarationField};
use crate::errors::ContractError;

/// Number of compliance checks in a validation report. The check set is
/// fixed by the compliance stage contract.
pub const CHECK_COUNT: usize = 5;

/// The five compliance checks, in report index order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceCheck {
    HsCodeValidation,
    CountryRestrictions,
    ValueDeclaration,
    ShipperVerification,
    DocumentCompleteness,
}

impl ComplianceCheck {
    pub const ALL: [ComplianceCheck; CHECK_COUNT] = [
        ComplianceCheck::HsCodeValidation,
        ComplianceCheck::CountryRestrictions,
        ComplianceCheck::ValueDeclaration,
        ComplianceCheck::ShipperVerification,
        ComplianceCheck::DocumentCompleteness,
    ];

    pub fn index(self) -> usize {
        match self {
            Self::HsCodeValidation => 0,
            Self::CountryRestrictions => 1,
            Self::ValueDeclaration => 2,
            Self::ShipperVerification => 3,
            Self::DocumentCompleteness => 4,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Display name, as emitted by the compliance stage.
    pub fn name(self) -> &'static str {
        match self {
            Self::HsCodeValidation => "HS Code Validation",
            Self::CountryRestrictions => "Country Restrictions",
            Self::ValueDeclaration => "Value Declaration",
            Self::ShipperVerification => "Shipper Verification",
            Self::DocumentCompleteness => "Document Completeness",
        }
    }

    /// Field a failed check is attributed to. Document Completeness spans the
    /// whole declaration and maps to no single field.
    pub fn field(self) -> Option<DeclarationField> {
        match self {
            Self::HsCodeValidation => Some(DeclarationField::HsCode),
            Self::CountryRestrictions => Some(DeclarationField::CountryOfOrigin),
            Self::ValueDeclaration => Some(DeclarationField::Value),
            Self::ShipperVerification => Some(DeclarationField::Shipper),
            Self::DocumentCompleteness => None,
        }
    }

    /// Fallback description when the compliance stage omits one.
    pub fn default_description(self, passed: bool) -> &'static str {
        match (self, passed) {
            (Self::HsCodeValidation, true) => "HS code format validated",
            (Self::HsCodeValidation, false) => "HS code format invalid",
            (Self::CountryRestrictions, true) => "No country restrictions found",
            (Self::CountryRestrictions, false) => "Country restrictions apply",
            (Self::ValueDeclaration, true) => "Value declaration acceptable",
            (Self::ValueDeclaration, false) => "Value declaration issue",
            (Self::ShipperVerification, true) => "Shipper verified",
            (Self::ShipperVerification, false) => "Shipper verification failed",
            (Self::DocumentCompleteness, true) => "Document complete",
            (Self::DocumentCompleteness, false) => "Document incomplete",
        }
    }
}

/// Validated five-check compliance result with aligned descriptions.
///
/// Descriptions are kept exactly as supplied; an entry may be empty, and the
/// issue detector skips failed checks with empty descriptions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceReport {
    checks: [bool; CHECK_COUNT],
    descriptions: [String; CHECK_COUNT],
}

impl ComplianceReport {
    /// Build a report from raw pipeline vectors. Exactly five checks are
    /// required; up to five descriptions, missing tail entries stay empty.
    pub fn new(checks: Vec<bool>, descriptions: Vec<String>) -> Result<Self, ContractError> {
        if checks.len() != CHECK_COUNT {
            return Err(ContractError::CheckCountMismatch {
                expected: CHECK_COUNT,
                actual: checks.len(),
            });
        }
        if descriptions.len() > CHECK_COUNT {
            return Err(ContractError::DescriptionOverflow {
                expected: CHECK_COUNT,
                actual: descriptions.len(),
            });
        }

        let mut check_slots = [false; CHECK_COUNT];
        check_slots.copy_from_slice(&checks);

        let mut description_slots: [String; CHECK_COUNT] = Default::default();
        for (slot, description) in description_slots.iter_mut().zip(descriptions) {
            *slot = description;
        }

        Ok(Self { checks: check_slots, descriptions: description_slots })
    }

    /// All checks passing, default descriptions.
    pub fn all_passing() -> Self {
        let mut descriptions: [String; CHECK_COUNT] = Default::default();
        for check in ComplianceCheck::ALL {
            descriptions[check.index()] = check.default_description(true).to_string();
        }
        Self { checks: [true; CHECK_COUNT], descriptions }
    }

    pub fn passed(&self, check: ComplianceCheck) -> bool {
        self.checks[check.index()]
    }

    pub fn description(&self, check: ComplianceCheck) -> &str {
        &self.descriptions[check.index()]
    }

    /// Failed checks in index order.
    pub fn failed_checks(&self) -> impl Iterator<Item = ComplianceCheck> + '_ {
        ComplianceCheck::ALL.into_iter().filter(|check| !self.passed(*check))
    }

    pub fn failure_count(&self) -> usize {
        self.failed_checks().count()
    }

    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|passed| *passed)
    }
}

/// Risk banding the compliance stage attaches to its verdict.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Banding rules from the compliance agent: LOW needs a clean report and
    /// confidence >= 0.85; HIGH is three or more failures or confidence
    /// below 0.65; everything else is MEDIUM.
    pub fn assess(report: &ComplianceReport, confidence: f64) -> Self {
        let failures = report.failure_count();
        if failures >= 3 || confidence < 0.65 {
            Self::High
        } else if failures == 0 && confidence >= 0.85 {
            Self::Low
        } else {
            Self::Medium
        }
    }
}

/// Extraction/transform stage output: the structured declaration plus the
/// OCR field map and the scalar structure confidence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExtractionOutput {
    pub document_id: String,
    pub structured_data: Declaration,
    /// Raw OCR fields keyed by wire name. Optional; absent or unrecognized
    /// entries mean no per-field confidence data.
    #[serde(default)]
    pub raw_data: BTreeMap<String, FieldConfidence>,
    pub structure_confidence: f64,
}

impl ExtractionOutput {
    /// Per-field confidences keyed by declaration field. Unknown keys are
    /// dropped; an empty map is reported as no data at all.
    pub fn field_confidences(&self) -> Option<BTreeMap<DeclarationField, FieldConfidence>> {
        let mapped: BTreeMap<DeclarationField, FieldConfidence> = self
            .raw_data
            .iter()
            .filter_map(|(key, confidence)| {
                DeclarationField::from_wire_name(key).map(|field| (field, confidence.clone()))
            })
            .collect();

        if mapped.is_empty() {
            None
        } else {
            Some(mapped)
        }
    }
}

/// Compliance stage output as serialized by the backend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComplianceOutput {
    pub document_id: String,
    pub checks: Vec<bool>,
    #[serde(default)]
    pub issue_descriptions: Vec<String>,
    pub compliance_confidence: f64,
    #[serde(default)]
    pub reasoning: Option<String>,
    #[serde(default)]
    pub risk_level: Option<RiskLevel>,
}

impl ComplianceOutput {
    /// Validate the five-slot shape. When the stage sent no descriptions at
    /// all, the per-check defaults stand in; a partially filled list is kept
    /// as-is so deliberate blanks stay blank.
    pub fn report(&self) -> Result<ComplianceReport, ContractError> {
        let descriptions = if self.issue_descriptions.is_empty() {
            self.checks
                .iter()
                .enumerate()
                .map(|(index, passed)| {
                    ComplianceCheck::from_index(index)
                        .map(|check| check.default_description(*passed).to_string())
                        .unwrap_or_default()
                })
                .collect()
        } else {
            self.issue_descriptions.clone()
        };

        ComplianceReport::new(self.checks.clone(), descriptions)
    }

    /// Supplied risk level, or the banding recomputed from the report.
    pub fn risk(&self) -> Result<RiskLevel, ContractError> {
        match self.risk_level {
            Some(level) => Ok(level),
            None => Ok(RiskLevel::assess(&self.report()?, self.compliance_confidence)),
        }
    }
}
