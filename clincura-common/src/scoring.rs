//! Evidence scoring and classification
//!
//! Pure and deterministic: the same payload always produces the same result,
//! with no I/O and no side effects. Callers recompute on every accepted
//! evidence mutation; nothing here is cached.
//!
//! Each sub-bucket's raw point sum is capped at its own ceiling before
//! combining, the genetic and experimental groups are capped again, and the
//! grand total is capped at 18. Malformed point values never fail a
//! calculation; they are counted as zero and reported in the result's
//! warning list so the caller can surface them.

use crate::evidence::{EvidenceData, EvidenceItem};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const CASE_LEVEL_AD_CAP: f64 = 12.0;
pub const CASE_LEVEL_AR_CAP: f64 = 12.0;
pub const SEGREGATION_CAP: f64 = 3.0;
pub const CASE_CONTROL_SINGLE_CAP: f64 = 12.0;
pub const CASE_CONTROL_AGGREGATE_CAP: f64 = 12.0;
pub const CASE_CONTROL_COMBINED_CAP: f64 = 12.0;
pub const GENETIC_CAP: f64 = 12.0;
pub const FUNCTION_CAP: f64 = 2.0;
pub const FUNCTIONAL_ALTERATION_CAP: f64 = 2.0;
pub const MODEL_SYSTEMS_CAP: f64 = 4.0;
pub const RESCUE_CAP: f64 = 4.0;
pub const EXPERIMENTAL_CAP: f64 = 6.0;
pub const TOTAL_CAP: f64 = 18.0;

/// Final clinical-validity verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Definitive,
    Strong,
    Moderate,
    Limited,
    NoKnownDiseaseRelationship,
    /// Forced whenever contradictory evidence exists, regardless of score
    Disputed,
}

impl Classification {
    /// Parse a classification from its database string
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "definitive" => Some(Classification::Definitive),
            "strong" => Some(Classification::Strong),
            "moderate" => Some(Classification::Moderate),
            "limited" => Some(Classification::Limited),
            "no_known_disease_relationship" => {
                Some(Classification::NoKnownDiseaseRelationship)
            }
            "disputed" => Some(Classification::Disputed),
            _ => None,
        }
    }

    /// Canonical database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Definitive => "definitive",
            Classification::Strong => "strong",
            Classification::Moderate => "moderate",
            Classification::Limited => "limited",
            Classification::NoKnownDiseaseRelationship => "no_known_disease_relationship",
            Classification::Disputed => "disputed",
        }
    }

    /// Human-readable verdict label
    pub fn display_name(&self) -> &'static str {
        match self {
            Classification::Definitive => "Definitive",
            Classification::Strong => "Strong",
            Classification::Moderate => "Moderate",
            Classification::Limited => "Limited",
            Classification::NoKnownDiseaseRelationship => "No Known Disease Relationship",
            Classification::Disputed => "Disputed",
        }
    }

    /// All verdicts, strongest first
    pub fn all_variants() -> Vec<Classification> {
        vec![
            Classification::Definitive,
            Classification::Strong,
            Classification::Moderate,
            Classification::Limited,
            Classification::NoKnownDiseaseRelationship,
            Classification::Disputed,
        ]
    }
}

/// A raw point sum and its counted (capped) value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CappedScore {
    /// Sum of item points before the cap
    pub raw: f64,
    /// Value that actually counts toward the parent group
    pub counted: f64,
    pub cap: f64,
}

impl CappedScore {
    fn new(raw: f64, cap: f64) -> Self {
        Self {
            raw,
            counted: raw.min(cap),
            cap,
        }
    }
}

/// Per-bucket genetic scores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneticBreakdown {
    pub case_level_ad: CappedScore,
    pub case_level_ar: CappedScore,
    pub segregation: CappedScore,
    pub case_control_single: CappedScore,
    pub case_control_aggregate: CappedScore,
    /// Single + aggregate, capped again before joining the genetic total
    pub case_control_combined: CappedScore,
}

/// Per-bucket experimental scores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentalBreakdown {
    pub function: CappedScore,
    pub functional_alteration: CappedScore,
    pub model_systems: CappedScore,
    pub rescue: CappedScore,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub genetic: GeneticBreakdown,
    pub experimental: ExperimentalBreakdown,
}

/// Non-fatal anomaly encountered while counting points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreWarning {
    /// Dotted path of the bucket holding the item
    pub bucket: String,
    /// Item index within the bucket
    pub index: usize,
    pub message: String,
}

/// Complete scoring outcome for one evidence payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub breakdown: ScoreBreakdown,
    pub genetic_total: f64,
    pub experimental_total: f64,
    pub total_score: f64,
    pub classification: Classification,
    /// Items whose point values were coerced or missing, counted as zero
    pub warnings: Vec<ScoreWarning>,
    pub evidence_item_count: usize,
}

impl ScoreResult {
    /// One-line synthesis persisted as the record's computed summary
    pub fn summary(&self) -> String {
        format!(
            "{}: genetic {:.1}/{:.0}, experimental {:.1}/{:.0}, total {:.1}/{:.0}, {} evidence item(s)",
            self.classification.display_name(),
            self.genetic_total,
            GENETIC_CAP,
            self.experimental_total,
            EXPERIMENTAL_CAP,
            self.total_score,
            TOTAL_CAP,
            self.evidence_item_count,
        )
    }
}

/// Map a total score to its verdict. Contradictory evidence overrides the
/// numeric thresholds entirely.
pub fn classify(total_score: f64, has_contradictory: bool) -> Classification {
    if has_contradictory {
        return Classification::Disputed;
    }
    if total_score >= 12.0 {
        Classification::Definitive
    } else if total_score >= 7.0 {
        Classification::Strong
    } else if total_score >= 2.0 {
        Classification::Moderate
    } else if total_score >= 0.1 {
        Classification::Limited
    } else {
        Classification::NoKnownDiseaseRelationship
    }
}

/// Score a typed evidence tree
pub fn score(data: &EvidenceData) -> ScoreResult {
    let mut warnings = Vec::new();

    let g = &data.genetic;
    let ad_raw = sum_items(
        &g.case_level.autosomal_dominant.predicted_or_proven_null,
        "genetic.case_level.autosomal_dominant.predicted_or_proven_null",
        &mut warnings,
    ) + sum_items(
        &g.case_level.autosomal_dominant.other_variant_type,
        "genetic.case_level.autosomal_dominant.other_variant_type",
        &mut warnings,
    );
    let ar_raw = sum_items(
        &g.case_level.autosomal_recessive.predicted_or_proven_null,
        "genetic.case_level.autosomal_recessive.predicted_or_proven_null",
        &mut warnings,
    ) + sum_items(
        &g.case_level.autosomal_recessive.other_variant_type,
        "genetic.case_level.autosomal_recessive.other_variant_type",
        &mut warnings,
    );
    let segregation_raw = sum_items(&g.segregation, "genetic.segregation", &mut warnings);
    let cc_single_raw = sum_items(
        &g.case_control.single_variant,
        "genetic.case_control.single_variant",
        &mut warnings,
    );
    let cc_aggregate_raw = sum_items(
        &g.case_control.aggregate_variant,
        "genetic.case_control.aggregate_variant",
        &mut warnings,
    );

    let case_level_ad = CappedScore::new(ad_raw, CASE_LEVEL_AD_CAP);
    let case_level_ar = CappedScore::new(ar_raw, CASE_LEVEL_AR_CAP);
    let segregation = CappedScore::new(segregation_raw, SEGREGATION_CAP);
    let case_control_single = CappedScore::new(cc_single_raw, CASE_CONTROL_SINGLE_CAP);
    let case_control_aggregate = CappedScore::new(cc_aggregate_raw, CASE_CONTROL_AGGREGATE_CAP);
    let case_control_combined = CappedScore::new(
        case_control_single.counted + case_control_aggregate.counted,
        CASE_CONTROL_COMBINED_CAP,
    );

    let genetic_total = (case_level_ad.counted
        + case_level_ar.counted
        + segregation.counted
        + case_control_combined.counted)
        .min(GENETIC_CAP);

    let e = &data.experimental;
    let function_raw = sum_items(
        &e.function.biochemical_function,
        "experimental.function.biochemical_function",
        &mut warnings,
    ) + sum_items(
        &e.function.protein_interaction,
        "experimental.function.protein_interaction",
        &mut warnings,
    ) + sum_items(
        &e.function.expression,
        "experimental.function.expression",
        &mut warnings,
    );
    let fa_raw = sum_items(
        &e.functional_alteration.patient_cells,
        "experimental.functional_alteration.patient_cells",
        &mut warnings,
    ) + sum_items(
        &e.functional_alteration.non_patient_cells,
        "experimental.functional_alteration.non_patient_cells",
        &mut warnings,
    );
    let ms_raw = sum_items(
        &e.model_systems.non_human_organism,
        "experimental.model_systems.non_human_organism",
        &mut warnings,
    ) + sum_items(
        &e.model_systems.cell_culture,
        "experimental.model_systems.cell_culture",
        &mut warnings,
    );
    let rescue_raw = sum_items(&e.rescue.human, "experimental.rescue.human", &mut warnings)
        + sum_items(
            &e.rescue.non_human_organism,
            "experimental.rescue.non_human_organism",
            &mut warnings,
        )
        + sum_items(
            &e.rescue.cell_culture,
            "experimental.rescue.cell_culture",
            &mut warnings,
        )
        + sum_items(
            &e.rescue.patient_cells,
            "experimental.rescue.patient_cells",
            &mut warnings,
        );

    let function = CappedScore::new(function_raw, FUNCTION_CAP);
    let functional_alteration = CappedScore::new(fa_raw, FUNCTIONAL_ALTERATION_CAP);
    let model_systems = CappedScore::new(ms_raw, MODEL_SYSTEMS_CAP);
    let rescue = CappedScore::new(rescue_raw, RESCUE_CAP);

    let experimental_total = (function.counted
        + functional_alteration.counted
        + model_systems.counted
        + rescue.counted)
        .min(EXPERIMENTAL_CAP);

    let total_score = (genetic_total + experimental_total).min(TOTAL_CAP);
    let classification = classify(total_score, data.has_contradictory_evidence());

    ScoreResult {
        breakdown: ScoreBreakdown {
            genetic: GeneticBreakdown {
                case_level_ad,
                case_level_ar,
                segregation,
                case_control_single,
                case_control_aggregate,
                case_control_combined,
            },
            experimental: ExperimentalBreakdown {
                function,
                functional_alteration,
                model_systems,
                rescue,
            },
        },
        genetic_total,
        experimental_total,
        total_score,
        classification,
        warnings,
        evidence_item_count: data.total_item_count(),
    }
}

/// Score a raw stored payload.
///
/// A payload that does not parse as an evidence tree is scored as empty with
/// a single warning; scoring never blocks an otherwise-valid read.
pub fn score_value(value: &Value) -> ScoreResult {
    match EvidenceData::from_value(value) {
        Ok(data) => score(&data),
        Err(e) => {
            let mut result = score(&EvidenceData::default());
            result.warnings.push(ScoreWarning {
                bucket: String::new(),
                index: 0,
                message: format!("evidence payload is not a valid evidence tree ({}), scored as empty", e),
            });
            result
        }
    }
}

/// Sum the counted points of every item in one bucket.
///
/// Folds from positive 0.0: `Sum for f64` starts at -0.0, and a signed zero
/// from an empty bucket would leak into the breakdown JSON and summary line.
fn sum_items(items: &[EvidenceItem], bucket: &str, warnings: &mut Vec<ScoreWarning>) -> f64 {
    items
        .iter()
        .enumerate()
        .fold(0.0, |acc, (index, item)| {
            acc + counted_points(item, bucket, index, warnings)
        })
}

/// Lenient point extraction: numbers pass through, numeric strings parse,
/// everything else counts as zero with a warning.
fn counted_points(
    item: &EvidenceItem,
    bucket: &str,
    index: usize,
    warnings: &mut Vec<ScoreWarning>,
) -> f64 {
    match &item.points {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => match s.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => v,
            _ => {
                warnings.push(ScoreWarning {
                    bucket: bucket.to_string(),
                    index,
                    message: format!("point value {:?} is not numeric, counted as 0", s),
                });
                0.0
            }
        },
        Value::Null => {
            warnings.push(ScoreWarning {
                bucket: bucket.to_string(),
                index,
                message: "item has no point value, counted as 0".to_string(),
            });
            0.0
        }
        other => {
            warnings.push(ScoreWarning {
                bucket: bucket.to_string(),
                index,
                message: format!("point value of type {} is not numeric, counted as 0", json_type_name(other)),
            });
            0.0
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
