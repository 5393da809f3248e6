//! Typed evidence tree
//!
//! The evidence payload arrives as free-form JSON and is stored verbatim; this
//! module is the typed view the scoring engine works against. Every bucket
//! defaults to empty on deserialization, so partial payloads (common while a
//! draft is being filled in) parse cleanly. Unknown fields on any node ride
//! along in an open `extra` map and survive a round trip untouched.
//!
//! Point values stay raw (`serde_json::Value`) here; lenient numeric coercion
//! belongs to the scoring pass, which also reports what it coerced.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One atomic piece of evidence with an associated point value.
///
/// Beyond `label` and `points` the item is schema-agnostic: whatever fields
/// the active form schema declared are carried in `extra`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvidenceItem {
    /// Short human-entered description (publication, proband, assay...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Raw point value as entered; coerced to a number at scoring time
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub points: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Case-level variant bucket, split by variant interpretation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VariantBucket {
    /// Predicted or proven null variants
    #[serde(default)]
    pub predicted_or_proven_null: Vec<EvidenceItem>,
    /// All other variant types with some evidence of pathogenicity
    #[serde(default)]
    pub other_variant_type: Vec<EvidenceItem>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VariantBucket {
    pub fn is_empty(&self) -> bool {
        self.predicted_or_proven_null.is_empty() && self.other_variant_type.is_empty()
    }

    pub fn item_count(&self) -> usize {
        self.predicted_or_proven_null.len() + self.other_variant_type.len()
    }
}

/// Case-level genetic evidence, split by inheritance pattern
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaseLevelEvidence {
    /// Autosomal dominant or X-linked probands
    #[serde(default)]
    pub autosomal_dominant: VariantBucket,
    /// Autosomal recessive probands
    #[serde(default)]
    pub autosomal_recessive: VariantBucket,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Case-control study evidence
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaseControlEvidence {
    #[serde(default)]
    pub single_variant: Vec<EvidenceItem>,
    #[serde(default)]
    pub aggregate_variant: Vec<EvidenceItem>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The genetic evidence group
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneticEvidence {
    #[serde(default)]
    pub case_level: CaseLevelEvidence,
    #[serde(default)]
    pub segregation: Vec<EvidenceItem>,
    #[serde(default)]
    pub case_control: CaseControlEvidence,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Function evidence (experimental), three summed sub-kinds
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FunctionEvidence {
    #[serde(default)]
    pub biochemical_function: Vec<EvidenceItem>,
    #[serde(default)]
    pub protein_interaction: Vec<EvidenceItem>,
    #[serde(default)]
    pub expression: Vec<EvidenceItem>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Functional alteration evidence, by cell source
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FunctionalAlterationEvidence {
    #[serde(default)]
    pub patient_cells: Vec<EvidenceItem>,
    #[serde(default)]
    pub non_patient_cells: Vec<EvidenceItem>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Model systems evidence
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelSystemsEvidence {
    #[serde(default)]
    pub non_human_organism: Vec<EvidenceItem>,
    #[serde(default)]
    pub cell_culture: Vec<EvidenceItem>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Rescue evidence, four summed sub-kinds
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RescueEvidence {
    #[serde(default)]
    pub human: Vec<EvidenceItem>,
    #[serde(default)]
    pub non_human_organism: Vec<EvidenceItem>,
    #[serde(default)]
    pub cell_culture: Vec<EvidenceItem>,
    #[serde(default)]
    pub patient_cells: Vec<EvidenceItem>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The experimental evidence group
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExperimentalEvidence {
    #[serde(default)]
    pub function: FunctionEvidence,
    #[serde(default)]
    pub functional_alteration: FunctionalAlterationEvidence,
    #[serde(default)]
    pub model_systems: ModelSystemsEvidence,
    #[serde(default)]
    pub rescue: RescueEvidence,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Root of the evidence tree
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvidenceData {
    #[serde(default)]
    pub genetic: GeneticEvidence,
    #[serde(default)]
    pub experimental: ExperimentalEvidence,
    /// Evidence arguing against the gene-disease relationship.
    /// Any item here forces the Disputed classification.
    #[serde(default)]
    pub contradictory: Vec<EvidenceItem>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EvidenceData {
    /// Parse a stored JSON payload into the typed tree
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value.clone())
    }

    /// Submission gate: at least one case-level or segregation item present
    pub fn has_qualifying_genetic_evidence(&self) -> bool {
        !self.genetic.case_level.autosomal_dominant.is_empty()
            || !self.genetic.case_level.autosomal_recessive.is_empty()
            || !self.genetic.segregation.is_empty()
    }

    /// Whether any contradictory-bucket item exists
    pub fn has_contradictory_evidence(&self) -> bool {
        !self.contradictory.is_empty()
    }

    /// Total item count across every bucket, for summary text
    pub fn total_item_count(&self) -> usize {
        let g = &self.genetic;
        let e = &self.experimental;
        g.case_level.autosomal_dominant.item_count()
            + g.case_level.autosomal_recessive.item_count()
            + g.segregation.len()
            + g.case_control.single_variant.len()
            + g.case_control.aggregate_variant.len()
            + e.function.biochemical_function.len()
            + e.function.protein_interaction.len()
            + e.function.expression.len()
            + e.functional_alteration.patient_cells.len()
            + e.functional_alteration.non_patient_cells.len()
            + e.model_systems.non_human_organism.len()
            + e.model_systems.cell_culture.len()
            + e.rescue.human.len()
            + e.rescue.non_human_organism.len()
            + e.rescue.cell_culture.len()
            + e.rescue.patient_cells.len()
            + self.contradictory.len()
    }
}
