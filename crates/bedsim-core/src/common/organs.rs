//! Organ-at-risk α/β reference table and lookup helpers.
//!
//! Values are suggested defaults for late-responding tissue and can be
//! replaced through `EngineConfig::organs`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganAlphaBeta {
    pub name: String,
    pub alpha_beta: f64,
}

const ORGAN_COUNT: usize = 30;

const DEFAULT_ORGANS: [(&str, f64); ORGAN_COUNT] = [
    ("Spinal cord", 2.0),
    ("Brainstem", 2.0),
    ("Optic nerve", 2.0),
    ("Optic chiasm", 2.0),
    ("Retina", 2.0),
    ("Lens", 1.2),
    ("Cerebellum", 2.0),
    ("Brain parenchyma", 2.0),
    ("Hippocampus", 2.0),
    ("Parotid gland", 3.0),
    ("Submandibular gland", 3.0),
    ("Oral mucosa", 10.0),
    ("Larynx (cartilage)", 3.0),
    ("Larynx (mucosa)", 10.0),
    ("Esophagus (late)", 3.0),
    ("Lung", 3.0),
    ("Heart", 3.0),
    ("Pericardium", 3.0),
    ("Liver", 2.7),
    ("Kidneys", 1.5),
    ("Bladder", 3.0),
    ("Rectum", 3.0),
    ("Small bowel", 3.0),
    ("Colon", 3.0),
    ("Skin (late)", 3.0),
    ("Skin (acute)", 10.0),
    ("Cortical bone", 1.7),
    ("Femoral head", 2.0),
    ("Testes", 2.0),
    ("Ovaries", 3.0),
];

pub fn default_organ_table() -> Vec<OrganAlphaBeta> {
    DEFAULT_ORGANS
        .iter()
        .map(|(name, alpha_beta)| OrganAlphaBeta {
            name: (*name).to_string(),
            alpha_beta: *alpha_beta,
        })
        .collect()
}

/// Case-insensitive lookup; surrounding whitespace is ignored.
pub fn alpha_beta_for_organ(table: &[OrganAlphaBeta], name: &str) -> Option<f64> {
    let normalized = name.trim();
    if normalized.is_empty() {
        return None;
    }

    table
        .iter()
        .find(|organ| organ.name.eq_ignore_ascii_case(normalized))
        .map(|organ| organ.alpha_beta)
}

pub fn default_alpha_beta_for_organ(name: &str) -> Option<f64> {
    let normalized = name.trim();
    DEFAULT_ORGANS
        .iter()
        .find(|(candidate, _)| candidate.eq_ignore_ascii_case(normalized))
        .map(|(_, alpha_beta)| *alpha_beta)
}
