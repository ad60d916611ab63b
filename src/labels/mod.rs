// src/labels/mod.rs

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::Path,
};
use tracing::info;

use crate::config::DashboardConfig;
use crate::error::{DashboardError, Result};

/// ATC level-1 anatomical main groups.
static ATC1_GROUPS: &[(&str, &str)] = &[
    ("A", "Alimentary tract and metabolism"),
    ("B", "Blood and blood forming organs"),
    ("C", "Cardiovascular system"),
    ("D", "Dermatologicals"),
    ("G", "Genito-urinary system and sex hormones"),
    ("H", "Systemic hormonal preparations, excluding sex hormones and insulins"),
    ("J", "Antiinfectives for systemic use"),
    ("L", "Antineoplastic and immunomodulating agents"),
    ("M", "Musculo-skeletal system"),
    ("N", "Nervous system"),
    ("P", "Antiparasitic products, insecticides and repellents"),
    ("R", "Respiratory system"),
    ("S", "Sensory organs"),
    ("V", "Various"),
];

/// Beneficiary region codes (INSEE region numbers; 5 groups the overseas regions).
static REGIONS: &[(i64, &str)] = &[
    (5, "Overseas regions"),
    (11, "Île-de-France"),
    (24, "Centre-Val de Loire"),
    (27, "Bourgogne-Franche-Comté"),
    (28, "Normandie"),
    (32, "Hauts-de-France"),
    (44, "Grand Est"),
    (52, "Pays de la Loire"),
    (53, "Bretagne"),
    (75, "Nouvelle-Aquitaine"),
    (76, "Occitanie"),
    (84, "Auvergne-Rhône-Alpes"),
    (93, "Provence-Alpes-Côte d'Azur"),
    (94, "Corse"),
];

/// Prescriber specialty codes.
static PRESCRIBERS: &[(i64, &str)] = &[
    (1, "General practitioner"),
    (2, "Anaesthesiology"),
    (3, "Cardiology"),
    (4, "Surgery"),
    (5, "Dermatology and venereology"),
    (6, "Radiology"),
    (7, "Gynaecology and obstetrics"),
    (8, "Gastroenterology"),
    (9, "Internal medicine"),
    (11, "Otorhinolaryngology"),
    (12, "Paediatrics"),
    (13, "Pneumology"),
    (14, "Rheumatology"),
    (15, "Ophthalmology"),
    (17, "Neuropsychiatry"),
    (18, "Stomatology"),
    (19, "Dentist"),
    (32, "Neurology"),
    (33, "Psychiatry"),
    (35, "Nephrology"),
    (90, "Salaried prescriber (hospital, health centre)"),
    (98, "Other prescriber"),
    (99, "Unknown prescriber"),
];

static BUILTIN: Lazy<StaticLabels> = Lazy::new(|| StaticLabels {
    categories: ATC1_GROUPS
        .iter()
        .map(|&(code, name)| (code.to_string(), name.to_string()))
        .collect(),
    regions: REGIONS
        .iter()
        .map(|&(code, name)| (code, name.to_string()))
        .collect(),
    prescribers: PRESCRIBERS
        .iter()
        .map(|&(code, name)| (code, name.to_string()))
        .collect(),
});

/// Read-only code → display-name tables, fixed for the process lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticLabels {
    pub categories: BTreeMap<String, String>,
    pub regions: HashMap<i64, String>,
    pub prescribers: HashMap<i64, String>,
}

impl Default for StaticLabels {
    fn default() -> Self {
        BUILTIN.clone()
    }
}

impl StaticLabels {
    /// Load tables from YAML. A section the file omits keeps the built-in table.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let err = |reason: String| DashboardError::Config {
            path: path.display().to_string(),
            reason,
        };
        let text = fs::read_to_string(path).map_err(|e| err(e.to_string()))?;
        let labels: StaticLabels = serde_yaml::from_str(&text).map_err(|e| err(e.to_string()))?;
        info!(
            path = %path.display(),
            categories = labels.categories.len(),
            regions = labels.regions.len(),
            prescribers = labels.prescribers.len(),
            "loaded label tables"
        );
        Ok(labels)
    }

    pub fn from_config(cfg: &DashboardConfig) -> Result<Self> {
        match &cfg.labels_path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}
