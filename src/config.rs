// src/config.rs

use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf, time::Duration};
use url::Url;

use crate::error::{DashboardError, Result};
use crate::model::AgeBracket;

/// Yearly Open Medic extract (complete base, 2022).
pub const DEFAULT_SOURCE_URL: &str = "https://open-data-assurance-maladie.ameli.fr/medicaments/download.php?Dir_Rep=Open_MEDIC_Base_Complete&Annee=2022";

/// Region boundaries, keyed by `properties.code`. Only forwarded to the chart layer.
pub const DEFAULT_GEOJSON_URL: &str = "https://france-geojson.gregoiredavid.fr/repo/regions.geojson";

/// Header names the loader looks up in the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub gender_code: String,
    pub age: String,
    pub medication_category: String,
    pub region_code: String,
    pub prescriber_category_code: String,
    pub box_count: String,
    pub refund_amount: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            gender_code: "sexe".into(),
            age: "age".into(),
            medication_category: "ATC1".into(),
            region_code: "BEN_REG".into(),
            prescriber_category_code: "PSP_SPE".into(),
            box_count: "BOITES".into(),
            refund_amount: "REM".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub source_url: String,
    pub geojson_url: String,
    /// Single-byte field delimiter of the payload.
    pub delimiter: char,
    pub columns: ColumnNames,
    pub max_retries: usize,
    pub retry_delay_ms: u64,
    pub timeout_secs: u64,
    pub selected_age_bracket: String,
    pub category_order: Vec<String>,
    /// Empty means first-seen order.
    pub region_order: Vec<i64>,
    pub top_prescribers: Vec<i64>,
    /// Optional YAML file replacing the built-in label tables.
    pub labels_path: Option<PathBuf>,
    /// Split reducers across the rayon pool.
    pub parallel: bool,
    /// When set, every chart frame is also written here as an Arrow IPC file.
    pub arrow_dir: Option<PathBuf>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            source_url: DEFAULT_SOURCE_URL.into(),
            geojson_url: DEFAULT_GEOJSON_URL.into(),
            delimiter: ',',
            columns: ColumnNames::default(),
            max_retries: 3,
            retry_delay_ms: 1_000,
            timeout_secs: 300,
            selected_age_bracket: AgeBracket::Young.label().into(),
            category_order: ["A", "B", "C", "D", "G"].map(String::from).to_vec(),
            region_order: Vec::new(),
            top_prescribers: vec![1, 90, 19, 7, 3, 12, 8, 5, 98, 15],
            labels_path: None,
            parallel: false,
            arrow_dir: None,
        }
    }
}

impl DashboardConfig {
    /// Read a YAML config; fields it leaves out keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| config_err(path, e))?;
        let cfg: DashboardConfig = serde_yaml::from_str(&text).map_err(|e| config_err(path, e))?;
        cfg.validate().map_err(|e| match e {
            DashboardError::Config { reason, .. } => config_err(path, reason),
            other => other,
        })?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        self.source_url()?;
        self.selected_bracket()?;
        self.delimiter_byte()?;
        if self.max_retries == 0 {
            return Err(config_err("<inline>", "max_retries must be at least 1"));
        }
        Ok(())
    }

    pub fn source_url(&self) -> Result<Url> {
        Url::parse(&self.source_url)
            .map_err(|e| config_err("<inline>", format!("source_url `{}`: {}", self.source_url, e)))
    }

    pub fn selected_bracket(&self) -> Result<AgeBracket> {
        AgeBracket::from_label(&self.selected_age_bracket)
    }

    pub fn delimiter_byte(&self) -> Result<u8> {
        u8::try_from(self.delimiter)
            .ok()
            .filter(u8::is_ascii)
            .ok_or_else(|| config_err("<inline>", format!("delimiter {:?} is not a single ASCII byte", self.delimiter)))
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn config_err(path: impl AsRef<Path>, reason: impl ToString) -> DashboardError {
    DashboardError::Config {
        path: path.as_ref().display().to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_are_valid() {
        let cfg = DashboardConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.selected_bracket().unwrap(), AgeBracket::Young);
        assert_eq!(cfg.delimiter_byte().unwrap(), b',');
        assert_eq!(cfg.columns.refund_amount, "REM");
    }

    #[test]
    fn test_load_partial_yaml_keeps_defaults() -> anyhow::Result<()> {
        let mut tmp = NamedTempFile::new()?;
        writeln!(
            tmp,
            "delimiter: ';'\nselected_age_bracket: '60+'\ncolumns:\n  age: AGE\nregion_order: [11, 84]\narrow_dir: /tmp/frames\n"
        )?;

        let cfg = DashboardConfig::load(tmp.path())?;
        assert_eq!(cfg.delimiter_byte()?, b';');
        assert_eq!(cfg.selected_bracket()?, AgeBracket::Senior);
        assert_eq!(cfg.columns.age, "AGE");
        assert_eq!(cfg.columns.gender_code, "sexe");
        assert_eq!(cfg.region_order, vec![11, 84]);
        assert_eq!(cfg.arrow_dir, Some(PathBuf::from("/tmp/frames")));
        assert_eq!(cfg.source_url, DEFAULT_SOURCE_URL);
        Ok(())
    }

    #[test]
    fn test_load_rejects_bad_url() -> anyhow::Result<()> {
        let mut tmp = NamedTempFile::new()?;
        writeln!(tmp, "source_url: 'not a url'")?;

        match DashboardConfig::load(tmp.path()) {
            Err(DashboardError::Config { path, reason }) => {
                assert_eq!(path, tmp.path().display().to_string());
                assert!(reason.contains("source_url"));
            }
            other => panic!("expected config error, got {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_load_missing_file() {
        let err = DashboardConfig::load("/nonexistent/openmedic.yaml").unwrap_err();
        assert!(matches!(err, DashboardError::Config { .. }));
    }

    #[test]
    fn test_non_ascii_delimiter_rejected() {
        let cfg = DashboardConfig {
            delimiter: '§',
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }
}
