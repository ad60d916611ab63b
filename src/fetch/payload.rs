// src/fetch/payload.rs

use csv::{ReaderBuilder, StringRecord};
use tracing::warn;

use crate::config::ColumnNames;
use crate::error::{DashboardError, Result};
use crate::model::RawRecord;

/// ISO-8859-1 maps every byte to the code point of the same value.
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Column positions of the seven fields in the header row.
struct ColumnIndex {
    gender_code: usize,
    age: usize,
    medication_category: usize,
    region_code: usize,
    prescriber_category_code: usize,
    box_count: usize,
    refund_amount: usize,
}

impl ColumnIndex {
    fn resolve(headers: &StringRecord, names: &ColumnNames) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| DashboardError::MissingColumn {
                    column: name.to_string(),
                })
        };
        Ok(Self {
            gender_code: find(&names.gender_code)?,
            age: find(&names.age)?,
            medication_category: find(&names.medication_category)?,
            region_code: find(&names.region_code)?,
            prescriber_category_code: find(&names.prescriber_category_code)?,
            box_count: find(&names.box_count)?,
            refund_amount: find(&names.refund_amount)?,
        })
    }

    fn project(&self, record: &StringRecord) -> RawRecord {
        let cell = |idx: usize| record.get(idx).unwrap_or("").to_string();
        RawRecord {
            gender_code: cell(self.gender_code),
            age: cell(self.age),
            medication_category: cell(self.medication_category),
            region_code: cell(self.region_code),
            prescriber_category_code: cell(self.prescriber_category_code),
            box_count: cell(self.box_count),
            refund_amount: cell(self.refund_amount),
        }
    }
}

/// Parse a delimited payload with a header row into raw rows.
///
/// Rows the reader cannot split are skipped and logged; a header that lacks
/// one of the configured columns fails the whole load.
pub fn parse_rows(text: &str, delimiter: u8, names: &ColumnNames) -> Result<Vec<RawRecord>> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let index = ColumnIndex::resolve(rdr.headers()?, names)?;

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for (idx, result) in rdr.records().enumerate() {
        match result {
            Ok(record) => rows.push(index.project(&record)),
            Err(e) => {
                skipped += 1;
                warn!(record = idx, error = %e, "skipping unreadable row");
            }
        }
    }
    if skipped > 0 {
        warn!(skipped, kept = rows.len(), "some rows could not be read");
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "ATC1,l_ATC1,age,sexe,BEN_REG,PSP_SPE,BOITES,REM,BSE\n\
A,VOIES DIGESTIVES,0,1,11,1,12,\"35,20\",40\n\
B,SANG,60,2,84,90,3,\"7,5\",8\n\
G,SYSTEME GENITO URINAIRE,20,9,93,19,1,,2\n";

    #[test]
    fn test_parse_rows_maps_columns_by_name() {
        let rows = parse_rows(SAMPLE, b',', &ColumnNames::default()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(
            rows[0],
            RawRecord::from_fields("1", "0", "A", "11", "1", "12", "35,20")
        );
        assert_eq!(rows[1].refund_amount, "7,5");
        assert_eq!(rows[2].gender_code, "9");
        assert_eq!(rows[2].refund_amount, "");
    }

    #[test]
    fn test_parse_rows_semicolon_delimiter() {
        let text = "sexe;age;ATC1;BEN_REG;PSP_SPE;BOITES;REM\n2;45;C;24;7;4;12,50\n";
        let rows = parse_rows(text, b';', &ColumnNames::default()).unwrap();
        assert_eq!(
            rows,
            vec![RawRecord::from_fields("2", "45", "C", "24", "7", "4", "12,50")]
        );
    }

    #[test]
    fn test_short_row_yields_empty_cells() {
        let text = "sexe,age,ATC1,BEN_REG,PSP_SPE,BOITES,REM\n1,30,A\n";
        let rows = parse_rows(text, b',', &ColumnNames::default()).unwrap();
        assert_eq!(rows[0].region_code, "");
        assert_eq!(rows[0].refund_amount, "");
    }

    #[test]
    fn test_missing_column_is_fatal() {
        let text = "sexe,age,ATC1,BEN_REG,PSP_SPE,BOITES\n1,30,A,11,1,2\n";
        match parse_rows(text, b',', &ColumnNames::default()) {
            Err(DashboardError::MissingColumn { column }) => assert_eq!(column, "REM"),
            other => panic!("expected MissingColumn, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_latin1() {
        // "SYSTÈME" with È encoded as 0xC8
        let bytes = b"SYST\xC8ME";
        assert_eq!(decode_latin1(bytes), "SYSTÈME");
    }
}
