// src/pipeline/mod.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, info};

use crate::config::DashboardConfig;
use crate::error::Result;
use crate::labels::StaticLabels;
use crate::model::{AgeBracket, GenderLabel, NormalizedRecord, RawRecord};

pub mod aggregate;
pub mod bucket;
pub mod frame;
pub mod join;
pub mod normalize;
pub mod summary;

use aggregate::{
    reduce, reduce_parallel, AgeHistogram, CategoryByAge, GenderDistribution, PrescriberScatter,
    Reducer, RefundMeanByAge, RegionDistribution,
};
pub use bucket::bucket;
pub use frame::ChartFrame;
pub use join::join;
pub use normalize::{normalize, parse_refund_amount, ParseFailures};
pub use summary::{CodeLabel, LabeledTable, MeanValue, ScatterPoint, SummaryTable};

/// Caller-side knobs for one summarize pass.
#[derive(Debug, Clone)]
pub struct AggregationOptions {
    pub selected_bracket: AgeBracket,
    pub category_order: Vec<String>,
    pub region_order: Vec<i64>,
    pub top_prescribers: Vec<i64>,
    pub geojson_url: String,
    pub parallel: bool,
}

impl AggregationOptions {
    pub fn from_config(cfg: &DashboardConfig) -> Result<Self> {
        Ok(Self {
            selected_bracket: cfg.selected_bracket()?,
            category_order: cfg.category_order.clone(),
            region_order: cfg.region_order.clone(),
            top_prescribers: cfg.top_prescribers.clone(),
            geojson_url: cfg.geojson_url.clone(),
            parallel: cfg.parallel,
        })
    }
}

impl Default for AggregationOptions {
    fn default() -> Self {
        let cfg = DashboardConfig::default();
        Self {
            selected_bracket: AgeBracket::Young,
            category_order: cfg.category_order,
            region_order: cfg.region_order,
            top_prescribers: cfg.top_prescribers,
            geojson_url: cfg.geojson_url,
            parallel: cfg.parallel,
        }
    }
}

/// Everything the dashboard page renders, computed from one load.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummaries {
    pub loaded_at: DateTime<Utc>,
    pub row_count: usize,
    pub parse_failures: ParseFailures,
    pub gender_distribution: SummaryTable<GenderLabel, u64>,
    pub age_histogram: SummaryTable<AgeBracket, u64>,
    pub selected_age_bracket: AgeBracket,
    pub category_by_age: LabeledTable<String, u64>,
    pub category_descriptions: Vec<CodeLabel<String>>,
    pub region_distribution: LabeledTable<i64, u64>,
    pub region_geojson_url: String,
    pub prescriber_scatter: Vec<ScatterPoint>,
    pub prescriber_order: Vec<i64>,
    pub top_prescribers: Vec<CodeLabel<i64>>,
    pub refund_mean_by_age: SummaryTable<AgeBracket, MeanValue>,
}

/// Normalize `rows` once and run every reducer over the result.
#[tracing::instrument(level = "info", skip_all, fields(rows = rows.len()))]
pub fn summarize(
    rows: &[RawRecord],
    opts: &AggregationOptions,
    labels: &StaticLabels,
) -> DashboardSummaries {
    let start = Instant::now();
    let normalized = normalize(rows);
    let records = normalized.records.as_slice();
    debug!(elapsed = ?start.elapsed(), "normalized");

    let gender_distribution = run_reducer(records, GenderDistribution::default(), opts.parallel);
    let age_histogram = run_reducer(records, AgeHistogram::default(), opts.parallel);
    let category_counts = run_reducer(
        records,
        CategoryByAge::new(opts.selected_bracket, &opts.category_order),
        opts.parallel,
    );
    let region_counts = run_reducer(
        records,
        RegionDistribution::new(&opts.region_order),
        opts.parallel,
    );
    let prescriber_scatter = run_reducer(records, PrescriberScatter::default(), opts.parallel);
    let refund_mean_by_age = run_reducer(records, RefundMeanByAge::default(), opts.parallel);

    debug!(
        categories = category_counts.len(),
        regions = region_counts.len(),
        points = prescriber_scatter.len(),
        "reduced"
    );

    let summaries = DashboardSummaries {
        loaded_at: Utc::now(),
        row_count: rows.len(),
        parse_failures: normalized.failures,
        gender_distribution,
        age_histogram,
        selected_age_bracket: opts.selected_bracket,
        category_by_age: join(&category_counts, &labels.categories),
        category_descriptions: join::category_descriptions(&labels.categories),
        region_distribution: join(&region_counts, &labels.regions),
        region_geojson_url: opts.geojson_url.clone(),
        prescriber_order: aggregate::prescriber_order_by_total(&prescriber_scatter),
        prescriber_scatter,
        top_prescribers: join::top_prescribers(&opts.top_prescribers, &labels.prescribers),
        refund_mean_by_age,
    };
    info!(elapsed = ?start.elapsed(), "summaries ready");
    summaries
}

fn run_reducer<R: Reducer>(records: &[NormalizedRecord], init: R, parallel: bool) -> R::Output {
    if parallel {
        reduce_parallel(records, init)
    } else {
        reduce(records, init)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    fn init_test_logging() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("info,openmedic::pipeline=debug")),
            )
            .with_test_writer()
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }

    fn four_rows() -> Vec<RawRecord> {
        vec![
            RawRecord::from_fields("1", "15", "A", "11", "1", "2", "10,0"),
            RawRecord::from_fields("2", "25", "B", "84", "90", "1", "20,0"),
            RawRecord::from_fields("2", "65", "A", "11", "19", "3", "30,0"),
            RawRecord::from_fields("9", "", "C", "2", "1", "1", "bad"),
        ]
    }

    #[test]
    fn test_end_to_end_four_rows() {
        init_test_logging();
        let s = summarize(&four_rows(), &AggregationOptions::default(), &StaticLabels::default());

        assert_eq!(s.row_count, 4);
        assert_eq!(s.age_histogram.get(&AgeBracket::Young), Some(&1));
        assert_eq!(s.age_histogram.get(&AgeBracket::Adult), Some(&1));
        assert_eq!(s.age_histogram.get(&AgeBracket::Senior), Some(&1));
        assert_eq!(s.age_histogram.total(), 3);

        assert_eq!(
            s.refund_mean_by_age.get(&AgeBracket::Young),
            Some(&MeanValue::Mean(10.0))
        );
        assert_eq!(
            s.refund_mean_by_age.get(&AgeBracket::Adult),
            Some(&MeanValue::Mean(20.0))
        );
        assert_eq!(
            s.refund_mean_by_age.get(&AgeBracket::Senior),
            Some(&MeanValue::Mean(30.0))
        );

        assert_eq!(s.gender_distribution.total(), 4);
        assert_eq!(s.gender_distribution.get(&GenderLabel::Unknown), Some(&1));
        assert_eq!(s.parse_failures.age, 1);
        assert_eq!(s.parse_failures.refund_amount, 1);
    }

    #[test]
    fn test_labels_joined_with_fallback() {
        let s = summarize(&four_rows(), &AggregationOptions::default(), &StaticLabels::default());

        // region 2 has no built-in name
        assert_eq!(s.region_distribution.label_of(&11), Some("Île-de-France"));
        assert_eq!(s.region_distribution.label_of(&2), Some("2"));
        assert_eq!(s.region_distribution.len(), 3);

        // only the 0-19 row is counted for the default selection
        assert_eq!(s.selected_age_bracket, AgeBracket::Young);
        assert_eq!(s.category_by_age.len(), 1);
        assert_eq!(
            s.category_by_age.label_of(&"A".to_string()),
            Some("Alimentary tract and metabolism")
        );

        assert_eq!(s.top_prescribers.len(), 10);
        assert_eq!(s.top_prescribers[0].label, "General practitioner");
        assert_eq!(s.prescriber_scatter.len(), 4);
        assert_eq!(s.prescriber_order, vec![90, 1, 19]);
    }

    #[test]
    fn test_selected_bracket_switches_categories() {
        let opts = AggregationOptions {
            selected_bracket: AgeBracket::Senior,
            ..Default::default()
        };
        let s = summarize(&four_rows(), &opts, &StaticLabels::default());
        let keys: Vec<&str> = s.category_by_age.rows().iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["A"]);
    }

    #[test]
    fn test_parallel_summaries_match() {
        let rows: Vec<RawRecord> = four_rows().into_iter().cycle().take(4_000).collect();
        let seq = summarize(&rows, &AggregationOptions::default(), &StaticLabels::default());
        let par = summarize(
            &rows,
            &AggregationOptions {
                parallel: true,
                ..Default::default()
            },
            &StaticLabels::default(),
        );
        assert_eq!(seq.gender_distribution, par.gender_distribution);
        assert_eq!(seq.region_distribution, par.region_distribution);
        assert_eq!(seq.prescriber_scatter, par.prescriber_scatter);
        assert_eq!(seq.refund_mean_by_age, par.refund_mean_by_age);
    }

    #[test]
    fn test_empty_input() {
        let s = summarize(&[], &AggregationOptions::default(), &StaticLabels::default());
        assert_eq!(s.gender_distribution.total(), 0);
        assert!(s.category_by_age.is_empty());
        assert!(s.region_distribution.is_empty());
        assert!(s
            .refund_mean_by_age
            .rows()
            .iter()
            .all(|r| r.value == MeanValue::NoData));
    }

    #[test]
    fn test_summaries_serialize() {
        let s = summarize(&four_rows(), &AggregationOptions::default(), &StaticLabels::default());
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["age_histogram"]["rows"][2]["key"], "60+");
        assert_eq!(json["selected_age_bracket"], "0-19");
    }
}
