//! Flat report sheets built from variable bundles.
//!
//! Each record family becomes one sheet, concatenated across variables and
//! keyed by a `variable` column. Tagged results keep their `status` and
//! `reason` so that a sheet has one row per variable even when nothing
//! could be computed. Rows are plain `Serialize` structs suitable for
//! `csv::Writer::serialize`.

use std::cmp::Ordering;

use serde::Serialize;
use sternlab_stats::describe::Describe;

use crate::{
    anova::AnovaRecord, outcome::Outcome, pipeline::VariableBundle, reshape::LongData,
    sphericity::SphericityRecord, timepoint::Timepoint,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalityRow {
    pub variable: String,
    pub timepoint: Timepoint,
    pub n: usize,
    pub statistic: Option<f64>,
    pub p_value: Option<f64>,
    pub verdict: String,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlierRow {
    pub variable: String,
    pub timepoint: Timepoint,
    pub n: usize,
    pub count_iqr: usize,
    pub count_z: usize,
    pub pct_iqr: f64,
    pub pct_z: f64,
    pub mean: f64,
    pub std: Option<f64>,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SphericityRow {
    pub variable: String,
    pub status: &'static str,
    pub reason: Option<String>,
    pub w: Option<f64>,
    pub chi_square: Option<f64>,
    pub dof: Option<f64>,
    pub p_value: Option<f64>,
    pub verdict: Option<String>,
    pub epsilon_gg: Option<f64>,
    pub subjects: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnovaRow {
    pub variable: String,
    pub status: &'static str,
    pub reason: Option<String>,
    pub f: Option<f64>,
    pub p_value: Option<f64>,
    pub partial_eta_squared: Option<f64>,
    pub effect_source: Option<String>,
    pub significance: Option<String>,
    pub magnitude: Option<String>,
    pub df1: Option<f64>,
    pub df2: Option<f64>,
    pub subjects: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostHocRow {
    pub variable: String,
    pub status: &'static str,
    pub reason: Option<String>,
    pub estimator: Option<String>,
    pub pair: Option<String>,
    pub mean_difference: Option<f64>,
    pub ci_lower: Option<f64>,
    pub ci_upper: Option<f64>,
    pub common_subjects: Option<usize>,
    pub test_statistic: Option<f64>,
    pub dof: Option<f64>,
    pub raw_p: Option<f64>,
    pub corrected_p: Option<f64>,
    pub significance: Option<String>,
    pub effect_size: Option<f64>,
}

/// Per-timepoint `describe` row of the ANOVA-only report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescriptiveRow {
    pub variable: String,
    pub timepoint: Timepoint,
    pub count: usize,
    pub mean: f64,
    pub std: Option<f64>,
    pub min: f64,
    #[serde(rename = "25%")]
    pub q1: f64,
    #[serde(rename = "50%")]
    pub median: f64,
    #[serde(rename = "75%")]
    pub q3: f64,
    pub max: f64,
}

/// All sheets of a full analysis run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportTables {
    pub normality: Vec<NormalityRow>,
    pub outliers: Vec<OutlierRow>,
    pub sphericity: Vec<SphericityRow>,
    pub anova: Vec<AnovaRow>,
    pub posthoc: Vec<PostHocRow>,
}

impl ReportTables {
    #[must_use]
    pub fn from_bundles(bundles: &[VariableBundle]) -> Self {
        let mut tables = Self::default();
        for bundle in bundles {
            tables.push(bundle);
        }
        tables
    }

    /// Appends the rows of one variable.
    pub fn push(&mut self, bundle: &VariableBundle) {
        let variable = &bundle.variable;
        self.normality
            .extend(bundle.normality.iter().map(|r| NormalityRow {
                variable: variable.clone(),
                timepoint: r.timepoint,
                n: r.n,
                statistic: r.statistic,
                p_value: r.p_value,
                verdict: r.verdict.to_string(),
                reason: r.reason.clone(),
            }));
        self.outliers.extend(bundle.outliers.iter().map(|r| OutlierRow {
            variable: variable.clone(),
            timepoint: r.timepoint,
            n: r.n,
            count_iqr: r.count_iqr,
            count_z: r.count_z,
            pct_iqr: r.pct_iqr,
            pct_z: r.pct_z,
            mean: r.mean,
            std: r.std,
            min: r.min,
            max: r.max,
        }));
        self.sphericity.push(sphericity_row(variable, &bundle.sphericity));
        self.anova.push(anova_row(variable, &bundle.anova));
        self.posthoc.extend(posthoc_rows(variable, bundle));
    }
}

fn sphericity_row(
    variable: &str,
    outcome: &Outcome<SphericityRecord>,
) -> SphericityRow {
    let record = outcome.computed();
    SphericityRow {
        variable: variable.to_owned(),
        status: outcome.status(),
        reason: outcome.reason().map(str::to_owned),
        w: record.map(|r| r.w),
        chi_square: record.map(|r| r.chi_square),
        dof: record.map(|r| r.dof),
        p_value: record.map(|r| r.p_value),
        verdict: record.map(|r| r.verdict.to_string()),
        epsilon_gg: record.map(|r| r.epsilon_gg),
        subjects: record.map(|r| r.subjects),
    }
}

/// Flattens one ANOVA outcome into a sheet row.
#[must_use]
pub fn anova_row(variable: &str, outcome: &Outcome<AnovaRecord>) -> AnovaRow {
    let record = outcome.computed();
    AnovaRow {
        variable: variable.to_owned(),
        status: outcome.status(),
        reason: outcome.reason().map(str::to_owned),
        f: record.map(|r| r.f),
        p_value: record.map(|r| r.p_value),
        partial_eta_squared: record.map(|r| r.partial_eta_squared),
        effect_source: record.map(|r| r.effect_source.to_string()),
        significance: record.map(|r| r.significance.to_string()),
        magnitude: record.map(|r| r.magnitude.to_string()),
        df1: record.map(|r| r.df1),
        df2: record.map(|r| r.df2),
        subjects: record.map(|r| r.subjects),
    }
}

fn posthoc_rows(variable: &str, bundle: &VariableBundle) -> Vec<PostHocRow> {
    let outcome = &bundle.posthoc;
    let empty = || PostHocRow {
        variable: variable.to_owned(),
        status: outcome.status(),
        reason: outcome.reason().map(str::to_owned),
        estimator: None,
        pair: None,
        mean_difference: None,
        ci_lower: None,
        ci_upper: None,
        common_subjects: None,
        test_statistic: None,
        dof: None,
        raw_p: None,
        corrected_p: None,
        significance: None,
        effect_size: None,
    };
    let Some(table) = outcome.computed() else {
        return vec![empty()];
    };
    table
        .comparisons
        .iter()
        .map(|c| PostHocRow {
            estimator: Some(table.estimator.to_string()),
            pair: Some(c.pair_label.clone()),
            mean_difference: c.mean_difference,
            ci_lower: c.ci_lower,
            ci_upper: c.ci_upper,
            common_subjects: Some(c.common_subjects),
            test_statistic: c.test_statistic,
            dof: Some(c.dof),
            raw_p: c.raw_p,
            corrected_p: c.corrected_p,
            significance: Some(c.significance.to_string()),
            effect_size: Some(c.effect_size),
            ..empty()
        })
        .collect()
}

/// Sorts ANOVA rows by ascending p-value; rows without one go last.
pub fn sort_by_p_value(rows: &mut [AnovaRow]) {
    rows.sort_by(|a, b| match (a.p_value, b.p_value) {
        (Some(pa), Some(pb)) => pa.total_cmp(&pb),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

/// `describe` rows for every timepoint of a variable that has values.
#[must_use]
pub fn descriptives(variable: &str, data: &LongData) -> Vec<DescriptiveRow> {
    Timepoint::ALL
        .into_iter()
        .filter_map(|timepoint| {
            let summary = Describe::new(data.values(timepoint))?;
            let stats = summary.stats;
            Some(DescriptiveRow {
                variable: variable.to_owned(),
                timepoint,
                count: stats.count,
                mean: stats.mean,
                std: (stats.count >= 2).then_some(stats.std_dev),
                min: stats.min,
                q1: summary.q1(),
                median: stats.median,
                q3: summary.q3(),
                max: stats.max,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        anova::{EffectMagnitude, EffectSizeSource, Significance},
        reshape::Observation,
    };

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    fn bundle(variable: &str, anova: Outcome<AnovaRecord>) -> VariableBundle {
        VariableBundle {
            variable: variable.to_owned(),
            observations: 0,
            normality: vec![],
            outliers: vec![],
            sphericity: Outcome::not_applicable("no valid observations"),
            anova,
            posthoc: Outcome::failed("no valid observations"),
        }
    }

    fn computed(p_value: f64) -> Outcome<AnovaRecord> {
        Outcome::Computed(AnovaRecord {
            f: 5.0,
            p_value,
            partial_eta_squared: 0.2,
            effect_source: EffectSizeSource::Generalized,
            significance: Significance::from_p_value(p_value, 0.05),
            magnitude: EffectMagnitude::Large,
            df1: 2.0,
            df2: 18.0,
            subjects: 10,
        })
    }

    #[test]
    fn test_tagged_results_keep_one_row() {
        let tables = ReportTables::from_bundles(&[bundle("a", Outcome::failed("boom"))]);
        assert_eq!(tables.sphericity.len(), 1);
        assert_eq!(tables.sphericity[0].status, "not_applicable");
        assert_eq!(tables.anova[0].status, "failed");
        assert_eq!(tables.anova[0].reason.as_deref(), Some("boom"));
        assert_eq!(tables.anova[0].f, None);
        assert_eq!(tables.posthoc.len(), 1);
        assert_eq!(tables.posthoc[0].pair, None);
    }

    #[test]
    fn test_sort_by_p_value() {
        let mut rows = vec![
            anova_row("a", &computed(0.3)),
            anova_row("b", &Outcome::failed("boom")),
            anova_row("c", &computed(0.01)),
        ];
        sort_by_p_value(&mut rows);
        let order = rows.iter().map(|r| r.variable.as_str()).collect::<Vec<_>>();
        assert_eq!(order, vec!["c", "a", "b"]);
        assert_eq!(rows[0].significance.as_deref(), Some("significant"));
    }

    #[test]
    fn test_descriptives() {
        let data = LongData::new(
            [1.0, 2.0, 3.0, 4.0, 5.0]
                .into_iter()
                .enumerate()
                .map(|(i, value)| Observation {
                    subject: format!("s{i}"),
                    timepoint: Timepoint::T1,
                    value,
                })
                .collect(),
        );
        let rows = descriptives("x", &data);
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.timepoint, Timepoint::T1);
        assert_eq!(row.count, 5);
        assert_close(row.q1, 2.0);
        assert_close(row.median, 3.0);
        assert_close(row.q3, 4.0);
        assert_close(row.std.unwrap(), 2.5_f64.sqrt());
    }

    #[test]
    fn test_csv_header() {
        let data = LongData::new(vec![Observation {
            subject: "s1".to_owned(),
            timepoint: Timepoint::T0,
            value: 1.0,
        }]);
        let mut writer = csv::Writer::from_writer(vec![]);
        for row in descriptives("x", &data) {
            writer.serialize(row).unwrap();
        }
        let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        assert_eq!(
            text.lines().next(),
            Some("variable,timepoint,count,mean,std,min,25%,50%,75%,max")
        );
        assert!(text.lines().nth(1).unwrap().starts_with("x,T0,1,1.0,,"));
    }
}
