//! Console output of the analysis command
//!
//! Progress lines go to stderr while variables are analyzed; the final
//! summary table goes to stdout.

use sternlab_analysis::{outcome::Outcome, pipeline::VariableBundle};

/// Print the per-variable result lines shown while the analysis runs
pub(super) fn print_variable_progress(bundle: &VariableBundle) {
    for record in &bundle.normality {
        match record.p_value {
            Some(p) => eprintln!("     {}: p = {p:.4} ({})", record.timepoint, record.verdict),
            None => eprintln!("     {}: {}", record.timepoint, record.verdict),
        }
    }
    for record in &bundle.outliers {
        eprintln!(
            "     {}: {} outliers ({:.1}%)",
            record.timepoint, record.count_iqr, record.pct_iqr
        );
    }
    match &bundle.anova {
        Outcome::Computed(anova) => {
            eprintln!("     ANOVA: F = {:.3}, p = {:.4}", anova.f, anova.p_value);
            eprintln!(
                "     Effect size (eta^2) = {:.4} ({})",
                anova.partial_eta_squared, anova.magnitude
            );
            eprintln!("     Result: {}", anova.significance);
        }
        outcome => eprintln!("     ANOVA: {}", reason(outcome)),
    }
    match &bundle.sphericity {
        Outcome::Computed(sphericity) => eprintln!(
            "     Sphericity: p = {:.4} ({})",
            sphericity.p_value, sphericity.verdict
        ),
        outcome => eprintln!("     Sphericity: {}", reason(outcome)),
    }
    match &bundle.posthoc {
        Outcome::Computed(table) => {
            eprintln!("     Post-hoc comparisons ({}):", table.estimator);
            for comparison in &table.comparisons {
                eprintln!(
                    "       {}: p = {} ({})",
                    comparison.pair_label,
                    format_p(comparison.corrected_p),
                    comparison.significance
                );
            }
        }
        outcome => eprintln!("     Post-hoc: {}", reason(outcome)),
    }
}

fn reason<T>(outcome: &Outcome<T>) -> String {
    format!(
        "{} ({})",
        outcome.status(),
        outcome.reason().unwrap_or_default()
    )
}

fn format_p(p: Option<f64>) -> String {
    p.map_or_else(|| "N/A".to_owned(), |p| format!("{p:.3}"))
}

fn print_summary_table_header() {
    println!(
        "  {:<32} {:>6} {:>10} {:>10} {:>8} {:>8} {:>12} {:>9}",
        "Variable", "N", "F", "p", "eta^2", "Effect", "Sphericity", "Post-hoc",
    );
}

fn print_summary_table_separator() {
    // variable(32) + n(6) + f(10) + p(10) + eta(8) + effect(8) + sphericity(12) + posthoc(9) + spaces(7)
    println!("  {}", "-".repeat(102));
}

fn print_summary_table_row(bundle: &VariableBundle, alpha: f64) {
    let sphericity = match &bundle.sphericity {
        Outcome::Computed(record) => record.verdict.to_string(),
        outcome => outcome.status().to_owned(),
    };
    let posthoc = match &bundle.posthoc {
        Outcome::Computed(table) => {
            let significant = table
                .comparisons
                .iter()
                .filter(|c| c.corrected_p.is_some_and(|p| p < alpha))
                .count();
            format!("{significant}/{}", table.comparisons.len())
        }
        outcome => outcome.status().to_owned(),
    };

    match &bundle.anova {
        Outcome::Computed(anova) => println!(
            "  {:<32} {:>6} {:>10.3} {:>10.4} {:>8.4} {:>8} {:>12} {:>9}",
            bundle.variable,
            anova.subjects,
            anova.f,
            anova.p_value,
            anova.partial_eta_squared,
            anova.magnitude.to_string(),
            sphericity,
            posthoc,
        ),
        outcome => println!(
            "  {:<32} {:>6} {:>10} {:>10} {:>8} {:>8} {:>12} {:>9}",
            bundle.variable,
            "-",
            outcome.status(),
            "-",
            "-",
            "-",
            sphericity,
            posthoc,
        ),
    }
}

/// Print one summary row per variable
///
/// The post-hoc column counts comparisons with a corrected p-value below
/// `alpha`.
pub(super) fn print_summary_table(bundles: &[VariableBundle], alpha: f64) {
    println!("Repeated-Measures ANOVA Summary (alpha = {alpha})");
    print_summary_table_header();
    print_summary_table_separator();
    for bundle in bundles {
        print_summary_table_row(bundle, alpha);
    }
    let significant = bundles
        .iter()
        .filter_map(|b| b.anova.computed())
        .filter(|a| a.significance.is_significant())
        .count();
    println!();
    println!(
        "  {significant} of {} variable(s) changed significantly across timepoints",
        bundles.len()
    );
}
