use crate::types::model::CriterionValue;
use crate::types::report::Report;
use std::fmt::Write;

const UNDEFINED: &str = "-";

fn number(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| UNDEFINED.to_string(), |value| format!("{value:.precision$}"))
}

fn criterion(value: Option<CriterionValue>) -> String {
    value.map_or_else(|| UNDEFINED.to_string(), |value| value.to_string())
}

pub fn to_markdown(report: &Report, precision: usize) -> String {
    let mut output = String::new();
    match report {
        Report::Ratings {
            cycle,
            subset,
            rows,
        } => {
            let _ = writeln!(output, "# Openness: {cycle} ({subset})\n");
            if rows.is_empty() {
                output.push_str("- none\n");
            }
            for row in rows {
                let _ = writeln!(
                    output,
                    "- task {} (organization {}): openness {}, initial {}, delta {}, completeness {}",
                    row.task,
                    row.organization,
                    number(row.openness, precision),
                    number(row.openness_initial, precision),
                    number(row.delta, precision),
                    number(row.completeness, precision),
                );
            }
        }
        Report::Ranking {
            cycle,
            subset,
            ranking,
        } => {
            let _ = writeln!(output, "# Ranking: {cycle} ({subset})\n");
            output.push_str("| place | task | organization | openness | initial | delta |\n");
            output.push_str("|---|---|---|---|---|---|\n");
            for row in &ranking.rows {
                let _ = writeln!(
                    output,
                    "| {} | {} | {} | {} | {} | {} |",
                    row.place
                        .map_or_else(|| UNDEFINED.to_string(), |place| place.to_string()),
                    row.task,
                    row.organization,
                    number(row.openness, precision),
                    number(row.openness_initial, precision),
                    number(row.delta, precision),
                );
            }
            let stats = &ranking.statistics;
            let _ = writeln!(
                output,
                "\nRanked tasks: {}\nAverage openness: {}\nAverage initial openness: {}",
                stats.ranked,
                number(stats.average_openness, precision),
                number(stats.average_openness_initial, precision),
            );
        }
        Report::Costs { cycle, costs } => {
            let _ = writeln!(output, "# Recommendations: {cycle}, task {}\n", costs.task);
            let _ = writeln!(
                output,
                "Total cost: {}\n",
                number(costs.total_cost, precision)
            );
            if costs.rows.is_empty() {
                output.push_str("- none\n");
            }
            for row in &costs.rows {
                let _ = writeln!(
                    output,
                    "- parameter {}{}: cost {}, interim cost {}",
                    row.parameter,
                    if row.relevant { "" } else { " (excluded)" },
                    number(row.cost, precision),
                    number(row.interim_cost, precision),
                );
            }
        }
        Report::ScoreTable { cycle, table } => {
            let _ = writeln!(output, "# Scores: {cycle}, task {}\n", table.task);
            for row in &table.rows {
                let _ = writeln!(
                    output,
                    "## {} {} (weight {}{}{})\n",
                    row.parameter,
                    row.name,
                    row.weight,
                    if row.npa { ", npa" } else { "" },
                    if row.relevant { "" } else { ", excluded" },
                );
                let _ = writeln!(
                    output,
                    "- found: {} / interim {}",
                    row.found
                        .map_or_else(|| UNDEFINED.to_string(), |found| u8::from(found).to_string()),
                    row.interim_found
                        .map_or_else(|| UNDEFINED.to_string(), |found| u8::from(found).to_string()),
                );
                for cell in &row.cells {
                    let _ = writeln!(
                        output,
                        "- {}: {}{} / interim {}{}",
                        cell.criterion,
                        criterion(cell.current),
                        if cell.current_is_max { " (max)" } else { "" },
                        criterion(cell.interim),
                        if cell.interim_is_max { " (max)" } else { "" },
                    );
                }
                let _ = writeln!(
                    output,
                    "- openness: {} / initial {}{}\n",
                    number(row.openness, precision),
                    number(row.openness_initial, precision),
                    if row.is_max { " (max)" } else { "" },
                );
            }
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranking::{CycleStatistics, RankedTask, Ranking};

    #[test]
    fn ranking_markdown_lists_places_and_averages() {
        let report = Report::Ranking {
            cycle: "regional-2024".to_string(),
            subset: "npa".to_string(),
            ranking: Ranking {
                rows: vec![RankedTask {
                    task: 1,
                    organization: 10,
                    openness: Some(80.0),
                    openness_initial: Some(60.0),
                    delta: Some(20.0),
                    place: Some(1),
                }],
                statistics: CycleStatistics {
                    ranked: 1,
                    average_openness: Some(80.0),
                    average_openness_initial: Some(60.0),
                },
            },
        };

        let rendered = to_markdown(&report, 1);
        assert!(rendered.contains("# Ranking: regional-2024 (npa)"));
        assert!(rendered.contains("| 1 | 1 | 10 | 80.0 | 60.0 | 20.0 |"));
        assert!(rendered.contains("Average openness: 80.0"));
    }

    #[test]
    fn undefined_values_render_as_dash() {
        assert_eq!(number(None, 3), "-");
        assert_eq!(number(Some(50.0), 2), "50.00");
        assert_eq!(criterion(Some(CriterionValue::NotApplicable)), "n/a");
    }
}
