use crate::types::report::Report;

pub fn to_json(report: &Report) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::report::TaskRating;

    #[test]
    fn json_report_is_tagged_and_keeps_undefined_as_null() {
        let report = Report::Ratings {
            cycle: "regional-2024".to_string(),
            subset: "all".to_string(),
            rows: vec![TaskRating {
                task: 1,
                organization: 10,
                openness: Some(87.5),
                openness_initial: None,
                delta: None,
                completeness: Some(100.0),
            }],
        };

        let rendered = to_json(&report).expect("json should serialize");
        assert!(rendered.contains("\"kind\": \"ratings\""));
        assert!(rendered.contains("\"openness\": 87.5"));
        assert!(rendered.contains("\"openness_initial\": null"));
    }
}
