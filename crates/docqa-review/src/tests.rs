//! Reviewer and report tests

#[cfg(test)]
mod review_tests {
    use crate::{export_report, write_report, Error, PolicyReviewer};
    use insta::assert_snapshot;

    const HANDBOOK: &str = "Staff must report incidents immediately.
        The office is painted blue.

        Visitors should ensure badges are visible.
        Training is MANDATORY and required yearly.";

    #[test]
    fn test_incident_sentence() {
        let flagged = PolicyReviewer::new().analyze("Staff must report incidents immediately.");

        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].sentence, "Staff must report incidents immediately.");
        assert_eq!(flagged[0].keywords_found(), "must, report, immediately");
        assert_eq!(flagged[0].suggestion, "Check policy compliance");
    }

    #[test]
    fn test_lines_reviewed_in_order() {
        let flagged = PolicyReviewer::new().analyze(HANDBOOK);

        let sentences: Vec<&str> = flagged.iter().map(|f| f.sentence.as_str()).collect();
        assert_eq!(
            sentences,
            vec![
                "Staff must report incidents immediately.",
                "Visitors should ensure badges are visible.",
                "Training is MANDATORY and required yearly.",
            ]
        );
        assert_eq!(flagged[1].suggestion, "Clarify responsibility or action");
        assert_eq!(flagged[2].keywords, vec!["required", "mandatory"]);
    }

    #[test]
    fn test_csv_report() {
        let flagged = PolicyReviewer::new().analyze(HANDBOOK);
        let mut out = Vec::new();
        write_report(&flagged, &mut out).unwrap();

        assert_snapshot!(String::from_utf8(out).unwrap(), @r#"
        Sentence,Keywords Found,Suggestion
        Staff must report incidents immediately.,"must, report, immediately",Check policy compliance
        Visitors should ensure badges are visible.,"should, ensure",Clarify responsibility or action
        Training is MANDATORY and required yearly.,"required, mandatory",Check policy compliance
        "#);
    }

    #[test]
    fn test_export_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("review_report.csv");
        let flagged = PolicyReviewer::new().analyze("Doors must be locked.");

        export_report(&flagged, &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("Sentence,Keywords Found,Suggestion\n"));
        assert!(written.contains("Doors must be locked.,must,Check policy compliance"));
    }

    #[test]
    fn test_nothing_flagged_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        let flagged = PolicyReviewer::new().analyze("The office is painted blue.");

        let err = export_report(&flagged, &path).unwrap_err();
        assert!(matches!(err, Error::NothingFlagged));
        assert_eq!(err.to_string(), "Policy analysis did not produce results.");
        assert!(!path.exists());
    }
}
