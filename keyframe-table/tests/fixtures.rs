use pretty_assertions::assert_eq;

use keyframe_table::{parse_rows, TableOptions};

#[test]
fn fixtures_match_expected_output() {
    let cases = [
        (
            "wave",
            TableOptions::comma(),
            include_str!("fixtures/csv/wave.csv"),
            include_str!("fixtures/expected/wave.json"),
        ),
        (
            "quoted-fields",
            TableOptions::comma(),
            include_str!("fixtures/csv/quoted-fields.csv"),
            include_str!("fixtures/expected/quoted-fields.json"),
        ),
        (
            "tabbed",
            TableOptions::tab(),
            include_str!("fixtures/csv/tabbed.tsv"),
            include_str!("fixtures/expected/tabbed.json"),
        ),
        (
            "header-only",
            TableOptions::comma(),
            include_str!("fixtures/csv/header-only.csv"),
            include_str!("fixtures/expected/header-only.json"),
        ),
    ];

    for (name, options, table, expected) in cases {
        let rows = parse_rows(table.as_bytes(), options).expect("fixture parses");
        let actual = serde_json::to_string_pretty(&rows).expect("serialize rows");
        assert_eq!(
            actual,
            expected.trim_end_matches('\n'),
            "fixture mismatch: {name}"
        );
    }
}
