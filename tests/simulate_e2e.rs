use serde_json::json;

use simpsons::{
    compute_counts, simulate, suggest_parameters, synthesize, CategoryOrders, CategoryParameters,
    ChartKind, CountRequest, Facet, InMemoryRegistry, RateRounding, RawCategoryInput, Registry,
    SimulationColumns, SimulationParameterSet, SimulationSession, Value,
};

fn columns() -> SimulationColumns {
    SimulationColumns::new("dept", "gender", "accepted", "yes").unwrap()
}

fn kidney_stones() -> SimulationParameterSet {
    // Small stones: treatment A 93%, B 87%; large stones: A 73%, B 69%.
    // A is given mostly for large stones, B mostly for small ones.
    SimulationParameterSet::new(
        vec!["A".into(), "B".into()],
        "A",
        vec![
            CategoryParameters::new("small", 357.0, 24.0)
                .base_rate("A", 93.0)
                .base_rate("B", 87.0),
            CategoryParameters::new("large", 343.0, 77.0)
                .base_rate("A", 73.0)
                .base_rate("B", 69.0),
        ],
    )
}

fn stone_columns() -> SimulationColumns {
    SimulationColumns::new("size", "treatment", "success", "yes").unwrap()
}

#[test]
fn simulated_paradox_reverses_in_aggregate() {
    let params = kidney_stones();
    let overall = simulate(&params, &stone_columns(), false, CategoryOrders::new()).unwrap();
    let a = overall.rate(&Value::from("A"), None).unwrap();
    let b = overall.rate(&Value::from("B"), None).unwrap();
    assert!(b > a, "aggregate should favour B: A {a} vs B {b}");

    let split = simulate(&params, &stone_columns(), true, CategoryOrders::new()).unwrap();
    for size in ["small", "large"] {
        let size = Value::from(size);
        let a = split.rate(&Value::from("A"), Some(&size)).unwrap();
        let b = split.rate(&Value::from("B"), Some(&size)).unwrap();
        assert!(a > b, "{size} stones should favour A");
    }
}

#[test]
fn synthesized_data_can_be_suggested_back() {
    let params = SimulationParameterSet::new(
        vec!["men".into(), "women".into()],
        "men",
        vec![
            CategoryParameters::new("A", 200.0, 75.0)
                .base_rate("men", 60.0)
                .base_rate("women", 80.0),
            CategoryParameters::new("B", 400.0, 25.0)
                .base_rate("men", 30.0)
                .base_rate("women", 40.0),
        ],
    );
    let data = synthesize(&params, &columns()).unwrap();
    let suggested = suggest_parameters(&data, &columns()).unwrap();
    assert_eq!(suggested.rounding, RateRounding::WholePercent);
    assert_eq!(suggested.parameters, params);
}

#[test]
fn simulated_counts_match_split() {
    let data = synthesize(&kidney_stones(), &stone_columns()).unwrap();
    let counts = compute_counts(&data, &CountRequest::new("treatment", Facet::None)).unwrap();
    // A: 0.24 * 357 + 0.77 * 343
    assert!((counts.rows[0].count - (85.68 + 264.11)).abs() < 1e-9);
    assert!((counts.total_count() - 700.0).abs() < 1e-9);
}

#[test]
fn session_round_trip_through_registry() {
    let registry = InMemoryRegistry::new();
    let data = synthesize(&kidney_stones(), &stone_columns()).unwrap();
    let records: Vec<serde_json::Value> = data
        .rows()
        .map(|row| {
            json!({
                "size": row.get("size").unwrap().label(),
                "treatment": row.get("treatment").unwrap().label(),
                "success": row.get("success").unwrap().label(),
                "N": row.weight(),
            })
        })
        .collect();
    registry
        .insert_json(
            "stones",
            &json!({
                "outcome": "success",
                "outcome_numerator": "yes",
                "outcome_rate_label": "Success rate",
                "simulate_categories": ["size", "treatment"]
            }),
            &serde_json::Value::Array(records),
        )
        .unwrap();
    assert!(registry.get("stones").is_ok());

    let mut session = SimulationSession::open(&registry, "stones").unwrap();
    assert!(session.chart().is_empty());
    assert_eq!(session.form().headers[2], "treatment: % A");

    let rows = session.form().rows.clone();
    assert_eq!(rows.iter().map(|r| r.category.as_str()).collect::<Vec<_>>(), vec!["large", "small"]);

    let chart = session.run_inputs(&rows, true).unwrap().clone();
    assert_eq!(chart.kind, ChartKind::GroupedBar);
    assert_eq!(chart.value_suffix.as_deref(), Some("%"));

    let mut bad: Vec<RawCategoryInput> = rows;
    bad[0].split_percent = "150".into();
    let err = session.run_inputs(&bad, true).unwrap_err();
    assert!(err.is_validation());
    assert_eq!(session.error_message(), Some("Sim parameter error for: large."));
    assert_eq!(session.chart(), &chart);
}
