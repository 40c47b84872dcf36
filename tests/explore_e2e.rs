use serde_json::json;

use simpsons::{
    explore_categorical, explore_continuous, CategoricalEvent, ChartKind, InMemoryRegistry,
    Registry, Value,
};

/// Berkeley 1973 admissions, six largest departments.
fn berkeley_records() -> serde_json::Value {
    let cells = [
        ("A", 512, 313, 89, 19),
        ("B", 353, 207, 17, 8),
        ("C", 120, 205, 202, 391),
        ("D", 138, 279, 131, 244),
        ("E", 53, 138, 94, 299),
        ("F", 22, 351, 24, 317),
    ];
    let mut records = Vec::new();
    for (dept, men_yes, men_no, women_yes, women_no) in cells {
        for (gender, accepted, n) in [
            ("men", "yes", men_yes),
            ("men", "no", men_no),
            ("women", "yes", women_yes),
            ("women", "no", women_no),
        ] {
            records.push(json!({"dept": dept, "gender": gender, "accepted": accepted, "N": n}));
        }
    }
    serde_json::Value::Array(records)
}

fn registry() -> InMemoryRegistry {
    let registry = InMemoryRegistry::new();
    registry
        .insert_json(
            "berkeley",
            &json!({
                "title": "Berkeley admissions",
                "question": "Were women discriminated against?",
                "outcome": "accepted",
                "outcome_numerator": "yes",
                "outcome_rate_label": "Acceptance rate",
                "initial_variable": "gender",
                "simulate_categories": ["dept", "gender"],
                "category_orders": {"gender": ["women", "men"]}
            }),
            &berkeley_records(),
        )
        .unwrap();
    registry
        .insert_json(
            "exercise",
            &json!({"title": "Exercise", "continuous_cols": ["exercise", "cholesterol"]}),
            &json!([
                {"age": "20s", "exercise": 2, "cholesterol": 180},
                {"age": "20s", "exercise": 4, "cholesterol": 170},
                {"age": "20s", "exercise": 6, "cholesterol": 160},
                {"age": "50s", "exercise": 5, "cholesterol": 240},
                {"age": "50s", "exercise": 7, "cholesterol": 230},
                {"age": "50s", "exercise": 9, "cholesterol": 220}
            ]),
        )
        .unwrap();
    registry
}

#[test]
fn berkeley_aggregate_favors_men() {
    let registry = registry();
    let view = explore_categorical(&registry, "berkeley", CategoricalEvent::Load).unwrap();

    assert_eq!(view.compare, "gender");
    assert_eq!(view.rate_chart.kind, ChartKind::Bar);
    // Listed order puts women first.
    let points = &view.rate_chart.series[0].points;
    assert_eq!(points[0].x, Value::from("women"));
    assert_eq!(points[1].x, Value::from("men"));
    assert!(points[1].y > points[0].y);
    assert!(view.warnings.is_empty());
    assert_eq!(view.rate_chart.category_orders["gender"], vec!["women", "men"]);
    assert_eq!(view.rate_chart.to_json()["category_orders"]["gender"][0], "women");
}

#[test]
fn berkeley_most_departments_favor_women() {
    let registry = registry();
    let view = explore_categorical(
        &registry,
        "berkeley",
        CategoricalEvent::FacetChanged { compare: "dept", facet: "gender" },
    )
    .unwrap();
    assert_eq!(view.rate_chart.kind, ChartKind::GroupedBar);

    let women = view.rate_chart.series_named("women").unwrap();
    let men = view.rate_chart.series_named("men").unwrap();
    let favoring_women = women
        .points
        .iter()
        .zip(&men.points)
        .filter(|(w, m)| w.y > m.y)
        .count();
    assert_eq!(favoring_women, 4);
}

#[test]
fn count_chart_sums_weights() {
    let registry = registry();
    let view = explore_categorical(&registry, "berkeley", CategoricalEvent::CompareChanged("dept")).unwrap();
    let total: f64 = view.count_chart.series.iter().flat_map(|s| &s.points).map(|p| p.y).sum();
    let dataset_total = registry.get("berkeley").unwrap().dataset.total_weight();
    assert!((total - dataset_total).abs() < 1e-9);
    assert_eq!(view.count_chart.axis_titles.y, "Count");
}

#[test]
fn continuous_trend_reverses_within_groups() {
    let registry = registry();
    let overall = explore_continuous(&registry, "exercise", "none").unwrap();
    let fit = overall.chart.series_named("fit").unwrap();
    assert!(fit.points[1].y > fit.points[0].y);

    let grouped = explore_continuous(&registry, "exercise", "age").unwrap();
    for name in ["fit_20s", "fit_50s"] {
        let fit = grouped.chart.series_named(name).unwrap();
        assert!(fit.points[1].y < fit.points[0].y, "{name}");
    }
    assert_eq!(grouped.group_options, vec!["age", "none"]);
}

#[test]
fn views_are_idempotent() {
    let registry = registry();
    let first = explore_categorical(&registry, "berkeley", CategoricalEvent::Load).unwrap();
    let second = explore_categorical(&registry, "berkeley", CategoricalEvent::Load).unwrap();
    assert_eq!(first.rate_chart.fingerprint(), second.rate_chart.fingerprint());
    assert_eq!(first, second);
}
