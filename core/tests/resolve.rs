//! Resolving loosely typed upstream rows into engine records.

use oci_core::{
    resolve::{population_from_json, projects_from_json, resolve_country, RawCountryMetrics},
    OciError,
};

const COUNTRIES: &str = r#"[
  {
    "iso3": " sdn ",
    "country": "Sudan ",
    "population": 48000000,
    "inNeed": 24800000,
    "reached": 9100000,
    "fundingRequired": 2700000000,
    "fundingReceived": 1100000000,
    "percentFunded": 40.7,
    "latestFundingYear": 2024,
    "severityScore": 91,
    "ensembleScore": null,
    "neglectScore": 74,
    "donorDiversityScore": 33,
    "futureProjections": [
      { "step": "q2", "scores": { "ensembleScore": 80 } },
      { "monthsAhead": 12, "neglectFlagPred": true, "scores": { "neglectScore": 82, "lgbm": 10 } },
      { "step": "18mo", "scores": { "lgbm": 85 } },
      { "step": "later", "scores": { "ensembleScore": 90 } },
      { "monthsAhead": 24, "scores": {} },
      { "monthsAhead": 24 }
    ],
    "fundingTrend": [
      { "year": 2022, "req_usd": 1900000000, "funded_usd": 900000000 },
      { "year": 2023, "req_usd": null, "funded_usd": 1000000000 }
    ]
  },
  { "iso3": "TCD", "country": "Chad" }
]"#;

#[test]
fn camel_case_rows_resolve_to_records() {
    let population = population_from_json(COUNTRIES).expect("parse");
    assert_eq!(population.len(), 2);

    let sdn = population.get("SDN").expect("iso3 normalized");
    assert_eq!(sdn.country, "Sudan");
    assert_eq!(sdn.in_need, 24_800_000.0);
    assert_eq!(sdn.funding_required, 2_700_000_000.0);
    assert_eq!(sdn.ensemble_score, None);
    assert_eq!(sdn.neglect_score, Some(74.0));
    assert_eq!(sdn.baseline_neglect(), 74.0, "neglect score stands in for a null ensemble");
    assert_eq!(sdn.funding_trend.len(), 1, "rows with missing numbers are dropped");
}

#[test]
fn projection_horizons_and_scores_follow_precedence() {
    let population = population_from_json(COUNTRIES).expect("parse");
    let sdn = population.get("SDN").expect("SDN");

    let anchors: Vec<(u32, f64, Option<bool>)> = sdn
        .future_projections
        .iter()
        .map(|p| (p.months_ahead, p.score, p.neglect_flag_pred))
        .collect();
    assert_eq!(
        anchors,
        vec![(6, 80.0, None), (12, 82.0, Some(true)), (18, 85.0, None)]
    );
}

#[test]
fn missing_numbers_default_to_zero() {
    let population = population_from_json(COUNTRIES).expect("parse");
    let tcd = population.get("TCD").expect("TCD");

    assert_eq!(tcd.population, 0.0);
    assert_eq!(tcd.funding_received, 0.0);
    assert_eq!(tcd.overlooked_score, None);
    assert!(tcd.future_projections.is_empty());
}

#[test]
fn duplicate_countries_are_rejected() {
    let json = r#"[{ "iso3": "sdn" }, { "iso3": "SDN " }]"#;
    assert!(matches!(
        population_from_json(json),
        Err(OciError::DuplicateCountry { .. })
    ));
}

#[test]
fn malformed_json_is_a_serialization_error() {
    assert!(matches!(
        population_from_json("{ not json"),
        Err(OciError::Serialization(_))
    ));
}

#[test]
fn raw_defaults_resolve_to_an_empty_record() {
    let record = resolve_country(&RawCountryMetrics::default());
    assert_eq!(record.iso3, "");
    assert_eq!(record.severity_score, 0.0);
    assert_eq!(record.latest_funding_year, 0);
}

#[test]
fn project_rows_resolve_with_bbr() {
    let json = r#"[
      { "project_id": " P-1 ", "iso3": "sdn", "cluster_name": "Health",
        "budget_usd": 2000000, "people_targeted": 50000, "funding_pct": 35 },
      { "project_id": "P-2", "cluster_name": "Health", "budget_usd": null }
    ]"#;
    let projects = projects_from_json(json).expect("parse");

    assert_eq!(projects.len(), 2);
    assert_eq!(projects[0].project_id, "P-1");
    assert_eq!(projects[0].iso3, "SDN");
    assert_eq!(projects[0].bbr, 0.025);
    assert_eq!(projects[1].budget_usd, 0.0);
    assert_eq!(projects[1].bbr, 0.0);
}

#[test]
fn oversized_step_labels_are_dropped_not_overflowed() {
    let json = r#"[{
      "iso3": "AAA",
      "severityScore": 70,
      "futureProjections": [
        { "step": "q2000000000", "scores": { "ensembleScore": 70 } },
        { "step": "q4", "scores": { "ensembleScore": 72 } }
      ]
    }]"#;
    let population = population_from_json(json).expect("parse");
    let aaa = population.get("AAA").expect("AAA");

    assert_eq!(aaa.future_projections.len(), 1);
    assert_eq!(aaa.future_projections[0].months_ahead, 12);
}
