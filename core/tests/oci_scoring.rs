//! Overlooked Crisis Index scoring, ranking and funding what-ifs.

use oci_core::{
    brief::country_brief,
    country::{CountryRecord, Population},
    oci::{rank_overlooked, score, simulate_funding_allocation, OciWeights, RiskBand},
    OciError,
};

fn aland() -> CountryRecord {
    CountryRecord {
        population: 1_000_000.0,
        in_need: 420_000.0,
        reached: 110_000.0,
        funding_required: 120_000_000.0,
        funding_received: 20_000_000.0,
        percent_funded: 16.7,
        severity_score: 88.0,
        ..CountryRecord::new("AAA", "Aland")
    }
}

fn borland() -> CountryRecord {
    CountryRecord {
        population: 900_000.0,
        in_need: 190_000.0,
        reached: 150_000.0,
        funding_required: 110_000_000.0,
        funding_received: 78_000_000.0,
        percent_funded: 70.9,
        severity_score: 62.0,
        ..CountryRecord::new("BBB", "Borland")
    }
}

#[test]
fn weights_sum_to_one() {
    let w = OciWeights::STANDARD;
    assert!((w.sum() - 1.0).abs() < 1e-12, "weights sum to {}", w.sum());
    assert_eq!(
        [w.severity, w.in_need_rate, w.funding_gap, w.coverage_mismatch],
        [0.32, 0.28, 0.22, 0.18]
    );
}

#[test]
fn components_match_hand_computation() {
    let oci = score(&aland());
    assert_eq!(oci.severity_component, 88.0);
    assert_eq!(oci.in_need_rate_component, 42.0);
    assert_eq!(oci.funding_gap_component, 83.33);
    assert_eq!(oci.coverage_mismatch_component, 73.81);
    assert_eq!(oci.total_score, 71.54);
}

#[test]
fn every_component_is_clamped() {
    let wild = [
        CountryRecord {
            population: 0.0,
            in_need: 5_000.0,
            reached: 90_000.0,
            funding_required: 0.0,
            revised_plan_requirements: 0.0,
            funding_received: 9e12,
            severity_score: 250.0,
            ..CountryRecord::new("WLD", "Wild")
        },
        CountryRecord {
            population: 10.0,
            in_need: 1e9,
            reached: -4.0,
            funding_required: 1.0,
            funding_received: -100.0,
            severity_score: f64::NAN,
            ..CountryRecord::new("NEG", "Negative")
        },
        CountryRecord::new("NIL", "Empty"),
    ];

    for record in &wild {
        let oci = score(record);
        for (name, value) in [
            ("severity", oci.severity_component),
            ("in_need_rate", oci.in_need_rate_component),
            ("funding_gap", oci.funding_gap_component),
            ("coverage_mismatch", oci.coverage_mismatch_component),
            ("total", oci.total_score),
        ] {
            assert!(
                (0.0..=100.0).contains(&value),
                "{}: {name} component {value} out of range",
                record.iso3
            );
        }
    }
}

#[test]
fn revised_plan_stands_in_for_missing_requirement() {
    let record = CountryRecord {
        funding_required: 0.0,
        revised_plan_requirements: 100_000_000.0,
        funding_received: 25_000_000.0,
        ..aland()
    };
    assert_eq!(score(&record).funding_gap_component, 75.0);
}

#[test]
fn ranking_is_descending_and_stable() {
    let twin = CountryRecord {
        iso3: "AAB".into(),
        ..aland()
    };
    let ranked = rank_overlooked(&[borland(), aland(), twin]);
    let order: Vec<&str> = ranked.iter().map(|r| r.iso3.as_str()).collect();
    assert_eq!(order, vec!["AAA", "AAB", "BBB"], "ties keep input order");
    assert!(ranked.iter().all(|r| r.overlooked_score.is_some()));
}

#[test]
fn funding_allocation_only_moves_the_target() {
    let population = Population::new(vec![aland(), borland()]).expect("population");
    let before = rank_overlooked(population.records());
    let after = simulate_funding_allocation(&population, "aaa", 32_000_000.0);

    let aaa = after.iter().find(|r| r.iso3 == "AAA").expect("AAA");
    let bbb = after.iter().find(|r| r.iso3 == "BBB").expect("BBB");
    assert_eq!(aaa.funding_received, 52_000_000.0);
    assert!((aaa.percent_funded - 43.333_333).abs() < 1e-4);
    assert!(aaa.overlooked_score < before[0].overlooked_score);
    assert_eq!(bbb.funding_received, 78_000_000.0);
    assert_eq!(bbb.overlooked_score, before[1].overlooked_score);
}

#[test]
fn risk_bands() {
    assert_eq!(RiskBand::from_score(85.0), RiskBand::Critical);
    assert_eq!(RiskBand::from_score(71.54), RiskBand::High);
    assert_eq!(RiskBand::from_score(40.0), RiskBand::Moderate);
    assert_eq!(RiskBand::from_score(12.0), RiskBand::Low);
}

#[test]
fn brief_reports_rank_and_ratios() {
    let population = Population::new(vec![borland(), aland()]).expect("population");
    let brief = country_brief(&population, "aaa").expect("brief");

    assert_eq!(brief.rank, 1);
    assert_eq!(brief.oci.total_score, 71.54);
    assert_eq!(brief.risk_band, RiskBand::High);
    assert_eq!(brief.pin_funding_ratio, Some(0.021));
    assert_eq!(brief.in_need_rate, 42.0);

    assert!(matches!(
        country_brief(&population, "ZZZ"),
        Err(OciError::TargetNotFound { .. })
    ));
}
