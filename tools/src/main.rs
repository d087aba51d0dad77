//! sim-runner: headless runner for the Overlooked Crisis Index engine.
//!
//! Usage:
//!   sim-runner --population countries.json --target SDN --allocation 25000000
//!   sim-runner --synthetic 40 --seed 12345 --target KEL --allocation 1e7
//!   sim-runner --synthetic 40 --seed 7 --projects projects.json --json
//!   sim-runner --population countries.json --config ./data --target SDN

use anyhow::{anyhow, Context, Result};
use oci_core::{
    brief::{country_brief, CountryBrief},
    comparables::{comparable_projects_for, ComparableProject},
    outliers::{annotate_with_threshold, most_anomalous},
    population::{generate_countries, generate_projects},
    resolve::{population_from_json, projects_from_json},
    snapshot::LeaderboardEntry,
    EngineConfig, Population, ProjectRecord, SimulationResult, Simulator,
};
use serde::Serialize;
use std::env;

const ANOMALY_ROWS: usize = 5;
const SYNTHETIC_PROJECTS_PER_COUNTRY: usize = 6;

#[derive(Serialize)]
struct ProjectFinding {
    project: ProjectRecord,
    comparables: Vec<ComparableProject>,
}

#[derive(Serialize)]
struct RunReport {
    run_id: String,
    generated_at: chrono::DateTime<chrono::Utc>,
    engine_version: &'static str,
    countries: usize,
    most_overlooked: Vec<LeaderboardEntry>,
    brief: Option<CountryBrief>,
    simulation: Option<SimulationResult>,
    anomalous_projects: Vec<ProjectFinding>,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let synthetic = parse_arg(&args, "--synthetic", 0usize);
    let allocation = parse_arg(&args, "--allocation", 0.0f64);
    let json_output = args.iter().any(|a| a == "--json");
    let population_path = arg_value(&args, "--population");
    let projects_path = arg_value(&args, "--projects");
    let target = arg_value(&args, "--target");

    let config = match arg_value(&args, "--config") {
        Some(dir) => EngineConfig::load(dir)?,
        None => EngineConfig::default(),
    };

    let population = load_population(population_path, synthetic, seed)?;
    log::info!("Population ready: {} countries", population.len());

    let projects = match projects_path {
        Some(path) => {
            let json =
                std::fs::read_to_string(path).with_context(|| format!("Cannot read {path}"))?;
            projects_from_json(&json)?
        }
        None if population_path.is_none() => {
            generate_projects(seed, &population, SYNTHETIC_PROJECTS_PER_COUNTRY)
        }
        None => Vec::new(),
    };

    let simulator = Simulator::new(config.clone());
    let most_overlooked = simulator.baseline_board(&population);
    let (brief, simulation) = match target {
        Some(iso3) => {
            let result = simulator.simulate(&population, iso3, allocation)?;
            (Some(country_brief(&population, iso3)?), Some(result))
        }
        None => (None, None),
    };

    let anomalous_projects = project_findings(&projects, &config);

    let report = RunReport {
        run_id: uuid::Uuid::new_v4().to_string(),
        generated_at: chrono::Utc::now(),
        engine_version: env!("CARGO_PKG_VERSION"),
        countries: population.len(),
        most_overlooked,
        brief,
        simulation,
        anomalous_projects,
    };

    if json_output {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }
    Ok(())
}

fn load_population(path: Option<&str>, synthetic: usize, seed: u64) -> Result<Population> {
    match path {
        Some(path) => {
            let json =
                std::fs::read_to_string(path).with_context(|| format!("Cannot read {path}"))?;
            Ok(population_from_json(&json)?)
        }
        None if synthetic > 0 => Ok(generate_countries(seed, synthetic)?),
        None => Err(anyhow!("Pass --population <file.json> or --synthetic <count>")),
    }
}

fn project_findings(projects: &[ProjectRecord], config: &EngineConfig) -> Vec<ProjectFinding> {
    if projects.is_empty() {
        return Vec::new();
    }
    let annotated = annotate_with_threshold(projects, config.outlier_z_threshold);
    most_anomalous(&annotated, ANOMALY_ROWS)
        .into_iter()
        .map(|project| {
            let comparables = comparable_projects_for(&project, &annotated, config.comparable_rows);
            ProjectFinding { project, comparables }
        })
        .collect()
}

fn print_summary(report: &RunReport) {
    println!("Overlooked Crisis Index: sim-runner");
    println!("  run_id:     {}", report.run_id);
    println!("  countries:  {}", report.countries);
    println!();

    println!("=== MOST OVERLOOKED (OCI + dataset adjustment) ===");
    for entry in &report.most_overlooked {
        println!(
            "  {:>2}. {} {:<24} score {:>6.2}",
            entry.rank, entry.iso3, entry.country, entry.oci_score
        );
    }

    if let (Some(brief), Some(sim)) = (&report.brief, &report.simulation) {
        println!();
        println!(
            "=== SCENARIO: {} ({}) +${:.0} ===",
            brief.country, brief.iso3, sim.allocation_usd
        );
        println!("  risk band:      {}", brief.risk_band.as_str());
        println!(
            "  base:           rank {} | OCI {:.2} | funded {:.2}%",
            sim.base.rank, sim.base.oci, sim.base.percent_funded
        );
        println!(
            "  after 8 qtrs:   rank {} | OCI {:.2} | funded {:.2}% | neglect {:.2}",
            sim.scenario.rank,
            sim.scenario.oci,
            sim.scenario.percent_funded,
            sim.scenario.projected_neglect
        );
        println!("  rank delta:     {:+}", sim.rank_delta);
        println!("  OCI delta:      {:+.2}", sim.oci_delta);
        println!(
            "  outlook:        {:?} ({:?} at horizon)",
            sim.outlook.trend, sim.outlook.horizon_risk_level
        );
        println!();
        for q in &sim.quarters {
            println!(
                "  {:<4} rank {:>3} | OCI {:>6.2} | neglect {:>6.2} | flag {}",
                q.quarter_label,
                q.selected_country.rank,
                q.selected_country.oci,
                q.selected_country.projected_neglect,
                match q.selected_country.neglect_flag_pred {
                    Some(true) => "neglected",
                    Some(false) => "cleared",
                    None => "-",
                }
            );
        }
        if !sim.country_impacts.is_empty() {
            println!();
            println!("  Impacted countries:");
            for impact in &sim.country_impacts {
                println!(
                    "    {} {:<24} rank {:+} | OCI {:+.2} | {:?}",
                    impact.iso3,
                    impact.country,
                    impact.rank_delta,
                    impact.overall_score_delta,
                    impact.relation
                );
            }
        }
    }

    if !report.anomalous_projects.is_empty() {
        println!();
        println!("=== ANOMALOUS PROJECTS ===");
        for finding in &report.anomalous_projects {
            let p = &finding.project;
            println!(
                "  {} [{}] z {:+.3} ({}) | {} peers",
                p.project_id,
                p.cluster_name,
                p.bbr_z_score,
                p.outlier_flag.as_str(),
                finding.comparables.len()
            );
        }
    }
}

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2).find(|w| w[0] == flag).map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    arg_value(args, flag)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
