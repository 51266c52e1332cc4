// Copyright (c) 2025 - Cowboy AI, LLC.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use cim_service_composition::{
    CompositionConfig, CompositionError, CompositionNode, CompositionProblem,
};

const TAXONOMY: &str = r#"<?xml version="1.0"?>
<taxonomy>
  <concept name="thing">
    <concept name="location">
      <concept name="city"><instance name="inst_city"/></concept>
    </concept>
    <concept name="report">
      <concept name="weather"><instance name="inst_weather"/></concept>
      <concept name="traffic"><instance name="inst_traffic"/></concept>
    </concept>
    <concept name="advice"><instance name="inst_advice"/></concept>
  </concept>
</taxonomy>"#;

const SERVICES: &str = r#"<?xml version="1.0"?>
<services>
  <service name="weather_svc" Res="100" Pri="10" Ava="0.99" Rel="0.95">
    <inputs><instance name="inst_city"/></inputs>
    <outputs><instance name="inst_weather"/></outputs>
  </service>
  <service name="traffic_svc" Res="50" Pri="20" Ava="0.9" Rel="0.9">
    <inputs><instance name="inst_city"/></inputs>
    <outputs><instance name="inst_traffic"/></outputs>
  </service>
  <service name="advisor_svc" Res="30" Pri="5" Ava="0.95" Rel="0.99">
    <inputs><instance name="inst_weather"/><instance name="inst_traffic"/></inputs>
    <outputs><instance name="inst_advice"/></outputs>
  </service>
  <service name="unrelated_svc" Res="1" Pri="1" Ava="1" Rel="1">
    <inputs><instance name="inst_advice"/><instance name="inst_city"/></inputs>
    <outputs><instance name="inst_city"/></outputs>
  </service>
</services>"#;

fn task_xml(wanted: &str) -> String {
    format!(
        r#"<?xml version="1.0"?>
<WSChallenge>
  <task>
    <provided><instance name="inst_city"/></provided>
    <wanted><instance name="{wanted}"/></wanted>
  </task>
</WSChallenge>"#
    )
}

const CONFIG: &str = r#"{
  "services": "services.xml",
  "task": "problem.xml",
  "taxonomy": "taxonomy.xml",
  "weights": {
    "availability": 0.05, "reliability": 0.05, "time": 0.05, "cost": 0.05,
    "input_satisfaction": 0.3, "output_satisfaction": 0.2, "internal_satisfaction": 0.3
  }
}"#;

fn write_problem(dir: &Path, wanted: &str) -> CompositionConfig {
    fs::write(dir.join("taxonomy.xml"), TAXONOMY).unwrap();
    fs::write(dir.join("services.xml"), SERVICES).unwrap();
    fs::write(dir.join("problem.xml"), task_xml(wanted)).unwrap();
    fs::write(dir.join("problem.json"), CONFIG).unwrap();
    CompositionConfig::from_json_file(dir.join("problem.json")).unwrap()
}

#[test]
fn loads_problem_from_config_directory() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_problem(dir.path(), "inst_advice");
    assert_eq!(config.services, dir.path().join("services.xml"));

    let problem = CompositionProblem::from_config(&config).unwrap();
    assert_eq!(problem.catalog().len(), 4);
    // unrelated_svc needs `advice`, which is produced, so it is reachable too.
    let names: Vec<&str> = problem.relevant().names().collect();
    assert_eq!(
        names,
        vec!["weather_svc", "traffic_svc", "advisor_svc", "unrelated_svc"]
    );
    assert!(problem.task().inputs().contains("city"));
    assert!(problem.task().outputs().contains("advice"));
}

#[test]
fn well_formed_composition_beats_reversed_one() {
    let dir = tempfile::tempdir().unwrap();
    let problem = CompositionProblem::from_config(&write_problem(dir.path(), "inst_advice")).unwrap();
    let svc = |name: &str| CompositionNode::leaf(Arc::clone(problem.relevant().get(name).unwrap()));

    let full = CompositionNode::sequence(
        CompositionNode::parallel(svc("weather_svc"), svc("traffic_svc")),
        svc("advisor_svc"),
    );
    let reversed = CompositionNode::sequence(svc("advisor_svc"), svc("weather_svc"));

    let full_b = problem.breakdown(&full).unwrap();
    assert_eq!(full_b.semantics.input, 1.0);
    assert_eq!(full_b.semantics.output, 1.0);
    assert_eq!(full_b.semantics.internal, 1.0);

    // The advisor now exposes {weather, traffic}, none of which the task provides.
    let reversed_b = problem.breakdown(&reversed).unwrap();
    assert_eq!(reversed_b.semantics.input, 0.0);
    assert_eq!(reversed_b.semantics.internal, 3.0 / 5.0);

    assert!(problem.evaluate(&full).unwrap() > problem.evaluate(&reversed).unwrap());
}

#[test]
fn unreachable_wanted_output_is_infeasible() {
    let dir = tempfile::tempdir().unwrap();
    // `forecast` exists in the taxonomy but no service produces it.
    fs::write(
        dir.path().join("taxonomy.xml"),
        TAXONOMY.replace(
            r#"<concept name="advice">"#,
            r#"<concept name="forecast"><instance name="inst_forecast"/></concept><concept name="advice">"#,
        ),
    )
    .unwrap();
    fs::write(dir.path().join("services.xml"), SERVICES).unwrap();
    fs::write(dir.path().join("problem.xml"), task_xml("inst_forecast")).unwrap();
    fs::write(dir.path().join("problem.json"), CONFIG).unwrap();
    let config = CompositionConfig::from_json_file(dir.path().join("problem.json")).unwrap();

    let err = CompositionProblem::from_config(&config).unwrap_err();
    match err {
        CompositionError::InfeasibleTask { unreachable } => {
            assert_eq!(unreachable, vec!["forecast".to_string()])
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn unknown_instance_in_services_aborts_setup() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_problem(dir.path(), "inst_advice");
    fs::write(
        dir.path().join("services.xml"),
        SERVICES.replace("inst_traffic\"/></outputs>", "inst_ghost\"/></outputs>"),
    )
    .unwrap();
    let err = CompositionProblem::from_config(&config).unwrap_err();
    assert!(matches!(err, CompositionError::UnknownConcept(ref c) if c == "inst_ghost"));
    assert!(err.is_configuration_error());
}

#[test]
fn missing_description_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_problem(dir.path(), "inst_advice");
    fs::remove_file(dir.path().join("taxonomy.xml")).unwrap();
    let err = CompositionProblem::from_config(&config).unwrap_err();
    assert!(matches!(err, CompositionError::Io(_)));
}
