//! Integration tests for the build pipeline.
//!
//! These tests run the pipeline against the mock runner so no external
//! download or processing scripts are needed.

use pathobuild_runner::{
    BuildPipeline, MockResponse, MockRunner, RunReport, RunnerConfig, RunnerError, StepKind,
    StepSpec, StepStatus,
};
use pathobuild_templates::{prepare_builds, BuildExpander, BuildTemplate, ExpandOptions, Expansion};
use tempfile::tempdir;

fn viruses(names: Vec<&str>) -> Expansion {
    prepare_builds(&[BuildTemplate::new()
        .with("stem", "{virus}")
        .with("virus", names)])
    .unwrap()
}

#[tokio::test]
async fn test_runs_download_then_process_per_build() {
    let runner = MockRunner::new();
    let pipeline = BuildPipeline::new(runner.clone(), RunnerConfig::default());

    let report = pipeline.run_all(&viruses(vec!["zika", "ebola"])).await.unwrap();

    assert!(report.all_succeeded());
    assert_eq!(report.builds.len(), 2);

    let calls = runner.calls();
    let order: Vec<(String, StepKind)> = calls.iter().map(|c| (c.build.clone(), c.kind)).collect();
    assert_eq!(
        order,
        vec![
            ("ebola".to_string(), StepKind::Download),
            ("ebola".to_string(), StepKind::Process),
            ("zika".to_string(), StepKind::Download),
            ("zika".to_string(), StepKind::Process),
        ]
    );
    assert_eq!(calls[2].args[0], "vdb/zika_download.py");
    assert_eq!(calls[3].args, vec!["zika/zika.py"]);
}

#[tokio::test]
async fn test_failed_download_skips_process_and_continues() {
    let runner = MockRunner::new().with_responses(vec![
        MockResponse::failure(2, "connection refused"),
        MockResponse::success("downloaded"),
        MockResponse::success("processed"),
    ]);
    let pipeline = BuildPipeline::new(runner.clone(), RunnerConfig::default());

    let report = pipeline.run_all(&viruses(vec!["ebola", "zika"])).await.unwrap();

    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.failed(), 1);

    let ebola = &report.builds[0];
    assert_eq!(ebola.build, "ebola");
    assert_eq!(
        ebola.step(StepKind::Download).unwrap().status,
        StepStatus::Failed { exit_code: 2 }
    );
    assert_eq!(ebola.step(StepKind::Process).unwrap().status, StepStatus::Skipped);
    assert!(report.builds[1].succeeded());
    assert_eq!(runner.call_count(), 3);
}

#[tokio::test]
async fn test_fail_fast_stops_the_run() {
    let runner = MockRunner::new()
        .add_response(MockResponse::success(""))
        .add_response(MockResponse::failure(1, "augur crashed"));
    let config = RunnerConfig::new().fail_fast(true);
    let pipeline = BuildPipeline::new(runner.clone(), config);

    let err = pipeline
        .run_all(&viruses(vec!["ebola", "zika"]))
        .await
        .unwrap_err();

    match err {
        RunnerError::StepFailed {
            step,
            build,
            exit_code,
        } => {
            assert_eq!(step, "process");
            assert_eq!(build, "ebola");
            assert_eq!(exit_code, 1);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(runner.call_count(), 2);
}

#[tokio::test]
async fn test_render_error_runs_nothing() {
    let runner = MockRunner::new();
    let config = RunnerConfig::new().process(StepSpec::new("augur").arg("{lineage}/run.py"));
    let pipeline = BuildPipeline::new(runner.clone(), config);

    let err = pipeline.run_all(&viruses(vec!["zika"])).await.unwrap_err();

    assert!(matches!(err, RunnerError::Render { .. }));
    assert_eq!(runner.call_count(), 0);
}

#[tokio::test]
async fn test_later_render_error_runs_nothing() {
    let expansion = prepare_builds(&[
        BuildTemplate::new()
            .with("stem", "{virus}")
            .with("virus", vec!["ebola", "zika"]),
        BuildTemplate::new().with("stem", "flu_h3n2"),
    ])
    .unwrap();
    assert_eq!(expansion.identifiers().collect::<Vec<_>>(), vec!["ebola", "flu_h3n2", "zika"]);

    let runner = MockRunner::new();
    let pipeline = BuildPipeline::new(runner.clone(), RunnerConfig::default());
    let err = pipeline.run_all(&expansion).await.unwrap_err();

    match err {
        RunnerError::Render { step, build, .. } => {
            assert_eq!(step, "download");
            assert_eq!(build, "flu_h3n2");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(runner.call_count(), 0);
}

#[tokio::test]
async fn test_runner_errors_propagate() {
    let runner = MockRunner::new().simulate_failure("no interpreter");
    let pipeline = BuildPipeline::new(runner, RunnerConfig::default());

    let err = pipeline.run_all(&viruses(vec!["zika"])).await.unwrap_err();
    assert!(matches!(err, RunnerError::ExecutionFailed(_)));
}

#[tokio::test]
async fn test_custom_steps_use_build_fields() {
    let expander = BuildExpander::new(ExpandOptions::new().identifier_field("name"));
    let builds = expander
        .expand(&[BuildTemplate::new()
            .with("name", "{virus}_{lineage}")
            .with("virus", vec!["flu"])
            .with("lineage", vec!["h3n2"])
            .with("resolution", "6y")])
        .unwrap();

    let runner = MockRunner::new();
    let config = RunnerConfig::new()
        .bin("python3")
        .root("/srv/nextstrain")
        .download(
            StepSpec::new("fauna")
                .arg("vdb/{virus}_download.py")
                .arg("--fstem")
                .arg("{name}"),
        )
        .process(
            StepSpec::new("augur")
                .arg("{virus}/{virus}.process.py")
                .arg("--lineage")
                .arg("{lineage}")
                .arg("--resolution")
                .arg("{resolution}"),
        );
    let pipeline = BuildPipeline::new(runner.clone(), config);
    pipeline.run_all(&builds).await.unwrap();

    let process = &runner.calls_for(StepKind::Process)[0];
    assert_eq!(process.program, "python3");
    assert_eq!(process.workdir, std::path::PathBuf::from("/srv/nextstrain/augur"));
    assert_eq!(
        process.args,
        vec!["flu/flu.process.py", "--lineage", "h3n2", "--resolution", "6y"]
    );
    assert_eq!(runner.calls_for(StepKind::Download)[0].args[2], "flu_h3n2");
}

#[tokio::test]
async fn test_report_written_as_json() {
    let runner = MockRunner::new().add_response(MockResponse::failure(4, "missing"));
    let pipeline = BuildPipeline::new(runner, RunnerConfig::default());
    let report = pipeline.run_all(&viruses(vec!["zika"])).await.unwrap();

    let temp = tempdir().unwrap();
    let path = temp.path().join("report.json");
    report.write_json(&path).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    let parsed: RunReport = serde_json::from_str(&content).unwrap();
    assert_eq!(parsed.builds.len(), 1);
    assert_eq!(
        parsed.builds[0].step(StepKind::Download).unwrap().status,
        StepStatus::Failed { exit_code: 4 }
    );
    assert!(content.contains("\"status\": \"skipped\""));
}
