// tests/cli_run.rs

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use tempfile::TempDir;

use jobdag::cli::CliArgs;
use jobdag::errors::JobdagError;

/// A project directory with a fake calc install and a two-item manifest
/// where `fig2.plot` runs after `tab2.calc`.
struct Project {
    dir: TempDir,
}

impl Project {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("calc/bin")).unwrap();
        fs::write(root.join("calc/bin/calculon"), "").unwrap();

        let manifest = format!(
            r#"
[item.tab2]
output = "{root}/tab2out"
description = "optimal execution table"

[item.tab2.task.calc]
class = "optimal-search"
cmd = "touch {root}/ran-calc"
outputs = ["{{output}}/opt.json"]

[item.fig2]
output = "{root}/fig2out"

[item.fig2.task.plot]
class = "misc"
cmd = "touch {root}/ran-plot"
after = ["tab2.calc"]
"#,
            root = root.display()
        );
        fs::write(root.join("Jobdag.toml"), manifest).unwrap();

        Self { dir }
    }

    fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    fn args(&self, extra: &[&str]) -> CliArgs {
        let manifest = self.path("Jobdag.toml");
        let calc = self.path("calc");
        let mut argv: Vec<String> = vec!["jobdag".into()];
        argv.extend(extra.iter().map(|s| s.to_string()));
        argv.extend([
            "--manifest".to_string(),
            manifest.display().to_string(),
            "--calc-dir".to_string(),
            calc.display().to_string(),
        ]);
        CliArgs::try_parse_from(argv).unwrap()
    }
}

fn touch(path: &Path) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, "{}").unwrap();
}

#[tokio::test]
async fn clean_keeps_outputs_of_dependency_items() {
    let project = Project::new();
    let dep_output = project.path("tab2out/opt.json");
    let own_output = project.path("fig2out/plot.png");
    touch(&dep_output);
    touch(&own_output);

    let ok = jobdag::run(project.args(&["local-8", "fig2", "--clean", "--skip-run"]))
        .await
        .unwrap();

    assert!(ok);
    assert!(dep_output.exists(), "dependency item outputs were removed");
    assert!(!own_output.exists(), "requested item was not cleaned");
    assert!(project.path("fig2out").is_dir());
}

#[tokio::test]
async fn skip_run_builds_tasks_without_launching() {
    let project = Project::new();

    let ok = jobdag::run(project.args(&["local-8", "fig2", "--skip-run"]))
        .await
        .unwrap();

    assert!(ok);
    // Output directories are created for requested and pulled-in items.
    assert!(project.path("fig2out").is_dir());
    assert!(project.path("tab2out").is_dir());
    assert!(!project.path("ran-calc").exists());
    assert!(!project.path("ran-plot").exists());
}

#[tokio::test]
async fn unknown_item_is_reported() {
    let project = Project::new();

    let err = jobdag::run(project.args(&["local-8", "fig9"]))
        .await
        .unwrap_err();

    assert!(
        matches!(err.downcast_ref::<JobdagError>(), Some(JobdagError::UnknownItem(name)) if name == "fig9"),
        "{err:?}"
    );
}

#[tokio::test]
async fn list_needs_no_calc_environment() {
    let project = Project::new();
    let manifest = project.path("Jobdag.toml");
    let args = CliArgs::try_parse_from([
        "jobdag".to_string(),
        "list".to_string(),
        "--manifest".to_string(),
        manifest.display().to_string(),
        "--calc-dir".to_string(),
        project.path("no-such-calc").display().to_string(),
    ])
    .unwrap();

    assert!(jobdag::run(args).await.unwrap());
}

#[tokio::test]
async fn missing_calc_environment_fails_execution_modes() {
    let project = Project::new();
    fs::remove_file(project.path("calc/bin/calculon")).unwrap();

    let err = jobdag::run(project.args(&["local-8", "fig2", "--skip-run"]))
        .await
        .unwrap_err();

    assert!(
        matches!(err.downcast_ref::<JobdagError>(), Some(JobdagError::ConfigError(_))),
        "{err:?}"
    );
}
