use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;
use tracing_subscriber::prelude::*; // needed for .with()
use tracing_subscriber::{layer::Context, Layer, Registry};

/// `vanitic` binary running inside `dir` with no inherited VANITIC_* settings.
fn vanitic_in(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("vanitic").expect("Binary exists");
    cmd.current_dir(dir);
    for var in [
        "VANITIC_CONFIG",
        "VANITIC_SRC",
        "VANITIC_OUT",
        "VANITIC_CLEAN",
        "VANITIC_GIT",
        "VANITIC_GO",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn help_lists_all_flags() {
    let tmp = tempdir().unwrap();
    vanitic_in(tmp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("--config")
                .and(predicate::str::contains("--src"))
                .and(predicate::str::contains("--out"))
                .and(predicate::str::contains("--clean")),
        );
}

#[test]
fn missing_config_fails_after_creating_output() {
    let tmp = tempdir().unwrap();

    vanitic_in(tmp.path())
        .args(["-c", "missing.txt", "-out", "site", "-src", "staging"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to open repository list"));

    assert!(tmp.path().join("site").is_dir());
    assert!(!tmp.path().join("staging").exists());
}

#[test]
fn default_config_is_read_from_working_directory() {
    let tmp = tempdir().unwrap();
    fs::write(tmp.path().join(".vanitic"), "").unwrap();

    vanitic_in(tmp.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("Generation complete"));

    let pkg = tmp.path().join("pkg");
    assert!(pkg.is_dir());
    assert_eq!(fs::read_dir(&pkg).unwrap().count(), 0);
}

#[test]
fn clean_flag_wipes_previous_output() {
    let tmp = tempdir().unwrap();
    fs::write(tmp.path().join("repos"), "").unwrap();
    let stale = tmp.path().join("out/example.com/stale/index.html");
    fs::create_dir_all(stale.parent().unwrap()).unwrap();
    fs::write(&stale, "stale").unwrap();

    vanitic_in(tmp.path())
        .args(["-c", "repos", "-out", "out", "-clean"])
        .assert()
        .success();

    assert!(!stale.exists());
    assert!(tmp.path().join("out").is_dir());
}

#[test]
fn settings_can_come_from_environment() {
    let tmp = tempdir().unwrap();
    fs::write(tmp.path().join("list.txt"), "").unwrap();

    vanitic_in(tmp.path())
        .env("VANITIC_CONFIG", "list.txt")
        .env("VANITIC_OUT", "from-env")
        .assert()
        .success();

    assert!(tmp.path().join("from-env").is_dir());
}

#[test]
fn failing_clone_aborts_the_run() {
    let tmp = tempdir().unwrap();
    fs::write(
        tmp.path().join("repos"),
        "https://example.com/foo.git\nhttps://example.com/bar.git\n",
    )
    .unwrap();

    vanitic_in(tmp.path())
        .args(["-c", "repos", "-out", "out", "-src", "src", "-git", "false"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to synchronise https://example.com/foo.git"));

    assert!(!tmp.path().join("src/foo.git").exists());
    assert!(!tmp.path().join("src/bar.git").exists());
    assert_eq!(fs::read_dir(tmp.path().join("out")).unwrap().count(), 0);
}

/// Custom Layer to collect emitted event messages.
struct EventCollector {
    events: Arc<Mutex<Vec<String>>>,
}

impl<S> Layer<S> for EventCollector
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        self.events.lock().unwrap().push(format!("{:?}", event));
    }
}

#[tokio::test]
async fn run_traces_config_failure() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let collector = EventCollector {
        events: events.clone(),
    };
    let subscriber = Registry::default().with(collector);
    let _guard = tracing::subscriber::set_default(subscriber);

    use vanitic::cli::{run, Cli};

    let tmp = tempdir().unwrap();
    let cli = Cli {
        config: tmp.path().join("dummy.txt"),
        src: Some(tmp.path().join("src")),
        out: tmp.path().join("pkg"),
        clean: false,
        git: "git".into(),
        go: "go".into(),
    };

    let err = run(cli).await.unwrap_err();
    assert!(format!("{err:#}").contains("dummy.txt"), "got {err:#}");

    let event_msgs = events.lock().unwrap();
    assert!(
        event_msgs
            .iter()
            .any(|msg| msg.contains("Failed to open repository list")),
        "Expected a config failure trace event, got: {:?}",
        event_msgs
    );
}
