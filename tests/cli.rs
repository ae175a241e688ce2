use assert_cmd::Command;
use predicates::prelude::*;
use std::fs::{create_dir_all, write};
use std::path::Path;
use tempfile::{tempdir, TempDir};

/// Lays out a deck project: `deck.yaml` next to a `slides/` directory.
fn create_deck_project(slides: &[(&str, &str)], on_error: &str) -> TempDir {
    let tmp = tempdir().expect("Creating temp dir failed");
    let slides_dir = tmp.path().join("slides");
    create_dir_all(&slides_dir).unwrap();
    for (name, html) in slides {
        write(slides_dir.join(name), html).unwrap();
    }
    write(
        tmp.path().join("deck.yaml"),
        format!(
            "deck:\n  title: \"DeepSeek mHC\"\n  author: \"Tests\"\n  layout: LAYOUT_16x9\nslides:\n  dir: slides\noutput: out.pptx\non_error: {on_error}\n"
        ),
    )
    .expect("Writing deck file failed");
    tmp
}

fn slide_count(package: &Path) -> usize {
    let file = std::fs::File::open(package).unwrap();
    let archive = zip::ZipArchive::new(file).unwrap();
    let count = archive
        .file_names()
        .filter(|n| n.starts_with("ppt/slides/slide") && n.ends_with(".xml"))
        .count();
    count
}

#[test]
fn build_cli_happy_flow_writes_presentation() {
    let project = create_deck_project(
        &[
            ("slide02.html", "<body><h1>Overview</h1><p>text</p></body>"),
            ("slide01.html", "<body><h1>Cover</h1></body>"),
        ],
        "fail_fast",
    );
    let mut cmd = Command::cargo_bin("deck-builder").expect("Binary exists");

    cmd.arg("build")
        .arg("--config")
        .arg(project.path().join("deck.yaml"));

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Created:").and(predicate::str::contains("Success: 2 slides")));

    let output = project.path().join("out.pptx");
    assert!(output.exists());
    assert_eq!(slide_count(&output), 2);
}

#[test]
fn build_cli_fails_fast_and_writes_nothing() {
    let project = create_deck_project(
        &[
            ("a.html", "<body><h1>Fine</h1></body>"),
            ("b.html", "<div>missing body</div>"),
        ],
        "fail_fast",
    );
    let mut cmd = Command::cargo_bin("deck-builder").expect("Binary exists");

    cmd.arg("build")
        .arg("--config")
        .arg(project.path().join("deck.yaml"));

    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("b.html"));
    assert!(!project.path().join("out.pptx").exists());
}

#[test]
fn build_cli_on_error_flag_overrides_deck_file() {
    let project = create_deck_project(
        &[
            ("a.html", "<body><h1>Fine</h1></body>"),
            ("b.html", "<div>missing body</div>"),
            ("c.html", "<body><h1>Also fine</h1></body>"),
        ],
        "fail_fast",
    );
    let mut cmd = Command::cargo_bin("deck-builder").expect("Binary exists");

    cmd.arg("build")
        .arg("--config")
        .arg(project.path().join("deck.yaml"))
        .arg("--on-error")
        .arg("skip");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Skipped: 1 slides").and(predicate::str::contains("b.html")));
    assert_eq!(slide_count(&project.path().join("out.pptx")), 2);
}

#[test]
fn list_cli_prints_sorted_sources() {
    let project = create_deck_project(
        &[("b.html", ""), ("a.html", ""), ("c.html", ""), ("notes.txt", "")],
        "skip",
    );
    let mut cmd = Command::cargo_bin("deck-builder").expect("Binary exists");

    let assert = cmd
        .arg("list")
        .arg("--config")
        .arg(project.path().join("deck.yaml"))
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let names: Vec<_> = stdout
        .lines()
        .map(|l| Path::new(l).file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["a.html", "b.html", "c.html"]);
}

#[test]
fn build_cli_with_missing_deck_file_exits_non_zero() {
    let mut cmd = Command::cargo_bin("deck-builder").expect("Binary exists");
    cmd.arg("build").arg("--config").arg("definitely-missing.yaml");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read deck file"));
}

use std::sync::{Arc, Mutex};
use tracing_subscriber::prelude::*; // needed for .with()
use tracing_subscriber::{layer::Context, Layer, Registry};

/// Custom Layer to collect emitted event messages.
struct EventCollector {
    events: Arc<Mutex<Vec<String>>>,
}

impl<S> Layer<S> for EventCollector
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        use std::fmt::Write as FmtWrite;
        let mut msg = String::new();
        let _ = write!(&mut msg, "{:?}", event);
        self.events.lock().unwrap().push(msg);
    }
}

#[tokio::test]
async fn run_logs_skipped_slides_with_their_name() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let collector = EventCollector {
        events: events.clone(),
    };
    let subscriber = Registry::default().with(collector);
    let _guard = tracing::subscriber::set_default(subscriber);

    use deck_builder::cli::{run, Cli, Commands};
    use deck_builder_core::contract::FailurePolicy;

    let project = create_deck_project(
        &[
            ("01.html", "<body><h1>Cover</h1></body>"),
            ("02.html", "<body></body>"),
        ],
        "fail_fast",
    );
    let cli = Cli {
        command: Commands::Build {
            config: project.path().join("deck.yaml"),
            on_error: Some(FailurePolicy::SkipFailed),
        },
    };

    run(cli).await.expect("lenient build succeeds");

    let event_msgs = events.lock().unwrap();
    assert!(
        event_msgs.iter().any(|msg| msg.contains("trace_initialised")),
        "Expected a 'trace_initialised' trace event, got: {:?}",
        event_msgs
    );
    assert!(
        event_msgs
            .iter()
            .any(|msg| msg.contains("Skipped slide") && msg.contains("02.html")),
        "Expected a skip event naming 02.html, got: {:?}",
        event_msgs
    );
}
