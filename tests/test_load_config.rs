use std::fs::write;
use std::path::PathBuf;
use tempfile::tempdir;

use deck_builder::load_config::load_config;
use deck_builder_core::contract::{FailurePolicy, Layout};
use deck_builder_core::listing::SourceSelection;

/// A directory-mode deck file resolves every path against the deck file's directory.
#[test]
fn test_load_config_directory_mode_resolves_relative_paths() {
    let config_yaml = r#"
deck:
  title: "DeepSeek mHC"
  author: "Codex"
  subject: "Manifold-Constrained Hyper-Connections"
  layout: LAYOUT_WIDE
slides:
  dir: slides_full
output: build/deck.pptx
on_error: skip
"#;
    let tmp = tempdir().unwrap();
    let config_path = tmp.path().join("deck.yaml");
    write(&config_path, config_yaml).unwrap();

    let config = load_config(&config_path).expect("Config should load");

    assert_eq!(config.metadata.title, "DeepSeek mHC");
    assert_eq!(config.metadata.author, "Codex");
    assert_eq!(
        config.metadata.subject.as_deref(),
        Some("Manifold-Constrained Hyper-Connections")
    );
    assert_eq!(config.metadata.layout, Layout::LayoutWide);
    assert_eq!(config.policy, FailurePolicy::SkipFailed);
    assert_eq!(config.output, tmp.path().join("build/deck.pptx"));
    assert_eq!(
        config.selection,
        SourceSelection::Directory {
            dir: tmp.path().join("slides_full"),
            extension: "html".to_string(),
        }
    );
}

/// An explicit file list keeps its order and is resolved against `dir` when given.
#[test]
fn test_load_config_explicit_list_keeps_order() {
    let config_yaml = r#"
deck:
  title: "Presentation"
  author: "DeepSeek"
slides:
  dir: slides
  files:
    - slide02_overview.html
    - slide01_cover.html
    - /abs/slide03.html
output: /tmp/out.pptx
"#;
    let tmp = tempdir().unwrap();
    let config_path = tmp.path().join("deck.yaml");
    write(&config_path, config_yaml).unwrap();

    let config = load_config(&config_path).expect("Config should load");

    assert_eq!(config.metadata.layout, Layout::Layout16x9, "layout defaults to 16x9");
    assert_eq!(config.policy, FailurePolicy::FailFast, "policy defaults to fail_fast");
    assert_eq!(config.output, PathBuf::from("/tmp/out.pptx"));
    assert_eq!(
        config.selection,
        SourceSelection::Explicit(vec![
            tmp.path().join("slides/slide02_overview.html"),
            tmp.path().join("slides/slide01_cover.html"),
            PathBuf::from("/abs/slide03.html"),
        ])
    );
}

#[test]
fn test_load_config_custom_extension() {
    let tmp = tempdir().unwrap();
    let config_path = tmp.path().join("deck.yaml");
    write(
        &config_path,
        "deck:\n  title: t\n  author: a\nslides:\n  dir: .\n  extension: htm\noutput: o.pptx\n",
    )
    .unwrap();

    let config = load_config(&config_path).unwrap();
    match config.selection {
        SourceSelection::Directory { extension, .. } => assert_eq!(extension, "htm"),
        other => panic!("expected directory selection, got {other:?}"),
    }
}

#[test]
fn test_load_config_errors_when_no_slides_named() {
    let tmp = tempdir().unwrap();
    let config_path = tmp.path().join("deck.yaml");
    write(
        &config_path,
        "deck:\n  title: t\n  author: a\nslides: {}\noutput: o.pptx\n",
    )
    .unwrap();

    let err = load_config(&config_path).unwrap_err();
    assert!(
        err.to_string().contains("`dir` or `files`"),
        "got: {err}"
    );
}

/// This test ensures that if the config file is not valid YAML, load_config errors and reports as such.
#[test]
fn test_load_config_errors_for_invalid_file() {
    let tmp = tempdir().unwrap();
    let config_path = tmp.path().join("deck.yaml");
    write(&config_path, b"not-yaml: [:::").unwrap();

    let err = load_config(&config_path).unwrap_err();
    let msg = err.to_string();
    assert!(
        msg.contains("parse") || msg.contains("YAML"),
        "Parse error expected, got: {msg}"
    );
}

#[test]
fn test_load_config_rejects_unknown_policy() {
    let tmp = tempdir().unwrap();
    let config_path = tmp.path().join("deck.yaml");
    write(
        &config_path,
        "deck:\n  title: t\n  author: a\nslides:\n  dir: s\noutput: o.pptx\non_error: retry\n",
    )
    .unwrap();

    assert!(load_config(&config_path).is_err());
}

#[test]
fn test_load_config_errors_for_missing_file() {
    let err = load_config("does/not/exist.yaml").unwrap_err();
    assert!(err.to_string().contains("Failed to read deck file"));
}
