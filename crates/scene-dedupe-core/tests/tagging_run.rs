mod common;

use serde_json::json;

use common::{library, scene_json, scene_with, with_tag, RecordingStore};
use scene_dedupe_core::{Config, DupeTagger, Error, MemoryStore, PhashDistance, RunSummary};

const KEEP: i64 = 1;
const REMOVE: i64 = 2;
const IGNORE: i64 = 3;
const CHECK: i64 = 4;

fn tags() -> serde_json::Value {
    json!([
        {"id": KEEP, "name": "[Dupe: Keep]"},
        {"id": REMOVE, "name": "[Dupe: Remove]"},
        {"id": IGNORE, "name": "[Dupe: Ignore]"},
        {"id": CHECK, "name": "[Dupe: To check]"}
    ])
}

fn quiet_config() -> Config {
    Config {
        show_progress: false,
        ..Config::default()
    }
}

#[test]
fn test_tag_duplicates_marks_keeper_and_losers() {
    let lib = library(
        tags(),
        vec![
            scene_with(10, json!({"height": 720, "width": 1280})),
            scene_with(11, json!({})),
            scene_with(12, json!({"height": 480, "width": 640})),
        ],
        vec![vec![10, 11, 12]],
    );
    let mut tagger = DupeTagger::new(quiet_config(), MemoryStore::new(lib)).unwrap();

    let summary = tagger.tag_duplicates(PhashDistance::Exact).unwrap();
    assert_eq!(
        summary,
        RunSummary {
            groups: 1,
            resolved: 1,
            skipped: 0,
            failed: 0
        }
    );

    let library = tagger.store().library();
    let keeper = library.scene(11).unwrap();
    assert_eq!(keeper.title(), "[Dupe: 11K] Scene 11");
    assert!(keeper.has_tag(KEEP));
    for id in [10, 12] {
        let loser = library.scene(id).unwrap();
        assert_eq!(loser.title(), format!("[Dupe: 11R] Scene {}", id));
        assert!(loser.has_tag(REMOVE));
    }
}

#[test]
fn test_retagging_does_not_accumulate_markers() {
    let lib = library(
        tags(),
        vec![scene_with(10, json!({"size": "5"})), scene_with(11, json!({}))],
        vec![vec![10, 11]],
    );
    let mut tagger = DupeTagger::new(quiet_config(), MemoryStore::new(lib)).unwrap();

    tagger.tag_duplicates(PhashDistance::Exact).unwrap();
    tagger.tag_duplicates(PhashDistance::Exact).unwrap();

    let library = tagger.store().library();
    assert_eq!(library.scene(11).unwrap().title(), "[Dupe: 11K] Scene 11");
    assert_eq!(library.scene(10).unwrap().title(), "[Dupe: 11R] Scene 10");
}

#[test]
fn test_ignored_scene_leaves_group_too_small() {
    let lib = library(
        tags(),
        vec![
            with_tag(scene_json(10, "Ignored"), IGNORE, "[Dupe: Ignore]"),
            scene_json(11, "Kept"),
        ],
        vec![vec![10, 11]],
    );
    let mut tagger = DupeTagger::new(quiet_config(), RecordingStore::new(lib)).unwrap();

    let summary = tagger.tag_duplicates(PhashDistance::Exact).unwrap();
    assert_eq!(summary.skipped, 1);
    assert!(tagger.store().updates.is_empty());
}

#[test]
fn test_scenario_d_review_tag_elsewhere_skips_untagged_group() {
    let lib = library(
        tags(),
        vec![
            scene_json(10, "A"),
            scene_json(11, "B"),
            with_tag(scene_json(20, "Unrelated"), CHECK, "[Dupe: To check]"),
        ],
        vec![vec![10, 11]],
    );
    let mut tagger = DupeTagger::new(quiet_config(), RecordingStore::new(lib)).unwrap();

    let summary = tagger.tag_duplicates(PhashDistance::Exact).unwrap();
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.resolved, 0);
    assert!(tagger.store().updates.is_empty());
}

#[test]
fn test_review_tagged_members_are_resolved() {
    let lib = library(
        tags(),
        vec![
            with_tag(scene_with(10, json!({"bit_rate": 9000})), CHECK, "[Dupe: To check]"),
            with_tag(scene_json(11, "B"), CHECK, "[Dupe: To check]"),
            scene_with(12, json!({"bit_rate": 99999})),
        ],
        vec![vec![10, 11, 12]],
    );
    let mut tagger = DupeTagger::new(quiet_config(), MemoryStore::new(lib)).unwrap();

    tagger.tag_duplicates(PhashDistance::Exact).unwrap();

    let library = tagger.store().library();
    assert!(library.scene(10).unwrap().has_tag(KEEP));
    assert!(library.scene(11).unwrap().has_tag(REMOVE));
    assert_eq!(library.scene(12).unwrap().title(), "Scene 12");
}

#[test]
fn test_group_with_bad_scene_is_skipped_and_run_continues() {
    let lib = library(
        tags(),
        vec![
            scene_with(10, json!({"mod_time": "garbage"})),
            scene_json(11, "B"),
            scene_json(20, "C"),
            scene_with(21, json!({"size": "10"})),
        ],
        vec![vec![10, 11], vec![20, 21]],
    );
    let mut tagger = DupeTagger::new(quiet_config(), MemoryStore::new(lib)).unwrap();

    let summary = tagger.tag_duplicates(PhashDistance::Exact).unwrap();
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.resolved, 1);

    let library = tagger.store().library();
    assert_eq!(library.scene(11).unwrap().title(), "B");
    assert!(library.scene(20).unwrap().has_tag(KEEP));
}

#[test]
fn test_store_failure_aborts_run_with_partial_tags() {
    let lib = library(
        tags(),
        vec![scene_json(10, "A"), scene_json(11, "B")],
        vec![vec![10, 11]],
    );
    let mut store = RecordingStore::new(lib);
    store.fail_updates_after = Some(1);
    let mut tagger = DupeTagger::new(quiet_config(), store).unwrap();

    let err = tagger.tag_duplicates(PhashDistance::Exact).unwrap_err();
    assert!(matches!(err, Error::Store(_)));

    // The keeper update went through before the failure
    let store = tagger.into_store();
    assert_eq!(store.updates.len(), 1);
    assert!(store.inner.library().scene(10).unwrap().has_tag(KEEP));
    assert!(!store.inner.library().scene(11).unwrap().has_tag(REMOVE));
}

#[test]
fn test_dry_run_sends_no_updates() {
    let lib = library(
        tags(),
        vec![scene_json(10, "A"), scene_json(11, "B")],
        vec![vec![10, 11]],
    );
    let config = Config {
        dry_run: true,
        ..quiet_config()
    };
    let mut tagger = DupeTagger::new(config, RecordingStore::new(lib)).unwrap();

    let summary = tagger.tag_duplicates(PhashDistance::Exact).unwrap();
    assert_eq!(summary.resolved, 1);
    assert!(tagger.store().updates.is_empty());
}

#[test]
fn test_scenario_e_cleanup_strips_marker_and_tag() {
    let lib = library(
        tags(),
        vec![with_tag(scene_json(42, "[Dupe: 42K] Scene Name"), KEEP, "[Dupe: Keep]")],
        Vec::new(),
    );
    let mut tagger = DupeTagger::new(quiet_config(), RecordingStore::new(lib)).unwrap();

    let summary = tagger.clean_titles().unwrap();
    assert_eq!(summary.titles, 1);
    assert_eq!(summary.keep_tags, 1);

    let scene = tagger.store().inner.library().scene(42).unwrap();
    assert_eq!(scene.title(), "Scene Name");
    assert!(!scene.has_tag(KEEP));
}

#[test]
fn test_cleanup_is_idempotent() {
    let lib = library(
        tags(),
        vec![
            with_tag(scene_json(42, "[Dupe: 42K] Scene Name"), KEEP, "[Dupe: Keep]"),
            with_tag(scene_json(43, "[Dupe: 42R] Scene Name"), REMOVE, "[Dupe: Remove]"),
        ],
        Vec::new(),
    );
    let mut tagger = DupeTagger::new(quiet_config(), RecordingStore::new(lib)).unwrap();

    tagger.clean_titles().unwrap();
    let after_first = tagger.store().updates.len();
    assert_eq!(after_first, 4);

    let second = tagger.clean_titles().unwrap();
    assert!(second.is_empty());
    assert_eq!(tagger.store().updates.len(), after_first);
}

#[test]
fn test_cleanup_on_clean_library_is_a_no_op() {
    let lib = library(json!([]), vec![scene_json(1, "Plain")], Vec::new());
    let mut tagger = DupeTagger::new(quiet_config(), RecordingStore::new(lib)).unwrap();

    assert!(tagger.clean_titles().unwrap().is_empty());
    assert!(tagger.store().updates.is_empty());
}

#[test]
fn test_create_and_remove_tags() {
    let lib = library(json!([]), Vec::new(), Vec::new());
    let mut tagger = DupeTagger::new(quiet_config(), MemoryStore::new(lib)).unwrap();

    tagger.create_tags().unwrap();
    let library = tagger.store().library();
    assert_eq!(library.tags.len(), 5);
    let parent = library.tag_by_name("[Library management]").unwrap().id;
    for name in tagger.config().tags.actionable_tags() {
        let tag = library.tag_by_name(name).unwrap();
        assert_eq!(tag.parent_ids, vec![parent]);
        assert!(tag.ignore_auto_tag);
    }

    // Creating twice reuses the existing tags
    tagger.create_tags().unwrap();
    assert_eq!(tagger.store().library().tags.len(), 5);

    assert_eq!(tagger.remove_tags().unwrap(), 4);
    assert_eq!(tagger.remove_tags().unwrap(), 0);
    let library = tagger.store().library();
    assert_eq!(library.tags.len(), 1);
    assert!(library.tag_by_name("[Library management]").is_some());
}

#[test]
fn test_invalid_config_is_rejected_up_front() {
    let mut config = quiet_config();
    config.tags.prefix = String::new();
    let lib = library(json!([]), Vec::new(), Vec::new());

    assert!(matches!(
        DupeTagger::new(config, MemoryStore::new(lib)),
        Err(Error::Configuration(_))
    ));
}
