mod common;

use common::{Fixture, Node};
use gitkit::{DiffFindOptions, DiffOptions, DiffStats, DiffStatus, Error, IndexSource, LineType};
use pretty_assertions::assert_eq;
use serde_json::json;

const POEM: &str = "roses are red\nviolets are blue\nsugar is sweet\nand so are you\n";

#[tokio::test]
async fn tree_to_tree_applies_partial_options() -> anyhow::Result<()> {
    let fx = Fixture::new();
    let old = fx.tree(&[("poem.txt", Node::File(POEM)), ("keep.txt", Node::File("same\n"))]);
    let new = fx.tree(&[
        ("poem.txt", Node::File("roses are red\nviolets are blue\nsugar is sour\nand so are you\n")),
        ("keep.txt", Node::File("same\n")),
    ]);
    let repo = fx.open();

    let diff = repo.tree_to_tree(Some(old), Some(new), json!({ "context_lines": 0 })).await?;
    let deltas = diff.deltas().await?;
    assert_eq!(deltas.len(), 1);
    assert_eq!(deltas[0].status, DiffStatus::Modified);
    assert_eq!(deltas[0].new_path.as_deref(), Some("poem.txt"));

    assert_eq!(diff.len().await?, 1);
    assert!(!diff.is_empty().await?);

    let patches = diff.patches().await?;
    assert_eq!(patches.len(), 1);
    let hunk = &patches[0].hunks[0];
    // No context lines around the single changed line.
    assert!(hunk.lines.iter().all(|line| line.line_type != LineType::Context));
    assert_eq!(patches[0].additions, 1);
    assert_eq!(patches[0].deletions, 1);

    assert_eq!(
        diff.stats().await?,
        DiffStats {
            files_changed: 1,
            insertions: 1,
            deletions: 1
        }
    );
    Ok(())
}

#[tokio::test]
async fn default_options_keep_three_context_lines() -> anyhow::Result<()> {
    let fx = Fixture::new();
    let old = fx.tree(&[("poem.txt", Node::File(POEM))]);
    let new = fx.tree(&[("poem.txt", Node::File("roses are red\nviolets are blue\nsugar is sour\nand so are you\n"))]);
    let repo = fx.open();

    let typed = repo.tree_to_tree(Some(old), Some(new), DiffOptions::default()).await?;
    let absent = repo.tree_to_tree(Some(old), Some(new), ()).await?;

    let typed = typed.patches().await?;
    assert_eq!(typed, absent.patches().await?);
    let context = typed[0].hunks[0]
        .lines
        .iter()
        .filter(|line| line.line_type == LineType::Context)
        .count();
    assert_eq!(context, 3);
    Ok(())
}

#[tokio::test]
async fn unknown_option_field_is_rejected() -> anyhow::Result<()> {
    let fx = Fixture::new();
    let tree = fx.tree(&[("a.txt", Node::File("a\n"))]);
    let repo = fx.open();

    let result = repo.tree_to_tree(None, Some(tree), json!({ "unknownField": 1 })).await;
    match result {
        Err(Error::InvalidOption { schema, field, .. }) => {
            assert_eq!(schema, "DiffOptions");
            assert_eq!(field, "unknownField");
        }
        other => panic!("expected InvalidOption, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn missing_tree_surfaces_as_error() -> anyhow::Result<()> {
    let fx = Fixture::new();
    let tree = fx.tree(&[("a.txt", Node::File("a\n"))]);
    let blob = fx.blob("not a tree\n");
    let repo = fx.open();

    assert!(repo.tree_to_tree(Some(blob), Some(tree), ()).await.is_err());
    assert!(repo.tree_to_workdir(Some(git2::Oid::zero()), ()).await.is_err());
    Ok(())
}

#[tokio::test]
async fn tree_to_tree_against_empty_tree_adds_everything() -> anyhow::Result<()> {
    let fx = Fixture::new();
    let src = fx.tree(&[("lib.rs", Node::File("// lib\n"))]);
    let root = fx.tree(&[("a.txt", Node::File("a\n")), ("src", Node::Dir(src))]);
    let repo = fx.open();

    let diff = repo.tree_to_tree(None, Some(root), ()).await?;
    let mut added: Vec<String> = diff
        .deltas()
        .await?
        .into_iter()
        .inspect(|delta| assert_eq!(delta.status, DiffStatus::Added))
        .filter_map(|delta| delta.new_path)
        .collect();
    added.sort();
    assert_eq!(added, vec!["a.txt", "src/lib.rs"]);
    Ok(())
}

#[tokio::test]
async fn tree_method_diffs_from_the_other_side() -> anyhow::Result<()> {
    let fx = Fixture::new();
    let old = fx.tree(&[("a.txt", Node::File("a\n"))]);
    let new = fx.tree(&[("a.txt", Node::File("a\n")), ("b.txt", Node::File("b\n"))]);
    let repo = fx.open();
    let old = repo.find_tree(old).await?;
    let new = repo.find_tree(new).await?;

    let patches = new.diff(&repo, &old, ()).await?.patches().await?;
    assert_eq!(patches.len(), 1);
    assert!(patches[0].is_added());
    assert_eq!(patches[0].new_path.as_deref(), Some("b.txt"));
    Ok(())
}

#[tokio::test]
async fn find_similar_rewrites_the_diff_in_place() -> anyhow::Result<()> {
    let fx = Fixture::new();
    let old = fx.tree(&[("old_name.txt", Node::File(POEM))]);
    let new = fx.tree(&[("new_name.txt", Node::File(POEM))]);
    let repo = fx.open();

    let mut diff = repo.tree_to_tree(Some(old), Some(new), ()).await?;
    let before = diff.deltas().await?;
    assert_eq!(before.len(), 2);
    assert_eq!(diff.len().await?, 2);

    diff.find_similar(json!({ "renames": true })).await?;
    assert_eq!(diff.len().await?, 1);
    let after_once = diff.deltas().await?;
    assert_eq!(after_once.len(), 1);
    assert_eq!(after_once[0].status, DiffStatus::Renamed);
    assert_eq!(after_once[0].old_path.as_deref(), Some("old_name.txt"));
    assert_eq!(after_once[0].new_path.as_deref(), Some("new_name.txt"));

    // A second pass starts from the rewritten deltas; the pair is not split
    // back into an add and a delete.
    diff.find_similar(DiffFindOptions {
        copies: true,
        ..DiffFindOptions::default()
    })
    .await?;
    let after_twice = diff.deltas().await?;
    assert_eq!(after_twice.len(), 1);
    assert_eq!(after_twice[0].status, DiffStatus::Renamed);

    let patches = diff.patches().await?;
    assert!(patches[0].is_renamed());
    Ok(())
}

/// Forty lines, with four of them reworded when `edited` is set.
fn long_text(edited: bool) -> String {
    (0..40)
        .map(|i| {
            if edited && i % 10 == 0 {
                format!("line {i} has been reworded entirely\n")
            } else {
                format!("line {i} of the original text\n")
            }
        })
        .collect()
}

#[tokio::test]
async fn find_similar_passes_accumulate() -> anyhow::Result<()> {
    let fx = Fixture::new();
    let original = long_text(false);
    let edited = long_text(true);
    let old = fx.tree(&[("before.txt", Node::File(&original))]);
    let new = fx.tree(&[("after.txt", Node::File(&edited))]);
    let repo = fx.open();

    let loose = json!({ "renames": true, "rename_threshold": 50 });
    let strict = json!({ "renames": true, "rename_threshold": 99 });

    // The strict pass alone finds no rename for a file that changed.
    let mut fresh = repo.tree_to_tree(Some(old), Some(new), ()).await?;
    fresh.find_similar(strict.clone()).await?;
    let mut statuses: Vec<DiffStatus> = fresh.deltas().await?.into_iter().map(|d| d.status).collect();
    statuses.sort_by_key(|status| format!("{status:?}"));
    assert_eq!(statuses, vec![DiffStatus::Added, DiffStatus::Deleted]);

    // After a loose pass the rename is already recorded, and the strict pass
    // leaves it in place.
    let mut layered = repo.tree_to_tree(Some(old), Some(new), ()).await?;
    layered.find_similar(loose).await?;
    layered.find_similar(strict).await?;
    let deltas = layered.deltas().await?;
    assert_eq!(deltas.len(), 1);
    assert_eq!(deltas[0].status, DiffStatus::Renamed);
    assert_eq!(deltas[0].old_path.as_deref(), Some("before.txt"));
    assert_eq!(deltas[0].new_path.as_deref(), Some("after.txt"));
    Ok(())
}

#[tokio::test]
async fn find_similar_rejects_diff_option_fields() -> anyhow::Result<()> {
    let fx = Fixture::new();
    let tree = fx.tree(&[("a.txt", Node::File("a\n"))]);
    let repo = fx.open();

    let mut diff = repo.tree_to_tree(None, Some(tree), ()).await?;
    let result = diff.find_similar(json!({ "context_lines": 1 })).await;
    assert!(matches!(
        result,
        Err(Error::InvalidOption { schema: "DiffFindOptions", .. })
    ));
    Ok(())
}

#[tokio::test]
async fn blob_to_buffer_with_absent_buffer_deletes() -> anyhow::Result<()> {
    let fx = Fixture::new();
    let blob = fx.blob(POEM);
    let repo = fx.open();

    let patch = repo
        .blob_to_buffer(Some(blob), Some("poem.txt"), None, None, ())
        .await?
        .expect("a deleted file");
    assert!(patch.is_deleted());
    assert_eq!(patch.deletions, 4);
    assert_eq!(patch.additions, 0);
    Ok(())
}

#[tokio::test]
async fn blob_to_buffer_handles_multibyte_text() -> anyhow::Result<()> {
    let fx = Fixture::new();
    let blob = fx.blob("caf\u{e9}\nna\u{ef}ve\n");
    let repo = fx.open();

    let patch = repo
        .blob_to_buffer(
            Some(blob),
            Some("words.txt"),
            Some("caf\u{e9}\nna\u{ef}ve\nr\u{e9}sum\u{e9}\n".into()),
            Some("words.txt"),
            json!({ "context_lines": 1 }),
        )
        .await?
        .expect("a modified file");

    assert!(patch.is_modified());
    assert_eq!(patch.additions, 1);
    let added: Vec<&str> = patch.hunks[0]
        .lines
        .iter()
        .filter(|line| line.line_type == LineType::Addition)
        .map(|line| line.content.as_str())
        .collect();
    assert_eq!(added, vec!["r\u{e9}sum\u{e9}\n"]);
    Ok(())
}

#[tokio::test]
async fn blob_to_buffer_from_nothing_adds_raw_bytes() -> anyhow::Result<()> {
    let fx = Fixture::new();
    let repo = fx.open();

    let patch = repo
        .blob_to_buffer(None, None, Some(b"one\ntwo\n".to_vec().into()), Some("new.txt"), ())
        .await?
        .expect("an added file");
    assert!(patch.is_added());
    assert_eq!(patch.additions, 2);
    assert_eq!(patch.deletions, 0);
    assert_eq!(patch.new_path.as_deref(), Some("new.txt"));
    assert_eq!(patch.old_path.as_deref(), Some("new.txt"));
    let added: Vec<&str> = patch.hunks[0].lines.iter().map(|line| line.content.as_str()).collect();
    assert_eq!(added, vec!["one\n", "two\n"]);
    Ok(())
}

#[tokio::test]
async fn blob_to_buffer_with_both_sides_absent_reports_nothing() -> anyhow::Result<()> {
    let fx = Fixture::new();
    let repo = fx.open();

    let patch = repo.blob_to_buffer(None, Some("x.txt"), None, Some("x.txt"), ()).await?;
    assert_eq!(patch, None);
    Ok(())
}

#[tokio::test]
async fn blob_to_buffer_missing_blob_is_not_found() -> anyhow::Result<()> {
    let fx = Fixture::new();
    let repo = fx.open();

    let result = repo
        .blob_to_buffer(Some(git2::Oid::zero()), None, Some("text".into()), None, ())
        .await;
    assert!(matches!(result, Err(Error::NotFound(_))));
    Ok(())
}

#[tokio::test]
async fn index_and_workdir_modes() -> anyhow::Result<()> {
    let fx = Fixture::new();
    fx.write_file("tracked.txt", "v1\n");
    let base = fx.stage("tracked.txt");
    fx.commit(base, "base");

    // Staged: a new file. Unstaged: an edit to the tracked one.
    fx.write_file("staged.txt", "new\n");
    fx.stage("staged.txt");
    fx.write_file("tracked.txt", "version two\n");
    let repo = fx.open();

    let index_to_workdir = repo.index_to_workdir(IndexSource::Repository, ()).await?.deltas().await?;
    assert_eq!(index_to_workdir.len(), 1);
    assert_eq!(index_to_workdir[0].status, DiffStatus::Modified);
    assert_eq!(index_to_workdir[0].new_path.as_deref(), Some("tracked.txt"));

    let tree_to_index = repo.tree_to_index(Some(base), IndexSource::default(), ()).await?.deltas().await?;
    assert_eq!(tree_to_index.len(), 1);
    assert_eq!(tree_to_index[0].status, DiffStatus::Added);
    assert_eq!(tree_to_index[0].new_path.as_deref(), Some("staged.txt"));

    let tree_to_workdir = repo.tree_to_workdir(Some(base), ()).await?.deltas().await?;
    assert!(tree_to_workdir
        .iter()
        .any(|delta| delta.status == DiffStatus::Modified && delta.new_path.as_deref() == Some("tracked.txt")));

    let with_index = repo.tree_to_workdir_with_index(Some(base), ()).await?;
    let mut paths: Vec<String> = with_index
        .deltas()
        .await?
        .into_iter()
        .filter_map(|delta| delta.new_path)
        .collect();
    paths.sort();
    assert_eq!(paths, vec!["staged.txt", "tracked.txt"]);

    let untracked = repo
        .tree_to_workdir(Some(base), json!({ "include_untracked": true }))
        .await?
        .deltas()
        .await?;
    assert!(untracked
        .iter()
        .any(|delta| delta.new_path.as_deref() == Some("staged.txt")));
    Ok(())
}

#[tokio::test]
async fn index_file_source_reads_that_file() -> anyhow::Result<()> {
    let fx = Fixture::new();
    fx.write_file("tracked.txt", "v1\n");
    let base = fx.stage("tracked.txt");
    fx.commit(base, "base");
    fx.write_file("tracked.txt", "version two\n");
    let repo = fx.open();

    let elsewhere = tempfile::tempdir()?;
    let saved = elsewhere.path().join("index");
    std::fs::copy(fx.git.path().join("index"), &saved)?;

    let from_file = repo.index_to_workdir(IndexSource::File(saved), ()).await?.deltas().await?;
    let from_repo = repo.index_to_workdir(IndexSource::Repository, ()).await?.deltas().await?;
    assert_eq!(from_file, from_repo);

    let missing = elsewhere.path().join("no-such-index");
    let result = repo.index_to_workdir(IndexSource::File(missing), ()).await;
    assert!(matches!(result, Err(Error::NotFound(_))));
    Ok(())
}

#[tokio::test]
async fn identical_trees_give_an_empty_diff() -> anyhow::Result<()> {
    let fx = Fixture::new();
    let tree = fx.tree(&[("a.txt", Node::File("a\n"))]);
    let repo = fx.open();

    let diff = repo.tree_to_tree(Some(tree), Some(tree), ()).await?;
    assert!(diff.is_empty().await?);
    assert!(diff.patches().await?.is_empty());
    Ok(())
}
