use pretty_assertions::assert_eq;
use std::sync::Arc;
use blacklabel::core::*;

fn explorer() -> Explorer {
    let fs = MemoryFs::new();
    fs.add_file("/doc/intro.md", 10).unwrap();
    fs.add_dir("/doc/intro.assets").unwrap();
    fs.add_file("/doc/intro.assets/figure.png", 99).unwrap();
    fs.add_file("/doc/intro.assets/notes.txt", 5).unwrap();
    fs.add_dir("/doc/intro.assets/draft").unwrap();
    fs.add_file("/doc/intro.assets/draft/raw.psd", 1).unwrap();
    fs.add_file("/doc/todo.txt", 1).unwrap();
    fs.add_file("/doc/outro.md", 1).unwrap();
    fs.add_dir("/doc/part").unwrap();
    fs.add_file("/doc/part/one.md", 1).unwrap();

    Explorer::new(WorkspaceRootResolver::new(
        TreeBuilder::new(Arc::new(fs)),
        Arc::new(vec![WorkspaceFolder::local("/doc")]),
    ))
}

fn names(entries: &[Entry]) -> Vec<&str> {
    entries.iter().map(|e| e.name.as_str()).collect()
}

#[tokio::test]
async fn directory_children_use_the_markdown_policy() {
    let ex = explorer();
    let part = ex.builder().entry("part", "/doc/part").await.unwrap();
    assert_eq!(names(&ex.children(&part).await.unwrap()), vec!["one.md"]);

    let doc = ex.builder().entry("doc", "/doc").await.unwrap();
    assert_eq!(
        names(&ex.children(&doc).await.unwrap()),
        vec!["intro.md", "outro.md", "part"]
    );
}

#[tokio::test]
async fn markdown_with_assets_lists_the_sidecar_unfiltered() {
    let ex = explorer();
    let intro = ex.builder().entry("intro.md", "/doc/intro.md").await.unwrap();
    assert!(intro.assets_path.is_some());

    let kids = ex.children(&intro).await.unwrap();
    assert_eq!(names(&kids), vec!["figure.png", "notes.txt", "draft"]);
    let draft = &kids[2];
    assert!(draft.is_draft_folder, "drafts are not flattened inside assets");
    assert!(!draft.in_draft_folder);
}

#[tokio::test]
async fn plain_files_are_leaves() {
    let ex = explorer();
    let outro = ex.builder().entry("outro.md", "/doc/outro.md").await.unwrap();
    assert!(ex.children(&outro).await.unwrap().is_empty());

    let info = ex.render_info(&outro);
    assert!(!info.expandable);
    assert_eq!(
        info.open_action,
        Some(OpenAction {
            path: "/doc/outro.md".into()
        })
    );
}

#[tokio::test]
async fn no_element_means_top_level() {
    let ex = explorer();
    let via_none = ex.children_of(None).await.unwrap();
    let top = ex.top_level().await.unwrap();
    assert_eq!(via_none, top);
    assert_eq!(top[0].name, "doc[Workspace Root]");

    let part = top.iter().find(|e| e.name == "part").unwrap();
    let via_some = ex.children_of(Some(part)).await.unwrap();
    assert_eq!(names(&via_some), vec!["one.md"]);
}

#[tokio::test]
async fn custom_policies_reach_children() {
    let fs = MemoryFs::new();
    fs.add_file("/r/a.txt", 1).unwrap();
    fs.add_file("/r/b.md", 1).unwrap();
    fs.add_file("/r/b.assets/c.txt", 1).unwrap();
    fs.add_file("/r/b.assets/d.md", 1).unwrap();

    let builder = TreeBuilder::new(Arc::new(fs))
        .with_policies(TreePolicy::unrestricted(), TreePolicy::markdown());
    let root = builder.entry("r", "/r").await.unwrap();
    assert_eq!(
        names(&builder.children(&root).await.unwrap()),
        vec!["a.txt", "b.md", "b.assets"]
    );

    let b = builder.entry("b.md", "/r/b.md").await.unwrap();
    assert_eq!(names(&builder.children(&b).await.unwrap()), vec!["d.md"]);
}

#[tokio::test]
async fn markdown_with_sidecar_both_expands_and_opens() {
    let ex = explorer();
    let intro = ex.builder().entry("intro.md", "/doc/intro.md").await.unwrap();

    let info = ex.render_info(&intro);
    assert!(info.expandable);
    assert_eq!(
        info.open_action,
        Some(OpenAction {
            path: "/doc/intro.md".into()
        })
    );

    let sidecar = ex
        .builder()
        .entry("intro.assets", "/doc/intro.assets")
        .await
        .unwrap();
    assert_eq!(ex.render_info(&sidecar).open_action, None);
}
