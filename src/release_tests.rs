use super::*;
use crate::archive::archive_entries;
use crate::error::JextError;

const MANIFEST: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<extension type="module" client="site" method="upgrade">
  <name>Example Module</name>
  <version>2.3.1</version>
</extension>"#;

const DESCRIPTOR: &str = r#"<updates>
  <update>
    <name>Example Module</name>
    <version>1.0.0</version>
    <downloads>
      <downloadurl type="full" format="zip">https://example.com/ext/mod_example-1.0.0.zip</downloadurl>
    </downloads>
  </update>
</updates>
"#;

/// Lay out a complete extension directory under a fresh temp dir.
fn example_extension() -> (tempfile::TempDir, Utf8PathBuf) {
    let dir = tempfile::tempdir().expect("temp dir");
    let root = Utf8PathBuf::from_path_buf(dir.path().join("mod_example")).expect("utf-8 root");
    fs::create_dir_all(&root).expect("create extension dir");
    // Resolved so path assertions match the canonicalised release output.
    let root = root.canonicalize_utf8().expect("canonicalise root");
    fs::create_dir_all(root.join("updates")).expect("create updates dir");
    fs::create_dir_all(root.join("tmpl")).expect("create tmpl dir");
    fs::write(root.join("example.xml"), MANIFEST).expect("write manifest");
    fs::write(root.join("updates/extension.xml"), DESCRIPTOR).expect("write descriptor");
    fs::write(root.join("mod_example.php"), "<?php ?>").expect("write entry file");
    fs::write(root.join("tmpl/default.php"), "<?php ?>").expect("write template");
    fs::write(root.join(".gitignore"), "*.zip\n").expect("write dotfile");
    (dir, root)
}

fn package_files(root: &Utf8Path) -> Vec<String> {
    let mut names: Vec<String> = root
        .read_dir_utf8()
        .expect("read dir")
        .map(|e| e.expect("dir entry").file_name().to_owned())
        .filter(|n| n.starts_with("mod_example") && n.ends_with(".zip"))
        .collect();
    names.sort();
    names
}

#[test]
fn produces_package_named_after_manifest_version() {
    let (_guard, root) = example_extension();

    let output = build_release(&root).expect("build release");

    assert_eq!(output.package_path, root.join("mod_example-2.3.1.zip"));
    assert_eq!(output.descriptor_path, root.join("updates/extension.xml"));
    assert!(output.package_path.is_file());
}

#[test]
fn package_excludes_updates_and_hidden_entries() {
    let (_guard, root) = example_extension();

    let output = build_release(&root).expect("build release");

    let entries = archive_entries(&output.package_path).expect("read archive");
    assert_eq!(
        entries,
        vec!["example.xml", "mod_example.php", "tmpl/default.php"]
    );
}

#[test]
fn descriptor_advertises_the_new_release() {
    let (_guard, root) = example_extension();

    build_release(&root).expect("build release");

    let feed = fs::read_to_string(root.join("updates/extension.xml")).expect("read feed");
    assert!(feed.contains("<version>2.3.1</version>"));
    assert!(feed.contains("https://example.com/ext/mod_example-2.3.1.zip"));
}

#[test]
fn stale_packages_are_removed_before_building() {
    let (_guard, root) = example_extension();
    fs::write(root.join("mod_example-1.0.0.zip"), b"stale").expect("plant stale package");
    fs::write(root.join("mod_example-0.9.0.zip"), b"older").expect("plant older package");

    build_release(&root).expect("build release");

    assert_eq!(package_files(&root), vec!["mod_example-2.3.1.zip"]);
}

#[test]
fn unrelated_archives_are_left_alone() {
    let (_guard, root) = example_extension();
    fs::write(root.join("backup.zip"), b"unrelated").expect("plant unrelated archive");

    build_release(&root).expect("build release");

    assert!(root.join("backup.zip").is_file());
}

#[test]
fn rerunning_leaves_exactly_one_package() {
    let (_guard, root) = example_extension();

    build_release(&root).expect("first release");
    build_release(&root).expect("second release");

    assert_eq!(package_files(&root), vec!["mod_example-2.3.1.zip"]);
}

#[test]
fn missing_manifest_aborts_before_any_cleanup() {
    let (_guard, root) = example_extension();
    fs::remove_file(root.join("example.xml")).expect("remove manifest");
    fs::write(root.join("mod_example-1.0.0.zip"), b"stale").expect("plant stale package");

    let err = build_release(&root).expect_err("expected failure");

    assert!(matches!(err, JextError::ManifestUnreadable { .. }));
    assert!(root.join("mod_example-1.0.0.zip").is_file());
}

#[test]
fn missing_descriptor_fails_after_the_package_is_built() {
    let (_guard, root) = example_extension();
    fs::remove_file(root.join("updates/extension.xml")).expect("remove descriptor");

    let err = build_release(&root).expect_err("expected failure");

    assert!(matches!(err, JextError::DescriptorUnreadable { .. }));
    // Local side effects of earlier stages persist.
    assert!(root.join("mod_example-2.3.1.zip").is_file());
}
