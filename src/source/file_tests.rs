use super::*;
use std::path::PathBuf;

fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents.as_bytes()).expect("write manifest");
    path
}

const MULTI_APP: &str = r#"
version: 2
space: staging
applications:
  - name: frontend
    memory: 256M
  - name: backend
    instances: 3
"#;

#[test]
fn single_app_document_is_selected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_file(dir.path(), "manifest.yml", "name: solo\nstack: cflinuxfs4\n");
    let selection = read_manifest(&path, None).expect("read manifest");
    assert_eq!(selection.manifest.name, "solo");
    assert_eq!(selection.manifest.stack, "cflinuxfs4");
    assert_eq!(selection.version, "");
    assert_eq!(selection.space, "");
}

#[test]
fn multi_app_document_falls_back_to_first_entry() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_file(dir.path(), "manifest.yml", MULTI_APP);
    let selection = read_manifest(&path, None).expect("read manifest");
    assert_eq!(selection.manifest.name, "frontend");
    assert_eq!(selection.manifest.process.memory, "256M");
    assert_eq!(selection.version, "2");
    assert_eq!(selection.space, "staging");
}

#[test]
fn app_can_be_selected_by_name() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_file(dir.path(), "manifest.yml", MULTI_APP);
    let selection = read_manifest(&path, Some("backend")).expect("read manifest");
    assert_eq!(selection.manifest.name, "backend");
    assert_eq!(selection.manifest.process.instances, Some(3));

    let err = read_manifest(&path, Some("missing")).expect_err("unknown app");
    assert!(err.to_string().contains("\"missing\""), "{err}");
}

#[test]
fn every_document_in_a_stream_is_considered() {
    let text = "---\nname: first\n---\n---\napplications:\n  - name: second\n";
    let manifests = decode_manifests(text).expect("decode stream");
    let names: Vec<&str> = manifests
        .iter()
        .flat_map(|manifest| manifest.applications.iter())
        .map(|app| app.name.as_str())
        .collect();
    assert_eq!(names, vec!["first", "second"]);
}

#[test]
fn empty_manifest_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_file(dir.path(), "manifest.yml", "applications: []\n");
    let err = read_manifest(&path, None).expect_err("no applications");
    assert!(err.to_string().contains("no applications"), "{err}");
}

#[test]
fn malformed_single_app_reports_decode_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_file(dir.path(), "manifest.yml", "name: app\ninstances: many\n");
    let err = read_manifest(&path, None).expect_err("bad instances");
    assert!(
        format!("{err:#}").contains("manifest.yml"),
        "unexpected error: {err:#}"
    );
}

#[test]
fn missing_file_names_the_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("absent.yml");
    let err = read_manifest(&path, None).expect_err("missing file");
    assert!(err.to_string().contains("absent.yml"), "{err}");
}

#[test]
fn listing_a_directory_reads_only_yaml_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_file(dir.path(), "a.yml", "name: alpha\n");
    write_file(dir.path(), "b.yaml", MULTI_APP);
    write_file(dir.path(), "c.txt", "name: ignored\n");
    write_file(dir.path(), "d.yml", "name: [unclosed\n");
    fs::create_dir(dir.path().join("nested.yml")).expect("create dir");

    let names = list_manifest_apps(dir.path()).expect("list directory");
    assert_eq!(names, vec!["alpha", "frontend", "backend"]);
}

#[test]
fn listing_a_file_without_names_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_file(dir.path(), "manifest.yml", "stack: cflinuxfs4\n");
    assert!(list_manifest_apps(&path).is_err());
    let named = write_file(dir.path(), "named.yml", "name: solo\n");
    assert_eq!(list_manifest_apps(&named).expect("list file"), vec!["solo"]);
}

#[test]
fn merge_keys_share_defaults_between_applications() {
    let manifests = decode_manifests(
        "defaults: &defaults\n  memory: 512M\n  instances: 3\napplications:\n  - name: app\n    <<: *defaults\n  - name: small\n    <<: *defaults\n    memory: 128M\n",
    )
    .expect("decode");
    let apps = &manifests[0].applications;
    assert_eq!(apps[0].name, "app");
    assert_eq!(apps[0].process.memory, "512M");
    assert_eq!(apps[0].process.instances, Some(3));
    assert_eq!(apps[1].process.memory, "128M");
    assert_eq!(apps[1].process.instances, Some(3));
}
