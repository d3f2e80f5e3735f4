use std::fs;
use std::io::Write;
use std::process::{Command, Output, Stdio};

use pretty_assertions::assert_eq;

const DIAGRAM: &str = r#"<mxGraphModel><root>
  <mxCell id="0"/>
  <mxCell id="1" parent="0"/>
  <mxCell id="p1" value="@@Person" style="ellipse;html=1;" vertex="1" parent="1"/>
  <mxCell id="p2" value="Person&lt;br&gt;- name: &quot;Bob&quot;" style="ellipse;html=1;" vertex="1" parent="1"/>
  <mxCell id="n1" value="!!Note" style="rounded=0;html=1;" vertex="1" parent="1"/>
  <mxCell id="e1" value="KNOWS" edge="1" parent="1" source="p1" target="p2"/>
</root></mxGraphModel>"#;

fn cypherdraw(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_cypherdraw"))
        .args(args)
        .output()
        .expect("failed to run cypherdraw")
}

fn diagram_file() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(DIAGRAM.as_bytes()).unwrap();
    file
}

#[test]
fn cli_match_writes_stdout() {
    let file = diagram_file();
    let output = cypherdraw(&["match", "-i", "!!", file.path().to_str().unwrap()]);
    assert!(output.status.success());
    let expected = "\
MATCH
(`p1`:@@Person),
(`p2`:Person {name: \"Bob\"}),
(`p1`)-[:KNOWS]->(`p2`)
RETURN *
";
    assert_eq!(String::from_utf8(output.stdout).unwrap(), expected);
}

#[test]
fn cli_create_with_all_options() {
    let file = diagram_file();
    let output = cypherdraw(&[
        "create",
        "-i",
        "!!",
        "-m",
        "@@",
        "-l",
        "Draft",
        "-u",
        "uuid",
        "-g",
        "seed",
        file.path().to_str().unwrap(),
    ]);
    assert!(output.status.success());
    let expected = "\
MATCH
(`p1`:Person)
CREATE
(`p2`:Person:Draft {name: \"Bob\", uuid: \"f0524385-5cec-3a1b-85f0-2e1f7c1209ef\"}),
(`p1`)-[:KNOWS {uuid: \"484d8f09-c3cd-3eff-9d56-ee758496c850\"}]->(`p2`)
RETURN *
";
    assert_eq!(String::from_utf8(output.stdout).unwrap(), expected);
}

#[test]
fn cli_only_circles() {
    let file = diagram_file();
    let output = cypherdraw(&["match", "-c", file.path().to_str().unwrap()]);
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(!stdout.contains("`n1`"), "rectangle should be filtered out, got: {stdout}");
}

#[test]
fn cli_writes_output_file() {
    let file = diagram_file();
    let dir = tempfile::tempdir().unwrap();
    let out_path = dir.path().join("out.cypher");
    let output = cypherdraw(&[
        "match",
        "-o",
        out_path.to_str().unwrap(),
        file.path().to_str().unwrap(),
    ]);
    assert!(output.status.success());
    assert!(output.stdout.is_empty(), "nothing goes to stdout with -o");
    let written = fs::read_to_string(&out_path).unwrap();
    assert!(written.starts_with("MATCH\n"));
    assert!(written.ends_with("RETURN *\n"));
}

#[test]
fn cli_reads_stdin() {
    let mut child = Command::new(env!("CARGO_BIN_EXE_cypherdraw"))
        .args(["create", "-m", "@@", "-"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(DIAGRAM.as_bytes())
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with("MATCH\n(`p1`:Person)\nCREATE\n"), "got: {stdout}");
}

#[test]
fn cli_malformed_input_fails() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"<mxGraphModel><root>").unwrap();
    let output = cypherdraw(&["match", file.path().to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("malformed diagram XML"), "got: {stderr}");
}

#[test]
fn cli_missing_input_file_fails() {
    let output = cypherdraw(&["match", "/nonexistent/diagram.drawio"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("failed to read"), "got: {stderr}");
}

#[test]
fn cli_mark_option_is_create_only() {
    let file = diagram_file();
    let output = cypherdraw(&["match", "-m", "@@", file.path().to_str().unwrap()]);
    assert!(!output.status.success());
}
