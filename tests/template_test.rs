use std::fs;
use std::path::Path;

use serde_json::json;
use tempfile::TempDir;
use walkdir::WalkDir;

use waffle::error::{Error, Result};
use waffle::template::{
    execute_templates, DirectoryRoot, Formatters, MemoryRoot, SourceFormatter, TemplateSet,
};

/// Collapses runs of spaces and ensures a trailing newline, standing in for a
/// real source formatter.
struct SquashSpaces;

impl SourceFormatter for SquashSpaces {
    fn format(&self, source: &[u8]) -> Result<Vec<u8>> {
        let source = String::from_utf8_lossy(source);
        let squashed = source
            .split(' ')
            .filter(|w| !w.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        Ok(format!("{}\n", squashed.trim_end()).into_bytes())
    }
}

struct AlwaysFails;

impl SourceFormatter for AlwaysFails {
    fn format(&self, _: &[u8]) -> Result<Vec<u8>> {
        Err(Error::FormatterError("expected `;`".to_string()))
    }
}

/// Relative paths of all files below `dir`, sorted.
fn files(dir: &Path) -> Vec<String> {
    if !dir.exists() {
        return Vec::new();
    }
    let mut files: Vec<String> = WalkDir::new(dir)
        .into_iter()
        .map(|e| e.unwrap())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let rel = e.path().strip_prefix(dir).unwrap();
            rel.components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/")
        })
        .collect();
    files.sort();
    files
}

fn read(path: impl AsRef<Path>) -> String {
    fs::read_to_string(path).unwrap()
}

#[test]
fn test_private_and_hidden_markers() {
    let temp = TempDir::new().unwrap();
    let root = MemoryRoot::new()
        .with("a.tmpl", "X")
        .with("$hidden.tmpl", "Y")
        .with("!env.tmpl", "Z");

    execute_templates(&root, temp.path(), &json!({}), &Formatters::none()).unwrap();

    assert_eq!(files(temp.path()), vec![".env", "a"]);
    assert_eq!(read(temp.path().join("a")), "X");
    assert_eq!(read(temp.path().join(".env")), "Z");
}

#[test]
fn test_private_templates_are_includable() {
    let temp = TempDir::new().unwrap();
    let root = MemoryRoot::new()
        .with(
            "README.md.tmpl",
            "# {{ name }}\n{% include \"docs/$footer\" %}",
        )
        .with("docs/$footer.tmpl", "by {{ owner }}\n");

    let set = TemplateSet::discover(&root).unwrap();
    assert_eq!(set.renderable(), &["README.md"]);
    assert!(set.contains("docs/$footer"));

    let config = json!({"name": "demo", "owner": "ann"});
    let formatters = Formatters::none();
    set.execute(temp.path(), &config, &formatters).unwrap();
    assert_eq!(files(temp.path()), vec!["README.md"]);
    assert_eq!(read(temp.path().join("README.md")), "# demo\nby ann\n");
}

#[test]
fn test_include_resolves_regardless_of_discovery_order() {
    let temp = TempDir::new().unwrap();
    // "a" is parsed before "z/$part" but includes it.
    let root = MemoryRoot::new()
        .with("a.tmpl", "{% include \"z/$part\" %}!")
        .with("z/$part.tmpl", "part");

    execute_templates(&root, temp.path(), &json!({}), &Formatters::none()).unwrap();
    assert_eq!(read(temp.path().join("a")), "part!");
}

#[test_log::test]
fn test_end_to_end_go_source() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("out");
    let root = MemoryRoot::new().with("main.go.tmpl", "package   {{ Pkg }}");
    let formatters = Formatters::none().with("go", SquashSpaces);

    execute_templates(&root, &out, &json!({"Pkg": "demo"}), &formatters).unwrap();

    assert_eq!(files(&out), vec!["main.go"]);
    assert_eq!(read(out.join("main.go")), "package demo\n");
}

#[test]
fn test_malformed_template_writes_nothing() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("out");
    let root = MemoryRoot::new()
        .with("a.txt.tmpl", "fine")
        .with("main.go.tmpl", "package {{ Pkg");

    let err = execute_templates(&root, &out, &json!({"Pkg": "demo"}), &Formatters::none())
        .unwrap_err();

    match err {
        Error::TemplateParseError { name, .. } => assert_eq!(name, "main.go.tmpl"),
        other => panic!("Expected TemplateParseError, got {other:?}"),
    }
    assert!(files(&out).is_empty());
}

#[test]
fn test_render_failure_aborts_in_place() {
    let temp = TempDir::new().unwrap();
    let root = MemoryRoot::new()
        .with("1.txt.tmpl", "one")
        .with("2.txt.tmpl", "{{ missing }}")
        .with("3.txt.tmpl", "three");

    let err = execute_templates(&root, temp.path(), &json!({}), &Formatters::none()).unwrap_err();

    match err {
        Error::TemplateRenderError { name, .. } => assert_eq!(name, "2.txt"),
        other => panic!("Expected TemplateRenderError, got {other:?}"),
    }
    assert_eq!(files(temp.path()), vec!["1.txt"]);
}

#[test]
fn test_format_failure_still_writes_and_continues() {
    let temp = TempDir::new().unwrap();
    let root = MemoryRoot::new()
        .with("a.rs.tmpl", "fn main( ) {}")
        .with("b.txt.tmpl", "after");
    let formatters = Formatters::none().with("rs", AlwaysFails);

    let err = execute_templates(&root, temp.path(), &json!({}), &formatters).unwrap_err();

    match &err {
        Error::FormatError(failures) => {
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].path, temp.path().join("a.rs"));
            assert!(failures[0].reason.contains("expected `;`"));
        }
        other => panic!("Expected FormatError, got {other:?}"),
    }
    assert!(err.to_string().contains("a.rs"));
    assert_eq!(read(temp.path().join("a.rs")), "fn main( ) {}");
    assert_eq!(read(temp.path().join("b.txt")), "after");
}

#[test]
fn test_json_is_reformatted_by_default() {
    let temp = TempDir::new().unwrap();
    let root = MemoryRoot::new().with(
        "package.json.tmpl",
        r#"{"name": "{{ name }}", "private": true}"#,
    );

    let config = json!({"name": "demo"});
    execute_templates(&root, temp.path(), &config, &Formatters::default()).unwrap();
    assert_eq!(
        read(temp.path().join("package.json")),
        "{\n  \"name\": \"demo\",\n  \"private\": true\n}\n"
    );
}

#[test]
fn test_existing_files_are_overwritten() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("src")).unwrap();
    fs::write(temp.path().join("src/lib.txt"), "old contents").unwrap();

    let root = MemoryRoot::new().with("src/lib.txt.tmpl", "new");
    execute_templates(&root, temp.path(), &json!({}), &Formatters::none()).unwrap();
    assert_eq!(read(temp.path().join("src/lib.txt")), "new");
}

#[test]
fn test_discovery_order_is_stable() {
    let root = MemoryRoot::new()
        .with("src/main.rs.tmpl", "")
        .with("Cargo.toml.tmpl", "")
        .with("!gitignore.tmpl", "")
        .with("notes.txt", "not a template")
        .with("src/bin/tool.rs.tmpl", "");

    let first = TemplateSet::discover(&root).unwrap();
    let second = TemplateSet::discover(&root).unwrap();
    assert_eq!(first.renderable(), second.renderable());
    assert_eq!(
        first.renderable(),
        &[".gitignore", "Cargo.toml", "src/bin/tool.rs", "src/main.rs"]
    );
}

#[test]
fn test_name_collision_last_discovered_wins() {
    let temp = TempDir::new().unwrap();
    // "!x.tmpl" sorts before ".x.tmpl"; both produce ".x"
    let root = MemoryRoot::new()
        .with("!x.tmpl", "first")
        .with(".x.tmpl", "second");

    let set = TemplateSet::discover(&root).unwrap();
    assert_eq!(set.renderable(), &[".x"]);
    set.execute(temp.path(), &json!({}), &Formatters::none()).unwrap();
    assert_eq!(read(temp.path().join(".x")), "second");
}

#[test]
fn test_configuration_is_passed_through_opaquely() {
    #[derive(serde::Serialize)]
    struct Custom {
        items: Vec<&'static str>,
    }

    let temp = TempDir::new().unwrap();
    let root = MemoryRoot::new().with(
        "list.txt.tmpl",
        "{% for item in items %}- {{ item }}\n{% endfor %}",
    );
    let config = Custom {
        items: vec!["a", "b"],
    };
    execute_templates(&root, temp.path(), &config, &Formatters::none()).unwrap();
    assert_eq!(read(temp.path().join("list.txt")), "- a\n- b\n");
}

#[test]
fn test_directory_root_matches_expected_tree() {
    let temp = TempDir::new().unwrap();
    let templates = temp.path().join("templates");
    let expected = temp.path().join("expected");
    let out = temp.path().join("out");

    fs::create_dir_all(templates.join("src")).unwrap();
    fs::create_dir_all(templates.join("!cargo")).unwrap();
    fs::write(templates.join("src/main.rs.tmpl"), "// {{ name }}\n").unwrap();
    fs::write(templates.join("!cargo/config.toml.tmpl"), "[build]\n").unwrap();
    fs::write(templates.join("$header.tmpl"), "{{ name | pascal_case }}").unwrap();
    fs::write(templates.join("NOTICE.tmpl"), "{% include \"$header\" %}!\n").unwrap();
    fs::write(templates.join("ignored.txt"), "not a template").unwrap();

    fs::create_dir_all(expected.join("src")).unwrap();
    fs::create_dir_all(expected.join(".cargo")).unwrap();
    fs::write(expected.join("src/main.rs"), "// my app\n").unwrap();
    fs::write(expected.join(".cargo/config.toml"), "[build]\n").unwrap();
    fs::write(expected.join("NOTICE"), "MyApp!\n").unwrap();

    execute_templates(
        &DirectoryRoot::new(&templates),
        &out,
        &json!({"name": "my app"}),
        &Formatters::none(),
    )
    .unwrap();

    assert!(!dir_diff::is_different(&out, &expected).unwrap());
}
