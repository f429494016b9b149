//! Folder import from disk: scan, auto-fix hook, command detection, and the
//! resulting chat messages.

use anyhow::Result;
use camino::Utf8PathBuf;
use std::fs;
use tempfile::TempDir;

use ctxbuf::chat::ChatRole;
use ctxbuf::{
    DefaultCommandDetector, IgnoreMatcher, ImportError, NoopAutoFixer, create_chat_from_folder,
};
use ctxbuf_import::{AutoFixResult, AutoFixer, FileArtifact, FileFix, scan_folder};

fn write(root: &Utf8PathBuf, rel: &str, bytes: &[u8]) -> Result<()> {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, bytes)?;
    Ok(())
}

fn node_project() -> Result<(TempDir, Utf8PathBuf)> {
    let temp = TempDir::new()?;
    let root = Utf8PathBuf::try_from(temp.path().join("my-app"))?;
    write(
        &root,
        "package.json",
        br#"{"name":"my-app","scripts":{"dev":"vite","build":"vite build"}}"#,
    )?;
    write(&root, "src/main.js", b"console.log('hi');\n")?;
    write(&root, "public/logo.png", &[0x89, b'P', b'N', b'G', 0, 0, 0x0d])?;
    write(&root, "node_modules/vite/index.js", b"export default {};")?;
    write(&root, "debug.log", b"noise")?;
    Ok((temp, root))
}

#[test]
fn test_node_project_import_conversation() -> Result<()> {
    let (_temp, root) = node_project()?;
    let matcher = IgnoreMatcher::canonical()?;

    let scan = scan_folder(&root, |path| matcher.matches(path))?;
    assert_eq!(scan.folder_name, "my-app");
    assert_eq!(scan.binary_files, vec!["public/logo.png".to_string()]);
    assert_eq!(scan.files.len(), 2);

    let messages = create_chat_from_folder(
        &scan.files,
        &scan.binary_files,
        &scan.folder_name,
        &NoopAutoFixer,
        &DefaultCommandDetector,
    )?;

    assert_eq!(messages.len(), 4);
    assert_eq!(messages[0].role, ChatRole::User);
    assert_eq!(messages[0].text(), "Import the \"my-app\" folder");

    let import = messages[1].text();
    assert!(import.starts_with("I've imported the contents of the \"my-app\" folder."));
    assert!(import.contains("Skipped 1 binary files:\n- public/logo.png"));
    assert!(import.contains(r#"<boltAction type="file" filePath="package.json">"#));
    assert!(import.contains("<boltAction type=\"file\" filePath=\"src/main.js\">\nconsole.log('hi');\n\n</boltAction>"));
    assert!(!import.contains("node_modules"));
    assert!(!import.contains("debug.log"));

    assert_eq!(
        messages[2].text(),
        "Setup the codebase and start the application automatically"
    );
    let setup = messages[3].text();
    assert!(setup.starts_with("Found \"dev\" script in package.json."));
    assert!(setup.contains(r#"<boltAction type="shell">npm install</boltAction>"#));
    assert!(setup.contains(r#"<boltAction type="start">npm run dev</boltAction>"#));

    let ids: std::collections::HashSet<_> = messages.iter().filter_map(|m| m.id.clone()).collect();
    assert_eq!(ids.len(), messages.len());
    Ok(())
}

/// Blanks `src/main.js` and overrides the start command.
struct ViteFixer;

impl AutoFixer for ViteFixer {
    fn fix(&self, files: &[FileArtifact]) -> AutoFixResult {
        let fixes = files
            .iter()
            .filter(|f| f.path == "src/main.js")
            .map(|f| FileFix {
                path: f.path.clone(),
                description: "Removed debug logging".to_string(),
                content: String::new(),
            })
            .collect();
        AutoFixResult {
            fixes,
            start_command: Some("npm run dev -- --host".to_string()),
            ..AutoFixResult::default()
        }
    }
}

#[test]
fn test_auto_fixer_rewrites_files_and_reports() -> Result<()> {
    let (_temp, root) = node_project()?;
    let matcher = IgnoreMatcher::canonical()?;
    let scan = scan_folder(&root, |path| matcher.matches(path))?;

    let messages = create_chat_from_folder(
        &scan.files,
        &scan.binary_files,
        &scan.folder_name,
        &ViteFixer,
        &DefaultCommandDetector,
    )?;

    assert_eq!(messages.len(), 5);
    assert!(!messages[1].text().contains("console.log"));
    assert!(messages[2].text().contains("`src/main.js`: Removed debug logging"));
    assert!(
        messages[4]
            .text()
            .contains(r#"<boltAction type="start">npm run dev -- --host</boltAction>"#)
    );
    Ok(())
}

#[test]
fn test_binary_only_folder_is_rejected() -> Result<()> {
    let temp = TempDir::new()?;
    let root = Utf8PathBuf::try_from(temp.path().join("images"))?;
    write(&root, "a.png", &[0, 1, 2])?;

    let scan = scan_folder(&root, |_| false)?;
    let err = create_chat_from_folder(
        &scan.files,
        &scan.binary_files,
        &scan.folder_name,
        &NoopAutoFixer,
        &DefaultCommandDetector,
    )
    .unwrap_err();

    assert!(matches!(err, ImportError::EmptyFolder { folder } if folder == "images"));
    Ok(())
}

#[test]
fn test_static_site_gets_serve_command() -> Result<()> {
    let temp = TempDir::new()?;
    let root = Utf8PathBuf::try_from(temp.path().join("site"))?;
    write(&root, "index.html", b"<h1>hi</h1>")?;
    write(&root, "style.css", b"h1 { color: red; }")?;

    let scan = scan_folder(&root, |_| false)?;
    let messages = create_chat_from_folder(
        &scan.files,
        &scan.binary_files,
        &scan.folder_name,
        &NoopAutoFixer,
        &DefaultCommandDetector,
    )?;

    assert_eq!(messages.len(), 4);
    assert!(!messages[1].text().contains("Skipped"));
    assert!(
        messages[3]
            .text()
            .contains(r#"<boltAction type="start">npx --yes serve</boltAction>"#)
    );
    Ok(())
}
