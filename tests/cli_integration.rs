#![cfg(feature = "cli")]

use std::io::Write;
use std::process::{Command, Stdio};
use tempfile::tempdir;

fn bin() -> String {
    env!("CARGO_BIN_EXE_hufflock").to_string()
}

#[test]
fn cli_create_list_extract_roundtrip() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("src");
    std::fs::create_dir_all(src.join("nested")).unwrap();
    std::fs::write(src.join("top.txt"), b"top level").unwrap();
    std::fs::write(src.join("nested/inner.bin"), [9u8; 300]).unwrap();
    let archive = dir.path().join("out.gha");
    let dest = dir.path().join("dest");

    let st = Command::new(bin())
        .args(["-q", "create", "--password", "pw"])
        .arg(&src)
        .arg(&archive)
        .status()
        .unwrap();
    assert!(st.success());

    let out = Command::new(bin())
        .args(["list", "--password", "pw", "--input"])
        .arg(&archive)
        .output()
        .unwrap();
    assert!(out.status.success());
    let listing = String::from_utf8(out.stdout).unwrap();
    assert_eq!(
        listing.lines().collect::<Vec<_>>(),
        vec!["nested/inner.bin", "top.txt"]
    );

    let st = Command::new(bin())
        .args(["-q", "extract", "-p", "pw"])
        .arg(&archive)
        .arg(&dest)
        .status()
        .unwrap();
    assert!(st.success());
    assert_eq!(std::fs::read(dest.join("top.txt")).unwrap(), b"top level");
    assert_eq!(
        std::fs::read(dest.join("nested/inner.bin")).unwrap(),
        vec![9u8; 300]
    );
}

#[test]
fn cli_wrong_password_exits_nonzero() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("in.txt");
    std::fs::write(&input, b"payload").unwrap();
    let archive = dir.path().join("in.gha");
    let dest = dir.path().join("dest");

    let st = Command::new(bin())
        .args(["-q", "create", "-p", "right"])
        .arg(&input)
        .arg(&archive)
        .status()
        .unwrap();
    assert!(st.success());

    let out = Command::new(bin())
        .args(["extract", "-p", "wrong"])
        .arg(&archive)
        .arg(&dest)
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("extract"), "{stderr}");
    assert!(!dest.exists());
}

#[test]
fn cli_refuses_to_overwrite_without_force() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("in.txt");
    std::fs::write(&input, b"payload").unwrap();
    let archive = dir.path().join("existing.gha");
    std::fs::write(&archive, b"keep me").unwrap();

    let st = Command::new(bin())
        .args(["-q", "create", "-p", "pw"])
        .arg(&input)
        .arg(&archive)
        .status()
        .unwrap();
    assert!(!st.success());
    assert_eq!(std::fs::read(&archive).unwrap(), b"keep me");

    let st = Command::new(bin())
        .args(["-q", "-f", "create", "-p", "pw"])
        .arg(&input)
        .arg(&archive)
        .status()
        .unwrap();
    assert!(st.success());
    assert_ne!(std::fs::read(&archive).unwrap(), b"keep me");
}

#[test]
fn cli_prompts_for_password_on_stdin() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("in.txt");
    std::fs::write(&input, b"prompted").unwrap();
    let archive = dir.path().join("in.gha");

    let mut child = Command::new(bin())
        .args(["-q", "create"])
        .arg(&input)
        .arg(&archive)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"from stdin\n")
        .unwrap();
    assert!(child.wait().unwrap().success());

    let out = Command::new(bin())
        .args(["list", "-p", "from stdin"])
        .arg(&archive)
        .output()
        .unwrap();
    assert!(out.status.success());
    assert_eq!(String::from_utf8(out.stdout).unwrap().trim(), "in.txt");
}

#[test]
fn cli_info_and_json_stats() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("in.txt");
    std::fs::write(&input, b"abcabcabc").unwrap();
    let archive = dir.path().join("in.gha");

    let out = Command::new(bin())
        .args(["--json", "create", "-p", "pw"])
        .arg(&input)
        .arg(&archive)
        .output()
        .unwrap();
    assert!(out.status.success());
    let stats: serde_json::Value = serde_json::from_slice(&out.stderr).unwrap();
    assert_eq!(stats["command"], "create");
    assert_eq!(stats["entries"], 1);
    assert_eq!(stats["input_size"], 9);

    let out = Command::new(bin())
        .args(["--json", "info"])
        .arg(&archive)
        .output()
        .unwrap();
    assert!(out.status.success());
    let info: serde_json::Value = serde_json::from_slice(&out.stderr).unwrap();
    assert_eq!(info["version"], 1);
    assert_eq!(info["payload_size"], 2 + 6 + 8 + 9);
}

#[test]
fn cli_rejects_non_archive() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("plain.txt");
    std::fs::write(&path, b"just some text").unwrap();

    let out = Command::new(bin()).arg("info").arg(&path).output().unwrap();
    assert_eq!(out.status.code(), Some(1));
}
