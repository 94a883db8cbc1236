use std::io::Write;
use std::process::Command;

fn location_file_fixture() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "files": [
                {{
                    "ngas_file_id": "a.tar",
                    "subdirectory": null,
                    "relative_path": "a.xml",
                    "checksum": "x",
                    "checksum_type": "crc32",
                    "version": 1,
                    "size": 0,
                    "server": {{"server": "h1:7777", "location": "DSOC", "cluster": "DSOC"}}
                }}
            ]
        }}"#
    )
    .unwrap();
    file
}

#[test]
fn dry_run_against_location_file_lists_destination_and_exits_success() {
    let fixture = location_file_fixture();
    let out_dir = tempfile::tempdir().unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_yoink"))
        .arg("--location-file")
        .arg(fixture.path())
        .arg("--output-dir")
        .arg(out_dir.path())
        .arg("--dry-run")
        .arg("--profile")
        .arg("nmtest")
        .env("YOINK_LOCATOR_SERVICE_URL", "http://locator.example/")
        .env("YOINK_EXECUTION_SITE", "DSOC")
        .env("YOINK_THREADS_PER_HOST", "2")
        .output()
        .unwrap();

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("a.xml"));
    assert!(!out_dir.path().join("a.xml").exists());
}

#[test]
fn missing_profile_exits_with_no_profile_code() {
    let fixture = location_file_fixture();
    let out_dir = tempfile::tempdir().unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_yoink"))
        .arg("--location-file")
        .arg(fixture.path())
        .arg("--output-dir")
        .arg(out_dir.path())
        .arg("--dry-run")
        .env_remove("CAPO_PROFILE")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
}
