#![cfg(feature = "cli")]

#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use srecordlib::{AddressWidth, SRecord};
use std::path::PathBuf;
use std::process::Command;

const SRECLI_EXE: &str = env!("CARGO_BIN_EXE_srecli");

#[test]
fn test_srecli_shows_help() {
    for arg in ["--help", "help", "-h"] {
        // Act
        let output = Command::new(SRECLI_EXE)
            .arg(arg)
            .output()
            .expect("Failed to run srecli");

        // Assert
        assert!(
            output.status.success(),
            "command failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );

        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(
            stdout.contains("Usage"),
            "stdout did not look like help text:\n{stdout}"
        );
    }
}

#[test]
fn test_srecli_no_args_fails() {
    // Act
    let output = Command::new(SRECLI_EXE)
        .output()
        .expect("Failed to run srecli");

    // Assert
    assert!(!output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("Usage"),
        "stdout did not look like help text:\n{stdout}"
    );
}

#[test]
fn test_srecli_shows_info_valid() {
    // Arrange
    let path_str = "tests/fixtures/firmware.s28";

    // Act
    let output = Command::new(SRECLI_EXE)
        .args(["info", path_str, "--strict"])
        .output()
        .expect("Failed to run srecli");

    // Assert
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let abs_path = std::fs::canonicalize(PathBuf::from(path_str))
        .unwrap_or_else(|_| panic!("Error during retrieval of absolute file path: {path_str}"));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains(abs_path.to_string_lossy().as_ref())
            && stdout.contains("firmware s28")
            && stdout.contains("S2")
            && stdout.contains("250 bytes")
            && stdout.contains("0x0001_0000 - 0x0001_0432"),
        "stdout did not look like info text:\n{stdout}"
    );
}

#[test]
fn test_srecli_shows_info_invalid() {
    // Arrange
    let path_str = "tests/cli_tests.rs";

    // Act
    let output = Command::new(SRECLI_EXE)
        .args(["info", path_str])
        .output()
        .expect("Failed to run srecli");

    // Assert
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Not an S-record file") && stderr.contains(path_str),
        "stderr did not contain expected error text:\n{stderr}"
    );

    // Act - file does not exist
    let output = Command::new(SRECLI_EXE)
        .args(["info", "tests/fixtures/missing.s19"])
        .output()
        .expect("Failed to run srecli");

    // Assert
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("File not found"),
        "stderr did not contain expected error text:\n{stderr}"
    );
}

#[test]
fn test_srecli_info_strict_rejects_missing_header() {
    // Arrange
    let path_str = "tests/fixtures/no_header.s19";

    // Act
    let lenient = Command::new(SRECLI_EXE)
        .args(["info", path_str])
        .output()
        .expect("Failed to run srecli");
    let strict = Command::new(SRECLI_EXE)
        .args(["info", path_str, "--strict"])
        .output()
        .expect("Failed to run srecli");

    // Assert
    assert!(
        lenient.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&lenient.stderr)
    );
    assert!(!strict.status.success());

    let stderr = String::from_utf8_lossy(&strict.stderr);
    assert!(
        stderr.contains("line #1") && stderr.contains("Missing record header"),
        "stderr did not contain expected error text:\n{stderr}"
    );
}

#[test]
fn test_srecli_info_bad_checksum() {
    // Act
    let output = Command::new(SRECLI_EXE)
        .args(["info", "tests/fixtures/bad_checksum.s19"])
        .output()
        .expect("Failed to run srecli");

    // Assert
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("line #3") && stderr.contains("expected: 0xE9, found: 0x00"),
        "stderr did not contain expected error text:\n{stderr}"
    );
}

#[test]
fn test_srecli_dump() {
    // Act
    let output = Command::new(SRECLI_EXE)
        .args(["dump", "tests/fixtures/example.s19"])
        .output()
        .expect("Failed to run srecli");

    // Assert
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    let expected = SRecord::from_file("tests/fixtures/example.s19")
        .expect("Failed to load fixture")
        .dump();
    assert_eq!(stdout, expected);
}

#[test]
fn test_srecli_convert_srec_to_bin() {
    // Arrange
    let in_path_str = "tests/fixtures/firmware.s28";
    let out_path_str = "build/t1-cli/firmware.bin";

    // Act
    let output = Command::new(SRECLI_EXE)
        .args(["convert", in_path_str, out_path_str, "--gap-fill", "0x00"])
        .output()
        .expect("Failed to run srecli");

    // Assert
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("Converted"),
        "stdout did not look like conversion text:\n{stdout}"
    );

    let bin = std::fs::read(out_path_str).expect("Failed to read output");
    assert_eq!(bin.len(), 0x432);
    assert!(bin[0xC8..0x400].iter().all(|b| *b == 0x00));
}

#[test]
fn test_srecli_convert_bin_to_srec() {
    // Arrange
    let in_path_str = "tests/fixtures/example.bin";
    let out_path_str = "build/t2-cli/example.s37";

    // Act
    let output = Command::new(SRECLI_EXE)
        .args([
            "convert",
            in_path_str,
            out_path_str,
            "--address",
            "0x08000000",
            "--line-length",
            "46",
        ])
        .output()
        .expect("Failed to run srecli");

    // Assert
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let text = std::fs::read_to_string(out_path_str).expect("Failed to read output");
    let data_lines: Vec<&str> = text.lines().filter(|l| l.starts_with("S3")).collect();
    assert_eq!(data_lines.len(), 5);
    assert!(data_lines[..4].iter().all(|l| l.len() == 46));

    let srec = SRecord::from_file(out_path_str).expect("Failed to load output");
    assert_eq!(srec.address_width(), AddressWidth::Width32);
    assert_eq!(srec.start(), 0x0800_0000);
    assert_eq!(srec.end(), 0x0800_0046);
}

#[test]
fn test_srecli_convert_srec_to_srec() {
    // Arrange
    let in_path_str = "tests/fixtures/example.s19";
    let out_path_str = "build/t3-cli/example.s19";

    // Act
    let output = Command::new(SRECLI_EXE)
        .args(["convert", in_path_str, out_path_str, "--line-length", "66"])
        .output()
        .expect("Failed to run srecli");

    // Assert
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let input = std::fs::read(in_path_str).expect("Failed to read input");
    let result = std::fs::read(out_path_str).expect("Failed to read output");
    assert_eq!(input, result);
}

#[test]
fn test_srecli_convert_invalid() {
    // Arrange
    let srec_path_str = "tests/fixtures/example.s19";
    let bin_path_str = "tests/fixtures/example.bin";

    // Act - missing input path
    let output = Command::new(SRECLI_EXE)
        .args(["convert"])
        .output()
        .expect("Failed to run srecli");

    // Assert
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Missing input path"),
        "stderr did not contain expected error text:\n{stderr}"
    );

    // Act - missing output path
    let output = Command::new(SRECLI_EXE)
        .args(["convert", srec_path_str])
        .output()
        .expect("Failed to run srecli");

    // Assert
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Missing output path"),
        "stderr did not contain expected error text:\n{stderr}"
    );

    // Act - unsupported output type
    let output = Command::new(SRECLI_EXE)
        .args(["convert", srec_path_str, "build/t4-cli/example.txt"])
        .output()
        .expect("Failed to run srecli");

    // Assert
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("unsupported type"),
        "stderr did not contain expected error text:\n{stderr}"
    );

    // Act - address given for S-record input
    let output = Command::new(SRECLI_EXE)
        .args([
            "convert",
            srec_path_str,
            "build/t4-cli/example.bin",
            "--address",
            "0x100",
        ])
        .output()
        .expect("Failed to run srecli");

    // Assert
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("only supported for BIN to S-record"),
        "stderr did not contain expected error text:\n{stderr}"
    );

    // Act - address missing for BIN input
    let output = Command::new(SRECLI_EXE)
        .args(["convert", bin_path_str, "build/t4-cli/example.s19"])
        .output()
        .expect("Failed to run srecli");

    // Assert
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("required for BIN to S-record"),
        "stderr did not contain expected error text:\n{stderr}"
    );

    // Act - gap fill for S-record output
    let output = Command::new(SRECLI_EXE)
        .args([
            "convert",
            srec_path_str,
            "build/t4-cli/example.s28",
            "--gap-fill",
            "0x00",
        ])
        .output()
        .expect("Failed to run srecli");

    // Assert
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("only supported for conversion to BIN"),
        "stderr did not contain expected error text:\n{stderr}"
    );

    // Act - line length for BIN output
    let output = Command::new(SRECLI_EXE)
        .args([
            "convert",
            srec_path_str,
            "build/t4-cli/example.bin",
            "--line-length",
            "40",
        ])
        .output()
        .expect("Failed to run srecli");

    // Assert
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("only supported for S-record output"),
        "stderr did not contain expected error text:\n{stderr}"
    );

    // Act - invalid address value
    let output = Command::new(SRECLI_EXE)
        .args([
            "convert",
            bin_path_str,
            "build/t4-cli/example.s19",
            "--address",
            "0xZZ",
        ])
        .output()
        .expect("Failed to run srecli");

    // Assert
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Invalid address: 0xZZ"),
        "stderr did not contain expected error text:\n{stderr}"
    );
}
