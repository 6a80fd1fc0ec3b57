use std::{
    error::Error,
    io,
    path::Path,
    process::{Command, Output},
};

const AAAC_PATH: &str = "./target/debug/aaac";
const DEFAULT_BUILTINS: &str = "./tests/fixtures/builtins.aaa";

fn run_aaac(src_path: &Path, builtins_path: &Path) -> Result<Output, io::Error> {
    Command::new(AAAC_PATH)
        .arg(src_path)
        .arg("--builtins")
        .arg(builtins_path)
        .output()
}

/// Runs the compiler on `src_path` against the shared builtins fixture and
/// asserts it reports no diagnostics and exits successfully.
pub fn check_compiles(src_path: &Path) -> Result<(), Box<dyn Error>> {
    check_compiles_with_builtins(src_path, Path::new(DEFAULT_BUILTINS))
}

pub fn check_compiles_with_builtins(src_path: &Path, builtins_path: &Path) -> Result<(), Box<dyn Error>> {
    let output = run_aaac(src_path, builtins_path)?;
    let stderr = std::str::from_utf8(&output.stderr)?;
    assert!(stderr.is_empty(), "unexpected diagnostics:\n{stderr}");
    assert!(
        output.status.success(),
        "aaac exited with status {:?}",
        output.status.code()
    );
    Ok(())
}

/// Runs the compiler on `src_path` and asserts it fails with at least one
/// diagnostic containing `expected_message_fragment`.
pub fn check_fails_with(src_path: &Path, expected_message_fragment: &str) -> Result<(), Box<dyn Error>> {
    check_fails_with_builtins(src_path, Path::new(DEFAULT_BUILTINS), expected_message_fragment)
}

pub fn check_fails_with_builtins(
    src_path: &Path,
    builtins_path: &Path,
    expected_message_fragment: &str,
) -> Result<(), Box<dyn Error>> {
    let output = run_aaac(src_path, builtins_path)?;
    let stderr = std::str::from_utf8(&output.stderr)?;
    assert!(
        !output.status.success(),
        "expected aaac to fail, but it exited successfully"
    );
    assert!(
        stderr.contains(expected_message_fragment),
        "expected diagnostics to mention {expected_message_fragment:?}, got:\n{stderr}"
    );
    Ok(())
}
