use std::process::Command;

#[test]
fn cli_compiles_without_warnings() {
    let status = Command::new(env!("CARGO"))
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .args(["check", "--quiet", "--bin", "specter-defence"])
        .status()
        .expect("failed to invoke cargo check for the specter-defence binary");

    assert!(
        status.success(),
        "cargo check --bin specter-defence should succeed"
    );
}

#[test]
fn idle_run_prints_a_summary() {
    let output = Command::new(env!("CARGO_BIN_EXE_specter-defence"))
        .args(["--seed", "7", "--ticks", "400", "--idle"])
        .output()
        .expect("failed to run the specter-defence binary");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"seed\": 7"), "unexpected summary: {stdout}");
    assert!(stdout.contains("\"guardians\": 0"), "unexpected summary: {stdout}");
}
