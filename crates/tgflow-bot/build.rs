use std::process::Command;

fn main() {
    let sha = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown".to_string());

    // Shown by `tgflow-bot --version` and in the startup log.
    println!("cargo:rustc-env=TGFLOW_GIT_SHA={sha}");
    println!("cargo:rerun-if-changed=../../.git/HEAD");
}
