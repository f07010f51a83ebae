use std::process::Command;

fn main() {
    // Embed short git commit hash at compile time; reported by GET /health.
    let sha = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    println!("cargo:rustc-env=HERALD_GIT_SHA={sha}");
    println!("cargo:rerun-if-changed=../../.git/HEAD");
}
