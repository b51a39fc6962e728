use std::process::Command;

/// Short commit hash from git, else from `GIT_SHA`
fn commit_sha() -> Option<String> {
    let from_git = Command::new("git")
        .args(["rev-parse", "--short=8", "HEAD"])
        .output()
        .ok()
        .filter(|out| out.status.success())
        .map(|out| String::from_utf8_lossy(&out.stdout).trim().to_string());

    from_git
        .or_else(|| std::env::var("GIT_SHA").ok())
        .filter(|s| !s.is_empty())
}

fn main() {
    let base = env!("CARGO_PKG_VERSION");

    // Release channel: anything but "stable" gets a pre-release suffix
    let channel = std::env::var("ECOGUARD_CHANNEL")
        .map(|c| c.trim().to_lowercase())
        .unwrap_or_else(|_| "stable".to_string());

    let version = match (channel.as_str(), commit_sha()) {
        ("stable" | "", _) => base.to_string(),
        (channel, Some(sha)) => format!("{}-{}+{}", base, channel, sha),
        (channel, None) => format!("{}-{}", base, channel),
    };

    println!("cargo:rustc-env=APP_VERSION={}", version);

    println!("cargo:rerun-if-env-changed=ECOGUARD_CHANNEL");
    println!("cargo:rerun-if-env-changed=GIT_SHA");
    println!("cargo:rerun-if-changed=.git/HEAD");
}
