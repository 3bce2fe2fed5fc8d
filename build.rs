use std::process::Command;

fn main() {
    let git_hash = command_output("git", &["rev-parse", "--short", "HEAD"])
        .unwrap_or_else(|| "unknown".to_string());
    println!("cargo:rustc-env=FEUR_GIT_HASH={}", git_hash);

    // Reproducible builds pin the date through SOURCE_DATE_EPOCH
    let build_date = match std::env::var("SOURCE_DATE_EPOCH") {
        Ok(epoch) => command_output("date", &["-u", "-d", &format!("@{}", epoch), "+%Y-%m-%d"]),
        Err(_) => command_output("date", &["-u", "+%Y-%m-%d"]),
    }
    .unwrap_or_else(|| "unknown".to_string());
    println!("cargo:rustc-env=FEUR_BUILD_DATE={}", build_date);

    println!("cargo:rerun-if-env-changed=SOURCE_DATE_EPOCH");
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/");
}

/// Trimmed stdout of a successful command.
fn command_output(program: &str, args: &[&str]) -> Option<String> {
    Command::new(program)
        .args(args)
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
        .filter(|s| !s.is_empty())
}
