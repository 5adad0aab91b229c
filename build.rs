use std::path::Path;
use std::process::Command;

const INPUT: &str = "static/css/input.css";
const OUTPUT: &str = "static/css/dist/output.css";

fn main() {
    println!("cargo:rerun-if-changed={INPUT}");
    println!("cargo:rerun-if-changed=templates/");
    println!("cargo:rerun-if-env-changed=CLUSTER_CONSOLE_SKIP_CSS");

    // Offline and CI builds can ship a prebuilt stylesheet.
    if std::env::var_os("CLUSTER_CONSOLE_SKIP_CSS").is_some() {
        if !Path::new(OUTPUT).exists() {
            println!("cargo:warning=skipping CSS build and {OUTPUT} is missing; pages will be unstyled");
        }
        return;
    }

    let status = Command::new("npx")
        .args(["@tailwindcss/cli", "-i", INPUT, "-o", OUTPUT, "--minify"])
        .status();

    match status {
        Ok(s) if s.success() => {}
        Ok(s) => println!("cargo:warning=stylesheet build exited with: {s}"),
        Err(e) => println!("cargo:warning=could not run the tailwind CLI: {e}"),
    }
}
