use std::path::{Path, PathBuf};

use skein_syntax::{parse_with_config, RecoveryConfig};

use crate::commands::render_diagnostic;
use crate::tap::Tap;

/// Conformance suite runner.
///
/// Convention:
///   recovery/  -- *.sk + *.expected, one `line: code: message` per diagnostic
///                 (an empty .expected file means the source must parse clean)
pub struct RunResult {
    pub failed: usize,
}

pub fn run_suite(suite_dir: &Path, config: RecoveryConfig) -> RunResult {
    let mut tap = Tap::new();

    run_recovery_tests(suite_dir, config, &mut tap);

    let failed = tap.failure_count();
    tap.finish();

    RunResult { failed }
}

fn run_recovery_tests(suite_dir: &Path, config: RecoveryConfig, tap: &mut Tap) {
    let dir = suite_dir.join("recovery");
    if !dir.exists() {
        return;
    }
    let mut entries = glob_source_files(&dir);
    entries.sort();
    for source_path in &entries {
        let stem = stem(source_path);
        let desc = format!("recovery/{}", stem);
        let expected_path = dir.join(format!("{}.expected", stem));
        let expected = match std::fs::read_to_string(&expected_path) {
            Ok(s) => s,
            Err(_) => {
                tap.not_ok(
                    desc,
                    format!("missing expected file: {}", expected_path.display()),
                );
                continue;
            }
        };
        match run_recovery_test(source_path, config) {
            Ok(actual) if actual == expected => tap.ok(desc),
            Ok(actual) => tap.not_ok(
                desc,
                format!("--- expected\n{}--- actual\n{}", expected, actual),
            ),
            Err(msg) => tap.not_ok(desc, msg),
        }
    }
}

fn run_recovery_test(path: &Path, config: RecoveryConfig) -> Result<String, String> {
    let src = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
    let out = parse_with_config(&src, config).map_err(|e| format!("parse aborted: {}", e))?;
    Ok(out
        .diagnostics
        .iter()
        .map(|d| format!("{}\n", render_diagnostic(d)))
        .collect())
}

fn glob_source_files(dir: &Path) -> Vec<PathBuf> {
    let mut results = Vec::new();
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("sk") {
                results.push(path);
            }
        }
    }
    results
}

fn stem(path: &Path) -> String {
    path.file_stem()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}
