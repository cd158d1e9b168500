use std::path::Path;
use std::process;

use skein_syntax::RecoveryConfig;

pub(crate) fn cmd_test(suite_dir: &Path, config: RecoveryConfig, quiet: bool) {
    if !suite_dir.exists() {
        if !quiet {
            eprintln!(
                "error: conformance suite directory not found: {}",
                suite_dir.display()
            );
        }
        process::exit(2);
    }

    let result = crate::runner::run_suite(suite_dir, config);
    if result.failed > 0 {
        process::exit(1);
    }
}
