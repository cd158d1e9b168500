use std::path::PathBuf;
use std::process;

use skein_syntax::{parse_with_config, RecoveryConfig};

use super::render_diagnostic;
use crate::{report_error, OutputFormat};

/// Parse each file and report every repair the recovery engine made.
///
/// Exit status: 0 when all files parse clean, 1 when any diagnostic was
/// reported, 2 when a file could not be read or its parse aborted.
pub(crate) fn cmd_check(
    files: &[PathBuf],
    config: RecoveryConfig,
    output: OutputFormat,
    quiet: bool,
) {
    let mut reports = Vec::new();
    let mut diagnostic_count = 0usize;
    let mut fatal = false;

    for file in files {
        let name = file.display().to_string();
        let src = match std::fs::read_to_string(file) {
            Ok(s) => s,
            Err(e) => {
                report_error(&format!("cannot read {}: {}", name, e), output, quiet);
                fatal = true;
                continue;
            }
        };
        match parse_with_config(&src, config) {
            Ok(out) => {
                log::debug!("{}: {} diagnostic(s)", name, out.diagnostics.len());
                diagnostic_count += out.diagnostics.len();
                for d in &out.diagnostics {
                    match output {
                        OutputFormat::Text => {
                            if !quiet {
                                println!("{}:{}", name, render_diagnostic(d));
                            }
                        }
                        OutputFormat::Json => reports.push(d.to_json_value(&name)),
                    }
                }
            }
            Err(e) => {
                report_error(&format!("{}: {}", name, e), output, quiet);
                fatal = true;
            }
        }
    }

    if output == OutputFormat::Json {
        let json = serde_json::to_string_pretty(&reports)
            .unwrap_or_else(|e| format!("{{\"error\": \"serialization: {}\"}}", e));
        println!("{}", json);
    } else if !quiet && diagnostic_count == 0 && !fatal {
        println!("{} file(s) parsed without errors", files.len());
    }

    if fatal {
        process::exit(2);
    }
    if diagnostic_count > 0 {
        process::exit(1);
    }
}
