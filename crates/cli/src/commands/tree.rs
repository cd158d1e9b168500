use std::path::Path;
use std::process;

use skein_syntax::{parse_with_config, RecoveryConfig};

use crate::{report_error, OutputFormat};

pub(crate) fn cmd_tree(file: &Path, config: RecoveryConfig, output: OutputFormat, quiet: bool) {
    let src = match std::fs::read_to_string(file) {
        Ok(s) => s,
        Err(e) => {
            report_error(
                &format!("cannot read {}: {}", file.display(), e),
                output,
                quiet,
            );
            process::exit(2);
        }
    };

    let out = match parse_with_config(&src, config) {
        Ok(out) => out,
        Err(e) => {
            report_error(&format!("{}: {}", file.display(), e), output, quiet);
            process::exit(2);
        }
    };

    match output {
        OutputFormat::Text => print!("{}", out.tree.dump()),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&out.tree)
                .unwrap_or_else(|e| format!("{{\"error\": \"serialization: {}\"}}", e));
            println!("{}", json);
        }
    }
}
