/// TAP (Test Anything Protocol) v14 report, printed to stdout by `finish`.
pub struct Tap {
    tests: Vec<TapTest>,
}

struct TapTest {
    ok: bool,
    desc: String,
    diagnostics: Option<String>,
}

impl Tap {
    pub fn new() -> Self {
        Tap { tests: Vec::new() }
    }

    pub fn ok(&mut self, desc: impl Into<String>) {
        self.tests.push(TapTest {
            ok: true,
            desc: desc.into(),
            diagnostics: None,
        });
    }

    pub fn not_ok(&mut self, desc: impl Into<String>, diagnostics: impl Into<String>) {
        self.tests.push(TapTest {
            ok: false,
            desc: desc.into(),
            diagnostics: Some(diagnostics.into()),
        });
    }

    pub fn failure_count(&self) -> usize {
        self.tests.iter().filter(|t| !t.ok).count()
    }

    fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("TAP version 14\n");
        out.push_str(&format!("1..{}\n", self.tests.len()));
        for (i, t) in self.tests.iter().enumerate() {
            let status = if t.ok { "ok" } else { "not ok" };
            out.push_str(&format!("{} {} - {}\n", status, i + 1, t.desc));
            if let Some(diag) = &t.diagnostics {
                for line in diag.lines() {
                    out.push_str(&format!("  # {}\n", line));
                }
            }
        }
        let fail = self.failure_count();
        out.push_str(&format!("# tests {}\n", self.tests.len()));
        out.push_str(&format!("# pass  {}\n", self.tests.len() - fail));
        out.push_str(&format!("# fail  {}\n", fail));
        out
    }

    pub fn finish(self) {
        print!("{}", self.render());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failures_carry_indented_diagnostics() {
        let mut tap = Tap::new();
        tap.ok("recovery/clean");
        tap.not_ok("recovery/broken", "--- expected\n1: missing_token: missing ')'");
        assert_eq!(tap.failure_count(), 1);
        assert_eq!(
            tap.render(),
            "TAP version 14\n\
             1..2\n\
             ok 1 - recovery/clean\n\
             not ok 2 - recovery/broken\n  \
             # --- expected\n  \
             # 1: missing_token: missing ')'\n\
             # tests 2\n\
             # pass  1\n\
             # fail  1\n"
        );
    }
}
