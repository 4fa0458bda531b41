//! Indentation-aware line buffer used by the generators.

const INDENT: &str = "    ";

/// Ordered output lines of one generation unit
#[derive(Debug, Default)]
pub struct Lines {
    lines: Vec<String>,
    depth: usize,
}

impl Lines {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a line at the current indentation; empty lines carry no indentation
    pub fn push<S: AsRef<str>>(&mut self, line: S) {
        let line = line.as_ref();
        if line.is_empty() {
            self.lines.push(String::new());
        } else {
            self.lines.push(format!("{}{line}", INDENT.repeat(self.depth)));
        }
    }

    pub fn blank(&mut self) {
        self.lines.push(String::new());
    }

    /// Run `f` one indentation level deeper
    pub fn indented<F: FnOnce(&mut Self)>(&mut self, f: F) {
        self.depth += 1;
        f(self);
        self.depth -= 1;
    }

    /// `header` followed by an indented block
    pub fn block<S: AsRef<str>, F: FnOnce(&mut Self)>(&mut self, header: S, f: F) {
        self.push(header);
        self.indented(f);
    }

    /// Comma separated list, one entry per line, enclosed by `open` and `close`
    pub fn list<S: AsRef<str>>(&mut self, open: &str, entries: &[S], close: &str) {
        self.push(open);
        self.indented(|l| {
            for (i, entry) in entries.iter().enumerate() {
                let separator = if i + 1 < entries.len() { "," } else { "" };
                l.push(format!("{}{separator}", entry.as_ref()));
            }
        });
        self.push(close);
    }

    /// Append the lines of `body` one level deeper than the current indentation
    pub fn append_indented(&mut self, body: Lines) {
        self.indented(|l| {
            for line in body.lines {
                l.push(line);
            }
        });
    }

    pub fn into_vec(self) -> Vec<String> {
        self.lines
    }
}
