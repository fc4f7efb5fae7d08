use crate::invoke::Invocation;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum Line {
    Text(String),
    Field { label: String, value: String },
    Warning(String),
    /// The collaborator failed or returned nothing.
    Unavailable(String),
    /// The tool exists but cannot work on this board.
    Incompatible(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct Section {
    pub id: &'static str,
    pub title: &'static str,
    pub lines: Vec<Line>,
}

impl Section {
    pub fn new(id: &'static str, title: &'static str) -> Self {
        Self {
            id,
            title,
            lines: Vec::new(),
        }
    }

    pub fn field(&mut self, label: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.lines.push(Line::Field {
            label: label.into(),
            value: value.into(),
        });
        self
    }

    pub fn text(&mut self, text: impl Into<String>) -> &mut Self {
        self.lines.push(Line::Text(text.into()));
        self
    }

    pub fn block(&mut self, block: &str) -> &mut Self {
        for line in block.lines() {
            self.lines.push(Line::Text(line.trim_end().to_string()));
        }
        self
    }

    pub fn warning(&mut self, text: impl Into<String>) -> &mut Self {
        self.lines.push(Line::Warning(text.into()));
        self
    }

    pub fn unavailable(&mut self, what: impl Into<String>) -> &mut Self {
        self.lines.push(Line::Unavailable(what.into()));
        self
    }

    pub fn incompatible(&mut self, reason: impl Into<String>) -> &mut Self {
        self.lines.push(Line::Incompatible(reason.into()));
        self
    }

    /// Append the collaborator's output, or an "not available" line naming
    /// `what` when it failed or printed nothing.
    pub fn output(&mut self, what: &str, invocation: &Invocation) -> &mut Self {
        match invocation.output() {
            Some(out) => self.block(out),
            None => self.unavailable(unavailable_detail(what, invocation)),
        }
    }

    /// Like [`Section::output`], but a successful empty result prints `empty`.
    pub fn output_or(&mut self, what: &str, invocation: &Invocation, empty: &str) -> &mut Self {
        if invocation.success() && invocation.stdout.trim().is_empty() {
            self.text(empty)
        } else {
            self.output(what, invocation)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

fn unavailable_detail(what: &str, invocation: &Invocation) -> String {
    match (invocation.success(), invocation.first_line()) {
        (true, _) => format!("{}: no output", what),
        (false, Some(detail)) => format!("{}: {}", what, detail),
        (false, None) => format!("{}: exit status {:?}", what, invocation.status),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Skipped {
    pub id: &'static str,
    pub title: &'static str,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Summary {
    pub hostname: Option<String>,
    pub model: Option<String>,
    pub required: (usize, usize),
    pub supplemental: (usize, usize),
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub version: &'static str,
    pub generated: String,
    pub summary: Summary,
    pub sections: Vec<Section>,
    pub skipped: Vec<Skipped>,
}

impl Report {
    pub fn new(summary: Summary) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            generated: chrono::Local::now().to_rfc3339(),
            summary,
            sections: Vec::new(),
            skipped: Vec::new(),
        }
    }

    pub fn section(&self, id: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == id)
    }
}
