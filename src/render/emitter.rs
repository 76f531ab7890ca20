//! Indentation-aware text buffer shared by the renderers.

/// Appends a formatted line to an [`Emitter`].
macro_rules! emitln {
    ($emitter:ident, $($arg:tt)*) => {
        $emitter.line(format!($($arg)*))
    };
}

pub(crate) use emitln;

const INDENT: &str = "\t";

/// Single-owner output buffer. Renderers write whole lines; the external formatter fixes up
/// spacing afterwards, so only nesting is tracked here.
#[derive(Debug, Default)]
pub struct Emitter {
    depth: usize,
    text: String,
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(&mut self, content: impl AsRef<str>) {
        let content = content.as_ref();
        if content.is_empty() {
            self.text.push('\n');
            return;
        }
        for _ in 0..self.depth {
            self.text.push_str(INDENT);
        }
        self.text.push_str(content);
        self.text.push('\n');
    }

    pub fn empty_line(&mut self) {
        self.text.push('\n');
    }

    /// Runs `body` one level deeper.
    pub fn indent<F>(&mut self, body: F)
    where
        F: FnOnce(&mut Emitter),
    {
        self.depth += 1;
        body(self);
        self.depth -= 1;
    }

    /// Writes `open`, then `body` indented, then `close`.
    pub fn block<F>(&mut self, open: impl AsRef<str>, close: impl AsRef<str>, body: F)
    where
        F: FnOnce(&mut Emitter),
    {
        self.line(open);
        self.indent(body);
        self.line(close);
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn finish(self) -> String {
        self.text
    }
}
