//! Markup trace of the grammar walk.
//!
//! Every consumed token is recorded inside the production element that
//! consumed it, giving a nested view of the parse that is independent of the
//! generated code.  Tests and the driver render it as XML-like text.

use crate::lexer::{Token, TokenKind};

#[derive(Debug, Default)]
pub struct Trace {
    lines: Vec<String>,
    depth: usize,
}

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, production: &str) {
        self.push_line(format!("<{}>", production));
        self.depth += 1;
    }

    pub fn close(&mut self, production: &str) {
        self.depth -= 1;
        self.push_line(format!("</{}>", production));
    }

    pub fn token(&mut self, token: &Token) {
        let (tag, value) = match &token.kind {
            TokenKind::Keyword(keyword) => ("keyword", keyword.as_str().to_owned()),
            TokenKind::Symbol(symbol) => ("symbol", escape(&symbol.to_string())),
            TokenKind::Identifier(name) => ("identifier", name.clone()),
            TokenKind::IntConst(value) => ("integerConstant", value.to_string()),
            TokenKind::StringConst(value) => ("stringConstant", escape(value)),
        };
        self.push_line(format!("<{}> {} </{}>", tag, value, tag));
    }

    fn push_line(&mut self, line: String) {
        self.lines.push(format!("{}{}", "  ".repeat(self.depth), line));
    }

    pub fn to_markup(&self) -> String {
        self.lines.join("\n")
    }
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '\'' => out.push_str("&apos;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Tokenizer;
    use pretty_assertions::assert_eq;

    #[test]
    fn nesting_and_escaping() {
        let mut tokenizer = Tokenizer::new("x < \"a&b\"");
        let mut trace = Trace::new();

        trace.open("expression");
        trace.open("term");
        trace.token(&tokenizer.next().unwrap().unwrap());
        trace.close("term");
        trace.token(&tokenizer.next().unwrap().unwrap());
        trace.open("term");
        trace.token(&tokenizer.next().unwrap().unwrap());
        trace.close("term");
        trace.close("expression");

        assert_eq!(
            trace.to_markup(),
            "<expression>\n\
             \x20 <term>\n\
             \x20   <identifier> x </identifier>\n\
             \x20 </term>\n\
             \x20 <symbol> &lt; </symbol>\n\
             \x20 <term>\n\
             \x20   <stringConstant> a&amp;b </stringConstant>\n\
             \x20 </term>\n\
             </expression>"
        );
    }
}
