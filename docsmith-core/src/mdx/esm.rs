//! Separating module-level `import`/`export` blocks from Markdown.

/// A run of source lines that is either Markdown or an ESM block
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Markdown(String),
    Esm(String),
}

/// Split MDX source into Markdown and ESM segments, preserving order.
///
/// An ESM block starts at a column-0 line beginning with `import ` or
/// `export ` that opens a block (first line, or after a blank line) outside
/// fenced code. It runs until the next blank line met with every bracket,
/// string and block comment closed.
pub fn split_segments(source: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut markdown = String::new();
    let mut esm: Option<(String, Balance)> = None;
    let mut fence: Option<Fence> = None;
    let mut previous_blank = true;

    for line in source.split_inclusive('\n') {
        let content = line.trim_end_matches(['\n', '\r']);
        let blank = content.trim().is_empty();

        if let Some((block, balance)) = esm.as_mut() {
            if blank && balance.is_closed() {
                segments.push(Segment::Esm(block.trim_end().to_string()));
                esm = None;
                markdown.push_str(line);
            } else {
                balance.scan(content);
                block.push_str(line);
            }
            previous_blank = blank;
            continue;
        }

        match &fence {
            Some(open) => {
                if open.closes(content) {
                    fence = None;
                }
            }
            None => {
                if let Some(open) = Fence::opening(content) {
                    fence = Some(open);
                } else if previous_blank && starts_esm(content) {
                    if !markdown.trim().is_empty() {
                        segments.push(Segment::Markdown(std::mem::take(&mut markdown)));
                    } else {
                        markdown.clear();
                    }
                    let mut balance = Balance::default();
                    balance.scan(content);
                    esm = Some((line.to_string(), balance));
                    previous_blank = false;
                    continue;
                }
            }
        }

        markdown.push_str(line);
        previous_blank = blank;
    }

    if let Some((block, balance)) = esm {
        if !balance.is_closed() {
            tracing::warn!("Unterminated ESM statement at end of document");
        }
        segments.push(Segment::Esm(block.trim_end().to_string()));
    }
    if !markdown.trim().is_empty() {
        segments.push(Segment::Markdown(markdown));
    }

    segments
}

fn starts_esm(line: &str) -> bool {
    line.starts_with("import ") || line.starts_with("export ")
}

/// Nesting state of a JavaScript statement scanned line by line
#[derive(Debug, Default)]
struct Balance {
    depth: usize,
    /// Open template literal; quotes and line comments end with the line
    template: bool,
    block_comment: bool,
}

impl Balance {
    fn is_closed(&self) -> bool {
        self.depth == 0 && !self.template && !self.block_comment
    }

    fn scan(&mut self, line: &str) {
        let mut quote: Option<char> = None;
        let mut chars = line.chars().peekable();

        while let Some(c) = chars.next() {
            if self.block_comment {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    self.block_comment = false;
                }
                continue;
            }
            if self.template || quote.is_some() {
                let close = quote.unwrap_or('`');
                if c == '\\' {
                    chars.next();
                } else if c == close {
                    self.template = false;
                    quote = None;
                }
                continue;
            }
            match c {
                '/' if chars.peek() == Some(&'/') => break,
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    self.block_comment = true;
                }
                '\'' | '"' => quote = Some(c),
                '`' => self.template = true,
                '{' | '[' | '(' => self.depth += 1,
                '}' | ']' | ')' => self.depth = self.depth.saturating_sub(1),
                _ => {}
            }
        }
    }
}

/// An open fenced code block: marker char and run length
#[derive(Debug, Clone, Copy)]
struct Fence {
    marker: char,
    len: usize,
}

impl Fence {
    fn opening(line: &str) -> Option<Self> {
        let indent = line.len() - line.trim_start_matches(' ').len();
        if indent > 3 {
            return None;
        }
        let rest = &line[indent..];
        let marker = rest.chars().next().filter(|c| *c == '`' || *c == '~')?;
        let len = rest.chars().take_while(|c| *c == marker).count();
        if len < 3 {
            return None;
        }
        // Backtick fences cannot have backticks in their info string
        if marker == '`' && rest[len..].contains('`') {
            return None;
        }
        Some(Self { marker, len })
    }

    fn closes(&self, line: &str) -> bool {
        let trimmed = line.trim();
        let run = trimmed.chars().take_while(|c| *c == self.marker).count();
        run >= self.len && run == trimmed.chars().count()
    }
}
