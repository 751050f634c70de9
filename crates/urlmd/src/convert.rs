//! HTML to markdown conversion

use std::iter::Peekable;
use std::str::Chars;

/// Elements whose content never reaches the output
const SKIP_TAGS: &[&str] = &["script", "style", "noscript", "iframe", "svg", "template"];

/// Elements that start and end a block
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "section", "article", "main", "header", "footer", "nav", "aside", "figure",
    "figcaption", "form", "address", "dl", "dt", "dd",
];

/// Convert an HTML document to markdown
///
/// The document `<title>` becomes a leading `# heading` when the body has no
/// `<h1>` of its own.
pub fn html_to_markdown(html: &str) -> String {
    let mut writer = MarkdownWriter::default();
    let mut chars = html.chars().peekable();

    while let Some(c) = chars.next() {
        // Skipped content is raw text: only its own end tag is recognized
        if !writer.skip.is_empty() {
            if c == '<' && writer.skip.last().is_some_and(|name| ends_element(&chars, name)) {
                let raw = read_tag(&mut chars);
                writer.tag(&Tag::parse(&raw));
            }
            continue;
        }

        match c {
            '<' if starts_tag(&chars) => {
                let raw = read_tag(&mut chars);
                writer.tag(&Tag::parse(&raw));
            }
            '&' => match decode_entity(&mut chars) {
                Some(decoded) => writer.text(decoded),
                None => writer.text('&'),
            },
            _ => writer.text(c),
        }
    }

    writer.finish()
}

/// Whether the input after a `<` is a tag rather than a literal `<`
///
/// A tag name must be followed by whitespace, `/` or `>`, and the tag must
/// close before the next unquoted `<`.
fn starts_tag(chars: &Peekable<Chars<'_>>) -> bool {
    let mut ahead = chars.clone();
    match ahead.peek() {
        Some('!') => return true,
        Some('/') => {
            ahead.next();
        }
        _ => {}
    }
    if !ahead.next().is_some_and(|c| c.is_ascii_alphabetic()) {
        return false;
    }
    while ahead
        .next_if(|c| c.is_ascii_alphanumeric() || *c == '-')
        .is_some()
    {}
    match ahead.next() {
        Some('>') => true,
        Some(c) if c.is_whitespace() || c == '/' => closes_before_next_open(ahead),
        _ => false,
    }
}

/// True when a `>` comes before any `<` outside a quoted attribute value
fn closes_before_next_open(ahead: Peekable<Chars<'_>>) -> bool {
    let mut quote = None;
    let mut prev = ' ';
    for c in ahead {
        match quote {
            Some(q) => {
                if c == q {
                    quote = None;
                }
            }
            None => match c {
                '>' => return true,
                '<' => return false,
                '"' | '\'' if prev == '=' => quote = Some(c),
                _ => {}
            },
        }
        if !c.is_whitespace() {
            prev = c;
        }
    }
    false
}

/// Whether the input after a `<` is `/name` followed by whitespace, `/` or `>`
fn ends_element(chars: &Peekable<Chars<'_>>, name: &str) -> bool {
    let mut ahead = chars.clone();
    if ahead.next() != Some('/') {
        return false;
    }
    for expected in name.chars() {
        if !ahead.next().is_some_and(|c| c.eq_ignore_ascii_case(&expected)) {
            return false;
        }
    }
    matches!(ahead.next(), Some(c) if c.is_whitespace() || c == '/' || c == '>')
}

/// Read up to the closing `>`; comments run until `-->`
fn read_tag(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut raw = String::new();
    for c in chars.by_ref() {
        if c == '>' && !(raw.starts_with("!--") && !raw.ends_with("--")) {
            break;
        }
        raw.push(c);
    }
    raw
}

struct Tag<'a> {
    name: String,
    closing: bool,
    self_closing: bool,
    raw: &'a str,
}

impl<'a> Tag<'a> {
    fn parse(raw: &'a str) -> Self {
        let closing = raw.starts_with('/');
        let body = raw.trim_start_matches('/');
        let name = body
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        Self {
            name,
            closing,
            self_closing: raw.trim_end().ends_with('/'),
            raw,
        }
    }

    fn attribute(&self, attr: &str) -> Option<String> {
        extract_attribute(self.raw, attr)
    }
}

#[derive(Clone, Copy)]
enum ListKind {
    Unordered,
    Ordered(usize),
}

#[derive(Default)]
struct MarkdownWriter {
    out: String,
    /// Parent buffers while inside `<blockquote>`
    quotes: Vec<String>,
    skip: Vec<String>,
    lists: Vec<ListKind>,
    links: Vec<Option<String>>,
    in_pre: bool,
    in_title: bool,
    title: String,
    has_h1: bool,
    table_rows: usize,
    row_cells: usize,
}

impl MarkdownWriter {
    fn tag(&mut self, tag: &Tag<'_>) {
        let name = tag.name.as_str();

        if SKIP_TAGS.contains(&name) {
            if tag.closing {
                if let Some(pos) = self.skip.iter().rposition(|t| t == name) {
                    self.skip.truncate(pos);
                }
            } else if !tag.self_closing {
                self.skip.push(name.to_string());
            }
            return;
        }
        if !self.skip.is_empty() {
            return;
        }

        match name {
            "title" => self.in_title = !tag.closing,
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                self.ensure_newlines(2);
                if !tag.closing {
                    if name == "h1" {
                        self.has_h1 = true;
                    }
                    let level = usize::from(name.as_bytes()[1] - b'0');
                    self.out.push_str(&"#".repeat(level));
                    self.out.push(' ');
                }
            }
            "br" => self.out.push('\n'),
            "hr" => {
                self.ensure_newlines(2);
                self.out.push_str("---");
                self.ensure_newlines(2);
            }
            "ul" | "ol" => {
                if tag.closing {
                    self.lists.pop();
                    if self.lists.is_empty() {
                        self.ensure_newlines(2);
                    }
                } else {
                    self.ensure_newlines(1);
                    self.lists.push(if name == "ol" {
                        ListKind::Ordered(0)
                    } else {
                        ListKind::Unordered
                    });
                }
            }
            "li" if !tag.closing => self.list_item(),
            "strong" | "b" => self.out.push_str("**"),
            "em" | "i" => self.out.push('*'),
            "code" if !self.in_pre => self.out.push('`'),
            "pre" => {
                if tag.closing {
                    self.ensure_newlines(1);
                    self.out.push_str("```");
                    self.in_pre = false;
                    self.ensure_newlines(2);
                } else {
                    self.ensure_newlines(2);
                    self.out.push_str("```\n");
                    self.in_pre = true;
                }
            }
            "blockquote" => {
                if tag.closing {
                    self.close_quote();
                } else {
                    self.ensure_newlines(2);
                    self.quotes.push(std::mem::take(&mut self.out));
                }
            }
            "a" => {
                if tag.closing {
                    if let Some(Some(href)) = self.links.pop() {
                        self.out.push_str(&format!("]({})", href));
                    }
                } else {
                    let href = tag
                        .attribute("href")
                        .filter(|h| !h.is_empty() && !h.starts_with("javascript:"));
                    if href.is_some() {
                        self.out.push('[');
                    }
                    self.links.push(href);
                }
            }
            "img" => {
                if let Some(src) = tag.attribute("src") {
                    let alt = tag.attribute("alt").unwrap_or_default();
                    self.out.push_str(&format!("![{}]({})", alt, src));
                }
            }
            "table" => {
                self.ensure_newlines(2);
                self.table_rows = 0;
            }
            "tr" => {
                if tag.closing {
                    if self.table_rows == 0 && self.row_cells > 0 {
                        self.out.push_str("\n|");
                        self.out.push_str(&" --- |".repeat(self.row_cells));
                    }
                    self.table_rows += 1;
                } else {
                    self.ensure_newlines(1);
                    self.out.push('|');
                    self.row_cells = 0;
                }
            }
            "td" | "th" => {
                if tag.closing {
                    self.trim_trailing_spaces();
                    self.out.push_str(" |");
                    self.row_cells += 1;
                } else {
                    self.trim_trailing_spaces();
                    self.out.push(' ');
                }
            }
            _ if BLOCK_TAGS.contains(&name) => self.ensure_newlines(2),
            _ => {}
        }
    }

    fn text(&mut self, c: char) {
        if !self.skip.is_empty() {
            return;
        }
        if self.in_title {
            self.title.push(c);
            return;
        }
        if self.in_pre {
            self.out.push(c);
            return;
        }
        if c.is_whitespace() {
            if !self.out.is_empty() && !self.out.ends_with(|p: char| p == ' ' || p == '\n') {
                self.out.push(' ');
            }
        } else {
            self.out.push(c);
        }
    }

    fn list_item(&mut self) {
        self.ensure_newlines(1);
        let depth = self.lists.len();
        self.out.push_str(&"  ".repeat(depth.saturating_sub(1)));
        match self.lists.last_mut() {
            Some(ListKind::Ordered(n)) => {
                *n += 1;
                let marker = format!("{}. ", n);
                self.out.push_str(&marker);
            }
            _ => self.out.push_str("- "),
        }
    }

    fn close_quote(&mut self) {
        let Some(parent) = self.quotes.pop() else {
            return;
        };
        let inner = tidy(&std::mem::replace(&mut self.out, parent));
        if inner.is_empty() {
            return;
        }
        self.ensure_newlines(2);
        for (i, line) in inner.lines().enumerate() {
            if i > 0 {
                self.out.push('\n');
            }
            if line.is_empty() {
                self.out.push('>');
            } else {
                self.out.push_str("> ");
                self.out.push_str(line);
            }
        }
        self.ensure_newlines(2);
    }

    fn trim_trailing_spaces(&mut self) {
        let keep = self.out.trim_end_matches(|c: char| c == ' ' || c == '\t').len();
        self.out.truncate(keep);
    }

    /// Make the buffer end with at least `n` newlines (no-op on empty output)
    fn ensure_newlines(&mut self, n: usize) {
        self.trim_trailing_spaces();
        if self.out.is_empty() {
            return;
        }
        let existing = self.out.chars().rev().take_while(|&c| c == '\n').count();
        for _ in existing..n {
            self.out.push('\n');
        }
    }

    fn finish(mut self) -> String {
        while !self.quotes.is_empty() {
            self.close_quote();
        }
        let body = tidy(&self.out);
        let title = self.title.split_whitespace().collect::<Vec<_>>().join(" ");
        if self.has_h1 || title.is_empty() {
            body
        } else if body.is_empty() {
            format!("# {}", title)
        } else {
            format!("# {}\n\n{}", title, body)
        }
    }
}

/// Trim line ends, keep at most one blank line in a row, trim the whole
fn tidy(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut blank_run = 0;
    for line in s.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        result.push_str(line);
        result.push('\n');
    }
    result.trim().to_string()
}

/// Extract an attribute value from the raw tag text
fn extract_attribute(tag: &str, attr: &str) -> Option<String> {
    let lower = tag.to_ascii_lowercase();
    let pattern = format!("{}=", attr);

    let mut search_from = 0;
    let start = loop {
        let found = search_from + lower[search_from..].find(&pattern)?;
        let preceded_by_space = lower[..found]
            .chars()
            .next_back()
            .is_some_and(char::is_whitespace);
        if preceded_by_space {
            break found;
        }
        search_from = found + pattern.len();
    };

    let rest = tag[start + pattern.len()..].trim_start();
    let value = if let Some(quoted) = rest.strip_prefix('"') {
        &quoted[..quoted.find('"')?]
    } else if let Some(quoted) = rest.strip_prefix('\'') {
        &quoted[..quoted.find('\'')?]
    } else {
        let end = rest
            .find(|c: char| c.is_whitespace() || c == '>')
            .unwrap_or(rest.len());
        rest[..end].trim_end_matches('/')
    };

    let mut chars = value.chars().peekable();
    let mut decoded = String::with_capacity(value.len());
    while let Some(c) = chars.next() {
        if c == '&' {
            decoded.push(decode_entity(&mut chars).unwrap_or('&'));
        } else {
            decoded.push(c);
        }
    }
    Some(decoded)
}

/// Decode the entity following an `&`; leaves the iterator untouched on failure
fn decode_entity(chars: &mut Peekable<Chars<'_>>) -> Option<char> {
    let mut lookahead = chars.clone();
    let mut name = String::new();
    loop {
        match lookahead.next() {
            Some(';') => break,
            Some(c) if (c.is_ascii_alphanumeric() || c == '#') && name.len() < 10 => name.push(c),
            _ => return None,
        }
    }

    let decoded = match name.as_str() {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => ' ',
        "mdash" => '\u{2014}',
        "ndash" => '\u{2013}',
        "hellip" => '\u{2026}',
        "lsquo" => '\u{2018}',
        "rsquo" => '\u{2019}',
        "ldquo" => '\u{201C}',
        "rdquo" => '\u{201D}',
        "laquo" => '\u{00AB}',
        "raquo" => '\u{00BB}',
        "copy" => '\u{00A9}',
        "reg" => '\u{00AE}',
        "trade" => '\u{2122}',
        "euro" => '\u{20AC}',
        _ => {
            let num = name.strip_prefix('#')?;
            let hex = num.strip_prefix('x').or_else(|| num.strip_prefix('X'));
            let code = match hex {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse::<u32>().ok()?,
            };
            char::from_u32(code)?
        }
    };

    *chars = lookahead;
    Some(decoded)
}
