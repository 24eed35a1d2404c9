//! Entry body rendering

/// How an entry body is encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntryFormat {
    #[default]
    PlainText,
    /// HTML (`h`) or Pango markup (`g`)
    Html,
}

impl EntryFormat {
    /// Format from a StarDict `sametypesequence` value
    pub fn from_type_sequence(seq: &str) -> Self {
        match seq.trim().chars().next() {
            Some('h') | Some('g') => EntryFormat::Html,
            _ => EntryFormat::PlainText,
        }
    }
}

/// Render an entry body as display text
pub fn render_entry(format: EntryFormat, body: &str) -> String {
    match format {
        EntryFormat::PlainText => collapse_blank_lines(&body.replace("\r\n", "\n")),
        EntryFormat::Html => html_to_text(body),
    }
}

fn html_to_text(input: &str) -> String {
    let input = input
        .replace("<br />", "\n")
        .replace("<br/>", "\n")
        .replace("<br>", "\n")
        .replace("</p>", "\n")
        .replace("\\n", "\n");

    let mut out = String::with_capacity(input.len());
    let mut in_tag = false;
    for ch in input.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }

    let out = out
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&");

    collapse_blank_lines(&out)
}

/// Squash runs of blank lines to one and trim the ends
fn collapse_blank_lines(input: &str) -> String {
    let mut normalized = String::with_capacity(input.len());
    let mut newlines = 0u8;

    for ch in input.chars() {
        if ch == '\n' {
            newlines = newlines.saturating_add(1);
            if newlines > 2 {
                continue;
            }
        } else {
            newlines = 0;
        }
        normalized.push(ch);
    }

    normalized.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_type_sequence() {
        assert_eq!(EntryFormat::from_type_sequence("h"), EntryFormat::Html);
        assert_eq!(EntryFormat::from_type_sequence("g"), EntryFormat::Html);
        assert_eq!(EntryFormat::from_type_sequence("m"), EntryFormat::PlainText);
        assert_eq!(EntryFormat::from_type_sequence(""), EntryFormat::PlainText);
    }

    #[test]
    fn test_html_rendering() {
        let body = "<b>house</b><br>a building<br/><br/><br/><i>dwelling</i> &amp; home";
        assert_eq!(
            render_entry(EntryFormat::Html, body),
            "house\na building\n\ndwelling & home"
        );
    }

    #[test]
    fn test_pango_markup_rendering() {
        let body = "<span foreground=\"blue\">cat</span>\n&lt;n&gt; a small animal";
        assert_eq!(
            render_entry(EntryFormat::Html, body),
            "cat\n<n> a small animal"
        );
    }

    #[test]
    fn test_plain_text_untouched() {
        let body = "  a <b> literal\r\n\n\n\nnext  ";
        assert_eq!(
            render_entry(EntryFormat::PlainText, body),
            "a <b> literal\n\nnext"
        );
    }
}
