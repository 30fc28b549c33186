//! Clean-up of summary markup before it goes into the e-mail.
//!
//! Rules, applied in order:
//!   1. Line-break variants (`<br/>`, `<BR />`, ...) become `<br>`.
//!   2. Each `<b>title</b>` stands alone: a section gap before it,
//!      a single break after it, no stray bullet marker in front.
//!   3. Runs of breaks collapse to at most two; breaks at either end go.
//!   4. Trailing separators (`<hr>`, `---`, dangling bullets) are stripped.

const BR: &str = "<br>";

pub fn normalize_markup(raw: &str) -> String {
    let unified = unify_breaks(raw);
    let titled = isolate_titles(&unified);
    let collapsed = collapse_breaks(&titled);
    strip_trailing_separators(&collapsed)
}

fn unify_breaks(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find('<') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        match tail.find('>') {
            Some(end) => {
                let tag = &tail[..=end];
                let inner: String = tag[1..tag.len() - 1]
                    .chars()
                    .filter(|c| !c.is_whitespace() && *c != '/')
                    .collect::<String>()
                    .to_ascii_lowercase();
                match inner.as_str() {
                    "br" => out.push_str(BR),
                    "b" if !tag.contains('/') => out.push_str("<b>"),
                    "b" => out.push_str("</b>"),
                    _ => out.push_str(tag),
                }
                rest = &tail[end + 1..];
            }
            None => {
                out.push_str(tail);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

fn isolate_titles(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 16);
    let mut rest = text;
    while let Some(open) = rest.find("<b>") {
        let Some(close_rel) = rest[open..].find("</b>") else {
            break;
        };
        let close = open + close_rel + "</b>".len();

        out.push_str(&rest[..open]);
        // Drop a bullet marker sitting directly in front of the title.
        let trimmed_len = out
            .trim_end()
            .trim_end_matches(['-', '*', '•'])
            .trim_end()
            .len();
        out.truncate(trimmed_len);
        if !out.is_empty() && !out.ends_with(BR) {
            out.push_str(BR);
            out.push_str(BR);
        }
        out.push_str(&rest[open..close]);

        let after = rest[close..].trim_start().trim_start_matches(':').trim_start();
        if !after.is_empty() && !after.starts_with(BR) {
            out.push_str(BR);
        }
        rest = after;
    }
    out.push_str(rest);
    out
}

fn collapse_breaks(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending = 0usize;
    for (i, piece) in text.split(BR).enumerate() {
        if i > 0 {
            pending += 1;
        }
        let piece = piece.trim();
        if piece.is_empty() {
            continue;
        }
        if !out.is_empty() {
            for _ in 0..pending.min(2) {
                out.push_str(BR);
            }
        }
        pending = 0;
        out.push_str(piece);
    }
    out
}

fn strip_trailing_separators(text: &str) -> String {
    let mut s = text.trim_end();
    loop {
        let before = s.len();
        for sep in [BR, "<hr>", "<hr/>", "<hr />", "---"] {
            s = s.strip_suffix(sep).unwrap_or(s).trim_end();
        }
        s = s.trim_end_matches(['-', '|', '•']).trim_end();
        if s.len() == before {
            break;
        }
    }
    s.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_repeated_breaks() {
        assert_eq!(normalize_markup("a<br><br><br><br>b"), "a<br><br>b");
        assert_eq!(normalize_markup("a<br/>\n<BR />b"), "a<br><br>b");
        assert_eq!(normalize_markup("<br>a<br>"), "a");
    }

    #[test]
    fn strips_trailing_separators() {
        assert_eq!(normalize_markup("- last point<br><br>---\n"), "- last point");
        assert_eq!(normalize_markup("done<hr>"), "done");
    }

    #[test]
    fn title_stands_alone_before_bullets() {
        let raw = "<b>Country Trends</b> - UK leads fraud.<br>- Nigeria rising.<br><br><br>\
                   <b>Aggregator Trends</b><br>- AGG2 flagged.<br><br>";
        assert_eq!(
            normalize_markup(raw),
            "<b>Country Trends</b><br>- UK leads fraud.<br>- Nigeria rising.<br><br>\
             <b>Aggregator Trends</b><br>- AGG2 flagged."
        );
    }

    #[test]
    fn inline_title_gets_section_gap() {
        let raw = "- first<br>- second - <b>Channel Trends:</b>: SMS dominates";
        assert_eq!(
            normalize_markup(raw),
            "- first<br>- second<br><br><b>Channel Trends:</b><br>SMS dominates"
        );
    }

    #[test]
    fn unrelated_tags_are_kept() {
        assert_eq!(normalize_markup("<i>note</i>"), "<i>note</i>");
    }
}
