//! Shared HTML shell for drip emails.
//!
//! Every email is a standalone document with inline styles only, so it
//! renders the same in clients that strip `<style>` blocks or block remote
//! stylesheets.

const BRAND: &str = "Fundpath";
const ACCENT: &str = "#1f6feb";

/// Escape text for safe inclusion in HTML element content or a quoted
/// attribute value.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// A call-to-action button. Both fields are raw (unescaped) values.
pub(crate) struct Cta<'a> {
    pub label: &'a str,
    pub url: &'a str,
}

impl Cta<'_> {
    fn render(&self) -> String {
        format!(
            "<table role=\"presentation\" cellpadding=\"0\" cellspacing=\"0\" style=\"margin:24px 0;\">\
             <tr><td style=\"border-radius:6px;background:{ACCENT};\">\
             <a href=\"{url}\" style=\"display:inline-block;padding:12px 24px;color:#ffffff;\
             font-weight:600;text-decoration:none;font-family:Helvetica,Arial,sans-serif;\">{label}</a>\
             </td></tr></table>",
            url = escape_html(self.url),
            label = escape_html(self.label),
        )
    }
}

/// Body building blocks. Text is escaped on the way in, except for
/// [`Block::Html`], which callers must assemble from escaped parts.
pub(crate) enum Block<'a> {
    Paragraph(String),
    Html(String),
    Bullets(Vec<String>),
    Button(Cta<'a>),
}

impl Block<'_> {
    fn render(&self) -> String {
        match self {
            Block::Paragraph(text) => format!(
                "<p style=\"margin:0 0 16px;line-height:1.6;\">{}</p>",
                escape_html(text)
            ),
            Block::Html(html) => format!("<p style=\"margin:0 0 16px;line-height:1.6;\">{html}</p>"),
            Block::Bullets(items) => {
                let lis: String = items
                    .iter()
                    .map(|i| format!("<li style=\"margin:0 0 8px;\">{}</li>", escape_html(i)))
                    .collect();
                format!("<ul style=\"margin:0 0 16px;padding-left:20px;line-height:1.6;\">{lis}</ul>")
            }
            Block::Button(cta) => cta.render(),
        }
    }
}

/// Assemble a complete email document.
pub(crate) fn document(subject: &str, heading: &str, blocks: &[Block<'_>]) -> String {
    let body: String = blocks.iter().map(Block::render).collect();
    format!(
        "<!DOCTYPE html>\
<html lang=\"en\"><head><meta charset=\"utf-8\">\
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\
<title>{title}</title></head>\
<body style=\"margin:0;padding:0;background:#f4f6f8;\">\
<table role=\"presentation\" width=\"100%\" cellpadding=\"0\" cellspacing=\"0\" style=\"background:#f4f6f8;padding:32px 0;\">\
<tr><td align=\"center\">\
<table role=\"presentation\" width=\"600\" cellpadding=\"0\" cellspacing=\"0\" \
style=\"max-width:600px;background:#ffffff;border-radius:8px;padding:32px;\
font-family:Helvetica,Arial,sans-serif;color:#1f2328;font-size:16px;\">\
<tr><td>\
<div style=\"font-size:14px;font-weight:700;letter-spacing:0.08em;color:{ACCENT};margin-bottom:16px;\">{BRAND}</div>\
<h1 style=\"font-size:24px;line-height:1.3;margin:0 0 20px;\">{heading}</h1>\
{body}\
<p style=\"margin:32px 0 0;font-size:12px;color:#6e7781;line-height:1.5;\">\
You are receiving this because you signed up for {BRAND}. \
Reply to this email any time; a real person reads every message.</p>\
</td></tr></table>\
</td></tr></table>\
</body></html>",
        title = escape_html(subject),
        heading = escape_html(heading),
    )
}
