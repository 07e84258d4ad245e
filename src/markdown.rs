//! Markdown to HTML rendering with `pulldown-cmark`.
//!
//! [`PulldownRenderer`] implements the core [`MarkdownRenderer`] contract.
//! The event stream is rewritten before HTML generation to apply the
//! [`RenderConfig`]:
//!
//! - headings and paragraphs get the theme's inline styles
//! - fenced code gets an optional mac-style header and line numbers
//! - images become `<figure>` with a caption chosen by the legend mode
//! - external links are collected into a numbered references section
//!
//! A leading `---` front-matter block is stripped, and a reading-time
//! block is prepended when enabled. Output is wrapped in a single
//! `<section>` carrying the font and color settings.

use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};

use inkpad_core::error::RenderError;
use inkpad_core::models::{reading_minutes, word_count};
use inkpad_core::render::{escape_html, MarkdownRenderer, RenderConfig, Theme};

#[derive(Debug, Default, Clone, Copy)]
pub struct PulldownRenderer;

impl PulldownRenderer {
    pub fn new() -> Self {
        Self
    }
}

struct Citation {
    text: String,
    url: String,
}

/// Accumulates a construct whose HTML is emitted at its end tag.
enum Capture {
    Code { lang: String, code: String },
    Image { url: String, title: String, alt: String },
}

impl MarkdownRenderer for PulldownRenderer {
    fn render(&self, config: &RenderConfig, text: &str) -> Result<String, RenderError> {
        let content = strip_front_matter(text);

        let mut options = Options::empty();
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_TASKLISTS);

        let mut events: Vec<Event> = Vec::new();
        let mut citations: Vec<Citation> = Vec::new();
        let mut capture: Option<Capture> = None;
        let mut link: Option<(String, String)> = None;

        for event in Parser::new_ext(content, options) {
            if let Some(active) = capture.as_mut() {
                let finished = match (active, &event) {
                    (Capture::Code { code, .. }, Event::Text(t)) => {
                        code.push_str(t);
                        false
                    }
                    (Capture::Image { alt, .. }, Event::Text(t) | Event::Code(t)) => {
                        alt.push_str(t);
                        false
                    }
                    (Capture::Code { .. }, Event::End(TagEnd::CodeBlock))
                    | (Capture::Image { .. }, Event::End(TagEnd::Image)) => true,
                    _ => false,
                };
                if finished {
                    if let Some(done) = capture.take() {
                        events.push(Event::Html(CowStr::from(emit_capture(config, done))));
                    }
                }
                continue;
            }

            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    let lang = match kind {
                        CodeBlockKind::Fenced(info) => {
                            info.split_whitespace().next().unwrap_or("").to_string()
                        }
                        CodeBlockKind::Indented => String::new(),
                    };
                    capture = Some(Capture::Code {
                        lang,
                        code: String::new(),
                    });
                }
                Event::Start(Tag::Image {
                    dest_url, title, ..
                }) => {
                    capture = Some(Capture::Image {
                        url: dest_url.to_string(),
                        title: title.to_string(),
                        alt: String::new(),
                    });
                }
                Event::Start(Tag::Heading { level, .. }) => {
                    let n = level as usize;
                    events.push(Event::Html(CowStr::from(format!(
                        "<h{n}{}>",
                        style_attr(&heading_style(config, n))
                    ))));
                }
                Event::End(TagEnd::Heading(level)) => {
                    events.push(Event::Html(CowStr::from(format!("</h{}>\n", level as usize))));
                }
                Event::Start(Tag::Paragraph) => {
                    events.push(Event::Html(CowStr::from(format!(
                        "<p{}>",
                        style_attr(&paragraph_style(config))
                    ))));
                }
                Event::End(TagEnd::Paragraph) => {
                    events.push(Event::Html(CowStr::from("</p>\n")));
                }
                Event::Start(Tag::Link {
                    ref dest_url,
                    ..
                }) => {
                    link = Some((dest_url.to_string(), String::new()));
                    events.push(event);
                }
                Event::Text(ref t) | Event::Code(ref t) if link.is_some() => {
                    if let Some((_, text)) = link.as_mut() {
                        text.push_str(t);
                    }
                    events.push(event);
                }
                Event::End(TagEnd::Link) => {
                    events.push(event);
                    if let Some((url, text)) = link.take() {
                        if config.citations && is_external(&url) && text.trim() != url {
                            let n = match citations.iter().position(|c| c.url == url) {
                                Some(i) => i + 1,
                                None => {
                                    citations.push(Citation { text, url });
                                    citations.len()
                                }
                            };
                            events.push(Event::Html(CowStr::from(format!("<sup>[{n}]</sup>"))));
                        }
                    }
                }
                other => events.push(other),
            }
        }
        if capture.is_some() {
            return Err(RenderError("unterminated block".to_string()));
        }

        let mut body = String::with_capacity(content.len() * 2);
        if config.reading_time {
            body.push_str(&reading_time_block(config, content));
        }
        html::push_html(&mut body, events.into_iter());
        if !citations.is_empty() {
            body.push_str(&references_block(config, &citations));
        }

        Ok(format!(
            "<section class=\"inkpad theme-{}\" style=\"{}\">{}</section>",
            theme_name(config.theme),
            escape_html(&container_style(config)),
            body
        ))
    }
}

fn theme_name(theme: Theme) -> &'static str {
    match theme {
        Theme::Default => "default",
        Theme::Grace => "grace",
        Theme::Simple => "simple",
    }
}

fn style_attr(style: &str) -> String {
    if style.is_empty() {
        String::new()
    } else {
        format!(" style=\"{}\"", escape_html(style))
    }
}

fn container_style(config: &RenderConfig) -> String {
    format!(
        "font-family: {}; font-size: {}; --md-primary-color: {}; line-height: 1.75;",
        config.fonts, config.font_size, config.primary_color
    )
}

fn heading_style(config: &RenderConfig, level: usize) -> String {
    let color = &config.primary_color;
    match (config.theme, level) {
        (Theme::Default, 1) => format!("text-align: center; color: {color};"),
        (Theme::Default, 2) => {
            format!("display: table; padding: 0 0.2em; color: #fff; background: {color};")
        }
        (Theme::Default, _) => format!("color: {color};"),
        (Theme::Grace, 1 | 2) => {
            format!("color: {color}; border-bottom: 2px solid {color}; padding-bottom: 0.3em;")
        }
        (Theme::Grace, _) => format!("color: {color}; border-left: 4px solid {color}; padding-left: 0.5em;"),
        (Theme::Simple, 1 | 2) => format!("color: {color};"),
        (Theme::Simple, _) => String::new(),
    }
}

fn paragraph_style(config: &RenderConfig) -> String {
    let mut style = String::new();
    if config.indent {
        style.push_str("text-indent: 2em;");
    }
    if config.justify {
        if !style.is_empty() {
            style.push(' ');
        }
        style.push_str("text-align: justify;");
    }
    style
}

fn emit_capture(config: &RenderConfig, capture: Capture) -> String {
    match capture {
        Capture::Code { lang, code } => code_block(config, &lang, &code),
        Capture::Image { url, title, alt } => {
            let mut out = format!(
                "<figure><img src=\"{}\" alt=\"{}\"",
                escape_html(&url),
                escape_html(&alt)
            );
            if !title.is_empty() {
                out.push_str(&format!(" title=\"{}\"", escape_html(&title)));
            }
            out.push_str(" style=\"display: block; max-width: 100%; margin: 0.1em auto 0.5em;\"/>");
            if let Some(caption) = config.legend.caption(&alt, &title) {
                out.push_str(&format!(
                    "<figcaption style=\"text-align: center; color: #888; font-size: 0.8em;\">{}</figcaption>",
                    escape_html(caption)
                ));
            }
            out.push_str("</figure>");
            out
        }
    }
}

fn code_block(config: &RenderConfig, lang: &str, code: &str) -> String {
    let mut out = String::from("<pre class=\"code__pre\">");
    if config.mac_code_block {
        out.push_str(concat!(
            "<span class=\"mac-sign\" style=\"display: flex; padding: 10px 14px 0;\">",
            "<span style=\"color: #ff5f56;\">●</span>",
            "<span style=\"color: #ffbd2e;\">●</span>",
            "<span style=\"color: #27c93f;\">●</span>",
            "</span>"
        ));
    }
    let class = if lang.is_empty() {
        String::new()
    } else {
        format!(" class=\"language-{}\"", escape_html(lang))
    };
    out.push_str(&format!("<code{class}>"));
    let code = code.strip_suffix('\n').unwrap_or(code);
    if config.line_numbers {
        for (i, line) in code.split('\n').enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(&format!(
                "<span class=\"line\"><span class=\"line-number\" style=\"user-select: none; opacity: 0.5; padding-right: 1em;\">{}</span>{}</span>",
                i + 1,
                escape_html(line)
            ));
        }
    } else {
        out.push_str(&escape_html(code));
    }
    out.push_str("</code></pre>\n");
    out
}

fn reading_time_block(config: &RenderConfig, content: &str) -> String {
    let chars = word_count(content);
    format!(
        "<blockquote class=\"reading-time\" style=\"border-left: 3px solid {}; padding-left: 1em; color: #888;\"><p>{} characters, about {} min read</p></blockquote>\n",
        escape_html(&config.primary_color),
        chars,
        reading_minutes(chars)
    )
}

fn references_block(config: &RenderConfig, citations: &[Citation]) -> String {
    let mut out = format!(
        "<h4{}>References</h4>\n<p class=\"footnotes\" style=\"font-size: 80%;\">",
        style_attr(&heading_style(config, 4))
    );
    for (i, c) in citations.iter().enumerate() {
        if i > 0 {
            out.push_str("<br/>");
        }
        out.push_str(&format!(
            "<code>[{}]</code> {}: <i style=\"word-break: break-all;\">{}</i>",
            i + 1,
            escape_html(c.text.trim()),
            escape_html(&c.url)
        ));
    }
    out.push_str("</p>\n");
    out
}

fn is_external(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Body without a leading `---` … `---` front-matter block.
fn strip_front_matter(text: &str) -> &str {
    let Some(rest) = text
        .strip_prefix("---\n")
        .or_else(|| text.strip_prefix("---\r\n"))
    else {
        return text;
    };
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        offset += line.len();
        if line.trim_end() == "---" {
            return &rest[offset..];
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(config: &RenderConfig, text: &str) -> String {
        PulldownRenderer::new().render(config, text).unwrap()
    }

    fn plain() -> RenderConfig {
        RenderConfig {
            reading_time: false,
            citations: false,
            mac_code_block: false,
            line_numbers: false,
            ..RenderConfig::default()
        }
    }

    #[test]
    fn renders_headings_with_primary_color() {
        let html = render(&plain(), "# Hello\n\nWorld");
        assert!(html.starts_with("<section class=\"inkpad theme-default\""));
        assert!(html.contains("<h1 style=\"text-align: center; color: #0F4C81;\">Hello</h1>"));
        assert!(html.contains("<p>World</p>"));
    }

    #[test]
    fn output_is_deterministic() {
        let config = RenderConfig::default();
        let text = "# T\n\n[a](https://a.example) ![img](x.png \"cap\")\n\n```rust\nfn main() {}\n```";
        assert_eq!(render(&config, text), render(&config, text));
    }

    #[test]
    fn reading_time_block_counts_characters() {
        let config = RenderConfig {
            reading_time: true,
            ..plain()
        };
        let html = render(&config, "# Hello\n\nWorld");
        assert!(html.contains("13 characters, about 1 min read"));
    }

    #[test]
    fn external_links_become_citations() {
        let config = RenderConfig {
            citations: true,
            ..plain()
        };
        let html = render(
            &config,
            "See [docs](https://docs.example) and [docs again](https://docs.example) and [local](/x).",
        );
        assert_eq!(html.matches("<sup>[1]</sup>").count(), 2);
        assert!(!html.contains("<sup>[2]</sup>"));
        assert!(html.contains("References"));
        assert!(html.contains("<code>[1]</code> docs: <i"));
    }

    #[test]
    fn code_blocks_get_line_numbers_and_escaping() {
        let config = RenderConfig {
            line_numbers: true,
            mac_code_block: true,
            ..plain()
        };
        let html = render(&config, "```html\n<b>\nx\n```\n");
        assert!(html.contains("class=\"mac-sign\""));
        assert!(html.contains("class=\"language-html\""));
        assert!(html.contains("&lt;b&gt;"));
        assert_eq!(html.matches("class=\"line-number\"").count(), 2);
    }

    #[test]
    fn images_get_legend_captions() {
        let html = render(&plain(), "![alt text](pic.png \"the title\")");
        assert!(html.contains("<figure><img src=\"pic.png\" alt=\"alt text\" title=\"the title\""));
        assert!(html.contains(">alt text</figcaption>"));
    }

    #[test]
    fn front_matter_is_stripped() {
        let html = render(&plain(), "---\ntitle: x\n---\n# Body");
        assert!(!html.contains("title: x"));
        assert!(html.contains(">Body</h1>"));
    }

    #[test]
    fn indent_and_justify_style_paragraphs() {
        let config = RenderConfig {
            indent: true,
            justify: true,
            ..plain()
        };
        let html = render(&config, "text");
        assert!(html.contains("<p style=\"text-indent: 2em; text-align: justify;\">text</p>"));
    }
}
