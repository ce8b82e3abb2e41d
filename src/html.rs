//! HTML output for rendered notes and the app's pages.
//!
//! All text and attribute values pass through `html_escape`; nothing from
//! the external service is emitted raw.

use std::fmt::Write;

use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::models::Note;
use crate::renderer::{FontStyle, FontWeight, InlineSpan, InlineStyle, RenderNode};
use crate::views::{format_timestamp, CreateForm, DetailView, ListView};

/// Text and background CSS colors for each of the service's color names
const COLORS: &[(&str, &str, &str)] = &[
    ("gray", "gray", "#f1f1ef"),
    ("brown", "brown", "#f4eeee"),
    ("orange", "orange", "#fbecdd"),
    ("yellow", "#cb912f", "#fbf3db"),
    ("green", "green", "#edf3ec"),
    ("blue", "blue", "#e7f3f8"),
    ("purple", "purple", "#f6f3f9"),
    ("pink", "#c14c8a", "#fbf2f5"),
    ("red", "red", "#fdebec"),
];

/// CSS declaration for a color name such as `red` or `red_background`.
/// Unknown names produce nothing.
fn color_declaration(name: &str) -> Option<String> {
    let (base, background) = match name.strip_suffix("_background") {
        Some(base) => (base, true),
        None => (name, false),
    };
    let (_, text, fill) = COLORS.iter().find(|(known, _, _)| *known == base)?;

    Some(if background {
        format!("background-color: {}", fill)
    } else {
        format!("color: {}", text)
    })
}

/// CSS declarations for a span; empty for unstyled text
pub fn inline_css(style: &InlineStyle) -> String {
    let mut css = Vec::new();

    if let Some(declaration) = style.color.as_deref().and_then(color_declaration) {
        css.push(declaration);
    }
    if style.font_weight == FontWeight::Bold {
        css.push("font-weight: bold".to_string());
    }
    if style.font_style == FontStyle::Italic {
        css.push("font-style: italic".to_string());
    }
    let decorations: Vec<&str> = [
        (style.line_through, "line-through"),
        (style.underline, "underline"),
    ]
    .iter()
    .filter(|(on, _)| *on)
    .map(|(_, name)| *name)
    .collect();
    if !decorations.is_empty() {
        css.push(format!("text-decoration: {}", decorations.join(" ")));
    }
    if style.monospace {
        css.push("font-family: monospace".to_string());
    }

    css.join("; ")
}

fn write_spans(out: &mut String, spans: &[InlineSpan]) {
    for span in spans {
        let css = inline_css(&span.style);
        let text = encode_text(&span.text);
        let inner = match &span.href {
            Some(href) => format!(r#"<a href="{}">{}</a>"#, encode_double_quoted_attribute(href), text),
            None => text.into_owned(),
        };
        if css.is_empty() {
            let _ = write!(out, "<span>{}</span>", inner);
        } else {
            let _ = write!(
                out,
                r#"<span style="{}">{}</span>"#,
                encode_double_quoted_attribute(&css),
                inner
            );
        }
    }
}

fn write_node(out: &mut String, node: &RenderNode) {
    match node {
        RenderNode::Paragraph { spans, .. } => {
            out.push_str("<p>");
            write_spans(out, spans);
            out.push_str("</p>");
        }
        RenderNode::Heading { level, spans, .. } => {
            let _ = write!(out, "<h{}>", level);
            write_spans(out, spans);
            let _ = write!(out, "</h{}>", level);
        }
        RenderNode::BulletedItem { spans, children, .. } => {
            out.push_str(r#"<ul class="list-disc"><li>"#);
            write_spans(out, spans);
            write_nodes(out, children);
            out.push_str("</li></ul>");
        }
        RenderNode::NumberedItem {
            number,
            spans,
            children,
            ..
        } => {
            let _ = write!(out, r#"<ol class="list-decimal" start="{}"><li>"#, number);
            write_spans(out, spans);
            write_nodes(out, children);
            out.push_str("</li></ol>");
        }
        RenderNode::Image { url, .. } => match url {
            Some(url) => {
                let _ = write!(
                    out,
                    r#"<img src="{}" alt="Image" width="300">"#,
                    encode_double_quoted_attribute(url)
                );
            }
            None => out.push_str(r#"<div class="missing-image">Image unavailable</div>"#),
        },
        RenderNode::Toggle {
            summary, children, ..
        } => {
            out.push_str("<details><summary>");
            write_spans(out, summary);
            out.push_str("</summary>");
            write_nodes(out, children);
            out.push_str("</details>");
        }
        RenderNode::Quote { spans, children, .. } => {
            out.push_str("<blockquote>");
            write_spans(out, spans);
            write_nodes(out, children);
            out.push_str("</blockquote>");
        }
        RenderNode::Code {
            language, spans, ..
        } => {
            if language.is_empty() {
                out.push_str("<pre><code>");
            } else {
                let _ = write!(
                    out,
                    r#"<pre><code class="language-{}">"#,
                    encode_double_quoted_attribute(language)
                );
            }
            write_spans(out, spans);
            out.push_str("</code></pre>");
        }
        RenderNode::Unsupported { type_name, .. } => {
            let _ = write!(
                out,
                r#"<div class="unsupported">Unsupported block type: {}</div>"#,
                encode_text(type_name)
            );
        }
    }
}

fn write_nodes(out: &mut String, nodes: &[RenderNode]) {
    for node in nodes {
        write_node(out, node);
    }
}

/// Markup for a rendered block tree
pub fn render_nodes(nodes: &[RenderNode]) -> String {
    let mut out = String::new();
    write_nodes(&mut out, nodes);
    out
}

const STYLE: &str = r#"
body { font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif; max-width: 720px; margin: 0 auto; padding: 1rem; }
.error { color: #c0392b; text-align: center; margin: 0.5rem 0; }
.note-item { display: flex; justify-content: space-between; align-items: center; padding: 1rem; margin-bottom: 0.5rem; background: #fff; border-radius: 2px; box-shadow: 0 1px 3px rgba(0,0,0,0.15); }
.note-item.sliding-right .delete-button { display: inline-block; }
.note-item .title { overflow: hidden; text-overflow: ellipsis; white-space: nowrap; }
.date, .meta { color: #777; font-size: 0.75rem; }
blockquote { padding-left: 1rem; border-left: 4px solid #ccc; }
pre { background: #f3f3f3; padding: 0.5rem; border-radius: 4px; }
.unsupported { color: #999; font-style: italic; }
"#;

fn page(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{}</title>
    <style>{}</style>
</head>
<body>
{}
</body>
</html>"#,
        encode_text(title),
        STYLE,
        body
    )
}

fn error_banner(out: &mut String, message: Option<&str>) {
    if let Some(message) = message {
        let _ = write!(out, r#"<div class="error">{}</div>"#, encode_text(message));
    }
}

fn note_href(note: &Note) -> String {
    format!("/notes/{}", urlencoding::encode(&note.id))
}

/// The notes list with search box, delete buttons and paging
pub fn list_page(view: &ListView) -> String {
    let mut body = String::new();

    body.push_str(r#"<header><h1>All notes</h1><a class="add-new" href="/notes/new">New note</a></header>"#);
    error_banner(&mut body, view.error_message());

    let _ = write!(
        body,
        r#"<form method="get" action="/"><input type="text" name="q" value="{}" placeholder="Search notes..."></form>"#,
        encode_double_quoted_attribute(view.search_query())
    );

    body.push_str("<main><ul>");
    for note in view.notes() {
        let revealed = if view.swipe().is_revealed(&note.id) {
            " sliding-right"
        } else {
            ""
        };
        let href = note_href(note);
        let _ = write!(
            body,
            r#"<li class="note-item{}" id="{}"><a href="{}"><div class="date">{}</div><div class="title">{}</div></a><form method="post" action="{}/delete"><button class="delete-button" type="submit">Delete</button></form></li>"#,
            revealed,
            encode_double_quoted_attribute(&note.id),
            encode_double_quoted_attribute(&href),
            format_timestamp(&note.last_edited_time),
            encode_text(note.display_title()),
            encode_double_quoted_attribute(&href),
        );
    }
    body.push_str("</ul>");

    if view.is_loading() {
        body.push_str(r#"<div class="loading">Loading...</div>"#);
    } else if view.has_more() {
        // The server replays the loads, so the link names the depth, not a cursor
        if view.cursor().is_some() {
            let _ = write!(
                body,
                r#"<div class="load-more"><a href="/?pages={}">Load more</a></div>"#,
                view.pages_loaded() + 1
            );
        }
    } else {
        body.push_str(r#"<div class="end">No more notes</div>"#);
    }
    body.push_str("</main>");

    page("All notes", &body)
}

/// A single note with its rendered content
pub fn detail_page(view: &DetailView) -> String {
    let mut body = String::from(r#"<a class="back" href="/">&larr; Back</a>"#);

    match view {
        DetailView::Loading => body.push_str("<div>Loading...</div>"),
        DetailView::Errored(message) => error_banner(&mut body, Some(message)),
        DetailView::Loaded { note, nodes } => {
            let _ = write!(
                body,
                r#"<article><h1>{}</h1><div class="meta">Last edited: {}</div><div class="meta">Created: {}</div><div class="content">{}</div></article>"#,
                encode_text(note.display_title()),
                format_timestamp(&note.last_edited_time),
                format_timestamp(&note.created_time),
                render_nodes(nodes)
            );
        }
    }

    let title = view.note().map(Note::display_title).unwrap_or("Note");
    page(title, &body)
}

/// The create-note form
pub fn create_page(form: &CreateForm) -> String {
    let mut body = String::from(r#"<a class="back" href="/">&larr; Back</a><h1>New note</h1>"#);
    error_banner(&mut body, form.error());

    let _ = write!(
        body,
        r#"<form method="post" action="/notes/new"><input type="text" name="title" placeholder="Title" value="{}"><textarea name="content" placeholder="Content" rows="10">{}</textarea><button type="submit"{}>{}</button></form>"#,
        encode_double_quoted_attribute(&form.title),
        encode_text(&form.content),
        if form.is_submitting() { " disabled" } else { "" },
        if form.is_submitting() { "Creating..." } else { "Create" },
    );

    page("New note", &body)
}
