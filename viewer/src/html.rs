use archive::ArchivedEntry;
use boardwatch_core::ExtractedArticle;
use std::fmt::Write;

pub fn escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Form-encode a file name for use in a query string.
pub fn encode_query_value(raw: &str) -> String {
    url::form_urlencoded::byte_serialize(raw.as_bytes()).collect()
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{}</title></head>\n<body>\n{}</body>\n</html>\n",
        escape(title),
        body
    )
}

pub fn render_index(entries: &[ArchivedEntry]) -> String {
    let mut body = String::from("<h1>Archived articles</h1>\n");
    if entries.is_empty() {
        body.push_str("<p>No articles archived yet.</p>\n");
        return page("boardwatch", &body);
    }

    body.push_str("<table>\n<tr><th>Article</th><th>Modified</th><th>Size</th><th></th></tr>\n");
    for entry in entries {
        let query = encode_query_value(&entry.name);
        let _ = writeln!(
            body,
            "<tr><td><a href=\"/view?title={q}\">{name}</a></td><td>{modified}</td><td>{size}</td><td><a href=\"/delete?title={q}\">delete</a></td></tr>",
            q = query,
            name = escape(&entry.name),
            modified = entry.modified.format("%Y-%m-%d %H:%M:%S"),
            size = entry.size,
        );
    }
    body.push_str("</table>\n");
    page("boardwatch", &body)
}

pub fn render_article(name: &str, article: &ExtractedArticle) -> String {
    let mut body = String::new();
    let _ = writeln!(body, "<p><a href=\"/\">back</a></p>");
    let _ = writeln!(body, "<h1>{}</h1>", escape(&article.title));
    let _ = writeln!(
        body,
        "<p>{} | {} | {}</p>",
        escape(&article.board),
        escape(&article.author),
        escape(&article.date)
    );
    let _ = writeln!(
        body,
        "<p>matched {} keyword <code>{}</code></p>",
        article.keyword_kind,
        escape(&article.keyword)
    );
    let _ = writeln!(
        body,
        "<p><a href=\"{url}\">{url}</a></p>",
        url = escape(&article.url)
    );
    let _ = writeln!(body, "<pre>{}</pre>", escape(&article.content));
    let _ = writeln!(
        body,
        "<p><a href=\"/delete?title={}\">delete</a></p>",
        encode_query_value(name)
    );
    page(&article.title, &body)
}

pub fn render_error(message: &str) -> String {
    page(
        "boardwatch",
        &format!("<p>{}</p>\n<p><a href=\"/\">back</a></p>\n", escape(message)),
    )
}
