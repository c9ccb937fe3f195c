//! HTML rendering for the single-page form.

use std::fmt::Write;

use crate::classifier::{Article, Category, Classification, ClassifierError};

/// What to show under the form after a submission.
#[derive(Debug)]
pub enum Outcome {
    Classified(Classification),
    Failed(ClassifierError),
}

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; margin: 0; background: #0e1117; color: #fafafa; }
.layout { display: flex; min-height: 100vh; }
.sidebar { width: 300px; padding: 2rem 1.5rem; background: #262730; }
.main { flex: 1; padding: 2rem; max-width: 1100px; }
.columns { display: flex; gap: 2rem; }
.columns .form { flex: 2; }
.columns .guide { flex: 1; }
.header-container { text-align: center; padding: 2rem 0; background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); border-radius: 15px; margin-bottom: 2rem; color: white; }
.info-box { background-color: #1f2937; padding: 1.5rem; border-radius: 10px; border-left: 5px solid #667eea; margin: 1rem 0; }
label { display: block; margin: 1rem 0 0.4rem; font-weight: 600; }
input[type=text], textarea { width: 100%; box-sizing: border-box; border-radius: 10px; border: 2px solid #e0e0e0; padding: 0.75rem; font-size: 1rem; }
input[type=text]:focus, textarea:focus { border-color: #667eea; outline: none; box-shadow: 0 0 0 0.2rem rgba(102, 126, 234, 0.25); }
textarea { height: 200px; }
.caption { color: #9ca3af; font-size: 0.9rem; }
button { width: 100%; margin-top: 1.5rem; background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); color: white; border: none; padding: 0.75rem 2rem; font-size: 1.1rem; font-weight: 600; border-radius: 10px; transition: all 0.3s ease; box-shadow: 0 4px 15px rgba(102, 126, 234, 0.4); cursor: pointer; }
button:hover { transform: translateY(-2px); box-shadow: 0 6px 20px rgba(102, 126, 234, 0.6); }
.category-card { padding: 1.5rem; border-radius: 15px; margin: 1rem 0; box-shadow: 0 4px 6px rgba(0, 0, 0, 0.1); transition: transform 0.3s ease; }
.world-card { background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); color: white; }
.sports-card { background: linear-gradient(135deg, #f093fb 0%, #f5576c 100%); color: white; }
.business-card { background: linear-gradient(135deg, #4facfe 0%, #00f2fe 100%); color: white; }
.tech-card { background: linear-gradient(135deg, #43e97b 0%, #38f9d7 100%); color: white; }
.warning { background: #3b3415; color: #fde68a; padding: 1rem; border-radius: 10px; margin: 1rem 0; }
.error { background: #3e1b1b; color: #fecaca; padding: 1rem; border-radius: 10px; margin: 1rem 0; }
details { margin-top: 1rem; background: #1f2937; border-radius: 10px; padding: 1rem; }
"#;

/// Escapes text for safe inclusion in HTML element content and attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Renders the full page. `article` refills the form after a submission.
pub fn render_page(article: Option<&Article>, outcome: Option<&Outcome>, preview_chars: usize) -> String {
    let mut html = String::with_capacity(8 * 1024);
    let _ = write!(
        html,
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>News Article Classifier</title>
<style>{STYLE}</style>
</head>
<body>
<div class="layout">
{sidebar}
<main class="main">
<div class="header-container">
<h1 style="margin: 0; font-size: 2.5rem;">📰 News Article Classifier</h1>
<p style="margin: 0.5rem 0 0 0; font-size: 1.1rem; opacity: 0.9;">Classify news into categories instantly</p>
</div>
<div class="columns">
{form}
{guide}
</div>
"#,
        sidebar = render_sidebar(),
        form = render_form(article),
        guide = render_guide(),
    );

    if let Some(outcome) = outcome {
        html.push_str(&render_outcome(outcome, article, preview_chars));
    }

    html.push_str("<hr>\n</main>\n</div>\n</body>\n</html>\n");
    html
}

fn render_sidebar() -> String {
    let mut categories = String::new();
    for category in Category::ALL {
        let _ = writeln!(
            categories,
            "<li>{} <strong>{}</strong></li>",
            category.emoji(),
            escape_html(&category_list_name(category))
        );
    }
    format!(
        r#"<aside class="sidebar">
<h3>📊 About This App</h3>
<p>This intelligent classifier analyzes news articles and categorizes them into:</p>
<ul>
{categories}</ul>
<hr>
<h3>🔍 How to Use</h3>
<ol>
<li>Enter the article title</li>
<li>Paste or type the article description</li>
<li>Click "Classify Article" button</li>
<li>Get instant results!</li>
</ol>
<hr>
<h3>💡 Tips</h3>
<ul>
<li>Longer descriptions give better results</li>
<li>Include key details from the article</li>
<li>Try different news sources</li>
</ul>
</aside>"#
    )
}

fn category_list_name(category: Category) -> String {
    match category {
        Category::World => "World News".to_string(),
        other => other.name().to_string(),
    }
}

fn render_form(article: Option<&Article>) -> String {
    let title = article.and_then(|a| a.title.as_deref()).unwrap_or_default();
    let description = article.map(|a| a.description.as_str()).unwrap_or_default();

    let counter = match article {
        Some(article) if !article.description.is_empty() => format!(
            r#"<p class="caption">📝 {} characters | {} words</p>"#,
            article.char_count(),
            article.word_count()
        ),
        _ => String::new(),
    };

    format!(
        r#"<section class="form">
<h3>✍️ Enter Article Details</h3>
<form method="post" action="/classify">
<label for="title">Article Title</label>
<input type="text" id="title" name="title" value="{title}" placeholder="Enter the headline or title of the news article...">
<label for="description">Article Description *</label>
<textarea id="description" name="description" placeholder="Paste or type the main content of the news article here...">{description}</textarea>
{counter}
<button type="submit">🔍 Classify Article</button>
</form>
</section>"#,
        title = escape_html(title),
        description = escape_html(description),
    )
}

fn render_guide() -> String {
    let mut rows = String::new();
    for category in Category::ALL {
        let short = match category {
            Category::SciTech => "Sci/Tech",
            other => other.name(),
        };
        let _ = writeln!(
            rows,
            "<p><strong>{} {}:</strong> {}</p>",
            category.emoji(),
            escape_html(short),
            category.examples()
        );
    }
    format!(
        r#"<section class="guide">
<h3>📌 Quick Guide</h3>
<div class="info-box">
<h4 style="margin-top: 0;">Category Examples:</h4>
{rows}</div>
</section>"#
    )
}

/// Renders the result block for one submission.
pub fn render_outcome(outcome: &Outcome, article: Option<&Article>, preview_chars: usize) -> String {
    match outcome {
        Outcome::Failed(ClassifierError::ValidationError(_)) => {
            r#"<div class="warning">⚠️ Please enter the article description to classify.</div>"#.to_string()
        }
        Outcome::Failed(ClassifierError::ModelUnavailable(msg)) => {
            format!(r#"<div class="error">⚠️ {}</div>"#, escape_html(msg))
        }
        Outcome::Failed(e) => format!(
            r#"<div class="error">❌ An error occurred during classification: {}</div>"#,
            escape_html(&e.to_string())
        ),
        Outcome::Classified(classification) => {
            let mut html = String::from("<hr>\n<h3>🎯 Classification Result</h3>\n");
            match classification.category {
                Some(category) => html.push_str(&render_card(category)),
                None => html.push_str(
                    r#"<div class="warning">⚠️ This article doesn't clearly fit into any of the predefined categories.</div>"#,
                ),
            }
            if let Some(article) = article {
                html.push_str(&render_preview(article, preview_chars));
            }
            html
        }
    }
}

/// Renders the styled card for a category.
pub fn render_card(category: Category) -> String {
    format!(
        r#"<div class="category-card {class}">
<h2 style="margin: 0;">{headline}</h2>
<p style="margin: 0.5rem 0 0 0; font-size: 1.1rem;">{summary}</p>
</div>
"#,
        class = category.css_class(),
        headline = escape_html(&category.headline()),
        summary = category.summary(),
    )
}

fn render_preview(article: &Article, preview_chars: usize) -> String {
    if article.title.is_none() && article.description.is_empty() {
        return String::new();
    }
    let preview = article.preview(preview_chars);
    let mut html = String::from("<details>\n<summary>📄 View Article Preview</summary>\n");
    if let Some(title) = &preview.title {
        let _ = writeln!(html, "<p><strong>Title:</strong> {}</p>", escape_html(title));
    }
    let _ = writeln!(
        html,
        "<p><strong>Description:</strong> {}</p>",
        escape_html(&preview.description)
    );
    html.push_str("</details>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classified(label: i64) -> Outcome {
        Outcome::Classified(Classification {
            label,
            category: Category::from_label(label),
            probabilities: None,
            input: String::new(),
        })
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<script>alert("x") & 'y'</script>"#),
            "&lt;script&gt;alert(&quot;x&quot;) &amp; &#x27;y&#x27;&lt;/script&gt;"
        );
    }

    #[test]
    fn test_empty_page_has_form_and_no_result() {
        let html = render_page(None, None, 300);
        assert!(html.contains(r#"<form method="post" action="/classify">"#));
        assert!(html.contains("Article Description *"));
        assert!(!html.contains("Classification Result"));
        assert!(!html.contains("characters |"));
    }

    #[test]
    fn test_business_card() {
        let article = Article::new("Stocks rallied").with_title("Markets");
        let html = render_page(Some(&article), Some(&classified(3)), 300);
        assert!(html.contains("business-card"));
        assert!(html.contains("📈 Business"));
        assert!(html.contains("<strong>Title:</strong> Markets"));
        assert!(html.contains("📝 14 characters | 2 words"));
    }

    #[test]
    fn test_unclassified_warning() {
        let html = render_outcome(&classified(9), None, 300);
        assert!(html.contains("doesn't clearly fit"));
        assert!(!html.contains("category-card"));
    }

    #[test]
    fn test_failure_messages() {
        let html = render_outcome(
            &Outcome::Failed(ClassifierError::ValidationError("empty".into())),
            None,
            300,
        );
        assert!(html.contains("Please enter the article description"));

        let html = render_outcome(
            &Outcome::Failed(ClassifierError::ModelUnavailable("Model file 'news.onnx' not found.".into())),
            None,
            300,
        );
        assert!(html.contains("news.onnx"));

        let html = render_outcome(
            &Outcome::Failed(ClassifierError::PredictionError("<boom>".into())),
            None,
            300,
        );
        assert!(html.contains("An error occurred during classification: Prediction error: &lt;boom&gt;"));
    }

    #[test]
    fn test_user_text_is_escaped() {
        let article = Article::new("<b>bold</b>").with_title("\"quoted\"");
        let html = render_page(Some(&article), Some(&classified(1)), 300);
        assert!(!html.contains("<b>bold</b>"));
        assert!(html.contains("&lt;b&gt;bold&lt;/b&gt;"));
        assert!(html.contains("value=\"&quot;quoted&quot;\""));
    }
}
