//! HTML document used as the print source for generated CV PDFs.

use std::fmt::Write;

use crate::cv::models::ProcessedCv;

const STYLE: &str = r#"
  @page { size: A4; margin: 1cm; }
  body {
    font-family: Arial, sans-serif;
    line-height: 1.6;
    color: #333;
    max-width: 100%;
    margin: 0;
    padding: 20px;
  }
  h1, h2 { color: #333; margin-top: 20px; margin-bottom: 10px; }
  h1 { font-size: 24px; border-bottom: 2px solid #333; padding-bottom: 5px; }
  h2 { font-size: 18px; color: #444; }
  ul { padding-left: 20px; margin: 10px 0; }
  p { margin: 8px 0; }
  .experience-item { margin-bottom: 15px; }
  .education-item { margin-bottom: 12px; }
  .recruiter-details {
    margin-top: 10px;
    padding-top: 20px;
    border-top: 1px solid #ddd;
  }
"#;

/// Escapes text for interpolation into HTML element content and attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn title<'a>(custom: Option<&'a String>, default: &'a str) -> String {
    escape_html(
        custom
            .map(String::as_str)
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(default),
    )
}

/// Renders the CV as a standalone HTML page. Empty sections are omitted.
pub fn generate_html(cv: &ProcessedCv) -> String {
    let titles = cv.section_titles.clone().unwrap_or_default();
    let mut body = String::new();

    // Writing to a String cannot fail.
    let _ = writeln!(body, "<h1>{}</h1>", escape_html(&cv.first_name));

    if !cv.objective.trim().is_empty() {
        let _ = writeln!(
            body,
            "<h2>{}</h2>\n<p>{}</p>",
            title(titles.summary.as_ref(), "Summary"),
            escape_html(&cv.objective)
        );
    }

    if !cv.skills.is_empty() {
        let _ = writeln!(body, "<h2>{}</h2>\n<ul>", title(titles.skills.as_ref(), "Skills"));
        for (category, skills) in &cv.skills {
            let _ = writeln!(
                body,
                "<li><strong>{}:</strong> {}</li>",
                escape_html(category),
                escape_html(skills)
            );
        }
        body.push_str("</ul>\n");
    }

    if !cv.experience.is_empty() {
        let _ = writeln!(
            body,
            "<h2>{}</h2>",
            title(titles.experience.as_ref(), "Experience")
        );
        for exp in &cv.experience {
            let _ = writeln!(
                body,
                "<div class=\"experience-item\">\n<p><strong>{}</strong></p>\n<p>{} | {}</p>",
                escape_html(&exp.position),
                escape_html(&exp.company),
                escape_html(&exp.period)
            );
            if !exp.responsibilities.is_empty() {
                body.push_str("<ul>\n");
                for resp in &exp.responsibilities {
                    let _ = writeln!(body, "<li>{}</li>", escape_html(resp));
                }
                body.push_str("</ul>\n");
            }
            body.push_str("</div>\n");
        }
    }

    if !cv.education.is_empty() {
        let _ = writeln!(
            body,
            "<h2>{}</h2>",
            title(titles.education.as_ref(), "Education")
        );
        for edu in &cv.education {
            let _ = writeln!(
                body,
                "<div class=\"education-item\">\n<p><strong>{}</strong></p>\n<p>{} - {}</p>\n</div>",
                escape_html(&edu.qualification),
                escape_html(&edu.institution),
                escape_html(&edu.completion_date)
            );
        }
    }

    if let Some(details) = cv.recruiter_details.as_deref().filter(|d| !d.trim().is_empty()) {
        let _ = writeln!(
            body,
            "<div class=\"recruiter-details\">\n<h2>{}</h2>\n<p>{}</p>\n</div>",
            title(titles.recruiter_details.as_ref(), "Recruiter Details"),
            escape_html(details).replace('\n', "<br/>")
        );
    }

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<style>{STYLE}</style>\n</head>\n<body>\n{body}</body>\n</html>\n"
    )
}
