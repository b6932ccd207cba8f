use std::path::{Path, PathBuf};

use super::{FormRenderer, RenderError, RenderedForm};
use crate::workflows::intervention::scoring::format_measure;
use crate::workflows::intervention::selector::AidFormRequest;

/// Writes aid applications as standalone HTML documents.
#[derive(Debug, Clone)]
pub struct HtmlFormRenderer {
    output_dir: PathBuf,
}

impl HtmlFormRenderer {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Student ids keep same-name students from sharing a file.
    pub fn file_name_for(form: &AidFormRequest) -> String {
        format!(
            "{}_{}_{}.html",
            form.student_id,
            slug(&form.student_name),
            slug(&form.scheme.name)
        )
    }
}

impl FormRenderer for HtmlFormRenderer {
    fn render(&self, form: &AidFormRequest) -> Result<RenderedForm, RenderError> {
        let path = self.output_dir.join(Self::file_name_for(form));
        let io_error = |source| RenderError::Io {
            path: path.display().to_string(),
            source,
        };

        std::fs::create_dir_all(&self.output_dir).map_err(io_error)?;
        std::fs::write(&path, render_form_html(form)).map_err(io_error)?;

        Ok(RenderedForm {
            path,
            content_type: mime::TEXT_HTML_UTF_8.to_string(),
        })
    }
}

fn render_form_html(form: &AidFormRequest) -> String {
    let demographics = &form.demographics;
    let income = demographics
        .family_income
        .map(|income| format!("Rs. {income}"))
        .unwrap_or_else(|| "Not declared".to_string());

    let fields = [
        ("Student name", form.student_name.clone()),
        ("Scheme", form.scheme.name.clone()),
        ("Grade", demographics.grade_level.to_string()),
        ("Annual family income", income),
        ("Category", demographics.caste_category.clone()),
        ("Gender", demographics.gender.clone()),
        (
            "Latest attendance",
            format!("{}%", format_measure(form.metrics.attendance_percent)),
        ),
        (
            "Weakest subject",
            format!(
                "{} ({})",
                form.metrics.academic.weakest_subject,
                format_measure(form.metrics.academic.current_score)
            ),
        ),
    ];

    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\">");
    html.push_str(&format!(
        "<title>{} Application</title></head><body>\n",
        escape_html(&form.scheme.name)
    ));
    html.push_str("<h1>Scholarship Application</h1>\n<table>\n");
    for (label, value) in fields {
        html.push_str(&format!(
            "<tr><th>{label}</th><td>{}</td></tr>\n",
            escape_html(&value)
        ));
    }
    html.push_str("</table>\n<p><strong>Status: URGENT INTERVENTION REQUIRED</strong></p>\n");
    html.push_str("</body></html>\n");
    html
}

fn slug(value: &str) -> String {
    let joined = value
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_");
    if joined.is_empty() {
        "student".to_string()
    } else {
        joined
    }
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::intervention::domain::{Demographics, StudentId, StudentMetrics};
    use crate::workflows::intervention::eligibility::Scheme;

    fn form(name: &str) -> AidFormRequest {
        AidFormRequest {
            student_id: StudentId(7),
            student_name: name.to_string(),
            scheme: Scheme {
                id: 6,
                name: "Rural Education Support Grant".to_string(),
                min_grade: 1,
                max_grade: 12,
                income_limit: 100_000,
                caste_category: "Any".to_string(),
            },
            demographics: Demographics {
                grade_level: 8,
                family_income: Some(45_000),
                caste_category: "OBC".to_string(),
                gender: "Male".to_string(),
            },
            metrics: StudentMetrics::default(),
        }
    }

    #[test]
    fn file_names_are_slugged() {
        assert_eq!(
            HtmlFormRenderer::file_name_for(&form("Raju Kumar")),
            "7_Raju_Kumar_Rural_Education_Support_Grant.html"
        );
        assert_eq!(
            HtmlFormRenderer::file_name_for(&form("../..")),
            "7_student_Rural_Education_Support_Grant.html"
        );
    }

    #[test]
    fn renders_escaped_document_into_output_dir() {
        let dir = tempfile::tempdir().expect("temp dir");
        let renderer = HtmlFormRenderer::new(dir.path().join("forms"));

        let rendered = renderer
            .render(&form("Raju <Kumar>"))
            .expect("form renders");

        assert!(rendered.path.starts_with(dir.path()));
        assert!(rendered.content_type.starts_with("text/html"));
        let body = std::fs::read_to_string(&rendered.path).expect("form readable");
        assert!(body.contains("Raju &lt;Kumar&gt;"));
        assert!(body.contains("Rs. 45000"));
        assert!(body.contains("URGENT INTERVENTION REQUIRED"));
    }

    #[test]
    fn same_name_students_keep_separate_applications() {
        let dir = tempfile::tempdir().expect("temp dir");
        let renderer = HtmlFormRenderer::new(dir.path());

        let mut first = form("Priya Devi");
        first.demographics.family_income = Some(11_111);
        let mut second = form("Priya Devi");
        second.student_id = StudentId(8);
        second.demographics.family_income = Some(22_222);

        let first_path = renderer.render(&first).expect("first form").path;
        let second_path = renderer.render(&second).expect("second form").path;

        assert_ne!(first_path, second_path);
        let first_body = std::fs::read_to_string(&first_path).expect("first readable");
        let second_body = std::fs::read_to_string(&second_path).expect("second readable");
        assert!(first_body.contains("Rs. 11111"));
        assert!(second_body.contains("Rs. 22222"));
    }
}
