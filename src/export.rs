// src/export.rs
//
// Serializers for the question list (JSON / CSV / XML / QTI 2.1 /
// Moodle XML) and the matching JSON/CSV importers. All formats are plain
// in-memory string builds; nothing here streams.

use std::str::FromStr;

use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use crate::error::AppError;
use crate::models::question::Question;

/// Supported export targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
    Xml,
    Qti,
    Moodle,
}

impl ExportFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Csv => "text/csv",
            ExportFormat::Xml | ExportFormat::Qti | ExportFormat::Moodle => "application/xml",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            "xml" => Ok(ExportFormat::Xml),
            "qti" => Ok(ExportFormat::Qti),
            "moodle" => Ok(ExportFormat::Moodle),
            // The authoring UI advertised Excel; the converter never shipped.
            "excel" | "xlsx" => Err(AppError::NotImplemented(
                "Excel export is not implemented".to_string(),
            )),
            other => Err(AppError::BadRequest(format!(
                "Unknown export format '{}'",
                other
            ))),
        }
    }
}

pub fn export(format: ExportFormat, questions: &[Question]) -> Result<String, AppError> {
    Ok(match format {
        ExportFormat::Json => to_json(questions)?,
        ExportFormat::Csv => to_csv(questions),
        ExportFormat::Xml => to_xml(questions),
        ExportFormat::Qti => to_qti(questions),
        ExportFormat::Moodle => to_moodle_xml(questions),
    })
}

/// JSON export wraps the rows in a metadata envelope.
pub fn to_json(questions: &[Question]) -> Result<String, AppError> {
    let doc = json!({
        "metadata": {
            "export_date": Utc::now().to_rfc3339(),
            "version": "2.0",
            "total_questions": questions.len(),
        },
        "questions": questions,
    });
    serde_json::to_string_pretty(&doc).map_err(|e| AppError::InternalServerError(e.to_string()))
}

const CSV_HEADERS: [&str; 10] = [
    "id",
    "subject",
    "title",
    "difficulty",
    "question_text",
    "choices",
    "correct_answer",
    "explanation",
    "tags",
    "created_at",
];

pub fn to_csv(questions: &[Question]) -> String {
    let mut out = String::new();
    out.push_str(&CSV_HEADERS.join(","));
    out.push('\n');

    for q in questions {
        let choices = q
            .choices
            .as_ref()
            .map(|c| c.0.join("; "))
            .unwrap_or_default();
        let tags = q.tags.as_ref().map(|t| t.0.join(";")).unwrap_or_default();

        let row = [
            q.id.to_string(),
            q.subject.clone(),
            q.title.clone(),
            q.difficulty.clone(),
            q.question_text.clone(),
            choices,
            q.correct_answer.clone(),
            q.explanation.clone().unwrap_or_default(),
            tags,
            q.created_at.clone(),
        ];

        let escaped: Vec<String> = row.iter().map(|cell| escape_csv(cell)).collect();
        out.push_str(&escaped.join(","));
        out.push('\n');
    }

    out
}

pub fn to_xml(questions: &[Question]) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<questionbank>\n");

    xml.push_str("  <metadata>\n");
    xml.push_str(&format!(
        "    <exportDate>{}</exportDate>\n",
        Utc::now().to_rfc3339()
    ));
    xml.push_str("    <version>2.0</version>\n");
    xml.push_str(&format!(
        "    <totalQuestions>{}</totalQuestions>\n",
        questions.len()
    ));
    xml.push_str("  </metadata>\n");

    for q in questions {
        xml.push_str("  <question>\n");
        xml.push_str(&format!("    <id>{}</id>\n", q.id));
        xml.push_str(&format!("    <subject>{}</subject>\n", escape_xml(&q.subject)));
        xml.push_str(&format!("    <title>{}</title>\n", escape_xml(&q.title)));
        xml.push_str(&format!(
            "    <difficulty>{}</difficulty>\n",
            escape_xml(&q.difficulty)
        ));
        xml.push_str(&format!(
            "    <questionText>{}</questionText>\n",
            escape_xml(&q.question_text)
        ));

        if let Some(choices) = &q.choices {
            xml.push_str("    <choices>\n");
            for (i, choice) in choices.0.iter().enumerate() {
                xml.push_str(&format!(
                    "      <choice index=\"{}\">{}</choice>\n",
                    i,
                    escape_xml(choice)
                ));
            }
            xml.push_str("    </choices>\n");
        }

        xml.push_str(&format!(
            "    <correctAnswer>{}</correctAnswer>\n",
            escape_xml(&q.correct_answer)
        ));

        if let Some(explanation) = &q.explanation {
            xml.push_str(&format!(
                "    <explanation>{}</explanation>\n",
                escape_xml(explanation)
            ));
        }

        if let Some(tags) = &q.tags {
            xml.push_str("    <tags>\n");
            for tag in &tags.0 {
                xml.push_str(&format!("      <tag>{}</tag>\n", escape_xml(tag)));
            }
            xml.push_str("    </tags>\n");
        }

        xml.push_str("  </question>\n");
    }

    xml.push_str("</questionbank>");
    xml
}

/// QTI 2.1 export. Only choice questions carry a response declaration.
pub fn to_qti(questions: &[Question]) -> String {
    let mut qti = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    qti.push_str("<questestinterop xmlns=\"http://www.imsglobal.org/xsd/ims_qtiasiv1p2\">\n");
    qti.push_str("  <assessment ident=\"QB_EXPORT\" title=\"Question Bank Export\">\n");

    for (index, q) in questions.iter().enumerate() {
        qti.push_str(&format!("    <section ident=\"S{}\">\n", index));
        qti.push_str(&format!(
            "      <item ident=\"{}\" title=\"{}\">\n",
            q.id,
            escape_xml(&q.subject)
        ));

        qti.push_str("        <material>\n");
        qti.push_str(&format!(
            "          <mattext texttype=\"text/plain\">{}</mattext>\n",
            escape_xml(&q.question_text)
        ));
        qti.push_str("        </material>\n");

        if let Some(choices) = &q.choices {
            qti.push_str("        <response_lid ident=\"response\" rcardinality=\"Single\">\n");
            qti.push_str("          <render_choice>\n");
            for (i, choice) in choices.0.iter().enumerate() {
                qti.push_str(&format!("            <response_label ident=\"{}\">\n", i));
                qti.push_str("              <material>\n");
                qti.push_str(&format!(
                    "                <mattext texttype=\"text/plain\">{}</mattext>\n",
                    escape_xml(choice)
                ));
                qti.push_str("              </material>\n");
                qti.push_str("            </response_label>\n");
            }
            qti.push_str("          </render_choice>\n");
            qti.push_str("          <respcondition>\n");
            qti.push_str("            <conditionvar>\n");
            qti.push_str(&format!(
                "              <varequal respident=\"response\">{}</varequal>\n",
                escape_xml(&q.correct_answer)
            ));
            qti.push_str("            </conditionvar>\n");
            qti.push_str("            <setvar action=\"Set\">100</setvar>\n");
            qti.push_str("          </respcondition>\n");
            qti.push_str("        </response_lid>\n");
        }

        qti.push_str("      </item>\n");
        qti.push_str("    </section>\n");
    }

    qti.push_str("  </assessment>\n</questestinterop>");
    qti
}

pub fn to_moodle_xml(questions: &[Question]) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<quiz>\n");

    for q in questions {
        xml.push_str("  <question type=\"multichoice\">\n");
        xml.push_str("    <name>\n");
        xml.push_str(&format!("      <text>{}</text>\n", q.id));
        xml.push_str("    </name>\n");
        xml.push_str("    <questiontext format=\"html\">\n");
        xml.push_str(&format!(
            "      <text><![CDATA[{}]]></text>\n",
            q.question_text
        ));
        xml.push_str("    </questiontext>\n");

        if let Some(choices) = &q.choices {
            for choice in &choices.0 {
                let fraction = if *choice == q.correct_answer { "100" } else { "0" };
                xml.push_str(&format!(
                    "    <answer fraction=\"{}\" format=\"html\">\n",
                    fraction
                ));
                xml.push_str(&format!("      <text><![CDATA[{}]]></text>\n", choice));
                xml.push_str("      <feedback><text></text></feedback>\n");
                xml.push_str("    </answer>\n");
            }
        }

        xml.push_str("    <generalfeedback>\n");
        xml.push_str(&format!(
            "      <text>{}</text>\n",
            escape_xml(q.explanation.as_deref().unwrap_or(""))
        ));
        xml.push_str("    </generalfeedback>\n");

        if let Some(tags) = &q.tags {
            xml.push_str("    <tags>\n");
            for tag in &tags.0 {
                xml.push_str("      <tag>\n");
                xml.push_str(&format!("        <text>{}</text>\n", escape_xml(tag)));
                xml.push_str("      </tag>\n");
            }
            xml.push_str("    </tags>\n");
        }

        xml.push_str("  </question>\n");
    }

    xml.push_str("</quiz>");
    xml
}

/// Question shape accepted by the importers. Extra fields in the source
/// document are ignored; `id` is kept only so round-trips can be checked.
#[derive(Debug, Clone, Deserialize)]
pub struct ImportedQuestion {
    pub id: Option<i64>,
    pub subject: Option<String>,
    pub title: Option<String>,
    pub question_text: Option<String>,
    pub choices: Option<Vec<String>>,
    pub correct_answer: Option<String>,
    pub explanation: Option<String>,
    pub difficulty: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Parses a JSON export: either the metadata envelope or a bare array.
pub fn from_json(content: &str) -> Result<Vec<ImportedQuestion>, AppError> {
    let value: serde_json::Value = serde_json::from_str(content)?;
    let questions = match value {
        serde_json::Value::Array(_) => value,
        serde_json::Value::Object(mut map) => map
            .remove("questions")
            .ok_or_else(|| AppError::BadRequest("Missing 'questions' array".to_string()))?,
        _ => return Err(AppError::BadRequest("Unrecognized JSON document".to_string())),
    };
    Ok(serde_json::from_value(questions)?)
}

/// Parses a CSV export produced by `to_csv` (or a compatible sheet with
/// the same headers).
pub fn from_csv(content: &str) -> Result<Vec<ImportedQuestion>, AppError> {
    let mut lines = content.lines();
    let header_line = lines
        .next()
        .ok_or_else(|| AppError::BadRequest("CSV is empty".to_string()))?;
    let headers: Vec<String> = split_csv_line(header_line)
        .into_iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut questions = Vec::new();
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        let values = split_csv_line(line);
        let field = |name: &str| -> Option<String> {
            let idx = headers.iter().position(|h| h == name)?;
            values.get(idx).filter(|v| !v.is_empty()).cloned()
        };

        questions.push(ImportedQuestion {
            id: field("id").and_then(|v| v.parse().ok()),
            subject: field("subject"),
            title: field("title"),
            question_text: field("question_text"),
            choices: field("choices")
                .map(|v| v.split("; ").map(|s| s.to_string()).collect()),
            correct_answer: field("correct_answer"),
            explanation: field("explanation"),
            difficulty: field("difficulty"),
            tags: field("tags").map(|v| v.split(';').map(|s| s.to_string()).collect()),
        });
    }

    Ok(questions)
}

fn escape_csv(text: &str) -> String {
    if text.contains(',') || text.contains('"') || text.contains('\n') {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text.to_string()
    }
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Splits one CSV record into fields, honoring quoted cells with
/// doubled-quote escapes. Embedded newlines are not supported; the
/// exporter never produces them unescaped.
fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut current));
            }
            other => current.push(other),
        }
    }
    fields.push(current);
    fields
}
