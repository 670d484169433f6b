use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use roxmltree::{Document, Node};

use super::bank::{QuestionBank, QuestionDef};
use super::hashing::{collect_xml_files, SourceScanError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionErrorCode {
    ReadFile,
    XmlMalformed,
    InvalidRoot,
    UnknownElement,
    UnknownField,
    DuplicateField,
    MissingField,
    InvalidValue,
    DuplicatePrompt,
}

#[derive(Debug, Clone)]
pub struct QuestionCompileError {
    pub code: QuestionErrorCode,
    pub message: String,
    pub file_path: PathBuf,
    pub location: Option<SourceLocation>,
}

impl fmt::Display for QuestionCompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(loc) => write!(
                f,
                "{:?}: {} (file={}, line={}, column={})",
                self.code,
                self.message,
                self.file_path.display(),
                loc.line,
                loc.column
            ),
            None => write!(
                f,
                "{:?}: {} (file={})",
                self.code,
                self.message,
                self.file_path.display()
            ),
        }
    }
}

impl std::error::Error for QuestionCompileError {}

/// Compiles every `*.xml` under `questions_dir` into one bank. A missing
/// directory compiles to an empty bank.
pub fn compile_question_bank(questions_dir: &Path) -> Result<QuestionBank, QuestionCompileError> {
    let xml_files = collect_xml_files(questions_dir).map_err(scan_error)?;
    let mut seen_prompts = HashSet::<String>::new();
    let mut questions = Vec::<QuestionDef>::new();

    for (_, xml_file) in xml_files {
        let raw = fs::read_to_string(&xml_file).map_err(|source| QuestionCompileError {
            code: QuestionErrorCode::ReadFile,
            message: format!("failed to read XML file: {source}"),
            file_path: xml_file.clone(),
            location: None,
        })?;
        for (question, location) in parse_questions_document(&xml_file, &raw)? {
            if !seen_prompts.insert(question.prompt.to_lowercase()) {
                return Err(QuestionCompileError {
                    code: QuestionErrorCode::DuplicatePrompt,
                    message: format!("duplicate question prompt '{}'", question.prompt),
                    file_path: xml_file.clone(),
                    location: Some(location),
                });
            }
            questions.push(question);
        }
    }

    Ok(QuestionBank::new(questions))
}

fn parse_questions_document(
    file_path: &Path,
    raw: &str,
) -> Result<Vec<(QuestionDef, SourceLocation)>, QuestionCompileError> {
    let doc = Document::parse(raw).map_err(|error| QuestionCompileError {
        code: QuestionErrorCode::XmlMalformed,
        message: format!("malformed XML: {error}"),
        file_path: file_path.to_path_buf(),
        location: Some(SourceLocation {
            line: error.pos().row as usize,
            column: error.pos().col as usize,
        }),
    })?;

    let root = doc.root_element();
    if root.tag_name().name() != "Questions" {
        return Err(error_at_node(
            QuestionErrorCode::InvalidRoot,
            "root element must be <Questions>".to_string(),
            file_path,
            &doc,
            root,
        ));
    }

    let mut questions = Vec::new();
    for child in root.children().filter(|node| node.is_element()) {
        if child.tag_name().name() != "Question" {
            return Err(error_at_node(
                QuestionErrorCode::UnknownElement,
                format!(
                    "unsupported element <{}>; expected <Question>",
                    child.tag_name().name()
                ),
                file_path,
                &doc,
                child,
            ));
        }
        let question = parse_question(file_path, &doc, child)?;
        questions.push((question, location_of(&doc, child)));
    }
    Ok(questions)
}

fn parse_question(
    file_path: &Path,
    doc: &Document<'_>,
    node: Node<'_, '_>,
) -> Result<QuestionDef, QuestionCompileError> {
    let mut seen_fields = HashSet::<String>::new();
    let mut prompt: Option<String> = None;
    let mut answer: Option<String> = None;
    let mut hint: Option<String> = None;
    let mut points: Option<u32> = None;

    for field in node.children().filter(|child| child.is_element()) {
        let field_name = field.tag_name().name().to_string();
        if !seen_fields.insert(field_name.clone()) {
            return Err(error_at_node(
                QuestionErrorCode::DuplicateField,
                format!("duplicate field <{}> in <Question>", field_name),
                file_path,
                doc,
                field,
            ));
        }

        match field_name.as_str() {
            "prompt" => prompt = Some(required_text(file_path, doc, field, "prompt")?),
            "answer" => answer = Some(required_text(file_path, doc, field, "answer")?),
            "hint" => hint = Some(required_text(file_path, doc, field, "hint")?),
            "points" => {
                let value = required_text(file_path, doc, field, "points")?;
                let parsed = value.parse::<u32>().ok().filter(|points| *points > 0);
                let Some(parsed) = parsed else {
                    return Err(error_at_node(
                        QuestionErrorCode::InvalidValue,
                        format!("points '{}' must be a positive integer", value),
                        file_path,
                        doc,
                        field,
                    ));
                };
                points = Some(parsed);
            }
            _ => {
                return Err(error_at_node(
                    QuestionErrorCode::UnknownField,
                    format!("unknown field <{}> in <Question>", field_name),
                    file_path,
                    doc,
                    field,
                ))
            }
        }
    }

    let missing = |name: &str| {
        error_at_node(
            QuestionErrorCode::MissingField,
            format!("missing required field <{}> in <Question>", name),
            file_path,
            doc,
            node,
        )
    };
    let prompt = prompt.ok_or_else(|| missing("prompt"))?;
    let answer = answer.ok_or_else(|| missing("answer"))?;
    let points = points.ok_or_else(|| missing("points"))?;

    Ok(QuestionDef {
        prompt,
        answer,
        hint,
        points,
    })
}

fn required_text(
    file_path: &Path,
    doc: &Document<'_>,
    node: Node<'_, '_>,
    field_name: &str,
) -> Result<String, QuestionCompileError> {
    let value = node.text().map(str::trim).unwrap_or_default().to_string();
    if value.is_empty() {
        return Err(error_at_node(
            QuestionErrorCode::MissingField,
            format!("field <{}> must not be empty", field_name),
            file_path,
            doc,
            node,
        ));
    }
    Ok(value)
}

fn location_of(doc: &Document<'_>, node: Node<'_, '_>) -> SourceLocation {
    let pos = doc.text_pos_at(node.range().start);
    SourceLocation {
        line: pos.row as usize,
        column: pos.col as usize,
    }
}

fn error_at_node(
    code: QuestionErrorCode,
    message: String,
    file_path: &Path,
    doc: &Document<'_>,
    node: Node<'_, '_>,
) -> QuestionCompileError {
    QuestionCompileError {
        code,
        message,
        file_path: file_path.to_path_buf(),
        location: Some(location_of(doc, node)),
    }
}

fn scan_error(error: SourceScanError) -> QuestionCompileError {
    let file_path = match &error {
        SourceScanError::ReadDir { path, .. } | SourceScanError::ReadFile { path, .. } => {
            path.clone()
        }
    };
    QuestionCompileError {
        code: QuestionErrorCode::ReadFile,
        message: error.to_string(),
        file_path,
        location: None,
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn write_file(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("mkdir");
        }
        fs::write(path, content).expect("write");
    }

    #[test]
    fn compiles_questions_in_file_then_document_order() {
        let temp = TempDir::new().expect("temp");
        write_file(
            &temp.path().join("b.xml"),
            r#"<Questions>
                <Question><prompt>2 + 2?</prompt><answer>4</answer><points>5</points></Question>
            </Questions>"#,
        );
        write_file(
            &temp.path().join("a.xml"),
            r#"<Questions>
                <Question><prompt>Capital of France?</prompt><answer>Paris</answer><hint>City of light</hint><points>10</points></Question>
                <Question><prompt>Largest ocean?</prompt><answer>Pacific</answer><points>15</points></Question>
            </Questions>"#,
        );

        let bank = compile_question_bank(temp.path()).expect("compile");
        let prompts: Vec<&str> = bank
            .questions()
            .iter()
            .map(|question| question.prompt.as_str())
            .collect();
        assert_eq!(prompts, vec!["Capital of France?", "Largest ocean?", "2 + 2?"]);
        assert_eq!(bank.questions()[0].hint.as_deref(), Some("City of light"));
        assert_eq!(bank.questions()[1].hint, None);
        assert_eq!(bank.total_points(), 30);
    }

    #[test]
    fn missing_directory_is_empty_bank() {
        let temp = TempDir::new().expect("temp");
        let bank = compile_question_bank(&temp.path().join("nope")).expect("compile");
        assert!(bank.is_empty());
    }

    #[test]
    fn missing_answer_reports_file_and_location() {
        let temp = TempDir::new().expect("temp");
        let path = temp.path().join("quiz.xml");
        write_file(
            &path,
            "<Questions>\n  <Question><prompt>Q</prompt><points>1</points></Question>\n</Questions>",
        );
        let err = compile_question_bank(temp.path()).expect_err("err");
        assert_eq!(err.code, QuestionErrorCode::MissingField);
        assert!(err.file_path.ends_with("quiz.xml"));
        assert_eq!(err.location.map(|loc| loc.line), Some(2));
    }

    #[test]
    fn unknown_and_duplicate_fields_error() {
        let temp = TempDir::new().expect("temp");
        write_file(
            &temp.path().join("quiz.xml"),
            r#"<Questions><Question><prompt>Q</prompt><answer>A</answer><points>1</points><mood>x</mood></Question></Questions>"#,
        );
        let err = compile_question_bank(temp.path()).expect_err("err");
        assert_eq!(err.code, QuestionErrorCode::UnknownField);

        write_file(
            &temp.path().join("quiz.xml"),
            r#"<Questions><Question><prompt>Q</prompt><prompt>Q2</prompt><answer>A</answer><points>1</points></Question></Questions>"#,
        );
        let err = compile_question_bank(temp.path()).expect_err("err");
        assert_eq!(err.code, QuestionErrorCode::DuplicateField);
    }

    #[test]
    fn zero_or_non_numeric_points_are_invalid() {
        let temp = TempDir::new().expect("temp");
        for points in ["0", "-3", "ten"] {
            write_file(
                &temp.path().join("quiz.xml"),
                &format!(
                    "<Questions><Question><prompt>Q</prompt><answer>A</answer><points>{points}</points></Question></Questions>"
                ),
            );
            let err = compile_question_bank(temp.path()).expect_err("err");
            assert_eq!(err.code, QuestionErrorCode::InvalidValue, "points={points}");
        }
    }

    #[test]
    fn wrong_root_and_unknown_element_error() {
        let temp = TempDir::new().expect("temp");
        write_file(&temp.path().join("quiz.xml"), "<Defs/>");
        let err = compile_question_bank(temp.path()).expect_err("err");
        assert_eq!(err.code, QuestionErrorCode::InvalidRoot);

        write_file(
            &temp.path().join("quiz.xml"),
            "<Questions><Riddle/></Questions>",
        );
        let err = compile_question_bank(temp.path()).expect_err("err");
        assert_eq!(err.code, QuestionErrorCode::UnknownElement);
    }

    #[test]
    fn malformed_xml_reports_location() {
        let temp = TempDir::new().expect("temp");
        write_file(
            &temp.path().join("quiz.xml"),
            "<Questions><Question><prompt>Q</prompt></Questions>",
        );
        let err = compile_question_bank(temp.path()).expect_err("err");
        assert_eq!(err.code, QuestionErrorCode::XmlMalformed);
        assert!(err.location.is_some());
    }

    #[test]
    fn duplicate_prompt_across_files_errors() {
        let temp = TempDir::new().expect("temp");
        let body = r#"<Questions><Question><prompt>Same?</prompt><answer>A</answer><points>1</points></Question></Questions>"#;
        write_file(&temp.path().join("a.xml"), body);
        write_file(&temp.path().join("b.xml"), &body.replace("Same?", "SAME?"));
        let err = compile_question_bank(temp.path()).expect_err("err");
        assert_eq!(err.code, QuestionErrorCode::DuplicatePrompt);
        assert!(err.file_path.ends_with("b.xml"));
    }
}
