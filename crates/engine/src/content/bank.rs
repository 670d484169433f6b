use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDef {
    pub prompt: String,
    pub answer: String,
    #[serde(default)]
    pub hint: Option<String>,
    pub points: u32,
}

/// Ordered question list. Order is the load order of the source files, then
/// document order inside each file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionBank {
    questions: Vec<QuestionDef>,
}

impl QuestionBank {
    pub fn new(questions: Vec<QuestionDef>) -> Self {
        Self { questions }
    }

    pub fn questions(&self) -> &[QuestionDef] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn total_points(&self) -> u64 {
        self.questions
            .iter()
            .map(|question| question.points as u64)
            .sum()
    }
}
