use engine::{QuestionBank, QuestionDef};

const DEFAULT_QUESTIONS: &[(&str, &str, Option<&str>, u32)] = &[
    ("What is 10 + 12?", "22", None, 15),
    ("What is the capital of France?", "Paris", Some("Home of the Eiffel Tower"), 10),
    ("What is 9 x 7?", "63", None, 15),
    ("Which ocean is the largest?", "Pacific", Some("It borders Asia and the Americas"), 10),
    ("What is the capital of Japan?", "Tokyo", None, 10),
    ("How many sides does a hexagon have?", "6", Some("Think of a honeycomb cell"), 5),
    ("Which river flows through Cairo?", "Nile", None, 10),
    ("What is 144 / 12?", "12", None, 15),
    ("What is the capital of Canada?", "Ottawa", Some("It is in Ontario"), 20),
    ("Which continent is Kenya in?", "Africa", None, 5),
];

/// Built-in questions used when the authored bank cannot be loaded.
pub(crate) fn default_question_bank() -> QuestionBank {
    QuestionBank::new(
        DEFAULT_QUESTIONS
            .iter()
            .map(|(prompt, answer, hint, points)| QuestionDef {
                prompt: (*prompt).to_string(),
                answer: (*answer).to_string(),
                hint: hint.map(str::to_string),
                points: *points,
            })
            .collect(),
    )
}
