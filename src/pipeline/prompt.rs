// src/pipeline/prompt.rs
use crate::models::Question;

/// Marker the script uses for the pause before the answer. The renderer keys
/// the on-screen countdown off this exact text.
pub const COUNTDOWN_MARKER: &str = "[COUNTDOWN: 5...4...3...2...1]";
pub const COUNTDOWN_SECONDS: u32 = 5;

/// Build the script-writing prompt for one question.
pub fn build_script_prompt(question: &Question, exam_name: &str) -> String {
    let solution_step = question.solution_text().unwrap_or("Provide a clear explanation");

    let mut prompt = format!(
        "Create an engaging educational video script for this question. Follow this exact structure:

1. Start with: \"Hello everyone, today we are going to solve a question for {exam} entrance exam.\"
2. Say: \"So the question says:\" then read the question statement word by word
3. For MCQ/MSQ questions, read each option clearly: \"Option A: [text], Option B: [text]\" etc.
4. After reading the question and options, say: \"Try solving this question on your own. I'll give you {secs} seconds.\" [PAUSE {secs} SECONDS - indicate with {marker}]
5. Then reveal: \"The answer is: {answer}\"
6. Finally explain the solution: {solution}
7. End with: \"If you are looking for a complete guide for {exam} or more practice questions and guidance, follow and comment {exam} and it will be in your DMs.\"

Question: {statement}
",
        exam = exam_name,
        secs = COUNTDOWN_SECONDS,
        marker = COUNTDOWN_MARKER,
        answer = question.answer,
        solution = solution_step,
        statement = question.question_statement,
    );

    if let Some(options) = question.options_text() {
        prompt.push_str(&format!("Options: {}\n", options));
    }
    prompt.push_str(&format!("Answer: {}\n", question.answer));
    if let Some(solution) = question.solution_text() {
        prompt.push_str(&format!("Solution: {}\n", solution));
    }

    prompt.push_str(
        "\nMake the script conversational, engaging, and suitable for voice-over. \
Use simple language that sounds natural when spoken. \
The script should be read exactly as written by our text-to-speech system.",
    );

    prompt
}
