use crate::question_source::QuestionRequest;

/// Render the generation prompt for a request.
#[must_use]
pub fn build_prompt(request: &QuestionRequest) -> String {
    let exclusions = if request.exclude_texts.is_empty() {
        "(none yet)".to_owned()
    } else {
        request.exclude_texts.join(", ")
    };

    format!(
        "Generate {count} engaging, humorous, and moderately difficult multiple-choice trivia \
questions suitable for 7-10 year olds.\n\
Each question should have a clear question and exactly four distinct options (A, B, C, D), \
with one correct answer.\n\
Focus on topics: {topics}.\n\
Questions should be relevant to UK, Europe, or US audiences.\n\
Ensure no direct repeats from the following recent questions: {exclusions}.\n\
Format the output as a JSON object with a 'questions' array of objects, where each object has \
'question', 'options' (an array of objects with 'key' and 'text'), and 'correctAnswerKey' (the \
key of the correct option, e.g., \"A\"). Respond with the JSON only.",
        count = request.count,
        topics = request.topic_hints.trim(),
    )
}
