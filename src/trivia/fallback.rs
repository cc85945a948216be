use crate::trivia::{QuizQuestion, provider::shuffle_options};

/// Built-in question set: prompt, correct answer, incorrect answers.
const FALLBACK_SET: [(&str, &str, [&str; 3]); 4] = [
    (
        "What is the capital of Japan?",
        "Tokyo",
        ["Seoul", "Beijing", "Bangkok"],
    ),
    ("2 + 2 = ?", "4", ["3", "5", "6"]),
    ("Which planet is Red?", "Mars", ["Earth", "Venus", "Jupiter"]),
    (
        "HTML stands for?",
        "Hyper Text Markup Language",
        [
            "High Transfer Machine Language",
            "Hyper Tool Multi Language",
            "None",
        ],
    ),
];

/// Produce the fallback batch with freshly shuffled options.
pub fn questions() -> Vec<QuizQuestion> {
    let mut rng = rand::rng();
    FALLBACK_SET
        .iter()
        .map(|(prompt, correct, incorrect)| {
            let incorrect = incorrect.iter().map(|text| text.to_string()).collect();
            let (options, correct) = shuffle_options(correct.to_string(), incorrect, &mut rng);
            QuizQuestion {
                prompt: prompt.to_string(),
                options,
                correct,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_set_is_playable() {
        let batch = questions();
        assert!(batch.len() >= 2);
        for question in &batch {
            assert!(question.options.len() >= 2);
            assert!(question.correct < question.options.len());
        }
    }

    #[test]
    fn correct_index_points_at_the_known_answer() {
        for question in questions() {
            let expected = FALLBACK_SET
                .iter()
                .find(|(prompt, ..)| *prompt == question.prompt)
                .map(|(_, correct, _)| *correct)
                .unwrap();
            assert_eq!(question.options[question.correct], expected);
        }
    }
}
