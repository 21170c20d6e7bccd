use super::bank::{Question, QuestionBank};
use super::normalize::normalize;

/// Returns the first question, in stored order, whose normalized text occurs
/// verbatim inside the normalized OCR text.
///
/// Containment rather than equality tolerates OCR noise around the question;
/// the question wording itself must still come through intact. Questions
/// whose text normalizes to nothing never match.
pub fn find_match<'a>(ocr_text: &str, bank: &'a QuestionBank) -> Option<&'a Question> {
    let scanned = normalize(ocr_text);
    if scanned.is_empty() {
        return None;
    }

    bank.normalized_entries()
        .find(|(_, text)| !text.is_empty() && scanned.contains(text))
        .map(|(question, _)| question)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::questions::bank::AnswerOption;

    fn question(id: u64, text: &str) -> Question {
        Question {
            id,
            question_text: text.to_string(),
            answers: vec![AnswerOption {
                id: 1,
                text: "4".to_string(),
                is_correct: true,
            }],
        }
    }

    #[test]
    fn test_match_ignores_case_and_noise() {
        let bank = QuestionBank::new(vec![question(1, "what is 2+2")]);
        let found = find_match("  WHAT IS 2+2 ???", &bank).unwrap();
        assert_eq!(found.id, 1);
        assert!(found.answers[0].is_correct);
    }

    #[test]
    fn test_no_match() {
        let bank = QuestionBank::new(vec![question(1, "what is 2+2")]);
        assert!(find_match("unrelated text", &bank).is_none());
    }

    #[test]
    fn test_empty_bank() {
        assert!(find_match("what is 2+2", &QuestionBank::empty()).is_none());
    }

    #[test]
    fn test_first_match_wins() {
        let bank = QuestionBank::new(vec![
            question(10, "capital of france"),
            question(11, "capital"),
            question(12, "of france"),
        ]);
        assert_eq!(find_match("What is the CAPITAL of\nFrance?", &bank).unwrap().id, 10);

        let bank = QuestionBank::new(vec![question(11, "capital"), question(10, "capital of france")]);
        assert_eq!(find_match("capital of france", &bank).unwrap().id, 11);
    }

    #[test]
    fn test_question_text_is_normalized_too() {
        let bank = QuestionBank::new(vec![question(3, "  Столица\n  РОССИИ ")]);
        assert_eq!(find_match("1. столица россии?", &bank).unwrap().id, 3);
    }

    #[test]
    fn test_line_breaks_inside_question() {
        let bank = QuestionBank::new(vec![question(4, "which planet is closest to the sun")]);
        let ocr = "Which planet is\nclosest to the\nSun?\n\nA) Mercury";
        assert_eq!(find_match(ocr, &bank).unwrap().id, 4);
    }

    #[test]
    fn test_blank_inputs_never_match() {
        let bank = QuestionBank::new(vec![question(1, "   "), question(2, "real question")]);
        assert!(find_match("", &bank).is_none());
        assert!(find_match("anything", &bank).is_none());
        assert_eq!(find_match("a real question here", &bank).unwrap().id, 2);
    }

    #[test]
    fn test_partial_wording_does_not_match() {
        let bank = QuestionBank::new(vec![question(1, "what is 2+2")]);
        assert!(find_match("what is 2 + 2", &bank).is_none());
    }
}
