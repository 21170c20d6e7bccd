//! Question bank: the read-only corpus OCR text is matched against.
//!
//! Loaded once per session from a JSON file or URL. A failed load degrades
//! to an empty bank, which simply never matches.

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::Duration;

use super::normalize::normalize;

/// One answer option of a question.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOption {
    pub id: u64,
    pub text: String,
    pub is_correct: bool,
}

/// A question with its ordered answers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: u64,
    pub question_text: String,
    #[serde(default)]
    pub answers: Vec<AnswerOption>,
}

impl Question {
    /// Answers marked correct, in stored order.
    pub fn correct_answers(&self) -> impl Iterator<Item = &AnswerOption> {
        self.answers.iter().filter(|a| a.is_correct)
    }
}

/// Accepted file shapes: a bare array or `{"questions": [...]}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum CorpusFile {
    Wrapped { questions: Vec<Question> },
    Bare(Vec<Question>),
}

/// Ordered, immutable question corpus.
///
/// Normalized question texts are computed once at construction so matching
/// only normalizes the OCR text.
#[derive(Clone, Debug, Default)]
pub struct QuestionBank {
    questions: Vec<Question>,
    normalized: Vec<String>,
}

impl QuestionBank {
    pub fn new(questions: Vec<Question>) -> Self {
        let mut seen = HashSet::new();
        for q in &questions {
            if !seen.insert(q.id) {
                log::warn!("Duplicate question id {} in bank; lookups return the first", q.id);
            }
        }

        let normalized = questions.iter().map(|q| normalize(&q.question_text)).collect();
        Self {
            questions,
            normalized,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Parses a corpus from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let file: CorpusFile = serde_json::from_str(json).context("Invalid question bank JSON")?;
        let questions = match file {
            CorpusFile::Wrapped { questions } => questions,
            CorpusFile::Bare(questions) => questions,
        };
        Ok(Self::new(questions))
    }

    /// Loads a corpus from a file path or an http(s) URL.
    pub fn load(source: &str) -> Result<Self> {
        let json = if source.starts_with("http://") || source.starts_with("https://") {
            fetch(source)?
        } else {
            fs::read_to_string(Path::new(source))
                .with_context(|| format!("Failed to read {}", source))?
        };
        let bank = Self::from_json_str(&json)?;
        log::info!("Loaded {} questions from {}", bank.len(), source);
        Ok(bank)
    }

    /// Loads a corpus, falling back to an empty bank on any failure.
    pub fn load_or_empty(source: &str) -> Self {
        match Self::load(source) {
            Ok(bank) => bank,
            Err(e) => {
                log::error!("Failed to load questions from {}: {:#}", source, e);
                log::warn!("Continuing with an empty question bank; nothing will match");
                Self::empty()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// First question with the given id.
    pub fn get(&self, id: u64) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    /// Questions paired with their normalized text, in stored order.
    pub fn normalized_entries(&self) -> impl Iterator<Item = (&Question, &str)> {
        self.questions
            .iter()
            .zip(self.normalized.iter().map(String::as_str))
    }
}

fn fetch(url: &str) -> Result<String> {
    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()?;

    let response = client
        .get(url)
        .header("User-Agent", "question-scanner")
        .send()
        .with_context(|| format!("Request to {} failed", url))?;

    if !response.status().is_success() {
        return Err(anyhow!("Failed to fetch {}: HTTP {}", url, response.status()));
    }

    Ok(response.text()?)
}
