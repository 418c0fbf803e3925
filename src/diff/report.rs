//! Transcript scoring: character diff, word distance, and derived error
//! rates, plus the HTML rendering of one comparison.

use crate::diff::normalize_text;
use crate::error::{Result, SttError};
use dissimilar::Chunk;
use std::path::Path;

/// Comparison of one transcript against its ground truth. All metrics are
/// derived from the two texts at construction; both sides are normalized
/// (punctuation stripped) before diffing, so a transcript that differs only
/// in casing or punctuation scores a clean zero.
#[derive(Debug, Clone)]
pub struct DiffReport {
    pub expected: String,
    pub actual: String,

    pub char_levenshtein: usize,
    pub chars_expected: usize,
    pub words_expected: usize,
    pub chars_actual: usize,
    pub words_actual: usize,
    pub chars_matched: usize,
    pub chars_inserted: usize,
    pub chars_deleted: usize,
    pub word_levenshtein: usize,

    /// Character error rate in percent, one decimal.
    pub cer: f64,
    /// Word error rate in percent, one decimal. Can exceed 100 when the
    /// transcript is much longer than the ground truth.
    pub wer: f64,
    /// Percentage of expected characters found in the transcript.
    pub match_percent: f64,
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Levenshtein distance over a character diff: within each contiguous edit
/// run, paired insertions and deletions count once (as substitutions).
fn diff_levenshtein(chunks: &[Chunk<'_>]) -> usize {
    let mut distance = 0;
    let mut inserted = 0;
    let mut deleted = 0;
    for chunk in chunks {
        match chunk {
            Chunk::Insert(s) => inserted += s.chars().count(),
            Chunk::Delete(s) => deleted += s.chars().count(),
            Chunk::Equal(_) => {
                distance += inserted.max(deleted);
                inserted = 0;
                deleted = 0;
            }
        }
    }
    distance + inserted.max(deleted)
}

/// Word-level Levenshtein distance, two-row DP.
fn word_levenshtein(reference: &[&str], hypothesis: &[&str]) -> usize {
    if reference.is_empty() {
        return hypothesis.len();
    }
    if hypothesis.is_empty() {
        return reference.len();
    }

    let mut prev: Vec<usize> = (0..=hypothesis.len()).collect();
    let mut curr = vec![0usize; hypothesis.len() + 1];

    for (i, ref_word) in reference.iter().enumerate() {
        curr[0] = i + 1;
        for (j, hyp_word) in hypothesis.iter().enumerate() {
            let substitution = prev[j] + usize::from(ref_word != hyp_word);
            curr[j + 1] = substitution.min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[hypothesis.len()]
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn diff_html(chunks: &[Chunk<'_>]) -> String {
    let mut html = String::new();
    for chunk in chunks {
        match chunk {
            Chunk::Equal(s) => {
                html.push_str("<span>");
                html.push_str(&escape_html(s));
                html.push_str("</span>");
            }
            Chunk::Delete(s) => {
                html.push_str("<del style=\"background:#ffe6e6;\">");
                html.push_str(&escape_html(s));
                html.push_str("</del>");
            }
            Chunk::Insert(s) => {
                html.push_str("<ins style=\"background:#e6ffe6;\">");
                html.push_str(&escape_html(s));
                html.push_str("</ins>");
            }
        }
    }
    html
}

impl DiffReport {
    /// Compare `actual` (the transcript) against `expected` (ground truth)
    /// and compute all metrics.
    pub fn compute(expected: &str, actual: &str) -> Self {
        let expected_norm = normalize_text(expected, true);
        let actual_norm = normalize_text(actual, true);

        let chunks = dissimilar::diff(&expected_norm, &actual_norm);

        let mut chars_matched = 0;
        let mut chars_inserted = 0;
        let mut chars_deleted = 0;
        for chunk in &chunks {
            match chunk {
                Chunk::Equal(s) => chars_matched += s.chars().count(),
                Chunk::Insert(s) => chars_inserted += s.chars().count(),
                Chunk::Delete(s) => chars_deleted += s.chars().count(),
            }
        }

        let expected_words: Vec<&str> = expected_norm.split_whitespace().collect();
        let actual_words: Vec<&str> = actual_norm.split_whitespace().collect();

        let char_levenshtein = diff_levenshtein(&chunks);
        let word_distance = word_levenshtein(&expected_words, &actual_words);

        let chars_expected = expected_norm.chars().count();
        let words_expected = expected_words.len();

        let cer = if chars_expected == 0 {
            0.0
        } else {
            round1(char_levenshtein as f64 / chars_expected as f64 * 100.0)
        };
        let wer = if words_expected == 0 {
            0.0
        } else {
            round1(word_distance as f64 / words_expected as f64 * 100.0)
        };
        let match_percent = if chars_expected == 0 {
            100.0
        } else {
            round1(chars_matched as f64 / chars_expected as f64 * 100.0)
        };

        Self {
            expected: expected.to_string(),
            actual: actual.to_string(),
            char_levenshtein,
            chars_expected,
            words_expected,
            chars_actual: actual_norm.chars().count(),
            words_actual: actual_words.len(),
            chars_matched,
            chars_inserted,
            chars_deleted,
            word_levenshtein: word_distance,
            cer,
            wer,
            match_percent,
        }
    }

    /// All numeric metrics as ordered (name, formatted value) pairs. This
    /// is the contract the TSV writer builds its columns from: new metrics
    /// added here appear in reports automatically.
    pub fn metrics(&self) -> Vec<(&'static str, String)> {
        vec![
            ("char_levenshtein", self.char_levenshtein.to_string()),
            ("chars_expected", self.chars_expected.to_string()),
            ("words_expected", self.words_expected.to_string()),
            ("chars_actual", self.chars_actual.to_string()),
            ("words_actual", self.words_actual.to_string()),
            ("chars_matched", self.chars_matched.to_string()),
            ("chars_inserted", self.chars_inserted.to_string()),
            ("chars_deleted", self.chars_deleted.to_string()),
            ("word_levenshtein", self.word_levenshtein.to_string()),
            ("character_error_rate", format!("{:.1}", self.cer)),
            ("word_error_rate", format!("{:.1}", self.wer)),
            ("match_percentage", format!("{:.1}", self.match_percent)),
        ]
    }

    /// Render the comparison as a self-contained HTML document.
    pub fn to_html(&self, title: &str, detail: &str) -> String {
        let expected_norm = normalize_text(&self.expected, true);
        let actual_norm = normalize_text(&self.actual, true);
        let chunks = dissimilar::diff(&expected_norm, &actual_norm);

        format!(
            r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8"/>
  <title>{title}</title>
  <style>
    body {{ font-family: -apple-system, "Segoe UI", Roboto, Arial, sans-serif; margin: 2em; }}
    .hint {{ padding: 10px 12px; border-left: 4px solid #888; background: #f6f6f6;
            margin: 12px 0 18px 0; white-space: pre-wrap; font-family: monospace; font-size: 12px; }}
    .stats {{ display: grid; grid-template-columns: repeat(auto-fit, minmax(180px, 1fr));
             gap: 12px; margin: 16px 0; }}
    .stat {{ padding: 12px; background: #f8f9fa; border: 1px solid #e6e6e6; border-radius: 8px; }}
    .stat-label {{ font-size: 11px; color: #666; text-transform: uppercase; }}
    .stat-value {{ font-size: 20px; font-weight: 600; color: #333; margin-top: 4px; }}
    .stat-detail {{ font-size: 11px; color: #888; margin-top: 2px; }}
    .diff, pre {{ padding: 12px; border: 1px solid #e6e6e6; border-radius: 8px;
                 white-space: pre-wrap; word-break: break-word;
                 font-family: monospace; font-size: 12px; line-height: 1.4; }}
    .diff {{ background: #fff; }}
    pre {{ background: #fafafa; }}
    h2 {{ font-size: 14px; color: #333; margin: 16px 0 8px 0; }}
  </style>
</head>
<body>
  <h1>{title}: {wer:.1}% WER / {cer:.1}% CER</h1>
  <div class="hint">{detail}</div>
  <div class="stats">
    <div class="stat"><div class="stat-label">Word Error Rate</div>
      <div class="stat-value">{wer:.1}%</div>
      <div class="stat-detail">Word Levenshtein: {word_lev}</div></div>
    <div class="stat"><div class="stat-label">Character Error Rate</div>
      <div class="stat-value">{cer:.1}%</div>
      <div class="stat-detail">Char Levenshtein: {char_lev}</div></div>
    <div class="stat"><div class="stat-label">Expected</div>
      <div class="stat-value">{chars_expected} chars</div>
      <div class="stat-detail">{words_expected} words</div></div>
    <div class="stat"><div class="stat-label">Got</div>
      <div class="stat-value">{chars_actual} chars</div>
      <div class="stat-detail">{words_actual} words</div></div>
    <div class="stat"><div class="stat-label">Matched</div>
      <div class="stat-value">{match_percent:.1}%</div>
      <div class="stat-detail">{chars_matched} chars</div></div>
    <div class="stat"><div class="stat-label">Inserted</div>
      <div class="stat-value">{chars_inserted} chars</div>
      <div class="stat-detail">Extra in STT output</div></div>
    <div class="stat"><div class="stat-label">Deleted</div>
      <div class="stat-value">{chars_deleted} chars</div>
      <div class="stat-detail">Missing from STT output</div></div>
  </div>
  <h2>Diff (punctuation, spacing and casing folded; red = deletions, green = insertions)</h2>
  <div class="diff">{diff}</div>
  <h2>Expected (Ground Truth)</h2>
  <pre>{expected}</pre>
  <h2>Got (Result of STT)</h2>
  <pre>{actual}</pre>
</body>
</html>
"#,
            title = escape_html(title),
            detail = escape_html(detail),
            wer = self.wer,
            cer = self.cer,
            word_lev = self.word_levenshtein,
            char_lev = self.char_levenshtein,
            chars_expected = self.chars_expected,
            words_expected = self.words_expected,
            chars_actual = self.chars_actual,
            words_actual = self.words_actual,
            match_percent = self.match_percent,
            chars_matched = self.chars_matched,
            chars_inserted = self.chars_inserted,
            chars_deleted = self.chars_deleted,
            diff = diff_html(&chunks),
            expected = escape_html(&self.expected),
            actual = escape_html(&self.actual),
        )
    }

    /// Write the HTML report, creating parent directories as needed.
    pub fn write_html(&self, path: &Path, title: &str, detail: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_html(title, detail)).map_err(SttError::Io)
    }
}
