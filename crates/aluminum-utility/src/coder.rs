//! Source code helpers: language detection, metrics, lint and diffs

use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// Lines longer than this are reported by `lint`
pub const MAX_LINE_LENGTH: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
    Html,
    Css,
    Java,
    Cpp,
    Ruby,
    Php,
    Swift,
    Go,
    Rust,
}

impl Language {
    pub const ALL: [Language; 12] = [
        Language::Python,
        Language::JavaScript,
        Language::TypeScript,
        Language::Html,
        Language::Css,
        Language::Java,
        Language::Cpp,
        Language::Ruby,
        Language::Php,
        Language::Swift,
        Language::Go,
        Language::Rust,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Html => "html",
            Language::Css => "css",
            Language::Java => "java",
            Language::Cpp => "c++",
            Language::Ruby => "ruby",
            Language::Php => "php",
            Language::Swift => "swift",
            Language::Go => "go",
            Language::Rust => "rust",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Language::Python => ".py",
            Language::JavaScript => ".js",
            Language::TypeScript => ".ts",
            Language::Html => ".html",
            Language::Css => ".css",
            Language::Java => ".java",
            Language::Cpp => ".cpp",
            Language::Ruby => ".rb",
            Language::Php => ".php",
            Language::Swift => ".swift",
            Language::Go => ".go",
            Language::Rust => ".rs",
        }
    }

    fn markers(&self) -> &'static [&'static str] {
        match self {
            Language::Python => &["def ", "import ", "elif ", "self.", "print(", "__init__", "None"],
            Language::JavaScript => &[
                "function ",
                "const ",
                "let ",
                "=>",
                "console.log",
                "document.",
                "require(",
            ],
            Language::TypeScript => &[
                ": string",
                ": number",
                ": boolean",
                "interface ",
                "export type ",
                "readonly ",
            ],
            Language::Html => &["<!DOCTYPE html", "<html", "<head", "<body", "<div", "</"],
            Language::Css => &["color:", "margin:", "padding:", "font-", "@media", "display:"],
            Language::Java => &[
                "public class ",
                "public static void main",
                "System.out.println",
                "private ",
                "import java.",
            ],
            Language::Cpp => &["#include", "std::", "cout", "int main(", "nullptr", "template<"],
            Language::Ruby => &["def ", "puts ", "require '", "attr_accessor", ".each do", "end\n"],
            Language::Php => &["<?php", "$this->", "echo ", "function ", "=> $"],
            Language::Swift => &["func ", "import Foundation", "import UIKit", "guard ", "var "],
            Language::Go => &["package ", "func ", ":=", "fmt.", "import (", "go func"],
            Language::Rust => &["fn ", "let mut ", "impl ", "pub fn", "println!", "use std::", "-> "],
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        let alias = match lowered.as_str() {
            "cpp" => "c++",
            "js" => "javascript",
            "ts" => "typescript",
            "py" => "python",
            "rs" => "rust",
            other => other,
        };
        Language::ALL
            .into_iter()
            .find(|l| l.as_str() == alias)
            .ok_or_else(|| format!("Unknown language: {s}"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodeMetrics {
    pub total_lines: usize,
    pub blank_lines: usize,
    pub comment_lines: usize,
    pub code_lines: usize,
    pub average_line_length: f64,
    pub max_line_length: usize,
    pub max_nesting_depth: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Complexity {
    pub decision_points: usize,
    pub cyclomatic: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LintKind {
    TrailingWhitespace,
    TabIndentation,
    LineTooLong,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LintIssue {
    /// 1-based
    pub line: usize,
    pub kind: LintKind,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiffStats {
    pub files: Vec<String>,
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub insertions: usize,
    pub deletions: usize,
}

const DECISION_KEYWORDS: &[&str] = &[
    "if", "elif", "for", "while", "case", "catch", "except", "and", "or",
];

fn is_comment(trimmed: &str) -> bool {
    if let Some(rest) = trimmed.strip_prefix('#') {
        // Preprocessor directives, shebangs and Rust attributes are code
        return !(rest.starts_with("include")
            || rest.starts_with("define")
            || rest.starts_with('[')
            || rest.starts_with('!'));
    }
    ["//", "/*", "*", "<!--", "--"]
        .iter()
        .any(|prefix| trimmed.starts_with(prefix))
}

fn identifiers(code: &str) -> impl Iterator<Item = &str> {
    code.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|word| !word.is_empty())
}

#[derive(Debug, Clone, Default)]
pub struct CodingUtility {
    snippets: BTreeMap<String, String>,
}

impl CodingUtility {
    pub fn new() -> Self {
        Self::default()
    }

    /// File extension for a language name such as `"python"` or `"c++"`
    pub fn language_extension(&self, language: &str) -> Option<&'static str> {
        language.parse::<Language>().ok().map(|l| l.extension())
    }

    /// Best guess by counting language markers; `None` when nothing matches
    pub fn detect_language(&self, code: &str) -> Option<Language> {
        let mut best: Option<(Language, usize)> = None;
        for language in Language::ALL {
            let score = language
                .markers()
                .iter()
                .filter(|marker| code.contains(*marker))
                .count();
            if score > 0 && best.map_or(true, |(_, top)| score > top) {
                best = Some((language, score));
            }
        }

        tracing::debug!(language = ?best.map(|(l, _)| l), "Detected language");
        best.map(|(language, _)| language)
    }

    pub fn code_metrics(&self, code: &str) -> CodeMetrics {
        let lines: Vec<&str> = code.lines().collect();
        let total_lines = lines.len();
        let blank_lines = lines.iter().filter(|l| l.trim().is_empty()).count();
        let comment_lines = lines.iter().filter(|l| is_comment(l.trim())).count();
        let lengths: Vec<usize> = lines.iter().map(|l| l.chars().count()).collect();

        let mut depth = 0usize;
        let mut max_nesting_depth = 0usize;
        for ch in code.chars() {
            match ch {
                '{' => {
                    depth += 1;
                    max_nesting_depth = max_nesting_depth.max(depth);
                }
                '}' => depth = depth.saturating_sub(1),
                _ => {}
            }
        }

        CodeMetrics {
            total_lines,
            blank_lines,
            comment_lines,
            code_lines: total_lines - blank_lines - comment_lines,
            average_line_length: if total_lines == 0 {
                0.0
            } else {
                lengths.iter().sum::<usize>() as f64 / total_lines as f64
            },
            max_line_length: lengths.iter().copied().max().unwrap_or(0),
            max_nesting_depth,
        }
    }

    pub fn analyze_complexity(&self, code: &str) -> Complexity {
        let keywords = identifiers(code)
            .filter(|word| DECISION_KEYWORDS.contains(word))
            .count();
        let operators = code.matches("&&").count() + code.matches("||").count();
        let decision_points = keywords + operators;

        Complexity {
            decision_points,
            cyclomatic: decision_points + 1,
        }
    }

    pub fn lint(&self, code: &str) -> Vec<LintIssue> {
        let mut issues = Vec::new();
        for (index, line) in code.lines().enumerate() {
            let line_no = index + 1;
            if line.ends_with([' ', '\t']) {
                issues.push(LintIssue {
                    line: line_no,
                    kind: LintKind::TrailingWhitespace,
                    message: "Trailing whitespace".to_string(),
                });
            }
            if line.starts_with('\t') {
                issues.push(LintIssue {
                    line: line_no,
                    kind: LintKind::TabIndentation,
                    message: "Indented with tabs".to_string(),
                });
            }
            let length = line.chars().count();
            if length > MAX_LINE_LENGTH {
                issues.push(LintIssue {
                    line: line_no,
                    kind: LintKind::LineTooLong,
                    message: format!("Line is {length} characters (max {MAX_LINE_LENGTH})"),
                });
            }
        }
        issues
    }

    /// Jaccard similarity of the identifier sets, in [0, 1]
    pub fn similarity(&self, a: &str, b: &str) -> f64 {
        let left: HashSet<&str> = identifiers(a).collect();
        let right: HashSet<&str> = identifiers(b).collect();
        let union = left.union(&right).count();
        if union == 0 {
            return 1.0;
        }
        left.intersection(&right).count() as f64 / union as f64
    }

    pub fn diff_stats(&self, diff: &str) -> DiffStats {
        let mut stats = DiffStats::default();
        let mut old_path: Option<&str> = None;
        // Lines still expected in the current hunk, old side and new side
        let mut hunk: Option<(usize, usize)> = None;

        for line in diff.lines() {
            if line.starts_with("diff --git ") {
                hunk = None;
                old_path = None;
                continue;
            }

            if let Some(range) = line.strip_prefix("@@ ") {
                // Unparseable ranges keep the hunk open until the next file
                hunk = Some(hunk_lengths(range).unwrap_or((usize::MAX, usize::MAX)));
                continue;
            }

            let Some((old_left, new_left)) = hunk.as_mut() else {
                if let Some(path) = line.strip_prefix("--- ") {
                    old_path = Some(path.trim());
                } else if let Some(path) = line.strip_prefix("+++ ") {
                    let new_path = path.trim();
                    match (old_path.take(), new_path) {
                        (Some(old), "/dev/null") => {
                            let name = strip_diff_prefix(old).to_string();
                            stats.removed.push(name.clone());
                            stats.files.push(name);
                        }
                        (Some("/dev/null"), new) => {
                            let name = strip_diff_prefix(new).to_string();
                            stats.added.push(name.clone());
                            stats.files.push(name);
                        }
                        (_, new) => stats.files.push(strip_diff_prefix(new).to_string()),
                    }
                }
                continue;
            };

            match line.as_bytes().first() {
                Some(b'+') => {
                    stats.insertions += 1;
                    *new_left = new_left.saturating_sub(1);
                }
                Some(b'-') => {
                    stats.deletions += 1;
                    *old_left = old_left.saturating_sub(1);
                }
                Some(b'\\') => {}
                _ => {
                    *old_left = old_left.saturating_sub(1);
                    *new_left = new_left.saturating_sub(1);
                }
            }

            if *old_left == 0 && *new_left == 0 {
                hunk = None;
            }
        }

        stats
    }

    /// Summary commit message for a unified diff
    pub fn commit_message(&self, diff: &str) -> String {
        let stats = self.diff_stats(diff);
        let subject = match (stats.files.as_slice(), &stats.added, &stats.removed) {
            ([], _, _) => return "No changes".to_string(),
            ([file], added, _) if !added.is_empty() => format!("Add {file}"),
            ([file], _, removed) if !removed.is_empty() => format!("Remove {file}"),
            ([file], _, _) => format!("Update {file}"),
            (files, _, _) => format!("Update {} files", files.len()),
        };

        format!(
            "{subject}\n\n{} file{} changed, {} insertion{}(+), {} deletion{}(-)",
            stats.files.len(),
            plural(stats.files.len()),
            stats.insertions,
            plural(stats.insertions),
            stats.deletions,
            plural(stats.deletions),
        )
    }

    /// Store a snippet, returning the one it replaced
    pub fn save_snippet(&mut self, name: &str, code: &str) -> Option<String> {
        self.snippets.insert(name.to_string(), code.to_string())
    }

    pub fn snippet(&self, name: &str) -> Option<&str> {
        self.snippets.get(name).map(String::as_str)
    }

    pub fn snippets(&self) -> impl Iterator<Item = (&str, &str)> {
        self.snippets.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Line counts of a hunk header such as `-1,3 +1,4 @@`; an omitted count is 1
fn hunk_lengths(range: &str) -> Option<(usize, usize)> {
    let mut parts = range.split_whitespace();
    let old = parts.next()?.strip_prefix('-')?;
    let new = parts.next()?.strip_prefix('+')?;

    let length = |spec: &str| match spec.split_once(',') {
        Some((_, count)) => count.parse().ok(),
        None => Some(1),
    };
    Some((length(old)?, length(new)?))
}

fn strip_diff_prefix(path: &str) -> &str {
    path.strip_prefix("a/")
        .or_else(|| path.strip_prefix("b/"))
        .unwrap_or(path)
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIFF: &str = "\
diff --git a/src/lib.rs b/src/lib.rs
--- a/src/lib.rs
+++ b/src/lib.rs
@@ -1,3 +1,4 @@
 pub mod a;
-pub mod b;
+pub mod c;
+pub mod d;
";

    #[test]
    fn test_language_extension() {
        let coder = CodingUtility::new();
        assert_eq!(coder.language_extension("Python"), Some(".py"));
        assert_eq!(coder.language_extension("c++"), Some(".cpp"));
        assert_eq!(coder.language_extension("cobol"), None);
    }

    #[test]
    fn test_detect_language() {
        let coder = CodingUtility::new();
        assert_eq!(
            coder.detect_language("def greet(name):\n    print(name)\n"),
            Some(Language::Python)
        );
        assert_eq!(
            coder.detect_language("pub fn main() {\n    let mut x = 1;\n    println!(\"{x}\");\n}"),
            Some(Language::Rust)
        );
        assert_eq!(
            coder.detect_language("<!DOCTYPE html><html><body></body></html>"),
            Some(Language::Html)
        );
        assert_eq!(coder.detect_language("hello world"), None);
    }

    #[test]
    fn test_code_metrics() {
        let code = "// header\nfn main() {\n    if true {\n        run();\n    }\n\n}\n";
        let metrics = CodingUtility::new().code_metrics(code);
        assert_eq!(metrics.total_lines, 7);
        assert_eq!(metrics.blank_lines, 1);
        assert_eq!(metrics.comment_lines, 1);
        assert_eq!(metrics.code_lines, 5);
        assert_eq!(metrics.max_line_length, 14);
        assert_eq!(metrics.max_nesting_depth, 2);
    }

    #[test]
    fn test_preprocessor_is_code() {
        let metrics = CodingUtility::new().code_metrics("#include <stdio.h>\n# comment\n");
        assert_eq!(metrics.comment_lines, 1);
        assert_eq!(metrics.code_lines, 1);
    }

    #[test]
    fn test_complexity() {
        let code = "if a && b { for x in y { } } else if c || d { while z { } }";
        let complexity = CodingUtility::new().analyze_complexity(code);
        assert_eq!(complexity.decision_points, 6);
        assert_eq!(complexity.cyclomatic, 7);
    }

    #[test]
    fn test_lint() {
        let long = "x".repeat(MAX_LINE_LENGTH + 1);
        let code = format!("ok\ntrailing  \n\tindented\n{long}");
        let issues = CodingUtility::new().lint(&code);

        let found: Vec<(usize, LintKind)> = issues.iter().map(|i| (i.line, i.kind)).collect();
        assert_eq!(
            found,
            vec![
                (2, LintKind::TrailingWhitespace),
                (3, LintKind::TabIndentation),
                (4, LintKind::LineTooLong),
            ]
        );
    }

    #[test]
    fn test_similarity() {
        let coder = CodingUtility::new();
        assert_eq!(coder.similarity("", ""), 1.0);
        assert_eq!(coder.similarity("a b", "a b"), 1.0);
        assert_eq!(coder.similarity("a b", "c d"), 0.0);
        assert!((coder.similarity("let x = y;", "let x = z;") - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_commit_message() {
        let coder = CodingUtility::new();
        let stats = coder.diff_stats(DIFF);
        assert_eq!(stats.files, vec!["src/lib.rs"]);
        assert_eq!((stats.insertions, stats.deletions), (2, 1));

        assert_eq!(
            coder.commit_message(DIFF),
            "Update src/lib.rs\n\n1 file changed, 2 insertions(+), 1 deletion(-)"
        );
        assert_eq!(coder.commit_message(""), "No changes");
    }

    #[test]
    fn test_commit_message_new_file() {
        let diff = "--- /dev/null\n+++ b/README.md\n@@ -0,0 +1 @@\n+# Aluminum\n";
        let message = CodingUtility::new().commit_message(diff);
        assert!(message.starts_with("Add README.md\n"));
    }

    #[test]
    fn test_diff_stats_dashes_inside_hunk() {
        // SQL comment lines removed and added look like file headers
        let diff = "\
diff --git a/schema.sql b/schema.sql
--- a/schema.sql
+++ b/schema.sql
@@ -1,3 +1,3 @@
 CREATE TABLE t (id INTEGER);
--- old note
++++ new note
 CREATE INDEX i ON t (id);
--- a/notes.txt
+++ b/notes.txt
@@ -1 +1 @@
-draft
+final
";
        let stats = CodingUtility::new().diff_stats(diff);
        assert_eq!(stats.files, vec!["schema.sql", "notes.txt"]);
        assert!(stats.added.is_empty() && stats.removed.is_empty());
        assert_eq!((stats.insertions, stats.deletions), (2, 2));
    }

    #[test]
    fn test_snippets() {
        let mut coder = CodingUtility::new();
        assert!(coder.save_snippet("hello", "print('hi')").is_none());
        assert_eq!(
            coder.save_snippet("hello", "puts 'hi'").as_deref(),
            Some("print('hi')")
        );
        assert_eq!(coder.snippet("hello"), Some("puts 'hi'"));
        assert_eq!(coder.snippets().count(), 1);
    }
}
