//! Lyric file model
//!
//! A lyric file is a JSON array of groups; each group is one sung line made of
//! timestamped nodes (words or syllables).
//!
//! Canonical node shape: `{"t": "text", "s": 1.25, "e": 1.5}` (seconds).
//! The older long-name shape `{"text": "...", "time": 1.25}` carries no end
//! time and is still accepted on read; such nodes end where they start.

use crate::Result;
use serde::{Deserialize, Serialize};

/// One timestamped word or syllable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LyricNode {
    #[serde(rename = "t")]
    pub text: String,
    #[serde(rename = "s")]
    pub start: f64,
    #[serde(rename = "e")]
    pub end: f64,
}

impl LyricNode {
    /// Create a node, clamping `end` so it never precedes `start`
    pub fn new(text: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            text: text.into(),
            start,
            end: end.max(start),
        }
    }
}

/// One displayable sung line
pub type LyricNodeGroup = Vec<LyricNode>;

/// On-disk node accepting both the canonical and the legacy field names
#[derive(Debug, Deserialize)]
struct RawLyricNode {
    #[serde(alias = "text")]
    t: String,
    #[serde(alias = "time", alias = "start")]
    s: f64,
    #[serde(default, alias = "end")]
    e: Option<f64>,
}

impl From<RawLyricNode> for LyricNode {
    fn from(raw: RawLyricNode) -> Self {
        LyricNode::new(raw.t, raw.s, raw.e.unwrap_or(raw.s))
    }
}

/// Parse the JSON text of a lyric file into groups
pub fn parse_lyric_groups(text: &str) -> Result<Vec<LyricNodeGroup>> {
    let raw: Vec<Vec<RawLyricNode>> = serde_json::from_str(text)?;
    Ok(raw
        .into_iter()
        .map(|group| group.into_iter().map(LyricNode::from).collect())
        .collect())
}

/// Lyric text carried by a meta event inside a song's event stream
#[derive(Debug, Clone, PartialEq)]
pub struct TimedText {
    /// Seconds from song start
    pub time: f64,
    pub text: String,
}

fn is_line_break(text: &str) -> bool {
    matches!(text, "\r\n" | "\n" | "\r")
}

/// Group in-stream lyric texts into lines
///
/// A line-break text closes the current line. Each node ends where the next
/// node of its line starts; the last node of a line ends at its own start.
pub fn group_timed_texts(texts: &[TimedText]) -> Vec<LyricNodeGroup> {
    let mut groups: Vec<LyricNodeGroup> = Vec::new();
    let mut current: Vec<&TimedText> = Vec::new();

    for text in texts {
        if is_line_break(&text.text) {
            close_line(&mut current, &mut groups);
        } else {
            current.push(text);
        }
    }
    close_line(&mut current, &mut groups);

    groups
}

fn close_line(line: &mut Vec<&TimedText>, groups: &mut Vec<LyricNodeGroup>) {
    if line.is_empty() {
        return;
    }
    let group = line
        .iter()
        .enumerate()
        .map(|(i, node)| {
            let end = line.get(i + 1).map_or(node.time, |next| next.time);
            LyricNode::new(node.text.clone(), node.time, end)
        })
        .collect();
    groups.push(group);
    line.clear();
}
