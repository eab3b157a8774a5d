//! Lyric timeline builder
//!
//! Derives the lyric display schedule for a song from its timestamped lyric
//! groups. The display shows two lines at a time (top and bottom); while one
//! line is being sung the other is replaced by the next upcoming line.
//!
//! Frame policy:
//! - Title card from 0s until 3s before the first line, when the first line
//!   starts at 3s or later
//! - A 3-2-1-0 countdown ending on the first line, and on every line that
//!   follows a gap of more than 6s
//! - First two lines shown together 3s before the first line starts
//! - After a gap of more than 6s: cooldown from 3s after the previous line
//!   until 3s before the next, then both lines re-seeded at once
//! - Otherwise the finished slot is refilled halfway through the previous
//!   line, alternating top and bottom

use kara_common::lyrics::{parse_lyric_groups, LyricNodeGroup};
use kara_common::Song;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

/// Lead time for the title card, initial lines and cooldown edges (seconds)
pub const LEAD_SECS: f64 = 3.0;

/// Gap between lines that triggers a countdown and a cooldown (seconds)
pub const COOLDOWN_GAP_SECS: f64 = 6.0;

/// First countdown value
pub const COUNTDOWN_FROM: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameKind {
    TitleShow,
    TitleHide,
    Countdown,
    LyricTop,
    LyricBottom,
    CooldownStart,
    CooldownEnd,
}

/// Title card content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleMetadata {
    pub title: String,
    pub artist: String,
    pub charter: String,
    pub lyricist: String,
}

impl TitleMetadata {
    /// Metadata for a song, with placeholders for blank fields
    pub fn from_song(song: &Song) -> Self {
        fn or_unknown(value: &str, placeholder: &str) -> String {
            if value.trim().is_empty() {
                placeholder.to_string()
            } else {
                value.to_string()
            }
        }

        Self {
            title: or_unknown(&song.title, "Unknown title"),
            artist: or_unknown(&song.artist, "Unknown artist"),
            charter: or_unknown(&song.charter, "Unknown charter"),
            lyricist: or_unknown(&song.lyricist, "Unknown lyricist"),
        }
    }
}

/// One scheduled display instruction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LyricFrame {
    pub kind: FrameKind,
    /// Seconds from song start
    pub time: f64,
    /// Index into the song's lyric groups (line frames)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_index: Option<usize>,
    /// 3, 2, 1, 0 (countdown frames)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub countdown_value: Option<u8>,
    /// Title card content (title-show frame)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<TitleMetadata>,
}

impl LyricFrame {
    fn marker(kind: FrameKind, time: f64) -> Self {
        Self {
            kind,
            time,
            line_index: None,
            countdown_value: None,
            metadata: None,
        }
    }

    fn line(slot: LineSlot, time: f64, line_index: usize) -> Self {
        Self {
            line_index: Some(line_index),
            ..Self::marker(slot.frame_kind(), time)
        }
    }

    fn countdown(time: f64, value: u8) -> Self {
        Self {
            countdown_value: Some(value),
            ..Self::marker(FrameKind::Countdown, time)
        }
    }

    fn title_show(metadata: TitleMetadata) -> Self {
        Self {
            metadata: Some(metadata),
            ..Self::marker(FrameKind::TitleShow, 0.0)
        }
    }
}

/// Display slot to refill next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineSlot {
    Top,
    Bottom,
}

impl LineSlot {
    fn frame_kind(self) -> FrameKind {
        match self {
            LineSlot::Top => FrameKind::LyricTop,
            LineSlot::Bottom => FrameKind::LyricBottom,
        }
    }

    fn flip(self) -> Self {
        match self {
            LineSlot::Top => LineSlot::Bottom,
            LineSlot::Bottom => LineSlot::Top,
        }
    }
}

/// A non-empty line with its position in the song's group list
struct Line {
    index: usize,
    start: f64,
    end: f64,
}

impl Line {
    fn midpoint(&self) -> f64 {
        self.start + (self.end - self.start) / 2.0
    }
}

/// Build the display schedule for `groups`
///
/// Output is sorted by time; frames with equal times keep their emission
/// order. Empty groups are skipped, but frames keep referring to lines by
/// their index in `groups`.
pub fn build_lyric_frames(metadata: &TitleMetadata, groups: &[LyricNodeGroup]) -> Vec<LyricFrame> {
    let lines: Vec<Line> = groups
        .iter()
        .enumerate()
        .filter_map(|(index, group)| {
            let (first, last) = (group.first()?, group.last()?);
            Some(Line {
                index,
                start: first.start,
                end: last.end,
            })
        })
        .collect();

    let Some(first) = lines.first() else {
        return Vec::new();
    };

    let lines_shown_at = first.start - LEAD_SECS;
    let mut frames = Vec::with_capacity(lines.len() * 2 + 8);

    if first.start >= LEAD_SECS {
        frames.push(LyricFrame::title_show(metadata.clone()));
        frames.push(LyricFrame::marker(FrameKind::TitleHide, lines_shown_at));
    }

    for (k, line) in lines.iter().enumerate() {
        let needs_countdown = k == 0 || line.start - lines[k - 1].end > COOLDOWN_GAP_SECS;
        if needs_countdown {
            for value in (0..=COUNTDOWN_FROM).rev() {
                frames.push(LyricFrame::countdown(line.start - f64::from(value), value));
            }
        }
    }

    frames.push(LyricFrame::line(LineSlot::Top, lines_shown_at, first.index));
    if let Some(second) = lines.get(1) {
        frames.push(LyricFrame::line(LineSlot::Bottom, lines_shown_at, second.index));
    }

    let mut next_slot = LineSlot::Top;
    let mut k = 1;
    while k < lines.len() {
        let (previous, line) = (&lines[k - 1], &lines[k]);

        if line.start - previous.end > COOLDOWN_GAP_SECS {
            let cooldown_end = line.start - LEAD_SECS;
            frames.push(LyricFrame::marker(FrameKind::CooldownStart, previous.end + LEAD_SECS));
            frames.push(LyricFrame::marker(FrameKind::CooldownEnd, cooldown_end));
            frames.push(LyricFrame::line(LineSlot::Top, cooldown_end, line.index));

            if let Some(next) = lines.get(k + 1) {
                frames.push(LyricFrame::line(LineSlot::Bottom, cooldown_end, next.index));
                k += 1;
            }
            next_slot = LineSlot::Top;
        } else if k >= 2 {
            // Lines 0 and 1 are already on screen
            frames.push(LyricFrame::line(next_slot, previous.midpoint(), line.index));
            next_slot = next_slot.flip();
        }

        k += 1;
    }

    frames.sort_by(|a, b| a.time.total_cmp(&b.time));
    frames
}

/// Read and parse a lyric file
///
/// Any failure yields an empty list; the song plays without lyrics.
pub async fn load_lyric_groups(path: &Path) -> Vec<LyricNodeGroup> {
    let text = match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(e) => {
            warn!("Failed to read lyric file {:?}: {}", path, e);
            return Vec::new();
        }
    };

    match parse_lyric_groups(&text) {
        Ok(groups) => {
            debug!("Loaded {} lyric lines from {:?}", groups.len(), path);
            groups
        }
        Err(e) => {
            warn!("Failed to parse lyrics {:?}: {}", path, e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kara_common::LyricNode;

    fn metadata() -> TitleMetadata {
        TitleMetadata {
            title: "Song".to_string(),
            artist: "Artist".to_string(),
            charter: "Unknown charter".to_string(),
            lyricist: "Unknown lyricist".to_string(),
        }
    }

    fn line(start: f64, end: f64) -> LyricNodeGroup {
        vec![LyricNode::new("la", start, end)]
    }

    fn kinds(frames: &[LyricFrame]) -> Vec<(FrameKind, f64)> {
        frames.iter().map(|f| (f.kind, f.time)).collect()
    }

    #[test]
    fn test_empty_groups() {
        assert!(build_lyric_frames(&metadata(), &[]).is_empty());
    }

    #[test]
    fn test_single_group_at_five_seconds() {
        let frames = build_lyric_frames(&metadata(), &[line(5.0, 6.0)]);

        assert_eq!(
            kinds(&frames),
            vec![
                (FrameKind::TitleShow, 0.0),
                (FrameKind::TitleHide, 2.0),
                (FrameKind::Countdown, 2.0),
                (FrameKind::LyricTop, 2.0),
                (FrameKind::Countdown, 3.0),
                (FrameKind::Countdown, 4.0),
                (FrameKind::Countdown, 5.0),
            ]
        );

        let countdown: Vec<u8> = frames.iter().filter_map(|f| f.countdown_value).collect();
        assert_eq!(countdown, vec![3, 2, 1, 0]);
        assert_eq!(frames[0].metadata, Some(metadata()));
        assert_eq!(frames[3].line_index, Some(0));
        assert!(frames.iter().all(|f| f.kind != FrameKind::LyricBottom));
    }

    #[test]
    fn test_early_first_group_has_no_title() {
        let frames = build_lyric_frames(&metadata(), &[line(1.0, 2.0), line(2.5, 3.0)]);

        assert!(frames
            .iter()
            .all(|f| f.kind != FrameKind::TitleShow && f.kind != FrameKind::TitleHide));
        // Countdown for the first line starts before zero
        assert_eq!(frames[0].kind, FrameKind::Countdown);
        assert_eq!(frames[0].time, -2.0);
    }

    #[test]
    fn test_alternating_lines() {
        let groups = vec![
            line(4.0, 6.0),
            line(6.5, 8.5),
            line(9.0, 11.0),
            line(11.5, 13.5),
            line(14.0, 16.0),
        ];
        let frames = build_lyric_frames(&metadata(), &groups);

        let lines: Vec<(FrameKind, f64, usize)> = frames
            .iter()
            .filter_map(|f| f.line_index.map(|i| (f.kind, f.time, i)))
            .collect();

        assert_eq!(
            lines,
            vec![
                (FrameKind::LyricTop, 1.0, 0),
                (FrameKind::LyricBottom, 1.0, 1),
                (FrameKind::LyricTop, 7.5, 2),
                (FrameKind::LyricBottom, 10.0, 3),
                (FrameKind::LyricTop, 12.5, 4),
            ]
        );
        // Only the first line gets a countdown
        assert_eq!(frames.iter().filter(|f| f.kind == FrameKind::Countdown).count(), 4);
        assert!(frames.iter().all(|f| f.kind != FrameKind::CooldownStart));
    }

    #[test]
    fn test_two_groups_with_long_gap() {
        let groups = vec![line(5.0, 6.0), line(14.0, 15.0)];
        let frames = build_lyric_frames(&metadata(), &groups);

        let cooldown: Vec<(FrameKind, f64)> = frames
            .iter()
            .filter(|f| matches!(f.kind, FrameKind::CooldownStart | FrameKind::CooldownEnd))
            .map(|f| (f.kind, f.time))
            .collect();
        assert_eq!(
            cooldown,
            vec![(FrameKind::CooldownStart, 9.0), (FrameKind::CooldownEnd, 11.0)]
        );

        let reseed: Vec<&LyricFrame> = frames
            .iter()
            .filter(|f| f.line_index.is_some() && f.time == 11.0)
            .collect();
        assert_eq!(reseed.len(), 1);
        assert_eq!(reseed[0].kind, FrameKind::LyricTop);
        assert_eq!(reseed[0].line_index, Some(1));

        // Countdowns for both lines
        assert_eq!(frames.iter().filter(|f| f.kind == FrameKind::Countdown).count(), 8);
    }

    #[test]
    fn test_cooldown_reseeds_both_lines_and_resets_alternation() {
        let groups = vec![
            line(4.0, 6.0),
            line(6.5, 8.5),
            line(20.0, 22.0),
            line(22.5, 24.5),
            line(25.0, 27.0),
            line(27.5, 29.5),
        ];
        let frames = build_lyric_frames(&metadata(), &groups);

        let lines: Vec<(FrameKind, f64, usize)> = frames
            .iter()
            .filter_map(|f| f.line_index.map(|i| (f.kind, f.time, i)))
            .collect();

        assert_eq!(
            lines,
            vec![
                (FrameKind::LyricTop, 1.0, 0),
                (FrameKind::LyricBottom, 1.0, 1),
                (FrameKind::LyricTop, 17.0, 2),
                (FrameKind::LyricBottom, 17.0, 3),
                (FrameKind::LyricTop, 23.5, 4),
                (FrameKind::LyricBottom, 26.0, 5),
            ]
        );

        assert!(frames
            .iter()
            .any(|f| f.kind == FrameKind::CooldownStart && f.time == 11.5));
        assert!(frames
            .iter()
            .any(|f| f.kind == FrameKind::CooldownEnd && f.time == 17.0));
    }

    #[test]
    fn test_empty_groups_are_skipped() {
        let groups = vec![line(4.0, 5.0), Vec::new(), line(6.0, 7.0), line(7.5, 8.0)];
        let frames = build_lyric_frames(&metadata(), &groups);

        let lines: Vec<(FrameKind, f64, usize)> = frames
            .iter()
            .filter_map(|f| f.line_index.map(|i| (f.kind, f.time, i)))
            .collect();

        assert_eq!(
            lines,
            vec![
                (FrameKind::LyricTop, 1.0, 0),
                (FrameKind::LyricBottom, 1.0, 2),
                (FrameKind::LyricTop, 6.5, 3),
            ]
        );
        assert_eq!(frames.iter().filter(|f| f.kind == FrameKind::Countdown).count(), 4);
    }

    #[test]
    fn test_gap_across_empty_group_gets_countdown() {
        let groups = vec![line(4.0, 5.0), Vec::new(), line(20.0, 21.0)];
        let frames = build_lyric_frames(&metadata(), &groups);

        let countdowns: Vec<f64> = frames
            .iter()
            .filter(|f| f.kind == FrameKind::Countdown)
            .map(|f| f.time)
            .collect();
        assert_eq!(countdowns, vec![1.0, 2.0, 3.0, 4.0, 17.0, 18.0, 19.0, 20.0]);

        let cooldown: Vec<(FrameKind, f64)> = kinds(&frames)
            .into_iter()
            .filter(|(kind, _)| matches!(kind, FrameKind::CooldownStart | FrameKind::CooldownEnd))
            .collect();
        assert_eq!(
            cooldown,
            vec![(FrameKind::CooldownStart, 8.0), (FrameKind::CooldownEnd, 17.0)]
        );
    }

    #[test]
    fn test_metadata_placeholders() {
        let song = Song::new("", "Only Title", "");
        let metadata = TitleMetadata::from_song(&song);
        assert_eq!(metadata.title, "Only Title");
        assert_eq!(metadata.artist, "Unknown artist");
        assert_eq!(metadata.charter, "Unknown charter");
        assert_eq!(metadata.lyricist, "Unknown lyricist");
    }

    #[test]
    fn test_frame_serialization() {
        let frames = build_lyric_frames(&metadata(), &[line(5.0, 6.0)]);
        let json = serde_json::to_value(&frames).unwrap();

        assert_eq!(json[0]["kind"], "title_show");
        assert_eq!(json[0]["metadata"]["title"], "Song");
        assert!(json[1].get("line_index").is_none());
    }

    #[tokio::test]
    async fn test_load_missing_lyric_file() {
        let groups = load_lyric_groups(Path::new("/nonexistent/kara/lyrics.json")).await;
        assert!(groups.is_empty());
    }
}
