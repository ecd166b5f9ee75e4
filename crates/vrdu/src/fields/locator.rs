use std::cmp::Ordering;

use ahash::AHashSet;

use crate::core::config::{Direction, DistanceMetric, LocatorConfig};
use crate::layout::PageLayout;
use crate::types::WordBox;

use super::matching::{match_quality, normalize_label, token_count};

/// Slack, in median word heights, for boxes that touch or overlap slightly.
const EDGE_SLACK_RATIO: f64 = 0.25;

/// A label occurrence on the page.
#[derive(Debug, Clone, PartialEq)]
pub struct Anchor {
    /// Word indices of the run, in reading order.
    pub words: Vec<usize>,
    /// Label match quality in `0.0..=1.0`.
    pub quality: f64,
    /// Reading position of the run's first word.
    pub position: usize,
    /// Bounding box of the whole run.
    pub region: WordBox,
}

/// Value chosen for a field on one page.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueMatch {
    pub raw_value: String,
    /// `sqrt(anchor quality × candidate score)`.
    pub confidence: f64,
    pub score: f64,
    pub direction: Direction,
    /// Word indices making up the value, left to right.
    pub words: Vec<usize>,
    pub anchor: Anchor,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Located {
    Found(ValueMatch),
    /// The label was on the page but nothing plausible was near it.
    ValueMissing { anchor_quality: f64 },
    LabelMissing,
}

fn union_region(layout: &PageLayout, words: &[usize]) -> WordBox {
    let mut x0 = f64::INFINITY;
    let mut y0 = f64::INFINITY;
    let mut x1 = f64::NEG_INFINITY;
    let mut y1 = f64::NEG_INFINITY;
    let mut confidence: f64 = 1.0;
    let mut text = String::new();

    for &index in words {
        let word = layout.word(index);
        x0 = x0.min(word.x);
        y0 = y0.min(word.y);
        x1 = x1.max(word.right());
        y1 = y1.max(word.bottom());
        confidence = confidence.min(word.confidence);
        if !text.is_empty() {
            text.push(' ');
        }
        text.push_str(&word.text);
    }

    WordBox::new(text, confidence, x0, y0, x1 - x0, y1 - y0)
}

/// All non-overlapping occurrences of `label` on the page, in reading order.
///
/// Candidates are runs of up to as many consecutive same-row words as the
/// label has tokens. Overlapping runs keep the better match.
pub fn find_anchors(layout: &PageLayout, label: &str, config: &LocatorConfig) -> Vec<Anchor> {
    let order = layout.order().indices();
    let max_run = token_count(label);
    let mut candidates: Vec<(usize, usize, f64)> = Vec::new();

    for start in 0..order.len() {
        let band = layout.band_of(order[start]);
        let mut run_text = String::new();
        let mut best: Option<(usize, f64)> = None;

        for len in 1..=max_run {
            let Some(&index) = order.get(start + len - 1) else {
                break;
            };
            if layout.band_of(index) != band {
                break;
            }
            if len > 1 {
                run_text.push(' ');
            }
            run_text.push_str(&layout.word(index).text);

            if let Some(quality) = match_quality(&run_text, label, config.max_edit_distance)
                && best.is_none_or(|(_, q)| quality >= q)
            {
                best = Some((len, quality));
            }
        }

        if let Some((len, quality)) = best {
            candidates.push((start, len, quality));
        }
    }

    candidates.sort_by(|a, b| b.2.total_cmp(&a.2).then(a.0.cmp(&b.0)));

    let mut taken: AHashSet<usize> = AHashSet::new();
    let mut anchors = Vec::new();
    for (start, len, quality) in candidates {
        if (start..start + len).any(|position| taken.contains(&position)) {
            continue;
        }
        taken.extend(start..start + len);

        let words: Vec<usize> = order[start..start + len].to_vec();
        anchors.push(Anchor {
            region: union_region(layout, &words),
            words,
            quality,
            position: start,
        });
    }

    anchors.sort_by_key(|anchor| anchor.position);
    anchors
}

fn gap_distance(anchor: &WordBox, word: &WordBox, metric: DistanceMetric) -> f64 {
    let dx = (word.x - anchor.right()).max(anchor.x - word.right()).max(0.0);
    let dy = (word.y - anchor.bottom()).max(anchor.y - word.bottom()).max(0.0);
    match metric {
        DistanceMetric::Euclidean => (dx * dx + dy * dy).sqrt(),
        DistanceMetric::Chebyshev => dx.max(dy),
    }
}

struct Geometry<'a> {
    layout: &'a PageLayout,
    slack: f64,
    column_band: f64,
}

impl Geometry<'_> {
    fn same_row(&self, anchor: &Anchor, index: usize, word: &WordBox) -> bool {
        let region = &anchor.region;
        anchor
            .words
            .first()
            .is_some_and(|&first| self.layout.band_of(first) == self.layout.band_of(index))
            || (word.y_center() >= region.y && word.y_center() <= region.bottom())
            || (region.y_center() >= word.y && region.y_center() <= word.bottom())
    }

    fn same_column(&self, region: &WordBox, word: &WordBox) -> bool {
        let center = word.x_center();
        region.x_overlap(word) > 0.0 || (center >= region.x - self.column_band && center <= region.right() + self.column_band)
    }

    fn lies(&self, direction: Direction, anchor: &Anchor, index: usize, word: &WordBox) -> bool {
        let region = &anchor.region;
        match direction {
            Direction::Right => word.x >= region.right() - self.slack && self.same_row(anchor, index, word),
            Direction::Left => word.right() <= region.x + self.slack && self.same_row(anchor, index, word),
            Direction::Below => word.y >= region.bottom() - self.slack && self.same_column(region, word),
            Direction::Above => word.bottom() <= region.y + self.slack && self.same_column(region, word),
        }
    }
}

struct Candidate<'a> {
    anchor: &'a Anchor,
    word: usize,
    direction: Direction,
    score: f64,
}

fn better(layout: &PageLayout, a: &Candidate<'_>, b: &Candidate<'_>) -> Ordering {
    a.score
        .total_cmp(&b.score)
        .then_with(|| layout.position(b.word).cmp(&layout.position(a.word)))
        .then_with(|| b.anchor.position.cmp(&a.anchor.position))
}

/// Extend the winning word with following same-row words that sit close enough
/// to be one value (`12 Jan 2024`, `USD 1,200.00`).
fn join_value(layout: &PageLayout, start: usize, excluded: &AHashSet<usize>, max_gap: f64) -> Vec<usize> {
    let order = layout.order().indices();
    let band = layout.band_of(start);
    let mut words = vec![start];
    let mut right = layout.word(start).right();

    for &next in &order[layout.position(start) + 1..] {
        let word = layout.word(next);
        if excluded.contains(&next) || layout.band_of(next) != band || word.x - right >= max_gap || word.x < right - max_gap {
            break;
        }
        right = right.max(word.right());
        words.push(next);
    }

    words
}

/// Pick the best value near any of `anchors`.
pub fn locate_value(layout: &PageLayout, anchors: &[Anchor], config: &LocatorConfig) -> Option<ValueMatch> {
    let median = layout.graph().median_height();
    let geometry = Geometry {
        layout,
        slack: median * EDGE_SLACK_RATIO,
        column_band: layout.graph().column_band(),
    };

    let anchor_words: AHashSet<usize> = anchors.iter().flat_map(|a| a.words.iter().copied()).collect();
    let mut winner: Option<Candidate<'_>> = None;

    for anchor in anchors {
        for (index, word) in layout.words().iter().enumerate() {
            if anchor_words.contains(&index) || normalize_label(&word.text).is_empty() {
                continue;
            }

            let Some((rank, direction)) = config
                .preferred_directions
                .iter()
                .enumerate()
                .find(|(_, direction)| geometry.lies(**direction, anchor, index, word))
            else {
                continue;
            };

            let gap = gap_distance(&anchor.region, word, config.distance_metric);
            if gap > config.max_radius {
                continue;
            }

            let direction_factor = (1.0 - config.direction_weight).powi(rank as i32);
            let distance_score = 1.0 - gap / config.max_radius;
            let candidate = Candidate {
                anchor,
                word: index,
                direction: *direction,
                score: direction_factor * distance_score * (0.5 + 0.5 * word.confidence),
            };

            if winner
                .as_ref()
                .is_none_or(|current| better(layout, &candidate, current) == Ordering::Greater)
            {
                winner = Some(candidate);
            }
        }
    }

    let winner = winner?;
    let words = join_value(layout, winner.word, &anchor_words, config.join_gap_ratio * median);
    let raw_value = words
        .iter()
        .map(|&i| layout.word(i).text.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    Some(ValueMatch {
        raw_value,
        confidence: (winner.anchor.quality * winner.score).sqrt(),
        score: winner.score,
        direction: winner.direction,
        words,
        anchor: winner.anchor.clone(),
    })
}

/// Find `label` on the page and the value next to it.
pub fn locate_field(layout: &PageLayout, label: &str, config: &LocatorConfig) -> Located {
    let anchors = find_anchors(layout, label, config);
    if anchors.is_empty() {
        return Located::LabelMissing;
    }

    match locate_value(layout, &anchors, config) {
        Some(found) => Located::Found(found),
        None => Located::ValueMissing {
            anchor_quality: anchors.iter().map(|a| a.quality).fold(0.0, f64::max),
        },
    }
}
