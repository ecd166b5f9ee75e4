use async_trait::async_trait;

use super::{StaticWordSource, WordSource};
use crate::types::WordBox;
use crate::{Result, VrduError};

/// Tesseract TSV level for word rows.
pub const TSV_WORD_LEVEL: u32 = 5;
/// Columns in a complete TSV row.
pub const TSV_MIN_FIELDS: usize = 12;

const TSV_HEADER_PREFIX: &str = "level\tpage_num";

/// Largest forward jump in `page_num` accepted between consecutive pages.
/// Skipped pages are kept as empty slots.
pub const TSV_MAX_PAGE_GAP: usize = 1000;

/// Parse one word row. Returns `(page_num, word)` or `None` for rows that are
/// not words, are malformed, or fall below `min_confidence` (0.0-1.0).
fn parse_word_row(line: &str, min_confidence: f64) -> Option<(usize, WordBox)> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < TSV_MIN_FIELDS {
        return None;
    }

    let level = fields[0].parse::<u32>().unwrap_or(0);
    if level != TSV_WORD_LEVEL {
        return None;
    }

    // Tesseract reports -1 for rows without a recognition result.
    let conf = fields[10].parse::<f64>().unwrap_or(-1.0);
    if conf < 0.0 {
        return None;
    }
    let confidence = (conf / 100.0).min(1.0);
    if confidence < min_confidence {
        return None;
    }

    let text = fields[11].trim();
    if text.is_empty() {
        return None;
    }

    let page = fields[1].parse::<usize>().unwrap_or(1).max(1);
    let word = WordBox::new(
        text,
        confidence,
        fields[6].parse().unwrap_or(0.0),
        fields[7].parse().unwrap_or(0.0),
        fields[8].parse().unwrap_or(0.0),
        fields[9].parse().unwrap_or(0.0),
    );

    Some((page, word))
}

fn check_header(tsv_data: &str) -> Result<()> {
    let header = tsv_data.lines().next().unwrap_or("").trim_start_matches('\u{feff}');
    if !header.starts_with(TSV_HEADER_PREFIX) {
        return Err(VrduError::parsing(format!(
            "Not a Tesseract TSV document: expected header starting with '{}'",
            TSV_HEADER_PREFIX.replace('\t', "\\t")
        )));
    }
    Ok(())
}

/// Extract all words from Tesseract TSV output, ignoring page boundaries.
///
/// `min_confidence` is on the 0.0-1.0 scale; Tesseract's 0-100 confidences are
/// normalized before comparison.
pub fn extract_words_from_tsv(tsv_data: &str, min_confidence: f64) -> Result<Vec<WordBox>> {
    check_header(tsv_data)?;

    Ok(tsv_data
        .lines()
        .skip(1)
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .filter_map(|line| parse_word_row(line, min_confidence))
        .map(|(_, word)| word)
        .collect())
}

/// Split Tesseract TSV output into pages of words using the `page_num` column.
///
/// Pages without any surviving word still appear (as empty pages) so page
/// numbers stay aligned with the source document.
pub fn pages_from_tsv(tsv_data: &str, min_confidence: f64) -> Result<Vec<Vec<WordBox>>> {
    check_header(tsv_data)?;

    let mut pages: Vec<Vec<WordBox>> = Vec::new();
    for line in tsv_data.lines().skip(1) {
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }

        // Non-word rows still announce their page, keeping blank pages.
        if let Some(page) = line.split('\t').nth(1).and_then(|p| p.parse::<usize>().ok()) {
            grow_to_page(&mut pages, page)?;
        }

        if let Some((page, word)) = parse_word_row(line, min_confidence) {
            grow_to_page(&mut pages, page)?;
            pages[page - 1].push(word);
        }
    }

    Ok(pages)
}

fn grow_to_page(pages: &mut Vec<Vec<WordBox>>, page: usize) -> Result<()> {
    if page <= pages.len() {
        return Ok(());
    }
    if page - pages.len() > TSV_MAX_PAGE_GAP {
        return Err(VrduError::parsing(format!(
            "TSV page_num {} jumps more than {} pages past page {}",
            page,
            TSV_MAX_PAGE_GAP,
            pages.len()
        )));
    }
    pages.resize_with(page, Vec::new);
    Ok(())
}

/// Word source over Tesseract TSV output.
///
/// The whole file is parsed up front; pages are then served like a
/// [`StaticWordSource`].
pub struct TsvWordSource {
    pages: StaticWordSource,
}

impl TsvWordSource {
    /// # Errors
    ///
    /// Returns `VrduError::Parsing` when the input has no TSV header.
    pub fn parse(tsv_data: &str) -> Result<Self> {
        Ok(Self {
            pages: StaticWordSource::new(pages_from_tsv(tsv_data, 0.0)?),
        })
    }
}

#[async_trait]
impl WordSource for TsvWordSource {
    fn name(&self) -> &str {
        "tesseract_tsv"
    }

    fn page_count(&self) -> usize {
        self.pages.page_count()
    }

    async fn page_words(&self, page: usize) -> Result<Vec<WordBox>> {
        self.pages.page_words(page).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext";

    #[test]
    fn test_extract_words_basic() {
        let tsv = format!(
            "{HEADER}\n5\t1\t0\t0\t0\t0\t100\t50\t80\t30\t95.5\tHello\n5\t1\t0\t0\t0\t1\t190\t50\t70\t30\t92.3\tWorld"
        );

        let words = extract_words_from_tsv(&tsv, 0.0).unwrap();
        assert_eq!(words.len(), 2);

        assert_eq!(words[0].text, "Hello");
        assert_eq!(words[0].x, 100.0);
        assert_eq!(words[0].y, 50.0);
        assert!((words[0].confidence - 0.955).abs() < 1e-9);

        assert_eq!(words[1].text, "World");
        assert_eq!(words[1].x, 190.0);
    }

    #[test]
    fn test_extract_words_confidence_filter() {
        let tsv = format!(
            "{HEADER}\n5\t1\t0\t0\t0\t0\t100\t50\t80\t30\t95.5\tHello\n5\t1\t0\t0\t0\t1\t190\t50\t70\t30\t35.0\tW0rld\n5\t1\t0\t0\t0\t2\t270\t50\t60\t30\t92.3\tTest"
        );

        let words = extract_words_from_tsv(&tsv, 0.40).unwrap();
        assert_eq!(words.len(), 2);
        assert_eq!(words[0].text, "Hello");
        assert_eq!(words[1].text, "Test");
    }

    #[test]
    fn test_extract_words_level_filter() {
        let tsv = format!(
            "{HEADER}\n3\t1\t0\t0\t0\t0\t100\t50\t80\t30\t-1\t\n5\t1\t0\t0\t0\t0\t100\t50\t80\t30\t95.5\tHello\n4\t1\t0\t0\t0\t1\t190\t50\t70\t30\t-1\t"
        );

        let words = extract_words_from_tsv(&tsv, 0.0).unwrap();
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].text, "Hello");
    }

    #[test]
    fn test_extract_words_skips_empty_and_malformed() {
        let tsv = format!(
            "{HEADER}\n5\t1\t0\t0\t0\t0\t100\t50\t80\t30\t95.5\t   \ninvalid line\n5\t1\t0\t0\t0\t1\t190\t50\t70\t30\t92.3\tWorld"
        );

        let words = extract_words_from_tsv(&tsv, 0.0).unwrap();
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].text, "World");
    }

    #[test]
    fn test_missing_header_is_parsing_error() {
        let err = extract_words_from_tsv("5\t1\t0\t0\t0\t0\t100\t50\t80\t30\t95.5\tHello", 0.0).unwrap_err();
        assert!(matches!(err, VrduError::Parsing { .. }));
    }

    #[test]
    fn test_pages_from_tsv_groups_by_page() {
        let tsv = format!(
            "{HEADER}\n\
             1\t1\t0\t0\t0\t0\t0\t0\t2480\t3508\t-1\t\n\
             5\t1\t1\t1\t1\t1\t100\t50\t80\t30\t95\tInvoice\n\
             1\t2\t0\t0\t0\t0\t0\t0\t2480\t3508\t-1\t\n\
             1\t3\t0\t0\t0\t0\t0\t0\t2480\t3508\t-1\t\n\
             5\t3\t1\t1\t1\t1\t100\t50\t80\t30\t91\tTotal\n\
             5\t3\t1\t1\t1\t2\t200\t50\t80\t30\t88\t$45.00"
        );

        let pages = pages_from_tsv(&tsv, 0.0).unwrap();
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0].len(), 1);
        assert!(pages[1].is_empty(), "blank page keeps its slot");
        assert_eq!(pages[2].len(), 2);
        assert_eq!(pages[2][1].text, "$45.00");
    }

    #[test]
    fn test_pages_from_tsv_rejects_runaway_page_num() {
        let tsv = format!("{HEADER}\n5\t99999999999999999\t0\t0\t0\t0\t100\t50\t80\t30\t95\tTotal");
        let err = pages_from_tsv(&tsv, 0.0).unwrap_err();
        assert!(matches!(err, VrduError::Parsing { .. }));

        let tsv = format!("{HEADER}\n1\t5000\t0\t0\t0\t0\t0\t0\t2480\t3508\t-1\t");
        assert!(pages_from_tsv(&tsv, 0.0).is_err());
        assert!(TsvWordSource::parse(&tsv).is_err());
    }

    #[test]
    fn test_pages_from_tsv_keeps_moderate_page_gaps() {
        let tsv = format!("{HEADER}\n5\t1\t0\t0\t0\t0\t10\t10\t40\t10\t90\tCover\n5\t40\t0\t0\t0\t0\t10\t10\t40\t10\t90\tTotal");
        let pages = pages_from_tsv(&tsv, 0.0).unwrap();
        assert_eq!(pages.len(), 40);
        assert_eq!(pages[39][0].text, "Total");
    }

    #[tokio::test]
    async fn test_tsv_word_source_pages() {
        let tsv = format!(
            "{HEADER}\n1\t1\t0\t0\t0\t0\t0\t0\t600\t800\t-1\t\n5\t1\t0\t0\t0\t0\t10\t10\t40\t10\t90\tTotal\n1\t2\t0\t0\t0\t0\t0\t0\t600\t800\t-1\t\n5\t2\t0\t0\t0\t0\t10\t10\t40\t10\t90\tDate"
        );
        let source = TsvWordSource::parse(&tsv).unwrap();

        assert_eq!(source.name(), "tesseract_tsv");
        assert_eq!(source.page_count(), 2);
        assert_eq!(source.page_words(2).await.unwrap()[0].text, "Date");
    }
}
