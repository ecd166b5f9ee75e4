//! Shared fixtures for integration tests.

#![allow(dead_code)]

use vrdu::WordBox;

pub const TSV_HEADER: &str =
    "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext";

/// `(page, text, left, top, width)` rows at height 12 and confidence 95.
pub fn tsv(words: &[(usize, &str, u32, u32, u32)]) -> String {
    let mut out = String::from(TSV_HEADER);
    for (n, (page, text, left, top, width)) in words.iter().enumerate() {
        out.push_str(&format!("\n5\t{page}\t1\t1\t1\t{n}\t{left}\t{top}\t{width}\t12\t95\t{text}"));
    }
    out
}

/// Three-page invoice: identifiers on page 1, a total on pages 2 and 3.
pub fn invoice_tsv() -> String {
    tsv(&[
        (1, "Invoice", 10, 50, 50),
        (1, "Number", 65, 50, 55),
        (1, "INV-001", 160, 50, 60),
        (1, "Date", 10, 80, 35),
        (1, "12/01/2024", 160, 80, 80),
        (2, "Total", 10, 100, 40),
        (2, "$45.00", 80, 100, 48),
        (3, "Total", 10, 100, 40),
        (3, "$99.00", 80, 100, 48),
    ])
}

pub fn word(text: &str, x: f64, y: f64, width: f64) -> WordBox {
    WordBox::new(text, 0.95, x, y, width, 10.0)
}

/// Item/Qty/Price table with two data rows.
pub fn item_table() -> Vec<WordBox> {
    vec![
        word("Item", 0.0, 0.0, 40.0),
        word("Qty", 150.0, 0.0, 30.0),
        word("Price", 300.0, 0.0, 40.0),
        word("Widget", 0.0, 20.0, 50.0),
        word("2", 155.0, 20.0, 10.0),
        word("$10.00", 300.0, 20.0, 45.0),
        word("Gadget", 0.0, 40.0, 50.0),
        word("1", 155.0, 40.0, 10.0),
        word("$25.00", 300.0, 40.0, 45.0),
    ]
}
