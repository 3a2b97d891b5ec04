//! Line aggregation and noise filtering
//!
//! Groups token-level OCR output into ordered line records with merged
//! bounding boxes, then drops recognizable watermark/footer noise. The line
//! numbering every later stage sees is the post-filter index.

use std::collections::BTreeMap;

use crate::ocr::{BoundingBox, OcrToken};

/// One printed line of the receipt: concatenated token text and the union
/// bounding box of every token assigned to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub text: String,
    pub bounds: BoundingBox,
}

/// Group tokens by their OCR-assigned line index, in emission order.
///
/// The first token of an index seeds the line; every later token appends a
/// single space plus its text and expands the running bounding box. A token
/// with empty text still contributes its space, preserving column gaps.
/// Output is ordered by increasing line index.
pub fn aggregate_lines(tokens: &[OcrToken]) -> Vec<Line> {
    let mut lines: BTreeMap<usize, Line> = BTreeMap::new();

    for token in tokens {
        match lines.get_mut(&token.line_index) {
            Some(line) => {
                line.text.push(' ');
                line.text.push_str(&token.text);
                line.bounds = line.bounds.union(&token.bounds());
            }
            None => {
                lines.insert(
                    token.line_index,
                    Line {
                        text: token.text.clone(),
                        bounds: token.bounds(),
                    },
                );
            }
        }
    }

    lines.into_values().collect()
}

/// Drop lines that are recognizable non-receipt artifacts.
///
/// A line containing `@` is watermark/URL/email noise. Runs once, after
/// aggregation and before line numbers are exposed to extraction, so the
/// surviving lines renumber densely. Idempotent.
pub fn filter_noise(lines: Vec<Line>) -> Vec<Line> {
    lines.into_iter().filter(|l| !l.text.contains('@')).collect()
}

/// Render the filtered lines the way the extraction service expects them.
pub fn numbered_text(lines: &[Line]) -> String {
    lines
        .iter()
        .enumerate()
        .map(|(i, line)| format!("Line {}: {}", i, line.text))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(text: &str, left: i64, top: i64, width: i64, height: i64, line: usize) -> OcrToken {
        OcrToken {
            text: text.to_string(),
            left,
            top,
            width,
            height,
            line_index: line,
        }
    }

    #[test]
    fn aggregates_tokens_into_ordered_lines() {
        let tokens = vec![
            token("Coffee", 10, 100, 60, 12, 0),
            token("2.50", 200, 101, 30, 11, 0),
            token("Bagel", 10, 120, 50, 12, 1),
            token("1.75", 200, 121, 30, 11, 1),
        ];

        let lines = aggregate_lines(&tokens);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "Coffee 2.50");
        assert_eq!(lines[1].text, "Bagel 1.75");
    }

    #[test]
    fn line_bounds_is_union_of_all_token_bounds() {
        let tokens = vec![
            token("Coffee", 10, 100, 60, 12, 0),
            token("2.50", 200, 98, 30, 16, 0),
        ];

        let lines = aggregate_lines(&tokens);
        let bounds = lines[0].bounds;
        assert_eq!(
            bounds,
            BoundingBox {
                left: 10,
                top: 98,
                right: 230,
                bottom: 114
            }
        );
        for t in &tokens {
            assert!(bounds.contains(&t.bounds()));
        }
    }

    #[test]
    fn interleaved_line_indices_sort_by_index() {
        let tokens = vec![
            token("b", 0, 20, 5, 5, 1),
            token("a", 0, 0, 5, 5, 0),
            token("c", 10, 20, 5, 5, 1),
        ];

        let lines = aggregate_lines(&tokens);
        assert_eq!(lines[0].text, "a");
        assert_eq!(lines[1].text, "b c");
    }

    #[test]
    fn empty_token_contributes_a_space() {
        let tokens = vec![
            token("TOTAL", 0, 0, 50, 10, 0),
            token("", 60, 0, 5, 10, 0),
            token("4.25", 70, 0, 30, 10, 0),
        ];

        let lines = aggregate_lines(&tokens);
        assert_eq!(lines[0].text, "TOTAL  4.25");
    }

    #[test]
    fn noise_filter_drops_at_sign_lines() {
        let lines = vec![
            Line {
                text: "Coffee 2.50".into(),
                bounds: BoundingBox { left: 0, top: 0, right: 1, bottom: 1 },
            },
            Line {
                text: "contact@merchant.com".into(),
                bounds: BoundingBox { left: 0, top: 2, right: 1, bottom: 3 },
            },
        ];

        let filtered = filter_noise(lines);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].text, "Coffee 2.50");
    }

    #[test]
    fn noise_filter_is_idempotent() {
        let lines = vec![
            Line {
                text: "Coffee 2.50".into(),
                bounds: BoundingBox { left: 0, top: 0, right: 1, bottom: 1 },
            },
            Line {
                text: "scanned by receiptly@example.com".into(),
                bounds: BoundingBox { left: 0, top: 2, right: 1, bottom: 3 },
            },
        ];

        let once = filter_noise(lines);
        let twice = filter_noise(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn numbered_text_uses_post_filter_indices() {
        let lines = vec![
            Line {
                text: "Coffee 2.50".into(),
                bounds: BoundingBox { left: 0, top: 0, right: 1, bottom: 1 },
            },
            Line {
                text: "Bagel 1.75".into(),
                bounds: BoundingBox { left: 0, top: 2, right: 1, bottom: 3 },
            },
        ];

        assert_eq!(numbered_text(&lines), "Line 0: Coffee 2.50\nLine 1: Bagel 1.75");
    }
}
