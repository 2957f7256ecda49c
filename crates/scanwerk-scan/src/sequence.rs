// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page-ordering transforms for simplex scanning of double-sided documents:
// odd pages scanned forward, even pages scanned separately (forward or
// backward), then woven into reading order — plus the inverse transforms
// and a plain reverse.
//
// Every transform is total on any sequence length (0 and 1 are identities)
// and only changes position within the sequence; the acquisition metadata
// on each page is untouched.

use scanwerk_core::options::OrderingMode;
use scanwerk_core::types::Page;

/// Apply the configured ordering transform.
pub fn apply(mode: OrderingMode, pages: Vec<Page>) -> Vec<Page> {
    match mode {
        OrderingMode::None => pages,
        OrderingMode::Reverse => reverse(pages),
        OrderingMode::Interleave => interleave(pages),
        OrderingMode::AltInterleave => alt_interleave(pages),
        OrderingMode::Deinterleave => deinterleave(pages),
        OrderingMode::AltDeinterleave => alt_deinterleave(pages),
    }
}

/// Reverse the full sequence end-to-end.
pub fn reverse(mut pages: Vec<Page>) -> Vec<Page> {
    pages.reverse();
    pages
}

/// Split at the midpoint (front half takes the extra page on odd counts)
/// and weave: F[0], B[0], F[1], B[1], … truncating gracefully when one
/// half runs out.
pub fn interleave(pages: Vec<Page>) -> Vec<Page> {
    let (front, back) = split_halves(pages);
    weave(front.into_iter(), back.into_iter())
}

/// Same split as `interleave`, but the back half is consumed in reverse:
/// F[0], B[last], F[1], B[last-1], … — the order a duplex-unaware feeder
/// produces when the stack is flipped for the second pass.
pub fn alt_interleave(pages: Vec<Page>) -> Vec<Page> {
    let (front, back) = split_halves(pages);
    weave(front.into_iter(), back.into_iter().rev())
}

/// Inverse of `interleave`: even-indexed entries become the front half,
/// odd-indexed entries the back half, both in original relative order.
pub fn deinterleave(pages: Vec<Page>) -> Vec<Page> {
    let (mut front, back) = unweave(pages);
    front.extend(back);
    front
}

/// Inverse of `alt_interleave`: odd-indexed entries are reversed back to
/// forward order before being appended.
pub fn alt_deinterleave(pages: Vec<Page>) -> Vec<Page> {
    let (mut front, mut back) = unweave(pages);
    back.reverse();
    front.append(&mut back);
    front
}

fn split_halves(mut pages: Vec<Page>) -> (Vec<Page>, Vec<Page>) {
    let split = pages.len().div_ceil(2);
    let back = pages.split_off(split);
    (pages, back)
}

fn weave(
    mut front: impl Iterator<Item = Page>,
    mut back: impl Iterator<Item = Page>,
) -> Vec<Page> {
    let mut out = Vec::new();
    loop {
        match (front.next(), back.next()) {
            (None, None) => break,
            (f, b) => {
                out.extend(f);
                out.extend(b);
            }
        }
    }
    out
}

fn unweave(pages: Vec<Page>) -> (Vec<Page>, Vec<Page>) {
    let mut front = Vec::with_capacity(pages.len().div_ceil(2));
    let mut back = Vec::with_capacity(pages.len() / 2);
    for (index, page) in pages.into_iter().enumerate() {
        if index % 2 == 0 {
            front.push(page);
        } else {
            back.push(page);
        }
    }
    (front, back)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanwerk_core::types::{PageContent, PageSource};

    fn pages(n: usize) -> Vec<Page> {
        (1..=n)
            .map(|i| Page::scanned(vec![i as u8], 1, i as u32))
            .collect()
    }

    fn order(pages: &[Page]) -> Vec<u8> {
        pages
            .iter()
            .map(|p| match &p.content {
                PageContent::Raster(bytes) => bytes[0],
                PageContent::Pdf(bytes) => bytes[0],
            })
            .collect()
    }

    #[test]
    fn empty_and_single_are_identities() {
        for mode in [
            OrderingMode::None,
            OrderingMode::Reverse,
            OrderingMode::Interleave,
            OrderingMode::AltInterleave,
            OrderingMode::Deinterleave,
            OrderingMode::AltDeinterleave,
        ] {
            assert!(apply(mode, pages(0)).is_empty());
            assert_eq!(order(&apply(mode, pages(1))), vec![1]);
        }
    }

    #[test]
    fn interleave_even_count() {
        assert_eq!(order(&interleave(pages(4))), vec![1, 3, 2, 4]);
    }

    #[test]
    fn interleave_odd_count_front_takes_extra() {
        assert_eq!(order(&interleave(pages(5))), vec![1, 4, 2, 5, 3]);
    }

    #[test]
    fn alt_interleave_consumes_back_half_reversed() {
        assert_eq!(order(&alt_interleave(pages(4))), vec![1, 4, 2, 3]);
        assert_eq!(order(&alt_interleave(pages(5))), vec![1, 5, 2, 4, 3]);
    }

    #[test]
    fn deinterleave_splits_by_parity() {
        assert_eq!(order(&deinterleave(pages(5))), vec![1, 3, 5, 2, 4]);
    }

    #[test]
    fn reverse_is_involutive() {
        for n in 0..=8 {
            assert_eq!(order(&reverse(reverse(pages(n)))), order(&pages(n)));
        }
    }

    #[test]
    fn deinterleave_inverts_interleave() {
        for n in 0..=8 {
            assert_eq!(order(&deinterleave(interleave(pages(n)))), order(&pages(n)));
        }
    }

    #[test]
    fn alt_deinterleave_inverts_alt_interleave() {
        for n in 0..=8 {
            assert_eq!(
                order(&alt_deinterleave(alt_interleave(pages(n)))),
                order(&pages(n))
            );
        }
    }

    #[test]
    fn acquisition_metadata_survives_reordering() {
        let reordered = alt_interleave(pages(6));
        for page in &reordered {
            match page.source {
                PageSource::Scanned {
                    acquisition,
                    position,
                } => {
                    assert_eq!(acquisition, 1);
                    assert!((1..=6).contains(&position));
                }
                _ => panic!("scanned pages must stay scanned"),
            }
        }
    }
}
