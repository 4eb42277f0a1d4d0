// Copyright 2026 the Lithos Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rectangle-list regions for coverage tests.
//!
//! A [`Region`] is a set of non-overlapping axis-aligned rectangles. The only
//! operations needed by the compositor are subtraction and emptiness, which
//! is enough to decide whether an element is fully covered by the union of
//! the opaque elements in front of it.

use kurbo::Rect;

/// A set of disjoint, non-empty rectangles.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Region {
    rects: Vec<Rect>,
}

impl Region {
    /// Creates an empty region.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a region covering `rect` (empty if `rect` has no area).
    #[must_use]
    pub fn from_rect(rect: Rect) -> Self {
        let rect = rect.abs();
        if rect.is_zero_area() {
            Self::new()
        } else {
            Self { rects: vec![rect] }
        }
    }

    /// Returns `true` if the region covers no area.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// Returns the disjoint rectangles making up this region.
    #[must_use]
    pub fn rects(&self) -> &[Rect] {
        &self.rects
    }

    /// Returns the total covered area.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.rects.iter().map(Rect::area).sum()
    }

    /// Removes `cut` from the region.
    pub fn subtract(&mut self, cut: Rect) {
        let cut = cut.abs();
        if cut.is_zero_area() || self.rects.is_empty() {
            return;
        }
        let mut out = Vec::with_capacity(self.rects.len() + 3);
        for r in self.rects.drain(..) {
            subtract_rect(r, cut, &mut out);
        }
        self.rects = out;
    }
}

/// Pushes the pieces of `r` not covered by `cut`, as up to four bands.
fn subtract_rect(r: Rect, cut: Rect, out: &mut Vec<Rect>) {
    let overlap = r.intersect(cut);
    if overlap.is_zero_area() {
        out.push(r);
        return;
    }

    let mut push = |piece: Rect| {
        if !piece.is_zero_area() {
            out.push(piece);
        }
    };

    // Full-width bands above and below the overlap.
    push(Rect::new(r.x0, r.y0, r.x1, overlap.y0));
    push(Rect::new(r.x0, overlap.y1, r.x1, r.y1));
    // Side pieces within the overlap's vertical span.
    push(Rect::new(r.x0, overlap.y0, overlap.x0, overlap.y1));
    push(Rect::new(overlap.x1, overlap.y0, r.x1, overlap.y1));
}
