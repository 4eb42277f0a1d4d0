// Copyright 2026 the Lithos Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Occlusion culling.
//!
//! Walks the elements front to back, keeping the screen area already hidden
//! by opaque elements. An element is occluded if it lies outside the view
//! area, or if the part of it inside the view area is entirely covered by
//! the union of opaque elements in front of it.

use kurbo::Rect;
use lithos_core::region::Region;
use lithos_core::scene::SceneElement;

/// Removes occluded elements from `elements` and returns them.
///
/// `elements` is bottom to top; both the kept and the returned elements stay
/// in that order.
pub fn filter_occlusions_from(
    elements: &mut Vec<Box<dyn SceneElement>>,
    view_area: Rect,
) -> Vec<Box<dyn SceneElement>> {
    let mut coverage: Vec<Rect> = Vec::new();
    let mut kept = Vec::with_capacity(elements.len());
    let mut occluded = Vec::new();

    for element in elements.drain(..).rev() {
        let renderable = element.renderable();
        let clipped = renderable.screen_rect().intersect(view_area);
        if is_covered(clipped, &coverage) {
            occluded.push(element);
            continue;
        }
        if renderable.is_opaque() {
            coverage.push(clipped);
        }
        kept.push(element);
    }

    kept.reverse();
    occluded.reverse();
    *elements = kept;
    occluded
}

fn is_covered(clipped: Rect, coverage: &[Rect]) -> bool {
    let mut visible = Region::from_rect(clipped);
    for &cover in coverage {
        if visible.is_empty() {
            break;
        }
        visible.subtract(cover);
    }
    visible.is_empty()
}
