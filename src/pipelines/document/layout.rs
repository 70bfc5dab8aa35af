// SPDX-License-Identifier: MPL-2.0

//! Page geometry and image placement
//!
//! All values are millimetres with the origin at the top-left corner of the page.

use crate::constants::page;
use serde::{Deserialize, Serialize};

/// Fixed page size with a uniform margin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageGeometry {
    pub width_mm: f64,
    pub height_mm: f64,
    pub margin_mm: f64,
}

impl PageGeometry {
    /// A4 portrait with a 10 mm margin
    pub const A4: PageGeometry = PageGeometry {
        width_mm: page::A4_WIDTH_MM,
        height_mm: page::A4_HEIGHT_MM,
        margin_mm: page::MARGIN_MM,
    };

    pub fn printable_width(&self) -> f64 {
        self.width_mm - 2.0 * self.margin_mm
    }

    pub fn printable_height(&self) -> f64 {
        self.height_mm - 2.0 * self.margin_mm
    }

    /// Check that the printable area is non-empty
    pub fn validate(&self) -> Result<(), String> {
        let finite = [self.width_mm, self.height_mm, self.margin_mm]
            .iter()
            .all(|v| v.is_finite());
        if !finite || self.margin_mm < 0.0 {
            return Err(format!("invalid page geometry {:?}", self));
        }
        if self.printable_width() <= 0.0 || self.printable_height() <= 0.0 {
            return Err(format!(
                "margin {} mm leaves no printable area on a {}x{} mm page",
                self.margin_mm, self.width_mm, self.height_mm
            ));
        }
        Ok(())
    }

    /// Place an image of `width`×`height` pixels on the page
    ///
    /// Scale-to-fit anchored on the printable width; re-anchored on the height
    /// only when the width-anchored result would be too tall. The result is
    /// centered in both axes.
    pub fn fit(&self, width: u32, height: u32) -> PageLayout {
        let printable_width = self.printable_width();
        let printable_height = self.printable_height();
        let ratio = width as f64 / height as f64;

        let mut w = printable_width;
        let mut h = w / ratio;
        if h > printable_height {
            h = printable_height;
            w = h * ratio;
        }

        PageLayout {
            x: self.margin_mm + (printable_width - w) / 2.0,
            y: self.margin_mm + (printable_height - h) / 2.0,
            width: w,
            height: h,
        }
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::A4
    }
}

/// Drawable rectangle for one image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageLayout {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}
