use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    geometry::Segment,
    pins::Pin,
    sequencer::Termination,
    Float, Grid,
};

/// Ordered pins to thread, starting from `start_pin`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringArtResult {
    pub start_pin: usize,
    /// Every entry is the far end of the next chord.
    pub sequence: Vec<usize>,
    /// Chords asked for. `sequence` is never longer.
    pub requested: usize,
    pub termination: Termination,
}

impl StringArtResult {
    /// True when fewer chords than requested were drawn. This is a normal outcome.
    pub fn completed_early(&self) -> bool {
        self.termination != Termination::Completed
    }

    /// `(from, to)` pin pairs in drawing order.
    pub fn chords(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        std::iter::once(self.start_pin)
            .chain(self.sequence.iter().copied())
            .zip(self.sequence.iter().copied())
    }

    pub fn build_instructions(&self) -> String {
        let mut instructions = format!("Start at pin {}\n", self.start_pin);
        instructions.extend(
            self.chords()
                .enumerate()
                .map(|(step, (from, to))| format!("{}: {} -> {}\n", step + 1, from, to)),
        );
        if self.completed_early() {
            instructions.push_str(&format!(
                "Stopped after {} of {} chords ({:?})\n",
                self.sequence.len(),
                self.requested,
                self.termination
            ));
        }
        instructions
    }

    pub fn build_svg<S: Float>(
        &self,
        pins: &[Pin<S>],
        grid: Grid,
        line_thickness: S,
    ) -> svg::Document {
        let mut doc = svg::Document::new().set("viewBox", (0, 0, grid.width, grid.height));
        for pin in pins {
            doc = doc.add(
                svg::node::element::Circle::new()
                    .set("cx", pin.position.x)
                    .set("cy", pin.position.y)
                    .set("r", line_thickness * S::TWO)
                    .set("fill", "black"),
            );
        }

        for segment in self.segments(pins) {
            doc = doc.add(
                svg::node::element::Line::new()
                    .set("x1", format!("{:.4}", segment.start.x))
                    .set("y1", format!("{:.4}", segment.start.y))
                    .set("x2", format!("{:.4}", segment.end.x))
                    .set("y2", format!("{:.4}", segment.end.y))
                    .set("stroke", "black")
                    .set("stroke-width", format!("{:.4}", line_thickness))
                    .set("opacity", 1),
            );
        }
        doc
    }

    /// Aliased one pixel wide preview of the chords on a white surface.
    pub fn build_rgb<S: Float>(&self, pins: &[Pin<S>], grid: Grid) -> Result<image::RgbImage> {
        let (Ok(width), Ok(height)) = (u32::try_from(grid.width), u32::try_from(grid.height))
        else {
            return Err(Error::parameter(format!(
                "preview of {}x{} pixels is too big",
                grid.width, grid.height
            )));
        };
        let mut buffer: Vec<u8> = vec![255; grid.len() * 3];
        for segment in self.segments(pins) {
            for idx in grid.get_pixel_indexes_in_segment(segment) {
                buffer[3 * idx..3 * idx + 3].copy_from_slice(&[0, 0, 0]);
            }
        }
        image::RgbImage::from_raw(width, height, buffer)
            .ok_or_else(|| Error::parameter("preview surface has no pixels"))
    }

    fn segments<'a, S: Float>(
        &'a self,
        pins: &'a [Pin<S>],
    ) -> impl Iterator<Item = Segment<S>> + 'a {
        self.chords().filter_map(|(from, to)| {
            Some(Segment::new(pins.get(from)?.position, pins.get(to)?.position))
        })
    }
}
