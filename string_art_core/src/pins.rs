use std::str::FromStr;

use num_traits::AsPrimitive;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    geometry::Point,
    verboser::{Message, Silent, Verboser},
    Float,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Shape {
    /// Ellipse inscribed in the output surface. A circle when the surface is square.
    Circle,
    /// Rectangle inscribed in the output surface. A square when the surface is square.
    Square,
}

impl FromStr for Shape {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "circle" | "ellipse" => Ok(Shape::Circle),
            "square" | "rectangle" => Ok(Shape::Square),
            other => Err(Error::parameter(format!("unknown pin shape '{other}'"))),
        }
    }
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Shape::Circle => write!(f, "Circle"),
            Shape::Square => write!(f, "Square"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pin<S> {
    pub index: usize,
    pub position: Point<S>,
}

impl<S> Pin<S> {
    pub fn new(index: usize, x: S, y: S) -> Self {
        Self {
            index,
            position: Point { x, y },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PinLayout<S> {
    pub shape: Shape,
    pub count: usize,
    /// Distance kept between the pins and the border of the output surface.
    pub margin: S,
}

impl<S: Float> PinLayout<S> {
    pub fn new(shape: Shape, count: usize) -> Self {
        Self {
            shape,
            count,
            margin: S::ONE,
        }
    }

    pub fn with_margin(mut self, margin: S) -> Self {
        self.margin = margin;
        self
    }

    pub fn build(
        &self,
        width: S,
        height: S,
        verboser: &mut impl Verboser,
    ) -> Result<Vec<Pin<S>>>
    where
        usize: AsPrimitive<S>,
    {
        if self.count < 2 {
            return Err(Error::parameter(format!(
                "pin count must be at least 2, got {}",
                self.count
            )));
        }
        if !self.margin.is_finite() || self.margin < S::ZERO {
            return Err(Error::parameter(format!(
                "pin margin must be a non negative number, got {}",
                self.margin
            )));
        }
        let inner = self.margin * S::TWO;
        if !width.is_finite() || !height.is_finite() || width <= inner || height <= inner {
            return Err(Error::parameter(format!(
                "output surface {width}x{height} is too small for a margin of {}",
                self.margin
            )));
        }

        let pins = match self.shape {
            Shape::Circle => self.ellipse(width, height, verboser),
            Shape::Square => self.rectangle(width, height, verboser),
        };
        verboser.verbose(Message::CreatingPin(self.count));
        tracing::debug!(
            "Laid out {} pins on a {} of {}x{}.",
            pins.len(),
            self.shape,
            width,
            height
        );
        Ok(pins)
    }

    /// Angle 0 is the rightmost pin; angles grow towards +y, which is
    /// clockwise on a surface whose y axis points down.
    fn ellipse(&self, width: S, height: S, verboser: &mut impl Verboser) -> Vec<Pin<S>>
    where
        usize: AsPrimitive<S>,
    {
        let center = Point {
            x: width * S::HALF,
            y: height * S::HALF,
        };
        let radius = Point {
            x: center.x - self.margin,
            y: center.y - self.margin,
        };
        (0..self.count)
            .map(|i| {
                verboser.verbose(Message::CreatingPin(i));
                let theta = S::TWO * S::PI * i.as_() / self.count.as_();
                Pin {
                    index: i,
                    position: Point {
                        x: center.x + radius.x * theta.cos(),
                        y: center.y + radius.y * theta.sin(),
                    },
                }
            })
            .collect()
    }

    /// Walks top (left to right), right (top to bottom), bottom (right to left)
    /// and left (bottom to top). Every edge owns its starting corner and the
    /// first `count % 4` edges take one extra pin.
    fn rectangle(&self, width: S, height: S, verboser: &mut impl Verboser) -> Vec<Pin<S>>
    where
        usize: AsPrimitive<S>,
    {
        let start = Point {
            x: self.margin,
            y: self.margin,
        };
        let end = Point {
            x: width - self.margin,
            y: height - self.margin,
        };
        let corners = [
            start,
            Point { x: end.x, y: start.y },
            end,
            Point { x: start.x, y: end.y },
        ];

        let base = self.count / 4;
        let remainder = self.count % 4;
        let mut pins = Vec::with_capacity(self.count);
        for edge in 0..4 {
            let from = corners[edge];
            let to = corners[(edge + 1) % 4];
            let edge_count = base + usize::from(edge < remainder);
            for step in 0..edge_count {
                let index = pins.len();
                verboser.verbose(Message::CreatingPin(index));
                let t: S = step.as_() / edge_count.as_();
                pins.push(Pin {
                    index,
                    position: Point {
                        x: lerp(from.x, to.x, t),
                        y: lerp(from.y, to.y, t),
                    },
                });
            }
        }
        pins
    }
}

// Exact at both ends, so pins on a horizontal edge keep the edge's y.
fn lerp<S: Float>(from: S, to: S, t: S) -> S {
    if from == to {
        from
    } else {
        from + (to - from) * t
    }
}

/// Lays out `count` pins with the default margin.
pub fn generate_pins<S: Float>(
    shape: Shape,
    count: usize,
    width: S,
    height: S,
) -> Result<Vec<Pin<S>>>
where
    usize: AsPrimitive<S>,
{
    PinLayout::new(shape, count).build(width, height, &mut Silent)
}
