use num_traits::AsPrimitive;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    geometry::Point,
    Float, Grid,
};

/// Zoom and pan placing the source image on the output surface.
///
/// A source pixel at `s` lands on `s * zoom + offset` in output coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewTransform<S> {
    pub zoom: S,
    pub offset: Point<S>,
}

impl<S: Float> ViewTransform<S> {
    pub fn new(zoom: S, offset_x: S, offset_y: S) -> Result<Self> {
        let view = Self {
            zoom,
            offset: Point {
                x: offset_x,
                y: offset_y,
            },
        };
        view.validate()?;
        Ok(view)
    }

    pub fn identity() -> Self {
        Self {
            zoom: S::ONE,
            offset: Point {
                x: S::ZERO,
                y: S::ZERO,
            },
        }
    }

    /// Scales the source until it covers the whole output and centres it.
    pub fn fit(source: Grid, output: Grid) -> Result<Self>
    where
        usize: AsPrimitive<S>,
    {
        if source.is_empty() {
            return Err(Error::image("source image has no pixels"));
        }
        if output.is_empty() {
            return Err(Error::parameter("output surface has no pixels"));
        }
        let source_size: Point<S> = Point::from(source).as_();
        let output_size: Point<S> = Point::from(output).as_();
        let zoom = (output_size.x / source_size.x).max(output_size.y / source_size.y);
        Ok(Self {
            zoom,
            offset: (output_size - source_size * zoom) * S::HALF,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if !self.zoom.is_finite() || self.zoom <= S::ZERO {
            return Err(Error::parameter(format!(
                "zoom must be a positive number, got {}",
                self.zoom
            )));
        }
        if !self.offset.x.is_finite() || !self.offset.y.is_finite() {
            return Err(Error::parameter(format!(
                "offset must be finite, got {}",
                self.offset
            )));
        }
        Ok(())
    }

    pub fn to_source(&self, output: Point<S>) -> Point<S> {
        (output - self.offset) / self.zoom
    }

    pub fn to_output(&self, source: Point<S>) -> Point<S> {
        source * self.zoom + self.offset
    }
}

impl<S: Float> Default for ViewTransform<S> {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_positive_zoom_is_rejected() {
        for zoom in [0.0, -1.5, f32::NAN, f32::INFINITY] {
            assert!(matches!(
                ViewTransform::new(zoom, 0.0, 0.0),
                Err(Error::InvalidParameter(_))
            ));
        }
        assert!(ViewTransform::new(1.0f32, f32::NAN, 0.0).is_err());
    }

    #[test]
    fn transforms_are_inverse() {
        let view = ViewTransform::new(2.5f64, -30.0, 12.0).unwrap();
        let p = Point::new(17.0, 4.0);
        assert!(view.to_source(view.to_output(p)).aprox_eq(&p));
        assert_eq!(view.to_source(Point::new(-30.0, 12.0)), Point::new(0.0, 0.0));
    }

    #[test]
    fn fit_covers_and_centres() {
        let view = ViewTransform::<f64>::fit(Grid::new(200, 100), Grid::new(300, 300)).unwrap();
        assert_eq!(view.zoom, 3.0);
        assert_eq!(view.offset, Point::new(-150.0, 0.0));

        let view = ViewTransform::<f64>::fit(Grid::new(50, 50), Grid::new(100, 100)).unwrap();
        assert_eq!(view.zoom, 2.0);
        assert_eq!(view.offset, Point::new(0.0, 0.0));
    }

    #[test]
    fn fit_rejects_empty_grids() {
        assert!(matches!(
            ViewTransform::<f32>::fit(Grid::new(0, 10), Grid::new(10, 10)),
            Err(Error::InvalidImage(_))
        ));
        assert!(matches!(
            ViewTransform::<f32>::fit(Grid::new(10, 10), Grid::new(10, 0)),
            Err(Error::InvalidParameter(_))
        ));
    }
}
