use std::ops::Deref;

use num_traits::AsPrimitive;
use rayon::{iter::IndexedParallelIterator, iter::ParallelIterator, slice::ParallelSliceMut};
use serde::{Deserialize, Serialize};

use crate::{
    darkness::Darkness,
    error::{Error, Result},
    geometry::Point,
    verboser::{Message, Verboser},
    Float, Grid, ViewTransform,
};

mod source;

pub use source::SourceImage;

#[derive(Clone, Debug, PartialEq)]
pub struct PixelData<T> {
    pixels: Vec<T>,
    grid: Grid,
}

impl<T> PixelData<T> {
    pub fn pixels(&self) -> &[T] {
        &self.pixels
    }

    pub fn get(&self, point: Point<usize>) -> Option<&T> {
        self.grid
            .index_of(point)
            .and_then(|index| self.pixels.get(index))
    }
}

impl<T> Deref for PixelData<T> {
    type Target = Grid;

    fn deref(&self) -> &Self::Target {
        &self.grid
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sampling {
    Nearest,
    #[default]
    Bilinear,
}

impl Sampling {
    /// Darkness of `source` at a fractional coordinate, pixel `i` being centred on `i`.
    /// Coordinates outside `[0, width) x [0, height)` are blank.
    pub fn sample<S: Float>(self, source: &SourceImage, at: Point<S>) -> S
    where
        usize: AsPrimitive<S>,
        u8: AsPrimitive<S>,
    {
        let grid = source.grid();
        let size: Point<S> = Point::from(grid).as_();
        if !(at.x >= S::ZERO && at.y >= S::ZERO && at.x < size.x && at.y < size.y) {
            return S::ZERO;
        }
        let last = Point {
            x: grid.width - 1,
            y: grid.height - 1,
        };
        match self {
            Sampling::Nearest => {
                let x = at.x.round().to_usize().unwrap_or(0).min(last.x);
                let y = at.y.round().to_usize().unwrap_or(0).min(last.y);
                source.darkness_at(x, y)
            }
            Sampling::Bilinear => {
                let floor = at.floor();
                let x0 = floor.x.to_usize().unwrap_or(0).min(last.x);
                let y0 = floor.y.to_usize().unwrap_or(0).min(last.y);
                let x1 = (x0 + 1).min(last.x);
                let y1 = (y0 + 1).min(last.y);
                let fx = at.x - floor.x;
                let fy = at.y - floor.y;

                let top: S = source.darkness_at::<S>(x0, y0) * (S::ONE - fx)
                    + source.darkness_at::<S>(x1, y0) * fx;
                let bottom: S = source.darkness_at::<S>(x0, y1) * (S::ONE - fx)
                    + source.darkness_at::<S>(x1, y1) * fx;
                top * (S::ONE - fy) + bottom * fy
            }
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldOptions {
    pub sampling: Sampling,
}

/// Remaining ink per output cell, every value in `[0, 1]`, 1 being fully dark.
#[derive(Clone, Debug, PartialEq)]
pub struct DarknessField<S>(PixelData<S>);

impl<S: Float> DarknessField<S> {
    /// Values are clamped into `[0, 1]`; non finite values become blank.
    pub fn from_values(grid: Grid, values: Vec<S>) -> Result<Self> {
        if grid.is_empty() {
            return Err(Error::parameter("darkness field has no cells"));
        }
        if values.len() != grid.len() {
            return Err(Error::parameter(format!(
                "{} values do not fill a {}x{} field",
                values.len(),
                grid.width,
                grid.height
            )));
        }
        Ok(Self(PixelData {
            pixels: values.into_iter().map(clamp_unit).collect(),
            grid,
        }))
    }

    pub fn uniform(grid: Grid, value: S) -> Result<Self> {
        Self::from_values(grid, vec![value; grid.len()])
    }

    pub fn build(
        source: &SourceImage,
        output: Grid,
        view: &ViewTransform<S>,
        options: &FieldOptions,
        verboser: &mut impl Verboser,
    ) -> Result<Self>
    where
        usize: AsPrimitive<S>,
        u8: AsPrimitive<S>,
    {
        if output.is_empty() {
            return Err(Error::parameter(format!(
                "output surface {}x{} has no cells",
                output.width, output.height
            )));
        }
        view.validate()?;

        verboser.verbose(Message::BuildingField(0, output.height));
        let mut pixels = vec![S::ZERO; output.len()];
        pixels
            .par_chunks_mut(output.width)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, cell) in row.iter_mut().enumerate() {
                    let at = view.to_source(Point { x: x.as_(), y: y.as_() });
                    *cell = clamp_unit(options.sampling.sample(source, at));
                }
            });
        verboser.verbose(Message::BuildingField(output.height, output.height));

        let field = Self(PixelData {
            pixels,
            grid: output,
        });
        if field.is_blank() {
            tracing::warn!(
                "Darkness field is blank: the view (zoom {}, offset {}) leaves no dark source pixel on the {}x{} output.",
                view.zoom,
                view.offset,
                output.width,
                output.height
            );
        }
        Ok(field)
    }

    pub fn values(&self) -> &[S] {
        self.0.pixels()
    }

    pub fn get(&self, point: Point<usize>) -> Option<S> {
        self.0.get(point).copied()
    }

    /// Sum of the ink left in the field.
    pub fn total(&self) -> S {
        self.0
            .pixels
            .iter()
            .fold(S::ZERO, |total, &value| total + value)
    }

    pub fn is_blank(&self) -> bool {
        self.0.pixels.iter().all(|&value| value <= S::ZERO)
    }

    /// Applies `darkness` to every listed cell. Cells never gain ink.
    pub(crate) fn remove_ink<D: Darkness<S> + ?Sized>(&mut self, cells: &[usize], darkness: &D) {
        for &cell in cells {
            if let Some(value) = self.0.pixels.get_mut(cell) {
                *value = darkness.compute(*value).max(S::ZERO).min(*value);
            }
        }
    }
}

impl<S> Deref for DarknessField<S> {
    type Target = Grid;

    fn deref(&self) -> &Self::Target {
        &self.0.grid
    }
}

fn clamp_unit<S: Float>(value: S) -> S {
    if value.is_nan() {
        S::ZERO
    } else {
        value.max(S::ZERO).min(S::ONE)
    }
}

/// Builds the darkness field of `pixels` (RGB or RGBA, 8 bits per channel)
/// as seen on an `output_width` x `output_height` surface.
#[allow(clippy::too_many_arguments)]
pub fn build_darkness_field<S: Float>(
    pixels: &[u8],
    source_width: usize,
    source_height: usize,
    output_width: usize,
    output_height: usize,
    zoom: S,
    offset_x: S,
    offset_y: S,
) -> Result<DarknessField<S>>
where
    usize: AsPrimitive<S>,
    u8: AsPrimitive<S>,
{
    let source = SourceImage::new(pixels, source_width, source_height)?;
    let view = ViewTransform::new(zoom, offset_x, offset_y)?;
    DarknessField::build(
        &source,
        Grid::new(output_width, output_height),
        &view,
        &FieldOptions::default(),
        &mut crate::verboser::Silent,
    )
}
