use num_traits::{NumCast, Unsigned};
use serde::{Deserialize, Serialize};

use crate::{
    geometry::{Point, Segment},
    Float,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid<T = usize> {
    pub height: T,
    pub width: T,
}

impl<T> Grid<T> {
    pub fn new(width: T, height: T) -> Self {
        Self { height, width }
    }
}

impl Grid {
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl<T: NumCast + Unsigned + PartialOrd + Copy> Grid<T> {
    /// Row-major indices of the in-bounds cells crossed by `seg`.
    pub fn get_pixel_indexes_in_segment<F: Float>(
        self,
        seg: Segment<F>,
    ) -> impl Iterator<Item = T> {
        Self::get_pixel_coords_in_segment(seg).filter_map(move |point| self.index_of(point))
    }

    pub fn get_pixel_coords_in_segment<F: Float>(
        seg: Segment<F>,
    ) -> impl Iterator<Item = Point<T>> {
        seg.floor()
            .cast::<isize>()
            .into_iter()
            .flat_map(Segment::points_between)
            .filter_map(|point| point.cast::<T>())
    }

    pub fn index_of(&self, point: Point<T>) -> Option<T> {
        if point.x < self.width && point.y < self.height {
            Some(point.y * self.width + point.x)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_is_row_major() {
        let grid = Grid::new(4usize, 3);
        assert_eq!(grid.index_of(Point::new(0, 0)), Some(0));
        assert_eq!(grid.index_of(Point::new(3, 0)), Some(3));
        assert_eq!(grid.index_of(Point::new(1, 2)), Some(9));
        assert_eq!(grid.index_of(Point::new(4, 0)), None);
        assert_eq!(grid.index_of(Point::new(0, 3)), None);
    }

    #[test]
    fn segment_cells_outside_the_grid_are_skipped() {
        let grid = Grid::new(10usize, 10);
        let seg = Segment::new(Point::new(-3.0f32, 5.0), Point::new(12.0, 5.0));
        let cells: Vec<_> = grid.get_pixel_indexes_in_segment(seg).collect();
        assert_eq!(cells, (50..60).collect::<Vec<_>>());
    }

    #[test]
    fn non_finite_segment_yields_nothing() {
        let grid = Grid::new(10usize, 10);
        let seg = Segment::new(Point::new(f64::NAN, 0.0), Point::new(3.0, 3.0));
        assert_eq!(grid.get_pixel_indexes_in_segment(seg).count(), 0);
    }
}
