use super::{FloatT, ScalarMath};

impl<T> ScalarMath for T
where
    T: FloatT,
{
    fn clip(&self, min_thresh: T, max_thresh: T) -> T {
        if *self < min_thresh {
            min_thresh
        } else if *self > max_thresh {
            max_thresh
        } else {
            *self
        }
    }
}
