//! Portfolio state port.

use crate::domain::error::NewsdeskError;
use crate::domain::position::Position;

pub trait PositionPort {
    /// Currently open positions. An absent portfolio is an empty one.
    fn load_positions(&self) -> Result<Vec<Position>, NewsdeskError>;
}
