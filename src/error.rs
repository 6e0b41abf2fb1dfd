use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Invalid domain x=[{from_x}, {to_x}) y=[{from_y}, {to_y}): bounds must be finite and non-empty")]
    InvalidBounds {
        from_x: f64,
        to_x: f64,
        from_y: f64,
        to_y: f64,
    },

    #[error("Promotion probability must lie in [0, 1], got {0}")]
    InvalidProbability(f64),
}
