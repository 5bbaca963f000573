pub mod activation;
pub mod matrix;
pub mod network;

pub use matrix::Matrix;
pub use network::Policy;
