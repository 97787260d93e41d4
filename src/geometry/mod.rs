mod prism;
mod ray;

pub use prism::Prism;
pub use ray::Ray;
