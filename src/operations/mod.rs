mod area;
mod perimeter;
mod retriangulate;

pub use area::FaceArea;
pub use perimeter::FacePerimeter;
pub use retriangulate::RetriangulateFace;
