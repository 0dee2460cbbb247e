//! Document exports.

pub mod itinerary;
pub mod pdf;

pub use itinerary::{content_disposition, itinerary_filename, render, sanitize_filename, ItineraryExport};
pub use pdf::{Font, PdfDocument};

pub const PDF_CONTENT_TYPE: &str = "application/pdf";
