// PDF collaborators: text extraction from uploads, HTML layout, and print-to-PDF.
// The pipeline never touches these directly; the HTTP handlers wire them in.

pub mod extract;
pub mod handlers;
pub mod html;
pub mod render;
