//! Pipeline stages for comic-archive-to-PDF conversion.
//!
//! Each submodule implements exactly one step.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ transform ──▶ encode ──▶ assemble
//! (path)    (unpack)    (resize)      (JPEG)     (lopdf)
//! ```
//!
//! 1. [`input`]     — check the archive exists and detect its container
//! 2. [`extract`]   — unpack into the scratch directory and list pages in order
//! 3. [`transform`] — decode, colour-convert and downscale each page
//! 4. [`encode`]    — write the page as a JPEG next to its source
//! 5. [`assemble`]  — one PDF page per JPEG, saved atomically

pub mod assemble;
pub mod encode;
pub mod extract;
pub mod input;
pub mod transform;
