//! Reader/writer for the SWF movie container format.
//!
//! Three-layer architecture:
//! - **Layer 1** (`bits`): Bit-level I/O — MSB-first bit fields, little-endian
//!   bytes, mark/check length verification
//! - **Layer 2** (`tag`/`tags`, `shape`, `styles`, `actions`, `filters`):
//!   Typed codecs for the five record families, dispatched through a
//!   substitutable [`registry::TagRegistry`]
//! - **Layer 3** (`movie`): The envelope — signature, optional zlib body
//!   compression, and the two-phase (size, then write) tag sequence encoder
//!
//! Unknown movie tags and script actions survive a decode/encode round trip
//! byte-identically; they are carried as opaque records rather than dropped.

pub mod actions;
pub mod bits;
pub mod context;
pub mod error;
pub mod filters;
pub mod movie;
pub mod registry;
pub mod shape;
pub mod styles;
pub mod tag;
pub mod tags;
pub mod types;

pub use error::{Error, Result};
pub use movie::Movie;
pub use registry::TagRegistry;
pub use tag::Tag;
pub use tags::movie_header::MovieHeader;
pub use types::{CharacterId, Color, ColorTransform, Matrix, Rect};
