//! Encoding and decoding algorithms for each kind of deployment.

mod buffer;

mod enumeration;
pub use enumeration::Enumeration;

mod integer;

mod ranged;
pub use ranged::Ranged;

mod sequence;

mod string;

mod structure;
pub use structure::{FieldReader, FieldWriter};

mod union;
pub use union::Alternative;
