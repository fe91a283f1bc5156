mod entry;
mod error;
mod explorer;
mod fs;
mod memory;
mod render;
mod roots;
mod tree;
#[cfg(feature = "watch")]
mod watch;
mod workspace;

pub use entry::*;
pub use error::*;
pub use explorer::*;
pub use fs::*;
pub use memory::*;
pub use render::*;
pub use roots::*;
pub use tree::*;
#[cfg(feature = "watch")]
pub use watch::*;
pub use workspace::*;
