pub use self::play::*;

mod play;
