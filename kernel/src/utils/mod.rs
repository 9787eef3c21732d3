pub use self::debug::logger;

pub mod debug;
