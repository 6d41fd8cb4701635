use error::DexterError;

pub mod error;
pub mod error_code;
pub mod utils;
pub mod version;

pub type DexterResult<T> = std::result::Result<T, DexterError>;
