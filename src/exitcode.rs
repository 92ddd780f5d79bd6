//! Standard exit codes (BSD sysexits.h compatible)

/// Successful termination
pub const OK: i32 = 0;

/// Data format error (malformed service cache)
pub const DATAERR: i32 = 65;

/// Cannot open input (service cache missing)
pub const NOINPUT: i32 = 66;

/// Service unavailable (helper process or release feed failed)
pub const UNAVAILABLE: i32 = 69;

/// Internal software error
pub const SOFTWARE: i32 = 70;

/// Input/output error
pub const IOERR: i32 = 74;

/// Configuration error
pub const CONFIG: i32 = 78;
